//! Time steps: the moving factor of TOTP.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::{Counter, Error, Result};

/// Default step duration, in seconds ([RFC 6238 §5.2][5.2]).
///
/// [5.2]: https://datatracker.ietf.org/doc/html/rfc6238#section-5.2
pub const DEFAULT_PERIOD: u64 = 30;

/// Current Unix time in whole seconds.
///
/// # Errors
///
/// Returns [`Error::Clock`] if the system clock reads earlier than the Unix epoch.
pub fn now() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .map_err(|_| Error::Clock)
}

/// Number of whole steps of `period` seconds since the Unix epoch.
///
/// `TimeStep` is the counter TOTP feeds to HOTP: `floor(timestamp / period)`. It is never
/// stored, only recomputed from the clock.
///
/// ```rust
/// # use rfc_6238::{Counter, TimeStep};
/// assert_eq!(TimeStep::at(59, 30).unwrap().value(), 1);
/// assert!(TimeStep::at(59, 0).is_err());
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TimeStep(u64);

impl TimeStep {
    /// The step containing `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Period`] if `period` is zero.
    pub fn at(timestamp: u64, period: u64) -> Result<Self> {
        if period == 0 {
            return Err(Error::Period);
        }
        Ok(TimeStep(timestamp / period))
    }

    /// The step `offset` steps away from this one, or `None` if that would leave the `u64`
    /// range.
    pub fn offset(self, offset: i64) -> Option<Self> {
        let magnitude = offset.unsigned_abs();
        if offset < 0 {
            self.0.checked_sub(magnitude).map(TimeStep)
        } else {
            self.0.checked_add(magnitude).map(TimeStep)
        }
    }
}

impl Counter for TimeStep {
    fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for TimeStep {
    fn from(step: u64) -> Self {
        TimeStep(step)
    }
}

/// Seconds left before the code for `timestamp` expires: `period - timestamp % period`.
///
/// Always in `1..=period`.
///
/// # Errors
///
/// Returns [`Error::Period`] if `period` is zero.
pub fn remaining_time(timestamp: u64, period: u64) -> Result<u64> {
    if period == 0 {
        return Err(Error::Period);
    }
    Ok(period - timestamp % period)
}
