//! The TOTP engine ([RFC 6238][6238]).
//!
//! [`Totp`] carries the parameters both sides agreed on at enrollment (algorithm, token length,
//! step duration) plus the verifier's clock-skew tolerance. It holds no key material and no
//! mutable state, so one value can be shared freely between threads and accounts.
//!
//! [6238]: https://datatracker.ietf.org/doc/html/rfc6238

use subtle::ConstantTimeEq;

use crate::digest::Algorithm;
use crate::length::{Digits, Token};
use crate::secret::Secret;
use crate::time::{self, TimeStep, DEFAULT_PERIOD};
use crate::uri::ProvisioningUri;
use crate::{raw_hotp, Counter, Result};

/// TOTP parameters.
///
/// The defaults (HMAC-SHA1, 6 digits, 30-second steps, one step of skew either way) are what
/// authenticator apps assume when a provisioning URI says nothing else.
///
/// With the `serde` feature enabled, `Totp` can be read straight out of an application's
/// configuration; missing fields take their default values.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Totp {
    /// HMAC algorithm.
    pub algorithm: Algorithm,
    /// Token length.
    pub digits: Digits,
    /// Step duration in seconds.
    pub period: u64,
    /// Steps accepted on either side of the current one when verifying.
    pub skew: u32,
}

impl Default for Totp {
    fn default() -> Self {
        Totp {
            algorithm: Algorithm::Sha1,
            digits: Digits::SIX,
            period: DEFAULT_PERIOD,
            skew: 1,
        }
    }
}

/// Outcome of a successful verification.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Verification {
    /// The step whose token matched. Persist this to reject replays with [`Totp::check_after`].
    pub step: TimeStep,
    /// Matched step minus current step; negative when the client's clock is behind.
    pub drift: i64,
}

impl Totp {
    /// Default parameters; see [`Totp::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HMAC algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Sets the token length.
    pub fn with_digits(mut self, digits: Digits) -> Self {
        self.digits = digits;
        self
    }

    /// Sets the step duration. A zero period is rejected when the engine is used.
    pub fn with_period(mut self, period: u64) -> Self {
        self.period = period;
        self
    }

    /// Sets how many steps either side of the current one are accepted.
    pub fn with_skew(mut self, skew: u32) -> Self {
        self.skew = skew;
        self
    }

    /// Token for the step containing `timestamp`.
    ///
    /// ```rust
    /// # use rfc_6238::{Digits, Secret, Totp};
    /// let secret = Secret::from_bytes(b"12345678901234567890".to_vec()).unwrap();
    /// let totp = Totp::new().with_digits(Digits::EIGHT);
    /// assert_eq!(totp.generate(&secret, 59).unwrap().to_string(), "94287082");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::Period`](crate::Error::Period) if the step duration is zero.
    pub fn generate(&self, secret: &Secret, timestamp: u64) -> Result<Token> {
        let step = TimeStep::at(timestamp, self.period)?;
        Ok(self.token(secret, step))
    }

    /// Token for the current time.
    pub fn generate_now(&self, secret: &Secret) -> Result<Token> {
        self.generate(secret, time::now()?)
    }

    fn token(&self, secret: &Secret, step: TimeStep) -> Token {
        Token::new(raw_hotp(secret, step, self.algorithm), self.digits)
    }

    /// Seconds until the token for `timestamp` expires.
    pub fn remaining(&self, timestamp: u64) -> Result<u64> {
        time::remaining_time(timestamp, self.period)
    }

    /// Checks `candidate` against every step within `skew` of `timestamp`'s step.
    ///
    /// Candidates that are not exactly `digits` ASCII digits never match; that is an ordinary
    /// `Ok(None)`, not an error. Every comparison is constant-time. Steps that would fall
    /// outside the `u64` range are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Period`](crate::Error::Period) if the step duration is zero.
    pub fn check(
        &self,
        secret: &Secret,
        candidate: &str,
        timestamp: u64,
    ) -> Result<Option<Verification>> {
        let current = TimeStep::at(timestamp, self.period)?;
        if !self.well_formed(candidate) {
            tracing::warn!(
                expected = self.digits.get(),
                length = candidate.len(),
                "rejecting malformed TOTP candidate"
            );
            return Ok(None);
        }
        let skew = i64::from(self.skew);
        for drift in -skew..=skew {
            let step = match current.offset(drift) {
                Some(step) => step,
                None => continue,
            };
            let expected = self.token(secret, step).to_string();
            if bool::from(expected.as_bytes().ct_eq(candidate.as_bytes())) {
                tracing::debug!(drift, "TOTP candidate matched");
                return Ok(Some(Verification { step, drift }));
            }
        }
        tracing::debug!(skew = self.skew, "TOTP candidate did not match");
        Ok(None)
    }

    /// Like [`Totp::check`], but only steps strictly after `last_used` are accepted.
    ///
    /// `last_used` is the [`Verification::step`] the caller persisted after the account's
    /// previous successful verification. Passing it back makes each token single-use, even
    /// inside its validity window. Storing the returned step is up to the caller.
    ///
    /// ```rust
    /// # use rfc_6238::{Secret, Totp};
    /// let secret = Secret::from_bytes(b"12345678901234567890".to_vec()).unwrap();
    /// let totp = Totp::new();
    /// let code = totp.generate(&secret, 59).unwrap().to_string();
    /// let first = totp.check_after(&secret, &code, 59, None).unwrap().unwrap();
    /// assert!(totp.check_after(&secret, &code, 60, Some(first.step)).unwrap().is_none());
    /// ```
    pub fn check_after(
        &self,
        secret: &Secret,
        candidate: &str,
        timestamp: u64,
        last_used: Option<TimeStep>,
    ) -> Result<Option<Verification>> {
        let verification = self.check(secret, candidate, timestamp)?;
        match (verification, last_used) {
            (Some(v), Some(last)) if v.step <= last => {
                tracing::warn!(
                    step = v.step.value(),
                    last_used = last.value(),
                    "rejecting replayed TOTP token"
                );
                Ok(None)
            }
            (verification, _) => Ok(verification),
        }
    }

    /// Whether `candidate` is valid at `timestamp`.
    pub fn verify(&self, secret: &Secret, candidate: &str, timestamp: u64) -> Result<bool> {
        self.check(secret, candidate, timestamp)
            .map(|verification| verification.is_some())
    }

    /// Whether `candidate` is valid right now.
    pub fn verify_now(&self, secret: &Secret, candidate: &str) -> Result<bool> {
        self.verify(secret, candidate, time::now()?)
    }

    /// Provisioning URI carrying this configuration.
    pub fn provisioning_uri(&self, secret: &Secret, account: &str, issuer: &str) -> String {
        ProvisioningUri {
            issuer: issuer.to_owned(),
            account: account.to_owned(),
            secret: secret.clone(),
            totp: *self,
        }
        .to_string()
    }

    fn well_formed(&self, candidate: &str) -> bool {
        candidate.len() == usize::from(self.digits.get())
            && candidate.bytes().all(|b| b.is_ascii_digit())
    }
}

/// Computes the token for a Base32 `secret` at `timestamp`, using HMAC-SHA1.
///
/// ```rust
/// // "12345678901234567890" in Base32
/// let secret = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";
/// assert_eq!(rfc_6238::compute_code(secret, 59, 30, 8).unwrap(), "94287082");
/// assert_eq!(rfc_6238::compute_code(secret, 59, 30, 6).unwrap(), "287082");
/// ```
///
/// # Errors
///
/// [`InvalidSecretEncoding`](crate::Error::InvalidSecretEncoding) for a malformed secret,
/// [`Period`](crate::Error::Period) for a zero `period` and [`Digits`](crate::Error::Digits)
/// for a length outside 6..=9.
pub fn compute_code(secret: &str, timestamp: u64, period: u64, digits: u8) -> Result<String> {
    let secret = Secret::from_base32(secret)?;
    let totp = Totp::new()
        .with_period(period)
        .with_digits(Digits::try_from(digits)?);
    totp.generate(&secret, timestamp).map(|token| token.to_string())
}

/// Verifies a 6-digit, 30-second candidate against a Base32 `secret`, accepting tokens up to
/// `tolerance` steps either side of `timestamp`.
///
/// A wrong or malformed candidate is `Ok(false)`; only a malformed secret is an error.
///
/// ```rust
/// let secret = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";
/// assert_eq!(rfc_6238::verify_code(secret, "287082", 59, 0), Ok(true));
/// assert_eq!(rfc_6238::verify_code(secret, "12a456", 59, 1), Ok(false));
/// ```
pub fn verify_code(secret: &str, candidate: &str, timestamp: u64, tolerance: u32) -> Result<bool> {
    let secret = Secret::from_base32(secret)?;
    Totp::new()
        .with_skew(tolerance)
        .verify(&secret, candidate, timestamp)
}

/// [`verify_code`] at the current time.
pub fn verify_code_now(secret: &str, candidate: &str, tolerance: u32) -> Result<bool> {
    verify_code(secret, candidate, time::now()?, tolerance)
}
