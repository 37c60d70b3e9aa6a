//! Time-based one-time passwords ([RFC 6238][6238]) on top of HMAC-based one-time passwords
//! ([RFC 4226][4226]).
//!
//! The crate is stateless: every operation is a function of a [`Secret`], a Unix timestamp and
//! a [`Totp`] configuration. Storing secrets (and, for replay protection, the last accepted
//! [`TimeStep`]) is left to the caller.
//!
//! ```rust
//! // Enrollment: create a secret and hand it to the user's authenticator app.
//! let secret = rfc_6238::generate_secret().unwrap();
//! let uri = rfc_6238::provisioning_uri(&secret, "jane@example.com", "ACME").unwrap();
//! assert!(uri.starts_with("otpauth://totp/ACME:jane%40example.com?secret="));
//!
//! // Login: check the code the user typed.
//! let now = 1_700_000_000;
//! let code = rfc_6238::compute_code(&secret, now, 30, 6).unwrap();
//! assert_eq!(rfc_6238::verify_code(&secret, &code, now + 30, 1), Ok(true));
//! assert_eq!(rfc_6238::verify_code(&secret, &code, now + 30, 0), Ok(false));
//! ```
//!
//! [4226]: https://datatracker.ietf.org/doc/html/rfc4226
//! [6238]: https://datatracker.ietf.org/doc/html/rfc6238

pub mod digest;
mod length;
mod secret;
mod time;
mod totp;
mod uri;

use crate::digest::Digest as _;

pub use crate::digest::Algorithm;
pub use crate::length::{Digits, Token};
pub use crate::secret::{generate_secret, Secret, SECRET_BYTES};
pub use crate::time::{now, remaining_time, TimeStep, DEFAULT_PERIOD};
pub use crate::totp::{compute_code, verify_code, verify_code_now, Totp, Verification};
pub use crate::uri::{provisioning_uri, ProvisioningUri};

/// Synchronized moving counter.
///
/// [RFC 4226][4226] describes an "8-byte synchronized moving counter." To allow for more
/// sophisticated forms of counters (including in custom structs, etc.), the `Counter` and
/// [`CounterBytes`][CounterBytes] traits are exposed. TOTP's counter is the [`TimeStep`].
///
/// ## `Counter` vs. [`CounterBytes`][CounterBytes]
///
/// The `Counter` trait has a method with a return type of `u64`, which is a (big-endian) unsigned
/// 8-byte integer. However, it is frequently more convenient to return an array of bytes. For
/// convenience, the [`CounterBytes`][CounterBytes] trait is therefore provided.
/// `CounterBytes` has a method with a return type of `[u8; 8]`, an array of eight bytes. This byte
/// array is simply concatenated (big-endian) to form a `u64`, which is used as the counter value.
///
/// `Counter` is automatically implemented for `u64`, enabling raw `u64`s to be used as counter
/// values with no additional configuration.
///
/// [4226]: https://tools.ietf.org/html/rfc4226
/// [CounterBytes]: trait.CounterBytes.html
pub trait Counter {
    /// The counter value as an eight-byte, big-endian, unsigned integer.
    fn value(&self) -> u64;
}

/// Raw synchronized moving counter.
///
/// See the documentation for [`Counter`][Counter] for more information.
///
/// [Counter]: trait.Counter.html
pub trait CounterBytes {
    /// The counter value as an array of bytes.
    fn value(&self) -> [u8; 8];
}

impl CounterBytes for [u8; 8] {
    fn value(&self) -> [u8; 8] {
        *self
    }
}

impl<T: CounterBytes> Counter for T {
    fn value(&self) -> u64 {
        u64::from_be_bytes(CounterBytes::value(self))
    }
}

impl Counter for u64 {
    fn value(&self) -> u64 {
        *self
    }
}

/// Error type.
///
/// A token that does not match, or is not even made of the right number of digits, is not an
/// error: verification reports it as `Ok(false)`.
#[derive(Clone, Debug, Eq, Hash, PartialEq, thiserror::Error)]
pub enum Error {
    /// The secret is not Base32, or decodes to nothing.
    #[error("invalid base32 secret")]
    InvalidSecretEncoding,
    /// The requested number of digits was outside of the range [6, 9].
    #[error("tokens must have 6 to 9 digits, not {0}")]
    Digits(u8),
    /// The step duration was zero.
    #[error("time step duration must be positive")]
    Period,
    /// The system random number generator failed.
    #[error("secure random source unavailable")]
    Entropy,
    /// The system clock reads earlier than the Unix epoch.
    #[error("system clock is before the Unix epoch")]
    Clock,
    /// A provisioning URI could not be understood.
    #[error("invalid provisioning URI: {0}")]
    InvalidUri(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Computes the "raw" HOTP value for the given secret and counter: the 31-bit integer produced
/// by dynamic truncation, before reduction to a number of digits.
///
/// RFC 4226 specifies HMAC-SHA1; RFC 6238 additionally allows SHA256 and SHA512.
pub fn raw_hotp<C: Counter>(secret: &Secret, counter: C, algorithm: Algorithm) -> u32 {
    algorithm.sign(secret.as_ref(), counter.value()).truncated()
}

/// Computes an HMAC-SHA1 HOTP token of the desired length given a secret and counter value.
///
/// ```rust
/// # use rfc_6238::{hotp, Digits, Secret};
/// let secret = Secret::from_bytes(b"12345678901234567890".to_vec()).unwrap();
/// assert_eq!(hotp(&secret, 0_u64, Digits::SIX).to_string(), "755224");
/// ```
pub fn hotp<C: Counter>(secret: &Secret, counter: C, digits: Digits) -> Token {
    Token::new(raw_hotp(secret, counter, Algorithm::Sha1), digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> Secret {
        Secret::from_bytes(b"12345678901234567890".to_vec()).unwrap()
    }

    #[test]
    fn counter_bytes() {
        assert_eq!(Counter::value(&[0_u8, 0, 0, 0, 0, 0, 0x01, 0x02]), 0x0102);
        assert_eq!(Counter::value(&42_u64), 42);
        assert_eq!(
            raw_hotp(&secret(), [0_u8, 0, 0, 0, 0, 0, 0, 1], Algorithm::Sha1),
            raw_hotp(&secret(), 1_u64, Algorithm::Sha1)
        );
    }

    #[test]
    fn test_raw_hotp() {
        let secret = secret();
        let sha1 = |counter: u64| raw_hotp(&secret, counter, Algorithm::Sha1);
        assert_eq!(sha1(0), 0x4c93cf18);
        assert_eq!(sha1(1), 0x41397eea);
        assert_eq!(sha1(2), 0x82fef30);
        assert_eq!(sha1(3), 0x66ef7655);
        assert_eq!(sha1(4), 0x61c5938a);
        assert_eq!(sha1(5), 0x33c083d4);
        assert_eq!(sha1(6), 0x7256c032);
        assert_eq!(sha1(7), 0x4e5b397);
        assert_eq!(sha1(8), 0x2823443f);
        assert_eq!(sha1(9), 0x2679dc69);
    }

    #[test]
    fn test_hotp() {
        let expected = [
            "755224", "287082", "359152", "969429", "338314", "254676", "287922", "162583",
            "399871", "520489",
        ];
        let secret = secret();
        for (counter, code) in expected.iter().enumerate() {
            assert_eq!(hotp(&secret, counter as u64, Digits::SIX).to_string(), *code);
        }
    }

    #[test]
    fn error_messages() {
        assert_eq!(Error::Digits(4).to_string(), "tokens must have 6 to 9 digits, not 4");
        assert_eq!(
            Error::InvalidUri("missing secret".into()).to_string(),
            "invalid provisioning URI: missing secret"
        );
    }
}
