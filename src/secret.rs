//! Shared secrets and their Base32 representation.

use core::fmt;

use data_encoding::{Encoding, Specification, BASE32_NOPAD};
use ring::rand::{SecureRandom, SystemRandom};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::{Error, Result};

/// Length of generated secrets, in bytes (the 160 bits recommended by RFC 4226 §4).
pub const SECRET_BYTES: usize = 20;

/// Secrets shorter than this (128 bits) violate RFC 4226 §4 R6 and are logged.
const MIN_SECRET_BYTES: usize = 16;

const BASE32_SYMBOLS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Shared secret.
///
/// As per [RFC 4226][4226], "each HOTP generator has a different and unique secret." A `Secret`
/// is immutable once constructed: there is no way to modify the key in place, so rotating a
/// secret always means issuing a new one. Key material is wiped when the secret is dropped and
/// never shows up in `Debug` output.
///
/// [4226]: https://tools.ietf.org/html/rfc4226
#[derive(Clone)]
pub struct Secret(Box<[u8]>);

impl Secret {
    /// Generates a fresh 160-bit secret from the operating system's CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Entropy`] if the random source fails.
    pub fn generate() -> Result<Self> {
        let mut bytes = vec![0_u8; SECRET_BYTES];
        SystemRandom::new()
            .fill(&mut bytes)
            .map_err(|_| Error::Entropy)?;
        tracing::debug!(bits = SECRET_BYTES * 8, "generated TOTP secret");
        Ok(Secret(bytes.into_boxed_slice()))
    }

    /// Decodes a Base32 ([RFC 4648][4648]) secret.
    ///
    /// Decoding is forgiving about presentation but not about content: surrounding whitespace,
    /// lowercase letters and trailing `=` padding are accepted, while any other character outside
    /// `A-Z2-7` is rejected. Bits left over after the last whole byte are dropped, whatever their
    /// value, so every string of alphabet characters decodes to `len * 5 / 8` bytes.
    ///
    /// ```rust
    /// # use rfc_6238::Secret;
    /// let a = Secret::from_base32("JBSWY3DPEHPK3PXP").unwrap();
    /// let b = Secret::from_base32(" jbswy3dpehpk3pxp ").unwrap();
    /// assert_eq!(a, b);
    /// assert!(Secret::from_base32("not-base32!!").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSecretEncoding`] for characters outside the alphabet, or input
    /// that decodes to zero bytes.
    ///
    /// [4648]: https://datatracker.ietf.org/doc/html/rfc4648#section-6
    pub fn from_base32(encoded: &str) -> Result<Self> {
        let trimmed = encoded.trim().trim_end_matches('=');
        if !trimmed
            .bytes()
            .all(|b| BASE32_SYMBOLS.as_bytes().contains(&b.to_ascii_uppercase()))
        {
            return Err(Error::InvalidSecretEncoding);
        }
        // Keep only the characters that contribute to a whole byte
        let bytes = trimmed.len() * 5 / 8;
        let used = (bytes * 8 + 4) / 5;
        let decoded = lenient_base32()?
            .decode(trimmed[..used].as_bytes())
            .map_err(|_| Error::InvalidSecretEncoding)?;
        Self::from_bytes(decoded)
    }

    /// Wraps raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSecretEncoding`] if `bytes` is empty.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(Error::InvalidSecretEncoding);
        }
        if bytes.len() < MIN_SECRET_BYTES {
            tracing::warn!(
                bits = bytes.len() * 8,
                "shared secret is shorter than the 128 bits RFC 4226 requires"
            );
        }
        Ok(Secret(bytes.into_boxed_slice()))
    }

    /// Canonical Base32 form: uppercase, unpadded.
    pub fn to_base32(&self) -> String {
        BASE32_NOPAD.encode(&self.0)
    }

    /// Length of the key in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; empty secrets cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for Secret {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        bool::from((*self.0).ct_eq(&*other.0))
    }
}

impl Eq for Secret {}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Secret")
            .field("len", &self.0.len())
            .finish_non_exhaustive()
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        (*self.0).zeroize();
    }
}

/// Unpadded, case-insensitive Base32 that ignores non-zero trailing bits.
fn lenient_base32() -> Result<Encoding> {
    let mut spec = Specification::new();
    spec.symbols.push_str(BASE32_SYMBOLS);
    spec.translate.from.push_str(&BASE32_SYMBOLS[..26].to_ascii_lowercase());
    spec.translate.to.push_str(&BASE32_SYMBOLS[..26]);
    spec.check_trailing_bits = false;
    spec.encoding().map_err(|_| Error::InvalidSecretEncoding)
}

/// Generates a new secret and returns it in canonical Base32 form.
///
/// This is the string to show the user (or embed in a provisioning URI) and to store against
/// their account.
///
/// ```rust
/// let secret = rfc_6238::generate_secret().unwrap();
/// assert_eq!(secret.len(), 32);
/// assert!(rfc_6238::compute_code(&secret, 0, 30, 6).is_ok());
/// ```
pub fn generate_secret() -> Result<String> {
    Secret::generate().map(|secret| secret.to_base32())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;


    #[test]
    fn generated_secret_is_canonical_base32() {
        let secret = generate_secret().unwrap();
        // 160 bits at 5 bits per character
        assert_eq!(secret.len(), 32);
        assert!(secret.chars().all(|c| BASE32_SYMBOLS.contains(c)));
        assert_eq!(Secret::from_base32(&secret).unwrap().len(), SECRET_BYTES);
    }

    #[test]
    fn generated_secrets_differ() {
        assert_ne!(generate_secret().unwrap(), generate_secret().unwrap());
    }

    #[test]
    fn rfc_secret_round_trip() {
        let secret = Secret::from_base32("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ").unwrap();
        assert_eq!(secret.as_ref(), b"12345678901234567890");
        assert_eq!(secret.to_base32(), "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ");
    }

    #[test]
    fn padding_is_accepted_and_dropped() {
        // 10 bytes = 16 characters unpadded, 11 bytes needs padding
        let secret = Secret::from_base32("GEZDGNBVGY3TQOJQGE======").unwrap();
        assert_eq!(secret.as_ref(), b"12345678901");
        assert_eq!(secret.to_base32(), "GEZDGNBVGY3TQOJQGE");
    }

    #[test]
    fn leftover_bits_are_dropped() {
        // 33 characters carry 165 bits: 20 whole bytes and 5 spare bits
        let long = Secret::from_base32("JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXQ7").unwrap();
        assert_eq!(long.len(), 20);
        assert_eq!(long, Secret::from_base32("JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXQ").unwrap());

        // non-zero trailing bits in the last character
        let secret = Secret::from_base32("GEZDGNBVGY3TQOJQGF").unwrap();
        assert_eq!(secret.as_ref(), b"12345678901");

        assert_eq!(Secret::from_base32("AB").unwrap().as_ref(), &[0_u8]);
        assert_eq!(Secret::from_base32("abc").unwrap().as_ref(), &[0_u8]);
        assert_eq!(Secret::from_base32("ABCDEF").unwrap().len(), 3);
    }

    #[test]
    fn equality() {
        let secret = Secret::from_bytes(b"12345678901234567890".to_vec()).unwrap();
        assert_eq!(secret, secret.clone());
        assert_ne!(secret, Secret::from_bytes(b"12345678901234567891".to_vec()).unwrap());
        assert_ne!(secret, Secret::from_bytes(b"1234567890".to_vec()).unwrap());
    }

    #[test]
    fn malformed_secrets_are_rejected() {
        for input in ["not-base32!!", "", "   ", "========", "ABC1DEFG", "ABCDEFG1", "A"] {
            assert_eq!(
                Secret::from_base32(input),
                Err(Error::InvalidSecretEncoding),
                "{:?}",
                input
            );
        }
    }

    #[test]
    fn empty_bytes_are_rejected() {
        assert_eq!(Secret::from_bytes(Vec::<u8>::new()), Err(Error::InvalidSecretEncoding));
    }

    #[test]
    fn debug_hides_key_material() {
        let secret = Secret::from_bytes(b"12345678901234567890".to_vec()).unwrap();
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("49"));
        assert!(debug.contains("len: 20"));
    }

    #[test]
    #[traced_test]
    fn short_secret_is_logged() {
        Secret::from_base32("JBSWY3DPEHPK3PXP").unwrap();
        assert!(logs_contain("shorter than the 128 bits"));
    }
}
