//! HMAC digest types and traits.

use core::fmt;
use core::str::FromStr;

use ring::hmac::{self, Key as HmacKey, Tag};

use crate::length::{Digits, Token};
use crate::Error;

/// HMAC algorithm used to hash the moving factor.
///
/// [RFC 4226][4226] prescribes HMAC-SHA1. [RFC 6238][6238] extends TOTP to allow HMAC-SHA256 and
/// HMAC-SHA512. Authenticator apps overwhelmingly support only SHA1, which is the default.
///
/// [4226]: https://datatracker.ietf.org/doc/html/rfc4226
/// [6238]: https://datatracker.ietf.org/doc/html/rfc6238
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum Algorithm {
    /// HMAC-SHA1.
    #[default]
    Sha1,
    /// HMAC-SHA256.
    Sha256,
    /// HMAC-SHA512.
    Sha512,
}

impl Algorithm {
    fn ring(self) -> hmac::Algorithm {
        match self {
            Algorithm::Sha1 => hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY,
            Algorithm::Sha256 => hmac::HMAC_SHA256,
            Algorithm::Sha512 => hmac::HMAC_SHA512,
        }
    }

    /// Name used for the `algorithm` parameter of a provisioning URI.
    pub fn uri_name(self) -> &'static str {
        match self {
            Algorithm::Sha1 => "SHA1",
            Algorithm::Sha256 => "SHA256",
            Algorithm::Sha512 => "SHA512",
        }
    }

    /// Computes `HMAC(key, counter)` with the counter as an 8-byte big-endian integer.
    pub fn sign(self, key: &[u8], counter: u64) -> Tag {
        let key = HmacKey::new(self.ring(), key);
        hmac::sign(&key, &counter.to_be_bytes())
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.uri_name())
    }
}

impl FromStr for Algorithm {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "").as_str() {
            "SHA1" => Ok(Algorithm::Sha1),
            "SHA256" => Ok(Algorithm::Sha256),
            "SHA512" => Ok(Algorithm::Sha512),
            _ => Err(Error::InvalidUri(format!("unsupported algorithm {:?}", s))),
        }
    }
}

/// Trait enabling dynamic truncation of any digest.
///
/// Implemented for `ring`'s HMAC [`Tag`] and for raw byte arrays, so that a digest computed
/// elsewhere (or taken from the RFC's worked example) can be truncated the same way.
///
/// # Notes
///
/// Implementors should take care that their digests are always at least 16 bytes long, or
/// [`Digest::truncated`] (and with it [`Digest::truncate`]) will panic.
pub trait Digest: AsRef<[u8]> {
    /// The 31-bit value selected by "dynamic truncation" ([RFC 4226 §5.3][5.3]).
    ///
    /// [5.3]: https://datatracker.ietf.org/doc/html/rfc4226#section-5.3
    ///
    /// # Panics
    ///
    /// Attempting to truncate a digest of length less than 16 bytes will unconditionally trigger
    /// a panic. This will never occur for digests produced by [`Algorithm::sign`].
    fn truncated(&self) -> u32 {
        let digest = self.as_ref();
        let len = digest.len();
        // Four bits form the index, so at least 16 bytes are needed to stay in bounds.
        assert!(len >= 16);
        let index = (digest[len - 1] & 0xf) as usize;
        let bytes = [
            // Strip leading bit to remove signed/unsigned ambiguity
            digest[index] & 0x7f,
            digest[index + 1],
            digest[index + 2],
            digest[index + 3],
        ];
        u32::from_be_bytes(bytes)
    }

    /// Truncate the digest to a token of the given length.
    fn truncate(&self, length: Digits) -> Token {
        Token::new(self.truncated(), length)
    }
}

impl Digest for Tag {}

impl<const N: usize> Digest for [u8; N] {}
