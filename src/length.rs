//! Token lengths and the tokens themselves.

use core::fmt;

use crate::Error;

const MIN_DIGITS: u8 = 6;
const MAX_DIGITS: u8 = 9;

/// Number of decimal digits in a token.
///
/// Per [RFC 4226][4226], HOTP tokens MUST be of length at least 6 and possibly of length 7 or 8.
/// Appendix E suggests that 9-digit codes are also allowed. [RFC 6238][6238] does not restrict
/// the length any further, so `Digits` accepts 6, 7, 8, or 9.
///
/// The length is checked at construction, so a `Digits` in hand is always usable:
///
/// ```rust
/// # use rfc_6238::Digits;
/// assert!(Digits::try_from(8).is_ok());
/// assert!(Digits::try_from(5).is_err());
/// assert!(Digits::try_from(10).is_err());
/// ```
///
/// [4226]: https://datatracker.ietf.org/doc/html/rfc4226
/// [6238]: https://datatracker.ietf.org/doc/html/rfc6238
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub struct Digits(u8);

impl Digits {
    /// Six digits, the length every common authenticator app expects.
    pub const SIX: Digits = Digits(6);
    /// Eight digits, the length used by the RFC 6238 reference vectors.
    pub const EIGHT: Digits = Digits(8);

    /// The number of digits.
    pub fn get(self) -> u8 {
        self.0
    }

    /// `10^digits`, the modulus applied to the truncated value.
    pub(crate) fn modulus(self) -> u32 {
        10_u32.pow(self.0.into())
    }
}

impl Default for Digits {
    fn default() -> Self {
        Digits::SIX
    }
}

impl TryFrom<u8> for Digits {
    type Error = Error;
    fn try_from(digits: u8) -> Result<Self, Self::Error> {
        if (MIN_DIGITS..=MAX_DIGITS).contains(&digits) {
            Ok(Digits(digits))
        } else {
            Err(Error::Digits(digits))
        }
    }
}

impl From<Digits> for u8 {
    fn from(digits: Digits) -> u8 {
        digits.0
    }
}

impl fmt::Display for Digits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A one-time token.
///
/// Tokens are numbers, but they are presented (and compared) as fixed-width decimal strings:
/// the `Display` implementation pads with leading zeroes to exactly the token's length.
///
/// ```rust
/// # use rfc_6238::{Digits, Token};
/// let token = Token::new(42, Digits::SIX);
/// assert_eq!(token.to_string(), "000042");
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Token {
    value: u32,
    length: Digits,
}

impl Token {
    /// Builds a token, reducing `value` modulo `10^length`.
    pub fn new(value: u32, length: Digits) -> Self {
        Token {
            value: value % length.modulus(),
            length,
        }
    }

    /// The numeric value of the token.
    pub fn value(&self) -> u32 {
        self.value
    }

    /// The token's length in digits.
    pub fn length(&self) -> Digits {
        self.length
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:0width$}", self.value, width = usize::from(self.length.0))
    }
}
