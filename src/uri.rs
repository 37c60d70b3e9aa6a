//! `otpauth://` provisioning URIs, in the [Key URI Format][kuf] authenticator apps scan from QR
//! codes:
//!
//! ```text
//! otpauth://totp/ISSUER:ACCOUNT?secret=BASE32&issuer=ISSUER&algorithm=SHA1&digits=6&period=30
//! ```
//!
//! [kuf]: https://github.com/google/google-authenticator/wiki/Key-Uri-Format

use core::fmt;
use core::str::FromStr;

use url::Url;

use crate::length::Digits;
use crate::secret::Secret;
use crate::totp::Totp;
use crate::{Error, Result};

/// Everything an authenticator app needs to start producing tokens for an account.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProvisioningUri {
    /// Service the account belongs to. May be empty, in which case it is left out of the URI.
    pub issuer: String,
    /// Account name, usually an email address.
    pub account: String,
    /// Shared secret, emitted in canonical Base32.
    pub secret: Secret,
    /// Algorithm, digits and period. The skew is a verifier-side setting and never appears in
    /// the URI; parsing yields the default.
    pub totp: Totp,
}

impl fmt::Display for ProvisioningUri {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let account = urlencoding::encode(&self.account);
        f.write_str("otpauth://totp/")?;
        if self.issuer.is_empty() {
            write!(f, "{}?secret={}", account, self.secret.to_base32())?;
        } else {
            let issuer = urlencoding::encode(&self.issuer);
            write!(
                f,
                "{}:{}?secret={}&issuer={}",
                issuer,
                account,
                self.secret.to_base32(),
                issuer
            )?;
        }
        write!(
            f,
            "&algorithm={}&digits={}&period={}",
            self.totp.algorithm, self.totp.digits, self.totp.period
        )
    }
}

impl ProvisioningUri {
    /// Parses a provisioning URI.
    ///
    /// Parameters the URI leaves out take the defaults authenticator apps assume (SHA1, 6 digits,
    /// 30 seconds). An `issuer` parameter takes precedence over an issuer prefix in the label.
    ///
    /// ```rust
    /// # use rfc_6238::ProvisioningUri;
    /// let uri: ProvisioningUri =
    ///     "otpauth://totp/ACME%20Co:jane%40example.com?secret=JBSWY3DPEHPK3PXP&issuer=ACME%20Co"
    ///         .parse()
    ///         .unwrap();
    /// assert_eq!(uri.issuer, "ACME Co");
    /// assert_eq!(uri.account, "jane@example.com");
    /// assert_eq!(uri.totp.period, 30);
    /// ```
    ///
    /// # Errors
    ///
    /// [`Error::InvalidUri`] for anything that is not a well-formed `otpauth://totp/` URI with
    /// supported parameters; [`Error::InvalidSecretEncoding`] for a bad `secret`.
    pub fn parse(uri: &str) -> Result<Self> {
        let url = Url::parse(uri).map_err(|e| Error::InvalidUri(e.to_string()))?;
        if url.scheme() != "otpauth" {
            return Err(Error::InvalidUri(format!(
                "expected scheme otpauth, found {}",
                url.scheme()
            )));
        }
        match url.host_str() {
            Some(kind) if kind.eq_ignore_ascii_case("totp") => {}
            other => {
                return Err(Error::InvalidUri(format!(
                    "expected a totp URI, found {:?}",
                    other
                )))
            }
        }

        let label = url.path().trim_start_matches('/');
        let (label_issuer, account) = match label.split_once(':') {
            Some((issuer, account)) => (Some(decode(issuer)?), decode(account)?),
            None => {
                // Some generators percent-encode the separator as well
                let decoded = decode(label)?;
                match decoded.split_once(':') {
                    Some((issuer, account)) => (Some(issuer.to_owned()), account.to_owned()),
                    None => (None, decoded),
                }
            }
        };

        let mut secret = None;
        let mut issuer = None;
        let mut totp = Totp::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "secret" => secret = Some(Secret::from_base32(&value)?),
                "issuer" => issuer = Some(value.into_owned()),
                "algorithm" => totp.algorithm = value.parse()?,
                "digits" => {
                    totp.digits = value
                        .parse::<u8>()
                        .ok()
                        .and_then(|digits| Digits::try_from(digits).ok())
                        .ok_or_else(|| Error::InvalidUri(format!("bad digits {:?}", value)))?;
                }
                "period" => {
                    totp.period = match value.parse::<u64>() {
                        Ok(period) if period > 0 => period,
                        _ => return Err(Error::InvalidUri(format!("bad period {:?}", value))),
                    };
                }
                _ => tracing::debug!(parameter = %key, "ignoring provisioning URI parameter"),
            }
        }

        let secret = secret.ok_or_else(|| Error::InvalidUri("missing secret".to_owned()))?;
        Ok(ProvisioningUri {
            issuer: issuer.or(label_issuer).unwrap_or_default(),
            account: account.trim().to_owned(),
            secret,
            totp,
        })
    }
}

impl FromStr for ProvisioningUri {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn decode(component: &str) -> Result<String> {
    urlencoding::decode(component)
        .map(|decoded| decoded.trim().to_owned())
        .map_err(|e| Error::InvalidUri(e.to_string()))
}

/// Provisioning URI for a Base32 `secret` with the default parameters (SHA1, 6 digits, 30
/// seconds).
///
/// The secret is re-emitted in canonical form, uppercase without padding, whatever form it was
/// given in; `issuer` and `account` are percent-encoded.
///
/// ```rust
/// let uri = rfc_6238::provisioning_uri("jbswy3dpehpk3pxp", "jane@example.com", "ACME Co").unwrap();
/// assert_eq!(
///     uri,
///     "otpauth://totp/ACME%20Co:jane%40example.com?secret=JBSWY3DPEHPK3PXP\
///      &issuer=ACME%20Co&algorithm=SHA1&digits=6&period=30"
/// );
/// ```
///
/// # Errors
///
/// [`Error::InvalidSecretEncoding`] if `secret` is not Base32.
pub fn provisioning_uri(secret: &str, account: &str, issuer: &str) -> Result<String> {
    let secret = Secret::from_base32(secret)?;
    Ok(Totp::default().provisioning_uri(&secret, account, issuer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::Algorithm;

    const SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    #[test]
    fn default_format() {
        assert_eq!(
            provisioning_uri(SECRET, "alice", "Example").unwrap(),
            "otpauth://totp/Example:alice?secret=GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ\
             &issuer=Example&algorithm=SHA1&digits=6&period=30"
        );
    }

    #[test]
    fn labels_are_percent_encoded() {
        let uri = provisioning_uri(SECRET, "test+user@example.com", "My App & Service").unwrap();
        assert!(uri.starts_with("otpauth://totp/My%20App%20%26%20Service:test%2Buser%40example.com?"));
        assert!(uri.contains("&issuer=My%20App%20%26%20Service&"));
    }

    #[test]
    fn secret_is_canonical() {
        let uri = provisioning_uri("gezdgnbvgy3tqojqge======", "alice", "Example").unwrap();
        assert!(uri.contains("secret=GEZDGNBVGY3TQOJQGE&"));
        assert!(!uri.contains("=="));
    }

    #[test]
    fn bad_secret() {
        assert_eq!(
            provisioning_uri("not-base32!!", "alice", "Example"),
            Err(Error::InvalidSecretEncoding)
        );
    }

    #[test]
    fn configuration_is_carried() {
        let secret = Secret::from_base32(SECRET).unwrap();
        let totp = Totp::new()
            .with_algorithm(Algorithm::Sha512)
            .with_digits(Digits::EIGHT)
            .with_period(60);
        let uri = totp.provisioning_uri(&secret, "alice", "Example");
        assert!(uri.ends_with("&algorithm=SHA512&digits=8&period=60"));
    }

    #[test]
    fn empty_issuer_is_omitted() {
        let uri = provisioning_uri(SECRET, "alice", "").unwrap();
        assert!(uri.starts_with("otpauth://totp/alice?secret="));
        assert!(!uri.contains("issuer="));
    }

    #[test]
    fn parse_round_trip() {
        let secret = Secret::from_base32(SECRET).unwrap();
        let totp = Totp::new().with_digits(Digits::EIGHT).with_period(45);
        let uri = totp.provisioning_uri(&secret, "a:b@example.com", "Foo & Bar");
        let parsed = ProvisioningUri::parse(&uri).unwrap();
        assert_eq!(parsed.issuer, "Foo & Bar");
        assert_eq!(parsed.account, "a:b@example.com");
        assert_eq!(parsed.secret, secret);
        assert_eq!(parsed.totp, totp);
        assert_eq!(parsed.to_string(), uri);
    }

    #[test]
    fn parse_defaults_and_label_issuer() {
        let parsed: ProvisioningUri = "otpauth://totp/Example:alice?secret=JBSWY3DPEHPK3PXP"
            .parse()
            .unwrap();
        assert_eq!(parsed.issuer, "Example");
        assert_eq!(parsed.account, "alice");
        assert_eq!(parsed.totp, Totp::default());

        let parsed = ProvisioningUri::parse("otpauth://totp/alice?secret=JBSWY3DPEHPK3PXP").unwrap();
        assert_eq!(parsed.issuer, "");
        assert_eq!(parsed.account, "alice");

        let parsed =
            ProvisioningUri::parse("otpauth://totp/Example%3Aalice?secret=JBSWY3DPEHPK3PXP")
                .unwrap();
        assert_eq!(parsed.issuer, "Example");
        assert_eq!(parsed.account, "alice");
    }

    #[test]
    fn parse_rejects() {
        for uri in [
            "https://totp/Example:alice?secret=JBSWY3DPEHPK3PXP",
            "otpauth://hotp/Example:alice?secret=JBSWY3DPEHPK3PXP&counter=0",
            "otpauth://totp/Example:alice",
            "otpauth://totp/Example:alice?secret=JBSWY3DPEHPK3PXP&algorithm=MD5",
            "otpauth://totp/Example:alice?secret=JBSWY3DPEHPK3PXP&digits=4",
            "otpauth://totp/Example:alice?secret=JBSWY3DPEHPK3PXP&digits=six",
            "otpauth://totp/Example:alice?secret=JBSWY3DPEHPK3PXP&period=0",
            "not a uri",
        ] {
            assert!(ProvisioningUri::parse(uri).is_err(), "{}", uri);
        }
        assert_eq!(
            ProvisioningUri::parse("otpauth://totp/Example:alice?secret=1!"),
            Err(Error::InvalidSecretEncoding)
        );
    }
}
