// src/core/credential.rs
//
// Login username/password. Only an HMAC tag is kept: plaintext values are
// signed once at load time, `$hmac-sha256$<b64>` values are the tag already.

use crate::core::error::{AppError, Result};
use base64::Engine;
use ring::hmac;
use std::fmt;

const HASH_PREFIX: &str = "$hmac-sha256$";
const HASH_KEY: &[u8] = b"script-shelf-credential-v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialOrigin {
    ConfigFile,
    Environment,
}

/// A required login value. Never empty, never printed by `Debug`.
#[derive(Clone)]
pub struct Credential {
    tag: Vec<u8>,
    origin: CredentialOrigin,
    plaintext: Option<String>,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({:?}, ***)", self.origin)
    }
}

impl Credential {
    /// `field` names the setting in error messages.
    pub fn parse(field: &str, value: &str, origin: CredentialOrigin) -> Result<Self> {
        if value.is_empty() {
            return Err(AppError::Config(format!("{} must not be empty", field)));
        }

        match value.strip_prefix(HASH_PREFIX) {
            Some(encoded) => {
                let tag = base64::engine::general_purpose::STANDARD
                    .decode(encoded)
                    .ok()
                    .filter(|tag| tag.len() == ring::digest::SHA256_OUTPUT_LEN)
                    .ok_or_else(|| {
                        AppError::Config(format!("{} has a malformed {} hash", field, HASH_PREFIX))
                    })?;
                Ok(Self {
                    tag,
                    origin,
                    plaintext: None,
                })
            }
            None => Ok(Self::plaintext(value, origin)),
        }
    }

    pub(crate) fn plaintext(value: &str, origin: CredentialOrigin) -> Self {
        Self {
            tag: sign(value).as_ref().to_vec(),
            origin,
            plaintext: Some(value.to_string()),
        }
    }

    pub fn origin(&self) -> CredentialOrigin {
        self.origin
    }

    pub fn is_plaintext(&self) -> bool {
        self.plaintext.is_some()
    }

    /// Plaintext as written in the config file, for the first-run banner.
    pub fn display_hint(&self) -> Option<&str> {
        match self.origin {
            CredentialOrigin::ConfigFile => self.plaintext.as_deref(),
            CredentialOrigin::Environment => None,
        }
    }

    /// Constant-time check of a submitted value.
    pub fn verify(&self, provided: &str) -> bool {
        hmac::verify(&key(), provided.as_bytes(), &self.tag).is_ok()
    }
}

/// `$hmac-sha256$<base64>` form accepted in `[auth]`.
pub fn hash_credential(plaintext: &str) -> String {
    format!(
        "{}{}",
        HASH_PREFIX,
        base64::engine::general_purpose::STANDARD.encode(sign(plaintext).as_ref())
    )
}

fn key() -> hmac::Key {
    hmac::Key::new(hmac::HMAC_SHA256, HASH_KEY)
}

fn sign(value: &str) -> hmac::Tag {
    hmac::sign(&key(), value.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_rejected() {
        let err = Credential::parse("auth.password", "", CredentialOrigin::ConfigFile).unwrap_err();
        assert!(err.to_string().contains("auth.password"));
    }

    #[test]
    fn test_plaintext_match_and_mismatch() {
        let cred = Credential::parse("auth.password", "scipt", CredentialOrigin::ConfigFile).unwrap();
        assert!(cred.verify("scipt"));
        assert!(!cred.verify("script"));
        assert!(!cred.verify(""));
        assert!(cred.is_plaintext());
        assert_eq!(cred.display_hint(), Some("scipt"));
    }

    #[test]
    fn test_hashed_value() {
        let hashed = hash_credential("hunter2");
        let cred = Credential::parse("auth.password", &hashed, CredentialOrigin::ConfigFile).unwrap();
        assert!(!cred.is_plaintext());
        assert!(cred.verify("hunter2"));
        assert!(!cred.verify("hunter3"));
        assert!(!cred.verify(&hashed));
        assert_eq!(cred.display_hint(), None);
    }

    #[test]
    fn test_malformed_hash_is_config_error() {
        for bad in ["$hmac-sha256$%%%", "$hmac-sha256$c2hvcnQ="] {
            assert!(matches!(
                Credential::parse("auth.username", bad, CredentialOrigin::ConfigFile),
                Err(AppError::Config(_))
            ));
        }
    }

    #[test]
    fn test_env_value_has_no_hint() {
        let cred = Credential::parse("SCRIPT_SERVER_PASSWORD", "from-env", CredentialOrigin::Environment)
            .unwrap();
        assert!(cred.verify("from-env"));
        assert_eq!(cred.origin(), CredentialOrigin::Environment);
        assert_eq!(cred.display_hint(), None);
    }

    #[test]
    fn test_debug_does_not_leak() {
        let cred = Credential::plaintext("top-secret", CredentialOrigin::ConfigFile);
        assert!(!format!("{:?}", cred).contains("top-secret"));
    }

    #[test]
    fn test_hash_format() {
        let hashed = hash_credential("test");
        // 32-byte tag
        assert_eq!(hashed.strip_prefix(HASH_PREFIX).unwrap().len(), 44);
    }
}
