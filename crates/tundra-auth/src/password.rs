//! Secret hashing and verification using Argon2id.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use crate::error::AuthError;

/// Hashes and verifies secrets (passwords and one-time codes).
pub trait SecretHasher: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String, AuthError>;

    /// `Ok(false)` on mismatch; `Err` only when `digest` is malformed.
    fn verify(&self, plain: &str, digest: &str) -> Result<bool, AuthError>;
}

/// Argon2id with OWASP-recommended parameters (memory: 19 MiB,
/// iterations: 2, parallelism: 1) and an optional server-side pepper.
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher {
    pepper: Option<String>,
}

impl Argon2Hasher {
    pub fn new(pepper: Option<String>) -> Self {
        Self { pepper }
    }

    fn argon2() -> Result<Argon2<'static>, AuthError> {
        // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
        let params = argon2::Params::new(19456, 2, 1, None)
            .map_err(|e| AuthError::Crypto(format!("argon2 params error: {e}")))?;
        Ok(Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            params,
        ))
    }

    fn peppered(&self, plain: &str) -> String {
        match &self.pepper {
            Some(p) => format!("{p}{plain}"),
            None => plain.to_owned(),
        }
    }
}

impl SecretHasher for Argon2Hasher {
    fn hash(&self, plain: &str) -> Result<String, AuthError> {
        let input = self.peppered(plain);
        let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
        let hash = Self::argon2()?
            .hash_password(input.as_bytes(), &salt)
            .map_err(|e| AuthError::Crypto(format!("hash error: {e}")))?;
        Ok(hash.to_string())
    }

    fn verify(&self, plain: &str, digest: &str) -> Result<bool, AuthError> {
        verify_secret(plain, digest, self.pepper.as_deref())
    }
}

/// Verify a plaintext secret against an Argon2id PHC-format hash.
///
/// If `pepper` is provided it is prepended to the secret before
/// verification — this must match the pepper used during hashing.
/// The PHC string carries its own parameters, so hashes made with other
/// Argon2 settings still verify.
pub fn verify_secret(plain: &str, digest: &str, pepper: Option<&str>) -> Result<bool, AuthError> {
    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{plain}");
            peppered.as_bytes()
        }
        None => plain.as_bytes(),
    };

    let parsed_hash = argon2::PasswordHash::new(digest)
        .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;

    match Argon2::default().verify_password(input, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_secret_matches() {
        let hasher = Argon2Hasher::default();
        let hash = hasher.hash("hunter22").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("hunter22", &hash).unwrap());
    }

    #[test]
    fn wrong_secret_does_not_match() {
        let hasher = Argon2Hasher::default();
        let hash = hasher.hash("hunter22").unwrap();
        assert!(!hasher.verify("wrong", &hash).unwrap());
    }

    #[test]
    fn pepper_is_applied() {
        let peppered = Argon2Hasher::new(Some("pepper!".into()));
        let hash = peppered.hash("hunter22").unwrap();
        assert!(peppered.verify("hunter22", &hash).unwrap());
        // Without pepper should fail.
        assert!(!Argon2Hasher::default().verify("hunter22", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_returns_error() {
        assert!(verify_secret("pw", "not-a-hash", None).is_err());
    }

    #[test]
    fn same_secret_hashes_differently() {
        let hasher = Argon2Hasher::default();
        assert_ne!(hasher.hash("123456").unwrap(), hasher.hash("123456").unwrap());
    }
}
