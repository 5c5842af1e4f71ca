use argon2::PasswordHash;
use chrono::{DateTime, Utc};

use crate::domain::{error::DomainError, services::password_service::PasswordHasher};

/// Value object representing a hashed password in PHC string format.
///
/// Salt and cost parameters are embedded in the string, so no other field is
/// needed to verify against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Wrap a hash freshly produced by a [`PasswordHasher`]
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    /// Validate a hash read back from storage
    pub fn parse(hash: String) -> Result<Self, DomainError> {
        PasswordHash::new(&hash).map_err(|_| DomainError::MalformedHash)?;
        Ok(Self(hash))
    }

    /// Get the hash as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The authentication secret of one account.
///
/// A credential without a hash is *pending*: the account was provisioned but
/// nobody has chosen a password for it yet.
#[derive(Debug, Clone, Default)]
pub struct Credential {
    hashed_secret: Option<HashedPassword>,
    updated_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn reconstruct(
        hashed_secret: Option<HashedPassword>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            hashed_secret,
            updated_at,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.hashed_secret.is_none()
    }

    /// Hash `plaintext` with a fresh salt and replace the stored hash
    pub fn set_secret<P: PasswordHasher>(
        &mut self,
        plaintext: &str,
        hasher: &P,
    ) -> Result<(), DomainError> {
        if plaintext.is_empty() {
            return Err(DomainError::InvalidInput("password must not be empty"));
        }

        let hashed = hasher.hash(plaintext)?;
        self.hashed_secret = Some(hashed);
        self.updated_at = Some(Utc::now());
        Ok(())
    }

    /// Check `plaintext` against the stored hash.
    ///
    /// A pending credential matches nothing and is rejected before any hashing.
    pub fn verify<P: PasswordHasher>(&self, plaintext: &str, hasher: &P) -> bool {
        let Some(hashed) = &self.hashed_secret else {
            return false;
        };

        match hasher.verify(plaintext, hashed) {
            Ok(matched) => matched,
            Err(e) => {
                tracing::warn!(error = %e, "stored password hash could not be verified");
                false
            }
        }
    }

    pub fn needs_rehash<P: PasswordHasher>(&self, hasher: &P) -> bool {
        self.hashed_secret
            .as_ref()
            .is_some_and(|hashed| hasher.needs_rehash(hashed))
    }

    pub fn hashed_secret(&self) -> Option<&HashedPassword> {
        self.hashed_secret.as_ref()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}
