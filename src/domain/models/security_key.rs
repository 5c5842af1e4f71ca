use chrono::{DateTime, Utc};
use rand_core::{OsRng, TryRngCore};

use crate::domain::{error::DomainError, models::account::AccountId};

const KEY_BYTES: usize = 32;

/// Single-use secret mailed to an account holder so they can choose a
/// password without knowing the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityKey {
    account_id: AccountId,
    key: String,
    created_at: DateTime<Utc>,
}

impl SecurityKey {
    pub fn generate(account_id: AccountId) -> Result<Self, DomainError> {
        Ok(Self {
            account_id,
            key: generate_token(KEY_BYTES)?,
            created_at: Utc::now(),
        })
    }

    pub fn reconstruct(account_id: AccountId, key: String, created_at: DateTime<Utc>) -> Self {
        Self {
            account_id,
            key,
            created_at,
        }
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Hex encoded random token drawn from the OS generator
pub fn generate_token(len: usize) -> Result<String, DomainError> {
    let mut bytes = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| DomainError::Random(e.to_string()))?;

    Ok(hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_keys_are_hex_and_unique() {
        let account_id = AccountId::new();
        let first = SecurityKey::generate(account_id).unwrap();
        let second = SecurityKey::generate(account_id).unwrap();

        assert_eq!(first.key().len(), KEY_BYTES * 2);
        assert_eq!(hex::decode(first.key()).unwrap().len(), KEY_BYTES);
        assert_ne!(first.key(), second.key());
        assert_eq!(first.account_id(), &account_id);
    }

    #[test]
    fn test_generate_token_decodes_to_requested_bytes() {
        let token = generate_token(16).unwrap();
        assert_eq!(token.len(), 32);
        assert_eq!(hex::decode(&token).unwrap().len(), 16);
        assert_eq!(token, token.to_ascii_lowercase());
    }
}
