use async_trait::async_trait;

use crate::domain::{
    error::RepositoryError,
    models::{account::AccountId, security_key::SecurityKey},
};

#[async_trait]
pub trait SecurityKeyRepository {
    async fn find_by_account(&self, account_id: &AccountId)
    -> Result<Option<SecurityKey>, RepositoryError>;
    async fn find_by_key(&self, key: &str) -> Result<Option<SecurityKey>, RepositoryError>;
    async fn save(&self, key: &SecurityKey) -> Result<(), RepositoryError>;
    async fn delete_for_account(&self, account_id: &AccountId) -> Result<(), RepositoryError>;

    /// Delete the row holding `key`. Only the caller that removed it gets true.
    async fn consume(&self, key: &str) -> Result<bool, RepositoryError>;
}
