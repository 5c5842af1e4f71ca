use async_trait::async_trait;

use crate::domain::{
    error::RepositoryError,
    models::{
        account::{Account, AccountId, Email},
        credential::HashedPassword,
    },
};

#[async_trait]
pub trait AccountRepository {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError>;
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, RepositoryError>;
    async fn create(&self, account: &Account) -> Result<(), RepositoryError>;

    /// Replace the stored hash in a single-column update
    async fn update_hashed_password(
        &self,
        id: &AccountId,
        hashed_password: Option<&HashedPassword>,
    ) -> Result<(), RepositoryError>;

    /// Swap `expected` for `replacement` only while the row still carries
    /// `expected`. Returns false when the hash changed underneath.
    async fn replace_hashed_password(
        &self,
        id: &AccountId,
        expected: &HashedPassword,
        replacement: &HashedPassword,
    ) -> Result<bool, RepositoryError>;
}
