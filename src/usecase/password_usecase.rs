use crate::{
    domain::{
        error::{DomainError, RepositoryError},
        models::account::{Account, AccountId},
        repositories::{
            account_repository::AccountRepository, security_key_repository::SecurityKeyRepository,
        },
        services::password_service::PasswordHasher,
    },
    usecase::run_blocking,
};

pub struct PasswordUsecase<A: AccountRepository, K: SecurityKeyRepository, P: PasswordHasher> {
    account_repository: A,
    security_key_repository: K,
    password_hasher: P,
}

impl<A, K, P> PasswordUsecase<A, K, P>
where
    A: AccountRepository + Send + Sync,
    K: SecurityKeyRepository + Send + Sync,
    P: PasswordHasher + Send + Sync + 'static,
{
    pub fn new(account_repository: A, security_key_repository: K, password_hasher: P) -> Self {
        Self {
            account_repository,
            security_key_repository,
            password_hasher,
        }
    }

    #[tracing::instrument(skip(self, password))]
    pub async fn set_password(
        &self,
        account_id: &AccountId,
        password: String,
    ) -> Result<Account, DomainError> {
        let account = self
            .account_repository
            .find_by_id(account_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let account = self.store_password(account, password).await?;
        // Outstanding reset links stop working once the owner picks a password.
        self.security_key_repository
            .delete_for_account(account.id())
            .await?;
        Ok(account)
    }

    /// Set a password through the link mailed with login instructions or a
    /// reset request. The key is claimed before the new hash is written, so
    /// concurrent requests with one key cannot both succeed.
    #[tracing::instrument(skip_all)]
    pub async fn set_password_with_key(
        &self,
        key: &str,
        password: String,
    ) -> Result<Account, DomainError> {
        let security_key = self
            .security_key_repository
            .find_by_key(key)
            .await?
            .ok_or(DomainError::InvalidSecurityKey)?;

        let account = self
            .account_repository
            .find_by_id(security_key.account_id())
            .await?
            .ok_or(DomainError::InvalidSecurityKey)?;

        ensure_not_empty(&password)?;
        if !self.security_key_repository.consume(key).await? {
            return Err(DomainError::InvalidSecurityKey);
        }

        self.store_password(account, password).await
    }

    async fn store_password(&self, account: Account, password: String) -> Result<Account, DomainError> {
        ensure_not_empty(&password)?;

        let hasher = self.password_hasher.clone();
        let account = run_blocking(move || {
            let mut account = account;
            account.set_password(&password, &hasher).map(|_| account)
        })
        .await??;

        self.account_repository
            .update_hashed_password(account.id(), account.credential().hashed_secret())
            .await?;

        tracing::info!(account_id = %account.id(), "password changed");
        Ok(account)
    }
}

fn ensure_not_empty(password: &str) -> Result<(), DomainError> {
    if password.is_empty() {
        return Err(DomainError::InvalidInput("password must not be empty"));
    }
    Ok(())
}
