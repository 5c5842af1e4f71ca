use crate::domain::{
    error::{DomainError, RepositoryError},
    models::{
        account::{Account, AccountId, Email, Role},
        security_key::SecurityKey,
    },
    repositories::{
        account_repository::AccountRepository, security_key_repository::SecurityKeyRepository,
    },
    services::notification_service::Notifier,
};

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
}

pub struct AccountUsecase<A: AccountRepository, K: SecurityKeyRepository, N: Notifier> {
    account_repository: A,
    security_key_repository: K,
    notifier: N,
}

impl<A, K, N> AccountUsecase<A, K, N>
where
    A: AccountRepository + Send + Sync,
    K: SecurityKeyRepository + Send + Sync,
    N: Notifier,
{
    pub fn new(account_repository: A, security_key_repository: K, notifier: N) -> Self {
        Self {
            account_repository,
            security_key_repository,
            notifier,
        }
    }

    /// An administrator adds a colleague to their organization. The new
    /// account has no password until its owner follows the mailed link.
    #[tracing::instrument(skip(self, new_account), fields(email = %new_account.email))]
    pub async fn provision(
        &self,
        creator_id: &AccountId,
        new_account: NewAccount,
    ) -> Result<Account, DomainError> {
        let creator = self.administrator(creator_id).await?;

        let account = Account::new(
            AccountId::new(),
            *creator.organization_id(),
            new_account.first_name,
            new_account.last_name,
            Email::new(&new_account.email)?,
            new_account.role,
        )?;
        self.account_repository.create(&account).await?;
        tracing::info!(account_id = %account.id(), creator_id = %creator_id, "account provisioned");

        self.deliver_login_instructions(&account).await?;
        Ok(account)
    }

    /// Re-send login instructions for a pending account of the requester's organization
    pub async fn send_login_instructions(
        &self,
        requester_id: &AccountId,
        account_id: &AccountId,
    ) -> Result<(), DomainError> {
        let requester = self.administrator(requester_id).await?;
        let account = self
            .account_repository
            .find_by_id(account_id)
            .await?
            .filter(|account| account.organization_id() == requester.organization_id())
            .ok_or(RepositoryError::NotFound)?;
        if !account.is_pending() {
            return Err(DomainError::InvalidInput("account already has a password"));
        }

        self.deliver_login_instructions(&account).await
    }

    /// Mail a reset link. Unknown addresses succeed silently.
    #[tracing::instrument(skip(self))]
    pub async fn request_password_reset(&self, email: &str) -> Result<(), DomainError> {
        let Ok(email) = Email::new(email) else {
            return Ok(());
        };
        let Some(account) = self.account_repository.find_by_email(&email).await? else {
            tracing::debug!("password reset requested for unknown address");
            return Ok(());
        };

        let key = self.ensure_security_key(&account).await?;
        self.notifier.send_reset_request(&account, &key).await
    }

    async fn administrator(&self, account_id: &AccountId) -> Result<Account, DomainError> {
        self.account_repository
            .find_by_id(account_id)
            .await?
            .filter(Account::is_administrator)
            .ok_or(DomainError::Forbidden)
    }

    async fn deliver_login_instructions(&self, account: &Account) -> Result<(), DomainError> {
        let key = self.ensure_security_key(account).await?;
        self.notifier.send_login_instructions(account, &key).await
    }

    async fn ensure_security_key(&self, account: &Account) -> Result<SecurityKey, DomainError> {
        if let Some(key) = self
            .security_key_repository
            .find_by_account(account.id())
            .await?
        {
            return Ok(key);
        }

        let key = SecurityKey::generate(*account.id())?;
        self.security_key_repository.save(&key).await?;
        Ok(key)
    }
}
