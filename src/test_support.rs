//! In-memory collaborators shared by the use case and handler tests.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::prelude::Uuid;
use tokio::sync::RwLock;

use crate::{
    config::HashingConfig,
    domain::{
        error::{DomainError, RepositoryError},
        models::{
            account::{Account, AccountId, Email, OrganizationId, Role},
            credential::{Credential, HashedPassword},
            security_key::SecurityKey,
        },
        repositories::{
            account_repository::AccountRepository, security_key_repository::SecurityKeyRepository,
        },
        services::{notification_service::Notifier, password_service::PasswordHasher},
    },
    infrastructure::argon2_password_hasher::Argon2PasswordHasher,
};

pub const ORGANIZATION_ID: &str = "00000000-0000-0000-0000-0000000000aa";

pub fn hasher() -> Argon2PasswordHasher {
    Argon2PasswordHasher::new(&HashingConfig::fast()).unwrap()
}

pub fn organization_id() -> OrganizationId {
    OrganizationId::from_uuid(Uuid::parse_str(ORGANIZATION_ID).unwrap())
}

pub fn account(email: &str, role: Role, password: Option<&str>) -> Account {
    let mut account = Account::new(
        AccountId::new(),
        organization_id(),
        "Test".to_string(),
        "User".to_string(),
        Email::new(email).unwrap(),
        role,
    )
    .unwrap();
    if let Some(password) = password {
        account.set_password(password, &hasher()).unwrap();
    }
    account
}

#[derive(Clone, Default)]
pub struct InMemoryAccountRepository {
    accounts: Arc<RwLock<HashMap<AccountId, Account>>>,
}

impl InMemoryAccountRepository {
    pub fn with(accounts: impl IntoIterator<Item = Account>) -> Self {
        let accounts = accounts
            .into_iter()
            .map(|account| (*account.id(), account))
            .collect();
        Self {
            accounts: Arc::new(RwLock::new(accounts)),
        }
    }

    pub async fn stored(&self, id: &AccountId) -> Option<Account> {
        self.accounts.read().await.get(id).cloned()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|a| a.email() == email).cloned())
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, RepositoryError> {
        Ok(self.stored(id).await)
    }

    async fn create(&self, account: &Account) -> Result<(), RepositoryError> {
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.email() == account.email()) {
            return Err(RepositoryError::Conflict);
        }
        accounts.insert(*account.id(), account.clone());
        Ok(())
    }

    async fn update_hashed_password(
        &self,
        id: &AccountId,
        hashed_password: Option<&HashedPassword>,
    ) -> Result<(), RepositoryError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts.get_mut(id).ok_or(RepositoryError::NotFound)?;
        *account = reloaded(account, hashed_password)?;
        Ok(())
    }

    async fn replace_hashed_password(
        &self,
        id: &AccountId,
        expected: &HashedPassword,
        replacement: &HashedPassword,
    ) -> Result<bool, RepositoryError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if account.credential().hashed_secret() != Some(expected) {
            return Ok(false);
        }
        *account = reloaded(account, Some(replacement))?;
        Ok(true)
    }
}

/// Rebuild from the stored fields the same way a database reload would.
fn reloaded(
    account: &Account,
    hashed_password: Option<&HashedPassword>,
) -> Result<Account, RepositoryError> {
    let credential = Credential::reconstruct(hashed_password.cloned(), Some(Utc::now()));
    Account::reconstruct(
        *account.id(),
        *account.organization_id(),
        account.first_name().to_string(),
        account.last_name().to_string(),
        account.email().clone(),
        account.role(),
        credential,
    )
    .map_err(RepositoryError::corrupt)
}

#[derive(Clone, Default)]
pub struct InMemorySecurityKeyRepository {
    keys: Arc<RwLock<HashMap<AccountId, SecurityKey>>>,
}

impl InMemorySecurityKeyRepository {
    pub async fn for_account(&self, account_id: &AccountId) -> Option<SecurityKey> {
        self.keys.read().await.get(account_id).cloned()
    }
}

#[async_trait]
impl SecurityKeyRepository for InMemorySecurityKeyRepository {
    async fn find_by_account(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<SecurityKey>, RepositoryError> {
        Ok(self.for_account(account_id).await)
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<SecurityKey>, RepositoryError> {
        let keys = self.keys.read().await;
        Ok(keys.values().find(|k| k.key() == key).cloned())
    }

    async fn save(&self, key: &SecurityKey) -> Result<(), RepositoryError> {
        let mut keys = self.keys.write().await;
        if keys.contains_key(key.account_id()) {
            return Err(RepositoryError::Conflict);
        }
        keys.insert(*key.account_id(), key.clone());
        Ok(())
    }

    async fn delete_for_account(&self, account_id: &AccountId) -> Result<(), RepositoryError> {
        self.keys.write().await.remove(account_id);
        Ok(())
    }

    async fn consume(&self, key: &str) -> Result<bool, RepositoryError> {
        let mut keys = self.keys.write().await;
        let owner = keys
            .values()
            .find(|k| k.key() == key)
            .map(|k| *k.account_id());
        Ok(owner.and_then(|id| keys.remove(&id)).is_some())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    LoginInstructions { account_id: AccountId, key: String },
    ResetRequest { account_id: AccountId, key: String },
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    deliveries: Arc<RwLock<Vec<Delivery>>>,
}

impl RecordingNotifier {
    pub async fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.read().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_login_instructions(
        &self,
        account: &Account,
        key: &SecurityKey,
    ) -> Result<(), DomainError> {
        self.deliveries.write().await.push(Delivery::LoginInstructions {
            account_id: *account.id(),
            key: key.key().to_string(),
        });
        Ok(())
    }

    async fn send_reset_request(
        &self,
        account: &Account,
        key: &SecurityKey,
    ) -> Result<(), DomainError> {
        self.deliveries.write().await.push(Delivery::ResetRequest {
            account_id: *account.id(),
            key: key.key().to_string(),
        });
        Ok(())
    }
}

/// Hasher that counts calls and never matches; used to prove a code path skips hashing
#[derive(Clone, Default)]
pub struct CountingHasher {
    pub calls: Arc<AtomicUsize>,
}

impl PasswordHasher for CountingHasher {
    fn hash(&self, _plain_password: &str) -> Result<HashedPassword, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(HashedPassword::new("$argon2id$counted".to_string()))
    }

    fn verify(&self, _plain_password: &str, _hashed_password: &HashedPassword) -> Result<bool, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(false)
    }
}
