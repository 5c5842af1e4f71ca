use crate::{
    domain::{
        error::DomainError,
        models::account::{Account, Email},
        repositories::account_repository::AccountRepository,
        services::{
            authentication_service::{PendingMode, VerificationResult, decide},
            password_service::PasswordHasher,
            session_service::{SessionId, SessionStore},
        },
    },
    usecase::run_blocking,
};

const DECOY_PASSWORD: &str = "decoy-password";

#[derive(Debug)]
pub struct LoginResult {
    pub session_id: SessionId,
    pub account: Account,
}

pub struct LoginUsecase<A: AccountRepository, P: PasswordHasher, S: SessionStore> {
    account_repository: A,
    password_hasher: P,
    session_store: S,
    pending_mode: PendingMode,
}

impl<A, P, S> LoginUsecase<A, P, S>
where
    A: AccountRepository + Send + Sync,
    P: PasswordHasher + Send + Sync + 'static,
    S: SessionStore,
{
    pub fn new(account_repository: A, password_hasher: P, session_store: S) -> Self {
        Self {
            account_repository,
            password_hasher,
            session_store,
            pending_mode: PendingMode::default(),
        }
    }

    pub fn with_pending_mode(mut self, pending_mode: PendingMode) -> Self {
        self.pending_mode = pending_mode;
        self
    }

    /// Attempt to log in with an email address and password
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: String) -> Result<LoginResult, DomainError> {
        // An unparseable address cannot belong to anyone.
        let account = match Email::new(email) {
            Ok(email) => self.account_repository.find_by_email(&email).await?,
            Err(_) => None,
        };

        let hasher = self.password_hasher.clone();
        let mode = self.pending_mode;
        let (outcome, account, password) = run_blocking(move || {
            let outcome = decide(account.as_ref(), &password, &hasher, mode);
            if outcome == VerificationResult::NoSuchAccount {
                // Unknown addresses cost one hash, like a wrong password.
                let _ = hasher.hash(DECOY_PASSWORD);
            }
            (outcome, account, password)
        })
        .await?;

        let account = match (outcome, account) {
            (VerificationResult::Success, Some(account)) => account,
            (VerificationResult::PendingCredential, _) => {
                tracing::info!("login rejected: password not set");
                return Err(DomainError::PendingCredential);
            }
            (outcome, _) => {
                tracing::info!(?outcome, "login rejected");
                return Err(DomainError::AuthenticationFailed);
            }
        };

        let account = self.upgrade_hash(account, password).await;
        let session_id = self.authenticate(&account).await?;

        tracing::info!(account_id = %account.id(), "login succeeded");
        Ok(LoginResult {
            session_id,
            account,
        })
    }

    pub async fn logout(&self, session_id: &str) -> Result<(), DomainError> {
        self.session_store.destroy(session_id).await
    }

    /// Save this account as the current account in a new session
    async fn authenticate(&self, account: &Account) -> Result<SessionId, DomainError> {
        self.session_store
            .establish(*account.id(), *account.organization_id())
            .await
    }

    /// Re-hash with the current work factor when the stored hash predates it.
    /// The write only lands while the row still carries the verified hash, so a
    /// password changed in the meantime is never rolled back. Failure here never
    /// fails the login.
    async fn upgrade_hash(&self, account: Account, password: String) -> Account {
        if !account.credential().needs_rehash(&self.password_hasher) {
            return account;
        }
        let Some(verified) = account.credential().hashed_secret().cloned() else {
            return account;
        };

        let hasher = self.password_hasher.clone();
        let original = account.clone();
        let rehashed = run_blocking(move || {
            let mut account = account;
            account.set_password(&password, &hasher).map(|_| account)
        })
        .await
        .and_then(|result| result);

        let account = match rehashed {
            Ok(account) => account,
            Err(e) => {
                tracing::warn!(error = %e, "password rehash failed");
                return original;
            }
        };
        let Some(replacement) = account.credential().hashed_secret().cloned() else {
            return original;
        };

        match self
            .account_repository
            .replace_hashed_password(account.id(), &verified, &replacement)
            .await
        {
            Ok(true) => {
                tracing::info!(
                    account_id = %account.id(),
                    previously_hashed_at = ?original.credential().updated_at(),
                    "password hash upgraded"
                );
                account
            }
            Ok(false) => {
                tracing::info!(account_id = %account.id(), "password changed during login, hash upgrade skipped");
                original
            }
            Err(e) => {
                tracing::warn!(error = %e, "storing upgraded password hash failed");
                original
            }
        }
    }
}
