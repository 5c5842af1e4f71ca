use async_trait::async_trait;

use crate::domain::{
    error::DomainError,
    models::{account::Account, security_key::SecurityKey},
};

/// Out-of-band delivery of security keys to account holders
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sent when someone else provisioned the account and no password is set yet
    async fn send_login_instructions(
        &self,
        account: &Account,
        key: &SecurityKey,
    ) -> Result<(), DomainError>;

    async fn send_reset_request(&self, account: &Account, key: &SecurityKey)
    -> Result<(), DomainError>;
}
