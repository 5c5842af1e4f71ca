use async_trait::async_trait;

use crate::domain::{
    error::DomainError,
    models::{account::Account, security_key::SecurityKey},
    services::notification_service::Notifier,
};

/// Notifier that records deliveries in the log instead of sending mail.
/// The key itself is never logged.
#[derive(Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_login_instructions(
        &self,
        account: &Account,
        _key: &SecurityKey,
    ) -> Result<(), DomainError> {
        tracing::info!(
            account_id = %account.id(),
            to = %account.rfc_email(),
            "login instructions queued"
        );
        Ok(())
    }

    async fn send_reset_request(
        &self,
        account: &Account,
        _key: &SecurityKey,
    ) -> Result<(), DomainError> {
        tracing::info!(
            account_id = %account.id(),
            to = %account.rfc_email(),
            "password reset request queued"
        );
        Ok(())
    }
}
