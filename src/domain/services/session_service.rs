use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    error::DomainError,
    models::account::{AccountId, OrganizationId},
};

pub type SessionId = String;

/// What an authenticated session remembers about its visitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub account_id: AccountId,
    pub organization_id: OrganizationId,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Log a visitor in as `account_id`
    async fn establish(
        &self,
        account_id: AccountId,
        organization_id: OrganizationId,
    ) -> Result<SessionId, DomainError>;

    async fn get(&self, session_id: &str) -> Result<Option<Session>, DomainError>;

    async fn destroy(&self, session_id: &str) -> Result<(), DomainError>;
}
