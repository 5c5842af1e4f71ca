use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::{
    error::DomainError,
    models::{
        account::{AccountId, OrganizationId},
        security_key::generate_token,
    },
    services::session_service::{Session, SessionId, SessionStore},
};

const SESSION_ID_BYTES: usize = 32;

/// Process-local session store
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn establish(
        &self,
        account_id: AccountId,
        organization_id: OrganizationId,
    ) -> Result<SessionId, DomainError> {
        let session_id = generate_token(SESSION_ID_BYTES)?;
        let session = Session {
            account_id,
            organization_id,
            created_at: Utc::now(),
        };

        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id.clone(), session);
        tracing::debug!(%account_id, active = sessions.len(), "session established");

        Ok(session_id)
    }

    async fn get(&self, session_id: &str) -> Result<Option<Session>, DomainError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).cloned())
    }

    async fn destroy(&self, session_id: &str) -> Result<(), DomainError> {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.remove(session_id) {
            let age = Utc::now() - session.created_at;
            tracing::debug!(
                account_id = %session.account_id,
                age_secs = age.num_seconds(),
                "session destroyed"
            );
        }
        Ok(())
    }
}
