use sea_orm::prelude::Uuid;
use serde::{Deserialize, Serialize};

use crate::domain::{
    error::DomainError,
    models::credential::Credential,
    services::password_service::PasswordHasher,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(Uuid);
impl AccountId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganizationId(Uuid);
impl OrganizationId {
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Public identifier used to look an account up at login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email(String);
impl Email {
    pub fn new(value: &str) -> Result<Self, DomainError> {
        let value = value.trim();
        match value.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                Ok(Self(value.to_string()))
            }
            _ => Err(DomainError::InvalidEmail),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Administrator,
    Contributor,
}

impl Role {
    pub fn as_i32(self) -> i32 {
        match self {
            Role::Administrator => 1,
            Role::Contributor => 2,
        }
    }
}

impl TryFrom<i32> for Role {
    type Error = DomainError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Role::Administrator),
            2 => Ok(Role::Contributor),
            other => Err(DomainError::UnknownRole(other)),
        }
    }
}

/// An account grants access to its organization's workspace.
/// It exclusively owns its [`Credential`].
#[derive(Debug, Clone)]
pub struct Account {
    id: AccountId,
    organization_id: OrganizationId,
    first_name: String,
    last_name: String,
    email: Email,
    role: Role,
    credential: Credential,
}

impl Account {
    /// Create a newly provisioned account; its credential starts out pending
    pub fn new(
        id: AccountId,
        organization_id: OrganizationId,
        first_name: String,
        last_name: String,
        email: Email,
        role: Role,
    ) -> Result<Self, DomainError> {
        Self::reconstruct(
            id,
            organization_id,
            first_name,
            last_name,
            email,
            role,
            Credential::pending(),
        )
    }

    pub fn reconstruct(
        id: AccountId,
        organization_id: OrganizationId,
        first_name: String,
        last_name: String,
        email: Email,
        role: Role,
        credential: Credential,
    ) -> Result<Self, DomainError> {
        if first_name.trim().is_empty() || last_name.trim().is_empty() {
            return Err(DomainError::EmptyName);
        }

        Ok(Self {
            id,
            organization_id,
            first_name,
            last_name,
            email,
            role,
            credential,
        })
    }

    pub fn id(&self) -> &AccountId {
        &self.id
    }
    pub fn organization_id(&self) -> &OrganizationId {
        &self.organization_id
    }
    pub fn first_name(&self) -> &str {
        &self.first_name
    }
    pub fn last_name(&self) -> &str {
        &self.last_name
    }
    pub fn email(&self) -> &Email {
        &self.email
    }
    pub fn role(&self) -> Role {
        self.role
    }
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    // No middle names.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Mailbox form suitable for a `To:` header
    pub fn rfc_email(&self) -> String {
        format!("\"{}\" <{}>", self.full_name(), self.email.as_str())
    }

    /// An account owns a resource tagged with its id
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn owns(&self, owner: &AccountId) -> bool {
        &self.id == owner
    }

    pub fn is_administrator(&self) -> bool {
        self.role == Role::Administrator
    }

    pub fn is_pending(&self) -> bool {
        self.credential.is_pending()
    }

    pub fn set_password<P: PasswordHasher>(
        &mut self,
        plaintext: &str,
        hasher: &P,
    ) -> Result<(), DomainError> {
        self.credential.set_secret(plaintext, hasher)
    }

    pub fn verify_password<P: PasswordHasher>(&self, plaintext: &str, hasher: &P) -> bool {
        self.credential.verify(plaintext, hasher)
    }
}
