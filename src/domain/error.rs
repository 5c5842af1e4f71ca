use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Password has not been set")]
    PendingCredential,

    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("Malformed password hash")]
    MalformedHash,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Empty name")]
    EmptyName,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Unknown role: {0}")]
    UnknownRole(i32),

    #[error("Invalid security key")]
    InvalidSecurityKey,

    #[error("Operation not permitted")]
    Forbidden,

    #[error("Random number generation failed: {0}")]
    Random(String),
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Not found")]
    NotFound,

    #[error("Already exists")]
    Conflict,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Stored record is corrupt: {0}")]
    Corrupt(#[source] Box<DomainError>),
}

impl RepositoryError {
    pub fn corrupt(error: DomainError) -> Self {
        Self::Corrupt(Box::new(error))
    }
}
