pub mod account_usecase;
pub mod login_usecase;
pub mod password_usecase;

use crate::domain::error::DomainError;

/// Run CPU-bound hashing off the async worker threads
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, DomainError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DomainError::Hashing(e.to_string()))
}
