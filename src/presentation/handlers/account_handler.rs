use std::sync::Arc;

use crate::{
    domain::{
        error::{DomainError, RepositoryError},
        models::account::{Account, AccountId, Role},
        repositories::{
            account_repository::AccountRepository, security_key_repository::SecurityKeyRepository,
        },
        services::{
            notification_service::Notifier, password_service::PasswordHasher,
            session_service::{Session, SessionStore},
        },
    },
    usecase::{
        account_usecase::{AccountUsecase, NewAccount},
        login_usecase::LoginUsecase,
        password_usecase::PasswordUsecase,
    },
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use sea_orm::prelude::Uuid;
use serde::{Deserialize, Serialize};

// Request

/// json for login request
#[derive(Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// json for setting a password through a mailed security key
#[derive(Serialize, Deserialize)]
pub struct SetPasswordRequest {
    pub key: String,
    pub password: String,
}

/// json for a signed-in account changing its own password
#[derive(Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub password: String,
}

/// json for password reset request
#[derive(Serialize, Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

/// json for provisioning an account
#[derive(Serialize, Deserialize)]
pub struct ProvisionRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
}

// Response

/// json for login response
#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub session_id: String,
    pub account: AccountInfo,
}

#[derive(Serialize, Deserialize)]
pub struct AccountResponse {
    pub account: AccountInfo,
}

/// Public projection of an account. Never carries the password hash.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountInfo {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub pending: bool,
}

impl From<&Account> for AccountInfo {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id().to_string(),
            first_name: account.first_name().to_string(),
            last_name: account.last_name().to_string(),
            email: account.email().as_str().to_string(),
            pending: account.is_pending(),
        }
    }
}

/// helper function that extract session id from `Authorization: Bearer <id>`
fn bearer_session_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

/// Map a use case failure to a response without revealing which check failed
fn error_response(error: DomainError) -> Response {
    let (status, message) = match &error {
        DomainError::AuthenticationFailed => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
        DomainError::PendingCredential => (StatusCode::FORBIDDEN, "Password has not been set"),
        DomainError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden"),
        DomainError::InvalidSecurityKey => (StatusCode::NOT_FOUND, "Invalid security key"),
        DomainError::InvalidInput(_)
        | DomainError::EmptyName
        | DomainError::InvalidEmail
        | DomainError::UnknownRole(_) => (StatusCode::BAD_REQUEST, "Invalid request"),
        DomainError::Repository(RepositoryError::Conflict) => {
            (StatusCode::CONFLICT, "Account already exists")
        }
        DomainError::Repository(RepositoryError::NotFound) => (StatusCode::NOT_FOUND, "Not found"),
        _ => {
            tracing::error!(error = %error, "request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    };

    (status, Json(message)).into_response()
}

/* Router Function and Handler Function */

// Account Router

/// function return Router object
/// Suppose to be nested by main router
pub fn create_account_router<A, K, P, S, N>(
    login_service: LoginUsecase<A, P, S>,
    password_service: PasswordUsecase<A, K, P>,
    account_service: AccountUsecase<A, K, N>,
    session_store: S,
) -> Router
where
    A: AccountRepository + Send + Sync + 'static,
    K: SecurityKeyRepository + Send + Sync + 'static,
    P: PasswordHasher + Send + Sync + 'static,
    S: SessionStore + 'static,
    N: Notifier + 'static,
{
    let state = AppState {
        login_service: Arc::new(login_service),
        password_service: Arc::new(password_service),
        account_service: Arc::new(account_service),
        session_store: Arc::new(session_store),
    };

    Router::new()
        .route("/login", post(login::<A, K, P, S, N>))
        .route("/logout", post(logout::<A, K, P, S, N>))
        .route("/password", post(set_password::<A, K, P, S, N>))
        .route("/password/reset", post(request_reset::<A, K, P, S, N>))
        .route("/me/password", post(change_password::<A, K, P, S, N>))
        .route("/accounts", post(provision::<A, K, P, S, N>))
        .route(
            "/accounts/{id}/login_instructions",
            post(resend_login_instructions::<A, K, P, S, N>),
        )
        .with_state(state)
}

pub struct AppState<A, K, P, S, N>
where
    A: AccountRepository,
    K: SecurityKeyRepository,
    P: PasswordHasher,
    S: SessionStore,
    N: Notifier,
{
    pub login_service: Arc<LoginUsecase<A, P, S>>,
    pub password_service: Arc<PasswordUsecase<A, K, P>>,
    pub account_service: Arc<AccountUsecase<A, K, N>>,
    pub session_store: Arc<S>,
}

impl<A, K, P, S, N> Clone for AppState<A, K, P, S, N>
where
    A: AccountRepository,
    K: SecurityKeyRepository,
    P: PasswordHasher,
    S: SessionStore,
    N: Notifier,
{
    fn clone(&self) -> Self {
        Self {
            login_service: Arc::clone(&self.login_service),
            password_service: Arc::clone(&self.password_service),
            account_service: Arc::clone(&self.account_service),
            session_store: Arc::clone(&self.session_store),
        }
    }
}

impl<A, K, P, S, N> AppState<A, K, P, S, N>
where
    A: AccountRepository,
    K: SecurityKeyRepository,
    P: PasswordHasher,
    S: SessionStore,
    N: Notifier,
{
    async fn current_session(&self, headers: &HeaderMap) -> Result<Session, DomainError> {
        let session_id = bearer_session_id(headers).ok_or(DomainError::AuthenticationFailed)?;
        self.session_store
            .get(session_id)
            .await?
            .ok_or(DomainError::AuthenticationFailed)
    }
}

// handler function

/// handler function for login
async fn login<A, K, P, S, N>(
    State(state): State<AppState<A, K, P, S, N>>,
    Json(payload): Json<LoginRequest>,
) -> Response
where
    A: AccountRepository + Send + Sync + 'static,
    K: SecurityKeyRepository + Send + Sync + 'static,
    P: PasswordHasher + Send + Sync + 'static,
    S: SessionStore + 'static,
    N: Notifier + 'static,
{
    match state
        .login_service
        .login(&payload.email, payload.password)
        .await
    {
        Ok(result) => {
            let response = LoginResponse {
                session_id: result.session_id,
                account: (&result.account).into(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// handler function for logout
async fn logout<A, K, P, S, N>(
    State(state): State<AppState<A, K, P, S, N>>,
    headers: HeaderMap,
) -> Response
where
    A: AccountRepository + Send + Sync + 'static,
    K: SecurityKeyRepository + Send + Sync + 'static,
    P: PasswordHasher + Send + Sync + 'static,
    S: SessionStore + 'static,
    N: Notifier + 'static,
{
    let Some(session_id) = bearer_session_id(&headers) else {
        return StatusCode::NO_CONTENT.into_response();
    };

    match state.login_service.logout(session_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

/// handler function for choosing a password with a mailed key
async fn set_password<A, K, P, S, N>(
    State(state): State<AppState<A, K, P, S, N>>,
    Json(payload): Json<SetPasswordRequest>,
) -> Response
where
    A: AccountRepository + Send + Sync + 'static,
    K: SecurityKeyRepository + Send + Sync + 'static,
    P: PasswordHasher + Send + Sync + 'static,
    S: SessionStore + 'static,
    N: Notifier + 'static,
{
    match state
        .password_service
        .set_password_with_key(&payload.key, payload.password)
        .await
    {
        Ok(account) => {
            let response = AccountResponse {
                account: (&account).into(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// handler function for a signed-in account changing its own password
async fn change_password<A, K, P, S, N>(
    State(state): State<AppState<A, K, P, S, N>>,
    headers: HeaderMap,
    Json(payload): Json<ChangePasswordRequest>,
) -> Response
where
    A: AccountRepository + Send + Sync + 'static,
    K: SecurityKeyRepository + Send + Sync + 'static,
    P: PasswordHasher + Send + Sync + 'static,
    S: SessionStore + 'static,
    N: Notifier + 'static,
{
    let session = match state.current_session(&headers).await {
        Ok(session) => session,
        Err(e) => return error_response(e),
    };

    match state
        .password_service
        .set_password(&session.account_id, payload.password)
        .await
    {
        Ok(account) => {
            let response = AccountResponse {
                account: (&account).into(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// handler function for password reset request
async fn request_reset<A, K, P, S, N>(
    State(state): State<AppState<A, K, P, S, N>>,
    Json(payload): Json<ResetRequest>,
) -> Response
where
    A: AccountRepository + Send + Sync + 'static,
    K: SecurityKeyRepository + Send + Sync + 'static,
    P: PasswordHasher + Send + Sync + 'static,
    S: SessionStore + 'static,
    N: Notifier + 'static,
{
    match state
        .account_service
        .request_password_reset(&payload.email)
        .await
    {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => error_response(e),
    }
}

/// handler function for provisioning an account in the caller's organization
async fn provision<A, K, P, S, N>(
    State(state): State<AppState<A, K, P, S, N>>,
    headers: HeaderMap,
    Json(payload): Json<ProvisionRequest>,
) -> Response
where
    A: AccountRepository + Send + Sync + 'static,
    K: SecurityKeyRepository + Send + Sync + 'static,
    P: PasswordHasher + Send + Sync + 'static,
    S: SessionStore + 'static,
    N: Notifier + 'static,
{
    let session = match state.current_session(&headers).await {
        Ok(session) => session,
        Err(e) => return error_response(e),
    };

    let new_account = NewAccount {
        first_name: payload.first_name,
        last_name: payload.last_name,
        email: payload.email,
        role: payload.role,
    };

    match state
        .account_service
        .provision(&session.account_id, new_account)
        .await
    {
        Ok(account) => {
            let response = AccountResponse {
                account: (&account).into(),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// handler function for re-sending login instructions to a pending account
async fn resend_login_instructions<A, K, P, S, N>(
    State(state): State<AppState<A, K, P, S, N>>,
    headers: HeaderMap,
    Path(account_id): Path<Uuid>,
) -> Response
where
    A: AccountRepository + Send + Sync + 'static,
    K: SecurityKeyRepository + Send + Sync + 'static,
    P: PasswordHasher + Send + Sync + 'static,
    S: SessionStore + 'static,
    N: Notifier + 'static,
{
    let session = match state.current_session(&headers).await {
        Ok(session) => session,
        Err(e) => return error_response(e),
    };

    match state
        .account_service
        .send_login_instructions(&session.account_id, &AccountId::from_uuid(account_id))
        .await
    {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => error_response(e),
    }
}
