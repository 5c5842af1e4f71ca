mod config;
mod domain;
mod infrastructure;
mod presentation;
#[cfg(test)]
mod test_support;
mod usecase;

use axum::{Router, routing::get};
use sea_orm::{ConnectOptions, Database};
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    config::{AppConfig, LogFormat},
    domain::services::authentication_service::PendingMode,
    infrastructure::{
        account_repository::MySqlAccountRepository,
        argon2_password_hasher::Argon2PasswordHasher,
        in_memory_session_store::InMemorySessionStore, log_notifier::LogNotifier,
        security_key_repository::MySqlSecurityKeyRepository,
    },
    presentation::handlers::account_handler::create_account_router,
    usecase::{
        account_usecase::AccountUsecase, login_usecase::LoginUsecase,
        password_usecase::PasswordUsecase,
    },
};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine; the variables may come from the environment.
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    init_tracing(config.log_format);

    let mut opt = ConnectOptions::new(config.database_url.clone());
    opt.max_connections(10)
        .min_connections(1)
        .sqlx_logging(true);

    let db = Database::connect(opt).await?;
    let account_repository = MySqlAccountRepository::new(db.clone());
    let security_key_repository = MySqlSecurityKeyRepository::new(db.clone());
    let password_hasher = Argon2PasswordHasher::new(&config.hashing)?;
    let session_store = InMemorySessionStore::new();
    let pending_mode = if config.distinguish_pending {
        PendingMode::Distinct
    } else {
        PendingMode::Collapsed
    };

    let login_service = LoginUsecase::new(
        account_repository.clone(),
        password_hasher.clone(),
        session_store.clone(),
    )
    .with_pending_mode(pending_mode);
    let password_service = PasswordUsecase::new(
        account_repository.clone(),
        security_key_repository.clone(),
        password_hasher.clone(),
    );
    let account_service = AccountUsecase::new(
        account_repository.clone(),
        security_key_repository.clone(),
        LogNotifier::new(),
    );

    let app = Router::new()
        .route("/", get(|| async { "ok" }))
        .nest(
            "/api",
            create_account_router(login_service, password_service, account_service, session_store),
        );

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %config.bind_addr,
        work_factor = config.hashing.work_factor,
        "listening"
    );
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
        response::Response,
    };
    use http_body_util::BodyExt;
    use rstest::*;
    use serde::de::DeserializeOwned;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::{
        domain::{
            models::account::{Account, Role},
            services::authentication_service::PendingMode,
        },
        infrastructure::in_memory_session_store::InMemorySessionStore,
        presentation::handlers::account_handler::{
            AccountResponse, LoginResponse, create_account_router,
        },
        test_support::{
            Delivery, InMemoryAccountRepository, InMemorySecurityKeyRepository,
            RecordingNotifier, account, hasher,
        },
        usecase::{
            account_usecase::AccountUsecase, login_usecase::LoginUsecase,
            password_usecase::PasswordUsecase,
        },
    };

    const ADMIN_PASSWORD: &str = "admin-secret";
    const CONTRIBUTOR_PASSWORD: &str = "correct-horse";

    struct TestApp {
        router: Router,
        notifier: RecordingNotifier,
        admin: Account,
    }

    fn build_app(pending_mode: PendingMode) -> TestApp {
        let admin = account("admin@example.com", Role::Administrator, Some(ADMIN_PASSWORD));
        let contributor = account(
            "contributor@example.com",
            Role::Contributor,
            Some(CONTRIBUTOR_PASSWORD),
        );
        let pending = account("pending@example.com", Role::Contributor, None);

        let accounts = InMemoryAccountRepository::with([admin.clone(), contributor, pending]);
        let keys = InMemorySecurityKeyRepository::default();
        let notifier = RecordingNotifier::default();
        let sessions = InMemorySessionStore::new();

        let login_usecase = LoginUsecase::new(accounts.clone(), hasher(), sessions.clone())
            .with_pending_mode(pending_mode);
        let password_usecase = PasswordUsecase::new(accounts.clone(), keys.clone(), hasher());
        let account_usecase = AccountUsecase::new(accounts, keys, notifier.clone());

        // setup router: sync settings of main.app
        let router = Router::new().nest(
            "/api",
            create_account_router(login_usecase, password_usecase, account_usecase, sessions),
        );

        TestApp {
            router,
            notifier,
            admin,
        }
    }

    #[fixture]
    fn test_app() -> TestApp {
        build_app(PendingMode::Collapsed)
    }

    /// # Description
    ///
    /// General request helper: POSTs a json body, with an optional bearer session
    async fn post(
        app: &Router,
        uri: &str,
        session_id: Option<&str>,
        body: serde_json::Value,
    ) -> Response {
        let mut request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
        if let Some(session_id) = session_id {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", session_id));
        }

        app.clone()
            .oneshot(request.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap()
    }

    async fn read_body(response: Response) -> Vec<u8> {
        response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec()
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> T {
        serde_json::from_slice(&read_body(response).await).unwrap()
    }

    async fn login(app: &Router, email: &str, password: &str) -> Response {
        post(
            app,
            "/api/login",
            None,
            json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn session_for(app: &Router, email: &str, password: &str) -> String {
        let response = login(app, email, password).await;
        assert_eq!(response.status(), StatusCode::OK);
        read_json::<LoginResponse>(response).await.session_id
    }

    // Login

    #[rstest]
    #[tokio::test]
    async fn test_login_positive(test_app: TestApp) {
        let response = login(&test_app.router, "admin@example.com", ADMIN_PASSWORD).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_body(response).await;
        assert!(!String::from_utf8_lossy(&body).contains("argon2"));

        let login_response: LoginResponse = serde_json::from_slice(&body).unwrap();
        assert!(!login_response.session_id.is_empty());
        assert_eq!(login_response.account.id, test_app.admin.id().to_string());
        assert_eq!(login_response.account.email, "admin@example.com");
        assert!(!login_response.account.pending);
    }

    #[rstest]
    #[tokio::test]
    async fn test_login_failures_are_indistinguishable(test_app: TestApp) {
        let wrong_password = login(&test_app.router, "contributor@example.com", "wrong-guess").await;
        let unknown_user = login(&test_app.router, "nobody@example.com", "wrong-guess").await;
        let pending = login(&test_app.router, "pending@example.com", "wrong-guess").await;

        assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(pending.status(), StatusCode::UNAUTHORIZED);

        let expected = read_body(wrong_password).await;
        assert_eq!(read_body(unknown_user).await, expected);
        assert_eq!(read_body(pending).await, expected);
    }

    #[tokio::test]
    async fn test_login_pending_distinct_mode() {
        let app = build_app(PendingMode::Distinct);

        let pending = login(&app.router, "pending@example.com", "anything").await;
        assert_eq!(pending.status(), StatusCode::FORBIDDEN);

        let wrong_password = login(&app.router, "contributor@example.com", "wrong-guess").await;
        assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[tokio::test]
    async fn test_logout_ends_session(test_app: TestApp) {
        let session_id = session_for(&test_app.router, "admin@example.com", ADMIN_PASSWORD).await;

        let response = post(&test_app.router, "/api/logout", Some(&session_id), json!({})).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = post(
            &test_app.router,
            "/api/accounts",
            Some(&session_id),
            json!({
                "first_name": "New",
                "last_name": "Colleague",
                "email": "new@example.com",
                "role": "contributor",
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Account lifecycle

    #[rstest]
    #[tokio::test]
    async fn test_provision_then_set_password_then_login(test_app: TestApp) {
        let session_id = session_for(&test_app.router, "admin@example.com", ADMIN_PASSWORD).await;

        let response = post(
            &test_app.router,
            "/api/accounts",
            Some(&session_id),
            json!({
                "first_name": "New",
                "last_name": "Colleague",
                "email": "new@example.com",
                "role": "contributor",
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created: AccountResponse = read_json(response).await;
        assert!(created.account.pending);

        // pending accounts cannot log in yet
        let response = login(&test_app.router, "new@example.com", "first-password").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let key = match test_app.notifier.deliveries().await.as_slice() {
            [Delivery::LoginInstructions { key, .. }] => key.clone(),
            other => panic!("unexpected deliveries: {:?}", other),
        };

        let response = post(
            &test_app.router,
            "/api/password",
            None,
            json!({ "key": key, "password": "first-password" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let updated: AccountResponse = read_json(response).await;
        assert_eq!(updated.account.id, created.account.id);
        assert!(!updated.account.pending);

        let response = login(&test_app.router, "new@example.com", "first-password").await;
        assert_eq!(response.status(), StatusCode::OK);

        // the key is single-use
        let response = post(
            &test_app.router,
            "/api/password",
            None,
            json!({ "key": key, "password": "second-password" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[tokio::test]
    async fn test_provision_requires_administrator(test_app: TestApp) {
        let body = json!({
            "first_name": "New",
            "last_name": "Colleague",
            "email": "new@example.com",
            "role": "contributor",
        });

        let response = post(&test_app.router, "/api/accounts", None, body.clone()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let session_id = session_for(
            &test_app.router,
            "contributor@example.com",
            CONTRIBUTOR_PASSWORD,
        )
        .await;
        let response = post(&test_app.router, "/api/accounts", Some(&session_id), body).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(test_app.notifier.deliveries().await.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_provision_duplicate_email(test_app: TestApp) {
        let session_id = session_for(&test_app.router, "admin@example.com", ADMIN_PASSWORD).await;

        let response = post(
            &test_app.router,
            "/api/accounts",
            Some(&session_id),
            json!({
                "first_name": "Dup",
                "last_name": "Licate",
                "email": "contributor@example.com",
                "role": "contributor",
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[rstest]
    #[case(json!({ "key": "unknown", "password": "secret" }), StatusCode::NOT_FOUND)]
    #[case(json!({ "key": "unknown", "password": "" }), StatusCode::NOT_FOUND)]
    #[tokio::test]
    async fn test_set_password_with_unknown_key(
        test_app: TestApp,
        #[case] body: serde_json::Value,
        #[case] expected: StatusCode,
    ) {
        let response = post(&test_app.router, "/api/password", None, body).await;
        assert_eq!(response.status(), expected);
    }

    #[rstest]
    #[tokio::test]
    async fn test_set_empty_password_is_bad_request(test_app: TestApp) {
        post(
            &test_app.router,
            "/api/password/reset",
            None,
            json!({ "email": "contributor@example.com" }),
        )
        .await;
        let key = match test_app.notifier.deliveries().await.as_slice() {
            [Delivery::ResetRequest { key, .. }] => key.clone(),
            other => panic!("unexpected deliveries: {:?}", other),
        };

        let response = post(
            &test_app.router,
            "/api/password",
            None,
            json!({ "key": key, "password": "" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // old password still works
        let response = login(&test_app.router, "contributor@example.com", CONTRIBUTOR_PASSWORD).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[rstest]
    #[tokio::test]
    async fn test_change_own_password(test_app: TestApp) {
        let session_id = session_for(
            &test_app.router,
            "contributor@example.com",
            CONTRIBUTOR_PASSWORD,
        )
        .await;

        let response = post(
            &test_app.router,
            "/api/me/password",
            Some(&session_id),
            json!({ "password": "battery-staple" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let old = login(&test_app.router, "contributor@example.com", CONTRIBUTOR_PASSWORD).await;
        assert_eq!(old.status(), StatusCode::UNAUTHORIZED);
        let new = login(&test_app.router, "contributor@example.com", "battery-staple").await;
        assert_eq!(new.status(), StatusCode::OK);
    }

    #[rstest]
    #[tokio::test]
    async fn test_change_password_requires_session(test_app: TestApp) {
        let response = post(
            &test_app.router,
            "/api/me/password",
            Some("not-a-session"),
            json!({ "password": "battery-staple" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[tokio::test]
    async fn test_resend_login_instructions(test_app: TestApp) {
        let session_id = session_for(&test_app.router, "admin@example.com", ADMIN_PASSWORD).await;
        let response = post(
            &test_app.router,
            "/api/accounts",
            Some(&session_id),
            json!({
                "first_name": "New",
                "last_name": "Colleague",
                "email": "new@example.com",
                "role": "contributor",
            }),
        )
        .await;
        let created: AccountResponse = read_json(response).await;

        let uri = format!("/api/accounts/{}/login_instructions", created.account.id);
        let response = post(&test_app.router, &uri, Some(&session_id), json!({})).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(test_app.notifier.deliveries().await.len(), 2);

        // already active
        let uri = format!("/api/accounts/{}/login_instructions", test_app.admin.id());
        let response = post(&test_app.router, &uri, Some(&session_id), json!({})).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[case("contributor@example.com", 1)]
    #[case("nobody@example.com", 0)]
    #[tokio::test]
    async fn test_reset_request_is_always_accepted(
        test_app: TestApp,
        #[case] email: &str,
        #[case] deliveries: usize,
    ) {
        let response = post(
            &test_app.router,
            "/api/password/reset",
            None,
            json!({ "email": email }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(test_app.notifier.deliveries().await.len(), deliveries);
    }
}
