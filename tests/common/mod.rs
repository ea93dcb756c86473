use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    Router,
};
use pos_api::{
    auth::{AuthConfig, AuthService, SignupInput},
    config::AppConfig,
    db::{self, DbConfig},
    entities::product,
    events::{self, EventSender},
    handlers::AppServices,
    services::catalog::CreateProductInput,
    AppState,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

/// Helper harness for spinning up an application state backed by an
/// in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub user_id: Uuid,
    token: String,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let cfg = test_config();

        // A single pooled connection keeps the in-memory database alive and
        // shared for the lifetime of the harness.
        let db_cfg = DbConfig {
            url: cfg.database_url.clone(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&db_cfg)
            .await
            .expect("failed to create test database");

        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth_cfg = AuthConfig::new(
            cfg.jwt_secret.clone(),
            Duration::from_secs(cfg.jwt_expiration as u64),
        );
        let auth_service = Arc::new(AuthService::new(auth_cfg, db_arc.clone()));

        let services = AppServices::new(db_arc.clone(), Arc::new(event_sender.clone()));

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            auth: auth_service.clone(),
            services,
        };

        // Default operator account every test can act as
        let user = auth_service
            .register(SignupInput {
                email: "operator@example.com".to_string(),
                password: "correct-horse-battery".to_string(),
                full_name: "Test Cashier".to_string(),
                store_name: Some("Test Mart".to_string()),
            })
            .await
            .expect("seed operator account");

        state
            .services
            .catalog
            .create_default_categories(user.id)
            .await;

        let token = auth_service
            .issue_token(
                user.id,
                Some("Test Cashier".to_string()),
                Some(user.email.clone()),
            )
            .expect("issue operator token")
            .access_token;

        let router = Router::new()
            .nest("/api/v1", pos_api::api_v1_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            user_id: user.id,
            token,
            _event_task: event_task,
        }
    }

    /// Access the bearer token for the default operator.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for authenticated JSON requests.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some(self.token())).await
    }

    /// Seed an active product owned by the default operator.
    pub async fn seed_product(
        &self,
        name: &str,
        price: Decimal,
        stock_quantity: i32,
        reorder_level: i32,
    ) -> product::Model {
        self.state
            .services
            .catalog
            .create_product(
                self.user_id,
                CreateProductInput {
                    name: name.to_string(),
                    sku: format!("SKU-{}", name.to_uppercase().replace(' ', "-")),
                    icon: None,
                    price,
                    category_id: None,
                    stock_quantity,
                    reorder_level,
                },
            )
            .await
            .expect("seed product for tests")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_key_for_testing_purposes_only_that_is_long_enough_64c".to_string(),
        jwt_expiration: 3600,
        host: "127.0.0.1".to_string(),
        port: 18_080,
        environment: "development".to_string(),
        log_level: "info".to_string(),
        log_json: false,
        auto_migrate: true,
        cors_allowed_origins: None,
        cors_allow_any_origin: false,
        db_max_connections: 1,
        db_min_connections: 1,
        db_connect_timeout_secs: 30,
        db_idle_timeout_secs: 600,
        db_acquire_timeout_secs: 8,
    }
}

/// Deserialize a response body as JSON.
pub async fn response_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

/// Read a response body as a UTF-8 string.
#[allow(dead_code)]
pub async fn response_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    String::from_utf8(bytes.to_vec()).expect("utf-8 response")
}
