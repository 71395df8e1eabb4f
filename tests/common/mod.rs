#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use laundromat_api::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    db::{self, DbConfig},
    handlers::AppServices,
    mailer::MemoryMailer,
    AppState,
};

const TEST_JWT_SECRET: &str =
    "integration_test_secret_key_with_plenty_of_entropy_0123456789_zz";

/// Helper harness running the real router against an in-memory SQLite
/// database. A single pooled connection keeps the schema alive for the
/// lifetime of the test.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub mailer: MemoryMailer,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            3600,
            86_400,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );

        let pool = db::establish_connection_with_config(&DbConfig {
            url: cfg.database_url().to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        })
        .await
        .expect("failed to create test database");
        db::run_migrations(&pool).await.expect("migrations failed");
        let pool = Arc::new(pool);

        let auth = Arc::new(AuthService::new(AuthConfig::new(
            cfg.jwt_secret.clone(),
            Duration::from_secs(3600),
            Duration::from_secs(86_400),
        )));
        let mailer = MemoryMailer::new();
        let services = AppServices::new(pool.clone(), auth.clone(), Arc::new(mailer.clone()));

        let state = AppState {
            db: pool,
            config: cfg,
            services,
            auth,
        };

        let router = Router::new()
            .nest("/api/v1", laundromat_api::api_v1_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            mailer,
        }
    }

    /// Issue a request against the router. `token` goes into the
    /// Authorization header as a bearer token.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router request failed")
    }

    /// Registers an account, verifies it with the emailed code, and returns
    /// (access_token, refresh_token).
    pub async fn register_and_verify(&self, email: &str, password: &str) -> (String, String) {
        let response = self
            .request(
                Method::POST,
                "/api/v1/auth/register",
                Some(json!({
                    "full_name": "Test Customer",
                    "phone_number": "+441234567890",
                    "email": email,
                    "password": password,
                })),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let code = self
            .latest_code_for(email)
            .expect("verification email not captured");
        let response = self
            .request(
                Method::POST,
                "/api/v1/auth/verify-email",
                Some(json!({ "email": email, "code": code })),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let payload = response_json(response).await;
        (
            payload["access_token"].as_str().unwrap().to_string(),
            payload["refresh_token"].as_str().unwrap().to_string(),
        )
    }

    /// Shorthand: a verified account ready to call the admin endpoints.
    pub async fn admin_token(&self) -> String {
        let (access, _) = self
            .register_and_verify("admin@example.com", "sufficiently-long-password")
            .await;
        access
    }

    /// The 4-digit code from the most recent email sent to `recipient`.
    pub fn latest_code_for(&self, recipient: &str) -> Option<String> {
        self.mailer
            .messages()
            .iter()
            .rev()
            .find(|mail| mail.recipient == recipient)
            .and_then(|mail| extract_code(&mail.body))
    }
}

/// Pulls the first standalone 4-digit token out of an email body.
pub fn extract_code(body: &str) -> Option<String> {
    body.split_whitespace()
        .find(|word| word.len() == 4 && word.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
}

pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
