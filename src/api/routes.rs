//! API routes

use crate::api::handlers::{health_check, AppState};
use crate::auth::handlers::{change_password, get_me, login, register, update_company, update_me};
use crate::auth::middleware::authenticate;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

/// Account endpoints, relative to their mount point
fn account_routes(state: AppState) -> Router<AppState> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/change-password", post(change_password));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/me", get(get_me).put(update_me))
        .route("/company", put(update_company))
        .layer(middleware::from_fn_with_state(state, authenticate));

    public_routes.merge(protected_routes)
}

/// Build the API routes
///
/// Account endpoints are served under `/api/users` and at the bare paths.
pub fn build_api_routes(state: AppState) -> Router {
    let accounts = account_routes(state.clone());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/users", accounts.clone())
        .merge(accounts)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{jwt, CredentialManager};
    use crate::core::error::{Result, TextpertError};
    use crate::db::models::{NewUser, User, UserId, UserUpdate};
    use crate::db::repository::{AccountStore, UserRepository};
    use crate::db::DatabaseManager;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::util::ServiceExt;

    struct TestApp {
        router: Router,
        accounts: Arc<UserRepository>,
        credentials: Arc<CredentialManager>,
    }

    fn credentials() -> Arc<CredentialManager> {
        Arc::new(CredentialManager::new(
            "routes-secret",
            4,
            Duration::from_secs(3600),
            Duration::from_secs(3600),
        ))
    }

    fn test_app() -> TestApp {
        let db = Arc::new(DatabaseManager::new_in_memory().unwrap());
        let accounts = Arc::new(UserRepository::new(db));
        let credentials = credentials();
        let router = build_api_routes(AppState::new(accounts.clone(), credentials.clone()));

        TestApp { router, accounts, credentials }
    }

    async fn send(
        router: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn registration(email: &str) -> Value {
        json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "companyName": "Analytical Engines",
            "industry": "Computing",
            "companyAddress": "12 St James's Square",
            "zipCode": "SW1Y 4JH",
            "email": email,
            "phone": "555-0100",
            "password": "correct horse",
            "logo": "https://example.com/logo.png"
        })
    }

    /// Registers an account and returns (id, token)
    async fn register_user(app: &TestApp, email: &str) -> (UserId, String) {
        let (status, body) =
            send(&app.router, Method::POST, "/register", None, Some(registration(email))).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);

        (
            body["user"]["id"].as_i64().unwrap(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    #[tokio::test]
    async fn test_register_returns_user_and_token() {
        let app = test_app();
        let (status, body) = send(
            &app.router,
            Method::POST,
            "/api/users/register",
            None,
            Some(registration("ada@example.com")),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "User registered successfully");
        assert_eq!(body["user"]["email"], "ada@example.com");
        assert_eq!(body["user"]["companyName"], "Analytical Engines");
        assert!(body["user"].get("passwordHash").is_none());
        assert!(body["user"].get("password").is_none());

        let id = body["user"]["id"].as_i64().unwrap();
        let token = body["token"].as_str().unwrap();
        assert_eq!(app.credentials.verify_token(token), Ok(id));

        let stored = app.accounts.find_by_id(id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "correct horse");
        assert!(app.credentials.verify("correct horse", &stored.password_hash));
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let app = test_app();
        register_user(&app, "ada@example.com").await;

        let (status, body) = send(
            &app.router,
            Method::POST,
            "/register",
            None,
            Some(registration("ada@example.com")),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "EmailTaken");
        assert_eq!(app.accounts.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_register_rejects_bad_bodies() {
        let app = test_app();

        let (status, body) = send(
            &app.router,
            Method::POST,
            "/register",
            None,
            Some(json!({ "email": "ada@example.com", "password": "pw" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "InvalidRequest");

        let mut empty_password = registration("ada@example.com");
        empty_password["password"] = json!("");
        let (status, body) =
            send(&app.router, Method::POST, "/register", None, Some(empty_password)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ValidationError");

        assert_eq!(app.accounts.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_login() {
        let app = test_app();
        let (id, _) = register_user(&app, "ada@example.com").await;

        let (status, body) = send(
            &app.router,
            Method::POST,
            "/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "wrong" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid credentials");

        let (status, body) = send(
            &app.router,
            Method::POST,
            "/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": "correct horse" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid credentials");

        let (status, body) = send(
            &app.router,
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "correct horse" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Login successful");
        assert_eq!(body["user"]["id"], id);
        assert_eq!(app.credentials.verify_token(body["token"].as_str().unwrap()), Ok(id));
    }

    #[tokio::test]
    async fn test_change_password() {
        let app = test_app();
        register_user(&app, "ada@example.com").await;

        let (status, body) = send(
            &app.router,
            Method::POST,
            "/change-password",
            None,
            Some(json!({ "email": "ada@example.com", "oldPassword": "wrong", "newPassword": "new pw" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid credentials");

        let (status, body) = send(
            &app.router,
            Method::POST,
            "/change-password",
            None,
            Some(json!({ "email": "ada@example.com", "oldPassword": "correct horse", "newPassword": "new pw" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Password changed successfully");

        let (status, _) = send(
            &app.router,
            Method::POST,
            "/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "correct horse" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app.router,
            Method::POST,
            "/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "new pw" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_me_requires_token() {
        let app = test_app();

        let (status, body) = send(&app.router, Method::GET, "/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Unauthorized: No token provided");

        let (status, body) = send(&app.router, Method::GET, "/api/users/me", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Unauthorized: Invalid token");
    }

    #[tokio::test]
    async fn test_me_with_expired_token() {
        let app = test_app();
        let (id, _) = register_user(&app, "ada@example.com").await;
        let expired = app
            .credentials
            .issue_token_at(id, Duration::from_secs(60), jwt::now() - 120)
            .unwrap();

        let (status, body) = send(&app.router, Method::GET, "/me", Some(&expired), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Unauthorized: Token expired");
    }

    #[tokio::test]
    async fn test_me_returns_profile() {
        let app = test_app();
        let (id, token) = register_user(&app, "ada@example.com").await;

        let (status, body) = send(&app.router, Method::GET, "/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], id);
        assert_eq!(body["firstName"], "Ada");
        assert_eq!(body["logo"], "https://example.com/logo.png");
        assert!(body.get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn test_me_for_deleted_account() {
        let app = test_app();
        let (id, token) = register_user(&app, "ada@example.com").await;
        assert!(app.accounts.delete(id).await.unwrap());

        let (status, body) = send(&app.router, Method::GET, "/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "User not found");

        let (status, _) = send(
            &app.router,
            Method::PUT,
            "/company",
            Some(&token),
            Some(json!({ "companyName": "Ghost Co" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_register_with_empty_logo_stores_null() {
        let app = test_app();
        let mut body = registration("ada@example.com");
        body["logo"] = json!("");

        let (status, created) = send(&app.router, Method::POST, "/register", None, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(created["user"]["logo"].is_null());

        let token = created["token"].as_str().unwrap();
        let (status, me) = send(&app.router, Method::GET, "/me", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(me["logo"].is_null());
    }

    #[tokio::test]
    async fn test_update_me_logo_semantics() {
        let app = test_app();
        let (_, token) = register_user(&app, "ada@example.com").await;

        let (status, body) = send(
            &app.router,
            Method::PUT,
            "/me",
            Some(&token),
            Some(json!({ "phone": "555-0199" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User profile updated successfully");
        assert_eq!(body["user"]["phone"], "555-0199");
        assert_eq!(body["user"]["logo"], "https://example.com/logo.png");

        let (status, body) = send(
            &app.router,
            Method::PUT,
            "/api/users/me",
            Some(&token),
            Some(json!({ "logo": null })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["user"]["logo"].is_null());
        assert_eq!(body["user"]["phone"], "555-0199");
    }

    #[tokio::test]
    async fn test_update_company_keeps_names() {
        let app = test_app();
        let (_, token) = register_user(&app, "ada@example.com").await;

        let (status, body) = send(
            &app.router,
            Method::PUT,
            "/company",
            Some(&token),
            Some(json!({
                "companyName": "Difference Engines",
                "industry": "Manufacturing",
                "companyAddress": "Marylebone",
                "zipCode": "NW1",
                "firstName": "Mallory"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User company updated successfully");
        assert_eq!(body["user"]["companyName"], "Difference Engines");
        assert_eq!(body["user"]["zipCode"], "NW1");
        assert_eq!(body["user"]["firstName"], "Ada");
        assert_eq!(body["user"]["lastName"], "Lovelace");
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = test_app();
        let (status, body) = send(&app.router, Method::GET, "/health", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    struct FailingStore;

    fn offline<T>() -> Result<T> {
        Err(TextpertError::Internal("store offline".to_string()))
    }

    #[async_trait]
    impl AccountStore for FailingStore {
        async fn create(&self, _user: NewUser) -> Result<User> {
            offline()
        }
        async fn find_by_email(&self, _email: &str) -> Result<Option<User>> {
            offline()
        }
        async fn find_by_id(&self, _id: UserId) -> Result<Option<User>> {
            offline()
        }
        async fn update(&self, _id: UserId, _update: &UserUpdate) -> Result<Option<User>> {
            offline()
        }
        async fn update_password(&self, _id: UserId, _password_hash: &str) -> Result<bool> {
            offline()
        }
        async fn delete(&self, _id: UserId) -> Result<bool> {
            offline()
        }
        async fn count(&self) -> Result<i64> {
            offline()
        }
    }

    #[tokio::test]
    async fn test_store_failures_are_server_errors() {
        let credentials = credentials();
        let router = build_api_routes(AppState::new(Arc::new(FailingStore), credentials.clone()));
        let token = credentials.login_token(1).unwrap();

        let (status, _) =
            send(&router, Method::POST, "/register", None, Some(registration("ada@example.com"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _) = send(
            &router,
            Method::POST,
            "/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "pw" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, body) = send(&router, Method::GET, "/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal");
    }
}
