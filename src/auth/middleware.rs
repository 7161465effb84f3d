//! Authentication middleware

use crate::api::handlers::AppState;
use crate::auth::credentials::CredentialManager;
use crate::core::error::{AuthFailure, Result, TextpertError};
use crate::db::models::UserId;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Authenticated principal, stored in request extensions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: UserId,
}

/// Resolve an `Authorization` header value to a principal
///
/// Anything other than `Bearer <token>` counts as no token at all.
pub fn authenticate_header(
    header: Option<&str>,
    credentials: &CredentialManager,
) -> Result<AuthUser> {
    let token = header
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(TextpertError::Unauthorized(AuthFailure::MissingToken))?;

    let id = credentials.verify_token(token)?;
    Ok(AuthUser { id })
}

/// Authentication middleware
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let user = match authenticate_header(header, &state.credentials) {
        Ok(user) => user,
        Err(e) => {
            tracing::debug!(error = %e, "Request rejected by authenticator");
            return e.into_response();
        }
    };

    request.extensions_mut().insert(user);
    next.run(request).await
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = TextpertError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or(TextpertError::Unauthorized(AuthFailure::MissingToken))
    }
}
