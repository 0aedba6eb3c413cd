use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use thiserror::Error;

use crate::domain::user::models::UserId;
use crate::inbound::http::handlers::ApiError;

/// Request principal stored in request extensions once the token checks out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub username: String,
    pub user_id: Option<UserId>,
}

/// Why the gate refused a request. Expired and forged tokens are not told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GateRejection {
    #[error("missing or malformed authorization header")]
    MalformedHeader,

    #[error("invalid token")]
    InvalidToken,
}

impl From<GateRejection> for ApiError {
    fn from(rejection: GateRejection) -> Self {
        ApiError::Unauthorized(rejection.to_string())
    }
}

/// Extract the token from exactly one `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, GateRejection> {
    let mut values = headers.get_all(AUTHORIZATION).iter();
    let (Some(value), None) = (values.next(), values.next()) else {
        return Err(GateRejection::MalformedHeader);
    };

    let value = value.to_str().map_err(|_| GateRejection::MalformedHeader)?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(GateRejection::MalformedHeader),
    }
}

/// Resolve the caller from request headers. Pure; no I/O.
pub fn resolve_principal(
    headers: &HeaderMap,
    authenticator: &Authenticator,
) -> Result<AuthenticatedUser, GateRejection> {
    let token = bearer_token(headers)?;

    let claims = authenticator
        .validate_token(token)
        .map_err(|_| GateRejection::InvalidToken)?;

    if claims.sub.is_empty() {
        return Err(GateRejection::InvalidToken);
    }

    let user_id = claims
        .uid
        .as_deref()
        .map(UserId::from_string)
        .transpose()
        .map_err(|_| GateRejection::InvalidToken)?;

    Ok(AuthenticatedUser {
        username: claims.sub,
        user_id,
    })
}

/// Middleware that validates bearer tokens and adds the principal to request extensions
pub async fn authorize(
    State(authenticator): State<Arc<Authenticator>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match resolve_principal(req.headers(), &authenticator) {
        Ok(principal) => {
            req.extensions_mut().insert(principal);
            Ok(next.run(req).await)
        }
        Err(rejection) => {
            tracing::warn!(
                reason = %rejection,
                path = %req.uri().path(),
                "Request rejected by authorization gate"
            );
            Err(rejection.into())
        }
    }
}

/// Middleware that bounds handler time and renders an elapsed deadline as a 408 envelope.
pub async fn enforce_timeout(
    State(limit): State<Duration>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = req.uri().path().to_string();

    tokio::time::timeout(limit, next.run(req)).await.map_err(|_| {
        tracing::warn!(
            path = %path,
            timeout_ms = limit.as_millis() as u64,
            "Request timed out"
        );
        ApiError::RequestTimeout
    })
}
