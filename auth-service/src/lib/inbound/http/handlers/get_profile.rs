use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::ApiError;
use super::ApiSuccess;
use super::UserData;
use crate::domain::user::ports::AuthServicePort;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

/// Profile of the caller resolved by the authorization middleware.
///
/// Tokens without a `uid` claim fall back to a lookup by subject.
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedUser>,
) -> Result<ApiSuccess<UserData>, ApiError> {
    let profile = match principal.user_id {
        Some(ref user_id) => state.auth_service.get_profile(user_id).await,
        None => {
            state
                .auth_service
                .get_profile_by_username(&principal.username)
                .await
        }
    };

    profile
        .map_err(ApiError::from)
        .map(|ref profile| ApiSuccess::new(StatusCode::OK, profile.into()))
}
