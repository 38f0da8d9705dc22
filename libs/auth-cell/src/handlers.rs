use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::HeaderMap,
    Json,
};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::{Identity, TokenResponse, User};
use shared_models::error::AppError;
use shared_utils::extractor::extract_bearer_token;
use shared_utils::jwt;

pub async fn validate_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = extract_bearer_token(&headers)?;
    let user = jwt::validate_token(token, &config.supabase_jwt_secret)
        .map_err(|e| AppError::Auth(e.to_string()))?;

    Ok(Json(TokenResponse {
        valid: true,
        identity: Identity::from(&user),
        role: user.role,
    }))
}

/// The identity bookings would be attributed to.
pub async fn current_identity(Extension(user): Extension<User>) -> Json<Identity> {
    Json(Identity::from(&user))
}
