use axum::{
    extract::State,
    Json,

    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use jsonwebtoken::{encode, Header, EncodingKey};
use chrono::{Utc, Duration};
use crate::{state::AppState, error::AppError, middleware::auth::SessionClaims};

#[derive(Debug, Deserialize)]
struct SessionRequest {
    user_id: i64,
    email: String,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/auth/session", post(issue_session))
}

async fn issue_session(
    State(state): State<AppState>,
    Json(request): Json<SessionRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let my_claims = SessionClaims {
        sub: request.user_id.to_string(),
        email: request.email,
        exp: (Utc::now() + Duration::seconds(state.auth.expiration as i64)).timestamp() as usize,
    };

    let token = encode(&Header::default(), &my_claims, &EncodingKey::from_secret(state.auth.secret.as_bytes()))
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))?;

    Ok(Json(AuthResponse { token }))
}
