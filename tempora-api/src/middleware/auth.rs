use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tempora_core::principal::Requester;

use crate::{error::AppError, state::AppState};

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
}

// ============================================================================
// Session Authentication Middleware
// ============================================================================

pub async fn session_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 1. Extract token from Authorization header
    let auth_header = req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::AuthenticationError("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::AuthenticationError("Expected a Bearer token".to_string()))?;

    // 2. Decode and validate JWT
    let token_data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    ).map_err(|_| AppError::AuthenticationError("Invalid session token".to_string()))?;

    // 3. The subject is the numeric user id
    let user_id: i64 = token_data.claims.sub.parse()
        .map_err(|_| AppError::AuthenticationError("Invalid session subject".to_string()))?;

    // 4. Inject the requester into request extensions
    req.extensions_mut().insert(Requester {
        id: user_id,
        email: token_data.claims.email,
    });

    Ok(next.run(req).await)
}
