use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use jetway_core::{Requester, Role};

use crate::error::AppError;
use crate::state::AppState;

/// Bearer token claims issued by the identity service.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: usize,
}

/// Verifies the bearer JWT and stores the caller as a `Requester` extension.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::AuthenticationError("Missing bearer token".to_string()))?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthenticationError("Invalid or expired token".to_string()))?;

    req.extensions_mut()
        .insert(Requester::new(token_data.claims.sub, token_data.claims.role));

    Ok(next.run(req).await)
}

/// Must run after `auth_middleware`.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    match req.extensions().get::<Requester>() {
        Some(requester) if requester.is_admin() => Ok(next.run(req).await),
        Some(_) => Err(AppError::AuthorizationError("Admin access required".to_string())),
        None => Err(AppError::AuthenticationError("Missing bearer token".to_string())),
    }
}
