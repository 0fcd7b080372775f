use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tessera_core::identity::{can_manage_events, Actor, Role};
use tessera_shared::pii::Masked;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: Option<Masked<String>>,
    pub role: String,
    pub exp: usize,
}

/// Decode the bearer token and resolve the caller identity. The booking
/// service trusts whatever comes out of here.
pub fn authenticate(secret: &str, headers: &HeaderMap) -> Result<(Claims, Actor), AppError> {
    // 1. Extract token from Authorization header
    let auth_header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::AuthenticationError("missing bearer token".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::AuthenticationError("missing bearer token".to_string()))?;

    // 2. Decode and validate JWT
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthenticationError("invalid token".to_string()))?;

    let claims = token_data.claims;

    // 3. Resolve the principal
    let id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::AuthenticationError("malformed subject".to_string()))?;
    let role: Role = claims
        .role
        .parse()
        .map_err(|_| AppError::AuthenticationError("unknown role".to_string()))?;

    Ok((claims, Actor { id, role }))
}

// ============================================================================
// Authentication Middleware
// ============================================================================

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (claims, actor) = authenticate(&state.auth.secret, req.headers())?;

    req.extensions_mut().insert(claims);
    req.extensions_mut().insert(actor);

    Ok(next.run(req).await)
}

// ============================================================================
// Admin Middleware
// ============================================================================

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (claims, actor) = authenticate(&state.auth.secret, req.headers())?;

    if !can_manage_events(&actor) {
        return Err(AppError::AuthorizationError("admin role required".to_string()));
    }

    req.extensions_mut().insert(claims);
    req.extensions_mut().insert(actor);

    Ok(next.run(req).await)
}
