use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    http::StatusCode,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use stockyard_shared::{ActingUser, EmployeeProfile, Role, Session};

use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub sub: String,
    pub role: Role,
    /// Set for employees only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse_id: Option<String>,
    pub exp: usize,
}

impl SessionClaims {
    pub fn acting_user(&self) -> ActingUser {
        let employee = match self.role {
            Role::Employee => self
                .warehouse_id
                .clone()
                .map(|warehouse_id| EmployeeProfile { warehouse_id }),
            _ => None,
        };
        ActingUser { id: self.sub.clone(), role: self.role, employee }
    }
}

// ============================================================================
// Session Middleware
// ============================================================================

/// Turns the bearer token into the read-only [`Session`] page views run under.
/// The raw token is kept so it can be forwarded to the Request Store.
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract token from Authorization header
    let auth_header = req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Decode and validate JWT
    let token_data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    ).map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        StatusCode::UNAUTHORIZED
    })?;

    // 3. Inject session into request extensions
    let session = Session::new(Some(token_data.claims.acting_user()), Some(token.to_string()));
    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}
