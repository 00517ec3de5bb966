use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::models::profile::{resolve_role, Role};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
    pub admin: bool,
    pub data_input: bool,
}

/// Explicit identity object injected into request extensions. Handlers take
/// it as `Extension<AuthContext>` instead of reaching into ambient state.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl AuthContext {
    fn from_claims(claims: &Claims) -> Option<Self> {
        let user_id = Uuid::parse_str(&claims.sub).ok()?;
        Some(Self {
            user_id,
            email: claims.email.clone(),
            role: resolve_role(claims.admin, claims.data_input),
        })
    }
}

fn unauthorized(reason: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": reason }))).into_response()
}

fn decode_context(headers: &HeaderMap) -> Result<AuthContext, Response> {
    let Some(auth_header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Err(unauthorized("missing_authorization"));
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err(unauthorized("bad_authorization"));
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err(unauthorized("unsupported_scheme"));
    };

    let config = crate::config::get_config();
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|_| unauthorized("invalid_token"))?;

    AuthContext::from_claims(&data.claims).ok_or_else(|| unauthorized("invalid_token"))
}

/// Best-effort identity for routes that work anonymously (practice exams).
pub fn maybe_identity(headers: &HeaderMap) -> Option<AuthContext> {
    decode_context(headers).ok()
}

pub async fn require_auth(mut req: Request, next: Next) -> Response {
    match decode_context(req.headers()) {
        Ok(ctx) => {
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Err(resp) => resp,
    }
}

pub async fn require_admin(mut req: Request, next: Next) -> Response {
    match decode_context(req.headers()) {
        Ok(ctx) => {
            if ctx.role != Role::Admin {
                return (StatusCode::FORBIDDEN, Json(json!({"error":"forbidden"})))
                    .into_response();
            }
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Err(resp) => resp,
    }
}

/// Admin or data-input: the two roles allowed to manage question content
/// and review webhook events.
pub async fn require_reviewer(mut req: Request, next: Next) -> Response {
    match decode_context(req.headers()) {
        Ok(ctx) => {
            if ctx.role == Role::User {
                return (StatusCode::FORBIDDEN, Json(json!({"error":"forbidden"})))
                    .into_response();
            }
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Err(resp) => resp,
    }
}
