//! Handlers for the access-code login flow.
//!
//! The kernel has a single owner, so a successful login always yields an
//! administrator token. Failed attempts are throttled by the shared
//! [`SessionStore`](crate::auth::session::SessionStore).

use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, IntoResponse};
use axum::Json;
use chrono::Utc;
use notekernel_core::error::CoreError;
use notekernel_core::roles::Role;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::{generate_access_token, validate_token};
use crate::auth::session::MAX_FAILED_ATTEMPTS;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{extract_token, TOKEN_COOKIE};
use crate::response::DataResponse;
use crate::routing::RequestContext;

/// Subject recorded in tokens issued through `loginAuth`.
const OWNER_SUBJECT: &str = "owner";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub auth_code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAccessAuthCodeRequest {
    #[serde(default)]
    pub access_auth_code: String,
}

#[derive(Debug, Serialize)]
pub struct AuthCodeStatus {
    pub enabled: bool,
}

fn session_cookie(token: &str, max_age: i64) -> String {
    format!("{TOKEN_COOKIE}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age}")
}

/// POST /api/system/loginAuth
///
/// Exchange the access code for a token. The token is returned in the body
/// and set as the session cookie.
pub async fn login_auth(ctx: RequestContext) -> AppResult<impl IntoResponse> {
    let input: LoginRequest = ctx.json()?;
    let sessions = &ctx.state.sessions;

    if sessions.auth_enabled() {
        let now = Utc::now();
        if let Some(until) = sessions.locked_until(now) {
            return Err(AppError::forbidden(format!(
                "Too many failed attempts. Try again after {}",
                until.format("%H:%M:%S UTC")
            )));
        }

        let valid = sessions
            .verify_code(&input.auth_code)
            .map_err(|e| AppError::InternalError(format!("Access code verification failed: {e}")))?;

        if !valid {
            let failed = sessions.record_failure(now);
            tracing::warn!(
                failed,
                max = MAX_FAILED_ATTEMPTS,
                "Rejected access code"
            );
            return Err(AppError::unauthenticated("Invalid access authorization code"));
        }
        sessions.record_success();
    }

    let jwt = &ctx.state.config.jwt;
    let generation = sessions.generation();
    let token = generate_access_token(OWNER_SUBJECT, Role::Administrator, generation, jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;
    let expires_in = jwt.expires_in_secs();

    tracing::info!("Access code login succeeded");

    Ok((
        AppendHeaders([(SET_COOKIE, session_cookie(&token, expires_in))]),
        Json(DataResponse {
            data: LoginResponse { token, expires_in },
        }),
    ))
}

/// POST /api/system/logoutAuth
///
/// Revokes the presented token if there is one and clears the cookie.
/// Calling it without a valid token still succeeds.
pub async fn logout_auth(ctx: RequestContext) -> AppResult<impl IntoResponse> {
    if let Some(token) = extract_token(&ctx.headers) {
        if let Ok(claims) = validate_token(token, &ctx.state.config.jwt) {
            ctx.state.sessions.revoke(&claims.jti, claims.exp);
            tracing::info!(jti = %claims.jti, "Token revoked on logout");
        }
    }

    Ok((
        AppendHeaders([(SET_COOKIE, session_cookie("", 0))]),
        Json(DataResponse { data: () }),
    ))
}

/// POST /api/system/setAccessAuthCode
///
/// Replaces the access code. Every token issued before the change, including
/// the caller's, stops working. An empty code disables authentication.
pub async fn set_access_auth_code(
    ctx: RequestContext,
) -> AppResult<Json<DataResponse<AuthCodeStatus>>> {
    let input: SetAccessAuthCodeRequest = ctx.json()?;
    let code = input.access_auth_code.trim();

    if code.chars().count() > 64 {
        return Err(AppError::Core(CoreError::Validation(
            "Access authorization code must be at most 64 characters".into(),
        )));
    }

    ctx.state
        .sessions
        .set_auth_code(Some(code))
        .map_err(|e| AppError::InternalError(format!("Failed to hash access code: {e}")))?;

    let enabled = ctx.state.sessions.auth_enabled();
    tracing::info!(enabled, "Access authorization code changed");

    Ok(Json(DataResponse {
        data: AuthCodeStatus { enabled },
    }))
}
