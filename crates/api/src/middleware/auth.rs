//! Access-token authentication guard.

use std::ops::ControlFlow;

use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::HeaderMap;
use notekernel_core::roles::Role;

use crate::auth::jwt::validate_token;
use crate::error::{AppError, AppResult};
use crate::routing::{GuardOutcome, Identity, RequestContext};
use crate::state::AppState;

/// Cookie that carries the access token for browser clients.
pub const TOKEN_COOKIE: &str = "notekernel-token";

/// Resolve the caller and attach the [`Identity`] to the context.
///
/// Rejects with 401 Unauthorized when no valid, unrevoked token is presented.
pub fn check_auth(ctx: &mut RequestContext) -> GuardOutcome {
    match authenticate(&ctx.headers, &ctx.state) {
        Ok(identity) => {
            ctx.identity = Some(identity);
            ControlFlow::Continue(())
        }
        Err(err) => ControlFlow::Break(err),
    }
}

/// Identify the caller from request headers.
///
/// With no access code configured every caller is the local owner.
pub fn authenticate(headers: &HeaderMap, state: &AppState) -> AppResult<Identity> {
    if !state.sessions.auth_enabled() {
        return Ok(Identity::local_owner());
    }

    let token = extract_token(headers)
        .ok_or_else(|| AppError::unauthenticated("Missing access token"))?;

    let claims = validate_token(token, &state.config.jwt)
        .map_err(|_| AppError::unauthenticated("Invalid or expired token"))?;

    if !state.sessions.is_token_live(&claims.jti, claims.generation) {
        return Err(AppError::unauthenticated("Token has been revoked"));
    }

    let role: Role = claims
        .role
        .parse()
        .map_err(|_| AppError::unauthenticated("Token carries an unknown role"))?;

    Ok(Identity {
        subject: claims.sub,
        role,
    })
}

/// Pull the token from `Authorization: Bearer|Token <t>` or the session cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let from_header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("Token ")))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    from_header.or_else(|| {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == TOKEN_COOKIE)
            .map(|(_, value)| value)
            .filter(|t| !t.is_empty())
    })
}
