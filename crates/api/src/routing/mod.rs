//! Middleware-chained route table.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     RouteTableBuilder::register(method, path, [guards.., handler])
//!     → chain validation (non-empty, handler last, auth before role/read-only)
//!     → RouteTable (immutable, shared via Arc)
//!
//! Per request:
//!     axum fallback → dispatch_request
//!     → RequestContext (method, path, headers, body, state)
//!     → RouteTable::dispatch: exact lookup, guards left to right, handler
//!     → Response, or AppError rendered as JSON
//! ```

pub mod context;
pub mod step;
pub mod table;

pub use context::{Identity, RequestContext};
pub use step::{Guard, GuardOutcome, Handler, Step};
pub use table::{Route, RouteError, RouteTable, RouteTableBuilder};

use std::error::Error;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::response::Response;
use http_body_util::LengthLimitError;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Axum fallback that hands every request to the kernel route table.
pub async fn dispatch_request(
    State(state): State<AppState>,
    request: Request<Body>,
) -> AppResult<Response> {
    let (parts, body) = request.into_parts();
    let limit = state.config.max_body_bytes;
    let body = axum::body::to_bytes(body, limit).await.map_err(|e| {
        if exceeds_length_limit(&e) {
            AppError::PayloadTooLarge { limit }
        } else {
            AppError::BadRequest(format!("Failed to read request body: {e}"))
        }
    })?;

    let ctx = RequestContext::from_parts(state.clone(), parts, body);
    state.routes.dispatch(ctx).await
}

/// Whether a body read failed because it hit the `to_bytes` limit.
fn exceeds_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}
