//! Terminal route steps.
//!
//! Every handler is `async fn(RequestContext) -> AppResult<impl IntoResponse>`
//! and is wrapped with [`Step::handler`](crate::routing::Step::handler) when
//! its route is registered.

pub mod auth;
pub mod system;
pub mod workspace;
