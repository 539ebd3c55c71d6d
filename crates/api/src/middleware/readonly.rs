//! Read-only mode guard.

use std::ops::ControlFlow;

use crate::error::AppError;
use crate::routing::{GuardOutcome, RequestContext};

/// Blocks the request when the process-wide read-only flag is raised or the
/// caller holds a read-only role (reader, visitor).
pub fn check_readonly(ctx: &mut RequestContext) -> GuardOutcome {
    if ctx.state.is_read_only() {
        return ControlFlow::Break(AppError::read_only(
            "The kernel is in read-only mode",
        ));
    }

    match ctx.identity() {
        Ok(identity) if identity.role.is_read_only() => ControlFlow::Break(AppError::read_only(
            format!("Role '{}' cannot modify data", identity.role),
        )),
        Ok(_) => ControlFlow::Continue(()),
        Err(err) => ControlFlow::Break(err),
    }
}
