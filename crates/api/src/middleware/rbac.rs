//! Role-based access control guard.

use std::ops::ControlFlow;

use crate::error::AppError;
use crate::routing::{GuardOutcome, RequestContext};

/// Requires the administrator role. Rejects with 403 Forbidden otherwise.
///
/// A missing identity means the chain was built without [`check_auth`] in
/// front, which the table builder prevents; it still fails closed with 401.
///
/// [`check_auth`]: super::auth::check_auth
pub fn check_admin_role(ctx: &mut RequestContext) -> GuardOutcome {
    let identity = match ctx.identity() {
        Ok(identity) => identity,
        Err(err) => return ControlFlow::Break(err),
    };

    if !identity.role.is_admin() {
        tracing::info!(
            subject = %identity.subject,
            role = %identity.role,
            path = %ctx.path,
            "Rejected non-admin caller"
        );
        return ControlFlow::Break(AppError::forbidden("Administrator role required"));
    }
    ControlFlow::Continue(())
}
