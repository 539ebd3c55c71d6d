//! Route-chain guards.
//!
//! - [`auth::check_auth`] -- resolves the caller from the access token and attaches an [`Identity`].
//! - [`rbac::check_admin_role`] -- requires the administrator role.
//! - [`readonly::check_readonly`] -- blocks mutations in read-only mode or for read-only roles.
//!
//! The constructors below return ready-made [`Step`]s; the table builder
//! refuses routes that place the role or read-only guard before [`auth`].
//!
//! [`Identity`]: crate::routing::Identity

pub mod auth;
pub mod rbac;
pub mod readonly;

use crate::routing::{Guard, Step};

pub const GUARD_AUTH: &str = "check_auth";
pub const GUARD_ADMIN_ROLE: &str = "check_admin_role";
pub const GUARD_READONLY: &str = "check_readonly";

/// Authentication presence.
pub fn auth() -> Step {
    Guard::new(GUARD_AUTH, auth::check_auth)
        .providing_identity()
        .into()
}

/// Administrator role membership.
pub fn admin() -> Step {
    Guard::new(GUARD_ADMIN_ROLE, rbac::check_admin_role)
        .requiring_identity()
        .into()
}

/// Read-only / maintenance block.
pub fn readonly() -> Step {
    Guard::new(GUARD_READONLY, readonly::check_readonly)
        .requiring_identity()
        .into()
}
