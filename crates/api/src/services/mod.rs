//! Stateful collaborators behind the system handlers.

pub mod conf;
pub mod logs;
pub mod workspace;
