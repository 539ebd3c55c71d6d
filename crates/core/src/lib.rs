pub mod error;
pub mod roles;
pub mod types;
pub mod version;
