//! FieldHub Types - Shared domain types
//!
//! This crate contains domain types used across FieldHub services:
//! - Accounts and user categories
//! - Projects and collaborator roles
//! - Subscription plans, extra packages and active periods

pub mod error;
pub mod package;
pub mod plan;
pub mod project;
pub mod role;
pub mod subscription;
pub mod user;

pub use error::*;
pub use package::*;
pub use plan::*;
pub use project::*;
pub use role::*;
pub use subscription::*;
pub use user::*;
