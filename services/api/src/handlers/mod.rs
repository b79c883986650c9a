//! REST API handlers

pub mod accounts;
pub mod admin;
pub mod health;
pub mod organizations;
pub mod packages;
pub mod plans;
pub mod projects;
pub mod shared;
pub mod subscription;
pub mod webhook;

pub use accounts::*;
pub use admin::*;
pub use health::*;
pub use organizations::*;
pub use packages::*;
pub use plans::*;
pub use projects::*;
pub use subscription::*;
pub use webhook::*;
