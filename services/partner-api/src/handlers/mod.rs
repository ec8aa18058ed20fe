//! HTTP handlers

pub mod auth;
pub mod health;
pub mod user;

pub use auth::*;
pub use health::*;
pub use user::*;
