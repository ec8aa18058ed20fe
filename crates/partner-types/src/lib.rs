//! Partner Types - Shared domain types
//!
//! This crate contains domain types used across Partner services:
//! - User identity
//! - Session claims, token pairs and the authenticated principal

pub mod session;
pub mod user;

pub use session::*;
pub use user::*;
