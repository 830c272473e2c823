//! HTTP handlers.

pub mod health;
pub mod redirect;
pub mod shorten;
pub mod stats;
pub mod user;
