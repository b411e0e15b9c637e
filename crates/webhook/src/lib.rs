//! Resource webhook server
//!
//! Configuration and the HTTP layer around `webhook_lib::Mutator`.

pub mod api;
pub mod config;
