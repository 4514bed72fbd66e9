//! Core abstractions shared by every crate in the workspace
//!
//! This crate defines the `Agent` trait, the execution `Context` that carries
//! per-call state such as the session id, and the common error type.

pub mod agent;
pub mod context;
pub mod error;

pub use agent::Agent;
pub use context::Context;
pub use error::{Error, Result};
