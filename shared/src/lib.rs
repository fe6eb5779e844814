//! Shared types for the membership platform
//!
//! Domain aggregates, commands and events for the membership lifecycle
//! engine, plus the unified error system used across crates.

pub mod error;
pub mod membership;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

// Domain re-exports (for convenient access)
pub use membership::{CommandPayload, CommandResponse, MembershipCommand, MembershipEvent};
