//! Common utilities and shared infrastructure
//!
//! This module contains core infrastructure used across the application:
//! - Logging setup
//! - Audit log macro

pub mod logger;

// Re-export commonly used items
pub use logger::{cleanup_old_logs, init_logger, init_logger_with_file};
