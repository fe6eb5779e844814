//! Club Server - membership lifecycle and annual fee engine
//!
//! # Architecture overview
//!
//! The server owns the full membership lifecycle of a car club:
//!
//! - **Applications** (`membership`): document-gated state machine from
//!   submission to granted membership
//! - **Payments**: idempotent deposit ledger for enrollment and annual fees
//! - **Periods**: one membership period per member-year, driven by payments
//! - **Vehicles**: the member vehicle roster with VIN uniqueness
//! - **Orchestrator**: event-driven follow-ups connecting ledger and lifecycle
//!
//! # Module structure
//!
//! ```text
//! club-server/src/
//! ├── config.rs      # Environment configuration
//! ├── common/        # Logging, audit macro
//! └── membership/    # Engine: storage, actions, manager, orchestrator
//! ```

pub mod common;
pub mod config;
pub mod membership;

// Re-export public types
pub use config::Config;
pub use membership::{
    DocumentOcr, FeeCalendar, LifecycleOrchestrator, ManagerError, ManagerResult,
    MembershipManager, MembershipStorage, NoopOcr,
};

// Re-export logger functions
pub use common::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

pub fn print_banner() {
    println!(
        r#"
   ________      __
  / ____/ /_  __/ /_
 / /   / / / / / __ \
/ /___/ / /_/ / /_/ /
\____/_/\__,_/_.___/
   _____
  / ___/___  ______   _____  _____
  \__ \/ _ \/ ___/ | / / _ \/ ___/
 ___/ /  __/ /   | |/ /  __/ /
/____/\___/_/    |___/\___/_/
    "#
    );
}
