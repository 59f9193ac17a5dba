// Rust guideline compliant 2026-10-18

//! Live model monitor dashboard: HTTP/JSON layer, history adapter, application
//! context and process configuration.
//!
//! The binary in `main.rs` wires these together with the background updater.

pub mod adapters;
pub mod api;
pub mod config;
pub mod context;

pub use adapters::ring_history::RingHistory;
pub use api::router;
pub use config::{ConfigError, DashboardConfig};
pub use context::AppContext;
