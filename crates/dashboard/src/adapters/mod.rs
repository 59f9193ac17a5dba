// Rust guideline compliant 2026-10-18

//! Adapters (secondary ports) for the dashboard binary.
//!
//! Each sub-module implements a hexagonal port trait defined in the `domain`
//! crate.

pub mod ring_history;
