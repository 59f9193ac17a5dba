// Rust guideline compliant 2026-10-18

//! Application context shared by the HTTP handlers and the background updater.

use std::sync::Arc;

use domain::Trainer;
use modelizer::ModelManager;
use network::NetworkTrainer;

use crate::adapters::ring_history::RingHistory;

/// Process-wide state, built once in `main` and cloned into every consumer.
///
/// Generic over the trainer so the routes can be driven by any backend;
/// the binary uses [`NetworkTrainer`].
pub struct AppContext<T: Trainer = NetworkTrainer> {
    /// Owner of the published model state.
    pub manager: Arc<ModelManager<T>>,
    /// Bounded metric history.
    pub history: Arc<RingHistory>,
}

impl<T: Trainer> AppContext<T> {
    /// Wrap `manager` and `history` for sharing.
    #[must_use]
    pub fn new(manager: ModelManager<T>, history: RingHistory) -> Self {
        Self { manager: Arc::new(manager), history: Arc::new(history) }
    }
}

// Manual impls: deriving would demand `T: Clone` and `T: Debug`.
impl<T: Trainer> Clone for AppContext<T> {
    fn clone(&self) -> Self {
        Self { manager: Arc::clone(&self.manager), history: Arc::clone(&self.history) }
    }
}

impl<T: Trainer> std::fmt::Debug for AppContext<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext").field("manager", &self.manager).field("history", &self.history).finish()
    }
}
