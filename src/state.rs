//! Application state management
//!
//! Contains shared state accessible across all handlers. The governance
//! context is read-only after startup; only the policy store has locking.

use crate::config::GovernanceConfig;
use crate::context::GovernanceContext;
use crate::simulation::ShiftSimulator;
use crate::versioning::PolicyStore;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    /// Schema registry and domain rule set
    pub context: Arc<GovernanceContext>,

    /// Committed policy revisions (has internal locking)
    pub policies: PolicyStore,

    /// Shift presets with configured impact overrides
    pub shift: ShiftSimulator,

    pub ablation_parallel: bool,

    /// Seed of the heuristic scorer behind `/api/ablation`
    pub ablation_seed: u64,
}

impl AppState {
    pub fn new(context: GovernanceContext, config: &GovernanceConfig) -> Self {
        Self {
            context: Arc::new(context),
            policies: PolicyStore::new(),
            shift: ShiftSimulator::with_overrides(&config.shift_impacts),
            ablation_parallel: config.ablation_parallel,
            ablation_seed: config.ablation_seed,
        }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
