//! Credential lifecycle services: expiry evaluation, concurrent renewal,
//! the periodic sweep timer and the switch-active workflow.

pub mod coordinator;
pub mod evaluator;
pub mod scheduler;
pub mod switcher;

pub use coordinator::RefreshCoordinator;
pub use evaluator::{needs_refresh, MissingExpiry};
pub use scheduler::RefreshScheduler;
pub use switcher::{SwitchOrchestrator, SwitchPhase, SwitchRequest};
