pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod kiro_auth;
pub mod service;
pub mod types;

pub use backend::{AccountBackend, KiroBackend};
pub use error::KeeperError;
pub use service::{RefreshCoordinator, RefreshScheduler, SwitchOrchestrator};
