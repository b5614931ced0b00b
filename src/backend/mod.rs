//! Backend seam between the scheduling/switching services and the outside
//! world (storage, provider APIs, the local IDE's files).

pub mod kiro;
pub mod settings;

pub use kiro::KiroBackend;
pub use settings::SettingsStore;

use crate::error::KeeperError;
use crate::types::account::{Account, AccountStatus};
use crate::types::job::SwitchParams;
use crate::types::settings::{AppSettings, SettingsPatch};
use async_trait::async_trait;

/// Everything the services need from the environment, behind one trait so
/// tests can substitute an in-memory double.
#[async_trait]
pub trait AccountBackend: Send + Sync {
    /// Snapshot of every stored account.
    async fn list_accounts(&self) -> Result<Vec<Account>, KeeperError>;

    /// Renew one account's token pair and persist the result. Token-only:
    /// never touches usage data or account status.
    async fn renew_token(&self, account_id: &str) -> Result<Account, KeeperError>;

    /// Renew tokens, then refresh the cached usage snapshot and re-derive the
    /// account status from the provider's response.
    async fn sync_account(&self, account_id: &str) -> Result<Account, KeeperError>;

    async fn mark_status(&self, account_id: &str, status: AccountStatus)
    -> Result<(), KeeperError>;

    /// Make the described account the active one on the local IDE.
    async fn switch_active(&self, params: &SwitchParams) -> Result<(), KeeperError>;

    async fn bound_machine_id(&self, account_id: &str) -> Result<Option<String>, KeeperError>;

    async fn bind_machine_id(&self, account_id: &str, machine_id: &str)
    -> Result<(), KeeperError>;

    fn generate_machine_id(&self) -> String;

    /// Apply a machine identity to the local IDE.
    async fn apply_machine_id(&self, machine_id: &str) -> Result<(), KeeperError>;

    async fn get_settings(&self) -> Result<AppSettings, KeeperError>;

    async fn save_settings(&self, patch: SettingsPatch) -> Result<AppSettings, KeeperError>;
}
