use crate::backend::settings::SettingsStore;
use crate::backend::AccountBackend;
use crate::config::CONFIG;
use crate::db::AccountsStorage;
use crate::error::KeeperError;
use crate::kiro_auth::{self, endpoints, machine_id, token_file};
use crate::types::account::{Account, AccountStatus};
use crate::types::job::SwitchParams;
use crate::types::settings::{AppSettings, SettingsPatch};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Production backend: SQLite account storage, the Kiro provider APIs and
/// the local IDE's token/machine-identity files.
pub struct KiroBackend {
    storage: AccountsStorage,
    settings: SettingsStore,
    http: reqwest::Client,
    ide_token_dir: PathBuf,
    machine_id_path: PathBuf,
}

impl KiroBackend {
    /// Open (creating if needed) the backend state under `data_dir`.
    pub async fn open(data_dir: &Path) -> Result<Self, KeeperError> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join("accounts.db");
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))
            .map_err(KeeperError::Database)?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let storage = AccountsStorage::new(pool);
        storage.init_schema().await?;
        info!(path = %db_path.display(), "accounts database ready");

        Ok(Self {
            storage,
            settings: SettingsStore::new(data_dir.join("settings.json")),
            http: kiro_auth::build_http_client(),
            ide_token_dir: CONFIG.resolved_ide_token_dir(),
            machine_id_path: data_dir.join("machine-id"),
        })
    }

    /// Stream of settings-changed notifications, consumed by the scheduler.
    pub fn settings_events(&self) -> broadcast::Receiver<()> {
        self.settings.subscribe()
    }

    /// Apply renewed token material onto the stored account.
    fn patch_tokens(account: &mut Account, renewed: endpoints::RenewedToken) {
        account.access_token = Some(renewed.access_token);
        if let Some(rt) = renewed.refresh_token {
            account.refresh_token = Some(rt);
        }
        account.expires_at = Some(Utc::now() + ChronoDuration::seconds(renewed.expires_in));
        if let Some(arn) = renewed.profile_arn {
            account.profile_arn = Some(arn);
        }
        if let Some(sid) = renewed.sso_session_id {
            account.sso_session_id = Some(sid);
        }
    }
}

#[async_trait]
impl AccountBackend for KiroBackend {
    async fn list_accounts(&self) -> Result<Vec<Account>, KeeperError> {
        self.storage.list().await
    }

    async fn renew_token(&self, account_id: &str) -> Result<Account, KeeperError> {
        let mut account = self.storage.get(account_id).await?;
        let renewed = endpoints::renew(&self.http, &account).await?;
        Self::patch_tokens(&mut account, renewed);
        self.storage.upsert(&account).await?;
        Ok(account)
    }

    async fn sync_account(&self, account_id: &str) -> Result<Account, KeeperError> {
        let mut account = self.renew_token(account_id).await?;

        let access_token = account
            .access_token
            .as_deref()
            .ok_or(KeeperError::MissingTokens)?;
        match endpoints::fetch_usage(&self.http, access_token, account.profile_arn.as_deref())
            .await
        {
            Ok(usage) => {
                account.usage_data = Some(usage);
                account.status = AccountStatus::Normal;
            }
            Err(KeeperError::Banned(reason)) => {
                warn!(email = %account.email, reason = %reason, "account suspended by provider");
                account.usage_data = None;
                account.status = AccountStatus::Banned;
            }
            Err(e) => {
                // token renewal succeeded; a usage hiccup is not a failure
                warn!(email = %account.email, error = %e, "usage lookup failed");
                account.usage_data = None;
                account.status = AccountStatus::Normal;
            }
        }
        self.storage.upsert(&account).await?;
        Ok(account)
    }

    async fn mark_status(
        &self,
        account_id: &str,
        status: AccountStatus,
    ) -> Result<(), KeeperError> {
        self.storage.set_status(account_id, status).await
    }

    async fn switch_active(&self, params: &SwitchParams) -> Result<(), KeeperError> {
        if params.reset_machine_id {
            let fresh = machine_id::generate_machine_id();
            machine_id::write_machine_id(&self.machine_id_path, &fresh)?;
        }
        token_file::write_ide_token(&self.ide_token_dir, params)
    }

    async fn bound_machine_id(&self, account_id: &str) -> Result<Option<String>, KeeperError> {
        self.storage.bound_machine_id(account_id).await
    }

    async fn bind_machine_id(
        &self,
        account_id: &str,
        machine_id: &str,
    ) -> Result<(), KeeperError> {
        self.storage.bind_machine_id(account_id, machine_id).await
    }

    fn generate_machine_id(&self) -> String {
        machine_id::generate_machine_id()
    }

    async fn apply_machine_id(&self, machine_id: &str) -> Result<(), KeeperError> {
        machine_id::write_machine_id(&self.machine_id_path, machine_id)
    }

    async fn get_settings(&self) -> Result<AppSettings, KeeperError> {
        self.settings.load()
    }

    async fn save_settings(&self, patch: SettingsPatch) -> Result<AppSettings, KeeperError> {
        self.settings.save(patch)
    }
}
