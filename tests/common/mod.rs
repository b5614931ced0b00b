#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use kiro_keeper::backend::AccountBackend;
use kiro_keeper::error::KeeperError;
use kiro_keeper::types::account::{Account, AccountStatus, Provider};
use kiro_keeper::types::job::SwitchParams;
use kiro_keeper::types::settings::{AppSettings, SettingsPatch};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// In-memory stand-in for the production backend. Every mutation is recorded
/// so tests can assert on exactly which calls happened.
#[derive(Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    accounts: Vec<Account>,
    settings: AppSettings,
    // account id -> (status, message) the renewal fails with
    fail_renew: HashMap<String, (u16, String)>,
    fail_sync: HashMap<String, (u16, String)>,
    fail_bindings: bool,
    fail_switch: bool,
    renew_delay: Option<Duration>,
    bindings: HashMap<String, String>,
    generated: u32,
    renewed: Vec<String>,
    synced: Vec<String>,
    statuses: Vec<(String, AccountStatus)>,
    switches: Vec<SwitchParams>,
    applied_machine_ids: Vec<String>,
    list_calls: usize,
    settings_calls: usize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_account(&self, account: Account) {
        self.state.lock().unwrap().accounts.push(account);
    }

    pub fn set_settings(&self, settings: AppSettings) {
        self.state.lock().unwrap().settings = settings;
    }

    pub fn fail_renew(&self, id: &str, status: u16, message: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_renew
            .insert(id.to_string(), (status, message.to_string()));
    }

    pub fn fail_sync(&self, id: &str, status: u16, message: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_sync
            .insert(id.to_string(), (status, message.to_string()));
    }

    pub fn fail_bindings(&self) {
        self.state.lock().unwrap().fail_bindings = true;
    }

    pub fn fail_switch(&self) {
        self.state.lock().unwrap().fail_switch = true;
    }

    pub fn set_renew_delay(&self, delay: Duration) {
        self.state.lock().unwrap().renew_delay = Some(delay);
    }

    pub fn renewed(&self) -> Vec<String> {
        self.state.lock().unwrap().renewed.clone()
    }

    pub fn synced(&self) -> Vec<String> {
        self.state.lock().unwrap().synced.clone()
    }

    pub fn statuses(&self) -> Vec<(String, AccountStatus)> {
        self.state.lock().unwrap().statuses.clone()
    }

    pub fn switches(&self) -> Vec<SwitchParams> {
        self.state.lock().unwrap().switches.clone()
    }

    pub fn applied_machine_ids(&self) -> Vec<String> {
        self.state.lock().unwrap().applied_machine_ids.clone()
    }

    pub fn binding(&self, id: &str) -> Option<String> {
        self.state.lock().unwrap().bindings.get(id).cloned()
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    pub fn settings_calls(&self) -> usize {
        self.state.lock().unwrap().settings_calls
    }

    pub fn account(&self, id: &str) -> Option<Account> {
        self.state
            .lock()
            .unwrap()
            .accounts
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }
}

#[async_trait]
impl AccountBackend for MockBackend {
    async fn list_accounts(&self) -> Result<Vec<Account>, KeeperError> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;
        Ok(state.accounts.clone())
    }

    async fn renew_token(&self, account_id: &str) -> Result<Account, KeeperError> {
        let delay = self.state.lock().unwrap().renew_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock().unwrap();
        if let Some((status, message)) = state.fail_renew.get(account_id).cloned() {
            return Err(KeeperError::RenewalRejected { status, message });
        }
        let account = state
            .accounts
            .iter_mut()
            .find(|a| a.id == account_id)
            .ok_or_else(|| KeeperError::AccountNotFound(account_id.to_string()))?;
        account.expires_at = Some(Utc::now() + ChronoDuration::hours(1));
        let renewed = account.clone();
        state.renewed.push(account_id.to_string());
        Ok(renewed)
    }

    async fn sync_account(&self, account_id: &str) -> Result<Account, KeeperError> {
        let mut state = self.state.lock().unwrap();
        if let Some((status, message)) = state.fail_sync.get(account_id).cloned() {
            return Err(KeeperError::RenewalRejected { status, message });
        }
        let account = state
            .accounts
            .iter_mut()
            .find(|a| a.id == account_id)
            .ok_or_else(|| KeeperError::AccountNotFound(account_id.to_string()))?;
        account.expires_at = Some(Utc::now() + ChronoDuration::hours(1));
        account.status = AccountStatus::Normal;
        let synced = account.clone();
        state.synced.push(account_id.to_string());
        Ok(synced)
    }

    async fn mark_status(
        &self,
        account_id: &str,
        status: AccountStatus,
    ) -> Result<(), KeeperError> {
        let mut state = self.state.lock().unwrap();
        if let Some(account) = state.accounts.iter_mut().find(|a| a.id == account_id) {
            account.status = status;
        }
        state.statuses.push((account_id.to_string(), status));
        Ok(())
    }

    async fn switch_active(&self, params: &SwitchParams) -> Result<(), KeeperError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_switch {
            return Err(KeeperError::Upstream {
                status: 500,
                message: "token file write failed".to_string(),
            });
        }
        state.switches.push(params.clone());
        Ok(())
    }

    async fn bound_machine_id(&self, account_id: &str) -> Result<Option<String>, KeeperError> {
        let state = self.state.lock().unwrap();
        if state.fail_bindings {
            return Err(KeeperError::MachineIdentity("binding store down".to_string()));
        }
        Ok(state.bindings.get(account_id).cloned())
    }

    async fn bind_machine_id(
        &self,
        account_id: &str,
        machine_id: &str,
    ) -> Result<(), KeeperError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_bindings {
            return Err(KeeperError::MachineIdentity("binding store down".to_string()));
        }
        // first-use-wins, like the sqlite store
        state
            .bindings
            .entry(account_id.to_string())
            .or_insert_with(|| machine_id.to_string());
        Ok(())
    }

    fn generate_machine_id(&self) -> String {
        let mut state = self.state.lock().unwrap();
        state.generated += 1;
        format!("machine-{}", state.generated)
    }

    async fn apply_machine_id(&self, machine_id: &str) -> Result<(), KeeperError> {
        self.state
            .lock()
            .unwrap()
            .applied_machine_ids
            .push(machine_id.to_string());
        Ok(())
    }

    async fn get_settings(&self) -> Result<AppSettings, KeeperError> {
        let mut state = self.state.lock().unwrap();
        state.settings_calls += 1;
        Ok(state.settings.clone())
    }

    async fn save_settings(&self, patch: SettingsPatch) -> Result<AppSettings, KeeperError> {
        let mut state = self.state.lock().unwrap();
        state.settings.apply(patch);
        Ok(state.settings.clone())
    }
}

/// Account fixture with both tokens and an expiry `minutes` from now.
pub fn account_expiring_in(email: &str, minutes: i64) -> Account {
    let mut account = Account::new(email, "");
    account.access_token = Some("at".to_string());
    account.refresh_token = Some("rt".to_string());
    account.expires_at = Some(Utc::now() + ChronoDuration::minutes(minutes));
    account
}

/// Account fixture with tokens but no recorded expiry.
pub fn account_without_expiry(email: &str) -> Account {
    let mut account = Account::new(email, "");
    account.access_token = Some("at".to_string());
    account.refresh_token = Some("rt".to_string());
    account
}

#[allow(dead_code)]
pub fn idc_account(email: &str) -> Account {
    let mut account = account_expiring_in(email, 60);
    account.provider = Provider::BuilderId;
    account.client_id = Some("cid".to_string());
    account.client_secret = Some("csecret".to_string());
    account.region = Some("eu-west-1".to_string());
    account.client_id_hash = Some("abc123".to_string());
    account
}
