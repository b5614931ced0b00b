use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Operator-facing application settings. Persisted by the backend; every
/// save is followed by exactly one settings-changed notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub auto_refresh: bool,
    /// Sweep cadence in minutes. Always at least 1.
    pub auto_refresh_interval: u32,
    pub auto_change_machine_id: bool,
    pub bind_machine_id_to_account: bool,
    pub use_bound_machine_id: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            auto_refresh: true,
            auto_refresh_interval: 50,
            auto_change_machine_id: false,
            bind_machine_id_to_account: false,
            use_bound_machine_id: true,
        }
    }
}

impl AppSettings {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.auto_refresh_interval.max(1)) * 60)
    }

    /// Merge a partial patch: unspecified fields stay unchanged.
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(v) = patch.auto_refresh {
            self.auto_refresh = v;
        }
        if let Some(v) = patch.auto_refresh_interval {
            self.auto_refresh_interval = v.max(1);
        }
        if let Some(v) = patch.auto_change_machine_id {
            self.auto_change_machine_id = v;
        }
        if let Some(v) = patch.bind_machine_id_to_account {
            self.bind_machine_id_to_account = v;
        }
        if let Some(v) = patch.use_bound_machine_id {
            self.use_bound_machine_id = v;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub auto_refresh: Option<bool>,
    pub auto_refresh_interval: Option<u32>,
    pub auto_change_machine_id: Option<bool>,
    pub bind_machine_id_to_account: Option<bool>,
    pub use_bound_machine_id: Option<bool>,
}
