use crate::error::KeeperError;
use crate::types::settings::{AppSettings, SettingsPatch};
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::warn;

/// JSON-file-backed settings with patch semantics: a save merges the patch
/// into the stored settings and emits exactly one change notification.
pub struct SettingsStore {
    path: PathBuf,
    events: broadcast::Sender<()>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        let (events, _) = broadcast::channel(16);
        Self { path, events }
    }

    /// Missing or unreadable-as-JSON files fall back to defaults; a corrupt
    /// settings file must not take the scheduler down.
    pub fn load(&self) -> Result<AppSettings, KeeperError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(settings) => Ok(settings),
                Err(e) => {
                    warn!(error = %e, "settings file corrupt, using defaults");
                    Ok(AppSettings::default())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppSettings::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, patch: SettingsPatch) -> Result<AppSettings, KeeperError> {
        let mut settings = self.load()?;
        settings.apply(patch);
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(&settings)?)?;
        // no receivers yet is fine
        let _ = self.events.send(());
        Ok(settings)
    }

    /// Subscribe to settings-changed notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.events.subscribe()
    }
}
