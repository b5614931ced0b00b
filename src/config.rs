use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

/// Process configuration. Every field can be overridden through a
/// `KEEPER_`-prefixed environment variable (e.g. `KEEPER_LOGLEVEL=debug`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the accounts database, settings file and machine
    /// identity state.
    pub data_dir: PathBuf,
    pub loglevel: String,
    /// Base URL of the desktop auth API (social token renewal).
    pub auth_api: Url,
    /// Base URL of the usage/quota API.
    pub usage_api: Url,
    /// Directory the IDE reads its auth token from. Defaults to
    /// `~/.aws/sso/cache` when unset.
    pub ide_token_dir: Option<PathBuf>,
    pub proxy: Option<Url>,
    /// A token expiring within this window is considered due for renewal.
    /// Independent from the refresh cadence, which lives in AppSettings.
    pub expiry_threshold_secs: u64,
    pub http_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join(".kiro-keeper");
        Self {
            data_dir,
            loglevel: "info".to_string(),
            auth_api: Url::parse("https://prod.us-east-1.auth.desktop.kiro.dev")
                .expect("default auth_api URL is valid"),
            usage_api: Url::parse("https://codewhisperer.us-east-1.amazonaws.com")
                .expect("default usage_api URL is valid"),
            ide_token_dir: None,
            proxy: None,
            expiry_threshold_secs: 5 * 60,
            http_timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn expiry_threshold(&self) -> Duration {
        Duration::from_secs(self.expiry_threshold_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Resolve the directory the IDE token file is written into.
    pub fn resolved_ide_token_dir(&self) -> PathBuf {
        match &self.ide_token_dir {
            Some(dir) => dir.clone(),
            None => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".aws")
                .join("sso")
                .join("cache"),
        }
    }
}

pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed("KEEPER_"))
        .extract()
        .expect("FATAL: invalid KEEPER_* configuration")
});
