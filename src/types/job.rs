use crate::error::KeeperError;
use crate::types::account::{Account, Provider};

/// Per-account result of one renewal attempt. Ephemeral: consumed by progress
/// reporting, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub account_id: String,
    pub email: String,
    pub succeeded: bool,
    pub message: String,
}

impl RefreshOutcome {
    pub fn success(account: &Account) -> Self {
        Self {
            account_id: account.id.clone(),
            email: account.email.clone(),
            succeeded: true,
            message: "token refreshed".to_string(),
        }
    }

    pub fn failure(account: &Account, error: &KeeperError) -> Self {
        Self {
            account_id: account.id.clone(),
            email: account.email.clone(),
            succeeded: false,
            message: truncate_chars(&error.to_string(), 30),
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Everything the backend needs to make one account active on the local IDE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchParams {
    pub access_token: String,
    pub refresh_token: String,
    pub provider: Provider,
    /// Rotate the machine identity as part of the switch. Mutually exclusive
    /// with having applied a bound identity beforehand.
    pub reset_machine_id: bool,
    // Social-only
    pub profile_arn: Option<String>,
    // IdC-only
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub region: Option<String>,
    pub client_id_hash: Option<String>,
    pub sso_session_id: Option<String>,
}

impl SwitchParams {
    /// Build switch parameters from a stored account. Fails when either token
    /// is absent; the orchestrator rejects such accounts before any backend
    /// call.
    pub fn from_account(account: &Account, reset_machine_id: bool) -> Result<Self, KeeperError> {
        if !account.has_auth_tokens() {
            return Err(KeeperError::MissingTokens);
        }
        let access_token = account.access_token.clone().ok_or(KeeperError::MissingTokens)?;
        let refresh_token = account.refresh_token.clone().ok_or(KeeperError::MissingTokens)?;

        let mut params = Self {
            access_token,
            refresh_token,
            provider: account.provider,
            reset_machine_id,
            profile_arn: None,
            client_id: None,
            client_secret: None,
            region: None,
            client_id_hash: None,
            sso_session_id: None,
        };
        if account.provider.is_idc() {
            params.client_id = account.client_id.clone();
            params.client_secret = account.client_secret.clone();
            params.region = account.region.clone();
            params.client_id_hash = account.client_id_hash.clone();
            params.sso_session_id = account.sso_session_id.clone();
        } else {
            params.profile_arn = account.profile_arn.clone();
        }
        Ok(params)
    }
}
