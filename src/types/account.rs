use crate::types::usage::UsageData;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity-issuing mechanism behind an account. Determines which secondary
/// parameters a renewal or switch requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Provider {
    #[default]
    Google,
    Github,
    BuilderId,
    Enterprise,
}

impl Provider {
    /// IdentityCenter-style providers renew through AWS OIDC and switch with
    /// a client registration instead of a profile ARN.
    pub fn is_idc(&self) -> bool {
        matches!(self, Provider::BuilderId | Provider::Enterprise)
    }

    pub fn auth_method(&self) -> &'static str {
        if self.is_idc() { "IdC" } else { "social" }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "Google",
            Provider::Github => "Github",
            Provider::BuilderId => "BuilderId",
            Provider::Enterprise => "Enterprise",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "Github" => Provider::Github,
            "BuilderId" => Provider::BuilderId,
            "Enterprise" => Provider::Enterprise,
            _ => Provider::Google,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AccountStatus {
    #[default]
    Normal,
    Banned,
    /// Manual refresh failed with an unauthorized/expired class error.
    TokenInvalid,
    /// Manual refresh failed for any other reason.
    RefreshFailed,
    Unknown,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Normal => "Normal",
            AccountStatus::Banned => "Banned",
            AccountStatus::TokenInvalid => "TokenInvalid",
            AccountStatus::RefreshFailed => "RefreshFailed",
            AccountStatus::Unknown => "Unknown",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "Normal" => AccountStatus::Normal,
            "Banned" => AccountStatus::Banned,
            "TokenInvalid" => AccountStatus::TokenInvalid,
            "RefreshFailed" => AccountStatus::RefreshFailed,
            _ => AccountStatus::Unknown,
        }
    }
}

/// One stored IDE credential: identity, token material, provider-specific
/// secrets and the last cached usage snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub status: AccountStatus,
    pub added_at: DateTime<Utc>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub provider: Provider,
    // IdC-only secrets
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub region: Option<String>,
    pub client_id_hash: Option<String>,
    pub sso_session_id: Option<String>,
    // Social-only
    pub profile_arn: Option<String>,
    pub usage_data: Option<UsageData>,
}

impl Account {
    pub fn new(email: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.into(),
            label: label.into(),
            status: AccountStatus::Normal,
            added_at: Utc::now(),
            access_token: None,
            refresh_token: None,
            expires_at: None,
            provider: Provider::default(),
            client_id: None,
            client_secret: None,
            region: None,
            client_id_hash: None,
            sso_session_id: None,
            profile_arn: None,
            usage_data: None,
        }
    }

    /// An account missing either token cannot be made active.
    pub fn has_auth_tokens(&self) -> bool {
        fn present(t: &Option<String>) -> bool {
            t.as_deref().is_some_and(|s| !s.is_empty())
        }
        present(&self.access_token) && present(&self.refresh_token)
    }
}
