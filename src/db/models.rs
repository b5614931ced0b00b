use crate::error::KeeperError;
use crate::types::account::{Account, AccountStatus, Provider};
use crate::types::usage::UsageData;
use chrono::{DateTime, Utc};

/// Row shape of the `accounts` table. Timestamps and the usage snapshot are
/// stored as TEXT (RFC 3339 / JSON) and decoded here, at the storage edge.
#[derive(Debug, Clone, PartialEq)]
pub struct DbAccount {
    pub id: String,
    pub email: String,
    pub label: String,
    pub status: String,
    pub added_at: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<String>,
    pub provider: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub region: Option<String>,
    pub client_id_hash: Option<String>,
    pub sso_session_id: Option<String>,
    pub profile_arn: Option<String>,
    pub usage_data: Option<String>,
}

fn decode_err(e: impl std::error::Error + Send + Sync + 'static) -> KeeperError {
    KeeperError::Database(sqlx::Error::Decode(Box::new(e)))
}

fn parse_utc(s: &str) -> Result<DateTime<Utc>, KeeperError> {
    Ok(DateTime::parse_from_rfc3339(s)
        .map_err(decode_err)?
        .with_timezone(&Utc))
}

impl TryFrom<DbAccount> for Account {
    type Error = KeeperError;

    fn try_from(row: DbAccount) -> Result<Self, Self::Error> {
        let added_at = parse_utc(&row.added_at)?;
        let expires_at = row.expires_at.as_deref().map(parse_utc).transpose()?;
        let usage_data: Option<UsageData> = row
            .usage_data
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(decode_err)?;

        Ok(Account {
            id: row.id,
            email: row.email,
            label: row.label,
            status: AccountStatus::parse(&row.status),
            added_at,
            access_token: row.access_token,
            refresh_token: row.refresh_token,
            expires_at,
            provider: Provider::parse(&row.provider),
            client_id: row.client_id,
            client_secret: row.client_secret,
            region: row.region,
            client_id_hash: row.client_id_hash,
            sso_session_id: row.sso_session_id,
            profile_arn: row.profile_arn,
            usage_data,
        })
    }
}

impl TryFrom<&Account> for DbAccount {
    type Error = KeeperError;

    fn try_from(account: &Account) -> Result<Self, Self::Error> {
        let usage_data = account
            .usage_data
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(decode_err)?;

        Ok(DbAccount {
            id: account.id.clone(),
            email: account.email.clone(),
            label: account.label.clone(),
            status: account.status.as_str().to_string(),
            added_at: account.added_at.to_rfc3339(),
            access_token: account.access_token.clone(),
            refresh_token: account.refresh_token.clone(),
            expires_at: account.expires_at.map(|t| t.to_rfc3339()),
            provider: account.provider.as_str().to_string(),
            client_id: account.client_id.clone(),
            client_secret: account.client_secret.clone(),
            region: account.region.clone(),
            client_id_hash: account.client_id_hash.clone(),
            sso_session_id: account.sso_session_id.clone(),
            profile_arn: account.profile_arn.clone(),
            usage_data,
        })
    }
}
