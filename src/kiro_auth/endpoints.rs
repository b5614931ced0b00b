use crate::config::CONFIG;
use crate::error::{IsRetryable, KeeperError};
use crate::types::account::Account;
use crate::types::usage::UsageData;
use backon::{ExponentialBuilder, Retryable};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::warn;

/// Profile ARN used when an account never captured its own.
pub const DEFAULT_PROFILE_ARN: &str =
    "arn:aws:codewhisperer:us-east-1:699475941385:profile/EHGA3GRVQMUK";

fn default_retry_policy() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(1))
        .with_max_delay(Duration::from_secs(3))
        .with_max_times(3)
        .with_jitter()
}

/// Renewed token material, normalized across both provider families.
#[derive(Debug, Clone)]
pub struct RenewedToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    pub profile_arn: Option<String>,
    pub sso_session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SocialRefreshResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    profile_arn: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdcRefreshResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    // odd spelling is the provider's, not ours
    #[serde(rename = "aws_sso_app_session_id")]
    aws_sso_app_session_id: Option<String>,
}

/// Renew one account's token pair, dispatching on its provider family.
/// Network-aware retries; token-only, never touches usage.
pub async fn renew(client: &reqwest::Client, account: &Account) -> Result<RenewedToken, KeeperError> {
    let refresh_token = account
        .refresh_token
        .as_deref()
        .ok_or(KeeperError::MissingRefreshToken)?;

    let retry_policy = default_retry_policy();
    let attempt = || async {
        if account.provider.is_idc() {
            renew_idc(client, account, refresh_token).await
        } else {
            renew_social(client, refresh_token).await
        }
    };
    attempt
        .retry(retry_policy)
        .when(|e: &KeeperError| e.is_retryable())
        .notify(|err, dur: Duration| {
            warn!(error = %err, "token renewal retrying after error, sleeping {:?}", dur);
        })
        .await
}

/// Social accounts (Google/Github) renew through the desktop auth API.
async fn renew_social(
    client: &reqwest::Client,
    refresh_token: &str,
) -> Result<RenewedToken, KeeperError> {
    let url = format!("{}refreshToken", CONFIG.auth_api);
    let resp = client
        .post(&url)
        .json(&json!({ "refreshToken": refresh_token }))
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        let message = if status.as_u16() == 401 {
            "refresh token expired or invalid".to_string()
        } else {
            resp.text().await.unwrap_or_default()
        };
        return Err(KeeperError::RenewalRejected {
            status: status.as_u16(),
            message,
        });
    }

    let payload: SocialRefreshResponse = resp.json().await?;
    Ok(RenewedToken {
        access_token: payload.access_token,
        refresh_token: Some(payload.refresh_token),
        expires_in: payload.expires_in,
        profile_arn: payload.profile_arn,
        sso_session_id: None,
    })
}

/// IdC accounts (BuilderId/Enterprise) renew through the regional AWS OIDC
/// endpoint with their stored client registration.
async fn renew_idc(
    client: &reqwest::Client,
    account: &Account,
    refresh_token: &str,
) -> Result<RenewedToken, KeeperError> {
    let (Some(client_id), Some(client_secret)) = (&account.client_id, &account.client_secret)
    else {
        return Err(KeeperError::MissingClientRegistration);
    };
    let region = account.region.as_deref().unwrap_or("us-east-1");
    let url = format!("https://oidc.{region}.amazonaws.com/token");

    let resp = client
        .post(&url)
        .json(&json!({
            "clientId": client_id,
            "clientSecret": client_secret,
            "grantType": "refresh_token",
            "refreshToken": refresh_token,
        }))
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        let message = if status.as_u16() == 401 {
            "refresh token expired or invalid".to_string()
        } else {
            resp.text().await.unwrap_or_default()
        };
        return Err(KeeperError::RenewalRejected {
            status: status.as_u16(),
            message,
        });
    }

    let payload: IdcRefreshResponse = resp.json().await?;
    Ok(RenewedToken {
        access_token: payload.access_token,
        refresh_token: Some(payload.refresh_token),
        expires_in: payload.expires_in,
        profile_arn: None,
        sso_session_id: payload.aws_sso_app_session_id,
    })
}

/// Fetch the usage/quota snapshot for a freshly renewed access token.
/// A non-success response carrying a `reason` field means the account was
/// suspended by the provider.
pub async fn fetch_usage(
    client: &reqwest::Client,
    access_token: &str,
    profile_arn: Option<&str>,
) -> Result<UsageData, KeeperError> {
    let mut url = CONFIG
        .usage_api
        .join("getUsageLimits")
        .map_err(|e| KeeperError::Upstream {
            status: 0,
            message: e.to_string(),
        })?;
    url.query_pairs_mut()
        .append_pair("isEmailRequired", "true")
        .append_pair("origin", "AI_EDITOR")
        .append_pair("profileArn", profile_arn.unwrap_or(DEFAULT_PROFILE_ARN));

    let retry_policy = default_retry_policy();
    let attempt = || async {
        let resp = client
            .get(url.clone())
            .bearer_auth(access_token)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            if let Ok(body) = serde_json::from_str::<serde_json::Value>(&text)
                && let Some(reason) = body.get("reason").and_then(|r| r.as_str())
            {
                return Err(KeeperError::Banned(reason.to_string()));
            }
            return Err(KeeperError::Upstream {
                status: status.as_u16(),
                message: format!("getUsageLimits failed ({status})"),
            });
        }
        Ok(serde_json::from_str::<UsageData>(&text)?)
    };
    attempt
        .retry(retry_policy)
        .when(|e: &KeeperError| e.is_retryable())
        .notify(|err, dur: Duration| {
            warn!(error = %err, "usage lookup retrying after error, sleeping {:?}", dur);
        })
        .await
}
