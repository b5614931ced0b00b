use crate::error::KeeperError;
use crate::kiro_auth::endpoints::DEFAULT_PROFILE_ARN;
use crate::types::job::SwitchParams;
use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use serde_json::json;
use std::path::Path;
use tracing::debug;

const TOKEN_FILE_NAME: &str = "kiro-auth-token.json";
const REGISTRATION_EXPIRY_DAYS: i64 = 90;

/// Write the auth-token file the IDE reads on startup, making the account
/// described by `params` the active one. For IdC accounts a companion client
/// registration file is written alongside it so the IDE can renew on its own.
///
/// Both writes go through a temp file and rename so the IDE never observes a
/// half-written token.
pub fn write_ide_token(dir: &Path, params: &SwitchParams) -> Result<(), KeeperError> {
    std::fs::create_dir_all(dir)?;

    let expires_at = (Utc::now() + ChronoDuration::hours(1))
        .to_rfc3339_opts(SecondsFormat::Millis, true);

    let token = if params.provider.is_idc() {
        json!({
            "accessToken": params.access_token,
            "refreshToken": params.refresh_token,
            "expiresAt": expires_at,
            "authMethod": params.provider.auth_method(),
            "provider": params.provider.as_str(),
            "clientIdHash": params.client_id_hash,
            "region": params.region.as_deref().unwrap_or("us-east-1"),
            "ssoSessionId": params.sso_session_id,
        })
    } else {
        json!({
            "accessToken": params.access_token,
            "refreshToken": params.refresh_token,
            "expiresAt": expires_at,
            "authMethod": params.provider.auth_method(),
            "provider": params.provider.as_str(),
            "profileArn": params.profile_arn.as_deref().unwrap_or(DEFAULT_PROFILE_ARN),
        })
    };
    write_atomic(&dir.join(TOKEN_FILE_NAME), &token)?;

    if params.provider.is_idc()
        && let (Some(hash), Some(client_id), Some(client_secret)) = (
            &params.client_id_hash,
            &params.client_id,
            &params.client_secret,
        )
    {
        let registration_expiry = (Utc::now() + ChronoDuration::days(REGISTRATION_EXPIRY_DAYS))
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        let registration = json!({
            "clientId": client_id,
            "clientSecret": client_secret,
            "expiresAt": registration_expiry,
        });
        write_atomic(&dir.join(format!("{hash}.json")), &registration)?;
        debug!(hash = %hash, "wrote IdC client registration");
    }

    Ok(())
}

fn write_atomic(path: &Path, value: &serde_json::Value) -> Result<(), KeeperError> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
