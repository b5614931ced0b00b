/// DDL executed at startup. Statements are idempotent.
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id             TEXT PRIMARY KEY,
    email          TEXT NOT NULL,
    label          TEXT NOT NULL DEFAULT '',
    status         TEXT NOT NULL DEFAULT 'Normal',
    added_at       TEXT NOT NULL,
    access_token   TEXT,
    refresh_token  TEXT,
    expires_at     TEXT,
    provider       TEXT NOT NULL DEFAULT 'Google',
    client_id      TEXT,
    client_secret  TEXT,
    region         TEXT,
    client_id_hash TEXT,
    sso_session_id TEXT,
    profile_arn    TEXT,
    usage_data     TEXT
);

CREATE TABLE IF NOT EXISTS machine_bindings (
    account_id TEXT PRIMARY KEY,
    machine_id TEXT NOT NULL
);
"#;
