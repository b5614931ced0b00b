use crate::db::models::DbAccount;
use crate::db::schema::SQLITE_INIT;
use crate::error::KeeperError;
use crate::types::account::{Account, AccountStatus};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

pub type SqlitePool = Pool<Sqlite>;

const ACCOUNT_COLUMNS: &str = "id, email, label, status, added_at, access_token, refresh_token, \
     expires_at, provider, client_id, client_secret, region, client_id_hash, \
     sso_session_id, profile_arn, usage_data";

#[derive(Clone)]
pub struct AccountsStorage {
    pool: SqlitePool,
}

impl AccountsStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), KeeperError> {
        // execute multiple statements safely (SQLite supports multi-commands but sqlx::query doesn't)
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<Account>, KeeperError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY added_at");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|row| Account::try_from(Self::row_to_model(row)?))
            .collect()
    }

    pub async fn get(&self, id: &str) -> Result<Account, KeeperError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| KeeperError::AccountNotFound(id.to_string()))?;
        Account::try_from(Self::row_to_model(row)?)
    }

    /// Insert or fully replace one account row.
    pub async fn upsert(&self, account: &Account) -> Result<(), KeeperError> {
        let row = DbAccount::try_from(account)?;
        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, email, label, status, added_at, access_token, refresh_token,
                expires_at, provider, client_id, client_secret, region,
                client_id_hash, sso_session_id, profile_arn, usage_data
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                email=excluded.email,
                label=excluded.label,
                status=excluded.status,
                added_at=excluded.added_at,
                access_token=excluded.access_token,
                refresh_token=excluded.refresh_token,
                expires_at=excluded.expires_at,
                provider=excluded.provider,
                client_id=excluded.client_id,
                client_secret=excluded.client_secret,
                region=excluded.region,
                client_id_hash=excluded.client_id_hash,
                sso_session_id=excluded.sso_session_id,
                profile_arn=excluded.profile_arn,
                usage_data=excluded.usage_data
            "#,
        )
        .bind(row.id)
        .bind(row.email)
        .bind(row.label)
        .bind(row.status)
        .bind(row.added_at)
        .bind(row.access_token)
        .bind(row.refresh_token)
        .bind(row.expires_at)
        .bind(row.provider)
        .bind(row.client_id)
        .bind(row.client_secret)
        .bind(row.region)
        .bind(row.client_id_hash)
        .bind(row.sso_session_id)
        .bind(row.profile_arn)
        .bind(row.usage_data)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_status(&self, id: &str, status: AccountStatus) -> Result<(), KeeperError> {
        sqlx::query("UPDATE accounts SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn bound_machine_id(&self, account_id: &str) -> Result<Option<String>, KeeperError> {
        let row = sqlx::query("SELECT machine_id FROM machine_bindings WHERE account_id = ?")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<String, _>("machine_id")))
    }

    /// First-use-wins: binding an already-bound account is a no-op.
    pub async fn bind_machine_id(
        &self,
        account_id: &str,
        machine_id: &str,
    ) -> Result<(), KeeperError> {
        sqlx::query(
            r#"INSERT INTO machine_bindings (account_id, machine_id) VALUES (?, ?)
               ON CONFLICT(account_id) DO NOTHING"#,
        )
        .bind(account_id)
        .bind(machine_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn row_to_model(row: SqliteRow) -> Result<DbAccount, KeeperError> {
        Ok(DbAccount {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            label: row.try_get("label")?,
            status: row.try_get("status")?,
            added_at: row.try_get("added_at")?,
            access_token: row.try_get("access_token")?,
            refresh_token: row.try_get("refresh_token")?,
            expires_at: row.try_get("expires_at")?,
            provider: row.try_get("provider")?,
            client_id: row.try_get("client_id")?,
            client_secret: row.try_get("client_secret")?,
            region: row.try_get("region")?,
            client_id_hash: row.try_get("client_id_hash")?,
            sso_session_id: row.try_get("sso_session_id")?,
            profile_arn: row.try_get("profile_arn")?,
            usage_data: row.try_get("usage_data")?,
        })
    }
}
