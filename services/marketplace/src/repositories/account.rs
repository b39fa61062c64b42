//! Account repository

use std::future::Future;

use anyhow::{Result, anyhow};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use super::unique_violation;
use crate::models::{Account, NewAccount, Role, RoleProfile, VendorField};

pub trait AccountRepository: Send + Sync {
    fn create(&self, new_account: NewAccount) -> impl Future<Output = Result<Account>> + Send;

    fn find_by_id(&self, id: Uuid) -> impl Future<Output = Result<Option<Account>>> + Send;

    fn find_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<Account>>> + Send;

    /// The account `id`, provided it still holds `token` among its session tokens
    fn find_by_session(
        &self,
        id: Uuid,
        token: &str,
    ) -> impl Future<Output = Result<Option<Account>>> + Send;

    fn username_taken(&self, username: &str) -> impl Future<Output = Result<bool>> + Send;

    fn vendor_field_taken(
        &self,
        field: VendorField,
        value: &str,
    ) -> impl Future<Output = Result<bool>> + Send;

    fn list_vendors(&self) -> impl Future<Output = Result<Vec<Account>>> + Send;

    fn add_session_token(&self, id: Uuid, token: &str) -> impl Future<Output = Result<()>> + Send;

    /// Returns whether the token was present
    fn remove_session_token(
        &self,
        id: Uuid,
        token: &str,
    ) -> impl Future<Output = Result<bool>> + Send;

    fn set_profile_image(
        &self,
        id: Uuid,
        image: &str,
    ) -> impl Future<Output = Result<Option<Account>>> + Send;
}

const ACCOUNT_COLUMNS: &str = "id, username, password_hash, profile_image, role, display_name, address, hub, created_at, updated_at";

fn account_from_row(row: &PgRow) -> Result<Account> {
    let id: Uuid = row.try_get("id")?;
    let role: Role = row.try_get::<String, _>("role")?.parse()?;
    let display_name: Option<String> = row.try_get("display_name")?;
    let address: Option<String> = row.try_get("address")?;
    let hub: Option<String> = row.try_get("hub")?;

    let profile = match role {
        Role::Vendor => RoleProfile::Vendor {
            name: display_name.unwrap_or_default(),
            address: address.unwrap_or_default(),
        },
        Role::Customer => RoleProfile::Customer {
            name: display_name.unwrap_or_default(),
            address: address.unwrap_or_default(),
        },
        Role::Shipper => RoleProfile::Shipper {
            hub: hub
                .ok_or_else(|| anyhow!("shipper account {id} has no hub"))?
                .parse()?,
        },
    };

    Ok(Account {
        id,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        profile_image: row.try_get("profile_image")?,
        profile,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Columns (display_name, address, hub) a profile is stored in
fn profile_columns(profile: &RoleProfile) -> (Option<&str>, Option<&str>, Option<&'static str>) {
    match profile {
        RoleProfile::Vendor { name, address } | RoleProfile::Customer { name, address } => {
            (Some(name), Some(address), None)
        }
        RoleProfile::Shipper { hub } => (None, None, Some(hub.as_str())),
    }
}

/// Account repository backed by PostgreSQL
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl AccountRepository for PgAccountRepository {
    async fn create(&self, new_account: NewAccount) -> Result<Account> {
        info!("Creating new account: {}", new_account.username);

        let (display_name, address, hub) = profile_columns(&new_account.profile);
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO accounts (id, username, password_hash, profile_image, role, display_name, address, hub)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new_account.username)
        .bind(&new_account.password_hash)
        .bind(&new_account.profile_image)
        .bind(new_account.profile.role().as_str())
        .bind(display_name)
        .bind(address)
        .bind(hub)
        .fetch_one(&self.pool)
        .await
        .map_err(unique_violation)?;

        account_from_row(&row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn find_by_session(&self, id: Uuid, token: &str) -> Result<Option<Account>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {ACCOUNT_COLUMNS} FROM accounts
            WHERE id = $1
              AND EXISTS (SELECT 1 FROM session_tokens WHERE account_id = $1 AND token = $2)
            "#
        ))
        .bind(id)
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn username_taken(&self, username: &str) -> Result<bool> {
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM accounts WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(taken)
    }

    async fn vendor_field_taken(&self, field: VendorField, value: &str) -> Result<bool> {
        let query = match field {
            VendorField::Name => {
                "SELECT EXISTS (SELECT 1 FROM accounts WHERE role = 'vendor' AND display_name = $1)"
            }
            VendorField::Address => {
                "SELECT EXISTS (SELECT 1 FROM accounts WHERE role = 'vendor' AND address = $1)"
            }
        };
        let taken: bool = sqlx::query_scalar(query)
            .bind(value.trim())
            .fetch_one(&self.pool)
            .await?;
        Ok(taken)
    }

    async fn list_vendors(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE role = 'vendor' ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(account_from_row).collect()
    }

    async fn add_session_token(&self, id: Uuid, token: &str) -> Result<()> {
        sqlx::query("INSERT INTO session_tokens (account_id, token) VALUES ($1, $2)")
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn remove_session_token(&self, id: Uuid, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM session_tokens WHERE account_id = $1 AND token = $2")
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_profile_image(&self, id: Uuid, image: &str) -> Result<Option<Account>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE accounts SET profile_image = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(image)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(account_from_row).transpose()
    }
}
