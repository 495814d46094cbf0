//! SQLite credential store implementation

use async_trait::async_trait;
use social_relay_domain::{CredentialError, CredentialStore, IntegrationCredential, ProviderKind};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

const COLUMNS: &str = "id, org_id, provider, internal_id, name, picture, username, \
     access_token, refresh_token, expires_at, scopes, refresh_needed, disabled, updated_at";

/// SQLite-backed credential store
pub struct SqliteCredentialStore {
    pool: SqlitePool,
}

impl SqliteCredentialStore {
    /// Open (or create) the database file and run migrations
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, CredentialError> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CredentialError::Database(format!("Failed to create directory: {}", e))
            })?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(|e| CredentialError::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub async fn in_memory() -> Result<Self, CredentialError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| CredentialError::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), CredentialError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS integrations (
                id TEXT PRIMARY KEY,
                org_id TEXT NOT NULL,
                provider TEXT NOT NULL,
                internal_id TEXT NOT NULL,
                name TEXT NOT NULL,
                picture TEXT,
                username TEXT,
                access_token TEXT NOT NULL,
                refresh_token TEXT,
                expires_at TEXT,
                scopes TEXT NOT NULL DEFAULT '[]',
                refresh_needed INTEGER NOT NULL DEFAULT 0,
                disabled INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL,
                UNIQUE(org_id, provider, internal_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| CredentialError::Database(e.to_string()))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_integrations_org ON integrations(org_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| CredentialError::Database(e.to_string()))?;

        Ok(())
    }
}

fn format_time(value: OffsetDateTime) -> Result<String, CredentialError> {
    value
        .format(&Rfc3339)
        .map_err(|e| CredentialError::Serialization(e.to_string()))
}

fn parse_time(value: &str) -> Result<OffsetDateTime, CredentialError> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|e| CredentialError::Serialization(e.to_string()))
}

fn from_row(row: &SqliteRow) -> Result<IntegrationCredential, CredentialError> {
    let column = |e: sqlx::Error| CredentialError::Database(e.to_string());

    let id: String = row.try_get("id").map_err(column)?;
    let provider: String = row.try_get("provider").map_err(column)?;
    let expires_at: Option<String> = row.try_get("expires_at").map_err(column)?;
    let scopes: String = row.try_get("scopes").map_err(column)?;
    let updated_at: String = row.try_get("updated_at").map_err(column)?;

    Ok(IntegrationCredential {
        id: Uuid::parse_str(&id).map_err(|e| CredentialError::Serialization(e.to_string()))?,
        org_id: row.try_get("org_id").map_err(column)?,
        provider: provider
            .parse()
            .map_err(|e: social_relay_domain::ProviderError| {
                CredentialError::Serialization(e.to_string())
            })?,
        internal_id: row.try_get("internal_id").map_err(column)?,
        name: row.try_get("name").map_err(column)?,
        picture: row.try_get("picture").map_err(column)?,
        username: row.try_get("username").map_err(column)?,
        access_token: row.try_get("access_token").map_err(column)?,
        refresh_token: row.try_get("refresh_token").map_err(column)?,
        expires_at: expires_at.as_deref().map(parse_time).transpose()?,
        scopes: serde_json::from_str(&scopes)
            .map_err(|e| CredentialError::Serialization(e.to_string()))?,
        refresh_needed: row.try_get("refresh_needed").map_err(column)?,
        disabled: row.try_get("disabled").map_err(column)?,
        updated_at: parse_time(&updated_at)?,
    })
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn upsert(
        &self,
        credential: &IntegrationCredential,
    ) -> Result<IntegrationCredential, CredentialError> {
        let expires_at = credential.expires_at.map(format_time).transpose()?;
        let updated_at = format_time(credential.updated_at)?;
        let scopes = serde_json::to_string(&credential.scopes)
            .map_err(|e| CredentialError::Serialization(e.to_string()))?;

        sqlx::query(&format!(
            r#"
            INSERT INTO integrations ({COLUMNS})
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(org_id, provider, internal_id) DO UPDATE SET
                name = excluded.name,
                picture = excluded.picture,
                username = excluded.username,
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                expires_at = excluded.expires_at,
                scopes = excluded.scopes,
                refresh_needed = excluded.refresh_needed,
                disabled = excluded.disabled,
                updated_at = excluded.updated_at
            "#
        ))
        .bind(credential.id.to_string())
        .bind(&credential.org_id)
        .bind(credential.provider.identifier())
        .bind(&credential.internal_id)
        .bind(&credential.name)
        .bind(&credential.picture)
        .bind(&credential.username)
        .bind(&credential.access_token)
        .bind(&credential.refresh_token)
        .bind(&expires_at)
        .bind(&scopes)
        .bind(credential.refresh_needed)
        .bind(credential.disabled)
        .bind(&updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| CredentialError::Database(e.to_string()))?;

        self.get(
            &credential.org_id,
            credential.provider,
            &credential.internal_id,
        )
        .await?
        .ok_or_else(|| CredentialError::NotFound(credential.internal_id.clone()))
    }

    async fn get(
        &self,
        org_id: &str,
        provider: ProviderKind,
        internal_id: &str,
    ) -> Result<Option<IntegrationCredential>, CredentialError> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM integrations WHERE org_id = ? AND provider = ? AND internal_id = ?"
        ))
        .bind(org_id)
        .bind(provider.identifier())
        .bind(internal_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CredentialError::Database(e.to_string()))?;

        row.as_ref().map(from_row).transpose()
    }

    async fn list(&self, org_id: &str) -> Result<Vec<IntegrationCredential>, CredentialError> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM integrations WHERE org_id = ? ORDER BY provider, name"
        ))
        .bind(org_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CredentialError::Database(e.to_string()))?;

        rows.iter().map(from_row).collect()
    }

    async fn mark_refresh_needed(&self, id: Uuid) -> Result<(), CredentialError> {
        let result = sqlx::query("UPDATE integrations SET refresh_needed = 1 WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| CredentialError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(CredentialError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, CredentialError> {
        let result = sqlx::query("DELETE FROM integrations WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| CredentialError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
