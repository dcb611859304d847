// ABOUTME: Identity persistence: lookups, atomic failed-attempt counting and login bookkeeping
// ABOUTME: Implements IdentityStore for the SQLite database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;
use warden_core::errors::DatabaseError;
use warden_core::models::{Identity, LoginDevice};

use super::Database;
use crate::database_plugins::{IdentityStore, StorageResult};

const IDENTITY_COLUMNS: &str = r"
    id, user_uuid, email, password_hash, role, authorities, mfa, qr_code_secret,
    login_attempts, account_non_locked, enabled, account_non_expired, last_login
";

impl Database {
    /// Create users and devices tables
    pub(super) async fn migrate_users(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_uuid TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'ROLE_USER',
                authorities TEXT NOT NULL DEFAULT '',
                mfa INTEGER NOT NULL DEFAULT 0,
                qr_code_secret TEXT,
                login_attempts INTEGER NOT NULL DEFAULT 0,
                account_non_locked INTEGER NOT NULL DEFAULT 1,
                enabled INTEGER NOT NULL DEFAULT 1,
                account_non_expired INTEGER NOT NULL DEFAULT 1,
                last_login TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS devices (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                device TEXT NOT NULL,
                client TEXT NOT NULL,
                ip_address TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_devices_user_id ON devices(user_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert an identity and return its row id
    ///
    /// Account registration lives outside this service; this is used for seeding.
    ///
    /// # Errors
    ///
    /// Returns an error if the email or uuid is already taken
    pub async fn insert_identity(&self, identity: &Identity) -> StorageResult<i64> {
        let row = sqlx::query(
            r"
            INSERT INTO users (
                user_uuid, email, password_hash, role, authorities, mfa, qr_code_secret,
                login_attempts, account_non_locked, enabled, account_non_expired, last_login
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            ",
        )
        .bind(identity.user_uuid.to_string())
        .bind(&identity.email)
        .bind(&identity.password_hash)
        .bind(&identity.role)
        .bind(&identity.authorities)
        .bind(identity.mfa_enabled)
        .bind(&identity.totp_secret)
        .bind(identity.login_attempts)
        .bind(!identity.account_locked)
        .bind(!identity.disabled)
        .bind(!identity.expired)
        .bind(identity.last_login)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::query("insert identity", e))?;

        Ok(row.get("id"))
    }

    /// Login devices recorded for an identity, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_login_devices(&self, user_uuid: Uuid) -> StorageResult<Vec<LoginDevice>> {
        let rows = sqlx::query(
            r"
            SELECT d.device, d.client, d.ip_address
            FROM devices d JOIN users u ON u.id = d.user_id
            WHERE u.user_uuid = $1
            ORDER BY d.id
            ",
        )
        .bind(user_uuid.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::query("list login devices", e))?;

        rows.iter()
            .map(|row| -> StorageResult<LoginDevice> {
                Ok(LoginDevice {
                    device: row.try_get("device")?,
                    client: row.try_get("client")?,
                    ip_address: row.try_get("ip_address")?,
                })
            })
            .collect()
    }

    async fn find_identity_by(&self, column: &str, value: &str) -> StorageResult<Option<Identity>> {
        let query = format!("SELECT {IDENTITY_COLUMNS} FROM users WHERE {column} = $1");
        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::query("find identity", e))?;

        row.as_ref().map(row_to_identity).transpose()
    }
}

fn expect_updated(rows_affected: u64, user_uuid: Uuid) -> StorageResult<()> {
    if rows_affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "identity",
            entity_id: user_uuid.to_string(),
        });
    }
    Ok(())
}

fn row_to_identity(row: &SqliteRow) -> StorageResult<Identity> {
    let raw_uuid: String = row.try_get("user_uuid")?;
    let user_uuid = Uuid::parse_str(&raw_uuid)
        .map_err(|e| DatabaseError::invalid_data("user_uuid", e.to_string()))?;

    Ok(Identity {
        id: row.try_get("id")?,
        user_uuid,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: row.try_get("role")?,
        authorities: row.try_get("authorities")?,
        mfa_enabled: row.try_get("mfa")?,
        totp_secret: row.try_get("qr_code_secret")?,
        login_attempts: row.try_get("login_attempts")?,
        account_locked: !row.try_get::<bool, _>("account_non_locked")?,
        disabled: !row.try_get::<bool, _>("enabled")?,
        expired: !row.try_get::<bool, _>("account_non_expired")?,
        last_login: row.try_get::<Option<DateTime<Utc>>, _>("last_login")?,
    })
}

#[async_trait]
impl IdentityStore for Database {
    async fn find_by_email(&self, email: &str) -> StorageResult<Option<Identity>> {
        self.find_identity_by("email", email).await
    }

    async fn find_by_uuid(&self, user_uuid: Uuid) -> StorageResult<Option<Identity>> {
        self.find_identity_by("user_uuid", &user_uuid.to_string()).await
    }

    async fn increment_failed_attempts(&self, email: &str) -> StorageResult<i64> {
        let row = sqlx::query(
            r"
            UPDATE users SET login_attempts = login_attempts + 1
            WHERE email = $1
            RETURNING login_attempts
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::query("increment failed attempts", e))?;

        row.map_or_else(
            || {
                Err(DatabaseError::NotFound {
                    entity_type: "identity",
                    entity_id: email.to_owned(),
                })
            },
            |row| Ok(row.get("login_attempts")),
        )
    }

    async fn reset_failed_attempts(&self, user_uuid: Uuid) -> StorageResult<()> {
        let result = sqlx::query("UPDATE users SET login_attempts = 0 WHERE user_uuid = $1")
            .bind(user_uuid.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::query("reset failed attempts", e))?;

        expect_updated(result.rows_affected(), user_uuid)
    }

    async fn record_login(&self, user_uuid: Uuid, at: DateTime<Utc>) -> StorageResult<()> {
        let result = sqlx::query("UPDATE users SET last_login = $1 WHERE user_uuid = $2")
            .bind(at)
            .bind(user_uuid.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::query("record login", e))?;

        expect_updated(result.rows_affected(), user_uuid)
    }

    async fn add_login_device(&self, user_uuid: Uuid, device: &LoginDevice) -> StorageResult<()> {
        let result = sqlx::query(
            r"
            INSERT INTO devices (user_id, device, client, ip_address)
            SELECT id, $2, $3, $4 FROM users WHERE user_uuid = $1
            ",
        )
        .bind(user_uuid.to_string())
        .bind(&device.device)
        .bind(&device.client)
        .bind(&device.ip_address)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::query("add login device", e))?;

        expect_updated(result.rows_affected(), user_uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(email: &str) -> Identity {
        Identity {
            id: 0,
            user_uuid: Uuid::new_v4(),
            email: email.to_owned(),
            password_hash: "$2b$04$placeholder".to_owned(),
            role: "ROLE_USER".to_owned(),
            authorities: "user:read".to_owned(),
            mfa_enabled: false,
            totp_secret: None,
            login_attempts: 0,
            account_locked: false,
            disabled: false,
            expired: false,
            last_login: None,
        }
    }

    #[tokio::test]
    async fn test_round_trip_and_status_flags() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let mut user = identity("grace@example.com");
        user.disabled = true;
        user.totp_secret = Some("JBSWY3DPEHPK3PXP".to_owned());
        db.insert_identity(&user).await.unwrap();

        let by_email = db.find_by_email("grace@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.user_uuid, user.user_uuid);
        assert!(by_email.disabled);
        assert!(!by_email.account_locked);
        assert_eq!(by_email.totp_secret.as_deref(), Some("JBSWY3DPEHPK3PXP"));

        let by_uuid = db.find_by_uuid(user.user_uuid).await.unwrap().unwrap();
        assert_eq!(by_uuid.email, "grace@example.com");
        assert!(db.find_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_attempt_counter_and_login_bookkeeping() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let user = identity("linus@example.com");
        db.insert_identity(&user).await.unwrap();

        assert_eq!(db.increment_failed_attempts(&user.email).await.unwrap(), 1);
        assert_eq!(db.increment_failed_attempts(&user.email).await.unwrap(), 2);
        db.reset_failed_attempts(user.user_uuid).await.unwrap();

        let now = Utc::now();
        db.record_login(user.user_uuid, now).await.unwrap();
        db.add_login_device(
            user.user_uuid,
            &LoginDevice {
                device: "Linux".to_owned(),
                client: "Firefox - 128.0".to_owned(),
                ip_address: "10.0.0.7".to_owned(),
            },
        )
        .await
        .unwrap();

        let stored = db.find_by_uuid(user.user_uuid).await.unwrap().unwrap();
        assert_eq!(stored.login_attempts, 0);
        assert_eq!(
            stored.last_login.map(|t| t.timestamp()),
            Some(now.timestamp())
        );
        let devices = db.list_login_devices(user.user_uuid).await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].ip_address, "10.0.0.7");
    }

    #[tokio::test]
    async fn test_increment_unknown_email_is_not_found() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let err = db
            .increment_failed_attempts("ghost@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
