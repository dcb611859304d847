// ABOUTME: SQLite storage for identities, login devices and registered OAuth 2.0 clients
// ABOUTME: Owns the connection pool and schema migrations; implements the storage plugin traits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Database Management
//!
//! SQLite-backed implementation of [`crate::database_plugins::IdentityStore`] and
//! [`crate::database_plugins::ClientRegistry`].

mod clients;
mod users;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::info;
use warden_core::errors::DatabaseError;

/// Database manager for identity and client storage
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Connect and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the connection fails, or a migration fails
    pub async fn new(database_url: &str) -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| DatabaseError::ConnectionFailed {
                reason: e.to_string(),
            })?
            .create_if_missing(true);

        // Every connection to `sqlite::memory:` opens a separate database
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await
        } else {
            SqlitePoolOptions::new().connect_with(options).await
        }
        .map_err(|e| DatabaseError::ConnectionFailed {
            reason: e.to_string(),
        })?;

        let db = Self { pool };
        db.migrate().await?;
        info!(url = %redact_url(database_url), "Database ready");
        Ok(db)
    }

    /// Get a reference to the database pool
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any table or index creation fails
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        let migrated: Result<(), sqlx::Error> = async {
            self.migrate_users().await?;
            self.migrate_clients().await
        }
        .await;

        migrated.map_err(|e| DatabaseError::MigrationFailed {
            reason: e.to_string(),
        })
    }
}

fn redact_url(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
