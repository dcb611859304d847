// ABOUTME: Registered OAuth 2.0 client persistence
// ABOUTME: Implements ClientRegistry for the SQLite database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Duration;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use warden_core::errors::DatabaseError;
use warden_core::models::{
    AuthorizationGrantType, ClientAuthenticationMethod, RegisteredClient, TokenSettings,
};

use super::Database;
use crate::database_plugins::{ClientRegistry, StorageResult};

impl Database {
    /// Create the registered clients table
    pub(super) async fn migrate_clients(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS registered_clients (
                id TEXT PRIMARY KEY,
                client_id TEXT UNIQUE NOT NULL,
                client_name TEXT,
                client_authentication_methods TEXT NOT NULL,
                authorization_grant_types TEXT NOT NULL,
                redirect_uris TEXT NOT NULL DEFAULT '',
                scopes TEXT NOT NULL DEFAULT '',
                access_token_ttl_secs INTEGER NOT NULL,
                refresh_token_ttl_secs INTEGER NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Register a client, replacing any existing registration with the same id
    ///
    /// Client registration is owned elsewhere; this is used for seeding.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn register_client(&self, client: &RegisteredClient) -> StorageResult<()> {
        let methods: Vec<&str> = client
            .authentication_methods
            .iter()
            .map(|m| m.as_str())
            .collect();
        let grants: Vec<&str> = client.grant_types.iter().map(|g| g.as_str()).collect();

        sqlx::query(
            r"
            INSERT OR REPLACE INTO registered_clients (
                id, client_id, client_name, client_authentication_methods,
                authorization_grant_types, redirect_uris, scopes,
                access_token_ttl_secs, refresh_token_ttl_secs
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(&client.id)
        .bind(&client.client_id)
        .bind(&client.client_name)
        .bind(methods.join(","))
        .bind(grants.join(","))
        .bind(client.redirect_uris.join(","))
        .bind(client.scopes.join(","))
        .bind(client.token_settings.access_token_ttl.num_seconds())
        .bind(client.token_settings.refresh_token_ttl.num_seconds())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::query("register client", e))?;

        Ok(())
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_list<T: FromStr<Err = String>>(field: &'static str, raw: &str) -> StorageResult<Vec<T>> {
    split_list(raw)
        .map(|item| T::from_str(item).map_err(|reason| DatabaseError::invalid_data(field, reason)))
        .collect()
}

fn row_to_client(row: &SqliteRow) -> StorageResult<RegisteredClient> {
    let methods: String = row.try_get("client_authentication_methods")?;
    let grants: String = row.try_get("authorization_grant_types")?;
    let redirect_uris: String = row.try_get("redirect_uris")?;
    let scopes: String = row.try_get("scopes")?;

    Ok(RegisteredClient {
        id: row.try_get("id")?,
        client_id: row.try_get("client_id")?,
        client_name: row.try_get("client_name")?,
        authentication_methods: parse_list::<ClientAuthenticationMethod>(
            "client_authentication_methods",
            &methods,
        )?,
        grant_types: parse_list::<AuthorizationGrantType>("authorization_grant_types", &grants)?,
        redirect_uris: split_list(&redirect_uris).map(str::to_owned).collect(),
        scopes: split_list(&scopes).map(str::to_owned).collect(),
        token_settings: TokenSettings {
            access_token_ttl: Duration::seconds(row.try_get("access_token_ttl_secs")?),
            refresh_token_ttl: Duration::seconds(row.try_get("refresh_token_ttl_secs")?),
        },
    })
}

#[async_trait]
impl ClientRegistry for Database {
    async fn find_by_client_id(&self, client_id: &str) -> StorageResult<Option<RegisteredClient>> {
        let row = sqlx::query(
            r"
            SELECT id, client_id, client_name, client_authentication_methods,
                   authorization_grant_types, redirect_uris, scopes,
                   access_token_ttl_secs, refresh_token_ttl_secs
            FROM registered_clients WHERE client_id = $1
            ",
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::query("find client", e))?;

        row.as_ref().map(row_to_client).transpose()
    }
}
