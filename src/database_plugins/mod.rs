// ABOUTME: Storage abstractions consumed by the authentication core
// ABOUTME: Identity store and client registry traits with atomic single-row operations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Storage Plugins
//!
//! The authentication core never talks to a database directly. It consumes the
//! [`IdentityStore`] and [`ClientRegistry`] traits; [`crate::database::Database`]
//! implements both on SQLite, and tests substitute their own implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use warden_core::errors::DatabaseError;
use warden_core::models::{Identity, LoginDevice, RegisteredClient};

/// Result type for storage operations
pub type StorageResult<T> = Result<T, DatabaseError>;

/// Identity lookups and the side effects of primary authentication
///
/// Every mutating method is a single atomic statement against one row.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Look up an identity by login email
    async fn find_by_email(&self, email: &str) -> StorageResult<Option<Identity>>;

    /// Look up an identity by its external identifier
    async fn find_by_uuid(&self, user_uuid: Uuid) -> StorageResult<Option<Identity>>;

    /// Atomically add one failed attempt and return the new count
    ///
    /// Concurrent calls for the same identity must each be counted.
    async fn increment_failed_attempts(&self, email: &str) -> StorageResult<i64>;

    /// Reset the failed-attempt counter to zero
    async fn reset_failed_attempts(&self, user_uuid: Uuid) -> StorageResult<()>;

    /// Record the time of a successful login
    async fn record_login(&self, user_uuid: Uuid, at: DateTime<Utc>) -> StorageResult<()>;

    /// Record the device a successful login came from
    async fn add_login_device(&self, user_uuid: Uuid, device: &LoginDevice) -> StorageResult<()>;
}

/// Read-only access to registered OAuth 2.0 clients
#[async_trait]
pub trait ClientRegistry: Send + Sync {
    /// Look up a client by its `client_id`
    async fn find_by_client_id(&self, client_id: &str) -> StorageResult<Option<RegisteredClient>>;
}
