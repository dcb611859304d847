// ABOUTME: Session persistence of authentication progress across HTTP round trips
// ABOUTME: Defines the SessionStore contract and opaque random session identifiers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Session State
//!
//! A [`SessionStore`] keeps one [`AuthenticationState`] per session id. A save is
//! visible to the very next load for the same id, and saving overwrites the
//! previous state wholesale. Missing or expired sessions load as
//! [`AuthenticationState::Unauthenticated`].

mod memory;

use std::fmt;

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, RngCore};
use warden_core::constants::session::ID_BYTES;

pub use memory::InMemorySessionStore;

use crate::auth::state::AuthenticationState;
use crate::database_plugins::StorageResult;

/// Opaque session identifier
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Fresh identifier with 256 bits of entropy
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; ID_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Wrap an identifier presented by a client
    pub fn from_client(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Identifier as sent to the client
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(6).collect();
        write!(f, "SessionId({prefix}…)")
    }
}

/// Storage of authentication state keyed by session id
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Replace the state stored for `id`
    async fn save(&self, id: &SessionId, state: AuthenticationState) -> StorageResult<()>;

    /// State stored for `id`, or `Unauthenticated` when absent or expired
    async fn load(&self, id: &SessionId) -> StorageResult<AuthenticationState>;

    /// Discard the state stored for `id`
    async fn remove(&self, id: &SessionId) -> StorageResult<()>;
}
