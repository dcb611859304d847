// ABOUTME: Token types minted by the issuer: signed access tokens and opaque refresh tokens
// ABOUTME: Immutable once created; token values are redacted from Debug output
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of token requested from the issuer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Signed JWT access token
    AccessToken,
    /// Opaque refresh token
    RefreshToken,
    /// OpenID Connect ID token (not minted by this core)
    IdToken,
}

/// RS256-signed access token
#[derive(Clone)]
pub struct SignedAccessToken {
    /// Compact JWS serialization
    pub token_value: String,
    /// `sub` claim
    pub subject: String,
    /// `iat` claim
    pub issued_at: DateTime<Utc>,
    /// `exp` claim
    pub expires_at: DateTime<Utc>,
    /// `authorities` claim, comma-joined
    pub authorities: String,
    /// Space-separated scopes
    pub scopes: Vec<String>,
    /// Key id placed in the JOSE header
    pub key_id: String,
}

impl fmt::Debug for SignedAccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedAccessToken")
            .field("subject", &self.subject)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .field("authorities", &self.authorities)
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

/// Opaque refresh token
#[derive(Clone)]
pub struct RefreshToken {
    /// URL-safe unpadded random value
    pub token_value: String,
    /// Creation time
    pub issued_at: DateTime<Utc>,
    /// Expiry time
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshToken")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Output of a single issuer call
#[derive(Debug, Clone)]
pub enum GeneratedToken {
    /// Signed access token
    Access(SignedAccessToken),
    /// Opaque refresh token
    Refresh(RefreshToken),
}

impl GeneratedToken {
    /// Token value as sent to the client
    #[must_use]
    pub fn token_value(&self) -> &str {
        match self {
            Self::Access(token) => &token.token_value,
            Self::Refresh(token) => &token.token_value,
        }
    }

    /// Creation time
    #[must_use]
    pub const fn issued_at(&self) -> DateTime<Utc> {
        match self {
            Self::Access(token) => token.issued_at,
            Self::Refresh(token) => token.issued_at,
        }
    }

    /// Expiry time
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        match self {
            Self::Access(token) => token.expires_at,
            Self::Refresh(token) => token.expires_at,
        }
    }

    /// Which kind of token this is
    #[must_use]
    pub const fn token_type(&self) -> TokenType {
        match self {
            Self::Access(_) => TokenType::AccessToken,
            Self::Refresh(_) => TokenType::RefreshToken,
        }
    }
}
