// ABOUTME: Registered OAuth 2.0 client model with authentication methods, grant types and TTLs
// ABOUTME: Read-only to the authentication core; owned by client registration storage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Client authentication methods (RFC 7591 `token_endpoint_auth_method` values)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthenticationMethod {
    /// Public client, identified by `client_id` only
    None,
    /// HTTP Basic with client secret
    ClientSecretBasic,
    /// Client secret in the request body
    ClientSecretPost,
    /// HMAC-signed client assertion
    ClientSecretJwt,
    /// Private-key-signed client assertion
    PrivateKeyJwt,
}

impl ClientAuthenticationMethod {
    /// Wire value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ClientSecretBasic => "client_secret_basic",
            Self::ClientSecretPost => "client_secret_post",
            Self::ClientSecretJwt => "client_secret_jwt",
            Self::PrivateKeyJwt => "private_key_jwt",
        }
    }
}

impl fmt::Display for ClientAuthenticationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientAuthenticationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "client_secret_basic" => Ok(Self::ClientSecretBasic),
            "client_secret_post" => Ok(Self::ClientSecretPost),
            "client_secret_jwt" => Ok(Self::ClientSecretJwt),
            "private_key_jwt" => Ok(Self::PrivateKeyJwt),
            other => Err(format!("unknown client authentication method: {other}")),
        }
    }
}

/// OAuth 2.0 grant types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationGrantType {
    /// Authorization code grant
    AuthorizationCode,
    /// Refresh token grant
    RefreshToken,
    /// Client credentials grant
    ClientCredentials,
}

impl AuthorizationGrantType {
    /// Wire value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::RefreshToken => "refresh_token",
            Self::ClientCredentials => "client_credentials",
        }
    }
}

impl fmt::Display for AuthorizationGrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthorizationGrantType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "authorization_code" => Ok(Self::AuthorizationCode),
            "refresh_token" => Ok(Self::RefreshToken),
            "client_credentials" => Ok(Self::ClientCredentials),
            other => Err(format!("unknown grant type: {other}")),
        }
    }
}

/// Token lifetimes configured for a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSettings {
    /// Access-token lifetime; also used for refresh tokens
    pub access_token_ttl: Duration,
    /// Configured refresh-token lifetime (stored, not used for minting)
    pub refresh_token_ttl: Duration,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            access_token_ttl: Duration::minutes(5),
            refresh_token_ttl: Duration::minutes(60),
        }
    }
}

/// OAuth 2.0 client as registered with the authorization server
#[derive(Debug, Clone)]
pub struct RegisteredClient {
    /// Internal registration id
    pub id: String,
    /// OAuth 2.0 client identifier
    pub client_id: String,
    /// Human-readable client name
    pub client_name: Option<String>,
    /// Authentication methods the client may use
    pub authentication_methods: Vec<ClientAuthenticationMethod>,
    /// Grant types the client may use
    pub grant_types: Vec<AuthorizationGrantType>,
    /// Registered redirect URIs
    pub redirect_uris: Vec<String>,
    /// Allowed scopes
    pub scopes: Vec<String>,
    /// Token lifetimes
    pub token_settings: TokenSettings,
}

impl RegisteredClient {
    /// Whether the client is registered for the given authentication method
    #[must_use]
    pub fn supports_method(&self, method: ClientAuthenticationMethod) -> bool {
        self.authentication_methods.contains(&method)
    }

    /// Whether the client is registered for the given grant type
    #[must_use]
    pub fn supports_grant(&self, grant: AuthorizationGrantType) -> bool {
        self.grant_types.contains(&grant)
    }
}
