// ABOUTME: Identity record verified during primary authentication and its granted authorities
// ABOUTME: Secrets are redacted from Debug output and the type is never serialized
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{authorities::SEPARATOR, credentials::MAX_LOGIN_ATTEMPTS};

/// A single authority string (role or permission) granted to a principal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrantedAuthority(String);

impl GrantedAuthority {
    /// Wrap an authority name
    pub fn new(authority: impl Into<String>) -> Self {
        Self(authority.into())
    }

    /// Authority name
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GrantedAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GrantedAuthority {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Comma-join authorities in order, the format of the `authorities` token claim
#[must_use]
pub fn join_authorities(authorities: &[GrantedAuthority]) -> String {
    authorities
        .iter()
        .map(GrantedAuthority::as_str)
        .collect::<Vec<_>>()
        .join(&SEPARATOR.to_string())
}

/// Split a comma-separated authority list, dropping blanks
#[must_use]
pub fn parse_authorities(raw: &str) -> Vec<GrantedAuthority> {
    raw.split(SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(GrantedAuthority::new)
        .collect()
}

/// User identity as held by the identity store
#[derive(Clone)]
pub struct Identity {
    /// Internal row id
    pub id: i64,
    /// Stable external identifier, used as the token subject
    pub user_uuid: Uuid,
    /// Login identifier
    pub email: String,
    /// bcrypt hash of the password
    pub password_hash: String,
    /// Primary role, e.g. `ROLE_USER`
    pub role: String,
    /// Comma-separated extra authorities
    pub authorities: String,
    /// Whether a TOTP second factor is required
    pub mfa_enabled: bool,
    /// Base32 TOTP shared secret
    pub totp_secret: Option<String>,
    /// Consecutive failed password attempts
    pub login_attempts: i64,
    /// Explicit administrative lock
    pub account_locked: bool,
    /// Account disabled
    pub disabled: bool,
    /// Account past its validity period
    pub expired: bool,
    /// Last successful primary authentication
    pub last_login: Option<DateTime<Utc>>,
}

impl Identity {
    /// Locked either explicitly or by reaching the failed-attempt threshold
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.account_locked || self.login_attempts >= MAX_LOGIN_ATTEMPTS
    }

    /// Role followed by the extra authorities
    #[must_use]
    pub fn granted_authorities(&self) -> Vec<GrantedAuthority> {
        let mut granted = parse_authorities(&self.role);
        granted.extend(parse_authorities(&self.authorities));
        granted
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("user_uuid", &self.user_uuid)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("role", &self.role)
            .field("mfa_enabled", &self.mfa_enabled)
            .field("totp_secret", &self.totp_secret.as_ref().map(|_| "[REDACTED]"))
            .field("login_attempts", &self.login_attempts)
            .field("account_locked", &self.account_locked)
            .field("disabled", &self.disabled)
            .field("expired", &self.expired)
            .finish_non_exhaustive()
    }
}

/// Device a successful login came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginDevice {
    /// Device description, e.g. `Mac OS X - 10.15`
    pub device: String,
    /// Browser or client, e.g. `Chrome - 120.0`
    pub client: String,
    /// Originating address
    pub ip_address: String,
}

impl Default for LoginDevice {
    fn default() -> Self {
        Self {
            device: "Unknown device".to_owned(),
            client: "Unknown client".to_owned(),
            ip_address: "Unknown IP".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            id: 1,
            user_uuid: Uuid::new_v4(),
            email: "ada@example.com".to_owned(),
            password_hash: "$2b$04$hash".to_owned(),
            role: "ROLE_USER".to_owned(),
            authorities: "user:read, user:update,".to_owned(),
            mfa_enabled: true,
            totp_secret: Some("JBSWY3DPEHPK3PXP".to_owned()),
            login_attempts: 0,
            account_locked: false,
            disabled: false,
            expired: false,
            last_login: None,
        }
    }

    #[test]
    fn test_granted_authorities_role_first() {
        let granted = identity().granted_authorities();
        assert_eq!(join_authorities(&granted), "ROLE_USER,user:read,user:update");
    }

    #[test]
    fn test_lock_threshold() {
        let mut user = identity();
        user.login_attempts = MAX_LOGIN_ATTEMPTS - 1;
        assert!(!user.is_locked());
        user.login_attempts = MAX_LOGIN_ATTEMPTS;
        assert!(user.is_locked());
        user.login_attempts = 0;
        user.account_locked = true;
        assert!(user.is_locked());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", identity());
        assert!(!rendered.contains("$2b$04$hash"));
        assert!(!rendered.contains("JBSWY3DPEHPK3PXP"));
        assert!(rendered.contains("ada@example.com"));
    }
}
