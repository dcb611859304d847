// ABOUTME: Per-session authentication progress as a closed state machine
// ABOUTME: The pending second-factor state keeps no credentials and never exposes its real authorities
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use uuid::Uuid;
use warden_core::constants::authorities::{ANONYMOUS, MFA_REQUIRED};
use warden_core::models::{GrantedAuthority, Identity};

// ============================================================================
// Stage Markers
// ============================================================================

/// Coarse stage of a session, safe to log and serialize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticationStage {
    /// No credentials accepted yet
    Unauthenticated,
    /// Password accepted, second-factor decision not yet made
    PrimaryVerified,
    /// Waiting for a TOTP code
    MfaPending,
    /// Login complete
    FullyAuthenticated,
}

// ============================================================================
// Pending Second Factor
// ============================================================================

/// Session parked at the second-factor prompt
///
/// Only the subject, the email and the real authorities of the primary
/// identity are kept; credentials stay in the identity store. The real
/// authorities are reachable only through [`MfaPending::promote`], which
/// consumes the pending state.
#[derive(Clone)]
pub struct MfaPending {
    user_uuid: Uuid,
    email: String,
    granted: Vec<GrantedAuthority>,
    challenged_at: DateTime<Utc>,
}

impl MfaPending {
    pub(crate) fn new(primary: &Identity) -> Self {
        Self {
            user_uuid: primary.user_uuid,
            email: primary.email.clone(),
            granted: primary.granted_authorities(),
            challenged_at: Utc::now(),
        }
    }

    /// Email to show on the second-factor prompt
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// When the challenge was issued
    #[must_use]
    pub const fn challenged_at(&self) -> DateTime<Utc> {
        self.challenged_at
    }

    /// Authorities of the pending session: only enough to reach verification
    #[must_use]
    pub fn authorities(&self) -> Vec<GrantedAuthority> {
        vec![
            GrantedAuthority::new(ANONYMOUS),
            GrantedAuthority::new(MFA_REQUIRED),
        ]
    }

    pub(crate) const fn user_uuid(&self) -> Uuid {
        self.user_uuid
    }

    /// Finish the login with the primary identity's real authorities
    pub(crate) fn promote(self) -> AuthenticatedPrincipal {
        AuthenticatedPrincipal {
            user_uuid: self.user_uuid,
            email: self.email,
            authorities: self.granted,
            authenticated_at: Utc::now(),
        }
    }
}

impl fmt::Debug for MfaPending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MfaPending")
            .field("email", &self.email)
            .field("authorities", &self.authorities())
            .field("challenged_at", &self.challenged_at)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Authenticated Principal
// ============================================================================

/// Principal of a fully authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedPrincipal {
    /// Token subject
    pub user_uuid: Uuid,
    /// Login email
    pub email: String,
    /// Role followed by extra authorities
    pub authorities: Vec<GrantedAuthority>,
    /// When the login completed
    pub authenticated_at: DateTime<Utc>,
}

impl AuthenticatedPrincipal {
    pub(crate) fn from_identity(identity: &Identity) -> Self {
        Self {
            user_uuid: identity.user_uuid,
            email: identity.email.clone(),
            authorities: identity.granted_authorities(),
            authenticated_at: Utc::now(),
        }
    }
}

// ============================================================================
// Authentication State
// ============================================================================

/// Authentication progress of one login session
///
/// Transitions only move forward:
/// `Unauthenticated -> PrimaryVerified -> {MfaPending -> FullyAuthenticated | FullyAuthenticated}`.
/// Logout discards the state instead of stepping back.
#[derive(Clone, Default)]
pub enum AuthenticationState {
    /// No credentials accepted yet
    #[default]
    Unauthenticated,
    /// Password accepted, second-factor decision pending
    PrimaryVerified(Identity),
    /// Waiting for a TOTP code
    MfaPending(MfaPending),
    /// Login complete
    FullyAuthenticated(AuthenticatedPrincipal),
}

impl AuthenticationState {
    /// Coarse stage
    #[must_use]
    pub const fn stage(&self) -> AuthenticationStage {
        match self {
            Self::Unauthenticated => AuthenticationStage::Unauthenticated,
            Self::PrimaryVerified(_) => AuthenticationStage::PrimaryVerified,
            Self::MfaPending(_) => AuthenticationStage::MfaPending,
            Self::FullyAuthenticated(_) => AuthenticationStage::FullyAuthenticated,
        }
    }

    /// Authorities the session currently carries
    ///
    /// A session that has only passed the password step carries none.
    #[must_use]
    pub fn authorities(&self) -> Vec<GrantedAuthority> {
        match self {
            Self::Unauthenticated | Self::PrimaryVerified(_) => Vec::new(),
            Self::MfaPending(pending) => pending.authorities(),
            Self::FullyAuthenticated(principal) => principal.authorities.clone(),
        }
    }

    /// Name of the session principal, if any
    #[must_use]
    pub fn principal_name(&self) -> Option<&str> {
        match self {
            Self::Unauthenticated => None,
            Self::PrimaryVerified(identity) => Some(&identity.email),
            Self::MfaPending(pending) => Some(pending.email()),
            Self::FullyAuthenticated(principal) => Some(&principal.email),
        }
    }

    /// Principal of a completed login
    #[must_use]
    pub const fn principal(&self) -> Option<&AuthenticatedPrincipal> {
        match self {
            Self::FullyAuthenticated(principal) => Some(principal),
            _ => None,
        }
    }

    /// Whether the login is complete
    #[must_use]
    pub const fn is_fully_authenticated(&self) -> bool {
        matches!(self, Self::FullyAuthenticated(_))
    }

    /// Whether the session waits for a second factor
    #[must_use]
    pub const fn is_mfa_pending(&self) -> bool {
        matches!(self, Self::MfaPending(_))
    }
}

impl fmt::Debug for AuthenticationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => f.write_str("Unauthenticated"),
            Self::PrimaryVerified(identity) => f
                .debug_tuple("PrimaryVerified")
                .field(&identity.email)
                .finish(),
            Self::MfaPending(pending) => f.debug_tuple("MfaPending").field(pending).finish(),
            Self::FullyAuthenticated(principal) => f
                .debug_tuple("FullyAuthenticated")
                .field(principal)
                .finish(),
        }
    }
}

impl Serialize for AuthenticationState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AuthenticationState", 3)?;
        state.serialize_field("stage", &self.stage())?;
        state.serialize_field("principal", &self.principal_name())?;
        state.serialize_field("authorities", &self.authorities())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            id: 7,
            user_uuid: Uuid::new_v4(),
            email: "ada@example.com".to_owned(),
            password_hash: "$2b$04$secret-hash".to_owned(),
            role: "ROLE_ADMIN".to_owned(),
            authorities: "user:delete,user:update".to_owned(),
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
    fn test_pending_state_hides_real_authorities() {
        let state = AuthenticationState::MfaPending(MfaPending::new(&identity()));
        let json = serde_json::to_string(&state).unwrap();
        let debug = format!("{state:?}");

        for rendered in [&json, &debug] {
            assert!(rendered.contains("ROLE_ANONYMOUS"));
            assert!(rendered.contains("MFA_REQUIRED"));
            assert!(!rendered.contains("ROLE_ADMIN"));
            assert!(!rendered.contains("user:delete"));
            assert!(!rendered.contains("JBSWY3DPEHPK3PXP"));
            assert!(!rendered.contains("secret-hash"));
        }
        assert_eq!(state.principal_name(), Some("ada@example.com"));
    }

    #[test]
    fn test_promotion_restores_real_authorities() {
        let pending = MfaPending::new(&identity());
        let principal = pending.promote();
        let names: Vec<&str> = principal
            .authorities
            .iter()
            .map(GrantedAuthority::as_str)
            .collect();
        assert_eq!(names, ["ROLE_ADMIN", "user:delete", "user:update"]);
    }

    #[test]
    fn test_pending_state_retains_no_credentials() {
        let primary = identity();
        let pending = MfaPending::new(&primary);
        let user_uuid = primary.user_uuid;
        drop(primary);

        let stored = AuthenticationState::MfaPending(pending.clone());
        let rendered = format!("{stored:?}{}", serde_json::to_string(&stored).unwrap());
        assert!(!rendered.contains("secret-hash"));
        assert!(!rendered.contains("JBSWY3DPEHPK3PXP"));

        assert_eq!(pending.user_uuid(), user_uuid);
        let principal = pending.promote();
        assert_eq!(principal.user_uuid, user_uuid);
        assert_eq!(principal.email, "ada@example.com");
        assert_eq!(principal.authorities.len(), 3);
    }

    #[test]
    fn test_default_is_unauthenticated() {
        let state = AuthenticationState::default();
        assert_eq!(state.stage(), AuthenticationStage::Unauthenticated);
        assert!(state.authorities().is_empty());
        assert!(state.principal().is_none());
    }
}
