// ABOUTME: Primary credential verification with account-status policy and lockout accounting
// ABOUTME: bcrypt comparison runs on the blocking pool; attempt counting is delegated to the store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use warden_core::constants::credentials::MAX_LOGIN_ATTEMPTS;
use warden_core::errors::AuthError;
use warden_core::models::Identity;
use zeroize::Zeroizing;

use crate::database_plugins::IdentityStore;
use crate::logging::{AppLogger, AuthEvent};

/// Subject logged for identifiers with no matching identity
const UNKNOWN_SUBJECT: &str = "unknown";

/// Verifies email/password logins against the identity store
pub struct CredentialAuthenticator {
    identities: Arc<dyn IdentityStore>,
    /// Hash compared against when the identifier is unknown
    dummy_hash: String,
}

impl CredentialAuthenticator {
    /// Create an authenticator over `identities`
    ///
    /// # Errors
    ///
    /// Returns an error if `bcrypt_cost` is outside bcrypt's accepted range
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        bcrypt_cost: u32,
    ) -> Result<Self, bcrypt::BcryptError> {
        let dummy_hash = bcrypt::hash("warden-unknown-identity", bcrypt_cost)?;
        Ok(Self {
            identities,
            dummy_hash,
        })
    }

    /// Verify `secret` for the identity registered under `identifier`
    ///
    /// Policy checks run before the password comparison, in this order:
    /// locked, disabled, expired. A wrong password advances the failed-attempt
    /// counter; a correct one resets it and records the login time. Unknown
    /// identifiers fail exactly like wrong passwords but touch no counter.
    ///
    /// # Errors
    ///
    /// `InvalidCredentials`, `AccountLocked`, `AccountDisabled`, `AccountExpired`,
    /// or `Storage` when the identity store fails
    pub async fn authenticate(&self, identifier: &str, secret: &str) -> Result<Identity, AuthError> {
        let identifier = identifier.trim();
        let secret = Zeroizing::new(secret.to_owned());

        let Some(identity) = self.identities.find_by_email(identifier).await? else {
            // Spend the same bcrypt time as a real comparison
            let _ = verify_password(secret, self.dummy_hash.clone()).await;
            debug!("login for unknown identifier");
            AppLogger::log_auth_event(
                UNKNOWN_SUBJECT,
                AuthEvent::LoginFailure,
                Some("unknown identifier"),
            );
            return Err(AuthError::InvalidCredentials);
        };

        check_account_status(&identity).inspect_err(|e| {
            AppLogger::log_auth_event(
                &identity.user_uuid.to_string(),
                AuthEvent::LoginRefused,
                Some(&e.to_string()),
            );
        })?;

        if !verify_password(secret, identity.password_hash.clone()).await {
            let attempts = self
                .identities
                .increment_failed_attempts(&identity.email)
                .await?;
            let user = identity.user_uuid.to_string();
            AppLogger::log_auth_event(&user, AuthEvent::LoginFailure, Some("bad credentials"));
            if attempts >= MAX_LOGIN_ATTEMPTS {
                AppLogger::log_security_event(
                    "account_lockout",
                    "high",
                    &format!("{attempts} consecutive failed login attempts"),
                    Some(&user),
                );
            }
            return Err(AuthError::InvalidCredentials);
        }

        self.identities
            .reset_failed_attempts(identity.user_uuid)
            .await?;
        self.identities
            .record_login(identity.user_uuid, Utc::now())
            .await?;

        AppLogger::log_auth_event(
            &identity.user_uuid.to_string(),
            AuthEvent::LoginSuccess,
            None,
        );
        Ok(identity)
    }
}

/// Account-status policy, first failing check wins
fn check_account_status(identity: &Identity) -> Result<(), AuthError> {
    if identity.is_locked() {
        return Err(AuthError::AccountLocked {
            attempts: identity.login_attempts,
        });
    }
    if identity.disabled {
        return Err(AuthError::AccountDisabled);
    }
    if identity.expired {
        return Err(AuthError::AccountExpired);
    }
    Ok(())
}

/// Verify password against hash using bcrypt with `spawn_blocking`
async fn verify_password(password: Zeroizing<String>, hash: String) -> bool {
    tokio::task::spawn_blocking(move || bcrypt::verify(password.as_str(), &hash).unwrap_or(false))
        .await
        .unwrap_or_else(|e| {
            warn!("password verification task failed: {e}");
            false
        })
}
