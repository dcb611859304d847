// ABOUTME: Second-factor gate deciding between a completed login and a pending TOTP challenge
// ABOUTME: Verifies RFC 6238 codes (SHA-1, 6 digits, 30 second step, one step of drift)
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::time::{SystemTime, UNIX_EPOCH};

use totp_rs::{Algorithm, Secret, TOTP};
use tracing::{debug, warn};
use warden_core::constants::totp;
use warden_core::models::Identity;

use super::state::{AuthenticatedPrincipal, AuthenticationState, MfaPending};

/// Decides whether a primary-verified identity needs a second factor and checks TOTP codes
#[derive(Debug, Clone, Copy)]
pub struct MfaGate {
    digits: usize,
    skew: u8,
    step: u64,
}

impl Default for MfaGate {
    fn default() -> Self {
        Self {
            digits: totp::DIGITS,
            skew: totp::SKEW,
            step: totp::STEP_SECONDS,
        }
    }
}

impl MfaGate {
    /// Next state after primary authentication
    ///
    /// Identities without a second factor complete immediately with their real
    /// authorities; the rest are parked in [`AuthenticationState::MfaPending`].
    #[must_use]
    pub fn evaluate(&self, identity: &Identity) -> AuthenticationState {
        if identity.mfa_enabled {
            debug!(user_uuid = %identity.user_uuid, "second factor required");
            AuthenticationState::MfaPending(MfaPending::new(identity))
        } else {
            AuthenticationState::FullyAuthenticated(AuthenticatedPrincipal::from_identity(identity))
        }
    }

    /// Check a code against the current time window
    #[must_use]
    pub fn verify_code(&self, secret: &str, code: &str) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        self.verify_code_at(secret, code, now)
    }

    /// Check a code against the window containing `unix_time`
    #[must_use]
    pub fn verify_code_at(&self, secret: &str, code: &str, unix_time: u64) -> bool {
        let code = code.trim();
        if code.len() != self.digits || !code.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }

        self.totp(secret)
            .is_some_and(|totp| totp.check(code, unix_time))
    }

    /// Code for the window containing `unix_time`
    #[must_use]
    pub fn generate_code_at(&self, secret: &str, unix_time: u64) -> Option<String> {
        self.totp(secret).map(|totp| totp.generate(unix_time))
    }

    fn totp(&self, secret: &str) -> Option<TOTP> {
        let bytes = match Secret::Encoded(secret.trim().to_owned()).to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("stored TOTP secret is not valid base32: {e:?}");
                return None;
            }
        };

        match TOTP::new(
            Algorithm::SHA1,
            self.digits,
            self.skew,
            self.step,
            bytes,
            None,
            String::new(),
        ) {
            Ok(totp) => Some(totp),
            Err(e) => {
                warn!("stored TOTP secret rejected: {e}");
                None
            }
        }
    }
}
