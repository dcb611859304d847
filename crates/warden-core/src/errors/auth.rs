// ABOUTME: Authentication error taxonomy for credential, second-factor, client and key failures
// ABOUTME: Maps every failure to an ErrorCode and, where relevant, an OAuth2 wire error code
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;

use super::database::DatabaseError;
use super::ErrorCode;

/// Why a public client was refused on the refresh-token path
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientRejection {
    /// Presented method is not `none`, or the client is not registered for it
    AuthenticationMethod,
    /// No client is registered under the presented id
    UnknownClient,
}

impl fmt::Display for ClientRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthenticationMethod => f.write_str("Authentication method is not valid"),
            Self::UnknownClient => f.write_str("Client is not valid"),
        }
    }
}

/// Errors surfaced by the authentication and token issuance core
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown identifier or wrong password (indistinguishable to the caller)
    #[error("Incorrect email/password. Please try again.")]
    InvalidCredentials,

    /// Too many failed attempts or explicitly locked
    #[error("{}", locked_message(*.attempts))]
    AccountLocked {
        /// Recorded failed attempts at the time of the check
        attempts: i64,
    },

    /// Account disabled by an administrator
    #[error("Your account is currently disabled")]
    AccountDisabled,

    /// Account past its validity period
    #[error("Your account has expired. Please contact administration")]
    AccountExpired,

    /// Second-factor code did not match the current time window
    #[error("Invalid verification code. Please try again.")]
    InvalidMfaCode,

    /// Public client refused on the refresh-token path
    #[error("{reason}")]
    InvalidClient {
        /// Which rule rejected the client
        reason: ClientRejection,
    },

    /// Signing key material could not be loaded or generated
    #[error("Signing key unavailable: {reason}")]
    KeyUnavailable {
        /// Underlying cause
        reason: String,
    },

    /// Operation needs a session that has passed primary authentication
    #[error("Authentication is required")]
    AuthenticationRequired,

    /// Second-factor verification attempted on a session that is not waiting for it
    #[error("No second-factor verification is pending for this session")]
    MfaNotPending,

    /// Identity store, client registry or session store failure
    #[error("Storage failure during authentication")]
    Storage {
        /// Underlying storage error
        #[from]
        source: DatabaseError,
    },

    /// Token could not be signed or encoded
    #[error("Token generation failed: {reason}")]
    TokenGeneration {
        /// Underlying cause
        reason: String,
    },
}

fn locked_message(attempts: i64) -> String {
    if attempts > 0 {
        format!("Account currently locked after {attempts} failed login attempts")
    } else {
        "Account currently locked".to_owned()
    }
}

impl AuthError {
    /// Create a `KeyUnavailable` error from any displayable cause
    pub fn key_unavailable(reason: impl fmt::Display) -> Self {
        Self::KeyUnavailable {
            reason: reason.to_string(),
        }
    }

    /// Create a `TokenGeneration` error from any displayable cause
    pub fn token_generation(reason: impl fmt::Display) -> Self {
        Self::TokenGeneration {
            reason: reason.to_string(),
        }
    }

    /// Stable error code for logging and HTTP mapping
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidCredentials => ErrorCode::AuthInvalid,
            Self::AccountLocked { .. } => ErrorCode::AccountLocked,
            Self::AccountDisabled => ErrorCode::AccountDisabled,
            Self::AccountExpired => ErrorCode::AccountExpired,
            Self::InvalidMfaCode => ErrorCode::MfaInvalid,
            Self::InvalidClient { .. } => ErrorCode::ClientInvalid,
            Self::KeyUnavailable { .. } => ErrorCode::KeyUnavailable,
            Self::AuthenticationRequired => ErrorCode::AuthRequired,
            Self::MfaNotPending => ErrorCode::MfaNotPending,
            Self::Storage { .. } => ErrorCode::StorageError,
            Self::TokenGeneration { .. } => ErrorCode::InternalError,
        }
    }

    /// OAuth2 error code (RFC 6749 Section 5.2) for failures raised on the token endpoint path
    #[must_use]
    pub const fn oauth2_error_code(&self) -> Option<&'static str> {
        match self {
            Self::InvalidClient { .. } => Some("invalid_client"),
            Self::TokenGeneration { .. } | Self::KeyUnavailable { .. } | Self::Storage { .. } => {
                Some("server_error")
            }
            _ => None,
        }
    }

    /// Whether this failure advanced the lockout counter
    #[must_use]
    pub const fn is_credential_failure(&self) -> bool {
        matches!(self, Self::InvalidCredentials)
    }

    /// Whether this failure indicates the process cannot serve authentication at all
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::KeyUnavailable { .. })
    }
}
