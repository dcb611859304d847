// ABOUTME: Unified error handling with stable error codes and HTTP response formatting
// ABOUTME: Re-exports the authentication and storage error enums used across the workspace
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling
//!
//! Standard error codes, the [`AppError`] envelope used by the HTTP adapter, and the
//! domain-specific [`AuthError`] and [`DatabaseError`] enums.

/// Authentication error taxonomy
pub mod auth;
/// Persistence error type
pub mod database;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use auth::{AuthError, ClientRejection};
pub use database::DatabaseError;

/// Standard error codes used throughout the application
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Authentication (1000-1999)
    /// Caller has not authenticated
    #[serde(rename = "AUTH_REQUIRED")]
    AuthRequired = 1000,
    /// Credentials rejected
    #[serde(rename = "AUTH_INVALID")]
    AuthInvalid = 1001,
    /// Account locked after repeated failures or by flag
    #[serde(rename = "ACCOUNT_LOCKED")]
    AccountLocked = 1002,
    /// Account disabled
    #[serde(rename = "ACCOUNT_DISABLED")]
    AccountDisabled = 1003,
    /// Account expired
    #[serde(rename = "ACCOUNT_EXPIRED")]
    AccountExpired = 1004,
    /// Second-factor code rejected
    #[serde(rename = "MFA_INVALID")]
    MfaInvalid = 1005,
    /// Session is not waiting for a second factor
    #[serde(rename = "MFA_NOT_PENDING")]
    MfaNotPending = 1006,
    /// OAuth2 client refused
    #[serde(rename = "CLIENT_INVALID")]
    ClientInvalid = 1007,

    // Validation (3000-3999)
    /// Malformed request input
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,

    // Configuration (6000-6999)
    /// Configuration could not be loaded
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 6000,
    /// Signing key material missing or unreadable
    #[serde(rename = "KEY_UNAVAILABLE")]
    KeyUnavailable = 6001,

    // Internal Errors (9000-9999)
    /// Unexpected failure
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    /// Persistence failure
    #[serde(rename = "STORAGE_ERROR")]
    StorageError = 9002,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidInput => 400,
            Self::AuthRequired | Self::AuthInvalid | Self::MfaInvalid | Self::ClientInvalid => 401,
            Self::AccountLocked | Self::AccountDisabled | Self::AccountExpired => 403,
            Self::MfaNotPending => 409,
            Self::ConfigError | Self::KeyUnavailable | Self::InternalError | Self::StorageError => {
                500
            }
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AuthRequired => "Authentication is required to access this resource",
            Self::AuthInvalid => "The provided authentication credentials are invalid",
            Self::AccountLocked => "The account is locked",
            Self::AccountDisabled => "The account is disabled",
            Self::AccountExpired => "The account has expired",
            Self::MfaInvalid => "The verification code is invalid",
            Self::MfaNotPending => "No second-factor verification is pending",
            Self::ClientInvalid => "Client authentication failed",
            Self::InvalidInput => "The provided input is invalid",
            Self::ConfigError => "Configuration error encountered",
            Self::KeyUnavailable => "Signing key material is unavailable",
            Self::InternalError => "An internal server error occurred",
            Self::StorageError => "Storage operation failed",
        }
    }
}

/// Error envelope returned by the HTTP adapter
#[derive(Debug, thiserror::Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Request ID if one was assigned
    pub request_id: Option<String>,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            request_id: None,
            source: None,
        }
    }

    /// Add a request ID
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

impl From<AuthError> for AppError {
    fn from(error: AuthError) -> Self {
        let code = error.code();
        // Internal causes stay in the logs; clients only see the generic description
        let message = match code.http_status() {
            500 => code.description().to_owned(),
            _ => error.to_string(),
        };
        Self {
            code,
            message,
            request_id: None,
            source: Some(Box::new(error)),
        }
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// HTTP error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error body
    pub error: ErrorResponseDetails,
}

/// Error body fields
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    /// Stable error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Request ID if one was assigned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message: error.message.clone(),
                request_id: error.request_id.clone(),
            },
        }
    }
}

#[cfg(feature = "http-response")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = http::StatusCode::from_u16(self.http_status())
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(code = ?self.code, error = ?self.source, "request failed");
        }
        (status, axum::Json(ErrorResponse::from(&self))).into_response()
    }
}

#[cfg(feature = "http-response")]
impl axum::response::IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        AppError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::AuthRequired.http_status(), 401);
        assert_eq!(ErrorCode::AccountLocked.http_status(), 403);
        assert_eq!(ErrorCode::MfaNotPending.http_status(), 409);
        assert_eq!(ErrorCode::StorageError.http_status(), 500);
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let error = AppError::from(AuthError::key_unavailable("/srv/keys/private.key: denied"));
        assert_eq!(error.code, ErrorCode::KeyUnavailable);
        assert!(!error.message.contains("/srv/keys"));
    }

    #[test]
    fn test_error_response_serialization() {
        let error = AppError::from(AuthError::InvalidCredentials).with_request_id("req-123");
        let json = serde_json::to_string(&ErrorResponse::from(&error)).unwrap();
        assert!(json.contains("AUTH_INVALID"));
        assert!(json.contains("Incorrect email/password"));
        assert!(json.contains("req-123"));
    }
}
