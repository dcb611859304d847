// ABOUTME: OAuth 2.0 data models for token issuance
// ABOUTME: Issuance context handed to generators plus RFC 6749 response and error bodies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::Serialize;
use warden_core::errors::AuthError;
use warden_core::models::{RegisteredClient, TokenType};

use crate::auth::state::AuthenticatedPrincipal;

/// Everything a generator needs to mint one token
#[derive(Debug, Clone)]
pub struct TokenContext {
    /// Grant subject
    pub principal: AuthenticatedPrincipal,
    /// Client the token is issued to
    pub client: RegisteredClient,
    /// Which token is being requested
    pub token_type: TokenType,
    /// Scopes granted for this issuance
    pub authorized_scopes: Vec<String>,
}

impl TokenContext {
    /// Context for `token_type` with the client's registered scopes
    #[must_use]
    pub fn new(
        principal: AuthenticatedPrincipal,
        client: RegisteredClient,
        token_type: TokenType,
    ) -> Self {
        let authorized_scopes = client.scopes.clone();
        Self {
            principal,
            client,
            token_type,
            authorized_scopes,
        }
    }

    /// Same principal and client, different token type
    #[must_use]
    pub fn with_token_type(&self, token_type: TokenType) -> Self {
        Self {
            token_type,
            ..self.clone()
        }
    }
}

/// OAuth 2.0 Token Response
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Access token (JWT)
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Expires in seconds
    pub expires_in: i64,
    /// Scopes granted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Refresh token (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// OAuth 2.0 Error Response
#[derive(Debug, Serialize)]
pub struct OAuth2Error {
    /// Error code
    pub error: String,
    /// Human-readable error description
    pub error_description: Option<String>,
    /// URI for error information
    pub error_uri: Option<String>,
}

impl OAuth2Error {
    /// Create an `invalid_client` error
    #[must_use]
    pub fn invalid_client(description: &str) -> Self {
        Self {
            error: "invalid_client".to_owned(),
            error_description: Some(description.to_owned()),
            error_uri: Some("https://datatracker.ietf.org/doc/html/rfc6749#section-5.2".to_owned()),
        }
    }

    /// Create a `server_error` error
    #[must_use]
    pub fn server_error() -> Self {
        Self {
            error: "server_error".to_owned(),
            error_description: Some("The authorization server encountered an error".to_owned()),
            error_uri: None,
        }
    }
}

impl From<&AuthError> for OAuth2Error {
    fn from(error: &AuthError) -> Self {
        match error {
            AuthError::InvalidClient { reason } => Self::invalid_client(&reason.to_string()),
            _ => Self::server_error(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::errors::ClientRejection;

    #[test]
    fn test_invalid_client_keeps_rejection_message() {
        let err = AuthError::InvalidClient {
            reason: ClientRejection::UnknownClient,
        };
        let body = OAuth2Error::from(&err);
        assert_eq!(body.error, "invalid_client");
        assert_eq!(body.error_description.as_deref(), Some("Client is not valid"));
    }

    #[test]
    fn test_token_response_omits_absent_fields() {
        let response = TokenResponse {
            access_token: "a.b.c".to_owned(),
            token_type: "Bearer".to_owned(),
            expires_in: 300,
            scope: None,
            refresh_token: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("refresh_token").is_none());
        assert!(json.get("scope").is_none());
        assert_eq!(json["expires_in"], 300);
    }
}
