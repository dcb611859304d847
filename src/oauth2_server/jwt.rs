// ABOUTME: Access-token claim set and RS256 verification against the active signing key
// ABOUTME: Resource-side check of signature, key id, issuer, audience and expiry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::key_management::KeyManager;

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Issuer
    pub iss: String,
    /// Subject (user uuid)
    pub sub: String,
    /// Audience (client id)
    pub aud: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Not before (unix seconds)
    pub nbf: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
    /// Token id
    pub jti: String,
    /// Space-separated scopes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Comma-joined granted authorities
    pub authorities: String,
}

/// Why an access token was rejected
#[derive(Debug, thiserror::Error)]
pub enum JwtValidationError {
    /// Token has expired
    #[error("JWT token has expired")]
    TokenExpired,
    /// Token was signed by a different key
    #[error("JWT token signed with unknown key: {kid}")]
    UnknownKey {
        /// Key id from the token header
        kid: String,
    },
    /// Token is malformed (not proper `JWT` format)
    #[error("JWT token is malformed: {details}")]
    TokenMalformed {
        /// Details about malformation
        details: String,
    },
    /// Signature, issuer, audience or algorithm check failed
    #[error("JWT token is invalid: {reason}")]
    TokenInvalid {
        /// Reason for invalidity
        reason: String,
    },
}

/// Verify an RS256 access token with the active signing key
///
/// Audience is only checked when `audience` is given.
///
/// # Errors
///
/// Returns an error if the token is malformed, names a different key id,
/// fails signature/issuer/audience validation, or has expired
pub fn verify_access_token(
    keys: &KeyManager,
    token: &str,
    issuer: &str,
    audience: Option<&str>,
) -> Result<AccessTokenClaims, JwtValidationError> {
    let header = decode_header(token).map_err(|e| JwtValidationError::TokenMalformed {
        details: format!("Failed to decode token header: {e}"),
    })?;

    let key_pair = keys.signing_key_pair();
    let kid = header
        .kid
        .ok_or_else(|| JwtValidationError::TokenMalformed {
            details: "Token header missing kid (key ID)".to_owned(),
        })?;
    if kid != key_pair.kid() {
        return Err(JwtValidationError::UnknownKey { kid });
    }

    let mut validation = Validation::new(Algorithm::RS256);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.set_issuer(&[issuer]);
    match audience {
        Some(aud) => validation.set_audience(&[aud]),
        None => validation.validate_aud = false,
    }

    let data = decode::<AccessTokenClaims>(token, key_pair.decoding_key(), &validation).map_err(
        |e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtValidationError::TokenExpired,
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) => {
                JwtValidationError::TokenMalformed {
                    details: e.to_string(),
                }
            }
            _ => JwtValidationError::TokenInvalid {
                reason: e.to_string(),
            },
        },
    )?;

    debug!(sub = %data.claims.sub, "access token verified");
    Ok(data.claims)
}
