// ABOUTME: Token generators for signed access tokens and opaque refresh tokens
// ABOUTME: A delegating generator tries each in turn; TokenService assembles the token response
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, SubsecRound, Utc};
use jsonwebtoken::{encode, Algorithm, Header};
use rand::{rngs::OsRng, RngCore};
use tracing::debug;
use uuid::Uuid;
use warden_core::constants::tokens::{BEARER, REFRESH_TOKEN_BYTES};
use warden_core::errors::AuthError;
use warden_core::models::{
    join_authorities, AuthorizationGrantType, GeneratedToken, RefreshToken, RegisteredClient,
    SignedAccessToken, TokenType,
};

use super::jwt::AccessTokenClaims;
use super::models::{TokenContext, TokenResponse};
use crate::auth::state::AuthenticatedPrincipal;
use crate::key_management::KeyManager;

/// Mints at most one token per call
pub trait TokenGenerator: Send + Sync {
    /// Token for `context`, or `None` when this generator does not handle the requested type
    ///
    /// # Errors
    ///
    /// Returns `TokenGeneration` if signing or encoding fails
    fn generate(&self, context: &TokenContext) -> Result<Option<GeneratedToken>, AuthError>;
}

// Second precision keeps `exp - iat` equal to the configured TTL in the claims
fn issued_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

// ============================================================================
// Access Tokens
// ============================================================================

/// RS256 JWT access token generator
pub struct JwtAccessTokenGenerator {
    keys: Arc<KeyManager>,
    issuer: String,
}

impl JwtAccessTokenGenerator {
    /// Create a generator signing with `keys` under `issuer`
    pub fn new(keys: Arc<KeyManager>, issuer: impl Into<String>) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
        }
    }
}

impl TokenGenerator for JwtAccessTokenGenerator {
    fn generate(&self, context: &TokenContext) -> Result<Option<GeneratedToken>, AuthError> {
        if context.token_type != TokenType::AccessToken {
            return Ok(None);
        }

        let issued_at = issued_now();
        let expires_at = issued_at + context.client.token_settings.access_token_ttl;
        let authorities = join_authorities(&context.principal.authorities);
        let scope = (!context.authorized_scopes.is_empty())
            .then(|| context.authorized_scopes.join(" "));

        let claims = AccessTokenClaims {
            iss: self.issuer.clone(),
            sub: context.principal.user_uuid.to_string(),
            aud: context.client.client_id.clone(),
            iat: issued_at.timestamp(),
            nbf: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            scope,
            authorities: authorities.clone(),
        };

        let key_pair = self.keys.signing_key_pair();
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(key_pair.kid().to_owned());

        let token_value = encode(&header, &claims, key_pair.encoding_key())
            .map_err(AuthError::token_generation)?;

        debug!(sub = %claims.sub, aud = %claims.aud, "access token minted");
        Ok(Some(GeneratedToken::Access(SignedAccessToken {
            token_value,
            subject: claims.sub,
            issued_at,
            expires_at,
            authorities,
            scopes: context.authorized_scopes.clone(),
            key_id: key_pair.kid().to_owned(),
        })))
    }
}

// ============================================================================
// Refresh Tokens
// ============================================================================

/// Opaque refresh token generator
///
/// Refresh tokens expire after the client's *access*-token TTL, not its
/// refresh-token TTL.
#[derive(Debug, Default, Clone, Copy)]
pub struct RefreshTokenGenerator;

impl TokenGenerator for RefreshTokenGenerator {
    fn generate(&self, context: &TokenContext) -> Result<Option<GeneratedToken>, AuthError> {
        if context.token_type != TokenType::RefreshToken {
            return Ok(None);
        }

        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);

        let issued_at = issued_now();
        Ok(Some(GeneratedToken::Refresh(RefreshToken {
            token_value: URL_SAFE_NO_PAD.encode(bytes),
            issued_at,
            expires_at: issued_at + context.client.token_settings.access_token_ttl,
        })))
    }
}

// ============================================================================
// Delegation
// ============================================================================

/// Asks each generator in order and returns the first token produced
pub struct DelegatingTokenGenerator {
    generators: Vec<Box<dyn TokenGenerator>>,
}

impl DelegatingTokenGenerator {
    /// Compose `generators`, consulted in order
    #[must_use]
    pub fn new(generators: Vec<Box<dyn TokenGenerator>>) -> Self {
        Self { generators }
    }

    /// Access-token generator followed by the refresh-token generator
    #[must_use]
    pub fn standard(keys: Arc<KeyManager>, issuer: impl Into<String>) -> Self {
        Self::new(vec![
            Box::new(JwtAccessTokenGenerator::new(keys, issuer)),
            Box::new(RefreshTokenGenerator),
        ])
    }
}

impl TokenGenerator for DelegatingTokenGenerator {
    fn generate(&self, context: &TokenContext) -> Result<Option<GeneratedToken>, AuthError> {
        for generator in &self.generators {
            if let Some(token) = generator.generate(context)? {
                return Ok(Some(token));
            }
        }
        Ok(None)
    }
}

// ============================================================================
// Token Response
// ============================================================================

/// Issues the tokens of one successful grant
pub struct TokenService {
    generator: DelegatingTokenGenerator,
}

impl TokenService {
    /// Create a service around `generator`
    #[must_use]
    pub const fn new(generator: DelegatingTokenGenerator) -> Self {
        Self { generator }
    }

    /// Mint a single token of `context.token_type`
    ///
    /// # Errors
    ///
    /// Returns `TokenGeneration` if signing or encoding fails
    pub fn issue_token(&self, context: &TokenContext) -> Result<Option<GeneratedToken>, AuthError> {
        self.generator.generate(context)
    }

    /// Access token, plus a refresh token when the client may use the refresh grant
    ///
    /// # Errors
    ///
    /// Returns `TokenGeneration` if a token cannot be minted
    pub fn issue_token_response(
        &self,
        principal: AuthenticatedPrincipal,
        client: RegisteredClient,
    ) -> Result<TokenResponse, AuthError> {
        let issue_refresh = client.supports_grant(AuthorizationGrantType::RefreshToken);
        let context = TokenContext::new(principal, client, TokenType::AccessToken);

        let Some(GeneratedToken::Access(access)) = self.issue_token(&context)? else {
            return Err(AuthError::token_generation("no access token generator configured"));
        };

        let refresh_token = if issue_refresh {
            self.issue_token(&context.with_token_type(TokenType::RefreshToken))?
                .map(|token| token.token_value().to_owned())
        } else {
            None
        };

        let scope = (!access.scopes.is_empty()).then(|| access.scopes.join(" "));
        Ok(TokenResponse {
            expires_in: (access.expires_at - access.issued_at).num_seconds(),
            access_token: access.token_value,
            token_type: BEARER.to_owned(),
            scope,
            refresh_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use warden_core::models::{ClientAuthenticationMethod, GrantedAuthority, TokenSettings};

    fn context(token_type: TokenType) -> TokenContext {
        let principal = AuthenticatedPrincipal {
            user_uuid: Uuid::new_v4(),
            email: "ada@example.com".to_owned(),
            authorities: vec![GrantedAuthority::new("ROLE_USER")],
            authenticated_at: Utc::now(),
        };
        let client = RegisteredClient {
            id: "reg-spa".to_owned(),
            client_id: "spa".to_owned(),
            client_name: None,
            authentication_methods: vec![ClientAuthenticationMethod::None],
            grant_types: vec![AuthorizationGrantType::RefreshToken],
            redirect_uris: Vec::new(),
            scopes: Vec::new(),
            token_settings: TokenSettings {
                access_token_ttl: Duration::minutes(10),
                refresh_token_ttl: Duration::days(30),
            },
        };
        TokenContext::new(principal, client, token_type)
    }

    #[test]
    fn test_refresh_token_uses_access_ttl() {
        let token = RefreshTokenGenerator
            .generate(&context(TokenType::RefreshToken))
            .unwrap()
            .unwrap();
        assert_eq!(token.token_type(), TokenType::RefreshToken);
        assert_eq!(token.expires_at() - token.issued_at(), Duration::minutes(10));
        assert_eq!(token.token_value().len(), 43);
        assert!(!token.token_value().contains('='));
    }

    #[test]
    fn test_refresh_generator_ignores_other_types() {
        assert!(RefreshTokenGenerator
            .generate(&context(TokenType::AccessToken))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_delegation_returns_nothing_for_id_tokens() {
        let delegating = DelegatingTokenGenerator::new(vec![Box::new(RefreshTokenGenerator)]);
        assert!(delegating
            .generate(&context(TokenType::IdToken))
            .unwrap()
            .is_none());
        assert!(delegating
            .generate(&context(TokenType::RefreshToken))
            .unwrap()
            .is_some());
    }
}
