// ABOUTME: OAuth 2.0 token issuance core: public-client authentication and token generation
// ABOUTME: Mints RS256 access tokens and opaque refresh tokens for authenticated principals
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Public-client authentication on the refresh-token grant
pub mod client_auth;
/// Access-token verification
pub mod jwt;
/// OAuth 2.0 request, response and issuance context types
pub mod models;
/// Access, refresh and delegating token generators
pub mod token_generator;

pub use client_auth::{ClientAuthenticator, ClientRefreshTokenRequest};
pub use jwt::{verify_access_token, AccessTokenClaims, JwtValidationError};
pub use models::{OAuth2Error, TokenContext, TokenResponse};
pub use token_generator::{
    DelegatingTokenGenerator, JwtAccessTokenGenerator, RefreshTokenGenerator, TokenGenerator,
    TokenService,
};
