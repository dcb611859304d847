// ABOUTME: Core data models for identities, registered clients and minted tokens
// ABOUTME: Re-exports the types shared by the authentication core and its storage backends
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! - `Identity`: a user as seen by primary authentication
//! - `RegisteredClient`: an OAuth 2.0 client and its token settings
//! - `SignedAccessToken` / `RefreshToken`: issuer output

mod client;
mod identity;
mod token;

pub use client::{
    AuthorizationGrantType, ClientAuthenticationMethod, RegisteredClient, TokenSettings,
};
pub use identity::{join_authorities, parse_authorities, GrantedAuthority, Identity, LoginDevice};
pub use token::{GeneratedToken, RefreshToken, SignedAccessToken, TokenType};
