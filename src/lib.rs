// ABOUTME: Main library entry point for the Warden authorization core
// ABOUTME: Provides credential and second-factor authentication, sessions and OAuth2 token issuance
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Warden
//!
//! Identity verification and token issuance core of an OAuth 2.0
//! authorization server.
//!
//! ## Features
//!
//! - **Primary authentication**: bcrypt password checks with account-status
//!   policy and lockout after five consecutive failures
//! - **Second factor**: TOTP verification behind a pending session state that
//!   never carries the user's real authorities
//! - **Token issuance**: RS256 access tokens with an `authorities` claim and
//!   opaque refresh tokens
//! - **Public clients**: refresh-token grant authentication for clients
//!   registered with method `none`
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use warden::config::ServerConfig;
//! use warden::key_management::KeyManager;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     let keys = KeyManager::load_or_generate(&config.keys)?;
//!     println!("signing key {}", keys.signing_key_pair().kid());
//!     Ok(())
//! }
//! ```

/// Password login, second-factor gate and session state machine
pub mod auth;

/// Environment-based configuration
pub mod config;

/// SQLite implementation of the identity store and client registry
pub mod database;

/// Storage traits consumed by the authentication core
pub mod database_plugins;

/// RSA signing key lifecycle and JWKS publication
pub mod key_management;

/// Structured logging setup and authentication event logging
pub mod logging;

/// Public-client authentication and token generation
pub mod oauth2_server;

/// HTTP adapter for the login flow
pub mod routes;

/// Session persistence of authentication state
pub mod session;

/// Request utilities
pub mod utils;

pub use warden_core::{constants, errors, models};
