// ABOUTME: Core types and constants for the Warden authorization core
// ABOUTME: Foundation crate with error handling, identity and client models, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Warden Core
//!
//! Foundation crate providing the shared types of the Warden authorization
//! core. It changes infrequently so the root crate benefits from incremental
//! compilation.
//!
//! ## Modules
//!
//! - **errors**: `AuthError` taxonomy, `ErrorCode`, `AppError` and database errors
//! - **constants**: Lockout thresholds, authority names, TOTP parameters, claim names
//! - **models**: `Identity`, `RegisteredClient`, issued token types

/// Unified error handling with the authentication error taxonomy
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Identity, client registration and token models
pub mod models;
