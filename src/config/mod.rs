// ABOUTME: Configuration module for server settings loaded from the environment
// ABOUTME: Exposes the deployment environment, key location and credential policy settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration for the Warden server

/// Environment and server configuration
pub mod environment;

pub use environment::{Environment, KeyConfig, ServerConfig};
