// ABOUTME: Utility modules shared by the HTTP adapter
// ABOUTME: Contains login-device extraction from request headers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Device, browser and client address extraction from HTTP requests
pub mod user_agent;
