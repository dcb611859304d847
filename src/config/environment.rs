// ABOUTME: Environment configuration for the authorization core and its HTTP adapter
// ABOUTME: Parses deployment mode, storage URL, signing key location and credential policy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::info;
use warden_core::constants::{credentials, keys, service_names, session};

/// Deployment environment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development; keys may be generated
    #[default]
    Development,
    /// Production; keys must already exist
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Location and generation policy of the RSA signing key pair
#[derive(Debug, Clone)]
pub struct KeyConfig {
    /// Directory holding both key files
    pub keys_dir: PathBuf,
    /// PKCS#8 DER private key file name
    pub private_key_file: String,
    /// X.509 SubjectPublicKeyInfo DER public key file name
    pub public_key_file: String,
    /// Modulus size for generated keys
    pub rsa_key_bits: usize,
    /// Generation is refused in production
    pub environment: Environment,
}

impl KeyConfig {
    /// Defaults rooted at `keys_dir`
    pub fn new(keys_dir: impl Into<PathBuf>, environment: Environment) -> Self {
        Self {
            keys_dir: keys_dir.into(),
            private_key_file: keys::DEFAULT_PRIVATE_KEY_FILE.to_owned(),
            public_key_file: keys::DEFAULT_PUBLIC_KEY_FILE.to_owned(),
            rsa_key_bits: keys::RSA_KEY_BITS,
            environment,
        }
    }

    /// Full path of the private key file
    #[must_use]
    pub fn private_key_path(&self) -> PathBuf {
        self.keys_dir.join(&self.private_key_file)
    }

    /// Full path of the public key file
    #[must_use]
    pub fn public_key_path(&self) -> PathBuf {
        self.keys_dir.join(&self.public_key_file)
    }

    /// Whether missing keys may be generated
    #[must_use]
    pub const fn allows_generation(&self) -> bool {
        !self.environment.is_production()
    }
}

/// Server configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Deployment environment
    pub environment: Environment,
    /// HTTP adapter port
    pub http_port: u16,
    /// sqlx database URL
    pub database_url: String,
    /// Signing key configuration
    pub keys: KeyConfig,
    /// `iss` claim of minted access tokens
    pub issuer: String,
    /// bcrypt cost for hashing
    pub bcrypt_cost: u32,
    /// Idle session lifetime
    pub session_ttl: Duration,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable cannot be parsed
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let environment =
            Environment::from_str_or_default(&env_var_or("ENVIRONMENT", "development"));

        let keys = KeyConfig {
            keys_dir: PathBuf::from(env_var_or("WARDEN_KEYS_DIR", keys::DEFAULT_KEYS_DIR)),
            private_key_file: env_var_or(
                "WARDEN_PRIVATE_KEY_FILE",
                keys::DEFAULT_PRIVATE_KEY_FILE,
            ),
            public_key_file: env_var_or("WARDEN_PUBLIC_KEY_FILE", keys::DEFAULT_PUBLIC_KEY_FILE),
            rsa_key_bits: parse_env("WARDEN_RSA_KEY_BITS", keys::RSA_KEY_BITS)?,
            environment,
        };

        Ok(Self {
            environment,
            http_port: parse_env("HTTP_PORT", 8090)?,
            database_url: env_var_or("DATABASE_URL", "sqlite::memory:"),
            keys,
            issuer: env_var_or("WARDEN_ISSUER", service_names::DEFAULT_ISSUER),
            bcrypt_cost: parse_env("WARDEN_BCRYPT_COST", credentials::BCRYPT_COST)?,
            session_ttl: Duration::seconds(parse_env(
                "WARDEN_SESSION_TTL_SECS",
                session::DEFAULT_TTL_SECS,
            )?),
        })
    }

    /// Human-readable configuration summary for startup logs
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Warden Configuration:\n\
             - Environment: {}\n\
             - HTTP Port: {}\n\
             - Database: {}\n\
             - Keys: {}\n\
             - Issuer: {}\n\
             - Session TTL: {}s",
            self.environment,
            self.http_port,
            if self.database_url.contains(":memory:") {
                "SQLite (memory)"
            } else {
                "SQLite"
            },
            self.keys.keys_dir.display(),
            self.issuer,
            self.session_ttl.num_seconds(),
        )
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: {raw}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 5] = [
        "ENVIRONMENT",
        "WARDEN_KEYS_DIR",
        "WARDEN_BCRYPT_COST",
        "WARDEN_SESSION_TTL_SECS",
        "HTTP_PORT",
    ];

    fn clear() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear();
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.http_port, 8090);
        assert_eq!(config.bcrypt_cost, 12);
        assert_eq!(config.session_ttl, Duration::seconds(1800));
        assert_eq!(config.keys.private_key_path(), PathBuf::from("keys/private.key"));
        assert!(config.keys.allows_generation());
    }

    #[test]
    #[serial]
    fn test_production_forbids_generation() {
        clear();
        env::set_var("ENVIRONMENT", "prod");
        env::set_var("WARDEN_KEYS_DIR", "/var/lib/warden");
        let config = ServerConfig::from_env().unwrap();
        clear();

        assert!(config.environment.is_production());
        assert!(!config.keys.allows_generation());
        assert_eq!(
            config.keys.public_key_path(),
            PathBuf::from("/var/lib/warden/public.key")
        );
    }

    #[test]
    #[serial]
    fn test_invalid_number_is_an_error() {
        clear();
        env::set_var("WARDEN_BCRYPT_COST", "twelve");
        let result = ServerConfig::from_env();
        clear();
        assert!(result.is_err());
    }
}
