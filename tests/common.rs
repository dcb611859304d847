// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides in-memory database, seeded identities and clients, and a shared signing key
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `warden`

use std::sync::{Arc, Once, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Duration;
use uuid::Uuid;
use warden::auth::{AuthenticationManager, MfaGate};
use warden::database::Database;
use warden::key_management::{KeyManager, SigningKeyPair};
use warden::models::{
    AuthorizationGrantType, ClientAuthenticationMethod, Identity, RegisteredClient, TokenSettings,
};
use warden::session::InMemorySessionStore;

pub const PASSWORD: &str = "correct horse battery staple";
pub const TOTP_SECRET: &str = "JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXP";
pub const ISSUER: &str = "http://localhost:8090";
/// Fast bcrypt cost for tests
pub const BCRYPT_COST: u32 = 4;

static INIT_LOGGER: Once = Once::new();
static KEYS: OnceLock<Arc<KeyManager>> = OnceLock::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Signing keys shared by every test in the binary
pub fn test_keys() -> Arc<KeyManager> {
    Arc::clone(KEYS.get_or_init(|| {
        let key_pair = SigningKeyPair::generate(2048).expect("generate RSA key");
        Arc::new(KeyManager::from_key_pair(key_pair))
    }))
}

/// Standard test database setup
pub async fn create_test_database() -> Arc<Database> {
    init_test_logging();
    Arc::new(
        Database::new("sqlite::memory:")
            .await
            .expect("in-memory database"),
    )
}

/// Identity with the `ROLE_USER` role and two extra authorities
pub fn identity(email: &str, mfa_enabled: bool) -> Identity {
    Identity {
        id: 0,
        user_uuid: Uuid::new_v4(),
        email: email.to_owned(),
        password_hash: bcrypt::hash(PASSWORD, BCRYPT_COST).expect("hash password"),
        role: "ROLE_USER".to_owned(),
        authorities: "user:read,user:update".to_owned(),
        mfa_enabled,
        totp_secret: mfa_enabled.then(|| TOTP_SECRET.to_owned()),
        login_attempts: 0,
        account_locked: false,
        disabled: false,
        expired: false,
        last_login: None,
    }
}

/// Insert `identity` and return it
pub async fn seed_identity(db: &Database, identity: Identity) -> Identity {
    db.insert_identity(&identity).await.expect("insert identity");
    identity
}

/// Client with a 5 minute access TTL and a 1 day refresh TTL
pub fn client(
    client_id: &str,
    methods: Vec<ClientAuthenticationMethod>,
    grants: Vec<AuthorizationGrantType>,
) -> RegisteredClient {
    RegisteredClient {
        id: format!("reg-{client_id}"),
        client_id: client_id.to_owned(),
        client_name: Some(format!("{client_id} app")),
        authentication_methods: methods,
        grant_types: grants,
        redirect_uris: vec!["http://localhost:3000/callback".to_owned()],
        scopes: vec!["openid".to_owned(), "profile".to_owned()],
        token_settings: TokenSettings {
            access_token_ttl: Duration::minutes(5),
            refresh_token_ttl: Duration::days(1),
        },
    }
}

/// Public client allowed to use the refresh-token grant
pub fn public_client(client_id: &str) -> RegisteredClient {
    client(
        client_id,
        vec![ClientAuthenticationMethod::None],
        vec![
            AuthorizationGrantType::AuthorizationCode,
            AuthorizationGrantType::RefreshToken,
        ],
    )
}

pub struct TestHarness {
    pub db: Arc<Database>,
    pub sessions: Arc<InMemorySessionStore>,
    pub auth: Arc<AuthenticationManager>,
}

/// Authentication manager over an in-memory database and session store
pub async fn create_test_harness() -> TestHarness {
    let db = create_test_database().await;
    let sessions = Arc::new(InMemorySessionStore::new(Duration::minutes(30)));
    let auth = AuthenticationManager::new(db.clone(), db.clone(), sessions.clone(), BCRYPT_COST)
        .expect("authentication manager");
    TestHarness {
        db,
        sessions,
        auth: Arc::new(auth),
    }
}

/// TOTP code for the current time window
pub fn current_code(secret: &str) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock after epoch")
        .as_secs();
    MfaGate::default()
        .generate_code_at(secret, now)
        .expect("valid TOTP secret")
}

/// A well-formed code that is not `code`
pub fn wrong_code(code: &str) -> String {
    code.chars()
        .map(|c| if c == '9' { '0' } else { char::from(c as u8 + 1) })
        .collect()
}
