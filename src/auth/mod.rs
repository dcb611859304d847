// ABOUTME: Authentication manager composing credential checks, the second-factor gate and sessions
// ABOUTME: Exposes login, MFA verification, logout and public-client authentication operations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Authentication
//!
//! Login runs in two steps. [`CredentialAuthenticator`] checks the password
//! and account status, then [`MfaGate`] decides whether the session completes
//! immediately or waits for a TOTP code. The resulting
//! [`AuthenticationState`] is stored under a fresh [`SessionId`].

/// Primary credential verification and lockout accounting
pub mod credentials;
/// Second-factor decision and TOTP verification
pub mod mfa;
/// Per-session authentication state machine
pub mod state;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};
use warden_core::errors::AuthError;
use warden_core::models::{LoginDevice, RegisteredClient};

pub use credentials::CredentialAuthenticator;
pub use mfa::MfaGate;
pub use state::{AuthenticatedPrincipal, AuthenticationStage, AuthenticationState, MfaPending};

use crate::database_plugins::{ClientRegistry, IdentityStore};
use crate::logging::{AppLogger, AuthEvent};
use crate::oauth2_server::client_auth::{ClientAuthenticator, ClientRefreshTokenRequest};
use crate::session::{SessionId, SessionStore};

/// A stored login session
#[derive(Debug, Clone)]
pub struct Session {
    /// Identifier handed to the client
    pub id: SessionId,
    /// State stored under `id`
    pub state: AuthenticationState,
}

/// Inbound authentication attempt
pub enum LoginRequest {
    /// Username and password submitted by a browser
    PasswordLogin {
        /// Login email
        username: String,
        /// Presented password
        password: String,
        /// Where the login came from
        device: LoginDevice,
    },
    /// Refresh-token grant from a public client
    ClientRefreshLogin(ClientRefreshTokenRequest),
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PasswordLogin {
                username, device, ..
            } => f
                .debug_struct("PasswordLogin")
                .field("username", username)
                .field("device", device)
                .finish_non_exhaustive(),
            Self::ClientRefreshLogin(request) => f
                .debug_tuple("ClientRefreshLogin")
                .field(&request.client_id)
                .finish(),
        }
    }
}

/// Result of [`AuthenticationManager::authenticate_request`]
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    /// Password login stored as a session
    Session(Session),
    /// Public client accepted for the refresh-token grant
    Client(RegisteredClient),
}

/// Entry point for every authentication operation
pub struct AuthenticationManager {
    credentials: CredentialAuthenticator,
    mfa: MfaGate,
    identities: Arc<dyn IdentityStore>,
    sessions: Arc<dyn SessionStore>,
    clients: ClientAuthenticator,
}

impl AuthenticationManager {
    /// Compose the manager from its stores
    ///
    /// # Errors
    ///
    /// Returns an error if `bcrypt_cost` is outside bcrypt's accepted range
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        clients: Arc<dyn ClientRegistry>,
        sessions: Arc<dyn SessionStore>,
        bcrypt_cost: u32,
    ) -> Result<Self, bcrypt::BcryptError> {
        Ok(Self {
            credentials: CredentialAuthenticator::new(Arc::clone(&identities), bcrypt_cost)?,
            mfa: MfaGate::default(),
            identities,
            sessions,
            clients: ClientAuthenticator::new(clients),
        })
    }

    /// Verify a password login and store the resulting state under a new session
    ///
    /// The session either completes immediately or waits for a second factor.
    ///
    /// # Errors
    ///
    /// Any primary authentication failure, or `Storage` if the session cannot be saved
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
        device: &LoginDevice,
    ) -> Result<Session, AuthError> {
        let identity = self.credentials.authenticate(username, password).await?;
        let user_uuid = identity.user_uuid;

        if let Err(e) = self.identities.add_login_device(user_uuid, device).await {
            warn!(%user_uuid, "failed to record login device: {e}");
        }

        let state = self.mfa.evaluate(&identity);
        if state.is_mfa_pending() {
            AppLogger::log_auth_event(&user_uuid.to_string(), AuthEvent::MfaChallenge, None);
        }

        let id = SessionId::generate();
        self.sessions.save(&id, state.clone()).await?;
        debug!(session = ?id, stage = ?state.stage(), "session stored");

        Ok(Session { id, state })
    }

    /// Complete a pending login with a TOTP code
    ///
    /// On success the stored state is replaced by the fully authenticated one.
    /// On failure the session stays pending.
    ///
    /// # Errors
    ///
    /// - `AuthenticationRequired` if the session has not passed primary authentication
    /// - `MfaNotPending` if the session is already fully authenticated
    /// - `InvalidMfaCode` if the code does not match
    pub async fn verify_mfa(
        &self,
        session_id: &SessionId,
        code: &str,
    ) -> Result<AuthenticatedPrincipal, AuthError> {
        let pending = match self.sessions.load(session_id).await? {
            AuthenticationState::MfaPending(pending) => pending,
            AuthenticationState::FullyAuthenticated(_) => return Err(AuthError::MfaNotPending),
            AuthenticationState::Unauthenticated | AuthenticationState::PrimaryVerified(_) => {
                return Err(AuthError::AuthenticationRequired)
            }
        };

        let user_uuid = pending.user_uuid();
        let secret = self
            .identities
            .find_by_uuid(user_uuid)
            .await?
            .and_then(|identity| identity.totp_secret);

        if !secret.is_some_and(|secret| self.mfa.verify_code(&secret, code)) {
            AppLogger::log_auth_event(&user_uuid.to_string(), AuthEvent::MfaFailure, None);
            return Err(AuthError::InvalidMfaCode);
        }

        let principal = pending.promote();
        self.sessions
            .save(
                session_id,
                AuthenticationState::FullyAuthenticated(principal.clone()),
            )
            .await?;

        AppLogger::log_auth_event(&user_uuid.to_string(), AuthEvent::MfaSuccess, None);
        Ok(principal)
    }

    /// Current state of a session
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the session store fails
    pub async fn session_state(
        &self,
        session_id: &SessionId,
    ) -> Result<AuthenticationState, AuthError> {
        Ok(self.sessions.load(session_id).await?)
    }

    /// Discard a session entirely
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the session store fails
    pub async fn logout(&self, session_id: &SessionId) -> Result<(), AuthError> {
        let state = self.sessions.load(session_id).await?;
        self.sessions.remove(session_id).await?;
        if let Some(name) = state.principal_name() {
            AppLogger::log_auth_event(name, AuthEvent::Logout, None);
        }
        Ok(())
    }

    /// Authenticate a public client on the refresh-token path
    ///
    /// # Errors
    ///
    /// `InvalidClient` if the method is not `none`, the client is unknown, or
    /// the client is not registered for method `none`
    pub async fn authenticate_refresh_client(
        &self,
        client_id: &str,
        method: &str,
    ) -> Result<RegisteredClient, AuthError> {
        self.clients.authenticate(client_id, method).await
    }

    /// Dispatch any inbound authentication attempt
    ///
    /// # Errors
    ///
    /// Whatever the matching operation returns
    pub async fn authenticate_request(
        &self,
        request: LoginRequest,
    ) -> Result<LoginOutcome, AuthError> {
        match request {
            LoginRequest::PasswordLogin {
                username,
                password,
                device,
            } => {
                let password = zeroize::Zeroizing::new(password);
                self.authenticate(&username, &password, &device)
                    .await
                    .map(LoginOutcome::Session)
            }
            LoginRequest::ClientRefreshLogin(request) => self
                .clients
                .authenticate_request(&request)
                .await
                .map(LoginOutcome::Client),
        }
    }
}
