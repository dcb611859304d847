// ABOUTME: HTTP adapter exposing login, second-factor verification, logout and JWKS endpoints
// ABOUTME: Tracks login sessions through an HttpOnly cookie and renders errors as JSON bodies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! HTTP routes for the interactive login flow
//!
//! Handlers are thin wrappers over [`AuthenticationManager`]; failures become
//! [`AppError`] responses carrying the stable error code and HTTP status.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use warden_core::constants::session::COOKIE_NAME;
use warden_core::errors::{AppError, AuthError};

use crate::auth::{AuthenticatedPrincipal, AuthenticationManager, AuthenticationState};
use crate::key_management::{JsonWebKeySet, KeyManager};
use crate::session::SessionId;
use crate::utils::user_agent::login_device;

/// Shared state of the HTTP adapter
#[derive(Clone)]
pub struct AppState {
    /// Authentication operations
    pub auth: Arc<AuthenticationManager>,
    /// Signing keys published through JWKS
    pub keys: Arc<KeyManager>,
    /// Whether the session cookie carries the `Secure` attribute
    pub secure_cookies: bool,
}

/// Login form
#[derive(Deserialize)]
pub struct LoginForm {
    /// Login email
    pub username: String,
    /// Password
    pub password: String,
}

/// Second-factor form
#[derive(Debug, Deserialize)]
pub struct MfaForm {
    /// Six-digit TOTP code
    pub code: String,
}

/// Second-factor prompt
#[derive(Debug, Serialize)]
pub struct MfaPrompt {
    /// Email of the pending login
    pub email: String,
}

/// Build the adapter router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/mfa", get(mfa_prompt).post(verify_mfa))
        .route("/logout", post(logout))
        .route("/.well-known/jwks.json", get(jwks))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

fn session_cookie(id: &SessionId, secure: bool) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, id.as_str().to_owned()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

fn session_id(jar: &CookieJar) -> Result<SessionId, AppError> {
    jar.get(COOKIE_NAME)
        .map(|cookie| SessionId::from_client(cookie.value()))
        .ok_or_else(|| AuthError::AuthenticationRequired.into())
}

async fn login(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Json<AuthenticationState>), AppError> {
    let device = login_device(&headers, peer.map(|ConnectInfo(addr)| addr));
    let session = state
        .auth
        .authenticate(&form.username, &form.password, &device)
        .await?;

    // A fresh login replaces whatever session the browser carried
    if let Ok(previous) = session_id(&jar) {
        state.auth.logout(&previous).await?;
    }

    let jar = jar.add(session_cookie(&session.id, state.secure_cookies));
    Ok((jar, Json(session.state)))
}

async fn mfa_prompt(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<MfaPrompt>, AppError> {
    let id = session_id(&jar)?;
    match state.auth.session_state(&id).await? {
        AuthenticationState::MfaPending(pending) => Ok(Json(MfaPrompt {
            email: pending.email().to_owned(),
        })),
        AuthenticationState::FullyAuthenticated(_) => Err(AuthError::MfaNotPending.into()),
        AuthenticationState::Unauthenticated | AuthenticationState::PrimaryVerified(_) => {
            Err(AuthError::AuthenticationRequired.into())
        }
    }
}

async fn verify_mfa(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<MfaForm>,
) -> Result<Json<AuthenticatedPrincipal>, AppError> {
    let id = session_id(&jar)?;
    let principal = state.auth.verify_mfa(&id, &form.code).await?;
    Ok(Json(principal))
}

async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), AppError> {
    if let Ok(id) = session_id(&jar) {
        state.auth.logout(&id).await?;
    }
    let jar = jar.remove(Cookie::build(COOKIE_NAME).path("/"));
    Ok((jar, StatusCode::NO_CONTENT))
}

async fn jwks(State(state): State<AppState>) -> Json<JsonWebKeySet> {
    Json(state.keys.jwks())
}
