// ABOUTME: Integration tests for public-client authentication on the refresh-token grant
// ABOUTME: Runs the three client rules against clients stored in the SQLite registry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{client, create_test_harness, public_client};
use warden::errors::{AppError, AuthError, ClientRejection, ErrorCode};
use warden::models::{AuthorizationGrantType, ClientAuthenticationMethod};
use warden::oauth2_server::OAuth2Error;

#[tokio::test]
async fn test_known_public_client_is_accepted() {
    let harness = create_test_harness().await;
    harness
        .db
        .register_client(&public_client("known-client"))
        .await
        .unwrap();

    let registered = harness
        .auth
        .authenticate_refresh_client("known-client", "none")
        .await
        .unwrap();
    assert_eq!(registered.client_id, "known-client");
    assert!(registered.supports_grant(AuthorizationGrantType::RefreshToken));
}

#[tokio::test]
async fn test_other_methods_are_rejected_before_lookup() {
    let harness = create_test_harness().await;
    harness
        .db
        .register_client(&public_client("known-client"))
        .await
        .unwrap();

    for method in ["client_secret_basic", "client_secret_post", "private_key_jwt", ""] {
        let err = harness
            .auth
            .authenticate_refresh_client("known-client", method)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::InvalidClient {
                reason: ClientRejection::AuthenticationMethod
            }
        ));
    }

    // Method is checked first, so an unknown client reports the method
    let err = harness
        .auth
        .authenticate_refresh_client("unknown-client", "client_secret_basic")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Authentication method is not valid");
}

#[tokio::test]
async fn test_unknown_client_is_rejected() {
    let harness = create_test_harness().await;
    let err = harness
        .auth
        .authenticate_refresh_client("unknown-client", "none")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AuthError::InvalidClient {
            reason: ClientRejection::UnknownClient
        }
    ));
    assert_eq!(err.oauth2_error_code(), Some("invalid_client"));
    assert_eq!(OAuth2Error::from(&err).error, "invalid_client");

    let app_error = AppError::from(err);
    assert_eq!(app_error.code, ErrorCode::ClientInvalid);
    assert_eq!(app_error.http_status(), 401);
}

#[tokio::test]
async fn test_confidential_client_cannot_use_method_none() {
    let harness = create_test_harness().await;
    harness
        .db
        .register_client(&client(
            "backend",
            vec![ClientAuthenticationMethod::ClientSecretBasic],
            vec![AuthorizationGrantType::RefreshToken],
        ))
        .await
        .unwrap();

    let err = harness
        .auth
        .authenticate_refresh_client("backend", "none")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AuthError::InvalidClient {
            reason: ClientRejection::AuthenticationMethod
        }
    ));
}
