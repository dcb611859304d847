// ABOUTME: Authentication of public clients presenting a refresh-token grant
// ABOUTME: Recognises refresh-token requests and checks the client is registered for method `none`
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use warden_core::constants::oauth2_params::{CLIENT_ID, GRANT_TYPE, REFRESH_TOKEN_GRANT};
use warden_core::errors::{AuthError, ClientRejection};
use warden_core::models::{ClientAuthenticationMethod, RegisteredClient};

use crate::database_plugins::ClientRegistry;
use crate::logging::AppLogger;

/// Refresh-token grant presented by a public client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRefreshTokenRequest {
    /// Presented `client_id`
    pub client_id: String,
    /// Presented authentication method, always `none` when built from form parameters
    pub method: String,
    /// Remaining request parameters, passed through untouched
    pub additional_parameters: HashMap<String, String>,
}

impl ClientRefreshTokenRequest {
    /// Recognise a public-client refresh-token request
    ///
    /// Returns `None` for any other grant type, or when `client_id` is missing
    /// or blank, so the request can be passed on to regular processing.
    #[must_use]
    pub fn from_params(params: &HashMap<String, String>) -> Option<Self> {
        if params.get(GRANT_TYPE).map(String::as_str) != Some(REFRESH_TOKEN_GRANT) {
            return None;
        }

        let client_id = params.get(CLIENT_ID)?.trim();
        if client_id.is_empty() {
            return None;
        }

        let additional_parameters = params
            .iter()
            .filter(|(key, _)| key.as_str() != GRANT_TYPE && key.as_str() != CLIENT_ID)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Some(Self {
            client_id: client_id.to_owned(),
            method: ClientAuthenticationMethod::None.as_str().to_owned(),
            additional_parameters,
        })
    }
}

/// Validates public clients on the refresh-token path
pub struct ClientAuthenticator {
    clients: Arc<dyn ClientRegistry>,
}

impl ClientAuthenticator {
    /// Create an authenticator over `clients`
    #[must_use]
    pub fn new(clients: Arc<dyn ClientRegistry>) -> Self {
        Self { clients }
    }

    /// Authenticate a presented client id and authentication method
    ///
    /// Rules in order: the method must be `none`, the client must exist, and
    /// the client must be registered for method `none`.
    ///
    /// # Errors
    ///
    /// `InvalidClient` when any rule fails, `Storage` when the registry fails
    pub async fn authenticate(
        &self,
        client_id: &str,
        method: &str,
    ) -> Result<RegisteredClient, AuthError> {
        if method != ClientAuthenticationMethod::None.as_str() {
            return Err(reject(client_id, ClientRejection::AuthenticationMethod));
        }

        let Some(client) = self.clients.find_by_client_id(client_id).await? else {
            return Err(reject(client_id, ClientRejection::UnknownClient));
        };

        if !client.supports_method(ClientAuthenticationMethod::None) {
            return Err(reject(client_id, ClientRejection::AuthenticationMethod));
        }

        debug!(client_id = %client.client_id, "public client authenticated");
        Ok(client)
    }

    /// Authenticate a recognised refresh-token request
    ///
    /// # Errors
    ///
    /// Same as [`ClientAuthenticator::authenticate`]
    pub async fn authenticate_request(
        &self,
        request: &ClientRefreshTokenRequest,
    ) -> Result<RegisteredClient, AuthError> {
        self.authenticate(&request.client_id, &request.method).await
    }
}

fn reject(client_id: &str, reason: ClientRejection) -> AuthError {
    AppLogger::log_security_event(
        "client_authentication_failure",
        "medium",
        &format!("client '{client_id}': {reason}"),
        None,
    );
    AuthError::InvalidClient { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use warden_core::models::{AuthorizationGrantType, TokenSettings};

    use crate::database_plugins::StorageResult;

    struct StaticRegistry(Vec<RegisteredClient>);

    #[async_trait]
    impl ClientRegistry for StaticRegistry {
        async fn find_by_client_id(
            &self,
            client_id: &str,
        ) -> StorageResult<Option<RegisteredClient>> {
            Ok(self.0.iter().find(|c| c.client_id == client_id).cloned())
        }
    }

    fn client(client_id: &str, method: ClientAuthenticationMethod) -> RegisteredClient {
        RegisteredClient {
            id: format!("reg-{client_id}"),
            client_id: client_id.to_owned(),
            client_name: None,
            authentication_methods: vec![method],
            grant_types: vec![AuthorizationGrantType::RefreshToken],
            redirect_uris: Vec::new(),
            scopes: Vec::new(),
            token_settings: TokenSettings::default(),
        }
    }

    fn authenticator() -> ClientAuthenticator {
        ClientAuthenticator::new(Arc::new(StaticRegistry(vec![
            client("spa", ClientAuthenticationMethod::None),
            client("backend", ClientAuthenticationMethod::ClientSecretBasic),
        ])))
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[tokio::test]
    async fn test_rules_in_order() {
        let auth = authenticator();
        assert_eq!(auth.authenticate("spa", "none").await.unwrap().client_id, "spa");

        let err = auth.authenticate("spa", "client_secret_basic").await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::InvalidClient { reason: ClientRejection::AuthenticationMethod }
        ));

        let err = auth.authenticate("nobody", "none").await.unwrap_err();
        assert_eq!(err.to_string(), "Client is not valid");

        let err = auth.authenticate("backend", "none").await.unwrap_err();
        assert_eq!(err.to_string(), "Authentication method is not valid");
    }

    #[test]
    fn test_from_params_recognises_refresh_grant() {
        let request = ClientRefreshTokenRequest::from_params(&params(&[
            ("grant_type", "refresh_token"),
            ("client_id", "spa"),
            ("refresh_token", "opaque"),
        ]))
        .unwrap();
        assert_eq!(request.client_id, "spa");
        assert_eq!(request.method, "none");
        assert_eq!(request.additional_parameters.len(), 1);
        assert_eq!(request.additional_parameters["refresh_token"], "opaque");
    }

    #[test]
    fn test_from_params_passes_other_requests_through() {
        assert!(ClientRefreshTokenRequest::from_params(&params(&[
            ("grant_type", "authorization_code"),
            ("client_id", "spa"),
        ]))
        .is_none());
        assert!(ClientRefreshTokenRequest::from_params(&params(&[
            ("grant_type", "refresh_token"),
            ("client_id", "  "),
        ]))
        .is_none());
        assert!(ClientRefreshTokenRequest::from_params(&params(&[("client_id", "spa")])).is_none());
    }
}
