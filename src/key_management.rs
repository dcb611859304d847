// ABOUTME: RSA signing key lifecycle: load from DER files, generate outside production, publish as JWKS
// ABOUTME: The key pair is built once at startup and injected into token issuance and verification
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Signing Key Management
//!
//! One RSA key pair is active for the lifetime of the process. It is read from
//! two files on startup (PKCS#8 DER private key, X.509 SubjectPublicKeyInfo DER
//! public key); when either file is missing and the environment is not
//! production, a fresh pair is generated and written back. Production startup
//! without key material fails with [`AuthError::KeyUnavailable`].
//!
//! The key id is the RFC 7638 thumbprint of the public key, so it is stable
//! for as long as the key files are.
//!
//! ```rust,no_run
//! use warden::config::{Environment, KeyConfig};
//! use warden::key_management::KeyManager;
//!
//! # fn example() -> Result<(), warden_core::errors::AuthError> {
//! let manager = KeyManager::load_or_generate(&KeyConfig::new("keys", Environment::Development))?;
//! println!("signing with {}", manager.signing_key_pair().kid());
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::io::Write;
use std::path::Path;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{DecodingKey, EncodingKey};
use rand::rngs::OsRng;
use rsa::{
    pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding},
    traits::PublicKeyParts,
    RsaPrivateKey, RsaPublicKey,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use warden_core::errors::AuthError;

use crate::config::KeyConfig;

/// JWK (JSON Web Key) representation for the JWKS endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKey {
    /// Key type (always "RSA")
    pub kty: String,
    /// Public key use (always "sig")
    #[serde(rename = "use")]
    pub key_use: String,
    /// Key ID
    pub kid: String,
    /// Algorithm (RS256)
    pub alg: String,
    /// RSA modulus (base64url encoded)
    pub n: String,
    /// RSA exponent (base64url encoded)
    pub e: String,
}

/// JWKS (JSON Web Key Set) container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonWebKeySet {
    /// Published public keys
    pub keys: Vec<JsonWebKey>,
}

/// Active RSA key pair with its precomputed JWT keys
#[derive(Clone)]
pub struct SigningKeyPair {
    kid: String,
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SigningKeyPair {
    /// Build from a private key, deriving the public half
    ///
    /// # Errors
    /// Returns `KeyUnavailable` if the key cannot be encoded for JWT use
    pub fn from_private_key(private_key: RsaPrivateKey) -> Result<Self, AuthError> {
        let public_key = RsaPublicKey::from(&private_key);
        Self::from_parts(private_key, public_key)
    }

    fn from_parts(private_key: RsaPrivateKey, public_key: RsaPublicKey) -> Result<Self, AuthError> {
        if RsaPublicKey::from(&private_key) != public_key {
            return Err(AuthError::key_unavailable(
                "public key does not belong to the private key",
            ));
        }

        let private_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| AuthError::key_unavailable(format!("private key PEM export: {e}")))?;
        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| AuthError::key_unavailable(format!("encoding key: {e}")))?;

        let public_pem = public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| AuthError::key_unavailable(format!("public key PEM export: {e}")))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| AuthError::key_unavailable(format!("decoding key: {e}")))?;

        Ok(Self {
            kid: thumbprint(&public_key),
            private_key,
            public_key,
            encoding_key,
            decoding_key,
        })
    }

    /// Generate a new key pair
    ///
    /// # Errors
    /// Returns `KeyUnavailable` if key generation fails
    pub fn generate(bits: usize) -> Result<Self, AuthError> {
        let private_key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| AuthError::key_unavailable(format!("RSA key generation: {e}")))?;
        Self::from_private_key(private_key)
    }

    /// Key id placed in the JOSE header of every signed token
    #[must_use]
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Public half
    #[must_use]
    pub const fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// Key for RS256 signing
    #[must_use]
    pub const fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    /// Key for RS256 verification
    #[must_use]
    pub const fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    /// Public key in JWK form
    #[must_use]
    pub fn to_jwk(&self) -> JsonWebKey {
        let (n, e) = encoded_components(&self.public_key);
        JsonWebKey {
            kty: "RSA".to_owned(),
            key_use: "sig".to_owned(),
            kid: self.kid.clone(),
            alg: "RS256".to_owned(),
            n,
            e,
        }
    }

    fn write_der(&self, private_path: &Path, public_path: &Path) -> Result<(), AuthError> {
        let private_der = self
            .private_key
            .to_pkcs8_der()
            .map_err(|e| AuthError::key_unavailable(format!("private key DER export: {e}")))?;
        let public_der = self
            .public_key
            .to_public_key_der()
            .map_err(|e| AuthError::key_unavailable(format!("public key DER export: {e}")))?;

        write_private_file(private_path, private_der.as_bytes())?;
        fs::write(public_path, public_der.as_bytes()).map_err(|e| {
            AuthError::key_unavailable(format!("writing {}: {e}", public_path.display()))
        })
    }
}

impl std::fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeyPair")
            .field("kid", &self.kid)
            .field("bits", &(self.public_key.size() * 8))
            .finish_non_exhaustive()
    }
}

/// Owner of the process-wide signing key pair
#[derive(Debug, Clone)]
pub struct KeyManager {
    key_pair: SigningKeyPair,
}

impl KeyManager {
    /// Load the key pair from disk, generating it when allowed
    ///
    /// # Errors
    /// Returns `KeyUnavailable` when the files are unreadable or malformed, when
    /// writing generated keys fails, or when keys are missing in production
    pub fn load_or_generate(config: &KeyConfig) -> Result<Self, AuthError> {
        let private_path = config.private_key_path();
        let public_path = config.public_key_path();

        if private_path.exists() && public_path.exists() {
            info!(
                private_key = %private_path.display(),
                public_key = %public_path.display(),
                "Loading RSA signing keys"
            );
            let key_pair = load_key_pair(&private_path, &public_path)?;
            info!(kid = %key_pair.kid(), "RSA signing keys loaded");
            return Ok(Self { key_pair });
        }

        if !config.allows_generation() {
            return Err(AuthError::key_unavailable(format!(
                "no key material in {} and key generation is disabled in {}",
                config.keys_dir.display(),
                config.environment
            )));
        }

        warn!(
            keys_dir = %config.keys_dir.display(),
            bits = config.rsa_key_bits,
            "RSA signing keys not found, generating a new pair"
        );
        fs::create_dir_all(&config.keys_dir).map_err(|e| {
            AuthError::key_unavailable(format!(
                "creating keys directory {}: {e}",
                config.keys_dir.display()
            ))
        })?;
        let key_pair = SigningKeyPair::generate(config.rsa_key_bits)?;
        key_pair.write_der(&private_path, &public_path)?;
        info!(kid = %key_pair.kid(), "RSA signing keys generated");

        Ok(Self { key_pair })
    }

    /// Wrap an existing key pair
    #[must_use]
    pub const fn from_key_pair(key_pair: SigningKeyPair) -> Self {
        Self { key_pair }
    }

    /// Active signing key pair
    #[must_use]
    pub const fn signing_key_pair(&self) -> &SigningKeyPair {
        &self.key_pair
    }

    /// Public key set for discovery
    #[must_use]
    pub fn jwks(&self) -> JsonWebKeySet {
        JsonWebKeySet {
            keys: vec![self.key_pair.to_jwk()],
        }
    }
}

fn load_key_pair(private_path: &Path, public_path: &Path) -> Result<SigningKeyPair, AuthError> {
    let read = |path: &Path| {
        fs::read(path)
            .map_err(|e| AuthError::key_unavailable(format!("reading {}: {e}", path.display())))
    };

    let private_der = zeroize::Zeroizing::new(read(private_path)?);
    let public_der = read(public_path)?;

    let private_key = RsaPrivateKey::from_pkcs8_der(&private_der).map_err(|e| {
        AuthError::key_unavailable(format!("malformed private key {}: {e}", private_path.display()))
    })?;
    let public_key = RsaPublicKey::from_public_key_der(&public_der).map_err(|e| {
        AuthError::key_unavailable(format!("malformed public key {}: {e}", public_path.display()))
    })?;

    SigningKeyPair::from_parts(private_key, public_key)
}

fn write_private_file(path: &Path, bytes: &[u8]) -> Result<(), AuthError> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options
        .open(path)
        .and_then(|mut file| file.write_all(bytes))
        .map_err(|e| AuthError::key_unavailable(format!("writing {}: {e}", path.display())))
}

fn encoded_components(public_key: &RsaPublicKey) -> (String, String) {
    (
        URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
        URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
    )
}

/// RFC 7638 JWK thumbprint: members in lexicographic order, no whitespace
fn thumbprint(public_key: &RsaPublicKey) -> String {
    let (n, e) = encoded_components(public_key);
    let canonical = format!(r#"{{"e":"{e}","kty":"RSA","n":"{n}"}}"#);
    URL_SAFE_NO_PAD.encode(Sha256::digest(canonical.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    fn config(dir: &Path, environment: Environment) -> KeyConfig {
        KeyConfig::new(dir, environment)
    }

    #[test]
    fn test_generates_then_reloads_same_kid() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), Environment::Development);

        let generated = KeyManager::load_or_generate(&cfg).unwrap();
        assert!(cfg.private_key_path().exists());
        assert!(cfg.public_key_path().exists());

        let reloaded = KeyManager::load_or_generate(&cfg).unwrap();
        assert_eq!(
            generated.signing_key_pair().kid(),
            reloaded.signing_key_pair().kid()
        );
        assert_eq!(generated.jwks().keys, reloaded.jwks().keys);
    }

    #[test]
    fn test_production_without_keys_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), Environment::Production);

        let err = KeyManager::load_or_generate(&cfg).unwrap_err();
        assert!(matches!(err, AuthError::KeyUnavailable { .. }));
        assert!(!cfg.private_key_path().exists());
    }

    #[test]
    fn test_production_without_keys_leaves_no_directory() {
        let dir = tempfile::tempdir().unwrap();
        let keys_dir = dir.path().join("keys");
        let cfg = config(&keys_dir, Environment::Production);

        let err = KeyManager::load_or_generate(&cfg).unwrap_err();
        assert!(matches!(err, AuthError::KeyUnavailable { .. }));
        assert!(!keys_dir.exists());
    }

    #[test]
    fn test_generation_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let keys_dir = dir.path().join("nested").join("keys");
        let cfg = config(&keys_dir, Environment::Development);

        KeyManager::load_or_generate(&cfg).unwrap();
        assert!(cfg.private_key_path().exists());
        assert!(cfg.public_key_path().exists());
    }

    #[test]
    fn test_malformed_key_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), Environment::Development);
        fs::write(cfg.private_key_path(), b"not a key").unwrap();
        fs::write(cfg.public_key_path(), b"not a key either").unwrap();

        let err = KeyManager::load_or_generate(&cfg).unwrap_err();
        assert!(matches!(err, AuthError::KeyUnavailable { .. }));
    }

    #[test]
    fn test_jwk_shape() {
        let dir = tempfile::tempdir().unwrap();
        let manager =
            KeyManager::load_or_generate(&config(dir.path(), Environment::Testing)).unwrap();
        let jwks = manager.jwks();
        assert_eq!(jwks.keys.len(), 1);
        let jwk = &jwks.keys[0];
        assert_eq!(jwk.kty, "RSA");
        assert_eq!(jwk.key_use, "sig");
        assert_eq!(jwk.alg, "RS256");
        assert_eq!(jwk.e, "AQAB");
        assert_eq!(jwk.kid, manager.signing_key_pair().kid());
        assert!(!jwk.n.contains('='));
    }
}
