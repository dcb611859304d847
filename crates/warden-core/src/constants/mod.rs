// ABOUTME: Application constants for credential policy, authorities, TOTP and token claims
// ABOUTME: Shared between the authentication state machine and the token issuer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants grouped by the concern that owns them

/// Primary credential policy
pub mod credentials {
    /// Failed attempts at which an account is treated as locked
    pub const MAX_LOGIN_ATTEMPTS: i64 = 5;

    /// bcrypt cost factor used for stored password hashes
    pub const BCRYPT_COST: u32 = 12;
}

/// Authority names injected into sessions and tokens
pub mod authorities {
    /// Authority carried by a session that has not finished the second factor
    pub const ANONYMOUS: &str = "ROLE_ANONYMOUS";

    /// Authority gating access to the second-factor verification step
    pub const MFA_REQUIRED: &str = "MFA_REQUIRED";

    /// Separator used by the stored authority list and the token claim
    pub const SEPARATOR: char = ',';
}

/// Time-based one-time password parameters (RFC 6238 defaults)
pub mod totp {
    /// Code length
    pub const DIGITS: usize = 6;

    /// Time step in seconds
    pub const STEP_SECONDS: u64 = 30;

    /// Accepted clock drift, in steps, either side of the current window
    pub const SKEW: u8 = 1;
}

/// OAuth2 token constants
pub mod tokens {
    /// Custom access-token claim holding the comma-joined authorities
    pub const AUTHORITIES_CLAIM: &str = "authorities";

    /// Random bytes in an opaque refresh token (256 bits)
    pub const REFRESH_TOKEN_BYTES: usize = 32;

    /// Token type advertised in token responses
    pub const BEARER: &str = "Bearer";
}

/// OAuth2 request parameter names and values
pub mod oauth2_params {
    /// `grant_type` form parameter
    pub const GRANT_TYPE: &str = "grant_type";

    /// `client_id` form parameter
    pub const CLIENT_ID: &str = "client_id";

    /// Refresh token grant type value
    pub const REFRESH_TOKEN_GRANT: &str = "refresh_token";
}

/// Signing key defaults
pub mod keys {
    /// RSA modulus size for generated keys
    pub const RSA_KEY_BITS: usize = 2048;

    /// Default directory holding the key files
    pub const DEFAULT_KEYS_DIR: &str = "keys";

    /// Default PKCS#8 DER private key file name
    pub const DEFAULT_PRIVATE_KEY_FILE: &str = "private.key";

    /// Default X.509 SubjectPublicKeyInfo DER public key file name
    pub const DEFAULT_PUBLIC_KEY_FILE: &str = "public.key";
}

/// Service identity
pub mod service_names {
    /// Service name used in structured logs
    pub const WARDEN: &str = "warden";

    /// Default token issuer
    pub const DEFAULT_ISSUER: &str = "http://localhost:8090";
}

/// Session handling
pub mod session {
    /// Cookie carrying the session identifier
    pub const COOKIE_NAME: &str = "WARDEN_SESSION";

    /// Idle session lifetime in seconds
    pub const DEFAULT_TTL_SECS: i64 = 1800;

    /// Random bytes in a session identifier
    pub const ID_BYTES: usize = 32;
}
