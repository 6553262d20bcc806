//! Bearer token issuance and verification.
//!
//! Tokens are HS256 JWTs carrying the username as `sub`. They are stateless: nothing is
//! persisted and a token stays valid until `exp`.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};

use crate::{config::Config, errors::Error};

/// Lifetime used when a token is minted without an explicit duration.
pub const DEFAULT_TOKEN_EXPIRY: Duration = Duration::from_secs(15 * 60);

/// JWT access token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String, // Subject (username)
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
}

#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    expiry: Duration,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService").field("expiry", &self.expiry).finish_non_exhaustive()
    }
}

impl TokenService {
    /// `expiry` is the lifetime of tokens handed out by [`issue`](Self::issue).
    pub fn new(secret: &str, expiry: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let secret_key = config.secret_key.as_deref().ok_or_else(|| Error::Internal {
            operation: "create token service: secret_key is required".to_string(),
        })?;
        Ok(Self::new(secret_key, config.auth.token_expiry))
    }

    /// Mint a token for `subject` with the configured lifetime.
    pub fn issue(&self, subject: &str) -> Result<String, Error> {
        self.create_access_token(subject, Some(self.expiry))
    }

    /// Mint a token for `subject`, valid for `expires_in` or [`DEFAULT_TOKEN_EXPIRY`].
    pub fn create_access_token(&self, subject: &str, expires_in: Option<Duration>) -> Result<String, Error> {
        let now = Utc::now();
        let lifetime = chrono::Duration::from_std(expires_in.unwrap_or(DEFAULT_TOKEN_EXPIRY)).map_err(|e| Error::Internal {
            operation: format!("compute token expiry: {e}"),
        })?;
        let claims = AccessClaims {
            sub: subject.to_string(),
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| Error::Internal {
            operation: format!("create JWT: {e}"),
        })
    }

    /// Verify signature and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<AccessClaims, Error> {
        let token_data = decode::<AccessClaims>(token, &self.decoding, &self.validation).map_err(|e| match e.kind() {
            // Client errors (401): anything wrong with the token the caller sent
            ErrorKind::InvalidToken
            | ErrorKind::InvalidSignature
            | ErrorKind::ExpiredSignature
            | ErrorKind::MissingRequiredClaim(_)
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience
            | ErrorKind::InvalidSubject
            | ErrorKind::ImmatureSignature
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_)
            | ErrorKind::InvalidAlgorithm => Error::invalid_token(),

            // Server errors (500): key issues, internal failures
            ErrorKind::InvalidEcdsaKey
            | ErrorKind::InvalidRsaKey(_)
            | ErrorKind::RsaFailedSigning
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::InvalidKeyFormat
            | ErrorKind::MissingAlgorithm
            | ErrorKind::Crypto(_) => Error::Internal {
                operation: format!("JWT verification: {e}"),
            },

            _ => Error::Internal {
                operation: format!("JWT verification (unknown error): {e}"),
            },
        })?;

        Ok(token_data.claims)
    }
}
