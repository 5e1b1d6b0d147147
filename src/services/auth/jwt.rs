use crate::error::{AppError, AppResult};
use crate::models::auth_jwt_claims::{Claims, ClaimsValidationError};
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use log::{debug, error, info, trace};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

/// Algorithm used for every token this service signs.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::RS256;

// Verification is pinned to the RSA family; HMAC and EC headers are refused
// before any key is touched.
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::RS256, Algorithm::RS384, Algorithm::RS512];

/// RSA key pair used to sign and verify tokens.
///
/// Loaded once at startup and shared read-only (behind an `Arc`) by every
/// request afterwards; it is passed explicitly to whoever needs it.
#[derive(Clone)]
pub struct JwtKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys").finish_non_exhaustive()
    }
}

impl JwtKeys {
    /// Parse a PEM encoded RSA private/public key pair.
    pub fn from_pem(private_pem: &[u8], public_pem: &[u8]) -> AppResult<Self> {
        if private_pem.is_empty() || public_pem.is_empty() {
            return Err(AppError::SigningKeyUnavailable("empty key material".to_string()));
        }

        let encoding_key = EncodingKey::from_rsa_pem(private_pem).map_err(|e| {
            error!("Error parsing JWT private key: {}", e);
            AppError::SigningKeyUnavailable(format!("invalid private key: {}", e))
        })?;

        let decoding_key = DecodingKey::from_rsa_pem(public_pem).map_err(|e| {
            error!("Error parsing JWT public key: {}", e);
            AppError::SigningKeyUnavailable(format!("invalid public key: {}", e))
        })?;

        Ok(Self { encoding_key, decoding_key })
    }

    /// Read and parse the key pair from disk.
    /// This should be called once at application startup
    pub fn from_pem_files(private_key_path: &Path, public_key_path: &Path) -> AppResult<Self> {
        info!(
            "Loading JWT keys (private: {}, public: {})",
            private_key_path.display(),
            public_key_path.display()
        );

        let private_pem = fs::read(private_key_path).map_err(|e| {
            error!("Error loading JWT private key file: {}", e);
            AppError::SigningKeyUnavailable(format!("{}: {}", private_key_path.display(), e))
        })?;
        let public_pem = fs::read(public_key_path).map_err(|e| {
            error!("Error loading JWT public key file: {}", e);
            AppError::SigningKeyUnavailable(format!("{}: {}", public_key_path.display(), e))
        })?;

        let keys = Self::from_pem(&private_pem, &public_pem)?;
        info!("JWT keys initialized successfully");
        Ok(keys)
    }

    /// Sign claims into a compact JWT.
    pub fn sign(&self, claims: &Claims) -> AppResult<String> {
        let header = Header::new(SIGNING_ALGORITHM);

        encode(&header, claims, &self.encoding_key).map_err(|e| {
            error!("Failed to sign {} for user {}: {}", claims.token_type, claims.user_id, e);
            AppError::Signing(e.to_string())
        })
    }

    /// Check signature, validity window and required claims.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let claims = self.decode_signed(token)?;
        claims.validate().map_err(AppError::from)?;

        debug!("Valid {} for user {}", claims.token_type, claims.user_id);
        Ok(claims)
    }

    /// Like [`JwtKeys::verify`] but tolerates an elapsed `exp`. Only the
    /// refresh flow reads access tokens this way.
    pub fn verify_allowing_expiry(&self, token: &str) -> AppResult<Claims> {
        let claims = self.decode_signed(token)?;
        claims
            .validate_ignoring_expiry_at(Utc::now().timestamp())
            .map_err(AppError::from)?;
        Ok(claims)
    }

    fn decode_signed(&self, token: &str) -> AppResult<Claims> {
        trace!("Verifying JWT signature");

        decode::<Claims>(token, &self.decoding_key, &validation())
            .map(|data| data.claims)
            .map_err(|err| {
                debug!("JWT decoding failed: {}", err);
                match err.kind() {
                    ErrorKind::InvalidToken
                    | ErrorKind::Base64(_)
                    | ErrorKind::Json(_)
                    | ErrorKind::Utf8(_) => AppError::MalformedToken(err.to_string()),
                    ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                    ErrorKind::ImmatureSignature => AppError::NotYetValidToken,
                    _ => AppError::InvalidSignature,
                }
            })
    }
}

// Temporal and audience rules live in `Claims` and the authorization gate,
// so the library only checks algorithm and signature.
fn validation() -> Validation {
    let mut validation = Validation::new(SIGNING_ALGORITHM);
    validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();
    validation
}

impl From<ClaimsValidationError> for AppError {
    fn from(err: ClaimsValidationError) -> Self {
        match err {
            ClaimsValidationError::Expired => AppError::ExpiredToken,
            ClaimsValidationError::NotYetValid => AppError::NotYetValidToken,
            ClaimsValidationError::Malformed(_) => AppError::MalformedToken(err.to_string()),
        }
    }
}
