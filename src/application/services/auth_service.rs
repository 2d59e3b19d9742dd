//! Link password hashing and admin key authentication.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::domain::errors::LinkError;
use crate::error::AppError;
use crate::utils::id_generator::random_sequence;
use serde_json::json;

type HmacSha256 = Hmac<Sha256>;

/// Length of the random salt prefixed to every password hash.
const SALT_LENGTH: usize = 16;

/// Service for link password hashes and admin Bearer keys.
///
/// Both are HMAC-SHA256 digests keyed by `signing_secret`. Password hashes are
/// stored as `salt$hex`; comparisons use [`Mac::verify_slice`], which runs in
/// constant time.
pub struct AuthService {
    signing_secret: String,
    admin_key_digest: Vec<u8>,
}

impl AuthService {
    /// Creates a new authentication service.
    ///
    /// # Arguments
    ///
    /// - `signing_secret` - HMAC key; must stay the same for existing password hashes to verify
    /// - `admin_api_key` - raw key expected in `Authorization: Bearer` on admin routes
    pub fn new(signing_secret: String, admin_api_key: &str) -> Self {
        let admin_key_digest = mac(&signing_secret, &[admin_api_key.as_bytes()])
            .finalize()
            .into_bytes()
            .to_vec();

        Self {
            signing_secret,
            admin_key_digest,
        }
    }

    /// Hashes a link password with a fresh random salt.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::EntropyUnavailable`] if no salt can be drawn.
    pub fn hash_password(&self, password: &str) -> Result<String, LinkError> {
        let salt = random_sequence(SALT_LENGTH)?;
        let digest = mac(&self.signing_secret, &[salt.as_bytes(), password.as_bytes()])
            .finalize()
            .into_bytes();
        Ok(format!("{salt}${}", hex::encode(digest)))
    }

    /// Checks a password against a hash from [`Self::hash_password`].
    ///
    /// Malformed hashes never verify.
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        let Some((salt, hex_digest)) = hash.split_once('$') else {
            return false;
        };
        let Ok(expected) = hex::decode(hex_digest) else {
            return false;
        };

        mac(&self.signing_secret, &[salt.as_bytes(), password.as_bytes()])
            .verify_slice(&expected)
            .is_ok()
    }

    /// Authenticates a raw admin key.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the key does not match.
    pub fn authenticate_admin(&self, token: &str) -> Result<(), AppError> {
        mac(&self.signing_secret, &[token.as_bytes()])
            .verify_slice(&self.admin_key_digest)
            .map_err(|_| {
                AppError::unauthorized("Unauthorized", json!({"reason": "Invalid admin key"}))
            })
    }
}

fn mac(secret: &str, parts: &[&[u8]]) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    for part in parts {
        mac.update(part);
    }
    mac
}
