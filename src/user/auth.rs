//! Password hashing and token issuance.

use super::error::{UserError, UserResult};
use super::user_models::User;
use serde::{Deserialize, Serialize};
use std::time::Duration;

mod library_argon2 {
    use anyhow::{anyhow, Result};
    use argon2::{
        password_hash::{
            rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        },
        Algorithm, Argon2, Params, Version,
    };

    const ITERATIONS: u32 = 2;
    const PARALLELISM: u32 = 1;

    fn argon2(memory_kib: u32) -> Result<Argon2<'static>> {
        let params = Params::new(memory_kib, ITERATIONS, PARALLELISM, None)
            .map_err(|err| anyhow!("{}", err))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Hashes `plain` with a fresh salt, returning a PHC string.
    pub fn hash(plain: &[u8], memory_kib: u32) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = argon2(memory_kib)?
            .hash_password(plain, &salt)
            .map_err(|err| anyhow!("{}", err))?
            .to_string();
        Ok(hash)
    }

    /// Parameters are read back from the PHC string, so hashes made with a
    /// different memory cost still verify.
    pub fn verify(plain: &[u8], target_hash: &str) -> Result<bool> {
        let password_hash = PasswordHash::new(target_hash).map_err(|err| anyhow!("{}", err))?;
        Ok(Argon2::default()
            .verify_password(plain, &password_hash)
            .is_ok())
    }
}

pub const DEFAULT_HASH_MEMORY_KIB: u32 = 19456;

#[derive(Clone, Debug)]
pub struct CredentialsHasher {
    memory_kib: u32,
}

impl Default for CredentialsHasher {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_MEMORY_KIB)
    }
}

impl CredentialsHasher {
    pub fn new(memory_kib: u32) -> Self {
        Self { memory_kib }
    }

    pub fn hash(&self, plain: &str) -> UserResult<String> {
        library_argon2::hash(plain.as_bytes(), self.memory_kib)
            .map_err(|err| UserError::Hashing(err.to_string()))
    }

    /// A malformed stored hash never verifies.
    pub fn verify(&self, plain: &str, target_hash: &str) -> bool {
        library_argon2::verify(plain.as_bytes(), target_hash).unwrap_or(false)
    }
}

// =============================================================================
// Tokens
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub login: String,
    /// Expiry, seconds since the Unix epoch.
    pub exp: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

/// Signs and checks HS256 tokens. Access and refresh tokens use separate
/// secrets, so one can never be accepted as the other.
#[derive(Clone)]
pub struct TokenIssuer {
    settings: TokenSettings,
}

impl TokenIssuer {
    pub fn new(settings: TokenSettings) -> Self {
        Self { settings }
    }

    fn sign(user: &User, secret: &str, ttl: Duration) -> UserResult<String> {
        let claims = Claims {
            user_id: user.id.to_string(),
            login: user.login.clone(),
            exp: jsonwebtoken::get_current_timestamp() + ttl.as_secs(),
        };
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
        )?;
        Ok(token)
    }

    fn check(token: &str, secret: &str) -> UserResult<Claims> {
        let mut validation = jsonwebtoken::Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.leeway = 0;
        jsonwebtoken::decode::<Claims>(
            token,
            &jsonwebtoken::DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|_| UserError::InvalidToken)
    }

    pub fn issue(&self, user: &User) -> UserResult<TokenPair> {
        Ok(TokenPair {
            access_token: Self::sign(user, &self.settings.access_secret, self.settings.access_ttl)?,
            refresh_token: Self::sign(
                user,
                &self.settings.refresh_secret,
                self.settings.refresh_ttl,
            )?,
        })
    }

    pub fn verify_access(&self, token: &str) -> UserResult<Claims> {
        Self::check(token, &self.settings.access_secret)
    }

    pub fn verify_refresh(&self, token: &str) -> UserResult<Claims> {
        Self::check(token, &self.settings.refresh_secret)
    }
}
