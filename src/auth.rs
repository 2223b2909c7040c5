//! Administrator login and bearer-token verification.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::{ComicgrepError, Result};
use crate::ports::{Loginer, TokenVerifier};

/// Token subject for the single administrator.
const ADMIN_ROLE: &str = "superuser";

/// Typed token claims. The subject and authorized flag are validated field
/// by field on verify.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    exp: u64,
    authorized: bool,
    sub: String,
}

/// Issues and verifies HS256-signed administrator tokens against the single
/// credential pair supplied through the environment.
pub struct TokenAuthority {
    admin_user: String,
    admin_password: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
}

impl TokenAuthority {
    /// Build from config. Missing admin credentials or signing secret are
    /// fatal at boot.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let admin_user = config
            .admin_user
            .clone()
            .ok_or_else(|| ComicgrepError::Starting("ADMIN_USER is not set".into()))?;
        let admin_password = config
            .admin_password
            .clone()
            .ok_or_else(|| ComicgrepError::Starting("ADMIN_PASSWORD is not set".into()))?;
        let secret = config
            .token_secret
            .clone()
            .ok_or_else(|| ComicgrepError::Starting("TOKEN_SECRET is not set".into()))?;

        Ok(Self {
            admin_user,
            admin_password,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl: Duration::from_secs(config.token_ttl_secs),
        })
    }

    fn now_unix() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

impl Loginer for TokenAuthority {
    fn login(&self, name: &str, password: &str) -> Result<String> {
        if name != self.admin_user || password != self.admin_password {
            return Err(ComicgrepError::Unauthorized);
        }

        let claims = Claims {
            exp: Self::now_unix() + self.token_ttl.as_secs(),
            authorized: true,
            sub: ADMIN_ROLE.to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ComicgrepError::Internal(format!("failed to sign token: {e}")))
    }
}

impl TokenVerifier for TokenAuthority {
    fn verify(&self, token: &str) -> Result<()> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| ComicgrepError::Unauthorized)?;

        if !data.claims.authorized || data.claims.sub != ADMIN_ROLE {
            return Err(ComicgrepError::Unauthorized);
        }
        Ok(())
    }
}
