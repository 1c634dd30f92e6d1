// ============================
// crates/backend-lib/src/auth/token.rs
// ============================
//! Signed, stateless session tokens (HS256 JWT).
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use logincount_common::UserId;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AuthFailure};

/// Default token lifetime (1 hour)
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct Claims {
    #[serde(rename = "userId")]
    pub(crate) user_id: UserId,
    pub(crate) iat: u64,
    pub(crate) exp: u64,
}

/// Issues and verifies session tokens with a shared secret
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
        }
    }

    /// Issue a token for the user, valid for the configured lifetime from now
    pub fn issue(&self, user_id: UserId) -> Result<String, AppError> {
        self.issue_at(user_id, SystemTime::now())
    }

    /// Issue a token as if it had been created at `issued_at`
    pub fn issue_at(&self, user_id: UserId, issued_at: SystemTime) -> Result<String, AppError> {
        let iat = issued_at
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::Internal(format!("clock before unix epoch: {e}")))?;
        let claims = Claims {
            user_id,
            iat: iat.as_secs(),
            exp: (iat + self.lifetime).as_secs(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Check signature and expiry and return the embedded user id
    pub fn verify(&self, token: &str) -> Result<UserId, AppError> {
        let mut validation = Validation::default();
        // expiry is exact: a token is dead one hour after issuance
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            let reason = match e.kind() {
                ErrorKind::ExpiredSignature => "token expired".to_string(),
                ErrorKind::InvalidSignature => "bad signature".to_string(),
                _ => format!("malformed token: {e}"),
            };
            AppError::auth(AuthFailure::InvalidToken(reason))
        })?;

        Ok(data.claims.user_id)
    }
}
