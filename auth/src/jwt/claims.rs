use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::jwt::JwtError;

/// Session token claims.
///
/// `sub` carries the username, `uid` the user identifier when the issuer
/// knows it. Timestamps are Unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// User identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

impl Claims {
    /// Create claims for a subject, issued now and expiring after `ttl`.
    pub fn for_subject(subject: impl ToString, ttl: Duration) -> Result<Self, JwtError> {
        Self::issued_at(subject, Utc::now(), ttl)
    }

    /// Create claims for a subject with an explicit issue time.
    ///
    /// # Arguments
    /// * `subject` - Username the token is bound to
    /// * `issued_at` - Issue instant
    /// * `ttl` - Lifetime of the token
    ///
    /// # Errors
    /// * `EncodingFailed` - The expiration instant is not representable
    pub fn issued_at(
        subject: impl ToString,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, JwtError> {
        let expiration = issued_at
            .checked_add_signed(ttl)
            .ok_or_else(|| JwtError::EncodingFailed("expiration out of range".to_string()))?;

        Ok(Self {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: expiration.timestamp(),
            uid: None,
        })
    }

    /// Set the user identifier claim.
    pub fn with_user_id(mut self, user_id: impl ToString) -> Self {
        self.uid = Some(user_id.to_string());
        self
    }

    /// Expiration as a timestamp, if representable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// A token is usable strictly before its expiration instant.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp <= current_timestamp
    }
}
