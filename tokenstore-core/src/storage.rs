use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted login token.
///
/// `token_hash` is always the output of a [`CredentialHasher`](crate::CredentialHasher),
/// never the raw token. At most one record exists per `uid`.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    pub uid: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub referer: Option<String>,
}

impl TokenRecord {
    pub fn new(
        uid: String,
        token_hash: String,
        expires_at: DateTime<Utc>,
        referer: Option<String>,
    ) -> Self {
        Self {
            uid,
            token_hash,
            expires_at,
            referer,
        }
    }

    /// A record stays usable up to and including its expiry instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("uid", &self.uid)
            .field("token_hash", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("referer", &self.referer)
            .finish()
    }
}

impl PartialEq for TokenRecord {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
            && self.token_hash == other.token_hash
            && self.referer == other.referer
            // Backends keep expiry at millisecond precision
            && self.expires_at.timestamp_millis() == other.expires_at.timestamp_millis()
    }
}

/// Outcome of presenting a token for a user.
///
/// `Invalid` deliberately carries no reason: an unknown user, a wrong token and
/// an expired token are indistinguishable to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    /// The token matched. `referer` is the stored URL, or empty if none was stored.
    Valid { referer: String },
    Invalid,
}

impl Authentication {
    pub fn is_valid(&self) -> bool {
        matches!(self, Authentication::Valid { .. })
    }

    /// The referer to replay, present only on success.
    pub fn referer(&self) -> Option<&str> {
        match self {
            Authentication::Valid { referer } => Some(referer),
            Authentication::Invalid => None,
        }
    }
}
