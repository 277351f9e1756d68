use async_trait::async_trait;
use chrono::Duration;

use crate::{Error, storage::Authentication};

/// Token store contract for passwordless login.
///
/// A store keeps at most one live token per user. Issuing a new token for a
/// user replaces the previous one, so only the newest token authenticates.
/// Expiry is checked when a token is presented; expired records stay in
/// storage until removed.
#[async_trait]
pub trait TokenStore: Send + Sync + 'static {
    /// Check whether `token` is the current, unexpired token for `uid`.
    ///
    /// Never mutates state. Every kind of mismatch (unknown user, wrong token,
    /// expired token) yields [`Authentication::Invalid`]; an `Err` always
    /// means the check itself could not be carried out.
    async fn authenticate(&self, token: &str, uid: &str) -> Result<Authentication, Error>;

    /// Store `token` for `uid`, replacing any existing token for that user.
    ///
    /// The token expires `lifetime` after it is stored. `referer` is replayed on
    /// successful authentication.
    async fn store_or_update(
        &self,
        token: &str,
        uid: &str,
        lifetime: Duration,
        referer: Option<&str>,
    ) -> Result<(), Error>;

    /// Remove the token for `uid`. Succeeds when there is none.
    async fn invalidate_user(&self, uid: &str) -> Result<(), Error>;

    /// Remove every token.
    async fn clear(&self) -> Result<(), Error>;

    /// Number of stored tokens, including expired ones not yet removed.
    async fn length(&self) -> Result<u64, Error>;

    /// Remove expired tokens, returning how many were removed.
    async fn purge_expired(&self) -> Result<u64, Error>;
}
