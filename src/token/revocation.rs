use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::shared::AppError;

/// Tracks refresh-token ids through their lifecycle: issued -> revoked.
///
/// Revocation is terminal; there is no un-revoking. Both maps carry the
/// token's natural expiry so entries can be dropped once they could no
/// longer validate anyway. Insert and lookup go through one mutex, so
/// concurrent revocations and decode-time checks cannot lose updates.
pub struct RevocationSet {
    inner: Mutex<Inner>,
}

struct Inner {
    issued: HashMap<String, i64>,  // token id -> expiry timestamp
    revoked: HashMap<String, i64>, // token id -> expiry timestamp
}

impl Default for RevocationSet {
    fn default() -> Self {
        Self::new()
    }
}

impl RevocationSet {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                issued: HashMap::new(),
                revoked: HashMap::new(),
            }),
        }
    }

    /// Records a freshly minted token id together with its expiry
    pub fn register(&self, token_id: &str, expires_at: i64) {
        let mut inner = self.inner.lock().unwrap();
        prune(&mut inner, Utc::now().timestamp());
        inner.issued.insert(token_id.to_string(), expires_at);

        debug!(token_id = %token_id, "Registered issued refresh token");
    }

    /// Moves a token id into the revoked state.
    ///
    /// Revoking an already-revoked id succeeds (the end state holds
    /// either way); an id that was never issued is reported as
    /// `NotFound`.
    pub fn revoke(&self, token_id: &str) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();

        if inner.revoked.contains_key(token_id) {
            debug!(token_id = %token_id, "Refresh token already revoked");
            return Ok(());
        }

        match inner.issued.remove(token_id) {
            Some(expires_at) => {
                inner.revoked.insert(token_id.to_string(), expires_at);
                debug!(token_id = %token_id, "Refresh token revoked");
                Ok(())
            }
            None => {
                warn!(token_id = %token_id, "Refresh token not found for revocation");
                Err(AppError::NotFound("Token not found".to_string()))
            }
        }
    }

    /// Checks whether a token id has been revoked
    pub fn is_revoked(&self, token_id: &str) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.revoked.contains_key(token_id)
    }

    /// Returns the number of tracked (issued + revoked) token ids
    pub fn tracked_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.issued.len() + inner.revoked.len()
    }
}

/// Drops entries whose tokens have passed their natural expiry; an
/// expired token fails decoding before the revocation check, so the
/// entries no longer affect any outcome.
fn prune(inner: &mut Inner, now: i64) {
    inner.issued.retain(|_, expires_at| *expires_at > now);
    inner.revoked.retain(|_, expires_at| *expires_at > now);
}
