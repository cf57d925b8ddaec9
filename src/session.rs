//! Pending submission storage
//!
//! Holds the declared package list between the two submission steps, keyed
//! by an opaque per-submission token. The map is in-memory and process
//! scoped; a lost token simply means starting a new submission.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Thread-safe store of submissions waiting for their wheel references.
pub struct PendingSubmissions {
    pending: Arc<RwLock<HashMap<Uuid, Vec<String>>>>,
}

impl PendingSubmissions {
    pub fn new() -> Self {
        Self {
            pending: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Stash a declared package list under a fresh token.
    pub async fn put(&self, packages: Vec<String>) -> Uuid {
        let token = Uuid::new_v4();
        self.pending.write().await.insert(token, packages);
        token
    }

    /// Peek at a pending package list without claiming it.
    pub async fn get(&self, token: Uuid) -> Option<Vec<String>> {
        self.pending.read().await.get(&token).cloned()
    }

    /// Claim a pending package list; the token cannot be reused afterwards.
    pub async fn take(&self, token: Uuid) -> Option<Vec<String>> {
        self.pending.write().await.remove(&token)
    }
}

impl Default for PendingSubmissions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn put_get_take_round_trip() {
        let submissions = PendingSubmissions::new();
        let token = submissions.put(vec!["alpha".to_string()]).await;

        assert_eq!(submissions.get(token).await, Some(vec!["alpha".to_string()]));
        assert_eq!(submissions.take(token).await, Some(vec!["alpha".to_string()]));
        assert_eq!(submissions.take(token).await, None);
        assert_eq!(submissions.get(token).await, None);
    }

    #[tokio::test]
    async fn unknown_token_is_none() {
        let submissions = PendingSubmissions::new();
        assert_eq!(submissions.get(Uuid::new_v4()).await, None);
    }
}
