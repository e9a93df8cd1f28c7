//! Bearer-token session shared by every request of one client.

use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct Session {
    token: String,
}

/// Holds the current session, if any.
///
/// The fetch layer reads the token for every request and closes the
/// session when the server answers 401.
#[derive(Debug, Default)]
pub struct SessionStore {
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session, replacing any previous one.
    pub async fn open(&self, token: impl Into<String>) {
        *self.current.write().await = Some(Session {
            token: token.into(),
        });
    }

    /// Close the session. Returns whether one was open.
    pub async fn close(&self) -> bool {
        self.current.write().await.take().is_some()
    }

    pub async fn token(&self) -> Option<String> {
        self.current.read().await.as_ref().map(|s| s.token.clone())
    }

    pub async fn is_active(&self) -> bool {
        self.current.read().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_and_close() {
        let store = SessionStore::new();
        assert!(!store.is_active().await);

        store.open("abc").await;
        assert_eq!(store.token().await.as_deref(), Some("abc"));

        assert!(store.close().await);
        assert!(!store.close().await);
        assert!(store.token().await.is_none());
    }
}
