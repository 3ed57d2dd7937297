//! Session context.
//!
//! Customer identity travels explicitly through every operation that
//! needs it; nothing reads ambient global state. [`SessionStore`] is the
//! seam for whatever keeps the session alive between launches.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Merchant,
}

/// Who is performing the current operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub nama: String,
    pub telepon: String,
    pub role: Role,
}

impl Session {
    pub fn customer(nama: impl Into<String>, telepon: impl Into<String>) -> Self {
        Self {
            nama: nama.into(),
            telepon: telepon.into(),
            role: Role::Customer,
        }
    }

    pub fn merchant(nama: impl Into<String>) -> Self {
        Self {
            nama: nama.into(),
            telepon: String::new(),
            role: Role::Merchant,
        }
    }
}

/// Session persistence seam.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Option<Session>;
    async fn save(&self, session: Session);
    async fn clear(&self);
}

/// Process-local session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    current: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Option<Session> {
        self.current.read().clone()
    }

    async fn save(&self, session: Session) {
        *self.current.write() = Some(session);
    }

    async fn clear(&self) {
        *self.current.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_load_clear() {
        let store = MemorySessionStore::new();
        assert!(store.load().await.is_none());

        store.save(Session::customer("Budi", "0812000111")).await;
        let session = store.load().await.unwrap();
        assert_eq!(session.nama, "Budi");
        assert_eq!(session.role, Role::Customer);

        store.clear().await;
        assert!(store.load().await.is_none());
    }
}
