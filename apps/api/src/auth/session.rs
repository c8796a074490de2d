use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::credentials::{CredentialTable, Principal};
use crate::errors::AppError;

/// The gate's two states. No timeout: a session lives until logout.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated(Principal),
}

impl Session {
    /// Anonymous → Authenticated on a matching credential pair.
    /// Logging in again from Authenticated re-checks and replaces the principal.
    pub fn login(
        self,
        table: &CredentialTable,
        username: &str,
        password: &str,
    ) -> Result<Session, AppError> {
        match table.verify(username, password) {
            Some(principal) => {
                info!("User '{}' logged in as {:?}", principal.username, principal.role);
                Ok(Session::Authenticated(principal))
            }
            None => {
                warn!("Failed login attempt for '{}'", username.trim());
                Err(AppError::Unauthorized)
            }
        }
    }

    pub fn logout(self) -> Session {
        Session::Anonymous
    }

    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated(p) => Some(p),
        }
    }
}

/// Live sessions keyed by bearer token.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Principal>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn open(&self, principal: Principal) -> Uuid {
        let token = Uuid::new_v4();
        self.inner.write().await.insert(token, principal);
        token
    }

    pub async fn session(&self, token: &Uuid) -> Session {
        match self.inner.read().await.get(token) {
            Some(p) => Session::Authenticated(p.clone()),
            None => Session::Anonymous,
        }
    }

    /// Stores the gate state for `token`. Anonymous drops the token; returns
    /// true when an existing session was replaced or removed.
    pub async fn set(&self, token: Uuid, session: Session) -> bool {
        let mut sessions = self.inner.write().await;
        match session {
            Session::Authenticated(principal) => sessions.insert(token, principal).is_some(),
            Session::Anonymous => sessions.remove(&token).is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credentials::{entry, Role};

    fn table() -> CredentialTable {
        CredentialTable::new(vec![entry("admin", Role::Admin, "pw")]).unwrap()
    }

    #[test]
    fn test_login_then_logout() {
        let session = Session::Anonymous.login(&table(), "admin", "pw").unwrap();
        assert_eq!(session.principal().map(|p| p.role), Some(Role::Admin));
        assert_eq!(session.logout(), Session::Anonymous);
    }

    #[test]
    fn test_bad_login_is_unauthorized() {
        let result = Session::Anonymous.login(&table(), "admin", "nope");
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_store_round_trip() {
        let store = SessionStore::new();
        let principal = Principal {
            username: "admin".to_string(),
            role: Role::Admin,
        };
        let token = store.open(principal.clone()).await;

        let session = store.session(&token).await;
        assert_eq!(session, Session::Authenticated(principal));

        assert!(store.set(token, session.logout()).await);
        assert_eq!(store.session(&token).await, Session::Anonymous);
        assert!(!store.set(token, Session::Anonymous).await);
    }
}
