//! session persistence, behind a port so the core never touches a storage medium directly

pub(crate) mod file;
#[cfg(test)]
pub(crate) mod memory;

use crate::assistant::controller::error::{WaiterError, WaiterResult};
use crate::assistant::gateway::transport::Transport;
use crate::assistant::gateway::Gateway;
use crate::assistant::model::session::{Credentials, Session};
use crate::assistant::state::ViewState;
use log::{info, warn};

/// fixed name the snapshot is stored under
pub(crate) const SNAPSHOT_KEY: &str = "dinesync_state";

pub(crate) trait SnapshotStore {
    fn get(&self, key: &str) -> WaiterResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> WaiterResult<()>;
    fn clear(&self, key: &str) -> WaiterResult<()>;
}

pub(crate) struct SessionStore<S: SnapshotStore> {
    store: S,
    session: Session,
}

impl<S: SnapshotStore> SessionStore<S> {
    /// load the last snapshot, an unreadable one means starting logged out
    pub fn restore(store: S) -> Self {
        let session = match store.get(SNAPSHOT_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<Session>(&raw).unwrap_or_else(|e| {
                warn!("discarding corrupt session snapshot, {}", e);
                Session::default()
            }),
            Ok(None) => Session::default(),
            Err(e) => {
                warn!("failed to read session snapshot, {}", e);
                Session::default()
            }
        };
        Self { store, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn credentials(&self) -> Option<Credentials> {
        self.session.credentials()
    }

    pub async fn login<T: Transport>(
        &mut self,
        gateway: &Gateway<T>,
        username: &str,
        password: &str,
    ) -> WaiterResult<Credentials> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(WaiterError::validation("username and password are required"));
        }
        let credentials = gateway.login(username.trim(), password).await?;
        self.session = Session::default();
        self.session.login(credentials.clone());
        self.persist()?;
        info!(
            "logged in as {} for restaurant={}",
            credentials.user.name, credentials.rs_id
        );
        Ok(credentials)
    }

    /// forget everything, persisted and in memory
    pub fn logout(&mut self) -> WaiterResult<()> {
        self.session = Session::default();
        self.store.clear(SNAPSHOT_KEY)
    }

    /// best-effort cache of the last reconciled view
    pub fn cache(&mut self, state: &ViewState) -> WaiterResult<()> {
        if !self.session.is_authenticated {
            return Ok(());
        }
        self.session.cache(
            state.current_table_no().map(str::to_string),
            state.tables.clone(),
            state.orders.clone(),
        );
        self.persist()
    }

    /// seed a view from the cache, stale until the next fetch
    pub fn cached_view(&self) -> ViewState {
        ViewState::from_cache(
            self.session.tables.clone(),
            self.session.current_table.clone(),
            self.session.orders.clone(),
        )
    }

    fn persist(&self) -> WaiterResult<()> {
        let raw = serde_json::to_string(&self.session)?;
        self.store.set(SNAPSHOT_KEY, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryStore;
    use super::*;
    use crate::assistant::gateway::endpoint::Endpoint;
    use crate::assistant::gateway::fake::FakeTransport;
    use crate::assistant::model::order::OrderList;
    use crate::assistant::model::table::{Table, TableList, TableStatus};
    use crate::assistant::state::View;
    use rust_decimal::Decimal;

    const LOGIN: &str =
        r#"{"success":true,"rsId":"235","user":{"id":"1","name":"Ahmed","role":"Admin","restaurantName":"Dyna"}}"#;

    #[tokio::test]
    async fn test_login_persists_session() {
        let fake = FakeTransport::new();
        fake.respond(Endpoint::Auth, LOGIN);
        let gateway = Gateway::new(&fake);
        let mut sessions = SessionStore::restore(MemoryStore::new());
        assert!(sessions.credentials().is_none());

        let credentials = sessions.login(&gateway, "ahmed", "secret").await.unwrap();
        assert_eq!(credentials.rs_id, "235");
        assert_eq!(credentials.user.role, "Admin");

        let raw = sessions.store.get(SNAPSHOT_KEY).unwrap().unwrap();
        assert!(raw.contains(r#""isAuthenticated":true"#));
        let restored = SessionStore::restore(sessions.store);
        assert_eq!(restored.credentials().unwrap().rs_id, "235");
    }

    #[tokio::test]
    async fn test_login_without_rs_id_is_incomplete() {
        let fake = FakeTransport::new();
        fake.respond(Endpoint::Auth, r#"{"success":true,"user":{"id":"1","name":"Ahmed"}}"#);
        let gateway = Gateway::new(&fake);
        let mut sessions = SessionStore::restore(MemoryStore::new());
        let err = sessions.login(&gateway, "ahmed", "secret").await.unwrap_err();
        assert!(matches!(err, WaiterError::AuthIncomplete));
        assert!(!sessions.session().is_authenticated);
        assert!(sessions.store.get(SNAPSHOT_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_needs_both_fields() {
        let fake = FakeTransport::new();
        let gateway = Gateway::new(&fake);
        let mut sessions = SessionStore::restore(MemoryStore::new());
        assert!(sessions.login(&gateway, " ", "secret").await.is_err());
        assert_eq!(fake.count(Endpoint::Auth), 0);
    }

    #[test]
    fn test_cache_restores_last_view() {
        let store = MemoryStore::new();
        store
            .set(SNAPSHOT_KEY, r#"{"isAuthenticated":true,"rsId":"235","user":{"id":"1"}}"#)
            .unwrap();
        let mut sessions = SessionStore::restore(store);

        let mut state = ViewState::default();
        let ticket = state.ticket();
        state.apply_tables(
            &ticket,
            TableList {
                tables: vec![Table {
                    table_no: "5".to_string(),
                    status: TableStatus::Occupied,
                    guest_count: 2,
                    tax: Decimal::ZERO,
                    master_order_id: None,
                }],
                waiter_calls: vec![],
            },
        );
        state.navigate(View::Table("5".to_string()));
        let ticket = state.ticket();
        state.apply_orders(&ticket, OrderList::default());
        sessions.cache(&state).unwrap();

        let cached = SessionStore::restore(sessions.store).cached_view();
        assert_eq!(cached.view, View::Table("5".to_string()));
        assert_eq!(cached.tables.len(), 1);
        assert!(cached.orders.is_empty());
    }

    #[test]
    fn test_logout_clears_snapshot() {
        let store = MemoryStore::new();
        store.set(SNAPSHOT_KEY, r#"{"isAuthenticated":true,"rsId":"235","user":{"id":"1"}}"#).unwrap();
        let mut sessions = SessionStore::restore(store);
        assert!(sessions.credentials().is_some());
        sessions.logout().unwrap();
        assert!(sessions.credentials().is_none());
        assert!(sessions.store.get(SNAPSHOT_KEY).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_snapshot_starts_logged_out() {
        let store = MemoryStore::new();
        store.set(SNAPSHOT_KEY, "{not json").unwrap();
        let sessions = SessionStore::restore(store);
        assert!(!sessions.session().is_authenticated);
    }
}
