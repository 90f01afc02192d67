//! Order reconciler.
//!
//! Owns the view state of the logged-in waiter and applies every mutation
//! pessimistically: the backend call goes out, and only a subsequent fetch decides
//! what the order list looks like. A failed call leaves the state exactly as it was.

use crate::assistant::controller::error::{WaiterError, WaiterResult};
use crate::assistant::gateway::transport::Transport;
use crate::assistant::gateway::{Gateway, NewItem};
use crate::assistant::model::config::{AddItemMode, WaiterCodePolicy};
use crate::assistant::model::menu::MenuCatalog;
use crate::assistant::model::order::OrderStatus;
use crate::assistant::model::preference::{self, ItemPreference};
use crate::assistant::state::{Ticket, View, ViewState};
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Refresh {
    /// background poll, errors only flip the degraded flag
    Silent,
    /// user asked for it, errors are surfaced and loading is shown
    Foreground,
}

pub(crate) struct Reconciler<T: Transport> {
    gateway: Gateway<T>,
    rs_id: String,
    waiter_code: WaiterCodePolicy,
    add_item_mode: AddItemMode,
    state: Mutex<ViewState>,
    mutations: AtomicUsize,
}

/// counts a mutation as in flight until dropped
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<T: Transport> Reconciler<T> {
    #[cfg(test)]
    pub fn new(gateway: Gateway<T>, rs_id: impl Into<String>) -> Self {
        Self::with_state(gateway, rs_id, ViewState::default())
    }

    pub fn with_state(gateway: Gateway<T>, rs_id: impl Into<String>, state: ViewState) -> Self {
        Self {
            gateway,
            rs_id: rs_id.into(),
            waiter_code: WaiterCodePolicy::default(),
            add_item_mode: AddItemMode::default(),
            state: Mutex::new(state),
            mutations: AtomicUsize::new(0),
        }
    }

    pub fn with_policy(mut self, waiter_code: WaiterCodePolicy, add_item_mode: AddItemMode) -> Self {
        self.waiter_code = waiter_code;
        self.add_item_mode = add_item_mode;
        self
    }

    pub async fn snapshot(&self) -> ViewState {
        self.state.lock().await.clone()
    }

    pub fn mutations_in_flight(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    pub async fn dismiss_error(&self) {
        self.state.lock().await.last_error = None;
    }

    pub async fn view(&self) -> View {
        self.state.lock().await.view.clone()
    }

    /// refresh whatever is on screen
    pub async fn refresh(&self, mode: Refresh) -> WaiterResult<()> {
        match self.view().await {
            View::Tables => self.refresh_tables(mode).await,
            View::Table(_) => self.refresh_orders(mode).await,
        }
    }

    pub async fn refresh_tables(&self, mode: Refresh) -> WaiterResult<()> {
        let ticket = self.begin(mode).await;
        let result = self.gateway.tables(&self.rs_id).await;
        let mut state = self.state.lock().await;
        let result = result.map(|list| {
            if !state.apply_tables(&ticket, list) {
                debug!("discarded stale tables response, seq={}", ticket.seq);
            }
        });
        Self::settle(&mut state, mode, result)
    }

    pub async fn refresh_orders(&self, mode: Refresh) -> WaiterResult<()> {
        let (ticket, table_no, master_order_id) = {
            let mut state = self.state.lock().await;
            let Some(table_no) = state.current_table_no().map(str::to_string) else {
                return Ok(());
            };
            let master_order_id = state.master_order_id();
            if mode == Refresh::Foreground {
                state.begin_loading();
            }
            (state.ticket(), table_no, master_order_id)
        };
        let result = self
            .gateway
            .orders(&self.rs_id, &table_no, master_order_id.as_deref())
            .await;
        let mut state = self.state.lock().await;
        let result = result.map(|list| {
            if !state.apply_orders(&ticket, list) {
                debug!("discarded stale orders response for table={}, seq={}", table_no, ticket.seq);
            }
        });
        Self::settle(&mut state, mode, result)
    }

    async fn begin(&self, mode: Refresh) -> Ticket {
        let mut state = self.state.lock().await;
        if mode == Refresh::Foreground {
            state.begin_loading();
        }
        state.ticket()
    }

    fn settle(state: &mut ViewState, mode: Refresh, result: WaiterResult<()>) -> WaiterResult<()> {
        match mode {
            Refresh::Silent => {
                match result {
                    Ok(()) => state.sync_degraded = false,
                    Err(e) if e.is_transport() => {
                        warn!("background sync failed, backend unreachable, {}", e);
                        state.sync_degraded = true;
                    }
                    Err(e) => {
                        warn!("background sync failed, unusable response, {}", e);
                        state.sync_degraded = true;
                    }
                }
                Ok(())
            }
            Refresh::Foreground => {
                state.end_loading();
                match result {
                    Ok(()) => {
                        state.sync_degraded = false;
                        Ok(())
                    }
                    Err(e) => {
                        error!("refresh failed, {}", e);
                        state.last_error = Some(e.to_string());
                        Err(e)
                    }
                }
            }
        }
    }

    /// open a table's order view, loading the menu once per visit
    pub async fn select_table(&self, table_no: &str) -> WaiterResult<()> {
        self.state
            .lock()
            .await
            .navigate(View::Table(table_no.to_string()));
        if let Err(e) = self.load_menu().await {
            warn!("menu unavailable for table={}, {}", table_no, e);
        }
        self.refresh_orders(Refresh::Foreground).await
    }

    pub async fn back_to_tables(&self) {
        self.state.lock().await.navigate(View::Tables);
    }

    pub async fn load_menu(&self) -> WaiterResult<MenuCatalog> {
        if let Some(menu) = self.state.lock().await.menu.clone() {
            return Ok(menu);
        }
        let categories = self.gateway.categories(&self.rs_id).await?;
        let items = self.gateway.menu(&self.rs_id).await?;
        let catalog = MenuCatalog::new(categories, items);
        let mut state = self.state.lock().await;
        if matches!(state.view, View::Table(_)) {
            state.menu = Some(catalog.clone());
        }
        Ok(catalog)
    }

    pub async fn preferences(&self, food_id: &str) -> WaiterResult<Vec<ItemPreference>> {
        self.gateway.preferences(&self.rs_id, food_id).await
    }

    fn check_waiter_code(&self, code: &str) -> WaiterResult<()> {
        if code.trim().is_empty() {
            return Err(WaiterError::validation("waiter code is required"));
        }
        if !self.waiter_code.accepts(code) {
            return Err(WaiterError::validation(format!(
                "waiter code must be at least {} characters",
                self.waiter_code.min_len
            )));
        }
        Ok(())
    }

    /// run a validated mutation, then re-fetch; on failure nothing local changes
    async fn mutate<F>(&self, action: &str, call: F) -> WaiterResult<()>
    where
        F: std::future::Future<Output = WaiterResult<()>>,
    {
        let outcome = {
            let _in_flight = InFlight::enter(&self.mutations);
            call.await
        };
        if let Err(e) = outcome {
            error!("{} failed, {}", action, e);
            self.state.lock().await.last_error = Some(e.to_string());
            return Err(e);
        }
        info!("{} succeeded, re-fetching", action);
        // the mutation went through, a failed re-fetch is left for the next poll
        self.refresh(Refresh::Silent).await?;
        if self.state.lock().await.sync_degraded {
            warn!("re-fetch after {} failed, view may lag until the next poll", action);
        }
        Ok(())
    }

    async fn fail<R>(&self, e: WaiterError) -> WaiterResult<R> {
        self.state.lock().await.last_error = Some(e.to_string());
        Err(e)
    }

    /// send every cart item of the table to the kitchen
    pub async fn place_cart_items(&self, table_no: &str, waiter_code: &str, note: &str) -> WaiterResult<()> {
        if let Err(e) = self.check_waiter_code(waiter_code) {
            return self.fail(e).await;
        }
        let master_order_id = {
            let state = self.state.lock().await;
            if state.current_table_no() != Some(table_no) || state.items_with(OrderStatus::Cart).next().is_none() {
                drop(state);
                return self
                    .fail(WaiterError::validation(format!("table {} has no items in the cart", table_no)))
                    .await;
            }
            state.master_order_id().unwrap_or_default()
        };
        self.mutate(
            "place order",
            self.gateway
                .place_order(&self.rs_id, table_no, &master_order_id, waiter_code.trim(), note),
        )
        .await
    }

    pub async fn confirm_item(&self, item_id: &str, waiter_code: &str, note: &str) -> WaiterResult<()> {
        if let Err(e) = self.check_waiter_code(waiter_code) {
            return self.fail(e).await;
        }
        let status = self.state.lock().await.item(item_id).map(|i| i.status);
        match status {
            Some(OrderStatus::Occupied) => {}
            Some(OrderStatus::Cart) => {
                return self
                    .fail(WaiterError::validation(format!("item {} has not been placed yet", item_id)))
                    .await
            }
            Some(_) => {
                return self
                    .fail(WaiterError::validation(format!("item {} is already confirmed", item_id)))
                    .await
            }
            None => {
                return self
                    .fail(WaiterError::validation(format!("item {} is not on this table", item_id)))
                    .await
            }
        }
        self.mutate(
            "confirm item",
            self.gateway
                .confirm_item(&self.rs_id, item_id, waiter_code.trim(), note),
        )
        .await
    }

    pub async fn confirm_all(&self, master_order_id: &str, waiter_code: &str, note: &str) -> WaiterResult<()> {
        if let Err(e) = self.check_waiter_code(waiter_code) {
            return self.fail(e).await;
        }
        let pending = self
            .state
            .lock()
            .await
            .items_with(OrderStatus::Occupied)
            .filter(|i| i.master_order_id.is_empty() || i.master_order_id == master_order_id)
            .count();
        if pending == 0 {
            return self
                .fail(WaiterError::validation(format!(
                    "order {} has no placed items to confirm",
                    master_order_id
                )))
                .await;
        }
        self.mutate(
            "confirm all items",
            self.gateway
                .confirm_all_items(&self.rs_id, master_order_id, waiter_code.trim(), note),
        )
        .await
    }

    /// no local removal, the list is replaced by the re-fetch
    pub async fn delete_item(&self, item_id: &str, waiter_code: &str) -> WaiterResult<()> {
        if let Err(e) = self.check_waiter_code(waiter_code) {
            return self.fail(e).await;
        }
        if self.state.lock().await.item(item_id).is_none() {
            return self
                .fail(WaiterError::validation(format!("item {} is not on this table", item_id)))
                .await;
        }
        self.mutate(
            "delete item",
            self.gateway.delete_item(&self.rs_id, item_id, waiter_code.trim()),
        )
        .await
    }

    /// only placed items are edited remotely, cart items never reach this call
    pub async fn edit_item(&self, item_id: &str, quantity: u32, preferences: &str) -> WaiterResult<()> {
        if quantity < 1 {
            return self.fail(WaiterError::validation("quantity must be at least 1")).await;
        }
        let status = self.state.lock().await.item(item_id).map(|i| i.status);
        if status != Some(OrderStatus::Occupied) {
            return self
                .fail(WaiterError::validation(format!("item {} cannot be edited", item_id)))
                .await;
        }
        let preferences = match preference::serialize(&preference::parse(preferences)) {
            Ok(p) => p,
            Err(e) => return self.fail(e).await,
        };
        self.mutate(
            "edit item",
            self.gateway.edit_item(&self.rs_id, item_id, quantity, &preferences),
        )
        .await
    }

    pub async fn add_item(
        &self,
        food_id: &str,
        quantity: u32,
        preferences: &[String],
        waiter_code: &str,
    ) -> WaiterResult<()> {
        if let Err(e) = self.check_waiter_code(waiter_code) {
            return self.fail(e).await;
        }
        if quantity < 1 {
            return self.fail(WaiterError::validation("quantity must be at least 1")).await;
        }
        let preferences = match preference::serialize(preferences) {
            Ok(p) => p,
            Err(e) => return self.fail(e).await,
        };
        let (table_no, master_order_id) = {
            let state = self.state.lock().await;
            (
                state.current_table_no().map(str::to_string),
                state.master_order_id(),
            )
        };
        let Some(table_no) = table_no else {
            return self.fail(WaiterError::validation("select a table first")).await;
        };
        let Some(master_order_id) = master_order_id else {
            return self
                .fail(WaiterError::validation(format!("table {} has no open order", table_no)))
                .await;
        };
        let status = match self.add_item_mode {
            AddItemMode::Direct => OrderStatus::Occupied,
            AddItemMode::Staged => OrderStatus::Cart,
        };
        let item = NewItem {
            table_no: &table_no,
            master_order_id: &master_order_id,
            food_id,
            quantity,
            preferences: &preferences,
            waiter_code: waiter_code.trim(),
            status,
        };
        self.mutate("add item", self.gateway.add_item(&self.rs_id, &item))
            .await
    }

    /// open a master order on a free table, then show it
    pub async fn create_order(
        &self,
        table_no: &str,
        waiter_code: &str,
        password: &str,
        guest_count: u32,
    ) -> WaiterResult<()> {
        if let Err(e) = self.check_waiter_code(waiter_code) {
            return self.fail(e).await;
        }
        if password.is_empty() {
            return self.fail(WaiterError::validation("password is required")).await;
        }
        if guest_count < 1 {
            return self.fail(WaiterError::validation("guest count must be at least 1")).await;
        }
        let occupied = self
            .state
            .lock()
            .await
            .table(table_no)
            .is_some_and(|t| t.is_occupied());
        if occupied {
            return self
                .fail(WaiterError::validation(format!("table {} is already occupied", table_no)))
                .await;
        }
        let outcome = {
            let _in_flight = InFlight::enter(&self.mutations);
            self.gateway
                .create_order(&self.rs_id, table_no, waiter_code.trim(), password, guest_count)
                .await
        };
        if let Err(e) = outcome {
            error!("create order failed, {}", e);
            return self.fail(e).await;
        }
        info!("order opened on table={}", table_no);
        self.refresh_tables(Refresh::Silent).await?;
        self.select_table(table_no).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::gateway::endpoint::Endpoint;
    use crate::assistant::gateway::fake::FakeTransport;
    use rust_decimal::Decimal;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    const TABLES: &str = r#"{"tables":[
        {"table_no":"5","status":"occupied","guest_count":2,"tax":0,"master_order_id":"m1"},
        {"table_no":"6","status":"inactive","guest_count":0,"tax":0}
    ]}"#;

    fn cart_salmon() -> String {
        r#"{"order_items":[{"id":"1","food_id":"food_salmon_01","food_name":"Grilled Salmon",
            "food_item_price":85,"food_quantity":1,"status":"initial","master_order_id":"m1"}],
            "orders_info":[{"master_order_id":"m1","table_no":"5","tax":0}]}"#
            .to_string()
    }

    fn placed_salmon() -> String {
        cart_salmon().replace("initial", "Placed")
    }

    async fn reconciler_on_table_five(fake: &FakeTransport) -> Reconciler<&FakeTransport> {
        fake.respond(Endpoint::Tables, TABLES);
        fake.respond(Endpoint::Orders, &cart_salmon());
        let reconciler = Reconciler::new(Gateway::new(fake), "235");
        reconciler.refresh_tables(Refresh::Foreground).await.unwrap();
        reconciler.select_table("5").await.unwrap();
        reconciler
    }

    #[tokio::test]
    async fn test_place_order_scenario() {
        let fake = FakeTransport::new();
        let reconciler = reconciler_on_table_five(&fake).await;

        let state = reconciler.snapshot().await;
        assert_eq!(state.tables.len(), 2);
        assert_eq!(state.tables[0].guest_count, 2);
        assert_eq!(state.orders.len(), 1);
        assert_eq!(state.orders[0].food_name, "Grilled Salmon");
        assert_eq!(state.orders[0].status, OrderStatus::Cart);
        assert_eq!(state.bill().subtotal, Decimal::from(85));

        // the backend flips the item once the place call went through
        let placed = Arc::new(AtomicBool::new(false));
        let flag = placed.clone();
        fake.respond_with(Endpoint::PlaceOrder, move |_| {
            flag.store(true, Ordering::SeqCst);
            Ok(r#"{"success":true}"#.to_string())
        });
        let flag = placed.clone();
        fake.respond_with(Endpoint::Orders, move |_| {
            Ok(if flag.load(Ordering::SeqCst) { placed_salmon() } else { cart_salmon() })
        });

        reconciler.place_cart_items("5", "007", "no rush").await.unwrap();
        let sent = fake.last(Endpoint::PlaceOrder).unwrap();
        assert_eq!(sent.get("waiter_code"), Some("007"));
        assert_eq!(sent.get("master_order_id"), Some("m1"));
        assert_eq!(sent.get("note"), Some("no rush"));
        assert_eq!(sent.get("rs_id"), Some("235"));

        let state = reconciler.snapshot().await;
        assert_eq!(state.orders[0].status, OrderStatus::Occupied);
        assert_eq!(state.bill().grand_total, Decimal::from(85));
        assert_eq!(reconciler.mutations_in_flight(), 0);
    }

    #[tokio::test]
    async fn test_place_requires_waiter_code_and_cart_items() {
        let fake = FakeTransport::new();
        let reconciler = reconciler_on_table_five(&fake).await;

        let err = reconciler.place_cart_items("5", "  ", "").await.unwrap_err();
        assert!(matches!(err, WaiterError::Validation { .. }));
        let err = reconciler.place_cart_items("6", "007", "").await.unwrap_err();
        assert!(matches!(err, WaiterError::Validation { .. }));
        assert_eq!(fake.count(Endpoint::PlaceOrder), 0);
        assert!(reconciler.snapshot().await.last_error.is_some());
    }

    #[tokio::test]
    async fn test_waiter_code_policy_is_configurable() {
        let fake = FakeTransport::new();
        fake.respond(Endpoint::Tables, TABLES);
        fake.respond(Endpoint::Orders, &cart_salmon());
        let reconciler = Reconciler::new(Gateway::new(&fake), "235")
            .with_policy(WaiterCodePolicy { min_len: 3 }, AddItemMode::Direct);
        reconciler.refresh_tables(Refresh::Silent).await.unwrap();
        reconciler.select_table("5").await.unwrap();

        let err = reconciler.place_cart_items("5", "07", "").await.unwrap_err();
        assert!(err.to_string().contains("at least 3"));
        reconciler.place_cart_items("5", "007", "").await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_state_untouched() {
        let fake = FakeTransport::new();
        let reconciler = reconciler_on_table_five(&fake).await;
        let before = reconciler.snapshot().await;
        let orders_fetches = fake.count(Endpoint::Orders);

        fake.respond(Endpoint::DeleteItem, r#"Notice <br>{"error":"Invalid waiter code"}"#);
        let err = reconciler.delete_item("1", "999").await.unwrap_err();
        assert!(matches!(err, WaiterError::ServerRejected { .. }));

        let after = reconciler.snapshot().await;
        assert_eq!(after.orders, before.orders);
        assert_eq!(fake.count(Endpoint::Orders), orders_fetches);
        assert_eq!(
            after.last_error.as_deref(),
            Some("server rejected the request: Invalid waiter code")
        );
        reconciler.dismiss_error().await;
        assert!(reconciler.snapshot().await.last_error.is_none());
    }

    #[tokio::test]
    async fn test_transport_failure_on_mutation() {
        let fake = FakeTransport::new();
        let reconciler = reconciler_on_table_five(&fake).await;
        fake.respond_with(Endpoint::PlaceOrder, |_| Err(WaiterError::ServerStatus { code: 500 }));
        let err = reconciler.place_cart_items("5", "007", "").await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(reconciler.snapshot().await.orders[0].status, OrderStatus::Cart);
        // mutations are never retried
        assert_eq!(fake.count(Endpoint::PlaceOrder), 1);
    }

    #[tokio::test]
    async fn test_delete_refetches_instead_of_removing() {
        let fake = FakeTransport::new();
        let reconciler = reconciler_on_table_five(&fake).await;
        // the backend silently kept the item
        reconciler.delete_item("1", "007").await.unwrap();
        assert_eq!(reconciler.snapshot().await.orders.len(), 1);

        fake.respond(Endpoint::Orders, r#"{"order_items":[],"orders_info":[]}"#);
        reconciler.delete_item("1", "007").await.unwrap();
        assert!(reconciler.snapshot().await.orders.is_empty());
    }

    #[tokio::test]
    async fn test_confirm_transitions_only_forward() {
        let fake = FakeTransport::new();
        let reconciler = reconciler_on_table_five(&fake).await;

        // a cart item cannot be confirmed
        assert!(reconciler.confirm_item("1", "007", "").await.is_err());

        fake.respond(Endpoint::Orders, &placed_salmon());
        reconciler.refresh(Refresh::Foreground).await.unwrap();
        reconciler.confirm_item("1", "007", "").await.unwrap();
        assert_eq!(fake.last(Endpoint::ConfirmItem).unwrap().get("item_id"), Some("1"));

        fake.respond(Endpoint::Orders, &cart_salmon().replace("initial", "Confirmed"));
        reconciler.refresh(Refresh::Foreground).await.unwrap();
        let err = reconciler.confirm_item("1", "007", "").await.unwrap_err();
        assert!(err.to_string().contains("already confirmed"));
        assert!(reconciler.edit_item("1", 2, "").await.is_err());
        assert!(reconciler.confirm_all("m1", "007", "").await.is_err());
        assert_eq!(fake.count(Endpoint::ConfirmItem), 1);
        assert_eq!(fake.count(Endpoint::ConfirmAllItems), 0);
    }

    #[tokio::test]
    async fn test_confirm_all() {
        let fake = FakeTransport::new();
        let reconciler = reconciler_on_table_five(&fake).await;
        fake.respond(Endpoint::Orders, &placed_salmon());
        reconciler.refresh(Refresh::Foreground).await.unwrap();
        reconciler.confirm_all("m1", "007", "table by the window").await.unwrap();
        let sent = fake.last(Endpoint::ConfirmAllItems).unwrap();
        assert_eq!(sent.get("master_order_id"), Some("m1"));
        assert_eq!(sent.get("note"), Some("table by the window"));
    }

    #[tokio::test]
    async fn test_edit_item_dedups_preferences() {
        let fake = FakeTransport::new();
        let reconciler = reconciler_on_table_five(&fake).await;
        fake.respond(Endpoint::Orders, &placed_salmon());
        reconciler.refresh(Refresh::Foreground).await.unwrap();

        assert!(reconciler.edit_item("1", 0, "").await.is_err());
        reconciler
            .edit_item("1", 3, "Extra Lemon @ extra lemon@@No Ice")
            .await
            .unwrap();
        let sent = fake.last(Endpoint::EditItem).unwrap();
        assert_eq!(sent.get("quantity"), Some("3"));
        assert_eq!(sent.get("preferences"), Some("Extra Lemon@No Ice"));
    }

    #[tokio::test]
    async fn test_add_item_modes() {
        let fake = FakeTransport::new();
        let reconciler = reconciler_on_table_five(&fake).await;
        let prefs = vec!["No Ice".to_string(), "no ice".to_string()];
        reconciler.add_item("food_beef_01", 2, &prefs, "007").await.unwrap();
        let sent = fake.last(Endpoint::AddItem).unwrap();
        assert_eq!(sent.get("status"), Some("Placed"));
        assert_eq!(sent.get("preferences"), Some("No Ice"));
        assert_eq!(sent.get("table_no"), Some("5"));
        assert_eq!(sent.get("master_order_id"), Some("m1"));

        let staged = Reconciler::new(Gateway::new(&fake), "235")
            .with_policy(WaiterCodePolicy::default(), AddItemMode::Staged);
        staged.refresh_tables(Refresh::Silent).await.unwrap();
        staged.select_table("5").await.unwrap();
        staged.add_item("food_beef_01", 1, &[], "007").await.unwrap();
        assert_eq!(fake.last(Endpoint::AddItem).unwrap().get("status"), Some("initial"));

        let bad = vec!["Half@Half".to_string()];
        assert!(matches!(
            staged.add_item("food_beef_01", 1, &bad, "007").await,
            Err(WaiterError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_add_item_needs_open_order() {
        let fake = FakeTransport::new();
        fake.respond(Endpoint::Tables, TABLES);
        let reconciler = Reconciler::new(Gateway::new(&fake), "235");
        assert!(reconciler.add_item("food_beef_01", 1, &[], "007").await.is_err());
        reconciler.refresh_tables(Refresh::Silent).await.unwrap();
        reconciler.select_table("6").await.unwrap();
        let err = reconciler.add_item("food_beef_01", 1, &[], "007").await.unwrap_err();
        assert!(err.to_string().contains("no open order"));
        assert_eq!(fake.count(Endpoint::AddItem), 0);
    }

    #[tokio::test]
    async fn test_create_order() {
        let fake = FakeTransport::new();
        let reconciler = reconciler_on_table_five(&fake).await;
        reconciler.back_to_tables().await;

        let err = reconciler.create_order("5", "007", "pw", 2).await.unwrap_err();
        assert!(err.to_string().contains("already occupied"));
        assert!(reconciler.create_order("6", "007", "", 2).await.is_err());
        assert!(reconciler.create_order("6", "007", "pw", 0).await.is_err());

        let opened = TABLES.replace(
            r#""status":"inactive","guest_count":0,"tax":0}"#,
            r#""status":"occupied","guest_count":3,"tax":4,"master_order_id":"m2"}"#,
        );
        fake.respond(Endpoint::Tables, &opened);
        fake.respond(Endpoint::Orders, r#"{"order_items":[]}"#);
        reconciler.create_order("6", "007", "pw", 3).await.unwrap();

        let sent = fake.last(Endpoint::CreateOrder).unwrap();
        assert_eq!(sent.get("guest_count"), Some("3"));
        assert_eq!(sent.get("password"), Some("pw"));
        let state = reconciler.snapshot().await;
        assert_eq!(state.view, View::Table("6".to_string()));
        assert_eq!(state.master_order_id().as_deref(), Some("m2"));
        assert_eq!(state.tax(), Decimal::from(4));
        assert_eq!(
            fake.last(Endpoint::Orders).unwrap().get("master_order_id"),
            Some("m2")
        );
    }

    #[tokio::test]
    async fn test_stale_orders_response_is_discarded() {
        let fake = FakeTransport::new();
        fake.respond(
            Endpoint::Tables,
            r#"{"tables":[{"table_no":"A","status":"occupied","master_order_id":"ma"},
                          {"table_no":"B","status":"occupied","master_order_id":"mb"}]}"#,
        );
        fake.respond_with(Endpoint::Orders, |req| {
            let no = req.get("table_no").unwrap_or_default();
            Ok(format!(
                r#"{{"order_items":[{{"id":"{no}-1","food_name":"dish of {no}","food_item_price":10,"status":"Placed"}}]}}"#
            ))
        });
        let reconciler = Reconciler::new(Gateway::new(&fake), "235");
        reconciler.refresh_tables(Refresh::Silent).await.unwrap();

        let gate = fake.gate(Endpoint::Orders, "A");
        let (a, b) = tokio::join!(reconciler.select_table("A"), async {
            reconciler.select_table("B").await.unwrap();
            gate.notify_one();
        });
        a.unwrap();
        let () = b;

        let state = reconciler.snapshot().await;
        assert_eq!(state.view, View::Table("B".to_string()));
        assert_eq!(state.orders.len(), 1);
        assert_eq!(state.orders[0].food_name, "dish of B");
    }

    #[tokio::test]
    async fn test_silent_refresh_swallows_errors() {
        let fake = FakeTransport::new();
        let reconciler = reconciler_on_table_five(&fake).await;
        fake.respond_with(Endpoint::Orders, |_| {
            Err(WaiterError::Transport { message: "timed out".to_string() })
        });

        reconciler.refresh(Refresh::Silent).await.unwrap();
        let state = reconciler.snapshot().await;
        assert!(state.sync_degraded);
        assert!(state.last_error.is_none());
        assert_eq!(state.orders.len(), 1);

        let err = reconciler.refresh(Refresh::Foreground).await.unwrap_err();
        assert!(err.is_transport());
        let state = reconciler.snapshot().await;
        assert!(!state.is_loading());
        assert!(state.last_error.unwrap().contains("timed out"));

        fake.respond(Endpoint::Orders, &cart_salmon());
        reconciler.refresh(Refresh::Silent).await.unwrap();
        assert!(!reconciler.snapshot().await.sync_degraded);
    }

    #[tokio::test]
    async fn test_silent_refresh_degrades_on_rejection() {
        let fake = FakeTransport::new();
        let reconciler = reconciler_on_table_five(&fake).await;
        fake.respond(Endpoint::Orders, r#"{"status":"error","message":"db down"}"#);

        reconciler.refresh(Refresh::Silent).await.unwrap();
        let state = reconciler.snapshot().await;
        assert!(state.sync_degraded);
        assert!(state.last_error.is_none());
        assert_eq!(state.orders.len(), 1);
    }

    #[tokio::test]
    async fn test_menu_loaded_once_per_visit() {
        let fake = FakeTransport::new();
        fake.respond(Endpoint::Menu, r#"[{"id":"1","food_name":"Grilled Salmon","Price":85}]"#);
        let reconciler = reconciler_on_table_five(&fake).await;
        assert_eq!(reconciler.snapshot().await.menu.unwrap().items.len(), 1);
        reconciler.refresh(Refresh::Foreground).await.unwrap();
        reconciler.load_menu().await.unwrap();
        assert_eq!(fake.count(Endpoint::Menu), 1);

        reconciler.back_to_tables().await;
        assert!(reconciler.snapshot().await.menu.is_none());
        reconciler.select_table("5").await.unwrap();
        assert_eq!(fake.count(Endpoint::Menu), 2);
    }
}
