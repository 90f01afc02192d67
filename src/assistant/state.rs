use crate::assistant::model::bill::{self, Bill};
use crate::assistant::model::menu::MenuCatalog;
use crate::assistant::model::order::{OrderInfo, OrderItem, OrderList, OrderStatus};
use crate::assistant::model::table::{Table, TableList, WaiterCall};
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum View {
    Tables,
    Table(String),
}

/// issued when a fetch starts, checked when its result comes back
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Ticket {
    pub view: View,
    pub seq: u64,
}

/// the reconciled picture of what the waiter is looking at
#[derive(Debug, Clone)]
pub(crate) struct ViewState {
    pub view: View,
    pub tables: Vec<Table>,
    pub waiter_calls: Vec<WaiterCall>,
    pub orders: Vec<OrderItem>,
    pub order_info: Option<OrderInfo>,
    pub menu: Option<MenuCatalog>,
    pub sync_degraded: bool,
    pub last_error: Option<String>,
    loading: usize,
    next_seq: u64,
    tables_seq: u64,
    orders_seq: u64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            view: View::Tables,
            tables: vec![],
            waiter_calls: vec![],
            orders: vec![],
            order_info: None,
            menu: None,
            sync_degraded: false,
            last_error: None,
            loading: 0,
            next_seq: 1,
            tables_seq: 0,
            orders_seq: 0,
        }
    }
}

impl ViewState {
    /// seed from a cached snapshot, everything stays stale until the next fetch
    pub fn from_cache(tables: Vec<Table>, current_table: Option<String>, orders: Vec<OrderItem>) -> Self {
        let mut state = Self {
            tables,
            ..Self::default()
        };
        if let Some(table_no) = current_table {
            state.view = View::Table(table_no);
            state.orders = orders;
        }
        state
    }

    pub fn ticket(&mut self) -> Ticket {
        let seq = self.next_seq;
        self.next_seq += 1;
        Ticket {
            view: self.view.clone(),
            seq,
        }
    }

    /// switch views, orders of the previous table never leak into the next one
    pub fn navigate(&mut self, view: View) {
        if self.view == view {
            return;
        }
        if matches!(view, View::Tables) {
            self.menu = None;
        }
        self.view = view;
        self.orders = vec![];
        self.order_info = None;
    }

    pub fn current_table_no(&self) -> Option<&str> {
        match &self.view {
            View::Table(no) => Some(no.as_str()),
            View::Tables => None,
        }
    }

    pub fn table(&self, table_no: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.table_no == table_no)
    }

    pub fn current_table(&self) -> Option<&Table> {
        self.current_table_no().and_then(|no| self.table(no))
    }

    /// whole-list swap, unless a later fetch already landed
    pub fn apply_tables(&mut self, ticket: &Ticket, list: TableList) -> bool {
        if ticket.seq <= self.tables_seq {
            return false;
        }
        self.tables_seq = ticket.seq;
        self.tables = list.tables;
        self.waiter_calls = list.waiter_calls;
        true
    }

    /// whole-list swap, only for the table still on screen
    pub fn apply_orders(&mut self, ticket: &Ticket, list: OrderList) -> bool {
        if ticket.view != self.view || ticket.seq <= self.orders_seq {
            return false;
        }
        self.orders_seq = ticket.seq;
        self.orders = list.items;
        self.order_info = list.info;
        true
    }

    pub fn master_order_id(&self) -> Option<String> {
        let from_info = self
            .order_info
            .as_ref()
            .map(|i| i.master_order_id.clone())
            .filter(|id| !id.is_empty());
        from_info
            .or_else(|| self.current_table().and_then(|t| t.master_order_id.clone()))
            .or_else(|| {
                self.orders
                    .iter()
                    .map(|i| i.master_order_id.clone())
                    .find(|id| !id.is_empty())
            })
    }

    pub fn item(&self, item_id: &str) -> Option<&OrderItem> {
        self.orders.iter().find(|i| i.id == item_id)
    }

    pub fn items_with(&self, status: OrderStatus) -> impl Iterator<Item = &OrderItem> {
        self.orders.iter().filter(move |i| i.status == status)
    }

    pub fn tax(&self) -> Decimal {
        bill::effective_tax(self.order_info.as_ref(), self.current_table())
    }

    /// recomputed on every call, never cached
    pub fn bill(&self) -> Bill<'_> {
        Bill::of(&self.orders, self.tax())
    }

    #[cfg(test)]
    pub fn is_loading(&self) -> bool {
        self.loading > 0
    }

    pub fn begin_loading(&mut self) {
        self.loading += 1;
    }

    pub fn end_loading(&mut self) {
        self.loading = self.loading.saturating_sub(1);
    }
}
