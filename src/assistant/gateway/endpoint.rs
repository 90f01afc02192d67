#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Endpoint {
    Tables,
    Orders,
    Auth,
    Menu,
    Categories,
    Preferences,
    AddItem,
    PlaceOrder,
    DeleteItem,
    ConfirmItem,
    ConfirmAllItems,
    EditItem,
    CreateOrder,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Tables => "get_tables.php",
            Endpoint::Orders => "get_orders.php",
            Endpoint::Auth => "login.php",
            Endpoint::Menu => "get_menu.php",
            Endpoint::Categories => "get_categories.php",
            Endpoint::Preferences => "get_preferences.php",
            Endpoint::AddItem => "add_item.php",
            Endpoint::PlaceOrder => "place_order.php",
            Endpoint::DeleteItem => "delete_item.php",
            Endpoint::ConfirmItem => "confirm_item.php",
            Endpoint::ConfirmAllItems => "confirm_all_items.php",
            Endpoint::EditItem => "edit_item.php",
            Endpoint::CreateOrder => "create_order.php",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Tables => "tables",
            Endpoint::Orders => "orders",
            Endpoint::Auth => "auth",
            Endpoint::Menu => "menu",
            Endpoint::Categories => "categories",
            Endpoint::Preferences => "preferences",
            Endpoint::AddItem => "add-item",
            Endpoint::PlaceOrder => "place-order",
            Endpoint::DeleteItem => "delete-item",
            Endpoint::ConfirmItem => "confirm-item",
            Endpoint::ConfirmAllItems => "confirm-all-items",
            Endpoint::EditItem => "edit-item",
            Endpoint::CreateOrder => "create-order",
        }
    }

    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Endpoint::AddItem
                | Endpoint::PlaceOrder
                | Endpoint::DeleteItem
                | Endpoint::ConfirmItem
                | Endpoint::ConfirmAllItems
                | Endpoint::EditItem
                | Endpoint::CreateOrder
        )
    }

    /// the body to assume when the backend answers with nothing usable,
    /// None means an unusable body is an error
    pub fn empty_default(&self) -> Option<&'static str> {
        match self {
            Endpoint::Tables => Some(r#"{"tables":[],"waiter_calls":[]}"#),
            Endpoint::Orders => Some(r#"{"order_items":[],"orders_info":[]}"#),
            Endpoint::Menu | Endpoint::Categories | Endpoint::Preferences => Some("[]"),
            Endpoint::Auth => None,
            _ => Some("{}"),
        }
    }

    /// list endpoints fall back to their default even on garbage,
    /// mutations only on an empty body
    pub fn defaults_on_garbage(&self) -> bool {
        !self.is_mutation() && self.empty_default().is_some()
    }
}
