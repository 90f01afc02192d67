//! typed calls against the backend, every response goes through the normalizer

pub(crate) mod endpoint;
pub(crate) mod fields;
pub(crate) mod normalizer;
pub(crate) mod transport;

use crate::assistant::controller::error::WaiterResult;
use crate::assistant::model::menu::{Category, MenuItem};
use crate::assistant::model::order::{OrderList, OrderStatus};
use crate::assistant::model::preference::ItemPreference;
use crate::assistant::model::session::Credentials;
use crate::assistant::model::table::TableList;
use endpoint::Endpoint;
use log::info;
use serde_json::Value;
use transport::{ApiRequest, Transport};

pub(crate) struct Gateway<T: Transport> {
    transport: T,
}

/// the new line for `add_item`
#[derive(Debug, Clone)]
pub(crate) struct NewItem<'a> {
    pub table_no: &'a str,
    pub master_order_id: &'a str,
    pub food_id: &'a str,
    pub quantity: u32,
    pub preferences: &'a str,
    pub waiter_code: &'a str,
    pub status: OrderStatus,
}

impl<T: Transport> Gateway<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    async fn call(&self, request: ApiRequest) -> WaiterResult<Value> {
        let text = self.transport.send(&request).await?;
        normalizer::parse_body(request.endpoint, &text)
    }

    /// mutations only report success, details are always re-fetched afterwards
    async fn mutate(&self, request: ApiRequest) -> WaiterResult<()> {
        let endpoint = request.endpoint;
        let value = self.call(request).await?;
        normalizer::check_rejection(&value)?;
        info!("{} acknowledged", endpoint.name());
        Ok(())
    }

    pub async fn login(&self, username: &str, password: &str) -> WaiterResult<Credentials> {
        let request = ApiRequest::new(Endpoint::Auth)
            .param("username", username)
            .param("password", password);
        normalizer::credentials(&self.call(request).await?)
    }

    pub async fn tables(&self, rs_id: &str) -> WaiterResult<TableList> {
        let request = ApiRequest::new(Endpoint::Tables).param("rs_id", rs_id);
        normalizer::tables(&self.call(request).await?)
    }

    pub async fn orders(
        &self,
        rs_id: &str,
        table_no: &str,
        master_order_id: Option<&str>,
    ) -> WaiterResult<OrderList> {
        let mut request = ApiRequest::new(Endpoint::Orders)
            .param("rs_id", rs_id)
            .param("table_no", table_no);
        if let Some(id) = master_order_id {
            request = request.param("master_order_id", id);
        }
        normalizer::orders(&self.call(request).await?)
    }

    pub async fn menu(&self, rs_id: &str) -> WaiterResult<Vec<MenuItem>> {
        let request = ApiRequest::new(Endpoint::Menu).param("rs_id", rs_id);
        normalizer::menu_items(&self.call(request).await?)
    }

    pub async fn categories(&self, rs_id: &str) -> WaiterResult<Vec<Category>> {
        let request = ApiRequest::new(Endpoint::Categories).param("rs_id", rs_id);
        normalizer::categories(&self.call(request).await?)
    }

    pub async fn preferences(&self, rs_id: &str, food_id: &str) -> WaiterResult<Vec<ItemPreference>> {
        let request = ApiRequest::new(Endpoint::Preferences)
            .param("rs_id", rs_id)
            .param("food_id", food_id);
        normalizer::item_preferences(&self.call(request).await?)
    }

    pub async fn create_order(
        &self,
        rs_id: &str,
        table_no: &str,
        waiter_code: &str,
        password: &str,
        guest_count: u32,
    ) -> WaiterResult<()> {
        self.mutate(
            ApiRequest::new(Endpoint::CreateOrder)
                .param("rs_id", rs_id)
                .param("table_no", table_no)
                .param("waiter_code", waiter_code)
                .param("password", password)
                .param("guest_count", guest_count.to_string()),
        )
        .await
    }

    pub async fn add_item(&self, rs_id: &str, item: &NewItem<'_>) -> WaiterResult<()> {
        self.mutate(
            ApiRequest::new(Endpoint::AddItem)
                .param("rs_id", rs_id)
                .param("table_no", item.table_no)
                .param("master_order_id", item.master_order_id)
                .param("food_id", item.food_id)
                .param("quantity", item.quantity.to_string())
                .param("preferences", item.preferences)
                .param("waiter_code", item.waiter_code)
                .param("status", item.status.as_wire()),
        )
        .await
    }

    pub async fn place_order(
        &self,
        rs_id: &str,
        table_no: &str,
        master_order_id: &str,
        waiter_code: &str,
        note: &str,
    ) -> WaiterResult<()> {
        self.mutate(
            ApiRequest::new(Endpoint::PlaceOrder)
                .param("rs_id", rs_id)
                .param("table_no", table_no)
                .param("master_order_id", master_order_id)
                .param("waiter_code", waiter_code)
                .param("note", note),
        )
        .await
    }

    pub async fn confirm_item(&self, rs_id: &str, item_id: &str, waiter_code: &str, note: &str) -> WaiterResult<()> {
        self.mutate(
            ApiRequest::new(Endpoint::ConfirmItem)
                .param("rs_id", rs_id)
                .param("item_id", item_id)
                .param("waiter_code", waiter_code)
                .param("note", note),
        )
        .await
    }

    pub async fn confirm_all_items(
        &self,
        rs_id: &str,
        master_order_id: &str,
        waiter_code: &str,
        note: &str,
    ) -> WaiterResult<()> {
        self.mutate(
            ApiRequest::new(Endpoint::ConfirmAllItems)
                .param("rs_id", rs_id)
                .param("master_order_id", master_order_id)
                .param("waiter_code", waiter_code)
                .param("note", note),
        )
        .await
    }

    pub async fn edit_item(&self, rs_id: &str, item_id: &str, quantity: u32, preferences: &str) -> WaiterResult<()> {
        self.mutate(
            ApiRequest::new(Endpoint::EditItem)
                .param("rs_id", rs_id)
                .param("item_id", item_id)
                .param("quantity", quantity.to_string())
                .param("preferences", preferences),
        )
        .await
    }

    pub async fn delete_item(&self, rs_id: &str, item_id: &str, waiter_code: &str) -> WaiterResult<()> {
        self.mutate(
            ApiRequest::new(Endpoint::DeleteItem)
                .param("rs_id", rs_id)
                .param("item_id", item_id)
                .param("waiter_code", waiter_code),
        )
        .await
    }
}
