//! Candidate source keys per domain field.
//!
//! The backend names the same thing differently across endpoints and deployments,
//! so every field is probed through an ordered list of keys and the first key holding
//! a non-null value wins. New quirks are handled by extending the lists below.

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

pub(crate) type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Field {
    pub name: &'static str,
    pub candidates: &'static [&'static str],
}

const fn field(name: &'static str, candidates: &'static [&'static str]) -> Field {
    Field { name, candidates }
}

pub(crate) mod envelope {
    use super::{field, Field};

    pub const TABLES: Field = field("tables", &["tables", "data", "result"]);
    pub const WAITER_CALLS: Field = field("waiter_calls", &["waiter_calls", "calls", "waiter_call"]);
    pub const ORDER_ITEMS: Field = field("order_items", &["order_items", "items", "orders", "data"]);
    pub const ORDERS_INFO: Field = field("orders_info", &["orders_info", "order_info", "info"]);
    pub const LIST: Field = field("list", &["data", "items", "result", "menu", "categories", "preferences"]);
    pub const SUCCESS: Field = field("success", &["success"]);
    /// free-form, only explicit failure words count as a rejection
    pub const STATUS: Field = field("status", &["status"]);
    pub const ERROR: Field = field("error", &["error", "errors"]);
    pub const MESSAGE: Field = field("message", &["message", "msg", "error"]);
}

pub(crate) mod table {
    use super::{field, Field};

    pub const TABLE_NO: Field = field("table_no", &["table_no", "no", "table_id", "table_number", "id"]);
    pub const STATUS: Field = field("status", &["status", "table_status", "state"]);
    pub const GUEST_COUNT: Field = field("guest_count", &["guest_count", "guest_nos", "guests", "no_of_guests"]);
    pub const TAX: Field = field("tax", &["tax", "tax_amount", "vat"]);
    pub const MASTER_ORDER_ID: Field = field("master_order_id", &["master_order_id", "order_id", "master_id"]);
}

pub(crate) mod waiter_call {
    use super::{field, Field};

    pub const TABLE_NO: Field = field("table_no", &["table_no", "no", "table_id"]);
    pub const REQUEST: Field = field("request", &["request", "call_type", "type", "message"]);
    pub const CALLED_AT: Field = field("called_at", &["called_at", "created_at", "time"]);
}

pub(crate) mod order_item {
    use super::{field, Field};

    pub const ID: Field = field("id", &["id", "order_item_id", "sub_id"]);
    pub const FOOD_ID: Field = field("food_id", &["food_id", "Item_Id", "menu_id", "item_id"]);
    pub const FOOD_NAME: Field = field("food_name", &["food_name", "item_name", "name"]);
    pub const PRICE: Field = field("food_item_price", &["food_item_price", "item_price", "price", "Price"]);
    pub const QUANTITY: Field = field("food_quantity", &["food_quantity", "quantity", "qty"]);
    pub const STATUS: Field = field("status", &["status", "item_status", "order_status"]);
    pub const PREFERENCES: Field = field("preferences", &["preferences", "preference", "item_preferences"]);
    pub const TAKEN_BY: Field = field("order_taken_by", &["order_taken_by", "waiter_name", "taken_by"]);
    pub const NOTE: Field = field("note", &["note", "notes", "remarks"]);
    pub const MASTER_ORDER_ID: Field = field("master_order_id", &["master_order_id", "order_id"]);
    pub const SUB_ID: Field = field("sub_id", &["sub_id"]);
}

pub(crate) mod order_info {
    use super::{field, Field};

    pub const MASTER_ORDER_ID: Field = field("master_order_id", &["master_order_id", "order_id", "id"]);
    pub const TABLE_NO: Field = field("table_no", &["table_no", "table_id"]);
    pub const PAYMENT_STATUS: Field = field("payment_status", &["payment_status", "paid_status"]);
    pub const PLACED_TIME: Field = field("placed_time", &["placed_time", "created_at", "order_time"]);
    pub const TAX: Field = field("tax", &["tax", "tax_amount", "vat"]);
    pub const ORDER_TYPE: Field = field("order_type", &["order_type", "type"]);
}

pub(crate) mod menu_item {
    use super::{field, Field};

    pub const ID: Field = field("id", &["id", "food_id", "Item_Id"]);
    pub const FOOD_NAME: Field = field("food_name", &["food_name", "item_name", "name"]);
    pub const CATEGORY_ID: Field = field("CategoryID", &["CategoryID", "category_id", "cat_id"]);
    pub const PRICE: Field = field("Price", &["Price", "price", "food_item_price"]);
    pub const CURRENCY: Field = field("Currency", &["Currency", "currency"]);
    pub const FOOD_TYPE: Field = field("food_type", &["food_type", "type"]);
    pub const IMAGE_THUMB: Field = field("Image_Thumb", &["Image_Thumb", "image_thumb"]);
    pub const IMAGE_LARGE: Field = field("Image_Large", &["Image_Large", "image_large", "image"]);
    pub const SORT_ORDER: Field = field("sort_order", &["sort_order", "sort"]);
    pub const PROMOTION: Field = field("Promotion", &["Promotion", "promotion"]);
    pub const OFFER_TITLE: Field = field("offer_title", &["offer_title"]);
    pub const OFFER_START: Field = field("offer_start_date", &["offer_start_date"]);
    pub const OFFER_END: Field = field("offer_end_date", &["offer_end_date"]);
    pub const OFFER_WEEKDAYS: Field = field("offer_available_weekdays", &["offer_available_weekdays"]);
    pub const OFFER_PRICE: Field = field("offer_price", &["offer_price"]);
}

pub(crate) mod category {
    use super::{field, Field};

    pub const ID: Field = field("cat_id", &["cat_id", "CategoryID", "category_id", "id"]);
    pub const NAME: Field = field("category_name", &["category_name", "name"]);
    pub const SORT_ORDER: Field = field("sort_order", &["sort_order", "sort"]);
}

pub(crate) mod item_preference {
    use super::{field, Field};

    pub const ID: Field = field("id", &["id", "pref_id", "preference_id"]);
    pub const NAME: Field = field("name", &["name", "preference_name", "pref_name"]);
}

pub(crate) mod auth {
    use super::{field, Field};

    pub const USER: Field = field("user", &["user", "data"]);
    pub const RS_ID: Field = field("rsId", &["rsId", "rs_id", "restaurant_id", "session_id"]);
    pub const USER_ID: Field = field("id", &["id", "user_id"]);
    pub const USER_NAME: Field = field("name", &["name", "username", "user_name"]);
    pub const USER_ROLE: Field = field("role", &["role", "user_role"]);
    pub const RESTAURANT_NAME: Field = field("restaurantName", &["restaurantName", "restaurant_name"]);
}

/// first candidate holding a non-null value
pub(crate) fn probe<'a>(record: &'a Record, field: Field) -> Option<&'a Value> {
    field
        .candidates
        .iter()
        .filter_map(|key| record.get(*key))
        .find(|value| !value.is_null())
}

pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn text(record: &Record, field: Field) -> Option<String> {
    probe(record, field).and_then(scalar_text)
}

pub(crate) fn text_or(record: &Record, field: Field, default: &str) -> String {
    text(record, field)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// loose money parsing, garbage and negatives become zero
pub(crate) fn money(record: &Record, field: Field) -> Decimal {
    let Some(raw) = text(record, field) else {
        return Decimal::ZERO;
    };
    parse_money(&raw).unwrap_or(Decimal::ZERO).max(Decimal::ZERO)
}

pub(crate) fn parse_money(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    if let Ok(value) = Decimal::from_str(raw) {
        return Some(value);
    }
    if let Ok(value) = Decimal::from_scientific(raw) {
        return Some(value);
    }
    // strip currency codes and thousands separators, e.g. "AED 1,250.00"
    let cleaned = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect::<String>();
    Decimal::from_str(&cleaned).ok()
}

/// loose integer parsing clamped to `min`, unparsable input yields `default`
pub(crate) fn count(record: &Record, field: Field, default: i64, min: i64) -> i64 {
    let parsed = match probe(record, field) {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        _ => None,
    };
    parsed.unwrap_or(default).max(min)
}

/// `count` narrowed to `u32`, oversized values saturate instead of wrapping
pub(crate) fn count_u32(record: &Record, field: Field, default: u32, min: u32) -> u32 {
    let n = count(record, field, i64::from(default), i64::from(min));
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// a status that spells out failure: "error", "fail*", "false", "0", false or 0
pub(crate) fn failure_status(value: &Value) -> bool {
    match value {
        Value::Bool(b) => !*b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
        Value::String(s) => {
            let s = s.trim().to_lowercase();
            matches!(s.as_str(), "error" | "false" | "0") || s.starts_with("fail")
        }
        _ => false,
    }
}

/// truthy in the ways this backend spells it: true, 1, "1", "yes", "success", "true"
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "yes" | "true" | "success" | "ok"
        ),
        _ => false,
    }
}
