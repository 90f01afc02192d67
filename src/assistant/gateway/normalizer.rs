//! Turns raw response text into domain values.
//!
//! The backend is PHP and prints notices, warnings and `<br>` tags around its JSON,
//! so the payload is cut out between the first opening and the last closing
//! delimiter before parsing. List endpoints treat an unusable body as "nothing yet".

use crate::assistant::controller::error::{WaiterError, WaiterResult};
use crate::assistant::gateway::endpoint::Endpoint;
use crate::assistant::gateway::fields::{self, Record};
use crate::assistant::model::menu::{Category, FoodType, MenuItem, Promotion};
use crate::assistant::model::order::{OrderInfo, OrderItem, OrderList, OrderStatus};
use crate::assistant::model::preference::{self, ItemPreference, Preference};
use crate::assistant::model::session::{Credentials, User};
use crate::assistant::model::table::{Table, TableList, TableStatus, WaiterCall};
use log::{debug, warn};
use serde_json::Value;

const SNIPPET_LEN: usize = 120;
const DEFAULT_TAKEN_BY: &str = "Staff";

/// slice between the first `{`/`[` and the last `}`/`]`
pub(crate) fn extract_json(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let end = text.rfind(['}', ']'])?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

fn snippet(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(SNIPPET_LEN) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// parse a body into JSON, falling back to the endpoint's empty shape where one is safe
pub(crate) fn parse_body(endpoint: Endpoint, text: &str) -> WaiterResult<Value> {
    if text.trim().is_empty() {
        if let Some(default) = endpoint.empty_default() {
            debug!("{} returned an empty body, using empty default", endpoint.name());
            return serde_json::from_str(default).map_err(|e| invalid(endpoint, &e.to_string()));
        }
        return Err(invalid(endpoint, "empty body"));
    }

    let parsed = extract_json(text).and_then(|span| {
        if span.len() != text.trim().len() {
            warn!("stripped noise around {} payload: {}", endpoint.name(), snippet(text));
        }
        serde_json::from_str::<Value>(span).ok()
    });

    match parsed {
        Some(value) => Ok(value),
        None if endpoint.defaults_on_garbage() => {
            warn!("unparseable {} body, using empty default: {}", endpoint.name(), snippet(text));
            let default = endpoint.empty_default().unwrap_or("[]");
            serde_json::from_str(default).map_err(|e| invalid(endpoint, &e.to_string()))
        }
        None => Err(invalid(endpoint, text)),
    }
}

fn invalid(endpoint: Endpoint, text: &str) -> WaiterError {
    WaiterError::InvalidResponseFormat {
        endpoint: endpoint.name(),
        snippet: snippet(text),
    }
}

/// The backend said no when it sends an error field, a false `success` flag, or a
/// `status` spelling out failure. Other statuses ("200", "ok", "Placed") pass.
pub(crate) fn check_rejection(value: &Value) -> WaiterResult<()> {
    let Some(record) = value.as_object() else {
        return Ok(());
    };
    if let Some(error) = fields::probe(record, fields::envelope::ERROR) {
        let rejected = match error {
            Value::Bool(b) => *b,
            Value::String(s) => !s.trim().is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::Null => false,
        };
        if rejected {
            return Err(WaiterError::ServerRejected {
                message: rejection_message(record, error),
            });
        }
    }
    let refused = fields::probe(record, fields::envelope::SUCCESS).is_some_and(|flag| !fields::truthy(flag))
        || fields::probe(record, fields::envelope::STATUS).is_some_and(fields::failure_status);
    if refused {
        return Err(WaiterError::ServerRejected {
            message: fields::text(record, fields::envelope::MESSAGE)
                .filter(|m| !m.is_empty() && m != "false")
                .unwrap_or_else(|| "request was rejected".to_string()),
        });
    }
    Ok(())
}

fn rejection_message(record: &Record, error: &Value) -> String {
    fields::scalar_text(error)
        .filter(|m| !m.is_empty() && m != "true" && m != "1")
        .or_else(|| {
            record
                .get("message")
                .or_else(|| record.get("msg"))
                .and_then(fields::scalar_text)
        })
        .unwrap_or_else(|| error.to_string())
}

/// the array under the first matching envelope key, or the value itself when it is one
fn list<'a>(value: &'a Value, field: fields::Field) -> Vec<&'a Record> {
    let items = match value {
        Value::Array(items) => Some(items),
        Value::Object(record) => match fields::probe(record, field) {
            Some(Value::Array(items)) => Some(items),
            Some(Value::Object(single)) => return vec![single],
            _ => None,
        },
        _ => None,
    };
    let Some(items) = items else {
        return vec![];
    };
    let records = items.iter().filter_map(Value::as_object).collect::<Vec<_>>();
    if records.len() != items.len() {
        warn!(
            "skipped {} non-object entries in {}",
            items.len() - records.len(),
            field.name
        );
    }
    records
}

pub(crate) fn tables(value: &Value) -> WaiterResult<TableList> {
    check_rejection(value)?;
    let tables = list(value, fields::envelope::TABLES)
        .into_iter()
        .filter_map(table)
        .collect();
    let waiter_calls = match value {
        Value::Object(_) => list(value, fields::envelope::WAITER_CALLS)
            .into_iter()
            .filter_map(waiter_call)
            .collect(),
        _ => vec![],
    };
    Ok(TableList { tables, waiter_calls })
}

fn table(record: &Record) -> Option<Table> {
    use fields::table::*;

    let Some(table_no) = fields::text(record, TABLE_NO).filter(|no| !no.is_empty()) else {
        warn!("dropping table record without identifier: {:?}", record);
        return None;
    };
    let status = fields::text(record, STATUS)
        .map(|s| TableStatus::from_wire(&s))
        .unwrap_or(TableStatus::Inactive);
    let master_order_id = fields::text(record, MASTER_ORDER_ID).filter(|id| !id.is_empty() && id != "0");
    Some(Table {
        table_no,
        status,
        guest_count: fields::count_u32(record, GUEST_COUNT, 0, 0),
        tax: fields::money(record, TAX),
        master_order_id,
    })
}

fn waiter_call(record: &Record) -> Option<WaiterCall> {
    use fields::waiter_call::*;

    Some(WaiterCall {
        table_no: fields::text(record, TABLE_NO).filter(|no| !no.is_empty())?,
        request: fields::text_or(record, REQUEST, "call"),
        called_at: fields::text(record, CALLED_AT),
    })
}

pub(crate) fn orders(value: &Value) -> WaiterResult<OrderList> {
    check_rejection(value)?;
    let items = list(value, fields::envelope::ORDER_ITEMS)
        .into_iter()
        .filter_map(order_item)
        .collect();
    let info = match value {
        Value::Object(_) => list(value, fields::envelope::ORDERS_INFO)
            .into_iter()
            .next()
            .map(order_info),
        _ => None,
    };
    Ok(OrderList { items, info })
}

fn order_item(record: &Record) -> Option<OrderItem> {
    use fields::order_item::*;

    let Some(id) = fields::text(record, ID).filter(|id| !id.is_empty()) else {
        warn!("dropping order item without identifier: {:?}", record);
        return None;
    };
    Some(OrderItem {
        id,
        food_id: fields::text_or(record, FOOD_ID, ""),
        food_name: fields::text_or(record, FOOD_NAME, ""),
        food_item_price: fields::money(record, PRICE),
        food_quantity: fields::count_u32(record, QUANTITY, 1, 1),
        status: fields::text(record, STATUS)
            .map(|s| OrderStatus::from_wire(&s))
            .unwrap_or(OrderStatus::Cart),
        preferences: preferences(fields::probe(record, PREFERENCES)),
        order_taken_by: fields::text_or(record, TAKEN_BY, DEFAULT_TAKEN_BY),
        note: fields::text_or(record, NOTE, ""),
        master_order_id: fields::text_or(record, MASTER_ORDER_ID, ""),
        sub_id: fields::text_or(record, SUB_ID, ""),
    })
}

/// accepts `"a@b"`, `["a", "b"]` or `[{"name": "a"}]`
fn preferences(value: Option<&Value>) -> Vec<Preference> {
    match value {
        Some(Value::String(raw)) => preference::parse(raw).into_iter().map(Preference::named).collect(),
        Some(Value::Array(entries)) => {
            let candidates = entries.iter().filter_map(|entry| {
                let (name, price) = match entry {
                    Value::Object(record) => (
                        fields::text(record, fields::item_preference::NAME),
                        record
                            .get("price")
                            .and_then(fields::scalar_text)
                            .and_then(|p| fields::parse_money(&p))
                            .unwrap_or_default()
                            .max(Default::default()),
                    ),
                    other => (fields::scalar_text(other), Default::default()),
                };
                let name = name?.trim().to_string();
                Some(Preference { name, price })
            });
            preference::dedup_by(candidates, |p| p.name.as_str())
        }
        _ => vec![],
    }
}

fn order_info(record: &Record) -> OrderInfo {
    use fields::order_info::*;

    OrderInfo {
        master_order_id: fields::text_or(record, MASTER_ORDER_ID, ""),
        table_no: fields::text_or(record, TABLE_NO, ""),
        payment_status: fields::text_or(record, PAYMENT_STATUS, ""),
        placed_time: fields::text_or(record, PLACED_TIME, ""),
        tax: fields::money(record, TAX),
        order_type: fields::text_or(record, ORDER_TYPE, ""),
    }
}

pub(crate) fn credentials(value: &Value) -> WaiterResult<Credentials> {
    use fields::auth::*;

    check_rejection(value)?;
    let Some(record) = value.as_object() else {
        return Err(WaiterError::InvalidResponseFormat {
            endpoint: Endpoint::Auth.name(),
            snippet: snippet(&value.to_string()),
        });
    };
    let user_record = match fields::probe(record, USER) {
        Some(Value::Object(user)) => user,
        _ => record,
    };
    let rs_id = fields::text(record, RS_ID)
        .or_else(|| fields::text(user_record, RS_ID))
        .filter(|id| !id.is_empty())
        .ok_or(WaiterError::AuthIncomplete)?;
    Ok(Credentials {
        user: User {
            id: fields::text_or(user_record, USER_ID, ""),
            name: fields::text_or(user_record, USER_NAME, ""),
            role: fields::text_or(user_record, USER_ROLE, ""),
            restaurant_name: fields::text_or(user_record, RESTAURANT_NAME, ""),
        },
        rs_id,
    })
}

pub(crate) fn menu_items(value: &Value) -> WaiterResult<Vec<MenuItem>> {
    use fields::menu_item::*;

    check_rejection(value)?;
    Ok(list(value, fields::envelope::LIST)
        .into_iter()
        .filter_map(|record| {
            let id = fields::text(record, ID).filter(|id| !id.is_empty())?;
            Some(MenuItem {
                id,
                food_name: fields::text_or(record, FOOD_NAME, ""),
                category_id: fields::text_or(record, CATEGORY_ID, ""),
                price: fields::money(record, PRICE),
                currency: fields::text_or(record, CURRENCY, ""),
                food_type: FoodType::from_wire(&fields::text_or(record, FOOD_TYPE, "")),
                image_thumb: fields::text(record, IMAGE_THUMB),
                image_large: fields::text(record, IMAGE_LARGE),
                sort_order: fields::count(record, SORT_ORDER, 0, i64::MIN),
                promotion: Promotion {
                    enabled: fields::probe(record, PROMOTION).is_some_and(fields::truthy),
                    title: fields::text(record, OFFER_TITLE),
                    start_date: fields::text(record, OFFER_START),
                    end_date: fields::text(record, OFFER_END),
                    weekdays: fields::text(record, OFFER_WEEKDAYS),
                    offer_price: fields::text(record, OFFER_PRICE),
                },
            })
        })
        .collect())
}

pub(crate) fn categories(value: &Value) -> WaiterResult<Vec<Category>> {
    use fields::category::*;

    check_rejection(value)?;
    Ok(list(value, fields::envelope::LIST)
        .into_iter()
        .filter_map(|record| {
            Some(Category {
                cat_id: fields::text(record, ID).filter(|id| !id.is_empty())?,
                category_name: fields::text_or(record, NAME, ""),
                sort_order: fields::count(record, SORT_ORDER, 0, i64::MIN),
            })
        })
        .collect())
}

pub(crate) fn item_preferences(value: &Value) -> WaiterResult<Vec<ItemPreference>> {
    use fields::item_preference::*;

    check_rejection(value)?;
    let offered = list(value, fields::envelope::LIST).into_iter().filter_map(|record| {
        let name = fields::text(record, NAME)?.trim().to_string();
        Some(ItemPreference {
            id: fields::text_or(record, ID, &name),
            name,
        })
    });
    Ok(preference::dedup_by(offered, |p| p.name.as_str()))
}
