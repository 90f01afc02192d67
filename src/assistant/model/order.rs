use crate::assistant::model::preference::Preference;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// lifecycle of one order line, only ever moves forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub(crate) enum OrderStatus {
    /// drafted, not yet sent to the kitchen
    Cart,
    Occupied,
    Confirmed,
    Prepared,
}

impl OrderStatus {
    pub fn as_wire(&self) -> &'static str {
        match self {
            OrderStatus::Cart => "initial",
            OrderStatus::Occupied => "Placed",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Prepared => "Delivered",
        }
    }

    pub fn from_wire(raw: &str) -> Self {
        let raw = raw.trim().to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| raw.contains(w));
        if has(&["deliver", "prepared", "ready", "served"]) {
            OrderStatus::Prepared
        } else if has(&["confirm"]) {
            OrderStatus::Confirmed
        } else if has(&["placed", "occupied", "pending", "ordered"]) {
            OrderStatus::Occupied
        } else {
            OrderStatus::Cart
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Cart => "In Cart",
            OrderStatus::Occupied => "Placed",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Prepared => "Prepared",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct OrderItem {
    pub id: String,
    pub food_id: String,
    pub food_name: String,
    pub food_item_price: Decimal,
    pub food_quantity: u32,
    pub status: OrderStatus,
    pub preferences: Vec<Preference>,
    pub order_taken_by: String,
    pub note: String,
    pub master_order_id: String,
    pub sub_id: String,
}

impl OrderItem {
    pub fn line_total(&self) -> Decimal {
        self.food_item_price * Decimal::from(self.food_quantity)
    }
}

/// aggregate metadata of one guest visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct OrderInfo {
    pub master_order_id: String,
    pub table_no: String,
    pub payment_status: String,
    pub placed_time: String,
    pub tax: Decimal,
    pub order_type: String,
}

#[derive(Debug, Default)]
pub(crate) struct OrderList {
    pub items: Vec<OrderItem>,
    pub info: Option<OrderInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_vocabulary() {
        assert_eq!(OrderStatus::from_wire("initial"), OrderStatus::Cart);
        assert_eq!(OrderStatus::from_wire(""), OrderStatus::Cart);
        assert_eq!(OrderStatus::from_wire("Placed"), OrderStatus::Occupied);
        assert_eq!(OrderStatus::from_wire("occupied"), OrderStatus::Occupied);
        assert_eq!(OrderStatus::from_wire("CONFIRMED"), OrderStatus::Confirmed);
        assert_eq!(OrderStatus::from_wire("Delivered"), OrderStatus::Prepared);
        assert_eq!(OrderStatus::from_wire("ready to serve"), OrderStatus::Prepared);
        for status in [
            OrderStatus::Cart,
            OrderStatus::Occupied,
            OrderStatus::Confirmed,
            OrderStatus::Prepared,
        ] {
            assert_eq!(OrderStatus::from_wire(status.as_wire()), status);
        }
    }

    #[test]
    fn test_status_order_is_lifecycle_order() {
        assert!(OrderStatus::Cart < OrderStatus::Occupied);
        assert!(OrderStatus::Occupied < OrderStatus::Confirmed);
        assert!(OrderStatus::Confirmed < OrderStatus::Prepared);
    }
}
