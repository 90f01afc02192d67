use crate::assistant::model::order::{OrderInfo, OrderItem, OrderStatus};
use crate::assistant::model::table::Table;
use rust_decimal::Decimal;

/// Σ price × quantity
pub(crate) fn total<'a, I>(items: I) -> Decimal
where
    I: IntoIterator<Item = &'a OrderItem>,
{
    items.into_iter().map(OrderItem::line_total).sum()
}

pub(crate) fn grand_total(items: &[OrderItem], tax: Decimal) -> Decimal {
    total(items) + tax
}

/// order info wins over the table snapshot, missing both means no tax
pub(crate) fn effective_tax(info: Option<&OrderInfo>, table: Option<&Table>) -> Decimal {
    info.map(|i| i.tax)
        .or_else(|| table.map(|t| t.tax))
        .unwrap_or(Decimal::ZERO)
}

#[derive(Debug)]
pub(crate) struct Section<'a> {
    pub status: OrderStatus,
    pub items: Vec<&'a OrderItem>,
    pub subtotal: Decimal,
}

/// the bill of the viewed table, always derived from the current list
#[derive(Debug)]
pub(crate) struct Bill<'a> {
    pub sections: Vec<Section<'a>>,
    pub tax: Decimal,
    pub subtotal: Decimal,
    pub grand_total: Decimal,
}

impl<'a> Bill<'a> {
    pub fn of(items: &'a [OrderItem], tax: Decimal) -> Self {
        let sections = [
            OrderStatus::Cart,
            OrderStatus::Occupied,
            OrderStatus::Confirmed,
            OrderStatus::Prepared,
        ]
        .into_iter()
        .map(|status| {
            let items = items.iter().filter(|i| i.status == status).collect::<Vec<_>>();
            Section {
                status,
                subtotal: total(items.iter().copied()),
                items,
            }
        })
        .collect();
        Self {
            sections,
            tax,
            subtotal: total(items),
            grand_total: grand_total(items, tax),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::model::table::TableStatus;

    fn item(id: &str, price: i64, qty: u32, status: OrderStatus) -> OrderItem {
        OrderItem {
            id: id.to_string(),
            food_id: format!("food-{id}"),
            food_name: format!("dish {id}"),
            food_item_price: Decimal::from(price),
            food_quantity: qty,
            status,
            preferences: vec![],
            order_taken_by: "Staff".to_string(),
            note: String::new(),
            master_order_id: "m1".to_string(),
            sub_id: String::new(),
        }
    }

    #[test]
    fn test_totals() {
        let items = vec![
            item("1", 85, 1, OrderStatus::Cart),
            item("2", 145, 2, OrderStatus::Confirmed),
            item("3", 45, 1, OrderStatus::Prepared),
        ];
        assert_eq!(total(&items), Decimal::from(420));
        assert_eq!(grand_total(&items, Decimal::from(15)), Decimal::from(435));
        assert_eq!(grand_total(&[], Decimal::from(15)), Decimal::from(15));
    }

    #[test]
    fn test_grand_total_independent_of_order() {
        let mut items = vec![
            item("1", 12, 3, OrderStatus::Occupied),
            item("2", 7, 1, OrderStatus::Cart),
            item("3", 30, 2, OrderStatus::Prepared),
        ];
        let tax = Decimal::new(250, 2);
        let forward = grand_total(&items, tax);
        items.reverse();
        assert_eq!(grand_total(&items, tax), forward);
        items.remove(1);
        assert_eq!(grand_total(&items, tax), Decimal::new(9850, 2));
    }

    #[test]
    fn test_effective_tax() {
        let table = Table {
            table_no: "5".to_string(),
            status: TableStatus::Occupied,
            guest_count: 2,
            tax: Decimal::from(10),
            master_order_id: None,
        };
        let info = OrderInfo {
            master_order_id: "m1".to_string(),
            table_no: "5".to_string(),
            payment_status: "unpaid".to_string(),
            placed_time: String::new(),
            tax: Decimal::from(12),
            order_type: "dine-in".to_string(),
        };
        assert_eq!(effective_tax(Some(&info), Some(&table)), Decimal::from(12));
        assert_eq!(effective_tax(None, Some(&table)), Decimal::from(10));
        assert_eq!(effective_tax(None, None), Decimal::ZERO);
    }

    #[test]
    fn test_bill_sections() {
        let items = vec![
            item("1", 85, 1, OrderStatus::Cart),
            item("2", 145, 2, OrderStatus::Confirmed),
            item("3", 20, 1, OrderStatus::Cart),
        ];
        let bill = Bill::of(&items, Decimal::from(15));
        let statuses = bill.sections.iter().map(|s| s.status).collect::<Vec<_>>();
        assert_eq!(
            statuses,
            vec![OrderStatus::Cart, OrderStatus::Occupied, OrderStatus::Confirmed, OrderStatus::Prepared]
        );
        let cart = &bill.sections[0];
        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.subtotal, Decimal::from(105));
        assert!(bill.sections[1].items.is_empty());
        assert_eq!(bill.subtotal, Decimal::from(395));
        assert_eq!(bill.grand_total, Decimal::from(410));
    }
}
