use crate::assistant::util::time;
use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FoodType {
    Veg,
    NonVeg,
}

impl FoodType {
    pub fn from_wire(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("veg") {
            FoodType::Veg
        } else {
            FoodType::NonVeg
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Category {
    pub cat_id: String,
    pub category_name: String,
    pub sort_order: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Promotion {
    pub enabled: bool,
    pub title: Option<String>,
    /// ISO dates, a missing bound leaves that side open
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// comma separated weekday names, missing means every day
    pub weekdays: Option<String>,
    pub offer_price: Option<String>,
}

impl Promotion {
    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        if !self.enabled {
            return false;
        }
        let iso = day.format("%Y-%m-%d").to_string();
        if let Some(start) = non_blank(&self.start_date) {
            if iso.as_str() < start {
                return false;
            }
        }
        if let Some(end) = non_blank(&self.end_date) {
            if iso.as_str() > end {
                return false;
            }
        }
        if let Some(days) = non_blank(&self.weekdays) {
            let today = weekday_name(day.weekday());
            if !days
                .split(',')
                .any(|d| d.trim().eq_ignore_ascii_case(today))
            {
                return false;
            }
        }
        true
    }

    pub fn is_active(&self) -> bool {
        self.is_active_on(time::today())
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MenuItem {
    pub id: String,
    pub food_name: String,
    pub category_id: String,
    pub price: Decimal,
    pub currency: String,
    pub food_type: FoodType,
    pub image_thumb: Option<String>,
    pub image_large: Option<String>,
    pub sort_order: i64,
    pub promotion: Promotion,
}

impl MenuItem {
    fn offer_price(&self) -> Option<Decimal> {
        non_blank(&self.promotion.offer_price).and_then(|p| Decimal::from_str(p).ok())
    }

    /// price the guest pays today
    pub fn effective_price_on(&self, day: NaiveDate) -> Decimal {
        if self.promotion.is_active_on(day) {
            if let Some(offer) = self.offer_price() {
                return offer;
            }
        }
        self.price
    }

    pub fn is_free_on(&self, day: NaiveDate) -> bool {
        self.promotion.is_active_on(day) && self.offer_price().unwrap_or(Decimal::ZERO).is_zero()
    }

    pub fn effective_price(&self) -> Decimal {
        self.effective_price_on(time::today())
    }

    pub fn is_free(&self) -> bool {
        self.is_free_on(time::today())
    }

    pub fn image_url(&self, base: &str) -> Option<String> {
        let path = non_blank(&self.image_thumb).or_else(|| non_blank(&self.image_large))?;
        if path.starts_with("http") {
            Some(path.to_string())
        } else {
            Some(format!("{}{}", base, path))
        }
    }
}

/// reference data fetched once per table-viewing session
#[derive(Debug, Clone, Default)]
pub(crate) struct MenuCatalog {
    pub categories: Vec<Category>,
    pub items: Vec<MenuItem>,
}

impl MenuCatalog {
    pub fn new(mut categories: Vec<Category>, items: Vec<MenuItem>) -> Self {
        categories.sort_by_key(|c| c.sort_order);
        Self { categories, items }
    }

    /// `category` of None selects every category
    pub fn filter(&self, category: Option<&str>, query: &str) -> Vec<&MenuItem> {
        let query = query.to_lowercase();
        let mut items = self
            .items
            .iter()
            .filter(|item| category.map_or(true, |c| item.category_id == c))
            .filter(|item| item.food_name.to_lowercase().contains(&query))
            .collect::<Vec<_>>();
        items.sort_by_key(|item| item.sort_order);
        items
    }

    pub fn find(&self, id: &str) -> Option<&MenuItem> {
        let id = id.trim();
        self.items.iter().find(|item| item.id == id)
    }
}
