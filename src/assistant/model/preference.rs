//! preference wire format: names joined by `@`, e.g. `Extra Spicy@No Onions`

use crate::assistant::controller::error::{WaiterError, WaiterResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub(crate) const SEPARATOR: char = '@';

/// a preference attached to an order item, the backend never prices them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Preference {
    pub name: String,
    pub price: Decimal,
}

impl Preference {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: Decimal::ZERO,
        }
    }
}

/// a selectable preference offered for a menu item
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ItemPreference {
    pub id: String,
    pub name: String,
}

/// trim, drop blanks and keep the first spelling of case-insensitive duplicates
pub(crate) fn dedup<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    dedup_by(names.into_iter().map(|n| n.as_ref().trim().to_string()), |n| n.as_str())
}

/// `dedup` for records carrying a name, the first record of each name wins
pub(crate) fn dedup_by<T, F>(entries: impl IntoIterator<Item = T>, name: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for entry in entries {
        let key = name(&entry).trim().to_lowercase();
        if key.is_empty() || seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(entry);
    }
    out
}

pub(crate) fn parse(raw: &str) -> Vec<String> {
    dedup(raw.split(SEPARATOR))
}

/// a name carrying the separator would split into two preferences on the way back,
/// so it is rejected instead
pub(crate) fn serialize<S: AsRef<str>>(names: &[S]) -> WaiterResult<String> {
    if let Some(bad) = names.iter().find(|n| n.as_ref().contains(SEPARATOR)) {
        return Err(WaiterError::validation(format!(
            "preference '{}' must not contain '{}'",
            bad.as_ref().trim(),
            SEPARATOR
        )));
    }
    Ok(dedup(names).join(&SEPARATOR.to_string()))
}

/// the preference picker of the add-item flow
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct Selection {
    names: Vec<String>,
}

impl Selection {
    pub fn from_preferences(preferences: &[Preference]) -> Self {
        Self {
            names: dedup(preferences.iter().map(|p| p.name.as_str())),
        }
    }

    pub fn toggle(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        let key = name.to_lowercase();
        let before = self.names.len();
        self.names.retain(|n| n.to_lowercase() != key);
        if self.names.len() == before {
            self.names.push(name.to_string());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        let key = name.trim().to_lowercase();
        self.names.iter().any(|n| n.to_lowercase() == key)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn to_wire(&self) -> WaiterResult<String> {
        serialize(&self.names)
    }
}

/// case-insensitive name search over the offered preferences
pub(crate) fn search<'a>(offered: &'a [ItemPreference], query: &str) -> Vec<&'a ItemPreference> {
    let query = query.to_lowercase();
    offered
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&query))
        .collect()
}
