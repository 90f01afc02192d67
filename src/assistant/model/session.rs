use crate::assistant::model::order::OrderItem;
use crate::assistant::model::table::Table;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct User {
    pub id: String,
    pub name: String,
    pub role: String,
    pub restaurant_name: String,
}

/// what a successful login hands back
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Credentials {
    pub user: User,
    pub rs_id: String,
}

/// persisted snapshot, restored on the next start to skip login
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct Session {
    pub is_authenticated: bool,
    pub user: Option<User>,
    pub rs_id: Option<String>,
    /// cached for instant paint only, stale until the next successful fetch
    pub current_table: Option<String>,
    pub tables: Vec<Table>,
    pub orders: Vec<OrderItem>,
}

impl Session {
    pub fn login(&mut self, credentials: Credentials) {
        self.is_authenticated = true;
        self.user = Some(credentials.user);
        self.rs_id = Some(credentials.rs_id);
    }

    /// the credentials every backend request needs, if still logged in
    pub fn credentials(&self) -> Option<Credentials> {
        if !self.is_authenticated {
            return None;
        }
        match (&self.user, &self.rs_id) {
            (Some(user), Some(rs_id)) if !rs_id.is_empty() => Some(Credentials {
                user: user.clone(),
                rs_id: rs_id.clone(),
            }),
            _ => None,
        }
    }

    pub fn cache(&mut self, current_table: Option<String>, tables: Vec<Table>, orders: Vec<OrderItem>) {
        self.current_table = current_table;
        self.tables = tables;
        self.orders = orders;
    }
}
