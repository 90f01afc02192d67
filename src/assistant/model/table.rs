use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum TableStatus {
    Inactive,
    Occupied,
}

impl TableStatus {
    /// match loosely, the backend changes its vocabulary between deployments
    pub fn from_wire(raw: &str) -> Self {
        let raw = raw.trim().to_lowercase();
        if ["inactive", "free", "available", "vacant"]
            .iter()
            .any(|word| raw.contains(word))
        {
            return Self::Inactive;
        }
        if ["occupied", "busy", "1", "active", "placed"]
            .iter()
            .any(|word| raw.contains(word))
        {
            return Self::Occupied;
        }
        Self::Inactive
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Table {
    pub table_no: String,
    pub status: TableStatus,
    pub guest_count: u32,
    pub tax: Decimal,
    /// only set while the table is occupied
    pub master_order_id: Option<String>,
}

impl Table {
    pub fn is_occupied(&self) -> bool {
        self.status == TableStatus::Occupied
    }
}

/// a pending "call the waiter" event raised from a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct WaiterCall {
    pub table_no: String,
    pub request: String,
    pub called_at: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct TableList {
    pub tables: Vec<Table>,
    pub waiter_calls: Vec<WaiterCall>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum TableFilter {
    #[default]
    All,
    Occupied,
    Inactive,
}

impl TableFilter {
    pub fn matches(&self, table: &Table) -> bool {
        match self {
            TableFilter::All => true,
            TableFilter::Occupied => table.status == TableStatus::Occupied,
            TableFilter::Inactive => table.status == TableStatus::Inactive,
        }
    }

    pub fn apply<'a>(&self, tables: &'a [Table]) -> Vec<&'a Table> {
        tables.iter().filter(|t| self.matches(t)).collect()
    }
}

/// per-status counts shown next to the filter buttons
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct TableCounts {
    pub all: usize,
    pub occupied: usize,
    pub inactive: usize,
}

impl TableCounts {
    pub fn of(tables: &[Table]) -> Self {
        let occupied = tables.iter().filter(|t| t.is_occupied()).count();
        Self {
            all: tables.len(),
            occupied,
            inactive: tables.len() - occupied,
        }
    }
}
