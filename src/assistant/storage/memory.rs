use super::SnapshotStore;
use crate::assistant::controller::error::WaiterResult;
use std::cell::RefCell;
use std::collections::HashMap;

/// keeps snapshots in memory only
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn get(&self, key: &str) -> WaiterResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> WaiterResult<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> WaiterResult<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
