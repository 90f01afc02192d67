pub(crate) mod bill;
pub(crate) mod config;
pub(crate) mod menu;
pub(crate) mod order;
pub(crate) mod preference;
pub(crate) mod session;
pub(crate) mod table;
