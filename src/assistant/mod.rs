//! core of the waiter assistant: backend gateway, order reconciliation, polling and session

pub(crate) mod controller;
pub(crate) mod gateway;
pub(crate) mod model;
pub(crate) mod scheduler;
pub(crate) mod state;
pub(crate) mod storage;
pub(crate) mod util;
