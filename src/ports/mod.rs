//! Port traits the adapters implement.

pub mod config_port;
pub mod ledger_port;
pub mod user_port;
