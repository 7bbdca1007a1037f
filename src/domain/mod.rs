//! Core domain types and logic.

pub mod capital;
pub mod error;
pub mod ipo;
pub mod metrics;
pub mod record_id;
pub mod settings;
pub mod sizing;
pub mod symbols;
pub mod trade;
pub mod user;
