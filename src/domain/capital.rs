//! Per-user capital setting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Capital a new user starts with until they set their own figure.
pub const DEFAULT_CAPITAL: f64 = 500_000.0;

/// Single row per user, created on first read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capital {
    pub user_id: i64,
    pub total: f64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CapitalUpdate {
    pub total: f64,
}
