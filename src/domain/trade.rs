//! Swing trade journal entries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::error::TrackerError;
use super::record_id::check_record_id;

pub const DEFAULT_SECTOR: &str = "Technology";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeStatus {
    #[default]
    Running,
    Exited,
    #[serde(rename = "Stop Hit")]
    StopHit,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Running => "Running",
            TradeStatus::Exited => "Exited",
            TradeStatus::StopHit => "Stop Hit",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Running" => Some(TradeStatus::Running),
            "Exited" => Some(TradeStatus::Exited),
            "Stop Hit" => Some(TradeStatus::StopHit),
            _ => None,
        }
    }
}

/// A stored trade, owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: i64,
    pub user_id: i64,
    pub symbol: String,
    pub sector: String,
    pub status: TradeStatus,
    pub buy_price: f64,
    pub qty: f64,
    pub sl: f64,
    pub target: Option<f64>,
    pub buy_date: NaiveDate,
    pub reason: Option<String>,
    pub timing: Option<String>,
    pub image_url: Option<String>,
    pub chart_link: Option<String>,
    pub tags: Option<String>,
    pub exit_price: Option<f64>,
    pub exit_date: Option<NaiveDate>,
    pub deployed: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Trade {
    /// A trade counts as closed once it carries an exit price and a quantity,
    /// regardless of its status.
    pub fn is_closed(&self) -> bool {
        self.exit_price.is_some_and(|p| p != 0.0) && self.qty != 0.0
    }

    /// Ties go to the loss column.
    pub fn is_win(&self) -> bool {
        self.exit_price.is_some_and(|exit| exit > self.buy_price)
    }

    pub fn realized_pnl(&self) -> Option<f64> {
        self.exit_price.map(|exit| (exit - self.buy_price) * self.qty)
    }

    pub fn pnl_pct(&self) -> Option<f64> {
        self.exit_price
            .map(|exit| (exit - self.buy_price) / self.buy_price * 100.0)
    }

    /// Distance from entry to stop loss, in percent of the entry price.
    pub fn sl_pct(&self) -> Option<f64> {
        if self.sl == 0.0 || self.buy_price == 0.0 {
            return None;
        }
        Some((self.buy_price - self.sl) / self.buy_price * 100.0)
    }

    pub fn target_pct(&self) -> Option<f64> {
        if self.buy_price == 0.0 {
            return None;
        }
        self.target
            .filter(|t| *t != 0.0)
            .map(|t| (t - self.buy_price) / self.buy_price * 100.0)
    }

    pub fn risk_reward(&self) -> Option<f64> {
        match (self.target_pct(), self.sl_pct()) {
            (Some(t), Some(s)) => Some(t / s),
            _ => None,
        }
    }
}

/// Upsert payload for a trade. `id` is optional; when absent the store
/// assigns one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeDraft {
    #[serde(default)]
    pub id: Option<i64>,
    pub symbol: String,
    #[serde(default = "default_sector")]
    pub sector: String,
    #[serde(default)]
    pub status: TradeStatus,
    pub buy_price: f64,
    pub qty: f64,
    pub sl: f64,
    #[serde(default)]
    pub target: Option<f64>,
    pub buy_date: NaiveDate,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub timing: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub chart_link: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub exit_price: Option<f64>,
    #[serde(default)]
    pub exit_date: Option<NaiveDate>,
    #[serde(default)]
    pub deployed: Option<f64>,
}

fn default_sector() -> String {
    DEFAULT_SECTOR.to_string()
}

impl TradeDraft {
    pub fn validate(&self) -> Result<(), TrackerError> {
        check_record_id(self.id)?;
        if self.symbol.trim().is_empty() {
            return Err(TrackerError::validation("symbol", "symbol is required"));
        }
        Ok(())
    }

    /// The value written to the `deployed` column: the client's figure when
    /// supplied, otherwise `buy_price * qty`.
    pub fn deployed_amount(&self) -> f64 {
        self.deployed.unwrap_or(self.buy_price * self.qty)
    }
}

/// A trade together with the figures derived from it on every read.
#[derive(Debug, Clone, Serialize)]
pub struct TradeView {
    #[serde(flatten)]
    pub trade: Trade,
    pub pnl: Option<f64>,
    pub pnl_pct: Option<f64>,
    pub sl_pct: Option<f64>,
    pub target_pct: Option<f64>,
    pub risk_reward: Option<f64>,
}

impl From<Trade> for TradeView {
    fn from(trade: Trade) -> Self {
        Self {
            pnl: trade.realized_pnl(),
            pnl_pct: trade.pnl_pct(),
            sl_pct: trade.sl_pct(),
            target_pct: trade.target_pct(),
            risk_reward: trade.risk_reward(),
            trade,
        }
    }
}

/// Journal listing filter. `All` or no value means no filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TradeFilter {
    pub status: Option<TradeStatus>,
}

impl TradeFilter {
    pub fn from_query(status: Option<&str>) -> Result<Self, TrackerError> {
        match status.map(str::trim) {
            None | Some("") | Some("All") => Ok(Self::default()),
            Some(s) => TradeStatus::parse(s)
                .map(|status| Self {
                    status: Some(status),
                })
                .ok_or_else(|| TrackerError::validation("status", format!("unknown status '{s}'"))),
        }
    }

    pub fn matches(&self, trade: &Trade) -> bool {
        self.status.is_none_or(|s| trade.status == s)
    }

    pub fn apply(&self, trades: Vec<Trade>) -> Vec<Trade> {
        trades.into_iter().filter(|t| self.matches(t)).collect()
    }
}
