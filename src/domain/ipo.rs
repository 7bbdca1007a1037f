//! IPO applications and the demat accounts they are made through.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::error::TrackerError;
use super::record_id::check_record_id;

pub const DEFAULT_EXCHANGE: &str = "NSE + BSE";
pub const DEFAULT_SECTOR: &str = "Technology";
pub const DEFAULT_STATUS: &str = "Sold on Listing";
pub const DEFAULT_DEMAT_PROVIDER: &str = "Zerodha";
pub const DEFAULT_CATEGORY: &str = "Retail";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Allotment {
    #[default]
    Yes,
    No,
}

impl Allotment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Allotment::Yes => "Yes",
            Allotment::No => "No",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Yes" => Some(Allotment::Yes),
            "No" => Some(Allotment::No),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpoRecord {
    pub id: i64,
    pub user_id: i64,
    pub company_name: String,
    pub symbol: Option<String>,
    pub year: String,
    pub exchange: String,
    pub sector: String,
    pub ipo_price: f64,
    pub lot_size: Option<f64>,
    pub lots_applied: Option<f64>,
    pub allotted: Allotment,
    pub qty_allotted: Option<f64>,
    pub amount_applied: Option<f64>,
    pub amount_paid: Option<f64>,
    pub listing_date: Option<NaiveDate>,
    pub listing_price: Option<f64>,
    pub selling_price: Option<f64>,
    pub selling_date: Option<NaiveDate>,
    pub status: String,
    pub account_id: Option<i64>,
    pub notes: Option<String>,
    pub gmp_at_apply: Option<f64>,
    pub subscription_times: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl IpoRecord {
    pub fn is_allotted(&self) -> bool {
        self.allotted == Allotment::Yes
    }

    /// Allotted, with both a selling price and an allotted quantity.
    pub fn is_sold(&self) -> bool {
        self.is_allotted()
            && self.selling_price.is_some_and(|p| p != 0.0)
            && self.qty_allotted.is_some_and(|q| q != 0.0)
    }

    pub fn is_win(&self) -> bool {
        self.is_sold() && self.selling_price.is_some_and(|p| p > self.ipo_price)
    }

    /// Capital put in: `ipo_price * qty_allotted` for allotted records.
    pub fn invested(&self) -> f64 {
        if !self.is_allotted() {
            return 0.0;
        }
        self.ipo_price * self.qty_allotted.unwrap_or(0.0)
    }

    /// Realized gain, counted only for sold records.
    pub fn realized_pnl(&self) -> Option<f64> {
        if !self.is_sold() {
            return None;
        }
        match (self.selling_price, self.qty_allotted) {
            (Some(sell), Some(qty)) => Some((sell - self.ipo_price) * qty),
            _ => None,
        }
    }

    pub fn profit(&self) -> Option<f64> {
        gain(self.ipo_price, self.qty_allotted, self.selling_price)
    }

    pub fn profit_pct(&self) -> Option<f64> {
        gain_pct(self.ipo_price, self.selling_price)
    }

    pub fn listing_gain(&self) -> Option<f64> {
        gain(self.ipo_price, self.qty_allotted, self.listing_price)
    }

    pub fn listing_gain_pct(&self) -> Option<f64> {
        gain_pct(self.ipo_price, self.listing_price)
    }
}

fn gain(ipo_price: f64, qty: Option<f64>, exit: Option<f64>) -> Option<f64> {
    match (qty, exit) {
        (Some(q), Some(p)) if q > 0.0 && p > 0.0 => Some((p - ipo_price) * q),
        _ => None,
    }
}

fn gain_pct(ipo_price: f64, exit: Option<f64>) -> Option<f64> {
    match exit {
        Some(p) if ipo_price > 0.0 && p > 0.0 => Some((p - ipo_price) / ipo_price * 100.0),
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpoDraft {
    #[serde(default)]
    pub id: Option<i64>,
    pub company_name: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default = "current_year")]
    pub year: String,
    #[serde(default = "default_exchange")]
    pub exchange: String,
    #[serde(default = "default_sector")]
    pub sector: String,
    pub ipo_price: f64,
    #[serde(default)]
    pub lot_size: Option<f64>,
    #[serde(default)]
    pub lots_applied: Option<f64>,
    #[serde(default)]
    pub allotted: Allotment,
    #[serde(default)]
    pub qty_allotted: Option<f64>,
    #[serde(default)]
    pub amount_applied: Option<f64>,
    #[serde(default)]
    pub amount_paid: Option<f64>,
    #[serde(default)]
    pub listing_date: Option<NaiveDate>,
    #[serde(default)]
    pub listing_price: Option<f64>,
    #[serde(default)]
    pub selling_price: Option<f64>,
    #[serde(default)]
    pub selling_date: Option<NaiveDate>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub account_id: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub gmp_at_apply: Option<f64>,
    #[serde(default)]
    pub subscription_times: Option<f64>,
}

fn current_year() -> String {
    Utc::now().year().to_string()
}

fn default_exchange() -> String {
    DEFAULT_EXCHANGE.to_string()
}

fn default_sector() -> String {
    DEFAULT_SECTOR.to_string()
}

fn default_status() -> String {
    DEFAULT_STATUS.to_string()
}

impl IpoDraft {
    pub fn validate(&self) -> Result<(), TrackerError> {
        check_record_id(self.id)?;
        if self.company_name.trim().is_empty() {
            return Err(TrackerError::validation(
                "company_name",
                "company name is required",
            ));
        }
        if self.year.trim().is_empty() {
            return Err(TrackerError::validation("year", "year is required"));
        }
        Ok(())
    }
}

/// An IPO record with its derived gains. None of these are stored.
#[derive(Debug, Clone, Serialize)]
pub struct IpoView {
    #[serde(flatten)]
    pub record: IpoRecord,
    pub profit: Option<f64>,
    pub profit_pct: Option<f64>,
    pub listing_gain: Option<f64>,
    pub listing_gain_pct: Option<f64>,
}

impl From<IpoRecord> for IpoView {
    fn from(record: IpoRecord) -> Self {
        Self {
            profit: record.profit(),
            profit_pct: record.profit_pct(),
            listing_gain: record.listing_gain(),
            listing_gain_pct: record.listing_gain_pct(),
            record,
        }
    }
}

/// IPO listing filter.
///
/// `status` accepts the two allotment pseudo-statuses `Allotted` and
/// `Not Allotted` in addition to the free-form record status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpoFilter {
    pub status: Option<String>,
    pub year: Option<String>,
    pub account_id: Option<i64>,
}

impl IpoFilter {
    pub fn new(status: Option<&str>, year: Option<&str>, account_id: Option<i64>) -> Self {
        let keep = |v: Option<&str>| {
            v.map(str::trim)
                .filter(|s| !s.is_empty() && *s != "All")
                .map(str::to_string)
        };
        Self {
            status: keep(status),
            year: keep(year),
            account_id,
        }
    }

    /// `All` and blank mean no account filter.
    pub fn parse_account_id(raw: Option<&str>) -> Result<Option<i64>, TrackerError> {
        match raw.map(str::trim) {
            None | Some("") | Some("All") => Ok(None),
            Some(s) => s.parse().map(Some).map_err(|_| {
                TrackerError::validation("account_id", format!("'{s}' is not an account id"))
            }),
        }
    }

    pub fn matches(&self, record: &IpoRecord) -> bool {
        let status_ok = match self.status.as_deref() {
            None => true,
            Some(s) => {
                record.status == s
                    || (s == "Allotted" && record.allotted == Allotment::Yes)
                    || (s == "Not Allotted" && record.allotted == Allotment::No)
            }
        };
        let year_ok = self.year.as_deref().is_none_or(|y| record.year == y);
        let account_ok = self
            .account_id
            .is_none_or(|id| record.account_id == Some(id));
        status_ok && year_ok && account_ok
    }

    pub fn apply(&self, records: Vec<IpoRecord>) -> Vec<IpoRecord> {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpoAccount {
    pub id: i64,
    pub user_id: i64,
    pub holder_name: String,
    pub pan: Option<String>,
    pub demat_name: Option<String>,
    pub demat_provider: String,
    pub demat_id: Option<String>,
    pub bank: Option<String>,
    pub upi_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub category: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpoAccountDraft {
    #[serde(default)]
    pub id: Option<i64>,
    pub holder_name: String,
    #[serde(default)]
    pub pan: Option<String>,
    #[serde(default)]
    pub demat_name: Option<String>,
    #[serde(default = "default_demat_provider")]
    pub demat_provider: String,
    #[serde(default)]
    pub demat_id: Option<String>,
    #[serde(default)]
    pub bank: Option<String>,
    #[serde(default)]
    pub upi_id: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_demat_provider() -> String {
    DEFAULT_DEMAT_PROVIDER.to_string()
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl IpoAccountDraft {
    pub fn validate(&self) -> Result<(), TrackerError> {
        check_record_id(self.id)?;
        if self.holder_name.trim().is_empty() {
            return Err(TrackerError::validation(
                "holder_name",
                "holder name is required",
            ));
        }
        Ok(())
    }

    /// PAN numbers are stored upper-case.
    pub fn normalized_pan(&self) -> Option<String> {
        self.pan.as_ref().map(|p| p.trim().to_uppercase())
    }
}
