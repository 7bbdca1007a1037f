//! Per-user storage port for trades, IPO records, IPO accounts and capital.

use crate::domain::capital::Capital;
use crate::domain::error::TrackerError;
use crate::domain::ipo::{IpoAccount, IpoAccountDraft, IpoDraft, IpoRecord};
use crate::domain::trade::{Trade, TradeDraft};

/// Every method is scoped to `user_id`; rows owned by someone else are
/// invisible. Lists come back newest first.
///
/// Upserts return `Ok(None)` when the draft carries an id that belongs to
/// another user; nothing is written in that case. Deletes return the number
/// of rows removed, which is zero for unknown or foreign ids.
pub trait LedgerPort {
    fn list_trades(&self, user_id: i64) -> Result<Vec<Trade>, TrackerError>;
    fn upsert_trade(&self, user_id: i64, draft: &TradeDraft)
    -> Result<Option<Trade>, TrackerError>;
    fn delete_trade(&self, user_id: i64, id: i64) -> Result<usize, TrackerError>;

    fn list_ipo_records(&self, user_id: i64) -> Result<Vec<IpoRecord>, TrackerError>;
    fn upsert_ipo_record(
        &self,
        user_id: i64,
        draft: &IpoDraft,
    ) -> Result<Option<IpoRecord>, TrackerError>;
    fn delete_ipo_record(&self, user_id: i64, id: i64) -> Result<usize, TrackerError>;

    fn list_ipo_accounts(&self, user_id: i64) -> Result<Vec<IpoAccount>, TrackerError>;
    fn upsert_ipo_account(
        &self,
        user_id: i64,
        draft: &IpoAccountDraft,
    ) -> Result<Option<IpoAccount>, TrackerError>;
    fn delete_ipo_account(&self, user_id: i64, id: i64) -> Result<usize, TrackerError>;

    /// Returns the stored capital row, creating it with `default_total` on
    /// first read.
    fn get_or_create_capital(
        &self,
        user_id: i64,
        default_total: f64,
    ) -> Result<Capital, TrackerError>;
    fn set_capital(&self, user_id: i64, total: f64) -> Result<Capital, TrackerError>;
}
