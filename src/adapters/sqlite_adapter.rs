//! SQLite storage adapter for users and their ledger.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};

use crate::domain::capital::Capital;
use crate::domain::error::TrackerError;
use crate::domain::ipo::{Allotment, IpoAccount, IpoAccountDraft, IpoDraft, IpoRecord};
use crate::domain::record_id::check_record_id;
use crate::domain::settings::Settings;
use crate::domain::trade::{Trade, TradeDraft, TradeStatus};
use crate::domain::user::User;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::user_port::UserPort;

const DATE_FORMAT: &str = "%Y-%m-%d";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS trades (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    symbol TEXT NOT NULL,
    sector TEXT NOT NULL,
    status TEXT NOT NULL,
    buy_price REAL NOT NULL,
    qty REAL NOT NULL,
    sl REAL NOT NULL,
    target REAL,
    buy_date TEXT NOT NULL,
    reason TEXT,
    timing TEXT,
    image_url TEXT,
    chart_link TEXT,
    tags TEXT,
    exit_price REAL,
    exit_date TEXT,
    deployed REAL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_trades_user ON trades(user_id, created_at);

CREATE TABLE IF NOT EXISTS ipo_accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    holder_name TEXT NOT NULL,
    pan TEXT,
    demat_name TEXT,
    demat_provider TEXT NOT NULL,
    demat_id TEXT,
    bank TEXT,
    upi_id TEXT,
    phone TEXT,
    email TEXT,
    category TEXT NOT NULL,
    notes TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_ipo_accounts_user ON ipo_accounts(user_id, created_at);

CREATE TABLE IF NOT EXISTS ipo_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    company_name TEXT NOT NULL,
    symbol TEXT,
    year TEXT NOT NULL,
    exchange TEXT NOT NULL,
    sector TEXT NOT NULL,
    ipo_price REAL NOT NULL,
    lot_size REAL,
    lots_applied REAL,
    allotted TEXT NOT NULL,
    qty_allotted REAL,
    amount_applied REAL,
    amount_paid REAL,
    listing_date TEXT,
    listing_price REAL,
    selling_price REAL,
    selling_date TEXT,
    status TEXT NOT NULL,
    account_id INTEGER,
    notes TEXT,
    gmp_at_apply REAL,
    subscription_times REAL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_ipo_records_user ON ipo_records(user_id, created_at);

CREATE TABLE IF NOT EXISTS capital (
    user_id INTEGER PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
    total REAL NOT NULL,
    updated_at TEXT NOT NULL
);";

const TRADE_COLUMNS: &str = "id, user_id, symbol, sector, status, buy_price, qty, sl, target,
    buy_date, reason, timing, image_url, chart_link, tags, exit_price, exit_date, deployed,
    created_at";

const IPO_RECORD_COLUMNS: &str = "id, user_id, company_name, symbol, year, exchange, sector,
    ipo_price, lot_size, lots_applied, allotted, qty_allotted, amount_applied, amount_paid,
    listing_date, listing_price, selling_price, selling_date, status, account_id, notes,
    gmp_at_apply, subscription_times, created_at";

const IPO_ACCOUNT_COLUMNS: &str = "id, user_id, holder_name, pan, demat_name, demat_provider,
    demat_id, bank, upi_id, phone, email, category, notes, created_at";

type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    /// Opens the database named in `[database] path`. `:memory:` yields a
    /// single-connection in-memory store.
    pub fn from_settings(settings: &Settings) -> Result<Self, TrackerError> {
        if settings.database_path == ":memory:" {
            return Self::in_memory();
        }

        let manager = SqliteConnectionManager::file(&settings.database_path)
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::builder()
            .max_size(settings.pool_size)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, TrackerError> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        // The database lives only as long as its one connection.
        let pool = Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), TrackerError> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA).map_err(query_error)?;
        Ok(())
    }

    fn conn(&self) -> Result<PooledConnection, TrackerError> {
        self.pool.get().map_err(pool_error)
    }
}

fn pool_error(e: r2d2::Error) -> TrackerError {
    TrackerError::Database {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> TrackerError {
    TrackerError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn date_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| conversion_error(idx, e))
}

fn opt_date_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn trade_from_row(row: &Row<'_>) -> rusqlite::Result<Trade> {
    let status: String = row.get(4)?;
    let status = TradeStatus::parse(&status).ok_or_else(|| {
        conversion_error(
            4,
            TrackerError::validation("status", format!("unknown trade status '{status}'")),
        )
    })?;
    Ok(Trade {
        id: row.get(0)?,
        user_id: row.get(1)?,
        symbol: row.get(2)?,
        sector: row.get(3)?,
        status,
        buy_price: row.get(5)?,
        qty: row.get(6)?,
        sl: row.get(7)?,
        target: row.get(8)?,
        buy_date: date_at(row, 9)?,
        reason: row.get(10)?,
        timing: row.get(11)?,
        image_url: row.get(12)?,
        chart_link: row.get(13)?,
        tags: row.get(14)?,
        exit_price: row.get(15)?,
        exit_date: opt_date_at(row, 16)?,
        deployed: row.get(17)?,
        created_at: timestamp_at(row, 18)?,
    })
}

fn ipo_record_from_row(row: &Row<'_>) -> rusqlite::Result<IpoRecord> {
    let allotted: String = row.get(10)?;
    let allotted = Allotment::parse(&allotted).ok_or_else(|| {
        conversion_error(
            10,
            TrackerError::validation("allotted", format!("unknown allotment '{allotted}'")),
        )
    })?;
    Ok(IpoRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        company_name: row.get(2)?,
        symbol: row.get(3)?,
        year: row.get(4)?,
        exchange: row.get(5)?,
        sector: row.get(6)?,
        ipo_price: row.get(7)?,
        lot_size: row.get(8)?,
        lots_applied: row.get(9)?,
        allotted,
        qty_allotted: row.get(11)?,
        amount_applied: row.get(12)?,
        amount_paid: row.get(13)?,
        listing_date: opt_date_at(row, 14)?,
        listing_price: row.get(15)?,
        selling_price: row.get(16)?,
        selling_date: opt_date_at(row, 17)?,
        status: row.get(18)?,
        account_id: row.get(19)?,
        notes: row.get(20)?,
        gmp_at_apply: row.get(21)?,
        subscription_times: row.get(22)?,
        created_at: timestamp_at(row, 23)?,
    })
}

fn ipo_account_from_row(row: &Row<'_>) -> rusqlite::Result<IpoAccount> {
    Ok(IpoAccount {
        id: row.get(0)?,
        user_id: row.get(1)?,
        holder_name: row.get(2)?,
        pan: row.get(3)?,
        demat_name: row.get(4)?,
        demat_provider: row.get(5)?,
        demat_id: row.get(6)?,
        bank: row.get(7)?,
        upi_id: row.get(8)?,
        phone: row.get(9)?,
        email: row.get(10)?,
        category: row.get(11)?,
        notes: row.get(12)?,
        created_at: timestamp_at(row, 13)?,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: timestamp_at(row, 3)?,
    })
}

fn capital_from_row(row: &Row<'_>) -> rusqlite::Result<Capital> {
    Ok(Capital {
        user_id: row.get(0)?,
        total: row.get(1)?,
        updated_at: timestamp_at(row, 2)?,
    })
}

fn list_owned<T>(
    conn: &Connection,
    table: &str,
    columns: &str,
    user_id: i64,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>, TrackerError> {
    let query = format!(
        "SELECT {columns} FROM {table} WHERE user_id = ?1 ORDER BY created_at DESC, id DESC"
    );
    let mut stmt = conn.prepare(&query).map_err(query_error)?;
    let rows = stmt.query_map(params![user_id], map).map_err(query_error)?;

    let mut items = Vec::new();
    for row in rows {
        items.push(row.map_err(query_error)?);
    }
    Ok(items)
}

fn fetch_owned<T>(
    conn: &Connection,
    table: &str,
    columns: &str,
    user_id: i64,
    id: i64,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Option<T>, TrackerError> {
    let query = format!("SELECT {columns} FROM {table} WHERE id = ?1 AND user_id = ?2");
    conn.query_row(&query, params![id, user_id], map)
        .optional()
        .map_err(query_error)
}

fn delete_owned(
    conn: &Connection,
    table: &str,
    user_id: i64,
    id: i64,
) -> Result<usize, TrackerError> {
    let query = format!("DELETE FROM {table} WHERE id = ?1 AND user_id = ?2");
    conn.execute(&query, params![id, user_id]).map_err(query_error)
}

impl LedgerPort for SqliteAdapter {
    fn list_trades(&self, user_id: i64) -> Result<Vec<Trade>, TrackerError> {
        let conn = self.conn()?;
        list_owned(&conn, "trades", TRADE_COLUMNS, user_id, trade_from_row)
    }

    fn upsert_trade(
        &self,
        user_id: i64,
        draft: &TradeDraft,
    ) -> Result<Option<Trade>, TrackerError> {
        check_record_id(draft.id)?;
        let conn = self.conn()?;
        // A conflicting row owned by another user is left alone and
        // RETURNING yields nothing.
        let id: Option<i64> = conn
            .query_row(
                "INSERT INTO trades (id, user_id, symbol, sector, status, buy_price, qty, sl,
                    target, buy_date, reason, timing, image_url, chart_link, tags, exit_price,
                    exit_date, deployed, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                    ?17, ?18, ?19)
                 ON CONFLICT(id) DO UPDATE SET
                    symbol = excluded.symbol,
                    sector = excluded.sector,
                    status = excluded.status,
                    buy_price = excluded.buy_price,
                    qty = excluded.qty,
                    sl = excluded.sl,
                    target = excluded.target,
                    buy_date = excluded.buy_date,
                    reason = excluded.reason,
                    timing = excluded.timing,
                    image_url = excluded.image_url,
                    chart_link = excluded.chart_link,
                    tags = excluded.tags,
                    exit_price = excluded.exit_price,
                    exit_date = excluded.exit_date,
                    deployed = excluded.deployed
                 WHERE trades.user_id = excluded.user_id
                 RETURNING id",
                params![
                    draft.id,
                    user_id,
                    draft.symbol.trim(),
                    draft.sector,
                    draft.status.as_str(),
                    draft.buy_price,
                    draft.qty,
                    draft.sl,
                    draft.target,
                    format_date(draft.buy_date),
                    draft.reason,
                    draft.timing,
                    draft.image_url,
                    draft.chart_link,
                    draft.tags,
                    draft.exit_price,
                    draft.exit_date.map(format_date),
                    draft.deployed_amount(),
                    format_timestamp(now()),
                ],
                |row| row.get(0),
            )
            .optional()
            .map_err(query_error)?;

        match id {
            Some(id) => fetch_owned(&conn, "trades", TRADE_COLUMNS, user_id, id, trade_from_row),
            None => Ok(None),
        }
    }

    fn delete_trade(&self, user_id: i64, id: i64) -> Result<usize, TrackerError> {
        let conn = self.conn()?;
        delete_owned(&conn, "trades", user_id, id)
    }

    fn list_ipo_records(&self, user_id: i64) -> Result<Vec<IpoRecord>, TrackerError> {
        let conn = self.conn()?;
        list_owned(
            &conn,
            "ipo_records",
            IPO_RECORD_COLUMNS,
            user_id,
            ipo_record_from_row,
        )
    }

    fn upsert_ipo_record(
        &self,
        user_id: i64,
        draft: &IpoDraft,
    ) -> Result<Option<IpoRecord>, TrackerError> {
        check_record_id(draft.id)?;
        let conn = self.conn()?;
        let id: Option<i64> = conn
            .query_row(
                "INSERT INTO ipo_records (id, user_id, company_name, symbol, year, exchange,
                    sector, ipo_price, lot_size, lots_applied, allotted, qty_allotted,
                    amount_applied, amount_paid, listing_date, listing_price, selling_price,
                    selling_date, status, account_id, notes, gmp_at_apply, subscription_times,
                    created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                    ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)
                 ON CONFLICT(id) DO UPDATE SET
                    company_name = excluded.company_name,
                    symbol = excluded.symbol,
                    year = excluded.year,
                    exchange = excluded.exchange,
                    sector = excluded.sector,
                    ipo_price = excluded.ipo_price,
                    lot_size = excluded.lot_size,
                    lots_applied = excluded.lots_applied,
                    allotted = excluded.allotted,
                    qty_allotted = excluded.qty_allotted,
                    amount_applied = excluded.amount_applied,
                    amount_paid = excluded.amount_paid,
                    listing_date = excluded.listing_date,
                    listing_price = excluded.listing_price,
                    selling_price = excluded.selling_price,
                    selling_date = excluded.selling_date,
                    status = excluded.status,
                    account_id = excluded.account_id,
                    notes = excluded.notes,
                    gmp_at_apply = excluded.gmp_at_apply,
                    subscription_times = excluded.subscription_times
                 WHERE ipo_records.user_id = excluded.user_id
                 RETURNING id",
                params![
                    draft.id,
                    user_id,
                    draft.company_name.trim(),
                    draft.symbol,
                    draft.year.trim(),
                    draft.exchange,
                    draft.sector,
                    draft.ipo_price,
                    draft.lot_size,
                    draft.lots_applied,
                    draft.allotted.as_str(),
                    draft.qty_allotted,
                    draft.amount_applied,
                    draft.amount_paid,
                    draft.listing_date.map(format_date),
                    draft.listing_price,
                    draft.selling_price,
                    draft.selling_date.map(format_date),
                    draft.status,
                    draft.account_id,
                    draft.notes,
                    draft.gmp_at_apply,
                    draft.subscription_times,
                    format_timestamp(now()),
                ],
                |row| row.get(0),
            )
            .optional()
            .map_err(query_error)?;

        match id {
            Some(id) => fetch_owned(
                &conn,
                "ipo_records",
                IPO_RECORD_COLUMNS,
                user_id,
                id,
                ipo_record_from_row,
            ),
            None => Ok(None),
        }
    }

    fn delete_ipo_record(&self, user_id: i64, id: i64) -> Result<usize, TrackerError> {
        let conn = self.conn()?;
        delete_owned(&conn, "ipo_records", user_id, id)
    }

    fn list_ipo_accounts(&self, user_id: i64) -> Result<Vec<IpoAccount>, TrackerError> {
        let conn = self.conn()?;
        list_owned(
            &conn,
            "ipo_accounts",
            IPO_ACCOUNT_COLUMNS,
            user_id,
            ipo_account_from_row,
        )
    }

    fn upsert_ipo_account(
        &self,
        user_id: i64,
        draft: &IpoAccountDraft,
    ) -> Result<Option<IpoAccount>, TrackerError> {
        check_record_id(draft.id)?;
        let conn = self.conn()?;
        let id: Option<i64> = conn
            .query_row(
                "INSERT INTO ipo_accounts (id, user_id, holder_name, pan, demat_name,
                    demat_provider, demat_id, bank, upi_id, phone, email, category, notes,
                    created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                 ON CONFLICT(id) DO UPDATE SET
                    holder_name = excluded.holder_name,
                    pan = excluded.pan,
                    demat_name = excluded.demat_name,
                    demat_provider = excluded.demat_provider,
                    demat_id = excluded.demat_id,
                    bank = excluded.bank,
                    upi_id = excluded.upi_id,
                    phone = excluded.phone,
                    email = excluded.email,
                    category = excluded.category,
                    notes = excluded.notes
                 WHERE ipo_accounts.user_id = excluded.user_id
                 RETURNING id",
                params![
                    draft.id,
                    user_id,
                    draft.holder_name.trim(),
                    draft.normalized_pan(),
                    draft.demat_name,
                    draft.demat_provider,
                    draft.demat_id,
                    draft.bank,
                    draft.upi_id,
                    draft.phone,
                    draft.email,
                    draft.category,
                    draft.notes,
                    format_timestamp(now()),
                ],
                |row| row.get(0),
            )
            .optional()
            .map_err(query_error)?;

        match id {
            Some(id) => fetch_owned(
                &conn,
                "ipo_accounts",
                IPO_ACCOUNT_COLUMNS,
                user_id,
                id,
                ipo_account_from_row,
            ),
            None => Ok(None),
        }
    }

    fn delete_ipo_account(&self, user_id: i64, id: i64) -> Result<usize, TrackerError> {
        let conn = self.conn()?;
        delete_owned(&conn, "ipo_accounts", user_id, id)
    }

    fn get_or_create_capital(
        &self,
        user_id: i64,
        default_total: f64,
    ) -> Result<Capital, TrackerError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO capital (user_id, total, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO NOTHING",
            params![user_id, default_total, format_timestamp(now())],
        )
        .map_err(query_error)?;

        conn.query_row(
            "SELECT user_id, total, updated_at FROM capital WHERE user_id = ?1",
            params![user_id],
            capital_from_row,
        )
        .map_err(query_error)
    }

    fn set_capital(&self, user_id: i64, total: f64) -> Result<Capital, TrackerError> {
        let conn = self.conn()?;
        conn.query_row(
            "INSERT INTO capital (user_id, total, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET
                total = excluded.total,
                updated_at = excluded.updated_at
             RETURNING user_id, total, updated_at",
            params![user_id, total, format_timestamp(now())],
            capital_from_row,
        )
        .map_err(query_error)
    }
}

impl UserPort for SqliteAdapter {
    fn create_user(&self, email: &str, password_hash: &str) -> Result<User, TrackerError> {
        let conn = self.conn()?;
        conn.query_row(
            "INSERT INTO users (email, password_hash, created_at) VALUES (?1, ?2, ?3)
             RETURNING id, email, password_hash, created_at",
            params![email, password_hash, format_timestamp(now())],
            user_from_row,
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(ref err, _)
                if err.code == ErrorCode::ConstraintViolation =>
            {
                TrackerError::Conflict {
                    reason: format!("email '{email}' is already registered"),
                }
            }
            other => query_error(other),
        })
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, TrackerError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = ?1",
            params![email],
            user_from_row,
        )
        .optional()
        .map_err(query_error)
    }

    fn find_user(&self, id: i64) -> Result<Option<User>, TrackerError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, email, password_hash, created_at FROM users WHERE id = ?1",
            params![id],
            user_from_row,
        )
        .optional()
        .map_err(query_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record_id::MAX_RECORD_ID;

    fn adapter_with_user() -> (SqliteAdapter, i64) {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
        let user = adapter.create_user("owner@example.com", "hash").unwrap();
        (adapter, user.id)
    }

    fn trade_draft(id: Option<i64>, symbol: &str) -> TradeDraft {
        TradeDraft {
            id,
            symbol: symbol.to_string(),
            sector: "Technology".to_string(),
            status: TradeStatus::Running,
            buy_price: 100.0,
            qty: 10.0,
            sl: 95.0,
            target: Some(120.0),
            buy_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            reason: None,
            timing: None,
            image_url: None,
            chart_link: None,
            tags: Some("breakout".to_string()),
            exit_price: None,
            exit_date: None,
            deployed: None,
        }
    }

    #[test]
    fn in_memory_initialization() {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
        adapter.initialize_schema().unwrap();
    }

    #[test]
    fn insert_assigns_id_and_fills_deployed() {
        let (adapter, user_id) = adapter_with_user();
        let trade = adapter
            .upsert_trade(user_id, &trade_draft(None, "TCS"))
            .unwrap()
            .unwrap();
        assert!(trade.id > 0);
        assert_eq!(trade.user_id, user_id);
        assert_eq!(trade.deployed, Some(1000.0));
        assert_eq!(trade.buy_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn upsert_with_same_id_replaces_fields() {
        let (adapter, user_id) = adapter_with_user();
        let first = adapter
            .upsert_trade(user_id, &trade_draft(Some(42), "TCS"))
            .unwrap()
            .unwrap();

        let mut update = trade_draft(Some(42), "TCS");
        update.status = TradeStatus::Exited;
        update.exit_price = Some(110.0);
        update.exit_date = NaiveDate::from_ymd_opt(2024, 3, 9);
        let second = adapter.upsert_trade(user_id, &update).unwrap().unwrap();

        assert_eq!(second.id, 42);
        assert_eq!(second.status, TradeStatus::Exited);
        assert_eq!(second.exit_price, Some(110.0));
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(adapter.list_trades(user_id).unwrap().len(), 1);
    }

    #[test]
    fn foreign_id_is_not_overwritten() {
        let (adapter, owner) = adapter_with_user();
        let intruder = adapter.create_user("other@example.com", "hash").unwrap().id;
        adapter
            .upsert_trade(owner, &trade_draft(Some(7), "TCS"))
            .unwrap();

        let result = adapter
            .upsert_trade(intruder, &trade_draft(Some(7), "HACKED"))
            .unwrap();
        assert!(result.is_none());

        let owned = adapter.list_trades(owner).unwrap();
        assert_eq!(owned[0].symbol, "TCS");
        assert!(adapter.list_trades(intruder).unwrap().is_empty());
    }

    #[test]
    fn out_of_range_client_id_leaves_id_assignment_working() {
        let (adapter, owner) = adapter_with_user();
        let other = adapter.create_user("other@example.com", "hash").unwrap().id;

        let result = adapter.upsert_trade(other, &trade_draft(Some(i64::MAX), "TCS"));
        assert!(matches!(result, Err(TrackerError::Validation { .. })));
        let result = adapter.upsert_trade(other, &trade_draft(Some(0), "TCS"));
        assert!(matches!(result, Err(TrackerError::Validation { .. })));

        adapter
            .upsert_trade(other, &trade_draft(Some(MAX_RECORD_ID), "INFY"))
            .unwrap()
            .unwrap();
        let trade = adapter
            .upsert_trade(owner, &trade_draft(None, "TCS"))
            .unwrap()
            .unwrap();
        assert!(trade.id > MAX_RECORD_ID);
    }

    #[test]
    fn delete_is_scoped_to_owner() {
        let (adapter, owner) = adapter_with_user();
        let other = adapter.create_user("other@example.com", "hash").unwrap().id;
        let trade = adapter
            .upsert_trade(owner, &trade_draft(None, "TCS"))
            .unwrap()
            .unwrap();

        assert_eq!(adapter.delete_trade(other, trade.id).unwrap(), 0);
        assert_eq!(adapter.list_trades(owner).unwrap().len(), 1);
        assert_eq!(adapter.delete_trade(owner, trade.id).unwrap(), 1);
        assert!(adapter.list_trades(owner).unwrap().is_empty());
    }

    #[test]
    fn list_is_newest_first() {
        let (adapter, user_id) = adapter_with_user();
        for symbol in ["A", "B", "C"] {
            adapter
                .upsert_trade(user_id, &trade_draft(None, symbol))
                .unwrap();
        }
        let symbols: Vec<String> = adapter
            .list_trades(user_id)
            .unwrap()
            .into_iter()
            .map(|t| t.symbol)
            .collect();
        assert_eq!(symbols, vec!["C", "B", "A"]);
    }

    #[test]
    fn capital_created_on_first_read() {
        let (adapter, user_id) = adapter_with_user();
        let capital = adapter.get_or_create_capital(user_id, 500_000.0).unwrap();
        assert_eq!(capital.total, 500_000.0);

        adapter.set_capital(user_id, 750_000.0).unwrap();
        let capital = adapter.get_or_create_capital(user_id, 500_000.0).unwrap();
        assert_eq!(capital.total, 750_000.0);
    }

    #[test]
    fn duplicate_email_is_conflict() {
        let (adapter, _) = adapter_with_user();
        let result = adapter.create_user("OWNER@example.com", "hash");
        assert!(matches!(result, Err(TrackerError::Conflict { .. })));
    }

    #[test]
    fn find_user_round_trip() {
        let (adapter, user_id) = adapter_with_user();
        let by_email = adapter
            .find_user_by_email("owner@example.com")
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, user_id);
        assert_eq!(adapter.find_user(user_id).unwrap(), Some(by_email));
        assert_eq!(adapter.find_user(user_id + 100).unwrap(), None);
    }
}
