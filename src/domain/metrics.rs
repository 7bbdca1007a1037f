//! Derived statistics over a user's trades and IPO records.
//!
//! Everything here is a pure reduction over the full in-memory collections,
//! recomputed on every call.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use super::capital::Capital;
use super::ipo::{IpoAccount, IpoRecord};
use super::trade::{Trade, TradeStatus};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TradeStats {
    pub total: usize,
    pub running: usize,
    pub exited: usize,
    pub stop_hit: usize,
    pub closed: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: Option<f64>,
    pub realized_pnl: f64,
    pub deployed: f64,
}

impl TradeStats {
    pub fn compute(trades: &[Trade]) -> Self {
        let mut stats = TradeStats {
            total: trades.len(),
            ..Default::default()
        };

        for trade in trades {
            match trade.status {
                TradeStatus::Running => {
                    stats.running += 1;
                    stats.deployed += trade.deployed.unwrap_or(0.0);
                }
                TradeStatus::Exited => stats.exited += 1,
                TradeStatus::StopHit => stats.stop_hit += 1,
            }

            if !trade.is_closed() {
                continue;
            }
            stats.closed += 1;
            if trade.is_win() {
                stats.wins += 1;
            } else {
                stats.losses += 1;
            }
            stats.realized_pnl += trade.realized_pnl().unwrap_or(0.0);
        }

        stats.win_rate = ratio(stats.wins, stats.closed);
        stats
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IpoStats {
    pub applied: usize,
    pub allotted: usize,
    pub allotment_rate: Option<f64>,
    pub sold: usize,
    pub wins: usize,
    pub invested: f64,
    pub realized_pnl: f64,
    pub return_pct: Option<f64>,
}

impl IpoStats {
    pub fn compute(records: &[IpoRecord]) -> Self {
        let mut stats = IpoStats {
            applied: records.len(),
            ..Default::default()
        };

        for record in records.iter().filter(|r| r.is_allotted()) {
            stats.allotted += 1;
            stats.invested += record.invested();
            if record.is_sold() {
                stats.sold += 1;
                stats.realized_pnl += record.realized_pnl().unwrap_or(0.0);
                if record.is_win() {
                    stats.wins += 1;
                }
            }
        }

        stats.allotment_rate = ratio(stats.allotted, stats.applied);
        stats.return_pct = pct_of(stats.realized_pnl, stats.invested);
        stats
    }
}

/// IPO figures for one listing year.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct YearlyIpo {
    pub year: String,
    pub applied: usize,
    pub allotted: usize,
    pub sold: usize,
    pub wins: usize,
    pub invested: f64,
    pub profit: f64,
    pub return_pct: Option<f64>,
}

/// Groups records by `year`, newest year first.
///
/// Unallotted and unsold records only move the `applied`/`allotted` counts.
pub fn ipo_by_year(records: &[IpoRecord]) -> Vec<YearlyIpo> {
    let mut years: BTreeMap<&str, YearlyIpo> = BTreeMap::new();

    for record in records {
        let entry = years
            .entry(record.year.as_str())
            .or_insert_with(|| YearlyIpo {
                year: record.year.clone(),
                ..Default::default()
            });
        entry.applied += 1;
        if !record.is_allotted() {
            continue;
        }
        entry.allotted += 1;
        entry.invested += record.invested();
        if let Some(pnl) = record.realized_pnl() {
            entry.profit += pnl;
        }
        // The win/loss tally only needs a selling price, not a quantity.
        if let Some(sell) = record.selling_price.filter(|p| *p != 0.0) {
            entry.sold += 1;
            if sell > record.ipo_price {
                entry.wins += 1;
            }
        }
    }

    let mut rows: Vec<YearlyIpo> = years
        .into_values()
        .map(|mut row| {
            row.return_pct = pct_of(row.profit, row.invested);
            row
        })
        .collect();
    rows.sort_by(|a, b| compare_years_desc(&a.year, &b.year));
    rows
}

fn compare_years_desc(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<i32>(), b.trim().parse::<i32>()) {
        (Ok(x), Ok(y)) => y.cmp(&x),
        _ => b.cmp(a),
    }
}

/// How much each demat account has been used.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountUsage {
    pub account_id: i64,
    pub holder_name: String,
    pub demat_provider: String,
    pub ipos: usize,
    pub allotted: usize,
}

pub fn account_usage(accounts: &[IpoAccount], records: &[IpoRecord]) -> Vec<AccountUsage> {
    accounts
        .iter()
        .map(|account| {
            let linked = records
                .iter()
                .filter(|r| r.account_id == Some(account.id));
            let (ipos, allotted) = linked.fold((0, 0), |(n, a), r| {
                (n + 1, a + usize::from(r.is_allotted()))
            });
            AccountUsage {
                account_id: account.id,
                holder_name: account.holder_name.clone(),
                demat_provider: account.demat_provider.clone(),
                ipos,
                allotted,
            }
        })
        .collect()
}

/// Everything the dashboard shows, in one pass over each collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub capital: f64,
    pub deployed: f64,
    pub available: f64,
    pub deployment_pct: Option<f64>,
    pub trades: TradeStats,
    pub ipos: IpoStats,
    pub ipo_years: Vec<YearlyIpo>,
    pub accounts: Vec<AccountUsage>,
}

impl Dashboard {
    pub fn compute(
        capital: &Capital,
        trades: &[Trade],
        records: &[IpoRecord],
        accounts: &[IpoAccount],
    ) -> Self {
        let trade_stats = TradeStats::compute(trades);
        let deployed = trade_stats.deployed;
        let deployment_pct = if capital.total > 0.0 {
            Some(deployed / capital.total * 100.0)
        } else {
            None
        };

        Dashboard {
            capital: capital.total,
            deployed,
            available: capital.total - deployed,
            deployment_pct,
            trades: trade_stats,
            ipos: IpoStats::compute(records),
            ipo_years: ipo_by_year(records),
            accounts: account_usage(accounts, records),
        }
    }
}

fn ratio(part: usize, whole: usize) -> Option<f64> {
    if whole == 0 {
        None
    } else {
        Some(part as f64 / whole as f64)
    }
}

fn pct_of(value: f64, base: f64) -> Option<f64> {
    if base > 0.0 {
        Some(value / base * 100.0)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ipo::{Allotment, DEFAULT_EXCHANGE, DEFAULT_STATUS};
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, Utc};
    use proptest::prelude::*;

    fn make_trade(status: TradeStatus, buy: f64, qty: f64, exit: Option<f64>) -> Trade {
        Trade {
            id: 1,
            user_id: 1,
            symbol: "RELIANCE".into(),
            sector: "Energy".into(),
            status,
            buy_price: buy,
            qty,
            sl: buy * 0.95,
            target: None,
            buy_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            reason: None,
            timing: None,
            image_url: None,
            chart_link: None,
            tags: None,
            exit_price: exit,
            exit_date: None,
            deployed: Some(buy * qty),
            created_at: Utc::now(),
        }
    }

    fn make_ipo(year: &str, allotted: Allotment, qty: Option<f64>, sell: Option<f64>) -> IpoRecord {
        IpoRecord {
            id: 1,
            user_id: 1,
            company_name: "Bajaj Housing".into(),
            symbol: None,
            year: year.into(),
            exchange: DEFAULT_EXCHANGE.into(),
            sector: "Finance".into(),
            ipo_price: 70.0,
            lot_size: None,
            lots_applied: None,
            allotted,
            qty_allotted: qty,
            amount_applied: None,
            amount_paid: None,
            listing_date: None,
            listing_price: None,
            selling_price: sell,
            selling_date: None,
            status: DEFAULT_STATUS.into(),
            account_id: None,
            notes: None,
            gmp_at_apply: None,
            subscription_times: None,
            created_at: Utc::now(),
        }
    }

    fn make_account(id: i64) -> IpoAccount {
        IpoAccount {
            id,
            user_id: 1,
            holder_name: format!("holder {id}"),
            pan: None,
            demat_name: None,
            demat_provider: "Groww".into(),
            demat_id: None,
            bank: None,
            upi_id: None,
            phone: None,
            email: None,
            category: "Retail".into(),
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn realized_pnl_sums_closed_trades() {
        let trades = vec![
            make_trade(TradeStatus::Exited, 100.0, 10.0, Some(120.0)),
            make_trade(TradeStatus::StopHit, 50.0, 5.0, Some(40.0)),
            make_trade(TradeStatus::Running, 80.0, 3.0, None),
        ];
        let stats = TradeStats::compute(&trades);
        assert_relative_eq!(stats.realized_pnl, 150.0);
        assert_eq!(stats.closed, 2);
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.win_rate, Some(0.5));
    }

    #[test]
    fn tie_counts_as_loss() {
        let trades = vec![make_trade(TradeStatus::Exited, 100.0, 10.0, Some(100.0))];
        let stats = TradeStats::compute(&trades);
        assert_eq!(stats.wins, 0);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.win_rate, Some(0.0));
    }

    #[test]
    fn counts_by_status_and_deployed_on_running_only() {
        let trades = vec![
            make_trade(TradeStatus::Running, 100.0, 10.0, None),
            make_trade(TradeStatus::Running, 200.0, 1.0, None),
            make_trade(TradeStatus::Exited, 300.0, 1.0, Some(310.0)),
            make_trade(TradeStatus::StopHit, 10.0, 1.0, Some(9.0)),
        ];
        let stats = TradeStats::compute(&trades);
        assert_eq!((stats.running, stats.exited, stats.stop_hit), (2, 1, 1));
        assert_relative_eq!(stats.deployed, 1200.0);
    }

    #[test]
    fn empty_journal_has_no_win_rate() {
        let stats = TradeStats::compute(&[]);
        assert_eq!(stats, TradeStats::default());
        assert_eq!(stats.win_rate, None);
    }

    #[test]
    fn running_trade_with_exit_price_still_counts_as_closed() {
        let trades = vec![make_trade(TradeStatus::Running, 100.0, 2.0, Some(110.0))];
        let stats = TradeStats::compute(&trades);
        assert_eq!(stats.closed, 1);
        assert_relative_eq!(stats.realized_pnl, 20.0);
    }

    #[test]
    fn ipo_stats_allotment_rate_and_pnl() {
        let records = vec![
            make_ipo("2024", Allotment::Yes, Some(200.0), Some(90.0)),
            make_ipo("2024", Allotment::Yes, Some(100.0), None),
            make_ipo("2024", Allotment::No, None, None),
            make_ipo("2023", Allotment::No, None, None),
        ];
        let stats = IpoStats::compute(&records);
        assert_eq!(stats.applied, 4);
        assert_eq!(stats.allotted, 2);
        assert_eq!(stats.allotment_rate, Some(0.5));
        assert_eq!(stats.sold, 1);
        assert_eq!(stats.wins, 1);
        assert_relative_eq!(stats.realized_pnl, 4000.0);
        assert_relative_eq!(stats.invested, 21000.0);
        assert_relative_eq!(stats.return_pct.unwrap(), 4000.0 / 21000.0 * 100.0);
    }

    #[test]
    fn ipo_stats_empty() {
        let stats = IpoStats::compute(&[]);
        assert_eq!(stats.allotment_rate, None);
        assert_eq!(stats.return_pct, None);
    }

    #[test]
    fn yearly_rollup_only_profits_sold_allotments() {
        let records = vec![
            make_ipo("2023", Allotment::Yes, Some(100.0), Some(80.0)),
            make_ipo("2024", Allotment::Yes, Some(100.0), Some(60.0)),
            make_ipo("2024", Allotment::Yes, Some(100.0), None),
            make_ipo("2024", Allotment::No, None, Some(500.0)),
        ];
        let years = ipo_by_year(&records);
        assert_eq!(years.len(), 2);

        let y2024 = &years[0];
        assert_eq!(y2024.year, "2024");
        assert_eq!(y2024.applied, 3);
        assert_eq!(y2024.allotted, 2);
        assert_eq!(y2024.sold, 1);
        assert_eq!(y2024.wins, 0);
        assert_relative_eq!(y2024.profit, -1000.0);
        assert_relative_eq!(y2024.invested, 14000.0);

        let y2023 = &years[1];
        assert_eq!(y2023.year, "2023");
        assert_relative_eq!(y2023.profit, 1000.0);
        assert_eq!(y2023.wins, 1);
    }

    #[test]
    fn yearly_win_loss_counts_sales_without_quantity() {
        let records = vec![
            make_ipo("2024", Allotment::Yes, None, Some(90.0)),
            make_ipo("2024", Allotment::Yes, None, Some(50.0)),
            make_ipo("2024", Allotment::Yes, Some(10.0), Some(0.0)),
        ];
        let years = ipo_by_year(&records);
        assert_eq!(years[0].sold, 2);
        assert_eq!(years[0].wins, 1);
        assert_relative_eq!(years[0].profit, 0.0);
    }

    #[test]
    fn yearly_rollup_sorts_numerically_descending() {
        let records = vec![
            make_ipo("2019", Allotment::No, None, None),
            make_ipo("2025", Allotment::No, None, None),
            make_ipo("2021", Allotment::No, None, None),
        ];
        let order: Vec<String> = ipo_by_year(&records).into_iter().map(|y| y.year).collect();
        assert_eq!(order, vec!["2025", "2021", "2019"]);
    }

    #[test]
    fn account_usage_counts_linked_records() {
        let mut a = make_ipo("2024", Allotment::Yes, Some(1.0), None);
        a.account_id = Some(10);
        let mut b = make_ipo("2024", Allotment::No, None, None);
        b.account_id = Some(10);
        let c = make_ipo("2024", Allotment::Yes, Some(1.0), None);

        let usage = account_usage(&[make_account(10), make_account(11)], &[a, b, c]);
        assert_eq!(usage[0].ipos, 2);
        assert_eq!(usage[0].allotted, 1);
        assert_eq!(usage[1].ipos, 0);
    }

    #[test]
    fn dashboard_deployment_pct() {
        let capital = Capital {
            user_id: 1,
            total: 500_000.0,
            updated_at: Utc::now(),
        };
        let trades = vec![make_trade(TradeStatus::Running, 1000.0, 50.0, None)];
        let dash = Dashboard::compute(&capital, &trades, &[], &[]);
        assert_relative_eq!(dash.deployed, 50_000.0);
        assert_relative_eq!(dash.available, 450_000.0);
        assert_relative_eq!(dash.deployment_pct.unwrap(), 10.0);
    }

    #[test]
    fn dashboard_zero_capital_has_no_deployment_pct() {
        let capital = Capital {
            user_id: 1,
            total: 0.0,
            updated_at: Utc::now(),
        };
        let dash = Dashboard::compute(&capital, &[], &[], &[]);
        assert_eq!(dash.deployment_pct, None);
    }

    proptest! {
        #[test]
        fn wins_and_losses_partition_closed_trades(
            legs in prop::collection::vec((1.0f64..1000.0, 1.0f64..100.0, prop::option::of(1.0f64..1000.0)), 0..40)
        ) {
            let trades: Vec<Trade> = legs
                .iter()
                .map(|&(buy, qty, exit)| make_trade(TradeStatus::Exited, buy, qty.floor(), exit))
                .collect();
            let stats = TradeStats::compute(&trades);
            prop_assert_eq!(stats.wins + stats.losses, stats.closed);

            let expected: f64 = legs
                .iter()
                .filter_map(|&(buy, qty, exit)| exit.map(|e| (e - buy) * qty.floor()))
                .sum();
            prop_assert!((stats.realized_pnl - expected).abs() < 1e-6 * expected.abs().max(1.0));
        }
    }
}
