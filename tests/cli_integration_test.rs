#![cfg(feature = "web")]
//! CLI integration tests.
//!
//! Tests cover:
//! - Argument parsing for every subcommand
//! - Settings loaded from real INI files on disk
//! - User registration and the per-user report

mod common;

use clap::Parser;
use std::io::Write;
use swingbook::cli::{self, Cli, Command};
use swingbook::domain::error::TrackerError;
use swingbook::domain::trade::TradeDraft;
use swingbook::ports::ledger_port::LedgerPort;
use swingbook::ports::user_port::UserPort;

use common::*;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const VALID_INI: &str = r#"
[database]
path = :memory:
pool_size = 2

[web]
listen = 127.0.0.1:8088
secure_cookies = true

[auth]
session_lifetime = 7200

[ledger]
default_capital = 250000
"#;

mod argument_parsing {
    use super::*;

    #[test]
    fn parses_serve() {
        let cli = Cli::try_parse_from(["swingbook", "serve", "--config", "book.ini"]).unwrap();
        assert!(matches!(cli.command, Command::Serve { .. }));
    }

    #[test]
    fn parses_create_user() {
        let cli = Cli::try_parse_from([
            "swingbook",
            "create-user",
            "-c",
            "book.ini",
            "--email",
            "me@example.com",
        ])
        .unwrap();
        match cli.command {
            Command::CreateUser { email, .. } => assert_eq!(email, "me@example.com"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_size_with_optional_price() {
        let cli = Cli::try_parse_from([
            "swingbook",
            "size",
            "--capital",
            "500000",
            "--risk-pct",
            "1",
            "--sl-pct",
            "5",
        ])
        .unwrap();
        match cli.command {
            Command::Size {
                capital,
                risk_pct,
                sl_pct,
                price,
            } => {
                assert_eq!(capital, 500_000.0);
                assert_eq!(risk_pct, 1.0);
                assert_eq!(sl_pct, 5.0);
                assert_eq!(price, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn report_requires_email() {
        assert!(Cli::try_parse_from(["swingbook", "report", "--config", "book.ini"]).is_err());
    }
}

mod config_loading {
    use super::*;

    #[test]
    fn loads_settings_from_file() {
        let file = write_temp_ini(VALID_INI);
        let settings = cli::load_settings(file.path()).unwrap();
        assert_eq!(settings.database_path, ":memory:");
        assert_eq!(settings.pool_size, 2);
        assert_eq!(settings.listen.port(), 8088);
        assert!(settings.secure_cookies);
        assert_eq!(settings.session_lifetime, 7200);
        assert_eq!(settings.default_capital, 250_000.0);
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = cli::load_settings(std::path::Path::new("/nonexistent/book.ini")).unwrap_err();
        assert!(matches!(err, TrackerError::ConfigParse { .. }));
    }

    #[test]
    fn missing_database_section() {
        let file = write_temp_ini("[web]\nlisten = 127.0.0.1:3000\n");
        let err = cli::load_settings(file.path()).unwrap_err();
        assert!(matches!(err, TrackerError::ConfigMissing { .. }));
    }

    #[test]
    fn invalid_pool_size() {
        let file = write_temp_ini("[database]\npath = x.db\npool_size = 0\n");
        let err = cli::load_settings(file.path()).unwrap_err();
        assert!(matches!(err, TrackerError::ConfigInvalid { .. }));
    }
}

mod user_commands {
    use super::*;

    #[test]
    fn register_user_hashes_password() {
        let store = memory_store();
        let user = cli::register_user(&*store, "CLI@Example.com", "secret123").unwrap();
        assert_eq!(user.email, "cli@example.com");
        assert!(user.password_hash.starts_with("$argon2id$"));
        assert!(store.find_user_by_email("cli@example.com").unwrap().is_some());
    }

    #[test]
    fn register_user_rejects_short_password() {
        let store = memory_store();
        let err = cli::register_user(&*store, "a@example.com", "123").unwrap_err();
        assert!(matches!(err, TrackerError::Validation { .. }));
    }

    #[test]
    fn report_for_unknown_user_is_not_found() {
        let store = memory_store();
        let err = cli::build_report(&*store, &*store, "ghost@example.com", 500_000.0)
            .unwrap_err();
        assert!(matches!(err, TrackerError::NotFound { .. }));
    }

    #[test]
    fn report_uses_default_capital() {
        let store = memory_store();
        let user = cli::register_user(&*store, "r@example.com", "secret123").unwrap();
        let draft: TradeDraft = serde_json::from_value(trade_json("TCS", 100.0, 10.0)).unwrap();
        store.upsert_trade(user.id, &draft).unwrap();

        let report =
            cli::build_report(&*store, &*store, "R@example.com", 250_000.0).unwrap();
        assert_eq!(report.capital, 250_000.0);
        assert_eq!(report.deployed, 1_000.0);
        assert_eq!(report.trades.running, 1);
    }
}
