//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::adapters::file_config_adapter::FileConfigAdapter;
#[cfg(feature = "sqlite")]
use crate::adapters::sqlite_adapter::SqliteAdapter;
use crate::domain::error::TrackerError;
use crate::domain::metrics::Dashboard;
use crate::domain::settings::Settings;
use crate::domain::sizing::{PositionSize, SizingRequest};
use crate::domain::user::{User, normalize_email, validate_signup};
use crate::ports::ledger_port::LedgerPort;
use crate::ports::user_port::UserPort;

/// Set to `json` for one JSON object per log line.
pub const LOG_FORMAT_ENV: &str = "SWINGBOOK_LOG_FORMAT";

#[derive(Parser, Debug)]
#[command(name = "swingbook", about = "Swing trade and IPO journal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Register a user; the password is read from stdin
    CreateUser {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        email: String,
    },
    /// Print one user's dashboard as JSON
    Report {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        email: String,
    },
    /// Size a position from capital, risk and stop distance
    Size {
        #[arg(long)]
        capital: f64,
        #[arg(long)]
        risk_pct: f64,
        #[arg(long)]
        sl_pct: f64,
        #[arg(long)]
        price: Option<f64>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Serve { config } => run_serve(&config),
        Command::CreateUser { config, email } => run_create_user(&config, &email),
        Command::Report { config, email } => run_report(&config, &email),
        Command::Size {
            capital,
            risk_pct,
            sl_pct,
            price,
        } => run_size(SizingRequest {
            capital,
            risk_pct,
            sl_pct,
            price,
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(&err)
        }
    }
}

/// Installs the global subscriber. Filter from `RUST_LOG`, default `info`;
/// output goes to stderr so command output on stdout stays clean.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(io::stderr),
            )
            .try_init()
    } else {
        registry.with(fmt::layer().with_writer(io::stderr)).try_init()
    };
    if let Err(e) = result {
        eprintln!("warning: tracing already initialised: {e}");
    }
}

pub fn load_settings(path: &Path) -> Result<Settings, TrackerError> {
    let config = FileConfigAdapter::from_file(path)?;
    Settings::from_config(&config)
}

/// Registers a user after the same checks as the signup endpoint.
#[cfg(feature = "web")]
pub fn register_user(
    users: &dyn UserPort,
    email: &str,
    password: &str,
) -> Result<User, TrackerError> {
    validate_signup(email, password)?;
    let hash = crate::adapters::web::hash_password(password)?;
    let user = users.create_user(&normalize_email(email), &hash)?;
    tracing::info!(user_id = user.id, "user created");
    Ok(user)
}

/// The dashboard for the user registered under `email`.
pub fn build_report(
    ledger: &dyn LedgerPort,
    users: &dyn UserPort,
    email: &str,
    default_capital: f64,
) -> Result<Dashboard, TrackerError> {
    let user = users
        .find_user_by_email(&normalize_email(email))?
        .ok_or_else(|| TrackerError::NotFound {
            entity: "user".into(),
            key: email.to_string(),
        })?;

    let capital = ledger.get_or_create_capital(user.id, default_capital)?;
    let trades = ledger.list_trades(user.id)?;
    let records = ledger.list_ipo_records(user.id)?;
    let accounts = ledger.list_ipo_accounts(user.id)?;
    Ok(Dashboard::compute(&capital, &trades, &records, &accounts))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), TrackerError> {
    let text = serde_json::to_string_pretty(value).map_err(io::Error::from)?;
    println!("{text}");
    Ok(())
}

#[cfg(feature = "sqlite")]
fn open_store(settings: &Settings) -> Result<SqliteAdapter, TrackerError> {
    let store = SqliteAdapter::from_settings(settings)?;
    store.initialize_schema()?;
    Ok(store)
}

#[cfg(feature = "web")]
fn run_serve(config_path: &Path) -> Result<(), TrackerError> {
    use crate::adapters::web::{AppState, build_router};
    use std::sync::Arc;

    tracing::info!(config = %config_path.display(), "loading config");
    let settings = load_settings(config_path)?;
    let store = Arc::new(open_store(&settings)?);
    let addr = settings.listen;

    let state = AppState {
        ledger: store.clone(),
        users: store,
        settings,
    };

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let router = build_router(state).await?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, "web server listening");
        axum::serve(listener, router).await?;
        Ok(())
    })
}

#[cfg(not(feature = "web"))]
fn run_serve(_config_path: &Path) -> Result<(), TrackerError> {
    Err(TrackerError::validation(
        "command",
        "the web feature is required for serve",
    ))
}

#[cfg(feature = "web")]
fn run_create_user(config_path: &Path, email: &str) -> Result<(), TrackerError> {
    let settings = load_settings(config_path)?;
    let store = open_store(&settings)?;

    eprintln!("Enter password for {email}:");
    let password = io::stdin().lock().lines().next().transpose()?.unwrap_or_default();

    let user = register_user(&store, email, password.trim_end_matches(['\r', '\n']))?;
    println!("created user {} ({})", user.id, user.email);
    Ok(())
}

#[cfg(not(feature = "web"))]
fn run_create_user(_config_path: &Path, _email: &str) -> Result<(), TrackerError> {
    Err(TrackerError::validation(
        "command",
        "the web feature is required for create-user",
    ))
}

#[cfg(feature = "sqlite")]
fn run_report(config_path: &Path, email: &str) -> Result<(), TrackerError> {
    let settings = load_settings(config_path)?;
    let store = open_store(&settings)?;
    let dashboard = build_report(&store, &store, email, settings.default_capital)?;
    print_json(&dashboard)
}

#[cfg(not(feature = "sqlite"))]
fn run_report(_config_path: &Path, _email: &str) -> Result<(), TrackerError> {
    Err(TrackerError::validation(
        "command",
        "the sqlite feature is required for report",
    ))
}

fn run_size(request: SizingRequest) -> Result<(), TrackerError> {
    print_json(&PositionSize::compute(&request))
}
