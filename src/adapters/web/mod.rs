//! Web server adapter: JSON API behind session-cookie authentication.

mod auth;
mod error;
mod handlers;

pub use auth::{AuthSession, Backend, Credentials, SessionUser, hash_password};
pub use error::{WebError, status_from_error};
pub use handlers::*;

use axum::{
    Router,
    routing::{get, post},
};
use axum_login::{AuthManagerLayerBuilder, login_required};
use std::sync::Arc;
use time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::Key;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, SessionStore};
use tower_sessions_rusqlite_store::RusqliteStore;

use crate::domain::error::TrackerError;
use crate::domain::settings::Settings;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::user_port::UserPort;

pub struct AppState {
    pub ledger: Arc<dyn LedgerPort + Send + Sync>,
    pub users: Arc<dyn UserPort + Send + Sync>,
    pub settings: Settings,
}

/// Builds the full application router. Sessions persist in the SQLite file
/// named by `[auth] session_store`, or in memory when it is unset.
pub async fn build_router(state: AppState) -> Result<Router, TrackerError> {
    match state.settings.session_store.clone() {
        Some(path) => {
            let conn = tokio_rusqlite::Connection::open(&path)
                .await
                .map_err(|e| TrackerError::Database {
                    reason: format!("session store {path}: {e}"),
                })?;
            let store = RusqliteStore::new(conn);
            store.migrate().await.map_err(|e| TrackerError::Database {
                reason: format!("session store {path}: {e}"),
            })?;
            assemble(state, store)
        }
        None => assemble(state, MemoryStore::default()),
    }
}

/// Router with an in-memory session store and unsigned cookies.
pub fn build_test_router(state: AppState) -> Router {
    let session_layer = session_layer(&state.settings, MemoryStore::default());
    let backend = Backend::new(state.users.clone());
    let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();
    routes(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(auth_layer),
    )
}

fn assemble<S>(state: AppState, store: S) -> Result<Router, TrackerError>
where
    S: SessionStore + Clone,
{
    let key = signing_key(&state.settings)?;
    let session_layer = session_layer(&state.settings, store);
    let backend = Backend::new(state.users.clone());

    let router = match key {
        Some(key) => {
            let auth_layer =
                AuthManagerLayerBuilder::new(backend, session_layer.with_signed(key)).build();
            routes(state).layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(auth_layer),
            )
        }
        None => {
            let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();
            routes(state).layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(auth_layer),
            )
        }
    };
    Ok(router)
}

fn session_layer<S: SessionStore + Clone>(settings: &Settings, store: S) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_secure(settings.secure_cookies)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(
            settings.session_lifetime,
        )))
}

fn signing_key(settings: &Settings) -> Result<Option<Key>, TrackerError> {
    let Some(secret) = settings.session_secret.as_deref() else {
        return Ok(None);
    };
    let invalid = |reason: String| TrackerError::ConfigInvalid {
        section: "auth".into(),
        key: "session_secret".into(),
        reason,
    };
    let bytes = hex::decode(secret).map_err(|e| invalid(e.to_string()))?;
    Key::try_from(bytes.as_slice())
        .map(Some)
        .map_err(|e| invalid(e.to_string()))
}

fn routes(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/auth/me", get(handlers::me))
        .route(
            "/api/capital",
            get(handlers::get_capital).post(handlers::set_capital),
        )
        .route(
            "/api/trades",
            get(handlers::list_trades)
                .post(handlers::upsert_trade)
                .delete(handlers::delete_trade),
        )
        .route(
            "/api/ipo-records",
            get(handlers::list_ipo_records)
                .post(handlers::upsert_ipo_record)
                .delete(handlers::delete_ipo_record),
        )
        .route(
            "/api/ipo-accounts",
            get(handlers::list_ipo_accounts)
                .post(handlers::upsert_ipo_account)
                .delete(handlers::delete_ipo_account),
        )
        .route("/api/stats", get(handlers::stats))
        .route("/api/position-size", post(handlers::position_size))
        .route("/api/symbols", get(handlers::search_symbols))
        .route_layer(login_required!(Backend));

    Router::new()
        .route("/api/auth/signup", post(handlers::signup))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        .merge(protected)
        .fallback(handlers::not_found)
        .with_state(Arc::new(state))
}
