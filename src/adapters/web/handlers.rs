//! HTTP request handlers for the web adapter.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::capital::{Capital, CapitalUpdate};
use crate::domain::ipo::{IpoAccount, IpoAccountDraft, IpoDraft, IpoFilter, IpoView};
use crate::domain::metrics::Dashboard;
use crate::domain::sizing::{PositionSize, SizingRequest};
use crate::domain::symbols::{self, Listing};
use crate::domain::trade::{TradeDraft, TradeFilter, TradeView};
use crate::domain::user::{UserProfile, normalize_email, validate_signup};

use super::auth::{AuthSession, Credentials, SessionUser, hash_password};
use super::{AppState, WebError};

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted: usize,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct TradeQuery {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IpoQuery {
    pub status: Option<String>,
    pub year: Option<String>,
    pub account_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SymbolQuery {
    pub q: Option<String>,
}

/// Session user for a route behind `login_required!`.
fn current_user(auth_session: &AuthSession) -> Result<&SessionUser, WebError> {
    auth_session
        .user
        .as_ref()
        .ok_or_else(|| WebError::unauthorized("not signed in"))
}

fn deleted(count: usize) -> Json<DeleteResponse> {
    Json(DeleteResponse {
        success: true,
        deleted: count,
    })
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    mut auth_session: AuthSession,
    Json(creds): Json<Credentials>,
) -> Result<(StatusCode, Json<UserProfile>), WebError> {
    validate_signup(&creds.email, &creds.password)?;
    let email = normalize_email(&creds.email);
    let hash = hash_password(&creds.password)?;
    let user = state.users.create_user(&email, &hash)?;
    tracing::info!(user_id = user.id, "user signed up");

    let profile = UserProfile::from(&user);
    auth_session.login(&SessionUser::from(user)).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn login(
    mut auth_session: AuthSession,
    Json(creds): Json<Credentials>,
) -> Result<Json<UserProfile>, WebError> {
    let email = normalize_email(&creds.email);
    let Some(user) = auth_session.authenticate(creds).await? else {
        tracing::warn!(%email, "login rejected");
        return Err(WebError::unauthorized("invalid email or password"));
    };

    auth_session.login(&user).await?;
    Ok(Json(user.profile()))
}

pub async fn logout(mut auth_session: AuthSession) -> Result<Json<LogoutResponse>, WebError> {
    auth_session.logout().await?;
    Ok(Json(LogoutResponse { success: true }))
}

pub async fn me(auth_session: AuthSession) -> Result<Json<UserProfile>, WebError> {
    Ok(Json(current_user(&auth_session)?.profile()))
}

pub async fn get_capital(
    State(state): State<Arc<AppState>>,
    auth_session: AuthSession,
) -> Result<Json<Capital>, WebError> {
    let user = current_user(&auth_session)?;
    let capital = state
        .ledger
        .get_or_create_capital(user.id, state.settings.default_capital)?;
    Ok(Json(capital))
}

pub async fn set_capital(
    State(state): State<Arc<AppState>>,
    auth_session: AuthSession,
    Json(update): Json<CapitalUpdate>,
) -> Result<Json<Capital>, WebError> {
    let user = current_user(&auth_session)?;
    Ok(Json(state.ledger.set_capital(user.id, update.total)?))
}

pub async fn list_trades(
    State(state): State<Arc<AppState>>,
    auth_session: AuthSession,
    Query(query): Query<TradeQuery>,
) -> Result<Json<Vec<TradeView>>, WebError> {
    let user = current_user(&auth_session)?;
    let filter = TradeFilter::from_query(query.status.as_deref())?;
    let trades = filter.apply(state.ledger.list_trades(user.id)?);
    Ok(Json(trades.into_iter().map(TradeView::from).collect()))
}

pub async fn upsert_trade(
    State(state): State<Arc<AppState>>,
    auth_session: AuthSession,
    Json(draft): Json<TradeDraft>,
) -> Result<Json<Option<TradeView>>, WebError> {
    let user = current_user(&auth_session)?;
    draft.validate()?;
    let stored = state.ledger.upsert_trade(user.id, &draft)?;
    if stored.is_none() {
        tracing::warn!(user_id = user.id, id = ?draft.id, "trade upsert skipped: id owned by another user");
    }
    Ok(Json(stored.map(TradeView::from)))
}

pub async fn delete_trade(
    State(state): State<Arc<AppState>>,
    auth_session: AuthSession,
    Json(req): Json<DeleteRequest>,
) -> Result<Json<DeleteResponse>, WebError> {
    let user = current_user(&auth_session)?;
    Ok(deleted(state.ledger.delete_trade(user.id, req.id)?))
}

pub async fn list_ipo_records(
    State(state): State<Arc<AppState>>,
    auth_session: AuthSession,
    Query(query): Query<IpoQuery>,
) -> Result<Json<Vec<IpoView>>, WebError> {
    let user = current_user(&auth_session)?;
    let account_id = IpoFilter::parse_account_id(query.account_id.as_deref())?;
    let filter = IpoFilter::new(query.status.as_deref(), query.year.as_deref(), account_id);
    let records = filter.apply(state.ledger.list_ipo_records(user.id)?);
    Ok(Json(records.into_iter().map(IpoView::from).collect()))
}

pub async fn upsert_ipo_record(
    State(state): State<Arc<AppState>>,
    auth_session: AuthSession,
    Json(draft): Json<IpoDraft>,
) -> Result<Json<Option<IpoView>>, WebError> {
    let user = current_user(&auth_session)?;
    draft.validate()?;
    let stored = state.ledger.upsert_ipo_record(user.id, &draft)?;
    if stored.is_none() {
        tracing::warn!(user_id = user.id, id = ?draft.id, "ipo record upsert skipped: id owned by another user");
    }
    Ok(Json(stored.map(IpoView::from)))
}

pub async fn delete_ipo_record(
    State(state): State<Arc<AppState>>,
    auth_session: AuthSession,
    Json(req): Json<DeleteRequest>,
) -> Result<Json<DeleteResponse>, WebError> {
    let user = current_user(&auth_session)?;
    Ok(deleted(state.ledger.delete_ipo_record(user.id, req.id)?))
}

pub async fn list_ipo_accounts(
    State(state): State<Arc<AppState>>,
    auth_session: AuthSession,
) -> Result<Json<Vec<IpoAccount>>, WebError> {
    let user = current_user(&auth_session)?;
    Ok(Json(state.ledger.list_ipo_accounts(user.id)?))
}

pub async fn upsert_ipo_account(
    State(state): State<Arc<AppState>>,
    auth_session: AuthSession,
    Json(draft): Json<IpoAccountDraft>,
) -> Result<Json<Option<IpoAccount>>, WebError> {
    let user = current_user(&auth_session)?;
    draft.validate()?;
    let stored = state.ledger.upsert_ipo_account(user.id, &draft)?;
    if stored.is_none() {
        tracing::warn!(user_id = user.id, id = ?draft.id, "ipo account upsert skipped: id owned by another user");
    }
    Ok(Json(stored))
}

pub async fn delete_ipo_account(
    State(state): State<Arc<AppState>>,
    auth_session: AuthSession,
    Json(req): Json<DeleteRequest>,
) -> Result<Json<DeleteResponse>, WebError> {
    let user = current_user(&auth_session)?;
    Ok(deleted(state.ledger.delete_ipo_account(user.id, req.id)?))
}

pub async fn stats(
    State(state): State<Arc<AppState>>,
    auth_session: AuthSession,
) -> Result<Json<Dashboard>, WebError> {
    let user = current_user(&auth_session)?;
    let capital = state
        .ledger
        .get_or_create_capital(user.id, state.settings.default_capital)?;
    let trades = state.ledger.list_trades(user.id)?;
    let records = state.ledger.list_ipo_records(user.id)?;
    let accounts = state.ledger.list_ipo_accounts(user.id)?;
    Ok(Json(Dashboard::compute(&capital, &trades, &records, &accounts)))
}

pub async fn position_size(Json(request): Json<SizingRequest>) -> Json<PositionSize> {
    Json(PositionSize::compute(&request))
}

pub async fn search_symbols(Query(query): Query<SymbolQuery>) -> Json<Vec<Listing>> {
    Json(symbols::search(query.q.as_deref().unwrap_or("")))
}

pub async fn not_found() -> WebError {
    WebError::new(StatusCode::NOT_FOUND, "not found")
}
