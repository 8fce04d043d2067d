use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use tower::ServiceExt;

use crate::{
    commands::{add_points::AddPointsRequest, spend_points::SpendPointsRequest},
    ports::ledger::LedgerPort,
};

use super::{
    dto::{
        AccountPointsBody, AccountsBody, AccountsRemovedBody, AddPointsBody, DeductionBody,
        HealthBody, ObjectOrEncoded, SpendPointsBody, TransactionBody,
    },
    errors::ApiError,
    AppState,
};

pub async fn health() -> Json<HealthBody> {
    Json(HealthBody {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Balances of every account
pub async fn list_points<L>(
    State(state): State<AppState<L>>,
) -> Result<Json<AccountsBody>, ApiError>
where
    L: LedgerPort + Send + Sync + 'static,
{
    let mut accounts = Vec::new();
    for account_id in state.ledger.list_accounts().await? {
        let points = state.ledger.get_balances(account_id.clone()).await?;
        accounts.push(AccountPointsBody { account_id, points });
    }

    Ok(Json(AccountsBody { accounts }))
}

pub async fn get_points<L>(
    State(state): State<AppState<L>>,
    Path(account_id): Path<String>,
) -> Result<Json<BTreeMap<String, i64>>, ApiError>
where
    L: LedgerPort + Send + Sync + 'static,
{
    // An account without balances still exists, so look it up first
    match state.ledger.get_account(account_id.clone()).await? {
        Some(account) => Ok(Json(account.balances().clone())),
        None => Err(ApiError::not_found(format!("Account {account_id} not found."))),
    }
}

pub async fn add_points<L>(
    State(state): State<AppState<L>>,
    Path(account_id): Path<String>,
    body: Result<Json<ObjectOrEncoded<AddPointsBody>>, JsonRejection>,
) -> Result<Json<TransactionBody>, ApiError>
where
    L: LedgerPort + Send + Sync + 'static,
{
    let Json(body) = body?;
    let body = body.into_inner()?;
    tracing::debug!(account_id = %account_id, body = ?body, "add points request");

    let transaction = state
        .domain
        .clone()
        .oneshot(AddPointsRequest {
            account_id,
            payer: body.payer,
            points: body.points,
            timestamp: body.timestamp,
        })
        .await?;

    Ok(Json(transaction.into()))
}

pub async fn spend_points<L>(
    State(state): State<AppState<L>>,
    Path(account_id): Path<String>,
    body: Result<Json<ObjectOrEncoded<SpendPointsBody>>, JsonRejection>,
) -> Result<Json<Vec<DeductionBody>>, ApiError>
where
    L: LedgerPort + Send + Sync + 'static,
{
    let Json(body) = body?;
    let body = body.into_inner()?;
    tracing::debug!(account_id = %account_id, body = ?body, "spend points request");

    let deductions = state
        .domain
        .clone()
        .oneshot(SpendPointsRequest {
            account_id,
            points: body.points,
        })
        .await?;

    Ok(Json(deductions.into_iter().map(Into::into).collect()))
}

pub async fn remove_account<L>(
    State(state): State<AppState<L>>,
    Path(account_id): Path<String>,
) -> Result<StatusCode, ApiError>
where
    L: LedgerPort + Send + Sync + 'static,
{
    if state.ledger.remove_account(account_id.clone()).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("Account {account_id} not found.")))
    }
}

pub async fn remove_accounts<L>(
    State(state): State<AppState<L>>,
) -> Result<Json<AccountsRemovedBody>, ApiError>
where
    L: LedgerPort + Send + Sync + 'static,
{
    let mut accounts_removed = Vec::new();
    for account_id in state.ledger.list_accounts().await? {
        if state.ledger.remove_account(account_id.clone()).await? {
            accounts_removed.push(account_id);
        }
    }

    Ok(Json(AccountsRemovedBody { accounts_removed }))
}
