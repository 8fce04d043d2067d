use std::sync::Arc;

use axum::{
    body::Body,
    http::Request,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::{commands::DomainLogic, ports::ledger::LedgerPort};

pub mod dto;
pub mod errors;
pub mod routes;

/// Shared state handed to every handler
pub struct AppState<L> {
    ledger: Arc<L>,
    domain: DomainLogic<L>,
}

impl<L> AppState<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self {
            domain: DomainLogic::new(ledger.clone()),
            ledger,
        }
    }
}

impl<L> Clone for AppState<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            domain: self.domain.clone(),
        }
    }
}

/// Build the application router
pub fn router<L>(state: AppState<L>) -> Router
where
    L: LedgerPort + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(routes::health))
        .route(
            "/points",
            get(routes::list_points::<L>).delete(routes::remove_accounts::<L>),
        )
        .route(
            "/points/:account_id",
            get(routes::get_points::<L>).delete(routes::remove_account::<L>),
        )
        .route("/points/:account_id/add", post(routes::add_points::<L>))
        .route("/points/:account_id/spend", post(routes::spend_points::<L>))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    request_id = %Uuid::new_v4(),
                    method = %request.method(),
                    uri = %request.uri()
                )
            }),
        )
        .with_state(state)
}
