use std::{borrow::Cow, sync::Arc};

pub mod add_points;
pub mod spend_points;

/// Caller-facing commands over a ledger
///
/// Requests are validated here before they reach the ledger.
pub struct DomainLogic<L> {
    ledger: Arc<L>,
}

impl<L> DomainLogic<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self { ledger }
    }
}

impl<L> Clone for DomainLogic<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("ledger port error: {0}")]
    Ledger(#[from] crate::ports::ledger::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(Cow<'static, str>),
}
