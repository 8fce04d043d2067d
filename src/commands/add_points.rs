use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use crate::{domain::Transaction, ports::ledger::LedgerPort};
use chrono::{DateTime, Utc};
use tower::Service;

use super::{DomainLogic, Error};

/// Grant points from a payer to an account
#[derive(Clone, Debug)]
pub struct AddPointsRequest {
    pub account_id: String,
    pub payer: String,
    /// Points to add
    ///
    /// Negative values are accepted and recorded as a manual deduction against the payer.
    pub points: i64,
    pub timestamp: DateTime<Utc>,
}

impl<L> Service<AddPointsRequest> for DomainLogic<L>
where
    L: LedgerPort + Send + Sync + 'static,
{
    type Response = Transaction;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: AddPointsRequest) -> Self::Future {
        let ledger = self.ledger.clone();
        Box::pin(async move {
            validate(&req)?;

            let transaction = ledger
                .grant(req.account_id, req.payer, req.points, req.timestamp)
                .await?;

            Ok(transaction)
        })
    }
}

fn validate(req: &AddPointsRequest) -> Result<(), Error> {
    if req.payer.trim().is_empty() {
        return Err(Error::InvalidRequest("payer cannot be empty".into()));
    }
    if req.points == 0 {
        return Err(Error::InvalidRequest(
            format!(
                "cannot add a transaction with zero points for account {}",
                req.account_id
            )
            .into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{adapters::ledger::memory::MemoryLedger, ports::ledger::MockLedgerPort};
    use rstest::*;
    use speculoos::prelude::*;
    use std::sync::Arc;
    use tower::{BoxError, ServiceExt};

    #[fixture]
    fn timestamp() -> DateTime<Utc> {
        "2020-11-02T14:00:00Z".parse().unwrap()
    }

    fn request(payer: &str, points: i64, timestamp: DateTime<Utc>) -> AddPointsRequest {
        AddPointsRequest {
            account_id: "acct".to_string(),
            payer: payer.to_string(),
            points,
            timestamp,
        }
    }

    /// Invalid requests never reach the ledger
    #[rstest]
    #[case("DANNON", 0)]
    #[case("", 100)]
    #[case("   ", -100)]
    #[tokio::test]
    async fn test_call_invalid(
        timestamp: DateTime<Utc>,
        #[case] payer: &str,
        #[case] points: i64,
    ) -> Result<(), BoxError> {
        // GIVEN a ledger that must not be called
        let mut ledger = MockLedgerPort::new();
        ledger.expect_grant().times(0);
        let domain = DomainLogic::new(Arc::new(ledger));

        // WHEN calling the service with an invalid request
        let res = domain
            .clone()
            .oneshot(request(payer, points, timestamp))
            .await;

        // THEN it is rejected
        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::InvalidRequest(_)));
        Arc::into_inner(domain.ledger).unwrap().checkpoint();

        Ok(())
    }

    #[rstest]
    #[case(1000)]
    #[case(-200)]
    #[tokio::test]
    async fn test_call(timestamp: DateTime<Utc>, #[case] points: i64) -> Result<(), BoxError> {
        // GIVEN a ledger port expecting a grant
        let mut ledger = MockLedgerPort::new();
        ledger
            .expect_grant()
            .times(1)
            .withf(move |account_id, payer, p, t| {
                account_id == "acct" && payer == "DANNON" && *p == points && *t == timestamp
            })
            .returning(|_, payer, points, timestamp| {
                Ok(Transaction::new(payer, points, timestamp))
            });
        let domain = DomainLogic::new(Arc::new(ledger));

        // WHEN calling the service
        let res = domain
            .clone()
            .oneshot(request("DANNON", points, timestamp))
            .await;

        // THEN it returns the applied transaction
        assert_that!(res)
            .is_ok()
            .is_equal_to(Transaction::new("DANNON", points, timestamp));
        Arc::into_inner(domain.ledger).unwrap().checkpoint();

        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_call_memory(timestamp: DateTime<Utc>) -> Result<(), BoxError> {
        // GIVEN an in-memory ledger
        let ledger = MemoryLedger::default();
        let domain = DomainLogic::new(Arc::new(ledger.clone()));

        // WHEN adding points twice
        domain
            .clone()
            .oneshot(request("DANNON", 1000, timestamp))
            .await?;
        domain
            .clone()
            .oneshot(request("DANNON", -200, timestamp))
            .await?;

        // THEN the balance reflects both transactions
        let balances = ledger.get_balances("acct".to_string()).await?;
        assert_that!(balances.get("DANNON")).is_equal_to(Some(&800));

        Ok(())
    }
}
