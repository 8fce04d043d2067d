use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use crate::{domain::Transaction, ports::ledger::LedgerPort};
use tower::Service;

use super::{DomainLogic, Error};

/// Spend points from an account, oldest grants first
#[derive(Clone, Debug)]
pub struct SpendPointsRequest {
    pub account_id: String,
    pub points: i64,
}

impl<L> Service<SpendPointsRequest> for DomainLogic<L>
where
    L: LedgerPort + Send + Sync + 'static,
{
    /// Deductions applied to the account, one per consumed grant
    type Response = Vec<Transaction>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: SpendPointsRequest) -> Self::Future {
        let ledger = self.ledger.clone();
        Box::pin(async move {
            if req.points <= 0 {
                return Err(Error::InvalidRequest(
                    format!("points to spend must be positive, got {}", req.points).into(),
                ));
            }

            let deductions = ledger.spend(req.account_id, req.points).await?;

            Ok(deductions)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::ledger::memory::MemoryLedger,
        ports::ledger::{Error as LedgerError, MockLedgerPort},
    };
    use chrono::{DateTime, Utc};
    use rstest::*;
    use speculoos::prelude::*;
    use std::sync::Arc;
    use tower::{BoxError, ServiceExt};

    fn request(points: i64) -> SpendPointsRequest {
        SpendPointsRequest {
            account_id: "acct".to_string(),
            points,
        }
    }

    #[rstest]
    #[case(0)]
    #[case(-100)]
    #[tokio::test]
    async fn test_call_invalid(#[case] points: i64) -> Result<(), BoxError> {
        // GIVEN a ledger that must not be called
        let mut ledger = MockLedgerPort::new();
        ledger.expect_spend().times(0);
        let domain = DomainLogic::new(Arc::new(ledger));

        // WHEN spending a non-positive amount
        let res = domain.clone().oneshot(request(points)).await;

        // THEN it is rejected
        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::InvalidRequest(_)));
        Arc::into_inner(domain.ledger).unwrap().checkpoint();

        Ok(())
    }

    #[tokio::test]
    async fn test_call_not_enough_points() -> Result<(), BoxError> {
        // GIVEN a ledger without enough points
        let mut ledger = MockLedgerPort::new();
        ledger
            .expect_spend()
            .times(1)
            .withf(|account_id, points| account_id == "acct" && *points == 2000)
            .returning(|account_id, points| {
                Err(LedgerError::NotEnoughPoints {
                    account_id,
                    requested: points,
                    shortfall: 1000,
                })
            });
        let domain = DomainLogic::new(Arc::new(ledger));

        // WHEN spending
        let res = domain.clone().oneshot(request(2000)).await;

        // THEN the ledger error is passed through
        assert_that!(res).is_err().matches(|err| {
            matches!(
                err,
                Error::Ledger(LedgerError::NotEnoughPoints {
                    shortfall: 1000,
                    ..
                })
            )
        });
        Arc::into_inner(domain.ledger).unwrap().checkpoint();

        Ok(())
    }

    #[tokio::test]
    async fn test_call_memory() -> Result<(), BoxError> {
        // GIVEN an in-memory ledger with points from two payers
        let ledger = MemoryLedger::default();
        let older: DateTime<Utc> = "2020-10-31T10:00:00Z".parse()?;
        let newer: DateTime<Utc> = "2020-11-01T10:00:00Z".parse()?;
        ledger
            .grant("acct".to_string(), "UNILEVER".to_string(), 500, newer)
            .await?;
        ledger
            .grant("acct".to_string(), "DANNON".to_string(), 300, older)
            .await?;
        let domain = DomainLogic::new(Arc::new(ledger.clone()));

        // WHEN spending
        let res = domain.clone().oneshot(request(400)).await?;

        // THEN the oldest points are spent first
        let res: Vec<_> = res.iter().map(|t| (t.payer.as_str(), t.points)).collect();
        assert_that!(res).is_equal_to(vec![("DANNON", -300), ("UNILEVER", -100)]);
        let balances = ledger.get_balances("acct".to_string()).await?;
        assert_that!(balances.get("UNILEVER")).is_equal_to(Some(&400));

        Ok(())
    }
}
