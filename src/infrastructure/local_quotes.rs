use crate::domain::fees::{FeeBreakdown, FeeCalculator};
use crate::domain::gateway::FeeQuoteRequest;
use crate::domain::ports::FeeQuoteService;
use crate::error::Result;
use async_trait::async_trait;

/// Fee quotes computed in-process from the configured schedule.
#[derive(Debug, Clone, Default)]
pub struct LocalFeeQuotes {
    calculator: FeeCalculator,
}

impl LocalFeeQuotes {
    pub fn new(calculator: FeeCalculator) -> Self {
        Self { calculator }
    }
}

#[async_trait]
impl FeeQuoteService for LocalFeeQuotes {
    async fn quote(&self, request: FeeQuoteRequest) -> Result<FeeBreakdown> {
        self.calculator.compute(request.amount, request.method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::method::PaymentMethod;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_local_quotes() {
        let quotes = LocalFeeQuotes::default();
        let breakdown = quotes
            .quote(FeeQuoteRequest {
                amount: dec!(1000),
                method: PaymentMethod::Card,
            })
            .await
            .unwrap();
        assert_eq!(breakdown.total_payable.value(), dec!(1051.92));

        assert!(
            quotes
                .quote(FeeQuoteRequest {
                    amount: dec!(0.5),
                    method: PaymentMethod::Card,
                })
                .await
                .is_err()
        );
    }
}
