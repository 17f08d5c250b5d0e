// =================================================================
// exchange/paper.rs - Paper Order Executor
// =================================================================

use super::traits::OrderExecutor;
use super::types::OrderAck;
use crate::service::ServiceError;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::info;
use trading_common::backtest::OrderIntent;

/// Accepts every well-formed intent and keeps it in memory
#[derive(Debug, Default)]
pub struct PaperExecutor {
    next_id: AtomicU64,
    submitted: Mutex<Vec<OrderAck>>,
}

impl PaperExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn submitted(&self) -> Vec<OrderAck> {
        self.submitted.lock().await.clone()
    }
}

#[async_trait]
impl OrderExecutor for PaperExecutor {
    async fn submit(&self, intent: &OrderIntent) -> Result<OrderAck, ServiceError> {
        if intent.quantity <= Decimal::ZERO {
            return Err(ServiceError::OrderRejected {
                symbol: intent.symbol.clone(),
                reason: format!("quantity must be positive, got {}", intent.quantity),
            });
        }
        if intent.symbol.trim().is_empty() {
            return Err(ServiceError::OrderRejected {
                symbol: intent.symbol.clone(),
                reason: "empty symbol".to_string(),
            });
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let ack = OrderAck {
            order_id: format!("paper-{}", id),
            intent: intent.clone(),
            submitted_at: Utc::now(),
        };
        info!("Paper order {} submitted: {}", ack.order_id, intent);
        self.submitted.lock().await.push(ack.clone());
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use trading_common::backtest::TradeAction;

    fn intent(quantity: Decimal) -> OrderIntent {
        OrderIntent {
            symbol: "AAPL".to_string(),
            action: TradeAction::Buy,
            quantity,
        }
    }

    #[tokio::test]
    async fn test_assigns_sequential_ids() {
        let executor = PaperExecutor::new();
        let first = executor.submit(&intent(dec!(1))).await.unwrap();
        let second = executor.submit(&intent(dec!(2))).await.unwrap();

        assert_eq!(first.order_id, "paper-1");
        assert_eq!(second.order_id, "paper-2");
        assert_eq!(executor.submitted().await.len(), 2);
    }

    #[tokio::test]
    async fn test_rejects_non_positive_quantity() {
        let executor = PaperExecutor::new();
        let err = executor.submit(&intent(dec!(0))).await.unwrap_err();
        assert!(matches!(err, ServiceError::OrderRejected { .. }));
        assert!(executor.submitted().await.is_empty());
    }
}
