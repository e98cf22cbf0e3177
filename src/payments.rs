//! Points sink boundary.
//!
//! The engine hands validated rewards to an external payment/points
//! collaborator. The trait mirrors that collaborator's surface; the
//! in-memory implementation backs the server binary and tests. Retries
//! for failed awards belong to the sink layer, not the engine.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum PointsError {
    #[error("award rejected: {0}")]
    Rejected(String),

    #[error("points sink unavailable: {0}")]
    Unavailable(String),
}

/// Record of one completed points award.
#[derive(Debug, Clone, Serialize)]
pub struct PointsReceipt {
    pub transaction_id: Uuid,
    pub player: String,
    pub amount: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// External payment/points collaborator.
#[async_trait]
pub trait PointsSink: Send + Sync {
    async fn add_points(
        &self,
        player: &str,
        amount: i64,
        description: &str,
    ) -> Result<PointsReceipt, PointsError>;
}

/// Process-local points ledger.
#[derive(Default)]
pub struct InMemoryPointsSink {
    balances: DashMap<String, i64>,
    receipts: Mutex<Vec<PointsReceipt>>,
}

impl InMemoryPointsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, player: &str) -> i64 {
        self.balances.get(player).map(|entry| *entry).unwrap_or(0)
    }

    pub fn receipt_count(&self) -> usize {
        self.receipts.lock().expect("receipts lock poisoned").len()
    }
}

#[async_trait]
impl PointsSink for InMemoryPointsSink {
    async fn add_points(
        &self,
        player: &str,
        amount: i64,
        description: &str,
    ) -> Result<PointsReceipt, PointsError> {
        if amount <= 0 {
            return Err(PointsError::Rejected(format!(
                "award amount must be positive, got {}",
                amount
            )));
        }

        *self.balances.entry(player.to_string()).or_insert(0) += amount;

        let receipt = PointsReceipt {
            transaction_id: Uuid::new_v4(),
            player: player.to_string(),
            amount,
            description: description.to_string(),
            created_at: Utc::now(),
        };
        self.receipts
            .lock()
            .expect("receipts lock poisoned")
            .push(receipt.clone());

        Ok(receipt)
    }
}
