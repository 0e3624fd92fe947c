//! # Inventory Log Repository
//!
//! The append-only audit ledger of stock-affecting events.
//!
//! ## Append-Only Contract
//! This repository exposes insert and read operations ONLY. No update or
//! delete exists anywhere in the codebase; once a row is written it is the
//! permanent record of that stock movement. Deleting a product nulls the
//! reference on its log rows - history outlives the catalog.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use rms_core::InventoryLog;

const LOG_COLUMNS: &str = "id, product_id, action, quantity, user_id, note, timestamp";

/// Repository for the inventory audit ledger.
#[derive(Debug, Clone)]
pub struct InventoryLogRepository {
    pool: SqlitePool,
}

impl InventoryLogRepository {
    /// Creates a new InventoryLogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryLogRepository { pool }
    }

    /// Lists log entries for a product, newest first (reporting glue).
    pub async fn list_for_product(
        &self,
        product_id: &str,
        limit: u32,
    ) -> DbResult<Vec<InventoryLog>> {
        let sql = format!(
            "SELECT {LOG_COLUMNS} FROM inventory_logs
             WHERE product_id = ?1
             ORDER BY timestamp DESC
             LIMIT ?2"
        );

        let logs = sqlx::query_as::<_, InventoryLog>(&sql)
            .bind(product_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(logs)
    }

    /// Appends a log entry inside an open transaction.
    ///
    /// Every stock mutation in the system routes through the same
    /// transaction as its log entry, so the ledger can never disagree with
    /// the stock it describes.
    pub async fn append_in_tx(conn: &mut SqliteConnection, log: &InventoryLog) -> DbResult<()> {
        debug!(
            product_id = ?log.product_id,
            action = ?log.action,
            quantity = %log.quantity,
            "Appending inventory log"
        );

        sqlx::query(
            "INSERT INTO inventory_logs (
                id, product_id, action, quantity, user_id, note, timestamp
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&log.id)
        .bind(&log.product_id)
        .bind(log.action)
        .bind(log.quantity)
        .bind(&log.user_id)
        .bind(&log.note)
        .bind(log.timestamp)
        .execute(conn)
        .await?;

        Ok(())
    }
}

/// Helper to generate a new log entry ID.
pub fn generate_log_id() -> String {
    Uuid::new_v4().to_string()
}
