//! # Sale Repository
//!
//! Database operations for sales and sale items.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CHECKOUT (one transaction, see checkout.rs)                        │
//! │     ├── insert_in_tx()        → provisional sale, total 0              │
//! │     ├── add_item_in_tx() × N  → frozen price/subtotal per line         │
//! │     └── update_totals_in_tx() → final totals, is_completed stays 0     │
//! │                                                                         │
//! │  2. PAYMENT (separate step)                                             │
//! │     └── mark_completed_in_tx() → guarded flip to is_completed = 1      │
//! │                                                                         │
//! │  3. ANNOTATION (allowed after completion)                               │
//! │     └── set_customer_details() → loyalty name/mobile only              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use rms_core::{PaymentMethod, Sale, SaleItem};

const SALE_COLUMNS: &str = "id, cashier_id, receipt_number, total_cents, tax_cents, \
     discount_cents, payment_method, cash_received_cents, change_cents, \
     customer_name, customer_mobile, is_completed, created_at";

const SALE_ITEM_COLUMNS: &str = "id, sale_id, product_id, name_snapshot, quantity, \
     price_at_sale_cents, subtotal_cents, created_at";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");

        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets all items for a sale, in insertion order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let sql = format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY created_at, id"
        );

        let items = sqlx::query_as::<_, SaleItem>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Saves the customer annotation for the loyalty program.
    ///
    /// This is the ONE mutation allowed on a completed sale; everything
    /// else is frozen once `is_completed` flips.
    pub async fn set_customer_details(
        &self,
        sale_id: &str,
        customer_name: &str,
        customer_mobile: &str,
    ) -> DbResult<()> {
        debug!(sale_id = %sale_id, "Saving customer details");

        let result = sqlx::query(
            "UPDATE sales SET customer_name = ?2, customer_mobile = ?3 WHERE id = ?1",
        )
        .bind(sale_id)
        .bind(customer_name)
        .bind(customer_mobile)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", sale_id));
        }

        Ok(())
    }

    // =========================================================================
    // In-transaction operations (used by the checkout/payment unit of work)
    // =========================================================================

    /// Inserts a sale row inside an open transaction.
    ///
    /// On a receipt-number collision this returns
    /// `DbError::UniqueViolation` on `sales.receipt_number`; the checkout
    /// regenerates and retries.
    pub async fn insert_in_tx(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, receipt_number = %sale.receipt_number, "Inserting sale");

        sqlx::query(
            "INSERT INTO sales (
                id, cashier_id, receipt_number, total_cents, tax_cents,
                discount_cents, payment_method, cash_received_cents,
                change_cents, customer_name, customer_mobile, is_completed,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )
        .bind(&sale.id)
        .bind(&sale.cashier_id)
        .bind(&sale.receipt_number)
        .bind(sale.total_cents)
        .bind(sale.tax_cents)
        .bind(sale.discount_cents)
        .bind(sale.payment_method)
        .bind(sale.cash_received_cents)
        .bind(sale.change_cents)
        .bind(&sale.customer_name)
        .bind(&sale.customer_mobile)
        .bind(sale.is_completed)
        .bind(sale.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Adds a line item inside an open transaction.
    ///
    /// ## Snapshot Pattern
    /// The product name and billed price are already frozen on the item;
    /// this row is never updated afterwards.
    pub async fn add_item_in_tx(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
        debug!(sale_id = %item.sale_id, product_id = ?item.product_id, "Adding sale item");

        sqlx::query(
            "INSERT INTO sale_items (
                id, sale_id, product_id, name_snapshot, quantity,
                price_at_sale_cents, subtotal_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(&item.name_snapshot)
        .bind(item.quantity)
        .bind(item.price_at_sale_cents)
        .bind(item.subtotal_cents)
        .bind(item.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Finalizes a provisional sale's totals inside the checkout
    /// transaction. Guarded so a completed sale can never be re-totaled.
    pub async fn update_totals_in_tx(
        conn: &mut SqliteConnection,
        sale_id: &str,
        total_cents: i64,
        discount_cents: i64,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE sales SET total_cents = ?2, discount_cents = ?3
             WHERE id = ?1 AND is_completed = 0",
        )
        .bind(sale_id)
        .bind(total_cents)
        .bind(discount_cents)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale (pending)", sale_id));
        }

        Ok(())
    }

    /// Flips a sale to completed with its payment details, guarded on
    /// `is_completed = 0`.
    ///
    /// ## Returns
    /// * `Ok(true)` - the sale was completed by this call
    /// * `Ok(false)` - the sale was already completed (lost the race)
    pub async fn mark_completed_in_tx(
        conn: &mut SqliteConnection,
        sale_id: &str,
        method: PaymentMethod,
        cash_received_cents: Option<i64>,
        change_cents: Option<i64>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE sales SET
                payment_method = ?2,
                cash_received_cents = ?3,
                change_cents = ?4,
                is_completed = 1
             WHERE id = ?1 AND is_completed = 0",
        )
        .bind(sale_id)
        .bind(method)
        .bind(cash_received_cents)
        .bind(change_cents)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Generates a receipt number: 8 uppercase hex characters derived from a
/// random UUID. Global uniqueness is enforced by the storage constraint;
/// the checkout regenerates on the (rare) collision.
///
/// ## Example
/// `3F2A9C1B`
pub fn generate_receipt_number() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

/// Generates a new sale ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}
