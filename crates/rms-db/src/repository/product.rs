//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Sale-facing search (name or barcode substring, in-stock only)
//! - CRUD operations for catalog management
//! - Guarded stock decrements for the checkout transaction
//!
//! ## Stock Decrement Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ❌ WRONG: read stock, compute, write absolute value                    │
//! │     (a concurrent checkout between read and write oversells)           │
//! │                                                                         │
//! │  ✅ CORRECT: guarded conditional decrement                              │
//! │     UPDATE products SET stock_quantity = stock_quantity - ?            │
//! │     WHERE id = ? AND stock_quantity >= ?                               │
//! │                                                                         │
//! │  Zero rows affected = insufficient stock, whatever the interleaving.   │
//! │  The CHECK (stock_quantity >= 0) constraint is the last line of        │
//! │  defense behind it.                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use rms_core::{Product, SEARCH_RESULT_LIMIT};

/// Column list shared by every product SELECT so rows always round-trip
/// through `Product`'s `FromRow`.
const PRODUCT_COLUMNS: &str = "id, name, barcode, price_cents, cost_cents, discount_bps, \
     stock_quantity, category_id, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Sale-facing product search.
    ///
    /// ## Semantics
    /// - Matches `query` as a substring of the name or the barcode
    /// - Filters out products with zero stock (a register should never
    ///   offer what it cannot sell)
    /// - Orders by discount (highest first), then name
    /// - Returns at most [`SEARCH_RESULT_LIMIT`] rows
    ///
    /// An empty query lists in-stock products in the same order.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();
        let limit = limit.min(SEARCH_RESULT_LIMIT);

        debug!(query = %query, limit = %limit, "Searching products");

        let pattern = format!("%{}%", query);

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS}
             FROM products
             WHERE stock_quantity > 0
               AND (name LIKE ?1 OR barcode LIKE ?1)
             ORDER BY discount_bps DESC, name
             LIMIT ?2"
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(&pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by its barcode.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists products ordered by name (catalog management glue).
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name LIMIT ?1");

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - barcode already exists
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(barcode = %product.barcode, name = %product.name, "Inserting product");

        sqlx::query(
            "INSERT INTO products (
                id, name, barcode, price_cents, cost_cents, discount_bps,
                stock_quantity, category_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.barcode)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.discount_bps)
        .bind(product.stock_quantity)
        .bind(&product.category_id)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing product's catalog fields.
    ///
    /// Note: `stock_quantity` is deliberately NOT written here. Stock only
    /// moves through the guarded decrement/increment paths so every change
    /// lands in the inventory log.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET
                name = ?2,
                barcode = ?3,
                price_cents = ?4,
                cost_cents = ?5,
                discount_bps = ?6,
                category_id = ?7,
                updated_at = ?8
             WHERE id = ?1",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.barcode)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.discount_bps)
        .bind(&product.category_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Deletes a product.
    ///
    /// Historical sale items and inventory logs keep their rows; the schema
    /// nulls their product reference (`ON DELETE SET NULL`).
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    // =========================================================================
    // In-transaction operations (used by the checkout unit of work)
    // =========================================================================

    /// Reads a product inside an open transaction.
    ///
    /// Within the checkout's write transaction this read is serialized
    /// against every other writer, giving the same guarantee a row-level
    /// `SELECT ... FOR UPDATE` would.
    pub async fn get_in_tx(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(product)
    }

    /// Guarded stock decrement inside an open transaction.
    ///
    /// ## Returns
    /// * `Ok(true)` - stock was decremented
    /// * `Ok(false)` - insufficient stock (no row matched the guard);
    ///   the caller must abort the transaction
    pub async fn decrement_stock_in_tx(
        conn: &mut SqliteConnection,
        id: &str,
        quantity: i64,
    ) -> DbResult<bool> {
        debug!(id = %id, quantity = %quantity, "Decrementing stock");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products
             SET stock_quantity = stock_quantity - ?2, updated_at = ?3
             WHERE id = ?1 AND stock_quantity >= ?2",
        )
        .bind(id)
        .bind(quantity)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Stock increment inside an open transaction (restock path).
    pub async fn increment_stock_in_tx(
        conn: &mut SqliteConnection,
        id: &str,
        quantity: i64,
    ) -> DbResult<()> {
        debug!(id = %id, quantity = %quantity, "Incrementing stock");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products
             SET stock_quantity = stock_quantity + ?2, updated_at = ?3
             WHERE id = ?1",
        )
        .bind(id)
        .bind(quantity)
        .bind(now)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}
