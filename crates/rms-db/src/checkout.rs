//! # Checkout Service
//!
//! The algorithmic heart of RMS POS: the atomic checkout transaction,
//! payment completion, and manual stock adjustment.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Checkout Transaction (all-or-nothing)                   │
//! │                                                                         │
//! │  validate cart (before any row is touched)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN ── insert provisional sale (total 0, receipt generated now)     │
//! │       │        └── receipt collision? regenerate, bounded retries      │
//! │       │                                                                 │
//! │       ▼   per cart line, sorted by product id:                         │
//! │       │    ├── load product          → ProductNotFound                 │
//! │       │    ├── guarded decrement     → InsufficientStock               │
//! │       │    ├── append inventory log  (action=sale, note=receipt)       │
//! │       │    ├── freeze price per policy, insert sale item               │
//! │       │    └── accumulate total / discount                             │
//! │       ▼                                                                 │
//! │  update sale totals (is_completed stays false)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ── any error anywhere above rolls back EVERYTHING              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Locking
//! Lines are processed in sorted product-id order. Insertion-order locking
//! can deadlock two carts holding the same products in reverse order on a
//! row-locking store; sorted order makes lock acquisition a total order.
//! On SQLite the provisional sale INSERT takes the database write lock for
//! the whole unit anyway, with the connection's bounded busy timeout as the
//! contention limit.
//!
//! ## Payment Is Deliberately Separate
//! Checkout commits stock and audit effects; `complete_payment` only flips
//! the sale to completed. This allows a multi-step checkout→payment UX: a
//! sale can sit pending while the customer finds their wallet, but the
//! inventory it consumed is already durable.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{DbError, PosError, PosResult};
use crate::pool::Database;
use crate::repository::inventory_log::{generate_log_id, InventoryLogRepository};
use crate::repository::product::ProductRepository;
use crate::repository::sale::{generate_receipt_number, generate_sale_id, SaleRepository};
use rms_core::{
    validation, CartLine, CoreError, InventoryLog, Money, PaymentMethod, PricingPolicy, Sale,
    SaleItem, StockAction, ValidationError,
};

/// How many receipt numbers to try before giving up on a pathological
/// collision streak.
const RECEIPT_RETRY_ATTEMPTS: u32 = 5;

// =============================================================================
// Results
// =============================================================================

/// What a successful checkout returns to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    pub sale_id: String,
    pub receipt_number: String,
    pub total_cents: i64,
    pub discount_cents: i64,
}

/// Payment completion input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub method: PaymentMethod,
    /// Required for cash payments; ignored otherwise.
    pub cash_received_cents: Option<i64>,
}

/// What a successful payment completion returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOutcome {
    pub sale_id: String,
    pub receipt_number: String,
    /// Change due for cash payments.
    pub change_cents: Option<i64>,
}

// =============================================================================
// Checkout Service
// =============================================================================

/// Transactional POS operations: checkout, payment completion, and manual
/// stock adjustment. The pricing policy is fixed at construction.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    db: Database,
    policy: PricingPolicy,
}

impl CheckoutService {
    /// Creates a new CheckoutService with the given billing policy.
    pub fn new(db: Database, policy: PricingPolicy) -> Self {
        CheckoutService { db, policy }
    }

    /// Returns the configured pricing policy.
    pub fn policy(&self) -> PricingPolicy {
        self.policy
    }

    /// Runs the whole checkout as one atomic unit of work.
    ///
    /// The cashier is an explicit parameter - core operations never rely on
    /// ambient "current user" state. Repeated product ids in the cart are
    /// independent lines.
    ///
    /// At most one attempt per submission: on any failure the transaction
    /// rolls back completely and the error is returned to the caller, who
    /// may resubmit.
    pub async fn checkout(
        &self,
        cashier_id: &str,
        cart: &[CartLine],
    ) -> PosResult<CheckoutReceipt> {
        validation::validate_cart(cart)?;

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        // Step 1: provisional sale. The INSERT takes the write lock, so the
        // rest of the unit is serialized against every other writer. The
        // receipt number exists from this moment so the per-line audit
        // notes can reference it.
        let sale = Self::insert_provisional_sale(&mut tx, cashier_id).await?;

        // Step 2: apply lines in sorted product-id order (see module docs).
        let mut lines: Vec<&CartLine> = cart.iter().collect();
        lines.sort_by(|a, b| a.product_id.cmp(&b.product_id));

        let mut total = Money::zero();
        let mut discount = Money::zero();

        for line in lines {
            let product = ProductRepository::get_in_tx(&mut *tx, &line.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

            // The guarded UPDATE is the authoritative stock check; the
            // loaded row supplies the name and available count for the
            // error the cashier sees.
            let decremented =
                ProductRepository::decrement_stock_in_tx(&mut *tx, &product.id, line.quantity)
                    .await?;
            if !decremented {
                return Err(CoreError::InsufficientStock {
                    name: product.name,
                    available: product.stock_quantity,
                    requested: line.quantity,
                }
                .into());
            }

            let log = InventoryLog {
                id: generate_log_id(),
                product_id: Some(product.id.clone()),
                action: StockAction::Sale,
                quantity: line.quantity,
                user_id: Some(cashier_id.to_string()),
                note: format!("Sale {}", sale.receipt_number),
                timestamp: Utc::now(),
            };
            InventoryLogRepository::append_in_tx(&mut *tx, &log).await?;

            let price = self.policy.price_unit(&product);
            let item = SaleItem::new(
                sale.id.clone(),
                product.id.clone(),
                product.name.clone(),
                line.quantity,
                price.unit_price,
            );
            SaleRepository::add_item_in_tx(&mut *tx, &item).await?;

            total += item.subtotal();
            discount += price.unit_discount.multiply_quantity(line.quantity);
        }

        // Step 3: finalize totals. is_completed stays false until payment.
        SaleRepository::update_totals_in_tx(&mut *tx, &sale.id, total.cents(), discount.cents())
            .await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            sale_id = %sale.id,
            receipt_number = %sale.receipt_number,
            total = %total,
            lines = cart.len(),
            "Checkout committed"
        );

        Ok(CheckoutReceipt {
            sale_id: sale.id,
            receipt_number: sale.receipt_number,
            total_cents: total.cents(),
            discount_cents: discount.cents(),
        })
    }

    /// Inserts the provisional sale row, regenerating the receipt number on
    /// a uniqueness collision (bounded retries).
    async fn insert_provisional_sale(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        cashier_id: &str,
    ) -> PosResult<Sale> {
        let mut attempts = 0;
        loop {
            let sale = Sale {
                id: generate_sale_id(),
                cashier_id: Some(cashier_id.to_string()),
                receipt_number: generate_receipt_number(),
                total_cents: 0,
                tax_cents: 0,
                discount_cents: 0,
                payment_method: PaymentMethod::default(),
                cash_received_cents: None,
                change_cents: None,
                customer_name: None,
                customer_mobile: None,
                is_completed: false,
                created_at: Utc::now(),
            };

            match SaleRepository::insert_in_tx(&mut **tx, &sale).await {
                Ok(()) => return Ok(sale),
                Err(err) if err.is_unique_violation_on("receipt_number") => {
                    attempts += 1;
                    warn!(
                        receipt_number = %sale.receipt_number,
                        attempt = attempts,
                        "Receipt number collision, regenerating"
                    );
                    if attempts >= RECEIPT_RETRY_ATTEMPTS {
                        return Err(err.into());
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Completes payment for a pending sale.
    ///
    /// Does NOT touch stock or the audit log - those are already final from
    /// checkout. A single guarded UPDATE flips the completion flag, so two
    /// racing payments resolve to exactly one winner.
    pub async fn complete_payment(
        &self,
        sale_id: &str,
        request: PaymentRequest,
    ) -> PosResult<PaymentOutcome> {
        debug!(sale_id = %sale_id, method = ?request.method, "Completing payment");

        let sale = self
            .db
            .sales()
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        if sale.is_completed {
            return Err(CoreError::AlreadyCompleted(sale_id.to_string()).into());
        }

        let (cash_received_cents, change_cents) = match request.method {
            PaymentMethod::Cash => {
                let received = request.cash_received_cents.ok_or_else(|| {
                    PosError::from(ValidationError::Required {
                        field: "cash_received_cents".to_string(),
                    })
                })?;
                if received < sale.total_cents {
                    return Err(CoreError::InsufficientPayment {
                        received_cents: received,
                        required_cents: sale.total_cents,
                    }
                    .into());
                }
                (Some(received), Some(received - sale.total_cents))
            }
            PaymentMethod::Card | PaymentMethod::Upi => (None, None),
        };

        let mut conn = self.db.pool().acquire().await.map_err(DbError::from)?;
        let completed = SaleRepository::mark_completed_in_tx(
            &mut *conn,
            sale_id,
            request.method,
            cash_received_cents,
            change_cents,
        )
        .await?;

        // Lost a race with another completion attempt between the read and
        // the guarded write.
        if !completed {
            return Err(CoreError::AlreadyCompleted(sale_id.to_string()).into());
        }

        info!(
            sale_id = %sale_id,
            receipt_number = %sale.receipt_number,
            method = ?request.method,
            "Payment completed"
        );

        Ok(PaymentOutcome {
            sale_id: sale.id,
            receipt_number: sale.receipt_number,
            change_cents,
        })
    }

    /// Manual stock adjustment (restock or removal), transactional with its
    /// audit log entry - the same discipline the checkout uses.
    ///
    /// `StockAction::Sale` is rejected here: sales only move stock through
    /// [`CheckoutService::checkout`].
    pub async fn adjust_stock(
        &self,
        user_id: &str,
        product_id: &str,
        action: StockAction,
        quantity: i64,
        note: &str,
    ) -> PosResult<()> {
        validation::validate_quantity(quantity)?;

        if action == StockAction::Sale {
            return Err(PosError::from(ValidationError::InvalidFormat {
                field: "action".to_string(),
                reason: "sales move stock only through checkout".to_string(),
            }));
        }

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let product = ProductRepository::get_in_tx(&mut *tx, product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        match action {
            StockAction::Add => {
                ProductRepository::increment_stock_in_tx(&mut *tx, &product.id, quantity).await?;
            }
            StockAction::Remove => {
                let decremented =
                    ProductRepository::decrement_stock_in_tx(&mut *tx, &product.id, quantity)
                        .await?;
                if !decremented {
                    return Err(CoreError::InsufficientStock {
                        name: product.name,
                        available: product.stock_quantity,
                        requested: quantity,
                    }
                    .into());
                }
            }
            StockAction::Sale => unreachable!("rejected above"),
        }

        let log = InventoryLog {
            id: generate_log_id(),
            product_id: Some(product.id.clone()),
            action,
            quantity,
            user_id: Some(user_id.to_string()),
            note: note.to_string(),
            timestamp: Utc::now(),
        };
        InventoryLogRepository::append_in_tx(&mut *tx, &log).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            product_id = %product_id,
            action = ?action,
            quantity = %quantity,
            "Stock adjusted"
        );

        Ok(())
    }
}
