//! # Domain Types
//!
//! Core domain types used throughout RMS POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │  InventoryLog   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  barcode        │   │  receipt_number │   │  action         │       │
//! │  │  price_cents    │   │  total_cents    │   │  quantity       │       │
//! │  │  stock_quantity │   │  is_completed   │   │  note           │       │
//! │  └─────────────────┘   └────────┬────────┘   └─────────────────┘       │
//! │                                 │ owns (cascade)                        │
//! │                        ┌────────▼────────┐                              │
//! │                        │    SaleItem     │  frozen price + subtotal     │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists (barcode, receipt_number) - human-readable
//!
//! ## Historical References Are Weak
//! SaleItem and InventoryLog reference a Product with a *nullable* foreign
//! key. Deleting a product nulls the reference; it never deletes history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Category
// =============================================================================

/// A product category. Thin catalog glue; carried because products
/// reference it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Barcode (EAN-13, UPC-A, etc.). Unique across the catalog.
    pub barcode: String,

    /// Retail price in cents.
    pub price_cents: i64,

    /// Cost price per unit in cents.
    pub cost_cents: i64,

    /// Retail discount in basis points (1000 = 10%).
    pub discount_bps: u32,

    /// Units currently available for sale. Invariant: never negative.
    pub stock_quantity: i64,

    /// Owning category, if any.
    pub category_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the retail price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the unit cost as Money.
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    /// Retail price with the product's own discount applied.
    #[inline]
    pub fn discounted_price(&self) -> Money {
        self.price().apply_discount(self.discount_bps)
    }

    /// Checks whether the requested quantity can be sold from current stock.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.stock_quantity >= quantity
    }
}

// =============================================================================
// Stock Action
// =============================================================================

/// The kind of stock-affecting event recorded in the inventory log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum StockAction {
    /// Stock added (restock, initial stock).
    Add,
    /// Stock removed (damage, shrinkage, correction).
    Remove,
    /// Stock sold through checkout.
    Sale,
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash; requires tendered amount and yields change.
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// UPI transfer.
    Upi,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A sale transaction.
///
/// Created provisionally by the checkout transaction with zero totals, then
/// finalized in the same transaction once every line has been applied.
/// `is_completed` flips to true only in the separate payment step. Once
/// completed, the record is frozen except for the customer annotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,

    /// Cashier who rang the sale. Nullable: deleting a user keeps the sale.
    pub cashier_id: Option<String>,

    /// 8-character uppercase alphanumeric receipt identifier, globally
    /// unique, generated at creation and immutable thereafter.
    pub receipt_number: String,

    pub total_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,

    pub payment_method: PaymentMethod,

    /// For cash payments: amount the customer tendered.
    pub cash_received_cents: Option<i64>,
    /// For cash payments: change returned.
    pub change_cents: Option<i64>,

    /// Customer details for the loyalty program. The one mutation allowed
    /// after completion.
    pub customer_name: Option<String>,
    pub customer_mobile: Option<String>,

    /// False until the payment step succeeds. Stock and audit effects are
    /// already durable before this flips.
    pub is_completed: bool,

    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the sale total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale. Immutable after creation.
///
/// ## Snapshot Pattern
/// The product name and billed unit price are copied onto the item at
/// checkout time. Later catalog edits (or deleting the product, which nulls
/// `product_id`) never change what this sale charged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,

    /// Weak reference: nulled if the product is later removed.
    pub product_id: Option<String>,

    /// Product name at time of sale (frozen).
    pub name_snapshot: String,

    /// Quantity sold. Always positive.
    pub quantity: i64,

    /// Billed unit price in cents at time of sale (frozen).
    pub price_at_sale_cents: i64,

    /// Invariant: `price_at_sale_cents × quantity`, computed by the
    /// constructor and never accepted from callers.
    pub subtotal_cents: i64,

    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    /// Builds a line item, computing the subtotal from price and quantity.
    pub fn new(
        sale_id: impl Into<String>,
        product_id: impl Into<String>,
        name_snapshot: impl Into<String>,
        quantity: i64,
        price_at_sale: Money,
    ) -> Self {
        let price_at_sale_cents = price_at_sale.cents();
        SaleItem {
            id: uuid::Uuid::new_v4().to_string(),
            sale_id: sale_id.into(),
            product_id: Some(product_id.into()),
            name_snapshot: name_snapshot.into(),
            quantity,
            price_at_sale_cents,
            subtotal_cents: price_at_sale_cents * quantity,
            created_at: Utc::now(),
        }
    }

    /// Returns the frozen unit price as Money.
    #[inline]
    pub fn price_at_sale(&self) -> Money {
        Money::from_cents(self.price_at_sale_cents)
    }

    /// Returns the line subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Inventory Log
// =============================================================================

/// An append-only audit entry for a stock-affecting event.
///
/// Never updated or deleted once written; the repository exposes no such
/// operation. Outlives the product it references (weak reference).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryLog {
    pub id: String,

    /// Weak reference: nulled if the product is later removed.
    pub product_id: Option<String>,

    pub action: StockAction,

    /// Units affected. Always positive; the action carries the direction.
    pub quantity: i64,

    /// Acting user. Nullable: deleting a user keeps the history.
    pub user_id: Option<String>,

    /// Free-text note, e.g. "Sale 3F2A9C1B" or "Initial stock".
    pub note: String,

    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Cart
// =============================================================================

/// One caller-submitted checkout line.
///
/// Repeated product ids across lines are legal and treated as independent
/// lines, never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
