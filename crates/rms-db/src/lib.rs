//! # rms-db: Database Layer for RMS POS
//!
//! SQLite storage for the RMS POS system, using sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         RMS POS Data Flow                               │
//! │                                                                         │
//! │  HTTP handler (POST /api/pos/checkout)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      rms-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌──────────────┐    │   │
//! │  │   │   Database    │   │  Repositories │   │   Checkout   │    │   │
//! │  │   │   (pool.rs)   │   │ product/sale/ │   │   Service    │    │   │
//! │  │   │               │◄──│ category/log  │◄──│ (checkout.rs)│    │   │
//! │  │   │ SqlitePool    │   └───────────────┘   └──────────────┘    │   │
//! │  │   └───────────────┘        embedded migrations (001_*.sql)    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL mode)                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and combined service error types
//! - [`repository`] - Repository implementations
//! - [`checkout`] - The atomic checkout transaction and payment completion
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rms_db::{CheckoutService, Database, DbConfig};
//! use rms_core::{CartLine, PricingPolicy};
//!
//! let db = Database::new(DbConfig::new("rms.db")).await?;
//! let checkout = CheckoutService::new(db.clone(), PricingPolicy::default());
//!
//! let receipt = checkout
//!     .checkout("cashier-1", &[CartLine { product_id, quantity: 2 }])
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::{CheckoutReceipt, CheckoutService, PaymentOutcome, PaymentRequest};
pub use error::{DbError, PosError};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::inventory_log::InventoryLogRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
