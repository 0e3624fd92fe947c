//! # Repository Module
//!
//! Database repository implementations for RMS POS.
//!
//! ## Repository Pattern
//! Each repository abstracts the SQL for one aggregate behind a clean API.
//! Plain reads and writes run against the pool; methods suffixed `_in_tx`
//! take an open connection so the checkout transaction can route every
//! mutation through a single atomic unit of work.
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog CRUD, sale-facing search,
//!   guarded stock decrements
//! - [`category::CategoryRepository`] - Category glue
//! - [`sale::SaleRepository`] - Sales, sale items, payment fields
//! - [`inventory_log::InventoryLogRepository`] - Append-only audit ledger

pub mod category;
pub mod inventory_log;
pub mod product;
pub mod sale;
