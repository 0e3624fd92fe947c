//! # Database Error Types
//!
//! Error types for database operations, plus the combined error the
//! transactional services (checkout, payment) return.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼        ┌── CoreError (rms-core) ── business rule failures      │
//! │  PosError  ◄───┘   (insufficient stock, already completed, ...)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (apps/server) ← Serialized with HTTP status for callers      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storage failures are always surfaced, never silently retried: the
//! checkout makes at most one attempt per submission.

use thiserror::Error;

use rms_core::CoreError;

/// Database operation errors.
///
/// These wrap sqlx errors and classify the constraint violations the
/// checkout relies on (unique receipt numbers, guarded stock decrements).
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a duplicate barcode
    /// - Receipt number collision (the checkout regenerates and retries)
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (e.g. a write that would drive stock
    /// negative slipped past the guarded UPDATE).
    #[error("Check constraint violation: {message}")]
    CheckViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed. Transaction begin/commit failures also land
    /// here (or in [`DbError::LockTimeout`]) via the `From<sqlx::Error>`
    /// classification below.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Bounded lock wait expired (SQLITE_BUSY past the busy timeout) or
    /// the pool ran out of connections. Never retried internally.
    #[error("Lock wait timed out")]
    LockTimeout,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// True if this is a unique-constraint violation on the given column.
    ///
    /// SQLite reports the column as `<table>.<column>` in the error message.
    pub fn is_unique_violation_on(&self, column: &str) -> bool {
        matches!(self, DbError::UniqueViolation { field, .. } if field.ends_with(column))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound      → DbError::NotFound
/// sqlx::Error::Database         → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut     → DbError::LockTimeout
/// Other                         → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message().to_string();

                // SQLite constraint messages:
                //   "UNIQUE constraint failed: <table>.<column>"
                //   "FOREIGN KEY constraint failed"
                //   "CHECK constraint failed: <expr>"
                //   "database is locked" (SQLITE_BUSY after busy_timeout)
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation { message: msg }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation { message: msg }
                } else if msg.contains("database is locked")
                    || msg.contains("database table is locked")
                {
                    DbError::LockTimeout
                } else {
                    DbError::QueryFailed(msg)
                }
            }

            sqlx::Error::PoolTimedOut => DbError::LockTimeout,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Combined Service Error
// =============================================================================

/// Error returned by the transactional services (checkout, payment, stock
/// adjustment), which can fail on both business rules and storage.
///
/// Either variant aborts the enclosing transaction; the rollback on drop
/// guarantees no partial commit.
#[derive(Debug, Error)]
pub enum PosError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<rms_core::ValidationError> for PosError {
    fn from(err: rms_core::ValidationError) -> Self {
        PosError::Core(CoreError::Validation(err))
    }
}

/// Result type for the transactional services.
pub type PosResult<T> = Result<T, PosError>;
