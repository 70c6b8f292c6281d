//! Repository Module
//!
//! Per-table CRUD over SurrealDB. All ID handling uses
//! [`surrealdb::RecordId`] in the `table:id` convention.

pub mod brand;
pub mod cart;
pub mod category;
pub mod coupon;
pub mod order;
pub mod product;
pub mod user;
pub mod variant;

pub use brand::BrandRepository;
pub use cart::CartRepository;
pub use category::CategoryRepository;
pub use coupon::CouponRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;
pub use user::UserRepository;
pub use variant::VariantRepository;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

use crate::utils::AppError;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        let msg = err.to_string();
        // Unique index violations surface as index errors from the engine
        if msg.contains("already contains") {
            RepoError::Duplicate(msg)
        } else {
            RepoError::Database(msg)
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            RepoError::Duplicate(msg) => AppError::Conflict(msg),
            RepoError::Validation(msg) => AppError::Validation(msg),
            RepoError::Database(msg) => AppError::Database(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Transient optimistic-lock abort from the storage engine. A
/// single-statement conditional update can be safely re-issued; the
/// predicate it carries is re-evaluated against the committed state.
pub(crate) fn is_retryable_conflict(err: &surrealdb::Error) -> bool {
    let msg = err.to_string();
    msg.contains("read or write conflict") || msg.contains("can be retried")
}

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}

/// Parse a `table:id` string into a [`surrealdb::RecordId`], validating the
/// table name
pub fn parse_record_id(table: &str, id: &str) -> RepoResult<surrealdb::RecordId> {
    let full = if id.contains(':') {
        id.to_string()
    } else {
        format!("{table}:{id}")
    };
    let record_id: surrealdb::RecordId = full
        .parse()
        .map_err(|_| RepoError::Validation(format!("Invalid {table} id: {id}")))?;
    if record_id.table() != table {
        return Err(RepoError::Validation(format!("Invalid {table} id: {id}")));
    }
    Ok(record_id)
}
