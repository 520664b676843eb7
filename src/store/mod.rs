//! Experience store.
//!
//! # Data Flow
//! ```text
//! experience handlers / auth delegate
//!     → ExperienceStore (port)
//!     → mysql.rs (pooled MySQL adapter, production)
//!     → memory.rs (in-process adapter, tests and local runs)
//! ```
//!
//! # Design Decisions
//! - One record per user identifier; the identifier is the primary key
//! - Increment is a single atomic statement, never read-then-write
//! - Adapters map their failures into `StoreError` so raw driver text never
//!   reaches the HTTP layer

pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::InMemoryExperienceStore;
pub use mysql::MySqlExperienceStore;

/// Experience gained per increment.
pub const EXPERIENCE_STEP: i32 = 10;

/// Experience counter for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceRecord {
    pub user_id: String,
    pub experience: i32,
}

impl ExperienceRecord {
    /// A freshly created record.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            experience: 0,
        }
    }
}

/// Errors surfaced by store adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No record exists for the user.
    #[error("experience record not found")]
    NotFound,
    /// A record already exists for the user.
    #[error("experience record already exists")]
    Conflict,
    /// Connection-level failure.
    #[error("experience store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

/// Persistence port for experience records.
#[async_trait]
pub trait ExperienceStore: Send + Sync {
    /// Exact-match lookup.
    async fn get(&self, user_id: &str) -> Result<ExperienceRecord, StoreError>;

    /// Insert a record with `experience = 0`; `Conflict` if one exists.
    async fn create(&self, user_id: &str) -> Result<ExperienceRecord, StoreError>;

    /// Atomically add [`EXPERIENCE_STEP`] and return the updated record.
    async fn increment_by_ten(&self, user_id: &str) -> Result<ExperienceRecord, StoreError>;

    /// Remove the record. Deleting a missing record is not an error.
    async fn delete(&self, user_id: &str) -> Result<(), StoreError>;

    /// Cheap connectivity check used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}
