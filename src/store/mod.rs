//! Persistence seams for the lifecycle engine.
//!
//! The engine only talks to [`RequestRepository`] and [`UserDirectory`]; `main` decides
//! whether those are backed by MySQL or by process memory.

pub mod memory;
pub mod mysql;
pub mod seed;

use async_trait::async_trait;

use crate::lifecycle::overlap::DateRange;
use crate::model::{
    NewUser, NewVacationRequest, RequestStatus, Role, User, UserUpdate, VacationRequest,
};

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate value for unique column")]
    Duplicate,
    #[error("referenced row does not exist")]
    MissingReference,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::Duplicate,
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                StoreError::MissingReference
            }
            _ => StoreError::Database(err),
        }
    }
}

/// Result of an insert that re-checks overlap inside the same unit of work.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Created(VacationRequest),
    Overlapping(Vec<VacationRequest>),
}

#[async_trait]
pub trait RequestRepository: Send + Sync {
    async fn find_by_id(&self, id: u64) -> Result<Option<VacationRequest>, StoreError>;

    async fn find_by_user_id(&self, user_id: u64) -> Result<Vec<VacationRequest>, StoreError>;

    async fn find_by_status(
        &self,
        status: RequestStatus,
    ) -> Result<Vec<VacationRequest>, StoreError>;

    /// Newest first.
    async fn find_all(&self) -> Result<Vec<VacationRequest>, StoreError>;

    /// Non-rejected requests of `user_id` intersecting `range`, minus `exclude_id`.
    async fn find_overlapping(
        &self,
        user_id: u64,
        range: &DateRange,
        exclude_id: Option<u64>,
    ) -> Result<Vec<VacationRequest>, StoreError>;

    /// Persists a pending request unless an overlapping one exists at write time.
    async fn insert(&self, record: NewVacationRequest) -> Result<InsertOutcome, StoreError>;

    /// Moves a pending request to `status`. `None` when the row is missing or no longer
    /// pending.
    async fn update_status(
        &self,
        id: u64,
        status: RequestStatus,
        validator_id: u64,
        comments: Option<&str>,
    ) -> Result<Option<VacationRequest>, StoreError>;

    /// Deletes a pending request. `false` when nothing pending matched.
    async fn delete(&self, id: u64) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: u64) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_role(&self, role: Role) -> Result<Vec<User>, StoreError>;

    /// Ordered by name.
    async fn find_all(&self) -> Result<Vec<User>, StoreError>;

    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    async fn update(&self, id: u64, update: UserUpdate) -> Result<Option<User>, StoreError>;

    /// Removes the user, their requests, and their validator reference on others' requests.
    async fn delete(&self, id: u64) -> Result<bool, StoreError>;
}
