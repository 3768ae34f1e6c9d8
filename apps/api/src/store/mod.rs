//! Persistence for registrations and their answers.
//!
//! [`RegistrationStore`] is carried in `AppState` as `Arc<dyn RegistrationStore>`.
//! [`PgRegistrationStore`] backs production; [`InMemoryRegistrationStore`]
//! serves tests and database-less local runs with the same semantics.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::models::registration::{
    AnswerRow, NewAnswer, NewRegistration, RegistrationAggregate, RegistrationPatch,
};

pub use memory::InMemoryRegistrationStore;
pub use postgres::PgRegistrationStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Registration id '{0}' already exists")]
    DuplicateRegistrationId(String),

    #[error("Registration {0} does not exist")]
    RegistrationMissing(i32),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Predicates accepted by [`RegistrationStore::count`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationFilter {
    All,
    Status(String),
    UpkEligible,
    TeacherEligible,
    SubstituteEligible,
}

#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Inserts a registration with column defaults for everything not supplied.
    async fn create(&self, new: NewRegistration) -> Result<RegistrationAggregate>;

    /// Appends one answer and stamps the owner's `updated_at`.
    async fn append_answer(&self, registration_pk: i32, answer: NewAnswer) -> Result<AnswerRow>;

    async fn fetch_by_id(&self, id: i32) -> Result<Option<RegistrationAggregate>>;

    async fn fetch_by_registration_id(
        &self,
        registration_id: &str,
    ) -> Result<Option<RegistrationAggregate>>;

    /// All registrations, newest `submitted_at` first (nulls last, then id descending),
    /// with answers loaded eagerly.
    async fn fetch_all(&self) -> Result<Vec<RegistrationAggregate>>;

    async fn count(&self, filter: RegistrationFilter) -> Result<i64>;

    /// Applies the present fields of `patch` and stamps `updated_at` in one
    /// transaction. Returns `None` without writing when the id is unknown.
    async fn apply_patch(
        &self,
        registration_id: &str,
        patch: &RegistrationPatch,
    ) -> Result<Option<RegistrationAggregate>>;

    /// Every known external identifier, in insertion order.
    async fn registration_ids(&self) -> Result<Vec<String>>;
}

/// Next `updated_at` for a row. Never equal to or earlier than `previous`,
/// so successive mutations are strictly ordered even within one clock tick.
pub fn next_updated_at(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    let floor = previous + Duration::microseconds(1);
    if now > floor {
        now
    } else {
        floor
    }
}
