//! Repository ports.
//! Services depend on these traits; `adapters` provides the Postgres and
//! in-memory implementations.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{
    Application, ApplicationStatus, Franchise, Notification, PaymentMethod, PaymentRequest,
    PaymentTransaction, TransactionStatus, User, UnknownVariant,
};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("conflicting record: {0}")]
    Conflict(String),

    #[error("stored value is invalid: {0}")]
    Corrupt(#[from] UnknownVariant),

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("row not found".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::Conflict(db.message().to_string())
            }
            other => RepositoryError::Database(other),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
    async fn insert(&self, user: &User) -> RepositoryResult<User>;
}

#[async_trait]
pub trait FranchiseRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Franchise>>;
    async fn insert(&self, franchise: &Franchise) -> RepositoryResult<Franchise>;
}

#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Application>>;

    /// Active applications for one applicant against one franchise.
    async fn find_active(
        &self,
        applicant_id: Uuid,
        franchise_id: Uuid,
    ) -> RepositoryResult<Vec<Application>>;

    /// Insert a new application. Fails with `Conflict` when an active
    /// application already exists for the same applicant and franchise.
    async fn insert(&self, application: &Application) -> RepositoryResult<Application>;

    /// Write an edit, review or withdrawal. Payment fields are left as stored;
    /// only the fee-payment methods below change them.
    async fn update(&self, application: &Application) -> RepositoryResult<Application>;

    /// Reserve the fee payment for `transaction_id`. Fails with `Conflict`
    /// when the fee is already paid or another payment holds the reservation.
    async fn reserve_fee_payment(
        &self,
        id: Uuid,
        transaction_id: Uuid,
    ) -> RepositoryResult<Application>;

    /// Mark the fee paid. Only the holder of the reservation can complete it.
    async fn complete_fee_payment(
        &self,
        id: Uuid,
        transaction_id: Uuid,
        paid_at: DateTime<Utc>,
    ) -> RepositoryResult<Application>;

    /// Drop an unpaid reservation after a failed settlement.
    async fn release_fee_payment(&self, id: Uuid, transaction_id: Uuid) -> RepositoryResult<()>;

    async fn list_by_applicant(&self, applicant_id: Uuid) -> RepositoryResult<Vec<Application>>;
    async fn list_by_franchise(&self, franchise_id: Uuid) -> RepositoryResult<Vec<Application>>;

    /// Applications against every franchise owned by `owner_id`.
    async fn list_for_business_owner(&self, owner_id: Uuid) -> RepositoryResult<Vec<Application>>;

    /// Count applications, optionally restricted to one status.
    async fn count_by_status(&self, status: Option<ApplicationStatus>) -> RepositoryResult<i64>;
}

#[async_trait]
pub trait PaymentTransactionRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<PaymentTransaction>>;
    async fn insert(&self, tx: &PaymentTransaction) -> RepositoryResult<PaymentTransaction>;
    async fn update(&self, tx: &PaymentTransaction) -> RepositoryResult<PaymentTransaction>;
    async fn list_by_user(&self, user_id: Uuid) -> RepositoryResult<Vec<PaymentTransaction>>;
    async fn list_by_payment_request(
        &self,
        request_id: Uuid,
    ) -> RepositoryResult<Vec<PaymentTransaction>>;
    async fn count_by_status(&self, status: Option<TransactionStatus>) -> RepositoryResult<i64>;
    async fn sum_amount_by_status(&self, status: TransactionStatus) -> RepositoryResult<BigDecimal>;
}

#[async_trait]
pub trait PaymentRequestRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<PaymentRequest>>;
    async fn insert(&self, request: &PaymentRequest) -> RepositoryResult<PaymentRequest>;

    /// Reserve an open (PENDING or OVERDUE) request for `transaction_id`.
    /// Fails with `Conflict` when it is closed or already reserved.
    async fn reserve_payment(
        &self,
        id: Uuid,
        transaction_id: Uuid,
    ) -> RepositoryResult<PaymentRequest>;

    /// Move a reserved request to PAID.
    async fn complete_payment(
        &self,
        id: Uuid,
        transaction_id: Uuid,
        method: PaymentMethod,
        paid_at: DateTime<Utc>,
    ) -> RepositoryResult<PaymentRequest>;

    async fn release_payment(&self, id: Uuid, transaction_id: Uuid) -> RepositoryResult<()>;

    /// Cancel an open, unreserved request. Fails with `Conflict` otherwise.
    async fn cancel(&self, id: Uuid, at: DateTime<Utc>) -> RepositoryResult<PaymentRequest>;

    /// Move a PENDING request past its due date to OVERDUE. Returns false when
    /// the request was no longer pending.
    async fn mark_overdue(&self, id: Uuid, now: DateTime<Utc>) -> RepositoryResult<bool>;

    async fn list_by_sender(&self, from_user_id: Uuid) -> RepositoryResult<Vec<PaymentRequest>>;
    async fn list_by_recipient(&self, to_user_id: Uuid) -> RepositoryResult<Vec<PaymentRequest>>;

    /// Pending requests whose due date is before `now`.
    async fn list_past_due(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<PaymentRequest>>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Notification>>;
    async fn insert(&self, notification: &Notification) -> RepositoryResult<Notification>;
    async fn update(&self, notification: &Notification) -> RepositoryResult<Notification>;
    async fn list_by_user(&self, user_id: Uuid) -> RepositoryResult<Vec<Notification>>;
}

/// One handle per entity store, shared by the services.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub franchises: Arc<dyn FranchiseRepository>,
    pub applications: Arc<dyn ApplicationRepository>,
    pub transactions: Arc<dyn PaymentTransactionRepository>,
    pub payment_requests: Arc<dyn PaymentRequestRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
}
