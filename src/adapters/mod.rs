//! Persistence adapters for the repository ports.

pub mod memory;
pub mod postgres_application_repository;
pub mod postgres_identity_repository;
pub mod postgres_notification_repository;
pub mod postgres_payment_repository;

use std::sync::Arc;

use sqlx::PgPool;

pub use memory::InMemoryStore;
pub use postgres_application_repository::PostgresApplicationRepository;
pub use postgres_identity_repository::{PostgresFranchiseRepository, PostgresUserRepository};
pub use postgres_notification_repository::PostgresNotificationRepository;
pub use postgres_payment_repository::{
    PostgresPaymentRequestRepository, PostgresPaymentTransactionRepository,
};

use crate::ports::Repositories;

impl Repositories {
    /// Every port backed by one shared in-memory store.
    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(InMemoryStore::new()))
    }

    pub fn from_store(store: Arc<InMemoryStore>) -> Self {
        Self {
            users: store.clone(),
            franchises: store.clone(),
            applications: store.clone(),
            transactions: store.clone(),
            payment_requests: store.clone(),
            notifications: store,
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            franchises: Arc::new(PostgresFranchiseRepository::new(pool.clone())),
            applications: Arc::new(PostgresApplicationRepository::new(pool.clone())),
            transactions: Arc::new(PostgresPaymentTransactionRepository::new(pool.clone())),
            payment_requests: Arc::new(PostgresPaymentRequestRepository::new(pool.clone())),
            notifications: Arc::new(PostgresNotificationRepository::new(pool)),
        }
    }
}
