//! In-memory implementation of every repository port.
//! Used when no `DATABASE_URL` is configured and by the test suites.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    Application, ApplicationStatus, Franchise, Notification, PaymentMethod, PaymentRequest,
    PaymentRequestStatus, PaymentStatus, PaymentTransaction, TransactionStatus, User,
};
use crate::ports::{
    ApplicationRepository, FranchiseRepository, NotificationRepository,
    PaymentRequestRepository, PaymentTransactionRepository, RepositoryError, RepositoryResult,
    UserRepository,
};

#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    franchises: RwLock<HashMap<Uuid, Franchise>>,
    applications: RwLock<HashMap<Uuid, Application>>,
    transactions: RwLock<HashMap<Uuid, PaymentTransaction>>,
    payment_requests: RwLock<HashMap<Uuid, PaymentRequest>>,
    notifications: RwLock<HashMap<Uuid, Notification>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_newest_first<T, F>(mut items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    items.sort_by_key(|item| std::cmp::Reverse(key(item)));
    items
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn insert(&self, user: &User) -> RepositoryResult<User> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|existing| existing.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(RepositoryError::Conflict(format!(
                "user with email {} already exists",
                user.email
            )));
        }
        users.insert(user.id, user.clone());
        Ok(user.clone())
    }
}

#[async_trait]
impl FranchiseRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Franchise>> {
        Ok(self.franchises.read().await.get(&id).cloned())
    }

    async fn insert(&self, franchise: &Franchise) -> RepositoryResult<Franchise> {
        self.franchises
            .write()
            .await
            .insert(franchise.id, franchise.clone());
        Ok(franchise.clone())
    }
}

#[async_trait]
impl ApplicationRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Application>> {
        Ok(self.applications.read().await.get(&id).cloned())
    }

    async fn find_active(
        &self,
        applicant_id: Uuid,
        franchise_id: Uuid,
    ) -> RepositoryResult<Vec<Application>> {
        Ok(self
            .applications
            .read()
            .await
            .values()
            .filter(|app| {
                app.is_active && app.applicant_id == applicant_id && app.franchise_id == franchise_id
            })
            .cloned()
            .collect())
    }

    async fn insert(&self, application: &Application) -> RepositoryResult<Application> {
        // Check and insert under one write guard, mirroring the partial unique index.
        let mut applications = self.applications.write().await;
        let duplicate = application.is_active
            && applications.values().any(|existing| {
                existing.is_active
                    && existing.applicant_id == application.applicant_id
                    && existing.franchise_id == application.franchise_id
            });
        if duplicate {
            return Err(RepositoryError::Conflict(format!(
                "active application exists for applicant {} and franchise {}",
                application.applicant_id, application.franchise_id
            )));
        }
        applications.insert(application.id, application.clone());
        Ok(application.clone())
    }

    async fn update(&self, application: &Application) -> RepositoryResult<Application> {
        let mut applications = self.applications.write().await;
        let stored = applications
            .get_mut(&application.id)
            .ok_or_else(|| RepositoryError::NotFound(format!("application {}", application.id)))?;

        let mut updated = application.clone();
        updated.payment_status = stored.payment_status;
        updated.payment_transaction_id = stored.payment_transaction_id;
        updated.paid_at = stored.paid_at;
        *stored = updated.clone();
        Ok(updated)
    }

    async fn reserve_fee_payment(
        &self,
        id: Uuid,
        transaction_id: Uuid,
    ) -> RepositoryResult<Application> {
        let mut applications = self.applications.write().await;
        let stored = applications
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("application {}", id)))?;

        if stored.payment_status == PaymentStatus::Paid || stored.payment_transaction_id.is_some() {
            return Err(RepositoryError::Conflict(format!(
                "fee for application {} is already paid or being paid",
                id
            )));
        }
        stored.payment_transaction_id = Some(transaction_id);
        Ok(stored.clone())
    }

    async fn complete_fee_payment(
        &self,
        id: Uuid,
        transaction_id: Uuid,
        paid_at: DateTime<Utc>,
    ) -> RepositoryResult<Application> {
        let mut applications = self.applications.write().await;
        match applications.get_mut(&id) {
            Some(stored)
                if stored.payment_status != PaymentStatus::Paid
                    && stored.payment_transaction_id == Some(transaction_id) =>
            {
                stored.mark_paid(transaction_id, paid_at);
                Ok(stored.clone())
            }
            _ => Err(RepositoryError::Conflict(format!(
                "fee payment {} does not hold application {}",
                transaction_id, id
            ))),
        }
    }

    async fn release_fee_payment(&self, id: Uuid, transaction_id: Uuid) -> RepositoryResult<()> {
        let mut applications = self.applications.write().await;
        if let Some(stored) = applications.get_mut(&id) {
            if stored.payment_status != PaymentStatus::Paid
                && stored.payment_transaction_id == Some(transaction_id)
            {
                stored.payment_transaction_id = None;
            }
        }
        Ok(())
    }

    async fn list_by_applicant(&self, applicant_id: Uuid) -> RepositoryResult<Vec<Application>> {
        let items = self
            .applications
            .read()
            .await
            .values()
            .filter(|app| app.applicant_id == applicant_id)
            .cloned()
            .collect();
        Ok(sorted_newest_first(items, |app| app.submitted_at))
    }

    async fn list_by_franchise(&self, franchise_id: Uuid) -> RepositoryResult<Vec<Application>> {
        let items = self
            .applications
            .read()
            .await
            .values()
            .filter(|app| app.franchise_id == franchise_id)
            .cloned()
            .collect();
        Ok(sorted_newest_first(items, |app| app.submitted_at))
    }

    async fn list_for_business_owner(&self, owner_id: Uuid) -> RepositoryResult<Vec<Application>> {
        let owned: Vec<Uuid> = self
            .franchises
            .read()
            .await
            .values()
            .filter(|franchise| franchise.business_owner_id == owner_id)
            .map(|franchise| franchise.id)
            .collect();

        let items = self
            .applications
            .read()
            .await
            .values()
            .filter(|app| owned.contains(&app.franchise_id))
            .cloned()
            .collect();
        Ok(sorted_newest_first(items, |app| app.submitted_at))
    }

    async fn count_by_status(&self, status: Option<ApplicationStatus>) -> RepositoryResult<i64> {
        let count = self
            .applications
            .read()
            .await
            .values()
            .filter(|app| status.map_or(true, |wanted| app.status == wanted))
            .count();
        Ok(count as i64)
    }
}

#[async_trait]
impl PaymentTransactionRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<PaymentTransaction>> {
        Ok(self.transactions.read().await.get(&id).cloned())
    }

    async fn insert(&self, tx: &PaymentTransaction) -> RepositoryResult<PaymentTransaction> {
        self.transactions.write().await.insert(tx.id, tx.clone());
        Ok(tx.clone())
    }

    async fn update(&self, tx: &PaymentTransaction) -> RepositoryResult<PaymentTransaction> {
        let mut transactions = self.transactions.write().await;
        match transactions.get_mut(&tx.id) {
            Some(stored) => {
                *stored = tx.clone();
                Ok(tx.clone())
            }
            None => Err(RepositoryError::NotFound(format!("transaction {}", tx.id))),
        }
    }

    async fn list_by_user(&self, user_id: Uuid) -> RepositoryResult<Vec<PaymentTransaction>> {
        let items = self
            .transactions
            .read()
            .await
            .values()
            .filter(|tx| tx.user_id == user_id)
            .cloned()
            .collect();
        Ok(sorted_newest_first(items, |tx| tx.created_at))
    }

    async fn list_by_payment_request(
        &self,
        request_id: Uuid,
    ) -> RepositoryResult<Vec<PaymentTransaction>> {
        let items = self
            .transactions
            .read()
            .await
            .values()
            .filter(|tx| tx.payment_request_id == Some(request_id))
            .cloned()
            .collect();
        Ok(sorted_newest_first(items, |tx| tx.created_at))
    }

    async fn count_by_status(&self, status: Option<TransactionStatus>) -> RepositoryResult<i64> {
        let count = self
            .transactions
            .read()
            .await
            .values()
            .filter(|tx| status.map_or(true, |wanted| tx.status == wanted))
            .count();
        Ok(count as i64)
    }

    async fn sum_amount_by_status(&self, status: TransactionStatus) -> RepositoryResult<BigDecimal> {
        Ok(self
            .transactions
            .read()
            .await
            .values()
            .filter(|tx| tx.status == status)
            .fold(BigDecimal::from(0), |acc, tx| acc + tx.amount.clone()))
    }
}

#[async_trait]
impl PaymentRequestRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<PaymentRequest>> {
        Ok(self.payment_requests.read().await.get(&id).cloned())
    }

    async fn insert(&self, request: &PaymentRequest) -> RepositoryResult<PaymentRequest> {
        self.payment_requests
            .write()
            .await
            .insert(request.id, request.clone());
        Ok(request.clone())
    }

    async fn reserve_payment(
        &self,
        id: Uuid,
        transaction_id: Uuid,
    ) -> RepositoryResult<PaymentRequest> {
        let mut requests = self.payment_requests.write().await;
        let stored = requests
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("payment request {}", id)))?;

        if !stored.is_open() || stored.payment_transaction_id.is_some() {
            return Err(RepositoryError::Conflict(format!(
                "payment request {} is {} or already being paid",
                id, stored.status
            )));
        }
        stored.payment_transaction_id = Some(transaction_id);
        Ok(stored.clone())
    }

    async fn complete_payment(
        &self,
        id: Uuid,
        transaction_id: Uuid,
        method: PaymentMethod,
        paid_at: DateTime<Utc>,
    ) -> RepositoryResult<PaymentRequest> {
        let mut requests = self.payment_requests.write().await;
        match requests.get_mut(&id) {
            Some(stored)
                if stored.is_open() && stored.payment_transaction_id == Some(transaction_id) =>
            {
                stored.mark_paid(method, paid_at);
                Ok(stored.clone())
            }
            _ => Err(RepositoryError::Conflict(format!(
                "payment {} does not hold request {}",
                transaction_id, id
            ))),
        }
    }

    async fn release_payment(&self, id: Uuid, transaction_id: Uuid) -> RepositoryResult<()> {
        let mut requests = self.payment_requests.write().await;
        if let Some(stored) = requests.get_mut(&id) {
            if stored.is_open() && stored.payment_transaction_id == Some(transaction_id) {
                stored.payment_transaction_id = None;
            }
        }
        Ok(())
    }

    async fn cancel(&self, id: Uuid, at: DateTime<Utc>) -> RepositoryResult<PaymentRequest> {
        let mut requests = self.payment_requests.write().await;
        let stored = requests
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("payment request {}", id)))?;

        if !stored.is_open() || stored.payment_transaction_id.is_some() {
            return Err(RepositoryError::Conflict(format!(
                "payment request {} is {} or being paid",
                id, stored.status
            )));
        }
        stored.status = PaymentRequestStatus::Cancelled;
        stored.updated_at = at;
        Ok(stored.clone())
    }

    async fn mark_overdue(&self, id: Uuid, now: DateTime<Utc>) -> RepositoryResult<bool> {
        let mut requests = self.payment_requests.write().await;
        match requests.get_mut(&id) {
            Some(stored) if stored.is_past_due(now) => {
                stored.status = PaymentRequestStatus::Overdue;
                stored.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_by_sender(&self, from_user_id: Uuid) -> RepositoryResult<Vec<PaymentRequest>> {
        let items = self
            .payment_requests
            .read()
            .await
            .values()
            .filter(|request| request.from_user_id == from_user_id)
            .cloned()
            .collect();
        Ok(sorted_newest_first(items, |request| request.created_at))
    }

    async fn list_by_recipient(&self, to_user_id: Uuid) -> RepositoryResult<Vec<PaymentRequest>> {
        let items = self
            .payment_requests
            .read()
            .await
            .values()
            .filter(|request| request.to_user_id == to_user_id)
            .cloned()
            .collect();
        Ok(sorted_newest_first(items, |request| request.created_at))
    }

    async fn list_past_due(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<PaymentRequest>> {
        Ok(self
            .payment_requests
            .read()
            .await
            .values()
            .filter(|request| request.is_past_due(now))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl NotificationRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Notification>> {
        Ok(self.notifications.read().await.get(&id).cloned())
    }

    async fn insert(&self, notification: &Notification) -> RepositoryResult<Notification> {
        self.notifications
            .write()
            .await
            .insert(notification.id, notification.clone());
        Ok(notification.clone())
    }

    async fn update(&self, notification: &Notification) -> RepositoryResult<Notification> {
        let mut notifications = self.notifications.write().await;
        match notifications.get_mut(&notification.id) {
            Some(stored) => {
                *stored = notification.clone();
                Ok(notification.clone())
            }
            None => Err(RepositoryError::NotFound(format!(
                "notification {}",
                notification.id
            ))),
        }
    }

    async fn list_by_user(&self, user_id: Uuid) -> RepositoryResult<Vec<Notification>> {
        let items = self
            .notifications
            .read()
            .await
            .values()
            .filter(|notification| notification.user_id == user_id)
            .cloned()
            .collect();
        Ok(sorted_newest_first(items, |notification| {
            notification.created_at
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ApplicationDraft, FranchiseStatus, PaymentRequestDraft, PaymentRequestType, UserRole,
    };

    fn application(applicant: &User, franchise: &Franchise) -> Application {
        Application::from_draft(
            ApplicationDraft::default(),
            applicant,
            franchise,
            &BigDecimal::from(5000),
        )
    }

    #[tokio::test]
    async fn test_insert_rejects_second_active_application() {
        let store = InMemoryStore::new();
        let applicant = User::new("p@example.com", "P", "One", UserRole::Partner);
        let franchise = Franchise::new(
            "Dosa Hub",
            Uuid::new_v4(),
            FranchiseStatus::Active,
            BigDecimal::from(1000),
        );

        ApplicationRepository::insert(&store, &application(&applicant, &franchise))
            .await
            .unwrap();
        let err = ApplicationRepository::insert(&store, &application(&applicant, &franchise))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_inactive_application_does_not_block_new_one() {
        let store = InMemoryStore::new();
        let applicant = User::new("p@example.com", "P", "One", UserRole::Partner);
        let franchise = Franchise::new(
            "Dosa Hub",
            Uuid::new_v4(),
            FranchiseStatus::Active,
            BigDecimal::from(1000),
        );

        let mut first = application(&applicant, &franchise);
        first.is_active = false;
        ApplicationRepository::insert(&store, &first).await.unwrap();
        ApplicationRepository::insert(&store, &application(&applicant, &franchise))
            .await
            .unwrap();

        let active = store.find_active(applicant.id, franchise.id).await.unwrap();
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    async fn test_update_leaves_payment_fields_alone() {
        let store = InMemoryStore::new();
        let applicant = User::new("p@example.com", "P", "One", UserRole::Partner);
        let franchise = Franchise::new(
            "Dosa Hub",
            Uuid::new_v4(),
            FranchiseStatus::Active,
            BigDecimal::from(1000),
        );
        let stale = application(&applicant, &franchise);
        ApplicationRepository::insert(&store, &stale).await.unwrap();

        let tx_id = Uuid::new_v4();
        store.reserve_fee_payment(stale.id, tx_id).await.unwrap();
        let err = store.reserve_fee_payment(stale.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        store
            .complete_fee_payment(stale.id, tx_id, Utc::now())
            .await
            .unwrap();

        let mut withdrawn = stale.clone();
        withdrawn.status = ApplicationStatus::Withdrawn;
        let saved = ApplicationRepository::update(&store, &withdrawn).await.unwrap();
        assert_eq!(saved.status, ApplicationStatus::Withdrawn);
        assert_eq!(saved.payment_status, PaymentStatus::Paid);
        assert_eq!(saved.payment_transaction_id, Some(tx_id));
    }

    #[tokio::test]
    async fn test_released_fee_reservation_can_be_taken_again() {
        let store = InMemoryStore::new();
        let applicant = User::new("p@example.com", "P", "One", UserRole::Partner);
        let franchise = Franchise::new(
            "Dosa Hub",
            Uuid::new_v4(),
            FranchiseStatus::Active,
            BigDecimal::from(1000),
        );
        let app = application(&applicant, &franchise);
        ApplicationRepository::insert(&store, &app).await.unwrap();

        let first = Uuid::new_v4();
        store.reserve_fee_payment(app.id, first).await.unwrap();
        store.release_fee_payment(app.id, first).await.unwrap();

        let second = Uuid::new_v4();
        store.reserve_fee_payment(app.id, second).await.unwrap();
        let err = store
            .complete_fee_payment(app.id, first, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_request_transitions_only_from_open_states() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let request = PaymentRequest::new(
            PaymentRequestDraft {
                to_user_id: Uuid::new_v4(),
                franchise_id: Uuid::new_v4(),
                application_id: None,
                request_type: PaymentRequestType::RoyaltyPayment,
                amount: BigDecimal::from(800),
                currency: None,
                title: "Royalty".to_string(),
                description: None,
                notes: None,
                due_date: Some(now - chrono::Duration::days(1)),
            },
            Uuid::new_v4(),
        );
        PaymentRequestRepository::insert(&store, &request).await.unwrap();

        let tx_id = Uuid::new_v4();
        store.reserve_payment(request.id, tx_id).await.unwrap();
        assert!(matches!(
            store.cancel(request.id, now).await,
            Err(RepositoryError::Conflict(_))
        ));
        assert!(store.mark_overdue(request.id, now).await.unwrap());

        let paid = store
            .complete_payment(request.id, tx_id, PaymentMethod::Upi, now)
            .await
            .unwrap();
        assert_eq!(paid.status, PaymentRequestStatus::Paid);

        // A sweep working from an older snapshot must not reopen it.
        assert!(!store.mark_overdue(request.id, now).await.unwrap());
        assert!(matches!(
            store.reserve_payment(request.id, Uuid::new_v4()).await,
            Err(RepositoryError::Conflict(_))
        ));
        let stored = PaymentRequestRepository::find_by_id(&store, request.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, PaymentRequestStatus::Paid);
        assert_eq!(stored.payment_transaction_id, Some(tx_id));
    }

    #[tokio::test]
    async fn test_user_email_lookup_ignores_case() {
        let store = InMemoryStore::new();
        let user = User::new("Owner@Example.com", "B", "Owner", UserRole::Business);
        UserRepository::insert(&store, &user).await.unwrap();

        let found = store.find_by_email("owner@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
    }
}
