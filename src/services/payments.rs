//! Payment settlement: transactions, application-fee orchestration and the
//! payment-request lifecycle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::PaymentSettings;
use crate::domain::{
    Application, NotificationType, PaymentMethod, PaymentRequest, PaymentRequestDraft,
    PaymentRequestStatus, PaymentStatus, PaymentTransaction, TransactionDraft, TransactionStatus,
    TransactionType,
};
use crate::error::AppError;
use crate::ports::{
    ApplicationRepository, FranchiseRepository, PaymentRequestRepository,
    PaymentTransactionRepository, Repositories, RepositoryError,
};
use crate::services::gateway::PaymentGateway;
use crate::services::identity::IdentityResolver;
use crate::services::notifications::NotificationDispatcher;
use crate::validation::{validate_currency, validate_positive_amount, validate_title};

/// A paid request together with the transaction that settled it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RequestSettlement {
    pub request: PaymentRequest,
    pub transaction: PaymentTransaction,
}

#[derive(Clone)]
pub struct PaymentService {
    transactions: Arc<dyn PaymentTransactionRepository>,
    requests: Arc<dyn PaymentRequestRepository>,
    applications: Arc<dyn ApplicationRepository>,
    franchises: Arc<dyn FranchiseRepository>,
    identity: IdentityResolver,
    notifier: NotificationDispatcher,
    gateway: Arc<dyn PaymentGateway>,
    default_currency: String,
}

impl PaymentService {
    pub fn new(
        repos: &Repositories,
        notifier: NotificationDispatcher,
        gateway: Arc<dyn PaymentGateway>,
        settings: &PaymentSettings,
    ) -> Self {
        Self {
            transactions: repos.transactions.clone(),
            requests: repos.payment_requests.clone(),
            applications: repos.applications.clone(),
            franchises: repos.franchises.clone(),
            identity: IdentityResolver::new(repos.users.clone()),
            notifier,
            gateway,
            default_currency: settings.default_currency.clone(),
        }
    }

    pub async fn create_transaction(
        &self,
        draft: TransactionDraft,
        user_id: Uuid,
    ) -> Result<PaymentTransaction, AppError> {
        let tx = self.prepare_transaction(draft, user_id).await?;
        self.record(tx).await
    }

    pub async fn get_transaction(&self, id: Uuid) -> Result<PaymentTransaction, AppError> {
        self.transactions
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transaction not found: {}", id)))
    }

    pub async fn list_transactions_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<PaymentTransaction>, AppError> {
        Ok(self.transactions.list_by_user(user_id).await?)
    }

    /// Any status is reachable from any other.
    pub async fn update_transaction_status(
        &self,
        id: Uuid,
        status: TransactionStatus,
        gateway_transaction_id: Option<String>,
        failure_reason: Option<String>,
    ) -> Result<PaymentTransaction, AppError> {
        let mut tx = self.get_transaction(id).await?;
        let previous = tx.status;

        tx.apply_status(status, gateway_transaction_id, failure_reason);
        let tx = self.transactions.update(&tx).await?;

        tracing::info!(
            transaction_id = %id,
            from = %previous,
            to = %status,
            "Transaction status updated"
        );
        Ok(tx)
    }

    /// Charge the applicant the application fee. The application status is
    /// left as is; only payment fields change.
    ///
    /// The application is reserved for the new transaction before anything is
    /// charged, so concurrent payments for the same fee fail with `Conflict`.
    pub async fn process_application_fee_payment(
        &self,
        application_id: Uuid,
        user_identifier: &str,
        method: PaymentMethod,
    ) -> Result<PaymentTransaction, AppError> {
        let application = self
            .applications
            .find_by_id(application_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Application not found: {}", application_id))
            })?;
        let user = self.identity.resolve(user_identifier).await?;

        if !application.is_owned_by(user.id) {
            return Err(AppError::Forbidden(
                "You can only pay for your own applications".to_string(),
            ));
        }
        if application.payment_status == PaymentStatus::Paid {
            return Err(AppError::Conflict(
                "Application fee has already been paid".to_string(),
            ));
        }

        let tx = self
            .prepare_transaction(
                TransactionDraft {
                    franchise_id: application.franchise_id,
                    application_id: Some(application.id),
                    payment_request_id: None,
                    transaction_type: TransactionType::ApplicationFee,
                    method,
                    amount: application.application_fee.clone(),
                    currency: None,
                    description: Some(format!(
                        "Application fee for {}",
                        application.franchise_name
                    )),
                    status: None,
                    gateway_order_id: None,
                },
                user.id,
            )
            .await?;
        let tx_id = tx.id;

        self.applications
            .reserve_fee_payment(application.id, tx_id)
            .await
            .map_err(|err| match err {
                RepositoryError::Conflict(_) => AppError::Conflict(
                    "Application fee has already been paid or is being paid".to_string(),
                ),
                other => other.into(),
            })?;

        let tx = match self.charge(tx).await {
            Ok(tx) => tx,
            Err(err) => {
                if let Err(e) = self.applications.release_fee_payment(application.id, tx_id).await {
                    tracing::warn!(
                        application_id = %application.id,
                        transaction_id = %tx_id,
                        error = %e,
                        "Could not release fee reservation"
                    );
                }
                return Err(err);
            }
        };

        let paid_at = tx.processed_at.unwrap_or_else(Utc::now);
        let application = self
            .applications
            .complete_fee_payment(application.id, tx.id, paid_at)
            .await?;

        tracing::info!(
            application_id = %application.id,
            transaction_id = %tx.id,
            "Application fee paid"
        );

        self.notify_fee_paid(&application, &tx).await;
        Ok(tx)
    }

    pub async fn create_payment_request(
        &self,
        mut draft: PaymentRequestDraft,
        from_user_id: Uuid,
    ) -> Result<PaymentRequest, AppError> {
        validate_positive_amount(&draft.amount)?;
        draft.title = validate_title(&draft.title)?;
        if let Some(currency) = draft.currency.as_deref() {
            validate_currency(currency)?;
        }

        let from_user = self.identity.resolve_id(from_user_id).await?;
        let to_user = self.identity.resolve_id(draft.to_user_id).await?;
        if self.franchises.find_by_id(draft.franchise_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Franchise not found: {}",
                draft.franchise_id
            )));
        }

        if draft.currency.is_none() {
            draft.currency = Some(self.default_currency.clone());
        }

        let request = PaymentRequest::new(draft, from_user.id);
        let request = self.requests.insert(&request).await?;

        tracing::info!(
            request_id = %request.id,
            from_user_id = %from_user.id,
            to_user_id = %to_user.id,
            amount = %request.amount,
            "Payment request created"
        );

        self.notifier
            .notify(
                to_user.id,
                NotificationType::PaymentRequest,
                &format!("Payment Request: {}", request.title),
                &format!(
                    "{} requested {} {}",
                    from_user.full_name(),
                    request.amount,
                    request.currency
                ),
                Some(request.id),
            )
            .await;

        Ok(request)
    }

    pub async fn get_payment_request(&self, id: Uuid) -> Result<PaymentRequest, AppError> {
        self.requests
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment request not found: {}", id)))
    }

    pub async fn list_sent_requests(
        &self,
        from_user_id: Uuid,
    ) -> Result<Vec<PaymentRequest>, AppError> {
        Ok(self.requests.list_by_sender(from_user_id).await?)
    }

    pub async fn list_received_requests(
        &self,
        to_user_id: Uuid,
    ) -> Result<Vec<PaymentRequest>, AppError> {
        Ok(self.requests.list_by_recipient(to_user_id).await?)
    }

    pub async fn list_request_transactions(
        &self,
        request_id: Uuid,
    ) -> Result<Vec<PaymentTransaction>, AppError> {
        Ok(self.transactions.list_by_payment_request(request_id).await?)
    }

    pub async fn pay_payment_request(
        &self,
        request_id: Uuid,
        user_id: Uuid,
        method: PaymentMethod,
    ) -> Result<RequestSettlement, AppError> {
        let request = self.get_payment_request(request_id).await?;

        if request.to_user_id != user_id {
            return Err(AppError::Forbidden(
                "You can only pay requests addressed to you".to_string(),
            ));
        }
        match request.status {
            PaymentRequestStatus::Paid | PaymentRequestStatus::Refunded => {
                return Err(AppError::Conflict(format!(
                    "Payment request is already {}",
                    request.status
                )))
            }
            PaymentRequestStatus::Cancelled => {
                return Err(AppError::InvalidState(
                    "Cannot pay a cancelled payment request".to_string(),
                ))
            }
            PaymentRequestStatus::Pending | PaymentRequestStatus::Overdue => {}
        }

        let transaction_type = TransactionType::try_from(request.request_type).map_err(|kind| {
            AppError::Internal(format!("No transaction type for request type {}", kind))
        })?;

        let description = match request.description.as_deref() {
            Some(details) => format!("{}: {}", request.title, details),
            None => request.title.clone(),
        };

        let tx = self
            .prepare_transaction(
                TransactionDraft {
                    franchise_id: request.franchise_id,
                    application_id: request.application_id,
                    payment_request_id: Some(request.id),
                    transaction_type,
                    method,
                    amount: request.amount.clone(),
                    currency: Some(request.currency.clone()),
                    description: Some(description),
                    status: None,
                    gateway_order_id: None,
                },
                user_id,
            )
            .await?;
        let tx_id = tx.id;

        self.requests.reserve_payment(request.id, tx_id).await?;

        let tx = match self.charge(tx).await {
            Ok(tx) => tx,
            Err(err) => {
                if let Err(e) = self.requests.release_payment(request.id, tx_id).await {
                    tracing::warn!(
                        request_id = %request.id,
                        transaction_id = %tx_id,
                        error = %e,
                        "Could not release payment request reservation"
                    );
                }
                return Err(err);
            }
        };

        let paid_at = tx.processed_at.unwrap_or_else(Utc::now);
        let request = self
            .requests
            .complete_payment(request.id, tx.id, method, paid_at)
            .await?;

        tracing::info!(
            request_id = %request.id,
            transaction_id = %tx.id,
            "Payment request paid"
        );

        self.notifier
            .notify(
                request.from_user_id,
                NotificationType::PaymentReceived,
                "Payment Received",
                &format!(
                    "Payment of {} {} received for {}",
                    request.amount, request.currency, request.title
                ),
                Some(request.id),
            )
            .await;

        Ok(RequestSettlement {
            request,
            transaction: tx,
        })
    }

    /// Only open requests with no payment in flight can be cancelled.
    pub async fn cancel_payment_request(
        &self,
        request_id: Uuid,
        user_id: Uuid,
    ) -> Result<PaymentRequest, AppError> {
        let request = self.get_payment_request(request_id).await?;

        if request.from_user_id != user_id {
            return Err(AppError::Forbidden(
                "Only the requester can cancel a payment request".to_string(),
            ));
        }
        if !request.is_open() {
            return Err(AppError::Conflict(format!(
                "Cannot cancel a payment request that is {}",
                request.status
            )));
        }

        let request = self.requests.cancel(request.id, Utc::now()).await?;

        tracing::info!(request_id = %request.id, "Payment request cancelled");
        Ok(request)
    }

    /// Move pending requests past their due date to OVERDUE. Returns the
    /// number of requests updated.
    pub async fn mark_overdue_requests(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        let due = self.requests.list_past_due(now).await?;
        let mut updated = 0;

        for request in due {
            if self.requests.mark_overdue(request.id, now).await? {
                tracing::debug!(request_id = %request.id, "Payment request marked overdue");
                updated += 1;
            }
        }

        tracing::info!(count = updated, "Overdue sweep completed");
        Ok(updated)
    }

    /// Validate a draft and build the pending transaction without storing it.
    async fn prepare_transaction(
        &self,
        mut draft: TransactionDraft,
        user_id: Uuid,
    ) -> Result<PaymentTransaction, AppError> {
        validate_positive_amount(&draft.amount)?;
        if let Some(currency) = draft.currency.as_deref() {
            validate_currency(currency)?;
        }

        let user = self.identity.resolve_id(user_id).await?;
        if self.franchises.find_by_id(draft.franchise_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Franchise not found: {}",
                draft.franchise_id
            )));
        }

        if draft.currency.is_none() {
            draft.currency = Some(self.default_currency.clone());
        }

        Ok(PaymentTransaction::new(draft, user.id))
    }

    async fn record(&self, tx: PaymentTransaction) -> Result<PaymentTransaction, AppError> {
        let tx = self.transactions.insert(&tx).await?;

        tracing::info!(
            transaction_id = %tx.id,
            user_id = %tx.user_id,
            kind = %tx.transaction_type,
            amount = %tx.amount,
            net_amount = %tx.net_amount,
            "Payment transaction created"
        );
        Ok(tx)
    }

    /// Store and settle a transaction. A gateway failure leaves it FAILED.
    async fn charge(&self, tx: PaymentTransaction) -> Result<PaymentTransaction, AppError> {
        let tx = self.record(tx).await?;

        match self.settle(tx.clone()).await {
            Ok(settled) => Ok(settled),
            Err(err) => {
                let mut failed = tx;
                failed.apply_status(TransactionStatus::Failed, None, Some(err.to_string()));
                if let Err(e) = self.transactions.update(&failed).await {
                    tracing::warn!(
                        transaction_id = %failed.id,
                        error = %e,
                        "Could not mark transaction failed"
                    );
                }
                Err(err)
            }
        }
    }

    /// Run a pending transaction through the gateway and persist the result.
    async fn settle(&self, mut tx: PaymentTransaction) -> Result<PaymentTransaction, AppError> {
        let receipt = self.gateway.settle(&tx)?;

        tx.status = TransactionStatus::Success;
        tx.processed_at = Some(receipt.processed_at);
        tx.gateway_payment_id = Some(receipt.gateway_payment_id);
        tx.gateway_signature = Some(receipt.gateway_signature);
        tx.payment_details = Some(receipt.payment_details);
        tx.updated_at = receipt.processed_at;

        let tx = self.transactions.update(&tx).await?;
        tracing::debug!(transaction_id = %tx.id, method = %tx.method, "Gateway settled transaction");
        Ok(tx)
    }

    async fn notify_fee_paid(&self, application: &Application, tx: &PaymentTransaction) {
        let owner_id = match self.franchises.find_by_id(application.franchise_id).await {
            Ok(Some(franchise)) => franchise.business_owner_id,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(
                    application_id = %application.id,
                    error = %e,
                    "Could not load franchise for fee notification"
                );
                return;
            }
        };

        self.notifier
            .notify(
                owner_id,
                NotificationType::PaymentReceived,
                "Application Fee Received",
                &format!(
                    "{} paid the application fee of {} {} for {}",
                    application.applicant_name, tx.amount, tx.currency, application.franchise_name
                ),
                Some(application.id),
            )
            .await;
    }
}
