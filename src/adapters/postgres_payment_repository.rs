use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    PaymentDetails, PaymentMethod, PaymentRequest, PaymentTransaction, TransactionStatus,
};
use crate::ports::{
    PaymentRequestRepository, PaymentTransactionRepository, RepositoryError, RepositoryResult,
};

#[derive(Clone)]
pub struct PostgresPaymentTransactionRepository {
    pool: PgPool,
}

impl PostgresPaymentTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentTransactionRepository for PostgresPaymentTransactionRepository {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<PaymentTransaction>> {
        let row = sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM payment_transactions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TransactionRow::into_domain).transpose()
    }

    async fn insert(&self, tx: &PaymentTransaction) -> RepositoryResult<PaymentTransaction> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO payment_transactions (
                id, user_id, franchise_id, application_id, payment_request_id,
                transaction_type, method, status, amount, platform_fee, net_amount, currency,
                gateway_order_id, gateway_transaction_id, gateway_payment_id, gateway_signature,
                payment_details, description, failure_reason, processed_at, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22
            )
            RETURNING *
            "#,
        )
        .bind(tx.id)
        .bind(tx.user_id)
        .bind(tx.franchise_id)
        .bind(tx.application_id)
        .bind(tx.payment_request_id)
        .bind(tx.transaction_type.as_str())
        .bind(tx.method.as_str())
        .bind(tx.status.as_str())
        .bind(&tx.amount)
        .bind(&tx.platform_fee)
        .bind(&tx.net_amount)
        .bind(&tx.currency)
        .bind(&tx.gateway_order_id)
        .bind(&tx.gateway_transaction_id)
        .bind(&tx.gateway_payment_id)
        .bind(&tx.gateway_signature)
        .bind(tx.payment_details.as_ref().map(Json))
        .bind(&tx.description)
        .bind(&tx.failure_reason)
        .bind(tx.processed_at)
        .bind(tx.created_at)
        .bind(tx.updated_at)
        .fetch_one(&self.pool)
        .await?;

        row.into_domain()
    }

    async fn update(&self, tx: &PaymentTransaction) -> RepositoryResult<PaymentTransaction> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            UPDATE payment_transactions SET
                status = $2, gateway_transaction_id = $3, gateway_payment_id = $4,
                gateway_signature = $5, payment_details = $6, failure_reason = $7,
                processed_at = $8, updated_at = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(tx.id)
        .bind(tx.status.as_str())
        .bind(&tx.gateway_transaction_id)
        .bind(&tx.gateway_payment_id)
        .bind(&tx.gateway_signature)
        .bind(tx.payment_details.as_ref().map(Json))
        .bind(&tx.failure_reason)
        .bind(tx.processed_at)
        .bind(tx.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| RepositoryError::NotFound(format!("payment transaction {}", tx.id)))?
            .into_domain()
    }

    async fn list_by_user(&self, user_id: Uuid) -> RepositoryResult<Vec<PaymentTransaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM payment_transactions WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TransactionRow::into_domain).collect()
    }

    async fn list_by_payment_request(
        &self,
        request_id: Uuid,
    ) -> RepositoryResult<Vec<PaymentTransaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM payment_transactions WHERE payment_request_id = $1 ORDER BY created_at DESC",
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TransactionRow::into_domain).collect()
    }

    async fn count_by_status(&self, status: Option<TransactionStatus>) -> RepositoryResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM payment_transactions WHERE $1::TEXT IS NULL OR status = $1",
        )
        .bind(status.map(TransactionStatus::as_str))
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn sum_amount_by_status(&self, status: TransactionStatus) -> RepositoryResult<BigDecimal> {
        let total: BigDecimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM payment_transactions WHERE status = $1",
        )
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

#[derive(Clone)]
pub struct PostgresPaymentRequestRepository {
    pool: PgPool,
}

impl PostgresPaymentRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRequestRepository for PostgresPaymentRequestRepository {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<PaymentRequest>> {
        let row = sqlx::query_as::<_, RequestRow>("SELECT * FROM payment_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(RequestRow::into_domain).transpose()
    }

    async fn insert(&self, request: &PaymentRequest) -> RepositoryResult<PaymentRequest> {
        let row = sqlx::query_as::<_, RequestRow>(
            r#"
            INSERT INTO payment_requests (
                id, from_user_id, to_user_id, franchise_id, application_id, request_type,
                status, amount, currency, title, description, notes, due_date,
                payment_transaction_id, paid_at, payment_method, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18
            )
            RETURNING *
            "#,
        )
        .bind(request.id)
        .bind(request.from_user_id)
        .bind(request.to_user_id)
        .bind(request.franchise_id)
        .bind(request.application_id)
        .bind(request.request_type.as_str())
        .bind(request.status.as_str())
        .bind(&request.amount)
        .bind(&request.currency)
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.notes)
        .bind(request.due_date)
        .bind(request.payment_transaction_id)
        .bind(request.paid_at)
        .bind(request.payment_method.map(|method| method.as_str()))
        .bind(request.created_at)
        .bind(request.updated_at)
        .fetch_one(&self.pool)
        .await?;

        row.into_domain()
    }

    async fn reserve_payment(
        &self,
        id: Uuid,
        transaction_id: Uuid,
    ) -> RepositoryResult<PaymentRequest> {
        let row = sqlx::query_as::<_, RequestRow>(
            r#"
            UPDATE payment_requests SET payment_transaction_id = $2
            WHERE id = $1
              AND status IN ('PENDING', 'OVERDUE')
              AND payment_transaction_id IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| {
            RepositoryError::Conflict(format!(
                "payment request {} is closed or already being paid",
                id
            ))
        })?
        .into_domain()
    }

    async fn complete_payment(
        &self,
        id: Uuid,
        transaction_id: Uuid,
        method: PaymentMethod,
        paid_at: DateTime<Utc>,
    ) -> RepositoryResult<PaymentRequest> {
        let row = sqlx::query_as::<_, RequestRow>(
            r#"
            UPDATE payment_requests SET
                status = 'PAID', payment_method = $3, paid_at = $4, updated_at = $4
            WHERE id = $1
              AND payment_transaction_id = $2
              AND status IN ('PENDING', 'OVERDUE')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(transaction_id)
        .bind(method.as_str())
        .bind(paid_at)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| {
            RepositoryError::Conflict(format!(
                "payment {} does not hold request {}",
                transaction_id, id
            ))
        })?
        .into_domain()
    }

    async fn release_payment(&self, id: Uuid, transaction_id: Uuid) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            UPDATE payment_requests SET payment_transaction_id = NULL
            WHERE id = $1
              AND payment_transaction_id = $2
              AND status IN ('PENDING', 'OVERDUE')
            "#,
        )
        .bind(id)
        .bind(transaction_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn cancel(&self, id: Uuid, at: DateTime<Utc>) -> RepositoryResult<PaymentRequest> {
        let row = sqlx::query_as::<_, RequestRow>(
            r#"
            UPDATE payment_requests SET status = 'CANCELLED', updated_at = $2
            WHERE id = $1
              AND status IN ('PENDING', 'OVERDUE')
              AND payment_transaction_id IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| {
            RepositoryError::Conflict(format!("payment request {} is closed or being paid", id))
        })?
        .into_domain()
    }

    async fn mark_overdue(&self, id: Uuid, now: DateTime<Utc>) -> RepositoryResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payment_requests SET status = 'OVERDUE', updated_at = $2
            WHERE id = $1 AND status = 'PENDING' AND due_date < $2
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_by_sender(&self, from_user_id: Uuid) -> RepositoryResult<Vec<PaymentRequest>> {
        let rows = sqlx::query_as::<_, RequestRow>(
            "SELECT * FROM payment_requests WHERE from_user_id = $1 ORDER BY created_at DESC",
        )
        .bind(from_user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(RequestRow::into_domain).collect()
    }

    async fn list_by_recipient(&self, to_user_id: Uuid) -> RepositoryResult<Vec<PaymentRequest>> {
        let rows = sqlx::query_as::<_, RequestRow>(
            "SELECT * FROM payment_requests WHERE to_user_id = $1 ORDER BY created_at DESC",
        )
        .bind(to_user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(RequestRow::into_domain).collect()
    }

    async fn list_past_due(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<PaymentRequest>> {
        let rows = sqlx::query_as::<_, RequestRow>(
            r#"
            SELECT * FROM payment_requests
            WHERE status = 'PENDING' AND due_date IS NOT NULL AND due_date < $1
            ORDER BY due_date ASC
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(RequestRow::into_domain).collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    user_id: Uuid,
    franchise_id: Uuid,
    application_id: Option<Uuid>,
    payment_request_id: Option<Uuid>,
    transaction_type: String,
    method: String,
    status: String,
    amount: BigDecimal,
    platform_fee: BigDecimal,
    net_amount: BigDecimal,
    currency: String,
    gateway_order_id: String,
    gateway_transaction_id: Option<String>,
    gateway_payment_id: Option<String>,
    gateway_signature: Option<String>,
    payment_details: Option<Json<PaymentDetails>>,
    description: Option<String>,
    failure_reason: Option<String>,
    processed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TransactionRow {
    fn into_domain(self) -> RepositoryResult<PaymentTransaction> {
        Ok(PaymentTransaction {
            id: self.id,
            user_id: self.user_id,
            franchise_id: self.franchise_id,
            application_id: self.application_id,
            payment_request_id: self.payment_request_id,
            transaction_type: self.transaction_type.parse()?,
            method: self.method.parse()?,
            status: self.status.parse()?,
            amount: self.amount,
            platform_fee: self.platform_fee,
            net_amount: self.net_amount,
            currency: self.currency,
            gateway_order_id: self.gateway_order_id,
            gateway_transaction_id: self.gateway_transaction_id,
            gateway_payment_id: self.gateway_payment_id,
            gateway_signature: self.gateway_signature,
            payment_details: self.payment_details.map(|json| json.0),
            description: self.description,
            failure_reason: self.failure_reason,
            processed_at: self.processed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RequestRow {
    id: Uuid,
    from_user_id: Uuid,
    to_user_id: Uuid,
    franchise_id: Uuid,
    application_id: Option<Uuid>,
    request_type: String,
    status: String,
    amount: BigDecimal,
    currency: String,
    title: String,
    description: Option<String>,
    notes: Option<String>,
    due_date: Option<DateTime<Utc>>,
    payment_transaction_id: Option<Uuid>,
    paid_at: Option<DateTime<Utc>>,
    payment_method: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RequestRow {
    fn into_domain(self) -> RepositoryResult<PaymentRequest> {
        Ok(PaymentRequest {
            id: self.id,
            from_user_id: self.from_user_id,
            to_user_id: self.to_user_id,
            franchise_id: self.franchise_id,
            application_id: self.application_id,
            request_type: self.request_type.parse()?,
            status: self.status.parse()?,
            amount: self.amount,
            currency: self.currency,
            title: self.title,
            description: self.description,
            notes: self.notes,
            due_date: self.due_date,
            payment_transaction_id: self.payment_transaction_id,
            paid_at: self.paid_at,
            payment_method: self.payment_method.map(|method| method.parse()).transpose()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
