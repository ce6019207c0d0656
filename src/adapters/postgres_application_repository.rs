//! Postgres implementation of ApplicationRepository.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    Application, ApplicationDocument, ApplicationStatus, BusinessInfo, FinancialInfo,
    PersonalInfo, Reference,
};
use crate::ports::{ApplicationRepository, RepositoryError, RepositoryResult};

#[derive(Clone)]
pub struct PostgresApplicationRepository {
    pool: PgPool,
}

impl PostgresApplicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_many(
        &self,
        sql: &str,
        id: Uuid,
    ) -> RepositoryResult<Vec<Application>> {
        let rows = sqlx::query_as::<_, ApplicationRow>(sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(ApplicationRow::into_domain).collect()
    }
}

#[async_trait]
impl ApplicationRepository for PostgresApplicationRepository {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Application>> {
        let row = sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ApplicationRow::into_domain).transpose()
    }

    async fn find_active(
        &self,
        applicant_id: Uuid,
        franchise_id: Uuid,
    ) -> RepositoryResult<Vec<Application>> {
        let rows = sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications WHERE applicant_id = $1 AND franchise_id = $2 AND is_active",
        )
        .bind(applicant_id)
        .bind(franchise_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ApplicationRow::into_domain).collect()
    }

    async fn insert(&self, application: &Application) -> RepositoryResult<Application> {
        // idx_applications_one_active turns a racing duplicate into a unique violation.
        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            INSERT INTO applications (
                id, franchise_id, franchise_name, applicant_id, applicant_name, applicant_email,
                status, personal_info, financial_info, business_info, motivation, questions,
                "references", documents, application_fee, payment_status, payment_transaction_id,
                paid_at, review_notes, reviewed_by, reviewed_at, rejection_reason,
                submitted_at, updated_at, is_active
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25
            )
            RETURNING *
            "#,
        )
        .bind(application.id)
        .bind(application.franchise_id)
        .bind(&application.franchise_name)
        .bind(application.applicant_id)
        .bind(&application.applicant_name)
        .bind(&application.applicant_email)
        .bind(application.status.as_str())
        .bind(application.personal_info.as_ref().map(Json))
        .bind(application.financial_info.as_ref().map(Json))
        .bind(application.business_info.as_ref().map(Json))
        .bind(&application.motivation)
        .bind(&application.questions)
        .bind(Json(&application.references))
        .bind(Json(&application.documents))
        .bind(&application.application_fee)
        .bind(application.payment_status.as_str())
        .bind(application.payment_transaction_id)
        .bind(application.paid_at)
        .bind(&application.review_notes)
        .bind(application.reviewed_by)
        .bind(application.reviewed_at)
        .bind(&application.rejection_reason)
        .bind(application.submitted_at)
        .bind(application.updated_at)
        .bind(application.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match RepositoryError::from(err) {
            RepositoryError::Conflict(_) => RepositoryError::Conflict(format!(
                "active application exists for applicant {} and franchise {}",
                application.applicant_id, application.franchise_id
            )),
            other => other,
        })?;

        row.into_domain()
    }

    async fn update(&self, application: &Application) -> RepositoryResult<Application> {
        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            UPDATE applications SET
                status = $2, personal_info = $3, financial_info = $4, business_info = $5,
                motivation = $6, questions = $7, "references" = $8, documents = $9,
                review_notes = $10, reviewed_by = $11, reviewed_at = $12,
                rejection_reason = $13, submitted_at = $14, updated_at = $15, is_active = $16
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(application.id)
        .bind(application.status.as_str())
        .bind(application.personal_info.as_ref().map(Json))
        .bind(application.financial_info.as_ref().map(Json))
        .bind(application.business_info.as_ref().map(Json))
        .bind(&application.motivation)
        .bind(&application.questions)
        .bind(Json(&application.references))
        .bind(Json(&application.documents))
        .bind(&application.review_notes)
        .bind(application.reviewed_by)
        .bind(application.reviewed_at)
        .bind(&application.rejection_reason)
        .bind(application.submitted_at)
        .bind(application.updated_at)
        .bind(application.is_active)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| RepositoryError::NotFound(format!("application {}", application.id)))?
            .into_domain()
    }

    async fn reserve_fee_payment(
        &self,
        id: Uuid,
        transaction_id: Uuid,
    ) -> RepositoryResult<Application> {
        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            UPDATE applications SET payment_transaction_id = $2
            WHERE id = $1 AND payment_status <> 'PAID' AND payment_transaction_id IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| {
            RepositoryError::Conflict(format!(
                "fee for application {} is already paid or being paid",
                id
            ))
        })?
        .into_domain()
    }

    async fn complete_fee_payment(
        &self,
        id: Uuid,
        transaction_id: Uuid,
        paid_at: DateTime<Utc>,
    ) -> RepositoryResult<Application> {
        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            UPDATE applications SET payment_status = 'PAID', paid_at = $3, updated_at = $3
            WHERE id = $1 AND payment_transaction_id = $2 AND payment_status <> 'PAID'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(transaction_id)
        .bind(paid_at)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| {
            RepositoryError::Conflict(format!(
                "fee payment {} does not hold application {}",
                transaction_id, id
            ))
        })?
        .into_domain()
    }

    async fn release_fee_payment(&self, id: Uuid, transaction_id: Uuid) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            UPDATE applications SET payment_transaction_id = NULL
            WHERE id = $1 AND payment_transaction_id = $2 AND payment_status <> 'PAID'
            "#,
        )
        .bind(id)
        .bind(transaction_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_by_applicant(&self, applicant_id: Uuid) -> RepositoryResult<Vec<Application>> {
        self.fetch_many(
            "SELECT * FROM applications WHERE applicant_id = $1 ORDER BY submitted_at DESC",
            applicant_id,
        )
        .await
    }

    async fn list_by_franchise(&self, franchise_id: Uuid) -> RepositoryResult<Vec<Application>> {
        self.fetch_many(
            "SELECT * FROM applications WHERE franchise_id = $1 ORDER BY submitted_at DESC",
            franchise_id,
        )
        .await
    }

    async fn list_for_business_owner(&self, owner_id: Uuid) -> RepositoryResult<Vec<Application>> {
        self.fetch_many(
            r#"
            SELECT a.* FROM applications a
            JOIN franchises f ON f.id = a.franchise_id
            WHERE f.business_owner_id = $1
            ORDER BY a.submitted_at DESC
            "#,
            owner_id,
        )
        .await
    }

    async fn count_by_status(&self, status: Option<ApplicationStatus>) -> RepositoryResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM applications WHERE $1::TEXT IS NULL OR status = $1",
        )
        .bind(status.map(ApplicationStatus::as_str))
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct ApplicationRow {
    id: Uuid,
    franchise_id: Uuid,
    franchise_name: String,
    applicant_id: Uuid,
    applicant_name: String,
    applicant_email: String,
    status: String,
    personal_info: Option<Json<PersonalInfo>>,
    financial_info: Option<Json<FinancialInfo>>,
    business_info: Option<Json<BusinessInfo>>,
    motivation: Option<String>,
    questions: Option<String>,
    references: Json<Vec<Reference>>,
    documents: Json<Vec<ApplicationDocument>>,
    application_fee: BigDecimal,
    payment_status: String,
    payment_transaction_id: Option<Uuid>,
    paid_at: Option<DateTime<Utc>>,
    review_notes: Option<String>,
    reviewed_by: Option<Uuid>,
    reviewed_at: Option<DateTime<Utc>>,
    rejection_reason: Option<String>,
    submitted_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_active: bool,
}

impl ApplicationRow {
    fn into_domain(self) -> RepositoryResult<Application> {
        Ok(Application {
            id: self.id,
            franchise_id: self.franchise_id,
            franchise_name: self.franchise_name,
            applicant_id: self.applicant_id,
            applicant_name: self.applicant_name,
            applicant_email: self.applicant_email,
            status: self.status.parse()?,
            personal_info: self.personal_info.map(|json| json.0),
            financial_info: self.financial_info.map(|json| json.0),
            business_info: self.business_info.map(|json| json.0),
            motivation: self.motivation,
            questions: self.questions,
            references: self.references.0,
            documents: self.documents.0,
            application_fee: self.application_fee,
            payment_status: self.payment_status.parse()?,
            payment_transaction_id: self.payment_transaction_id,
            paid_at: self.paid_at,
            review_notes: self.review_notes,
            reviewed_by: self.reviewed_by,
            reviewed_at: self.reviewed_at,
            rejection_reason: self.rejection_reason,
            submitted_at: self.submitted_at,
            updated_at: self.updated_at,
            is_active: self.is_active,
        })
    }
}
