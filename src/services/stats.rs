use std::sync::Arc;

use bigdecimal::BigDecimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::money::round_currency;
use crate::domain::{ApplicationStatus, TransactionStatus};
use crate::error::AppError;
use crate::ports::{ApplicationRepository, PaymentTransactionRepository, Repositories};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ApplicationStats {
    pub total: i64,
    pub submitted: i64,
    pub under_review: i64,
    pub approved: i64,
    pub rejected: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PaymentStats {
    pub total: i64,
    pub successful: i64,
    pub pending: i64,
    pub failed: i64,
    /// Sum of SUCCESS transaction amounts.
    #[schema(value_type = String)]
    pub total_amount: BigDecimal,
}

/// Thin forwarding layer over repository aggregates.
#[derive(Clone)]
pub struct StatsService {
    applications: Arc<dyn ApplicationRepository>,
    transactions: Arc<dyn PaymentTransactionRepository>,
}

impl StatsService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            applications: repos.applications.clone(),
            transactions: repos.transactions.clone(),
        }
    }

    pub async fn application_stats(&self) -> Result<ApplicationStats, AppError> {
        let repo = &self.applications;
        Ok(ApplicationStats {
            total: repo.count_by_status(None).await?,
            submitted: repo.count_by_status(Some(ApplicationStatus::Submitted)).await?,
            under_review: repo.count_by_status(Some(ApplicationStatus::UnderReview)).await?,
            approved: repo.count_by_status(Some(ApplicationStatus::Approved)).await?,
            rejected: repo.count_by_status(Some(ApplicationStatus::Rejected)).await?,
        })
    }

    pub async fn payment_stats(&self) -> Result<PaymentStats, AppError> {
        let repo = &self.transactions;
        Ok(PaymentStats {
            total: repo.count_by_status(None).await?,
            successful: repo.count_by_status(Some(TransactionStatus::Success)).await?,
            pending: repo.count_by_status(Some(TransactionStatus::Pending)).await?,
            failed: repo.count_by_status(Some(TransactionStatus::Failed)).await?,
            total_amount: round_currency(
                &repo.sum_amount_by_status(TransactionStatus::Success).await?,
            ),
        })
    }
}
