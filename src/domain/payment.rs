//! Payment transaction and payment request entities.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::money::{platform_fee, round_currency, DEFAULT_CURRENCY};
use super::text_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    ApplicationFee,
    FranchiseFee,
    RoyaltyPayment,
    MarketingFee,
    Refund,
    Settlement,
}

text_enum!(TransactionType {
    ApplicationFee => "APPLICATION_FEE",
    FranchiseFee => "FRANCHISE_FEE",
    RoyaltyPayment => "ROYALTY_PAYMENT",
    MarketingFee => "MARKETING_FEE",
    Refund => "REFUND",
    Settlement => "SETTLEMENT",
});

impl TryFrom<PaymentRequestType> for TransactionType {
    type Error = PaymentRequestType;

    /// Request types without a transaction counterpart are returned as the error.
    fn try_from(value: PaymentRequestType) -> Result<Self, Self::Error> {
        match value {
            PaymentRequestType::ApplicationFee => Ok(TransactionType::ApplicationFee),
            PaymentRequestType::FranchiseFee => Ok(TransactionType::FranchiseFee),
            PaymentRequestType::RoyaltyPayment => Ok(TransactionType::RoyaltyPayment),
            PaymentRequestType::MarketingFee => Ok(TransactionType::MarketingFee),
            PaymentRequestType::SetupFee
            | PaymentRequestType::TrainingFee
            | PaymentRequestType::Other => Err(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Upi,
    CreditCard,
    DebitCard,
    NetBanking,
    Wallet,
    BankTransfer,
}

text_enum!(PaymentMethod {
    Upi => "UPI",
    CreditCard => "CREDIT_CARD",
    DebitCard => "DEBIT_CARD",
    NetBanking => "NET_BANKING",
    Wallet => "WALLET",
    BankTransfer => "BANK_TRANSFER",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Processing,
    Success,
    Failed,
    Cancelled,
    Refunded,
    PartiallyRefunded,
}

text_enum!(TransactionStatus {
    Pending => "PENDING",
    Processing => "PROCESSING",
    Success => "SUCCESS",
    Failed => "FAILED",
    Cancelled => "CANCELLED",
    Refunded => "REFUNDED",
    PartiallyRefunded => "PARTIALLY_REFUNDED",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentRequestType {
    ApplicationFee,
    FranchiseFee,
    RoyaltyPayment,
    MarketingFee,
    SetupFee,
    TrainingFee,
    Other,
}

text_enum!(PaymentRequestType {
    ApplicationFee => "APPLICATION_FEE",
    FranchiseFee => "FRANCHISE_FEE",
    RoyaltyPayment => "ROYALTY_PAYMENT",
    MarketingFee => "MARKETING_FEE",
    SetupFee => "SETUP_FEE",
    TrainingFee => "TRAINING_FEE",
    Other => "OTHER",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentRequestStatus {
    Pending,
    Paid,
    Overdue,
    Cancelled,
    Refunded,
}

text_enum!(PaymentRequestStatus {
    Pending => "PENDING",
    Paid => "PAID",
    Overdue => "OVERDUE",
    Cancelled => "CANCELLED",
    Refunded => "REFUNDED",
});

/// Fee split applied to every transaction.
///
/// `net_amount` is what the payer is charged: the amount plus the platform cut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeBreakdown {
    pub platform_fee: BigDecimal,
    pub net_amount: BigDecimal,
}

impl FeeBreakdown {
    pub fn for_amount(amount: &BigDecimal) -> Self {
        let platform_fee = platform_fee(amount);
        let net_amount = round_currency(&(amount.clone() + platform_fee.clone()));
        Self {
            platform_fee,
            net_amount,
        }
    }
}

/// Masked method-specific detail reported by the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaymentDetails {
    pub upi_id: Option<String>,
    pub upi_transaction_id: Option<String>,
    pub card_last4: Option<String>,
    pub card_type: Option<String>,
    pub card_network: Option<String>,
    pub bank_name: Option<String>,
    pub bank_transaction_id: Option<String>,
    pub wallet_name: Option<String>,
    pub wallet_transaction_id: Option<String>,
}

/// Caller-supplied part of a new transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TransactionDraft {
    pub franchise_id: Uuid,
    pub application_id: Option<Uuid>,
    pub payment_request_id: Option<Uuid>,
    pub transaction_type: TransactionType,
    pub method: PaymentMethod,
    #[schema(value_type = String)]
    pub amount: BigDecimal,
    pub currency: Option<String>,
    pub description: Option<String>,
    pub status: Option<TransactionStatus>,
    pub gateway_order_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub franchise_id: Uuid,
    pub application_id: Option<Uuid>,
    pub payment_request_id: Option<Uuid>,
    pub transaction_type: TransactionType,
    pub method: PaymentMethod,
    pub status: TransactionStatus,
    #[schema(value_type = String)]
    pub amount: BigDecimal,
    #[schema(value_type = String)]
    pub platform_fee: BigDecimal,
    #[schema(value_type = String)]
    pub net_amount: BigDecimal,
    pub currency: String,
    pub gateway_order_id: String,
    pub gateway_transaction_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub gateway_signature: Option<String>,
    pub payment_details: Option<PaymentDetails>,
    pub description: Option<String>,
    pub failure_reason: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentTransaction {
    pub fn new(draft: TransactionDraft, user_id: Uuid) -> Self {
        let now = Utc::now();
        let fees = FeeBreakdown::for_amount(&draft.amount);
        let gateway_order_id = draft
            .gateway_order_id
            .unwrap_or_else(generate_gateway_order_id);

        Self {
            id: Uuid::new_v4(),
            user_id,
            franchise_id: draft.franchise_id,
            application_id: draft.application_id,
            payment_request_id: draft.payment_request_id,
            transaction_type: draft.transaction_type,
            method: draft.method,
            status: draft.status.unwrap_or(TransactionStatus::Pending),
            amount: draft.amount,
            platform_fee: fees.platform_fee,
            net_amount: fees.net_amount,
            currency: draft
                .currency
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            gateway_order_id,
            gateway_transaction_id: None,
            gateway_payment_id: None,
            gateway_signature: None,
            payment_details: None,
            description: draft.description,
            failure_reason: None,
            processed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a status update. No transition table: gateway callbacks may
    /// arrive out of order.
    pub fn apply_status(
        &mut self,
        status: TransactionStatus,
        gateway_transaction_id: Option<String>,
        failure_reason: Option<String>,
    ) {
        let now = Utc::now();
        self.status = status;
        self.updated_at = now;

        if gateway_transaction_id.is_some() {
            self.gateway_transaction_id = gateway_transaction_id;
        }

        match status {
            TransactionStatus::Success => self.processed_at = Some(now),
            TransactionStatus::Failed if failure_reason.is_some() => {
                self.failure_reason = failure_reason
            }
            _ => {}
        }
    }
}

/// `ORDER_` followed by 16 hex characters.
pub fn generate_gateway_order_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("ORDER_{}", &hex[..16])
}

/// Caller-supplied part of a new payment request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentRequestDraft {
    pub to_user_id: Uuid,
    pub franchise_id: Uuid,
    pub application_id: Option<Uuid>,
    pub request_type: PaymentRequestType,
    #[schema(value_type = String)]
    pub amount: BigDecimal,
    pub currency: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentRequest {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub franchise_id: Uuid,
    pub application_id: Option<Uuid>,
    pub request_type: PaymentRequestType,
    pub status: PaymentRequestStatus,
    #[schema(value_type = String)]
    pub amount: BigDecimal,
    pub currency: String,
    pub title: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub payment_transaction_id: Option<Uuid>,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_method: Option<PaymentMethod>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentRequest {
    pub fn new(draft: PaymentRequestDraft, from_user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            from_user_id,
            to_user_id: draft.to_user_id,
            franchise_id: draft.franchise_id,
            application_id: draft.application_id,
            request_type: draft.request_type,
            status: PaymentRequestStatus::Pending,
            amount: draft.amount,
            currency: draft
                .currency
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            title: draft.title,
            description: draft.description,
            notes: draft.notes,
            due_date: draft.due_date,
            payment_transaction_id: None,
            paid_at: None,
            payment_method: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        self.status == PaymentRequestStatus::Pending
            && self.due_date.map(|due| due < now).unwrap_or(false)
    }

    /// Still payable and cancellable.
    pub fn is_open(&self) -> bool {
        matches!(
            self.status,
            PaymentRequestStatus::Pending | PaymentRequestStatus::Overdue
        )
    }

    pub fn mark_paid(&mut self, method: PaymentMethod, paid_at: DateTime<Utc>) {
        self.status = PaymentRequestStatus::Paid;
        self.payment_method = Some(method);
        self.paid_at = Some(paid_at);
        self.updated_at = paid_at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::str::FromStr;

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    fn draft(amount: &str) -> TransactionDraft {
        TransactionDraft {
            franchise_id: Uuid::new_v4(),
            application_id: None,
            payment_request_id: None,
            transaction_type: TransactionType::FranchiseFee,
            method: PaymentMethod::Upi,
            amount: dec(amount),
            currency: None,
            description: None,
            status: None,
            gateway_order_id: None,
        }
    }

    #[test]
    fn test_fee_breakdown_adds_platform_fee() {
        let fees = FeeBreakdown::for_amount(&dec("25000"));
        assert_eq!(fees.platform_fee, dec("500.00"));
        assert_eq!(fees.net_amount, dec("25500.00"));
    }

    #[test]
    fn test_fee_breakdown_rounds_net_amount() {
        let fees = FeeBreakdown::for_amount(&dec("1234.56"));
        assert_eq!(fees.platform_fee, dec("24.69"));
        assert_eq!(fees.net_amount, dec("1259.25"));
    }

    #[test]
    fn test_new_transaction_defaults() {
        let tx = PaymentTransaction::new(draft("100"), Uuid::new_v4());
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.currency, "INR");
        assert!(tx.gateway_order_id.starts_with("ORDER_"));
        assert_eq!(tx.gateway_order_id.len(), "ORDER_".len() + 16);
        assert_eq!(tx.platform_fee, dec("2.00"));
        assert_eq!(tx.net_amount, dec("102.00"));
    }

    #[test]
    fn test_supplied_order_id_is_kept() {
        let mut input = draft("100");
        input.gateway_order_id = Some("ORDER_CUSTOM".to_string());
        let tx = PaymentTransaction::new(input, Uuid::new_v4());
        assert_eq!(tx.gateway_order_id, "ORDER_CUSTOM");
    }

    #[test]
    fn test_apply_status_records_processing_fields() {
        let mut tx = PaymentTransaction::new(draft("100"), Uuid::new_v4());

        tx.apply_status(
            TransactionStatus::Failed,
            Some("gw-1".to_string()),
            Some("card declined".to_string()),
        );
        assert_eq!(tx.failure_reason.as_deref(), Some("card declined"));
        assert_eq!(tx.gateway_transaction_id.as_deref(), Some("gw-1"));
        assert!(tx.processed_at.is_none());

        tx.apply_status(TransactionStatus::Success, None, None);
        assert!(tx.processed_at.is_some());
        assert_eq!(tx.gateway_transaction_id.as_deref(), Some("gw-1"));
    }

    #[test]
    fn test_request_type_mapping_is_partial() {
        assert_eq!(
            TransactionType::try_from(PaymentRequestType::RoyaltyPayment),
            Ok(TransactionType::RoyaltyPayment)
        );
        assert_eq!(
            TransactionType::try_from(PaymentRequestType::SetupFee),
            Err(PaymentRequestType::SetupFee)
        );
    }

    #[test]
    fn test_past_due_only_while_pending() {
        let now = Utc::now();
        let mut request = PaymentRequest::new(
            PaymentRequestDraft {
                to_user_id: Uuid::new_v4(),
                franchise_id: Uuid::new_v4(),
                application_id: None,
                request_type: PaymentRequestType::RoyaltyPayment,
                amount: dec("1000"),
                currency: None,
                title: "Royalty".to_string(),
                description: None,
                notes: None,
                due_date: Some(now - Duration::days(1)),
            },
            Uuid::new_v4(),
        );
        assert!(request.is_past_due(now));
        assert!(request.is_open());

        request.status = PaymentRequestStatus::Overdue;
        assert!(!request.is_past_due(now));
        assert!(request.is_open());

        request.mark_paid(PaymentMethod::Wallet, now);
        assert!(!request.is_past_due(now));
        assert!(!request.is_open());
        assert_eq!(request.payment_method, Some(PaymentMethod::Wallet));
        assert_eq!(request.paid_at, Some(now));
    }
}
