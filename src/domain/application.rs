//! Franchise application entity and its embedded value objects.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::franchise::Franchise;
use super::text_enum;
use super::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    Withdrawn,
}

text_enum!(ApplicationStatus {
    Draft => "DRAFT",
    Submitted => "SUBMITTED",
    UnderReview => "UNDER_REVIEW",
    Approved => "APPROVED",
    Rejected => "REJECTED",
    Withdrawn => "WITHDRAWN",
});

impl ApplicationStatus {
    /// Statuses an applicant may no longer edit.
    pub fn is_decided(self) -> bool {
        matches!(self, ApplicationStatus::Approved | ApplicationStatus::Rejected)
    }

    pub fn can_withdraw(self) -> bool {
        !matches!(self, ApplicationStatus::Approved | ApplicationStatus::Withdrawn)
    }

    pub fn is_reviewable(self) -> bool {
        matches!(self, ApplicationStatus::Submitted | ApplicationStatus::UnderReview)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

text_enum!(PaymentStatus {
    Pending => "PENDING",
    Paid => "PAID",
    Failed => "FAILED",
    Refunded => "REFUNDED",
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PersonalInfo {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub address: Option<Address>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FinancialInfo {
    #[schema(value_type = Option<String>)]
    pub net_worth: Option<BigDecimal>,
    #[schema(value_type = Option<String>)]
    pub liquid_assets: Option<BigDecimal>,
    #[schema(value_type = Option<String>)]
    pub annual_income: Option<BigDecimal>,
    pub credit_score: Option<i32>,
    pub has_debt: Option<bool>,
    #[schema(value_type = Option<String>)]
    pub debt_amount: Option<BigDecimal>,
    pub investment_source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BusinessInfo {
    pub preferred_location: Option<Address>,
    pub preferred_states: Option<Vec<String>>,
    pub timeline_to_open: Option<String>,
    pub full_time_commitment: Option<bool>,
    pub has_partners: Option<bool>,
    pub partner_details: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceType {
    Professional,
    Personal,
    Business,
    Financial,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Reference {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub reference_type: ReferenceType,
    pub relationship: Option<String>,
    pub years_known: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    FinancialStatement,
    BankStatement,
    TaxReturn,
    CreditReport,
    BusinessPlan,
    Resume,
    ReferenceLetter,
    LegalDocument,
    Identification,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ApplicationDocument {
    pub id: Uuid,
    pub name: String,
    pub document_type: DocumentType,
    pub file_name: String,
    pub file_url: String,
    pub mime_type: Option<String>,
    pub file_size: Option<i64>,
    pub uploaded_by: Uuid,
    pub uploaded_at: DateTime<Utc>,
    pub is_required: bool,
    pub is_verified: bool,
    pub notes: Option<String>,
}

/// Upload payload; the service stamps id, uploader and time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NewDocument {
    pub name: String,
    pub document_type: DocumentType,
    pub file_name: String,
    pub file_url: String,
    pub mime_type: Option<String>,
    pub file_size: Option<i64>,
    #[serde(default)]
    pub is_required: bool,
    pub notes: Option<String>,
}

impl NewDocument {
    pub fn into_document(self, uploaded_by: Uuid) -> ApplicationDocument {
        ApplicationDocument {
            id: Uuid::new_v4(),
            name: self.name,
            document_type: self.document_type,
            file_name: self.file_name,
            file_url: self.file_url,
            mime_type: self.mime_type,
            file_size: self.file_size,
            uploaded_by,
            uploaded_at: Utc::now(),
            is_required: self.is_required,
            is_verified: false,
            notes: self.notes,
        }
    }
}

/// Applicant-supplied content for a new application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApplicationDraft {
    pub personal_info: Option<PersonalInfo>,
    pub financial_info: Option<FinancialInfo>,
    pub business_info: Option<BusinessInfo>,
    pub motivation: Option<String>,
    pub questions: Option<String>,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[schema(value_type = Option<String>)]
    pub application_fee: Option<BigDecimal>,
}

/// Partial update; `None` leaves the stored section untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApplicationPatch {
    pub personal_info: Option<PersonalInfo>,
    pub financial_info: Option<FinancialInfo>,
    pub business_info: Option<BusinessInfo>,
    pub motivation: Option<String>,
    pub questions: Option<String>,
    pub references: Option<Vec<Reference>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Application {
    pub id: Uuid,
    pub franchise_id: Uuid,
    pub franchise_name: String,
    pub applicant_id: Uuid,
    pub applicant_name: String,
    pub applicant_email: String,
    pub status: ApplicationStatus,
    pub personal_info: Option<PersonalInfo>,
    pub financial_info: Option<FinancialInfo>,
    pub business_info: Option<BusinessInfo>,
    pub motivation: Option<String>,
    pub questions: Option<String>,
    pub references: Vec<Reference>,
    pub documents: Vec<ApplicationDocument>,
    #[schema(value_type = String)]
    pub application_fee: BigDecimal,
    pub payment_status: PaymentStatus,
    pub payment_transaction_id: Option<Uuid>,
    pub paid_at: Option<DateTime<Utc>>,
    pub review_notes: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Application {
    /// Build a fresh application under review with payment pending.
    pub fn from_draft(
        draft: ApplicationDraft,
        applicant: &User,
        franchise: &Franchise,
        default_fee: &BigDecimal,
    ) -> Self {
        let now = Utc::now();
        let mut business_info = draft.business_info.unwrap_or_default();
        if business_info.preferred_states.is_none() {
            business_info.preferred_states = Some(Vec::new());
        }

        Self {
            id: Uuid::new_v4(),
            franchise_id: franchise.id,
            franchise_name: franchise.name.clone(),
            applicant_id: applicant.id,
            applicant_name: applicant.full_name(),
            applicant_email: applicant.email.clone(),
            status: ApplicationStatus::UnderReview,
            personal_info: draft.personal_info,
            financial_info: draft.financial_info,
            business_info: Some(business_info),
            motivation: draft.motivation,
            questions: draft.questions,
            references: draft.references,
            documents: Vec::new(),
            application_fee: draft.application_fee.unwrap_or_else(|| default_fee.clone()),
            payment_status: PaymentStatus::Pending,
            payment_transaction_id: None,
            paid_at: None,
            review_notes: None,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
            submitted_at: now,
            updated_at: now,
            is_active: true,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.applicant_id == user_id
    }

    /// Merge a partial update section by section.
    ///
    /// The nested address, preferred location and preferred states count as
    /// sections of their own: a patch that carries personal or business info
    /// without them keeps the stored values.
    pub fn apply_patch(&mut self, patch: ApplicationPatch) {
        if let Some(mut personal) = patch.personal_info {
            if personal.address.is_none() {
                personal.address = self
                    .personal_info
                    .as_ref()
                    .and_then(|stored| stored.address.clone());
            }
            self.personal_info = Some(personal);
        }

        if let Some(financial) = patch.financial_info {
            self.financial_info = Some(financial);
        }

        if let Some(mut business) = patch.business_info {
            let stored = self.business_info.take().unwrap_or_default();
            if business.preferred_location.is_none() {
                business.preferred_location = stored.preferred_location;
            }
            if business.preferred_states.is_none() {
                business.preferred_states = stored.preferred_states;
            }
            self.business_info = Some(business);
        }

        if let Some(references) = patch.references {
            self.references = references;
        }
        if patch.motivation.is_some() {
            self.motivation = patch.motivation;
        }
        if patch.questions.is_some() {
            self.questions = patch.questions;
        }

        self.updated_at = Utc::now();
    }

    /// Completeness check run before an applicant confirms submission.
    pub fn missing_submission_section(&self) -> Option<&'static str> {
        let Some(personal) = self.personal_info.as_ref() else {
            return Some("Personal information is required");
        };
        if self.financial_info.is_none() {
            return Some("Financial information is required");
        }
        if personal.address.is_none() {
            return Some("Personal address is required");
        }
        let has_location = self
            .business_info
            .as_ref()
            .and_then(|business| business.preferred_location.as_ref())
            .is_some();
        if !has_location {
            return Some("Preferred location is required");
        }
        None
    }

    pub fn record_review(
        &mut self,
        status: ApplicationStatus,
        reviewer_id: Uuid,
        notes: Option<String>,
        rejection_reason: Option<String>,
    ) {
        let now = Utc::now();
        self.status = status;
        self.review_notes = notes;
        self.rejection_reason = rejection_reason;
        self.reviewed_by = Some(reviewer_id);
        self.reviewed_at = Some(now);
        self.updated_at = now;
    }

    pub fn mark_paid(&mut self, transaction_id: Uuid, paid_at: DateTime<Utc>) {
        self.payment_transaction_id = Some(transaction_id);
        self.payment_status = PaymentStatus::Paid;
        self.paid_at = Some(paid_at);
        self.updated_at = paid_at;
    }
}
