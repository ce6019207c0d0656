//! Application lifecycle: creation, applicant edits, submission, review,
//! withdrawal and supporting documents.
//!
//! Status and payment status move independently; payment is settled by
//! [`crate::services::PaymentService`].

use std::sync::Arc;

use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::config::PaymentSettings;
use crate::domain::{
    Application, ApplicationDocument, ApplicationDraft, ApplicationPatch, ApplicationStatus,
    Franchise, NewDocument, NotificationType, User, UserRole,
};
use crate::error::AppError;
use crate::ports::{ApplicationRepository, FranchiseRepository, Repositories};
use crate::services::identity::IdentityResolver;
use crate::services::notifications::NotificationDispatcher;
use crate::validation::{sanitize_string, validate_positive_amount, validate_reason};

#[derive(Clone)]
pub struct ApplicationService {
    applications: Arc<dyn ApplicationRepository>,
    franchises: Arc<dyn FranchiseRepository>,
    identity: IdentityResolver,
    notifier: NotificationDispatcher,
    default_fee: BigDecimal,
}

impl ApplicationService {
    pub fn new(
        repos: &Repositories,
        notifier: NotificationDispatcher,
        settings: &PaymentSettings,
    ) -> Self {
        Self {
            applications: repos.applications.clone(),
            franchises: repos.franchises.clone(),
            identity: IdentityResolver::new(repos.users.clone()),
            notifier,
            default_fee: settings.default_application_fee.clone(),
        }
    }

    pub async fn create_application(
        &self,
        draft: ApplicationDraft,
        applicant_identifier: &str,
        franchise_id: Uuid,
    ) -> Result<Application, AppError> {
        tracing::debug!(franchise_id = %franchise_id, "Creating application");

        if let Some(fee) = draft.application_fee.as_ref() {
            validate_positive_amount(fee)?;
        }

        let applicant = self
            .identity
            .resolve_or_register_partner(applicant_identifier, draft.personal_info.as_ref())
            .await?;
        if applicant.role != UserRole::Partner {
            return Err(AppError::RoleMismatch(format!(
                "Only partners can apply for franchises, user has role {}",
                applicant.role
            )));
        }

        let franchise = self.load_franchise(franchise_id).await?;
        if !franchise.accepts_applications() {
            return Err(AppError::InvalidState(format!(
                "Franchise {} is not accepting applications (status {})",
                franchise.name, franchise.status
            )));
        }

        let existing = self
            .applications
            .find_active(applicant.id, franchise.id)
            .await?;
        if !existing.is_empty() {
            return Err(AppError::Conflict(
                "You already have an active application for this franchise".to_string(),
            ));
        }

        let application = Application::from_draft(draft, &applicant, &franchise, &self.default_fee);
        let application = self.applications.insert(&application).await?;

        tracing::info!(
            application_id = %application.id,
            applicant_id = %applicant.id,
            franchise_id = %franchise.id,
            "Application created"
        );

        self.notifier
            .notify(
                franchise.business_owner_id,
                NotificationType::ApplicationUpdate,
                "New Franchise Application",
                &format!(
                    "{} has applied for {}",
                    application.applicant_name, franchise.name
                ),
                Some(application.id),
            )
            .await;

        Ok(application)
    }

    pub async fn get_application(&self, id: Uuid) -> Result<Application, AppError> {
        self.load_application(id).await
    }

    pub async fn update_application(
        &self,
        id: Uuid,
        patch: ApplicationPatch,
        applicant_id: Uuid,
    ) -> Result<Application, AppError> {
        let mut application = self.load_owned(id, applicant_id).await?;

        if application.status.is_decided() {
            return Err(AppError::InvalidState(format!(
                "Cannot update an application that is {}",
                application.status
            )));
        }

        application.apply_patch(patch);
        let application = self.applications.update(&application).await?;
        tracing::info!(application_id = %id, "Application updated");
        Ok(application)
    }

    /// Confirm a complete application. The status stays UNDER_REVIEW.
    pub async fn submit_application(
        &self,
        id: Uuid,
        applicant_id: Uuid,
    ) -> Result<Application, AppError> {
        let mut application = self.load_owned(id, applicant_id).await?;

        if application.status != ApplicationStatus::UnderReview {
            return Err(AppError::InvalidState(format!(
                "Only applications under review can be submitted, status is {}",
                application.status
            )));
        }
        if let Some(missing) = application.missing_submission_section() {
            return Err(AppError::InvalidState(missing.to_string()));
        }

        let now = chrono::Utc::now();
        application.submitted_at = now;
        application.updated_at = now;

        let application = self.applications.update(&application).await?;
        tracing::info!(application_id = %id, "Application submitted");
        Ok(application)
    }

    /// Generic review. Only applications awaiting a decision can be reviewed.
    pub async fn review_application(
        &self,
        id: Uuid,
        new_status: ApplicationStatus,
        notes: Option<String>,
        reviewer_id: Uuid,
    ) -> Result<Application, AppError> {
        if !matches!(
            new_status,
            ApplicationStatus::UnderReview | ApplicationStatus::Approved | ApplicationStatus::Rejected
        ) {
            return Err(AppError::Validation(format!(
                "status: review cannot move an application to {}",
                new_status
            )));
        }

        let mut application = self.load_application(id).await?;
        let reviewer = self.authorize_reviewer(&application, reviewer_id).await?;

        if !application.status.is_reviewable() {
            return Err(AppError::InvalidState(format!(
                "Application with status {} cannot be reviewed",
                application.status
            )));
        }

        let notes = notes.map(|n| sanitize_string(&n));
        application.record_review(new_status, reviewer.id, notes, None);
        let application = self.applications.update(&application).await?;

        tracing::info!(
            application_id = %id,
            reviewer_id = %reviewer.id,
            status = %new_status,
            "Application reviewed"
        );

        if new_status.is_decided() {
            self.notify_decision(&application).await;
        }

        Ok(application)
    }

    pub async fn approve_application(
        &self,
        id: Uuid,
        comments: Option<String>,
        reviewer_id: Uuid,
    ) -> Result<Application, AppError> {
        let mut application = self.load_application(id).await?;
        let reviewer = self.authorize_reviewer(&application, reviewer_id).await?;

        application.record_review(ApplicationStatus::Approved, reviewer.id, comments, None);
        let application = self.applications.update(&application).await?;

        tracing::info!(application_id = %id, reviewer_id = %reviewer.id, "Application approved");
        self.notify_decision(&application).await;
        Ok(application)
    }

    pub async fn reject_application(
        &self,
        id: Uuid,
        reason: &str,
        reviewer_id: Uuid,
    ) -> Result<Application, AppError> {
        let reason = validate_reason(reason)?;
        let mut application = self.load_application(id).await?;
        let reviewer = self.authorize_reviewer(&application, reviewer_id).await?;

        application.record_review(ApplicationStatus::Rejected, reviewer.id, None, Some(reason));
        let application = self.applications.update(&application).await?;

        tracing::info!(application_id = %id, reviewer_id = %reviewer.id, "Application rejected");
        self.notify_decision(&application).await;
        Ok(application)
    }

    pub async fn withdraw_application(
        &self,
        id: Uuid,
        applicant_id: Uuid,
    ) -> Result<Application, AppError> {
        let mut application = self.load_owned(id, applicant_id).await?;

        if !application.status.can_withdraw() {
            return Err(AppError::InvalidState(format!(
                "Cannot withdraw an application that is {}",
                application.status
            )));
        }

        application.status = ApplicationStatus::Withdrawn;
        application.is_active = false;
        application.updated_at = chrono::Utc::now();

        let application = self.applications.update(&application).await?;
        tracing::info!(application_id = %id, "Application withdrawn");
        Ok(application)
    }

    pub async fn upload_document(
        &self,
        application_id: Uuid,
        document: NewDocument,
        user_id: Uuid,
    ) -> Result<ApplicationDocument, AppError> {
        let mut application = self.load_owned(application_id, user_id).await?;

        let document = document.into_document(user_id);
        application.documents.push(document.clone());
        application.updated_at = chrono::Utc::now();
        self.applications.update(&application).await?;

        tracing::info!(
            application_id = %application_id,
            document_id = %document.id,
            "Document uploaded"
        );
        Ok(document)
    }

    /// Remove a document by id. Unknown ids leave the application untouched.
    pub async fn delete_document(
        &self,
        application_id: Uuid,
        document_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        let mut application = self.load_owned(application_id, user_id).await?;

        let before = application.documents.len();
        application.documents.retain(|doc| doc.id != document_id);
        if application.documents.len() == before {
            tracing::debug!(application_id = %application_id, document_id = %document_id, "No document to delete");
            return Ok(());
        }

        application.updated_at = chrono::Utc::now();
        self.applications.update(&application).await?;
        tracing::info!(application_id = %application_id, document_id = %document_id, "Document deleted");
        Ok(())
    }

    pub async fn list_documents(
        &self,
        application_id: Uuid,
    ) -> Result<Vec<ApplicationDocument>, AppError> {
        Ok(self.load_application(application_id).await?.documents)
    }

    pub async fn list_by_applicant(
        &self,
        applicant_identifier: &str,
    ) -> Result<Vec<Application>, AppError> {
        let applicant = self.identity.resolve(applicant_identifier).await?;
        Ok(self.applications.list_by_applicant(applicant.id).await?)
    }

    pub async fn list_by_franchise(&self, franchise_id: Uuid) -> Result<Vec<Application>, AppError> {
        Ok(self.applications.list_by_franchise(franchise_id).await?)
    }

    pub async fn list_for_business_owner(
        &self,
        owner_identifier: &str,
    ) -> Result<Vec<Application>, AppError> {
        let owner = self.identity.resolve(owner_identifier).await?;
        Ok(self.applications.list_for_business_owner(owner.id).await?)
    }

    /// Whether the identified user submitted the application. Lookup
    /// failures deny access.
    pub async fn is_application_owner(&self, application_id: Uuid, user_identifier: &str) -> bool {
        match self.check_applicant(application_id, user_identifier).await {
            Ok(allowed) => {
                tracing::debug!(application_id = %application_id, allowed, "Applicant ownership check");
                allowed
            }
            Err(e) => {
                tracing::warn!(
                    application_id = %application_id,
                    outcome = "lookup_error",
                    error = %e,
                    "Applicant ownership check failed, denying"
                );
                false
            }
        }
    }

    /// Whether the identified user owns the franchise applied for. Lookup
    /// failures deny access.
    pub async fn is_application_business_owner(
        &self,
        application_id: Uuid,
        user_identifier: &str,
    ) -> bool {
        match self.check_business_owner(application_id, user_identifier).await {
            Ok(allowed) => {
                tracing::debug!(application_id = %application_id, allowed, "Business ownership check");
                allowed
            }
            Err(e) => {
                tracing::warn!(
                    application_id = %application_id,
                    outcome = "lookup_error",
                    error = %e,
                    "Business ownership check failed, denying"
                );
                false
            }
        }
    }

    async fn check_applicant(
        &self,
        application_id: Uuid,
        user_identifier: &str,
    ) -> Result<bool, AppError> {
        let Some(application) = self.applications.find_by_id(application_id).await? else {
            return Ok(false);
        };
        let Some(user) = self.identity.find(user_identifier).await? else {
            return Ok(false);
        };
        Ok(application.is_owned_by(user.id))
    }

    async fn check_business_owner(
        &self,
        application_id: Uuid,
        user_identifier: &str,
    ) -> Result<bool, AppError> {
        let Some(application) = self.applications.find_by_id(application_id).await? else {
            return Ok(false);
        };
        let Some(user) = self.identity.find(user_identifier).await? else {
            return Ok(false);
        };
        let Some(franchise) = self.franchises.find_by_id(application.franchise_id).await? else {
            return Ok(false);
        };
        Ok(franchise.is_owned_by(user.id))
    }

    async fn load_application(&self, id: Uuid) -> Result<Application, AppError> {
        self.applications
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Application not found: {}", id)))
    }

    async fn load_owned(&self, id: Uuid, applicant_id: Uuid) -> Result<Application, AppError> {
        let application = self.load_application(id).await?;
        if !application.is_owned_by(applicant_id) {
            return Err(AppError::Forbidden(
                "You can only modify your own applications".to_string(),
            ));
        }
        Ok(application)
    }

    async fn load_franchise(&self, id: Uuid) -> Result<Franchise, AppError> {
        self.franchises
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Franchise not found: {}", id)))
    }

    /// Admins review anything; business users only their own franchises.
    async fn authorize_reviewer(
        &self,
        application: &Application,
        reviewer_id: Uuid,
    ) -> Result<User, AppError> {
        let reviewer = self.identity.resolve_id(reviewer_id).await?;

        match reviewer.role {
            UserRole::Admin => Ok(reviewer),
            UserRole::Business => {
                let franchise = self.load_franchise(application.franchise_id).await?;
                if franchise.is_owned_by(reviewer.id) {
                    Ok(reviewer)
                } else {
                    Err(AppError::Forbidden(
                        "You can only review applications for your own franchises".to_string(),
                    ))
                }
            }
            UserRole::Partner => Err(AppError::Forbidden(
                "Only admins and franchise owners can review applications".to_string(),
            )),
        }
    }

    async fn notify_decision(&self, application: &Application) {
        let (title, message) = match application.status {
            ApplicationStatus::Approved => (
                "Application Approved",
                format!(
                    "Your application for {} has been approved",
                    application.franchise_name
                ),
            ),
            _ => (
                "Application Rejected",
                format!(
                    "Your application for {} has been rejected",
                    application.franchise_name
                ),
            ),
        };

        self.notifier
            .notify(
                application.applicant_id,
                NotificationType::ApplicationUpdate,
                title,
                &message,
                Some(application.id),
            )
            .await;
    }
}
