use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::domain::{
    Address, Application, ApplicationDocument, ApplicationDraft, ApplicationPatch,
    ApplicationStatus, BusinessInfo, DocumentType, FinancialInfo, NewDocument, Notification,
    NotificationType, PaymentDetails, PaymentMethod, PaymentRequest, PaymentRequestDraft,
    PaymentRequestStatus, PaymentRequestType, PaymentStatus, PaymentTransaction, PersonalInfo,
    Reference, ReferenceType, TransactionDraft, TransactionStatus, TransactionType,
};
use crate::handlers::{applications, notifications, payments, HealthStatus};
use crate::services::{ApplicationStats, PaymentStats, RequestSettlement};

/// Documents the `x-user-id` caller header.
struct CallerHeaderAddon;

impl Modify for CallerHeaderAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "caller",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "x-user-id",
                "Caller email or user id, set by the upstream gateway",
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&CallerHeaderAddon),
    info(
        title = "Franchise Hub API",
        description = "Franchise applications and payment settlement"
    ),
    paths(
        crate::handlers::health,
        applications::create_application,
        applications::list_my_applications,
        applications::list_received_applications,
        applications::list_franchise_applications,
        applications::get_application,
        applications::update_application,
        applications::submit_application,
        applications::approve_application,
        applications::reject_application,
        applications::review_application,
        applications::withdraw_application,
        applications::list_documents,
        applications::upload_document,
        applications::delete_document,
        applications::application_stats,
        payments::pay_application_fee,
        payments::create_transaction,
        payments::list_transactions,
        payments::get_transaction,
        payments::update_transaction_status,
        payments::create_payment_request,
        payments::list_payment_requests,
        payments::get_payment_request,
        payments::pay_payment_request,
        payments::cancel_payment_request,
        payments::payment_stats,
        notifications::list_notifications,
        notifications::mark_read,
    ),
    components(schemas(
        HealthStatus,
        Address,
        PersonalInfo,
        FinancialInfo,
        BusinessInfo,
        Reference,
        ReferenceType,
        DocumentType,
        ApplicationDocument,
        NewDocument,
        ApplicationDraft,
        ApplicationPatch,
        Application,
        ApplicationStatus,
        PaymentStatus,
        ApplicationStats,
        applications::ApproveRequest,
        applications::RejectRequest,
        applications::ReviewRequest,
        TransactionType,
        TransactionStatus,
        PaymentMethod,
        PaymentDetails,
        TransactionDraft,
        PaymentTransaction,
        PaymentRequestType,
        PaymentRequestStatus,
        PaymentRequestDraft,
        PaymentRequest,
        RequestSettlement,
        PaymentStats,
        payments::PayRequest,
        payments::StatusUpdateRequest,
        NotificationType,
        Notification,
    )),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Applications", description = "Application lifecycle"),
        (name = "Payments", description = "Transactions and payment requests"),
        (name = "Notifications", description = "Lifecycle notifications")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_core_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/applications/{id}/approve"));
        assert!(paths.contains_key("/payments/requests/{id}/pay"));
        assert!(paths.contains_key("/notifications/{id}/read"));
    }
}
