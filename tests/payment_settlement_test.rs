mod common;

use chrono::{Duration, Utc};
use common::{complete_draft, dec, TestHub};
use franchise_hub_core::domain::{
    ApplicationDraft, ApplicationStatus, Franchise, FranchiseStatus, PaymentMethod,
    PaymentRequestDraft, PaymentRequestStatus, PaymentRequestType, PaymentStatus,
    TransactionDraft, TransactionStatus, TransactionType, User, UserRole,
};
use franchise_hub_core::error::AppError;
use franchise_hub_core::services::SimulatedGateway;
use uuid::Uuid;

fn request_draft(to: &User, franchise: &Franchise, amount: &str) -> PaymentRequestDraft {
    PaymentRequestDraft {
        to_user_id: to.id,
        franchise_id: franchise.id,
        application_id: None,
        request_type: PaymentRequestType::RoyaltyPayment,
        amount: dec(amount),
        currency: None,
        title: "Q3 royalty".to_string(),
        description: Some("July to September".to_string()),
        notes: None,
        due_date: None,
    }
}

fn transaction_draft(franchise: &Franchise, amount: &str) -> TransactionDraft {
    TransactionDraft {
        franchise_id: franchise.id,
        application_id: None,
        payment_request_id: None,
        transaction_type: TransactionType::MarketingFee,
        method: PaymentMethod::NetBanking,
        amount: dec(amount),
        currency: None,
        description: None,
        status: None,
        gateway_order_id: None,
    }
}

async fn request_status(hub: &TestHub, id: Uuid) -> PaymentRequestStatus {
    hub.services
        .payments
        .get_payment_request(id)
        .await
        .unwrap()
        .status
}

#[tokio::test]
async fn test_application_fee_payment() {
    let hub = TestHub::new();
    let owner = hub.user("owner@example.com", UserRole::Business).await;
    let partner = hub.user("partner@example.com", UserRole::Partner).await;
    let franchise = hub.franchise(&owner, FranchiseStatus::Active).await;

    let application = hub
        .services
        .applications
        .create_application(
            ApplicationDraft {
                application_fee: Some(dec("25000")),
                ..complete_draft()
            },
            "partner@example.com",
            franchise.id,
        )
        .await
        .unwrap();

    let tx = hub
        .services
        .payments
        .process_application_fee_payment(application.id, "partner@example.com", PaymentMethod::Upi)
        .await
        .unwrap();

    assert_eq!(tx.status, TransactionStatus::Success);
    assert_eq!(tx.transaction_type, TransactionType::ApplicationFee);
    assert_eq!(tx.user_id, partner.id);
    assert_eq!(tx.amount, dec("25000"));
    assert_eq!(tx.platform_fee, dec("500.00"));
    assert_eq!(tx.net_amount, dec("25500.00"));
    assert_eq!(tx.currency, "INR");
    assert_eq!(tx.description.as_deref(), Some("Application fee for Chai Point"));
    assert!(tx.processed_at.is_some());
    assert!(tx.gateway_order_id.starts_with("ORDER_"));

    let payment_id = tx.gateway_payment_id.clone().unwrap();
    let signature = tx.gateway_signature.clone().unwrap();
    assert!(SimulatedGateway::new("test-secret").verify(
        &tx.gateway_order_id,
        &payment_id,
        &signature
    ));
    let details = tx.payment_details.clone().unwrap();
    assert!(details.upi_id.is_some());
    assert!(details.card_last4.is_none());

    let stored = hub
        .services
        .applications
        .get_application(application.id)
        .await
        .unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Paid);
    assert_eq!(stored.payment_transaction_id, Some(tx.id));
    assert!(stored.paid_at.is_some());
    assert_eq!(stored.status, ApplicationStatus::UnderReview);

    let owner_inbox = hub
        .services
        .notifications
        .list_for_user(owner.id)
        .await
        .unwrap();
    assert!(owner_inbox
        .iter()
        .any(|n| n.title == "Application Fee Received"));

    let again = hub
        .services
        .payments
        .process_application_fee_payment(application.id, "partner@example.com", PaymentMethod::Upi)
        .await;
    assert!(matches!(again, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_fee_payment_requires_applicant() {
    let hub = TestHub::new();
    let owner = hub.user("owner@example.com", UserRole::Business).await;
    hub.user("partner@example.com", UserRole::Partner).await;
    let franchise = hub.franchise(&owner, FranchiseStatus::Active).await;

    let application = hub
        .services
        .applications
        .create_application(complete_draft(), "partner@example.com", franchise.id)
        .await
        .unwrap();

    let by_owner = hub
        .services
        .payments
        .process_application_fee_payment(application.id, "owner@example.com", PaymentMethod::Wallet)
        .await;
    assert!(matches!(by_owner, Err(AppError::Forbidden(_))));

    let by_stranger = hub
        .services
        .payments
        .process_application_fee_payment(application.id, "nobody@example.com", PaymentMethod::Wallet)
        .await;
    assert!(matches!(by_stranger, Err(AppError::NotFound(_))));

    let missing = hub
        .services
        .payments
        .process_application_fee_payment(Uuid::new_v4(), "partner@example.com", PaymentMethod::Wallet)
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let stats = hub.services.stats.payment_stats().await.unwrap();
    assert_eq!(stats.total, 0);
}

#[tokio::test]
async fn test_payment_request_lifecycle() {
    let hub = TestHub::new();
    let u1 = hub.user("u1@example.com", UserRole::Business).await;
    let u2 = hub.user("u2@example.com", UserRole::Partner).await;
    let franchise = hub.franchise(&u1, FranchiseStatus::Active).await;
    let payments = &hub.services.payments;

    let request = payments
        .create_payment_request(request_draft(&u2, &franchise, "30000"), u1.id)
        .await
        .unwrap();
    assert_eq!(request.status, PaymentRequestStatus::Pending);
    assert_eq!(request.currency, "INR");

    let u2_inbox = hub.services.notifications.list_for_user(u2.id).await.unwrap();
    assert_eq!(u2_inbox.len(), 1);
    assert_eq!(u2_inbox[0].title, "Payment Request: Q3 royalty");

    assert_eq!(payments.list_sent_requests(u1.id).await.unwrap().len(), 1);
    assert_eq!(payments.list_received_requests(u2.id).await.unwrap().len(), 1);
    assert!(payments.list_received_requests(u1.id).await.unwrap().is_empty());

    let by_sender = payments
        .pay_payment_request(request.id, u1.id, PaymentMethod::CreditCard)
        .await;
    assert!(matches!(by_sender, Err(AppError::Forbidden(_))));

    let settlement = payments
        .pay_payment_request(request.id, u2.id, PaymentMethod::CreditCard)
        .await
        .unwrap();
    assert_eq!(settlement.request.status, PaymentRequestStatus::Paid);
    assert_eq!(settlement.request.payment_method, Some(PaymentMethod::CreditCard));
    assert_eq!(
        settlement.request.payment_transaction_id,
        Some(settlement.transaction.id)
    );
    assert_eq!(settlement.transaction.transaction_type, TransactionType::RoyaltyPayment);
    assert_eq!(settlement.transaction.status, TransactionStatus::Success);
    assert_eq!(settlement.transaction.user_id, u2.id);
    assert_eq!(
        settlement.transaction.description.as_deref(),
        Some("Q3 royalty: July to September")
    );
    assert_eq!(
        settlement
            .transaction
            .payment_details
            .as_ref()
            .and_then(|d| d.card_type.as_deref()),
        Some("CREDIT")
    );

    let linked = payments.list_request_transactions(request.id).await.unwrap();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].id, settlement.transaction.id);

    let u1_inbox = hub.services.notifications.list_for_user(u1.id).await.unwrap();
    assert!(u1_inbox.iter().any(|n| n.title == "Payment Received"));

    let pay_twice = payments
        .pay_payment_request(request.id, u2.id, PaymentMethod::CreditCard)
        .await;
    assert!(matches!(pay_twice, Err(AppError::Conflict(_))));

    let cancel_paid = payments.cancel_payment_request(request.id, u1.id).await;
    assert!(matches!(cancel_paid, Err(AppError::Conflict(_))));
    assert_eq!(payments.list_request_transactions(request.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_cancelled_request_cannot_be_paid() {
    let hub = TestHub::new();
    let u1 = hub.user("u1@example.com", UserRole::Business).await;
    let u2 = hub.user("u2@example.com", UserRole::Partner).await;
    let franchise = hub.franchise(&u1, FranchiseStatus::Active).await;
    let payments = &hub.services.payments;

    let request = payments
        .create_payment_request(request_draft(&u2, &franchise, "1200"), u1.id)
        .await
        .unwrap();

    let by_recipient = payments.cancel_payment_request(request.id, u2.id).await;
    assert!(matches!(by_recipient, Err(AppError::Forbidden(_))));

    let cancelled = payments
        .cancel_payment_request(request.id, u1.id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, PaymentRequestStatus::Cancelled);

    let pay = payments
        .pay_payment_request(request.id, u2.id, PaymentMethod::Upi)
        .await;
    assert!(matches!(pay, Err(AppError::InvalidState(_))));

    let cancel_again = payments.cancel_payment_request(request.id, u1.id).await;
    assert!(matches!(cancel_again, Err(AppError::Conflict(_))));
    assert!(payments
        .list_request_transactions(request.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_request_type_without_transaction_type() {
    let hub = TestHub::new();
    let u1 = hub.user("u1@example.com", UserRole::Business).await;
    let u2 = hub.user("u2@example.com", UserRole::Partner).await;
    let franchise = hub.franchise(&u1, FranchiseStatus::Active).await;
    let payments = &hub.services.payments;

    let request = payments
        .create_payment_request(
            PaymentRequestDraft {
                request_type: PaymentRequestType::SetupFee,
                ..request_draft(&u2, &franchise, "8000")
            },
            u1.id,
        )
        .await
        .unwrap();

    let result = payments
        .pay_payment_request(request.id, u2.id, PaymentMethod::Upi)
        .await;
    assert!(matches!(result, Err(AppError::Internal(_))));

    let stored = payments.get_payment_request(request.id).await.unwrap();
    assert_eq!(stored.status, PaymentRequestStatus::Pending);
    assert_eq!(hub.services.stats.payment_stats().await.unwrap().total, 0);
}

#[tokio::test]
async fn test_payment_request_validation() {
    let hub = TestHub::new();
    let u1 = hub.user("u1@example.com", UserRole::Business).await;
    let u2 = hub.user("u2@example.com", UserRole::Partner).await;
    let franchise = hub.franchise(&u1, FranchiseStatus::Active).await;
    let payments = &hub.services.payments;

    let zero = payments
        .create_payment_request(request_draft(&u2, &franchise, "0"), u1.id)
        .await;
    assert!(matches!(zero, Err(AppError::Validation(_))));

    let blank_title = payments
        .create_payment_request(
            PaymentRequestDraft {
                title: "   ".to_string(),
                ..request_draft(&u2, &franchise, "100")
            },
            u1.id,
        )
        .await;
    assert!(matches!(blank_title, Err(AppError::Validation(_))));

    let bad_currency = payments
        .create_payment_request(
            PaymentRequestDraft {
                currency: Some("rupees".to_string()),
                ..request_draft(&u2, &franchise, "100")
            },
            u1.id,
        )
        .await;
    assert!(matches!(bad_currency, Err(AppError::Validation(_))));

    let unknown_recipient = payments
        .create_payment_request(
            PaymentRequestDraft {
                to_user_id: Uuid::new_v4(),
                ..request_draft(&u2, &franchise, "100")
            },
            u1.id,
        )
        .await;
    assert!(matches!(unknown_recipient, Err(AppError::NotFound(_))));

    let unknown_franchise = payments
        .create_payment_request(
            PaymentRequestDraft {
                franchise_id: Uuid::new_v4(),
                ..request_draft(&u2, &franchise, "100")
            },
            u1.id,
        )
        .await;
    assert!(matches!(unknown_franchise, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_overdue_sweep() {
    let hub = TestHub::new();
    let u1 = hub.user("u1@example.com", UserRole::Business).await;
    let u2 = hub.user("u2@example.com", UserRole::Partner).await;
    let franchise = hub.franchise(&u1, FranchiseStatus::Active).await;
    let payments = &hub.services.payments;
    let now = Utc::now();

    let late = payments
        .create_payment_request(
            PaymentRequestDraft {
                due_date: Some(now - Duration::days(3)),
                ..request_draft(&u2, &franchise, "500")
            },
            u1.id,
        )
        .await
        .unwrap();
    let upcoming = payments
        .create_payment_request(
            PaymentRequestDraft {
                due_date: Some(now + Duration::days(3)),
                ..request_draft(&u2, &franchise, "500")
            },
            u1.id,
        )
        .await
        .unwrap();
    let open_ended = payments
        .create_payment_request(request_draft(&u2, &franchise, "500"), u1.id)
        .await
        .unwrap();
    let late_but_cancelled = payments
        .create_payment_request(
            PaymentRequestDraft {
                due_date: Some(now - Duration::days(1)),
                ..request_draft(&u2, &franchise, "500")
            },
            u1.id,
        )
        .await
        .unwrap();
    payments
        .cancel_payment_request(late_but_cancelled.id, u1.id)
        .await
        .unwrap();

    assert_eq!(payments.mark_overdue_requests(now).await.unwrap(), 1);
    assert_eq!(payments.mark_overdue_requests(now).await.unwrap(), 0);

    assert_eq!(request_status(&hub, late.id).await, PaymentRequestStatus::Overdue);
    assert_eq!(request_status(&hub, upcoming.id).await, PaymentRequestStatus::Pending);
    assert_eq!(request_status(&hub, open_ended.id).await, PaymentRequestStatus::Pending);
    assert_eq!(
        request_status(&hub, late_but_cancelled.id).await,
        PaymentRequestStatus::Cancelled
    );

    // Overdue requests remain payable.
    let settlement = payments
        .pay_payment_request(late.id, u2.id, PaymentMethod::BankTransfer)
        .await
        .unwrap();
    assert_eq!(settlement.request.status, PaymentRequestStatus::Paid);
}

#[tokio::test]
async fn test_direct_transactions_and_stats() {
    let hub = TestHub::new();
    let owner = hub.user("owner@example.com", UserRole::Business).await;
    let partner = hub.user("partner@example.com", UserRole::Partner).await;
    let franchise = hub.franchise(&owner, FranchiseStatus::Active).await;
    let payments = &hub.services.payments;

    let first = payments
        .create_transaction(transaction_draft(&franchise, "1000"), partner.id)
        .await
        .unwrap();
    assert_eq!(first.status, TransactionStatus::Pending);
    assert_eq!(first.platform_fee, dec("20.00"));
    assert_eq!(first.net_amount, dec("1020.00"));
    assert!(first.processed_at.is_none());

    let second = payments
        .create_transaction(transaction_draft(&franchise, "250.50"), partner.id)
        .await
        .unwrap();
    let third = payments
        .create_transaction(transaction_draft(&franchise, "99"), partner.id)
        .await
        .unwrap();

    let settled = payments
        .update_transaction_status(
            first.id,
            TransactionStatus::Success,
            Some("GW-1".to_string()),
            None,
        )
        .await
        .unwrap();
    assert_eq!(settled.status, TransactionStatus::Success);
    assert_eq!(settled.gateway_transaction_id.as_deref(), Some("GW-1"));
    assert!(settled.processed_at.is_some());

    payments
        .update_transaction_status(second.id, TransactionStatus::Success, None, None)
        .await
        .unwrap();
    let failed = payments
        .update_transaction_status(
            third.id,
            TransactionStatus::Failed,
            None,
            Some("Card declined".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(failed.failure_reason.as_deref(), Some("Card declined"));

    // No transition table: a failed transaction can be retried.
    let retried = payments
        .update_transaction_status(third.id, TransactionStatus::Processing, None, None)
        .await
        .unwrap();
    assert_eq!(retried.status, TransactionStatus::Processing);

    let stats = hub.services.stats.payment_stats().await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.successful, 2);
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.total_amount, dec("1250.50"));

    assert_eq!(
        payments.list_transactions_for_user(partner.id).await.unwrap().len(),
        3
    );
    assert!(payments
        .list_transactions_for_user(owner.id)
        .await
        .unwrap()
        .is_empty());

    let missing = payments
        .update_transaction_status(Uuid::new_v4(), TransactionStatus::Success, None, None)
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_transaction_validation() {
    let hub = TestHub::new();
    let owner = hub.user("owner@example.com", UserRole::Business).await;
    let partner = hub.user("partner@example.com", UserRole::Partner).await;
    let franchise = hub.franchise(&owner, FranchiseStatus::Active).await;
    let payments = &hub.services.payments;

    let negative = payments
        .create_transaction(transaction_draft(&franchise, "-5"), partner.id)
        .await;
    assert!(matches!(negative, Err(AppError::Validation(_))));

    let bad_currency = payments
        .create_transaction(
            TransactionDraft {
                currency: Some("usd".to_string()),
                ..transaction_draft(&franchise, "5")
            },
            partner.id,
        )
        .await;
    assert!(matches!(bad_currency, Err(AppError::Validation(_))));

    let unknown_user = payments
        .create_transaction(transaction_draft(&franchise, "5"), Uuid::new_v4())
        .await;
    assert!(matches!(unknown_user, Err(AppError::NotFound(_))));

    let usd = payments
        .create_transaction(
            TransactionDraft {
                currency: Some("USD".to_string()),
                ..transaction_draft(&franchise, "5")
            },
            partner.id,
        )
        .await
        .unwrap();
    assert_eq!(usd.currency, "USD");
}
