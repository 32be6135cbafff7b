//! Store and disk failures in the middle of multi-step transitions
//!
//! Run with: cargo test -p integration-tests --test fault_tests

use std::path::Path;

use funnel_core::{
    Language, PaymentMethod, PaymentStatus, PlanDuration, ServiceKey, SubscriptionStatus, UserId,
};
use funnel_service::i18n::t;
use funnel_service::{ChoiceTag, StepKind};
use integration_tests::{receipts_dir, test_config, Fault, TestBot, ADMIN};

fn en(key: &str) -> String {
    t(Language::En, key)
}

fn files_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).map_or(0, Iterator::count)
}

/// Registered user sitting on the payment-method step
async fn at_payment_step(bot: &TestBot, id: i64, name: &str) -> UserId {
    let user = bot.seed_user(id, name, None).await.id;
    let service = ServiceKey::VipSignals;
    bot.press(user, ChoiceTag::BrowseServices).await;
    bot.press(user, ChoiceTag::SelectService(service)).await;
    bot.press(user, ChoiceTag::Duration(PlanDuration::OneMonth, service))
        .await;
    user
}

// ============================================================================
// Receipt upload
// ============================================================================

#[tokio::test]
async fn test_unwritable_receipt_root_leaves_no_payment() {
    // A plain file where the directory should be
    let root = receipts_dir();
    std::fs::write(&root, b"not a directory").unwrap();
    let bot = TestBot::with_config(test_config(&[(
        "RECEIPTS_DIR",
        root.to_str().unwrap(),
    )]));
    let user = bot.seed_user(5001, "Dawit", None).await.id;

    bot.choose_plan(
        user,
        ServiceKey::VipSignals,
        PlanDuration::OneMonth,
        PaymentMethod::Cbe,
    )
    .await;
    bot.upload_photo(user).await;

    assert_eq!(bot.transport.last_to(user).unwrap().text, en("error_general"));
    assert!(bot.store.all_payments().is_empty());
    assert!(bot.transport.texts_to(ADMIN).is_empty());
    assert_eq!(
        bot.session(user).await.map(|s| s.kind()),
        Some(StepKind::WaitingReceipt)
    );

    // Storage repaired: the same upload now goes through exactly once
    std::fs::remove_file(&root).unwrap();
    bot.upload_photo(user).await;

    let payments = bot.store.all_payments();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].status, PaymentStatus::Pending);
    assert!(Path::new(payments[0].receipt_path.as_deref().unwrap()).exists());
    assert_eq!(files_in(&root), 1);
    assert!(bot.session(user).await.is_none());
}

#[tokio::test]
async fn test_failed_payment_insert_discards_receipt_file() {
    let bot = TestBot::new();
    let root = bot.config.bot.receipts_dir.clone();
    let user = bot.seed_user(5002, "Eden", None).await.id;

    bot.choose_plan(
        user,
        ServiceKey::Mentorship,
        PlanDuration::OneMonth,
        PaymentMethod::Telebirr,
    )
    .await;
    bot.store.fail_next(Fault::CreatePayment);
    bot.upload_photo(user).await;

    assert_eq!(bot.transport.last_to(user).unwrap().text, en("error_general"));
    assert!(bot.store.all_payments().is_empty());
    assert_eq!(files_in(&root), 0);
    assert_eq!(
        bot.session(user).await.map(|s| s.kind()),
        Some(StepKind::WaitingReceipt)
    );

    bot.upload_photo(user).await;

    let payments = bot.store.all_payments();
    assert_eq!(payments.len(), 1);
    assert_eq!(files_in(&root), 1);
    assert!(payments[0]
        .receipt_path
        .as_deref()
        .unwrap()
        .contains(&format!("receipt_{user}_{}_", payments[0].id)));
}

// ============================================================================
// Approval
// ============================================================================

#[tokio::test]
async fn test_failed_activation_leaves_payment_pending() {
    let bot = TestBot::new();
    let user = bot.seed_user(5003, "Feven", Some("feven@example.com")).await.id;
    let payment_id = bot
        .submit_payment(user, ServiceKey::VipSignals, PlanDuration::OneMonth)
        .await;
    bot.transport.clear();

    bot.store.fail_next(Fault::ActivateSubscription);
    bot.press(ADMIN, ChoiceTag::ApprovePayment(payment_id)).await;

    assert_eq!(bot.transport.last_to(ADMIN).unwrap().text, en("error_general"));
    let payment = bot.store.all_payments().remove(0);
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert!(payment.verified_by.is_none());
    assert_eq!(
        bot.store.all_subscriptions()[0].status,
        SubscriptionStatus::Pending
    );
    assert!(bot.transport.texts_to(user).is_empty());
    assert!(bot.mailer.sent_to("feven@example.com").is_empty());

    // A second press completes the approval
    bot.press(ADMIN, ChoiceTag::ApprovePayment(payment_id)).await;

    let payment = bot.store.all_payments().remove(0);
    assert_eq!(payment.status, PaymentStatus::Approved);
    let subscription = bot.store.all_subscriptions().remove(0);
    assert_eq!(subscription.status, SubscriptionStatus::Active);
    assert_eq!(subscription.start_date, payment.verified_at);
    assert!(bot
        .transport
        .texts_to(user)
        .iter()
        .any(|t| t.contains("Payment approved")));
}

// ============================================================================
// Payment method selection
// ============================================================================

#[tokio::test]
async fn test_failed_subscription_insert_keeps_method_step() {
    let bot = TestBot::new();
    let user = at_payment_step(&bot, 5004, "Genet").await;

    bot.store.fail_next(Fault::CreateSubscription);
    bot.press(user, ChoiceTag::Payment(PaymentMethod::Cbe)).await;

    assert_eq!(bot.transport.last_to(user).unwrap().text, en("error_general"));
    assert!(bot.store.all_subscriptions().is_empty());
    assert_eq!(
        bot.session(user).await.map(|s| s.kind()),
        Some(StepKind::SelectingPayment)
    );

    bot.press(user, ChoiceTag::Payment(PaymentMethod::Cbe)).await;
    assert_eq!(bot.store.all_subscriptions().len(), 1);
    assert_eq!(
        bot.session(user).await.map(|s| s.kind()),
        Some(StepKind::WaitingReceipt)
    );
}

#[tokio::test]
async fn test_failed_session_write_abandons_pending_subscription() {
    let bot = TestBot::new();
    let user = at_payment_step(&bot, 5005, "Hirut").await;

    bot.store.fail_next(Fault::WriteSession);
    bot.press(user, ChoiceTag::Payment(PaymentMethod::Cbe)).await;

    assert_eq!(bot.transport.last_to(user).unwrap().text, en("error_general"));
    assert_eq!(
        bot.session(user).await.map(|s| s.kind()),
        Some(StepKind::SelectingPayment)
    );
    let abandoned = bot.store.all_subscriptions().remove(0);
    assert_eq!(abandoned.status, SubscriptionStatus::Pending);

    // Retrying opens a fresh order; the abandoned row never gets a payment
    bot.press(user, ChoiceTag::Payment(PaymentMethod::Cbe)).await;
    bot.upload_photo(user).await;

    let subscriptions = bot.store.all_subscriptions();
    assert_eq!(subscriptions.len(), 2);
    let payments = bot.store.all_payments();
    assert_eq!(payments.len(), 1);
    assert_ne!(payments[0].subscription_id, abandoned.id);

    bot.press(ADMIN, ChoiceTag::ApprovePayment(payments[0].id)).await;
    let statuses: Vec<_> = bot
        .store
        .all_subscriptions()
        .into_iter()
        .map(|s| (s.id, s.status))
        .collect();
    assert!(statuses.contains(&(abandoned.id, SubscriptionStatus::Pending)));
    assert!(statuses.contains(&(payments[0].subscription_id, SubscriptionStatus::Active)));
}
