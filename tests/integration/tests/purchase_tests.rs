//! Purchase flow: plan selection, payment methods and receipt upload
//!
//! Run with: cargo test -p integration-tests --test purchase_tests

use std::path::Path;

use chrono::Duration;
use funnel_core::{
    Language, Money, PaymentMethod, PaymentStatus, PlanDuration, ReferralRepository, ServiceKey,
    SubscriptionStatus, UserId,
};
use funnel_service::conversation::{BinanceRoute, Proof};
use funnel_service::i18n::t;
use funnel_service::{ChoiceTag, SessionState, StepKind};
use integration_tests::{test_config, TestBot, ADMIN, SECOND_ADMIN};

const WALLET_TX: &str = "0x9f2c4e8a1b3d5f7092c4e6a8b0d2f4a6c8e0b2d4f6a8c0e2b4d6f8a0c2e4b6d8";

fn en(key: &str) -> String {
    t(Language::En, key)
}

// ============================================================================
// Plan selection
// ============================================================================

#[tokio::test]
async fn test_purchase_scenario_bank_transfer() {
    let bot = TestBot::new();
    let user = bot.seed_user(2001, "Abel", Some("abel@example.com")).await.id;

    bot.press(user, ChoiceTag::BrowseServices).await;
    let menu = bot.transport.last_to(user).unwrap();
    assert_eq!(menu.text, en("choose_service"));
    assert!(menu
        .choices()
        .contains(&ChoiceTag::SelectService(ServiceKey::VipSignals)));

    bot.press(user, ChoiceTag::SelectService(ServiceKey::VipSignals))
        .await;
    assert!(matches!(
        bot.session(user).await,
        Some(SessionState::SelectingDuration {
            service: ServiceKey::VipSignals
        })
    ));

    bot.press(
        user,
        ChoiceTag::Duration(PlanDuration::ThreeMonths, ServiceKey::VipSignals),
    )
    .await;
    let Some(SessionState::SelectingPayment { quote }) = bot.session(user).await else {
        panic!("expected payment selection");
    };
    assert_eq!(quote.amount, Money::from_dollars(25));
    assert_eq!(quote.original_amount, Money::from_dollars(25));

    bot.press(user, ChoiceTag::Payment(PaymentMethod::Cbe)).await;
    let subscriptions = bot.store.all_subscriptions();
    assert_eq!(subscriptions.len(), 1);
    assert_eq!(subscriptions[0].status, SubscriptionStatus::Pending);
    assert_eq!(subscriptions[0].amount, Money::from_dollars(25));
    assert_eq!(subscriptions[0].duration, PlanDuration::ThreeMonths);
    assert!(subscriptions[0].expiry_date.is_none());

    let instructions = bot.transport.last_to(user).unwrap();
    assert!(instructions.text.contains("1000123456789"));
    assert!(instructions.choices().contains(&ChoiceTag::UploadReceipt));
    assert!(matches!(
        bot.session(user).await,
        Some(SessionState::WaitingReceipt { deadline: Some(_), .. })
    ));

    bot.press(user, ChoiceTag::UploadReceipt).await;
    assert_eq!(
        bot.session(user).await.map(|s| s.kind()),
        Some(StepKind::UploadingReceipt)
    );

    bot.upload_photo(user).await;

    let payments = bot.store.all_payments();
    assert_eq!(payments.len(), 1);
    let payment = &payments[0];
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.subscription_id, subscriptions[0].id);
    assert_eq!(payment.amount, Money::from_dollars(25));
    let receipt = payment.receipt_path.as_deref().expect("receipt stored");
    assert!(Path::new(receipt).exists());

    assert!(bot.session(user).await.is_none());
    assert_eq!(bot.transport.last_to(user).unwrap().text, en("payment_submitted"));

    for admin in [ADMIN, SECOND_ADMIN] {
        let alert = bot.transport.last_to(admin).expect("admin alerted");
        assert!(alert.text.contains(&format!("New payment #{}", payment.id)));
        assert!(alert.text.contains("Abel"));
        let choices = alert.choices();
        assert!(choices.contains(&ChoiceTag::ApprovePayment(payment.id)));
        assert!(choices.contains(&ChoiceTag::RejectPayment(payment.id)));
    }
}

#[tokio::test]
async fn test_discounts_reduce_quote() {
    let bot = TestBot::with_config(test_config(&[("DISCOUNT_MENTORSHIP", "10")]));
    let user = bot.seed_user(2002, "Ruth", None).await.id;

    for n in 0..100 {
        let referred = bot.seed_user(10_000 + n, "Friend", None).await.id;
        ReferralRepository::create(bot.store.as_ref(), user, referred)
            .await
            .unwrap();
        bot.store.complete_referral(referred);
    }

    bot.press(user, ChoiceTag::SelectService(ServiceKey::Mentorship))
        .await;
    bot.press(
        user,
        ChoiceTag::Duration(PlanDuration::OneMonth, ServiceKey::Mentorship),
    )
    .await;

    let Some(SessionState::SelectingPayment { quote }) = bot.session(user).await else {
        panic!("expected payment selection");
    };
    assert_eq!(quote.original_amount, Money::from_dollars(70));
    assert_eq!(quote.service_discount, Money::from_dollars(10));
    assert_eq!(quote.referral_discount, Money::from_dollars(1));
    assert_eq!(quote.amount, Money::from_dollars(59));
}

#[tokio::test]
async fn test_unregistered_user_must_register_first() {
    let bot = TestBot::new();
    let user = UserId::new(2003);

    bot.press(user, ChoiceTag::BrowseServices).await;

    assert_eq!(bot.transport.last_to(user).unwrap().text, en("please_register"));
    assert!(bot.session(user).await.is_none());
}

#[tokio::test]
async fn test_stale_duration_button_is_expired() {
    let bot = TestBot::new();
    let user = bot.seed_user(2004, "Selam", None).await.id;

    bot.press(
        user,
        ChoiceTag::Duration(PlanDuration::SixMonths, ServiceKey::Masterclass),
    )
    .await;

    assert_eq!(bot.transport.last_to(user).unwrap().text, en("session_expired"));
    assert!(bot.store.all_subscriptions().is_empty());
}

#[tokio::test]
async fn test_cancel_payment_clears_session() {
    let bot = TestBot::new();
    let user = bot.seed_user(2005, "Nardos", None).await.id;

    bot.choose_plan(
        user,
        ServiceKey::Masterclass,
        PlanDuration::OneMonth,
        PaymentMethod::Telebirr,
    )
    .await;
    bot.press(user, ChoiceTag::CancelPayment).await;

    assert!(bot.session(user).await.is_none());
    assert_eq!(bot.transport.last_to(user).unwrap().text, en("payment_cancelled"));
}

// ============================================================================
// Receipts
// ============================================================================

#[tokio::test]
async fn test_receipt_after_deadline_is_refused() {
    let bot = TestBot::with_config(test_config(&[("RECEIPT_DEADLINE_MINUTES", "30")]));
    let user = bot.seed_user(2010, "Bethel", None).await.id;

    bot.choose_plan(
        user,
        ServiceKey::VipSignals,
        PlanDuration::OneMonth,
        PaymentMethod::Cbe,
    )
    .await;
    bot.clock.advance(Duration::minutes(31));
    bot.upload_photo(user).await;

    assert_eq!(
        bot.transport.last_to(user).unwrap().text,
        en("receipt_deadline_passed")
    );
    assert!(bot.session(user).await.is_none());
    assert!(bot.store.all_payments().is_empty());
    assert!(bot.transport.texts_to(ADMIN).is_empty());
}

#[tokio::test]
async fn test_receipt_inside_deadline_is_accepted() {
    let bot = TestBot::with_config(test_config(&[("RECEIPT_DEADLINE_MINUTES", "30")]));
    let user = bot.seed_user(2014, "Selam", None).await.id;

    bot.choose_plan(
        user,
        ServiceKey::VipSignals,
        PlanDuration::OneMonth,
        PaymentMethod::Cbe,
    )
    .await;
    bot.clock.advance(Duration::minutes(29));
    bot.upload_photo(user).await;

    assert_eq!(
        bot.transport.last_to(user).unwrap().text,
        en("payment_submitted")
    );
    assert_eq!(bot.store.all_payments().len(), 1);
}

#[tokio::test]
async fn test_non_image_receipt_is_refused() {
    let bot = TestBot::new();
    let user = bot.seed_user(2011, "Mahlet", None).await.id;

    bot.choose_plan(
        user,
        ServiceKey::OneToOne,
        PlanDuration::OneMonth,
        PaymentMethod::Abyssinia,
    )
    .await;
    bot.upload_document(user, "application/pdf").await;

    assert_eq!(bot.transport.last_to(user).unwrap().text, en("image_required"));
    assert_eq!(
        bot.session(user).await.map(|s| s.kind()),
        Some(StepKind::WaitingReceipt)
    );
    assert!(bot.store.all_payments().is_empty());

    bot.upload_document(user, "image/png").await;
    assert_eq!(bot.store.all_payments().len(), 1);
    assert!(bot.session(user).await.is_none());
}

#[tokio::test]
async fn test_photo_outside_receipt_step() {
    let bot = TestBot::new();
    let user = bot.seed_user(2012, "Hiwot", None).await.id;

    bot.upload_photo(user).await;

    assert_eq!(
        bot.transport.last_to(user).unwrap().text,
        en("not_expecting_photo")
    );
    assert!(bot.store.all_payments().is_empty());
}

// ============================================================================
// Binance
// ============================================================================

#[tokio::test]
async fn test_binance_wallet_with_tx_hash() {
    let bot = TestBot::new();
    let user = bot.seed_user(2020, "Samuel", None).await.id;

    bot.choose_plan(
        user,
        ServiceKey::VipSignals,
        PlanDuration::SixMonths,
        PaymentMethod::Binance,
    )
    .await;
    assert_eq!(
        bot.session(user).await.map(|s| s.kind()),
        Some(StepKind::WaitingBinanceMethod)
    );

    bot.press(user, ChoiceTag::Binance(BinanceRoute::Wallet)).await;
    assert!(bot
        .transport
        .last_to(user)
        .unwrap()
        .text
        .contains("TXYZwallet"));

    bot.press(user, ChoiceTag::SubmitTxHash).await;
    bot.text(user, "0x1234").await;
    assert_eq!(
        bot.transport.last_to(user).unwrap().text,
        en("error_invalid_tx_hash")
    );
    assert_eq!(
        bot.session(user).await.map(|s| s.kind()),
        Some(StepKind::EnteringTxHash)
    );

    bot.text(user, WALLET_TX).await;
    assert!(matches!(
        bot.session(user).await,
        Some(SessionState::WaitingReceipt { proof: Some(Proof::TxHash(ref hash)), .. })
            if hash == WALLET_TX
    ));

    bot.upload_photo(user).await;

    let payments = bot.store.all_payments();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].payment_method, PaymentMethod::Binance);
    assert_eq!(payments[0].tx_hash.as_deref(), Some(WALLET_TX));
    assert!(payments[0].order_id.is_none());
    assert_eq!(payments[0].amount, Money::from_dollars(45));

    let alert = bot.transport.last_to(ADMIN).unwrap();
    assert!(alert.text.contains(&format!("TX Hash: {WALLET_TX}")));
}

#[tokio::test]
async fn test_binance_pay_with_order_id() {
    let bot = TestBot::new();
    let user = bot.seed_user(2021, "Lidya", None).await.id;

    bot.choose_plan(
        user,
        ServiceKey::Mentorship,
        PlanDuration::OneMonth,
        PaymentMethod::Binance,
    )
    .await;
    bot.press(user, ChoiceTag::Binance(BinanceRoute::PayId)).await;
    bot.text(user, "ORD-12").await;
    assert_eq!(
        bot.transport.last_to(user).unwrap().text,
        en("error_invalid_order_id")
    );

    bot.text(user, "2837465910").await;
    assert_eq!(bot.transport.last_to(user).unwrap().text, en("proof_received"));

    bot.upload_photo(user).await;
    let payments = bot.store.all_payments();
    assert_eq!(payments[0].order_id.as_deref(), Some("2837465910"));
    assert!(payments[0].tx_hash.is_none());
}
