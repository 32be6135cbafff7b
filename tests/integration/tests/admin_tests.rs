//! Admin review of payments and broadcasts
//!
//! Run with: cargo test -p integration-tests --test admin_tests

use funnel_core::{Language, PaymentStatus, PlanDuration, ServiceKey, SubscriptionStatus, UserId};
use funnel_service::i18n::{t, text};
use funnel_service::{BroadcastReport, ChoiceTag, SessionState};
use integration_tests::{test_config, DeliveryKind, RecordingTransport, TestBot, ADMIN, SECOND_ADMIN};

fn en(key: &str) -> String {
    t(Language::En, key)
}

// ============================================================================
// Approve / reject
// ============================================================================

#[tokio::test]
async fn test_approve_activates_subscription() {
    let bot = TestBot::with_config(test_config(&[("GROUP_VIP_SIGNALS_3", "-1001234")]));
    let user = bot.seed_user(3001, "Abel", Some("abel@example.com")).await.id;
    let payment_id = bot
        .submit_payment(user, ServiceKey::VipSignals, PlanDuration::ThreeMonths)
        .await;
    bot.transport.clear();

    bot.press(ADMIN, ChoiceTag::ApprovePayment(payment_id)).await;

    let payment = bot.store.all_payments().remove(0);
    assert_eq!(payment.status, PaymentStatus::Approved);
    assert_eq!(payment.verified_by, Some(ADMIN));
    let verified_at = payment.verified_at.expect("verification time");

    let subscription = bot.store.all_subscriptions().remove(0);
    assert_eq!(subscription.status, SubscriptionStatus::Active);
    assert_eq!(subscription.start_date, Some(verified_at));
    assert_eq!(
        subscription.expiry_date,
        Some(verified_at + PlanDuration::ThreeMonths.period())
    );

    let expiry_date = (verified_at + PlanDuration::ThreeMonths.period())
        .format("%Y-%m-%d")
        .to_string();
    assert_eq!(
        bot.transport.last_to(ADMIN).unwrap().text,
        text(
            Language::En,
            "payment_approved_admin",
            &[("id", &payment_id), ("expiry_date", &expiry_date)]
        )
    );

    let user_texts = bot.transport.texts_to(user);
    assert!(user_texts.iter().any(|t| t.contains("Payment approved")));
    assert!(user_texts.iter().any(|t| t.contains("https://t.me/+invite1")));
    assert_eq!(bot.transport.invites(), vec![(-1_001_234, 1)]);
    assert_eq!(bot.mailer.sent_to("abel@example.com").len(), 1);
}

#[tokio::test]
async fn test_second_approval_reports_already_processed() {
    let bot = TestBot::new();
    let user = bot.seed_user(3002, "Hana", None).await.id;
    let payment_id = bot
        .submit_payment(user, ServiceKey::Mentorship, PlanDuration::OneMonth)
        .await;

    bot.press(ADMIN, ChoiceTag::ApprovePayment(payment_id)).await;
    let first_expiry = bot.store.all_subscriptions()[0].expiry_date;
    let notified = bot.transport.texts_to(user).len();

    bot.press(SECOND_ADMIN, ChoiceTag::ApprovePayment(payment_id))
        .await;

    assert_eq!(
        bot.transport.last_to(SECOND_ADMIN).unwrap().text,
        text(
            Language::En,
            "payment_already_processed",
            &[("id", &payment_id), ("status", &PaymentStatus::Approved)]
        )
    );
    assert_eq!(bot.store.all_subscriptions()[0].expiry_date, first_expiry);
    assert_eq!(bot.store.all_payments()[0].verified_by, Some(ADMIN));
    assert_eq!(bot.transport.texts_to(user).len(), notified);
}

#[tokio::test]
async fn test_concurrent_approvals_activate_once() {
    let bot = TestBot::new();
    let user = bot.seed_user(3003, "Kidus", None).await.id;
    let payment_id = bot
        .submit_payment(user, ServiceKey::Masterclass, PlanDuration::SixMonths)
        .await;

    tokio::join!(
        bot.press(ADMIN, ChoiceTag::ApprovePayment(payment_id)),
        bot.press(SECOND_ADMIN, ChoiceTag::ApprovePayment(payment_id)),
    );

    let approved = format!("Payment #{payment_id} approved");
    let already = format!("Payment #{payment_id} was already");
    let admin_texts: Vec<String> = [ADMIN, SECOND_ADMIN]
        .into_iter()
        .filter_map(|admin| bot.transport.last_to(admin))
        .map(|d| d.text)
        .collect();
    assert_eq!(admin_texts.iter().filter(|t| t.contains(&approved)).count(), 1);
    assert_eq!(admin_texts.iter().filter(|t| t.contains(&already)).count(), 1);

    let approvals = bot
        .transport
        .texts_to(user)
        .into_iter()
        .filter(|t| t.contains("Payment approved"))
        .count();
    assert_eq!(approvals, 1);
}

#[tokio::test]
async fn test_reject_notifies_user() {
    let bot = TestBot::new();
    let user = bot.seed_user(3004, "Marta", Some("marta@example.com")).await.id;
    let payment_id = bot
        .submit_payment(user, ServiceKey::FaceToFace, PlanDuration::OneMonth)
        .await;

    bot.press(ADMIN, ChoiceTag::RejectPayment(payment_id)).await;

    let payment = bot.store.all_payments().remove(0);
    assert_eq!(payment.status, PaymentStatus::Rejected);
    assert_eq!(payment.verified_by, Some(ADMIN));
    assert_eq!(
        bot.store.all_subscriptions()[0].status,
        SubscriptionStatus::Pending
    );

    let notice = bot.transport.last_to(user).unwrap();
    assert!(notice.text.contains("Payment rejected"));
    assert!(notice.choices().contains(&ChoiceTag::BrowseServices));
    assert_eq!(bot.mailer.sent_to("marta@example.com").len(), 1);

    bot.press(ADMIN, ChoiceTag::ApprovePayment(payment_id)).await;
    assert!(bot
        .transport
        .last_to(ADMIN)
        .unwrap()
        .text
        .contains("was already rejected"));
    assert_eq!(
        bot.store.all_subscriptions()[0].status,
        SubscriptionStatus::Pending
    );
}

#[tokio::test]
async fn test_non_admin_cannot_approve() {
    let bot = TestBot::new();
    let user = bot.seed_user(3005, "Robel", None).await.id;
    let payment_id = bot
        .submit_payment(user, ServiceKey::VipSignals, PlanDuration::OneMonth)
        .await;

    bot.press(user, ChoiceTag::ApprovePayment(payment_id)).await;
    bot.press(user, ChoiceTag::AdminPanel).await;

    assert_eq!(bot.transport.last_to(user).unwrap().text, en("access_denied"));
    assert_eq!(bot.store.all_payments()[0].status, PaymentStatus::Pending);
}

#[tokio::test]
async fn test_approve_unknown_payment() {
    let bot = TestBot::new();

    bot.press(ADMIN, ChoiceTag::ApprovePayment(funnel_core::PaymentId::new(404)))
        .await;

    assert_eq!(bot.transport.last_to(ADMIN).unwrap().text, en("session_expired"));
}

#[tokio::test]
async fn test_pending_payments_list() {
    let bot = TestBot::new();
    for (id, name) in [(3010, "Aster"), (3011, "Bisrat")] {
        let user = bot.seed_user(id, name, None).await.id;
        bot.submit_payment(user, ServiceKey::VipSignals, PlanDuration::OneMonth)
            .await;
    }
    bot.transport.clear();

    bot.press(ADMIN, ChoiceTag::AdminPendingPayments).await;

    let deliveries = bot.transport.to(ADMIN);
    assert_eq!(deliveries.len(), 3);
    let listed: Vec<_> = deliveries[1..]
        .iter()
        .flat_map(|d| d.choices())
        .filter(|c| matches!(c, ChoiceTag::ApprovePayment(_)))
        .collect();
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn test_admin_start_opens_panel() {
    let bot = TestBot::new();

    bot.command(ADMIN, "start", &[]).await;

    let deliveries = bot.transport.to(ADMIN);
    assert!(deliveries[0].text.contains("Admin"));
    assert!(deliveries[0]
        .choices()
        .contains(&ChoiceTag::AdminPendingPayments));
    assert_eq!(deliveries[1].kind, DeliveryKind::Menu);
}

// ============================================================================
// Broadcasts
// ============================================================================

#[tokio::test]
async fn test_broadcast_reaches_active_users() {
    let bot = TestBot::new();
    let names = ["Abel", "Bethel", "Caleb", "Dagim", "Eyerus"];
    let mut users = Vec::new();
    for (offset, name) in (0_i64..).zip(names) {
        users.push(bot.seed_user(3100 + offset, name, None).await.id);
    }
    bot.transport.block(users[2]);

    bot.press(ADMIN, ChoiceTag::AdminBroadcast).await;
    assert!(matches!(
        bot.session(ADMIN).await,
        Some(SessionState::AdminBroadcast {})
    ));

    let handled = bot.text(ADMIN, "Hello {name}, new signals are out").await;
    assert!(bot.session(ADMIN).await.is_none());

    let reports = handled.finish().await;
    assert_eq!(
        reports,
        vec![BroadcastReport {
            total: 5,
            sent: 4,
            failed: 1
        }]
    );

    for (user, name) in users.iter().zip(names) {
        let texts = bot.transport.texts_to(*user);
        if *user == users[2] {
            assert!(texts.is_empty());
        } else {
            assert_eq!(texts, vec![format!("Hello {name}, new signals are out")]);
        }
    }

    let status = bot.transport.last_to(ADMIN).unwrap();
    assert_eq!(
        status.text,
        text(
            Language::En,
            "broadcast_done",
            &[("sent", &4), ("failed", &1), ("total", &5)]
        )
    );
    assert_eq!(status.kind, DeliveryKind::Edited);
}

#[tokio::test]
async fn test_broadcast_to_single_user() {
    let bot = TestBot::new();
    let target = bot.seed_user(3200, "Feven", None).await.id;
    let other = bot.seed_user(3201, "Girum", None).await.id;

    bot.press(ADMIN, ChoiceTag::AdminBroadcastUser).await;
    assert!(bot
        .transport
        .last_to(ADMIN)
        .unwrap()
        .choices()
        .contains(&ChoiceTag::AdminBroadcastUserSelect(target)));

    bot.press(ADMIN, ChoiceTag::AdminBroadcastUserSelect(target))
        .await;
    let reports = bot.text(ADMIN, "Hi {name}").await.finish().await;

    assert_eq!(reports[0].sent, 1);
    assert_eq!(bot.transport.texts_to(target), vec!["Hi Feven".to_string()]);
    assert!(bot.transport.texts_to(other).is_empty());
}

#[tokio::test]
async fn test_broadcast_concurrency_is_bounded() {
    let bot = TestBot::with_transport(RecordingTransport::with_delay(
        std::time::Duration::from_millis(20),
    ));
    for n in 0..12 {
        bot.seed_user(3300 + n, "Member", None).await;
    }

    bot.press(ADMIN, ChoiceTag::AdminBroadcast).await;
    let reports = bot.text(ADMIN, "Update").await.finish().await;

    assert_eq!(reports[0].sent, 12);
    let peak = bot.transport.max_concurrent();
    assert!(peak <= bot.config.broadcast.concurrency, "peak {peak}");
    assert!(peak >= 2, "peak {peak}");
}

#[tokio::test]
async fn test_non_admin_cannot_broadcast() {
    let bot = TestBot::new();
    let user = bot.seed_user(3400, "Yared", None).await.id;

    bot.press(user, ChoiceTag::AdminBroadcast).await;

    assert_eq!(bot.transport.last_to(user).unwrap().text, en("access_denied"));
    assert!(bot.session(user).await.is_none());
    assert_eq!(bot.transport.to(UserId::new(3400)).len(), 1);
}
