//! Scheduled sweeps against the in-memory store
//!
//! Run with: cargo test -p integration-tests --test sweep_tests

use chrono::{Duration, Utc};
use funnel_core::{ServiceKey, SubscriptionStatus, UserId};
use funnel_service::{ChoiceTag, SweepService};
use integration_tests::{
    active_subscription, expired_subscription, TestBot, ADMIN, SECOND_ADMIN,
};

#[tokio::test]
async fn test_expiry_sweep_warns_then_expires() {
    let bot = TestBot::new();
    let now = Utc::now();
    let soon = bot.seed_user(4001, "Soon", Some("soon@example.com")).await.id;
    let later = bot.seed_user(4002, "Later", None).await.id;
    let overdue = bot.seed_user(4003, "Overdue", None).await.id;

    bot.store.seed_subscription(active_subscription(
        soon,
        ServiceKey::VipSignals,
        now + Duration::days(2),
    ));
    bot.store.seed_subscription(active_subscription(
        later,
        ServiceKey::Mentorship,
        now + Duration::days(10),
    ));
    let stale = bot.store.seed_subscription(active_subscription(
        overdue,
        ServiceKey::Masterclass,
        now - Duration::hours(1),
    ));

    let sweeps = SweepService::new(bot.ctx());
    let warnings = sweeps.expiring_soon(now).await.unwrap();
    assert_eq!(warnings.processed, 1);
    bot.engine.runner().run_all(warnings.effects).await;

    let warning = bot.transport.last_to(soon).expect("warning sent");
    assert!(warning.text.contains("expires in 2 day(s)"));
    assert!(warning
        .choices()
        .contains(&ChoiceTag::SelectService(ServiceKey::VipSignals)));
    assert_eq!(bot.mailer.sent_to("soon@example.com").len(), 1);
    assert!(bot.transport.texts_to(later).is_empty());

    let expired = sweeps.expire_overdue(now).await.unwrap();
    assert_eq!(expired.processed, 1);

    let statuses: Vec<_> = bot
        .store
        .all_subscriptions()
        .into_iter()
        .map(|s| (s.id, s.status))
        .collect();
    assert!(statuses.contains(&(stale.id, SubscriptionStatus::Expired)));
    assert_eq!(
        statuses
            .iter()
            .filter(|(_, status)| *status == SubscriptionStatus::Active)
            .count(),
        2
    );

    // Running again finds nothing new
    assert_eq!(sweeps.expire_overdue(now).await.unwrap().processed, 0);
}

#[tokio::test]
async fn test_renewal_reminders_cover_last_week() {
    let bot = TestBot::new();
    let recent = bot.seed_user(4010, "Recent", None).await.id;
    let old = bot.seed_user(4011, "Old", None).await.id;

    bot.store.seed_subscription(expired_subscription(
        recent,
        ServiceKey::OneToOne,
        Duration::days(2),
    ));
    bot.store.seed_subscription(expired_subscription(
        old,
        ServiceKey::OneToOne,
        Duration::days(30),
    ));

    let report = SweepService::new(bot.ctx())
        .renewal_reminders(Utc::now())
        .await
        .unwrap();
    assert_eq!(report.processed, 1);
    bot.engine.runner().run_all(report.effects).await;

    assert_eq!(bot.transport.texts_to(recent).len(), 1);
    assert!(bot.transport.texts_to(old).is_empty());
}

#[tokio::test]
async fn test_purge_drops_only_stale_sessions() {
    let bot = TestBot::new();
    let idle = UserId::new(4020);
    let fresh = UserId::new(4021);

    bot.command(idle, "start", &[]).await;
    bot.command(fresh, "start", &[]).await;
    assert_eq!(bot.store.session_count(), 2);

    bot.store
        .backdate_session(idle, Utc::now() - Duration::hours(25));

    let report = SweepService::new(bot.ctx())
        .purge_sessions(Utc::now())
        .await
        .unwrap();
    assert_eq!(report.processed, 1);
    assert!(bot.session(idle).await.is_none());
    assert!(bot.session(fresh).await.is_some());
}

#[tokio::test]
async fn test_weekly_stats_go_to_every_admin() {
    let bot = TestBot::new();
    bot.seed_user(4030, "Member", None).await;

    let report = SweepService::new(bot.ctx())
        .weekly_stats(Utc::now())
        .await
        .unwrap();
    assert_eq!(report.processed, 2);
    bot.engine.runner().run_all(report.effects).await;

    for admin in [ADMIN, SECOND_ADMIN] {
        let texts = bot.transport.texts_to(admin);
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("Weekly report"));
    }
}

#[tokio::test]
async fn test_sweep_survives_unreachable_user() {
    let bot = TestBot::new();
    let blocked = bot.seed_user(4040, "Gone", None).await.id;
    let reachable = bot.seed_user(4041, "Here", None).await.id;
    let expiry = Utc::now() + Duration::days(1);
    for user in [blocked, reachable] {
        bot.store
            .seed_subscription(active_subscription(user, ServiceKey::VipSignals, expiry));
    }
    bot.transport.block(blocked);

    let report = SweepService::new(bot.ctx())
        .expiring_soon(Utc::now())
        .await
        .unwrap();
    assert_eq!(report.processed, 2);
    bot.engine.runner().run_all(report.effects).await;

    assert!(bot.transport.texts_to(blocked).is_empty());
    assert_eq!(bot.transport.texts_to(reachable).len(), 1);
}
