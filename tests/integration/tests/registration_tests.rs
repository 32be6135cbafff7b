//! Registration wizard, end to end through the conversation engine
//!
//! Run with: cargo test -p integration-tests --test registration_tests

use funnel_core::{generate_referral_code, Clock, Language, ReferralStatus, UserId, REFERRAL_CODE_LEN};
use funnel_service::i18n::t;
use funnel_service::{ChoiceTag, SessionState, StepKind};
use integration_tests::{new_user, DeliveryKind, TestBot, ADMIN, SECOND_ADMIN};

fn en(key: &str) -> String {
    t(Language::En, key)
}

// ============================================================================
// Happy path
// ============================================================================

#[tokio::test]
async fn test_full_registration() {
    let bot = TestBot::new();
    let user = UserId::new(1001);

    bot.command(user, "start", &[]).await;
    assert_eq!(bot.transport.last_to(user).unwrap().text, en("welcome"));
    assert!(matches!(
        bot.session(user).await,
        Some(SessionState::StartWithReferral { referral_code: None, .. })
    ));

    bot.press(user, ChoiceTag::RegisterStart).await;
    let reply = bot.transport.last_to(user).unwrap();
    assert_eq!(reply.kind, DeliveryKind::Edited);
    assert_eq!(reply.text, en("registration_start"));

    bot.text(user, "Abebe").await;
    assert_eq!(
        bot.session(user).await.map(|s| s.kind()),
        Some(StepKind::RegistrationEmailOption)
    );

    bot.press(user, ChoiceTag::AddEmail(true)).await;
    bot.text(user, "Abebe@Example.com").await;
    bot.press(user, ChoiceTag::AddTelegram(false)).await;
    bot.press(user, ChoiceTag::Privacy(true)).await;
    bot.text(user, "091 234 5678").await;
    bot.text(user, "🇪🇹 Ethiopia").await;

    let stored = bot.user(user).await.expect("user created");
    assert_eq!(stored.name, "Abebe");
    assert_eq!(stored.email.as_deref(), Some("abebe@example.com"));
    assert_eq!(stored.phone.as_deref(), Some("0912345678"));
    assert_eq!(stored.country.as_deref(), Some("Ethiopia"));
    assert_eq!(stored.telegram_username.as_deref(), Some("user1001"));
    assert!(stored.privacy_allowed);
    assert_eq!(stored.referral_code.len(), REFERRAL_CODE_LEN);
    assert!(stored.is_active);

    assert!(bot.session(user).await.is_none());

    let texts = bot.transport.texts_to(user);
    assert!(texts.iter().any(|t| t.contains("Abebe") && t.contains(&stored.referral_code)));
    assert!(bot
        .transport
        .to(user)
        .iter()
        .any(|d| d.kind == DeliveryKind::Menu));

    for admin in [ADMIN, SECOND_ADMIN] {
        assert!(bot
            .transport
            .texts_to(admin)
            .iter()
            .any(|t| t.contains("New registration: Abebe")));
    }
    assert_eq!(bot.mailer.sent_to("abebe@example.com").len(), 1);
}

#[tokio::test]
async fn test_registration_without_email_sends_no_mail() {
    let bot = TestBot::new();
    let user = UserId::new(1002);

    bot.register(user, "Sara", None).await;

    let stored = bot.user(user).await.expect("user created");
    assert!(stored.email.is_none());
    assert!(bot.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_registration_with_typed_handle() {
    let bot = TestBot::new();
    let user = UserId::new(1003);

    bot.command(user, "start", &[]).await;
    bot.press(user, ChoiceTag::RegisterStart).await;
    bot.text(user, "Kebede").await;
    bot.press(user, ChoiceTag::AddEmail(false)).await;
    bot.press(user, ChoiceTag::AddTelegram(true)).await;
    bot.text(user, "@kebede_fx").await;
    bot.press(user, ChoiceTag::Privacy(false)).await;
    bot.text(user, "+251912345678").await;
    bot.text(user, "Kenya").await;

    let stored = bot.user(user).await.expect("user created");
    assert_eq!(stored.telegram_username.as_deref(), Some("kebede_fx"));
    assert!(!stored.privacy_allowed);
}

// ============================================================================
// Referrals
// ============================================================================

#[tokio::test]
async fn test_start_with_referral_links_referrer() {
    let bot = TestBot::new();
    let referrer = bot.seed_user(500, "Hana", None).await;
    let user = UserId::new(1010);

    bot.command(user, "start", &[&format!("ref_{}", referrer.referral_code)])
        .await;
    assert!(matches!(
        bot.session(user).await,
        Some(SessionState::StartWithReferral { referral_code: Some(ref code), .. })
            if *code == referrer.referral_code
    ));

    bot.press(user, ChoiceTag::RegisterStart).await;
    bot.text(user, "Dawit").await;
    bot.press(user, ChoiceTag::AddEmail(false)).await;
    bot.press(user, ChoiceTag::AddTelegram(false)).await;
    bot.press(user, ChoiceTag::Privacy(true)).await;
    bot.text(user, "0712345678").await;
    bot.text(user, "Ethiopia").await;

    let stored = bot.user(user).await.expect("user created");
    assert_eq!(stored.referred_by, Some(referrer.id));

    let referrals = bot.store.all_referrals();
    assert_eq!(referrals.len(), 1);
    assert_eq!(referrals[0].referrer_id, referrer.id);
    assert_eq!(referrals[0].referred_id, user);
    assert_eq!(referrals[0].status, ReferralStatus::Pending);
}

#[tokio::test]
async fn test_unknown_referral_code_is_ignored() {
    let bot = TestBot::new();
    let user = UserId::new(1011);

    bot.command(user, "start", &["ref_NOSUCHCODE"]).await;
    bot.press(user, ChoiceTag::RegisterStart).await;
    bot.text(user, "Meron").await;
    bot.press(user, ChoiceTag::AddEmail(false)).await;
    bot.press(user, ChoiceTag::AddTelegram(false)).await;
    bot.press(user, ChoiceTag::Privacy(true)).await;
    bot.text(user, "0912345678").await;
    bot.text(user, "Ethiopia").await;

    let stored = bot.user(user).await.expect("user created");
    assert!(stored.referred_by.is_none());
    assert!(bot.store.all_referrals().is_empty());
}

// ============================================================================
// Referral code collisions
// ============================================================================

/// Walk the wizard up to the country step
async fn reach_country_step(bot: &TestBot, user: UserId, name: &str) {
    bot.command(user, "start", &[]).await;
    bot.press(user, ChoiceTag::RegisterStart).await;
    bot.text(user, name).await;
    bot.press(user, ChoiceTag::AddEmail(false)).await;
    bot.press(user, ChoiceTag::AddTelegram(false)).await;
    bot.press(user, ChoiceTag::Privacy(true)).await;
    bot.text(user, "0912345678").await;
}

/// Existing account holding the code `user` would draw on `attempt`
async fn occupy_code(bot: &TestBot, holder: i64, user: UserId, attempt: u32) {
    let mut taken = new_user(holder, "Holder", None);
    taken.referral_code = generate_referral_code(user, bot.clock.now(), attempt);
    bot.seed(taken).await;
}

#[tokio::test]
async fn test_referral_code_collision_retries_with_fresh_code() {
    let bot = TestBot::new();
    let user = UserId::new(1030);

    reach_country_step(&bot, user, "Yared").await;
    occupy_code(&bot, 610, user, 0).await;
    bot.text(user, "Ethiopia").await;

    let stored = bot.user(user).await.expect("user created");
    assert_eq!(
        stored.referral_code,
        generate_referral_code(user, bot.clock.now(), 1)
    );
    assert_ne!(
        stored.referral_code,
        generate_referral_code(user, bot.clock.now(), 0)
    );
    assert!(bot.session(user).await.is_none());
}

#[tokio::test]
async fn test_referral_code_attempts_exhausted_keeps_country_step() {
    let bot = TestBot::new();
    let user = UserId::new(1031);

    reach_country_step(&bot, user, "Yonas").await;
    for attempt in 0..5 {
        occupy_code(&bot, 620 + i64::from(attempt), user, attempt).await;
    }
    bot.text(user, "Ethiopia").await;

    assert!(bot.user(user).await.is_none());
    assert_eq!(
        bot.transport.last_to(user).unwrap().text,
        en("error_general")
    );
    assert_eq!(
        bot.session(user).await.map(|s| s.kind()),
        Some(StepKind::RegistrationCountry)
    );
}

// ============================================================================
// Validation and exits
// ============================================================================

#[tokio::test]
async fn test_duplicate_email_keeps_user_on_email_step() {
    let bot = TestBot::new();
    bot.seed_user(600, "Taken", Some("taken@example.com")).await;
    let user = UserId::new(1020);

    bot.command(user, "start", &[]).await;
    bot.press(user, ChoiceTag::RegisterStart).await;
    bot.text(user, "Liya").await;
    bot.press(user, ChoiceTag::AddEmail(true)).await;
    bot.text(user, "TAKEN@example.com").await;

    assert_eq!(
        bot.transport.last_to(user).unwrap().text,
        en("error_email_exists")
    );
    assert_eq!(
        bot.session(user).await.map(|s| s.kind()),
        Some(StepKind::RegistrationEmail)
    );

    bot.text(user, "liya@example.com").await;
    assert_eq!(
        bot.session(user).await.map(|s| s.kind()),
        Some(StepKind::RegistrationTelegramOption)
    );
}

#[tokio::test]
async fn test_email_claimed_mid_wizard_keeps_phone_and_country() {
    let bot = TestBot::new();
    let user = UserId::new(1022);

    bot.command(user, "start", &[]).await;
    bot.press(user, ChoiceTag::RegisterStart).await;
    bot.text(user, "Hana").await;
    bot.press(user, ChoiceTag::AddEmail(true)).await;
    bot.text(user, "hana@example.com").await;
    bot.press(user, ChoiceTag::AddTelegram(false)).await;
    bot.press(user, ChoiceTag::Privacy(false)).await;
    bot.text(user, "0911223344").await;

    // Another account takes the address before the last step
    bot.seed_user(601, "Other", Some("hana@example.com")).await;
    bot.text(user, "Kenya").await;

    assert_eq!(
        bot.transport.last_to(user).unwrap().text,
        en("error_email_exists")
    );
    assert!(bot.user(user).await.is_none());
    match bot.session(user).await {
        Some(SessionState::RegistrationEmailRetry {
            draft,
            phone,
            country,
        }) => {
            assert_eq!(draft.name, "Hana");
            assert!(draft.email.is_none());
            assert_eq!(phone, "0911223344");
            assert_eq!(country, "Kenya");
        }
        other => panic!("expected email retry, got {other:?}"),
    }

    bot.text(user, "hana@example.com").await;
    assert_eq!(
        bot.session(user).await.map(|s| s.kind()),
        Some(StepKind::RegistrationEmailRetry)
    );

    bot.text(user, "hana.k@example.com").await;
    let stored = bot.user(user).await.expect("user created");
    assert_eq!(stored.email.as_deref(), Some("hana.k@example.com"));
    assert_eq!(stored.phone.as_deref(), Some("0911223344"));
    assert_eq!(stored.country.as_deref(), Some("Kenya"));
    assert!(bot.session(user).await.is_none());
}

#[tokio::test]
async fn test_invalid_inputs_reprompt() {
    let bot = TestBot::new();
    let user = UserId::new(1021);

    bot.command(user, "start", &[]).await;
    bot.press(user, ChoiceTag::RegisterStart).await;

    bot.text(user, "A").await;
    assert_eq!(bot.transport.last_to(user).unwrap().text, en("error_invalid_name"));
    assert_eq!(
        bot.session(user).await.map(|s| s.kind()),
        Some(StepKind::RegistrationName)
    );

    bot.text(user, "Tigist").await;
    bot.press(user, ChoiceTag::AddEmail(true)).await;
    bot.text(user, "not-an-email").await;
    assert_eq!(bot.transport.last_to(user).unwrap().text, en("error_invalid_email"));

    bot.text(user, "tigist@example.com").await;
    bot.press(user, ChoiceTag::AddTelegram(false)).await;
    bot.press(user, ChoiceTag::Privacy(true)).await;

    bot.text(user, "12345").await;
    assert_eq!(bot.transport.last_to(user).unwrap().text, en("error_invalid_phone"));
    assert_eq!(
        bot.session(user).await.map(|s| s.kind()),
        Some(StepKind::RegistrationPhone)
    );

    bot.text(user, "0912345678").await;
    bot.text(user, "🇪🇹").await;
    assert_eq!(
        bot.transport.last_to(user).unwrap().text,
        en("error_invalid_country")
    );
    assert!(bot.user(user).await.is_none());
}

#[tokio::test]
async fn test_cancel_registration() {
    let bot = TestBot::new();
    let user = UserId::new(1022);

    bot.command(user, "start", &[]).await;
    bot.press(user, ChoiceTag::RegisterStart).await;
    bot.text(user, "Yonas").await;
    bot.press(user, ChoiceTag::CancelRegistration).await;

    assert!(bot.session(user).await.is_none());
    assert_eq!(
        bot.transport.last_to(user).unwrap().text,
        en("registration_cancelled")
    );
    assert!(bot.user(user).await.is_none());
}

#[tokio::test]
async fn test_cancel_command_leaves_any_step() {
    let bot = TestBot::new();
    let user = UserId::new(1023);

    bot.command(user, "start", &[]).await;
    bot.press(user, ChoiceTag::RegisterStart).await;
    bot.command(user, "cancel", &[]).await;

    assert!(bot.session(user).await.is_none());
    assert_eq!(bot.transport.last_to(user).unwrap().text, en("cancelled"));
}

#[tokio::test]
async fn test_registered_user_cannot_register_again() {
    let bot = TestBot::new();
    let user = bot.seed_user(1024, "Eden", None).await.id;

    bot.press(user, ChoiceTag::RegisterStart).await;
    assert_eq!(
        bot.transport.last_to(user).unwrap().text,
        en("already_registered")
    );
    assert!(bot.session(user).await.is_none());
}

#[tokio::test]
async fn test_start_for_registered_user_shows_menu() {
    let bot = TestBot::new();
    let user = bot.seed_user(1025, "Eden", None).await.id;

    bot.command(user, "start", &[]).await;

    let deliveries = bot.transport.to(user);
    assert_eq!(deliveries[0].text, en("main_menu"));
    assert_eq!(deliveries[1].kind, DeliveryKind::Menu);
    assert!(!deliveries[1].menu.is_empty());
}

#[tokio::test]
async fn test_free_text_without_session() {
    let bot = TestBot::new();
    let user = UserId::new(1026);

    bot.text(user, "hello?").await;

    assert_eq!(bot.transport.last_to(user).unwrap().text, en("use_start"));
    assert!(bot.session(user).await.is_none());
}
