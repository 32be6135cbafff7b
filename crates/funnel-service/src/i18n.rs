//! Message catalog
//!
//! `text(lang, key, args)` looks the key up in the user's language, falls
//! back to English, then to the key itself. Templates use `{name}`-style
//! placeholders; a placeholder with no matching argument is left verbatim.

use std::fmt::Display;

use funnel_core::Language;

/// Placeholder arguments for a template
pub type Args<'a> = [(&'a str, &'a dyn Display)];

/// Localized text with placeholders substituted
pub fn text(lang: Language, key: &str, args: &Args<'_>) -> String {
    fill(template(lang, key), args)
}

/// Localized text without placeholders
pub fn t(lang: Language, key: &str) -> String {
    template(lang, key).to_string()
}

/// Raw template, after language fallback
pub fn template<'k>(lang: Language, key: &'k str) -> &'k str {
    lookup(lang, key)
        .or_else(|| lookup(Language::En, key))
        .unwrap_or(key)
}

fn lookup(lang: Language, key: &str) -> Option<&'static str> {
    match lang {
        Language::En => en(key),
        Language::Am => am(key),
    }
}

/// Substitute `{ident}` placeholders from `args`
pub fn fill(template: &str, args: &Args<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let ident_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        let closed = after[ident_len..].starts_with('}');

        if ident_len > 0 && closed {
            let ident = &after[..ident_len];
            match args.iter().find(|(name, _)| *name == ident) {
                Some((_, value)) => out.push_str(&value.to_string()),
                None => {
                    out.push('{');
                    out.push_str(ident);
                    out.push('}');
                }
            }
            rest = &after[ident_len + 1..];
        } else {
            out.push('{');
            rest = after;
        }
    }

    out.push_str(rest);
    out
}

#[allow(clippy::too_many_lines)]
fn en(key: &str) -> Option<&'static str> {
    Some(match key {
        // Entry and menus
        "welcome" => "👋 Welcome!\n\n\
            We offer trading education and mentorship:\n\
            • Mentorship - group coaching\n\
            • Master Class - a complete course\n\
            • Face-to-Face Masterclass - in-person sessions\n\
            • VIP Signals - daily signals\n\
            • One-to-One Coaching - personal support\n\n\
            Register to get started.",
        "main_menu" => "🏠 Main Menu\n\nWhat would you like to do?",
        "menu_ready" => "Use the menu below any time.",
        "help_menu" => "❓ Help\n\n\
            Subscribe: open Browse Services, pick a service and a duration, then pay.\n\
            Payment methods: Binance (crypto), CBE, Telebirr and Abyssinia bank transfer.\n\
            Approval usually takes 2-4 hours.\n\
            For subscription changes, contact support.",
        "contact_support" => "📞 Support\n\nWrite to us at {support} and describe your issue.",
        "use_start" => "I don't understand that yet. Send /start to begin.",
        "not_understood" => "I don't understand that message. Please use the menu below.",
        "not_sure" => "I'm not sure what you mean. Please follow the current step or send /cancel.",
        "not_expecting_photo" => "I wasn't expecting a photo right now.",
        "unknown_action" => "Unknown action.",
        "session_expired" => "⏱️ This session has expired. Please start over.",
        "cancelled" => "Cancelled.",
        "access_denied" => "⛔ Access denied.",
        "please_register" => "Please register first.",
        "error_general" => "❌ Something went wrong. Please try again.",

        // Buttons
        "btn_register" => "📝 Register Now",
        "btn_change_language" => "🌐 Change Language",
        "btn_browse" => "📚 Browse Services",
        "btn_dashboard" => "📊 My Dashboard",
        "btn_referrals" => "🤝 Referrals",
        "btn_help" => "❓ Help",
        "btn_support" => "📞 Contact Support",
        "btn_main_menu" => "🏠 Main Menu",
        "btn_back" => "⬅️ Back",
        "btn_cancel" => "❌ Cancel",
        "btn_yes" => "✅ Yes",
        "btn_skip" => "⏭️ Skip",
        "btn_allow" => "✅ Allow",
        "btn_deny" => "❌ Don't allow",
        "btn_start_over" => "🔄 Start Over",
        "btn_try_again" => "🔄 Try Again",
        "btn_subscribe" => "🛒 Subscribe",
        "btn_renew" => "🔄 Renew",
        "btn_update_profile" => "✏️ Update Profile",
        "btn_update_phone" => "📱 Phone",
        "btn_update_country" => "🌍 Country",
        "btn_copy_link" => "🔗 Get My Link",
        "btn_share_link" => "📤 Share",
        "btn_binance_payid" => "🆔 Binance Pay ID",
        "btn_binance_wallet" => "👛 Wallet Address",
        "btn_sent_order_id" => "✅ I've sent it (enter Order ID)",
        "btn_sent_tx_hash" => "✅ I've sent it (enter TX Hash)",
        "btn_upload_receipt" => "📤 Upload Receipt",
        "btn_dashboard_short" => "📊 Dashboard",

        // Persistent menu
        "menu_browse" => "📚 Services",
        "menu_dashboard" => "📊 Dashboard",
        "menu_referrals" => "🤝 Referrals",
        "menu_help" => "❓ Help",
        "menu_language" => "🌐 Language",

        // Registration
        "registration_start" => "Let's get you registered! First, what's your name?",
        "already_registered" => "You're already registered.",
        "error_invalid_name" => "Please enter a valid name (letters only, at least 2).",
        "ask_email_optional" => "📧 Email (optional)\n\n\
            Would you like to add an email address? We use it for receipts and reminders.",
        "ask_email" => "Great! Please send your email address:",
        "error_invalid_email" => "❌ Please send a valid email address.",
        "error_email_exists" => "❌ This email is already registered. Please use a different one.",
        "ask_telegram_optional" => "📱 Telegram username (optional)\n\n\
            Would you like to share your Telegram username?",
        "ask_telegram" => "Please send your Telegram username (without @):",
        "ask_privacy" => "🔒 Privacy\n\n\
            May we message you directly and add you to the groups you subscribe to?",
        "ask_phone" => "Please send your phone number:",
        "error_invalid_phone" => "Please enter a valid Ethiopian phone number (09..., 07..., or +251...).",
        "ask_country" => "Finally, which country are you from?",
        "error_invalid_country" => "Please enter a valid country name.",
        "registration_complete" => "✅ Registration complete!\n\n\
            Welcome {name}!\n\n\
            📧 Email: {email_status}\n\
            📱 Telegram: {telegram_status}\n\
            🔒 Privacy: {privacy_status}\n\n\
            🔗 Your referral link: {referral_link}\n\
            Share it with friends to earn rewards.",
        "not_provided" => "not provided",
        "privacy_allowed" => "direct contact allowed",
        "privacy_denied" => "limited contact only",
        "registration_cancelled" => "Registration cancelled. Send /start whenever you're ready.",
        "registration_restart" => "Please start the registration again.",

        // Services and payment
        "choose_service" => "📚 Choose a service:",
        "service_line" => "{emoji} {name} - from {price}",
        "service_unavailable" => "This service is not available.",
        "choose_duration" => "⏰ {service}\n{description}\n\nChoose a duration:",
        "duration_button" => "{months} month(s) - {price}",
        "duration_button_savings" => "{months} month(s) - {price} (save {savings})",
        "choose_payment" => "💳 Choose a payment method\n\n\
            Service: {service}\n\
            Duration: {duration} month(s)\n\
            Total: {amount}",
        "discount_line" => "Original price: {original}\nDiscount: {discount}",
        "binance_choose" => "💰 Binance payment\n\nAmount: {amount} USDT\n\nHow would you like to pay?",
        "binance_payid" => "🆔 Binance Pay\n\n\
            Send exactly {amount} USDT to Pay ID: {pay_id}\n\
            Then tap the button below and enter your Order ID.",
        "binance_wallet" => "👛 Wallet transfer\n\n\
            Send exactly {amount} USDT (BSC) to:\n{wallet}\n\
            Then tap the button below and paste your transaction hash.\n\n\
            ⚠️ Send only USDT to this address.",
        "ask_order_id" => "Please enter your Binance Order ID (numbers only):",
        "ask_tx_hash" => "Please paste your transaction hash (TX Hash):",
        "error_invalid_order_id" => "❌ Invalid Order ID. It should contain digits only.",
        "error_invalid_tx_hash" => "❌ Invalid transaction hash. Please check and paste it again.",
        "proof_received" => "✅ Received. Now upload a screenshot of your payment.",
        "bank_payment" => "🏦 {method} transfer\n\n\
            Amount: {amount}\n\
            Send to: {destination}\n\n\
            Upload a screenshot of your receipt within {minutes} minutes.",
        "upload_receipt" => "📤 Please upload a screenshot of your payment receipt:",
        "receipt_deadline_passed" => "⏱️ The time to upload your receipt has passed. Please start the payment again.",
        "image_required" => "Please upload an image file.",
        "payment_submitted" => "✅ Payment submitted!\n\n\
            An admin will review it shortly, usually within 2-4 hours.",
        "payment_cancelled" => "Payment cancelled. You can try again any time.",
        "bot_payment_approved" => "🎉 Payment approved!\n\n\
            Your subscription is now active.\n\n\
            📦 Service: {service}\n\
            ⏰ Duration: {duration} month(s)\n\
            💰 Amount: {amount}\n\
            📅 Expires: {expiry_date}",
        "bot_payment_rejected" => "❌ Payment rejected\n\n\
            We could not verify your payment.\n\n\
            💰 Amount: {amount}\n\
            💳 Method: {payment_method}\n\n\
            Please contact support or try again with a clear receipt.",
        "group_invite" => "🎟️ Your group invite (single use): {link}",
        "expiry_warning" => "⏰ Your {service} subscription expires in {days_left} day(s). Renew to keep access.",
        "renewal_reminder" => "👋 Your {service} subscription has ended. Renew any time from Browse Services.",

        // Dashboard
        "dashboard" => "📊 Your Dashboard\n\n\
            👤 Name: {name}\n\
            📧 Email: {email}\n\
            📱 Phone: {phone}\n\
            🌍 Country: {country}\n\
            💬 Telegram: {telegram}\n\n\
            📦 Subscription:\n{subscription}\n\n\
            🤝 Referrals: {referral_count}\n\
            🔗 {referral_link}",
        "subscription_info" => "{service}\nExpires: {expiry_date} ({days_left} days left)\nPaid: {amount}",
        "no_subscription" => "No active subscription",
        "referrals_header" => "🤝 Your referrals ({count})\n\nLink: {referral_link}",
        "referrals_empty" => "No referrals yet. Share your link to invite friends!",
        "referral_link" => "🔗 Your referral link:\n{link}",
        "update_profile" => "✏️ What would you like to update?",
        "ask_new_phone" => "Send your new phone number:",
        "ask_new_country" => "Send your country:",
        "profile_updated" => "✅ Profile updated.",
        "choose_language" => "🌐 Choose your language:",
        "language_updated" => "✅ Language updated.",

        // Admin
        "admin_panel" => "👨‍💼 Admin Panel\n\n\
            Users: {total_users} (new this week: {new_users}, active: {active_users})\n\
            Revenue: {revenue} from {payment_count} payments (average {average})\n\
            Pending payments: {pending}",
        "admin_menu_ready" => "Admin menu enabled.",
        "btn_admin_panel" => "👨‍💼 Admin Panel",
        "btn_admin_pending" => "💳 Pending Payments ({count})",
        "btn_admin_users" => "👥 All Users",
        "btn_admin_broadcast" => "📢 Broadcast",
        "btn_admin_broadcast_user" => "✉️ Broadcast to User",
        "btn_admin_service_stats" => "📈 Service Stats",
        "btn_approve" => "✅ Approve #{id}",
        "btn_reject" => "❌ Reject #{id}",
        "menu_admin_panel" => "👨‍💼 Admin Panel",
        "menu_admin_users" => "👥 All Users",
        "menu_admin_pending" => "💳 Pending Payments",
        "menu_admin_broadcast" => "📢 Broadcast",
        "menu_admin_broadcast_user" => "✉️ Broadcast to User",
        "menu_admin_service_stats" => "📈 Service Stats",
        "menu_main" => "🏠 Main Menu",
        "pending_header" => "💳 Pending payments ({count})",
        "pending_empty" => "✅ No pending payments.",
        "pending_item" => "Payment #{id}\nUser: {user_name}\nService: {service} ({duration}m)\nAmount: {amount}\nMethod: {method}\nDate: {date}",
        "new_payment" => "💳 New payment #{id}\n\n\
            User: {name} ({handle})\n\
            Email: {email}\n\
            Phone: {phone}\n\
            Service: {service} ({duration}m)\n\
            Method: {method}\n\
            Amount: {amount}{proof}",
        "new_registration" => "🆕 New registration: {name} ({handle}), id {id}",
        "payment_approved_admin" => "✅ Payment #{id} approved. Subscription active until {expiry_date}.",
        "payment_rejected_admin" => "❌ Payment #{id} rejected.",
        "payment_already_processed" => "ℹ️ Payment #{id} was already {status}.",
        "users_header" => "👥 Users ({count})",
        "user_line" => "{mark} {name} ({handle}) id {id}",
        "service_stats_header" => "📈 Service stats",
        "service_stats_line" => "{service}: {active} active, {revenue}",
        "broadcast_prompt" => "📢 Send the message to broadcast to all active users.\n\
            Placeholders: {name} {service} {expiry}",
        "broadcast_user_pick" => "✉️ Choose a user:",
        "broadcast_user_prompt" => "Send the message for {name}.",
        "broadcast_started" => "📢 Broadcasting to {total} users...",
        "broadcast_progress" => "📢 Broadcasting... {done}/{total} (sent {sent}, failed {failed})",
        "broadcast_done" => "📢 Broadcast completed\nSent: {sent}\nFailed: {failed}\nTotal: {total}",
        "weekly_stats" => "📊 Weekly report\n\n\
            Users: {total_users} (new: {new_users})\n\
            This week: {week_revenue} from {week_count} payments\n\
            All time: {total_revenue} (average {average})",
        _ => return None,
    })
}

fn am(key: &str) -> Option<&'static str> {
    Some(match key {
        "welcome" => "👋 እንኳን ደህና መጡ!\n\n\
            ሙያዊ የግብይት ትምህርት እና አማካሪነት አገልግሎቶችን እናቀርባለን።\n\n\
            ለመጀመር፣ እባክዎ መጀመሪያ ምዝገባዎን ያጠናቅቁ።",
        "main_menu" => "🏠 ዋና ሜኑ\n\nእንኳን ደህና መጡ! ዛሬ ምን ማድረግ ይፈልጋሉ?",
        "registration_start" => "እንመዝግብዎት! መጀመሪያ፣ እባክዎ ስምዎን ያቅርቡ:",
        "ask_email_optional" => "📧 የኢሜል አድራሻ (አማራጭ)\n\n\
            የኢሜል አድራሻዎን መስጠት ይፈልጋሉ?",
        "ask_email" => "በጣም ጥሩ! እባክዎ የኢሜል አድራሻዎን ያቅርቡ:",
        "registration_complete" => "✅ ምዝገባ ተጠናቋል!\n\n\
            እንኳን ደህና መጡ {name}!\n\n\
            📧 ኢሜል: {email_status}\n\
            📱 ቴሌግራም: {telegram_status}\n\
            🔒 ግላዊነት: {privacy_status}\n\n\
            🔗 የእርስዎ የሪፈራል ሊንክ: {referral_link}",
        "error_general" => "❌ የሆነ ችግር ተፈጥሯል። እባክዎ እንደገና ይሞክሩ።",
        "bot_payment_approved" => "🎉 ክፍያ ተቀባይነት አግኝቷል!\n\n\
            የእርስዎ ምዝገባ አሁን ንቁ ነው!\n\n\
            📦 አገልግሎት: {service}\n\
            ⏰ ጊዜ: {duration} ወር\n\
            💰 መጠን: {amount}\n\
            📅 ያበቃል: {expiry_date}",
        "bot_payment_rejected" => "❌ ክፍያ ውድቅ ሆኗል\n\n\
            የእርስዎ ክፍያ ማረጋገጥ አልተቻለም።\n\n\
            💰 መጠን: {amount}\n\
            💳 ዘዴ: {payment_method}\n\n\
            እባክዎ ድጋፍን ያነጋግሩ ወይም ግልጽ ደረሰኝ ይዘው እንደገና ይሞክሩ።",
        "menu_browse" => "📚 አገልግሎቶች",
        "menu_dashboard" => "📊 ዳሽቦርድ",
        "menu_referrals" => "🤝 ሪፈራል",
        "menu_help" => "❓ እገዛ",
        "menu_language" => "🌐 ቋንቋ",
        _ => return None,
    })
}
