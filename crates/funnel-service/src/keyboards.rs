//! Shared keyboards and the persistent reply menu

use funnel_core::Language;

use crate::conversation::ChoiceTag;
use crate::i18n::t;
use crate::transport::{Button, Keyboard};

/// Persistent-menu labels and the choice each one stands for
const USER_MENU: [(&str, ChoiceTag); 5] = [
    ("menu_browse", ChoiceTag::BrowseServices),
    ("menu_dashboard", ChoiceTag::ShowDashboard),
    ("menu_referrals", ChoiceTag::ShowReferrals),
    ("menu_help", ChoiceTag::HelpMenu),
    ("menu_language", ChoiceTag::ChangeLanguage),
];

const ADMIN_MENU: [(&str, ChoiceTag); 7] = [
    ("menu_admin_panel", ChoiceTag::AdminPanel),
    ("menu_admin_users", ChoiceTag::AdminAllUsers),
    ("menu_admin_pending", ChoiceTag::AdminPendingPayments),
    ("menu_admin_broadcast", ChoiceTag::AdminBroadcast),
    ("menu_admin_broadcast_user", ChoiceTag::AdminBroadcastUser),
    ("menu_admin_service_stats", ChoiceTag::AdminServiceStats),
    ("menu_main", ChoiceTag::MainMenu),
];

/// Map a persistent-menu label, in any language, to its choice
pub fn menu_choice(text: &str) -> Option<ChoiceTag> {
    let text = text.trim();
    Language::ALL.into_iter().find_map(|lang| {
        USER_MENU
            .iter()
            .chain(ADMIN_MENU.iter())
            .find(|(key, _)| t(lang, key) == text)
            .map(|(_, tag)| tag.clone())
    })
}

/// Reply-keyboard rows for a registered user
pub fn user_menu_rows(lang: Language) -> Vec<Vec<String>> {
    let label = |i: usize| t(lang, USER_MENU[i].0);
    vec![
        vec![label(0), label(1)],
        vec![label(2), label(3)],
        vec![label(4)],
    ]
}

/// Reply-keyboard rows for an admin
pub fn admin_menu_rows() -> Vec<Vec<String>> {
    let label = |i: usize| t(Language::En, ADMIN_MENU[i].0);
    vec![
        vec![label(0), label(1)],
        vec![label(2), label(3)],
        vec![label(4), label(5)],
        vec![label(6)],
    ]
}

pub fn main_menu(lang: Language) -> Keyboard {
    Keyboard::new()
        .button(t(lang, "btn_browse"), ChoiceTag::BrowseServices)
        .row(vec![
            Button::choice(t(lang, "btn_dashboard"), ChoiceTag::ShowDashboard),
            Button::choice(t(lang, "btn_referrals"), ChoiceTag::ShowReferrals),
        ])
        .row(vec![
            Button::choice(t(lang, "btn_help"), ChoiceTag::HelpMenu),
            Button::choice(t(lang, "btn_change_language"), ChoiceTag::ChangeLanguage),
        ])
}

/// Single "Main Menu" button
pub fn back_to_main(lang: Language) -> Keyboard {
    Keyboard::new().button(t(lang, "btn_main_menu"), ChoiceTag::MainMenu)
}

/// Entry keyboard for someone who has not registered yet
pub fn welcome(lang: Language) -> Keyboard {
    Keyboard::new()
        .button(t(lang, "btn_register"), ChoiceTag::RegisterStart)
        .button(t(lang, "btn_change_language"), ChoiceTag::ChangeLanguage)
}

pub fn language_picker(back: ChoiceTag) -> Keyboard {
    Language::ALL
        .into_iter()
        .fold(Keyboard::new(), |kb, lang| {
            kb.button(lang.native_name(), ChoiceTag::SetLanguage(lang))
        })
        .button(t(Language::En, "btn_back"), back)
}
