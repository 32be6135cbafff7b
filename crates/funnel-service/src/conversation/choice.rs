//! Choice tags
//!
//! Every button the bot renders carries one of these. The wire form is the
//! snake_case string stored in the button's callback data; parsing and
//! rendering are exact inverses.

use std::fmt;
use std::str::FromStr;

use funnel_core::{Language, PaymentId, PaymentMethod, PlanDuration, ServiceKey, UserId};

/// Binance sub-flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinanceRoute {
    PayId,
    Wallet,
}

/// A discrete button selection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChoiceTag {
    RegisterStart,
    CancelRegistration,
    AddEmail(bool),
    AddTelegram(bool),
    Privacy(bool),

    BrowseServices,
    SelectService(ServiceKey),
    Duration(PlanDuration, ServiceKey),
    Payment(PaymentMethod),
    Binance(BinanceRoute),
    SubmitTxHash,
    SubmitOrderId,
    UploadReceipt,
    CancelPayment,

    AdminPanel,
    AdminPendingPayments,
    ApprovePayment(PaymentId),
    RejectPayment(PaymentId),
    AdminAllUsers,
    AdminServiceStats,
    AdminBroadcast,
    AdminBroadcastUser,
    AdminBroadcastUserSelect(UserId),

    ShowDashboard,
    ShowReferrals,
    CopyReferralLink,
    UpdateProfile,
    UpdatePhone,
    UpdateCountry,
    MainMenu,
    HelpMenu,
    ContactSupport,
    ChangeLanguage,
    SetLanguage(Language),
}

/// Payload-free discriminant of [`ChoiceTag`], used as a dispatch key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChoiceKind {
    RegisterStart,
    CancelRegistration,
    AddEmail,
    AddTelegram,
    Privacy,
    BrowseServices,
    SelectService,
    Duration,
    Payment,
    Binance,
    SubmitTxHash,
    SubmitOrderId,
    UploadReceipt,
    CancelPayment,
    AdminPanel,
    AdminPendingPayments,
    ApprovePayment,
    RejectPayment,
    AdminAllUsers,
    AdminServiceStats,
    AdminBroadcast,
    AdminBroadcastUser,
    AdminBroadcastUserSelect,
    ShowDashboard,
    ShowReferrals,
    CopyReferralLink,
    UpdateProfile,
    UpdatePhone,
    UpdateCountry,
    MainMenu,
    HelpMenu,
    ContactSupport,
    ChangeLanguage,
    SetLanguage,
}

impl ChoiceTag {
    pub fn kind(&self) -> ChoiceKind {
        match self {
            Self::RegisterStart => ChoiceKind::RegisterStart,
            Self::CancelRegistration => ChoiceKind::CancelRegistration,
            Self::AddEmail(_) => ChoiceKind::AddEmail,
            Self::AddTelegram(_) => ChoiceKind::AddTelegram,
            Self::Privacy(_) => ChoiceKind::Privacy,
            Self::BrowseServices => ChoiceKind::BrowseServices,
            Self::SelectService(_) => ChoiceKind::SelectService,
            Self::Duration(..) => ChoiceKind::Duration,
            Self::Payment(_) => ChoiceKind::Payment,
            Self::Binance(_) => ChoiceKind::Binance,
            Self::SubmitTxHash => ChoiceKind::SubmitTxHash,
            Self::SubmitOrderId => ChoiceKind::SubmitOrderId,
            Self::UploadReceipt => ChoiceKind::UploadReceipt,
            Self::CancelPayment => ChoiceKind::CancelPayment,
            Self::AdminPanel => ChoiceKind::AdminPanel,
            Self::AdminPendingPayments => ChoiceKind::AdminPendingPayments,
            Self::ApprovePayment(_) => ChoiceKind::ApprovePayment,
            Self::RejectPayment(_) => ChoiceKind::RejectPayment,
            Self::AdminAllUsers => ChoiceKind::AdminAllUsers,
            Self::AdminServiceStats => ChoiceKind::AdminServiceStats,
            Self::AdminBroadcast => ChoiceKind::AdminBroadcast,
            Self::AdminBroadcastUser => ChoiceKind::AdminBroadcastUser,
            Self::AdminBroadcastUserSelect(_) => ChoiceKind::AdminBroadcastUserSelect,
            Self::ShowDashboard => ChoiceKind::ShowDashboard,
            Self::ShowReferrals => ChoiceKind::ShowReferrals,
            Self::CopyReferralLink => ChoiceKind::CopyReferralLink,
            Self::UpdateProfile => ChoiceKind::UpdateProfile,
            Self::UpdatePhone => ChoiceKind::UpdatePhone,
            Self::UpdateCountry => ChoiceKind::UpdateCountry,
            Self::MainMenu => ChoiceKind::MainMenu,
            Self::HelpMenu => ChoiceKind::HelpMenu,
            Self::ContactSupport => ChoiceKind::ContactSupport,
            Self::ChangeLanguage => ChoiceKind::ChangeLanguage,
            Self::SetLanguage(_) => ChoiceKind::SetLanguage,
        }
    }
}

const fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

impl fmt::Display for ChoiceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegisterStart => f.write_str("register_start"),
            Self::CancelRegistration => f.write_str("cancel_registration"),
            Self::AddEmail(yes) => write!(f, "add_email_{}", yes_no(*yes)),
            Self::AddTelegram(yes) => write!(f, "add_telegram_{}", yes_no(*yes)),
            Self::Privacy(allow) => {
                f.write_str(if *allow { "privacy_allow" } else { "privacy_deny" })
            }
            Self::BrowseServices => f.write_str("browse_services"),
            Self::SelectService(key) => write!(f, "select_service_{}", key.as_str()),
            Self::Duration(duration, key) => {
                write!(f, "duration_{}_{}", duration.months(), key.as_str())
            }
            Self::Payment(method) => write!(f, "payment_{}", method.as_str()),
            Self::Binance(BinanceRoute::PayId) => f.write_str("binance_payid"),
            Self::Binance(BinanceRoute::Wallet) => f.write_str("binance_wallet"),
            Self::SubmitTxHash => f.write_str("submit_tx_hash"),
            Self::SubmitOrderId => f.write_str("submit_order_id"),
            Self::UploadReceipt => f.write_str("upload_receipt"),
            Self::CancelPayment => f.write_str("cancel_payment"),
            Self::AdminPanel => f.write_str("admin_panel"),
            Self::AdminPendingPayments => f.write_str("admin_pending_payments"),
            Self::ApprovePayment(id) => write!(f, "approve_payment_{id}"),
            Self::RejectPayment(id) => write!(f, "reject_payment_{id}"),
            Self::AdminAllUsers => f.write_str("admin_all_users"),
            Self::AdminServiceStats => f.write_str("admin_service_stats"),
            Self::AdminBroadcast => f.write_str("admin_broadcast"),
            Self::AdminBroadcastUser => f.write_str("admin_broadcast_user"),
            Self::AdminBroadcastUserSelect(id) => write!(f, "admin_broadcast_user_select_{id}"),
            Self::ShowDashboard => f.write_str("show_dashboard"),
            Self::ShowReferrals => f.write_str("show_referrals"),
            Self::CopyReferralLink => f.write_str("copy_referral_link"),
            Self::UpdateProfile => f.write_str("update_profile"),
            Self::UpdatePhone => f.write_str("update_phone"),
            Self::UpdateCountry => f.write_str("update_country"),
            Self::MainMenu => f.write_str("main_menu"),
            Self::HelpMenu => f.write_str("help_menu"),
            Self::ContactSupport => f.write_str("contact_support"),
            Self::ChangeLanguage => f.write_str("change_language"),
            Self::SetLanguage(lang) => write!(f, "set_language_{}", lang.code()),
        }
    }
}

/// A callback string that names no known choice
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized choice tag: {0}")]
pub struct UnknownChoice(pub String);

impl FromStr for ChoiceTag {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownChoice(s.to_string());

        let exact = match s {
            "register_start" => Some(Self::RegisterStart),
            "cancel_registration" => Some(Self::CancelRegistration),
            "add_email_yes" => Some(Self::AddEmail(true)),
            "add_email_no" => Some(Self::AddEmail(false)),
            "add_telegram_yes" => Some(Self::AddTelegram(true)),
            "add_telegram_no" => Some(Self::AddTelegram(false)),
            "privacy_allow" => Some(Self::Privacy(true)),
            "privacy_deny" => Some(Self::Privacy(false)),
            "browse_services" => Some(Self::BrowseServices),
            "binance_payid" => Some(Self::Binance(BinanceRoute::PayId)),
            "binance_wallet" => Some(Self::Binance(BinanceRoute::Wallet)),
            "submit_tx_hash" => Some(Self::SubmitTxHash),
            "submit_order_id" => Some(Self::SubmitOrderId),
            "upload_receipt" => Some(Self::UploadReceipt),
            "cancel_payment" => Some(Self::CancelPayment),
            "admin_panel" => Some(Self::AdminPanel),
            "admin_pending_payments" => Some(Self::AdminPendingPayments),
            "admin_all_users" => Some(Self::AdminAllUsers),
            "admin_service_stats" => Some(Self::AdminServiceStats),
            "admin_broadcast" => Some(Self::AdminBroadcast),
            "admin_broadcast_user" => Some(Self::AdminBroadcastUser),
            "show_dashboard" => Some(Self::ShowDashboard),
            "show_referrals" => Some(Self::ShowReferrals),
            "copy_referral_link" => Some(Self::CopyReferralLink),
            "update_profile" => Some(Self::UpdateProfile),
            "update_phone" => Some(Self::UpdatePhone),
            "update_country" => Some(Self::UpdateCountry),
            "main_menu" => Some(Self::MainMenu),
            "help_menu" => Some(Self::HelpMenu),
            "contact_support" => Some(Self::ContactSupport),
            "change_language" => Some(Self::ChangeLanguage),
            _ => None,
        };
        if let Some(tag) = exact {
            return Ok(tag);
        }

        // Longest prefixes first: `admin_broadcast_user_select_` before anything shorter
        if let Some(id) = s.strip_prefix("admin_broadcast_user_select_") {
            return id
                .parse()
                .map(Self::AdminBroadcastUserSelect)
                .map_err(|_| unknown());
        }
        if let Some(key) = s.strip_prefix("select_service_") {
            return key.parse().map(Self::SelectService).map_err(|_| unknown());
        }
        if let Some(rest) = s.strip_prefix("duration_") {
            // Service keys contain underscores; the month count never does
            let (months, key) = rest.split_once('_').ok_or_else(unknown)?;
            let duration = months.parse().map_err(|_| unknown())?;
            let key = key.parse().map_err(|_| unknown())?;
            return Ok(Self::Duration(duration, key));
        }
        if let Some(method) = s.strip_prefix("payment_") {
            return method.parse().map(Self::Payment).map_err(|_| unknown());
        }
        if let Some(id) = s.strip_prefix("approve_payment_") {
            return id.parse().map(Self::ApprovePayment).map_err(|_| unknown());
        }
        if let Some(id) = s.strip_prefix("reject_payment_") {
            return id.parse().map(Self::RejectPayment).map_err(|_| unknown());
        }
        if let Some(code) = s.strip_prefix("set_language_") {
            return code.parse().map(Self::SetLanguage).map_err(|_| unknown());
        }

        Err(unknown())
    }
}
