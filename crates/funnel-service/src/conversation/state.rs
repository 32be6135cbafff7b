//! Typed session payloads
//!
//! One variant per step, each carrying only what that step's transitions
//! read. The serialized form is `{"step": "<name>", "payload": {...}}`; the
//! session store keeps the two halves as its step column and opaque payload.

use chrono::{DateTime, Utc};
use funnel_core::{
    Language, Money, PaymentMethod, PlanDuration, PriceQuote, ServiceKey, SessionRecord,
    SubscriptionId, UserId,
};
use serde::{Deserialize, Serialize};

/// Fields collected by the registration wizard so far
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationDraft {
    pub referral_code: Option<String>,
    pub language: Option<Language>,
    pub name: String,
    pub email: Option<String>,
    pub telegram_username: Option<String>,
    pub privacy_allowed: bool,
}

/// Price breakdown for one service tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub service: ServiceKey,
    pub duration: PlanDuration,
    pub amount: Money,
    pub original_amount: Money,
    pub service_discount: Money,
    pub referral_discount: Money,
}

impl Quote {
    pub fn new(service: ServiceKey, duration: PlanDuration, price: PriceQuote) -> Self {
        Self {
            service,
            duration,
            amount: price.amount,
            original_amount: price.original_amount,
            service_discount: price.service_discount,
            referral_discount: price.referral_discount,
        }
    }

    pub fn total_discount(&self) -> Money {
        self.service_discount + self.referral_discount
    }
}

/// A quote bound to the pending subscription created for it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOrder {
    pub quote: Quote,
    pub subscription_id: SubscriptionId,
    pub payment_method: PaymentMethod,
}

/// Payment reference entered before the receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Proof {
    TxHash(String),
    OrderId(String),
}

/// Where a user is inside a flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", content = "payload", rename_all = "snake_case")]
pub enum SessionState {
    StartWithReferral {
        #[serde(default)]
        referral_code: Option<String>,
        #[serde(default)]
        language: Option<Language>,
    },

    RegistrationName {
        #[serde(default)]
        referral_code: Option<String>,
        #[serde(default)]
        language: Option<Language>,
    },
    RegistrationEmailOption {
        draft: RegistrationDraft,
    },
    RegistrationEmail {
        draft: RegistrationDraft,
    },
    RegistrationTelegramOption {
        draft: RegistrationDraft,
    },
    RegistrationTelegram {
        draft: RegistrationDraft,
    },
    RegistrationPrivacy {
        draft: RegistrationDraft,
    },
    RegistrationPhone {
        draft: RegistrationDraft,
    },
    RegistrationCountry {
        draft: RegistrationDraft,
        phone: String,
    },
    /// The email was taken while the wizard ran; only a new email is needed
    RegistrationEmailRetry {
        draft: RegistrationDraft,
        phone: String,
        country: String,
    },

    SelectingDuration {
        service: ServiceKey,
    },
    SelectingPayment {
        quote: Quote,
    },
    WaitingBinanceMethod {
        order: PendingOrder,
    },
    EnteringOrderId {
        order: PendingOrder,
    },
    EnteringTxHash {
        order: PendingOrder,
    },
    WaitingReceipt {
        order: PendingOrder,
        #[serde(default)]
        proof: Option<Proof>,
        #[serde(default)]
        deadline: Option<DateTime<Utc>>,
    },
    UploadingReceipt {
        order: PendingOrder,
        #[serde(default)]
        proof: Option<Proof>,
        #[serde(default)]
        deadline: Option<DateTime<Utc>>,
    },

    AdminBroadcast {},
    AdminBroadcastUser {
        target: UserId,
    },

    UpdatingPhone {},
    UpdatingCountry {},
}

/// Payload-free discriminant of [`SessionState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    StartWithReferral,
    RegistrationName,
    RegistrationEmailOption,
    RegistrationEmail,
    RegistrationTelegramOption,
    RegistrationTelegram,
    RegistrationPrivacy,
    RegistrationPhone,
    RegistrationCountry,
    RegistrationEmailRetry,
    SelectingDuration,
    SelectingPayment,
    WaitingBinanceMethod,
    EnteringOrderId,
    EnteringTxHash,
    WaitingReceipt,
    UploadingReceipt,
    AdminBroadcast,
    AdminBroadcastUser,
    UpdatingPhone,
    UpdatingCountry,
}

impl StepKind {
    /// Persisted step name
    pub const fn name(self) -> &'static str {
        match self {
            Self::StartWithReferral => "start_with_referral",
            Self::RegistrationName => "registration_name",
            Self::RegistrationEmailOption => "registration_email_option",
            Self::RegistrationEmail => "registration_email",
            Self::RegistrationTelegramOption => "registration_telegram_option",
            Self::RegistrationTelegram => "registration_telegram",
            Self::RegistrationPrivacy => "registration_privacy",
            Self::RegistrationPhone => "registration_phone",
            Self::RegistrationCountry => "registration_country",
            Self::RegistrationEmailRetry => "registration_email_retry",
            Self::SelectingDuration => "selecting_duration",
            Self::SelectingPayment => "selecting_payment",
            Self::WaitingBinanceMethod => "waiting_binance_method",
            Self::EnteringOrderId => "entering_order_id",
            Self::EnteringTxHash => "entering_tx_hash",
            Self::WaitingReceipt => "waiting_receipt",
            Self::UploadingReceipt => "uploading_receipt",
            Self::AdminBroadcast => "admin_broadcast",
            Self::AdminBroadcastUser => "admin_broadcast_user",
            Self::UpdatingPhone => "updating_phone",
            Self::UpdatingCountry => "updating_country",
        }
    }

    pub const fn is_admin(self) -> bool {
        matches!(self, Self::AdminBroadcast | Self::AdminBroadcastUser)
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl SessionState {
    pub fn kind(&self) -> StepKind {
        match self {
            Self::StartWithReferral { .. } => StepKind::StartWithReferral,
            Self::RegistrationName { .. } => StepKind::RegistrationName,
            Self::RegistrationEmailOption { .. } => StepKind::RegistrationEmailOption,
            Self::RegistrationEmail { .. } => StepKind::RegistrationEmail,
            Self::RegistrationTelegramOption { .. } => StepKind::RegistrationTelegramOption,
            Self::RegistrationTelegram { .. } => StepKind::RegistrationTelegram,
            Self::RegistrationPrivacy { .. } => StepKind::RegistrationPrivacy,
            Self::RegistrationPhone { .. } => StepKind::RegistrationPhone,
            Self::RegistrationCountry { .. } => StepKind::RegistrationCountry,
            Self::RegistrationEmailRetry { .. } => StepKind::RegistrationEmailRetry,
            Self::SelectingDuration { .. } => StepKind::SelectingDuration,
            Self::SelectingPayment { .. } => StepKind::SelectingPayment,
            Self::WaitingBinanceMethod { .. } => StepKind::WaitingBinanceMethod,
            Self::EnteringOrderId { .. } => StepKind::EnteringOrderId,
            Self::EnteringTxHash { .. } => StepKind::EnteringTxHash,
            Self::WaitingReceipt { .. } => StepKind::WaitingReceipt,
            Self::UploadingReceipt { .. } => StepKind::UploadingReceipt,
            Self::AdminBroadcast {} => StepKind::AdminBroadcast,
            Self::AdminBroadcastUser { .. } => StepKind::AdminBroadcastUser,
            Self::UpdatingPhone {} => StepKind::UpdatingPhone,
            Self::UpdatingCountry {} => StepKind::UpdatingCountry,
        }
    }

    /// Split into the step name and payload the session store persists
    pub fn to_parts(&self) -> Result<(String, serde_json::Value), serde_json::Error> {
        let value = serde_json::to_value(self)?;
        let payload = value
            .get("payload")
            .cloned()
            .unwrap_or_else(|| serde_json::json!({}));
        Ok((self.kind().name().to_string(), payload))
    }

    /// Rebuild from a stored record
    pub fn from_record(record: &SessionRecord) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::json!({
            "step": record.step,
            "payload": record.payload,
        }))
    }

    /// Registration draft carried by any registration step
    pub fn draft(&self) -> Option<&RegistrationDraft> {
        match self {
            Self::RegistrationEmailOption { draft }
            | Self::RegistrationEmail { draft }
            | Self::RegistrationTelegramOption { draft }
            | Self::RegistrationTelegram { draft }
            | Self::RegistrationPrivacy { draft }
            | Self::RegistrationPhone { draft }
            | Self::RegistrationCountry { draft, .. }
            | Self::RegistrationEmailRetry { draft, .. } => Some(draft),
            _ => None,
        }
    }

    /// Language chosen before registration finished, if any
    pub fn pending_language(&self) -> Option<Language> {
        match self {
            Self::StartWithReferral { language, .. } | Self::RegistrationName { language, .. } => {
                *language
            }
            other => other.draft().and_then(|d| d.language),
        }
    }
}
