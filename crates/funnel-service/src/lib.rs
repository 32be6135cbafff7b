//! # funnel-service
//!
//! Application layer: the conversation state machine that threads
//! registration, purchase and admin dialogs across independent chat events,
//! plus the side effects those dialogs trigger (chat notifications, email,
//! group invites, broadcasts) and the scheduled sweeps.

pub mod broadcast;
pub mod conversation;
pub mod dto;
pub mod effects;
pub mod i18n;
pub mod keyboards;
pub mod mail;
pub mod receipts;
pub mod services;
pub mod transport;

pub use broadcast::{Audience, BroadcastJob, BroadcastReport};
pub use conversation::{
    ChoiceTag, ConversationEngine, DispatchTable, Effect, Handled, InboundEvent, Outcome, Reply,
    SenderProfile, SessionChange, SessionState, StepKind, Upload, UploadKind,
};
pub use effects::EffectRunner;
pub use mail::{EmailMessage, LogMailer, MailError, Mailer, SmtpMailer};
pub use receipts::ReceiptStore;
pub use services::{
    AccountService, AdminService, PurchaseService, RegistrationService, ServiceContext,
    ServiceContextBuilder, ServiceError, ServiceResult, SweepService,
};
pub use transport::{Button, ButtonAction, Keyboard, MessageRef, Transport, TransportError};
