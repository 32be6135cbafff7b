//! Conversation state machine
//!
//! Inbound chat events are normalized, matched against the user's typed
//! session state through an explicit dispatch table, and turned into an
//! [`Outcome`] the engine commits and delivers.

pub mod choice;
pub mod dispatch;
pub mod engine;
pub mod event;
pub mod outcome;
pub mod state;

pub use choice::{BinanceRoute, ChoiceKind, ChoiceTag, UnknownChoice};
pub use dispatch::{fallback, DispatchTable, EventKey, Scope, Transition, Turn};
pub use engine::{ConversationEngine, Handled};
pub use event::{Command, CommandKind, Event, InboundEvent, SenderProfile, Upload, UploadKind};
pub use outcome::{Effect, Outcome, Reply, SessionChange};
pub use state::{PendingOrder, Proof, Quote, RegistrationDraft, SessionState, StepKind};
