//! Integration test utilities for the funnel bot
//!
//! In-memory stores, a recording transport and mailer, and a harness that
//! drives the conversation engine the way the Telegram dispatcher does.

pub mod fixtures;
pub mod memory;

pub use clock::ManualClock;
pub use fixtures::*;
pub use harness::*;
pub use memory::{Fault, MemoryStore};
pub use recording::{Delivery, DeliveryKind, RecordingMailer, RecordingTransport};
