//! Service context - dependency container for transitions
//!
//! Holds the stores, the outbound ports and the immutable configuration,
//! plus the clock every transition reads. Built once at startup and shared behind an `Arc`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use funnel_common::AppConfig;
use funnel_core::{
    Clock, PaymentRepository, ReferralRepository, SessionStore, SubscriptionRepository,
    SystemClock, UserId, UserRepository,
};

use crate::mail::Mailer;
use crate::receipts::ReceiptStore;
use crate::transport::Transport;

/// Service context containing all dependencies
///
/// Provides access to:
/// - Entity repositories and the session store
/// - The chat transport and the mailer
/// - Receipt file storage
/// - Configuration (catalog, admin list, payment destinations)
#[derive(Clone)]
pub struct ServiceContext {
    // Repositories
    users: Arc<dyn UserRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    payments: Arc<dyn PaymentRepository>,
    referrals: Arc<dyn ReferralRepository>,
    sessions: Arc<dyn SessionStore>,

    // Outbound
    transport: Arc<dyn Transport>,
    mailer: Arc<dyn Mailer>,
    receipts: ReceiptStore,

    clock: Arc<dyn Clock>,
    config: Arc<AppConfig>,
}

impl ServiceContext {
    /// Create a new service context with all dependencies
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<dyn UserRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        payments: Arc<dyn PaymentRepository>,
        referrals: Arc<dyn ReferralRepository>,
        sessions: Arc<dyn SessionStore>,
        transport: Arc<dyn Transport>,
        mailer: Arc<dyn Mailer>,
        config: Arc<AppConfig>,
    ) -> Self {
        let receipts = ReceiptStore::new(config.bot.receipts_dir.clone());
        Self {
            users,
            subscriptions,
            payments,
            referrals,
            sessions,
            transport,
            mailer,
            receipts,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the wall clock, for tests that pin or advance time
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // === Repositories ===

    pub fn users(&self) -> &dyn UserRepository {
        self.users.as_ref()
    }

    pub fn subscriptions(&self) -> &dyn SubscriptionRepository {
        self.subscriptions.as_ref()
    }

    pub fn payments(&self) -> &dyn PaymentRepository {
        self.payments.as_ref()
    }

    pub fn referrals(&self) -> &dyn ReferralRepository {
        self.referrals.as_ref()
    }

    pub fn sessions(&self) -> &dyn SessionStore {
        self.sessions.as_ref()
    }

    // === Outbound ===

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn mailer(&self) -> &dyn Mailer {
        self.mailer.as_ref()
    }

    pub fn receipts(&self) -> &ReceiptStore {
        &self.receipts
    }

    /// Current time for every transition, sweep and broadcast
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // === Configuration ===

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Admin allow-list check, re-run on every admin action
    pub fn is_admin(&self, id: UserId) -> bool {
        self.config.is_admin(id)
    }

    /// Support link, falling back to the bot itself when no handle is set
    pub fn support_url(&self) -> String {
        if self.config.bot.support_username.is_empty() {
            format!("https://t.me/{}", self.config.bot.username)
        } else {
            self.config.bot.support_url()
        }
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("transport", &"dyn Transport")
            .field("receipts", &self.receipts)
            .field("admins", &self.config.admins)
            .finish()
    }
}

/// Builder for creating ServiceContext
#[derive(Default)]
pub struct ServiceContextBuilder {
    users: Option<Arc<dyn UserRepository>>,
    subscriptions: Option<Arc<dyn SubscriptionRepository>>,
    payments: Option<Arc<dyn PaymentRepository>>,
    referrals: Option<Arc<dyn ReferralRepository>>,
    sessions: Option<Arc<dyn SessionStore>>,
    transport: Option<Arc<dyn Transport>>,
    mailer: Option<Arc<dyn Mailer>>,
    clock: Option<Arc<dyn Clock>>,
    config: Option<Arc<AppConfig>>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(mut self, repo: Arc<dyn UserRepository>) -> Self {
        self.users = Some(repo);
        self
    }

    pub fn subscriptions(mut self, repo: Arc<dyn SubscriptionRepository>) -> Self {
        self.subscriptions = Some(repo);
        self
    }

    pub fn payments(mut self, repo: Arc<dyn PaymentRepository>) -> Self {
        self.payments = Some(repo);
        self
    }

    pub fn referrals(mut self, repo: Arc<dyn ReferralRepository>) -> Self {
        self.referrals = Some(repo);
        self
    }

    pub fn sessions(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.sessions = Some(store);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn config(mut self, config: Arc<AppConfig>) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> super::error::ServiceResult<ServiceContext> {
        use super::error::ServiceError;

        let ctx = ServiceContext::new(
            self.users.ok_or_else(|| ServiceError::validation("users is required"))?,
            self.subscriptions
                .ok_or_else(|| ServiceError::validation("subscriptions is required"))?,
            self.payments
                .ok_or_else(|| ServiceError::validation("payments is required"))?,
            self.referrals
                .ok_or_else(|| ServiceError::validation("referrals is required"))?,
            self.sessions
                .ok_or_else(|| ServiceError::validation("sessions is required"))?,
            self.transport
                .ok_or_else(|| ServiceError::validation("transport is required"))?,
            self.mailer.ok_or_else(|| ServiceError::validation("mailer is required"))?,
            self.config.ok_or_else(|| ServiceError::validation("config is required"))?,
        );
        Ok(match self.clock {
            Some(clock) => ctx.with_clock(clock),
            None => ctx,
        })
    }
}
