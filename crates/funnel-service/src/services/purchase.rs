//! Purchase flow
//!
//! Browse → service → duration → payment method → (Binance reference) →
//! receipt upload. A pending subscription is created when the method is
//! picked; the payment row is created once the receipt file is on disk.

use chrono::{DateTime, Utc};
use funnel_core::validation::{validate_order_id, validate_tx_hash};
use funnel_core::{
    savings, Language, Money, NewPayment, NewSubscription, PaymentMethod, PlanDuration,
    PriceQuote, ServiceKey, User,
};
use tracing::{info, instrument};

use crate::conversation::{
    BinanceRoute, ChoiceTag, Effect, Event, Outcome, PendingOrder, Proof, Quote, SessionState,
    Turn,
};
use crate::i18n::{t, text};
use crate::keyboards;
use crate::transport::{Button, Keyboard};

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::please_register;

/// Purchase service
pub struct PurchaseService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> PurchaseService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Service list with each service's monthly price
    pub async fn browse(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        if turn.user.is_none() {
            return Ok(please_register(lang));
        }

        let keyboard = self
            .ctx
            .config()
            .catalog
            .iter()
            .fold(Keyboard::new(), |kb, offer| {
                let label = text(
                    lang,
                    "service_line",
                    &[
                        ("emoji", &offer.key.emoji()),
                        ("name", &offer.name),
                        ("price", &offer.price(PlanDuration::OneMonth)),
                    ],
                );
                kb.button(label, ChoiceTag::SelectService(offer.key))
            })
            .button(t(lang, "btn_main_menu"), ChoiceTag::MainMenu);

        Ok(Outcome::stay().answer(t(lang, "choose_service"), Some(keyboard)))
    }

    pub async fn select_service(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        if turn.user.is_none() {
            return Ok(please_register(lang));
        }
        let Some(ChoiceTag::SelectService(key)) = turn.choice() else {
            return Ok(expired(lang));
        };
        let Some(offer) = self.ctx.config().catalog.get(*key) else {
            return Ok(Outcome::stay().answer(
                t(lang, "service_unavailable"),
                Some(keyboards::back_to_main(lang)),
            ));
        };

        let monthly = offer.price(PlanDuration::OneMonth);
        let keyboard = PlanDuration::ALL
            .into_iter()
            .fold(Keyboard::new(), |kb, duration| {
                let price = offer.price(duration);
                let saved = savings(monthly, price, duration.months());
                let label = if saved > Money::ZERO {
                    text(
                        lang,
                        "duration_button_savings",
                        &[
                            ("months", &duration.months()),
                            ("price", &price),
                            ("savings", &saved),
                        ],
                    )
                } else {
                    text(
                        lang,
                        "duration_button",
                        &[("months", &duration.months()), ("price", &price)],
                    )
                };
                kb.button(label, ChoiceTag::Duration(duration, offer.key))
            })
            .button(t(lang, "btn_back"), ChoiceTag::BrowseServices);

        let prompt = text(
            lang,
            "choose_duration",
            &[("service", &offer.name), ("description", &offer.description)],
        );
        Ok(Outcome::put(SessionState::SelectingDuration { service: offer.key })
            .answer(prompt, Some(keyboard)))
    }

    /// Price the tier, applying the service discount and the referral discount
    #[instrument(skip(self, turn), fields(user_id = %turn.user_id))]
    pub async fn select_duration(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        let Some(SessionState::SelectingDuration { service }) = turn.state else {
            return Ok(expired(lang));
        };
        let Some(ChoiceTag::Duration(duration, key)) = turn.choice() else {
            return Ok(expired(lang));
        };
        if *key != service {
            return Ok(expired(lang));
        }
        let Some(offer) = self.ctx.config().catalog.get(service) else {
            return Ok(Outcome::clear().answer(
                t(lang, "service_unavailable"),
                Some(keyboards::back_to_main(lang)),
            ));
        };

        let completed = self.ctx.referrals().count_completed(turn.user_id).await?;
        let price = PriceQuote::new(offer.price(*duration), offer.discount, completed);
        let quote = Quote::new(service, *duration, price);

        let mut prompt = text(
            lang,
            "choose_payment",
            &[
                ("service", &offer.name),
                ("duration", &quote.duration),
                ("amount", &quote.amount),
            ],
        );
        if quote.total_discount() > Money::ZERO {
            prompt.push_str("\n\n");
            prompt.push_str(&text(
                lang,
                "discount_line",
                &[
                    ("original", &quote.original_amount),
                    ("discount", &quote.total_discount()),
                ],
            ));
        }

        let keyboard = PaymentMethod::ALL
            .into_iter()
            .fold(Keyboard::new(), |kb, method| {
                kb.button(method.display_name(), ChoiceTag::Payment(method))
            })
            .button(t(lang, "btn_cancel"), ChoiceTag::CancelPayment);

        Ok(Outcome::put(SessionState::SelectingPayment { quote }).answer(prompt, Some(keyboard)))
    }

    /// Create the pending subscription and show payment instructions
    #[instrument(skip(self, turn), fields(user_id = %turn.user_id))]
    pub async fn select_payment(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        let Some(SessionState::SelectingPayment { quote }) = turn.state else {
            return Ok(expired(lang));
        };
        let Some(ChoiceTag::Payment(method)) = turn.choice() else {
            return Ok(expired(lang));
        };
        let method = *method;

        let subscription = self
            .ctx
            .subscriptions()
            .create(&NewSubscription {
                user_id: turn.user_id,
                service: quote.service,
                duration: quote.duration,
                amount: quote.amount,
                payment_method: method,
            })
            .await?;
        info!(
            subscription_id = %subscription.id,
            method = method.as_str(),
            amount = %quote.amount,
            "Pending subscription created"
        );

        let order = PendingOrder {
            quote,
            subscription_id: subscription.id,
            payment_method: method,
        };

        if method.is_crypto() {
            let keyboard = Keyboard::new()
                .button(t(lang, "btn_binance_payid"), ChoiceTag::Binance(BinanceRoute::PayId))
                .button(t(lang, "btn_binance_wallet"), ChoiceTag::Binance(BinanceRoute::Wallet))
                .button(t(lang, "btn_cancel"), ChoiceTag::CancelPayment);
            let prompt = text(lang, "binance_choose", &[("amount", &usdt(quote.amount))]);
            return Ok(Outcome::put(SessionState::WaitingBinanceMethod { order })
                .answer(prompt, Some(keyboard)));
        }

        let payments = &self.ctx.config().payments;
        let prompt = text(
            lang,
            "bank_payment",
            &[
                ("method", &method.display_name()),
                ("amount", &quote.amount),
                ("destination", &payments.destination(method)),
                ("minutes", &payments.receipt_deadline_minutes),
            ],
        );
        Ok(self
            .waiting_receipt(order, None, turn.now)
            .answer(prompt, Some(upload_keyboard(lang))))
    }

    pub async fn binance_route(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        let Some(SessionState::WaitingBinanceMethod { order }) = turn.state else {
            return Ok(expired(lang));
        };
        let payments = &self.ctx.config().payments;
        let amount = usdt(order.quote.amount);

        let outcome = match turn.choice() {
            Some(ChoiceTag::Binance(BinanceRoute::PayId)) => {
                Outcome::put(SessionState::EnteringOrderId { order }).answer(
                    text(
                        lang,
                        "binance_payid",
                        &[("amount", &amount), ("pay_id", &payments.binance_pay_id)],
                    ),
                    Some(sent_keyboard(lang, "btn_sent_order_id", ChoiceTag::SubmitOrderId)),
                )
            }
            Some(ChoiceTag::Binance(BinanceRoute::Wallet)) => {
                Outcome::put(SessionState::EnteringTxHash { order }).answer(
                    text(
                        lang,
                        "binance_wallet",
                        &[("amount", &amount), ("wallet", &payments.binance_wallet_address)],
                    ),
                    Some(sent_keyboard(lang, "btn_sent_tx_hash", ChoiceTag::SubmitTxHash)),
                )
            }
            _ => expired(lang),
        };
        Ok(outcome)
    }

    pub async fn prompt_order_id(&self, turn: Turn) -> ServiceResult<Outcome> {
        Ok(Outcome::stay().answer(t(turn.language, "ask_order_id"), None))
    }

    pub async fn prompt_tx_hash(&self, turn: Turn) -> ServiceResult<Outcome> {
        Ok(Outcome::stay().answer(t(turn.language, "ask_tx_hash"), None))
    }

    pub async fn submit_order_id(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        let Some(SessionState::EnteringOrderId { order }) = turn.state else {
            return Ok(expired(lang));
        };
        let Ok(order_id) = validate_order_id(turn.text()) else {
            return Ok(Outcome::stay().answer(t(lang, "error_invalid_order_id"), None));
        };

        Ok(self
            .waiting_receipt(order, Some(Proof::OrderId(order_id)), turn.now)
            .answer(t(lang, "proof_received"), Some(upload_keyboard(lang))))
    }

    pub async fn submit_tx_hash(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        let Some(SessionState::EnteringTxHash { order }) = turn.state else {
            return Ok(expired(lang));
        };
        let Ok(tx_hash) = validate_tx_hash(turn.text()) else {
            return Ok(Outcome::stay().answer(t(lang, "error_invalid_tx_hash"), None));
        };

        Ok(self
            .waiting_receipt(order, Some(Proof::TxHash(tx_hash)), turn.now)
            .answer(t(lang, "proof_received"), Some(upload_keyboard(lang))))
    }

    /// "Upload receipt" pressed
    pub async fn request_upload(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        let Some((order, proof, deadline)) = receipt_state(turn.state) else {
            return Ok(expired(lang));
        };
        if deadline_passed(deadline, turn.now) {
            return Ok(deadline_outcome(lang));
        }

        Ok(Outcome::put(SessionState::UploadingReceipt {
            order,
            proof,
            deadline,
        })
        .answer(t(lang, "upload_receipt"), Some(cancel_keyboard(lang))))
    }

    /// Store the receipt, record the payment and alert the admins
    #[instrument(skip(self, turn), fields(user_id = %turn.user_id))]
    pub async fn receive_receipt(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        let Some(user) = turn.user.as_ref() else {
            return Ok(please_register(lang));
        };
        let Some((order, proof, deadline)) = receipt_state(turn.state.clone()) else {
            return Ok(expired(lang));
        };
        if deadline_passed(deadline, turn.now) {
            return Ok(deadline_outcome(lang));
        }
        let Event::File(upload) = &turn.event else {
            return Ok(Outcome::stay().answer(t(lang, "image_required"), None));
        };
        if !upload.is_image() {
            return Ok(Outcome::stay().answer(t(lang, "image_required"), None));
        }

        let (tx_hash, order_id) = match &proof {
            Some(Proof::TxHash(hash)) => (Some(hash.clone()), None),
            Some(Proof::OrderId(id)) => (None, Some(id.clone())),
            None => (None, None),
        };
        // File first, row last: a failure anywhere leaves no pending payment
        let payment_id = self.ctx.payments().next_id().await?;
        let path = self
            .ctx
            .receipts()
            .save(turn.user_id, payment_id, &upload.bytes, turn.now)
            .await?;
        let created = self
            .ctx
            .payments()
            .create(&NewPayment {
                id: payment_id,
                user_id: turn.user_id,
                subscription_id: order.subscription_id,
                payment_method: order.payment_method,
                amount: order.quote.amount,
                tx_hash,
                order_id,
                receipt_path: path.clone(),
            })
            .await;
        let payment = match created {
            Ok(payment) => payment,
            Err(e) => {
                self.ctx.receipts().discard(&path).await;
                return Err(e.into());
            }
        };

        info!(
            payment_id = %payment.id,
            subscription_id = %order.subscription_id,
            receipt = %path,
            "Payment submitted"
        );

        let alert = self.admin_alert(user, &order, proof.as_ref(), payment.id);
        Ok(Outcome::clear()
            .answer(t(lang, "payment_submitted"), Some(keyboards::main_menu(lang)))
            .effects(alert))
    }

    pub async fn cancel_payment(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        Ok(Outcome::clear().answer(
            t(lang, "payment_cancelled"),
            Some(keyboards::main_menu(lang)),
        ))
    }

    fn waiting_receipt(
        &self,
        order: PendingOrder,
        proof: Option<Proof>,
        now: DateTime<Utc>,
    ) -> Outcome {
        Outcome::put(SessionState::WaitingReceipt {
            order,
            proof,
            deadline: Some(now + self.ctx.config().payments.receipt_deadline()),
        })
    }

    fn admin_alert(
        &self,
        user: &User,
        order: &PendingOrder,
        proof: Option<&Proof>,
        payment_id: funnel_core::PaymentId,
    ) -> Vec<Effect> {
        let not_set = "N/A".to_string();
        let proof_line = match proof {
            Some(Proof::TxHash(hash)) => format!("\nTX Hash: {hash}"),
            Some(Proof::OrderId(id)) => format!("\nOrder ID: {id}"),
            None => String::new(),
        };
        let alert = text(
            Language::En,
            "new_payment",
            &[
                ("id", &payment_id),
                ("name", &user.name),
                ("handle", &user.handle()),
                ("email", user.email.as_ref().unwrap_or(&not_set)),
                ("phone", user.phone.as_ref().unwrap_or(&not_set)),
                ("service", &self.ctx.config().catalog.name_of(order.quote.service)),
                ("duration", &order.quote.duration),
                ("method", &order.payment_method.display_name()),
                ("amount", &order.quote.amount),
                ("proof", &proof_line),
            ],
        );
        let keyboard = Keyboard::new()
            .row(vec![
                Button::choice(
                    text(Language::En, "btn_approve", &[("id", &payment_id)]),
                    ChoiceTag::ApprovePayment(payment_id),
                ),
                Button::choice(
                    text(Language::En, "btn_reject", &[("id", &payment_id)]),
                    ChoiceTag::RejectPayment(payment_id),
                ),
            ])
            .button(t(Language::En, "btn_admin_panel"), ChoiceTag::AdminPanel);

        self.ctx
            .config()
            .admins
            .iter()
            .map(|admin| Effect::Notify {
                to: admin,
                text: alert.clone(),
                keyboard: Some(keyboard.clone()),
            })
            .collect()
    }
}

/// Crypto amounts are shown without the dollar sign
fn usdt(amount: Money) -> String {
    format!("{}.{:02}", amount.cents() / 100, amount.cents() % 100)
}

fn receipt_state(
    state: Option<SessionState>,
) -> Option<(PendingOrder, Option<Proof>, Option<DateTime<Utc>>)> {
    match state? {
        SessionState::WaitingReceipt {
            order,
            proof,
            deadline,
        }
        | SessionState::UploadingReceipt {
            order,
            proof,
            deadline,
        } => Some((order, proof, deadline)),
        _ => None,
    }
}

fn deadline_passed(deadline: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    deadline.is_some_and(|d| now > d)
}

fn deadline_outcome(lang: Language) -> Outcome {
    Outcome::clear().answer(
        t(lang, "receipt_deadline_passed"),
        Some(Keyboard::new().button(t(lang, "btn_browse"), ChoiceTag::BrowseServices)),
    )
}

/// Stale purchase button: the flow it belonged to is gone
fn expired(lang: Language) -> Outcome {
    Outcome::stay().answer(t(lang, "session_expired"), Some(keyboards::back_to_main(lang)))
}

fn upload_keyboard(lang: Language) -> Keyboard {
    Keyboard::new()
        .button(t(lang, "btn_upload_receipt"), ChoiceTag::UploadReceipt)
        .button(t(lang, "btn_cancel"), ChoiceTag::CancelPayment)
}

fn cancel_keyboard(lang: Language) -> Keyboard {
    Keyboard::new().button(t(lang, "btn_cancel"), ChoiceTag::CancelPayment)
}

fn sent_keyboard(lang: Language, label: &str, tag: ChoiceTag) -> Keyboard {
    Keyboard::new()
        .button(t(lang, label), tag)
        .button(t(lang, "btn_cancel"), ChoiceTag::CancelPayment)
}
