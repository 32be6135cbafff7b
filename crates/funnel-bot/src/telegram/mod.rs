//! Telegram transport and update dispatch

pub mod handlers;
pub mod transport;

use std::sync::Arc;

use funnel_service::ConversationEngine;
use teloxide::prelude::*;
use tracing::info;

pub use transport::TelegramTransport;

/// Long-poll updates until Ctrl-C
pub async fn dispatch(bot: Bot, engine: Arc<ConversationEngine>, transport: Arc<TelegramTransport>) {
    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handlers::on_message))
        .branch(Update::filter_callback_query().endpoint(handlers::on_callback));

    info!("Telegram long polling started");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![engine, transport])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    info!("Telegram dispatcher stopped");
}
