//! Dispatcher wiring: the dptree schema and the top-level message/callback routers.
pub mod admin;
pub mod menu;
pub mod order;

use std::sync::Arc;

use log::*;
use teloxide::{
    dispatching::{dialogue::InMemStorage, UpdateHandler},
    prelude::*,
    types::{InlineKeyboardMarkup, ParseMode},
};

use crate::{
    commands::Command,
    context::BotContext,
    errors::{BotDialogue, BotError, HandlerResult, ReportingErrorHandler},
    keyboards::callback,
    state::DialogueState,
};

/// Builds the update-handling tree: commands, then free-text messages (admin prompts and deep
/// links), then callback queries.
pub fn schema() -> UpdateHandler<BotError> {
    let messages = Update::filter_message()
        .enter_dialogue::<Message, InMemStorage<DialogueState>, DialogueState>()
        .branch(dptree::entry().filter_command::<Command>().endpoint(handle_command))
        .branch(dptree::endpoint(handle_message));
    let callbacks = Update::filter_callback_query()
        .enter_dialogue::<CallbackQuery, InMemStorage<DialogueState>, DialogueState>()
        .endpoint(handle_callback);
    dptree::entry().branch(messages).branch(callbacks)
}

/// Runs the long-polling dispatcher until the process shuts down. Unhandled handler errors go to
/// the admin chat via [`ReportingErrorHandler`].
pub async fn dispatch(bot: Bot, ctx: Arc<BotContext>) {
    let error_handler = ReportingErrorHandler::new(ctx.notifier.clone());
    info!("🤖️ Starting the bot dispatcher (long polling)");
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![ctx, InMemStorage::<DialogueState>::new()])
        .error_handler(error_handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_command(
    bot: Bot,
    ctx: Arc<BotContext>,
    dialogue: BotDialogue,
    msg: Message,
    command: Command,
) -> HandlerResult {
    match command {
        Command::Start => menu::start(bot, ctx, dialogue, msg).await,
        Command::Board => menu::board(bot, ctx, msg).await,
        Command::Admin => admin::panel(bot, ctx, dialogue, msg).await,
    }
}

/// Non-command messages. `/start ref_<id>` deep links land here because the payload keeps them
/// from parsing as a bare command; everything else only matters while an admin prompt is open.
async fn handle_message(bot: Bot, ctx: Arc<BotContext>, dialogue: BotDialogue, msg: Message) -> HandlerResult {
    if msg.text().is_some_and(|text| text.starts_with("/start")) {
        return menu::start(bot, ctx, dialogue, msg).await;
    }
    if msg.from.as_ref().is_some_and(|user| user.id.0 as i64 == ctx.config.admin_chat_id) {
        let state = dialogue.get().await?.unwrap_or_default();
        match state {
            DialogueState::AwaitingExportDate => return admin::export_date_received(bot, ctx, dialogue, msg).await,
            DialogueState::AwaitingBroadcastMessage => {
                return admin::broadcast_message_received(bot, ctx, dialogue, msg).await
            },
            _ => {},
        }
    }
    Ok(())
}

/// Replaces the screen the customer is looking at. Edits the callback's message in place when
/// Telegram still lets us touch it, otherwise sends a fresh message to the same chat.
pub(crate) async fn show_screen(
    bot: &Bot,
    q: &CallbackQuery,
    text: &str,
    keyboard: InlineKeyboardMarkup,
    parse_mode: Option<ParseMode>,
) -> HandlerResult {
    match (q.regular_message(), parse_mode) {
        (Some(msg), Some(mode)) => {
            bot.edit_message_text(msg.chat.id, msg.id, text).reply_markup(keyboard).parse_mode(mode).await?;
        },
        (Some(msg), None) => {
            bot.edit_message_text(msg.chat.id, msg.id, text).reply_markup(keyboard).await?;
        },
        (None, Some(mode)) => {
            bot.send_message(ChatId(q.from.id.0 as i64), text).reply_markup(keyboard).parse_mode(mode).await?;
        },
        (None, None) => {
            bot.send_message(ChatId(q.from.id.0 as i64), text).reply_markup(keyboard).await?;
        },
    }
    Ok(())
}

async fn handle_callback(bot: Bot, ctx: Arc<BotContext>, dialogue: BotDialogue, q: CallbackQuery) -> HandlerResult {
    let Some(data) = q.data.clone() else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    trace!("🤖️ Callback '{data}' from {}", q.from.id);
    match data.as_str() {
        callback::MAKE_ORDER => order::start_order(bot, ctx, dialogue, q).await,
        callback::MAIN_MENU => menu::back_to_main_menu(bot, ctx, dialogue, q).await,
        callback::PARTNERS => menu::show_partners(bot, ctx, q).await,
        callback::BUY_BOT => menu::buy_bot(bot, ctx, q).await,
        d if d.starts_with(callback::ARRIVED_PREFIX) => order::client_arrived(bot, ctx, dialogue, q, d).await,
        d if d.starts_with(callback::CANCEL_ORDER_PREFIX) => order::cancel_order(bot, ctx, dialogue, q, d).await,
        d if admin::is_admin_callback(d) => admin::handle_callback(bot, ctx, dialogue, q, d).await,
        _ => order::dialogue_step(bot, ctx, dialogue, q, data).await,
    }
}
