//! The main menu: greeting, referral deep links, the partner programme screen and the order board
//! shortcut for the barista.
use std::sync::Arc;

use kofe_engine::{db_types::ProfileUpdate, traits::CustomerManagement};
use log::*;
use teloxide::{prelude::*, types::ParseMode};
use url::Url;

use super::show_screen;
use crate::{
    context::BotContext,
    errors::{BotDialogue, HandlerResult},
    keyboards,
    state::DialogueState,
};

pub(crate) const GREETING: &str = "Привет 👋! Ты в боте кофейни Кофе на ходу.\nМы варим кофе с собой и выносим его тебе \
                        прямо в руки — без очередей, шума и беготни.\nПросто выбери напиток, укажи через сколько \
                        подойдешь — и всё будет готово к твоему приходу.\n👇Начнем?";

/// `/start`, with or without a `ref_<id>` deep-link payload. Registers (or reactivates) the
/// customer, records the referral if there is one and shows the main menu.
pub async fn start(bot: Bot, ctx: Arc<BotContext>, dialogue: BotDialogue, msg: Message) -> HandlerResult {
    let Some(user) = msg.from.as_ref() else { return Ok(()) };
    let user_id = user.id.0 as i64;
    let profile = ProfileUpdate {
        telegram_id: user_id,
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()),
    };
    ctx.db.upsert_customer(&profile).await?;
    if let Some(referrer_id) = referral_payload(msg.text()) {
        match ctx.db.link_referral(referrer_id, user_id).await? {
            true => info!("🤖️ Customer {user_id} joined via {referrer_id}'s referral link"),
            false => debug!("🤖️ Ignoring the referral payload {referrer_id} for customer {user_id}"),
        }
    }
    dialogue.update(DialogueState::Idle).await?;
    bot.send_message(msg.chat.id, GREETING).reply_markup(keyboards::main_menu_kb()?).await?;
    Ok(())
}

/// Pulls the referrer id out of `/start ref_<id>`, if that is what the message is.
fn referral_payload(text: Option<&str>) -> Option<i64> {
    text?.strip_prefix("/start")?.trim().strip_prefix("ref_")?.parse().ok()
}

/// `/board`: a button that opens the live order board as a Telegram web app.
pub async fn board(bot: Bot, ctx: Arc<BotContext>, msg: Message) -> HandlerResult {
    let url = Url::parse(ctx.board_url())?;
    bot.send_message(msg.chat.id, "Нажмите на кнопку ниже, чтобы открыть доску с активными заказами.")
        .reply_markup(keyboards::board_kb(url))
        .await?;
    Ok(())
}

pub async fn back_to_main_menu(
    bot: Bot,
    _ctx: Arc<BotContext>,
    dialogue: BotDialogue,
    q: CallbackQuery,
) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;
    dialogue.update(DialogueState::Idle).await?;
    show_screen(&bot, &q, GREETING, keyboards::main_menu_kb()?, None).await
}

/// The referral programme screen: current bonus balance plus the personal invite link.
pub async fn show_partners(bot: Bot, ctx: Arc<BotContext>, q: CallbackQuery) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;
    let user_id = q.from.id.0 as i64;
    let account = ctx.db.ensure_loyalty_account(user_id).await?;
    let text = format!(
        "**Твой бесплатный кофе ждёт!** ✨\n\nЗа каждого друга, который придёт по твоей ссылке и сделает заказ, \
         ты получишь бесплатный кофе.\n Сейчас у тебя **{}** бонусов.\n\nПоделись своей ссылкой:\n{}",
        account.free_coffees,
        ctx.referral_link(user_id)
    );
    show_screen(&bot, &q, &text, keyboards::partners_kb(), Some(ParseMode::Markdown)).await
}

/// Someone pressed the "I want this bot" button. Thank them and wake the admin up.
pub async fn buy_bot(bot: Bot, ctx: Arc<BotContext>, q: CallbackQuery) -> HandlerResult {
    bot.answer_callback_query(q.id.clone())
        .text("Ваша заявка принята, в ближайшее время наш менеджер с Вами свяжется.")
        .show_alert(true)
        .await?;
    let handle = match (&q.from.username, &q.from.first_name) {
        (Some(username), _) => format!("@{username}"),
        (None, first_name) => format!("{first_name} (id {})", q.from.id),
    };
    ctx.notifier.notify_buy_bot_request(&handle).await;
    Ok(())
}

#[cfg(test)]
mod test {
    use teloxide::utils::command::BotCommands;

    use super::*;
    use crate::commands::Command;

    #[test]
    fn referral_payload_is_parsed_from_the_deep_link() {
        assert_eq!(referral_payload(Some("/start ref_123456")), Some(123456));
        assert_eq!(referral_payload(Some("/start")), None);
        assert_eq!(referral_payload(Some("/start promo")), None);
        assert_eq!(referral_payload(Some("hello")), None);
        assert_eq!(referral_payload(None), None);
    }

    #[test]
    fn command_descriptions_cover_the_menu() {
        let descriptions = Command::descriptions().to_string();
        assert!(descriptions.contains("Перезапустить бота"));
        assert!(descriptions.contains("доску заказов"));
    }
}
