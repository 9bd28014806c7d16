//! The admin panel: analytics screens, CSV exports and the broadcast workflow.
//!
//! Everything here is gated on the configured admin chat id. Non-admins never see these screens,
//! and their presses on leftover admin buttons are acknowledged and dropped.
use std::{sync::Arc, time::Duration};

use chrono::NaiveDate;
use kofe_engine::{
    db_types::{BroadcastMessage, ExportPeriod},
    traits::{AdminDatabase, CustomerManagement},
};
use log::*;
use teloxide::{
    prelude::*,
    types::{InputFile, ParseMode},
};

use super::show_screen;
use crate::{
    context::BotContext,
    errors::{BotDialogue, HandlerResult},
    export,
    keyboards::{self, callback},
    state::DialogueState,
};

const PANEL_GREETING: &str = "Добро пожаловать в админ-панель!";
const DATE_PROMPT: &str = "Введите дату для отчета в формате `ГГГГ-ММ-ДД` (например, `2025-10-31`).";

/// `/admin`. Silently ignored for everyone but the configured admin.
pub async fn panel(bot: Bot, ctx: Arc<BotContext>, dialogue: BotDialogue, msg: Message) -> HandlerResult {
    if !msg.from.as_ref().is_some_and(|user| user.id.0 as i64 == ctx.config.admin_chat_id) {
        return Ok(());
    }
    dialogue.update(DialogueState::Idle).await?;
    bot.send_message(msg.chat.id, PANEL_GREETING).reply_markup(keyboards::admin_panel_kb()).await?;
    Ok(())
}

/// Whether this callback value belongs to the admin panel.
pub fn is_admin_callback(data: &str) -> bool {
    matches!(
        data,
        callback::ADMIN_ANALYTICS
            | callback::ANALYTICS_ORDERS
            | callback::ANALYTICS_TOP_DRINKS
            | callback::ANALYTICS_FREE_COFFEES
            | callback::ADMIN_PANEL_BACK
            | callback::CANCEL_INPUT
            | callback::GET_REPORT
            | callback::EXPORT_TODAY
            | callback::EXPORT_WEEK
            | callback::EXPORT_MONTH
            | callback::EXPORT_ALL
            | callback::EXPORT_BY_DATE
            | callback::ADMIN_BROADCAST
            | callback::BROADCAST_CHANGE_TEXT
            | callback::BROADCAST_START
            | callback::BROADCAST_CONFIRM_YES
            | callback::BROADCAST_CONFIRM_NO
    )
}

pub async fn handle_callback(
    bot: Bot,
    ctx: Arc<BotContext>,
    dialogue: BotDialogue,
    q: CallbackQuery,
    data: &str,
) -> HandlerResult {
    if q.from.id.0 as i64 != ctx.config.admin_chat_id {
        warn!("👑️ Non-admin {} pressed the admin button '{data}'", q.from.id);
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    }
    match data {
        callback::ADMIN_ANALYTICS => {
            bot.answer_callback_query(q.id.clone()).await?;
            show_screen(&bot, &q, "Выберите раздел аналитики:", keyboards::analytics_kb(), None).await
        },
        callback::ANALYTICS_ORDERS => order_analytics(bot, ctx, q).await,
        callback::ANALYTICS_TOP_DRINKS => top_drinks(bot, ctx, q).await,
        callback::ANALYTICS_FREE_COFFEES => free_coffee_stats(bot, ctx, q).await,
        callback::ADMIN_PANEL_BACK => {
            bot.answer_callback_query(q.id.clone()).await?;
            dialogue.update(DialogueState::Idle).await?;
            show_screen(&bot, &q, PANEL_GREETING, keyboards::admin_panel_kb(), None).await
        },
        callback::CANCEL_INPUT => {
            bot.answer_callback_query(q.id.clone()).text("Ввод отменен.").await?;
            dialogue.update(DialogueState::Idle).await?;
            show_screen(&bot, &q, PANEL_GREETING, keyboards::admin_panel_kb(), None).await
        },
        callback::GET_REPORT => {
            bot.answer_callback_query(q.id.clone()).await?;
            show_screen(
                &bot,
                &q,
                "За какой период выгрузить отчет по заказам?",
                keyboards::export_kb(),
                None,
            )
            .await
        },
        callback::EXPORT_TODAY => export_period(bot, ctx, q, ExportPeriod::Today).await,
        callback::EXPORT_WEEK => export_period(bot, ctx, q, ExportPeriod::ThisWeek).await,
        callback::EXPORT_MONTH => export_period(bot, ctx, q, ExportPeriod::ThisMonth).await,
        callback::EXPORT_ALL => export_period(bot, ctx, q, ExportPeriod::All).await,
        callback::EXPORT_BY_DATE => {
            bot.answer_callback_query(q.id.clone()).await?;
            dialogue.update(DialogueState::AwaitingExportDate).await?;
            show_screen(&bot, &q, DATE_PROMPT, keyboards::cancel_input_kb(), Some(ParseMode::Markdown)).await
        },
        callback::ADMIN_BROADCAST => broadcast_menu(bot, ctx, q).await,
        callback::BROADCAST_CHANGE_TEXT => {
            bot.answer_callback_query(q.id.clone()).await?;
            dialogue.update(DialogueState::AwaitingBroadcastMessage).await?;
            let prompt = "Пришлите новое сообщение для рассылки.\n\nЭто может быть:\n- Просто текст\n- Картинка \
                          с подписью";
            show_screen(&bot, &q, prompt, keyboards::cancel_input_kb(), None).await
        },
        callback::BROADCAST_START => broadcast_confirm(bot, ctx, q).await,
        callback::BROADCAST_CONFIRM_NO => broadcast_menu(bot, ctx, q).await,
        callback::BROADCAST_CONFIRM_YES => run_broadcast(bot, ctx, q).await,
        _ => {
            bot.answer_callback_query(q.id.clone()).await?;
            Ok(())
        },
    }
}

//--------------------------------------      analytics       --------------------------------------------------------

async fn order_analytics(bot: Bot, ctx: Arc<BotContext>, q: CallbackQuery) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;
    let total = ctx.db.count_orders().await?;
    let per_day = ctx.db.orders_per_day().await?;
    let mut text = format!("**📊 Общая аналитика по заказам:**\n▪️ Всего заказов: `{total}`\n\n**📈 Заказы по дням:**\n");
    if per_day.is_empty() {
        text.push_str("Нет данных по заказам за последние дни.");
    } else {
        for day in per_day {
            text.push_str(&format!("▪️ `{}`: `{}` заказов\n", day.date, day.count));
        }
    }
    show_screen(&bot, &q, &text, keyboards::analytics_kb(), Some(ParseMode::Markdown)).await
}

async fn top_drinks(bot: Bot, ctx: Arc<BotContext>, q: CallbackQuery) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;
    let drinks = ctx.db.top_drinks(5).await?;
    let text = if drinks.is_empty() {
        "Нет данных по заказам.".to_string()
    } else {
        let mut text = "**📈 Топ-5 самых популярных напитков:**\n".to_string();
        for (i, entry) in drinks.iter().enumerate() {
            text.push_str(&format!("{}. `{}`: `{}` заказов\n", i + 1, entry.drink, entry.count));
        }
        text
    };
    show_screen(&bot, &q, &text, keyboards::analytics_kb(), Some(ParseMode::Markdown)).await
}

async fn free_coffee_stats(bot: Bot, ctx: Arc<BotContext>, q: CallbackQuery) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;
    let total = ctx.db.count_orders().await?;
    let free = ctx.db.count_free_orders().await?;
    let percent = if total > 0 { free as f64 * 100.0 / total as f64 } else { 0.0 };
    let text = format!(
        "**🎁 Статистика по бесплатным заказам:**\n▪️ Всего бесплатных заказов: `{free}`\n▪️ Процент бесплатных: \
         `{percent:.1}%`"
    );
    show_screen(&bot, &q, &text, keyboards::analytics_kb(), Some(ParseMode::Markdown)).await
}

//--------------------------------------       exports        --------------------------------------------------------

async fn export_period(bot: Bot, ctx: Arc<BotContext>, q: CallbackQuery, period: ExportPeriod) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).text(format!("⏳ Формирую отчет за '{period}'...")).await?;
    send_report(&bot, &ctx, ChatId(q.from.id.0 as i64), period).await
}

/// The date typed after "✍️ Выбрать дату".
pub async fn export_date_received(
    bot: Bot,
    ctx: Arc<BotContext>,
    dialogue: BotDialogue,
    msg: Message,
) -> HandlerResult {
    let date = msg.text().and_then(|text| NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok());
    let Some(date) = date else {
        bot.send_message(msg.chat.id, "❗️Неверный формат. Пожалуйста, введите дату в формате `ГГГГ-ММ-ДД`.")
            .parse_mode(ParseMode::Markdown)
            .reply_markup(keyboards::cancel_input_kb())
            .await?;
        return Ok(());
    };
    dialogue.update(DialogueState::Idle).await?;
    send_report(&bot, &ctx, msg.chat.id, ExportPeriod::On(date)).await
}

/// Builds the CSV for `period` and sends it as a document.
async fn send_report(bot: &Bot, ctx: &BotContext, chat_id: ChatId, period: ExportPeriod) -> HandlerResult {
    let orders = ctx.db.orders_for_export(period).await?;
    if orders.is_empty() {
        bot.send_message(chat_id, "За выбранный период заказов не найдено.")
            .reply_markup(keyboards::export_kb())
            .await?;
        return Ok(());
    }
    let count = orders.len();
    let filename = export::report_filename(&period.to_string());
    let report = export::orders_to_csv(&orders)?;
    info!("👑️ Exporting {count} orders for period '{period}'");
    bot.send_document(chat_id, InputFile::memory(report).file_name(filename.clone()))
        .caption(format!("📄 Ваш отчет '{filename}'.\nВсего заказов: {count}"))
        .await?;
    Ok(())
}

//--------------------------------------      broadcasts      --------------------------------------------------------

async fn broadcast_menu(bot: Bot, ctx: Arc<BotContext>, q: CallbackQuery) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;
    let draft = ctx.db.broadcast_message().await?;
    let current = match (&draft.message_text, &draft.photo_id) {
        (Some(text), _) => text.clone(),
        (None, Some(_)) => "(только фото)".to_string(),
        (None, None) => "Сообщение для рассылки еще не задано.".to_string(),
    };
    let text = format!("Меню управления рассылкой.\n\n**Текущее сообщение:**\n\n{current}");
    show_screen(&bot, &q, &text, keyboards::broadcast_menu_kb(), Some(ParseMode::Markdown)).await
}

/// A new broadcast draft arrived: plain text, or a photo with an optional caption.
pub async fn broadcast_message_received(
    bot: Bot,
    ctx: Arc<BotContext>,
    dialogue: BotDialogue,
    msg: Message,
) -> HandlerResult {
    let photo_id = msg.photo().and_then(|sizes| sizes.last()).map(|size| size.file.id.clone());
    let text = msg.text().or(msg.caption()).map(str::to_string);
    if text.is_none() && photo_id.is_none() {
        bot.send_message(msg.chat.id, "Пришлите текст или картинку с подписью.")
            .reply_markup(keyboards::cancel_input_kb())
            .await?;
        return Ok(());
    }
    ctx.db.set_broadcast_message(text.clone(), photo_id.clone()).await?;
    dialogue.update(DialogueState::Idle).await?;
    bot.send_message(msg.chat.id, "✅ Сообщение для рассылки обновлено. Вот как оно выглядит:").await?;
    let draft = BroadcastMessage { message_text: text, photo_id };
    if let Err(e) = deliver_broadcast(&bot, msg.chat.id, &draft).await {
        warn!("👑️ Could not preview the broadcast draft: {e}");
    }
    bot.send_message(msg.chat.id, "Меню управления рассылкой.").reply_markup(keyboards::broadcast_menu_kb()).await?;
    Ok(())
}

async fn broadcast_confirm(bot: Bot, ctx: Arc<BotContext>, q: CallbackQuery) -> HandlerResult {
    let draft = ctx.db.broadcast_message().await?;
    if draft.is_empty() {
        bot.answer_callback_query(q.id.clone())
            .text("❌ Сначала нужно задать текст или фото для рассылки!")
            .show_alert(true)
            .await?;
        return Ok(());
    }
    bot.answer_callback_query(q.id.clone()).await?;
    let audience = ctx.db.count_active_customers().await?;
    let text = format!(
        "Вы уверены, что хотите начать рассылку?\n\nСообщение будет отправлено `{audience}` пользователям."
    );
    show_screen(&bot, &q, &text, keyboards::broadcast_confirm_kb(), Some(ParseMode::Markdown)).await
}

/// Fans the saved draft out to every active customer. Bounced deliveries deactivate the customer
/// so the next broadcast skips them.
async fn run_broadcast(bot: Bot, ctx: Arc<BotContext>, q: CallbackQuery) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).text("🚀 Рассылка запущена...").await?;
    let draft = ctx.db.broadcast_message().await?;
    let recipients = ctx.db.active_customer_ids().await?;
    let total = recipients.len();
    let admin_chat = ChatId(ctx.config.admin_chat_id);
    // One status message, edited in place as the run progresses
    let status = bot.send_message(admin_chat, format!("Начинаю рассылку для {total} пользователей...")).await?;
    let mut sent = 0usize;
    let mut failed = 0usize;
    for (i, user_id) in recipients.into_iter().enumerate() {
        match deliver_broadcast(&bot, ChatId(user_id), &draft).await {
            Ok(()) => sent += 1,
            Err(e) => {
                debug!("👑️ Broadcast delivery to {user_id} bounced: {e}");
                failed += 1;
                // A hiccup on one recipient must not strand the rest of the run
                if let Err(e) = ctx.db.deactivate_customer(user_id).await {
                    error!("👑️ Could not deactivate customer {user_id}: {e}");
                }
            },
        }
        if let Some(progress) = progress_report(i + 1, total, sent, failed) {
            if let Err(e) = bot.edit_message_text(admin_chat, status.id, progress).await {
                debug!("👑️ Could not refresh the broadcast progress message: {e}");
            }
        }
        // Stay well under Telegram's ~30 msg/s bot limit
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    info!("👑️ Broadcast finished: {sent} delivered, {failed} bounced out of {total}");
    let summary = format!(
        "✅ Рассылка завершена!\n\nУспешно отправлено: `{sent}`\nНе удалось отправить (и деактивировано): `{failed}`"
    );
    bot.edit_message_text(admin_chat, status.id, summary).parse_mode(ParseMode::Markdown).await?;
    Ok(())
}

/// The refreshed text for the admin's status message, produced every 20 recipients.
fn progress_report(processed: usize, total: usize, sent: usize, failed: usize) -> Option<String> {
    (processed % 20 == 0).then(|| {
        format!("Обработано: {processed}/{total}\n✅ Успешно: {sent}\n❌ Ошибок (юзеры деактивированы): {failed}")
    })
}

/// Sends the draft to one chat: a photo with an optional caption, or plain text.
async fn deliver_broadcast(
    bot: &Bot,
    chat_id: ChatId,
    draft: &BroadcastMessage,
) -> Result<(), teloxide::RequestError> {
    match (&draft.photo_id, &draft.message_text) {
        (Some(photo_id), caption) => {
            let mut request = bot.send_photo(chat_id, InputFile::file_id(photo_id.clone()));
            if let Some(caption) = caption {
                request = request.caption(caption.clone());
            }
            request.await?;
        },
        (None, Some(text)) => {
            bot.send_message(chat_id, text.clone()).await?;
        },
        (None, None) => {},
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn admin_callbacks_are_recognised() {
        assert!(is_admin_callback(callback::ADMIN_ANALYTICS));
        assert!(is_admin_callback(callback::EXPORT_BY_DATE));
        assert!(is_admin_callback(callback::BROADCAST_CONFIRM_YES));
        assert!(!is_admin_callback(callback::MAKE_ORDER));
        assert!(!is_admin_callback("client_arrived:9"));
    }

    #[test]
    fn export_dates_parse_strictly() {
        assert!(NaiveDate::parse_from_str("2025-10-31", "%Y-%m-%d").is_ok());
        assert!(NaiveDate::parse_from_str("31.10.2025", "%Y-%m-%d").is_err());
    }

    #[test]
    fn broadcast_progress_refreshes_every_twentieth_recipient() {
        // A 1000-user run updates the single status message 50 times, never more
        let updates = (1..=1000).filter(|n| progress_report(*n, 1000, *n, 0).is_some()).count();
        assert_eq!(updates, 50);
        assert!(progress_report(19, 100, 18, 1).is_none());
        let text = progress_report(20, 100, 18, 2).unwrap();
        assert_eq!(text, "Обработано: 20/100\n✅ Успешно: 18\n❌ Ошибок (юзеры деактивированы): 2");
    }
}
