//! The ordering conversation: drink, syrup, cup, pickup time, extras, confirmation, payment and
//! the pickup-stage buttons.
use std::{str::FromStr, sync::Arc};

use kofe_engine::{
    db_types::{CancelOutcome, NewOrder, OrderId, OrderStatus, PaymentState, ProfileUpdate},
    menu::{Croissant, CupSize, Drink, PickupTime, Syrup},
    traits::{CustomerManagement, OrderFlowDatabase, OrderFlowError},
};
use log::*;
use teloxide::prelude::*;
use url::Url;

use super::show_screen;
use crate::{
    context::BotContext,
    errors::{BotDialogue, HandlerResult},
    keyboards::{self, callback},
    state::{DialogueState, OrderDraft},
};

const CHOOSE_DRINK: &str = "Какой кофе хочешь сегодня? (Выбери из списка 👇)";
const CHOOSE_SYRUP: &str = "Добавить сироп?";
const CHOOSE_CUP: &str = "Какой объем подойдет?";
const CHOOSE_CUP_AGAIN: &str = "Выбери объем заново 👇";
const CHOOSE_TIME: &str = "Через сколько минут подойдешь за кофе?";
const OFFER_EXTRAS: &str = "Отлично! Хочешь добавить к кофе свежий круассан?";
const CHOOSE_CROISSANT: &str = "Выбери свой круассан:";

/// "☕ Сделать заказ": open the drink step.
pub async fn start_order(bot: Bot, _ctx: Arc<BotContext>, dialogue: BotDialogue, q: CallbackQuery) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;
    dialogue.update(DialogueState::SelectingDrink).await?;
    show_screen(&bot, &q, CHOOSE_DRINK, keyboards::drink_kb(), None).await
}

/// One button press inside the order conversation. Which step it belongs to is decided by the
/// dialogue state, not by the data, so stale buttons from an abandoned screen fall through
/// harmlessly.
pub async fn dialogue_step(
    bot: Bot,
    ctx: Arc<BotContext>,
    dialogue: BotDialogue,
    q: CallbackQuery,
    data: String,
) -> HandlerResult {
    let state = dialogue.get().await?.unwrap_or_default();
    match state {
        DialogueState::SelectingDrink => drink_chosen(bot, dialogue, q, &data).await,
        DialogueState::SelectingSyrup { draft } => syrup_chosen(bot, dialogue, q, draft, &data).await,
        DialogueState::SelectingCup { draft } => cup_chosen(bot, dialogue, q, draft, &data).await,
        DialogueState::SelectingPickupTime { draft } => time_chosen(bot, dialogue, q, draft, &data).await,
        DialogueState::OfferingExtras { draft } => extras_chosen(bot, ctx, dialogue, q, draft, &data).await,
        DialogueState::SelectingCroissant { draft } => croissant_chosen(bot, ctx, dialogue, q, draft, &data).await,
        DialogueState::Confirming { draft } => confirm_action(bot, ctx, dialogue, q, draft, &data).await,
        _ => {
            // A button from a screen that is no longer live. Acknowledge and move on.
            bot.answer_callback_query(q.id.clone()).await?;
            Ok(())
        },
    }
}

async fn drink_chosen(bot: Bot, dialogue: BotDialogue, q: CallbackQuery, data: &str) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;
    if data == callback::TYPE_CANCEL {
        dialogue.update(DialogueState::Idle).await?;
        return show_screen(&bot, &q, super::menu::GREETING, keyboards::main_menu_kb()?, None).await;
    }
    let Ok(drink) = Drink::from_str(data) else {
        return Ok(());
    };
    let draft = OrderDraft::with_drink(drink);
    if draft.has_syrup_step() {
        dialogue.update(DialogueState::SelectingSyrup { draft }).await?;
        show_screen(&bot, &q, CHOOSE_SYRUP, keyboards::syrup_kb(), None).await
    } else {
        dialogue.update(DialogueState::SelectingCup { draft }).await?;
        show_screen(&bot, &q, CHOOSE_CUP, keyboards::cup_kb(), None).await
    }
}

async fn syrup_chosen(
    bot: Bot,
    dialogue: BotDialogue,
    q: CallbackQuery,
    mut draft: OrderDraft,
    data: &str,
) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;
    let syrup = match data {
        callback::SYRUP_CARAMEL => Syrup::Caramel,
        callback::SYRUP_VANILLA => Syrup::Vanilla,
        callback::SYRUP_HAZELNUT => Syrup::Hazelnut,
        callback::SYRUP_SKIP => Syrup::NoSyrup,
        callback::SYRUP_BACK => {
            dialogue.update(DialogueState::SelectingDrink).await?;
            return show_screen(&bot, &q, CHOOSE_DRINK, keyboards::drink_kb(), None).await;
        },
        _ => return Ok(()),
    };
    draft.syrup = Some(syrup);
    dialogue.update(DialogueState::SelectingCup { draft }).await?;
    show_screen(&bot, &q, CHOOSE_CUP, keyboards::cup_kb(), None).await
}

async fn cup_chosen(
    bot: Bot,
    dialogue: BotDialogue,
    q: CallbackQuery,
    mut draft: OrderDraft,
    data: &str,
) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;
    if data == callback::CUP_BACK {
        return if draft.has_syrup_step() {
            dialogue.update(DialogueState::SelectingSyrup { draft }).await?;
            show_screen(&bot, &q, CHOOSE_SYRUP, keyboards::syrup_kb(), None).await
        } else {
            dialogue.update(DialogueState::SelectingDrink).await?;
            show_screen(&bot, &q, CHOOSE_DRINK, keyboards::drink_kb(), None).await
        };
    }
    let Ok(cup) = CupSize::from_str(data) else {
        return Ok(());
    };
    draft.cup = Some(cup);
    dialogue.update(DialogueState::SelectingPickupTime { draft }).await?;
    show_screen(&bot, &q, CHOOSE_TIME, keyboards::pickup_time_kb(), None).await
}

async fn time_chosen(
    bot: Bot,
    dialogue: BotDialogue,
    q: CallbackQuery,
    mut draft: OrderDraft,
    data: &str,
) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;
    if data == callback::TIME_BACK {
        dialogue.update(DialogueState::SelectingCup { draft }).await?;
        return show_screen(&bot, &q, CHOOSE_CUP_AGAIN, keyboards::cup_kb(), None).await;
    }
    let Ok(pickup) = PickupTime::from_str(data) else {
        return Ok(());
    };
    draft.pickup = Some(pickup);
    dialogue.update(DialogueState::OfferingExtras { draft }).await?;
    show_screen(&bot, &q, OFFER_EXTRAS, keyboards::extras_kb(), None).await
}

async fn extras_chosen(
    bot: Bot,
    ctx: Arc<BotContext>,
    dialogue: BotDialogue,
    q: CallbackQuery,
    draft: OrderDraft,
    data: &str,
) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;
    match data {
        callback::ADD_CROISSANT => {
            dialogue.update(DialogueState::SelectingCroissant { draft }).await?;
            show_screen(&bot, &q, CHOOSE_CROISSANT, keyboards::croissant_kb(), None).await
        },
        callback::CHECKOUT => show_confirmation(bot, ctx, dialogue, q, draft).await,
        _ => Ok(()),
    }
}

async fn croissant_chosen(
    bot: Bot,
    ctx: Arc<BotContext>,
    dialogue: BotDialogue,
    q: CallbackQuery,
    mut draft: OrderDraft,
    data: &str,
) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;
    let croissant = match data {
        callback::CROISSANT_CLASSIC => Croissant::Classic,
        callback::CROISSANT_CHOCOLATE => Croissant::Chocolate,
        callback::CROISSANT_ALMOND => Croissant::Almond,
        callback::ADDON_BACK => {
            dialogue.update(DialogueState::OfferingExtras { draft }).await?;
            return show_screen(&bot, &q, OFFER_EXTRAS, keyboards::extras_kb(), None).await;
        },
        _ => return Ok(()),
    };
    draft.croissant = Some(croissant);
    show_confirmation(bot, ctx, dialogue, q, draft).await
}

/// The final "check everything" screen, with pay / free-coffee options driven by the customer's
/// loyalty balance.
async fn show_confirmation(
    bot: Bot,
    ctx: Arc<BotContext>,
    dialogue: BotDialogue,
    q: CallbackQuery,
    draft: OrderDraft,
) -> HandlerResult {
    let Some(items) = draft.items() else {
        // A mandatory step is missing somehow. Start the order over.
        dialogue.update(DialogueState::SelectingDrink).await?;
        return show_screen(&bot, &q, CHOOSE_DRINK, keyboards::drink_kb(), None).await;
    };
    let account = ctx.db.ensure_loyalty_account(q.from.id.0 as i64).await?;
    let text = if draft.is_free {
        format!("✅ Кофе будет бесплатным!\n\n{}\n\nОсталось подтвердить заказ.", items.summary())
    } else {
        format!(
            "Проверь всё перед отправкой 👇\n\n{}\n\n💰 Сумма к оплате: {}\n\nВсё верно?",
            items.summary(),
            items.total()
        )
    };
    let keyboard = keyboards::confirm_kb(account.free_coffees, draft.is_free);
    dialogue.update(DialogueState::Confirming { draft }).await?;
    show_screen(&bot, &q, &text, keyboard, None).await
}

async fn confirm_action(
    bot: Bot,
    ctx: Arc<BotContext>,
    dialogue: BotDialogue,
    q: CallbackQuery,
    draft: OrderDraft,
    data: &str,
) -> HandlerResult {
    match data {
        callback::CREATE_ORDER => create_order(bot, ctx, dialogue, q, draft).await,
        callback::EDIT_ORDER => {
            bot.answer_callback_query(q.id.clone()).await?;
            dialogue.update(DialogueState::SelectingDrink).await?;
            show_screen(&bot, &q, "Окей, выбери кофе заново 👇", keyboards::drink_kb(), None).await
        },
        callback::PAY_ORDER => pay_order(bot, ctx, q, draft).await,
        callback::USE_FREE_COFFEE => use_free_coffee(bot, ctx, dialogue, q, draft).await,
        _ => {
            bot.answer_callback_query(q.id.clone()).await?;
            Ok(())
        },
    }
}

/// "✅Подтвердить": place the order for payment at the counter (or settled with a bonus coffee).
async fn create_order(
    bot: Bot,
    ctx: Arc<BotContext>,
    dialogue: BotDialogue,
    q: CallbackQuery,
    draft: OrderDraft,
) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).text("⏳ Минуточку, оформляем ваш заказ...").await?;
    let Some(items) = draft.items() else {
        dialogue.update(DialogueState::SelectingDrink).await?;
        return show_screen(&bot, &q, CHOOSE_DRINK, keyboards::drink_kb(), None).await;
    };
    let mut new_order = NewOrder::new(profile_of(&q), items);
    if draft.is_free {
        new_order = new_order.free();
    }
    match ctx.api.place_order(new_order).await {
        Ok(order) => {
            dialogue.update(DialogueState::Idle).await?;
            ctx.notifier.notify_new_order(&order).await;
            let text = if order.is_free {
                format!(
                    "✅ Ваш заказ №{} оформлен (оплачено бонусом)!\nКогда будешь у входа — нажми кнопку ниже, и \
                     мы вынесем напиток 👇",
                    order.order_id
                )
            } else {
                format!(
                    "✅ Ваш заказ №{} на сумму {} оформлен!\nКогда будешь у входа — нажми кнопку ниже, и мы \
                     вынесем напиток 👇",
                    order.order_id, order.total_price
                )
            };
            show_screen(&bot, &q, &text, keyboards::pickup_kb(order.order_id), None).await
        },
        Err(OrderFlowError::NoFreeCoffees(user_id)) => {
            // The balance was spent between showing the button and pressing it.
            warn!("💳️ Customer {user_id} confirmed a free order without a bonus to spend");
            let mut draft = draft;
            draft.is_free = false;
            show_confirmation(bot, ctx, dialogue, q, draft).await
        },
        Err(e) => {
            error!("💳️ Could not place an order for customer {}: {e}", q.from.id);
            let text = "❌ Произошла ошибка при создании заказа.\n\nПожалуйста, попробуйте подтвердить его еще \
                        раз.";
            let account = ctx.db.ensure_loyalty_account(q.from.id.0 as i64).await?;
            show_screen(&bot, &q, text, keyboards::confirm_kb(account.free_coffees, draft.is_free), None).await
        },
    }
}

/// "☕ Списать бесплатный кофе": marks the draft as paid with a loyalty coffee.
async fn use_free_coffee(
    bot: Bot,
    ctx: Arc<BotContext>,
    dialogue: BotDialogue,
    q: CallbackQuery,
    mut draft: OrderDraft,
) -> HandlerResult {
    let account = ctx.db.ensure_loyalty_account(q.from.id.0 as i64).await?;
    if account.free_coffees <= 0 {
        bot.answer_callback_query(q.id.clone())
            .text("У вас нет бесплатных кофе для списания.")
            .show_alert(true)
            .await?;
        return Ok(());
    }
    bot.answer_callback_query(q.id.clone()).text("✅ Бонус применен!").await?;
    draft.is_free = true;
    show_confirmation(bot, ctx, dialogue, q, draft).await
}

/// "💳 Оплатить онлайн": opens a pending payment and hands out the gateway invoice link. The order
/// itself is created by the payment webhook once the gateway confirms.
async fn pay_order(bot: Bot, ctx: Arc<BotContext>, q: CallbackQuery, draft: OrderDraft) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).text("⏳ Создаем счет на оплату...").await?;
    let Some(items) = draft.items() else {
        return Ok(());
    };
    let mut description = format!("Оплата заказа: Кофе: {}", items.drink);
    if items.syrup.is_some() {
        description.push_str(&format!(", Сироп: {}", items.syrup));
    }
    if items.croissant.is_some() {
        description.push_str(&format!(", Добавка: {}", items.croissant));
    }
    let payment = match ctx.api.begin_payment(q.from.id.0 as i64, &items, description.clone()).await {
        Ok(payment) => payment,
        Err(e) => {
            error!("💳️ Could not open a payment for customer {}: {e}", q.from.id);
            bot.send_message(
                ChatId(q.from.id.0 as i64),
                "Произошла ошибка при создании счета. Пожалуйста, попробуйте позже.",
            )
            .await?;
            return Ok(());
        },
    };
    let back_link = ctx.payment_back_link();
    match ctx.epay.create_invoice(payment.amount, &payment.payment_id, &description, &back_link).await {
        Ok(invoice_url) => {
            let invoice_url = Url::parse(&invoice_url)?;
            show_screen(
                &bot,
                &q,
                "Ваш счет на оплату готов.",
                keyboards::pay_kb(payment.amount, invoice_url),
                None,
            )
            .await
        },
        Err(e) => {
            error!("💳️ Invoice creation failed for payment {}: {e}", payment.payment_id);
            ctx.api.db().mark_payment_state(&payment.payment_id, PaymentState::Error).await?;
            bot.send_message(ChatId(q.from.id.0 as i64), "Не удалось создать ссылку на оплату. Попробуйте позже.")
                .await?;
            Ok(())
        },
    }
}

/// "🚶‍♂️ Я подошел(ла)". Stateless: the button data carries the order id, so this also works for
/// the keyboard the payment webhook sends.
pub async fn client_arrived(
    bot: Bot,
    ctx: Arc<BotContext>,
    dialogue: BotDialogue,
    q: CallbackQuery,
    data: &str,
) -> HandlerResult {
    let Some(order_id) = parse_order_id(data, callback::ARRIVED_PREFIX) else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    match ctx.api.update_status(order_id, OrderStatus::Arrived).await {
        Ok(order) => {
            bot.answer_callback_query(q.id.clone()).text("Отлично, бариста уведомлен!").await?;
            ctx.notifier.notify_arrived(&order).await;
            dialogue.update(DialogueState::Idle).await?;
            show_screen(&bot, &q, super::menu::GREETING, keyboards::main_menu_kb()?, None).await
        },
        Err(OrderFlowError::OrderNotFound(_)) => {
            bot.answer_callback_query(q.id.clone())
                .text("Заказ не найден в системе.")
                .show_alert(true)
                .await?;
            Ok(())
        },
        Err(e) => Err(e.into()),
    }
}

/// "❌ Отменить заказ": honoured only inside the grace window.
pub async fn cancel_order(
    bot: Bot,
    ctx: Arc<BotContext>,
    dialogue: BotDialogue,
    q: CallbackQuery,
    data: &str,
) -> HandlerResult {
    let Some(order_id) = parse_order_id(data, callback::CANCEL_ORDER_PREFIX) else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    match ctx.api.cancel_order(order_id).await? {
        CancelOutcome::Cancelled(_) => {
            bot.answer_callback_query(q.id.clone()).text("Заказ отменяется...").await?;
            dialogue.update(DialogueState::Idle).await?;
            show_screen(&bot, &q, "✅ Ваш заказ был успешно отменен.", keyboards::main_menu_kb()?, None).await
        },
        CancelOutcome::TooLate => {
            bot.answer_callback_query(q.id.clone())
                .text("❌ Прошло более 3 минут, отменить заказ уже нельзя.")
                .show_alert(true)
                .await?;
            if let Some(msg) = q.regular_message() {
                bot.edit_message_reply_markup(msg.chat.id, msg.id)
                    .reply_markup(keyboards::arrived_only_kb(order_id))
                    .await?;
            }
            Ok(())
        },
        CancelOutcome::NotFound => {
            bot.answer_callback_query(q.id.clone())
                .text("Заказ не найден в системе.")
                .show_alert(true)
                .await?;
            Ok(())
        },
    }
}

fn parse_order_id(data: &str, prefix: &str) -> Option<OrderId> {
    data.strip_prefix(prefix)?.parse().map(OrderId).ok()
}

fn profile_of(q: &CallbackQuery) -> ProfileUpdate {
    ProfileUpdate {
        telegram_id: q.from.id.0 as i64,
        username: q.from.username.clone(),
        first_name: Some(q.from.first_name.clone()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pickup_callback_data_round_trips() {
        assert_eq!(parse_order_id("client_arrived:42", callback::ARRIVED_PREFIX), Some(OrderId(42)));
        assert_eq!(parse_order_id("cancel_order:7", callback::CANCEL_ORDER_PREFIX), Some(OrderId(7)));
        assert_eq!(parse_order_id("cancel_order:oops", callback::CANCEL_ORDER_PREFIX), None);
        assert_eq!(parse_order_id("client_arrived:42", callback::CANCEL_ORDER_PREFIX), None);
    }

    #[test]
    fn menu_labels_double_as_callback_data() {
        // The drink keyboard sends the display label back as the callback payload
        for drink in Drink::ALL {
            assert_eq!(Drink::from_str(&drink.to_string()).ok(), Some(drink));
        }
        assert!(Drink::from_str("syrup_back").is_err());
    }
}
