//! Out-of-band Telegram pushes: barista cards, loyalty bonuses, payment outcomes and admin
//! lifecycle messages.
//!
//! Every send here logs and continues on failure. An undelivered notification must never fail the
//! order flow that triggered it.
use kofe_engine::db_types::{Order, PaymentStatus};
use log::*;
use teloxide::{prelude::*, types::ParseMode};

use crate::{config::BotConfig, keyboards};

#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    admin_chat_id: ChatId,
    barista_id: ChatId,
}

impl TelegramNotifier {
    pub fn new(bot: Bot, config: &BotConfig) -> Self {
        Self { bot, admin_chat_id: ChatId(config.admin_chat_id), barista_id: ChatId(config.barista_id) }
    }

    /// The detailed new-order card for the barista. If the send fails, a short fallback line goes
    /// out instead so the order is never silently missed.
    pub async fn notify_new_order(&self, order: &Order) {
        let header = format!("❗️❗️❗️ <b>Новый заказ №{}</b>", order.order_id);
        let payment_info = match order.payment_status {
            PaymentStatus::Paid => format!("✅ <b>ОПЛАЧЕНО ОНЛАЙН:</b> {}", order.total_price),
            PaymentStatus::Bonus => "🎁 <b>ОПЛАЧЕНО БОНУСОМ</b>".to_string(),
            PaymentStatus::Unpaid => format!("💰 <b>НЕ ОПЛАЧЕНО (оплата на месте):</b> {}", order.total_price),
        };
        let text = format!("{header}\n{}\n\n{}\n\n{payment_info}", client_line(order), order_card(order));
        let sent = self.bot.send_message(self.barista_id, text).parse_mode(ParseMode::Html).await;
        if let Err(e) = sent {
            error!("📬️ Failed to send the order #{} card to the barista: {e}", order.order_id);
            let fallback = format!("❗️Новый заказ №{}. Не удалось загрузить детали.", order.order_id);
            if let Err(e) = self.bot.send_message(self.barista_id, fallback).await {
                error!("📬️ Even the fallback notification for order #{} failed: {e}", order.order_id);
            }
        }
    }

    /// Tells the barista the customer is waiting at the door.
    pub async fn notify_arrived(&self, order: &Order) {
        let payment_info = match order.payment_status {
            PaymentStatus::Paid => "✅ <b>ОПЛАЧЕНО ОНЛАЙН</b>".to_string(),
            PaymentStatus::Bonus => "🎁 <b>ОПЛАЧЕНО БОНУСОМ</b>".to_string(),
            PaymentStatus::Unpaid => format!("💰 <b>ОПЛАТА НА МЕСТЕ: {}</b>", order.total_price),
        };
        let text = format!(
            "🚶‍♂️ <b>Клиент подошел!</b> (Заказ №{})\n{}\n\n{}\n\n{payment_info}",
            order.order_id,
            client_line(order),
            order_card(order)
        );
        if let Err(e) = self.bot.send_message(self.barista_id, text).parse_mode(ParseMode::Html).await {
            error!("📬️ Failed to notify the barista that order #{} arrived: {e}", order.order_id);
        }
    }

    pub async fn notify_bonus_awarded(&self, referrer_id: i64) {
        let text = "🎉 Вам начислен бонус! За то, что ваш друг сделал первый заказ, вы получили один \
                    бесплатный кофе.";
        if let Err(e) = self.bot.send_message(ChatId(referrer_id), text).await {
            warn!("📬️ Could not deliver the referral bonus message to {referrer_id}: {e}");
        }
    }

    /// Confirms a settled online payment to the customer, with the pickup buttons attached.
    pub async fn notify_payment_success(&self, user_id: i64, order: &Order) {
        let text = format!(
            "✅ Ваш заказ №{} на сумму {} успешно оплачен!\nКогда будешь у входа — нажми кнопку ниже, и мы \
             вынесем напиток 👇",
            order.order_id, order.total_price
        );
        let sent = self
            .bot
            .send_message(ChatId(user_id), text)
            .reply_markup(keyboards::pickup_kb(order.order_id))
            .await;
        if let Err(e) = sent {
            error!("📬️ Failed to confirm payment for order #{} to {user_id}: {e}", order.order_id);
        }
    }

    pub async fn notify_payment_failed(&self, user_id: i64, reason: Option<&str>) {
        let reason = reason.unwrap_or("Неизвестная ошибка");
        let text = format!("❌ Ваша оплата не удалась. Причина: {reason}.");
        if let Err(e) = self.bot.send_message(ChatId(user_id), text).await {
            error!("📬️ Failed to deliver the payment-failure message to {user_id}: {e}");
        }
    }

    /// The payment settled but the order could not be placed. Support territory.
    pub async fn notify_payment_error(&self, user_id: i64) {
        let text = "❌ Оплата прошла, но произошла ошибка при оформлении заказа. Свяжитесь с поддержкой.";
        if let Err(e) = self.bot.send_message(ChatId(user_id), text).await {
            error!("📬️ Failed to deliver the payment-error message to {user_id}: {e}");
        }
    }

    pub async fn notify_buy_bot_request(&self, handle: &str) {
        let text = format!("❗️❗️❗️ Клиент {handle} хочет купить бота. Свяжись с ним НЕМЕДЛЕННО!!!");
        if let Err(e) = self.bot.send_message(self.admin_chat_id, text).await {
            error!("📬️ Failed to forward a purchase lead to the admin: {e}");
        }
    }

    pub async fn startup(&self) {
        self.send_to_admin("🚀 Бот запущен и готов к работе!").await;
    }

    pub async fn shutdown(&self) {
        self.send_to_admin("🛑 Бот остановлен.").await;
    }

    /// Forwards a pre-truncated error report to the admin.
    pub async fn report_error(&self, report: &str) {
        self.send_to_admin(report).await;
    }

    async fn send_to_admin(&self, text: &str) {
        if let Err(e) = self.bot.send_message(self.admin_chat_id, text.to_string()).await {
            error!("📬️ Failed to message the admin: {e}");
        }
    }
}

/// `@username`, falling back to the first name for customers without a handle.
fn client_line(order: &Order) -> String {
    match (&order.username, &order.first_name) {
        (Some(username), _) => format!("👤 <b>Клиент:</b> @{username}"),
        (None, Some(first_name)) => format!("👤 <b>Клиент:</b> {first_name}"),
        (None, None) => format!("👤 <b>Клиент:</b> id {}", order.user_id),
    }
}

/// The order details block both barista cards share.
fn order_card(order: &Order) -> String {
    let mut lines = vec![format!("☕️ <b>Напиток:</b> {}", order.drink)];
    if order.syrup.is_some() {
        lines.push(format!("🍯 <b>Сироп:</b> {}", order.syrup));
    }
    lines.push(format!("📏 <b>Объем:</b> {} мл", order.cup));
    if order.croissant.is_some() {
        lines.push(format!("🥐 <b>Добавка:</b> {}", order.croissant));
    }
    lines.push(format!("⏱️ <b>Будет через:</b> {} минут", order.pickup_minutes));
    lines.push(format!("⏱️ <b>Создан:</b> {}", order.created_at.format("%H:%M")));
    lines.join("\n")
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use kofe_common::Tenge;
    use kofe_engine::{
        db_types::{OrderId, OrderStatus},
        menu::{Croissant, CupSize, Drink, PickupTime, Syrup},
    };

    use super::*;

    fn order() -> Order {
        Order {
            order_id: OrderId(7),
            user_id: 100,
            username: Some("aruzhan".to_string()),
            first_name: Some("Аружан".to_string()),
            drink: Drink::Cappuccino,
            syrup: Syrup::NoSyrup,
            cup: CupSize::Medium,
            croissant: Croissant::Almond,
            pickup_minutes: PickupTime::In10,
            is_free: false,
            total_price: Tenge::from_i64(2100),
            status: OrderStatus::New,
            payment_status: PaymentStatus::Unpaid,
            payment_id: None,
            timestamp: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn card_skips_declined_extras() {
        let card = order_card(&order());
        assert!(!card.contains("Сироп"));
        assert!(card.contains("🥐 <b>Добавка:</b> Миндальный"));
        assert!(card.contains("📏 <b>Объем:</b> 330 мл"));
    }

    #[test]
    fn client_line_prefers_the_username() {
        let mut o = order();
        assert_eq!(client_line(&o), "👤 <b>Клиент:</b> @aruzhan");
        o.username = None;
        assert_eq!(client_line(&o), "👤 <b>Клиент:</b> Аружан");
    }
}
