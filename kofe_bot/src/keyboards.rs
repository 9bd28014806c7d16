//! Every inline keyboard the bot shows, with the callback data values the handlers match on.
use kofe_common::Tenge;
use kofe_engine::{
    db_types::OrderId,
    menu::{CupSize, Drink, PickupTime},
};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, WebAppInfo};
use url::Url;

pub const PROMO_URL: &str = "https://teletype.in/@kafe_tester_bot/_HnAALeGpj0";
pub const ABOUT_URL: &str = "https://teletype.in/@kafe_tester_bot/MF1iYzAR9LB";

/// Callback data values. Pickup-stage buttons carry the order id after the prefix so the handler
/// does not depend on dialogue state (the payment webhook sends the same keyboard out of band).
pub mod callback {
    pub const MAKE_ORDER: &str = "make_order";
    pub const MAIN_MENU: &str = "main_menu";
    pub const PARTNERS: &str = "partners";
    pub const BUY_BOT: &str = "buy_bot";
    pub const TYPE_CANCEL: &str = "type_cancel";
    pub const SYRUP_CARAMEL: &str = "syrup_caramel";
    pub const SYRUP_VANILLA: &str = "syrup_vanilla";
    pub const SYRUP_HAZELNUT: &str = "syrup_hazelnut";
    pub const SYRUP_SKIP: &str = "syrup_skip";
    pub const SYRUP_BACK: &str = "syrup_back";
    pub const CUP_BACK: &str = "cup_back";
    pub const TIME_BACK: &str = "time_back";
    pub const ADD_CROISSANT: &str = "add_croissant";
    pub const CHECKOUT: &str = "checkout";
    pub const CROISSANT_CLASSIC: &str = "croissant_classic";
    pub const CROISSANT_CHOCOLATE: &str = "croissant_chocolate";
    pub const CROISSANT_ALMOND: &str = "croissant_almond";
    pub const ADDON_BACK: &str = "addon_back";
    pub const CREATE_ORDER: &str = "create_order";
    pub const EDIT_ORDER: &str = "loyal_program";
    pub const PAY_ORDER: &str = "pay_order";
    pub const USE_FREE_COFFEE: &str = "use_free_coffee";
    pub const ARRIVED_PREFIX: &str = "client_arrived:";
    pub const CANCEL_ORDER_PREFIX: &str = "cancel_order:";
    // admin panel
    pub const ADMIN_ANALYTICS: &str = "admin_analytics";
    pub const ANALYTICS_ORDERS: &str = "analytics_orders";
    pub const ANALYTICS_TOP_DRINKS: &str = "analytics_top_drinks";
    pub const ANALYTICS_FREE_COFFEES: &str = "analytics_free_coffees";
    pub const ADMIN_PANEL_BACK: &str = "admin_panel_back";
    pub const CANCEL_INPUT: &str = "cancel_input";
    pub const GET_REPORT: &str = "get_report";
    pub const EXPORT_TODAY: &str = "export_today";
    pub const EXPORT_WEEK: &str = "export_week";
    pub const EXPORT_MONTH: &str = "export_month";
    pub const EXPORT_ALL: &str = "export_all";
    pub const EXPORT_BY_DATE: &str = "export_by_date";
    pub const ADMIN_BROADCAST: &str = "admin_broadcast";
    pub const BROADCAST_CHANGE_TEXT: &str = "broadcast_change_text";
    pub const BROADCAST_START: &str = "broadcast_start";
    pub const BROADCAST_CONFIRM_YES: &str = "broadcast_confirm_yes";
    pub const BROADCAST_CONFIRM_NO: &str = "broadcast_confirm_no";
}

//--------------------------------------    customer menus    --------------------------------------------------------

pub fn main_menu_kb() -> Result<InlineKeyboardMarkup, url::ParseError> {
    Ok(InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("☕ Сделать заказ", callback::MAKE_ORDER)],
        vec![InlineKeyboardButton::url("🔥 Акции", Url::parse(PROMO_URL)?)],
        vec![InlineKeyboardButton::callback("🤝 Приведи друга", callback::PARTNERS)],
        vec![InlineKeyboardButton::url("ℹ️ О нас", Url::parse(ABOUT_URL)?)],
        vec![InlineKeyboardButton::callback("❗️❗️❗️ Хочу Бота ❗️❗️❗️", callback::BUY_BOT)],
    ]))
}

/// The drink buttons use the Russian labels as their own callback data.
pub fn drink_kb() -> InlineKeyboardMarkup {
    let mut rows = Drink::ALL
        .iter()
        .map(|drink| vec![InlineKeyboardButton::callback(drink.to_string(), drink.to_string())])
        .collect::<Vec<_>>();
    rows.push(vec![InlineKeyboardButton::callback("❌Отмена", callback::TYPE_CANCEL)]);
    InlineKeyboardMarkup::new(rows)
}

pub fn syrup_kb() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("🍯 Карамельный (+300Т)", callback::SYRUP_CARAMEL)],
        vec![InlineKeyboardButton::callback("🍦 Ванильный (+300Т)", callback::SYRUP_VANILLA)],
        vec![InlineKeyboardButton::callback("🌰 Ореховый (+300Т)", callback::SYRUP_HAZELNUT)],
        vec![InlineKeyboardButton::callback("❌ Нет, спасибо", callback::SYRUP_SKIP)],
        vec![InlineKeyboardButton::callback("🔙 Назад", callback::SYRUP_BACK)],
    ])
}

/// Cup buttons answer with the raw millilitre number.
pub fn cup_kb() -> InlineKeyboardMarkup {
    let mut rows = CupSize::ALL
        .iter()
        .map(|cup| vec![InlineKeyboardButton::callback(format!("{cup} мл"), cup.to_string())])
        .collect::<Vec<_>>();
    rows.push(vec![InlineKeyboardButton::callback("🔙Назад", callback::CUP_BACK)]);
    InlineKeyboardMarkup::new(rows)
}

/// Pickup-time buttons answer with the raw minute number.
pub fn pickup_time_kb() -> InlineKeyboardMarkup {
    let mut rows = PickupTime::ALL
        .iter()
        .map(|time| vec![InlineKeyboardButton::callback(format!("{time} минут"), time.to_string())])
        .collect::<Vec<_>>();
    rows.push(vec![InlineKeyboardButton::callback("🔙Назад", callback::TIME_BACK)]);
    InlineKeyboardMarkup::new(rows)
}

pub fn extras_kb() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("🥐 Добавить круассан", callback::ADD_CROISSANT)],
        vec![InlineKeyboardButton::callback("✅ Перейти к оформлению", callback::CHECKOUT)],
    ])
}

pub fn croissant_kb() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("🥐 Классический (+700Т)", callback::CROISSANT_CLASSIC)],
        vec![InlineKeyboardButton::callback("🍫 Шоколадный (+700Т)", callback::CROISSANT_CHOCOLATE)],
        vec![InlineKeyboardButton::callback("🥨 Миндальный (+700Т)", callback::CROISSANT_ALMOND)],
        vec![InlineKeyboardButton::callback("🔙 Назад", callback::ADDON_BACK)],
    ])
}

/// The confirmation keyboard. The free-coffee button only shows up while there is a balance to
/// spend and the draft has not already been marked free; the pay button disappears once it has.
pub fn confirm_kb(free_coffees: i64, is_free: bool) -> InlineKeyboardMarkup {
    let mut rows = vec![
        vec![InlineKeyboardButton::callback("✅Подтвердить", callback::CREATE_ORDER)],
        vec![InlineKeyboardButton::callback("🖊Изменить", callback::EDIT_ORDER)],
    ];
    if !is_free {
        rows.push(vec![InlineKeyboardButton::callback("💳 Оплатить онлайн", callback::PAY_ORDER)]);
        if free_coffees > 0 {
            rows.push(vec![InlineKeyboardButton::callback(
                format!("☕ Списать бесплатный кофе ({free_coffees})"),
                callback::USE_FREE_COFFEE,
            )]);
        }
    }
    InlineKeyboardMarkup::new(rows)
}

pub fn pickup_kb(order_id: OrderId) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "🚶‍♂️ Я подошел(ла)",
            format!("{}{order_id}", callback::ARRIVED_PREFIX),
        )],
        vec![InlineKeyboardButton::callback(
            "❌ Отменить заказ (в течение 3 мин)",
            format!("{}{order_id}", callback::CANCEL_ORDER_PREFIX),
        )],
    ])
}

/// Shown once the cancellation window has closed.
pub fn arrived_only_kb(order_id: OrderId) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "🚶‍♂️ Я подошел(ла)",
        format!("{}{order_id}", callback::ARRIVED_PREFIX),
    )]])
}

pub fn partners_kb() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback("🔙Назад", callback::MAIN_MENU)]])
}

pub fn pay_kb(amount: Tenge, invoice_url: Url) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::url(
        format!("Оплатить {} KZT", amount.value()),
        invoice_url,
    )]])
}

pub fn board_kb(board_url: Url) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::web_app(
        "Открыть доску заказов 📋",
        WebAppInfo { url: board_url },
    )]])
}

//--------------------------------------     admin menus      --------------------------------------------------------

pub fn admin_panel_kb() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("📊 Аналитика", callback::ADMIN_ANALYTICS)],
        vec![InlineKeyboardButton::callback("📄 Экспорт заказов", callback::GET_REPORT)],
        vec![InlineKeyboardButton::callback("📮 Рассылка", callback::ADMIN_BROADCAST)],
    ])
}

pub fn analytics_kb() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("📊 Аналитика заказов", callback::ANALYTICS_ORDERS),
            InlineKeyboardButton::callback("📈 Топ напитков", callback::ANALYTICS_TOP_DRINKS),
        ],
        vec![InlineKeyboardButton::callback("🎁 Бесплатные заказы", callback::ANALYTICS_FREE_COFFEES)],
        vec![InlineKeyboardButton::callback("⬅️ Назад в админ-панель", callback::ADMIN_PANEL_BACK)],
    ])
}

pub fn cancel_input_kb() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback("❌ Отмена", callback::CANCEL_INPUT)]])
}

pub fn export_kb() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("📄 За сегодня", callback::EXPORT_TODAY),
            InlineKeyboardButton::callback("📅 За неделю", callback::EXPORT_WEEK),
        ],
        vec![
            InlineKeyboardButton::callback("🗓 За месяц", callback::EXPORT_MONTH),
            InlineKeyboardButton::callback("🗂 За все время", callback::EXPORT_ALL),
        ],
        vec![InlineKeyboardButton::callback("✍️ Выбрать дату", callback::EXPORT_BY_DATE)],
        vec![InlineKeyboardButton::callback("⬅️ Назад в админ-панель", callback::ADMIN_PANEL_BACK)],
    ])
}

pub fn broadcast_menu_kb() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("✍️ Изменить текст/фото", callback::BROADCAST_CHANGE_TEXT)],
        vec![InlineKeyboardButton::callback("🚀 Начать рассылку", callback::BROADCAST_START)],
        vec![InlineKeyboardButton::callback("⬅️ Назад в админ-панель", callback::ADMIN_PANEL_BACK)],
    ])
}

pub fn broadcast_confirm_kb() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("✅ ДА, Я УВЕРЕН", callback::BROADCAST_CONFIRM_YES)],
        vec![InlineKeyboardButton::callback("❌ НЕТ, ОТМЕНА", callback::BROADCAST_CONFIRM_NO)],
    ])
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn menu_urls_parse() {
        let kb = main_menu_kb().expect("static menu URLs must parse");
        assert_eq!(kb.inline_keyboard.len(), 5);
    }

    #[test]
    fn free_coffee_button_tracks_the_balance() {
        assert_eq!(confirm_kb(0, false).inline_keyboard.len(), 3);
        assert_eq!(confirm_kb(2, false).inline_keyboard.len(), 4);
        // Once the draft is free there is nothing left to pay or redeem
        assert_eq!(confirm_kb(2, true).inline_keyboard.len(), 2);
    }

    #[test]
    fn pickup_buttons_carry_the_order_id() {
        let kb = pickup_kb(OrderId(42));
        let data = kb.inline_keyboard[0][0].kind.clone();
        match data {
            teloxide::types::InlineKeyboardButtonKind::CallbackData(d) => {
                assert_eq!(d, "client_arrived:42")
            },
            other => panic!("expected callback data, got {other:?}"),
        }
    }
}
