//! CSV order reports for the admin panel.
use kofe_engine::db_types::Order;

/// The header row, in the column order the shop's spreadsheet expects.
const HEADERS: [&str; 11] = [
    "ID Заказа",
    "Дата и время",
    "Клиент",
    "Username",
    "Напиток",
    "Сироп",
    "Объем",
    "Добавка",
    "Сумма",
    "Статус Заказа",
    "Статус Оплаты",
];

/// Renders the orders as a semicolon-delimited CSV document.
pub fn orders_to_csv(orders: &[Order]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(Vec::new());
    writer.write_record(HEADERS)?;
    for order in orders {
        writer.write_record([
            order.order_id.to_string(),
            order.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            order.first_name.clone().unwrap_or_else(|| "N/A".to_string()),
            order.username.as_ref().map(|u| format!("@{u}")).unwrap_or_else(|| "N/A".to_string()),
            order.drink.to_string(),
            order.syrup.to_string(),
            format!("{} мл", order.cup),
            order.croissant.to_string(),
            order.total_price.value().to_string(),
            order.status.to_string(),
            order.payment_status.to_string(),
        ])?;
    }
    writer.into_inner().map_err(|e| e.into_error().into())
}

/// `report_{period}_{date}.csv`
pub fn report_filename(period: &str) -> String {
    format!("report_{period}_{}.csv", chrono::Utc::now().date_naive())
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use kofe_common::Tenge;
    use kofe_engine::{
        db_types::{OrderId, OrderStatus, PaymentStatus},
        menu::{Croissant, CupSize, Drink, PickupTime, Syrup},
    };

    use super::*;

    fn order(username: Option<&str>) -> Order {
        Order {
            order_id: OrderId(12),
            user_id: 55,
            username: username.map(str::to_string),
            first_name: Some("Диас".to_string()),
            drink: Drink::Latte,
            syrup: Syrup::Vanilla,
            cup: CupSize::Large,
            croissant: Croissant::NoCroissant,
            pickup_minutes: PickupTime::In15,
            is_free: false,
            total_price: Tenge::from_i64(1900),
            status: OrderStatus::Completed,
            payment_status: PaymentStatus::Paid,
            payment_id: Some("1717171717000".to_string()),
            timestamp: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn report_uses_semicolons_and_russian_headers() {
        let bytes = orders_to_csv(&[order(Some("dias_k"))]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "ID Заказа;Дата и время;Клиент;Username;Напиток;Сироп;Объем;Добавка;Сумма;Статус Заказа;Статус Оплаты"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("12;"));
        assert!(row.contains(";@dias_k;"));
        assert!(row.contains(";Лате;"));
        assert!(row.contains(";430 мл;"));
        assert!(row.contains(";1900;"));
        assert!(row.ends_with(";completed;paid"));
    }

    #[test]
    fn missing_username_renders_as_na() {
        let bytes = orders_to_csv(&[order(None)]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains(";N/A;Лате;"));
    }

    #[test]
    fn empty_report_is_just_the_header() {
        let bytes = orders_to_csv(&[]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
