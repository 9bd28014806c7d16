//! The drinks menu and its price list.
//!
//! Everything the customer picks in the chat dialogue is represented here as a typed enum, with the
//! exact Russian labels that appear on the buttons doubling as the storage and wire format. The
//! price table lives in [`price_of`]; a cart snapshot is an [`OrderItems`].

use std::{fmt::Display, str::FromStr};

use kofe_common::Tenge;
use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

/// Surcharge for any syrup, independent of the flavour.
pub const SYRUP_PRICE: Tenge = Tenge::from_i64(300);
/// Surcharge for any croissant, independent of the filling.
pub const CROISSANT_PRICE: Tenge = Tenge::from_i64(700);

#[derive(Debug, Clone, Error)]
#[error("'{0}' is not on the menu")]
pub struct MenuParseError(pub String);

//--------------------------------------       Drink         ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum Drink {
    #[sqlx(rename = "Эспрессо")]
    #[serde(rename = "Эспрессо")]
    Espresso,
    #[sqlx(rename = "Американо")]
    #[serde(rename = "Американо")]
    Americano,
    #[sqlx(rename = "Капучино")]
    #[serde(rename = "Капучино")]
    Cappuccino,
    #[sqlx(rename = "Лате")]
    #[serde(rename = "Лате")]
    Latte,
}

impl Drink {
    pub const ALL: [Drink; 4] = [Drink::Espresso, Drink::Americano, Drink::Cappuccino, Drink::Latte];
}

impl Display for Drink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Drink::Espresso => "Эспрессо",
            Drink::Americano => "Американо",
            Drink::Cappuccino => "Капучино",
            Drink::Latte => "Лате",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Drink {
    type Err = MenuParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Эспрессо" => Ok(Drink::Espresso),
            "Американо" => Ok(Drink::Americano),
            "Капучино" => Ok(Drink::Cappuccino),
            "Лате" => Ok(Drink::Latte),
            other => Err(MenuParseError(other.to_string())),
        }
    }
}

//--------------------------------------       Syrup         ---------------------------------------------------------
/// A syrup choice. `NoSyrup` is a first-class value so that the stored order always carries an
/// explicit answer rather than a NULL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum Syrup {
    #[sqlx(rename = "Карамельный")]
    #[serde(rename = "Карамельный")]
    Caramel,
    #[sqlx(rename = "Ванильный")]
    #[serde(rename = "Ванильный")]
    Vanilla,
    #[sqlx(rename = "Ореховый")]
    #[serde(rename = "Ореховый")]
    Hazelnut,
    #[sqlx(rename = "Без сиропа")]
    #[serde(rename = "Без сиропа")]
    NoSyrup,
}

impl Syrup {
    pub fn price(&self) -> Tenge {
        match self {
            Syrup::NoSyrup => Tenge::from_i64(0),
            _ => SYRUP_PRICE,
        }
    }

    pub fn is_some(&self) -> bool {
        !matches!(self, Syrup::NoSyrup)
    }
}

impl Display for Syrup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Syrup::Caramel => "Карамельный",
            Syrup::Vanilla => "Ванильный",
            Syrup::Hazelnut => "Ореховый",
            Syrup::NoSyrup => "Без сиропа",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Syrup {
    type Err = MenuParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Карамельный" => Ok(Syrup::Caramel),
            "Ванильный" => Ok(Syrup::Vanilla),
            "Ореховый" => Ok(Syrup::Hazelnut),
            "Без сиропа" => Ok(Syrup::NoSyrup),
            other => Err(MenuParseError(other.to_string())),
        }
    }
}

//--------------------------------------      CupSize        ---------------------------------------------------------
/// Cup volume in millilitres. Stored and serialized as the raw number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[repr(i32)]
#[serde(into = "i64", try_from = "i64")]
pub enum CupSize {
    Small = 250,
    Medium = 330,
    Large = 430,
}

impl CupSize {
    pub const ALL: [CupSize; 3] = [CupSize::Small, CupSize::Medium, CupSize::Large];

    pub fn millilitres(&self) -> i64 {
        *self as i64
    }
}

impl Display for CupSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.millilitres())
    }
}

impl From<CupSize> for i64 {
    fn from(value: CupSize) -> Self {
        value.millilitres()
    }
}

impl TryFrom<i64> for CupSize {
    type Error = MenuParseError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            250 => Ok(CupSize::Small),
            330 => Ok(CupSize::Medium),
            430 => Ok(CupSize::Large),
            other => Err(MenuParseError(format!("{other} мл"))),
        }
    }
}

impl FromStr for CupSize {
    type Err = MenuParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ml = s.parse::<i64>().map_err(|_| MenuParseError(s.to_string()))?;
        CupSize::try_from(ml)
    }
}

//--------------------------------------     Croissant       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum Croissant {
    #[sqlx(rename = "Классический")]
    #[serde(rename = "Классический")]
    Classic,
    #[sqlx(rename = "Шоколадный")]
    #[serde(rename = "Шоколадный")]
    Chocolate,
    #[sqlx(rename = "Миндальный")]
    #[serde(rename = "Миндальный")]
    Almond,
    #[sqlx(rename = "Без добавок")]
    #[serde(rename = "Без добавок")]
    NoCroissant,
}

impl Croissant {
    pub fn price(&self) -> Tenge {
        match self {
            Croissant::NoCroissant => Tenge::from_i64(0),
            _ => CROISSANT_PRICE,
        }
    }

    pub fn is_some(&self) -> bool {
        !matches!(self, Croissant::NoCroissant)
    }
}

impl Display for Croissant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Croissant::Classic => "Классический",
            Croissant::Chocolate => "Шоколадный",
            Croissant::Almond => "Миндальный",
            Croissant::NoCroissant => "Без добавок",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Croissant {
    type Err = MenuParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Классический" => Ok(Croissant::Classic),
            "Шоколадный" => Ok(Croissant::Chocolate),
            "Миндальный" => Ok(Croissant::Almond),
            "Без добавок" => Ok(Croissant::NoCroissant),
            other => Err(MenuParseError(other.to_string())),
        }
    }
}

//--------------------------------------    PickupTime       ---------------------------------------------------------
/// Minutes until the customer plans to pick the order up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[repr(i32)]
#[serde(into = "i64", try_from = "i64")]
pub enum PickupTime {
    In5 = 5,
    In10 = 10,
    In15 = 15,
    In20 = 20,
}

impl PickupTime {
    pub const ALL: [PickupTime; 4] = [PickupTime::In5, PickupTime::In10, PickupTime::In15, PickupTime::In20];

    pub fn minutes(&self) -> i64 {
        *self as i64
    }
}

impl Display for PickupTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.minutes())
    }
}

impl From<PickupTime> for i64 {
    fn from(value: PickupTime) -> Self {
        value.minutes()
    }
}

impl TryFrom<i64> for PickupTime {
    type Error = MenuParseError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            5 => Ok(PickupTime::In5),
            10 => Ok(PickupTime::In10),
            15 => Ok(PickupTime::In15),
            20 => Ok(PickupTime::In20),
            other => Err(MenuParseError(format!("{other} минут"))),
        }
    }
}

impl FromStr for PickupTime {
    type Err = MenuParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let minutes = s.parse::<i64>().map_err(|_| MenuParseError(s.to_string()))?;
        PickupTime::try_from(minutes)
    }
}

//--------------------------------------     price table     ---------------------------------------------------------
/// Price of the bare drink in the given cup. Syrup and croissant surcharges are added on top.
pub fn price_of(drink: Drink, cup: CupSize) -> Tenge {
    let price = match (drink, cup) {
        (Drink::Espresso, _) => 800,
        (Drink::Americano, CupSize::Small) => 900,
        (Drink::Americano, CupSize::Medium) => 1100,
        (Drink::Americano, CupSize::Large) => 1300,
        (Drink::Cappuccino, CupSize::Small) => 1200,
        (Drink::Cappuccino, CupSize::Medium) => 1400,
        (Drink::Cappuccino, CupSize::Large) => 1600,
        (Drink::Latte, CupSize::Small) => 1200,
        (Drink::Latte, CupSize::Medium) => 1400,
        (Drink::Latte, CupSize::Large) => 1600,
    };
    Tenge::from_i64(price)
}

//--------------------------------------     OrderItems      ---------------------------------------------------------
/// A complete cart. This is what gets snapshotted into the payments table as JSON while an invoice
/// is outstanding, so its serialized form is part of the storage format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItems {
    pub drink: Drink,
    pub syrup: Syrup,
    pub cup: CupSize,
    pub croissant: Croissant,
    pub pickup: PickupTime,
}

impl OrderItems {
    pub fn total(&self) -> Tenge {
        price_of(self.drink, self.cup) + self.syrup.price() + self.croissant.price()
    }

    /// The order summary shown to the customer and the barista.
    pub fn summary(&self) -> String {
        let mut lines = vec![format!("☕️ Кофе: {}", self.drink)];
        if self.syrup.is_some() {
            lines.push(format!("🍯 Сироп: {}", self.syrup));
        }
        lines.push(format!("📏 Объем: {} мл", self.cup));
        if self.croissant.is_some() {
            lines.push(format!("🥐 Добавка: {}", self.croissant));
        }
        lines.push(format!("⏱️ Подойдет через: {} минут", self.pickup));
        lines.join("\n")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn espresso_costs_the_same_in_every_cup() {
        for cup in CupSize::ALL {
            assert_eq!(price_of(Drink::Espresso, cup), Tenge::from_i64(800));
        }
    }

    #[test]
    fn cart_total_includes_surcharges() {
        let items = OrderItems {
            drink: Drink::Cappuccino,
            syrup: Syrup::Caramel,
            cup: CupSize::Medium,
            croissant: Croissant::Almond,
            pickup: PickupTime::In10,
        };
        assert_eq!(items.total(), Tenge::from_i64(1400 + 300 + 700));
    }

    #[test]
    fn summary_skips_declined_extras() {
        let items = OrderItems {
            drink: Drink::Americano,
            syrup: Syrup::NoSyrup,
            cup: CupSize::Small,
            croissant: Croissant::NoCroissant,
            pickup: PickupTime::In5,
        };
        let summary = items.summary();
        assert_eq!(summary, "☕️ Кофе: Американо\n📏 Объем: 250 мл\n⏱️ Подойдет через: 5 минут");
    }

    #[test]
    fn cart_snapshot_round_trips_through_json() {
        let items = OrderItems {
            drink: Drink::Latte,
            syrup: Syrup::Vanilla,
            cup: CupSize::Large,
            croissant: Croissant::Chocolate,
            pickup: PickupTime::In20,
        };
        let json = serde_json::to_string(&items).unwrap();
        assert!(json.contains("\"Лате\""));
        assert!(json.contains("430"));
        let back: OrderItems = serde_json::from_str(&json).unwrap();
        assert_eq!(back, items);
    }
}
