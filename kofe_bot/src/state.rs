//! Dialogue state for the order conversation and the admin text prompts.
use kofe_engine::menu::{Croissant, CupSize, Drink, OrderItems, PickupTime, Syrup};

/// The cart being assembled step by step. Each dialogue state carries the draft forward, so the
/// back buttons can re-enter an earlier step without losing the answers already given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderDraft {
    pub drink: Option<Drink>,
    pub syrup: Option<Syrup>,
    pub cup: Option<CupSize>,
    pub pickup: Option<PickupTime>,
    pub croissant: Option<Croissant>,
    /// Set once the customer chose to pay with a loyalty coffee.
    pub is_free: bool,
}

impl OrderDraft {
    /// A fresh draft for the chosen drink. Espresso never gets the syrup question, so its answer
    /// is filled in immediately.
    pub fn with_drink(drink: Drink) -> Self {
        let syrup = (drink == Drink::Espresso).then_some(Syrup::NoSyrup);
        Self { drink: Some(drink), syrup, ..Default::default() }
    }

    /// Whether the syrup step applies to the chosen drink.
    pub fn has_syrup_step(&self) -> bool {
        !matches!(self.drink, Some(Drink::Espresso))
    }

    /// The completed cart, once every mandatory step has been answered.
    pub fn items(&self) -> Option<OrderItems> {
        Some(OrderItems {
            drink: self.drink?,
            syrup: self.syrup.unwrap_or(Syrup::NoSyrup),
            cup: self.cup?,
            croissant: self.croissant.unwrap_or(Croissant::NoCroissant),
            pickup: self.pickup?,
        })
    }
}

/// Where the conversation with one chat currently stands.
///
/// The order steps mirror the buttons: drink, syrup (skipped for espresso), cup, pickup time,
/// extras, confirmation. The two `Awaiting*` states are admin-panel text prompts.
#[derive(Debug, Clone, Default)]
pub enum DialogueState {
    #[default]
    Idle,
    SelectingDrink,
    SelectingSyrup {
        draft: OrderDraft,
    },
    SelectingCup {
        draft: OrderDraft,
    },
    SelectingPickupTime {
        draft: OrderDraft,
    },
    OfferingExtras {
        draft: OrderDraft,
    },
    SelectingCroissant {
        draft: OrderDraft,
    },
    Confirming {
        draft: OrderDraft,
    },
    AwaitingExportDate,
    AwaitingBroadcastMessage,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn espresso_skips_the_syrup_step() {
        let draft = OrderDraft::with_drink(Drink::Espresso);
        assert!(!draft.has_syrup_step());
        assert_eq!(draft.syrup, Some(Syrup::NoSyrup));
        let draft = OrderDraft::with_drink(Drink::Latte);
        assert!(draft.has_syrup_step());
        assert_eq!(draft.syrup, None);
    }

    #[test]
    fn cart_is_complete_only_after_the_mandatory_steps() {
        let mut draft = OrderDraft::with_drink(Drink::Cappuccino);
        draft.syrup = Some(Syrup::Caramel);
        assert!(draft.items().is_none());
        draft.cup = Some(CupSize::Medium);
        draft.pickup = Some(PickupTime::In10);
        let items = draft.items().expect("cart should be complete");
        // Declined extras default to the explicit "none" values
        assert_eq!(items.croissant, Croissant::NoCroissant);
        assert_eq!(items.syrup, Syrup::Caramel);
    }
}
