//! Purchase state of an item and the budget effect of toggling it.

use serde::{Deserialize, Serialize};

use crate::{EngineError, Item, MoneyCents, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseState {
    /// No price entered yet. Toggling is refused until one is set.
    Unpriced,
    ReadyUnpurchased,
    Purchased,
}

impl PurchaseState {
    pub fn of(item: &Item) -> Self {
        if !item.price.is_positive() {
            Self::Unpriced
        } else if item.purchased {
            Self::Purchased
        } else {
            Self::ReadyUnpurchased
        }
    }
}

/// What a toggle would do to an item and its budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TogglePlan {
    PriceRequired,
    Purchase { expense: MoneyCents },
    Unpurchase { expense: MoneyCents },
}

impl TogglePlan {
    /// Plans the toggle of `item` from its current state.
    ///
    /// Marking an item purchased with a non-positive quantity is rejected
    /// instead of producing an empty delta.
    pub fn for_item(item: &Item) -> ResultEngine<Self> {
        match PurchaseState::of(item) {
            PurchaseState::Unpriced => Ok(Self::PriceRequired),
            PurchaseState::ReadyUnpurchased => {
                if !item.quantity.is_positive() {
                    return Err(EngineError::Validation(format!(
                        "quantity of \"{}\" must be > 0 to mark it purchased",
                        item.name
                    )));
                }
                let expense = item.total()?;
                if !expense.is_positive() {
                    return Err(EngineError::Validation(format!(
                        "expense of \"{}\" rounds to zero",
                        item.name
                    )));
                }
                Ok(Self::Purchase { expense })
            }
            PurchaseState::Purchased => Ok(Self::Unpurchase {
                expense: item.counted_expense()?,
            }),
        }
    }

    /// The purchased flag after the toggle, if it happens.
    pub fn purchased_after(self) -> Option<bool> {
        match self {
            Self::PriceRequired => None,
            Self::Purchase { .. } => Some(true),
            Self::Unpurchase { .. } => Some(false),
        }
    }

    /// Amount to take out of the remaining budget (negative gives it back).
    pub fn budget_delta(self) -> MoneyCents {
        match self {
            Self::PriceRequired => MoneyCents::ZERO,
            Self::Purchase { expense } => expense,
            Self::Unpurchase { expense } => -expense,
        }
    }
}
