//! Item quantities.
//!
//! Quantities are decimal (half a kilo of cheese, 2 packs of rice) and are
//! stored as integer thousandths.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{EngineError, MoneyCents, ResultEngine};

const SCALE: i64 = 1000;

/// A decimal quantity with three fractional digits.
///
/// ```rust
/// use engine::{MoneyCents, Quantity};
///
/// let qty: Quantity = "2".parse().unwrap();
/// assert_eq!(qty.cost_of(MoneyCents::new(850)).unwrap(), MoneyCents::new(1700));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(i64);

impl Quantity {
    pub const ONE: Quantity = Quantity(SCALE);

    /// Creates a quantity from thousandths (`1500` is `1.5`).
    #[must_use]
    pub const fn from_milli(milli: i64) -> Self {
        Self(milli)
    }

    /// Creates a whole quantity.
    #[must_use]
    pub const fn units(units: i64) -> Self {
        Self(units * SCALE)
    }

    #[must_use]
    pub const fn milli(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns `price × quantity`, rounded half away from zero to the cent.
    pub fn cost_of(self, price: MoneyCents) -> ResultEngine<MoneyCents> {
        let raw = i128::from(price.cents()) * i128::from(self.0);
        let scale = i128::from(SCALE);
        let half = scale / 2;
        let rounded = if raw >= 0 {
            (raw + half) / scale
        } else {
            (raw - half) / scale
        };
        i64::try_from(rounded)
            .map(MoneyCents::new)
            .map_err(|_| EngineError::Validation("item total too large".to_string()))
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / SCALE as u64;
        let frac = abs % SCALE as u64;
        if frac == 0 {
            return write!(f, "{sign}{whole}");
        }
        let digits = format!("{frac:03}");
        write!(f, "{sign}{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl FromStr for Quantity {
    type Err = EngineError;

    /// Parses `2`, `1.5` or `0,250`. Negative values and more than three
    /// decimals are rejected; zero parses and is rejected later where a
    /// positive quantity is required.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::Validation(format!("invalid quantity: {s}"));

        let trimmed = s.trim().replace(',', ".");
        if trimmed.is_empty() {
            return Err(EngineError::Validation("empty quantity".to_string()));
        }

        let (whole_str, frac_str) = match trimmed.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (trimmed.as_str(), ""),
        };

        if whole_str.is_empty() || !whole_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if !frac_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if frac_str.len() > 3 {
            return Err(EngineError::Validation(
                "quantity supports at most 3 decimals".to_string(),
            ));
        }

        let whole: i64 = whole_str.parse().map_err(|_| invalid())?;
        let frac: i64 = if frac_str.is_empty() {
            0
        } else {
            let padded = format!("{frac_str:0<3}");
            padded.parse().map_err(|_| invalid())?
        };

        whole
            .checked_mul(SCALE)
            .and_then(|v| v.checked_add(frac))
            .map(Quantity)
            .ok_or_else(|| EngineError::Validation("quantity too large".to_string()))
    }
}
