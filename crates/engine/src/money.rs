use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Signed money amount represented as **integer cents**.
///
/// Every monetary value of the engine (prices, budgets, expense deltas) uses
/// this type so that toggling an item back and forth restores a budget to the
/// exact cent. A budget can be overspent, so the value is signed.
///
/// ```rust
/// use engine::MoneyCents;
///
/// assert_eq!(MoneyCents::new(8_50).to_string(), "8.50");
/// assert_eq!("R$ 1.234,56".parse::<MoneyCents>().unwrap().cents(), 123_456);
/// assert_eq!("8.5".parse::<MoneyCents>().unwrap().cents(), 850);
/// assert!("12.345".parse::<MoneyCents>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct MoneyCents(i64);

impl MoneyCents {
    pub const ZERO: MoneyCents = MoneyCents(0);

    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// `None` on overflow.
    #[must_use]
    pub fn checked_add(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_add(rhs.0).map(MoneyCents)
    }

    /// `None` on overflow.
    #[must_use]
    pub fn checked_sub(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_sub(rhs.0).map(MoneyCents)
    }
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl From<i64> for MoneyCents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<MoneyCents> for i64 {
    fn from(value: MoneyCents) -> Self {
        value.0
    }
}

macro_rules! cents_op {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident, $op:tt) => {
        impl $trait for MoneyCents {
            type Output = MoneyCents;

            fn $method(self, rhs: MoneyCents) -> MoneyCents {
                MoneyCents(self.0 $op rhs.0)
            }
        }

        impl $assign_trait for MoneyCents {
            fn $assign_method(&mut self, rhs: MoneyCents) {
                *self = *self $op rhs;
            }
        }
    };
}

cents_op!(Add, add, AddAssign, add_assign, +);
cents_op!(Sub, sub, SubAssign, sub_assign, -);

impl Neg for MoneyCents {
    type Output = MoneyCents;

    fn neg(self) -> MoneyCents {
        MoneyCents(-self.0)
    }
}

impl Sum for MoneyCents {
    fn sum<I: Iterator<Item = MoneyCents>>(iter: I) -> Self {
        iter.fold(MoneyCents::ZERO, Add::add)
    }
}

const CURRENCY: &str = "R$";

/// Drop `.` thousands separators from `1.234.567`; groups after the first
/// must have exactly three digits.
fn ungroup(whole: &str) -> Option<String> {
    if !whole.contains('.') {
        return Some(whole.to_string());
    }
    let mut groups = whole.split('.');
    let first = groups.next()?;
    if first.is_empty() || first.len() > 3 {
        return None;
    }
    let mut digits = first.to_string();
    for group in groups {
        if group.len() != 3 {
            return None;
        }
        digits.push_str(group);
    }
    Some(digits)
}

impl FromStr for MoneyCents {
    type Err = EngineError;

    /// Parses an amount the way users type it into the app.
    ///
    /// An optional `R$` prefix and sign are accepted in either order. When a
    /// `,` is present it is the decimal separator and `.` groups thousands
    /// (`R$ 1.234,56`); otherwise `.` is the decimal separator (`8.5`). At
    /// most two fractional digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::Validation(format!("invalid amount \"{}\"", s.trim()));
        let overflow = || EngineError::Validation("amount too large".to_string());
        let strip_currency = |text: &str| -> String {
            text.strip_prefix(CURRENCY)
                .unwrap_or(text)
                .trim_start()
                .to_string()
        };

        let mut text = strip_currency(s.trim());
        let negative = text.starts_with('-');
        if negative || text.starts_with('+') {
            text = strip_currency(&text[1..]);
        }
        if text.is_empty() {
            return Err(EngineError::Validation("empty amount".to_string()));
        }

        let (whole, frac) = match text.rsplit_once(',') {
            Some((whole, frac)) => (ungroup(whole).ok_or_else(invalid)?, frac),
            None => match text.split_once('.') {
                Some((whole, frac)) => (whole.to_string(), frac),
                None => (text.clone(), ""),
            },
        };

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !all_digits(&whole) || !all_digits(frac) {
            return Err(invalid());
        }
        let cents = match frac.len() {
            0 => 0,
            1 => i64::from(frac.as_bytes()[0] - b'0') * 10,
            2 => i64::from(frac.as_bytes()[0] - b'0') * 10 + i64::from(frac.as_bytes()[1] - b'0'),
            _ => return Err(EngineError::Validation("too many decimals".to_string())),
        };

        let total = whole
            .parse::<i64>()
            .ok()
            .and_then(|units| units.checked_mul(100))
            .and_then(|v| v.checked_add(cents))
            .ok_or_else(overflow)?;

        Ok(MoneyCents(if negative { -total } else { total }))
    }
}
