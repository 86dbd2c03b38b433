use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

const QUANTITY_SCALE: i128 = 1_000;

/// Signed money amount represented as **integer minor units** (cents).
///
/// Use this type for **all** monetary values in the engine (balances, prices,
/// entry amounts, average costs) to avoid floating-point drift.
///
/// The value is signed:
/// - positive = the ledger increases
/// - negative = the ledger decreases
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::new(12_34);
/// assert_eq!(amount.cents(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects >
/// 2 decimals):
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("10".parse::<Money>().unwrap().cents(), 1000);
/// assert_eq!("10,5".parse::<Money>().unwrap().cents(), 1050);
/// assert!("12.345".parse::<Money>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the raw value in cents.
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

    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    /// `self + rhs`, failing instead of wrapping around.
    pub fn checked_add(self, rhs: Money) -> ResultEngine<Money> {
        self.0
            .checked_add(rhs.0)
            .map(Money)
            .ok_or_else(|| EngineError::InvalidAmount("amount out of range".to_string()))
    }

    /// Sum of `amounts`, failing when the total does not fit.
    pub fn try_sum<I>(amounts: I) -> ResultEngine<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |total, amount| total.checked_add(amount))
    }

    /// Cost of one unit when `self` is the value of `quantity` units.
    ///
    /// Returns zero for a zero quantity.
    #[must_use]
    pub fn per_unit(self, quantity: Quantity) -> Money {
        if quantity.is_zero() {
            return Money::ZERO;
        }
        Money(div_round(
            i128::from(self.0) * QUANTITY_SCALE,
            i128::from(quantity.milli()),
        ))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_fixed(f, self.0, 2)
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(self.0.saturating_neg())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a decimal string into cents.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed(s, 2).map(Money)
    }
}

/// Signed stock quantity represented as **thousandths of a unit**.
///
/// Three decimals are enough for weights down to the gram and volumes down to
/// the millilitre.
///
/// ```rust
/// use engine::Quantity;
///
/// assert_eq!("1.5".parse::<Quantity>().unwrap().milli(), 1500);
/// assert_eq!(Quantity::units(10).to_string(), "10.000");
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Quantity(i64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);

    /// Creates a quantity from thousandths of a unit.
    #[must_use]
    pub const fn new(milli: i64) -> Self {
        Self(milli)
    }

    /// Creates a quantity from whole units.
    #[must_use]
    pub const fn units(units: i64) -> Self {
        Self(units * QUANTITY_SCALE as i64)
    }

    #[must_use]
    pub const fn milli(self) -> i64 {
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

    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    /// `self + rhs`, failing instead of wrapping around.
    pub fn checked_add(self, rhs: Quantity) -> ResultEngine<Quantity> {
        self.0
            .checked_add(rhs.0)
            .map(Quantity)
            .ok_or_else(|| EngineError::InvalidAmount("quantity out of range".to_string()))
    }

    /// Sum of `quantities`, failing when the total does not fit.
    pub fn try_sum<I>(quantities: I) -> ResultEngine<Quantity>
    where
        I: IntoIterator<Item = Quantity>,
    {
        quantities
            .into_iter()
            .try_fold(Quantity::ZERO, |total, quantity| total.checked_add(quantity))
    }

    /// Value of `|self|` units at `price` per unit, rounded to the cent.
    #[must_use]
    pub fn value_at(self, price: Money) -> Money {
        Money(div_round(
            i128::from(self.0.abs()) * i128::from(price.cents()),
            QUANTITY_SCALE,
        ))
    }

    /// Multiplies a per-batch quantity by a batch count.
    pub fn times(self, count: i64) -> ResultEngine<Quantity> {
        self.0
            .checked_mul(count)
            .map(Quantity)
            .ok_or_else(|| EngineError::InvalidAmount("quantity out of range".to_string()))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_fixed(f, self.0, 3)
    }
}

impl From<i64> for Quantity {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Quantity> for i64 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Self::Output {
        Quantity(self.0 + rhs.0)
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, rhs: Quantity) {
        self.0 += rhs.0;
    }
}

impl Sub for Quantity {
    type Output = Quantity;

    fn sub(self, rhs: Quantity) -> Self::Output {
        Quantity(self.0 - rhs.0)
    }
}

impl SubAssign for Quantity {
    fn sub_assign(&mut self, rhs: Quantity) {
        self.0 -= rhs.0;
    }
}

impl Neg for Quantity {
    type Output = Quantity;

    fn neg(self) -> Self::Output {
        Quantity(self.0.saturating_neg())
    }
}

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Self {
        iter.fold(Quantity::ZERO, Add::add)
    }
}

impl FromStr for Quantity {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed(s, 3).map(Quantity)
    }
}

/// Weighted average of an existing stock value and an incoming one.
///
/// `(old_qty * old_cost + add_qty * add_cost) / (old_qty + add_qty)`. Negative
/// existing stock carries no value, so the incoming cost wins.
pub(crate) fn weighted_average(
    old_qty: Quantity,
    old_cost: Money,
    add_qty: Quantity,
    add_cost: Money,
) -> Money {
    if old_qty.milli() <= 0 {
        return add_cost;
    }
    let total_qty = i128::from(old_qty.milli()) + i128::from(add_qty.milli());
    if total_qty <= 0 {
        return old_cost;
    }
    let value = i128::from(old_qty.milli()) * i128::from(old_cost.cents())
        + i128::from(add_qty.milli()) * i128::from(add_cost.cents());
    Money(div_round(value, total_qty))
}

/// Inverse of [`weighted_average`]: removes `removed_qty` units valued at
/// `removed_cost` from a stock of `qty` units at `avg_cost`.
///
/// When nothing would remain the average is left untouched.
pub(crate) fn unwind_average(
    qty: Quantity,
    avg_cost: Money,
    removed_qty: Quantity,
    removed_cost: Money,
) -> Money {
    let remaining = i128::from(qty.milli()) - i128::from(removed_qty.milli());
    if remaining <= 0 {
        return avg_cost;
    }
    let value = i128::from(qty.milli()) * i128::from(avg_cost.cents())
        - i128::from(removed_qty.milli()) * i128::from(removed_cost.cents());
    if value < 0 {
        return Money::ZERO;
    }
    Money(div_round(value, remaining))
}

/// Integer division rounding half away from zero.
fn div_round(numerator: i128, denominator: i128) -> i64 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    let rounded = if remainder.abs() * 2 >= denominator.abs() {
        if (numerator < 0) ^ (denominator < 0) {
            quotient - 1
        } else {
            quotient + 1
        }
    } else {
        quotient
    };
    i64::try_from(rounded).unwrap_or(if rounded < 0 { i64::MIN } else { i64::MAX })
}

fn write_fixed(f: &mut fmt::Formatter<'_>, value: i64, decimals: u32) -> fmt::Result {
    let scale = 10u64.pow(decimals);
    let sign = if value < 0 { "-" } else { "" };
    let abs = value.unsigned_abs();
    write!(
        f,
        "{sign}{}.{:0width$}",
        abs / scale,
        abs % scale,
        width = decimals as usize
    )
}

/// Parses a signed decimal string into an integer scaled by `10^decimals`.
///
/// Validation rules:
/// - at most `decimals` fractional digits
/// - rejects empty/invalid strings
fn parse_fixed(s: &str, decimals: usize) -> Result<i64, EngineError> {
    let empty = || EngineError::InvalidAmount("empty amount".to_string());
    let invalid = || EngineError::InvalidAmount("invalid amount".to_string());
    let overflow = || EngineError::InvalidAmount("amount too large".to_string());

    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(empty());
    }

    let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
        (true, stripped)
    } else if let Some(stripped) = trimmed.strip_prefix('+') {
        (false, stripped)
    } else {
        (false, trimmed)
    };

    let rest = rest.trim();
    if rest.is_empty() {
        return Err(empty());
    }

    let rest = rest.replace(',', ".");
    let mut parts = rest.split('.');
    let whole_str = parts.next().ok_or_else(invalid)?;
    let frac_str = parts.next().unwrap_or("");
    if parts.next().is_some() {
        return Err(invalid());
    }

    if whole_str.is_empty() || !whole_str.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if !frac_str.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if frac_str.len() > decimals {
        return Err(EngineError::InvalidAmount("too many decimals".to_string()));
    }

    let scale = 10i64.pow(decimals as u32);
    let whole: i64 = whole_str.parse().map_err(|_| overflow())?;
    let frac: i64 = if frac_str.is_empty() {
        0
    } else {
        let padded = format!("{frac_str:0<decimals$}");
        padded.parse().map_err(|_| invalid())?
    };

    let total = whole
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac))
        .ok_or_else(overflow)?;

    if negative {
        total.checked_neg().ok_or_else(overflow)
    } else {
        Ok(total)
    }
}
