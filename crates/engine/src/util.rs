//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use uuid::Uuid;

use crate::{EngineError, Money, Quantity, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

pub(crate) fn ensure_non_zero_amount(amount: Money, label: &str) -> ResultEngine<()> {
    if amount.is_zero() {
        return Err(EngineError::InvalidAmount(format!(
            "{label} amount must not be 0"
        )));
    }
    Ok(())
}

pub(crate) fn ensure_positive_amount(amount: Money, label: &str) -> ResultEngine<()> {
    if !amount.is_positive() {
        return Err(EngineError::InvalidAmount(format!(
            "{label} amount must be > 0"
        )));
    }
    Ok(())
}

pub(crate) fn ensure_non_negative_price(price: Money, label: &str) -> ResultEngine<()> {
    if price.is_negative() {
        return Err(EngineError::InvalidAmount(format!(
            "{label} price must be >= 0"
        )));
    }
    Ok(())
}

pub(crate) fn ensure_non_zero_quantity(quantity: Quantity, label: &str) -> ResultEngine<()> {
    if quantity.is_zero() {
        return Err(EngineError::InvalidAmount(format!(
            "{label} quantity must not be 0"
        )));
    }
    Ok(())
}

pub(crate) fn ensure_positive_quantity(quantity: Quantity, label: &str) -> ResultEngine<()> {
    if !quantity.is_positive() {
        return Err(EngineError::InvalidAmount(format!(
            "{label} quantity must be > 0"
        )));
    }
    Ok(())
}

/// Convert an entry position into the stored column type.
pub(crate) fn position(index: usize) -> ResultEngine<i32> {
    i32::try_from(index).map_err(|_| EngineError::InvalidAmount("too many entries".to_string()))
}
