use sea_orm::{
    ConnectionTrait, QueryFilter, QueryOrder, QuerySelect,
    prelude::*,
    sea_query::{Expr, Func, SimpleExpr},
};

use crate::ResultEngine;

/// Next document number for `prefix` in `year`: `{prefix}-{year}-{sequence:05}`.
///
/// The sequence restarts every year. Numbers are unique in storage, so a
/// concurrent writer that picked the same number fails on insert. Past 99999
/// the sequence grows a digit; the latest number is the longest one first.
pub(super) async fn next_number<E, C>(
    db: &C,
    number_column: E::Column,
    prefix: &str,
    year: i32,
) -> ResultEngine<String>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let scope = format!("{prefix}-{year}-");
    let last: Option<String> = E::find()
        .select_only()
        .column(number_column)
        .filter(number_column.starts_with(scope.as_str()))
        .order_by_desc(SimpleExpr::from(Func::char_length(Expr::col(number_column))))
        .order_by_desc(number_column)
        .into_tuple()
        .one(db)
        .await?;

    Ok(format_number(&scope, next_sequence(last.as_deref(), &scope)))
}

fn next_sequence(last: Option<&str>, scope: &str) -> u32 {
    last.and_then(|number| number.strip_prefix(scope))
        .and_then(|sequence| sequence.parse::<u32>().ok())
        .map_or(1, |sequence| sequence + 1)
}

fn format_number(scope: &str, sequence: u32) -> String {
    format!("{scope}{sequence:05}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_starts_at_one_and_increments() {
        assert_eq!(next_sequence(None, "SL-2025-"), 1);
        assert_eq!(next_sequence(Some("SL-2025-00041"), "SL-2025-"), 42);
        assert_eq!(format_number("SL-2025-", 42), "SL-2025-00042");
    }

    #[test]
    fn sequence_grows_past_five_digits() {
        assert_eq!(next_sequence(Some("SL-2025-99999"), "SL-2025-"), 100_000);
        assert_eq!(format_number("SL-2025-", 100_000), "SL-2025-100000");
    }

    #[test]
    fn sequence_ignores_foreign_scope() {
        assert_eq!(next_sequence(Some("SL-2024-00041"), "SL-2025-"), 1);
    }
}
