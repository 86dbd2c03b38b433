//! Stock balances, one row per `(warehouse, product)`.
//!
//! Besides the quantity on hand each row keeps the weighted average unit cost
//! of that stock. The average is only recomputed by priced inflows (and by
//! their reversal); outflows leave it untouched.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    Money, Quantity, ResultEngine,
    money::{unwind_average, weighted_average},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockBalance {
    pub warehouse_id: i64,
    pub product_id: i64,
    pub quantity: Quantity,
    pub avg_cost: Money,
}

/// How a movement affects the average cost of the row it touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Valuation {
    /// Quantity only.
    Keep,
    /// Merge an inflow valued at this unit cost.
    Merge(Money),
    /// Remove an inflow previously merged at `cost`. `prior` is the row
    /// average recorded just before that merge.
    Unwind { cost: Money, prior: Option<Money> },
}

/// A signed change of stock on one row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct StockMovement {
    pub quantity: Quantity,
    pub valuation: Valuation,
    /// Fail with insufficient stock instead of going below zero.
    pub strict: bool,
    /// Drop the row when it ends up below zero, not only at exactly zero.
    pub prune_negative: bool,
}

impl StockMovement {
    fn new(quantity: Quantity, valuation: Valuation) -> Self {
        Self {
            quantity,
            valuation,
            strict: false,
            prune_negative: false,
        }
    }

    /// Stock entering at `unit_cost`.
    pub(crate) fn inflow(quantity: Quantity, unit_cost: Money) -> Self {
        Self::new(quantity.abs(), Valuation::Merge(unit_cost))
    }

    /// Stock leaving at the current average cost.
    pub(crate) fn outflow(quantity: Quantity) -> Self {
        Self::new(-quantity.abs(), Valuation::Keep)
    }

    /// Reverse of [`StockMovement::inflow`].
    pub(crate) fn unwind(quantity: Quantity, unit_cost: Money) -> Self {
        Self::new(
            -quantity.abs(),
            Valuation::Unwind {
                cost: unit_cost,
                prior: None,
            },
        )
    }

    /// Restore `prior` as the average when the row still reads as the result
    /// of the merge being unwound.
    #[must_use]
    pub(crate) fn restoring(mut self, prior: Option<Money>) -> Self {
        if let Valuation::Unwind { cost, .. } = self.valuation {
            self.valuation = Valuation::Unwind { cost, prior };
        }
        self
    }

    /// An outflow that must be covered by the stock on hand.
    pub(crate) fn consume(quantity: Quantity) -> Self {
        Self {
            strict: true,
            ..Self::outflow(quantity)
        }
    }

    #[must_use]
    pub(crate) fn pruning_negative(mut self) -> Self {
        self.prune_negative = true;
        self
    }
}

impl StockBalance {
    pub fn empty(warehouse_id: i64, product_id: i64) -> Self {
        Self {
            warehouse_id,
            product_id,
            quantity: Quantity::ZERO,
            avg_cost: Money::ZERO,
        }
    }

    /// Total value of the stock at its average cost.
    pub fn value(&self) -> Money {
        self.quantity.value_at(self.avg_cost)
    }

    pub(crate) fn covers(&self, quantity: Quantity) -> bool {
        self.quantity >= quantity.abs()
    }

    pub(crate) fn apply(&mut self, movement: StockMovement) -> ResultEngine<()> {
        match movement.valuation {
            Valuation::Merge(cost) if movement.quantity.is_positive() && cost.is_positive() => {
                self.avg_cost =
                    weighted_average(self.quantity, self.avg_cost, movement.quantity, cost);
            }
            Valuation::Unwind { cost, prior }
                if movement.quantity.is_negative() && cost.is_positive() =>
            {
                let removed = movement.quantity.abs();
                self.avg_cost = match prior {
                    Some(prior) if self.is_merge_of(prior, removed, cost) => prior,
                    _ => unwind_average(self.quantity, self.avg_cost, removed, cost),
                };
            }
            _ => {}
        }
        self.quantity = self.quantity.checked_add(movement.quantity)?;
        Ok(())
    }

    /// Whether the row is what merging `quantity` at `cost` onto stock
    /// averaging `prior` produced. A missing row counts: the merge may have
    /// brought negative stock back to zero.
    fn is_merge_of(&self, prior: Money, quantity: Quantity, cost: Money) -> bool {
        if self.quantity.is_zero() {
            return true;
        }
        self.quantity
            .checked_add(-quantity)
            .is_ok_and(|before| weighted_average(before, prior, quantity, cost) == self.avg_cost)
    }

    /// Whether the row must be removed after `movement`.
    pub(crate) fn is_spent(&self, movement: &StockMovement) -> bool {
        self.quantity.is_zero() || (movement.prune_negative && self.quantity.is_negative())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "stock_balances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub warehouse_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub product_id: i64,
    pub quantity: i64,
    pub avg_cost: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for StockBalance {
    fn from(model: Model) -> Self {
        Self {
            warehouse_id: model.warehouse_id,
            product_id: model.product_id,
            quantity: Quantity::new(model.quantity),
            avg_cost: Money::new(model.avg_cost),
        }
    }
}

impl From<&StockBalance> for ActiveModel {
    fn from(balance: &StockBalance) -> Self {
        Self {
            warehouse_id: ActiveValue::Set(balance.warehouse_id),
            product_id: ActiveValue::Set(balance.product_id),
            quantity: ActiveValue::Set(balance.quantity.milli()),
            avg_cost: ActiveValue::Set(balance.avg_cost.cents()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock(units: i64, avg_cents: i64) -> StockBalance {
        StockBalance {
            warehouse_id: 1,
            product_id: 1,
            quantity: Quantity::units(units),
            avg_cost: Money::new(avg_cents),
        }
    }

    #[test]
    fn priced_inflow_recomputes_average() {
        let mut balance = stock(10, 200);
        balance.apply(StockMovement::inflow(Quantity::units(5), Money::new(800))).unwrap();
        assert_eq!(balance.quantity, Quantity::units(15));
        assert_eq!(balance.avg_cost, Money::new(400));
    }

    #[test]
    fn unpriced_inflow_keeps_average() {
        let mut balance = stock(10, 200);
        balance.apply(StockMovement::inflow(Quantity::units(5), Money::ZERO)).unwrap();
        assert_eq!(balance.quantity, Quantity::units(15));
        assert_eq!(balance.avg_cost, Money::new(200));
    }

    #[test]
    fn outflow_keeps_average() {
        let mut balance = stock(10, 250);
        balance.apply(StockMovement::outflow(Quantity::units(4))).unwrap();
        assert_eq!(balance.quantity, Quantity::units(6));
        assert_eq!(balance.avg_cost, Money::new(250));
    }

    #[test]
    fn unwind_restores_previous_average() {
        let mut balance = stock(10, 200);
        balance.apply(StockMovement::inflow(Quantity::units(5), Money::new(800))).unwrap();
        balance.apply(StockMovement::unwind(Quantity::units(5), Money::new(800))).unwrap();
        assert_eq!(balance, stock(10, 200));
    }

    #[test]
    fn returning_consumed_stock_at_its_cost_is_exact() {
        let mut balance = stock(10, 300);
        balance.apply(StockMovement::consume(Quantity::units(10))).unwrap();
        assert!(balance.quantity.is_zero());

        // The row is recreated from scratch once it was spent.
        let mut recreated = StockBalance::empty(1, 1);
        recreated.apply(StockMovement::inflow(Quantity::units(10), Money::new(300))).unwrap();
        assert_eq!(recreated, stock(10, 300));
    }

    #[test]
    fn spent_rows() {
        let movement = StockMovement::outflow(Quantity::units(3));
        let mut balance = stock(2, 100);
        balance.apply(movement).unwrap();
        assert!(!balance.is_spent(&movement));
        assert!(balance.is_spent(&movement.pruning_negative()));
        assert!(stock(0, 100).is_spent(&movement));
        assert!(!stock(2, 100).covers(Quantity::units(3)));
    }

    #[test]
    fn unwind_restores_recorded_average_despite_rounding() {
        let mut balance = stock(3, 100);
        balance
            .apply(StockMovement::inflow(Quantity::units(1), Money::new(102)))
            .unwrap();
        assert_eq!(balance.avg_cost, Money::new(101));

        let mut rounded = balance.clone();
        rounded
            .apply(StockMovement::unwind(Quantity::units(1), Money::new(102)))
            .unwrap();
        assert_eq!(rounded.avg_cost, Money::new(101));

        balance
            .apply(
                StockMovement::unwind(Quantity::units(1), Money::new(102))
                    .restoring(Some(Money::new(100))),
            )
            .unwrap();
        assert_eq!(balance, stock(3, 100));
    }

    #[test]
    fn unwind_restores_average_of_negative_stock() {
        let mut balance = stock(-5, 0);
        balance
            .apply(StockMovement::inflow(Quantity::units(10), Money::new(300)))
            .unwrap();
        assert_eq!(balance, stock(5, 300));

        balance
            .apply(
                StockMovement::unwind(Quantity::units(10), Money::new(300))
                    .restoring(Some(Money::ZERO)),
            )
            .unwrap();
        assert_eq!(balance, stock(-5, 0));
    }

    #[test]
    fn recorded_average_is_ignored_once_the_row_moved_on() {
        // 10 @ 2.00 + 5 @ 8.00 = 15 @ 4.00, then 5 more arrive @ 4.00 elsewhere.
        let mut balance = stock(20, 400);
        balance
            .apply(
                StockMovement::unwind(Quantity::units(5), Money::new(800))
                    .restoring(Some(Money::new(200))),
            )
            .unwrap();
        // (20 * 4.00 - 5 * 8.00) / 15 = 2.67
        assert_eq!(balance, stock(15, 267));
    }
}
