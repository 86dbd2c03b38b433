//! The single writer of ledger rows.
//!
//! Every balance change funnels through [`apply_delta`]. Rows are created on
//! first touch with zero defaults.
//!
//! Money ledgers are accumulated with one
//! `INSERT .. ON CONFLICT (key) DO UPDATE SET col = col + delta` statement, so
//! two writers on the same key never lose an update. Stock rows also carry an
//! average cost that depends on the current quantity, so they are read with
//! an exclusive lock, recomputed and written back.

use sea_orm::{
    ActiveValue, ConnectionTrait, QuerySelect,
    prelude::*,
    sea_query::{Expr, OnConflict},
};

use crate::{
    EngineError, Money, ResultEngine, StockBalance, cash_balances, counterparty_balances,
    dividend_balances, salary_balances, stock_balances,
    stock_balances::StockMovement,
};

/// A signed change of one ledger row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LedgerDelta {
    Cash {
        cash_register_id: i64,
        currency_id: i64,
        amount: Money,
    },
    Counterparty {
        counterparty_id: i64,
        currency_id: i64,
        amount: Money,
    },
    Dividend {
        partner_id: i64,
        currency_id: i64,
        accrued: Money,
        paid: Money,
    },
    Salary {
        user_id: i64,
        currency_id: i64,
        accrued: Money,
        paid: Money,
    },
    Stock {
        warehouse_id: i64,
        product_id: i64,
        movement: StockMovement,
    },
}

impl LedgerDelta {
    /// The same delta with every amount negated.
    ///
    /// Stock movements are not negatable this way: reversing one also has to
    /// reverse its valuation, which the caller decides.
    pub(crate) fn negated(self) -> Self {
        match self {
            Self::Cash {
                cash_register_id,
                currency_id,
                amount,
            } => Self::Cash {
                cash_register_id,
                currency_id,
                amount: -amount,
            },
            Self::Counterparty {
                counterparty_id,
                currency_id,
                amount,
            } => Self::Counterparty {
                counterparty_id,
                currency_id,
                amount: -amount,
            },
            Self::Dividend {
                partner_id,
                currency_id,
                accrued,
                paid,
            } => Self::Dividend {
                partner_id,
                currency_id,
                accrued: -accrued,
                paid: -paid,
            },
            Self::Salary {
                user_id,
                currency_id,
                accrued,
                paid,
            } => Self::Salary {
                user_id,
                currency_id,
                accrued: -accrued,
                paid: -paid,
            },
            stock @ Self::Stock { .. } => stock,
        }
    }
}

/// A stock row around one movement. A missing row reads as zero quantity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct StockChange {
    pub before: StockBalance,
    pub after: StockBalance,
}

/// Apply `delta` to its ledger row.
///
/// Returns the stock row before and after the movement, `None` for money
/// ledgers.
pub(crate) async fn apply_delta<C>(db: &C, delta: LedgerDelta) -> ResultEngine<Option<StockChange>>
where
    C: ConnectionTrait,
{
    tracing::debug!(?delta, "ledger delta");
    match delta {
        LedgerDelta::Cash {
            cash_register_id,
            currency_id,
            amount,
        } => {
            let row = cash_balances::ActiveModel {
                cash_register_id: ActiveValue::Set(cash_register_id),
                currency_id: ActiveValue::Set(currency_id),
                balance: ActiveValue::Set(amount.cents()),
            };
            cash_balances::Entity::insert(row)
                .on_conflict(
                    OnConflict::columns([
                        cash_balances::Column::CashRegisterId,
                        cash_balances::Column::CurrencyId,
                    ])
                    .value(
                        cash_balances::Column::Balance,
                        Expr::col((cash_balances::Entity, cash_balances::Column::Balance))
                            .add(amount.cents()),
                    )
                    .to_owned(),
                )
                .exec_without_returning(db)
                .await?;
            Ok(None)
        }
        LedgerDelta::Counterparty {
            counterparty_id,
            currency_id,
            amount,
        } => {
            let row = counterparty_balances::ActiveModel {
                counterparty_id: ActiveValue::Set(counterparty_id),
                currency_id: ActiveValue::Set(currency_id),
                balance: ActiveValue::Set(amount.cents()),
            };
            counterparty_balances::Entity::insert(row)
                .on_conflict(
                    OnConflict::columns([
                        counterparty_balances::Column::CounterpartyId,
                        counterparty_balances::Column::CurrencyId,
                    ])
                    .value(
                        counterparty_balances::Column::Balance,
                        Expr::col((
                            counterparty_balances::Entity,
                            counterparty_balances::Column::Balance,
                        ))
                        .add(amount.cents()),
                    )
                    .to_owned(),
                )
                .exec_without_returning(db)
                .await?;
            Ok(None)
        }
        LedgerDelta::Dividend {
            partner_id,
            currency_id,
            accrued,
            paid,
        } => {
            let row = dividend_balances::ActiveModel {
                partner_id: ActiveValue::Set(partner_id),
                currency_id: ActiveValue::Set(currency_id),
                total_accrued: ActiveValue::Set(accrued.cents()),
                total_paid: ActiveValue::Set(paid.cents()),
            };
            dividend_balances::Entity::insert(row)
                .on_conflict(
                    OnConflict::columns([
                        dividend_balances::Column::PartnerId,
                        dividend_balances::Column::CurrencyId,
                    ])
                    .value(
                        dividend_balances::Column::TotalAccrued,
                        Expr::col((
                            dividend_balances::Entity,
                            dividend_balances::Column::TotalAccrued,
                        ))
                        .add(accrued.cents()),
                    )
                    .value(
                        dividend_balances::Column::TotalPaid,
                        Expr::col((
                            dividend_balances::Entity,
                            dividend_balances::Column::TotalPaid,
                        ))
                        .add(paid.cents()),
                    )
                    .to_owned(),
                )
                .exec_without_returning(db)
                .await?;
            Ok(None)
        }
        LedgerDelta::Salary {
            user_id,
            currency_id,
            accrued,
            paid,
        } => {
            let row = salary_balances::ActiveModel {
                user_id: ActiveValue::Set(user_id),
                currency_id: ActiveValue::Set(currency_id),
                accrued: ActiveValue::Set(accrued.cents()),
                paid: ActiveValue::Set(paid.cents()),
            };
            salary_balances::Entity::insert(row)
                .on_conflict(
                    OnConflict::columns([
                        salary_balances::Column::UserId,
                        salary_balances::Column::CurrencyId,
                    ])
                    .value(
                        salary_balances::Column::Accrued,
                        Expr::col((salary_balances::Entity, salary_balances::Column::Accrued))
                            .add(accrued.cents()),
                    )
                    .value(
                        salary_balances::Column::Paid,
                        Expr::col((salary_balances::Entity, salary_balances::Column::Paid))
                            .add(paid.cents()),
                    )
                    .to_owned(),
                )
                .exec_without_returning(db)
                .await?;
            Ok(None)
        }
        LedgerDelta::Stock {
            warehouse_id,
            product_id,
            movement,
        } => apply_stock(db, warehouse_id, product_id, movement)
            .await
            .map(Some),
    }
}

/// [`apply_delta`] for a stock movement.
pub(crate) async fn move_stock<C>(
    db: &C,
    warehouse_id: i64,
    product_id: i64,
    movement: StockMovement,
) -> ResultEngine<StockChange>
where
    C: ConnectionTrait,
{
    tracing::debug!(warehouse_id, product_id, ?movement, "stock movement");
    apply_stock(db, warehouse_id, product_id, movement).await
}

async fn apply_stock<C>(
    db: &C,
    warehouse_id: i64,
    product_id: i64,
    movement: StockMovement,
) -> ResultEngine<StockChange>
where
    C: ConnectionTrait,
{
    let existing = stock_balances::Entity::find_by_id((warehouse_id, product_id))
        .lock_exclusive()
        .one(db)
        .await?;
    let exists = existing.is_some();
    let mut balance = existing
        .map(StockBalance::from)
        .unwrap_or_else(|| StockBalance::empty(warehouse_id, product_id));

    if movement.strict && !balance.covers(movement.quantity) {
        return Err(EngineError::InsufficientStock(format!(
            "insufficient stock for product #{product_id}"
        )));
    }

    let before = balance.clone();
    balance.apply(movement)?;

    if balance.is_spent(&movement) {
        if exists {
            stock_balances::Entity::delete_by_id((warehouse_id, product_id))
                .exec(db)
                .await?;
        }
    } else if exists {
        stock_balances::ActiveModel::from(&balance).update(db).await?;
    } else {
        stock_balances::ActiveModel::from(&balance).insert(db).await?;
    }

    Ok(StockChange {
        before,
        after: balance,
    })
}
