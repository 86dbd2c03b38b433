//! Checks the ledgers against the documents they are derived from.
//!
//! Every ledger value must equal the sum of the entry deltas of the confirmed
//! documents for that key. Stock is compared on quantity only: its average
//! cost depends on the order movements happened in.

use std::collections::BTreeMap;

use sea_orm::{
    ConnectionTrait, JoinType, QueryFilter, QuerySelect, TransactionTrait, prelude::*,
};
use serde::Serialize;

use crate::{
    CashEntry, CounterpartyEntry, DividendEntry, DocumentStatus, EngineError,
    ProductionIngredient, ResultEngine, SalaryEntry, TransactionItem,
    cash_balances, cash_entries, counterparty_balances, counterparty_entries, dividend_balances,
    dividend_entries, ledger::LedgerDelta, production_ingredients, production_outputs,
    productions, salary_balances, salary_entries, stock_balances, transaction_items,
    transactions,
};

use super::{
    Engine, with_tx,
    transactions::lifecycle::{cash_delta, counterparty_delta, dividend_delta, salary_delta},
};

/// Identifies one ledger row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "ledger", rename_all = "snake_case")]
pub enum LedgerKey {
    Cash {
        cash_register_id: i64,
        currency_id: i64,
    },
    Counterparty {
        counterparty_id: i64,
        currency_id: i64,
    },
    Dividend {
        partner_id: i64,
        currency_id: i64,
    },
    Salary {
        user_id: i64,
        currency_id: i64,
    },
    Stock {
        warehouse_id: i64,
        product_id: i64,
    },
}

/// A ledger value that does not match the confirmed documents.
///
/// Values are raw minor units: cents for money, thousandths for quantities.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
    pub key: LedgerKey,
    pub field: &'static str,
    pub expected: i64,
    pub actual: i64,
}

type Totals = BTreeMap<(LedgerKey, &'static str), i64>;

fn add(totals: &mut Totals, key: LedgerKey, field: &'static str, value: i64) {
    *totals.entry((key, field)).or_insert(0) += value;
}

impl Engine {
    /// Compare every ledger row with the confirmed documents.
    ///
    /// An empty result means the ledgers are consistent. Documents and
    /// ledgers are read in one transaction so they describe the same state.
    pub async fn reconcile(&self) -> ResultEngine<Vec<Discrepancy>> {
        let (expected, actual) = with_tx!(self, |db_tx| {
            let mut expected = Totals::new();
            for delta in confirmed_money_deltas(&db_tx).await? {
                add_delta(&mut expected, delta);
            }
            let movements = confirmed_stock_movements(&db_tx).await?;
            for (warehouse_id, product_id, quantity) in movements {
                add(
                    &mut expected,
                    LedgerKey::Stock {
                        warehouse_id,
                        product_id,
                    },
                    "quantity",
                    quantity,
                );
            }

            let actual = stored_totals(&db_tx).await?;
            Ok::<_, EngineError>((expected, actual))
        })?;

        let mut keys: Vec<&(LedgerKey, &'static str)> =
            expected.keys().chain(actual.keys()).collect();
        keys.sort_unstable();
        keys.dedup();

        let discrepancies: Vec<Discrepancy> = keys
            .into_iter()
            .filter_map(|key| {
                let expected = expected.get(key).copied().unwrap_or(0);
                let actual = actual.get(key).copied().unwrap_or(0);
                (expected != actual).then_some(Discrepancy {
                    key: key.0,
                    field: key.1,
                    expected,
                    actual,
                })
            })
            .collect();

        for discrepancy in &discrepancies {
            tracing::warn!(
                key = ?discrepancy.key,
                field = discrepancy.field,
                expected = discrepancy.expected,
                actual = discrepancy.actual,
                "ledger out of balance"
            );
        }
        Ok(discrepancies)
    }
}

fn add_delta(totals: &mut Totals, delta: LedgerDelta) {
    match delta {
        LedgerDelta::Cash {
            cash_register_id,
            currency_id,
            amount,
        } => add(
            totals,
            LedgerKey::Cash {
                cash_register_id,
                currency_id,
            },
            "balance",
            amount.cents(),
        ),
        LedgerDelta::Counterparty {
            counterparty_id,
            currency_id,
            amount,
        } => add(
            totals,
            LedgerKey::Counterparty {
                counterparty_id,
                currency_id,
            },
            "balance",
            amount.cents(),
        ),
        LedgerDelta::Dividend {
            partner_id,
            currency_id,
            accrued,
            paid,
        } => {
            let key = LedgerKey::Dividend {
                partner_id,
                currency_id,
            };
            add(totals, key, "total_accrued", accrued.cents());
            add(totals, key, "total_paid", paid.cents());
        }
        LedgerDelta::Salary {
            user_id,
            currency_id,
            accrued,
            paid,
        } => {
            let key = LedgerKey::Salary {
                user_id,
                currency_id,
            };
            add(totals, key, "accrued", accrued.cents());
            add(totals, key, "paid", paid.cents());
        }
        LedgerDelta::Stock {
            warehouse_id,
            product_id,
            movement,
        } => add(
            totals,
            LedgerKey::Stock {
                warehouse_id,
                product_id,
            },
            "quantity",
            movement.quantity.milli(),
        ),
    }
}

/// Children of confirmed documents, joined through `relation`.
async fn confirmed_children<E, T, C, S>(
    db: &C,
    relation: RelationDef,
    status_column: S,
) -> ResultEngine<Vec<T>>
where
    E: EntityTrait,
    S: ColumnTrait,
    T: TryFrom<E::Model, Error = EngineError>,
    C: ConnectionTrait,
{
    E::find()
        .join(JoinType::InnerJoin, relation)
        .filter(status_column.eq(DocumentStatus::Confirmed.as_str()))
        .all(db)
        .await?
        .into_iter()
        .map(T::try_from)
        .collect()
}

/// Money ledger deltas of every confirmed transaction.
pub(super) async fn confirmed_money_deltas<C>(db: &C) -> ResultEngine<Vec<LedgerDelta>>
where
    C: ConnectionTrait,
{
    let mut deltas = Vec::new();

    let cash: Vec<CashEntry> = confirmed_children::<cash_entries::Entity, _, _, _>(
        db,
        cash_entries::Relation::Transactions.def(),
        transactions::Column::Status,
    )
    .await?;
    deltas.extend(cash.iter().map(cash_delta));

    let counterparty: Vec<CounterpartyEntry> =
        confirmed_children::<counterparty_entries::Entity, _, _, _>(
            db,
            counterparty_entries::Relation::Transactions.def(),
            transactions::Column::Status,
        )
        .await?;
    deltas.extend(counterparty.iter().map(counterparty_delta));

    let dividend: Vec<DividendEntry> = confirmed_children::<dividend_entries::Entity, _, _, _>(
        db,
        dividend_entries::Relation::Transactions.def(),
        transactions::Column::Status,
    )
    .await?;
    deltas.extend(dividend.iter().map(dividend_delta));

    let salary: Vec<SalaryEntry> = confirmed_children::<salary_entries::Entity, _, _, _>(
        db,
        salary_entries::Relation::Transactions.def(),
        transactions::Column::Status,
    )
    .await?;
    deltas.extend(salary.iter().map(salary_delta));

    Ok(deltas)
}

/// `(warehouse, product, signed milli quantity)` of every confirmed stock
/// movement, from transactions and productions.
async fn confirmed_stock_movements<C>(db: &C) -> ResultEngine<Vec<(i64, i64, i64)>>
where
    C: ConnectionTrait,
{
    let mut movements = Vec::new();

    let items: Vec<TransactionItem> = confirmed_children::<transaction_items::Entity, _, _, _>(
        db,
        transaction_items::Relation::Transactions.def(),
        transactions::Column::Status,
    )
    .await?;
    for item in items {
        let quantity = item.quantity.milli();
        match item.warehouse_to_id {
            Some(warehouse_to_id) => {
                movements.push((item.warehouse_id, item.product_id, -quantity.abs()));
                movements.push((warehouse_to_id, item.product_id, quantity.abs()));
            }
            None => movements.push((item.warehouse_id, item.product_id, quantity)),
        }
    }

    let ingredients: Vec<ProductionIngredient> =
        confirmed_children::<production_ingredients::Entity, _, _, _>(
            db,
            production_ingredients::Relation::Productions.def(),
            productions::Column::Status,
        )
        .await?;
    for ingredient in ingredients {
        movements.push((
            ingredient.warehouse_id,
            ingredient.product_id,
            -ingredient.actual_quantity.milli(),
        ));
    }

    let outputs: Vec<(i64, i64, i64)> = production_outputs::Entity::find()
        .select_only()
        .column(productions::Column::WarehouseId)
        .column(production_outputs::Column::ProductId)
        .column(production_outputs::Column::ActualQuantity)
        .join(
            JoinType::InnerJoin,
            production_outputs::Relation::Productions.def(),
        )
        .filter(productions::Column::Status.eq(DocumentStatus::Confirmed.as_str()))
        .into_tuple()
        .all(db)
        .await?;
    movements.extend(outputs);

    Ok(movements)
}

/// Current ledger rows, in the same shape as the expected totals.
async fn stored_totals<C>(db: &C) -> ResultEngine<Totals>
where
    C: ConnectionTrait,
{
    let mut totals = Totals::new();

    for row in cash_balances::Entity::find().all(db).await? {
        add(
            &mut totals,
            LedgerKey::Cash {
                cash_register_id: row.cash_register_id,
                currency_id: row.currency_id,
            },
            "balance",
            row.balance,
        );
    }
    for row in counterparty_balances::Entity::find().all(db).await? {
        add(
            &mut totals,
            LedgerKey::Counterparty {
                counterparty_id: row.counterparty_id,
                currency_id: row.currency_id,
            },
            "balance",
            row.balance,
        );
    }
    for row in dividend_balances::Entity::find().all(db).await? {
        let key = LedgerKey::Dividend {
            partner_id: row.partner_id,
            currency_id: row.currency_id,
        };
        add(&mut totals, key, "total_accrued", row.total_accrued);
        add(&mut totals, key, "total_paid", row.total_paid);
    }
    for row in salary_balances::Entity::find().all(db).await? {
        let key = LedgerKey::Salary {
            user_id: row.user_id,
            currency_id: row.currency_id,
        };
        add(&mut totals, key, "accrued", row.accrued);
        add(&mut totals, key, "paid", row.paid);
    }
    for row in stock_balances::Entity::find().all(db).await? {
        add(
            &mut totals,
            LedgerKey::Stock {
                warehouse_id: row.warehouse_id,
                product_id: row.product_id,
            },
            "quantity",
            row.quantity,
        );
    }

    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discrepancy_serializes_with_tagged_key() {
        let discrepancy = Discrepancy {
            key: LedgerKey::Stock {
                warehouse_id: 1,
                product_id: 2,
            },
            field: "quantity",
            expected: 5_000,
            actual: 4_000,
        };
        assert_eq!(
            serde_json::to_value(&discrepancy).unwrap(),
            serde_json::json!({
                "key": { "ledger": "stock", "warehouse_id": 1, "product_id": 2 },
                "field": "quantity",
                "expected": 5_000,
                "actual": 4_000,
            })
        );
    }

    #[test]
    fn deltas_fold_into_per_field_totals() {
        let mut totals = Totals::new();
        add_delta(
            &mut totals,
            LedgerDelta::Dividend {
                partner_id: 3,
                currency_id: 1,
                accrued: crate::Money::new(500),
                paid: crate::Money::ZERO,
            },
        );
        add_delta(
            &mut totals,
            LedgerDelta::Dividend {
                partner_id: 3,
                currency_id: 1,
                accrued: crate::Money::ZERO,
                paid: crate::Money::new(200),
            },
        );
        let key = LedgerKey::Dividend {
            partner_id: 3,
            currency_id: 1,
        };
        assert_eq!(totals.get(&(key, "total_accrued")), Some(&500));
        assert_eq!(totals.get(&(key, "total_paid")), Some(&200));
    }
}
