use chrono::Utc;
use sea_orm::{ActiveValue, ConnectionTrait, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    CashEntry, CounterpartyEntry, DividendEntry, DocumentStatus, EngineError, Money,
    ResultEngine, SalaryEntry, Transaction, TransactionItem,
    ledger::{LedgerDelta, apply_delta, move_stock},
    stock_balances::StockMovement,
    transaction_items, transactions,
};

use super::super::{Engine, transition, with_tx};
use super::{delete_entries, load_transaction};

impl Engine {
    /// Apply every entry of a draft transaction to its ledger and mark it
    /// confirmed. All or nothing.
    pub async fn confirm_transaction(&self, id: Uuid) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let now = Utc::now();
            if !set_status(&db_tx, id, DocumentStatus::Draft, DocumentStatus::Confirmed, now)
                .await?
            {
                let tx = load_transaction(&db_tx, id).await?;
                return Err(match tx.status {
                    DocumentStatus::Confirmed => {
                        EngineError::AlreadyConfirmed(format!("transaction {}", tx.number))
                    }
                    _ => EngineError::InvalidState(
                        "cannot confirm a cancelled document".to_string(),
                    ),
                });
            }
            let mut tx = load_transaction(&db_tx, id).await?;

            for entry in &tx.cash_entries {
                apply_delta(&db_tx, cash_delta(entry)).await?;
            }
            for item in &mut tx.items {
                confirm_item(&db_tx, item).await?;
            }
            for entry in &tx.counterparty_entries {
                apply_delta(&db_tx, counterparty_delta(entry)).await?;
            }
            for entry in &tx.dividend_entries {
                apply_delta(&db_tx, dividend_delta(entry)).await?;
            }
            for entry in &tx.salary_entries {
                apply_delta(&db_tx, salary_delta(entry)).await?;
            }

            tracing::info!(id = %tx.id, number = %tx.number, "transaction confirmed");
            Ok(tx)
        })
    }

    /// Cancel a transaction.
    ///
    /// A draft is only flagged. A confirmed transaction has every ledger
    /// effect reversed first.
    pub async fn cancel_transaction(&self, id: Uuid) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let now = Utc::now();
            let was_confirmed = if set_status(
                &db_tx,
                id,
                DocumentStatus::Confirmed,
                DocumentStatus::Cancelled,
                now,
            )
            .await?
            {
                true
            } else if set_status(&db_tx, id, DocumentStatus::Draft, DocumentStatus::Cancelled, now)
                .await?
            {
                false
            } else {
                load_transaction(&db_tx, id).await?;
                return Err(EngineError::InvalidState(
                    "document is already cancelled".to_string(),
                ));
            };
            let tx = load_transaction(&db_tx, id).await?;

            if was_confirmed {
                for entry in &tx.cash_entries {
                    apply_delta(&db_tx, cash_delta(entry).negated()).await?;
                }
                // Stock is restored newest first so average costs unwind
                // in the order they were merged.
                for item in tx.items.iter().rev() {
                    cancel_item(&db_tx, item).await?;
                }
                for entry in &tx.counterparty_entries {
                    apply_delta(&db_tx, counterparty_delta(entry).negated()).await?;
                }
                for entry in &tx.dividend_entries {
                    apply_delta(&db_tx, dividend_delta(entry).negated()).await?;
                }
                for entry in &tx.salary_entries {
                    apply_delta(&db_tx, salary_delta(entry).negated()).await?;
                }
            }

            tracing::info!(id = %tx.id, number = %tx.number, was_confirmed, "transaction cancelled");
            Ok(tx)
        })
    }

    /// Delete a transaction that is not confirmed, with its entries.
    pub async fn delete_transaction(&self, id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let tx = load_transaction(&db_tx, id).await?;
            if tx.status.is_confirmed() {
                return Err(EngineError::InvalidState(
                    "delete the confirmed document by cancelling it first".to_string(),
                ));
            }

            delete_entries(&db_tx, id).await?;
            transactions::Entity::delete_by_id(id.to_string())
                .exec(&db_tx)
                .await?;

            tracing::info!(id = %tx.id, number = %tx.number, "transaction deleted");
            Ok(())
        })
    }
}

async fn set_status<C>(
    db: &C,
    id: Uuid,
    from: DocumentStatus,
    to: DocumentStatus,
    now: chrono::DateTime<Utc>,
) -> ResultEngine<bool>
where
    C: ConnectionTrait,
{
    transition::<transactions::Entity, _>(
        db,
        transactions::Column::Id,
        transactions::Column::Status,
        transactions::Column::UpdatedAt,
        &id.to_string(),
        from,
        to,
        now,
    )
    .await
}

pub(in crate::ops) fn cash_delta(entry: &CashEntry) -> LedgerDelta {
    LedgerDelta::Cash {
        cash_register_id: entry.cash_register_id,
        currency_id: entry.currency_id,
        amount: entry.amount,
    }
}

pub(in crate::ops) fn counterparty_delta(entry: &CounterpartyEntry) -> LedgerDelta {
    LedgerDelta::Counterparty {
        counterparty_id: entry.counterparty_id,
        currency_id: entry.currency_id,
        amount: entry.amount,
    }
}

pub(in crate::ops) fn dividend_delta(entry: &DividendEntry) -> LedgerDelta {
    let (accrued, paid) = entry.kind.split(entry.amount);
    LedgerDelta::Dividend {
        partner_id: entry.partner_id,
        currency_id: entry.currency_id,
        accrued,
        paid,
    }
}

pub(in crate::ops) fn salary_delta(entry: &SalaryEntry) -> LedgerDelta {
    let (accrued, paid) = entry.kind.split(entry.amount);
    LedgerDelta::Salary {
        user_id: entry.user_id,
        currency_id: entry.currency_id,
        accrued,
        paid,
    }
}

/// Whether the item leaves `warehouse_id`. A transfer always does.
fn is_outflow(item: &TransactionItem) -> bool {
    item.warehouse_to_id.is_some() || item.quantity.is_negative()
}

/// Apply an item to stock, recording the source cost of outflows and the
/// averages priced inflows were merged onto.
async fn confirm_item<C>(db: &C, item: &mut TransactionItem) -> ResultEngine<()>
where
    C: ConnectionTrait,
{
    if is_outflow(item) {
        let source = move_stock(
            db,
            item.warehouse_id,
            item.product_id,
            StockMovement::outflow(item.quantity),
        )
        .await?;
        item.unit_cost = Some(source.after.avg_cost);
    } else {
        let target = move_stock(
            db,
            item.warehouse_id,
            item.product_id,
            StockMovement::inflow(item.quantity, item.price),
        )
        .await?;
        item.prior_avg_cost = Some(target.before.avg_cost);
    }

    if let Some(warehouse_to_id) = item.warehouse_to_id {
        let target = move_stock(
            db,
            warehouse_to_id,
            item.product_id,
            StockMovement::inflow(item.quantity, item.transfer_cost()),
        )
        .await?;
        item.prior_to_avg_cost = Some(target.before.avg_cost);
    }

    transaction_items::ActiveModel {
        id: ActiveValue::Set(item.id.to_string()),
        unit_cost: ActiveValue::Set(item.unit_cost.map(Money::cents)),
        prior_avg_cost: ActiveValue::Set(item.prior_avg_cost.map(Money::cents)),
        prior_to_avg_cost: ActiveValue::Set(item.prior_to_avg_cost.map(Money::cents)),
        ..Default::default()
    }
    .update(db)
    .await?;
    Ok(())
}

/// Exact reverse of [`confirm_item`].
async fn cancel_item<C>(db: &C, item: &TransactionItem) -> ResultEngine<()>
where
    C: ConnectionTrait,
{
    if let Some(warehouse_to_id) = item.warehouse_to_id {
        move_stock(
            db,
            warehouse_to_id,
            item.product_id,
            StockMovement::unwind(item.quantity, item.transfer_cost())
                .restoring(item.prior_to_avg_cost),
        )
        .await?;
    }

    let reversal = if is_outflow(item) {
        StockMovement::inflow(item.quantity, item.unit_cost.unwrap_or(Money::ZERO))
    } else {
        StockMovement::unwind(item.quantity, item.price).restoring(item.prior_avg_cost)
    };
    move_stock(db, item.warehouse_id, item.product_id, reversal).await?;
    Ok(())
}
