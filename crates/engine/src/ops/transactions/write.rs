use chrono::{Datelike, Utc};
use sea_orm::{ConnectionTrait, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    CashEntry, CounterpartyEntry, DividendEntry, DocumentStatus, EngineError, Money,
    ResultEngine, SalaryEntry, ServiceEntry, Transaction, TransactionCmd, TransactionItem,
    TransactionKind, cash_entries, cash_registers, counterparty_entries, dividend_entries,
    salary_entries, service_entries, transaction_items, transactions,
    util::{
        ensure_non_negative_price, ensure_non_zero_amount, ensure_non_zero_quantity,
        ensure_positive_amount, normalize_optional_text, position,
    },
};

use super::super::{Engine, numbering::next_number, with_tx};
use super::{delete_entries, load_transaction};

impl Engine {
    /// Create a draft transaction together with its entries.
    ///
    /// Item quantities are sign-normalized by kind and, for kinds that carry a
    /// counterparty, a counterparty entry is derived when none was given.
    /// Ledgers are not touched until the transaction is confirmed.
    pub async fn create_transaction(&self, cmd: TransactionCmd) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let now = Utc::now();
            let number = next_number::<transactions::Entity, _>(
                &db_tx,
                transactions::Column::Number,
                cmd.kind.rules().prefix,
                cmd.date.year(),
            )
            .await?;

            let mut tx = Transaction {
                id: Uuid::new_v4(),
                kind: cmd.kind,
                number,
                date: cmd.date,
                counterparty_id: None,
                partner_id: None,
                description: None,
                total_amount: Money::ZERO,
                paid_amount: Money::ZERO,
                currency_id: None,
                status: DocumentStatus::Draft,
                created_by: cmd.created_by,
                created_at: now,
                updated_at: now,
                cash_entries: Vec::new(),
                items: Vec::new(),
                counterparty_entries: Vec::new(),
                dividend_entries: Vec::new(),
                salary_entries: Vec::new(),
                service_entries: Vec::new(),
            };
            build_entries(&db_tx, &mut tx, cmd).await?;

            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            insert_entries(&db_tx, &tx).await?;

            tracing::info!(id = %tx.id, number = %tx.number, kind = %tx.kind, "transaction created");
            Ok(tx)
        })
    }

    /// Replace the fields and every entry of a transaction that is not
    /// confirmed. Identity and number are preserved.
    pub async fn update_transaction(
        &self,
        id: Uuid,
        cmd: TransactionCmd,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let mut tx = load_transaction(&db_tx, id).await?;
            if tx.status.is_confirmed() {
                return Err(EngineError::InvalidState(
                    "cannot edit a confirmed document".to_string(),
                ));
            }
            if tx.kind != cmd.kind {
                return Err(EngineError::InvalidState(format!(
                    "cannot change a {} into a {}",
                    tx.kind, cmd.kind
                )));
            }

            tx.date = cmd.date;
            tx.updated_at = Utc::now();
            build_entries(&db_tx, &mut tx, cmd).await?;

            delete_entries(&db_tx, id).await?;
            transactions::ActiveModel::from(&tx).update(&db_tx).await?;
            insert_entries(&db_tx, &tx).await?;

            tracing::info!(id = %tx.id, number = %tx.number, "transaction updated");
            Ok(tx)
        })
    }
}

/// Validate `cmd` and fill the header fields and entries of `tx` from it.
///
/// Nothing is written here; any error leaves storage untouched.
async fn build_entries<C>(db: &C, tx: &mut Transaction, cmd: TransactionCmd) -> ResultEngine<()>
where
    C: ConnectionTrait,
{
    if cmd.total_amount.is_negative() {
        return Err(EngineError::InvalidAmount(
            "total amount must be >= 0".to_string(),
        ));
    }
    if cmd.paid_amount.is_negative() {
        return Err(EngineError::InvalidAmount(
            "paid amount must be >= 0".to_string(),
        ));
    }

    tx.counterparty_id = cmd.counterparty_id;
    tx.partner_id = cmd.partner_id;
    tx.currency_id = cmd.currency_id;
    tx.description = normalize_optional_text(cmd.description.as_deref());
    tx.total_amount = cmd.total_amount;
    tx.paid_amount = cmd.paid_amount;

    let rules = tx.kind.rules();

    tx.cash_entries = Vec::with_capacity(cmd.cash_entries.len());
    for (index, input) in cmd.cash_entries.into_iter().enumerate() {
        ensure_non_zero_amount(input.amount, "cash entry")?;
        ensure_register_currency(db, input.cash_register_id, input.currency_id).await?;
        if let Some(currency_id) = tx.currency_id
            && currency_id != input.currency_id
        {
            return Err(EngineError::CurrencyMismatch(format!(
                "cash entry currency {} differs from document currency {currency_id}",
                input.currency_id
            )));
        }
        tx.cash_entries.push(CashEntry {
            id: Uuid::new_v4(),
            transaction_id: tx.id,
            position: position(index)?,
            cash_register_id: input.cash_register_id,
            currency_id: input.currency_id,
            amount: input.amount,
            description: normalize_optional_text(input.description.as_deref()),
        });
    }

    tx.items = Vec::with_capacity(cmd.items.len());
    for (index, input) in cmd.items.into_iter().enumerate() {
        ensure_non_zero_quantity(input.quantity, "item")?;
        ensure_non_negative_price(input.price, "item")?;
        if input.warehouse_to_id == Some(input.warehouse_id) {
            return Err(EngineError::InvalidAmount(
                "item source and destination warehouse must differ".to_string(),
            ));
        }
        if tx.kind == TransactionKind::Transfer && input.warehouse_to_id.is_none() {
            return Err(EngineError::InvalidAmount(
                "transfer item requires a destination warehouse".to_string(),
            ));
        }
        let quantity = rules.item_sign.normalize(input.quantity);
        tx.items.push(TransactionItem {
            id: Uuid::new_v4(),
            transaction_id: tx.id,
            position: position(index)?,
            product_id: input.product_id,
            warehouse_id: input.warehouse_id,
            warehouse_to_id: input.warehouse_to_id,
            quantity,
            price: input.price,
            amount: quantity.value_at(input.price),
            unit_cost: None,
            prior_avg_cost: None,
            prior_to_avg_cost: None,
        });
    }

    tx.counterparty_entries = Vec::with_capacity(cmd.counterparty_entries.len().max(1));
    for (index, input) in cmd.counterparty_entries.into_iter().enumerate() {
        ensure_non_zero_amount(input.amount, "counterparty entry")?;
        tx.counterparty_entries.push(CounterpartyEntry {
            id: Uuid::new_v4(),
            transaction_id: tx.id,
            position: position(index)?,
            counterparty_id: input.counterparty_id,
            currency_id: input.currency_id,
            amount: input.amount,
            description: normalize_optional_text(input.description.as_deref()),
        });
    }
    if tx.counterparty_entries.is_empty()
        && let Some(entry) = derive_counterparty_entry(tx)?
    {
        tx.counterparty_entries.push(entry);
    }

    tx.dividend_entries = Vec::with_capacity(cmd.dividend_entries.len());
    for (index, input) in cmd.dividend_entries.into_iter().enumerate() {
        ensure_positive_amount(input.amount, "dividend entry")?;
        tx.dividend_entries.push(DividendEntry {
            id: Uuid::new_v4(),
            transaction_id: tx.id,
            position: position(index)?,
            partner_id: input.partner_id,
            currency_id: input.currency_id,
            kind: input.kind,
            amount: input.amount,
            description: normalize_optional_text(input.description.as_deref()),
        });
    }

    tx.salary_entries = Vec::with_capacity(cmd.salary_entries.len());
    for (index, input) in cmd.salary_entries.into_iter().enumerate() {
        ensure_positive_amount(input.amount, "salary entry")?;
        tx.salary_entries.push(SalaryEntry {
            id: Uuid::new_v4(),
            transaction_id: tx.id,
            position: position(index)?,
            user_id: input.user_id,
            currency_id: input.currency_id,
            kind: input.kind,
            amount: input.amount,
            description: normalize_optional_text(input.description.as_deref()),
        });
    }

    tx.service_entries = Vec::with_capacity(cmd.service_entries.len());
    for (index, input) in cmd.service_entries.into_iter().enumerate() {
        ensure_non_zero_quantity(input.quantity, "service")?;
        ensure_non_negative_price(input.price, "service")?;
        tx.service_entries.push(ServiceEntry {
            id: Uuid::new_v4(),
            transaction_id: tx.id,
            position: position(index)?,
            service_id: input.service_id,
            quantity: input.quantity,
            price: input.price,
            amount: input.quantity.value_at(input.price),
            description: normalize_optional_text(input.description.as_deref()),
        });
    }

    Ok(())
}

/// A cash entry must use the currency its register is bound to.
async fn ensure_register_currency<C>(
    db: &C,
    cash_register_id: i64,
    currency_id: i64,
) -> ResultEngine<()>
where
    C: ConnectionTrait,
{
    let register = cash_registers::Entity::find_by_id(cash_register_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("cash register {cash_register_id}")))?;
    if register.currency_id != currency_id {
        return Err(EngineError::CurrencyMismatch(format!(
            "cash register {} holds currency {}, entry declares {currency_id}",
            register.name, register.currency_id
        )));
    }
    Ok(())
}

/// The counterparty entry implied by the kind, if any.
///
/// Uses the document currency, or the currency of the first cash entry.
fn derive_counterparty_entry(tx: &Transaction) -> ResultEngine<Option<CounterpartyEntry>> {
    let (Some(counterparty_id), Some(rule)) = (tx.counterparty_id, tx.kind.rules().counterparty)
    else {
        return Ok(None);
    };

    let cash_total = Money::try_sum(tx.cash_entries.iter().map(|entry| entry.amount))?;
    let amount = rule.amount(tx.total_amount, tx.paid_amount, cash_total);
    if amount.is_zero() {
        return Ok(None);
    }

    let currency_id = tx
        .currency_id
        .or_else(|| tx.cash_entries.first().map(|entry| entry.currency_id))
        .ok_or_else(|| {
            EngineError::InvalidAmount(format!(
                "a {} with a counterparty requires a currency",
                tx.kind
            ))
        })?;

    Ok(Some(CounterpartyEntry {
        id: Uuid::new_v4(),
        transaction_id: tx.id,
        position: 0,
        counterparty_id,
        currency_id,
        amount,
        description: None,
    }))
}

async fn insert_entries<C>(db: &C, tx: &Transaction) -> ResultEngine<()>
where
    C: ConnectionTrait,
{
    for entry in &tx.cash_entries {
        cash_entries::Entity::insert(cash_entries::ActiveModel::from(entry))
            .exec_without_returning(db)
            .await?;
    }
    for item in &tx.items {
        transaction_items::Entity::insert(transaction_items::ActiveModel::from(item))
            .exec_without_returning(db)
            .await?;
    }
    for entry in &tx.counterparty_entries {
        counterparty_entries::Entity::insert(counterparty_entries::ActiveModel::from(entry))
            .exec_without_returning(db)
            .await?;
    }
    for entry in &tx.dividend_entries {
        dividend_entries::Entity::insert(dividend_entries::ActiveModel::from(entry))
            .exec_without_returning(db)
            .await?;
    }
    for entry in &tx.salary_entries {
        salary_entries::Entity::insert(salary_entries::ActiveModel::from(entry))
            .exec_without_returning(db)
            .await?;
    }
    for entry in &tx.service_entries {
        service_entries::Entity::insert(service_entries::ActiveModel::from(entry))
            .exec_without_returning(db)
            .await?;
    }
    Ok(())
}
