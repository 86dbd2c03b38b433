use sea_orm::{ConnectionTrait, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Transaction, cash_entries, counterparty_entries, dividend_entries,
    salary_entries, service_entries, transaction_items, transactions,
};

use super::{Engine, load_children};

pub(super) mod lifecycle;
mod list;
mod write;

pub use list::TransactionListFilter;

impl Engine {
    /// Return a transaction with all of its entries.
    pub async fn transaction(&self, id: Uuid) -> ResultEngine<Transaction> {
        load_transaction(&self.database, id).await
    }
}

/// Load a transaction and its entries, each group in attachment order.
pub(super) async fn load_transaction<C>(db: &C, id: Uuid) -> ResultEngine<Transaction>
where
    C: ConnectionTrait,
{
    let model = transactions::Entity::find_by_id(id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;
    with_entries(db, Transaction::try_from(model)?).await
}

pub(super) async fn with_entries<C>(db: &C, mut tx: Transaction) -> ResultEngine<Transaction>
where
    C: ConnectionTrait,
{
    let id = tx.id.to_string();
    tx.cash_entries = load_children::<cash_entries::Entity, _, _>(
        db,
        cash_entries::Column::TransactionId,
        cash_entries::Column::Position,
        &id,
    )
    .await?;
    tx.items = load_children::<transaction_items::Entity, _, _>(
        db,
        transaction_items::Column::TransactionId,
        transaction_items::Column::Position,
        &id,
    )
    .await?;
    tx.counterparty_entries = load_children::<counterparty_entries::Entity, _, _>(
        db,
        counterparty_entries::Column::TransactionId,
        counterparty_entries::Column::Position,
        &id,
    )
    .await?;
    tx.dividend_entries = load_children::<dividend_entries::Entity, _, _>(
        db,
        dividend_entries::Column::TransactionId,
        dividend_entries::Column::Position,
        &id,
    )
    .await?;
    tx.salary_entries = load_children::<salary_entries::Entity, _, _>(
        db,
        salary_entries::Column::TransactionId,
        salary_entries::Column::Position,
        &id,
    )
    .await?;
    tx.service_entries = load_children::<service_entries::Entity, _, _>(
        db,
        service_entries::Column::TransactionId,
        service_entries::Column::Position,
        &id,
    )
    .await?;
    Ok(tx)
}

/// Remove every entry row of a transaction.
pub(super) async fn delete_entries<C>(db: &C, id: Uuid) -> ResultEngine<()>
where
    C: ConnectionTrait,
{
    let id = id.to_string();
    cash_entries::Entity::delete_many()
        .filter(cash_entries::Column::TransactionId.eq(id.as_str()))
        .exec(db)
        .await?;
    transaction_items::Entity::delete_many()
        .filter(transaction_items::Column::TransactionId.eq(id.as_str()))
        .exec(db)
        .await?;
    counterparty_entries::Entity::delete_many()
        .filter(counterparty_entries::Column::TransactionId.eq(id.as_str()))
        .exec(db)
        .await?;
    dividend_entries::Entity::delete_many()
        .filter(dividend_entries::Column::TransactionId.eq(id.as_str()))
        .exec(db)
        .await?;
    salary_entries::Entity::delete_many()
        .filter(salary_entries::Column::TransactionId.eq(id.as_str()))
        .exec(db)
        .await?;
    service_entries::Entity::delete_many()
        .filter(service_entries::Column::TransactionId.eq(id.as_str()))
        .exec(db)
        .await?;
    Ok(())
}
