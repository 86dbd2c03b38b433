//! Counterparty entries.
//!
//! Amounts are from the counterparty's perspective: positive means they owe
//! us more, negative means we owe them more.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterpartyEntry {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub position: i32,
    pub counterparty_id: i64,
    pub currency_id: i64,
    pub amount: Money,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transaction_counterparty_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transaction_id: String,
    pub position: i32,
    pub counterparty_id: i64,
    pub currency_id: i64,
    pub amount: i64,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&CounterpartyEntry> for ActiveModel {
    fn from(entry: &CounterpartyEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            transaction_id: ActiveValue::Set(entry.transaction_id.to_string()),
            position: ActiveValue::Set(entry.position),
            counterparty_id: ActiveValue::Set(entry.counterparty_id),
            currency_id: ActiveValue::Set(entry.currency_id),
            amount: ActiveValue::Set(entry.amount.cents()),
            description: ActiveValue::Set(entry.description.clone()),
        }
    }
}

impl TryFrom<Model> for CounterpartyEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "counterparty entry")?,
            transaction_id: parse_uuid(&model.transaction_id, "transaction")?,
            position: model.position,
            counterparty_id: model.counterparty_id,
            currency_id: model.currency_id,
            amount: Money::new(model.amount),
            description: model.description,
        })
    }
}
