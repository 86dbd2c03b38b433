//! Cash entries.
//!
//! A [`CashEntry`] moves money in (`amount > 0`) or out (`amount < 0`) of a
//! cash register, in the currency the register is bound to.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashEntry {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub position: i32,
    pub cash_register_id: i64,
    pub currency_id: i64,
    pub amount: Money,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transaction_cash_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transaction_id: String,
    pub position: i32,
    pub cash_register_id: i64,
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

impl From<&CashEntry> for ActiveModel {
    fn from(entry: &CashEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            transaction_id: ActiveValue::Set(entry.transaction_id.to_string()),
            position: ActiveValue::Set(entry.position),
            cash_register_id: ActiveValue::Set(entry.cash_register_id),
            currency_id: ActiveValue::Set(entry.currency_id),
            amount: ActiveValue::Set(entry.amount.cents()),
            description: ActiveValue::Set(entry.description.clone()),
        }
    }
}

impl TryFrom<Model> for CashEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "cash entry")?,
            transaction_id: parse_uuid(&model.transaction_id, "transaction")?,
            position: model.position,
            cash_register_id: model.cash_register_id,
            currency_id: model.currency_id,
            amount: Money::new(model.amount),
            description: model.description,
        })
    }
}
