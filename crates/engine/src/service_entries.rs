//! Service lines. They price a document but touch no ledger.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, Quantity, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub position: i32,
    pub service_id: i64,
    pub quantity: Quantity,
    pub price: Money,
    /// `|quantity| * price`.
    pub amount: Money,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transaction_service_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transaction_id: String,
    pub position: i32,
    pub service_id: i64,
    pub quantity: i64,
    pub price: i64,
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

impl From<&ServiceEntry> for ActiveModel {
    fn from(entry: &ServiceEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            transaction_id: ActiveValue::Set(entry.transaction_id.to_string()),
            position: ActiveValue::Set(entry.position),
            service_id: ActiveValue::Set(entry.service_id),
            quantity: ActiveValue::Set(entry.quantity.milli()),
            price: ActiveValue::Set(entry.price.cents()),
            amount: ActiveValue::Set(entry.amount.cents()),
            description: ActiveValue::Set(entry.description.clone()),
        }
    }
}

impl TryFrom<Model> for ServiceEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "service entry")?,
            transaction_id: parse_uuid(&model.transaction_id, "transaction")?,
            position: model.position,
            service_id: model.service_id,
            quantity: Quantity::new(model.quantity),
            price: Money::new(model.price),
            amount: Money::new(model.amount),
            description: model.description,
        })
    }
}
