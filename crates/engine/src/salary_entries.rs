//! Salary entries, accrued to or paid out to an employee (a user).

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AccrualKind, EngineError, Money, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryEntry {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub position: i32,
    pub user_id: i64,
    pub currency_id: i64,
    pub kind: AccrualKind,
    pub amount: Money,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transaction_salary_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transaction_id: String,
    pub position: i32,
    pub user_id: i64,
    pub currency_id: i64,
    pub kind: String,
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

impl From<&SalaryEntry> for ActiveModel {
    fn from(entry: &SalaryEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            transaction_id: ActiveValue::Set(entry.transaction_id.to_string()),
            position: ActiveValue::Set(entry.position),
            user_id: ActiveValue::Set(entry.user_id),
            currency_id: ActiveValue::Set(entry.currency_id),
            kind: ActiveValue::Set(entry.kind.as_str().to_string()),
            amount: ActiveValue::Set(entry.amount.cents()),
            description: ActiveValue::Set(entry.description.clone()),
        }
    }
}

impl TryFrom<Model> for SalaryEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "salary entry")?,
            transaction_id: parse_uuid(&model.transaction_id, "transaction")?,
            position: model.position,
            user_id: model.user_id,
            currency_id: model.currency_id,
            kind: AccrualKind::try_from(model.kind.as_str())?,
            amount: Money::new(model.amount),
            description: model.description,
        })
    }
}
