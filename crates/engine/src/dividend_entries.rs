//! Dividend entries.
//!
//! Accruals and payments touch different fields of the same partner balance,
//! so each entry carries an [`AccrualKind`] and a positive amount.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccrualKind {
    /// The entity is owed more.
    Accrual,
    /// The entity is owed less.
    Payment,
}

impl AccrualKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accrual => "accrual",
            Self::Payment => "payment",
        }
    }

    /// Split a positive amount into `(accrued, paid)` deltas.
    pub(crate) fn split(self, amount: Money) -> (Money, Money) {
        match self {
            Self::Accrual => (amount, Money::ZERO),
            Self::Payment => (Money::ZERO, amount),
        }
    }
}

impl TryFrom<&str> for AccrualKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "accrual" => Ok(Self::Accrual),
            "payment" => Ok(Self::Payment),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid entry type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendEntry {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub position: i32,
    pub partner_id: i64,
    pub currency_id: i64,
    pub kind: AccrualKind,
    pub amount: Money,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transaction_dividend_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transaction_id: String,
    pub position: i32,
    pub partner_id: i64,
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

impl From<&DividendEntry> for ActiveModel {
    fn from(entry: &DividendEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            transaction_id: ActiveValue::Set(entry.transaction_id.to_string()),
            position: ActiveValue::Set(entry.position),
            partner_id: ActiveValue::Set(entry.partner_id),
            currency_id: ActiveValue::Set(entry.currency_id),
            kind: ActiveValue::Set(entry.kind.as_str().to_string()),
            amount: ActiveValue::Set(entry.amount.cents()),
            description: ActiveValue::Set(entry.description.clone()),
        }
    }
}

impl TryFrom<Model> for DividendEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "dividend entry")?,
            transaction_id: parse_uuid(&model.transaction_id, "transaction")?,
            position: model.position,
            partner_id: model.partner_id,
            currency_id: model.currency_id,
            kind: AccrualKind::try_from(model.kind.as_str())?,
            amount: Money::new(model.amount),
            description: model.description,
        })
    }
}
