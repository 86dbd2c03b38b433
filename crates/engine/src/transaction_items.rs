//! Inventory lines of a transaction.
//!
//! A [`TransactionItem`] moves `quantity` of a product in or out of
//! `warehouse_id`. When `warehouse_to_id` is set the same row also encodes the
//! destination side of a transfer: the source is always debited and the
//! destination is credited the absolute quantity.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, Quantity, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionItem {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub position: i32,
    pub product_id: i64,
    pub warehouse_id: i64,
    pub warehouse_to_id: Option<i64>,
    /// Signed: negative leaves `warehouse_id`, positive enters it.
    pub quantity: Quantity,
    pub price: Money,
    /// `|quantity| * price`.
    pub amount: Money,
    /// Average cost of the source stock recorded when an outflow is confirmed.
    pub unit_cost: Option<Money>,
    /// Average of the `warehouse_id` row before a priced inflow was merged.
    pub prior_avg_cost: Option<Money>,
    /// Average of the `warehouse_to_id` row before the transfer was merged.
    pub prior_to_avg_cost: Option<Money>,
}

impl TransactionItem {
    /// Cost used for the destination side of a transfer.
    pub(crate) fn transfer_cost(&self) -> Money {
        if self.price.is_positive() {
            self.price
        } else {
            self.unit_cost.unwrap_or(Money::ZERO)
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transaction_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transaction_id: String,
    pub position: i32,
    pub product_id: i64,
    pub warehouse_id: i64,
    pub warehouse_to_id: Option<i64>,
    pub quantity: i64,
    pub price: i64,
    pub amount: i64,
    pub unit_cost: Option<i64>,
    pub prior_avg_cost: Option<i64>,
    pub prior_to_avg_cost: Option<i64>,
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

impl From<&TransactionItem> for ActiveModel {
    fn from(item: &TransactionItem) -> Self {
        Self {
            id: ActiveValue::Set(item.id.to_string()),
            transaction_id: ActiveValue::Set(item.transaction_id.to_string()),
            position: ActiveValue::Set(item.position),
            product_id: ActiveValue::Set(item.product_id),
            warehouse_id: ActiveValue::Set(item.warehouse_id),
            warehouse_to_id: ActiveValue::Set(item.warehouse_to_id),
            quantity: ActiveValue::Set(item.quantity.milli()),
            price: ActiveValue::Set(item.price.cents()),
            amount: ActiveValue::Set(item.amount.cents()),
            unit_cost: ActiveValue::Set(item.unit_cost.map(Money::cents)),
            prior_avg_cost: ActiveValue::Set(item.prior_avg_cost.map(Money::cents)),
            prior_to_avg_cost: ActiveValue::Set(item.prior_to_avg_cost.map(Money::cents)),
        }
    }
}

impl TryFrom<Model> for TransactionItem {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "item")?,
            transaction_id: parse_uuid(&model.transaction_id, "transaction")?,
            position: model.position,
            product_id: model.product_id,
            warehouse_id: model.warehouse_id,
            warehouse_to_id: model.warehouse_to_id,
            quantity: Quantity::new(model.quantity),
            price: Money::new(model.price),
            amount: Money::new(model.amount),
            unit_cost: model.unit_cost.map(Money::new),
            prior_avg_cost: model.prior_avg_cost.map(Money::new),
            prior_to_avg_cost: model.prior_to_avg_cost.map(Money::new),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: i64, unit_cost: Option<i64>) -> TransactionItem {
        TransactionItem {
            id: Uuid::new_v4(),
            transaction_id: Uuid::new_v4(),
            position: 0,
            product_id: 1,
            warehouse_id: 1,
            warehouse_to_id: Some(2),
            quantity: Quantity::units(-1),
            price: Money::new(price),
            amount: Money::new(price),
            unit_cost: unit_cost.map(Money::new),
            prior_avg_cost: None,
            prior_to_avg_cost: None,
        }
    }

    #[test]
    fn transfer_cost_prefers_explicit_price() {
        assert_eq!(item(500, Some(300)).transfer_cost(), Money::new(500));
        assert_eq!(item(0, Some(300)).transfer_cost(), Money::new(300));
        assert_eq!(item(0, None).transfer_cost(), Money::ZERO);
    }
}
