use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, Quantity, util::parse_uuid};

/// Stock produced by a production run, stored in the run's warehouse.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionOutput {
    pub id: Uuid,
    pub production_id: Uuid,
    pub position: i32,
    pub product_id: i64,
    pub planned_quantity: Quantity,
    pub actual_quantity: Quantity,
    /// Cost per unit, zero until the run is confirmed.
    pub cost: Money,
    /// Average of the output stock row before this output was merged.
    pub prior_avg_cost: Option<Money>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "production_outputs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub production_id: String,
    pub position: i32,
    pub product_id: i64,
    pub planned_quantity: i64,
    pub actual_quantity: i64,
    pub cost: i64,
    pub prior_avg_cost: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::productions::Entity",
        from = "Column::ProductionId",
        to = "super::productions::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Productions,
}

impl Related<super::productions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Productions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&ProductionOutput> for ActiveModel {
    fn from(output: &ProductionOutput) -> Self {
        Self {
            id: ActiveValue::Set(output.id.to_string()),
            production_id: ActiveValue::Set(output.production_id.to_string()),
            position: ActiveValue::Set(output.position),
            product_id: ActiveValue::Set(output.product_id),
            planned_quantity: ActiveValue::Set(output.planned_quantity.milli()),
            actual_quantity: ActiveValue::Set(output.actual_quantity.milli()),
            cost: ActiveValue::Set(output.cost.cents()),
            prior_avg_cost: ActiveValue::Set(output.prior_avg_cost.map(Money::cents)),
        }
    }
}

impl TryFrom<Model> for ProductionOutput {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "output")?,
            production_id: parse_uuid(&model.production_id, "production")?,
            position: model.position,
            product_id: model.product_id,
            planned_quantity: Quantity::new(model.planned_quantity),
            actual_quantity: Quantity::new(model.actual_quantity),
            cost: Money::new(model.cost),
            prior_avg_cost: model.prior_avg_cost.map(Money::new),
        })
    }
}
