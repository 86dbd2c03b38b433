use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, Quantity, util::parse_uuid};

/// Stock consumed by a production run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionIngredient {
    pub id: Uuid,
    pub production_id: Uuid,
    pub position: i32,
    pub product_id: i64,
    /// Warehouse the ingredient is taken from.
    pub warehouse_id: i64,
    pub planned_quantity: Quantity,
    pub actual_quantity: Quantity,
    /// Average cost of the stock at the moment it was consumed.
    pub unit_cost: Option<Money>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "production_ingredients")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub production_id: String,
    pub position: i32,
    pub product_id: i64,
    pub warehouse_id: i64,
    pub planned_quantity: i64,
    pub actual_quantity: i64,
    pub unit_cost: Option<i64>,
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

impl From<&ProductionIngredient> for ActiveModel {
    fn from(ingredient: &ProductionIngredient) -> Self {
        Self {
            id: ActiveValue::Set(ingredient.id.to_string()),
            production_id: ActiveValue::Set(ingredient.production_id.to_string()),
            position: ActiveValue::Set(ingredient.position),
            product_id: ActiveValue::Set(ingredient.product_id),
            warehouse_id: ActiveValue::Set(ingredient.warehouse_id),
            planned_quantity: ActiveValue::Set(ingredient.planned_quantity.milli()),
            actual_quantity: ActiveValue::Set(ingredient.actual_quantity.milli()),
            unit_cost: ActiveValue::Set(ingredient.unit_cost.map(Money::cents)),
        }
    }
}

impl TryFrom<Model> for ProductionIngredient {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "ingredient")?,
            production_id: parse_uuid(&model.production_id, "production")?,
            position: model.position,
            product_id: model.product_id,
            warehouse_id: model.warehouse_id,
            planned_quantity: Quantity::new(model.planned_quantity),
            actual_quantity: Quantity::new(model.actual_quantity),
            unit_cost: model.unit_cost.map(Money::new),
        })
    }
}
