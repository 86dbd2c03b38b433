//! Production runs.
//!
//! A `Production` turns ingredient stock into output stock following a
//! recipe. On confirm the consumed ingredients are valued at their average
//! cost and that value is spread over the produced quantity.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    DocumentStatus, EngineError, Money, ProductionIngredient, ProductionOutput, Quantity,
    ResultEngine, util::parse_uuid,
};

pub(crate) const NUMBER_PREFIX: &str = "PR";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Production {
    pub id: Uuid,
    pub number: String,
    pub recipe_id: i64,
    pub date: NaiveDate,
    /// Where the outputs are stored.
    pub warehouse_id: i64,
    pub batch_count: i64,
    pub status: DocumentStatus,
    pub description: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub ingredients: Vec<ProductionIngredient>,
    pub outputs: Vec<ProductionOutput>,
}

impl Production {
    /// Sum of the actual output quantities.
    pub fn output_quantity(&self) -> ResultEngine<Quantity> {
        Quantity::try_sum(self.outputs.iter().map(|output| output.actual_quantity))
    }

    /// Value of the consumed ingredients, known once confirmed.
    pub fn ingredient_cost(&self) -> ResultEngine<Money> {
        Money::try_sum(self.ingredients.iter().filter_map(|ingredient| {
            ingredient
                .unit_cost
                .map(|cost| ingredient.actual_quantity.value_at(cost))
        }))
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "productions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub number: String,
    pub recipe_id: i64,
    pub date: Date,
    pub warehouse_id: i64,
    pub batch_count: i64,
    pub status: String,
    pub description: Option<String>,
    pub created_by: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::production_ingredients::Entity")]
    Ingredients,
    #[sea_orm(has_many = "super::production_outputs::Entity")]
    Outputs,
}

impl Related<super::production_ingredients::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ingredients.def()
    }
}

impl Related<super::production_outputs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Outputs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Production> for ActiveModel {
    fn from(production: &Production) -> Self {
        Self {
            id: ActiveValue::Set(production.id.to_string()),
            number: ActiveValue::Set(production.number.clone()),
            recipe_id: ActiveValue::Set(production.recipe_id),
            date: ActiveValue::Set(production.date),
            warehouse_id: ActiveValue::Set(production.warehouse_id),
            batch_count: ActiveValue::Set(production.batch_count),
            status: ActiveValue::Set(production.status.as_str().to_string()),
            description: ActiveValue::Set(production.description.clone()),
            created_by: ActiveValue::Set(production.created_by),
            created_at: ActiveValue::Set(production.created_at),
            updated_at: ActiveValue::Set(production.updated_at),
        }
    }
}

impl TryFrom<Model> for Production {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "production")?,
            number: model.number,
            recipe_id: model.recipe_id,
            date: model.date,
            warehouse_id: model.warehouse_id,
            batch_count: model.batch_count,
            status: DocumentStatus::try_from(model.status.as_str())?,
            description: model.description,
            created_by: model.created_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
            ingredients: Vec::new(),
            outputs: Vec::new(),
        })
    }
}
