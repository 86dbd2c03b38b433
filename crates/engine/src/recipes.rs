//! Recipes: per-batch ingredient and output quantities.
//!
//! Recipes are reference data. The engine only reads them to expand a
//! production into planned quantities.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{EngineError, Quantity, ResultEngine, recipe_ingredients, recipe_outputs};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeLine {
    pub product_id: i64,
    /// Quantity for a single batch.
    pub quantity: Quantity,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub ingredients: Vec<RecipeLine>,
    pub outputs: Vec<RecipeLine>,
}

impl Recipe {
    /// Ingredient and output lines multiplied by `batch_count`, in recipe
    /// order.
    pub fn expand(&self, batch_count: i64) -> ResultEngine<(Vec<RecipeLine>, Vec<RecipeLine>)> {
        if batch_count < 1 {
            return Err(EngineError::InvalidAmount(
                "batch_count must be >= 1".to_string(),
            ));
        }
        let scale = |lines: &[RecipeLine]| {
            lines
                .iter()
                .map(|line| {
                    Ok(RecipeLine {
                        product_id: line.product_id,
                        quantity: line.quantity.times(batch_count)?,
                    })
                })
                .collect::<ResultEngine<Vec<_>>>()
        };
        Ok((scale(&self.ingredients)?, scale(&self.outputs)?))
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recipes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::recipe_ingredients::Entity")]
    Ingredients,
    #[sea_orm(has_many = "super::recipe_outputs::Entity")]
    Outputs,
}

impl Related<super::recipe_ingredients::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ingredients.def()
    }
}

impl Related<super::recipe_outputs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Outputs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<recipe_ingredients::Model> for RecipeLine {
    fn from(model: recipe_ingredients::Model) -> Self {
        Self {
            product_id: model.product_id,
            quantity: Quantity::new(model.quantity),
        }
    }
}

impl From<recipe_outputs::Model> for RecipeLine {
    fn from(model: recipe_outputs::Model) -> Self {
        Self {
            product_id: model.product_id,
            quantity: Quantity::new(model.quantity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe() -> Recipe {
        Recipe {
            id: 1,
            name: "Bread".to_string(),
            ingredients: vec![
                RecipeLine {
                    product_id: 10,
                    quantity: Quantity::new(500),
                },
                RecipeLine {
                    product_id: 11,
                    quantity: Quantity::new(10),
                },
            ],
            outputs: vec![RecipeLine {
                product_id: 20,
                quantity: Quantity::units(1),
            }],
        }
    }

    #[test]
    fn expand_multiplies_every_line_by_batch_count() {
        let (ingredients, outputs) = recipe().expand(3).unwrap();
        assert_eq!(ingredients[0].quantity, Quantity::new(1_500));
        assert_eq!(ingredients[1].quantity, Quantity::new(30));
        assert_eq!(ingredients[1].product_id, 11);
        assert_eq!(outputs[0].quantity, Quantity::units(3));
    }

    #[test]
    fn expand_rejects_empty_batch() {
        assert_eq!(
            recipe().expand(0),
            Err(EngineError::InvalidAmount(
                "batch_count must be >= 1".to_string()
            ))
        );
    }

    #[test]
    fn expand_rejects_overflowing_batch() {
        assert_eq!(
            recipe().expand(i64::MAX / 100),
            Err(EngineError::InvalidAmount("quantity out of range".to_string()))
        );
    }
}
