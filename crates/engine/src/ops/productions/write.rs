use chrono::{Datelike, Utc};
use sea_orm::{ConnectionTrait, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    DocumentStatus, EngineError, Money, Production, ProductionCmd, ProductionIngredient,
    ProductionOutput, Quantity, ResultEngine, production_ingredients, production_outputs,
    productions,
    util::{ensure_positive_quantity, normalize_optional_text, position},
};

use super::super::{Engine, numbering::next_number, with_tx};
use super::{delete_lines, load_production, load_recipe};

impl Engine {
    /// Create a draft production run.
    ///
    /// Ingredients and outputs not given explicitly are expanded from the
    /// recipe, multiplied by `batch_count`. Output costs stay zero until the
    /// run is confirmed.
    pub async fn create_production(&self, cmd: ProductionCmd) -> ResultEngine<Production> {
        with_tx!(self, |db_tx| {
            let now = Utc::now();
            let number = next_number::<productions::Entity, _>(
                &db_tx,
                productions::Column::Number,
                productions::NUMBER_PREFIX,
                cmd.date.year(),
            )
            .await?;

            let mut production = Production {
                id: Uuid::new_v4(),
                number,
                recipe_id: cmd.recipe_id,
                date: cmd.date,
                warehouse_id: cmd.warehouse_id,
                batch_count: cmd.batch_count,
                status: DocumentStatus::Draft,
                description: None,
                created_by: cmd.created_by,
                created_at: now,
                updated_at: now,
                ingredients: Vec::new(),
                outputs: Vec::new(),
            };
            build_lines(&db_tx, &mut production, cmd).await?;

            productions::ActiveModel::from(&production)
                .insert(&db_tx)
                .await?;
            insert_lines(&db_tx, &production).await?;

            tracing::info!(
                id = %production.id,
                number = %production.number,
                recipe_id = production.recipe_id,
                "production created"
            );
            Ok(production)
        })
    }

    /// Replace a draft production run. Identity and number are preserved.
    pub async fn update_production(
        &self,
        id: Uuid,
        cmd: ProductionCmd,
    ) -> ResultEngine<Production> {
        with_tx!(self, |db_tx| {
            let mut production = load_production(&db_tx, id).await?;
            if !production.status.is_draft() {
                return Err(EngineError::InvalidState(
                    "only a draft can be edited".to_string(),
                ));
            }

            production.updated_at = Utc::now();
            build_lines(&db_tx, &mut production, cmd).await?;

            delete_lines(&db_tx, id).await?;
            productions::ActiveModel::from(&production)
                .update(&db_tx)
                .await?;
            insert_lines(&db_tx, &production).await?;

            tracing::info!(id = %production.id, number = %production.number, "production updated");
            Ok(production)
        })
    }
}

/// Validate `cmd` and fill the fields and lines of `production` from it.
async fn build_lines<C>(
    db: &C,
    production: &mut Production,
    cmd: ProductionCmd,
) -> ResultEngine<()>
where
    C: ConnectionTrait,
{
    let recipe = load_recipe(db, cmd.recipe_id).await?;
    let (recipe_ingredients, recipe_outputs) = recipe.expand(cmd.batch_count)?;
    let ingredient_warehouse_id = cmd.ingredient_warehouse_id.unwrap_or(cmd.warehouse_id);

    production.recipe_id = cmd.recipe_id;
    production.date = cmd.date;
    production.warehouse_id = cmd.warehouse_id;
    production.batch_count = cmd.batch_count;
    production.description = normalize_optional_text(cmd.description.as_deref());

    // (product, warehouse, planned, actual)
    let ingredients: Vec<(i64, i64, Quantity, Quantity)> = match cmd.ingredients {
        Some(inputs) => inputs
            .into_iter()
            .map(|input| {
                (
                    input.product_id,
                    input.warehouse_id.unwrap_or(ingredient_warehouse_id),
                    input.planned_quantity,
                    input.actual_quantity.unwrap_or(input.planned_quantity),
                )
            })
            .collect(),
        None => recipe_ingredients
            .into_iter()
            .map(|line| {
                (
                    line.product_id,
                    ingredient_warehouse_id,
                    line.quantity,
                    line.quantity,
                )
            })
            .collect(),
    };
    // (product, planned, actual)
    let outputs: Vec<(i64, Quantity, Quantity)> = match cmd.outputs {
        Some(inputs) => inputs
            .into_iter()
            .map(|input| {
                (
                    input.product_id,
                    input.planned_quantity,
                    input.actual_quantity.unwrap_or(input.planned_quantity),
                )
            })
            .collect(),
        None => recipe_outputs
            .into_iter()
            .map(|line| (line.product_id, line.quantity, line.quantity))
            .collect(),
    };
    if outputs.is_empty() {
        return Err(EngineError::InvalidAmount(
            "a production needs at least one output".to_string(),
        ));
    }

    production.ingredients = Vec::with_capacity(ingredients.len());
    for (index, (product_id, warehouse_id, planned, actual)) in ingredients.into_iter().enumerate()
    {
        ensure_positive_quantity(planned, "planned ingredient")?;
        ensure_positive_quantity(actual, "actual ingredient")?;
        production.ingredients.push(ProductionIngredient {
            id: Uuid::new_v4(),
            production_id: production.id,
            position: position(index)?,
            product_id,
            warehouse_id,
            planned_quantity: planned,
            actual_quantity: actual,
            unit_cost: None,
        });
    }

    production.outputs = Vec::with_capacity(outputs.len());
    for (index, (product_id, planned, actual)) in outputs.into_iter().enumerate() {
        ensure_positive_quantity(planned, "planned output")?;
        ensure_positive_quantity(actual, "actual output")?;
        production.outputs.push(ProductionOutput {
            id: Uuid::new_v4(),
            production_id: production.id,
            position: position(index)?,
            product_id,
            planned_quantity: planned,
            actual_quantity: actual,
            cost: Money::ZERO,
            prior_avg_cost: None,
        });
    }

    Ok(())
}

async fn insert_lines<C>(db: &C, production: &Production) -> ResultEngine<()>
where
    C: ConnectionTrait,
{
    for ingredient in &production.ingredients {
        production_ingredients::Entity::insert(production_ingredients::ActiveModel::from(
            ingredient,
        ))
        .exec_without_returning(db)
        .await?;
    }
    for output in &production.outputs {
        production_outputs::Entity::insert(production_outputs::ActiveModel::from(output))
            .exec_without_returning(db)
            .await?;
    }
    Ok(())
}
