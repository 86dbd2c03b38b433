use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Production, Recipe, ResultEngine, production_ingredients, production_outputs,
    productions, recipe_ingredients, recipe_outputs, recipes,
};

use super::{Engine, load_children};

mod lifecycle;
mod write;

impl Engine {
    /// Return a production run with its ingredients and outputs.
    pub async fn production(&self, id: Uuid) -> ResultEngine<Production> {
        load_production(&self.database, id).await
    }

    /// Return a recipe with its lines in order.
    pub async fn recipe(&self, id: i64) -> ResultEngine<Recipe> {
        load_recipe(&self.database, id).await
    }
}

pub(super) async fn load_production<C>(db: &C, id: Uuid) -> ResultEngine<Production>
where
    C: ConnectionTrait,
{
    let model = productions::Entity::find_by_id(id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("production not exists".to_string()))?;
    let mut production = Production::try_from(model)?;
    let id = production.id.to_string();
    production.ingredients = load_children::<production_ingredients::Entity, _, _>(
        db,
        production_ingredients::Column::ProductionId,
        production_ingredients::Column::Position,
        &id,
    )
    .await?;
    production.outputs = load_children::<production_outputs::Entity, _, _>(
        db,
        production_outputs::Column::ProductionId,
        production_outputs::Column::Position,
        &id,
    )
    .await?;
    Ok(production)
}

async fn load_recipe<C>(db: &C, id: i64) -> ResultEngine<Recipe>
where
    C: ConnectionTrait,
{
    let model = recipes::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("recipe {id}")))?;
    let ingredients = model
        .find_related(recipe_ingredients::Entity)
        .order_by_asc(recipe_ingredients::Column::Position)
        .all(db)
        .await?;
    let outputs = model
        .find_related(recipe_outputs::Entity)
        .order_by_asc(recipe_outputs::Column::Position)
        .all(db)
        .await?;

    Ok(Recipe {
        id: model.id,
        name: model.name,
        ingredients: ingredients.into_iter().map(Into::into).collect(),
        outputs: outputs.into_iter().map(Into::into).collect(),
    })
}

async fn delete_lines<C>(db: &C, id: Uuid) -> ResultEngine<()>
where
    C: ConnectionTrait,
{
    let id = id.to_string();
    production_ingredients::Entity::delete_many()
        .filter(production_ingredients::Column::ProductionId.eq(id.as_str()))
        .exec(db)
        .await?;
    production_outputs::Entity::delete_many()
        .filter(production_outputs::Column::ProductionId.eq(id.as_str()))
        .exec(db)
        .await?;
    Ok(())
}
