use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, ConnectionTrait, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    DocumentStatus, EngineError, Money, Production, ResultEngine,
    ledger::move_stock,
    production_ingredients, production_outputs, productions,
    stock_balances::StockMovement,
};

use super::super::{Engine, product_label, transition, with_tx};
use super::{delete_lines, load_production};

impl Engine {
    /// Consume the ingredients and stock the outputs of a draft run.
    ///
    /// Every ingredient must be covered by its warehouse stock; the first one
    /// that is not aborts the whole confirm. The consumed value is spread
    /// evenly over the produced quantity and merged into the output stock
    /// average cost.
    pub async fn confirm_production(&self, id: Uuid) -> ResultEngine<Production> {
        with_tx!(self, |db_tx| {
            let now = Utc::now();
            if !set_status(&db_tx, id, DocumentStatus::Draft, DocumentStatus::Confirmed, now)
                .await?
            {
                load_production(&db_tx, id).await?;
                return Err(EngineError::InvalidState(
                    "only a draft can be confirmed".to_string(),
                ));
            }
            let mut production = load_production(&db_tx, id).await?;

            for ingredient in &mut production.ingredients {
                let consumed = move_stock(
                    &db_tx,
                    ingredient.warehouse_id,
                    ingredient.product_id,
                    StockMovement::consume(ingredient.actual_quantity),
                )
                .await;
                let stock = match consumed {
                    Err(EngineError::InsufficientStock(_)) => {
                        let product = product_label(&db_tx, ingredient.product_id).await?;
                        return Err(EngineError::InsufficientStock(format!(
                            "insufficient stock for product {product}"
                        )));
                    }
                    other => other?.after,
                };

                ingredient.unit_cost = Some(stock.avg_cost);
                production_ingredients::ActiveModel {
                    id: ActiveValue::Set(ingredient.id.to_string()),
                    unit_cost: ActiveValue::Set(Some(stock.avg_cost.cents())),
                    ..Default::default()
                }
                .update(&db_tx)
                .await?;
            }

            let ingredient_cost = production.ingredient_cost()?;
            let cost_per_unit = ingredient_cost.per_unit(production.output_quantity()?);
            for output in &mut production.outputs {
                let target = move_stock(
                    &db_tx,
                    production.warehouse_id,
                    output.product_id,
                    StockMovement::inflow(output.actual_quantity, cost_per_unit),
                )
                .await?;
                output.cost = cost_per_unit;
                output.prior_avg_cost = Some(target.before.avg_cost);
                production_outputs::ActiveModel {
                    id: ActiveValue::Set(output.id.to_string()),
                    cost: ActiveValue::Set(cost_per_unit.cents()),
                    prior_avg_cost: ActiveValue::Set(output.prior_avg_cost.map(Money::cents)),
                    ..Default::default()
                }
                .update(&db_tx)
                .await?;
            }

            tracing::info!(
                id = %production.id,
                number = %production.number,
                cost = %ingredient_cost,
                %cost_per_unit,
                "production confirmed"
            );
            Ok(production)
        })
    }

    /// Reverse a confirmed run: outputs leave stock and ingredients return at
    /// the cost they were consumed at.
    pub async fn cancel_production(&self, id: Uuid) -> ResultEngine<Production> {
        with_tx!(self, |db_tx| {
            let now = Utc::now();
            if !set_status(
                &db_tx,
                id,
                DocumentStatus::Confirmed,
                DocumentStatus::Cancelled,
                now,
            )
            .await?
            {
                load_production(&db_tx, id).await?;
                return Err(EngineError::InvalidState(
                    "only a confirmed run can be cancelled".to_string(),
                ));
            }
            let production = load_production(&db_tx, id).await?;

            for output in production.outputs.iter().rev() {
                move_stock(
                    &db_tx,
                    production.warehouse_id,
                    output.product_id,
                    StockMovement::unwind(output.actual_quantity, output.cost)
                        .restoring(output.prior_avg_cost)
                        .pruning_negative(),
                )
                .await?;
            }
            for ingredient in production.ingredients.iter().rev() {
                move_stock(
                    &db_tx,
                    ingredient.warehouse_id,
                    ingredient.product_id,
                    StockMovement::inflow(
                        ingredient.actual_quantity,
                        ingredient.unit_cost.unwrap_or(Money::ZERO),
                    ),
                )
                .await?;
            }

            tracing::info!(id = %production.id, number = %production.number, "production cancelled");
            Ok(production)
        })
    }

    /// Delete a draft run with its lines.
    pub async fn delete_production(&self, id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let production = load_production(&db_tx, id).await?;
            if !production.status.is_draft() {
                return Err(EngineError::InvalidState(
                    "only a draft can be deleted".to_string(),
                ));
            }

            delete_lines(&db_tx, id).await?;
            productions::Entity::delete_by_id(id.to_string())
                .exec(&db_tx)
                .await?;

            tracing::info!(id = %production.id, number = %production.number, "production deleted");
            Ok(())
        })
    }
}

async fn set_status<C>(
    db: &C,
    id: Uuid,
    from: DocumentStatus,
    to: DocumentStatus,
    now: DateTime<Utc>,
) -> ResultEngine<bool>
where
    C: ConnectionTrait,
{
    transition::<productions::Entity, _>(
        db,
        productions::Column::Id,
        productions::Column::Status,
        productions::Column::UpdatedAt,
        &id.to_string(),
        from,
        to,
        now,
    )
    .await
}
