use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    DocumentStatus, Engine, EngineError, IngredientInput, ItemInput, Money, OutputInput,
    ProductionCmd, Quantity, TransactionCmd, TransactionKind,
};
use migration::MigratorTrait;

const FLOUR: i64 = 1;
const BREAD: i64 = 2;
const SALT: i64 = 3;
const KITCHEN: i64 = 1;
const SHOP: i64 = 2;
/// 5 flour -> 5 bread
const LOAF: i64 = 1;
/// 2 flour + 1 salt -> 1 bread
const SALTED: i64 = 2;
const OPERATOR: i64 = 1;

async fn exec(db: &DatabaseConnection, sql: &str, values: Vec<sea_orm::Value>) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(backend, sql, values))
        .await
        .unwrap();
}

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    exec(
        &db,
        "INSERT INTO products (id, name) VALUES (?, ?), (?, ?), (?, ?)",
        vec![
            FLOUR.into(),
            "Flour".into(),
            BREAD.into(),
            "Bread".into(),
            SALT.into(),
            "Salt".into(),
        ],
    )
    .await;
    exec(
        &db,
        "INSERT INTO recipes (id, name) VALUES (?, ?), (?, ?)",
        vec![
            LOAF.into(),
            "Loaf".into(),
            SALTED.into(),
            "Salted loaf".into(),
        ],
    )
    .await;
    exec(
        &db,
        "INSERT INTO recipe_ingredients (id, recipe_id, position, product_id, quantity) \
         VALUES (1, 1, 0, 1, 5000), (2, 2, 0, 1, 2000), (3, 2, 1, 3, 1000)",
        vec![],
    )
    .await;
    exec(
        &db,
        "INSERT INTO recipe_outputs (id, recipe_id, position, product_id, quantity) \
         VALUES (1, 1, 0, 2, 5000), (2, 2, 0, 2, 1000)",
        vec![],
    )
    .await;

    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

async fn stock_up(engine: &Engine, warehouse_id: i64, product_id: i64, units: i64, price: i64) {
    let tx = engine
        .create_transaction(
            TransactionCmd::new(TransactionKind::Purchase, day(2025, 1, 10), OPERATOR).item(
                ItemInput::new(product_id, warehouse_id, Quantity::units(units))
                    .price(Money::new(price)),
            ),
        )
        .await
        .unwrap();
    engine.confirm_transaction(tx.id).await.unwrap();
}

#[tokio::test]
async fn output_cost_merges_into_weighted_average() {
    let (engine, _db) = engine_with_db().await;
    stock_up(&engine, KITCHEN, BREAD, 10, 200).await;
    stock_up(&engine, KITCHEN, FLOUR, 5, 800).await;

    let production = engine
        .create_production(ProductionCmd::new(LOAF, day(2025, 2, 1), KITCHEN, OPERATOR))
        .await
        .unwrap();
    assert_eq!(production.status, DocumentStatus::Draft);
    assert_eq!(production.outputs[0].cost, Money::ZERO);

    let confirmed = engine.confirm_production(production.id).await.unwrap();
    assert_eq!(confirmed.status, DocumentStatus::Confirmed);
    assert_eq!(confirmed.ingredients[0].unit_cost, Some(Money::new(800)));
    assert_eq!(confirmed.outputs[0].cost, Money::new(800));

    let bread = engine.stock_balance(KITCHEN, BREAD).await.unwrap().unwrap();
    assert_eq!(bread.quantity, Quantity::units(15));
    assert_eq!(bread.avg_cost, Money::new(400));
    assert_eq!(engine.stock_balance(KITCHEN, FLOUR).await.unwrap(), None);

    let stored = engine.production(production.id).await.unwrap();
    assert_eq!(stored.outputs[0].cost, Money::new(800));
    assert!(engine.reconcile().await.unwrap().is_empty());
}

#[tokio::test]
async fn cancel_returns_ingredients_and_removes_outputs() {
    let (engine, _db) = engine_with_db().await;
    stock_up(&engine, KITCHEN, BREAD, 10, 200).await;
    stock_up(&engine, KITCHEN, FLOUR, 5, 800).await;

    let production = engine
        .create_production(ProductionCmd::new(LOAF, day(2025, 2, 1), KITCHEN, OPERATOR))
        .await
        .unwrap();
    engine.confirm_production(production.id).await.unwrap();

    let cancelled = engine.cancel_production(production.id).await.unwrap();
    assert_eq!(cancelled.status, DocumentStatus::Cancelled);

    let bread = engine.stock_balance(KITCHEN, BREAD).await.unwrap().unwrap();
    assert_eq!(bread.quantity, Quantity::units(10));
    assert_eq!(bread.avg_cost, Money::new(200));
    let flour = engine.stock_balance(KITCHEN, FLOUR).await.unwrap().unwrap();
    assert_eq!(flour.quantity, Quantity::units(5));
    assert_eq!(flour.avg_cost, Money::new(800));
    assert!(engine.reconcile().await.unwrap().is_empty());

    let err = engine.cancel_production(production.id).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidState("only a confirmed run can be cancelled".to_string())
    );
}

#[tokio::test]
async fn insufficient_stock_leaves_every_ingredient_untouched() {
    let (engine, _db) = engine_with_db().await;
    stock_up(&engine, KITCHEN, FLOUR, 10, 100).await;

    let production = engine
        .create_production(ProductionCmd::new(SALTED, day(2025, 2, 1), KITCHEN, OPERATOR))
        .await
        .unwrap();
    assert_eq!(production.ingredients.len(), 2);

    let err = engine.confirm_production(production.id).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientStock("insufficient stock for product Salt".to_string())
    );

    let flour = engine.stock_balance(KITCHEN, FLOUR).await.unwrap().unwrap();
    assert_eq!(flour.quantity, Quantity::units(10));
    assert_eq!(engine.stock_balance(KITCHEN, BREAD).await.unwrap(), None);

    let stored = engine.production(production.id).await.unwrap();
    assert_eq!(stored.status, DocumentStatus::Draft);
    assert_eq!(stored.ingredients[0].unit_cost, None);
}

#[tokio::test]
async fn recipe_lines_scale_with_batch_count() {
    let (engine, _db) = engine_with_db().await;

    let production = engine
        .create_production(
            ProductionCmd::new(SALTED, day(2025, 2, 1), SHOP, OPERATOR)
                .batch_count(3)
                .ingredient_warehouse(KITCHEN),
        )
        .await
        .unwrap();

    assert_eq!(production.number, "PR-2025-00001");
    let ingredients: Vec<(i64, i64, Quantity)> = production
        .ingredients
        .iter()
        .map(|line| (line.product_id, line.warehouse_id, line.planned_quantity))
        .collect();
    assert_eq!(
        ingredients,
        vec![
            (FLOUR, KITCHEN, Quantity::units(6)),
            (SALT, KITCHEN, Quantity::units(3)),
        ]
    );
    assert_eq!(production.outputs[0].planned_quantity, Quantity::units(3));
    assert_eq!(production.outputs[0].actual_quantity, Quantity::units(3));

    let second = engine
        .create_production(ProductionCmd::new(LOAF, day(2025, 2, 2), SHOP, OPERATOR))
        .await
        .unwrap();
    assert_eq!(second.number, "PR-2025-00002");
    // without an ingredient warehouse the output warehouse is used
    assert_eq!(second.ingredients[0].warehouse_id, SHOP);

    let err = engine
        .create_production(
            ProductionCmd::new(LOAF, day(2025, 2, 1), SHOP, OPERATOR).batch_count(0),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("batch_count must be >= 1".to_string())
    );
}

#[tokio::test]
async fn explicit_lines_override_the_recipe() {
    let (engine, _db) = engine_with_db().await;
    stock_up(&engine, SHOP, FLOUR, 10, 300).await;

    let production = engine
        .create_production(
            ProductionCmd::new(LOAF, day(2025, 2, 1), KITCHEN, OPERATOR)
                .ingredients(vec![
                    IngredientInput::new(FLOUR, Quantity::units(4))
                        .warehouse(SHOP)
                        .actual(Quantity::units(6)),
                ])
                .outputs(vec![
                    OutputInput::new(BREAD, Quantity::units(4)).actual(Quantity::units(3)),
                ]),
        )
        .await
        .unwrap();
    assert_eq!(production.ingredients[0].actual_quantity, Quantity::units(6));

    engine.confirm_production(production.id).await.unwrap();

    // 6 x 3.00 over 3 loaves
    let bread = engine.stock_balance(KITCHEN, BREAD).await.unwrap().unwrap();
    assert_eq!(bread.quantity, Quantity::units(3));
    assert_eq!(bread.avg_cost, Money::new(600));
    let flour = engine.stock_balance(SHOP, FLOUR).await.unwrap().unwrap();
    assert_eq!(flour.quantity, Quantity::units(4));

    let err = engine
        .create_production(
            ProductionCmd::new(LOAF, day(2025, 2, 1), KITCHEN, OPERATOR).outputs(Vec::new()),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("a production needs at least one output".to_string())
    );
}

#[tokio::test]
async fn only_drafts_can_be_edited_confirmed_or_deleted() {
    let (engine, _db) = engine_with_db().await;
    stock_up(&engine, KITCHEN, FLOUR, 20, 100).await;

    let production = engine
        .create_production(ProductionCmd::new(LOAF, day(2025, 2, 1), KITCHEN, OPERATOR))
        .await
        .unwrap();

    let updated = engine
        .update_production(
            production.id,
            ProductionCmd::new(LOAF, day(2025, 2, 3), KITCHEN, OPERATOR).batch_count(2),
        )
        .await
        .unwrap();
    assert_eq!(updated.number, production.number);
    assert_eq!(updated.ingredients[0].planned_quantity, Quantity::units(10));

    engine.confirm_production(production.id).await.unwrap();

    let err = engine.confirm_production(production.id).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidState("only a draft can be confirmed".to_string())
    );
    let err = engine
        .update_production(
            production.id,
            ProductionCmd::new(LOAF, day(2025, 2, 3), KITCHEN, OPERATOR),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidState("only a draft can be edited".to_string())
    );
    let err = engine.delete_production(production.id).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidState("only a draft can be deleted".to_string())
    );

    let draft = engine
        .create_production(ProductionCmd::new(LOAF, day(2025, 2, 4), KITCHEN, OPERATOR))
        .await
        .unwrap();
    engine.delete_production(draft.id).await.unwrap();
    let err = engine.production(draft.id).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("production not exists".to_string()));
}

#[tokio::test]
async fn unknown_recipe_is_reported() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .create_production(ProductionCmd::new(99, day(2025, 2, 1), KITCHEN, OPERATOR))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("recipe 99".to_string()));

    let recipe = engine.recipe(SALTED).await.unwrap();
    assert_eq!(recipe.name, "Salted loaf");
    assert_eq!(recipe.ingredients.len(), 2);
    assert_eq!(recipe.ingredients[1].product_id, SALT);
}

#[tokio::test]
async fn cancel_restores_output_average_exactly() {
    let (engine, _db) = engine_with_db().await;
    stock_up(&engine, KITCHEN, BREAD, 3, 100).await;
    stock_up(&engine, KITCHEN, FLOUR, 1, 102).await;

    let production = engine
        .create_production(
            ProductionCmd::new(LOAF, day(2025, 2, 1), KITCHEN, OPERATOR)
                .ingredients(vec![IngredientInput::new(FLOUR, Quantity::units(1))])
                .outputs(vec![OutputInput::new(BREAD, Quantity::units(1))]),
        )
        .await
        .unwrap();
    let confirmed = engine.confirm_production(production.id).await.unwrap();
    assert_eq!(confirmed.outputs[0].prior_avg_cost, Some(Money::new(100)));

    // (3 x 1.00 + 1 x 1.02) / 4 = 1.005
    let bread = engine.stock_balance(KITCHEN, BREAD).await.unwrap().unwrap();
    assert_eq!(bread.avg_cost, Money::new(101));

    engine.cancel_production(production.id).await.unwrap();
    let bread = engine.stock_balance(KITCHEN, BREAD).await.unwrap().unwrap();
    assert_eq!(bread.quantity, Quantity::units(3));
    assert_eq!(bread.avg_cost, Money::new(100));
}

#[tokio::test]
async fn oversized_batch_count_is_rejected() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .create_production(
            ProductionCmd::new(LOAF, day(2025, 2, 1), KITCHEN, OPERATOR)
                .batch_count(i64::MAX / 1000),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("quantity out of range".to_string())
    );
}
