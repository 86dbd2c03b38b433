use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    CashEntryInput, CounterpartyEntryInput, DividendEntryInput, DocumentStatus, Engine,
    EngineError, ItemInput, LedgerKey, Money, Quantity, SalaryEntryInput, ServiceEntryInput,
    TransactionCmd, TransactionKind, TransactionListFilter,
};
use migration::MigratorTrait;
use uuid::Uuid;

const EUR: i64 = 1;
const USD: i64 = 2;
const MAIN_REGISTER: i64 = 1;
const USD_REGISTER: i64 = 2;
const FLOUR: i64 = 1;
const OPERATOR: i64 = 1;

async fn exec(db: &DatabaseConnection, sql: &str, values: Vec<sea_orm::Value>) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(backend, sql, values))
        .await
        .unwrap();
}

async fn seed(db: &DatabaseConnection) {
    migration::Migrator::up(db, None).await.unwrap();
    exec(
        db,
        "INSERT INTO cash_registers (id, name, currency_id) VALUES (?, ?, ?), (?, ?, ?)",
        vec![
            MAIN_REGISTER.into(),
            "Main".into(),
            EUR.into(),
            USD_REGISTER.into(),
            "Dollars".into(),
            USD.into(),
        ],
    )
    .await;
    exec(
        db,
        "INSERT INTO products (id, name) VALUES (?, ?)",
        vec![FLOUR.into(), "Flour".into()],
    )
    .await;
}

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    seed(&db).await;
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn engine_with_file_db() -> (Engine, DatabaseConnection, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("engine_{}.db", Uuid::new_v4()));
    let db = Database::connect(format!("sqlite:{}?mode=rwc", path.display()))
        .await
        .unwrap();
    seed(&db).await;
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db, path)
}

fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn cash_in(amount: i64) -> TransactionCmd {
    TransactionCmd::new(TransactionKind::CashIn, day(2025, 3, 1), OPERATOR).cash(
        CashEntryInput::new(MAIN_REGISTER, EUR, Money::new(amount)),
    )
}

fn purchase(warehouse_id: i64, units: i64, price: i64) -> TransactionCmd {
    TransactionCmd::new(TransactionKind::Purchase, day(2025, 3, 1), OPERATOR).item(
        ItemInput::new(FLOUR, warehouse_id, Quantity::units(units)).price(Money::new(price)),
    )
}

async fn cash(engine: &Engine) -> Money {
    engine
        .cash_balance(MAIN_REGISTER, EUR)
        .await
        .unwrap()
        .balance
}

#[tokio::test]
async fn confirm_then_cancel_restores_cash_balance() {
    let (engine, _db) = engine_with_db().await;

    let opening = engine.create_transaction(cash_in(10_000)).await.unwrap();
    engine.confirm_transaction(opening.id).await.unwrap();
    assert_eq!(cash(&engine).await, Money::new(10_000));

    let tx = engine.create_transaction(cash_in(5_000)).await.unwrap();
    let confirmed = engine.confirm_transaction(tx.id).await.unwrap();
    assert_eq!(confirmed.status, DocumentStatus::Confirmed);
    assert_eq!(cash(&engine).await, Money::new(15_000));

    let cancelled = engine.cancel_transaction(tx.id).await.unwrap();
    assert_eq!(cancelled.status, DocumentStatus::Cancelled);
    assert_eq!(cash(&engine).await, Money::new(10_000));

    let stored = engine.transaction(tx.id).await.unwrap();
    assert_eq!(stored.status, DocumentStatus::Cancelled);
}

#[tokio::test]
async fn ledgers_match_confirmed_documents_across_cycles() {
    let (engine, _db) = engine_with_db().await;

    let first = engine.create_transaction(cash_in(5_000)).await.unwrap();
    engine.confirm_transaction(first.id).await.unwrap();
    engine.cancel_transaction(first.id).await.unwrap();

    let second = engine.create_transaction(cash_in(3_000)).await.unwrap();
    engine.confirm_transaction(second.id).await.unwrap();

    let out = engine
        .create_transaction(
            TransactionCmd::new(TransactionKind::CashOut, day(2025, 3, 2), OPERATOR)
                .cash(CashEntryInput::new(MAIN_REGISTER, EUR, Money::new(-1_250))),
        )
        .await
        .unwrap();
    engine.confirm_transaction(out.id).await.unwrap();

    let stock = engine.create_transaction(purchase(1, 10, 200)).await.unwrap();
    engine.confirm_transaction(stock.id).await.unwrap();

    assert_eq!(cash(&engine).await, Money::new(1_750));
    assert!(engine.reconcile().await.unwrap().is_empty());
}

#[tokio::test]
async fn stock_confirm_cancel_restores_average_cost() {
    let (engine, _db) = engine_with_db().await;

    let base = engine.create_transaction(purchase(1, 10, 200)).await.unwrap();
    engine.confirm_transaction(base.id).await.unwrap();

    let extra = engine.create_transaction(purchase(1, 5, 800)).await.unwrap();
    engine.confirm_transaction(extra.id).await.unwrap();
    let merged = engine.stock_balance(1, FLOUR).await.unwrap().unwrap();
    assert_eq!(merged.quantity, Quantity::units(15));
    assert_eq!(merged.avg_cost, Money::new(400));

    engine.cancel_transaction(extra.id).await.unwrap();
    let restored = engine.stock_balance(1, FLOUR).await.unwrap().unwrap();
    assert_eq!(restored.quantity, Quantity::units(10));
    assert_eq!(restored.avg_cost, Money::new(200));
}

#[tokio::test]
async fn cancel_restores_average_lost_to_rounding() {
    let (engine, _db) = engine_with_db().await;

    let base = engine.create_transaction(purchase(1, 3, 100)).await.unwrap();
    engine.confirm_transaction(base.id).await.unwrap();

    let extra = engine.create_transaction(purchase(1, 1, 102)).await.unwrap();
    let confirmed = engine.confirm_transaction(extra.id).await.unwrap();
    assert_eq!(confirmed.items[0].prior_avg_cost, Some(Money::new(100)));
    // (3 x 1.00 + 1 x 1.02) / 4 = 1.005
    let merged = engine.stock_balance(1, FLOUR).await.unwrap().unwrap();
    assert_eq!(merged.avg_cost, Money::new(101));

    engine.cancel_transaction(extra.id).await.unwrap();
    let restored = engine.stock_balance(1, FLOUR).await.unwrap().unwrap();
    assert_eq!(restored.quantity, Quantity::units(3));
    assert_eq!(restored.avg_cost, Money::new(100));
}

#[tokio::test]
async fn cancel_restores_average_of_oversold_stock() {
    let (engine, _db) = engine_with_db().await;

    let sale = engine
        .create_transaction(
            TransactionCmd::new(TransactionKind::Sale, day(2025, 3, 5), OPERATOR)
                .item(ItemInput::new(FLOUR, 1, Quantity::units(5)).price(Money::new(900))),
        )
        .await
        .unwrap();
    engine.confirm_transaction(sale.id).await.unwrap();
    let oversold = engine.stock_balance(1, FLOUR).await.unwrap().unwrap();
    assert_eq!(oversold.quantity, Quantity::units(-5));
    assert_eq!(oversold.avg_cost, Money::ZERO);

    let restock = engine.create_transaction(purchase(1, 10, 300)).await.unwrap();
    engine.confirm_transaction(restock.id).await.unwrap();
    let merged = engine.stock_balance(1, FLOUR).await.unwrap().unwrap();
    assert_eq!(merged.quantity, Quantity::units(5));
    assert_eq!(merged.avg_cost, Money::new(300));

    engine.cancel_transaction(restock.id).await.unwrap();
    let restored = engine.stock_balance(1, FLOUR).await.unwrap().unwrap();
    assert_eq!(restored, oversold);
}

#[tokio::test]
async fn sale_records_unit_cost_and_cancel_returns_stock() {
    let (engine, _db) = engine_with_db().await;

    let base = engine.create_transaction(purchase(1, 4, 250)).await.unwrap();
    engine.confirm_transaction(base.id).await.unwrap();

    let sale = engine
        .create_transaction(
            TransactionCmd::new(TransactionKind::Sale, day(2025, 3, 5), OPERATOR).item(
                ItemInput::new(FLOUR, 1, Quantity::units(4)).price(Money::new(900)),
            ),
        )
        .await
        .unwrap();
    // sales always take stock out
    assert_eq!(sale.items[0].quantity, Quantity::units(-4));
    assert_eq!(sale.items[0].amount, Money::new(3_600));

    let confirmed = engine.confirm_transaction(sale.id).await.unwrap();
    assert_eq!(confirmed.items[0].unit_cost, Some(Money::new(250)));
    assert_eq!(engine.stock_balance(1, FLOUR).await.unwrap(), None);
    let stored = engine.transaction(sale.id).await.unwrap();
    assert_eq!(stored.items[0].unit_cost, Some(Money::new(250)));

    engine.cancel_transaction(sale.id).await.unwrap();
    let back = engine.stock_balance(1, FLOUR).await.unwrap().unwrap();
    assert_eq!(back.quantity, Quantity::units(4));
    assert_eq!(back.avg_cost, Money::new(250));
}

#[tokio::test]
async fn transfer_moves_stock_between_warehouses() {
    let (engine, _db) = engine_with_db().await;

    let base = engine.create_transaction(purchase(1, 10, 300)).await.unwrap();
    engine.confirm_transaction(base.id).await.unwrap();

    let transfer = engine
        .create_transaction(
            TransactionCmd::new(TransactionKind::Transfer, day(2025, 3, 6), OPERATOR)
                .item(ItemInput::new(FLOUR, 1, Quantity::units(6)).to_warehouse(2)),
        )
        .await
        .unwrap();
    engine.confirm_transaction(transfer.id).await.unwrap();

    let source = engine.stock_balance(1, FLOUR).await.unwrap().unwrap();
    let destination = engine.stock_balance(2, FLOUR).await.unwrap().unwrap();
    assert_eq!(source.quantity, Quantity::units(4));
    assert_eq!(destination.quantity, Quantity::units(6));
    // valued at the source cost when the item carries no price
    assert_eq!(destination.avg_cost, Money::new(300));
    assert!(engine.reconcile().await.unwrap().is_empty());

    engine.cancel_transaction(transfer.id).await.unwrap();
    let source = engine.stock_balance(1, FLOUR).await.unwrap().unwrap();
    assert_eq!(source.quantity, Quantity::units(10));
    assert_eq!(engine.stock_balance(2, FLOUR).await.unwrap(), None);
}

#[tokio::test]
async fn failed_transfer_leg_rolls_back_the_source() {
    let (engine, db) = engine_with_db().await;

    let base = engine.create_transaction(purchase(1, 10, 100)).await.unwrap();
    engine.confirm_transaction(base.id).await.unwrap();

    exec(
        &db,
        "CREATE TRIGGER reject_warehouse_two BEFORE INSERT ON stock_balances \
         WHEN NEW.warehouse_id = 2 BEGIN SELECT RAISE(ABORT, 'boom'); END;",
        vec![],
    )
    .await;

    let transfer = engine
        .create_transaction(
            TransactionCmd::new(TransactionKind::Transfer, day(2025, 3, 6), OPERATOR)
                .item(ItemInput::new(FLOUR, 1, Quantity::units(10)).to_warehouse(2)),
        )
        .await
        .unwrap();

    let err = engine.confirm_transaction(transfer.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Database(_)), "{err:?}");

    let source = engine.stock_balance(1, FLOUR).await.unwrap().unwrap();
    assert_eq!(source.quantity, Quantity::units(10));
    assert_eq!(engine.stock_balance(2, FLOUR).await.unwrap(), None);
    let stored = engine.transaction(transfer.id).await.unwrap();
    assert_eq!(stored.status, DocumentStatus::Draft);
    assert_eq!(stored.items[0].unit_cost, None);
}

#[tokio::test]
async fn confirming_twice_is_rejected() {
    let (engine, _db) = engine_with_db().await;

    let tx = engine.create_transaction(cash_in(2_500)).await.unwrap();
    engine.confirm_transaction(tx.id).await.unwrap();

    let err = engine.confirm_transaction(tx.id).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::AlreadyConfirmed(format!("transaction {}", tx.number))
    );
    assert_eq!(cash(&engine).await, Money::new(2_500));
}

#[tokio::test]
async fn cancelling_a_draft_only_flips_status() {
    let (engine, _db) = engine_with_db().await;

    let empty = engine
        .create_transaction(TransactionCmd::new(
            TransactionKind::CashIn,
            day(2025, 4, 1),
            OPERATOR,
        ))
        .await
        .unwrap();
    let cancelled = engine.cancel_transaction(empty.id).await.unwrap();
    assert_eq!(cancelled.status, DocumentStatus::Cancelled);

    let draft = engine.create_transaction(cash_in(700)).await.unwrap();
    engine.cancel_transaction(draft.id).await.unwrap();
    assert_eq!(cash(&engine).await, Money::ZERO);
    assert!(engine.cash_balances().await.unwrap().is_empty());

    let err = engine.confirm_transaction(draft.id).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidState("cannot confirm a cancelled document".to_string())
    );
    let err = engine.cancel_transaction(draft.id).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidState("document is already cancelled".to_string())
    );
}

#[tokio::test]
async fn sale_derives_counterparty_entry_from_unpaid_amount() {
    let (engine, _db) = engine_with_db().await;

    let sale = engine
        .create_transaction(
            TransactionCmd::new(TransactionKind::Sale, day(2025, 5, 1), OPERATOR)
                .counterparty(7)
                .currency(EUR)
                .total_amount(Money::new(1_000))
                .paid_amount(Money::new(300)),
        )
        .await
        .unwrap();
    assert_eq!(sale.counterparty_entries.len(), 1);
    let entry = &sale.counterparty_entries[0];
    assert_eq!(entry.counterparty_id, 7);
    assert_eq!(entry.currency_id, EUR);
    assert_eq!(entry.amount, Money::new(700));

    engine.confirm_transaction(sale.id).await.unwrap();
    let balance = engine.counterparty_balance(7, EUR).await.unwrap();
    assert_eq!(balance.balance, Money::new(700));
}

#[tokio::test]
async fn payments_and_explicit_entries_drive_counterparty_balance() {
    let (engine, _db) = engine_with_db().await;

    // paying a supplier: cash leaves, we owe them less
    let payment = engine
        .create_transaction(
            TransactionCmd::new(TransactionKind::PurchasePayment, day(2025, 5, 2), OPERATOR)
                .counterparty(9)
                .cash(CashEntryInput::new(MAIN_REGISTER, EUR, Money::new(-400))),
        )
        .await
        .unwrap();
    assert_eq!(payment.counterparty_entries[0].amount, Money::new(400));
    engine.confirm_transaction(payment.id).await.unwrap();

    let explicit = engine
        .create_transaction(
            TransactionCmd::new(TransactionKind::Purchase, day(2025, 5, 3), OPERATOR)
                .counterparty(9)
                .currency(EUR)
                .total_amount(Money::new(5_000))
                .counterparty_entry(CounterpartyEntryInput::new(9, EUR, Money::new(-1_000))),
        )
        .await
        .unwrap();
    assert_eq!(explicit.counterparty_entries.len(), 1);
    engine.confirm_transaction(explicit.id).await.unwrap();

    let balance = engine.counterparty_balance(9, EUR).await.unwrap();
    assert_eq!(balance.balance, Money::new(-600));
    assert_eq!(cash(&engine).await, Money::new(-400));
}

#[tokio::test]
async fn derived_counterparty_entry_needs_a_currency() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .create_transaction(
            TransactionCmd::new(TransactionKind::Sale, day(2025, 5, 1), OPERATOR)
                .counterparty(7)
                .total_amount(Money::new(1_000)),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("a sale with a counterparty requires a currency".to_string())
    );
}

#[tokio::test]
async fn cash_entries_follow_register_currency() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .create_transaction(
            TransactionCmd::new(TransactionKind::CashIn, day(2025, 6, 1), OPERATOR)
                .cash(CashEntryInput::new(MAIN_REGISTER, USD, Money::new(100))),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CurrencyMismatch(_)), "{err:?}");

    let err = engine
        .create_transaction(
            TransactionCmd::new(TransactionKind::CashIn, day(2025, 6, 1), OPERATOR)
                .currency(EUR)
                .cash(CashEntryInput::new(USD_REGISTER, USD, Money::new(100))),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CurrencyMismatch(_)), "{err:?}");

    let err = engine
        .create_transaction(
            TransactionCmd::new(TransactionKind::CashIn, day(2025, 6, 1), OPERATOR)
                .cash(CashEntryInput::new(42, EUR, Money::new(100))),
        )
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("cash register 42".to_string()));

    let filter = TransactionListFilter::default();
    assert!(engine.list_transactions(&filter, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn entries_are_validated() {
    let (engine, _db) = engine_with_db().await;

    let err = engine.create_transaction(cash_in(0)).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("cash entry amount must not be 0".to_string())
    );

    let err = engine
        .create_transaction(
            TransactionCmd::new(TransactionKind::Transfer, day(2025, 6, 1), OPERATOR)
                .item(ItemInput::new(FLOUR, 1, Quantity::units(1))),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("transfer item requires a destination warehouse".to_string())
    );

    let err = engine
        .create_transaction(
            TransactionCmd::new(TransactionKind::Transfer, day(2025, 6, 1), OPERATOR)
                .item(ItemInput::new(FLOUR, 1, Quantity::units(1)).to_warehouse(1)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)), "{err:?}");

    let err = engine
        .create_transaction(
            TransactionCmd::new(TransactionKind::DividendAccrual, day(2025, 6, 1), OPERATOR)
                .dividend(DividendEntryInput::accrual(3, EUR, Money::new(-10))),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("dividend entry amount must be > 0".to_string())
    );
}

#[tokio::test]
async fn confirmed_documents_cannot_be_edited_or_deleted() {
    let (engine, _db) = engine_with_db().await;

    let tx = engine.create_transaction(cash_in(1_000)).await.unwrap();
    engine.confirm_transaction(tx.id).await.unwrap();

    let err = engine
        .update_transaction(tx.id, cash_in(2_000))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidState("cannot edit a confirmed document".to_string())
    );

    let err = engine.delete_transaction(tx.id).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidState("delete the confirmed document by cancelling it first".to_string())
    );

    engine.cancel_transaction(tx.id).await.unwrap();
    engine.delete_transaction(tx.id).await.unwrap();
    let err = engine.transaction(tx.id).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("transaction not exists".to_string()));
}

#[tokio::test]
async fn draft_update_replaces_entries_and_keeps_number() {
    let (engine, _db) = engine_with_db().await;

    let draft = engine.create_transaction(cash_in(1_000)).await.unwrap();
    let updated = engine
        .update_transaction(
            draft.id,
            cash_in(1_500)
                .description("  corrected  ")
                .cash(CashEntryInput::new(MAIN_REGISTER, EUR, Money::new(250))),
        )
        .await
        .unwrap();
    assert_eq!(updated.number, draft.number);
    assert_eq!(updated.description.as_deref(), Some("corrected"));

    let stored = engine.transaction(draft.id).await.unwrap();
    let amounts: Vec<Money> = stored.cash_entries.iter().map(|e| e.amount).collect();
    assert_eq!(amounts, vec![Money::new(1_500), Money::new(250)]);

    let err = engine
        .update_transaction(
            draft.id,
            TransactionCmd::new(TransactionKind::CashOut, day(2025, 3, 1), OPERATOR),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidState("cannot change a cash_in into a cash_out".to_string())
    );

    engine.confirm_transaction(draft.id).await.unwrap();
    assert_eq!(cash(&engine).await, Money::new(1_750));
}

#[tokio::test]
async fn numbers_restart_per_kind_and_year() {
    let (engine, _db) = engine_with_db().await;

    let a = engine.create_transaction(cash_in(100)).await.unwrap();
    let b = engine.create_transaction(cash_in(100)).await.unwrap();
    let next_year = engine
        .create_transaction(
            TransactionCmd::new(TransactionKind::CashIn, day(2026, 1, 2), OPERATOR)
                .cash(CashEntryInput::new(MAIN_REGISTER, EUR, Money::new(100))),
        )
        .await
        .unwrap();
    let other_kind = engine.create_transaction(purchase(1, 1, 100)).await.unwrap();

    assert_eq!(a.number, "CI-2025-00001");
    assert_eq!(b.number, "CI-2025-00002");
    assert_eq!(next_year.number, "CI-2026-00001");
    assert_eq!(other_kind.number, "PU-2025-00001");
}

#[tokio::test]
async fn numbers_keep_increasing_past_five_digits() {
    let (engine, db) = engine_with_db().await;

    let last = engine.create_transaction(cash_in(100)).await.unwrap();
    exec(
        &db,
        "UPDATE transactions SET number = ? WHERE id = ?",
        vec!["CI-2025-99999".into(), last.id.to_string().into()],
    )
    .await;

    let a = engine.create_transaction(cash_in(100)).await.unwrap();
    let b = engine.create_transaction(cash_in(100)).await.unwrap();
    assert_eq!(a.number, "CI-2025-100000");
    assert_eq!(b.number, "CI-2025-100001");
}

#[tokio::test]
async fn concurrent_confirms_apply_each_delta_once() {
    let (engine, db, path) = engine_with_file_db().await;

    let first = engine.create_transaction(cash_in(5_000)).await.unwrap();
    let second = engine.create_transaction(cash_in(2_500)).await.unwrap();
    let (a, b) = tokio::join!(
        engine.confirm_transaction(first.id),
        engine.confirm_transaction(second.id)
    );
    a.unwrap();
    b.unwrap();
    assert_eq!(cash(&engine).await, Money::new(7_500));

    let third = engine.create_transaction(cash_in(1_000)).await.unwrap();
    let (a, b) = tokio::join!(
        engine.confirm_transaction(third.id),
        engine.confirm_transaction(third.id)
    );
    let (confirmed, rejected): (Vec<_>, Vec<_>) = [a, b].into_iter().partition(Result::is_ok);
    assert_eq!(confirmed.len(), 1);
    assert_eq!(
        rejected.into_iter().map(Result::unwrap_err).collect::<Vec<_>>(),
        vec![EngineError::AlreadyConfirmed(format!("transaction {}", third.number))]
    );
    assert_eq!(cash(&engine).await, Money::new(8_500));
    assert!(engine.reconcile().await.unwrap().is_empty());

    drop(engine);
    drop(db);
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn dividend_and_salary_balances_track_accrued_and_paid() {
    let (engine, _db) = engine_with_db().await;

    let accrual = engine
        .create_transaction(
            TransactionCmd::new(TransactionKind::DividendAccrual, day(2025, 7, 1), OPERATOR)
                .partner(3)
                .dividend(DividendEntryInput::accrual(3, EUR, Money::new(50_000))),
        )
        .await
        .unwrap();
    engine.confirm_transaction(accrual.id).await.unwrap();

    let payment = engine
        .create_transaction(
            TransactionCmd::new(TransactionKind::DividendPayment, day(2025, 7, 2), OPERATOR)
                .partner(3)
                .cash(CashEntryInput::new(MAIN_REGISTER, EUR, Money::new(-20_000)))
                .dividend(DividendEntryInput::payment(3, EUR, Money::new(20_000))),
        )
        .await
        .unwrap();
    engine.confirm_transaction(payment.id).await.unwrap();

    let dividend = engine.dividend_balance(3, EUR).await.unwrap();
    assert_eq!(dividend.total_accrued, Money::new(50_000));
    assert_eq!(dividend.total_paid, Money::new(20_000));
    assert_eq!(dividend.balance(), Money::new(30_000));

    let salary = engine
        .create_transaction(
            TransactionCmd::new(TransactionKind::SalaryAccrual, day(2025, 7, 31), OPERATOR)
                .salary(SalaryEntryInput::accrual(5, EUR, Money::new(150_000)))
                .salary(SalaryEntryInput::payment(5, EUR, Money::new(40_000))),
        )
        .await
        .unwrap();
    engine.confirm_transaction(salary.id).await.unwrap();

    let balance = engine.salary_balance(5, EUR).await.unwrap();
    assert_eq!(balance.accrued, Money::new(150_000));
    assert_eq!(balance.paid, Money::new(40_000));
    assert_eq!(balance.balance(), Money::new(110_000));

    engine.cancel_transaction(payment.id).await.unwrap();
    let dividend = engine.dividend_balance(3, EUR).await.unwrap();
    assert_eq!(dividend.total_paid, Money::ZERO);
    assert_eq!(dividend.balance(), Money::new(50_000));
    assert!(engine.reconcile().await.unwrap().is_empty());
}

#[tokio::test]
async fn service_entries_are_stored_without_ledger_effect() {
    let (engine, _db) = engine_with_db().await;

    let sale = engine
        .create_transaction(
            TransactionCmd::new(TransactionKind::Sale, day(2025, 8, 1), OPERATOR)
                .service(
                    ServiceEntryInput::new(4, Quantity::new(1_500), Money::new(2_000))
                        .description("delivery"),
                ),
        )
        .await
        .unwrap();
    assert_eq!(sale.service_entries[0].amount, Money::new(3_000));

    engine.confirm_transaction(sale.id).await.unwrap();
    let stored = engine.transaction(sale.id).await.unwrap();
    assert_eq!(stored.service_entries.len(), 1);
    assert_eq!(stored.service_entries[0].description.as_deref(), Some("delivery"));
    assert!(engine.cash_balances().await.unwrap().is_empty());
}

#[tokio::test]
async fn list_filters_by_kind_status_and_date() {
    let (engine, _db) = engine_with_db().await;

    let confirmed = engine.create_transaction(cash_in(100)).await.unwrap();
    engine.confirm_transaction(confirmed.id).await.unwrap();
    engine.create_transaction(cash_in(200)).await.unwrap();
    engine.create_transaction(purchase(1, 1, 100)).await.unwrap();

    let all = engine
        .list_transactions(&TransactionListFilter::default(), 10)
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.iter().all(|tx| tx.cash_entries.is_empty()));

    let filter = TransactionListFilter {
        kinds: Some(vec![TransactionKind::CashIn]),
        status: Some(DocumentStatus::Confirmed),
        ..Default::default()
    };
    let listed = engine.list_transactions(&filter, 10).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, confirmed.id);

    let filter = TransactionListFilter {
        from: Some(day(2025, 3, 2)),
        to: Some(day(2025, 4, 1)),
        ..Default::default()
    };
    assert!(engine.list_transactions(&filter, 10).await.unwrap().is_empty());

    let filter = TransactionListFilter {
        from: Some(day(2025, 4, 1)),
        to: Some(day(2025, 3, 1)),
        ..Default::default()
    };
    let err = engine.list_transactions(&filter, 10).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("invalid range: from must be < to".to_string())
    );
}

#[tokio::test]
async fn reconcile_reports_tampering_and_recompute_repairs_it() {
    let (engine, db) = engine_with_db().await;

    assert!(engine.reconcile().await.unwrap().is_empty());

    let tx = engine.create_transaction(cash_in(4_200)).await.unwrap();
    engine.confirm_transaction(tx.id).await.unwrap();

    exec(
        &db,
        "UPDATE cash_balances SET balance = balance + ? WHERE cash_register_id = ?",
        vec![1i64.into(), MAIN_REGISTER.into()],
    )
    .await;

    let discrepancies = engine.reconcile().await.unwrap();
    assert_eq!(discrepancies.len(), 1);
    assert_eq!(
        discrepancies[0].key,
        LedgerKey::Cash {
            cash_register_id: MAIN_REGISTER,
            currency_id: EUR,
        }
    );
    assert_eq!(discrepancies[0].field, "balance");
    assert_eq!(discrepancies[0].expected, 4_200);
    assert_eq!(discrepancies[0].actual, 4_201);

    engine.recompute_balances().await.unwrap();
    assert!(engine.reconcile().await.unwrap().is_empty());
    assert_eq!(cash(&engine).await, Money::new(4_200));
}

#[tokio::test]
async fn missing_documents_are_reported() {
    let (engine, _db) = engine_with_db().await;

    let err = engine.confirm_transaction(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("transaction not exists".to_string()));
}
