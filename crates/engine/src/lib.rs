pub use cash_balances::CashBalance;
pub use cash_entries::CashEntry;
pub use commands::{
    CashEntryInput, CounterpartyEntryInput, DividendEntryInput, IngredientInput, ItemInput,
    OutputInput, ProductionCmd, SalaryEntryInput, ServiceEntryInput, TransactionCmd,
};
pub use counterparty_balances::CounterpartyBalance;
pub use counterparty_entries::CounterpartyEntry;
pub use dividend_balances::DividendBalance;
pub use dividend_entries::{AccrualKind, DividendEntry};
pub use error::EngineError;
pub use money::{Money, Quantity};
pub use ops::{Discrepancy, Engine, EngineBuilder, LedgerKey, TransactionListFilter};
pub use production_ingredients::ProductionIngredient;
pub use production_outputs::ProductionOutput;
pub use productions::Production;
pub use recipes::{Recipe, RecipeLine};
pub use salary_balances::SalaryBalance;
pub use salary_entries::SalaryEntry;
pub use service_entries::ServiceEntry;
pub use status::DocumentStatus;
pub use stock_balances::StockBalance;
pub use transaction_items::TransactionItem;
pub use transactions::{Transaction, TransactionKind};

mod cash_balances;
mod cash_entries;
mod cash_registers;
mod commands;
mod counterparty_balances;
mod counterparty_entries;
mod dividend_balances;
mod dividend_entries;
mod error;
mod ledger;
mod money;
mod ops;
mod production_ingredients;
mod production_outputs;
mod productions;
mod products;
mod recipe_ingredients;
mod recipe_outputs;
mod recipes;
mod salary_balances;
mod salary_entries;
mod service_entries;
mod status;
mod stock_balances;
mod transaction_items;
mod transactions;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
