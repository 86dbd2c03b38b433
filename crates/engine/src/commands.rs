//! Command structs for engine operations.
//!
//! These types group the payload of document writes (create/update of
//! transactions and productions), keeping call sites readable and avoiding
//! long argument lists.

use chrono::NaiveDate;

use crate::{AccrualKind, Money, Quantity, TransactionKind};

/// Cash moved in (`amount > 0`) or out (`amount < 0`) of a register.
#[derive(Clone, Debug)]
pub struct CashEntryInput {
    pub cash_register_id: i64,
    pub currency_id: i64,
    pub amount: Money,
    pub description: Option<String>,
}

impl CashEntryInput {
    #[must_use]
    pub fn new(cash_register_id: i64, currency_id: i64, amount: Money) -> Self {
        Self {
            cash_register_id,
            currency_id,
            amount,
            description: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Stock moved in or out of a warehouse, or between two warehouses.
#[derive(Clone, Debug)]
pub struct ItemInput {
    pub product_id: i64,
    pub warehouse_id: i64,
    pub warehouse_to_id: Option<i64>,
    /// Sign may be normalized by the transaction kind.
    pub quantity: Quantity,
    pub price: Money,
}

impl ItemInput {
    #[must_use]
    pub fn new(product_id: i64, warehouse_id: i64, quantity: Quantity) -> Self {
        Self {
            product_id,
            warehouse_id,
            warehouse_to_id: None,
            quantity,
            price: Money::ZERO,
        }
    }

    #[must_use]
    pub fn price(mut self, price: Money) -> Self {
        self.price = price;
        self
    }

    /// Also credit `warehouse_to_id` with the moved quantity.
    #[must_use]
    pub fn to_warehouse(mut self, warehouse_to_id: i64) -> Self {
        self.warehouse_to_id = Some(warehouse_to_id);
        self
    }
}

/// Positive: the counterparty owes us more. Negative: we owe them more.
#[derive(Clone, Debug)]
pub struct CounterpartyEntryInput {
    pub counterparty_id: i64,
    pub currency_id: i64,
    pub amount: Money,
    pub description: Option<String>,
}

impl CounterpartyEntryInput {
    #[must_use]
    pub fn new(counterparty_id: i64, currency_id: i64, amount: Money) -> Self {
        Self {
            counterparty_id,
            currency_id,
            amount,
            description: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Clone, Debug)]
pub struct DividendEntryInput {
    pub partner_id: i64,
    pub currency_id: i64,
    pub kind: AccrualKind,
    pub amount: Money,
    pub description: Option<String>,
}

impl DividendEntryInput {
    #[must_use]
    pub fn accrual(partner_id: i64, currency_id: i64, amount: Money) -> Self {
        Self {
            partner_id,
            currency_id,
            kind: AccrualKind::Accrual,
            amount,
            description: None,
        }
    }

    #[must_use]
    pub fn payment(partner_id: i64, currency_id: i64, amount: Money) -> Self {
        Self {
            kind: AccrualKind::Payment,
            ..Self::accrual(partner_id, currency_id, amount)
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Clone, Debug)]
pub struct SalaryEntryInput {
    pub user_id: i64,
    pub currency_id: i64,
    pub kind: AccrualKind,
    pub amount: Money,
    pub description: Option<String>,
}

impl SalaryEntryInput {
    #[must_use]
    pub fn accrual(user_id: i64, currency_id: i64, amount: Money) -> Self {
        Self {
            user_id,
            currency_id,
            kind: AccrualKind::Accrual,
            amount,
            description: None,
        }
    }

    #[must_use]
    pub fn payment(user_id: i64, currency_id: i64, amount: Money) -> Self {
        Self {
            kind: AccrualKind::Payment,
            ..Self::accrual(user_id, currency_id, amount)
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A billed service line. Informational: it touches no ledger.
#[derive(Clone, Debug)]
pub struct ServiceEntryInput {
    pub service_id: i64,
    pub quantity: Quantity,
    pub price: Money,
    pub description: Option<String>,
}

impl ServiceEntryInput {
    #[must_use]
    pub fn new(service_id: i64, quantity: Quantity, price: Money) -> Self {
        Self {
            service_id,
            quantity,
            price,
            description: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Create or replace a transaction.
///
/// Every entry group is optional and independent.
#[derive(Clone, Debug)]
pub struct TransactionCmd {
    pub kind: TransactionKind,
    pub date: NaiveDate,
    pub counterparty_id: Option<i64>,
    pub partner_id: Option<i64>,
    pub currency_id: Option<i64>,
    pub description: Option<String>,
    pub total_amount: Money,
    pub paid_amount: Money,
    pub created_by: i64,
    pub cash_entries: Vec<CashEntryInput>,
    pub items: Vec<ItemInput>,
    pub counterparty_entries: Vec<CounterpartyEntryInput>,
    pub dividend_entries: Vec<DividendEntryInput>,
    pub salary_entries: Vec<SalaryEntryInput>,
    pub service_entries: Vec<ServiceEntryInput>,
}

impl TransactionCmd {
    #[must_use]
    pub fn new(kind: TransactionKind, date: NaiveDate, created_by: i64) -> Self {
        Self {
            kind,
            date,
            counterparty_id: None,
            partner_id: None,
            currency_id: None,
            description: None,
            total_amount: Money::ZERO,
            paid_amount: Money::ZERO,
            created_by,
            cash_entries: Vec::new(),
            items: Vec::new(),
            counterparty_entries: Vec::new(),
            dividend_entries: Vec::new(),
            salary_entries: Vec::new(),
            service_entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn counterparty(mut self, counterparty_id: i64) -> Self {
        self.counterparty_id = Some(counterparty_id);
        self
    }

    #[must_use]
    pub fn partner(mut self, partner_id: i64) -> Self {
        self.partner_id = Some(partner_id);
        self
    }

    #[must_use]
    pub fn currency(mut self, currency_id: i64) -> Self {
        self.currency_id = Some(currency_id);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn total_amount(mut self, total_amount: Money) -> Self {
        self.total_amount = total_amount;
        self
    }

    #[must_use]
    pub fn paid_amount(mut self, paid_amount: Money) -> Self {
        self.paid_amount = paid_amount;
        self
    }

    #[must_use]
    pub fn cash(mut self, entry: CashEntryInput) -> Self {
        self.cash_entries.push(entry);
        self
    }

    #[must_use]
    pub fn item(mut self, item: ItemInput) -> Self {
        self.items.push(item);
        self
    }

    #[must_use]
    pub fn counterparty_entry(mut self, entry: CounterpartyEntryInput) -> Self {
        self.counterparty_entries.push(entry);
        self
    }

    #[must_use]
    pub fn dividend(mut self, entry: DividendEntryInput) -> Self {
        self.dividend_entries.push(entry);
        self
    }

    #[must_use]
    pub fn salary(mut self, entry: SalaryEntryInput) -> Self {
        self.salary_entries.push(entry);
        self
    }

    #[must_use]
    pub fn service(mut self, entry: ServiceEntryInput) -> Self {
        self.service_entries.push(entry);
        self
    }
}

#[derive(Clone, Debug)]
pub struct IngredientInput {
    pub product_id: i64,
    /// Defaults to the command's ingredient warehouse.
    pub warehouse_id: Option<i64>,
    pub planned_quantity: Quantity,
    /// Defaults to `planned_quantity`.
    pub actual_quantity: Option<Quantity>,
}

impl IngredientInput {
    #[must_use]
    pub fn new(product_id: i64, planned_quantity: Quantity) -> Self {
        Self {
            product_id,
            warehouse_id: None,
            planned_quantity,
            actual_quantity: None,
        }
    }

    #[must_use]
    pub fn warehouse(mut self, warehouse_id: i64) -> Self {
        self.warehouse_id = Some(warehouse_id);
        self
    }

    #[must_use]
    pub fn actual(mut self, actual_quantity: Quantity) -> Self {
        self.actual_quantity = Some(actual_quantity);
        self
    }
}

#[derive(Clone, Debug)]
pub struct OutputInput {
    pub product_id: i64,
    pub planned_quantity: Quantity,
    /// Defaults to `planned_quantity`.
    pub actual_quantity: Option<Quantity>,
}

impl OutputInput {
    #[must_use]
    pub fn new(product_id: i64, planned_quantity: Quantity) -> Self {
        Self {
            product_id,
            planned_quantity,
            actual_quantity: None,
        }
    }

    #[must_use]
    pub fn actual(mut self, actual_quantity: Quantity) -> Self {
        self.actual_quantity = Some(actual_quantity);
        self
    }
}

/// Create or replace a production run.
///
/// Without explicit ingredients (or outputs) the recipe lines are expanded by
/// `batch_count`.
#[derive(Clone, Debug)]
pub struct ProductionCmd {
    pub recipe_id: i64,
    pub date: NaiveDate,
    /// Where the outputs are stored.
    pub warehouse_id: i64,
    pub batch_count: i64,
    /// Where recipe ingredients are taken from, defaults to `warehouse_id`.
    pub ingredient_warehouse_id: Option<i64>,
    pub description: Option<String>,
    pub created_by: i64,
    pub ingredients: Option<Vec<IngredientInput>>,
    pub outputs: Option<Vec<OutputInput>>,
}

impl ProductionCmd {
    #[must_use]
    pub fn new(recipe_id: i64, date: NaiveDate, warehouse_id: i64, created_by: i64) -> Self {
        Self {
            recipe_id,
            date,
            warehouse_id,
            batch_count: 1,
            ingredient_warehouse_id: None,
            description: None,
            created_by,
            ingredients: None,
            outputs: None,
        }
    }

    #[must_use]
    pub fn batch_count(mut self, batch_count: i64) -> Self {
        self.batch_count = batch_count;
        self
    }

    #[must_use]
    pub fn ingredient_warehouse(mut self, warehouse_id: i64) -> Self {
        self.ingredient_warehouse_id = Some(warehouse_id);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn ingredients(mut self, ingredients: Vec<IngredientInput>) -> Self {
        self.ingredients = Some(ingredients);
        self
    }

    #[must_use]
    pub fn outputs(mut self, outputs: Vec<OutputInput>) -> Self {
        self.outputs = Some(outputs);
        self
    }
}
