//! Counterparty balances, one row per `(counterparty, currency)`.
//!
//! Positive: the counterparty owes us. Negative: we owe them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::Money;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterpartyBalance {
    pub counterparty_id: i64,
    pub currency_id: i64,
    pub balance: Money,
}

impl CounterpartyBalance {
    pub fn empty(counterparty_id: i64, currency_id: i64) -> Self {
        Self {
            counterparty_id,
            currency_id,
            balance: Money::ZERO,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "counterparty_balances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub counterparty_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub currency_id: i64,
    pub balance: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for CounterpartyBalance {
    fn from(model: Model) -> Self {
        Self {
            counterparty_id: model.counterparty_id,
            currency_id: model.currency_id,
            balance: Money::new(model.balance),
        }
    }
}
