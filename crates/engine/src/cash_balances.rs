//! Cash register balances, one row per `(cash_register, currency)`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::Money;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashBalance {
    pub cash_register_id: i64,
    pub currency_id: i64,
    pub balance: Money,
}

impl CashBalance {
    pub fn empty(cash_register_id: i64, currency_id: i64) -> Self {
        Self {
            cash_register_id,
            currency_id,
            balance: Money::ZERO,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cash_balances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub cash_register_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub currency_id: i64,
    pub balance: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for CashBalance {
    fn from(model: Model) -> Self {
        Self {
            cash_register_id: model.cash_register_id,
            currency_id: model.currency_id,
            balance: Money::new(model.balance),
        }
    }
}
