//! Salary balances, one row per `(user, currency)`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::Money;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryBalance {
    pub user_id: i64,
    pub currency_id: i64,
    pub accrued: Money,
    pub paid: Money,
}

impl SalaryBalance {
    pub fn empty(user_id: i64, currency_id: i64) -> Self {
        Self {
            user_id,
            currency_id,
            accrued: Money::ZERO,
            paid: Money::ZERO,
        }
    }

    /// Salary still owed to the employee.
    pub fn balance(&self) -> Money {
        self.accrued - self.paid
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "salary_balances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub currency_id: i64,
    pub accrued: i64,
    pub paid: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for SalaryBalance {
    fn from(model: Model) -> Self {
        Self {
            user_id: model.user_id,
            currency_id: model.currency_id,
            accrued: Money::new(model.accrued),
            paid: Money::new(model.paid),
        }
    }
}
