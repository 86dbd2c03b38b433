//! Partner dividend balances, one row per `(partner, currency)`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::Money;

/// Dividends accrued to and paid out to a partner.
///
/// Only the two running totals are stored; the outstanding balance is always
/// derived from them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendBalance {
    pub partner_id: i64,
    pub currency_id: i64,
    pub total_accrued: Money,
    pub total_paid: Money,
}

impl DividendBalance {
    pub fn empty(partner_id: i64, currency_id: i64) -> Self {
        Self {
            partner_id,
            currency_id,
            total_accrued: Money::ZERO,
            total_paid: Money::ZERO,
        }
    }

    /// Dividends still owed to the partner.
    pub fn balance(&self) -> Money {
        self.total_accrued - self.total_paid
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "partner_dividend_balances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub partner_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub currency_id: i64,
    pub total_accrued: i64,
    pub total_paid: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for DividendBalance {
    fn from(model: Model) -> Self {
        Self {
            partner_id: model.partner_id,
            currency_id: model.currency_id,
            total_accrued: Money::new(model.total_accrued),
            total_paid: Money::new(model.total_paid),
        }
    }
}
