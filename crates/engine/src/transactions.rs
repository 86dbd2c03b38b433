//! Transaction primitives.
//!
//! A `Transaction` is a financial/operational document that changes ledger
//! balances through its typed entries once it is confirmed.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    CashEntry, CounterpartyEntry, DividendEntry, DocumentStatus, EngineError, Money,
    SalaryEntry, ServiceEntry, TransactionItem, util::parse_uuid,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    CashIn,
    CashOut,
    Sale,
    SalePayment,
    Purchase,
    PurchasePayment,
    Transfer,
    DividendAccrual,
    DividendPayment,
    SalaryAccrual,
    SalaryPayment,
    Writeoff,
    LoanIn,
    LoanOut,
}

/// How the sign of an item quantity is normalized for a kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ItemSign {
    /// Always leaves `warehouse_id`.
    Outflow,
    /// Always enters `warehouse_id`.
    Inflow,
    AsGiven,
}

impl ItemSign {
    pub(crate) fn normalize(self, quantity: crate::Quantity) -> crate::Quantity {
        match self {
            Self::Outflow => -quantity.abs(),
            Self::Inflow => quantity.abs(),
            Self::AsGiven => quantity,
        }
    }
}

/// How the counterparty entry is derived when the caller supplies none.
///
/// Amounts are from the counterparty's perspective: positive means they owe
/// us more.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CounterpartyRule {
    /// `total - paid`
    Unpaid,
    /// `-(total - paid)`
    UnpaidOwed,
    /// `+|cash total|`
    CashOwedToUs,
    /// `-|cash total|`
    CashOwedByUs,
}

impl CounterpartyRule {
    pub(crate) fn amount(self, total: Money, paid: Money, cash_total: Money) -> Money {
        match self {
            Self::Unpaid => total - paid,
            Self::UnpaidOwed => -(total - paid),
            Self::CashOwedToUs => cash_total.abs(),
            Self::CashOwedByUs => -cash_total.abs(),
        }
    }
}

/// Per-kind behavior, looked up once per document.
#[derive(Clone, Copy, Debug)]
pub(crate) struct KindRules {
    pub prefix: &'static str,
    pub item_sign: ItemSign,
    pub counterparty: Option<CounterpartyRule>,
}

const fn rules(
    prefix: &'static str,
    item_sign: ItemSign,
    counterparty: Option<CounterpartyRule>,
) -> KindRules {
    KindRules {
        prefix,
        item_sign,
        counterparty,
    }
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 14] = [
        Self::CashIn,
        Self::CashOut,
        Self::Sale,
        Self::SalePayment,
        Self::Purchase,
        Self::PurchasePayment,
        Self::Transfer,
        Self::DividendAccrual,
        Self::DividendPayment,
        Self::SalaryAccrual,
        Self::SalaryPayment,
        Self::Writeoff,
        Self::LoanIn,
        Self::LoanOut,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CashIn => "cash_in",
            Self::CashOut => "cash_out",
            Self::Sale => "sale",
            Self::SalePayment => "sale_payment",
            Self::Purchase => "purchase",
            Self::PurchasePayment => "purchase_payment",
            Self::Transfer => "transfer",
            Self::DividendAccrual => "dividend_accrual",
            Self::DividendPayment => "dividend_payment",
            Self::SalaryAccrual => "salary_accrual",
            Self::SalaryPayment => "salary_payment",
            Self::Writeoff => "writeoff",
            Self::LoanIn => "loan_in",
            Self::LoanOut => "loan_out",
        }
    }

    pub(crate) fn rules(self) -> KindRules {
        use CounterpartyRule::*;
        use ItemSign::*;

        match self {
            Self::CashIn => rules("CI", AsGiven, None),
            Self::CashOut => rules("CO", AsGiven, None),
            Self::Sale => rules("SL", Outflow, Some(Unpaid)),
            Self::SalePayment => rules("SP", AsGiven, Some(CashOwedByUs)),
            Self::Purchase => rules("PU", Inflow, Some(UnpaidOwed)),
            Self::PurchasePayment => rules("PP", AsGiven, Some(CashOwedToUs)),
            Self::Transfer => rules("TR", Outflow, None),
            Self::DividendAccrual => rules("DA", AsGiven, None),
            Self::DividendPayment => rules("DP", AsGiven, None),
            Self::SalaryAccrual => rules("SA", AsGiven, None),
            Self::SalaryPayment => rules("SY", AsGiven, None),
            Self::Writeoff => rules("WO", Outflow, None),
            Self::LoanIn => rules("LI", AsGiven, Some(CashOwedByUs)),
            Self::LoanOut => rules("LO", AsGiven, Some(CashOwedToUs)),
        }
    }
}

impl core::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| EngineError::InvalidAmount(format!("invalid transaction kind: {value}")))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub kind: TransactionKind,
    /// Human readable number, `{prefix}-{year}-{sequence}`.
    pub number: String,
    pub date: NaiveDate,
    pub counterparty_id: Option<i64>,
    pub partner_id: Option<i64>,
    pub description: Option<String>,
    pub total_amount: Money,
    pub paid_amount: Money,
    pub currency_id: Option<i64>,
    pub status: DocumentStatus,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cash_entries: Vec<CashEntry>,
    pub items: Vec<TransactionItem>,
    pub counterparty_entries: Vec<CounterpartyEntry>,
    pub dividend_entries: Vec<DividendEntry>,
    pub salary_entries: Vec<SalaryEntry>,
    pub service_entries: Vec<ServiceEntry>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub kind: String,
    #[sea_orm(unique)]
    pub number: String,
    pub date: Date,
    pub counterparty_id: Option<i64>,
    pub partner_id: Option<i64>,
    pub description: Option<String>,
    pub total_amount: i64,
    pub paid_amount: i64,
    pub currency_id: Option<i64>,
    pub status: String,
    pub created_by: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cash_entries::Entity")]
    CashEntries,
    #[sea_orm(has_many = "super::transaction_items::Entity")]
    Items,
    #[sea_orm(has_many = "super::counterparty_entries::Entity")]
    CounterpartyEntries,
    #[sea_orm(has_many = "super::dividend_entries::Entity")]
    DividendEntries,
    #[sea_orm(has_many = "super::salary_entries::Entity")]
    SalaryEntries,
    #[sea_orm(has_many = "super::service_entries::Entity")]
    ServiceEntries,
}

impl Related<super::cash_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CashEntries.def()
    }
}

impl Related<super::transaction_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::counterparty_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CounterpartyEntries.def()
    }
}

impl Related<super::dividend_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DividendEntries.def()
    }
}

impl Related<super::salary_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalaryEntries.def()
    }
}

impl Related<super::service_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            number: ActiveValue::Set(tx.number.clone()),
            date: ActiveValue::Set(tx.date),
            counterparty_id: ActiveValue::Set(tx.counterparty_id),
            partner_id: ActiveValue::Set(tx.partner_id),
            description: ActiveValue::Set(tx.description.clone()),
            total_amount: ActiveValue::Set(tx.total_amount.cents()),
            paid_amount: ActiveValue::Set(tx.paid_amount.cents()),
            currency_id: ActiveValue::Set(tx.currency_id),
            status: ActiveValue::Set(tx.status.as_str().to_string()),
            created_by: ActiveValue::Set(tx.created_by),
            created_at: ActiveValue::Set(tx.created_at),
            updated_at: ActiveValue::Set(tx.updated_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            number: model.number,
            date: model.date,
            counterparty_id: model.counterparty_id,
            partner_id: model.partner_id,
            description: model.description,
            total_amount: Money::new(model.total_amount),
            paid_amount: Money::new(model.paid_amount),
            currency_id: model.currency_id,
            status: DocumentStatus::try_from(model.status.as_str())?,
            created_by: model.created_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
            cash_entries: Vec::new(),
            items: Vec::new(),
            counterparty_entries: Vec::new(),
            dividend_entries: Vec::new(),
            salary_entries: Vec::new(),
            service_entries: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Quantity;

    #[test]
    fn item_sign_follows_kind() {
        let ten = Quantity::units(10);
        assert_eq!(TransactionKind::Sale.rules().item_sign.normalize(ten), -ten);
        assert_eq!(TransactionKind::Transfer.rules().item_sign.normalize(ten), -ten);
        assert_eq!(TransactionKind::Purchase.rules().item_sign.normalize(-ten), ten);
        assert_eq!(TransactionKind::CashIn.rules().item_sign.normalize(-ten), -ten);
    }

    #[test]
    fn counterparty_rule_signs() {
        let total = Money::new(100_000);
        let paid = Money::new(30_000);
        let cash = Money::new(-5_000);

        let derive = |kind: TransactionKind| {
            kind.rules()
                .counterparty
                .map(|rule| rule.amount(total, paid, cash))
        };

        assert_eq!(derive(TransactionKind::Sale), Some(Money::new(70_000)));
        assert_eq!(derive(TransactionKind::Purchase), Some(Money::new(-70_000)));
        assert_eq!(derive(TransactionKind::SalePayment), Some(Money::new(-5_000)));
        assert_eq!(derive(TransactionKind::PurchasePayment), Some(Money::new(5_000)));
        assert_eq!(derive(TransactionKind::LoanIn), Some(Money::new(-5_000)));
        assert_eq!(derive(TransactionKind::LoanOut), Some(Money::new(5_000)));
        assert_eq!(derive(TransactionKind::CashIn), None);
    }

    #[test]
    fn prefixes_are_unique() {
        let mut prefixes: Vec<&str> = TransactionKind::ALL
            .iter()
            .map(|kind| kind.rules().prefix)
            .collect();
        prefixes.sort_unstable();
        prefixes.dedup();
        assert_eq!(prefixes.len(), TransactionKind::ALL.len());
    }
}
