use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    CashBalance, CounterpartyBalance, DividendBalance, ResultEngine, SalaryBalance, StockBalance,
    cash_balances, counterparty_balances, dividend_balances, ledger::apply_delta,
    salary_balances, stock_balances,
};

use super::{Engine, reconcile::confirmed_money_deltas, with_tx};

impl Engine {
    /// Balance of a cash register in a currency, zero if never touched.
    pub async fn cash_balance(
        &self,
        cash_register_id: i64,
        currency_id: i64,
    ) -> ResultEngine<CashBalance> {
        Ok(
            cash_balances::Entity::find_by_id((cash_register_id, currency_id))
                .one(&self.database)
                .await?
                .map(CashBalance::from)
                .unwrap_or_else(|| CashBalance::empty(cash_register_id, currency_id)),
        )
    }

    /// All cash register balances.
    pub async fn cash_balances(&self) -> ResultEngine<Vec<CashBalance>> {
        Ok(cash_balances::Entity::find()
            .order_by_asc(cash_balances::Column::CashRegisterId)
            .order_by_asc(cash_balances::Column::CurrencyId)
            .all(&self.database)
            .await?
            .into_iter()
            .map(CashBalance::from)
            .collect())
    }

    /// Positive when the counterparty owes us, negative when we owe them.
    pub async fn counterparty_balance(
        &self,
        counterparty_id: i64,
        currency_id: i64,
    ) -> ResultEngine<CounterpartyBalance> {
        Ok(
            counterparty_balances::Entity::find_by_id((counterparty_id, currency_id))
                .one(&self.database)
                .await?
                .map(CounterpartyBalance::from)
                .unwrap_or_else(|| CounterpartyBalance::empty(counterparty_id, currency_id)),
        )
    }

    pub async fn dividend_balance(
        &self,
        partner_id: i64,
        currency_id: i64,
    ) -> ResultEngine<DividendBalance> {
        Ok(
            dividend_balances::Entity::find_by_id((partner_id, currency_id))
                .one(&self.database)
                .await?
                .map(DividendBalance::from)
                .unwrap_or_else(|| DividendBalance::empty(partner_id, currency_id)),
        )
    }

    pub async fn salary_balance(
        &self,
        user_id: i64,
        currency_id: i64,
    ) -> ResultEngine<SalaryBalance> {
        Ok(
            salary_balances::Entity::find_by_id((user_id, currency_id))
                .one(&self.database)
                .await?
                .map(SalaryBalance::from)
                .unwrap_or_else(|| SalaryBalance::empty(user_id, currency_id)),
        )
    }

    /// Stock of a product in a warehouse, `None` when there is none.
    pub async fn stock_balance(
        &self,
        warehouse_id: i64,
        product_id: i64,
    ) -> ResultEngine<Option<StockBalance>> {
        Ok(
            stock_balances::Entity::find_by_id((warehouse_id, product_id))
                .one(&self.database)
                .await?
                .map(StockBalance::from),
        )
    }

    /// Every product held in a warehouse.
    pub async fn stock_balances(&self, warehouse_id: i64) -> ResultEngine<Vec<StockBalance>> {
        Ok(stock_balances::Entity::find()
            .filter(stock_balances::Column::WarehouseId.eq(warehouse_id))
            .order_by_asc(stock_balances::Column::ProductId)
            .all(&self.database)
            .await?
            .into_iter()
            .map(StockBalance::from)
            .collect())
    }

    /// Rebuilds the money ledgers (cash, counterparty, dividend, salary) from
    /// the entries of confirmed transactions.
    ///
    /// Stock is left alone: average costs cannot be replayed once rows were
    /// spent and recreated.
    pub async fn recompute_balances(&self) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            cash_balances::Entity::delete_many().exec(&db_tx).await?;
            counterparty_balances::Entity::delete_many()
                .exec(&db_tx)
                .await?;
            dividend_balances::Entity::delete_many().exec(&db_tx).await?;
            salary_balances::Entity::delete_many().exec(&db_tx).await?;

            let deltas = confirmed_money_deltas(&db_tx).await?;
            let replayed = deltas.len();
            for delta in deltas {
                apply_delta(&db_tx, delta).await?;
            }

            tracing::info!(entries = replayed, "money ledgers recomputed");
            Ok(())
        })
    }
}
