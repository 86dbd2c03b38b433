//! Running balances maintained by confirm and cancel.
//!
//! Each ledger is keyed by a composite primary key, which the engine relies on
//! for its additive upserts.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum CashBalances {
    Table,
    CashRegisterId,
    CurrencyId,
    Balance,
}

#[derive(Iden)]
enum CounterpartyBalances {
    Table,
    CounterpartyId,
    CurrencyId,
    Balance,
}

#[derive(Iden)]
enum PartnerDividendBalances {
    Table,
    PartnerId,
    CurrencyId,
    TotalAccrued,
    TotalPaid,
}

#[derive(Iden)]
enum SalaryBalances {
    Table,
    UserId,
    CurrencyId,
    Accrued,
    Paid,
}

#[derive(Iden)]
enum StockBalances {
    Table,
    WarehouseId,
    ProductId,
    Quantity,
    AvgCost,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CashBalances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CashBalances::CashRegisterId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CashBalances::CurrencyId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CashBalances::Balance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .col(CashBalances::CashRegisterId)
                            .col(CashBalances::CurrencyId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CounterpartyBalances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CounterpartyBalances::CounterpartyId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CounterpartyBalances::CurrencyId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CounterpartyBalances::Balance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .col(CounterpartyBalances::CounterpartyId)
                            .col(CounterpartyBalances::CurrencyId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PartnerDividendBalances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PartnerDividendBalances::PartnerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PartnerDividendBalances::CurrencyId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PartnerDividendBalances::TotalAccrued)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PartnerDividendBalances::TotalPaid)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .col(PartnerDividendBalances::PartnerId)
                            .col(PartnerDividendBalances::CurrencyId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SalaryBalances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SalaryBalances::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SalaryBalances::CurrencyId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SalaryBalances::Accrued)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SalaryBalances::Paid)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .col(SalaryBalances::UserId)
                            .col(SalaryBalances::CurrencyId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StockBalances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StockBalances::WarehouseId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockBalances::ProductId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockBalances::Quantity)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StockBalances::AvgCost)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .col(StockBalances::WarehouseId)
                            .col(StockBalances::ProductId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-stock_balances-product_id")
                    .table(StockBalances::Table)
                    .col(StockBalances::ProductId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StockBalances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SalaryBalances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PartnerDividendBalances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CounterpartyBalances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CashBalances::Table).to_owned())
            .await?;
        Ok(())
    }
}
