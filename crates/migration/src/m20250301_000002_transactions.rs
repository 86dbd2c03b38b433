//! Transaction headers and their six entry tables.
//!
//! Every entry row belongs to exactly one transaction and is removed with it.
//! Amounts are stored as integer cents, quantities as integer thousandths.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    Kind,
    Number,
    Date,
    CounterpartyId,
    PartnerId,
    Description,
    TotalAmount,
    PaidAmount,
    CurrencyId,
    Status,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Clone, Copy, Iden)]
enum TransactionCashEntries {
    Table,
    Id,
    TransactionId,
    Position,
    CashRegisterId,
    CurrencyId,
    Amount,
    Description,
}

#[derive(Clone, Copy, Iden)]
enum TransactionItems {
    Table,
    Id,
    TransactionId,
    Position,
    ProductId,
    WarehouseId,
    WarehouseToId,
    Quantity,
    Price,
    Amount,
    UnitCost,
}

#[derive(Clone, Copy, Iden)]
enum TransactionCounterpartyEntries {
    Table,
    Id,
    TransactionId,
    Position,
    CounterpartyId,
    CurrencyId,
    Amount,
    Description,
}

#[derive(Clone, Copy, Iden)]
enum TransactionDividendEntries {
    Table,
    Id,
    TransactionId,
    Position,
    PartnerId,
    CurrencyId,
    Kind,
    Amount,
    Description,
}

#[derive(Clone, Copy, Iden)]
enum TransactionSalaryEntries {
    Table,
    Id,
    TransactionId,
    Position,
    UserId,
    CurrencyId,
    Kind,
    Amount,
    Description,
}

#[derive(Clone, Copy, Iden)]
enum TransactionServiceEntries {
    Table,
    Id,
    TransactionId,
    Position,
    ServiceId,
    Quantity,
    Price,
    Amount,
    Description,
}

/// `id`, `transaction_id` and `position`, shared by every entry table.
fn entry_table<T>(table: T, id: T, transaction_id: T, position: T) -> TableCreateStatement
where
    T: Iden + Copy + 'static,
{
    let fk_name = format!("fk-{}-transaction_id", table.to_string());
    Table::create()
        .table(table)
        .if_not_exists()
        .col(ColumnDef::new(id).string().not_null().primary_key())
        .col(ColumnDef::new(transaction_id).string().not_null())
        .col(ColumnDef::new(position).integer().not_null())
        .foreign_key(
            ForeignKey::create()
                .name(&fk_name)
                .from(table, transaction_id)
                .to(Transactions::Table, Transactions::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

async fn index_transaction_id<T>(
    manager: &SchemaManager<'_>,
    table: T,
    transaction_id: T,
) -> Result<(), DbErr>
where
    T: Iden + Copy + 'static,
{
    manager
        .create_index(
            Index::create()
                .name(format!("idx-{}-transaction_id", table.to_string()))
                .table(table)
                .col(transaction_id)
                .to_owned(),
        )
        .await
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Headers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(ColumnDef::new(Transactions::Number).string().not_null())
                    .col(ColumnDef::new(Transactions::Date).date().not_null())
                    .col(ColumnDef::new(Transactions::CounterpartyId).big_integer())
                    .col(ColumnDef::new(Transactions::PartnerId).big_integer())
                    .col(ColumnDef::new(Transactions::Description).string())
                    .col(
                        ColumnDef::new(Transactions::TotalAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Transactions::PaidAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Transactions::CurrencyId).big_integer())
                    .col(ColumnDef::new(Transactions::Status).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::CreatedBy)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-number-unique")
                    .table(Transactions::Table)
                    .col(Transactions::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-date")
                    .table(Transactions::Table)
                    .col(Transactions::Date)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Cash entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                entry_table(
                    TransactionCashEntries::Table,
                    TransactionCashEntries::Id,
                    TransactionCashEntries::TransactionId,
                    TransactionCashEntries::Position,
                )
                .col(
                    ColumnDef::new(TransactionCashEntries::CashRegisterId)
                        .big_integer()
                        .not_null(),
                )
                .col(
                    ColumnDef::new(TransactionCashEntries::CurrencyId)
                        .big_integer()
                        .not_null(),
                )
                .col(
                    ColumnDef::new(TransactionCashEntries::Amount)
                        .big_integer()
                        .not_null(),
                )
                .col(ColumnDef::new(TransactionCashEntries::Description).string())
                .to_owned(),
            )
            .await?;
        index_transaction_id(
            manager,
            TransactionCashEntries::Table,
            TransactionCashEntries::TransactionId,
        )
        .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Items
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                entry_table(
                    TransactionItems::Table,
                    TransactionItems::Id,
                    TransactionItems::TransactionId,
                    TransactionItems::Position,
                )
                .col(
                    ColumnDef::new(TransactionItems::ProductId)
                        .big_integer()
                        .not_null(),
                )
                .col(
                    ColumnDef::new(TransactionItems::WarehouseId)
                        .big_integer()
                        .not_null(),
                )
                .col(ColumnDef::new(TransactionItems::WarehouseToId).big_integer())
                .col(
                    ColumnDef::new(TransactionItems::Quantity)
                        .big_integer()
                        .not_null(),
                )
                .col(
                    ColumnDef::new(TransactionItems::Price)
                        .big_integer()
                        .not_null()
                        .default(0),
                )
                .col(
                    ColumnDef::new(TransactionItems::Amount)
                        .big_integer()
                        .not_null()
                        .default(0),
                )
                .col(ColumnDef::new(TransactionItems::UnitCost).big_integer())
                .to_owned(),
            )
            .await?;
        index_transaction_id(
            manager,
            TransactionItems::Table,
            TransactionItems::TransactionId,
        )
        .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Counterparty entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                entry_table(
                    TransactionCounterpartyEntries::Table,
                    TransactionCounterpartyEntries::Id,
                    TransactionCounterpartyEntries::TransactionId,
                    TransactionCounterpartyEntries::Position,
                )
                .col(
                    ColumnDef::new(TransactionCounterpartyEntries::CounterpartyId)
                        .big_integer()
                        .not_null(),
                )
                .col(
                    ColumnDef::new(TransactionCounterpartyEntries::CurrencyId)
                        .big_integer()
                        .not_null(),
                )
                .col(
                    ColumnDef::new(TransactionCounterpartyEntries::Amount)
                        .big_integer()
                        .not_null(),
                )
                .col(ColumnDef::new(TransactionCounterpartyEntries::Description).string())
                .to_owned(),
            )
            .await?;
        index_transaction_id(
            manager,
            TransactionCounterpartyEntries::Table,
            TransactionCounterpartyEntries::TransactionId,
        )
        .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Dividend entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                entry_table(
                    TransactionDividendEntries::Table,
                    TransactionDividendEntries::Id,
                    TransactionDividendEntries::TransactionId,
                    TransactionDividendEntries::Position,
                )
                .col(
                    ColumnDef::new(TransactionDividendEntries::PartnerId)
                        .big_integer()
                        .not_null(),
                )
                .col(
                    ColumnDef::new(TransactionDividendEntries::CurrencyId)
                        .big_integer()
                        .not_null(),
                )
                .col(
                    ColumnDef::new(TransactionDividendEntries::Kind)
                        .string()
                        .not_null(),
                )
                .col(
                    ColumnDef::new(TransactionDividendEntries::Amount)
                        .big_integer()
                        .not_null(),
                )
                .col(ColumnDef::new(TransactionDividendEntries::Description).string())
                .to_owned(),
            )
            .await?;
        index_transaction_id(
            manager,
            TransactionDividendEntries::Table,
            TransactionDividendEntries::TransactionId,
        )
        .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Salary entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                entry_table(
                    TransactionSalaryEntries::Table,
                    TransactionSalaryEntries::Id,
                    TransactionSalaryEntries::TransactionId,
                    TransactionSalaryEntries::Position,
                )
                .col(
                    ColumnDef::new(TransactionSalaryEntries::UserId)
                        .big_integer()
                        .not_null(),
                )
                .col(
                    ColumnDef::new(TransactionSalaryEntries::CurrencyId)
                        .big_integer()
                        .not_null(),
                )
                .col(
                    ColumnDef::new(TransactionSalaryEntries::Kind)
                        .string()
                        .not_null(),
                )
                .col(
                    ColumnDef::new(TransactionSalaryEntries::Amount)
                        .big_integer()
                        .not_null(),
                )
                .col(ColumnDef::new(TransactionSalaryEntries::Description).string())
                .to_owned(),
            )
            .await?;
        index_transaction_id(
            manager,
            TransactionSalaryEntries::Table,
            TransactionSalaryEntries::TransactionId,
        )
        .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Service entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                entry_table(
                    TransactionServiceEntries::Table,
                    TransactionServiceEntries::Id,
                    TransactionServiceEntries::TransactionId,
                    TransactionServiceEntries::Position,
                )
                .col(
                    ColumnDef::new(TransactionServiceEntries::ServiceId)
                        .big_integer()
                        .not_null(),
                )
                .col(
                    ColumnDef::new(TransactionServiceEntries::Quantity)
                        .big_integer()
                        .not_null(),
                )
                .col(
                    ColumnDef::new(TransactionServiceEntries::Price)
                        .big_integer()
                        .not_null(),
                )
                .col(
                    ColumnDef::new(TransactionServiceEntries::Amount)
                        .big_integer()
                        .not_null(),
                )
                .col(ColumnDef::new(TransactionServiceEntries::Description).string())
                .to_owned(),
            )
            .await?;
        index_transaction_id(
            manager,
            TransactionServiceEntries::Table,
            TransactionServiceEntries::TransactionId,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TransactionServiceEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TransactionSalaryEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TransactionDividendEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(TransactionCounterpartyEntries::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(TransactionItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TransactionCashEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        Ok(())
    }
}
