use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Clone, Copy, Iden)]
enum TransactionItems {
    Table,
    PriorAvgCost,
    PriorToAvgCost,
}

#[derive(Clone, Copy, Iden)]
enum ProductionOutputs {
    Table,
    PriorAvgCost,
}

// SQLite takes one column per ALTER TABLE statement.
async fn add_cost_column<T, C>(manager: &SchemaManager<'_>, table: T, column: C) -> Result<(), DbErr>
where
    T: Iden + 'static,
    C: Iden + 'static,
{
    manager
        .alter_table(
            Table::alter()
                .table(table)
                .add_column(ColumnDef::new(column).big_integer())
                .to_owned(),
        )
        .await
}

async fn drop_column<T, C>(manager: &SchemaManager<'_>, table: T, column: C) -> Result<(), DbErr>
where
    T: Iden + 'static,
    C: Iden + 'static,
{
    manager
        .alter_table(Table::alter().table(table).drop_column(column).to_owned())
        .await
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        add_cost_column(manager, TransactionItems::Table, TransactionItems::PriorAvgCost).await?;
        add_cost_column(manager, TransactionItems::Table, TransactionItems::PriorToAvgCost).await?;
        add_cost_column(manager, ProductionOutputs::Table, ProductionOutputs::PriorAvgCost).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_column(manager, ProductionOutputs::Table, ProductionOutputs::PriorAvgCost).await?;
        drop_column(manager, TransactionItems::Table, TransactionItems::PriorToAvgCost).await?;
        drop_column(manager, TransactionItems::Table, TransactionItems::PriorAvgCost).await?;

        Ok(())
    }
}
