//! Production runs and their ingredient and output lines.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Productions {
    Table,
    Id,
    Number,
    RecipeId,
    Date,
    WarehouseId,
    BatchCount,
    Status,
    Description,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ProductionIngredients {
    Table,
    Id,
    ProductionId,
    Position,
    ProductId,
    WarehouseId,
    PlannedQuantity,
    ActualQuantity,
    UnitCost,
}

#[derive(Iden)]
enum ProductionOutputs {
    Table,
    Id,
    ProductionId,
    Position,
    ProductId,
    PlannedQuantity,
    ActualQuantity,
    Cost,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Productions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Productions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Productions::Number).string().not_null())
                    .col(
                        ColumnDef::new(Productions::RecipeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Productions::Date).date().not_null())
                    .col(
                        ColumnDef::new(Productions::WarehouseId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Productions::BatchCount)
                            .big_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Productions::Status).string().not_null())
                    .col(ColumnDef::new(Productions::Description).string())
                    .col(
                        ColumnDef::new(Productions::CreatedBy)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Productions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Productions::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-productions-number-unique")
                    .table(Productions::Table)
                    .col(Productions::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProductionIngredients::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductionIngredients::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProductionIngredients::ProductionId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductionIngredients::Position)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductionIngredients::ProductId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductionIngredients::WarehouseId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductionIngredients::PlannedQuantity)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductionIngredients::ActualQuantity)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProductionIngredients::UnitCost).big_integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-production_ingredients-production_id")
                            .from(
                                ProductionIngredients::Table,
                                ProductionIngredients::ProductionId,
                            )
                            .to(Productions::Table, Productions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-production_ingredients-production_id")
                    .table(ProductionIngredients::Table)
                    .col(ProductionIngredients::ProductionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProductionOutputs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductionOutputs::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProductionOutputs::ProductionId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductionOutputs::Position)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductionOutputs::ProductId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductionOutputs::PlannedQuantity)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductionOutputs::ActualQuantity)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductionOutputs::Cost)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-production_outputs-production_id")
                            .from(ProductionOutputs::Table, ProductionOutputs::ProductionId)
                            .to(Productions::Table, Productions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-production_outputs-production_id")
                    .table(ProductionOutputs::Table)
                    .col(ProductionOutputs::ProductionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProductionOutputs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProductionIngredients::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Productions::Table).to_owned())
            .await?;
        Ok(())
    }
}
