//! Adds `budgets.original_minor`, the allowance a budget was defined with.
//!
//! Existing rows are backfilled with their current value.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Budgets::Table)
                    .add_column(
                        ColumnDef::new(Budgets::OriginalMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .exec_stmt(
                Query::update()
                    .table(Budgets::Table)
                    .value(Budgets::OriginalMinor, Expr::col(Budgets::CurrentMinor))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Budgets::Table)
                    .drop_column(Budgets::OriginalMinor)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum Budgets {
    Table,
    CurrentMinor,
    OriginalMinor,
}
