//! Initial schema.
//!
//! - `lists`: named shopping/order lists
//! - `budgets`: at most one budget per list (grocery lists only)
//! - `items`: purchasable entries of a list
//!
//! The expense mirror is not part of this schema: it lives in a separate store.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Lists {
    Table,
    Id,
    Name,
    Kind,
    RefMonth,
    CreatedAt,
}

#[derive(Iden)]
enum Budgets {
    Table,
    Id,
    ListId,
    CurrentMinor,
}

#[derive(Iden)]
enum Items {
    Table,
    Id,
    ListId,
    Name,
    QuantityMilli,
    PriceMinor,
    Category,
    Observation,
    Purchased,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Lists
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Lists::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Lists::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Lists::Name).string().not_null())
                    .col(
                        ColumnDef::new(Lists::Kind)
                            .string()
                            .not_null()
                            .default("grocery"),
                    )
                    .col(ColumnDef::new(Lists::RefMonth).string())
                    .col(ColumnDef::new(Lists::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Budgets
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Budgets::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Budgets::ListId).string().not_null())
                    .col(
                        ColumnDef::new(Budgets::CurrentMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budgets-list_id")
                            .from(Budgets::Table, Budgets::ListId)
                            .to(Lists::Table, Lists::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-budgets-list_id-unique")
                    .table(Budgets::Table)
                    .col(Budgets::ListId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Items
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Items::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Items::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Items::ListId).string().not_null())
                    .col(ColumnDef::new(Items::Name).string().not_null())
                    .col(
                        ColumnDef::new(Items::QuantityMilli)
                            .big_integer()
                            .not_null()
                            .default(1000),
                    )
                    .col(
                        ColumnDef::new(Items::PriceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Items::Category).string())
                    .col(ColumnDef::new(Items::Observation).string())
                    .col(
                        ColumnDef::new(Items::Purchased)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Items::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-items-list_id")
                            .from(Items::Table, Items::ListId)
                            .to(Lists::Table, Lists::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-items-list_id-created_at")
                    .table(Items::Table)
                    .col(Items::ListId)
                    .col(Items::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Items::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Budgets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Lists::Table).to_owned())
            .await?;
        Ok(())
    }
}
