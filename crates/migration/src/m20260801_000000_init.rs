//! Initial schema migration - creates all tables from scratch.
//!
//! It creates the complete schema for Magazzino:
//!
//! - `supplies`: the catalog of tracked goods
//! - `stock_entries`: one running amount per supply
//! - `movements`: dated documents (purchases, consumptions)
//! - `movement_details`: supply/quantity lines inside a movement

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Supplies {
    Table,
    Id,
    Name,
    Unit,
    DeletedAt,
}

#[derive(Iden)]
enum StockEntries {
    Table,
    SupplyId,
    Amount,
}

#[derive(Iden)]
enum Movements {
    Table,
    Id,
    Kind,
    OccurredAt,
    Note,
}

#[derive(Iden)]
enum MovementDetails {
    Table,
    Id,
    MovementId,
    SupplyId,
    Quantity,
    Note,
    Settled,
    DeletedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Supplies
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Supplies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Supplies::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Supplies::Name).string().not_null())
                    .col(ColumnDef::new(Supplies::Unit).string().not_null())
                    .col(ColumnDef::new(Supplies::DeletedAt).timestamp())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-supplies-name")
                    .table(Supplies::Table)
                    .col(Supplies::Name)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Stock entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(StockEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StockEntries::SupplyId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StockEntries::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-stock_entries-supply_id")
                            .from(StockEntries::Table, StockEntries::SupplyId)
                            .to(Supplies::Table, Supplies::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Movements
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Movements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Movements::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Movements::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Movements::OccurredAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Movements::Note).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-movements-occurred_at")
                    .table(Movements::Table)
                    .col(Movements::OccurredAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Movement details
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(MovementDetails::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MovementDetails::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MovementDetails::MovementId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MovementDetails::SupplyId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MovementDetails::Quantity)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MovementDetails::Note).string())
                    .col(
                        ColumnDef::new(MovementDetails::Settled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(MovementDetails::DeletedAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-movement_details-movement_id")
                            .from(MovementDetails::Table, MovementDetails::MovementId)
                            .to(Movements::Table, Movements::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-movement_details-supply_id")
                            .from(MovementDetails::Table, MovementDetails::SupplyId)
                            .to(Supplies::Table, Supplies::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-movement_details-movement_id")
                    .table(MovementDetails::Table)
                    .col(MovementDetails::MovementId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-movement_details-supply_id")
                    .table(MovementDetails::Table)
                    .col(MovementDetails::SupplyId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MovementDetails::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Movements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StockEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Supplies::Table).to_owned())
            .await?;

        Ok(())
    }
}
