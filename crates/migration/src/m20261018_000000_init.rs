//! Initial schema.
//!
//! - `funds`: expense pools, each created by one member
//! - `fund_members`: the roster of every fund
//! - `transactions`: recorded expenses (soft-deleted through `voided_at`)
//! - `splits`: signed per-member amounts of a transaction

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Funds {
    Table,
    Id,
    Name,
    CreatedBy,
    Currency,
    CreatedAt,
}

#[derive(Iden)]
enum FundMembers {
    Table,
    FundId,
    MemberId,
    DisplayName,
    JoinedAt,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    FundId,
    Description,
    TotalMinor,
    Currency,
    PaidBy,
    SplitKind,
    CreatedBy,
    CreatedAt,
    VoidedAt,
    VoidedBy,
    IdempotencyKey,
}

#[derive(Iden)]
enum Splits {
    Table,
    Id,
    TransactionId,
    MemberId,
    AmountMinor,
    Position,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Funds
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Funds::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Funds::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Funds::Name).string().not_null())
                    .col(ColumnDef::new(Funds::CreatedBy).string().not_null())
                    .col(
                        ColumnDef::new(Funds::Currency)
                            .string()
                            .not_null()
                            .default("VND"),
                    )
                    .col(ColumnDef::new(Funds::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-funds-created_by")
                    .table(Funds::Table)
                    .col(Funds::CreatedBy)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Fund members
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(FundMembers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(FundMembers::FundId).string().not_null())
                    .col(ColumnDef::new(FundMembers::MemberId).string().not_null())
                    .col(ColumnDef::new(FundMembers::DisplayName).string().not_null())
                    .col(ColumnDef::new(FundMembers::JoinedAt).timestamp().not_null())
                    .primary_key(
                        Index::create()
                            .col(FundMembers::FundId)
                            .col(FundMembers::MemberId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-fund_members-fund_id")
                            .from(FundMembers::Table, FundMembers::FundId)
                            .to(Funds::Table, Funds::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-fund_members-member_id")
                    .table(FundMembers::Table)
                    .col(FundMembers::MemberId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Transactions
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
                    .col(ColumnDef::new(Transactions::FundId).string().not_null())
                    .col(ColumnDef::new(Transactions::Description).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::TotalMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Currency).string().not_null())
                    .col(ColumnDef::new(Transactions::PaidBy).string().not_null())
                    .col(ColumnDef::new(Transactions::SplitKind).string().not_null())
                    .col(ColumnDef::new(Transactions::CreatedBy).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::VoidedAt).timestamp())
                    .col(ColumnDef::new(Transactions::VoidedBy).string())
                    .col(ColumnDef::new(Transactions::IdempotencyKey).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-fund_id")
                            .from(Transactions::Table, Transactions::FundId)
                            .to(Funds::Table, Funds::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-fund_id-created_at")
                    .table(Transactions::Table)
                    .col(Transactions::FundId)
                    .col(Transactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-idempotency_key")
                    .table(Transactions::Table)
                    .col(Transactions::FundId)
                    .col(Transactions::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Splits
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Splits::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Splits::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Splits::TransactionId).string().not_null())
                    .col(ColumnDef::new(Splits::MemberId).string().not_null())
                    .col(ColumnDef::new(Splits::AmountMinor).big_integer().not_null())
                    .col(ColumnDef::new(Splits::Position).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-splits-transaction_id")
                            .from(Splits::Table, Splits::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-splits-transaction_id")
                    .table(Splits::Table)
                    .col(Splits::TransactionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Splits::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FundMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Funds::Table).to_owned())
            .await?;
        Ok(())
    }
}
