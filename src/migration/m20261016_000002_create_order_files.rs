//! Create order_files table.
//!
//! No foreign key to orders: the one-to-many link is maintained by the
//! transaction that inserts an order together with its files.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OrderFiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderFiles::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrderFiles::OrderId).integer().not_null())
                    .col(ColumnDef::new(OrderFiles::File).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_order_files_order")
                    .table(OrderFiles::Table)
                    .col(OrderFiles::OrderId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderFiles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum OrderFiles {
    Table,
    Id,
    OrderId,
    File,
}
