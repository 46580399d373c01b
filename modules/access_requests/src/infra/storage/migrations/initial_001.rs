use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::UserId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Approved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::Pending)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::StatusSince)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    // approved and pending are mutually exclusive
                    .check(Expr::cust("NOT (approved AND pending)"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_pending_since")
                    .table(Users::Table)
                    .col(Users::Pending)
                    .col(Users::StatusSince)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UsersHist::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UsersHist::SequenceId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UsersHist::UserId).big_integer().not_null())
                    .col(ColumnDef::new(UsersHist::Approved).boolean().not_null())
                    .col(ColumnDef::new(UsersHist::Pending).boolean().not_null())
                    .col(
                        ColumnDef::new(UsersHist::StatusSince)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UsersHist::ChangedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_hist_user")
                    .table(UsersHist::Table)
                    .col(UsersHist::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UsersHist::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    UserId,
    Approved,
    Pending,
    StatusSince,
}

#[derive(DeriveIden)]
enum UsersHist {
    Table,
    SequenceId,
    UserId,
    Approved,
    Pending,
    StatusSince,
    ChangedAt,
}
