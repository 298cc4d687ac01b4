//! Create user_login table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserLogin::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserLogin::UserId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserLogin::Username)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(UserLogin::Phone).string_len(32).null())
                    .col(ColumnDef::new(UserLogin::Email).string_len(255).null())
                    .col(ColumnDef::new(UserLogin::Password).text().not_null())
                    .col(
                        ColumnDef::new(UserLogin::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: phone (nullable unique)
        manager
            .create_index(
                Index::create()
                    .name("idx_user_login_phone")
                    .table(UserLogin::Table)
                    .col(UserLogin::Phone)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Unique index: email (nullable unique)
        manager
            .create_index(
                Index::create()
                    .name("idx_user_login_email")
                    .table(UserLogin::Table)
                    .col(UserLogin::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserLogin::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum UserLogin {
    Table,
    UserId,
    Username,
    Phone,
    Email,
    Password,
    DeletedAt,
}
