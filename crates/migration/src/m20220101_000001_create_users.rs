//! Create `users` table.
//!
//! Stores one credential record per account; the password hash lives on the
//! row and the active flag gates login.
use sea_orm_migration::{prelude::*, schema::*};

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
                    .col(uuid(Users::Id).primary_key())
                    .col(string_len(Users::Username, 255).unique_key().not_null())
                    .col(string_len(Users::Email, 255).unique_key().not_null())
                    .col(
                        ColumnDef::new(Users::Name)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Users::ProfilePicUrl)
                            .text()
                            .null(),
                    )
                    .col(string_len(Users::PasswordHash, 255).not_null())
                    .col(boolean(Users::IsActive).not_null().default(true))
                    .col(timestamp_with_time_zone(Users::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Users::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Users { Table, Id, Username, Email, Name, ProfilePicUrl, PasswordHash, IsActive, CreatedAt, UpdatedAt }
