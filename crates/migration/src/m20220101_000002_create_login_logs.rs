//! Create `login_logs` table with FK to `users`.
//!
//! Append-only audit trail of login attempts against known accounts.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LoginLogs::Table)
                    .if_not_exists()
                    .col(uuid(LoginLogs::Id).primary_key())
                    .col(uuid(LoginLogs::UserId).not_null())
                    .col(
                        ColumnDef::new(LoginLogs::IpAddress)
                            .string_len(45)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LoginLogs::UserAgent)
                            .text()
                            .null(),
                    )
                    .col(timestamp_with_time_zone(LoginLogs::LoginTimestamp).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_loginlog_user")
                            .from(LoginLogs::Table, LoginLogs::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(LoginLogs::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum LoginLogs { Table, Id, UserId, IpAddress, UserAgent, LoginTimestamp }

#[derive(DeriveIden)]
enum Users { Table, Id }
