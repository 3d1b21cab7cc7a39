use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // LoginLogs: index on user_id for per-account history scans
        manager
            .create_index(
                Index::create()
                    .name("idx_loginlog_user")
                    .table(LoginLogs::Table)
                    .col(LoginLogs::UserId)
                    .to_owned(),
            )
            .await?;

        // LoginLogs: index on login_timestamp for newest-first ordering
        manager
            .create_index(
                Index::create()
                    .name("idx_loginlog_timestamp")
                    .table(LoginLogs::Table)
                    .col(LoginLogs::LoginTimestamp)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_loginlog_user").table(LoginLogs::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_loginlog_timestamp").table(LoginLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LoginLogs { Table, UserId, LoginTimestamp }
