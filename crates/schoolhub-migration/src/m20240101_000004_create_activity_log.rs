use sea_orm_migration::prelude::*;

/// Append-only audit trail. Actor columns are denormalized copies, not foreign
/// keys: an entry outlives the user who caused it.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ActivityLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActivityLog::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ActivityLog::Operation).string_len(20).not_null())
                    .col(ColumnDef::new(ActivityLog::TableName).text().not_null())
                    .col(ColumnDef::new(ActivityLog::RecordId).text().null())
                    .col(ColumnDef::new(ActivityLog::ActorCivilId).string_len(20).null())
                    .col(ColumnDef::new(ActivityLog::ActorName).string_len(100).null())
                    .col(ColumnDef::new(ActivityLog::ActorSubject).string_len(100).null())
                    .col(ColumnDef::new(ActivityLog::ActorJobTitle).string_len(50).null())
                    .col(ColumnDef::new(ActivityLog::OldData).text().null())
                    .col(ColumnDef::new(ActivityLog::NewData).text().null())
                    .col(ColumnDef::new(ActivityLog::Description).text().null())
                    .col(ColumnDef::new(ActivityLog::IpAddress).string_len(45).null())
                    .col(ColumnDef::new(ActivityLog::UserAgent).text().null())
                    .col(
                        ColumnDef::new(ActivityLog::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_activity_log_created_at")
                    .table(ActivityLog::Table)
                    .col(ActivityLog::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_activity_log_table_name")
                    .table(ActivityLog::Table)
                    .col(ActivityLog::TableName)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_activity_log_operation")
                    .table(ActivityLog::Table)
                    .col(ActivityLog::Operation)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ActivityLog::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ActivityLog {
    Table,
    Id,
    Operation,
    TableName,
    RecordId,
    ActorCivilId,
    ActorName,
    ActorSubject,
    ActorJobTitle,
    OldData,
    NewData,
    Description,
    IpAddress,
    UserAgent,
    CreatedAt,
}
