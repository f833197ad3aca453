use sea_orm_migration::prelude::*;

/// Singleton institution record. The row is created lazily by the application
/// under a fixed primary key, so no seed is inserted here.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SchoolProfile::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SchoolProfile::Id).integer().not_null().primary_key())
                    .col(ColumnDef::new(SchoolProfile::Logo).string_len(255).null())
                    .col(ColumnDef::new(SchoolProfile::Name).string_len(200).not_null())
                    .col(ColumnDef::new(SchoolProfile::Address).text().null())
                    .col(ColumnDef::new(SchoolProfile::Phone).string_len(50).null())
                    .col(ColumnDef::new(SchoolProfile::Email).string_len(100).null())
                    .col(ColumnDef::new(SchoolProfile::Vision).text().null())
                    .col(ColumnDef::new(SchoolProfile::Mission).text().null())
                    .col(ColumnDef::new(SchoolProfile::CoreValues).text().null())
                    .col(ColumnDef::new(SchoolProfile::GoogleMapsUrl).string_len(500).null())
                    .col(ColumnDef::new(SchoolProfile::YoutubeUrl).string_len(500).null())
                    .col(ColumnDef::new(SchoolProfile::InstagramUrl).string_len(500).null())
                    .col(ColumnDef::new(SchoolProfile::TelegramUrl).string_len(500).null())
                    .col(ColumnDef::new(SchoolProfile::SnapchatUrl).string_len(500).null())
                    .col(ColumnDef::new(SchoolProfile::WhatsappUrl).string_len(500).null())
                    .col(ColumnDef::new(SchoolProfile::AcademicYear).string_len(50).null())
                    .col(ColumnDef::new(SchoolProfile::AcademicSemester).string_len(50).null())
                    .col(
                        ColumnDef::new(SchoolProfile::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SchoolProfile::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SchoolProfile::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum SchoolProfile {
    Table,
    Id,
    Logo,
    Name,
    Address,
    Phone,
    Email,
    Vision,
    Mission,
    CoreValues,
    GoogleMapsUrl,
    YoutubeUrl,
    InstagramUrl,
    TelegramUrl,
    SnapchatUrl,
    WhatsappUrl,
    AcademicYear,
    AcademicSemester,
    CreatedAt,
    UpdatedAt,
}
