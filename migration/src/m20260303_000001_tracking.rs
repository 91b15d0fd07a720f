//! 追踪链接与点击日志表迁移
//!
//! - short_urls: 短码 → 目标地址，附带所属邮箱、点击计数和软删除标记
//! - click_logs: 点击事件，外键引用 short_urls.id

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ShortUrls::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ShortUrls::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ShortUrls::LongUrl).text().not_null())
                    .col(
                        ColumnDef::new(ShortUrls::ShortCode)
                            .string_len(16)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(ShortUrls::CreatedForEmail)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ShortUrls::ClickCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ShortUrls::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ShortUrls::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ClickLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClickLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ClickLogs::UrlId).integer().not_null())
                    .col(
                        ColumnDef::new(ClickLogs::ClickedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ClickLogs::IpAddress).string_len(45).null())
                    .col(ColumnDef::new(ClickLogs::Country).string_len(100).null())
                    .col(ColumnDef::new(ClickLogs::City).string_len(100).null())
                    .col(ColumnDef::new(ClickLogs::Browser).string_len(100).null())
                    .col(ColumnDef::new(ClickLogs::Platform).string_len(100).null())
                    .col(ColumnDef::new(ClickLogs::DeviceType).string_len(20).null())
                    .col(ColumnDef::new(ClickLogs::Referrer).text().null())
                    .col(ColumnDef::new(ClickLogs::UtmSource).string_len(100).null())
                    .col(ColumnDef::new(ClickLogs::UtmMedium).string_len(100).null())
                    .col(ColumnDef::new(ClickLogs::UtmCampaign).string_len(100).null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_click_logs_url_id")
                            .from(ClickLogs::Table, ClickLogs::UrlId)
                            .to(ShortUrls::Table, ShortUrls::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 单链接点击时间序列查询
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_click_logs_url_time")
                    .table(ClickLogs::Table)
                    .col(ClickLogs::UrlId)
                    .col(ClickLogs::ClickedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_click_logs_url_time").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ClickLogs::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ShortUrls::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ShortUrls {
    #[sea_orm(iden = "short_urls")]
    Table,
    Id,
    LongUrl,
    ShortCode,
    CreatedForEmail,
    ClickCount,
    IsDeleted,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ClickLogs {
    #[sea_orm(iden = "click_logs")]
    Table,
    Id,
    UrlId,
    ClickedAt,
    IpAddress,
    Country,
    City,
    Browser,
    Platform,
    DeviceType,
    Referrer,
    UtmSource,
    UtmMedium,
    UtmCampaign,
}
