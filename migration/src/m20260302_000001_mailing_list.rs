//! 邮件活动收件人表迁移

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MailingList::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MailingList::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MailingList::Email)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(MailingList::Status)
                            .string_len(20)
                            .not_null()
                            .default("Pending"),
                    )
                    .col(
                        ColumnDef::new(MailingList::SentDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(MailingList::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 批量发送按 (status, id) 取最早的 Pending 行
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_mailing_list_status_id")
                    .table(MailingList::Table)
                    .col(MailingList::Status)
                    .col(MailingList::Id)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_mailing_list_status_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(MailingList::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MailingList {
    #[sea_orm(iden = "mailing_list")]
    Table,
    Id,
    Email,
    Status,
    SentDate,
    CreatedAt,
}
