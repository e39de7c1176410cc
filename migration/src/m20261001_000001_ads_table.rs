//! 广告主表迁移
//!
//! 创建 ads 表，存放广告素材、投放位置、投放时间窗口以及冗余计数器。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Ads::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Ads::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Ads::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Ads::Description).text().null())
                    .col(
                        ColumnDef::new(Ads::AdType)
                            .string_len(20)
                            .not_null()
                            .default("image"),
                    )
                    .col(ColumnDef::new(Ads::MediaUrl).text().null())
                    .col(ColumnDef::new(Ads::GoogleAdsScript).text().null())
                    .col(ColumnDef::new(Ads::ClickUrl).text().null())
                    .col(
                        ColumnDef::new(Ads::OpenNewTab)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Ads::Duration)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Ads::SlotPosition)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Ads::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Ads::StartDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Ads::EndDate).timestamp_with_time_zone().null())
                    .col(
                        ColumnDef::new(Ads::ImpressionsCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Ads::ClicksCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Ads::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Ads::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 投放查询：按广告位 + 启用状态筛选
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ads_slot_active")
                    .table(Ads::Table)
                    .col(Ads::SlotPosition)
                    .col(Ads::IsActive)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ads_created_at")
                    .table(Ads::Table)
                    .col(Ads::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_ads_created_at").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_ads_slot_active").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Ads::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Ads {
    #[sea_orm(iden = "ads")]
    Table,
    Id,
    Title,
    Description,
    AdType,
    MediaUrl,
    GoogleAdsScript,
    ClickUrl,
    OpenNewTab,
    Duration,
    SlotPosition,
    IsActive,
    StartDate,
    EndDate,
    ImpressionsCount,
    ClicksCount,
    CreatedAt,
    UpdatedAt,
}
