//! 曝光 / 点击明细表迁移
//!
//! 两张表都挂在 ads.id 上并级联删除。

use sea_orm_migration::prelude::*;

use crate::m20261001_000001_ads_table::Ads;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AdImpressions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AdImpressions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AdImpressions::AdId).big_integer().not_null())
                    .col(ColumnDef::new(AdImpressions::UserId).big_integer().null())
                    .col(ColumnDef::new(AdImpressions::IpAddress).string_len(45).null())
                    .col(ColumnDef::new(AdImpressions::UserAgent).text().null())
                    .col(ColumnDef::new(AdImpressions::VideoIndex).big_integer().null())
                    .col(
                        ColumnDef::new(AdImpressions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ad_impressions_ad_id")
                            .from(AdImpressions::Table, AdImpressions::AdId)
                            .to(Ads::Table, Ads::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ad_impressions_ad_time")
                    .table(AdImpressions::Table)
                    .col(AdImpressions::AdId)
                    .col(AdImpressions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AdClicks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AdClicks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AdClicks::AdId).big_integer().not_null())
                    .col(ColumnDef::new(AdClicks::UserId).big_integer().null())
                    .col(ColumnDef::new(AdClicks::IpAddress).string_len(45).null())
                    .col(ColumnDef::new(AdClicks::UserAgent).text().null())
                    .col(ColumnDef::new(AdClicks::Referrer).text().null())
                    .col(
                        ColumnDef::new(AdClicks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ad_clicks_ad_id")
                            .from(AdClicks::Table, AdClicks::AdId)
                            .to(Ads::Table, Ads::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ad_clicks_ad_time")
                    .table(AdClicks::Table)
                    .col(AdClicks::AdId)
                    .col(AdClicks::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_ad_clicks_ad_time").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(AdClicks::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_ad_impressions_ad_time").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(AdImpressions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AdImpressions {
    #[sea_orm(iden = "ad_impressions")]
    Table,
    Id,
    AdId,
    UserId,
    IpAddress,
    UserAgent,
    VideoIndex,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AdClicks {
    #[sea_orm(iden = "ad_clicks")]
    Table,
    Id,
    AdId,
    UserId,
    IpAddress,
    UserAgent,
    Referrer,
    CreatedAt,
}
