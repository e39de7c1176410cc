//! Advertisement entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "ads")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// image | video | google_ads
    pub ad_type: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub media_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub google_ads_script: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub click_url: Option<String>,
    pub open_new_tab: bool,
    /// 视频广告时长（秒），0 表示不限
    pub duration: i32,
    pub slot_position: i32,
    pub is_active: bool,
    pub start_date: Option<DateTimeUtc>,
    pub end_date: Option<DateTimeUtc>,
    pub impressions_count: i64,
    pub clicks_count: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
