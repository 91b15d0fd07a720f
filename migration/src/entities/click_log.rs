//! Click log entity for detailed click tracking

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "click_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// References short_urls.id
    pub url_id: i32,
    pub clicked_at: DateTimeUtc,
    pub ip_address: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub browser: Option<String>,
    pub platform: Option<String>,
    /// mobile / tablet / pc / other
    pub device_type: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub referrer: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::short_url::Entity",
        from = "Column::UrlId",
        to = "super::short_url::Column::Id",
        on_delete = "Cascade"
    )]
    ShortUrl,
}

impl Related<super::short_url::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShortUrl.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
