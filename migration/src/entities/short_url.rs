use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "short_urls")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_type = "Text")]
    pub long_url: String,
    #[sea_orm(unique)]
    pub short_code: String,
    pub created_for_email: Option<String>,
    pub click_count: i64,
    pub is_deleted: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::click_log::Entity")]
    ClickLogs,
}

impl Related<super::click_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClickLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
