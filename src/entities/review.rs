use sea_orm::entity::prelude::*;
use crate::entities::product::Entity as Product;

// One row per (product, user); the upsert handler scans for the caller's
// existing row instead of relying on a unique index.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub product_id: i32,
    #[sea_orm(indexed)]
    pub user_id: i32,
    pub name_en: String,
    pub name_ar: String,
    pub rating: f32,
    #[sea_orm(column_type = "Text")]
    pub comment_en: String,
    #[sea_orm(column_type = "Text")]
    pub comment_ar: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Product",
        from = "crate::entities::review::Column::ProductId",
        to = "crate::entities::product::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Product,
}

impl Related<crate::entities::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
