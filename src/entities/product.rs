use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name_en: String,
    pub name_ar: String,
    #[sea_orm(column_type = "Text")]
    pub description_en: String,
    #[sea_orm(column_type = "Text")]
    pub description_ar: String,
    pub category_en: String,
    pub category_ar: String,
    pub price: f32,
    pub brand: String,
    /// Optional variant lists (colors/storage/sizes) kept as JSON arrays of strings.
    pub colors: Option<Json>,
    pub storage: Option<Json>,
    pub sizes: Option<Json>,
    pub main_image_url: Option<String>,
    pub main_image_public_id: Option<String>,
    pub stock: i32,
    // Derived from the review rows, recomputed on every review write.
    pub rating: f32,
    pub num_reviews: i32,
    pub is_featured: bool,
    pub discount: f32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "crate::entities::product_image::Entity")]
    Images,
    #[sea_orm(has_many = "crate::entities::review::Entity")]
    Reviews,
}

impl Related<crate::entities::product_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl Related<crate::entities::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
