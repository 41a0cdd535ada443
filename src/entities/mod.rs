pub mod cart_item;
pub mod order;
pub mod order_item;
pub mod product;
pub mod product_image;
pub mod review;
pub mod user;
pub mod wishlist_item;

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, Schema};

pub async fn setup_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let statements = [
        schema.create_table_from_entity(user::Entity),
        schema.create_table_from_entity(product::Entity),
        schema.create_table_from_entity(product_image::Entity),
        schema.create_table_from_entity(review::Entity),
        schema.create_table_from_entity(cart_item::Entity),
        schema.create_table_from_entity(wishlist_item::Entity),
        schema.create_table_from_entity(order::Entity),
        schema.create_table_from_entity(order_item::Entity),
    ];

    for statement in statements {
        db.execute(backend.build(&statement)).await?;
    }

    Ok(())
}
