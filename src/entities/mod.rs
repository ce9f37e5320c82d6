pub mod category;
pub mod product;
pub mod product_image;
pub mod product_review;
pub mod user;

use sea_orm::sea_query::Index;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Schema,
    Set,
};
use tracing::info;

use crate::config::Config;
use crate::entities::{
    category::Entity as Category, product::Entity as Product,
    product_image::Entity as ProductImage, product_review::Entity as ProductReview,
    user::Entity as User,
};

pub async fn setup_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let tables = [
        schema.create_table_from_entity(User).if_not_exists().to_owned(),
        schema.create_table_from_entity(Category).if_not_exists().to_owned(),
        schema.create_table_from_entity(Product).if_not_exists().to_owned(),
        schema.create_table_from_entity(ProductImage).if_not_exists().to_owned(),
        schema.create_table_from_entity(ProductReview).if_not_exists().to_owned(),
    ];
    for table in tables.iter() {
        db.execute(backend.build(table)).await?;
    }

    let review_pair = Index::create()
        .if_not_exists()
        .name("idx_product_review_product_user")
        .table(ProductReview)
        .col(product_review::Column::ProductId)
        .col(product_review::Column::UserId)
        .unique()
        .to_owned();
    db.execute(backend.build(&review_pair)).await?;

    Ok(())
}

/// Seeds the administrator account from configuration when it is missing.
pub async fn primary_setup(db: &DatabaseConnection, config: &Config) -> Result<(), DbErr> {
    let Some(password) = config.admin_password.as_deref() else {
        info!("ADMIN_PASSWORD not set, skipping administrator seeding");
        return Ok(());
    };

    let existing = User::find()
        .filter(user::Column::Username.eq(config.admin_username.as_str()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let password_hash = user::hash_password(password).map_err(DbErr::Custom)?;
    let admin = user::ActiveModel {
        username: Set(config.admin_username.clone()),
        password: Set(password_hash),
        role: Set(user::Role::Admin),
        ..Default::default()
    };
    User::insert(admin).exec(db).await?;
    info!(username = %config.admin_username, "Seeded administrator account");

    Ok(())
}
