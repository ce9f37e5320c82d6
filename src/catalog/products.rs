use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;

use crate::catalog::{slugify, CatalogError};
use crate::entities::{
    category,
    product::{self, ProductType, WeightUnit},
    product_image, product_review,
};

/// Everything needed to create a product. Fields left at their defaults
/// match the store's column defaults.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ProductDraft {
    pub name: String,
    pub slug: Option<String>,
    pub description: String,
    pub category_id: i32,
    pub product_type: ProductType,
    pub price: f64,
    pub wholesale_price: Option<f64>,
    pub cost_price: Option<f64>,
    pub is_wholesale_available: bool,
    pub wholesale_min_quantity: i32,
    pub sku: Option<String>,
    pub stock_quantity: i32,
    pub low_stock_threshold: i32,
    pub weight: f64,
    pub weight_unit: WeightUnit,
    pub brand: String,
    pub origin_country: String,
    pub is_halal: bool,
    pub is_vegetarian: bool,
    pub expiry_date: Option<NaiveDate>,
    pub batch_number: String,
    pub is_available: bool,
    pub is_featured: bool,
    pub is_bestseller: bool,
    pub main_image: Option<String>,
}

impl Default for ProductDraft {
    fn default() -> Self {
        ProductDraft {
            name: String::new(),
            slug: None,
            description: String::new(),
            category_id: 0,
            product_type: ProductType::Grocery,
            price: 0.0,
            wholesale_price: None,
            cost_price: None,
            is_wholesale_available: false,
            wholesale_min_quantity: 1,
            sku: None,
            stock_quantity: 0,
            low_stock_threshold: 10,
            weight: 0.0,
            weight_unit: WeightUnit::Gram,
            brand: String::new(),
            origin_country: String::new(),
            is_halal: false,
            is_vegetarian: false,
            expiry_date: None,
            batch_number: String::new(),
            is_available: true,
            is_featured: false,
            is_bestseller: false,
            main_image: None,
        }
    }
}

/// Partial update; `None` leaves the stored value alone.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i32>,
    pub product_type: Option<ProductType>,
    pub price: Option<f64>,
    pub wholesale_price: Option<f64>,
    pub cost_price: Option<f64>,
    pub is_wholesale_available: Option<bool>,
    pub wholesale_min_quantity: Option<i32>,
    pub sku: Option<String>,
    pub stock_quantity: Option<i32>,
    pub low_stock_threshold: Option<i32>,
    pub weight: Option<f64>,
    pub weight_unit: Option<WeightUnit>,
    pub brand: Option<String>,
    pub origin_country: Option<String>,
    pub is_halal: Option<bool>,
    pub is_vegetarian: Option<bool>,
    pub expiry_date: Option<NaiveDate>,
    pub batch_number: Option<String>,
    pub is_available: Option<bool>,
    pub is_featured: Option<bool>,
    pub is_bestseller: Option<bool>,
    pub main_image: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewImage {
    pub image: String,
    pub alt_text: String,
    pub is_featured: bool,
}

pub async fn find<C: ConnectionTrait>(db: &C, id: i32) -> Result<product::Model, CatalogError> {
    product::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| CatalogError::NotFound(format!("Product with id {id}")))
}

pub async fn find_by_name<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> Result<Option<product::Model>, CatalogError> {
    Ok(product::Entity::find()
        .filter(product::Column::Name.eq(name))
        .order_by_asc(product::Column::Id)
        .one(db)
        .await?)
}

pub async fn create_product<C: ConnectionTrait>(
    db: &C,
    draft: ProductDraft,
) -> Result<product::Model, CatalogError> {
    let name = draft.name.trim().to_owned();
    if name.is_empty() {
        return Err(CatalogError::Validation("Product name is required".to_owned()));
    }
    check_amounts(draft.price, draft.stock_quantity)?;

    category::Entity::find_by_id(draft.category_id)
        .one(db)
        .await?
        .ok_or_else(|| CatalogError::NotFound(format!("Category with id {}", draft.category_id)))?;

    let slug = draft
        .slug
        .map(|slug| slug.trim().to_owned())
        .filter(|slug| !slug.is_empty())
        .unwrap_or_else(|| slugify(&name));
    if slug.is_empty() {
        return Err(CatalogError::Validation(format!(
            "Cannot derive a slug from '{name}'"
        )));
    }
    ensure_unique_slug(db, &slug, None).await?;

    let sku = draft
        .sku
        .map(|sku| sku.trim().to_owned())
        .filter(|sku| !sku.is_empty());
    if let Some(sku) = &sku {
        ensure_unique_sku(db, sku, None).await?;
    }

    let mut active = product::ActiveModel {
        name: Set(name),
        slug: Set(slug),
        description: Set(draft.description),
        category_id: Set(draft.category_id),
        product_type: Set(draft.product_type),
        price: Set(draft.price),
        wholesale_price: Set(draft.wholesale_price),
        cost_price: Set(draft.cost_price),
        is_wholesale_available: Set(draft.is_wholesale_available),
        wholesale_min_quantity: Set(draft.wholesale_min_quantity),
        stock_quantity: Set(draft.stock_quantity),
        low_stock_threshold: Set(draft.low_stock_threshold),
        weight: Set(draft.weight),
        weight_unit: Set(draft.weight_unit),
        brand: Set(draft.brand),
        origin_country: Set(draft.origin_country),
        is_halal: Set(draft.is_halal),
        is_vegetarian: Set(draft.is_vegetarian),
        expiry_date: Set(draft.expiry_date),
        batch_number: Set(draft.batch_number),
        is_available: Set(draft.is_available),
        is_featured: Set(draft.is_featured),
        is_bestseller: Set(draft.is_bestseller),
        main_image: Set(draft.main_image),
        ..Default::default()
    };
    // Left unset, the SKU is derived in `before_save`.
    if let Some(sku) = sku {
        active.sku = Set(sku);
    }

    Ok(active.insert(db).await?)
}

/// Returns the product already filed under `draft.name`, or creates it.
/// The flag is true when a new row was written.
pub async fn get_or_create_by_name<C: ConnectionTrait>(
    db: &C,
    draft: ProductDraft,
) -> Result<(product::Model, bool), CatalogError> {
    if let Some(existing) = find_by_name(db, draft.name.trim()).await? {
        return Ok((existing, false));
    }
    let created = create_product(db, draft).await?;
    Ok((created, true))
}

pub async fn update_product<C: ConnectionTrait>(
    db: &C,
    id: i32,
    changes: ProductChanges,
) -> Result<product::Model, CatalogError> {
    let current = find(db, id).await?;
    let mut active: product::ActiveModel = current.clone().into();

    if let Some(name) = changes.name {
        let name = name.trim().to_owned();
        if name.is_empty() {
            return Err(CatalogError::Validation("Product name is required".to_owned()));
        }
        active.name = Set(name);
    }
    if let Some(slug) = changes.slug {
        let slug = slug.trim().to_owned();
        if slug.is_empty() {
            return Err(CatalogError::Validation("Product slug is required".to_owned()));
        }
        ensure_unique_slug(db, &slug, Some(id)).await?;
        active.slug = Set(slug);
    }
    if let Some(sku) = changes.sku {
        let sku = sku.trim().to_owned();
        if sku.is_empty() {
            return Err(CatalogError::Validation("SKU cannot be blank".to_owned()));
        }
        ensure_unique_sku(db, &sku, Some(id)).await?;
        active.sku = Set(sku);
    }
    if let Some(category_id) = changes.category_id {
        category::Entity::find_by_id(category_id)
            .one(db)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Category with id {category_id}")))?;
        active.category_id = Set(category_id);
    }
    check_amounts(
        changes.price.unwrap_or(current.price),
        changes.stock_quantity.unwrap_or(current.stock_quantity),
    )?;

    if let Some(description) = changes.description {
        active.description = Set(description);
    }
    if let Some(product_type) = changes.product_type {
        active.product_type = Set(product_type);
    }
    if let Some(price) = changes.price {
        active.price = Set(price);
    }
    if let Some(wholesale_price) = changes.wholesale_price {
        active.wholesale_price = Set(Some(wholesale_price).filter(|price| *price > 0.0));
    }
    if let Some(cost_price) = changes.cost_price {
        active.cost_price = Set(Some(cost_price).filter(|price| *price > 0.0));
    }
    if let Some(value) = changes.is_wholesale_available {
        active.is_wholesale_available = Set(value);
    }
    if let Some(value) = changes.wholesale_min_quantity {
        active.wholesale_min_quantity = Set(value);
    }
    if let Some(value) = changes.stock_quantity {
        active.stock_quantity = Set(value);
    }
    if let Some(value) = changes.low_stock_threshold {
        active.low_stock_threshold = Set(value);
    }
    if let Some(value) = changes.weight {
        active.weight = Set(value);
    }
    if let Some(value) = changes.weight_unit {
        active.weight_unit = Set(value);
    }
    if let Some(value) = changes.brand {
        active.brand = Set(value);
    }
    if let Some(value) = changes.origin_country {
        active.origin_country = Set(value);
    }
    if let Some(value) = changes.is_halal {
        active.is_halal = Set(value);
    }
    if let Some(value) = changes.is_vegetarian {
        active.is_vegetarian = Set(value);
    }
    if let Some(value) = changes.expiry_date {
        active.expiry_date = Set(Some(value));
    }
    if let Some(value) = changes.batch_number {
        active.batch_number = Set(value);
    }
    if let Some(value) = changes.is_available {
        active.is_available = Set(value);
    }
    if let Some(value) = changes.is_featured {
        active.is_featured = Set(value);
    }
    if let Some(value) = changes.is_bestseller {
        active.is_bestseller = Set(value);
    }
    if let Some(value) = changes.main_image {
        active.main_image = Set(Some(value));
    }

    Ok(active.update(db).await?)
}

pub async fn delete_product<C: ConnectionTrait>(db: &C, id: i32) -> Result<(), CatalogError> {
    find(db, id).await?;
    delete_products(db, &[id]).await?;
    Ok(())
}

/// Removes the products together with their gallery images and reviews.
pub async fn delete_products<C: ConnectionTrait>(db: &C, ids: &[i32]) -> Result<u64, CatalogError> {
    if ids.is_empty() {
        return Ok(0);
    }
    product_image::Entity::delete_many()
        .filter(product_image::Column::ProductId.is_in(ids.to_vec()))
        .exec(db)
        .await?;
    product_review::Entity::delete_many()
        .filter(product_review::Column::ProductId.is_in(ids.to_vec()))
        .exec(db)
        .await?;
    let result = product::Entity::delete_many()
        .filter(product::Column::Id.is_in(ids.to_vec()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

pub async fn images<C: ConnectionTrait>(
    db: &C,
    product_id: i32,
) -> Result<Vec<product_image::Model>, CatalogError> {
    Ok(product_image::Entity::find()
        .filter(product_image::Column::ProductId.eq(product_id))
        .order_by_desc(product_image::Column::IsFeatured)
        .order_by_asc(product_image::Column::Id)
        .all(db)
        .await?)
}

pub async fn add_image<C: ConnectionTrait>(
    db: &C,
    product_id: i32,
    new: NewImage,
) -> Result<product_image::Model, CatalogError> {
    find(db, product_id).await?;
    if new.image.trim().is_empty() {
        return Err(CatalogError::Validation("Image reference is required".to_owned()));
    }

    Ok(product_image::ActiveModel {
        product_id: Set(product_id),
        image: Set(new.image),
        alt_text: Set(new.alt_text),
        is_featured: Set(new.is_featured),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

/// Detaches the image and hands back its row so the caller can drop the file.
pub async fn remove_image<C: ConnectionTrait>(
    db: &C,
    product_id: i32,
    image_id: i32,
) -> Result<product_image::Model, CatalogError> {
    let image = product_image::Entity::find_by_id(image_id)
        .filter(product_image::Column::ProductId.eq(product_id))
        .one(db)
        .await?
        .ok_or_else(|| {
            CatalogError::NotFound(format!("Image {image_id} of product {product_id}"))
        })?;
    product_image::Entity::delete_by_id(image.id).exec(db).await?;
    Ok(image)
}

fn check_amounts(price: f64, stock_quantity: i32) -> Result<(), CatalogError> {
    if !price.is_finite() || price < 0.0 {
        return Err(CatalogError::Validation(format!("Invalid price: {price}")));
    }
    if stock_quantity < 0 {
        return Err(CatalogError::Validation(format!(
            "Stock quantity cannot be negative: {stock_quantity}"
        )));
    }
    Ok(())
}

async fn ensure_unique_slug<C: ConnectionTrait>(
    db: &C,
    slug: &str,
    except: Option<i32>,
) -> Result<(), CatalogError> {
    let mut query = product::Entity::find().filter(product::Column::Slug.eq(slug));
    if let Some(id) = except {
        query = query.filter(product::Column::Id.ne(id));
    }
    if query.count(db).await? > 0 {
        return Err(CatalogError::UniquenessViolation(format!(
            "Product with slug '{slug}' already exists"
        )));
    }
    Ok(())
}

async fn ensure_unique_sku<C: ConnectionTrait>(
    db: &C,
    sku: &str,
    except: Option<i32>,
) -> Result<(), CatalogError> {
    let mut query = product::Entity::find().filter(product::Column::Sku.eq(sku));
    if let Some(id) = except {
        query = query.filter(product::Column::Id.ne(id));
    }
    if query.count(db).await? > 0 {
        return Err(CatalogError::UniquenessViolation(format!(
            "Product with SKU '{sku}' already exists"
        )));
    }
    Ok(())
}
