use sea_orm::{ConnectionTrait, DbErr, EntityTrait, QueryOrder, QuerySelect};
use thiserror::Error;

use crate::catalog::import::COLUMNS;
use crate::entities::{category, product};

pub const EXPORT_FILE_NAME: &str = "products_export.csv";
pub const TEMPLATE_FILE_NAME: &str = "product_import_template.csv";

const TEMPLATE_ROWS: u64 = 3;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to flush CSV: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}

/// Every product in id order, one row per product, in the import layout.
pub async fn export_products<C: ConnectionTrait>(db: &C) -> Result<Vec<u8>, ExportError> {
    let products = product::Entity::find()
        .find_also_related(category::Entity)
        .order_by_asc(product::Column::Id)
        .all(db)
        .await?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(COLUMNS)?;
    for (product, category) in &products {
        let category = category.as_ref().map(|c| c.name.as_str()).unwrap_or("");
        writer.write_record(product_record(product, category))?;
    }
    finish(writer)
}

/// Header plus one example row for each of the first three categories.
pub async fn import_template<C: ConnectionTrait>(db: &C) -> Result<Vec<u8>, ExportError> {
    let categories = category::Entity::find()
        .order_by_asc(category::Column::TreeId)
        .order_by_asc(category::Column::Lft)
        .limit(TEMPLATE_ROWS)
        .all(db)
        .await?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(COLUMNS)?;
    for (index, category) in categories.iter().enumerate() {
        let number = index + 1;
        let name = format!("Example Product {number}");
        let slug = format!("example-product-{number}");
        let description = format!("Description for example product {number}");
        writer.write_record([
            name.as_str(),
            slug.as_str(),
            description.as_str(),
            "10.99",
            "8.99",
            category.name.as_str(),
            "grocery",
            "Example Brand",
            "India",
            "500g",
            "100",
            "true",
            "true",
            "true",
            "true",
        ])?;
    }
    finish(writer)
}

fn product_record(product: &product::Model, category: &str) -> Vec<String> {
    vec![
        product.name.clone(),
        product.slug.clone(),
        product.description.clone(),
        product.price.to_string(),
        product
            .wholesale_price
            .map(|price| price.to_string())
            .unwrap_or_default(),
        category.to_owned(),
        product.product_type.to_string(),
        product.brand.clone(),
        product.origin_country.clone(),
        format!("{}{}", product.weight, product.weight_unit),
        product.stock_quantity.to_string(),
        product.is_available.to_string(),
        product.is_wholesale_available.to_string(),
        product.is_halal.to_string(),
        product.is_vegetarian.to_string(),
    ]
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, ExportError> {
    writer
        .into_inner()
        .map_err(|err| ExportError::Io(err.into_error()))
}
