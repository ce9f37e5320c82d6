//! Bulk product import from CSV or spreadsheet files.
//!
//! Rows are handled one at a time: [`parse_row`] turns a raw row into a
//! [`ProductRow`] without touching the store, [`import_row`] resolves the
//! category and writes the product. The batch driver commits every row on
//! its own and only aggregates the outcomes, so one bad row never aborts
//! the rest of the file.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder, TransactionTrait,
};
use serde::Serialize;
use std::{collections::HashMap, io::Cursor, str::FromStr};
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::products::{self, ProductDraft};
use crate::entities::{
    category,
    product::{self, ProductType, WeightUnit},
};

/// Header of import files, export files and templates alike.
pub const COLUMNS: [&str; 15] = [
    "name",
    "slug",
    "description",
    "price",
    "wholesale_price",
    "category",
    "product_type",
    "brand",
    "origin_country",
    "weight",
    "stock_quantity",
    "is_available",
    "is_wholesale",
    "is_halal",
    "is_vegetarian",
];

static WEIGHT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+(?:[.,][0-9]+)?)\s*([A-Za-z]*)$").unwrap());

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportFormat {
    Csv,
    Excel,
}

impl FromStr for ImportFormat {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ImportFormat::Csv),
            "excel" | "xlsx" | "xls" => Ok(ImportFormat::Excel),
            other => Err(ImportError::UnsupportedFormat(other.to_owned())),
        }
    }
}

/// Failures that concern the whole file rather than a single row.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("File is not valid UTF-8")]
    Encoding,
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to read spreadsheet: {0}")]
    Spreadsheet(String),
    #[error("File has no header row")]
    MissingHeader,
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("{0}")]
    Validation(String),
    #[error("Skipping product - no category specified")]
    MissingCategory,
    #[error("Category not found: {0}")]
    UnknownCategory(String),
    #[error("{0}")]
    Store(String),
}

/// Raw row keyed by lower-cased header name.
pub type ImportRow = HashMap<String, String>;

#[derive(Clone, Debug, PartialEq)]
pub struct ProductRow {
    pub name: String,
    pub slug: Option<String>,
    pub description: String,
    pub price: f64,
    pub wholesale_price: Option<f64>,
    pub category: String,
    pub product_type: ProductType,
    pub brand: String,
    pub origin_country: String,
    pub weight: f64,
    pub weight_unit: WeightUnit,
    pub stock_quantity: i32,
    pub is_available: bool,
    pub is_wholesale: bool,
    pub is_halal: bool,
    pub is_vegetarian: bool,
}

impl ProductRow {
    pub fn into_draft(self, category_id: i32) -> ProductDraft {
        ProductDraft {
            name: self.name,
            slug: self.slug,
            description: self.description,
            category_id,
            product_type: self.product_type,
            price: self.price,
            wholesale_price: self.wholesale_price,
            is_wholesale_available: self.is_wholesale,
            stock_quantity: self.stock_quantity,
            weight: self.weight,
            weight_unit: self.weight_unit,
            brand: self.brand,
            origin_country: self.origin_country,
            is_halal: self.is_halal,
            is_vegetarian: self.is_vegetarian,
            is_available: self.is_available,
            ..ProductDraft::default()
        }
    }
}

#[derive(Debug)]
pub enum RowOutcome {
    Created(product::Model),
    /// A product with the same name was already in the store.
    Skipped(product::Model),
}

#[derive(Debug)]
pub struct RowReport {
    /// 1-based line in the file, the header being line 1.
    pub line: usize,
    pub name: String,
    pub result: Result<RowOutcome, RowError>,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub errors: usize,
    pub rows: Vec<RowReport>,
}

#[derive(Debug, Serialize)]
pub struct RowSummary {
    pub line: usize,
    pub name: String,
    pub status: &'static str,
    pub detail: String,
}

impl ImportReport {
    pub fn record(&mut self, report: RowReport) {
        match &report.result {
            Ok(RowOutcome::Created(_)) => self.imported += 1,
            Ok(RowOutcome::Skipped(_)) => self.skipped += 1,
            Err(_) => self.errors += 1,
        }
        self.rows.push(report);
    }

    pub fn messages(&self) -> Vec<String> {
        let mut messages = Vec::new();
        if self.imported > 0 {
            messages.push(format!("Successfully imported {} products.", self.imported));
        }
        if self.skipped > 0 {
            messages.push(format!("{} products already existed.", self.skipped));
        }
        if self.errors > 0 {
            messages.push(format!("{} products could not be imported.", self.errors));
        }
        messages
    }

    pub fn summaries(&self) -> Vec<RowSummary> {
        self.rows
            .iter()
            .map(|row| {
                let (status, detail) = match &row.result {
                    Ok(RowOutcome::Created(product)) => ("created", product.sku.clone()),
                    Ok(RowOutcome::Skipped(_)) => ("skipped", "Product already exists".to_owned()),
                    Err(err) => ("error", err.to_string()),
                };
                RowSummary {
                    line: row.line,
                    name: row.name.clone(),
                    status,
                    detail,
                }
            })
            .collect()
    }
}

pub fn read_rows(bytes: &[u8], format: ImportFormat) -> Result<Vec<ImportRow>, ImportError> {
    match format {
        ImportFormat::Csv => read_csv(bytes),
        ImportFormat::Excel => read_excel(bytes),
    }
}

fn read_csv(bytes: &[u8]) -> Result<Vec<ImportRow>, ImportError> {
    let text = std::str::from_utf8(bytes).map_err(|_| ImportError::Encoding)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();
    if headers.iter().all(|header| header.is_empty()) {
        return Err(ImportError::MissingHeader);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            headers
                .iter()
                .cloned()
                .zip(record.iter().map(str::to_owned))
                .collect(),
        );
    }
    Ok(rows)
}

fn read_excel(bytes: &[u8]) -> Result<Vec<ImportRow>, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|err| ImportError::Spreadsheet(err.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::MissingHeader)?
        .map_err(|err| ImportError::Spreadsheet(err.to_string()))?;

    let mut lines = range.rows();
    let headers: Vec<String> = lines
        .next()
        .ok_or(ImportError::MissingHeader)?
        .iter()
        .map(|cell| normalize_header(&cell_text(cell)))
        .collect();

    Ok(lines
        .filter(|cells| cells.iter().any(|cell| !matches!(cell, Data::Empty)))
        .map(|cells| {
            headers
                .iter()
                .cloned()
                .zip(cells.iter().map(cell_text))
                .collect()
        })
        .collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

/// Maps one raw row to typed fields, applying the import defaults.
pub fn parse_row(row: &ImportRow) -> Result<ProductRow, RowError> {
    let field = |key: &str| row.get(key).map(|value| value.trim()).unwrap_or("");

    let category = field("category");
    if category.is_empty() {
        return Err(RowError::MissingCategory);
    }
    let name = field("name");
    if name.is_empty() {
        return Err(RowError::Validation("Product name is required".to_owned()));
    }

    let product_type = match field("product_type") {
        "" => ProductType::Grocery,
        value => value.parse().map_err(RowError::Validation)?,
    };
    let (weight, weight_unit) = parse_weight(field("weight"))?;
    let wholesale_price = parse_decimal("wholesale_price", field("wholesale_price"))?;

    Ok(ProductRow {
        name: name.to_owned(),
        slug: Some(field("slug").to_owned()).filter(|slug| !slug.is_empty()),
        description: field("description").to_owned(),
        price: parse_decimal("price", field("price"))?,
        wholesale_price: Some(wholesale_price).filter(|price| *price != 0.0),
        category: category.to_owned(),
        product_type,
        brand: field("brand").to_owned(),
        origin_country: field("origin_country").to_owned(),
        weight,
        weight_unit,
        stock_quantity: parse_quantity("stock_quantity", field("stock_quantity"))?,
        is_available: parse_flag(field("is_available"), true),
        is_wholesale: parse_flag(field("is_wholesale"), false),
        is_halal: parse_flag(field("is_halal"), false),
        is_vegetarian: parse_flag(field("is_vegetarian"), false),
    })
}

/// `500g`, `1.5 kg`, `250`. A bare number is in grams; blank is zero.
pub fn parse_weight(value: &str) -> Result<(f64, WeightUnit), RowError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok((0.0, WeightUnit::Gram));
    }
    let captures = WEIGHT
        .captures(value)
        .ok_or_else(|| RowError::Validation(format!("Invalid weight: {value}")))?;

    let amount = captures[1]
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| RowError::Validation(format!("Invalid weight: {value}")))?;
    let unit = match &captures[2] {
        "" => WeightUnit::Gram,
        unit => unit.parse().map_err(RowError::Validation)?,
    };
    Ok((amount, unit))
}

fn parse_decimal(column: &str, value: &str) -> Result<f64, RowError> {
    if value.is_empty() {
        return Ok(0.0);
    }
    match value.parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => Err(RowError::Validation(format!(
            "Invalid number in {column}: {value}"
        ))),
    }
}

fn parse_quantity(column: &str, value: &str) -> Result<i32, RowError> {
    if value.is_empty() {
        return Ok(0);
    }
    if let Ok(number) = value.parse::<i32>() {
        return Ok(number);
    }
    // Spreadsheets hand integers over as floats.
    match value.parse::<f64>() {
        Ok(number) if number.fract() == 0.0 && number.abs() <= f64::from(i32::MAX) => {
            Ok(number as i32)
        }
        _ => Err(RowError::Validation(format!(
            "Invalid integer in {column}: {value}"
        ))),
    }
}

fn parse_flag(value: &str, default: bool) -> bool {
    if value.is_empty() {
        default
    } else {
        value.eq_ignore_ascii_case("true")
    }
}

/// Case-insensitive exact match, first category by id wins.
pub fn resolve_category<'a>(
    categories: &'a [category::Model],
    name: &str,
) -> Option<&'a category::Model> {
    let wanted = name.trim().to_lowercase();
    categories
        .iter()
        .find(|category| category.name.to_lowercase() == wanted)
}

pub async fn import_row<C: ConnectionTrait>(
    db: &C,
    categories: &[category::Model],
    row: &ImportRow,
) -> Result<RowOutcome, RowError> {
    let parsed = parse_row(row)?;
    let category = resolve_category(categories, &parsed.category)
        .ok_or_else(|| RowError::UnknownCategory(parsed.category.clone()))?;

    match products::get_or_create_by_name(db, parsed.into_draft(category.id)).await {
        Ok((product, true)) => Ok(RowOutcome::Created(product)),
        Ok((product, false)) => Ok(RowOutcome::Skipped(product)),
        Err(err) => Err(RowError::Store(err.to_string())),
    }
}

pub async fn import_products(
    db: &DatabaseConnection,
    rows: &[ImportRow],
) -> Result<ImportReport, ImportError> {
    let categories = category::Entity::find()
        .order_by_asc(category::Column::Id)
        .all(db)
        .await?;

    let mut report = ImportReport::default();
    for (index, row) in rows.iter().enumerate() {
        let line = index + 2;
        let name = row.get("name").map(|name| name.trim()).unwrap_or("").to_owned();
        let result = import_in_transaction(db, &categories, row).await;

        match &result {
            Ok(RowOutcome::Created(product)) => {
                info!(line, name = %product.name, sku = %product.sku, "Created product")
            }
            Ok(RowOutcome::Skipped(product)) => {
                info!(line, name = %product.name, "Product already exists")
            }
            Err(err) => warn!(line, name = %name, error = %err, "Row not imported"),
        }
        report.record(RowReport { line, name, result });
    }

    Ok(report)
}

pub async fn import_file(
    db: &DatabaseConnection,
    bytes: &[u8],
    format: ImportFormat,
) -> Result<ImportReport, ImportError> {
    let rows = read_rows(bytes, format)?;
    import_products(db, &rows).await
}

async fn import_in_transaction(
    db: &DatabaseConnection,
    categories: &[category::Model],
    row: &ImportRow,
) -> Result<RowOutcome, RowError> {
    let store_error = |err: DbErr| RowError::Store(err.to_string());

    let txn = db.begin().await.map_err(store_error)?;
    match import_row(&txn, categories, row).await {
        Ok(outcome) => {
            txn.commit().await.map_err(store_error)?;
            Ok(outcome)
        }
        Err(err) => {
            let _ = txn.rollback().await;
            Err(err)
        }
    }
}
