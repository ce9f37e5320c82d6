use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, ConnectionTrait, PaginatorTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::entities::category::{self, Entity as Category};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub category_id: i32,
    pub product_type: ProductType,

    pub price: f64,
    #[sea_orm(nullable)]
    pub wholesale_price: Option<f64>,
    #[sea_orm(nullable)]
    pub cost_price: Option<f64>,
    #[sea_orm(default = false)]
    pub is_wholesale_available: bool,
    pub wholesale_min_quantity: i32,

    #[sea_orm(unique)]
    pub sku: String,
    pub stock_quantity: i32,
    pub low_stock_threshold: i32,
    pub weight: f64,
    pub weight_unit: WeightUnit,

    pub brand: String,
    pub origin_country: String,
    #[sea_orm(default = false)]
    pub is_halal: bool,
    #[sea_orm(default = false)]
    pub is_vegetarian: bool,
    #[sea_orm(nullable)]
    pub expiry_date: Option<Date>,
    pub batch_number: String,

    #[sea_orm(default = true)]
    pub is_available: bool,
    #[sea_orm(default = false)]
    pub is_featured: bool,
    #[sea_orm(default = false)]
    pub is_bestseller: bool,
    #[sea_orm(nullable)]
    pub main_image: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Model {
    pub fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }

    pub fn low_stock(&self) -> bool {
        self.stock_quantity > 0 && self.stock_quantity <= self.low_stock_threshold
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Category",
        from = "crate::entities::product::Column::CategoryId",
        to = "crate::entities::category::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade",
    )]
    Category,
    #[sea_orm(has_many = "crate::entities::product_image::Entity")]
    ProductImage,
    #[sea_orm(has_many = "crate::entities::product_review::Entity")]
    ProductReview,
}

impl Related<crate::entities::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<crate::entities::product_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductImage.def()
    }
}

impl Related<crate::entities::product_review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductReview.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();

        if insert {
            if self.created_at.is_not_set() {
                self.created_at = Set(now);
            }

            let missing_sku = match &self.sku {
                ActiveValue::Set(sku) | ActiveValue::Unchanged(sku) => sku.trim().is_empty(),
                ActiveValue::NotSet => true,
            };
            if missing_sku {
                let category_id = match &self.category_id {
                    ActiveValue::Set(id) | ActiveValue::Unchanged(id) => *id,
                    ActiveValue::NotSet => {
                        return Err(DbErr::Custom("Product has no category".to_owned()))
                    }
                };
                let category = category::Entity::find_by_id(category_id)
                    .one(db)
                    .await?
                    .ok_or_else(|| {
                        DbErr::RecordNotFound(format!("No category with {category_id} id"))
                    })?;
                let name = match &self.name {
                    ActiveValue::Set(name) | ActiveValue::Unchanged(name) => name.clone(),
                    ActiveValue::NotSet => String::new(),
                };

                let sku = next_free_sku(db, &sku_prefix(&category.name, &name)).await?;
                self.sku = Set(sku);
            }
        }

        self.updated_at = Set(now);
        Ok(self)
    }
}

/// Upper-cased first three characters of the category name followed by
/// those of the product name. Shorter names contribute what they have.
pub fn sku_prefix(category_name: &str, product_name: &str) -> String {
    let head = |value: &str| value.chars().take(3).collect::<String>().to_uppercase();
    format!("{}{}", head(category_name), head(product_name))
}

/// First `{prefix}{counter:03}` not already taken, counting up from 1.
pub async fn next_free_sku<C: ConnectionTrait>(db: &C, prefix: &str) -> Result<String, DbErr> {
    let mut counter: u32 = 1;
    loop {
        let candidate = format!("{prefix}{counter:03}");
        let taken = Entity::find()
            .filter(Column::Sku.eq(candidate.as_str()))
            .count(db)
            .await?;
        if taken == 0 {
            return Ok(candidate);
        }
        counter += 1;
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(
    enum_name = "product_type_enum",
    db_type = "String(StringLen::N(32))",
    rs_type = "String"
)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    #[default]
    #[sea_orm(string_value = "grocery")]
    Grocery,
    #[sea_orm(string_value = "fresh")]
    Fresh,
    #[sea_orm(string_value = "frozen")]
    Frozen,
    #[sea_orm(string_value = "beverage")]
    Beverage,
    #[sea_orm(string_value = "snack")]
    Snack,
    #[sea_orm(string_value = "household")]
    Household,
    #[sea_orm(string_value = "personal_care")]
    PersonalCare,
}

impl FromStr for ProductType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "grocery" => Ok(Self::Grocery),
            "fresh" => Ok(Self::Fresh),
            "frozen" => Ok(Self::Frozen),
            "beverage" => Ok(Self::Beverage),
            "snack" => Ok(Self::Snack),
            "household" => Ok(Self::Household),
            "personal_care" => Ok(Self::PersonalCare),
            other => Err(format!("Invalid product type: {}", other)),
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Self::Grocery => "grocery",
            Self::Fresh => "fresh",
            Self::Frozen => "frozen",
            Self::Beverage => "beverage",
            Self::Snack => "snack",
            Self::Household => "household",
            Self::PersonalCare => "personal_care",
        };
        f.write_str(value)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(
    enum_name = "weight_unit_enum",
    db_type = "String(StringLen::N(8))",
    rs_type = "String"
)]
pub enum WeightUnit {
    #[default]
    #[sea_orm(string_value = "g")]
    #[serde(rename = "g")]
    Gram,
    #[sea_orm(string_value = "kg")]
    #[serde(rename = "kg")]
    Kilogram,
    #[sea_orm(string_value = "ml")]
    #[serde(rename = "ml")]
    Millilitre,
    #[sea_orm(string_value = "l")]
    #[serde(rename = "l")]
    Litre,
    #[sea_orm(string_value = "pcs")]
    #[serde(rename = "pcs")]
    Piece,
}

impl FromStr for WeightUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "g" | "gr" | "gram" | "grams" => Ok(Self::Gram),
            "kg" | "kilogram" | "kilograms" => Ok(Self::Kilogram),
            "ml" => Ok(Self::Millilitre),
            "l" | "ltr" | "litre" | "liter" => Ok(Self::Litre),
            "pc" | "pcs" | "piece" | "pieces" => Ok(Self::Piece),
            other => Err(format!("Invalid weight unit: {}", other)),
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Self::Gram => "g",
            Self::Kilogram => "kg",
            Self::Millilitre => "ml",
            Self::Litre => "l",
            Self::Piece => "pcs",
        };
        f.write_str(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sku_prefix_takes_three_characters_of_each_name() {
        assert_eq!(sku_prefix("Snacks", "Masala Chips"), "SNAMAS");
        assert_eq!(sku_prefix("rice & flour", "basmati"), "RICBAS");
    }

    #[test]
    fn sku_prefix_degrades_for_short_names() {
        assert_eq!(sku_prefix("Ab", "x"), "ABX");
        assert_eq!(sku_prefix("", "Tea"), "TEA");
    }

    #[test]
    fn sku_prefix_counts_characters_not_bytes() {
        assert_eq!(sku_prefix("Épices", "Ñame"), "ÉPIÑAM");
    }

    #[test]
    fn stock_flags_follow_threshold() {
        let mut product = Model {
            id: 1,
            name: "Basmati".to_owned(),
            slug: "basmati".to_owned(),
            description: String::new(),
            category_id: 1,
            product_type: ProductType::Grocery,
            price: 4.5,
            wholesale_price: None,
            cost_price: None,
            is_wholesale_available: false,
            wholesale_min_quantity: 0,
            sku: "RICBAS001".to_owned(),
            stock_quantity: 0,
            low_stock_threshold: 10,
            weight: 1.0,
            weight_unit: WeightUnit::Kilogram,
            brand: String::new(),
            origin_country: String::new(),
            is_halal: false,
            is_vegetarian: true,
            expiry_date: None,
            batch_number: String::new(),
            is_available: true,
            is_featured: false,
            is_bestseller: false,
            main_image: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(!product.in_stock());
        assert!(!product.low_stock());

        product.stock_quantity = 10;
        assert!(product.in_stock());
        assert!(product.low_stock());

        product.stock_quantity = 11;
        assert!(!product.low_stock());
    }
}
