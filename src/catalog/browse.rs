//! Query composition for the storefront: search, category scope, price
//! range, ordering and fixed-size pages over available products.

use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select,
};
use serde::Serialize;

use crate::catalog::icontains;
use crate::entities::{category, product};

pub const PAGE_SIZE: u64 = 12;
pub const HOME_SECTION_SIZE: u64 = 8;
pub const RELATED_PRODUCTS: u64 = 4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortBy {
    #[default]
    Name,
    PriceLow,
    PriceHigh,
    Newest,
}

impl SortBy {
    /// Unknown keys fall back to name order.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("price_low") => SortBy::PriceLow,
            Some("price_high") => SortBy::PriceHigh,
            Some("newest") => SortBy::Newest,
            _ => SortBy::Name,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ProductFilter {
    pub query: Option<String>,
    /// Category ids in scope, usually a node and its descendants.
    pub category_ids: Option<Vec<i32>>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort_by: SortBy,
}

pub fn available_products(filter: &ProductFilter) -> Select<product::Entity> {
    let mut select = product::Entity::find().filter(product::Column::IsAvailable.eq(true));

    if let Some(query) = filter.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        select = select
            .join(JoinType::InnerJoin, product::Relation::Category.def())
            .filter(
                Condition::any()
                    .add(icontains((product::Entity, product::Column::Name), query))
                    .add(icontains((product::Entity, product::Column::Description), query))
                    .add(icontains((product::Entity, product::Column::Brand), query))
                    .add(icontains((category::Entity, category::Column::Name), query)),
            );
    }
    if let Some(ids) = &filter.category_ids {
        select = select.filter(product::Column::CategoryId.is_in(ids.clone()));
    }
    if let Some(min_price) = filter.min_price {
        select = select.filter(product::Column::Price.gte(min_price));
    }
    if let Some(max_price) = filter.max_price {
        select = select.filter(product::Column::Price.lte(max_price));
    }

    let select = match filter.sort_by {
        SortBy::Name => select.order_by_asc(product::Column::Name),
        SortBy::PriceLow => select.order_by_asc(product::Column::Price),
        SortBy::PriceHigh => select.order_by_desc(product::Column::Price),
        SortBy::Newest => select.order_by_desc(product::Column::CreatedAt),
    };
    // Tie-break so pages never overlap.
    select.order_by_asc(product::Column::Id)
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
    pub page_size: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
            page_size: self.page_size,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}

/// An empty listing still has one (empty) page.
pub fn page_count(total: u64, page_size: u64) -> u64 {
    total.div_ceil(page_size.max(1)).max(1)
}

/// 1-based page for the raw `page` parameter. Missing or non-numeric
/// values give the first page; out-of-range numbers clamp to the nearest
/// valid page.
pub fn clamp_page(requested: Option<&str>, num_pages: u64) -> u64 {
    match requested.map(str::trim).and_then(|value| value.parse::<i64>().ok()) {
        Some(number) if number < 1 => 1,
        Some(number) => (number as u64).min(num_pages),
        None => 1,
    }
}

pub async fn paginate<C: ConnectionTrait>(
    db: &C,
    select: Select<product::Entity>,
    page_size: u64,
    requested: Option<&str>,
) -> Result<Page<product::Model>, DbErr> {
    let paginator = select.paginate(db, page_size);
    let total = paginator.num_items().await?;
    let num_pages = page_count(total, page_size);
    let number = clamp_page(requested, num_pages);
    let items = paginator.fetch_page(number - 1).await?;

    Ok(Page {
        items,
        number,
        num_pages,
        total,
        page_size,
        has_next: number < num_pages,
        has_previous: number > 1,
    })
}

pub async fn featured<C: ConnectionTrait>(db: &C) -> Result<Vec<product::Model>, DbErr> {
    product::Entity::find()
        .filter(product::Column::IsFeatured.eq(true))
        .filter(product::Column::IsAvailable.eq(true))
        .order_by_asc(product::Column::Id)
        .limit(HOME_SECTION_SIZE)
        .all(db)
        .await
}

pub async fn bestsellers<C: ConnectionTrait>(db: &C) -> Result<Vec<product::Model>, DbErr> {
    product::Entity::find()
        .filter(product::Column::IsBestseller.eq(true))
        .filter(product::Column::IsAvailable.eq(true))
        .order_by_asc(product::Column::Id)
        .limit(HOME_SECTION_SIZE)
        .all(db)
        .await
}

/// Other available products from the same category.
pub async fn related<C: ConnectionTrait>(
    db: &C,
    product: &product::Model,
) -> Result<Vec<product::Model>, DbErr> {
    product::Entity::find()
        .filter(product::Column::CategoryId.eq(product.category_id))
        .filter(product::Column::IsAvailable.eq(true))
        .filter(product::Column::Id.ne(product.id))
        .order_by_asc(product::Column::Id)
        .limit(RELATED_PRODUCTS)
        .all(db)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up_and_never_hits_zero() {
        assert_eq!(page_count(25, PAGE_SIZE), 3);
        assert_eq!(page_count(24, PAGE_SIZE), 2);
        assert_eq!(page_count(1, PAGE_SIZE), 1);
        assert_eq!(page_count(0, PAGE_SIZE), 1);
    }

    #[test]
    fn clamp_page_keeps_requests_in_range() {
        assert_eq!(clamp_page(Some("2"), 3), 2);
        assert_eq!(clamp_page(Some("99"), 3), 3);
        assert_eq!(clamp_page(Some("0"), 3), 1);
        assert_eq!(clamp_page(Some("-4"), 3), 1);
        assert_eq!(clamp_page(Some("abc"), 3), 1);
        assert_eq!(clamp_page(Some(" 3 "), 3), 3);
        assert_eq!(clamp_page(None, 3), 1);
    }

    #[test]
    fn sort_keys_fall_back_to_name() {
        assert_eq!(SortBy::parse(Some("price_low")), SortBy::PriceLow);
        assert_eq!(SortBy::parse(Some("price_high")), SortBy::PriceHigh);
        assert_eq!(SortBy::parse(Some("newest")), SortBy::Newest);
        assert_eq!(SortBy::parse(Some("popularity")), SortBy::Name);
        assert_eq!(SortBy::parse(None), SortBy::Name);
    }
}
