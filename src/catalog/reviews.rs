use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};

use crate::catalog::{icontains, CatalogError};
use crate::entities::{product, product_review, user};

#[derive(Clone, Debug, Default)]
pub struct NewReview {
    pub product_id: i32,
    pub user_id: i32,
    pub rating: i32,
    pub title: String,
    pub comment: String,
    pub is_approved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ReviewChanges {
    pub rating: Option<i32>,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub is_approved: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct ReviewFilter {
    pub query: Option<String>,
    pub rating: Option<i32>,
    pub is_approved: Option<bool>,
}

pub async fn create_review<C: ConnectionTrait>(
    db: &C,
    new: NewReview,
) -> Result<product_review::Model, CatalogError> {
    check_rating(new.rating)?;

    product::Entity::find_by_id(new.product_id)
        .one(db)
        .await?
        .ok_or_else(|| CatalogError::NotFound(format!("Product with id {}", new.product_id)))?;
    user::Entity::find_by_id(new.user_id)
        .one(db)
        .await?
        .ok_or_else(|| CatalogError::NotFound(format!("User with id {}", new.user_id)))?;

    let existing = product_review::Entity::find()
        .filter(product_review::Column::ProductId.eq(new.product_id))
        .filter(product_review::Column::UserId.eq(new.user_id))
        .count(db)
        .await?;
    if existing > 0 {
        return Err(CatalogError::UniquenessViolation(format!(
            "User {} already reviewed product {}",
            new.user_id, new.product_id
        )));
    }

    Ok(product_review::ActiveModel {
        product_id: Set(new.product_id),
        user_id: Set(new.user_id),
        rating: Set(new.rating),
        title: Set(new.title),
        comment: Set(new.comment),
        is_approved: Set(new.is_approved),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

pub async fn update_review<C: ConnectionTrait>(
    db: &C,
    id: i32,
    changes: ReviewChanges,
) -> Result<product_review::Model, CatalogError> {
    let review = product_review::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| CatalogError::NotFound(format!("Review with id {id}")))?;

    let mut active: product_review::ActiveModel = review.into();
    if let Some(rating) = changes.rating {
        check_rating(rating)?;
        active.rating = Set(rating);
    }
    if let Some(title) = changes.title {
        active.title = Set(title);
    }
    if let Some(comment) = changes.comment {
        active.comment = Set(comment);
    }
    if let Some(is_approved) = changes.is_approved {
        active.is_approved = Set(is_approved);
    }

    Ok(active.update(db).await?)
}

pub async fn delete_review<C: ConnectionTrait>(db: &C, id: i32) -> Result<(), CatalogError> {
    let result = product_review::Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(CatalogError::NotFound(format!("Review with id {id}")));
    }
    Ok(())
}

/// Reviews with their product and author, newest first. The free-text query
/// searches product name, username and title.
pub async fn list_reviews<C: ConnectionTrait>(
    db: &C,
    filter: ReviewFilter,
) -> Result<Vec<(product_review::Model, Option<product::Model>)>, CatalogError> {
    let mut select = product_review::Entity::find()
        .join(JoinType::InnerJoin, product_review::Relation::User.def());

    if let Some(query) = filter.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        select = select.filter(
            Condition::any()
                .add(icontains((product::Entity, product::Column::Name), query))
                .add(icontains((user::Entity, user::Column::Username), query))
                .add(icontains(
                    (product_review::Entity, product_review::Column::Title),
                    query,
                )),
        );
    }
    if let Some(rating) = filter.rating {
        select = select.filter(product_review::Column::Rating.eq(rating));
    }
    if let Some(is_approved) = filter.is_approved {
        select = select.filter(product_review::Column::IsApproved.eq(is_approved));
    }

    Ok(select
        .find_also_related(product::Entity)
        .order_by_desc(product_review::Column::CreatedAt)
        .order_by_desc(product_review::Column::Id)
        .all(db)
        .await?)
}

/// Approved reviews of a product and their mean rating.
pub async fn approved_for<C: ConnectionTrait>(
    db: &C,
    product_id: i32,
) -> Result<(Vec<product_review::Model>, Option<f64>), CatalogError> {
    let reviews = product_review::Entity::find()
        .filter(product_review::Column::ProductId.eq(product_id))
        .filter(product_review::Column::IsApproved.eq(true))
        .order_by_desc(product_review::Column::CreatedAt)
        .all(db)
        .await?;

    let average = if reviews.is_empty() {
        None
    } else {
        let total: i32 = reviews.iter().map(|review| review.rating).sum();
        Some(f64::from(total) / reviews.len() as f64)
    };
    Ok((reviews, average))
}

fn check_rating(rating: i32) -> Result<(), CatalogError> {
    if !(1..=5).contains(&rating) {
        return Err(CatalogError::Validation(format!(
            "Rating must be between 1 and 5, got {rating}"
        )));
    }
    Ok(())
}
