use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use tracing::debug;

use crate::catalog::{products, slugify, tree::CategoryTree, tree::TreePosition, CatalogError};
use crate::entities::{category, product};

#[derive(Clone, Debug, Default)]
pub struct NewCategory {
    pub name: String,
    pub slug: Option<String>,
    pub parent_id: Option<i32>,
    pub description: String,
    pub image: Option<String>,
    pub is_active: bool,
}

#[derive(Clone, Debug, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    /// `Some(None)` moves the node to the top level.
    pub parent_id: Option<Option<i32>>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
}

pub async fn find<C: ConnectionTrait>(db: &C, id: i32) -> Result<category::Model, CatalogError> {
    category::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| CatalogError::NotFound(format!("Category with id {id}")))
}

pub async fn find_by_slug<C: ConnectionTrait>(
    db: &C,
    slug: &str,
) -> Result<category::Model, CatalogError> {
    category::Entity::find()
        .filter(category::Column::Slug.eq(slug))
        .one(db)
        .await?
        .ok_or_else(|| CatalogError::NotFound(format!("Category '{slug}'")))
}

pub async fn create_category<C: ConnectionTrait>(
    db: &C,
    new: NewCategory,
) -> Result<category::Model, CatalogError> {
    let name = new.name.trim().to_owned();
    if name.is_empty() {
        return Err(CatalogError::Validation("Category name is required".to_owned()));
    }
    let slug = new
        .slug
        .map(|slug| slug.trim().to_owned())
        .filter(|slug| !slug.is_empty())
        .unwrap_or_else(|| slugify(&name));
    if slug.is_empty() {
        return Err(CatalogError::Validation(format!(
            "Cannot derive a slug from '{name}'"
        )));
    }

    ensure_unique(db, &name, &slug, None).await?;
    if let Some(parent_id) = new.parent_id {
        find(db, parent_id).await?;
    }

    let created = category::ActiveModel {
        name: Set(name),
        slug: Set(slug),
        parent_id: Set(new.parent_id),
        description: Set(new.description),
        image: Set(new.image),
        is_active: Set(new.is_active),
        tree_id: Set(0),
        lft: Set(0),
        rgt: Set(0),
        level: Set(0),
        ..Default::default()
    }
    .insert(db)
    .await?;

    rebuild_tree(db).await?;
    find(db, created.id).await
}

pub async fn update_category<C: ConnectionTrait>(
    db: &C,
    id: i32,
    changes: CategoryChanges,
) -> Result<category::Model, CatalogError> {
    let current = find(db, id).await?;

    let name = changes
        .name
        .map(|name| name.trim().to_owned())
        .unwrap_or_else(|| current.name.clone());
    if name.is_empty() {
        return Err(CatalogError::Validation("Category name is required".to_owned()));
    }
    let slug = changes
        .slug
        .map(|slug| slug.trim().to_owned())
        .unwrap_or_else(|| current.slug.clone());
    if slug.is_empty() {
        return Err(CatalogError::Validation("Category slug is required".to_owned()));
    }
    ensure_unique(db, &name, &slug, Some(id)).await?;

    let restructured = match changes.parent_id {
        Some(Some(parent_id)) if Some(parent_id) != current.parent_id => {
            find(db, parent_id).await?;
            let tree = load_tree(db).await?;
            if tree.is_within(parent_id, id) {
                return Err(CatalogError::TreeCycle(format!(
                    "Category {id} cannot be moved under itself or one of its descendants"
                )));
            }
            true
        }
        Some(None) => current.parent_id.is_some(),
        _ => false,
    };
    let renamed = name != current.name;

    let mut active: category::ActiveModel = current.into();
    active.name = Set(name);
    active.slug = Set(slug);
    if let Some(parent_id) = changes.parent_id {
        active.parent_id = Set(parent_id);
    }
    if let Some(description) = changes.description {
        active.description = Set(description);
    }
    if let Some(image) = changes.image {
        active.image = Set(Some(image));
    }
    if let Some(is_active) = changes.is_active {
        active.is_active = Set(is_active);
    }
    active.update(db).await?;

    // Sibling order follows names, so a rename can move the node too.
    if restructured || renamed {
        rebuild_tree(db).await?;
    }
    find(db, id).await
}

/// Deletes the node, everything below it, and the products filed there.
/// Returns the number of categories removed.
pub async fn delete_category<C: ConnectionTrait>(db: &C, id: i32) -> Result<u64, CatalogError> {
    let node = find(db, id).await?;
    let subtree: Vec<i32> = descendants(db, &node, true)
        .await?
        .into_iter()
        .map(|model| model.id)
        .collect();

    let product_ids: Vec<i32> = product::Entity::find()
        .filter(product::Column::CategoryId.is_in(subtree.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|model| model.id)
        .collect();
    products::delete_products(db, &product_ids).await?;

    let deleted = category::Entity::delete_many()
        .filter(category::Column::Id.is_in(subtree))
        .exec(db)
        .await?
        .rows_affected;

    rebuild_tree(db).await?;
    debug!(category = id, deleted, products = product_ids.len(), "Deleted category subtree");
    Ok(deleted)
}

/// Nodes below `node` in display order, optionally starting with `node`.
pub async fn descendants<C: ConnectionTrait>(
    db: &C,
    node: &category::Model,
    include_self: bool,
) -> Result<Vec<category::Model>, CatalogError> {
    let (lower, upper) = if include_self {
        (
            category::Column::Lft.gte(node.lft),
            category::Column::Rgt.lte(node.rgt),
        )
    } else {
        (
            category::Column::Lft.gt(node.lft),
            category::Column::Rgt.lt(node.rgt),
        )
    };

    Ok(category::Entity::find()
        .filter(category::Column::TreeId.eq(node.tree_id))
        .filter(lower)
        .filter(upper)
        .order_by_asc(category::Column::Lft)
        .all(db)
        .await?)
}

pub async fn children<C: ConnectionTrait>(
    db: &C,
    node: &category::Model,
) -> Result<Vec<category::Model>, CatalogError> {
    Ok(category::Entity::find()
        .filter(category::Column::ParentId.eq(node.id))
        .order_by_asc(category::Column::Lft)
        .all(db)
        .await?)
}

/// Root-first path down to `node`.
pub async fn ancestors<C: ConnectionTrait>(
    db: &C,
    node: &category::Model,
    include_self: bool,
) -> Result<Vec<category::Model>, CatalogError> {
    let (lower, upper) = if include_self {
        (
            category::Column::Lft.lte(node.lft),
            category::Column::Rgt.gte(node.rgt),
        )
    } else {
        (
            category::Column::Lft.lt(node.lft),
            category::Column::Rgt.gt(node.rgt),
        )
    };

    Ok(category::Entity::find()
        .filter(category::Column::TreeId.eq(node.tree_id))
        .filter(lower)
        .filter(upper)
        .order_by_asc(category::Column::Lft)
        .all(db)
        .await?)
}

/// Active top-level categories, the storefront navigation.
pub async fn top_level<C: ConnectionTrait>(db: &C) -> Result<Vec<category::Model>, CatalogError> {
    Ok(category::Entity::find()
        .filter(category::Column::Level.eq(0))
        .filter(category::Column::IsActive.eq(true))
        .order_by_asc(category::Column::TreeId)
        .all(db)
        .await?)
}

/// Every category in display order.
pub async fn list_tree<C: ConnectionTrait>(
    db: &C,
    condition: Condition,
) -> Result<Vec<category::Model>, CatalogError> {
    Ok(category::Entity::find()
        .filter(condition)
        .order_by_asc(category::Column::TreeId)
        .order_by_asc(category::Column::Lft)
        .all(db)
        .await?)
}

pub async fn load_tree<C: ConnectionTrait>(db: &C) -> Result<CategoryTree, CatalogError> {
    let models = category::Entity::find().all(db).await?;
    Ok(CategoryTree::from_models(&models)?)
}

/// Renumbers every node from the parent relation and stores the positions
/// that changed.
pub async fn rebuild_tree<C: ConnectionTrait>(db: &C) -> Result<CategoryTree, CatalogError> {
    let models = category::Entity::find().all(db).await?;
    let tree = CategoryTree::from_models(&models)?;

    let mut updated = 0;
    for model in models {
        let Some(position) = tree.position(model.id) else {
            continue;
        };
        if position == TreePosition::of(&model) {
            continue;
        }
        let mut active: category::ActiveModel = model.into();
        active.tree_id = Set(position.tree_id);
        active.lft = Set(position.lft);
        active.rgt = Set(position.rgt);
        active.level = Set(position.level);
        active.update(db).await?;
        updated += 1;
    }
    debug!(nodes = tree.len(), updated, "Rebuilt category tree");

    Ok(tree)
}

/// `base`, or `base-1`, `base-2`, ... whichever is free first.
pub async fn unique_slug<C: ConnectionTrait>(db: &C, base: &str) -> Result<String, CatalogError> {
    let mut slug = base.to_owned();
    let mut counter = 1;
    while category::Entity::find()
        .filter(category::Column::Slug.eq(slug.as_str()))
        .count(db)
        .await?
        > 0
    {
        slug = format!("{base}-{counter}");
        counter += 1;
    }
    Ok(slug)
}

async fn ensure_unique<C: ConnectionTrait>(
    db: &C,
    name: &str,
    slug: &str,
    except: Option<i32>,
) -> Result<(), CatalogError> {
    let mut clash = category::Entity::find().filter(
        Condition::any()
            .add(category::Column::Name.eq(name))
            .add(category::Column::Slug.eq(slug)),
    );
    if let Some(id) = except {
        clash = clash.filter(category::Column::Id.ne(id));
    }

    match clash.one(db).await? {
        Some(existing) if existing.name == name => Err(CatalogError::UniquenessViolation(
            format!("Category with name '{name}' already exists"),
        )),
        Some(_) => Err(CatalogError::UniquenessViolation(format!(
            "Category with slug '{slug}' already exists"
        ))),
        None => Ok(()),
    }
}
