//! The default storefront taxonomy.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};
use std::collections::VecDeque;
use tracing::info;

use crate::catalog::categories::{self, NewCategory};
use crate::catalog::{slugify, CatalogError};
use crate::entities::category;

pub struct SeedNode {
    pub name: &'static str,
    pub children: &'static [SeedNode],
}

const fn leaf(name: &'static str) -> SeedNode {
    SeedNode { name, children: &[] }
}

const fn node(name: &'static str, children: &'static [SeedNode]) -> SeedNode {
    SeedNode { name, children }
}

pub static CATEGORY_TREE: &[SeedNode] = &[
    node(
        "Indian",
        &[
            node(
                "Rice & Flour",
                &[
                    leaf("Basmati Rice"),
                    leaf("South Indian Rice"),
                    leaf("Poha, Mamra & Vermicelli"),
                    leaf("Chapati Atta (Indian Flour)"),
                    leaf("Flour Varieties"),
                ],
            ),
            node(
                "Lentils & Spices",
                &[
                    leaf("Lentils"),
                    leaf("Powdered Spices"),
                    leaf("Whole Spices"),
                    leaf("Mixed Spices"),
                ],
            ),
            node(
                "Snacks & Sweets",
                &[
                    leaf("Snacks"),
                    leaf("Biscuits, Cookies and Cake Rusks"),
                    leaf("Sweets"),
                    leaf("Tea & Coffee"),
                ],
            ),
            node(
                "Condiments",
                &[
                    leaf("Pickles"),
                    leaf("Chutneys"),
                    leaf("Sauces & Pastes - Indian"),
                    leaf("Mango Pulp"),
                    leaf("Juice"),
                ],
            ),
            node(
                "Essentials",
                &[
                    leaf("Paneer & Milk Products"),
                    leaf("Ghee & Oils"),
                    leaf("Tamarind"),
                    leaf("Papad"),
                    leaf("Coconut Products"),
                    leaf("Jaggery Products"),
                ],
            ),
            node(
                "Ready to Eat",
                &[
                    leaf("Instant Mixes"),
                    leaf("Ready to Eat"),
                    leaf("Rotis and Naan"),
                    leaf("Instant Noodles - Indian"),
                    leaf("Canned Vegetables, Fish & Meat"),
                ],
            ),
            node(
                "Personal & Home Care",
                &[leaf("Personal Care & Nutrition"), leaf("Home Care")],
            ),
        ],
    ),
    node(
        "Asian",
        &[
            node(
                "Sauces & Pastes",
                &[
                    leaf("Soy Sauce"),
                    leaf("Chilli Sauces - Sriracha & More"),
                    leaf("Ready Curry & Pastes"),
                    leaf("Sauces & Pastes - Asian"),
                    leaf("Vinegar"),
                ],
            ),
            node(
                "Noodles & Soups",
                &[
                    leaf("Instant Noodles - Asian"),
                    leaf("Rice Noodles & Vermicelli (Glass Noodles)"),
                ],
            ),
            node(
                "Rice & Flour",
                &[
                    leaf("Jasmine, Sticky & Sushi Rice"),
                    leaf("Rice Paper"),
                    leaf("Flour & Flour Products"),
                ],
            ),
            node(
                "Spices & Seasonings",
                &[
                    leaf("Greeny Leaves"),
                    leaf("Spice Mixes in Oil"),
                    leaf("Spices paste"),
                ],
            ),
            node("Essentials", &[leaf("Cooking Oils"), leaf("Peanut Butter")]),
            node("Snacks & Sweets", &[leaf("Snacks, Chips & Crackers")]),
        ],
    ),
    node(
        "Frozen",
        &[
            leaf("Bangladeshi Snacks"),
            leaf("Indian Snacks"),
            leaf("Roti/Parathas/Naan"),
            leaf("Asian Snacks"),
            leaf("Fish & Meat"),
            leaf("Vegetables"),
        ],
    ),
    leaf("Vegetables"),
    node("Homemade Snacks", &[leaf("Sweets Variant"), leaf("Spicy Snacks")]),
];

#[derive(Debug, Default)]
pub struct SeedReport {
    pub cleared: u64,
    pub created: usize,
}

/// Replaces every category with [`CATEGORY_TREE`].
///
/// Products filed under the old categories go with them. Nodes are created
/// level by level, so a name used twice keeps its plain form on the
/// shallower node and the deeper one becomes `"{name} ({parent})"`.
pub async fn populate_categories<C: ConnectionTrait>(db: &C) -> Result<SeedReport, CatalogError> {
    let mut report = SeedReport::default();

    let roots = category::Entity::find()
        .filter(category::Column::ParentId.is_null())
        .all(db)
        .await?;
    for root in roots {
        report.cleared += categories::delete_category(db, root.id).await?;
    }
    info!(cleared = report.cleared, "Cleared existing categories");

    let mut pending: VecDeque<(&SeedNode, Option<category::Model>)> =
        CATEGORY_TREE.iter().map(|seed| (seed, None)).collect();

    while let Some((seed, parent)) = pending.pop_front() {
        let name = available_name(db, seed.name, parent.as_ref()).await?;
        let slug = categories::unique_slug(db, &slugify(seed.name)).await?;

        let created = categories::create_category(
            db,
            NewCategory {
                name,
                slug: Some(slug),
                parent_id: parent.as_ref().map(|parent| parent.id),
                is_active: true,
                ..NewCategory::default()
            },
        )
        .await?;
        info!(name = %created.name, level = created.level, "Created category");
        report.created += 1;

        pending.extend(seed.children.iter().map(|child| (child, Some(created.clone()))));
    }

    Ok(report)
}

async fn available_name<C: ConnectionTrait>(
    db: &C,
    name: &str,
    parent: Option<&category::Model>,
) -> Result<String, CatalogError> {
    if !name_taken(db, name).await? {
        return Ok(name.to_owned());
    }
    let base = match parent {
        Some(parent) => format!("{name} ({})", parent.name),
        None => name.to_owned(),
    };
    if !name_taken(db, &base).await? {
        return Ok(base);
    }

    let mut counter = 2;
    loop {
        let candidate = format!("{base} {counter}");
        if !name_taken(db, &candidate).await? {
            return Ok(candidate);
        }
        counter += 1;
    }
}

async fn name_taken<C: ConnectionTrait>(db: &C, name: &str) -> Result<bool, CatalogError> {
    let count = category::Entity::find()
        .filter(category::Column::Name.eq(name))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Indented outline of categories given in display order.
pub fn outline(categories: &[category::Model]) -> Vec<String> {
    categories
        .iter()
        .map(|category| match category.level {
            0 => format!("• {}", category.name),
            level => format!("{}└── {}", " ".repeat(level as usize * 4 - 2), category.name),
        })
        .collect()
}

pub fn seed_size() -> usize {
    fn count(nodes: &[SeedNode]) -> usize {
        nodes.iter().map(|node| 1 + count(node.children)).sum()
    }
    count(CATEGORY_TREE)
}
