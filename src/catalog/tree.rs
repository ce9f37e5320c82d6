//! In-memory arena of the category forest.
//!
//! Positions follow the nested-set layout: every node gets a `(lft, rgt)`
//! pair that encloses the pairs of all of its descendants, numbered per
//! root (`tree_id`). Roots and siblings are ordered by name, so the layout
//! also gives the display order of the whole taxonomy.

use std::collections::HashMap;
use thiserror::Error;

use crate::entities::category;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreePosition {
    pub tree_id: i32,
    pub lft: i32,
    pub rgt: i32,
    pub level: i32,
}

impl TreePosition {
    pub fn of(model: &category::Model) -> Self {
        TreePosition {
            tree_id: model.tree_id,
            lft: model.lft,
            rgt: model.rgt,
            level: model.level,
        }
    }

    /// True when `other` sits inside this node's subtree, itself included.
    pub fn encloses(&self, other: &TreePosition) -> bool {
        self.tree_id == other.tree_id && self.lft <= other.lft && other.rgt <= self.rgt
    }
}

#[derive(Clone, Debug)]
pub struct TreeNode {
    pub id: i32,
    pub name: String,
    pub parent_id: Option<i32>,
    pub children: Vec<i32>,
    pub position: TreePosition,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Category {child} references missing parent {parent}")]
    MissingParent { child: i32, parent: i32 },
    #[error("Category {0} is part of a parent cycle")]
    Cycle(i32),
}

#[derive(Clone, Debug, Default)]
pub struct CategoryTree {
    nodes: HashMap<i32, TreeNode>,
    roots: Vec<i32>,
}

impl CategoryTree {
    pub fn from_models(models: &[category::Model]) -> Result<Self, TreeError> {
        Self::build(
            models
                .iter()
                .map(|model| (model.id, model.name.as_str(), model.parent_id)),
        )
    }

    /// Builds the arena from `(id, name, parent_id)` triples and numbers it.
    pub fn build<'a, I>(entries: I) -> Result<Self, TreeError>
    where
        I: IntoIterator<Item = (i32, &'a str, Option<i32>)>,
    {
        let mut nodes: HashMap<i32, TreeNode> = entries
            .into_iter()
            .map(|(id, name, parent_id)| {
                let node = TreeNode {
                    id,
                    name: name.to_owned(),
                    parent_id,
                    children: Vec::new(),
                    position: TreePosition::default(),
                };
                (id, node)
            })
            .collect();

        let mut roots = Vec::new();
        let links: Vec<(i32, Option<i32>)> =
            nodes.values().map(|node| (node.id, node.parent_id)).collect();
        for (id, parent_id) in links {
            match parent_id {
                None => roots.push(id),
                Some(parent) => match nodes.get_mut(&parent) {
                    Some(parent_node) => parent_node.children.push(id),
                    None => return Err(TreeError::MissingParent { child: id, parent }),
                },
            }
        }

        let order = |nodes: &HashMap<i32, TreeNode>, ids: &mut Vec<i32>| {
            ids.sort_by(|a, b| nodes[a].name.cmp(&nodes[b].name).then(a.cmp(b)));
        };
        order(&nodes, &mut roots);
        let ids: Vec<i32> = nodes.keys().copied().collect();
        for id in ids {
            let mut children = nodes[&id].children.clone();
            order(&nodes, &mut children);
            if let Some(node) = nodes.get_mut(&id) {
                node.children = children;
            }
        }

        let mut numbered = 0;
        for (index, root) in roots.iter().enumerate() {
            let mut counter = 1;
            numbered += number(&mut nodes, *root, index as i32 + 1, 0, &mut counter);
        }
        if numbered < nodes.len() {
            let mut stranded: Vec<i32> = nodes
                .values()
                .filter(|node| node.position.tree_id == 0)
                .map(|node| node.id)
                .collect();
            stranded.sort_unstable();
            if let Some(id) = stranded.first() {
                return Err(TreeError::Cycle(*id));
            }
        }

        Ok(CategoryTree { nodes, roots })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: i32) -> Option<&TreeNode> {
        self.nodes.get(&id)
    }

    pub fn position(&self, id: i32) -> Option<TreePosition> {
        self.nodes.get(&id).map(|node| node.position)
    }

    pub fn roots(&self) -> &[i32] {
        &self.roots
    }

    pub fn children(&self, id: i32) -> &[i32] {
        self.nodes
            .get(&id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Pre-order walk below `id`, in display order.
    pub fn descendants(&self, id: i32, include_self: bool) -> Vec<i32> {
        let mut result = Vec::new();
        if !self.nodes.contains_key(&id) {
            return result;
        }
        if include_self {
            result.push(id);
        }
        let mut stack: Vec<i32> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        result
    }

    /// Path from the root down to `id`.
    pub fn ancestors(&self, id: i32, include_self: bool) -> Vec<i32> {
        let mut path = Vec::new();
        let mut current = match self.nodes.get(&id) {
            Some(node) if include_self => Some(node.id),
            Some(node) => node.parent_id,
            None => None,
        };
        while let Some(current_id) = current {
            path.push(current_id);
            current = self.nodes.get(&current_id).and_then(|node| node.parent_id);
        }
        path.reverse();
        path
    }

    /// True when `candidate` is `ancestor` or lies somewhere below it.
    pub fn is_within(&self, candidate: i32, ancestor: i32) -> bool {
        match (self.position(candidate), self.position(ancestor)) {
            (Some(candidate), Some(ancestor)) => ancestor.encloses(&candidate),
            _ => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.values()
    }
}

fn number(
    nodes: &mut HashMap<i32, TreeNode>,
    id: i32,
    tree_id: i32,
    level: i32,
    counter: &mut i32,
) -> usize {
    let children = nodes
        .get(&id)
        .map(|node| node.children.clone())
        .unwrap_or_default();

    let lft = *counter;
    *counter += 1;
    let mut numbered = 1;
    for child in children {
        numbered += number(nodes, child, tree_id, level + 1, counter);
    }
    let rgt = *counter;
    *counter += 1;

    if let Some(node) = nodes.get_mut(&id) {
        node.position = TreePosition {
            tree_id,
            lft,
            rgt,
            level,
        };
    }
    numbered
}
