use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use super::repo::Category;

/// A category with its descendants grouped underneath it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<CategoryNode>,
}

/// Groups a flat, pre-sorted category list into a forest. Rows whose parent
/// is missing from the input are dropped rather than promoted to roots.
pub fn build_tree(rows: Vec<Category>) -> Vec<CategoryNode> {
    let mut by_parent: HashMap<Option<Uuid>, Vec<Category>> = HashMap::new();
    for row in rows {
        by_parent.entry(row.parent_id).or_default().push(row);
    }
    attach(&mut by_parent, None)
}

fn attach(
    by_parent: &mut HashMap<Option<Uuid>, Vec<Category>>,
    parent: Option<Uuid>,
) -> Vec<CategoryNode> {
    let Some(level) = by_parent.remove(&parent) else {
        return Vec::new();
    };
    level
        .into_iter()
        .map(|category| {
            let children = attach(by_parent, Some(category.id));
            CategoryNode { category, children }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn cat(name: &str, id: Uuid, parent_id: Option<Uuid>) -> Category {
        Category {
            id,
            name: name.into(),
            images: vec![],
            color: String::new(),
            parent_id,
            parent_cat_name: String::new(),
            is_active: true,
            sort_order: 0,
            sub_category_count: 0,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn builds_two_level_tree() {
        let root_a = Uuid::new_v4();
        let root_b = Uuid::new_v4();
        let child = Uuid::new_v4();
        let tree = build_tree(vec![
            cat("Electronics", root_a, None),
            cat("Fashion", root_b, None),
            cat("Phones", child, Some(root_a)),
            cat("Cases", Uuid::new_v4(), Some(child)),
        ]);

        assert_eq!(tree.len(), 2);
        let electronics = tree.iter().find(|n| n.category.id == root_a).unwrap();
        assert_eq!(electronics.children.len(), 1);
        assert_eq!(electronics.children[0].category.name, "Phones");
        assert_eq!(electronics.children[0].children.len(), 1);
        let fashion = tree.iter().find(|n| n.category.id == root_b).unwrap();
        assert!(fashion.children.is_empty());
    }

    #[test]
    fn orphan_rows_are_dropped() {
        let tree = build_tree(vec![cat("Lost", Uuid::new_v4(), Some(Uuid::new_v4()))]);
        assert!(tree.is_empty());
    }

    #[test]
    fn preserves_input_order_per_level() {
        let tree = build_tree(vec![
            cat("First", Uuid::new_v4(), None),
            cat("Second", Uuid::new_v4(), None),
        ]);
        assert_eq!(tree[0].category.name, "First");
        assert_eq!(tree[1].category.name, "Second");
    }
}
