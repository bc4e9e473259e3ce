//! Category hierarchy flattening for the category listing table.
//!
//! The API returns categories as a nested tree. The table renders them as a
//! flat, indented list where each row knows its depth, its parent and how
//! many direct children it has. Rows can be collapsed under their parent;
//! the set of expanded ids is owned by the caller and passed in.

use crate::error::{AppError, AppResult, ValidationErrors};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Category ids arrive either as numbers or as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryId {
    Number(i64),
    Text(String),
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            | CategoryId::Number(n) => write!(f, "{}", n),
            | CategoryId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for CategoryId {
    fn from(value: i64) -> Self {
        CategoryId::Number(value)
    }
}

impl From<i32> for CategoryId {
    fn from(value: i32) -> Self {
        CategoryId::Number(i64::from(value))
    }
}

impl From<String> for CategoryId {
    fn from(value: String) -> Self {
        CategoryId::Text(value)
    }
}

impl From<&str> for CategoryId {
    fn from(value: &str) -> Self {
        CategoryId::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Category>,
}

impl Category {
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Category>) -> Self {
        self.children = children;
        self
    }
}

/// One table line derived from a category node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlattenedRow<'a> {
    pub id: &'a CategoryId,
    pub name: &'a str,
    pub depth: usize,
    pub parent_name: Option<&'a str>,
    pub parent_id: Option<&'a CategoryId>,
    pub children_count: usize,
    #[serde(skip)]
    pub category: &'a Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(usize);

#[derive(Debug)]
struct Node<'a> {
    category: &'a Category,
    parent: Option<NodeIndex>,
    depth: usize,
    children: Vec<NodeIndex>,
}

/// Arena view over a borrowed category forest.
///
/// Nodes are stored in pre-order with explicit parent links, so traversal
/// never recurses and id uniqueness is checked while building.
#[derive(Debug)]
pub struct CategoryTree<'a> {
    nodes: Vec<Node<'a>>,
    roots: Vec<NodeIndex>,
    index: HashMap<&'a CategoryId, NodeIndex>,
    outer_parent: Option<&'a Category>,
}

impl<'a> CategoryTree<'a> {
    pub fn build(categories: &'a [Category]) -> AppResult<Self> {
        Self::build_from(categories, 0, None)
    }

    /// Build a tree whose roots sit at `depth` below `parent`.
    pub fn build_from(categories: &'a [Category], depth: usize, parent: Option<&'a Category>) -> AppResult<Self> {
        let mut tree = Self {
            nodes: Vec::new(),
            roots: Vec::new(),
            index: HashMap::new(),
            outer_parent: parent,
        };

        let mut stack: Vec<(&'a Category, Option<NodeIndex>)> = categories.iter().rev().map(|c| (c, None)).collect();

        while let Some((category, parent)) = stack.pop() {
            if let Some(&existing) = tree.index.get(&category.id) {
                if tree.is_ancestor_or_self(existing, parent) {
                    return Err(AppError::InvalidCategoryTree(format!(
                        "category '{}' appears as its own descendant",
                        category.id
                    )));
                }
                return Err(AppError::DuplicateCategoryId(category.id.to_string()));
            }
            if parent.is_none() && tree.outer_parent.is_some_and(|p| p.id == category.id) {
                return Err(AppError::InvalidCategoryTree(format!(
                    "category '{}' is listed under itself",
                    category.id
                )));
            }

            let idx = NodeIndex(tree.nodes.len());
            let node_depth = parent.map(|p| tree.nodes[p.0].depth + 1).unwrap_or(depth);
            tree.nodes.push(Node {
                category,
                parent,
                depth: node_depth,
                children: Vec::with_capacity(category.children.len()),
            });
            tree.index.insert(&category.id, idx);

            match parent {
                | Some(p) => tree.nodes[p.0].children.push(idx),
                | None => tree.roots.push(idx),
            }

            for child in category.children.iter().rev() {
                stack.push((child, Some(idx)));
            }
        }

        Ok(tree)
    }

    fn is_ancestor_or_self(&self, candidate: NodeIndex, from: Option<NodeIndex>) -> bool {
        let mut current = from;
        while let Some(idx) = current {
            if idx == candidate {
                return true;
            }
            current = self.nodes[idx.0].parent;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeIndex] {
        &self.roots
    }

    pub fn find(&self, id: &CategoryId) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn category(&self, node: NodeIndex) -> &'a Category {
        self.nodes[node.0].category
    }

    pub fn parent(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.nodes[node.0].parent
    }

    pub fn children(&self, node: NodeIndex) -> &[NodeIndex] {
        &self.nodes[node.0].children
    }

    pub fn depth(&self, node: NodeIndex) -> usize {
        self.nodes[node.0].depth
    }

    /// Ancestors from the direct parent up to the root.
    pub fn ancestors(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        std::iter::successors(self.parent(node), move |n| self.parent(*n))
    }

    /// Rows in pre-order: each node followed by its own subtree.
    pub fn rows(&self) -> Vec<FlattenedRow<'a>> {
        self.nodes
            .iter()
            .map(|node| {
                let parent = node.parent.map(|p| self.nodes[p.0].category).or(self.outer_parent);
                FlattenedRow {
                    id: &node.category.id,
                    name: &node.category.name,
                    depth: node.depth,
                    parent_name: parent.map(|c| c.name.as_str()),
                    parent_id: parent.map(|c| &c.id),
                    children_count: node.category.children.len(),
                    category: node.category,
                }
            })
            .collect()
    }
}

/// Flatten a category forest into table rows, roots at depth 0.
pub fn flatten(categories: &[Category]) -> AppResult<Vec<FlattenedRow<'_>>> {
    flatten_from(categories, 0, None)
}

/// Flatten `categories` as the children of `parent`, starting at `depth`.
pub fn flatten_from<'a>(
    categories: &'a [Category],
    depth: usize,
    parent: Option<&'a Category>,
) -> AppResult<Vec<FlattenedRow<'a>>> {
    Ok(CategoryTree::build_from(categories, depth, parent)?.rows())
}

/// Ids of the categories currently expanded in the table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpansionState {
    expanded: HashSet<CategoryId>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial state when data first loads: every row with children is expanded.
    pub fn auto_expand(rows: &[FlattenedRow<'_>]) -> Self {
        Self {
            expanded: rows
                .iter()
                .filter(|r| r.children_count > 0)
                .map(|r| r.id.clone())
                .collect(),
        }
    }

    pub fn contains(&self, id: &CategoryId) -> bool {
        self.expanded.contains(id)
    }

    pub fn expand(&mut self, id: CategoryId) {
        self.expanded.insert(id);
    }

    pub fn collapse(&mut self, id: &CategoryId) {
        self.expanded.remove(id);
    }

    /// Flip `id`; returns true when it ends up expanded.
    pub fn toggle(&mut self, id: &CategoryId) -> bool {
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.clone());
            true
        }
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryId> {
        self.expanded.iter()
    }
}

impl FromIterator<CategoryId> for ExpansionState {
    fn from_iter<T: IntoIterator<Item = CategoryId>>(iter: T) -> Self {
        Self {
            expanded: iter.into_iter().collect(),
        }
    }
}

/// Return `state` with `id` toggled.
pub fn toggle_expansion(id: &CategoryId, mut state: ExpansionState) -> ExpansionState {
    state.toggle(id);
    state
}

fn rows_by_id<'r, 'a>(rows: &'r [FlattenedRow<'a>]) -> HashMap<&'a CategoryId, &'r FlattenedRow<'a>> {
    rows.iter().map(|r| (r.id, r)).collect()
}

fn ancestors_expanded<'r, 'a>(
    row: &'r FlattenedRow<'a>,
    by_id: &HashMap<&'a CategoryId, &'r FlattenedRow<'a>>,
    expanded: &ExpansionState,
) -> bool {
    let mut current: &'r FlattenedRow<'a> = row;
    while current.depth > 0 {
        let Some(parent_id) = current.parent_id else {
            break;
        };
        if !expanded.contains(parent_id) {
            return false;
        }
        match by_id.get(parent_id) {
            // Parent links always point to a shallower row.
            | Some(&parent) if parent.depth < current.depth => current = parent,
            | _ => break,
        }
    }
    true
}

/// A root row is always visible; any other row only when its whole ancestor
/// chain is expanded. Ancestors are followed by parent id, so two categories
/// sharing a name never get mixed up.
pub fn is_visible<'a>(row: &FlattenedRow<'a>, rows: &[FlattenedRow<'a>], expanded: &ExpansionState) -> bool {
    if row.depth == 0 {
        return true;
    }
    ancestors_expanded(row, &rows_by_id(rows), expanded)
}

/// Rows to render for the given expansion state, in table order.
pub fn visible_rows<'r, 'a>(rows: &'r [FlattenedRow<'a>], expanded: &ExpansionState) -> Vec<&'r FlattenedRow<'a>> {
    let by_id = rows_by_id(rows);
    rows.iter()
        .filter(|row| row.depth == 0 || ancestors_expanded(*row, &by_id, expanded))
        .collect()
}

/// A choice in the "parent category" selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentOption {
    pub id: CategoryId,
    pub label: String,
}

/// Parent choices for a category form. When editing, `exclude` removes the
/// category itself and its whole subtree so it can't be moved under itself.
pub fn parent_options(rows: &[FlattenedRow<'_>], exclude: Option<&CategoryId>) -> Vec<ParentOption> {
    let mut options = Vec::with_capacity(rows.len());
    let mut skip_below: Option<usize> = None;

    for row in rows {
        if let Some(depth) = skip_below {
            if row.depth > depth {
                continue;
            }
            skip_below = None;
        }
        if exclude == Some(row.id) {
            skip_below = Some(row.depth);
            continue;
        }
        options.push(ParentOption {
            id: row.id.clone(),
            label: format!("{}{}", "\u{a0}\u{a0}".repeat(row.depth), row.name),
        });
    }

    options
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryListResponse {
    pub count: usize,
    pub categories: Vec<Category>,
}

/// Accept the listing shapes the API has been seen to return: a bare array,
/// `{count, categories}`, a single category object, or nothing.
pub fn normalize_category_response(payload: serde_json::Value) -> AppResult<CategoryListResponse> {
    use serde_json::Value;

    match payload {
        | Value::Array(items) => {
            let categories: Vec<Category> = serde_json::from_value(Value::Array(items))?;
            Ok(CategoryListResponse {
                count: categories.len(),
                categories,
            })
        },
        | Value::Object(mut map) => match map.remove("categories") {
            | Some(Value::Array(items)) => {
                let categories: Vec<Category> = serde_json::from_value(Value::Array(items))?;
                let count = map
                    .get("count")
                    .and_then(Value::as_u64)
                    .map(|c| c as usize)
                    .unwrap_or(categories.len());
                Ok(CategoryListResponse { count, categories })
            },
            | other => {
                if let Some(value) = other {
                    map.insert("categories".to_string(), value);
                }
                let category: Category = serde_json::from_value(Value::Object(map))?;
                Ok(CategoryListResponse {
                    count: 1,
                    categories: vec![category],
                })
            },
        },
        | _ => Ok(CategoryListResponse::default()),
    }
}

pub const CATEGORY_NAME_MAX: usize = 120;

/// Body of the create/update category requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<CategoryId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CategoryId>,
}

impl CategoryPayload {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = ValidationErrors::new();
        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", "Category name is required");
        } else if name.chars().count() > CATEGORY_NAME_MAX {
            errors.add("name", format!("Maximum {} characters allowed", CATEGORY_NAME_MAX));
        }
        if self.id.is_some() && self.id == self.parent_id {
            errors.add("parentId", "A category cannot be its own parent");
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> Vec<Category> {
        vec![
            Category::new(1, "Tech").with_children(vec![
                Category::new(2, "Rust").with_children(vec![Category::new(3, "Async")]),
                Category::new(4, "Go"),
            ]),
            Category::new(5, "Life").with_children(vec![Category::new(6, "Travel")]),
        ]
    }

    fn names<'a>(rows: &[&FlattenedRow<'a>]) -> Vec<&'a str> {
        rows.iter().map(|r| r.name).collect()
    }

    #[test]
    fn flatten_is_preorder_with_depth_and_parent() {
        let categories = sample();
        let rows = flatten(&categories).unwrap();

        let order: Vec<&str> = rows.iter().map(|r| r.name).collect();
        assert_eq!(order, vec!["Tech", "Rust", "Async", "Go", "Life", "Travel"]);

        let depths: Vec<usize> = rows.iter().map(|r| r.depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 1, 0, 1]);

        assert_eq!(rows[0].parent_name, None);
        assert_eq!(rows[2].parent_name, Some("Rust"));
        assert_eq!(rows[5].parent_id, Some(&CategoryId::Number(5)));
        assert_eq!(rows[0].children_count, 2);
        assert_eq!(rows[3].children_count, 0);
        assert!(std::ptr::eq(rows[1].category, &categories[0].children[0]));
    }

    #[test]
    fn sibling_order_a_a1_b() {
        let categories = vec![
            Category::new("a", "A").with_children(vec![Category::new("a1", "A1")]),
            Category::new("b", "B"),
        ];
        let rows = flatten(&categories).unwrap();
        let order: Vec<&str> = rows.iter().map(|r| r.name).collect();
        assert_eq!(order, vec!["A", "A1", "B"]);
    }

    #[test]
    fn flatten_from_uses_starting_depth_and_parent() {
        let categories = sample();
        let parent = &categories[0];
        let rows = flatten_from(&parent.children, 1, Some(parent)).unwrap();
        assert_eq!(rows[0].depth, 1);
        assert_eq!(rows[0].parent_name, Some("Tech"));
        assert_eq!(rows[1].depth, 2);
        assert_eq!(rows[1].parent_name, Some("Rust"));
    }

    #[test]
    fn empty_input_gives_no_rows() {
        assert!(flatten(&[]).unwrap().is_empty());
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let categories = vec![Category::new(1, "A"), Category::new(1, "B")];
        let err = flatten(&categories).unwrap_err();
        assert!(matches!(err, AppError::DuplicateCategoryId(id) if id == "1"));
    }

    #[test]
    fn id_repeated_under_itself_is_a_cycle() {
        let categories = vec![Category::new(1, "A").with_children(vec![
            Category::new(2, "B").with_children(vec![Category::new(1, "A again")]),
        ])];
        let err = flatten(&categories).unwrap_err();
        assert!(matches!(err, AppError::InvalidCategoryTree(_)));
    }

    #[test]
    fn arena_links_parents_and_children() {
        let categories = sample();
        let tree = CategoryTree::build(&categories).unwrap();
        assert_eq!(tree.len(), 6);
        assert_eq!(tree.roots().len(), 2);

        let asynch = tree.find(&CategoryId::Number(3)).unwrap();
        let chain: Vec<&str> = tree.ancestors(asynch).map(|n| tree.category(n).name.as_str()).collect();
        assert_eq!(chain, vec!["Rust", "Tech"]);
        assert_eq!(tree.depth(asynch), 2);

        let tech = tree.find(&CategoryId::Number(1)).unwrap();
        let kids: Vec<&str> = tree.children(tech).iter().map(|n| tree.category(*n).name.as_str()).collect();
        assert_eq!(kids, vec!["Rust", "Go"]);
    }

    #[test]
    fn root_rows_always_visible() {
        let categories = sample();
        let rows = flatten(&categories).unwrap();
        let none = ExpansionState::new();
        assert!(is_visible(&rows[0], &rows, &none));
        assert!(!is_visible(&rows[1], &rows, &none));
        assert_eq!(names(&visible_rows(&rows, &none)), vec!["Tech", "Life"]);
    }

    #[test]
    fn collapsing_ancestor_hides_descendants_and_reexpanding_restores() {
        let categories = sample();
        let rows = flatten(&categories).unwrap();
        let mut state = ExpansionState::auto_expand(&rows);
        assert_eq!(state.len(), 3);
        assert_eq!(visible_rows(&rows, &state).len(), 6);

        state.toggle(&CategoryId::Number(1));
        assert_eq!(names(&visible_rows(&rows, &state)), vec!["Tech", "Life", "Travel"]);
        assert!(state.contains(&CategoryId::Number(2)));

        state.toggle(&CategoryId::Number(1));
        assert_eq!(visible_rows(&rows, &state).len(), 6);

        state.collapse(&CategoryId::Number(2));
        assert_eq!(names(&visible_rows(&rows, &state)), vec!["Tech", "Rust", "Go", "Life", "Travel"]);
    }

    #[test]
    fn duplicate_names_follow_parent_ids() {
        let categories = vec![
            Category::new(1, "News").with_children(vec![Category::new(2, "Local").with_children(vec![
                Category::new(3, "Weather"),
            ])]),
            Category::new(4, "Sport").with_children(vec![Category::new(5, "Local").with_children(vec![
                Category::new(6, "Results"),
            ])]),
        ];
        let rows = flatten(&categories).unwrap();
        let state: ExpansionState = [1, 2, 4].into_iter().map(CategoryId::Number).collect();

        let results = rows.iter().find(|r| r.name == "Results").unwrap();
        let weather = rows.iter().find(|r| r.name == "Weather").unwrap();
        assert!(is_visible(weather, &rows, &state));
        assert!(!is_visible(results, &rows, &state));
    }

    #[test]
    fn toggle_expansion_is_its_own_inverse() {
        let id = CategoryId::from("x");
        let start = ExpansionState::new();
        let once = toggle_expansion(&id, start.clone());
        assert!(once.contains(&id));
        assert_eq!(toggle_expansion(&id, once), start);
    }

    #[test]
    fn parent_options_skip_excluded_subtree() {
        let categories = sample();
        let rows = flatten(&categories).unwrap();
        let options = parent_options(&rows, Some(&CategoryId::Number(2)));
        let ids: Vec<String> = options.iter().map(|o| o.id.to_string()).collect();
        assert_eq!(ids, vec!["1", "4", "5", "6"]);
        assert_eq!(options[1].label, "\u{a0}\u{a0}Go");
    }

    #[test]
    fn normalizes_listing_shapes() {
        let bare = normalize_category_response(serde_json::json!([{"id": 1, "name": "A"}])).unwrap();
        assert_eq!(bare.count, 1);

        let wrapped = normalize_category_response(serde_json::json!({
            "count": 9,
            "categories": [{"id": "x", "name": "A", "children": [{"id": "y", "name": "B"}]}]
        }))
        .unwrap();
        assert_eq!(wrapped.count, 9);
        assert_eq!(wrapped.categories[0].children[0].id, CategoryId::from("y"));

        let single = normalize_category_response(serde_json::json!({"id": 3, "name": "Solo"})).unwrap();
        assert_eq!(single.count, 1);
        assert_eq!(single.categories[0].name, "Solo");

        let empty = normalize_category_response(serde_json::Value::Null).unwrap();
        assert_eq!(empty, CategoryListResponse::default());
    }

    #[test]
    fn malformed_listing_is_a_serialization_error() {
        let err = normalize_category_response(serde_json::json!([{"name": "no id"}])).unwrap_err();
        assert!(matches!(err, AppError::Serialization(_)));
    }

    #[test]
    fn category_payload_validation() {
        let ok = CategoryPayload {
            id: None,
            name: "Tech".into(),
            parent_id: None,
        };
        assert!(ok.validate().is_ok());

        let blank = CategoryPayload {
            name: "   ".into(),
            ..ok.clone()
        };
        assert!(blank.validate().is_err());

        let own_parent = CategoryPayload {
            id: Some(CategoryId::Number(7)),
            name: "Loop".into(),
            parent_id: Some(CategoryId::Number(7)),
        };
        assert!(own_parent.validate().is_err());
    }

    fn arb_forest() -> impl Strategy<Value = Vec<Category>> {
        let leaf = "[a-z]{1,6}".prop_map(|name| Category::new(0, name));
        let node = leaf.prop_recursive(4, 48, 4, |inner| {
            ("[a-z]{1,6}", prop::collection::vec(inner, 0..4))
                .prop_map(|(name, children)| Category::new(0, name).with_children(children))
        });
        prop::collection::vec(node, 0..5).prop_map(|mut forest| {
            let mut next = 1;
            let mut stack: Vec<&mut Category> = forest.iter_mut().collect();
            while let Some(c) = stack.pop() {
                c.id = CategoryId::Number(next);
                next += 1;
                stack.extend(c.children.iter_mut());
            }
            forest
        })
    }

    fn count(categories: &[Category]) -> usize {
        categories.iter().map(|c| 1 + count(&c.children)).sum()
    }

    proptest! {
        #[test]
        fn every_row_follows_its_parent(forest in arb_forest()) {
            let rows = flatten(&forest).unwrap();
            prop_assert_eq!(rows.len(), count(&forest));

            for (i, row) in rows.iter().enumerate() {
                match row.parent_id {
                    None => prop_assert_eq!(row.depth, 0),
                    Some(pid) => {
                        let p = rows.iter().position(|r| r.id == pid).unwrap();
                        prop_assert!(p < i);
                        prop_assert_eq!(rows[p].depth + 1, row.depth);
                        prop_assert_eq!(Some(rows[p].name), row.parent_name);
                        prop_assert!(rows[p + 1..i].iter().all(|r| r.depth > rows[p].depth));
                    }
                }
            }
        }

        #[test]
        fn fully_expanded_shows_everything(forest in arb_forest()) {
            let rows = flatten(&forest).unwrap();
            let all: ExpansionState = rows.iter().map(|r| r.id.clone()).collect();
            prop_assert_eq!(visible_rows(&rows, &all).len(), rows.len());
            let roots = rows.iter().filter(|r| r.depth == 0).count();
            prop_assert_eq!(visible_rows(&rows, &ExpansionState::new()).len(), roots);
        }
    }
}
