//! Pre-order indexing of a rule's condition forest.
//!
//! Every node gets a 1-based [`NodeId`] in pre-order, the id of its parent
//! group and the logical operator that combines it with its siblings. Checks
//! key all of their side tables by [`NodeId`] and use [`format_location`] for
//! human readable positions.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::condition::{Comparison, Condition, ConditionGroup, LogicalOperator};

/// Stable 1-based pre-order position of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "condition {}", self.0)
    }
}

/// Formats node positions as `condition 5` or `condition 5, 6`.
pub fn format_location(ids: &[NodeId]) -> String {
    if ids.is_empty() {
        return String::new();
    }
    let numbers = ids
        .iter()
        .map(|id| id.0.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("condition {}", numbers)
}

#[derive(Debug, Clone, Copy)]
pub struct IndexedCondition<'a> {
    pub id: NodeId,
    pub node: &'a Condition,
    pub parent: Option<NodeId>,
    /// Operator combining this node with its siblings. Top-level nodes are implicitly AND.
    pub context: LogicalOperator,
    /// Nesting level, 1 for top-level nodes.
    pub level: usize,
}

#[derive(Debug, Clone)]
pub struct ConditionIndex<'a> {
    entries: Vec<IndexedCondition<'a>>,
    truncated: Vec<NodeId>,
    max_depth: usize,
}

impl<'a> ConditionIndex<'a> {
    /// Indexes `conditions`. Groups whose children would sit deeper than
    /// `max_depth` are indexed but their children are not; see [`Self::truncated`].
    pub fn build(conditions: &'a [Condition], max_depth: usize) -> Self {
        let mut index = Self {
            entries: Vec::new(),
            truncated: Vec::new(),
            max_depth,
        };
        index.visit(conditions, None, LogicalOperator::And, 1);
        index
    }

    fn visit(
        &mut self,
        nodes: &'a [Condition],
        parent: Option<NodeId>,
        context: LogicalOperator,
        level: usize,
    ) {
        for node in nodes {
            let id = NodeId(self.entries.len() + 1);
            self.entries.push(IndexedCondition {
                id,
                node,
                parent,
                context,
                level,
            });

            if let Condition::Group(group) = node {
                if group.conditions.is_empty() {
                    continue;
                }
                if level >= self.max_depth {
                    self.truncated.push(id);
                    continue;
                }
                // An unrecognized group operator keeps the surrounding context.
                let inner = group.logical_operator().unwrap_or(context);
                self.visit(&group.conditions, Some(id), inner, level + 1);
            }
        }
    }

    pub fn entries(&self) -> &[IndexedCondition<'a>] {
        &self.entries
    }

    pub fn get(&self, id: NodeId) -> Option<&IndexedCondition<'a>> {
        id.0.checked_sub(1).and_then(|slot| self.entries.get(slot))
    }

    /// Groups whose children were skipped because of the depth limit.
    pub fn truncated(&self) -> &[NodeId] {
        &self.truncated
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn comparisons(&self) -> impl Iterator<Item = (&IndexedCondition<'a>, &'a Comparison)> + '_ {
        self.entries
            .iter()
            .filter_map(|entry| entry.node.as_comparison().map(|comparison| (entry, comparison)))
    }

    pub fn groups(&self) -> impl Iterator<Item = (&IndexedCondition<'a>, &'a ConditionGroup)> + '_ {
        self.entries
            .iter()
            .filter_map(|entry| entry.node.as_group().map(|group| (entry, group)))
    }

    pub fn node_count(&self) -> usize {
        self.entries.len()
    }

    pub fn comparison_count(&self) -> usize {
        self.comparisons().count()
    }

    /// Number of nested group levels; 1 for a flat forest and 0 when empty.
    pub fn depth(&self) -> usize {
        if self.entries.is_empty() {
            return 0;
        }
        self.groups()
            .map(|(entry, _)| entry.level)
            .max()
            .unwrap_or(1)
            .max(1)
    }

    pub fn unique_fields(&self) -> BTreeSet<String> {
        self.comparisons()
            .map(|(_, comparison)| comparison.field.clone())
            .collect()
    }

    /// Path from `id` up to its top-level ancestor, `id` first.
    pub fn path_to_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            path.push(current);
            cursor = self.get(current).and_then(|entry| entry.parent);
        }
        path
    }

    /// True when both nodes must hold together: every operator between each
    /// node and their nearest common ancestor (or the implicit top level) is AND.
    pub fn conjunctive(&self, a: NodeId, b: NodeId) -> bool {
        let path_a = self.path_to_root(a);
        let path_b = self.path_to_root(b);
        let common = path_a.iter().copied().find(|id| path_b.contains(id));

        let required = |path: &[NodeId]| {
            path.iter()
                .take_while(|id| Some(**id) != common)
                .all(|id| {
                    self.get(*id)
                        .map(|entry| entry.context == LogicalOperator::And)
                        .unwrap_or(false)
                })
        };

        required(&path_a) && required(&path_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested(levels: usize) -> Condition {
        let mut node = Condition::compare("age", ">", 1);
        for _ in 0..levels {
            node = Condition::all(vec![node]);
        }
        node
    }

    #[test]
    fn assigns_preorder_ids_and_contexts() {
        let forest = vec![
            Condition::compare("age", ">", 18),
            Condition::any(vec![
                Condition::compare("grade", "==", "VIP"),
                Condition::all(vec![Condition::compare("score", ">=", 90)]),
            ]),
        ];
        let index = ConditionIndex::build(&forest, 50);

        let ids: Vec<usize> = index.entries().iter().map(|e| e.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(index.get(NodeId(1)).map(|e| e.context), Some(LogicalOperator::And));
        assert_eq!(index.get(NodeId(3)).map(|e| e.context), Some(LogicalOperator::Or));
        assert_eq!(index.get(NodeId(5)).map(|e| e.parent), Some(Some(NodeId(4))));
        assert_eq!(index.node_count(), 5);
        assert_eq!(index.comparison_count(), 3);
        assert_eq!(index.depth(), 2);
    }

    #[test]
    fn depth_counts_group_levels() {
        let empty: Vec<Condition> = Vec::new();
        assert_eq!(ConditionIndex::build(&empty, 50).depth(), 0);

        let flat = vec![Condition::compare("age", ">", 1), Condition::compare("age", "<", 9)];
        assert_eq!(ConditionIndex::build(&flat, 50).depth(), 1);

        let deep = vec![nested(5)];
        assert_eq!(ConditionIndex::build(&deep, 50).depth(), 5);
    }

    #[test]
    fn stops_descending_at_max_depth() {
        let deep = vec![nested(4)];
        let index = ConditionIndex::build(&deep, 2);
        assert_eq!(index.truncated(), &[NodeId(2)]);
        assert_eq!(index.node_count(), 2);
    }

    #[test]
    fn conjunctive_only_through_and_groups() {
        let forest = vec![
            Condition::compare("age", ">", 18),
            Condition::any(vec![
                Condition::compare("age", "<", 10),
                Condition::compare("age", "<", 5),
            ]),
            Condition::all(vec![Condition::compare("age", "<", 3)]),
        ];
        let index = ConditionIndex::build(&forest, 50);

        assert!(index.conjunctive(NodeId(1), NodeId(6)));
        assert!(!index.conjunctive(NodeId(1), NodeId(3)));
        assert!(!index.conjunctive(NodeId(3), NodeId(4)));
    }

    #[test]
    fn formats_locations() {
        assert_eq!(format_location(&[NodeId(5)]), "condition 5");
        assert_eq!(format_location(&[NodeId(5), NodeId(6)]), "condition 5, 6");
        assert_eq!(NodeId(2).to_string(), "condition 2");
    }
}
