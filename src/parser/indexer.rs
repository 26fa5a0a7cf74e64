//! Relationship indexing derived from the consolidation groups.
//!
//! Every record code that acts as a parent or header owns a counter that is
//! bumped once per row of that code. Rows of related codes copy the current
//! value of those counters into index columns, which later serve as join
//! keys. The actions per code are derived once from the group registry.

use crate::constants::UNSET_RELATIONSHIP_INDEX;
use crate::schema::GroupRegistry;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexActionKind {
    /// Bump the record's own counter, then emit it
    Increment,
    /// Emit another record's counter as it currently stands
    Read,
}

/// One index column appended to every row of a record code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexAction {
    pub kind: IndexActionKind,
    /// Record code that owns the counter
    pub counter: String,
    /// Output column name
    pub column: String,
}

/// Index actions for every record code that takes part in a group
#[derive(Debug, Clone, Default)]
pub struct IndexPlan {
    actions: BTreeMap<String, Vec<IndexAction>>,
}

impl IndexPlan {
    /// Derive the actions for every record code.
    ///
    /// The result does not depend on group order: actions are deduplicated
    /// per (kind, counter) and sorted with increments first, then reads by
    /// counter code.
    pub fn derive(groups: &GroupRegistry) -> Self {
        let mut actions: BTreeMap<String, Vec<IndexAction>> = BTreeMap::new();
        let mut add = |code: &str, kind: IndexActionKind, counter: &str, column: &str| {
            let entry = actions.entry(code.to_string()).or_default();
            if !entry
                .iter()
                .any(|action| action.kind == kind && action.counter == counter)
            {
                entry.push(IndexAction {
                    kind,
                    counter: counter.to_string(),
                    column: column.to_string(),
                });
            }
        };

        for group in groups.iter() {
            add(
                &group.parent,
                IndexActionKind::Increment,
                &group.parent,
                &group.parent_index,
            );
            if group.has_distinct_header() {
                add(
                    &group.parent,
                    IndexActionKind::Read,
                    &group.header,
                    &group.header_index,
                );
                add(
                    &group.header,
                    IndexActionKind::Increment,
                    &group.header,
                    &group.header_index,
                );
            }
            for child in &group.children {
                add(
                    child,
                    IndexActionKind::Read,
                    &group.parent,
                    &group.parent_index,
                );
            }
        }

        for list in actions.values_mut() {
            list.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.counter.cmp(&b.counter)));
        }

        Self { actions }
    }

    /// Actions for a record code, empty for codes outside every group
    pub fn actions(&self, code: &str) -> &[IndexAction] {
        self.actions.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Names of the index columns appended to rows of `code`
    pub fn index_columns(&self, code: &str) -> impl Iterator<Item = &str> {
        self.actions(code).iter().map(|action| action.column.as_str())
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Counter values for one parsing pass
#[derive(Debug, Default)]
pub struct RelationshipCounters {
    values: HashMap<String, i64>,
}

impl RelationshipCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a counter; -1 before its first row
    pub fn current(&self, counter: &str) -> i64 {
        self.values
            .get(counter)
            .copied()
            .unwrap_or(UNSET_RELATIONSHIP_INDEX)
    }

    /// Run a row's actions in order and return the emitted values
    pub fn apply(&mut self, actions: &[IndexAction]) -> Vec<i64> {
        actions
            .iter()
            .map(|action| match action.kind {
                IndexActionKind::Increment => {
                    let value = self
                        .values
                        .entry(action.counter.clone())
                        .or_insert(UNSET_RELATIONSHIP_INDEX);
                    *value += 1;
                    *value
                }
                IndexActionKind::Read => self.current(&action.counter),
            })
            .collect()
    }
}
