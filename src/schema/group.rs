//! Consolidation groups: which records join into one consolidated view

use crate::error::{Result, SpedError};
use crate::schema::layout::LayoutRegistry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// One parent record type joined with its children and a header record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationGroup {
    /// Name of the consolidated output (e.g. `C`, `D500`)
    pub name: String,

    /// Record code whose rows drive the join
    pub parent: String,

    /// Child record codes, joined in this order
    #[serde(default)]
    pub children: Vec<String>,

    /// Column carrying the parent counter on parent and child rows
    pub parent_index: String,

    /// Column carrying the header counter on header and parent rows
    pub header_index: String,

    /// Record code attached in front of every consolidated row
    pub header: String,
}

impl ConsolidationGroup {
    pub fn new<C, S>(
        name: impl Into<String>,
        parent: impl Into<String>,
        children: C,
        parent_index: impl Into<String>,
        header_index: impl Into<String>,
        header: impl Into<String>,
    ) -> Self
    where
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            parent: parent.into(),
            children: children.into_iter().map(Into::into).collect(),
            parent_index: parent_index.into(),
            header_index: header_index.into(),
            header: header.into(),
        }
    }

    /// True when the header is a distinct record type from the parent
    pub fn has_distinct_header(&self) -> bool {
        self.header != self.parent
    }

    /// Every record code this group touches, parent first
    pub fn record_codes(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.parent.as_str())
            .chain(self.children.iter().map(String::as_str))
            .chain(std::iter::once(self.header.as_str()))
    }
}

/// Ordered, read-only set of consolidation groups
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    groups: Vec<ConsolidationGroup>,
}

impl GroupRegistry {
    pub fn new(groups: impl IntoIterator<Item = ConsolidationGroup>) -> Self {
        Self {
            groups: groups.into_iter().collect(),
        }
    }

    /// Check every group against the layouts and against each other
    pub fn validate(&self, layouts: &LayoutRegistry) -> Result<()> {
        let mut names = HashSet::new();
        // record code -> column name its counter is emitted under
        let mut counter_columns: BTreeMap<&str, (&str, &str)> = BTreeMap::new();

        for group in &self.groups {
            if !names.insert(group.name.as_str()) {
                return Err(SpedError::configuration(format!(
                    "Consolidation group {} is defined more than once",
                    group.name
                )));
            }

            for code in group.record_codes() {
                if !layouts.contains(code) {
                    return Err(SpedError::configuration(format!(
                        "Group {} references record {} which has no layout",
                        group.name, code
                    )));
                }
            }

            if group.has_distinct_header() && group.parent_index == group.header_index {
                return Err(SpedError::configuration(format!(
                    "Group {} uses {} for both parent and header index",
                    group.name, group.parent_index
                )));
            }

            let mut owned = vec![(group.parent.as_str(), group.parent_index.as_str())];
            if group.has_distinct_header() {
                owned.push((group.header.as_str(), group.header_index.as_str()));
            }
            for (code, column) in owned {
                match counter_columns.get(code) {
                    Some((existing, first_group)) if *existing != column => {
                        return Err(SpedError::configuration(format!(
                            "Record {} is indexed as {} in group {} but as {} in group {}",
                            code, existing, first_group, column, group.name
                        )));
                    }
                    Some(_) => {}
                    None => {
                        counter_columns.insert(code, (column, group.name.as_str()));
                    }
                }
            }
        }

        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ConsolidationGroup> {
        self.groups.iter().find(|group| group.name == name)
    }

    /// Groups in definition order
    pub fn iter(&self) -> impl Iterator<Item = &ConsolidationGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::layout::RecordLayout;

    fn layouts() -> LayoutRegistry {
        let none: [&str; 0] = [];
        LayoutRegistry::new(
            ["C010", "C100", "C170", "C500"]
                .into_iter()
                .map(|code| RecordLayout::new(code, ["REG"], none).unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_groups() {
        let registry = GroupRegistry::new([
            ConsolidationGroup::new("C", "C100", ["C170"], "C100_INDEX", "C010_INDEX", "C010"),
            ConsolidationGroup::new(
                "C500",
                "C500",
                Vec::<String>::new(),
                "C500_INDEX",
                "C010_INDEX",
                "C010",
            ),
        ]);
        assert!(registry.validate(&layouts()).is_ok());
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.iter().map(|g| g.name.as_str()).collect::<Vec<_>>(),
            vec!["C", "C500"]
        );
    }

    #[test]
    fn test_unknown_record_rejected() {
        let registry = GroupRegistry::new([ConsolidationGroup::new(
            "C",
            "C100",
            ["C190"],
            "C100_INDEX",
            "C010_INDEX",
            "C010",
        )]);
        assert!(registry.validate(&layouts()).is_err());
    }

    #[test]
    fn test_shared_index_name_requires_same_header() {
        let registry = GroupRegistry::new([ConsolidationGroup::new(
            "C",
            "C100",
            ["C170"],
            "C100_INDEX",
            "C100_INDEX",
            "C010",
        )]);
        assert!(registry.validate(&layouts()).is_err());

        let self_headed = GroupRegistry::new([ConsolidationGroup::new(
            "C",
            "C100",
            ["C170"],
            "C100_INDEX",
            "C100_INDEX",
            "C100",
        )]);
        assert!(self_headed.validate(&layouts()).is_ok());
    }

    #[test]
    fn test_inconsistent_counter_column_rejected() {
        let registry = GroupRegistry::new([
            ConsolidationGroup::new("C", "C100", ["C170"], "C100_INDEX", "C010_INDEX", "C010"),
            ConsolidationGroup::new(
                "C500",
                "C500",
                Vec::<String>::new(),
                "C500_INDEX",
                "HEADER_INDEX",
                "C010",
            ),
        ]);
        assert!(registry.validate(&layouts()).is_err());
    }
}
