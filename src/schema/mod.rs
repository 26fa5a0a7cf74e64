//! Record schema: layouts per record code and the consolidation groups
//! built on top of them.
//!
//! A schema is supplied by the caller. [`SpedSchema::default`] bundles the
//! EFD layouts, and [`SpedSchema::from_yaml_str`] loads a custom one.

pub mod defaults;
pub mod group;
pub mod layout;

pub use group::{ConsolidationGroup, GroupRegistry};
pub use layout::{LayoutRegistry, RecordLayout};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Layouts and groups as supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpedSchema {
    pub layouts: Vec<RecordLayout>,

    #[serde(default)]
    pub groups: Vec<ConsolidationGroup>,
}

impl Default for SpedSchema {
    fn default() -> Self {
        Self {
            layouts: defaults::default_layouts(),
            groups: defaults::default_groups(),
        }
    }
}

impl SpedSchema {
    pub fn new(layouts: Vec<RecordLayout>, groups: Vec<ConsolidationGroup>) -> Self {
        Self { layouts, groups }
    }

    /// Validate and split into the two read-only registries
    pub fn into_registries(self) -> Result<(LayoutRegistry, GroupRegistry)> {
        let layouts = LayoutRegistry::new(self.layouts)?;
        let groups = GroupRegistry::new(self.groups);
        groups.validate(&layouts)?;
        Ok((layouts, groups))
    }

    pub fn validate(&self) -> Result<()> {
        self.clone().into_registries().map(|_| ())
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let schema: Self = serde_yaml::from_str(yaml)?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }
}
