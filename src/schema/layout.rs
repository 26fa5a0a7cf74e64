//! Record layouts and the registry that resolves record codes to them

use crate::constants::{RECORD_CODE_FIELD, RECORD_CODE_LEN};
use crate::error::{Result, SpedError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Ordered field schema of one record type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordLayout {
    /// Four-character record code, e.g. `C100`
    pub code: String,

    /// Field names in file order, starting with `REG`
    pub fields: Vec<String>,

    /// Subset of `fields` holding locale-formatted numbers
    #[serde(default)]
    pub numeric_fields: Vec<String>,
}

impl RecordLayout {
    /// Build a layout, rejecting malformed codes, repeated fields and
    /// numeric fields that are not part of the layout
    pub fn new<F, N>(code: impl Into<String>, fields: F, numeric_fields: N) -> Result<Self>
    where
        F: IntoIterator,
        F::Item: Into<String>,
        N: IntoIterator,
        N::Item: Into<String>,
    {
        let layout = Self {
            code: code.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            numeric_fields: numeric_fields.into_iter().map(Into::into).collect(),
        };
        layout.validate()?;
        Ok(layout)
    }

    pub fn validate(&self) -> Result<()> {
        if self.code.chars().count() != RECORD_CODE_LEN {
            return Err(SpedError::configuration(format!(
                "Record code '{}' must be {} characters",
                self.code, RECORD_CODE_LEN
            )));
        }
        if self.fields.is_empty() {
            return Err(SpedError::configuration(format!(
                "Layout {} has no fields",
                self.code
            )));
        }

        let mut seen = HashSet::with_capacity(self.fields.len());
        for field in &self.fields {
            if !seen.insert(field.as_str()) {
                return Err(SpedError::configuration(format!(
                    "Layout {} repeats field {}",
                    self.code, field
                )));
            }
        }

        if let Some(stray) = self
            .numeric_fields
            .iter()
            .find(|name| !seen.contains(name.as_str()))
        {
            return Err(SpedError::configuration(format!(
                "Layout {} declares numeric field {} that is not in its fields",
                self.code, stray
            )));
        }

        Ok(())
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field == name)
    }

    pub fn is_numeric(&self, name: &str) -> bool {
        self.numeric_fields.iter().any(|field| field == name)
    }

    /// True when the layout carries the conventional `REG` column
    pub fn has_record_code_field(&self) -> bool {
        self.field_index(RECORD_CODE_FIELD).is_some()
    }
}

/// Read-only lookup from record code to layout
#[derive(Debug, Clone, Default)]
pub struct LayoutRegistry {
    layouts: BTreeMap<String, RecordLayout>,
}

impl LayoutRegistry {
    /// Build a registry; duplicate codes are a configuration error
    pub fn new(layouts: impl IntoIterator<Item = RecordLayout>) -> Result<Self> {
        let mut registry = BTreeMap::new();
        for layout in layouts {
            layout.validate()?;
            let code = layout.code.clone();
            if registry.insert(code.clone(), layout).is_some() {
                return Err(SpedError::configuration(format!(
                    "Record code {} is defined more than once",
                    code
                )));
            }
        }
        Ok(Self { layouts: registry })
    }

    pub fn get(&self, code: &str) -> Option<&RecordLayout> {
        self.layouts.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.layouts.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    /// Layouts in record code order
    pub fn iter(&self) -> impl Iterator<Item = &RecordLayout> {
        self.layouts.values()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.layouts.keys().map(String::as_str)
    }
}
