/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use itertools::Itertools;
use serde::Deserialize;
use serde::Serialize;

/// Errors raised while building dimensions and grid nodes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum SchemaError {
    #[error("a grid requires at least one dimension")]
    NoDimensions,

    #[error("dimension name must be non-empty")]
    EmptyName,

    #[error("duplicate field `{field}`")]
    DuplicateField { field: String },

    #[error("mismatched fields: {left:?} != {right:?}")]
    MismatchedFields {
        left: Vec<String>,
        right: Vec<String>,
    },

    #[error("overlapping fields {fields:?}")]
    OverlappingFields { fields: Vec<String> },

    #[error("unknown fields {fields:?}, available: {available:?}")]
    UnknownFields {
        fields: Vec<String>,
        available: Vec<String>,
    },
}

/// The ordered, duplicate-free field names of the rows a grid
/// produces.
///
/// Schemas are derived from the structure of a grid and never
/// change after the grid is built. Cloning is cheap.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Schema {
    fields: Arc<[String]>,
}

impl Schema {
    /// Creates a schema from the given field names. Fails if any
    /// name repeats.
    pub fn new<I, S>(fields: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if let Some(field) = fields.iter().duplicates().next() {
            return Err(SchemaError::DuplicateField {
                field: field.clone(),
            });
        }
        Ok(Self::from_unique(fields))
    }

    pub(crate) fn from_unique(fields: Vec<String>) -> Self {
        Self {
            fields: fields.into(),
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.position(field).is_some()
    }

    /// The position of `field` in this schema.
    pub fn position(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == field)
    }

    /// True if both schemas hold the same set of fields, in any
    /// order.
    pub fn same_fields(&self, other: &Schema) -> bool {
        self.len() == other.len() && self.fields.iter().all(|f| other.contains(f))
    }

    /// Requires `other` to hold the same fields as `self`, and
    /// returns, for each field of `self`, its position in `other`.
    pub(crate) fn alignment(&self, other: &Schema) -> Result<Vec<usize>, SchemaError> {
        if !self.same_fields(other) {
            return Err(SchemaError::MismatchedFields {
                left: self.fields.to_vec(),
                right: other.fields.to_vec(),
            });
        }
        Ok(self
            .fields
            .iter()
            .filter_map(|f| other.position(f))
            .collect())
    }

    /// The fields of `self` followed by the fields of `other`. The
    /// two schemas must be disjoint.
    pub fn concat(&self, other: &Schema) -> Result<Schema, SchemaError> {
        self.extend(other.fields.iter().cloned())
    }

    /// The fields of `self` followed by `new` fields, which must be
    /// unique and must not already appear in `self`.
    pub fn extend<I, S>(&self, new: I) -> Result<Schema, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let new = Schema::new(new)?;
        let overlap: Vec<String> = new
            .fields
            .iter()
            .filter(|f| self.contains(f))
            .cloned()
            .collect();
        if !overlap.is_empty() {
            return Err(SchemaError::OverlappingFields { fields: overlap });
        }
        Ok(Self::from_unique(
            self.fields.iter().chain(new.fields.iter()).cloned().collect(),
        ))
    }

    /// The subset of this schema named by `selected`, in this
    /// schema's order. `selected` must be duplicate-free and a
    /// subset of `self`.
    pub fn project<I, S>(&self, selected: I) -> Result<Schema, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let selected = Schema::new(selected)?;
        let unknown: Vec<String> = selected
            .fields
            .iter()
            .filter(|f| !self.contains(f))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(SchemaError::UnknownFields {
                fields: unknown,
                available: self.fields.to_vec(),
            });
        }
        let keep: HashSet<&str> = selected.fields.iter().map(String::as_str).collect();
        Ok(Self::from_unique(
            self.fields
                .iter()
                .filter(|f| keep.contains(f.as_str()))
                .cloned()
                .collect(),
        ))
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.fields.iter().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(fields: &[&str]) -> Schema {
        Schema::new(fields.iter().copied()).unwrap()
    }

    #[test]
    fn test_new_rejects_duplicates() {
        assert_eq!(
            Schema::new(["x", "y", "x"]),
            Err(SchemaError::DuplicateField {
                field: "x".to_string()
            })
        );
        assert_eq!(schema(&["x", "y"]).fields(), &["x", "y"]);
    }

    #[test]
    fn test_same_fields_ignores_order() {
        assert!(schema(&["x", "y"]).same_fields(&schema(&["y", "x"])));
        assert!(!schema(&["x", "y"]).same_fields(&schema(&["x"])));
        assert!(!schema(&["x", "y"]).same_fields(&schema(&["x", "z"])));
    }

    #[test]
    fn test_alignment() {
        let left = schema(&["x", "y", "z"]);
        let right = schema(&["z", "x", "y"]);
        assert_eq!(left.alignment(&right).unwrap(), vec![1, 2, 0]);
        assert!(matches!(
            left.alignment(&schema(&["x"])),
            Err(SchemaError::MismatchedFields { .. })
        ));
    }

    #[test]
    fn test_concat() {
        let s = schema(&["x"]).concat(&schema(&["y", "z"])).unwrap();
        assert_eq!(s.fields(), &["x", "y", "z"]);
        assert_eq!(
            schema(&["x", "y"]).concat(&schema(&["y"])),
            Err(SchemaError::OverlappingFields {
                fields: vec!["y".to_string()]
            })
        );
    }

    #[test]
    fn test_project_preserves_order() {
        let s = schema(&["x", "y", "z"]);
        assert_eq!(s.project(["z", "x"]).unwrap().fields(), &["x", "z"]);
        assert!(matches!(
            s.project(["w"]),
            Err(SchemaError::UnknownFields { .. })
        ));
        assert!(matches!(
            s.project(["x", "x"]),
            Err(SchemaError::DuplicateField { .. })
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(schema(&["x", "y"]).to_string(), "(x, y)");
        assert_eq!(
            SchemaError::OverlappingFields {
                fields: vec!["x".into()]
            }
            .to_string(),
            "overlapping fields [\"x\"]"
        );
    }
}
