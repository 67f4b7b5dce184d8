/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Conversion to flat parameter grids.
//!
//! A [`ParameterGrid`] maps each parameter name to a finite list of
//! values and denotes the cartesian product of those lists, iterated
//! in sorted key order with the last key varying fastest. This is the
//! search-space format of scikit-learn's `ParameterGrid`.
//!
//! Only the fragment of the algebra that a flat mapping can express
//! converts: base grids of fixed dimensions, and products of such
//! grids. Every other node is rejected with
//! [`ConversionError::UnsupportedNode`].

use std::collections::BTreeMap;

use itertools::Itertools;
use serde::Deserialize;
use serde::Serialize;

use crate::dimension::Dimension;
use crate::grid::Grid;
use crate::grid::GridNode;
use crate::row::Row;
use crate::schema::Schema;
use crate::schema::SchemaError;
use crate::value::Value;

/// Errors converting a [`Grid`] into a [`ParameterGrid`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum ConversionError {
    #[error("{kind} nodes cannot be expressed as a parameter grid")]
    UnsupportedNode { kind: &'static str },

    #[error("dimension `{dimension}` is not finite and cannot be listed")]
    InfiniteDimension { dimension: String },

    #[error("field `{field}` appears on both sides of a product")]
    DuplicateField { field: String },
}

/// A flat `{name: [values]}` search space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterGrid {
    params: BTreeMap<String, Vec<Value>>,
}

impl ParameterGrid {
    pub fn new(params: BTreeMap<String, Vec<Value>>) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &BTreeMap<String, Vec<Value>> {
        &self.params
    }

    /// Parameter names, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    /// The number of parameter combinations, or `None` if it does not
    /// fit in a `usize`.
    pub fn checked_len(&self) -> Option<usize> {
        self.params
            .values()
            .try_fold(1usize, |n, values| n.checked_mul(values.len()))
    }

    /// The number of parameter combinations, saturating at
    /// `usize::MAX`.
    pub fn len(&self) -> usize {
        self.checked_len().unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.params.values().any(Vec::is_empty)
    }

    /// Iterate over all combinations, as rows whose fields are the
    /// sorted parameter names.
    pub fn iter(&self) -> impl Iterator<Item = Row> + '_ {
        let schema = Schema::from_unique(self.params.keys().cloned().collect());
        self.params
            .values()
            .map(|values| values.iter().cloned())
            .multi_cartesian_product()
            .map(move |values| Row::new(schema.clone(), values))
    }

    /// The equivalent base grid, with one fixed dimension per
    /// parameter in sorted key order.
    pub fn to_grid(&self) -> Result<Grid, SchemaError> {
        let dimensions = self
            .params
            .iter()
            .map(|(name, values)| Dimension::fixed(name.clone(), values.iter().cloned()))
            .collect::<Result<Vec<_>, _>>()?;
        Grid::new(dimensions)
    }

    fn insert(&mut self, name: &str, values: Vec<Value>) -> Result<(), ConversionError> {
        if self.params.contains_key(name) {
            return Err(ConversionError::DuplicateField {
                field: name.to_string(),
            });
        }
        self.params.insert(name.to_string(), values);
        Ok(())
    }

    fn collect(&mut self, grid: &Grid) -> Result<(), ConversionError> {
        match grid.node() {
            GridNode::Base { dimensions } => {
                for dimension in dimensions {
                    let Dimension::Fixed(fixed) = dimension else {
                        return Err(ConversionError::InfiniteDimension {
                            dimension: dimension.name().to_string(),
                        });
                    };
                    self.insert(fixed.name(), fixed.values().to_vec())?;
                }
                Ok(())
            }
            // Both sides convert on their own before being merged.
            GridNode::Product { left, right } => {
                let right = ParameterGrid::try_from(right)?;
                self.collect(left)?;
                for (name, values) in right.params {
                    self.insert(&name, values)?;
                }
                Ok(())
            }
            node => Err(ConversionError::UnsupportedNode { kind: node.kind() }),
        }
    }
}

impl TryFrom<&Grid> for ParameterGrid {
    type Error = ConversionError;

    fn try_from(grid: &Grid) -> Result<Self, Self::Error> {
        let mut param_grid = ParameterGrid::default();
        param_grid.collect(grid)?;
        tracing::debug!(%grid, params = param_grid.params.len(), "converted to parameter grid");
        Ok(param_grid)
    }
}

impl Grid {
    /// This grid as a flat parameter grid. Fails for nodes other than
    /// base grids and products, and for non-fixed dimensions.
    pub fn to_param_grid(&self) -> Result<ParameterGrid, ConversionError> {
        ParameterGrid::try_from(self)
    }
}
