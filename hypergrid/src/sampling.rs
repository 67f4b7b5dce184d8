/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Drawing single rows at random.
//!
//! [`Grid::sample`] is defined recursively, node by node:
//!
//! - **Base**: every dimension is sampled independently (see
//!   [`Dimension::sample_with`](crate::Dimension::sample_with)).
//! - **Sum**: one side is picked with probability 1/2, regardless of
//!   the sizes of the two sides, and sampled. Unless both sides have
//!   the same length, this does not match the distribution of rows
//!   seen by iteration.
//! - **Product**: both sides are sampled independently and joined.
//! - **Zip**: both sides are sampled independently and joined. When
//!   the sides differ in length, or their rows are correlated by
//!   position, this can produce rows that iteration never yields.
//! - **Filter**: rejection sampling. The child is sampled until a
//!   row passes the predicate, up to the node's attempt budget, after
//!   which [`GridError::SamplingExhausted`] is returned.
//! - **Select**, **Map**, **MapAugment**: the child is sampled and
//!   the row rewritten as during iteration.
//!
//! Errors raised by a child propagate unchanged.

use std::fmt;

use rand::Rng;
use rand::RngCore;
use rand::seq::SliceRandom;

use crate::grid::Grid;
use crate::grid::GridError;
use crate::grid::GridNode;
use crate::grid::align;
use crate::row::Row;
use crate::value::Value;

/// How a fixed dimension picks one of its values.
///
/// Strategies are attached to a dimension when it is built (see
/// [`FixedDimension::with_strategy`](crate::FixedDimension::with_strategy)).
pub trait SamplingStrategy: Send + Sync + fmt::Debug {
    /// Pick a value from `values`, or `None` if no value can be
    /// picked.
    fn choose(&self, values: &[Value], rng: &mut dyn RngCore) -> Option<Value>;
}

/// Uniform choice with replacement. The default strategy.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChooseWithReplacement;

impl SamplingStrategy for ChooseWithReplacement {
    fn choose(&self, values: &[Value], rng: &mut dyn RngCore) -> Option<Value> {
        values.choose(rng).cloned()
    }
}

impl Grid {
    /// Draw one row using the thread-local generator.
    pub fn sample(&self) -> Result<Row, GridError> {
        self.sample_with(&mut rand::thread_rng())
    }

    /// Draw one row using `rng`.
    pub fn sample_with<R: RngCore>(&self, rng: &mut R) -> Result<Row, GridError> {
        self.sample_dyn(rng)
    }

    fn sample_dyn(&self, rng: &mut dyn RngCore) -> Result<Row, GridError> {
        let schema = self.schema();
        match self.node() {
            GridNode::Base { dimensions } => {
                let values = dimensions
                    .iter()
                    .map(|d| d.sample_with(rng))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Row::new(schema.clone(), values))
            }
            GridNode::Sum {
                left,
                right,
                alignment,
            } => {
                if rng.gen_bool(0.5) {
                    left.sample_dyn(rng)
                } else {
                    Ok(align(schema, alignment.as_deref(), right.sample_dyn(rng)?))
                }
            }
            GridNode::Product { left, right } | GridNode::Zip { left, right } => {
                let l = left.sample_dyn(rng)?;
                let r = right.sample_dyn(rng)?;
                Ok(Row::join(schema, &l, r))
            }
            GridNode::Filter {
                grid,
                predicate,
                max_attempts,
            } => {
                for attempt in 1..=*max_attempts {
                    let row = grid.sample_dyn(rng)?;
                    if predicate(&row) {
                        if attempt > 1 {
                            tracing::debug!(attempt, "filter accepted a sampled row after retries");
                        }
                        return Ok(row);
                    }
                }
                tracing::warn!(
                    max_attempts = *max_attempts,
                    grid = %grid,
                    "filter rejected every sampled row"
                );
                Err(GridError::SamplingExhausted {
                    attempts: *max_attempts,
                })
            }
            GridNode::Select { grid }
            | GridNode::Map { grid, .. }
            | GridNode::MapAugment { grid, .. } => Ok(self.transform(grid.sample_dyn(rng)?)),
        }
    }
}
