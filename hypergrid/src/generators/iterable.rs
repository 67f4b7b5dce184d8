/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Infinite numeric sequences, for zipping against finite grids or
//! truncating into fixed dimensions.
//!
//! ```
//! use hypergrid::generators::ExponentialStep;
//! use hypergrid::grid;
//!
//! let lr = ExponentialStep::new(0.1, 0.5).with_name("lr");
//! let g = grid!(epoch = 0..4).unwrap().zip(lr.into_dimension().unwrap()).unwrap();
//! assert_eq!(g.len().unwrap(), 4);
//! ```

use std::fmt;

use crate::dimension::Dimension;
use crate::schema::SchemaError;

/// The name given to sequences that were not named explicitly.
pub const ANONYMOUS: &str = "anonymous";

/// The geometric sequence `start * step^i` for `i = 0, 1, 2, ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialStep {
    start: f64,
    step: f64,
    name: String,
}

impl ExponentialStep {
    pub fn new(start: f64, step: f64) -> Self {
        Self {
            start,
            step,
            name: ANONYMOUS.to_string(),
        }
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + Send + 'static {
        let (start, step) = (self.start, self.step);
        (0..).map(move |i| start * step.powi(i))
    }

    /// A fixed dimension of the first `n` terms.
    pub fn take(&self, n: usize) -> Result<Dimension, SchemaError> {
        Dimension::fixed(self.name.clone(), self.iter().take(n))
    }

    /// An unbounded dimension over the whole sequence.
    pub fn into_dimension(self) -> Result<Dimension, SchemaError> {
        let seq = self.clone();
        Dimension::unbounded(self.name, move || seq.iter())
    }
}

impl fmt::Display for ExponentialStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} * {}^i", self.name, self.start, self.step)
    }
}

/// The arithmetic sequence `start + step * i` for `i = 0, 1, 2, ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearStep {
    start: f64,
    step: f64,
    name: String,
}

impl LinearStep {
    pub fn new(start: f64, step: f64) -> Self {
        Self {
            start,
            step,
            name: ANONYMOUS.to_string(),
        }
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + Send + 'static {
        let (start, step) = (self.start, self.step);
        (0_u32..).map(move |i| start + step * f64::from(i))
    }

    /// A fixed dimension of the first `n` terms.
    pub fn take(&self, n: usize) -> Result<Dimension, SchemaError> {
        Dimension::fixed(self.name.clone(), self.iter().take(n))
    }

    /// An unbounded dimension over the whole sequence.
    pub fn into_dimension(self) -> Result<Dimension, SchemaError> {
        let seq = self.clone();
        Dimension::unbounded(self.name, move || seq.iter())
    }
}

impl fmt::Display for LinearStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} + {}i", self.name, self.start, self.step)
    }
}
