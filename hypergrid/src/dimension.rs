/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Named axes of a grid.
//!
//! A [`Dimension`] pairs one name with one source of values. There
//! are three kinds of source:
//!
//! - [`FixedDimension`]: a finite, materialized collection. It has a
//!   length and samples through its [`SamplingStrategy`] (uniform
//!   choice with replacement unless another strategy is given).
//! - [`UnboundedDimension`]: a factory producing a possibly infinite
//!   iterator. It has no length and cannot be sampled. Whether
//!   re-iterating replays the same values is up to the factory.
//! - [`DistributionDimension`]: an infinite stream of draws from a
//!   [`Distribution`]. It samples by drawing directly.

use std::fmt;
use std::sync::Arc;

use itertools::Itertools;
use rand::RngCore;

use crate::generators::distribution::Distribution;
use crate::grid::Grid;
use crate::grid::GridError;
use crate::grid::Operation;
use crate::sampling::ChooseWithReplacement;
use crate::sampling::SamplingStrategy;
use crate::schema::SchemaError;
use crate::value::Value;

type ValueSource = Arc<dyn Fn() -> Box<dyn Iterator<Item = Value>> + Send + Sync>;

fn validate_name(name: String) -> Result<String, SchemaError> {
    if name.is_empty() {
        return Err(SchemaError::EmptyName);
    }
    Ok(name)
}

/// A finite dimension over a materialized collection of values.
#[derive(Clone)]
pub struct FixedDimension {
    name: String,
    values: Arc<[Value]>,
    strategy: Arc<dyn SamplingStrategy>,
}

impl FixedDimension {
    pub fn new<N, I>(name: N, values: I) -> Result<Self, SchemaError>
    where
        N: Into<String>,
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Ok(Self {
            name: validate_name(name.into())?,
            values: values.into_iter().map(Into::into).collect(),
            strategy: Arc::new(ChooseWithReplacement),
        })
    }

    /// Use `strategy` instead of uniform choice when sampling.
    pub fn with_strategy<S: SamplingStrategy + 'static>(self, strategy: S) -> Self {
        Self {
            strategy: Arc::new(strategy),
            ..self
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn strategy(&self) -> &dyn SamplingStrategy {
        &*self.strategy
    }
}

impl fmt::Debug for FixedDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedDimension")
            .field("name", &self.name)
            .field("values", &self.values)
            .field("strategy", &self.strategy)
            .finish()
    }
}

/// A possibly infinite dimension backed by an iterator factory.
#[derive(Clone)]
pub struct UnboundedDimension {
    name: String,
    source: ValueSource,
}

impl UnboundedDimension {
    /// `source` is called once per iteration of the dimension.
    pub fn new<N, F, I>(name: N, source: F) -> Result<Self, SchemaError>
    where
        N: Into<String>,
        F: Fn() -> I + Send + Sync + 'static,
        I: IntoIterator,
        I::IntoIter: 'static,
        I::Item: Into<Value> + 'static,
    {
        Ok(Self {
            name: validate_name(name.into())?,
            source: Arc::new(move || -> Box<dyn Iterator<Item = Value>> {
                Box::new(source().into_iter().map(Into::<Value>::into))
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for UnboundedDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnboundedDimension")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// An infinite dimension of independent draws from a distribution.
#[derive(Clone)]
pub struct DistributionDimension {
    name: String,
    distribution: Arc<dyn Distribution>,
}

impl DistributionDimension {
    pub fn new<N, D>(name: N, distribution: D) -> Result<Self, SchemaError>
    where
        N: Into<String>,
        D: Distribution + 'static,
    {
        Ok(Self {
            name: validate_name(name.into())?,
            distribution: Arc::new(distribution),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn distribution(&self) -> &dyn Distribution {
        &*self.distribution
    }

    /// A fixed dimension of `k` draws, under the same name.
    pub fn sample_n(&self, k: usize) -> FixedDimension {
        let mut rng = rand::thread_rng();
        let values: Vec<Value> = (0..k).map(|_| self.distribution.draw(&mut rng)).collect();
        FixedDimension {
            name: self.name.clone(),
            values: values.into(),
            strategy: Arc::new(ChooseWithReplacement),
        }
    }
}

impl fmt::Debug for DistributionDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistributionDimension")
            .field("name", &self.name)
            .field("distribution", &self.distribution)
            .finish()
    }
}

/// A named axis of values.
#[derive(Clone, Debug)]
pub enum Dimension {
    Fixed(FixedDimension),
    Unbounded(UnboundedDimension),
    Distribution(DistributionDimension),
}

impl Dimension {
    /// A finite dimension over `values`.
    ///
    /// ```
    /// let d = hypergrid::Dimension::fixed("act", ["relu", "gelu"]).unwrap();
    /// assert_eq!(d.len().unwrap(), 2);
    /// ```
    pub fn fixed<N, I>(name: N, values: I) -> Result<Self, SchemaError>
    where
        N: Into<String>,
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        FixedDimension::new(name, values).map(Dimension::Fixed)
    }

    /// A dimension over the iterators produced by `source`, which may
    /// be infinite.
    ///
    /// ```
    /// let d = hypergrid::Dimension::unbounded("seed", || 0..).unwrap();
    /// assert!(d.len().is_err());
    /// ```
    pub fn unbounded<N, F, I>(name: N, source: F) -> Result<Self, SchemaError>
    where
        N: Into<String>,
        F: Fn() -> I + Send + Sync + 'static,
        I: IntoIterator,
        I::IntoIter: 'static,
        I::Item: Into<Value> + 'static,
    {
        UnboundedDimension::new(name, source).map(Dimension::Unbounded)
    }

    /// A dimension of draws from `distribution`.
    pub fn distribution<N, D>(name: N, distribution: D) -> Result<Self, SchemaError>
    where
        N: Into<String>,
        D: Distribution + 'static,
    {
        DistributionDimension::new(name, distribution).map(Dimension::Distribution)
    }

    pub fn name(&self) -> &str {
        match self {
            Dimension::Fixed(d) => d.name(),
            Dimension::Unbounded(d) => d.name(),
            Dimension::Distribution(d) => d.name(),
        }
    }

    /// Lazily iterate over this dimension's values. Fixed dimensions
    /// replay their collection; distribution dimensions never end.
    pub fn iter(&self) -> Box<dyn Iterator<Item = Value> + '_> {
        match self {
            Dimension::Fixed(d) => Box::new(d.values.iter().cloned()),
            Dimension::Unbounded(d) => (d.source)(),
            Dimension::Distribution(d) => {
                let distribution = Arc::clone(&d.distribution);
                Box::new(std::iter::repeat_with(move || {
                    distribution.draw(&mut rand::thread_rng())
                }))
            }
        }
    }

    /// The number of values. Only fixed dimensions have one.
    pub fn len(&self) -> Result<usize, GridError> {
        match self {
            Dimension::Fixed(d) => Ok(d.len()),
            _ => Err(self.unsupported(Operation::Len)),
        }
    }

    /// True for fixed dimensions without values.
    pub fn is_empty(&self) -> bool {
        matches!(self, Dimension::Fixed(d) if d.is_empty())
    }

    /// Draw one value using the thread-local generator.
    pub fn sample(&self) -> Result<Value, GridError> {
        self.sample_with(&mut rand::thread_rng())
    }

    /// Draw one value using `rng`.
    pub fn sample_with(&self, rng: &mut dyn RngCore) -> Result<Value, GridError> {
        match self {
            Dimension::Fixed(d) => d
                .strategy
                .choose(&d.values, rng)
                .ok_or_else(|| self.unsupported(Operation::Sample)),
            Dimension::Unbounded(_) => Err(self.unsupported(Operation::Sample)),
            Dimension::Distribution(d) => Ok(d.distribution.draw(rng)),
        }
    }

    /// A fixed dimension of `k` draws. Only distribution dimensions
    /// support this.
    pub fn sample_n(&self, k: usize) -> Result<Dimension, GridError> {
        match self {
            Dimension::Distribution(d) => Ok(Dimension::Fixed(d.sample_n(k))),
            _ => Err(self.unsupported(Operation::SampleN)),
        }
    }

    /// A one-dimensional base grid over this dimension.
    pub fn into_grid(self) -> Grid {
        Grid::from(self)
    }

    fn unsupported(&self, operation: Operation) -> GridError {
        let kind = match self {
            Dimension::Fixed(d) if d.is_empty() => "empty fixed",
            Dimension::Fixed(_) => "fixed",
            Dimension::Unbounded(_) => "unbounded",
            Dimension::Distribution(_) => "distribution",
        };
        GridError::Unsupported {
            operation,
            subject: format!("{} dimension `{}`", kind, self.name()),
        }
    }
}

impl From<FixedDimension> for Dimension {
    fn from(d: FixedDimension) -> Self {
        Dimension::Fixed(d)
    }
}

impl From<UnboundedDimension> for Dimension {
    fn from(d: UnboundedDimension) -> Self {
        Dimension::Unbounded(d)
    }
}

impl From<DistributionDimension> for Dimension {
    fn from(d: DistributionDimension) -> Self {
        Dimension::Distribution(d)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Fixed(d) => write!(f, "{}=[{}]", d.name, d.values.iter().join(", ")),
            Dimension::Unbounded(d) => write!(f, "{}=<unbounded>", d.name),
            Dimension::Distribution(d) => write!(f, "{}={:?}", d.name, d.distribution),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::generators::distribution::IntUniform;

    #[derive(Debug)]
    struct AlwaysLast;

    impl SamplingStrategy for AlwaysLast {
        fn choose(&self, values: &[Value], _rng: &mut dyn RngCore) -> Option<Value> {
            values.last().cloned()
        }
    }

    #[test]
    fn test_fixed_dimension() {
        let d = Dimension::fixed("test", [1, 2, 3]).unwrap();
        assert_eq!(d.name(), "test");
        assert_eq!(d.len().unwrap(), 3);
        assert_eq!(
            d.iter().collect::<Vec<_>>(),
            vec![Value::Int(1), Value::Int(2), Value::Int(3)]
        );
        // Re-iterating replays the same collection.
        assert_eq!(d.iter().count(), 3);

        let d = Dimension::fixed("test", 0..4).unwrap();
        assert_eq!(d.len().unwrap(), 4);
    }

    #[test]
    fn test_empty_name_rejected() {
        assert_eq!(
            Dimension::fixed("", [1]).unwrap_err(),
            SchemaError::EmptyName
        );
        assert!(Dimension::unbounded("", || 0..).is_err());
    }

    #[test]
    fn test_fixed_sampling_stays_in_range() {
        let d = Dimension::fixed("x", [1, 2, 3]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let v = d.sample_with(&mut rng).unwrap();
            assert!(matches!(v, Value::Int(1..=3)), "unexpected {v}");
        }
    }

    #[test]
    fn test_custom_strategy() {
        let d: Dimension = FixedDimension::new("x", [1, 2, 3])
            .unwrap()
            .with_strategy(AlwaysLast)
            .into();
        for _ in 0..10 {
            assert_eq!(d.sample().unwrap(), Value::Int(3));
        }
    }

    #[test]
    fn test_empty_fixed_cannot_sample() {
        let d = Dimension::fixed("x", Vec::<i32>::new()).unwrap();
        assert!(d.is_empty());
        assert_eq!(d.len().unwrap(), 0);
        assert!(matches!(
            d.sample(),
            Err(GridError::Unsupported {
                operation: Operation::Sample,
                ..
            })
        ));
    }

    #[test]
    fn test_unbounded_dimension() {
        let d = Dimension::unbounded("n", || (0..).step_by(2)).unwrap();
        assert_eq!(
            d.iter().take(3).collect::<Vec<_>>(),
            vec![Value::Int(0), Value::Int(2), Value::Int(4)]
        );
        assert!(matches!(
            d.len(),
            Err(GridError::Unsupported {
                operation: Operation::Len,
                ..
            })
        ));
        assert!(matches!(
            d.sample(),
            Err(GridError::Unsupported {
                operation: Operation::Sample,
                ..
            })
        ));
        assert_eq!(
            d.len().unwrap_err().to_string(),
            "len is not supported by unbounded dimension `n`"
        );
    }

    #[test]
    fn test_distribution_dimension() {
        let d = Dimension::distribution("k", IntUniform::new(1, 10).unwrap()).unwrap();
        assert!(d.len().is_err());
        assert!(
            d.iter()
                .take(100)
                .all(|v| matches!(v, Value::Int(1..=10)))
        );
        let v = d.sample().unwrap();
        assert!(matches!(v, Value::Int(1..=10)));

        let fixed = d.sample_n(5).unwrap();
        assert_eq!(fixed.name(), "k");
        assert_eq!(fixed.len().unwrap(), 5);

        let fixed_again = Dimension::fixed("x", [1]).unwrap();
        assert!(fixed_again.sample_n(3).is_err());
    }

    #[test]
    fn test_display() {
        let d = Dimension::fixed("x", [1, 2]).unwrap();
        assert_eq!(d.to_string(), "x=[1, 2]");
        let d = Dimension::unbounded("y", || 0..).unwrap();
        assert_eq!(d.to_string(), "y=<unbounded>");
    }

    #[test]
    fn test_into_grid() {
        let g = Dimension::fixed("x", [1, 2]).unwrap().into_grid();
        assert_eq!(g.dimension_names(), vec!["x"]);
        assert_eq!(g.len().unwrap(), 2);
    }
}
