/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Probability distributions over [`Value`]s.
//!
//! A [`Distribution`] can be used three ways:
//!
//! - as an infinite dimension, with [`Distribution::into_dimension`];
//!   such a dimension samples by drawing, and can be frozen into a
//!   fixed one with [`Dimension::sample_n`];
//! - as an infinite iterator of draws, with [`Distribution::draws`];
//! - as a field function, with [`field_fn`], assigning a fresh draw
//!   to every row of a map.
//!
//! ```
//! use hypergrid::Fields;
//! use hypergrid::generators::Uniform;
//! use hypergrid::generators::distribution::field_fn;
//! use hypergrid::grid;
//!
//! let g = grid!(trial = 0..100).unwrap();
//! let g = g
//!     .map_to(Fields::new().with("lr", field_fn(Uniform::new(1.0, 10.0).unwrap())))
//!     .unwrap();
//! assert!(g.iter().all(|row| (1.0..=10.0).contains(&row["lr"].to_f64().unwrap())));
//! ```

use std::fmt;

use rand::Rng;
use rand::RngCore;

use crate::dimension::Dimension;
use crate::row::Row;
use crate::schema::SchemaError;
use crate::value::Value;

/// Errors raised when building a distribution.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum DistributionError {
    #[error("invalid range [{low}, {high}]: low must not exceed high")]
    InvalidRange { low: String, high: String },

    #[error("bound {bound} is not finite")]
    NonFinite { bound: f64 },

    #[error("log-uniform bounds must be positive, got {low}")]
    NonPositive { low: f64 },

    #[error("choice requires at least one value")]
    NoChoices,
}

/// A source of independent random values.
pub trait Distribution: Send + Sync + fmt::Debug {
    /// Draw one value.
    fn draw(&self, rng: &mut dyn RngCore) -> Value;

    /// An infinite iterator of draws from the thread-local generator.
    fn draws(&self) -> Box<dyn Iterator<Item = Value> + '_>
    where
        Self: Sized,
    {
        Box::new(std::iter::repeat_with(move || {
            self.draw(&mut rand::thread_rng())
        }))
    }

    /// A dimension named `name` drawing from this distribution.
    fn into_dimension<N>(self, name: N) -> Result<Dimension, SchemaError>
    where
        N: Into<String>,
        Self: Sized + 'static,
    {
        Dimension::distribution(name, self)
    }
}

/// A field function ignoring its row and returning a fresh draw from
/// `distribution` on every call.
pub fn field_fn<D>(distribution: D) -> impl Fn(&Row) -> Value + Send + Sync + 'static
where
    D: Distribution + 'static,
{
    move |_row: &Row| distribution.draw(&mut rand::thread_rng())
}

fn check_finite(bound: f64) -> Result<f64, DistributionError> {
    if bound.is_finite() {
        Ok(bound)
    } else {
        Err(DistributionError::NonFinite { bound })
    }
}

fn check_range<T: PartialOrd + fmt::Display>(low: T, high: T) -> Result<(), DistributionError> {
    if low > high {
        return Err(DistributionError::InvalidRange {
            low: low.to_string(),
            high: high.to_string(),
        });
    }
    Ok(())
}

/// Floats drawn uniformly from `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniform {
    low: f64,
    high: f64,
}

impl Uniform {
    pub fn new(low: f64, high: f64) -> Result<Self, DistributionError> {
        let (low, high) = (check_finite(low)?, check_finite(high)?);
        check_range(low, high)?;
        Ok(Self { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }
}

impl Distribution for Uniform {
    fn draw(&self, rng: &mut dyn RngCore) -> Value {
        Value::Float(rng.gen_range(self.low..=self.high))
    }
}

/// Floats whose logarithm is uniform over `[ln low, ln high]`. Both
/// bounds must be positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogUniform {
    low: f64,
    high: f64,
}

impl LogUniform {
    pub fn new(low: f64, high: f64) -> Result<Self, DistributionError> {
        let (low, high) = (check_finite(low)?, check_finite(high)?);
        if low <= 0.0 {
            return Err(DistributionError::NonPositive { low });
        }
        check_range(low, high)?;
        Ok(Self { low, high })
    }
}

impl Distribution for LogUniform {
    fn draw(&self, rng: &mut dyn RngCore) -> Value {
        let exponent = rng.gen_range(self.low.ln()..=self.high.ln());
        // exp(ln x) can land just outside the bounds.
        Value::Float(exponent.exp().clamp(self.low, self.high))
    }
}

/// Integers drawn uniformly from `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntUniform {
    low: i64,
    high: i64,
}

impl IntUniform {
    pub fn new(low: i64, high: i64) -> Result<Self, DistributionError> {
        check_range(low, high)?;
        Ok(Self { low, high })
    }
}

impl Distribution for IntUniform {
    fn draw(&self, rng: &mut dyn RngCore) -> Value {
        Value::Int(rng.gen_range(self.low..=self.high))
    }
}

/// One of a fixed set of values, each equally likely.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    values: Vec<Value>,
}

impl Choice {
    pub fn new<I>(values: I) -> Result<Self, DistributionError>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(DistributionError::NoChoices);
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

impl Distribution for Choice {
    fn draw(&self, rng: &mut dyn RngCore) -> Value {
        self.values[rng.gen_range(0..self.values.len())].clone()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::Fields;
    use crate::grid;

    #[test]
    fn test_uniform_distribution() {
        let ud = Uniform::new(1.0, 10.0).unwrap();
        assert!(
            ud.draws()
                .take(100)
                .all(|v| (1.0..=10.0).contains(&v.to_f64().unwrap()))
        );
    }

    #[test]
    fn test_degenerate_ranges() {
        let point = Uniform::new(2.0, 2.0).unwrap();
        assert_eq!(point.draw(&mut StdRng::seed_from_u64(1)), Value::Float(2.0));
        let point = IntUniform::new(5, 5).unwrap();
        assert_eq!(point.draw(&mut StdRng::seed_from_u64(1)), Value::Int(5));
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            Uniform::new(10.0, 1.0),
            Err(DistributionError::InvalidRange { .. })
        ));
        assert!(matches!(
            Uniform::new(0.0, f64::INFINITY),
            Err(DistributionError::NonFinite { .. })
        ));
        assert_eq!(
            LogUniform::new(0.0, 1.0).unwrap_err(),
            DistributionError::NonPositive { low: 0.0 }
        );
        assert_eq!(
            IntUniform::new(3, 1).unwrap_err().to_string(),
            "invalid range [3, 1]: low must not exceed high"
        );
        assert_eq!(
            Choice::new(Vec::<i32>::new()).unwrap_err(),
            DistributionError::NoChoices
        );
    }

    #[test]
    fn test_log_uniform_stays_in_range() {
        let d = LogUniform::new(1e-4, 1e-1).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            let x = d.draw(&mut rng).to_f64().unwrap();
            assert!((1e-4..=1e-1).contains(&x), "{x}");
        }
    }

    #[test]
    fn test_int_uniform_covers_range() {
        let d = IntUniform::new(1, 4).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let seen: HashSet<i64> = (0..200)
            .map(|_| *d.draw(&mut rng).as_int().unwrap())
            .collect();
        assert_eq!(seen, HashSet::from([1, 2, 3, 4]));
    }

    #[test]
    fn test_choice() {
        let d = Choice::new(["adam", "sgd"]).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..100 {
            let v = d.draw(&mut rng);
            assert!(d.values().contains(&v));
        }
    }

    #[test]
    fn test_distribution_as_field_fn() {
        let ud = Uniform::new(1.0, 10.0).unwrap();
        let g = grid!(test = 0..100).unwrap();
        let g = g.map(Fields::new().with("result", field_fn(ud))).unwrap();
        let rows = g.rows();
        assert_eq!(rows.len(), 100);
        assert!(
            rows.iter()
                .all(|row| (1.0..=10.0).contains(&row["result"].to_f64().unwrap()))
        );
        // Each row gets its own draw.
        let distinct: HashSet<u64> = rows
            .iter()
            .map(|row| row["result"].to_f64().unwrap().to_bits())
            .collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn test_distribution_dimension_in_grid() {
        let g = grid!(x = [1, 2])
            .unwrap()
            .product(IntUniform::new(0, 9).unwrap().into_dimension("k").unwrap())
            .unwrap();
        assert!(g.len().is_err());
        let row = g.sample().unwrap();
        assert!(matches!(row["k"], Value::Int(0..=9)));
    }
}
