/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Lazy combinatorial grids for parameter search spaces.
//!
//! A [`Grid`] is an immutable expression tree whose leaves are
//! named [`Dimension`]s and whose interior nodes are operators:
//! sum (concatenation), product (cartesian product), zip,
//! filter, select, map and map-to. Every node knows the
//! [`Schema`] of the [`Row`]s it produces, and schemas are checked
//! when the node is built, so malformed trees fail fast.
//!
//! Grids support two ways of reading rows:
//!
//! - [`Grid::iter`] enumerates all rows lazily, depth first.
//! - [`Grid::sample`] draws one row at random, recursively.
//!
//! ```
//! use hypergrid::grid;
//!
//! let lr = grid!(lr = [0.1, 0.01]).unwrap();
//! let depth = grid!(depth = [2, 4, 8]).unwrap();
//! let space = (lr * depth).unwrap();
//!
//! assert_eq!(space.len().unwrap(), 6);
//! assert_eq!(space.dimension_names(), vec!["lr", "depth"]);
//! for row in &space {
//!     println!("{}", row);
//! }
//! ```

mod dimension;
pub use dimension::Dimension;
pub use dimension::DistributionDimension;
pub use dimension::FixedDimension;
pub use dimension::UnboundedDimension;

/// Grid nodes, construction and iteration.
pub mod grid;
pub use grid::Fields;
pub use grid::FromRow;
pub use grid::Grid;
pub use grid::GridError;
pub use grid::GridNode;
pub use grid::Operation;
pub use grid::Rows;

/// Operator overloads (`+`, `|`, `*`, `&`) over grids and
/// dimensions.
mod ops;

/// Rows of named values.
pub mod row;
pub use row::Row;

/// Ordered field-name schemas.
pub mod schema;
pub use schema::Schema;
pub use schema::SchemaError;

/// Random sampling of dimensions and grids.
pub mod sampling;
pub use sampling::ChooseWithReplacement;
pub use sampling::SamplingStrategy;

/// Dynamically typed row cells.
pub mod value;
pub use value::Object;
pub use value::Value;

/// Process-wide configuration.
pub mod config;

/// Generators producing dimensions: stepped sequences and
/// probability distributions.
pub mod generators;

/// Conversions to other grid-search representations.
pub mod ext;

/// Property-based generators for randomized test input.
#[cfg(test)]
pub mod strategy;

/// Construct a base [`Grid`] from named value collections, in
/// declaration order.
///
/// Each `name = values` pair becomes a fixed [`Dimension`]; the
/// values can be anything iterable whose items convert into a
/// [`Value`]. Evaluates to a `Result<Grid, SchemaError>`.
///
/// ```
/// let g = hypergrid::grid!(x = [1, 2, 3], y = ["a", "b"]).unwrap();
/// assert_eq!(g.dimension_names(), vec!["x", "y"]);
/// assert_eq!(g.len().unwrap(), 6);
/// ```
#[macro_export]
macro_rules! grid {
    ( $( $name:ident = $values:expr ),+ $(,)? ) => {
        {
            let dimensions: ::std::result::Result<
                ::std::vec::Vec<$crate::Dimension>,
                $crate::SchemaError,
            > = ::std::iter::IntoIterator::into_iter([
                $( $crate::Dimension::fixed(stringify!($name), $values) ),+
            ])
            .collect();
            dimensions.and_then($crate::Grid::new)
        }
    };
}
