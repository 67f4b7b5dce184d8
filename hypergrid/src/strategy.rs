/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Property-based generators for [`Dimension`]s and [`Grid`]s.
//!
//! The main entry point is [`gen_grid`], which builds a random grid
//! expression of bounded depth over small integer-valued fixed
//! dimensions. Field names are derived from a prefix that is extended
//! at every node, so that the children of products and zips are
//! always disjoint and sums always see matching field sets.
//!
//! ```ignore
//! use proptest::prelude::*;
//!
//! use crate::strategy::gen_grid;
//!
//! proptest! {
//!     #[test]
//!     fn test_grid(g in gen_grid(2, GridOpts::default())) {
//!         // Use `g` as input to iteration or sampling tests
//!     }
//! }
//! ```
//!
//! This module is only included in test builds (`#[cfg(test)]`).

use proptest::prelude::*;

use crate::Dimension;
use crate::Fields;
use crate::Grid;
use crate::Value;

/// Knobs for [`gen_grid`].
#[derive(Debug, Clone, Copy)]
pub struct GridOpts {
    /// Maximum number of dimensions in a base grid.
    pub max_dims: usize,
    /// Maximum number of values in a dimension.
    pub max_len: usize,
    /// Only generate grids whose sampled rows are always rows of the
    /// grid: no empty dimensions, zips or filters.
    pub sampleable: bool,
}

impl Default for GridOpts {
    fn default() -> Self {
        Self {
            max_dims: 2,
            max_len: 3,
            sampleable: false,
        }
    }
}

impl GridOpts {
    pub fn sampleable() -> Self {
        Self {
            sampleable: true,
            ..Self::default()
        }
    }

    fn min_len(&self) -> usize {
        usize::from(self.sampleable)
    }
}

/// Generates a fixed dimension named `name` with between `min_len`
/// and `max_len` small integer values.
pub fn gen_fixed_dimension(
    name: String,
    min_len: usize,
    max_len: usize,
) -> impl Strategy<Value = Dimension> {
    prop::collection::vec(-50i64..50, min_len..=max_len)
        .prop_map(move |values| Dimension::fixed(name.clone(), values).unwrap())
}

/// Generates a base grid of 1 to `opts.max_dims` fixed dimensions
/// named `{prefix}0`, `{prefix}1`, ...
pub fn gen_base_grid(prefix: String, opts: GridOpts) -> BoxedStrategy<Grid> {
    (1..=opts.max_dims)
        .prop_flat_map(move |n| {
            (0..n)
                .map(|i| gen_fixed_dimension(format!("{prefix}{i}"), opts.min_len(), opts.max_len))
                .collect::<Vec<_>>()
        })
        .prop_map(|dimensions| Grid::new(dimensions).unwrap())
        .boxed()
}

/// Generates a grid expression of at most `depth` operator levels.
/// Products square the row count at every level, so keep `depth`
/// small.
pub fn gen_grid(depth: u32, opts: GridOpts) -> BoxedStrategy<Grid> {
    gen_grid_rec(depth, "f".to_string(), opts)
}

fn gen_grid_rec(depth: u32, prefix: String, opts: GridOpts) -> BoxedStrategy<Grid> {
    let leaf = gen_base_grid(prefix.clone(), opts);
    if depth == 0 {
        return leaf;
    }

    let child = |suffix: &str| gen_grid_rec(depth - 1, format!("{prefix}{suffix}"), opts);

    let product = (child("l"), child("r"))
        .prop_map(|(l, r)| l.product(r).unwrap())
        .boxed();

    // The right side reuses the left side's names in reverse order.
    let sum = child("s")
        .prop_flat_map(move |left| {
            left.dimension_names()
                .into_iter()
                .rev()
                .map(|name| gen_fixed_dimension(name, opts.min_len(), opts.max_len))
                .collect::<Vec<_>>()
                .prop_map(move |dimensions| left.sum(Grid::new(dimensions).unwrap()).unwrap())
        })
        .boxed();

    let select = child("u")
        .prop_flat_map(|grid| {
            let names = grid.dimension_names();
            let n = names.len();
            prop::sample::subsequence(names, 1..=n)
                .prop_map(move |fields| grid.select(fields).unwrap())
        })
        .boxed();

    let mapped = format!("{prefix}m");
    let map_to = child("u")
        .prop_map(move |grid| {
            grid.map_to(Fields::new().with(mapped.clone(), |row| row.len()))
                .unwrap()
        })
        .boxed();

    let mapped = format!("{prefix}m");
    let map = child("u")
        .prop_map(move |grid| {
            grid.map(Fields::new().with(mapped.clone(), |row| {
                row.values().iter().filter_map(Value::to_f64).sum::<f64>()
            }))
            .unwrap()
        })
        .boxed();

    if opts.sampleable {
        return prop_oneof![
            2 => leaf,
            3 => product,
            2 => sum,
            1 => select,
            1 => map_to,
            1 => map,
        ]
        .boxed();
    }

    let zip = (child("l"), child("r"))
        .prop_map(|(l, r)| l.zip(r).unwrap())
        .boxed();

    let filter = child("u")
        .prop_map(|grid| {
            grid.filter_with_budget(
                |row| {
                    row.values()
                        .first()
                        .and_then(Value::as_int)
                        .map_or(true, |x| x % 3 != 0)
                },
                100,
            )
        })
        .boxed();

    prop_oneof![
        2 => leaf,
        3 => product,
        2 => sum,
        2 => zip,
        1 => filter,
        1 => select,
        1 => map_to,
        1 => map,
    ]
    .boxed()
}

#[cfg(test)]
mod tests {
    use proptest::strategy::ValueTree;
    use proptest::test_runner::Config;
    use proptest::test_runner::TestRunner;

    use super::*;
    use crate::Row;

    proptest! {
        #[test]
        fn test_len_matches_iteration(grid in gen_grid(2, GridOpts::default())) {
            prop_assert_eq!(grid.len().unwrap(), grid.iter().count());
        }

        #[test]
        fn test_rows_follow_schema(grid in gen_grid(2, GridOpts::default())) {
            let names = grid.dimension_names();
            for row in grid.iter() {
                prop_assert_eq!(row.fields(), &names[..]);
            }
        }

        #[test]
        fn test_iteration_is_repeatable(grid in gen_grid(2, GridOpts::default())) {
            prop_assert_eq!(grid.rows(), grid.rows());
        }

        #[test]
        fn test_samples_are_rows(grid in gen_grid(2, GridOpts::sampleable())) {
            let rows = grid.rows();
            prop_assert!(!rows.is_empty());
            for _ in 0..8 {
                let row = grid.sample().unwrap();
                prop_assert!(rows.contains(&row), "{} not in {}", row, grid);
            }
        }

        #[test]
        fn test_product_len(
            l in gen_base_grid("l".to_string(), GridOpts::default()),
            r in gen_base_grid("r".to_string(), GridOpts::default()),
        ) {
            let p = l.product(&r).unwrap();
            prop_assert_eq!(p.len().unwrap(), l.len().unwrap() * r.len().unwrap());
            let z = l.zip(&r).unwrap();
            prop_assert_eq!(z.len().unwrap(), l.len().unwrap().min(r.len().unwrap()));
        }
    }

    #[test]
    fn print_some_grids() {
        let mut runner = TestRunner::new(Config::default());

        for _ in 0..32 {
            let grid: Grid = gen_grid(2, GridOpts::default())
                .new_tree(&mut runner)
                .unwrap()
                .current();
            let first: Option<Row> = grid.iter().next();
            println!("{} -> {:?}", grid, first);
        }
    }
}
