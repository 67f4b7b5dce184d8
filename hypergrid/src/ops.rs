/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Operator syntax for the grid algebra:
//!
//! | operator | method          |
//! |----------|-----------------|
//! | `a + b`  | [`Grid::sum`]     |
//! | `a \| b` | [`Grid::sum`]     |
//! | `a * b`  | [`Grid::product`] |
//! | `a & b`  | [`Grid::zip`]     |
//!
//! The left operand is a grid, a grid reference or a dimension; the
//! right operand may additionally be a dimension, which is wrapped
//! into a one-dimensional grid. Since schemas are checked when a node
//! is built, every operator evaluates to a `Result<Grid, SchemaError>`:
//!
//! ```
//! use hypergrid::grid;
//!
//! let a = grid!(x = [1, 2]).unwrap();
//! let b = grid!(y = [3]).unwrap();
//! let c = grid!(x = [4], y = [5]).unwrap();
//! let g = ((&a * &b).unwrap() + c).unwrap();
//! assert_eq!(g.len().unwrap(), 3);
//! ```

use std::ops::Add;
use std::ops::BitAnd;
use std::ops::BitOr;
use std::ops::Mul;

use crate::dimension::Dimension;
use crate::grid::Grid;
use crate::schema::SchemaError;

macro_rules! impl_grid_op {
    ($trait:ident, $fn:ident, $method:ident) => {
        impl<T: Into<Grid>> $trait<T> for Grid {
            type Output = Result<Grid, SchemaError>;

            fn $fn(self, rhs: T) -> Self::Output {
                self.$method(rhs)
            }
        }

        impl<T: Into<Grid>> $trait<T> for &Grid {
            type Output = Result<Grid, SchemaError>;

            fn $fn(self, rhs: T) -> Self::Output {
                self.$method(rhs)
            }
        }

        impl<T: Into<Grid>> $trait<T> for Dimension {
            type Output = Result<Grid, SchemaError>;

            fn $fn(self, rhs: T) -> Self::Output {
                Grid::from(self).$method(rhs)
            }
        }
    };
}

impl_grid_op!(Add, add, sum);
impl_grid_op!(BitOr, bitor, sum);
impl_grid_op!(Mul, mul, product);
impl_grid_op!(BitAnd, bitand, zip);
