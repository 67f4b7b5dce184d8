/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! This module defines [`Grid`], an immutable expression tree
//! describing a set of rows.
//!
//! The leaves of the tree are base grids built from one or more
//! [`Dimension`]s; the interior nodes are the operators of the
//! algebra:
//!
//! | node          | built by          | schema                    | rows                         |
//! |---------------|-------------------|---------------------------|------------------------------|
//! | `Base`        | [`Grid::new`]     | dimension names           | cartesian product            |
//! | `Sum`         | `+`, `\|`         | left (same field set)     | left rows, then right rows   |
//! | `Product`     | `*`               | left ++ right (disjoint)  | cartesian product            |
//! | `Zip`         | `&`               | left ++ right (disjoint)  | pairwise, shortest wins      |
//! | `Filter`      | [`Grid::filter`]  | child                     | rows passing a predicate     |
//! | `Select`      | [`Grid::select`]  | requested subset          | projected rows               |
//! | `Map`         | [`Grid::map`]     | new fields only           | computed rows                |
//! | `MapAugment`  | [`Grid::map_to`]  | child ++ new fields       | child rows plus computed     |
//!
//! Schemas are computed and checked when a node is built; a node that
//! exists is well formed.
//!
//! ## Evaluation
//!
//! [`Grid::iter`] lazily walks the tree depth first, returning a boxed
//! iterator that composes the iterators of the children. Nothing is
//! materialized beyond the row being produced, so grids over infinite
//! dimensions can be iterated (and truncated by the caller or by a
//! `Zip`).
//!
//! The order of rows is the nested-loop order: in a base grid and in
//! a product, the rightmost dimension varies fastest.
//!
//! Sampling is defined per node in [`crate::sampling`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use itertools::Itertools;

use crate::config;
use crate::dimension::Dimension;
use crate::row::Row;
use crate::schema::Schema;
use crate::schema::SchemaError;
use crate::value::Value;

/// A predicate over rows, used by filter nodes.
pub type Predicate = Arc<dyn Fn(&Row) -> bool + Send + Sync>;

/// A function computing one field from a row, used by map nodes.
pub type FieldFn = Arc<dyn Fn(&Row) -> Value + Send + Sync>;

/// A lazy stream of rows borrowed from a grid.
pub type Rows<'a> = Box<dyn Iterator<Item = Row> + 'a>;

/// Operations that are not defined for every grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Len,
    Sample,
    SampleN,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Len => write!(f, "len"),
            Operation::Sample => write!(f, "sample"),
            Operation::SampleN => write!(f, "sample_n"),
        }
    }
}

/// Errors raised while reading a grid.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GridError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("{operation} is not supported by {subject}")]
    Unsupported {
        operation: Operation,
        subject: String,
    },

    #[error("sampling exhausted: filter rejected {attempts} draws")]
    SamplingExhausted { attempts: usize },

    #[error("row count overflows usize at {kind} node")]
    LengthOverflow { kind: &'static str },
}

/// An ordered list of named field computations, the argument of
/// [`Grid::map`] and [`Grid::map_to`].
///
/// ```
/// use hypergrid::Fields;
///
/// let fields = Fields::new()
///     .with("double", |row| row["x"].to_f64().map(|x| x * 2.0))
///     .with("label", |_| "const");
/// assert_eq!(fields.names().collect::<Vec<_>>(), vec!["double", "label"]);
/// ```
#[derive(Clone, Default)]
pub struct Fields {
    entries: Vec<(String, FieldFn)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field named `name` computed by `func` from each row.
    pub fn with<N, F, V>(mut self, name: N, func: F) -> Self
    where
        N: Into<String>,
        F: Fn(&Row) -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        let func: FieldFn = Arc::new(move |row: &Row| func(row).into());
        self.entries.push((name.into(), func));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Every function sees the same, unmodified input row.
    fn evaluate(&self, row: &Row) -> Vec<Value> {
        self.entries.iter().map(|(_, func)| func(row)).collect()
    }
}

impl fmt::Debug for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Types that can be built from the fields of a row, for
/// [`Grid::instantiate`].
pub trait FromRow: Any + Send + Sync + Sized {
    fn from_row(row: &Row) -> Self;
}

/// The node kinds of a grid expression tree.
///
/// Nodes are only reachable through [`Grid::node`]; they are built
/// exclusively by the validating constructors on [`Grid`].
#[non_exhaustive]
pub enum GridNode {
    /// Cartesian product of dimensions, in declaration order.
    Base { dimensions: Vec<Dimension> },

    /// Rows of `left` followed by rows of `right`. `alignment` maps
    /// the left schema's positions to the right schema's when the
    /// two orders differ.
    Sum {
        left: Grid,
        right: Grid,
        alignment: Option<Vec<usize>>,
    },

    /// Cartesian product of two grids with disjoint schemas.
    Product { left: Grid, right: Grid },

    /// Pairwise combination of two grids with disjoint schemas,
    /// truncated to the shorter.
    Zip { left: Grid, right: Grid },

    /// Rows of `grid` satisfying `predicate`. `max_attempts` bounds
    /// rejection sampling.
    Filter {
        grid: Grid,
        predicate: Predicate,
        max_attempts: usize,
    },

    /// Projection of `grid` onto this node's schema.
    Select { grid: Grid },

    /// Rows made only of `fields` computed from `grid`'s rows.
    Map { grid: Grid, fields: Fields },

    /// Rows of `grid` extended with `fields`.
    MapAugment { grid: Grid, fields: Fields },
}

impl GridNode {
    /// A short name for this node kind.
    pub fn kind(&self) -> &'static str {
        match self {
            GridNode::Base { .. } => "grid",
            GridNode::Sum { .. } => "sum",
            GridNode::Product { .. } => "product",
            GridNode::Zip { .. } => "zip",
            GridNode::Filter { .. } => "filter",
            GridNode::Select { .. } => "select",
            GridNode::Map { .. } => "map",
            GridNode::MapAugment { .. } => "map_to",
        }
    }
}

struct GridInner {
    schema: Schema,
    node: GridNode,
}

/// An immutable, lazily evaluated set of rows.
///
/// `Grid` is a cheap handle: cloning it shares the underlying tree,
/// and a subtree may be reused in any number of parents.
#[derive(Clone)]
pub struct Grid {
    inner: Arc<GridInner>,
}

// Grids are immutable and may be iterated from several threads.
fn _assert_grid_traits()
where
    Grid: Send + Sync + 'static,
{
}

impl Grid {
    fn from_node(schema: Schema, node: GridNode) -> Self {
        tracing::trace!(kind = node.kind(), %schema, "built grid node");
        Self {
            inner: Arc::new(GridInner { schema, node }),
        }
    }

    /// A base grid over `dimensions`, in declaration order.
    ///
    /// Fails if no dimension is given or if two dimensions share a
    /// name.
    pub fn new<I>(dimensions: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = Dimension>,
    {
        let dimensions: Vec<Dimension> = dimensions.into_iter().collect();
        if dimensions.is_empty() {
            return Err(SchemaError::NoDimensions);
        }
        let schema = Schema::new(dimensions.iter().map(|d| d.name().to_string()))?;
        Ok(Self::from_node(schema, GridNode::Base { dimensions }))
    }

    /// The union of this grid and `other`, which must have the same
    /// set of fields. Rows keep this grid's field order.
    pub fn sum(&self, other: impl Into<Grid>) -> Result<Grid, SchemaError> {
        let right = other.into();
        let alignment = self.schema().alignment(right.schema())?;
        let alignment = if alignment.iter().enumerate().all(|(i, &j)| i == j) {
            None
        } else {
            Some(alignment)
        };
        Ok(Self::from_node(
            self.schema().clone(),
            GridNode::Sum {
                left: self.clone(),
                right,
                alignment,
            },
        ))
    }

    /// The cartesian product of this grid and `other`, whose fields
    /// must be disjoint from this grid's.
    pub fn product(&self, other: impl Into<Grid>) -> Result<Grid, SchemaError> {
        let right = other.into();
        let schema = self.schema().concat(right.schema())?;
        Ok(Self::from_node(
            schema,
            GridNode::Product {
                left: self.clone(),
                right,
            },
        ))
    }

    /// Pairs the rows of this grid with the rows of `other`, stopping
    /// at the shorter of the two. Fields must be disjoint.
    pub fn zip(&self, other: impl Into<Grid>) -> Result<Grid, SchemaError> {
        let right = other.into();
        let schema = self.schema().concat(right.schema())?;
        Ok(Self::from_node(
            schema,
            GridNode::Zip {
                left: self.clone(),
                right,
            },
        ))
    }

    /// The rows of this grid satisfying `predicate`.
    ///
    /// Sampling the result retries up to the configured
    /// [`filter_max_attempts`](crate::config::GridConfig) times.
    pub fn filter<F>(&self, predicate: F) -> Grid
    where
        F: Fn(&Row) -> bool + Send + Sync + 'static,
    {
        self.filter_with_budget(predicate, config::global::get().filter_max_attempts)
    }

    /// Like [`Grid::filter`], with an explicit rejection-sampling
    /// budget. A budget of 0 is raised to 1: sampling always makes at
    /// least one draw.
    pub fn filter_with_budget<F>(&self, predicate: F, max_attempts: usize) -> Grid
    where
        F: Fn(&Row) -> bool + Send + Sync + 'static,
    {
        Self::from_node(
            self.schema().clone(),
            GridNode::Filter {
                grid: self.clone(),
                predicate: Arc::new(predicate),
                max_attempts: max_attempts.max(1),
            },
        )
    }

    /// Projects this grid onto `fields`, which must be unique and
    /// present in this grid. The result keeps this grid's field
    /// order.
    pub fn select<I, S>(&self, fields: I) -> Result<Grid, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let schema = self.schema().project(fields)?;
        Ok(Self::from_node(
            schema,
            GridNode::Select { grid: self.clone() },
        ))
    }

    /// Replaces every row with the `fields` computed from it.
    pub fn map(&self, fields: Fields) -> Result<Grid, SchemaError> {
        let schema = Schema::new(fields.names())?;
        Ok(Self::from_node(
            schema,
            GridNode::Map {
                grid: self.clone(),
                fields,
            },
        ))
    }

    /// Extends every row with the `fields` computed from it. New
    /// field names must not collide with existing ones.
    pub fn map_to(&self, fields: Fields) -> Result<Grid, SchemaError> {
        let schema = self.schema().extend(fields.names())?;
        Ok(Self::from_node(
            schema,
            GridNode::MapAugment {
                grid: self.clone(),
                fields,
            },
        ))
    }

    /// Extends every row with a field `field` holding a `T` built
    /// from the row. Read it back with [`Row::get_object`].
    pub fn instantiate<T: FromRow>(&self, field: impl Into<String>) -> Result<Grid, SchemaError> {
        self.map_to(Fields::new().with(field, |row: &Row| Value::object(T::from_row(row))))
    }

    pub fn schema(&self) -> &Schema {
        &self.inner.schema
    }

    pub fn node(&self) -> &GridNode {
        &self.inner.node
    }

    /// The field names of this grid's rows, in order.
    pub fn dimension_names(&self) -> Vec<String> {
        self.schema().fields().to_vec()
    }

    /// Lazily iterate over all rows.
    pub fn iter(&self) -> Rows<'_> {
        let schema = self.schema();
        match self.node() {
            GridNode::Base { dimensions } => {
                iter_dimensions(schema, dimensions, Vec::with_capacity(dimensions.len()))
            }
            GridNode::Sum {
                left,
                right,
                alignment,
            } => Box::new(left.iter().chain(
                right
                    .iter()
                    .map(move |row| align(schema, alignment.as_deref(), row)),
            )),
            GridNode::Product { left, right } => Box::new(left.iter().flat_map(move |l| {
                right.iter().map(move |r| Row::join(schema, &l, r))
            })),
            GridNode::Zip { left, right } => Box::new(
                left.iter()
                    .zip(right.iter())
                    .map(move |(l, r)| Row::join(schema, &l, r)),
            ),
            GridNode::Filter {
                grid, predicate, ..
            } => Box::new(grid.iter().filter(move |row| predicate(row))),
            GridNode::Select { grid }
            | GridNode::Map { grid, .. }
            | GridNode::MapAugment { grid, .. } => {
                Box::new(grid.iter().map(move |row| self.transform(row)))
            }
        }
    }

    /// All rows, materialized.
    pub fn rows(&self) -> Vec<Row> {
        self.iter().collect()
    }

    /// The number of rows.
    ///
    /// Only defined when every dimension on a length-computing path
    /// is fixed. A filter is counted by iterating it, which costs
    /// time linear in the size of its input. A zip with exactly one
    /// sized side iterates the other side up to that size.
    pub fn len(&self) -> Result<usize, GridError> {
        match self.node() {
            GridNode::Base { dimensions } => dimensions.iter().try_fold(1usize, |n, d| {
                n.checked_mul(d.len()?).ok_or_else(|| self.length_overflow())
            }),
            GridNode::Sum { left, right, .. } => left
                .len()?
                .checked_add(right.len()?)
                .ok_or_else(|| self.length_overflow()),
            GridNode::Product { left, right } => left
                .len()?
                .checked_mul(right.len()?)
                .ok_or_else(|| self.length_overflow()),
            GridNode::Zip { left, right } => match (left.len(), right.len()) {
                (Ok(l), Ok(r)) => Ok(l.min(r)),
                (Ok(n), Err(_)) => Ok(right.iter().take(n).count()),
                (Err(_), Ok(n)) => Ok(left.iter().take(n).count()),
                (Err(e), Err(_)) => Err(e),
            },
            GridNode::Filter { grid, .. } => {
                grid.len()?;
                Ok(self.iter().count())
            }
            GridNode::Select { grid }
            | GridNode::Map { grid, .. }
            | GridNode::MapAugment { grid, .. } => grid.len(),
        }
    }

    fn length_overflow(&self) -> GridError {
        GridError::LengthOverflow {
            kind: self.node().kind(),
        }
    }

    /// True if this grid produces no rows.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Row rewriting for the unary projection and mapping nodes;
    /// the identity for every other node.
    pub(crate) fn transform(&self, row: Row) -> Row {
        let schema = self.schema();
        match self.node() {
            // Absent fields read as null.
            GridNode::Select { .. } => Row::new(
                schema.clone(),
                schema
                    .fields()
                    .iter()
                    .map(|f| row.get(f).cloned().unwrap_or(Value::Null))
                    .collect(),
            ),
            GridNode::Map { fields, .. } => Row::new(schema.clone(), fields.evaluate(&row)),
            GridNode::MapAugment { fields, .. } => {
                let computed = fields.evaluate(&row);
                let mut values = row.into_values();
                values.extend(computed);
                Row::new(schema.clone(), values)
            }
            _ => row,
        }
    }
}

/// Reorders a row of the right side of a sum into the left side's
/// field order.
pub(crate) fn align(schema: &Schema, alignment: Option<&[usize]>, row: Row) -> Row {
    match alignment {
        None => row,
        Some(positions) => {
            let values = row.values();
            Row::new(
                schema.clone(),
                positions.iter().map(|&i| values[i].clone()).collect(),
            )
        }
    }
}

fn iter_dimensions<'a>(
    schema: &'a Schema,
    dimensions: &'a [Dimension],
    prefix: Vec<Value>,
) -> Rows<'a> {
    match dimensions.split_first() {
        None => Box::new(std::iter::once(Row::new(schema.clone(), prefix))),
        Some((dimension, rest)) => Box::new(dimension.iter().flat_map(move |value| {
            let mut prefix = prefix.clone();
            prefix.push(value);
            iter_dimensions(schema, rest, prefix)
        })),
    }
}

impl<'a> IntoIterator for &'a Grid {
    type Item = Row;
    type IntoIter = Rows<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl From<&Grid> for Grid {
    fn from(grid: &Grid) -> Self {
        grid.clone()
    }
}

impl From<Dimension> for Grid {
    fn from(dimension: Dimension) -> Self {
        let schema = Schema::from_unique(vec![dimension.name().to_string()]);
        Self::from_node(
            schema,
            GridNode::Base {
                dimensions: vec![dimension],
            },
        )
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node() {
            GridNode::Base { dimensions } => write!(f, "grid({})", dimensions.iter().join(", ")),
            GridNode::Sum { left, right, .. } => write!(f, "sum({}, {})", left, right),
            GridNode::Product { left, right } => write!(f, "product({}, {})", left, right),
            GridNode::Zip { left, right } => write!(f, "zip({}, {})", left, right),
            GridNode::Filter { grid, .. } => write!(f, "filter({})", grid),
            GridNode::Select { grid } => {
                write!(f, "select({}, [{}])", grid, self.schema().fields().join(", "))
            }
            GridNode::Map { grid, fields } | GridNode::MapAugment { grid, fields } => write!(
                f,
                "{}({}, [{}])",
                self.node().kind(),
                grid,
                fields.names().join(", ")
            ),
        }
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("schema", self.schema())
            .field("expr", &format_args!("{}", self))
            .finish()
    }
}
