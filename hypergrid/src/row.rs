/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;

use crate::schema::Schema;
use crate::value::Value;

/// One element of a grid: values positionally matched to the
/// [`Schema`] of the node that produced it.
///
/// Rows are produced on demand by iteration and sampling and are not
/// retained by the grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    schema: Schema,
    values: Vec<Value>,
}

impl Row {
    pub(crate) fn new(schema: Schema, values: Vec<Value>) -> Self {
        debug_assert_eq!(schema.len(), values.len(), "row arity mismatch");
        Self { schema, values }
    }

    /// Concatenates two rows under `schema`, which must be the
    /// concatenation of both rows' schemas.
    pub(crate) fn join(schema: &Schema, left: &Row, right: Row) -> Row {
        let mut values = Vec::with_capacity(schema.len());
        values.extend_from_slice(&left.values);
        values.extend(right.values);
        Row::new(schema.clone(), values)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn fields(&self) -> &[String] {
        self.schema.fields()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The value of `field`, or `None` if this row has no such
    /// field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.schema.position(field).map(|i| &self.values[i])
    }

    /// The object stored in `field`, downcast to `T`.
    pub fn get_object<T: Any>(&self, field: &str) -> Option<&T> {
        self.get(field).and_then(Value::downcast_ref)
    }

    /// Iterate over `(field, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schema
            .fields()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// This row as a field-name keyed map.
    pub fn to_map(&self) -> BTreeMap<String, Value> {
        self.iter()
            .map(|(f, v)| (f.to_string(), v.clone()))
            .collect()
    }
}

impl Index<&str> for Row {
    type Output = Value;

    fn index(&self, field: &str) -> &Value {
        match self.get(field) {
            Some(value) => value,
            None => panic!("row {} has no field `{}`", self.schema, field),
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row(")?;
        for (i, (field, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", field, value)?;
        }
        write!(f, ")")
    }
}
