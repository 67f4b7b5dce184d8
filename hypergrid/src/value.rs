/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use enum_as_inner::EnumAsInner;
use serde::Deserialize;
use serde::Serialize;

/// A single cell of a [`Row`](crate::Row).
///
/// Grids are heterogeneous: one dimension may hold learning rates,
/// another activation names. `Value` is the dynamically typed
/// carrier for all of them. Native Rust values convert into it via
/// `From`, and come back out through the `as_*` / `into_*`
/// accessors.
///
/// [`Value::Object`] holds an arbitrary shared Rust value (see
/// [`Grid::instantiate`](crate::Grid::instantiate)); it is skipped by
/// serde.
#[derive(Clone, Debug, EnumAsInner, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    #[serde(skip)]
    Object(Object),
}

impl Value {
    /// Wrap an arbitrary value as an [`Object`].
    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        Value::Object(Object::new(value))
    }

    /// Numeric view of this value. Integers widen to floats.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Borrow the string content, if this is a `Str`.
    pub fn as_text(&self) -> Option<&str> {
        self.as_str().map(String::as_str)
    }

    /// Downcast an `Object` payload to its concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_object().and_then(Object::downcast_ref)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Str(a), Str(b)) => a == b,
            (List(a), List(b)) => a == b,
            (Object(a), Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Str(v) => write!(f, "{:?}", v),
            Value::List(vs) => {
                write!(f, "[")?;
                for (i, v) in vs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Object(o) => write!(f, "<{}>", o.type_name()),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(v as i64)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32, usize);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(vs: Vec<T>) -> Self {
        Value::List(vs.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A shared, type-erased Rust value stored in a row.
///
/// Equality is identity: two objects are equal only if they share
/// the same allocation.
#[derive(Clone)]
pub struct Object {
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl Object {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            inner: Arc::new(value),
        }
    }

    /// The Rust type name of the wrapped value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Object").field(&self.type_name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(Value::from(3), Value::Int(3));
        assert_eq!(Value::from(3usize), Value::Int(3));
        assert_eq!(Value::from(0.5), Value::Float(0.5));
        assert_eq!(Value::from("relu"), Value::Str("relu".into()));
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(
            Value::from(vec![1, 2]),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Int(2).as_int(), Some(&2));
        assert_eq!(Value::Int(2).to_f64(), Some(2.0));
        assert_eq!(Value::Float(0.25).to_f64(), Some(0.25));
        assert_eq!(Value::from("a").as_text(), Some("a"));
        assert!(Value::Null.is_null());
        assert_eq!(Value::Bool(true).to_f64(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from(1).to_string(), "1");
        assert_eq!(Value::from(1.0).to_string(), "1.0");
        assert_eq!(Value::from("a").to_string(), "\"a\"");
        assert_eq!(Value::from(vec![1, 2]).to_string(), "[1, 2]");
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn test_object_identity() {
        #[derive(Debug, PartialEq)]
        struct Config {
            depth: i64,
        }

        let a = Value::object(Config { depth: 3 });
        let b = a.clone();
        let c = Value::object(Config { depth: 3 });
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.downcast_ref::<Config>(), Some(&Config { depth: 3 }));
        assert_eq!(a.downcast_ref::<String>(), None);
        assert!(a.to_string().contains("Config"));
    }

    #[test]
    fn test_serde() {
        let v = Value::from(vec![Value::from(1), Value::from("x")]);
        let json = serde_json::to_string(&v).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v, back);
        assert!(serde_json::to_string(&Value::object(1u8)).is_err());
    }
}
