//! The tagged value union carried by untyped conduits, and the [`ValueType`] bridge
//! between native Rust types and that union.

use std::fmt;

use crate::{callable::Callable, maybe::Maybe};

/// A dynamically typed value.
///
/// `Value` is what flows through a `Conduit<Value>` and what the function adapters
/// box arguments into and unbox results from.
#[derive(Clone, Default)]
pub enum Value {
    /// The empty value. A `Maybe` never holds it.
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Maybe(Box<Maybe>),
    Func(Callable),
}

impl Value {
    /// Returns the runtime shape tag of this value.
    pub fn shape(&self) -> Shape {
        match self {
            Value::Nil => Shape::Nil,
            Value::Bool(_) => Shape::Bool,
            Value::Int(_) => Shape::Int,
            Value::Float(_) => Shape::Float,
            Value::Str(_) => Shape::Str,
            Value::List(_) => Shape::List,
            Value::Maybe(_) => Shape::Maybe,
            Value::Func(_) => Shape::Func,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    /// Structural equality; functions compare by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Maybe(a), Value::Maybe(b)) => a == b,
            (Value::Func(a), Value::Func(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Maybe(m) => write!(f, "{m}"),
            Value::Func(c) => write!(f, "{}", c.signature()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Maybe(m) => write!(f, "Maybe({m:?})"),
            Value::Func(c) => write!(f, "Func({})", c.signature()),
        }
    }
}

/// The runtime type tag of a [`Value`], used to validate callables at wrap time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Nil,
    Bool,
    Int,
    Float,
    Str,
    List,
    Maybe,
    Func,
    /// A raw [`Value`] of any shape; produced by callables that take or return
    /// `Value` itself.
    Any,
}

impl Shape {
    /// Returns `true` if `value` may be passed where this shape is expected.
    pub fn accepts(&self, value: &Value) -> bool {
        *self == Shape::Any || *self == value.shape()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A Rust type that can cross the dynamic adapter boundary.
///
/// The associated [`SHAPE`](Self::SHAPE) is what adapters inspect when a callable
/// is wrapped. `from_value` hands the value back unchanged when its shape does not
/// match.
pub trait ValueType: Sized + Send + 'static {
    const SHAPE: Shape;

    fn into_value(self) -> Value;

    fn from_value(value: Value) -> Result<Self, Value>;
}

impl ValueType for Value {
    const SHAPE: Shape = Shape::Any;

    fn into_value(self) -> Value {
        self
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        Ok(value)
    }
}

macro_rules! impl_value_type {
    ($ty:ty, $variant:ident) => {
        impl ValueType for $ty {
            const SHAPE: Shape = Shape::$variant;

            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn from_value(value: Value) -> Result<Self, Value> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(other),
                }
            }
        }

        impl From<$ty> for Value {
            fn from(v: $ty) -> Value {
                Value::$variant(v)
            }
        }
    };
}

impl_value_type!(bool, Bool);
impl_value_type!(i64, Int);
impl_value_type!(f64, Float);
impl_value_type!(String, Str);
impl_value_type!(Vec<Value>, List);
impl_value_type!(Callable, Func);

impl ValueType for Maybe {
    const SHAPE: Shape = Shape::Maybe;

    fn into_value(self) -> Value {
        Value::Maybe(Box::new(self))
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Maybe(m) => Ok(*m),
            other => Err(other),
        }
    }
}

impl From<Maybe> for Value {
    fn from(m: Maybe) -> Value {
        Value::Maybe(Box::new(m))
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Value {
        Value::Int(i.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Str(s.to_string())
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Value {
        Value::Nil
    }
}
