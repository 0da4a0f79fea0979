//! [`Maybe`]: an optional [`Value`] that never holds `Nil`.
//!
//! `Nothing` is a single process-wide value ([`NOTHING`]). Transforms go through a
//! [`MapFunc`], and a transform yielding `Nil` collapses the result to `Nothing`.

use std::fmt;

use sluice_common::Result;

use crate::{
    adapter::MapFunc,
    callable::IntoCallable,
    value::{Value, ValueType},
};

/// The process-wide absent value.
pub static NOTHING: Maybe = Maybe::Nothing;

/// An optional [`Value`].
///
/// `Just` never holds [`Value::Nil`]: [`just`] and [`Maybe::map`] collapse an empty
/// value to `Nothing`.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Maybe {
    #[default]
    Nothing,
    Just(Value),
}

/// Wraps a value, collapsing [`Value::Nil`] to [`Maybe::Nothing`].
pub fn just(value: impl Into<Value>) -> Maybe {
    match value.into() {
        Value::Nil => Maybe::Nothing,
        value => Maybe::Just(value),
    }
}

/// Returns the absent value.
pub fn nothing() -> Maybe {
    NOTHING.clone()
}

impl Maybe {
    pub fn is_nothing(&self) -> bool {
        matches!(self, Maybe::Nothing)
    }

    pub fn is_just(&self) -> bool {
        matches!(self, Maybe::Just(_))
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Maybe::Nothing => None,
            Maybe::Just(value) => Some(value),
        }
    }

    pub fn into_option(self) -> Option<Value> {
        match self {
            Maybe::Nothing => None,
            Maybe::Just(value) => Some(value),
        }
    }

    /// Applies `f` to the contained value. `Nothing` stays `Nothing` and `f` is not
    /// invoked; a `Nil` result collapses to `Nothing`.
    pub fn map(self, f: &MapFunc) -> Maybe {
        match self {
            Maybe::Nothing => Maybe::Nothing,
            Maybe::Just(value) => just(f.call(value)),
        }
    }

    /// Wraps `f` into a [`MapFunc`] and applies it.
    ///
    /// The wrap is validated even when `self` is `Nothing`.
    pub fn try_map<M>(self, f: impl IntoCallable<M>) -> Result<Maybe> {
        let f = MapFunc::new(f)?;
        Ok(self.map(&f))
    }

    /// Removes one level of nesting: `Just(Just(x))` becomes `Just(x)`. Any other
    /// value is returned unchanged.
    pub fn join(self) -> Maybe {
        match self {
            Maybe::Just(Value::Maybe(inner)) => *inner,
            other => other,
        }
    }
}

impl From<Option<Value>> for Maybe {
    fn from(value: Option<Value>) -> Maybe {
        value.map_or(Maybe::Nothing, just)
    }
}

impl fmt::Display for Maybe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Maybe::Nothing => write!(f, "Nothing"),
            Maybe::Just(value) => write!(f, "Just {value}"),
        }
    }
}

/// Wraps a native value directly.
pub fn just_of<T: ValueType>(value: T) -> Maybe {
    just(value.into_value())
}
