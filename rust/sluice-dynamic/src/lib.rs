//! Late-bound function adaptation over a tagged value union.
//!
//! Pipeline stages that operate on untyped data (`Conduit<Value>`) accept functions
//! through the adapters in this crate rather than through generic closures. Any Rust
//! closure whose argument and return types implement [`ValueType`] can be wrapped;
//! its shape is inspected once, when the adapter is constructed, and the adapter is
//! then called uniformly with [`Value`]s.
//!
//! - [`value`] - [`Value`], its [`Shape`] tags and the [`ValueType`] bridge.
//! - [`callable`] - type-erased [`Callable`]s with currying and argument flipping.
//! - [`adapter`] - [`MapFunc`], [`FilterFunc`] and [`ReduceFunc`], validated at construction.
//! - [`maybe`] - the [`Maybe`] optional-value container.

pub mod adapter;
pub mod callable;
pub mod maybe;
pub mod value;

pub use adapter::{FilterFunc, MapFunc, ReduceFunc, not};
pub use callable::{Callable, IntoCallable, Signature};
pub use maybe::{Maybe, NOTHING, just, just_of, nothing};
pub use value::{Shape, Value, ValueType};
