//! Concurrent single-slot streaming pipelines.
//!
//! A pipeline is a chain of [`Conduit`]s. A source generator task writes values into
//! the first conduit. Every [`map`](Conduit::map) or [`filter`](Conduit::filter) stage
//! is one more task that reads one conduit and writes the next. Terminal operations
//! ([`take_all`](Conduit::take_all), [`take`](Conduit::take), [`first`](Conduit::first),
//! [`drop_n`](Conduit::drop_n), [`drop_all`](Conduit::drop_all),
//! [`reduce`](Conduit::reduce)) read the last conduit on the calling thread.
//!
//! ```
//! use sluice::sources::values;
//!
//! let result = values(vec![1, 2, 3, 4])
//!     .map(|v| v + 1)
//!     .map(|v| v * 2)
//!     .take_all();
//! assert_eq!(result, vec![4, 6, 8, 10]);
//! ```
//!
//! # Untyped pipelines
//!
//! `Conduit<Value>` carries dynamically typed [`Value`]s. Its stages also accept
//! function adapters ([`MapFunc`], [`FilterFunc`], [`ReduceFunc`]) whose shapes are
//! checked when they are constructed:
//!
//! ```
//! use sluice::{FilterFunc, MapFunc, Value, sources::integer_range};
//!
//! let inc = MapFunc::new(|v: i64| v + 1)?;
//! let even = FilterFunc::new(|v: i64| v % 2 == 0)?;
//! let result = integer_range(0, 6)
//!     .map(Value::from)
//!     .map_with([inc])
//!     .filter_with(even)
//!     .take_all();
//! assert_eq!(result, vec![Value::from(2), Value::from(4), Value::from(6)]);
//! # Ok::<(), sluice::Error>(())
//! ```
//!
//! # Partial consumption
//!
//! Every conduit has a single-slot buffer, so a producer that gets ahead of its
//! consumer blocks. Dropping a conduit cancels it, and cancellation travels up the
//! chain back to the source. A conduit that is kept alive but no longer read keeps
//! one blocked task per stage above it until it is dropped or read to the end.

pub mod conduit;
pub mod sources;
pub mod stage;
pub mod terminal;

pub use conduit::{Cancelled, Conduit, Sink};
pub use sluice_common::{Result, error::Error};
pub use sluice_dynamic::{
    Callable, FilterFunc, MapFunc, Maybe, NOTHING, ReduceFunc, Shape, Value, just, just_of, not,
    nothing,
};
