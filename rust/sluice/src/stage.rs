//! `map` and `filter` stages.
//!
//! Each stage call spawns exactly one task. The task owns the upstream conduit and the
//! downstream sink. It runs until the upstream closes, and then closes the downstream.
//! Abandoning the downstream abandons the upstream right away, whether the task is
//! blocked sending or waiting for input, and the task then stops.

use sluice_dynamic::{FilterFunc, MapFunc, Value};

use crate::conduit::{Cancelled, Conduit};

impl<T: Send + 'static> Conduit<T> {
    /// Applies `f` to every value.
    pub fn map<U, F>(self, mut f: F) -> Conduit<U>
    where
        U: Send + 'static,
        F: FnMut(T) -> U + Send + 'static,
    {
        Conduit::spawn("map", move |out| {
            out.link_upstream(&self);
            for value in self {
                out.send(f(value))?;
            }
            Ok(())
        })
    }

    /// Forwards the values for which `pred` holds and drops the rest.
    pub fn filter<F>(self, mut pred: F) -> Conduit<T>
    where
        F: FnMut(&T) -> bool + Send + 'static,
    {
        Conduit::spawn("filter", move |out| {
            out.link_upstream(&self);
            for value in self {
                if pred(&value) {
                    out.send(value)?;
                } else if out.is_cancelled() {
                    return Err(Cancelled);
                }
            }
            Ok(())
        })
    }
}

impl Conduit<Value> {
    /// Applies the transforms left to right to every value, so `map_with([f, g])`
    /// yields `g(f(x))`. All transforms run in a single task. An empty list forwards
    /// values unchanged.
    pub fn map_with(self, funcs: impl IntoIterator<Item = MapFunc>) -> Conduit<Value> {
        let funcs: Vec<MapFunc> = funcs.into_iter().collect();
        Conduit::spawn("map", move |out| {
            out.link_upstream(&self);
            for value in self {
                let value = funcs.iter().fold(value, |value, f| f.call(value));
                out.send(value)?;
            }
            Ok(())
        })
    }

    /// Forwards the values accepted by the predicate adapter.
    pub fn filter_with(self, pred: FilterFunc) -> Conduit<Value> {
        self.filter(move |value| pred.call(value))
    }
}
