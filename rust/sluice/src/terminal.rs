//! Terminal operations: blocking reads that run on the caller's thread.
//!
//! None of these spawn a task. Operations that take `&mut self` leave the conduit
//! positioned after the last value they read, so successive calls continue where the
//! previous one stopped.

use sluice_dynamic::{Maybe, ReduceFunc, Value};

use crate::conduit::Conduit;

impl<T: Send + 'static> Conduit<T> {
    /// Reads every remaining value, in order. Returns an empty vector if the conduit
    /// is already at its end.
    pub fn take_all(self) -> Vec<T> {
        self.into_iter().collect()
    }

    /// Reads up to `n` values, fewer if the conduit ends first. `take(0)` returns
    /// immediately without reading anything.
    pub fn take(&mut self, n: usize) -> Vec<T> {
        if n == 0 {
            return Vec::new();
        }
        let mut values = Vec::with_capacity(n.min(64));
        while values.len() < n {
            match self.next_value() {
                Some(value) => values.push(value),
                None => break,
            }
        }
        values
    }

    /// Reads the next value, or `None` at the end of the sequence.
    pub fn first(&mut self) -> Option<T> {
        self.next_value()
    }

    /// Discards the next `n` values and returns the conduit for further chaining.
    ///
    /// Stops early, without blocking, if the conduit ends before `n` values were
    /// discarded.
    pub fn drop_n(mut self, n: usize) -> Conduit<T> {
        for _ in 0..n {
            if self.next_value().is_none() {
                break;
            }
        }
        self
    }

    /// Reads and discards every remaining value.
    pub fn drop_all(mut self) {
        while self.next_value().is_some() {}
    }

    /// Left fold over the remaining values: `accumulator = f(value, accumulator)` in
    /// arrival order, starting from `seed`.
    pub fn reduce<A, F>(self, mut f: F, seed: A) -> A
    where
        F: FnMut(T, A) -> A,
    {
        let mut accumulator = seed;
        for value in self {
            accumulator = f(value, accumulator);
        }
        accumulator
    }
}

impl Conduit<Value> {
    /// Reads the next value as a [`Maybe`]. `Nothing` marks the end of the sequence
    /// (and also a `Nil` value, which a `Maybe` cannot hold).
    pub fn first_maybe(&mut self) -> Maybe {
        self.next_value().into()
    }

    /// Left fold with a reducer adapter, called as `(value, accumulator)`.
    ///
    /// # Panics
    ///
    /// Panics if `seed` or a value does not have the shape the reducer was validated
    /// with.
    pub fn reduce_with(self, f: &ReduceFunc, seed: Value) -> Value {
        self.reduce(|value, accumulator| f.call(value, accumulator), seed)
    }
}
