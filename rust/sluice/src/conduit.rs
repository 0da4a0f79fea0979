//! The conduit: a once-through, single-slot stream of values fed by one producer task.

use std::fmt;

use sluice_workflow::{
    slot_channel::{self, Receiver, Sender},
    task::{TaskHandle, TaskSpawner},
};

/// Returned by [`Sink::send`] once the consumer has abandoned the conduit.
///
/// A generator receiving this should stop producing and return it, typically via `?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conduit was cancelled by its consumer")
    }
}

impl std::error::Error for Cancelled {}

/// The write-only handle a generator pushes values through.
///
/// The sink is owned by the producer task, not by the generator. It is dropped, and
/// the conduit closed, after the generator returns or panics.
pub struct Sink<T>(Sender<T>);

impl<T> Sink<T> {
    /// Writes the next value, blocking while the previous one has not been taken.
    pub fn send(&self, value: T) -> Result<(), Cancelled> {
        self.0.send(value).map_err(|_| Cancelled)
    }

    /// Returns `true` once the consumer has abandoned the conduit.
    ///
    /// Generators that may run for long stretches without sending or reading
    /// should poll this.
    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }

    /// Abandons `upstream` as soon as this sink's conduit is abandoned, even while the
    /// generator is blocked reading from `upstream`. The blocked read then returns the
    /// end of the sequence.
    ///
    /// Every stage links the conduit it reads from, so cancellation reaches the source
    /// without waiting for a stage to send.
    pub fn link_upstream<U: Send + 'static>(&self, upstream: &Conduit<U>) {
        let upstream = upstream.rx.canceller();
        self.0.on_cancel(move || upstream.cancel());
    }
}

/// A unidirectional stream of values produced by an independent task.
///
/// A conduit is stateful and once-through. Every terminal operation continues from
/// where the previous one stopped, and nothing can be read twice. The producer writes
/// into a single-slot buffer, so it runs at most one value ahead of the consumer.
///
/// # Abandoning a conduit
///
/// Dropping a conduit, or calling [`cancel`](Self::cancel), tells its producer to stop.
/// A producer blocked on the full slot wakes up, its next send fails, and it returns.
/// A stage's upstream conduit is abandoned together with its output (see
/// [`Sink::link_upstream`]), so the whole chain winds down back to the source, also
/// through stages that were waiting for input.
///
/// A conduit that is kept alive but no longer read keeps its producer blocked on the
/// full slot, and every stage above it blocks too. Each of those tasks holds a
/// thread until the conduit is read to the end or dropped. [`producer`](Self::producer)
/// exposes the producer task, so the state can be observed.
pub struct Conduit<T> {
    rx: Receiver<T>,
    producer: TaskHandle,
}

impl<T: Send + 'static> Conduit<T> {
    /// Runs `generator` as a new task writing into a fresh conduit.
    ///
    /// The conduit is closed once the generator returns, whether it returns `Ok`,
    /// returns `Err(Cancelled)`, or panics.
    pub fn new<F>(generator: F) -> Conduit<T>
    where
        F: FnOnce(&Sink<T>) -> Result<(), Cancelled> + Send + 'static,
    {
        Self::spawn("generator", generator)
    }

    pub(crate) fn spawn<F>(label: &'static str, generator: F) -> Conduit<T>
    where
        F: FnOnce(&Sink<T>) -> Result<(), Cancelled> + Send + 'static,
    {
        let (tx, rx) = slot_channel::channel();
        let producer = TaskSpawner::global().spawn(label, move || {
            let sink = Sink(tx);
            if generator(&sink).is_err() {
                log::trace!("{label} stopped: downstream cancelled");
            }
        });
        Conduit { rx, producer }
    }
}

impl<T> Conduit<T> {
    /// Takes the next value, blocking until one is available. Returns `None` at the
    /// end of the sequence, without blocking once the conduit is closed.
    pub(crate) fn next_value(&mut self) -> Option<T> {
        self.rx.recv().ok()
    }

    /// Abandons the conduit, stopping its producer. Same as dropping it.
    pub fn cancel(self) {}

    /// The task writing into this conduit.
    pub fn producer(&self) -> &TaskHandle {
        &self.producer
    }

    /// Returns `true` once the producer has closed the conduit. Values written
    /// before the close may still be pending.
    pub fn is_closed(&self) -> bool {
        self.rx.is_closed()
    }

    /// Returns a borrowing iterator that reads from the conduit.
    pub fn iter(&mut self) -> Iter<'_, T> {
        Iter(self)
    }
}

impl<T> Drop for Conduit<T> {
    fn drop(&mut self) {
        if !self.producer.is_finished() {
            log::trace!("abandoning conduit with a running producer");
        }
        self.rx.cancel();
    }
}

impl<T> fmt::Debug for Conduit<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conduit")
            .field("closed", &self.is_closed())
            .field("producer", &self.producer)
            .finish()
    }
}

/// Borrowing iterator over a [`Conduit`].
pub struct Iter<'a, T>(&'a mut Conduit<T>);

impl<T> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.0.next_value()
    }
}

/// Owning iterator over a [`Conduit`]. Dropping it abandons the conduit.
pub struct IntoIter<T>(Conduit<T>);

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.0.next_value()
    }
}

impl<T> IntoIterator for Conduit<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter(self)
    }
}

impl<'a, T> IntoIterator for &'a mut Conduit<T> {
    type Item = T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}
