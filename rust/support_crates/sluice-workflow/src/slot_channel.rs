//! A single-producer, single-consumer channel with a bounded slot buffer.
//!
//! This is the transport behind every pipeline conduit. It differs from
//! `std::sync::mpsc::sync_channel` in three ways that the pipeline engine relies on:
//!
//! - Neither half can be cloned: a channel has exactly one writer and one reader.
//! - The channel is closed exactly once, when the [`Sender`] is dropped. This also
//!   happens while unwinding, so a panicking producer still closes its output.
//! - The reader can *cancel* the channel ([`Receiver::cancel`], or by dropping it).
//!   Cancellation discards whatever is buffered and wakes a sender blocked on a
//!   full slot, whose `send` then fails instead of waiting forever. A blocked
//!   reader wakes up as well, and hooks registered with [`Sender::on_cancel`] run.
//!
//! Reading past the end of a closed channel never blocks: [`Receiver::recv`] returns
//! [`RecvError`] immediately once the buffer is drained.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

/// Capacity of the channels created by [`channel`].
pub const SLOT_CAPACITY: usize = 1;

/// Creates a single-slot channel, returning the sender/receiver halves.
///
/// A [`send`](Sender::send) blocks while the slot is occupied and the receiver has
/// not taken the value yet, so producer and consumer advance in lockstep with at
/// most one value in flight.
pub fn channel<T>() -> (Sender<T>, Receiver<T>) {
    bounded(SLOT_CAPACITY)
}

/// Creates a channel whose buffer holds up to `capacity` values.
///
/// # Panics
///
/// Panics if `capacity` is 0.
pub fn bounded<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    assert_ne!(capacity, 0, "slot channel does not support zero capacity");
    let slot = Arc::new(Slot {
        state: Mutex::new(SlotState {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
            closed: false,
            cancelled: false,
            on_cancel: Vec::new(),
        }),
        not_empty: Condvar::new(),
        not_full: Condvar::new(),
    });
    (Sender(slot.clone()), Receiver(slot))
}

/// Returned by [`Sender::send`] when the receiver has cancelled the channel.
/// Carries the value that could not be delivered.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SendError<T>(pub T);

impl<T> std::fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sending on a cancelled channel")
    }
}

impl<T: std::fmt::Debug> std::error::Error for SendError<T> {}

/// Returned by [`Receiver::recv`] once the channel is closed and drained.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct RecvError;

impl std::fmt::Display for RecvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "receiving on a closed channel")
    }
}

impl std::error::Error for RecvError {}

/// An error returned from [`Receiver::try_recv`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TryRecvError {
    /// The slot is empty but the sender is still connected.
    Empty,
    /// The slot is empty and the sender has closed the channel.
    Closed,
}

impl std::fmt::Display for TryRecvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TryRecvError::Empty => write!(f, "channel is empty"),
            TryRecvError::Closed => write!(f, "channel is empty and closed"),
        }
    }
}

impl std::error::Error for TryRecvError {}

/// The writing half of a slot channel. Dropping it closes the channel.
pub struct Sender<T>(Arc<Slot<T>>);

impl<T> Sender<T> {
    /// Writes a value into the channel, blocking while the buffer is full.
    ///
    /// Returns the value back inside a [`SendError`] if the receiver has cancelled
    /// the channel, either before the call or while this call was blocked.
    pub fn send(&self, value: T) -> Result<(), SendError<T>> {
        let mut state = self.0.state.lock().unwrap();
        loop {
            if state.cancelled {
                return Err(SendError(value));
            }
            if state.buffer.len() < state.capacity {
                break;
            }
            state = self.0.not_full.wait(state).unwrap();
        }

        state.buffer.push_back(value);
        drop(state);
        self.0.not_empty.notify_one();
        Ok(())
    }

    /// Returns `true` once the receiver has cancelled the channel.
    pub fn is_cancelled(&self) -> bool {
        self.0.state.lock().unwrap().cancelled
    }

    /// Registers `hook` to run when the receiver cancels the channel. The hook runs
    /// right away if the channel is already cancelled.
    ///
    /// Hooks run on the cancelling thread, outside of the channel lock. Hooks still
    /// pending when the sender is dropped are discarded without running.
    pub fn on_cancel<F>(&self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.0.state.lock().unwrap();
        if state.cancelled {
            drop(state);
            hook();
            return;
        }
        state.on_cancel.push(Box::new(hook));
    }
}

impl<T> Drop for Sender<T> {
    fn drop(&mut self) {
        let mut state = self.0.state.lock().unwrap();
        debug_assert!(!state.closed, "slot channel closed twice");
        state.closed = true;
        let hooks = std::mem::take(&mut state.on_cancel);
        drop(state);
        self.0.not_empty.notify_all();
        drop(hooks);
    }
}

/// The reading half of a slot channel. Dropping it cancels the channel.
pub struct Receiver<T>(Arc<Slot<T>>);

impl<T> Receiver<T> {
    /// Takes the next value, blocking while the buffer is empty and the channel
    /// is still open.
    ///
    /// Values written before the close are still delivered; after that, every call
    /// returns [`RecvError`] without blocking.
    pub fn recv(&self) -> Result<T, RecvError> {
        let mut state = self.0.state.lock().unwrap();
        loop {
            if let Some(value) = state.buffer.pop_front() {
                drop(state);
                self.0.not_full.notify_one();
                return Ok(value);
            }
            if state.closed || state.cancelled {
                return Err(RecvError);
            }
            state = self.0.not_empty.wait(state).unwrap();
        }
    }

    /// Takes the next value if one is buffered, without blocking.
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        let mut state = self.0.state.lock().unwrap();
        if let Some(value) = state.buffer.pop_front() {
            drop(state);
            self.0.not_full.notify_one();
            return Ok(value);
        }
        if state.closed || state.cancelled {
            Err(TryRecvError::Closed)
        } else {
            Err(TryRecvError::Empty)
        }
    }

    /// Abandons the channel: buffered values are dropped, and the sender's pending
    /// and future writes fail. Calling this more than once is harmless.
    pub fn cancel(&self) {
        self.0.cancel();
    }

    /// Returns a handle that cancels this channel from another thread, for example
    /// from a hook registered on a downstream channel.
    pub fn canceller(&self) -> Canceller
    where
        T: Send + 'static,
    {
        Canceller(self.0.clone())
    }

    /// Returns `true` if the sender has closed the channel. Buffered values may
    /// still be available.
    pub fn is_closed(&self) -> bool {
        self.0.state.lock().unwrap().closed
    }

    /// Returns `true` if the channel was cancelled, by this receiver or a [`Canceller`].
    pub fn is_cancelled(&self) -> bool {
        self.0.state.lock().unwrap().cancelled
    }
}

impl<T> Drop for Receiver<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Cancels a channel without owning its [`Receiver`].
///
/// Obtained from [`Receiver::canceller`]. Cancelling through the handle has the same
/// effect as [`Receiver::cancel`], including waking a reader blocked in
/// [`Receiver::recv`].
#[derive(Clone)]
pub struct Canceller(Arc<dyn CancelChannel>);

impl Canceller {
    pub fn cancel(&self) {
        self.0.cancel();
    }
}

impl std::fmt::Debug for Canceller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canceller").finish_non_exhaustive()
    }
}

type CancelHook = Box<dyn FnOnce() + Send>;

struct SlotState<T> {
    buffer: VecDeque<T>,
    capacity: usize,
    closed: bool,
    cancelled: bool,
    on_cancel: Vec<CancelHook>,
}

struct Slot<T> {
    state: Mutex<SlotState<T>>,
    not_empty: Condvar,
    not_full: Condvar,
}

impl<T> Slot<T> {
    fn cancel(&self) {
        let mut state = self.state.lock().unwrap();
        if state.cancelled {
            return;
        }
        state.cancelled = true;
        let discarded = std::mem::take(&mut state.buffer);
        let hooks = std::mem::take(&mut state.on_cancel);
        drop(state);
        self.not_full.notify_all();
        self.not_empty.notify_all();
        // Buffered values are dropped, and hooks run, outside of the lock.
        drop(discarded);
        for hook in hooks {
            hook();
        }
    }
}

trait CancelChannel: Send + Sync {
    fn cancel(&self);
}

impl<T: Send> CancelChannel for Slot<T> {
    fn cancel(&self) {
        Slot::cancel(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_slot_channel_send_sync() {
        fn is_send<T: Send>() {}
        is_send::<Sender<String>>();
        is_send::<Receiver<String>>();
    }

    #[test]
    fn test_send_recv_in_order() {
        let (tx, rx) = channel::<i32>();
        let handle = thread::spawn(move || {
            for i in 0..100 {
                tx.send(i).unwrap();
            }
        });

        let mut received = vec![];
        while let Ok(v) = rx.recv() {
            received.push(v);
        }
        handle.join().unwrap();
        assert_eq!(received, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_send_blocks_on_full_slot() {
        let (tx, rx) = channel::<&str>();
        tx.send("first").unwrap();

        let handle = thread::spawn(move || {
            // The slot is occupied, so this blocks until "first" is taken.
            tx.send("second").unwrap();
        });

        thread::sleep(Duration::from_millis(50));
        assert!(!handle.is_finished());

        assert_eq!(rx.recv().unwrap(), "first");
        handle.join().unwrap();
        assert_eq!(rx.recv().unwrap(), "second");
        assert_eq!(rx.recv(), Err(RecvError));
    }

    #[test]
    fn test_recv_blocks_until_send() {
        let (tx, rx) = channel::<i32>();
        let handle = thread::spawn(move || rx.recv().unwrap());

        thread::sleep(Duration::from_millis(50));
        tx.send(42).unwrap();

        assert_eq!(handle.join().unwrap(), 42);
    }

    #[test]
    fn test_recv_after_close_does_not_block() {
        let (tx, rx) = channel::<i32>();
        tx.send(7).unwrap();
        drop(tx);

        assert!(rx.is_closed());
        assert_eq!(rx.recv().unwrap(), 7);
        for _ in 0..3 {
            assert_eq!(rx.recv(), Err(RecvError));
        }
        assert_eq!(rx.try_recv(), Err(TryRecvError::Closed));
    }

    #[test]
    fn test_try_recv() {
        let (tx, rx) = channel::<i32>();
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
        tx.send(1).unwrap();
        assert_eq!(rx.try_recv(), Ok(1));
        drop(tx);
        assert_eq!(rx.try_recv(), Err(TryRecvError::Closed));
    }

    #[test]
    fn test_cancel_wakes_blocked_sender() {
        let (tx, rx) = channel::<i32>();
        tx.send(1).unwrap();

        let handle = thread::spawn(move || tx.send(2));

        thread::sleep(Duration::from_millis(50));
        rx.cancel();

        assert_eq!(handle.join().unwrap(), Err(SendError(2)));
        assert!(rx.is_cancelled());
        assert_eq!(rx.recv(), Err(RecvError));
    }

    #[test]
    fn test_drop_receiver_cancels() {
        let (tx, rx) = channel::<String>();
        tx.send("buffered".to_string()).unwrap();
        drop(rx);

        assert!(tx.is_cancelled());
        assert_eq!(
            tx.send("late".to_string()),
            Err(SendError("late".to_string()))
        );
    }

    #[test]
    fn test_canceller_wakes_blocked_receiver() {
        let (tx, rx) = channel::<i32>();
        let canceller = rx.canceller();
        let handle = thread::spawn(move || rx.recv());

        thread::sleep(Duration::from_millis(50));
        assert!(!handle.is_finished());
        canceller.cancel();

        assert_eq!(handle.join().unwrap(), Err(RecvError));
        assert!(tx.is_cancelled());
    }

    #[test]
    fn test_cancel_hooks_chain_across_channels() {
        let (upstream_tx, upstream_rx) = channel::<i32>();
        let (downstream_tx, downstream_rx) = channel::<i32>();
        downstream_tx.on_cancel({
            let upstream = upstream_rx.canceller();
            move || upstream.cancel()
        });

        drop(downstream_rx);
        assert!(downstream_tx.is_cancelled());
        assert!(upstream_tx.is_cancelled());
        assert_eq!(upstream_rx.recv(), Err(RecvError));
    }

    #[test]
    fn test_on_cancel_after_cancel_runs_immediately() {
        let (tx, rx) = channel::<i32>();
        rx.cancel();
        let (hook_tx, hook_rx) = std::sync::mpsc::channel();
        tx.on_cancel(move || hook_tx.send(()).unwrap());
        assert!(hook_rx.try_recv().is_ok());
    }

    #[test]
    fn test_on_cancel_discarded_when_sender_drops() {
        let (tx, rx) = channel::<i32>();
        let (hook_tx, hook_rx) = std::sync::mpsc::channel::<()>();
        tx.on_cancel(move || hook_tx.send(()).unwrap());
        drop(tx);
        rx.cancel();
        // The hook was dropped unrun, which disconnects its sender.
        assert_eq!(hook_rx.recv(), Err(std::sync::mpsc::RecvError));
    }

    #[test]
    fn test_sender_closes_on_panic() {
        let (tx, rx) = channel::<i32>();
        let handle = thread::spawn(move || {
            tx.send(1).unwrap();
            panic!("producer failed");
        });

        assert_eq!(rx.recv().unwrap(), 1);
        assert_eq!(rx.recv(), Err(RecvError));
        assert!(handle.join().is_err());
    }

    #[test]
    fn test_bounded_capacity() {
        let (tx, rx) = bounded::<i32>(3);
        tx.send(1).unwrap();
        tx.send(2).unwrap();
        tx.send(3).unwrap();
        drop(tx);
        assert_eq!(rx.recv().unwrap(), 1);
        assert_eq!(rx.recv().unwrap(), 2);
        assert_eq!(rx.recv().unwrap(), 3);
        assert_eq!(rx.recv(), Err(RecvError));
    }

    #[test]
    fn test_zero_capacity_panics() {
        let result = std::panic::catch_unwind(|| bounded::<i32>(0));
        assert!(result.is_err());
    }
}
