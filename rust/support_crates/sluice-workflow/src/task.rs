//! Dedicated-thread task spawning for pipeline stages.
//!
//! Every source generator and every `map`/`filter` stage runs as its own task.
//! Stages spend most of their life blocked on a channel, so they cannot share a
//! fixed-size worker pool: a pool of `n` threads would deadlock on the first chain
//! of more than `n` stages. Each task therefore gets its own OS thread, named after
//! the stage it runs.
//!
//! A task body runs under [`std::panic::catch_unwind`]. A panic is logged and
//! recorded in the task's [`TaskOutcome`] instead of tearing down the process, and
//! whatever the body owned (for example, the sending half of a channel) is
//! released on the way out.

use std::{
    any::Any,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        Arc, Condvar, Mutex, OnceLock,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

/// How a task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The task body returned normally.
    Completed,
    /// The task body panicked with the given message.
    Panicked(String),
}

impl TaskOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskOutcome::Completed)
    }
}

/// Per-spawner settings.
#[derive(Debug, Clone)]
pub struct TaskOptions {
    /// Prefix of every thread name; the task label is appended after a `-`.
    pub name_prefix: String,
    /// Stack size for task threads; `None` uses the platform default.
    pub stack_size: Option<usize>,
}

impl Default for TaskOptions {
    fn default() -> Self {
        TaskOptions {
            name_prefix: "sluice".to_string(),
            stack_size: None,
        }
    }
}

/// Spawns named, panic-isolated tasks on dedicated threads.
///
/// `TaskSpawner` is cheap to clone; clones share the same options.
#[derive(Debug, Clone, Default)]
pub struct TaskSpawner {
    options: Arc<TaskOptions>,
}

impl TaskSpawner {
    /// Creates a spawner with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a spawner with the given options.
    pub fn with_options(options: TaskOptions) -> Self {
        TaskSpawner {
            options: Arc::new(options),
        }
    }

    pub fn options(&self) -> &TaskOptions {
        &self.options
    }

    /// Returns the process-wide spawner used by pipeline stages.
    ///
    /// The global spawner is created on first use from the values set via
    /// [`configure_global_stack_size`](Self::configure_global_stack_size) and
    /// [`configure_global_name_prefix`](Self::configure_global_name_prefix).
    pub fn global() -> &'static TaskSpawner {
        static SPAWNER: OnceLock<TaskSpawner> = OnceLock::new();
        SPAWNER.get_or_init(|| {
            let stack_size = GLOBAL_STACK_SIZE.load(Ordering::SeqCst);
            let name_prefix = GLOBAL_NAME_PREFIX
                .get()
                .cloned()
                .unwrap_or_else(|| TaskOptions::default().name_prefix);
            TaskSpawner::with_options(TaskOptions {
                name_prefix,
                stack_size: (stack_size != 0).then_some(stack_size),
            })
        })
    }

    /// Sets the stack size of threads spawned by the global spawner.
    ///
    /// Only effective before the first call to [`global()`](Self::global). A value
    /// of 0 restores the platform default.
    pub fn configure_global_stack_size(stack_size: usize) {
        GLOBAL_STACK_SIZE.store(stack_size, Ordering::SeqCst);
    }

    /// Sets the thread name prefix used by the global spawner.
    ///
    /// Only the first call has an effect, and only if it happens before the first
    /// call to [`global()`](Self::global).
    pub fn configure_global_name_prefix(prefix: impl Into<String>) {
        let _ = GLOBAL_NAME_PREFIX.set(prefix.into());
    }

    /// Runs `f` on a new thread named `<prefix>-<label>`.
    ///
    /// # Panics
    ///
    /// Panics if the operating system refuses to create the thread.
    pub fn spawn<F>(&self, label: &str, f: F) -> TaskHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let name = if self.options.name_prefix.is_empty() {
            label.to_string()
        } else {
            format!("{}-{}", self.options.name_prefix, label)
        };

        let mut builder = thread::Builder::new().name(name.clone());
        if let Some(stack_size) = self.options.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let latch = Arc::new(CompletionLatch::new());
        let handle = TaskHandle(latch.clone());
        log::debug!("spawning task {name}");
        builder
            .spawn(move || {
                let outcome = match catch_unwind(AssertUnwindSafe(f)) {
                    Ok(()) => {
                        log::debug!("task {name} completed");
                        TaskOutcome::Completed
                    }
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        log::error!("task {name} panicked: {message}");
                        TaskOutcome::Panicked(message)
                    }
                };
                latch.complete(outcome);
            })
            .expect("spawn thread");
        handle
    }
}

/// A handle for observing the completion of a spawned task.
///
/// Handles can be cloned; every clone observes the same task. Dropping a handle
/// does not affect the task.
#[derive(Clone)]
pub struct TaskHandle(Arc<CompletionLatch>);

impl TaskHandle {
    /// Returns `true` once the task body has returned or panicked.
    pub fn is_finished(&self) -> bool {
        self.0.outcome.lock().unwrap().is_some()
    }

    /// Blocks until the task finishes and returns its outcome.
    pub fn wait(&self) -> TaskOutcome {
        let guard = self.0.outcome.lock().unwrap();
        self.0
            .finished
            .wait_while(guard, |outcome| outcome.is_none())
            .unwrap()
            .clone()
            .expect("outcome is set")
    }

    /// Waits up to `timeout` for the task to finish.
    ///
    /// Returns `None` if the task is still running when the timeout elapses.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<TaskOutcome> {
        let guard = self.0.outcome.lock().unwrap();
        let (guard, _) = self
            .0
            .finished
            .wait_timeout_while(guard, timeout, |outcome| outcome.is_none())
            .unwrap();
        guard.clone()
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Set exactly once by the task thread, observed by any number of handles.
struct CompletionLatch {
    outcome: Mutex<Option<TaskOutcome>>,
    finished: Condvar,
}

impl CompletionLatch {
    fn new() -> CompletionLatch {
        CompletionLatch {
            outcome: Mutex::new(None),
            finished: Condvar::new(),
        }
    }

    fn complete(&self, outcome: TaskOutcome) {
        let mut guard = self.outcome.lock().unwrap();
        debug_assert!(guard.is_none());
        *guard = Some(outcome);
        drop(guard);
        self.finished.notify_all();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Stack size for the global spawner; 0 means the platform default.
static GLOBAL_STACK_SIZE: AtomicUsize = AtomicUsize::new(0);

static GLOBAL_NAME_PREFIX: OnceLock<String> = OnceLock::new();
