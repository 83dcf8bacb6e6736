//! Deadline-sliced cooperative task runner.
//!
//! Nothing here spawns threads. The host event loop calls [`Scheduler::tick`]
//! (or [`Scheduler::run_until`]) once per iteration; every pending task is
//! invoked once with the slice deadline and either finishes or asks to be
//! called again on a later tick.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::num::NonZeroU64;
use std::rc::Rc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::api::ProjectionConfig;

/// Default per-tick budget granted to pending tasks.
pub const DEFAULT_SLICE_BUDGET: Duration = Duration::from_millis(1);

/// Units of work a task performs between deadline checks.
pub const DEADLINE_CHECK_INTERVAL: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Unfinished; invoke again on a later tick.
    Continue,
    /// Finished; the handle is retired.
    Done,
}

/// Opaque non-zero task identifier returned by [`Scheduler::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(NonZeroU64);

impl TaskHandle {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

type TaskFn = Rc<RefCell<dyn FnMut(Instant) -> TaskStatus>>;

struct SchedulerState {
    next_id: Cell<u64>,
    slice_budget: Cell<Duration>,
    tasks: RefCell<IndexMap<TaskHandle, TaskFn>>,
}

/// Cloneable handle to one task queue.
///
/// Tasks run in insertion order. A removed task is never invoked again, even
/// when it is removed from inside another task's slice.
#[derive(Clone)]
pub struct Scheduler {
    state: Rc<SchedulerState>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .field("slice_budget", &self.slice_budget())
            .finish()
    }
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::with_slice_budget(DEFAULT_SLICE_BUDGET)
    }

    #[must_use]
    pub fn with_slice_budget(slice_budget: Duration) -> Self {
        Self {
            state: Rc::new(SchedulerState {
                next_id: Cell::new(1),
                slice_budget: Cell::new(slice_budget),
                tasks: RefCell::new(IndexMap::new()),
            }),
        }
    }

    #[must_use]
    pub fn from_config(config: &ProjectionConfig) -> Self {
        Self::with_slice_budget(config.slice_budget())
    }

    #[must_use]
    pub fn slice_budget(&self) -> Duration {
        self.state.slice_budget.get()
    }

    pub fn set_slice_budget(&self, slice_budget: Duration) {
        self.state.slice_budget.set(slice_budget);
    }

    /// Queues `callback` for the next tick.
    pub fn add<F>(&self, callback: F) -> TaskHandle
    where
        F: FnMut(Instant) -> TaskStatus + 'static,
    {
        let id = self.state.next_id.get();
        self.state.next_id.set(id + 1);
        let handle = TaskHandle(NonZeroU64::new(id).unwrap_or(NonZeroU64::MIN));

        let task: TaskFn = Rc::new(RefCell::new(callback));
        self.state.tasks.borrow_mut().insert(handle, task);
        trace!(handle = handle.get(), "task scheduled");
        handle
    }

    /// Cancels a pending task. No completion callback is delivered.
    pub fn remove(&self, handle: TaskHandle) {
        if self.state.tasks.borrow_mut().shift_remove(&handle).is_some() {
            trace!(handle = handle.get(), "task removed");
        }
    }

    /// Cancels the task stored in `slot` (if any) and resets the slot.
    pub fn clear(&self, slot: &Cell<Option<TaskHandle>>) {
        if let Some(handle) = slot.take() {
            self.remove(handle);
        }
    }

    #[must_use]
    pub fn contains(&self, handle: TaskHandle) -> bool {
        self.state.tasks.borrow().contains_key(&handle)
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.tasks.borrow().len()
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }

    /// Runs one slice of every pending task against `now + slice_budget`.
    pub fn tick(&self) -> usize {
        self.run_until(Instant::now() + self.slice_budget())
    }

    /// Invokes each task that is pending when the pass starts exactly once.
    ///
    /// Returns the number of invocations. Tasks added during the pass wait
    /// for the next one.
    pub fn run_until(&self, deadline: Instant) -> usize {
        let handles: SmallVec<[TaskHandle; 8]> =
            self.state.tasks.borrow().keys().copied().collect();

        let mut invoked = 0;
        for handle in handles {
            let task = self.state.tasks.borrow().get(&handle).cloned();
            let Some(task) = task else {
                continue;
            };

            let status = {
                let mut callback = task.borrow_mut();
                (&mut *callback)(deadline)
            };
            invoked += 1;

            if status == TaskStatus::Done {
                self.state.tasks.borrow_mut().shift_remove(&handle);
                trace!(handle = handle.get(), "task finished");
            }
        }
        invoked
    }

    /// Ticks until the queue is empty or `max_ticks` passes ran.
    ///
    /// Returns the number of ticks performed.
    pub fn drain(&self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks && !self.is_idle() {
            self.tick();
            ticks += 1;
        }
        if !self.is_idle() {
            debug!(ticks, pending = self.pending(), "scheduler drain stopped early");
        }
        ticks
    }
}
