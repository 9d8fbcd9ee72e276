//! Periodic Task Scheduler
//!
//! Runs a callback at a fixed interval off the caller's thread. The sweeper
//! is written against the [`Scheduler`] trait so it can run on a Tokio
//! runtime, a plain thread, or a hand-cranked scheduler in tests.

use std::any::Any;
use std::ops::ControlFlow;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, warn};

/// A unit of periodic work. Returning `Break` ends the schedule.
pub type Task = Box<dyn FnMut() -> ControlFlow<()> + Send + 'static>;

/// Shortest spacing the timed schedulers will run a task at.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Raises `interval` to [`MIN_INTERVAL`]. A zero period would panic the
/// Tokio ticker and spin a thread.
fn effective_interval(interval: Duration) -> Duration {
    if interval < MIN_INTERVAL {
        warn!(?interval, "Schedule interval too short, using {:?}", MIN_INTERVAL);
        MIN_INTERVAL
    } else {
        interval
    }
}

// == Scheduler Trait ==
/// Invokes a task repeatedly at roughly `interval` spacing until stopped.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, interval: Duration, task: Task) -> TaskHandle;
}

// == Task Handle ==
/// Stop signal for a scheduled task.
///
/// Dropping the handle does not stop the task; call [`TaskHandle::stop`].
#[derive(Debug, Clone, Default)]
pub struct TaskHandle {
    stopped: Arc<AtomicBool>,
    abort: Option<Arc<AbortHandle>>,
    thread: Option<thread::Thread>,
}

impl TaskHandle {
    fn new() -> Self {
        Self::default()
    }

    /// Asks the task to stop. No further invocations start after this
    /// returns; one already running is allowed to finish.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        if let Some(abort) = &self.abort {
            abort.abort();
        }
        if let Some(thread) = &self.thread {
            thread.unpark();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

// == Tick Runner ==
/// Runs one invocation, containing any panic so later ticks still run.
fn run_tick(task: &mut Task) -> ControlFlow<()> {
    match panic::catch_unwind(AssertUnwindSafe(|| task())) {
        Ok(flow) => flow,
        Err(payload) => {
            error!(
                "Scheduled task panicked, continuing: {}",
                panic_message(payload.as_ref())
            );
            ControlFlow::Continue(())
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "<non-string panic payload>"
    }
}

// == Tokio Scheduler ==
/// Spawns the task loop onto a Tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Uses the runtime the caller is running on, if any.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, interval: Duration, mut task: Task) -> TaskHandle {
        let interval = effective_interval(interval);
        let mut handle = TaskHandle::new();
        let stopped = Arc::clone(&handle.stopped);

        let join = self.handle.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if stopped.load(Ordering::Acquire) || run_tick(&mut task).is_break() {
                    break;
                }
            }
            debug!("Scheduled task finished");
        });

        handle.abort = Some(Arc::new(join.abort_handle()));
        handle
    }
}

// == Thread Scheduler ==
/// Runs the task loop on a dedicated OS thread.
#[derive(Debug, Clone, Default)]
pub struct ThreadScheduler;

impl Scheduler for ThreadScheduler {
    fn schedule(&self, interval: Duration, mut task: Task) -> TaskHandle {
        let interval = effective_interval(interval);
        let mut handle = TaskHandle::new();
        let stopped = Arc::clone(&handle.stopped);

        let spawned = thread::Builder::new()
            .name("ttlcache-sweeper".to_string())
            .spawn(move || {
                loop {
                    let deadline = Instant::now() + interval;
                    // park_timeout may wake early; stop() unparks on purpose
                    loop {
                        if stopped.load(Ordering::Acquire) {
                            debug!("Scheduled task finished");
                            return;
                        }
                        let now = Instant::now();
                        if now >= deadline {
                            break;
                        }
                        thread::park_timeout(deadline - now);
                    }

                    if run_tick(&mut task).is_break() {
                        break;
                    }
                }
                debug!("Scheduled task finished");
            });

        match spawned {
            Ok(join) => handle.thread = Some(join.thread().clone()),
            Err(err) => {
                error!("Failed to spawn scheduler thread: {}", err);
                handle.stopped.store(true, Ordering::Release);
            }
        }
        handle
    }
}

// == Default Scheduler ==
/// Tokio when called from inside a runtime, otherwise a dedicated thread.
#[derive(Debug, Clone, Default)]
pub struct DefaultScheduler;

impl Scheduler for DefaultScheduler {
    fn schedule(&self, interval: Duration, task: Task) -> TaskHandle {
        match TokioScheduler::current() {
            Some(tokio) => tokio.schedule(interval, task),
            None => ThreadScheduler.schedule(interval, task),
        }
    }
}

// == Manual Scheduler ==
/// Records scheduled tasks and runs them only when [`tick`](Self::tick) is
/// called. Intervals are ignored.
#[derive(Default)]
pub struct ManualScheduler {
    tasks: Mutex<Vec<(TaskHandle, Task)>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every live task once. Returns how many ran.
    pub fn tick(&self) -> usize {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        let mut ran = 0;
        tasks.retain_mut(|(handle, task)| {
            if handle.is_stopped() {
                return false;
            }
            ran += 1;
            run_tick(task).is_continue()
        });
        ran
    }

    /// Number of tasks still scheduled.
    pub fn pending(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(handle, _)| !handle.is_stopped())
            .count()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, _interval: Duration, task: Task) -> TaskHandle {
        let handle = TaskHandle::new();
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((handle.clone(), task));
        handle
    }
}
