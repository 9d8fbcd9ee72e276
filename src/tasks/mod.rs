//! Background Tasks Module
//!
//! Contains the periodic scheduler abstraction and the tasks run on it.
//!
//! # Tasks
//! - TTL Sweep: Removes expired cache entries once the sweep interval elapses

mod scheduler;
mod sweeper;

pub use scheduler::{
    DefaultScheduler, ManualScheduler, Scheduler, Task, TaskHandle, ThreadScheduler,
    TokioScheduler, MIN_INTERVAL,
};

pub(crate) use sweeper::spawn_sweeper;
