//! Background catalog synchronization.
//!
//! A [`SyncScheduler`] periodically drives a [`CycleRunner`], which pulls the
//! provider's popularity ranking and reconciles each show into the local
//! catalog through a [`Reconciler`].

mod cycle;
pub mod normalize;
mod reconciler;
mod scheduler;
mod types;

pub use cycle::{CycleConfig, CycleRunner};
pub use reconciler::{
    build_show, decide, refresh_show, Reconciler, Reconciliation, StalenessPolicy, UNKNOWN_FIELD,
};
pub use scheduler::{SchedulerConfig, SyncScheduler, DEFAULT_WARMUP};
pub use types::*;
