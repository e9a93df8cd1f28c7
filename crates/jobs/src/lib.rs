//! Long-running register jobs.
//!
//! - [`JobPoller`] drives one job at a time through
//!   start -> poll -> completed / cancelled / failed, mirroring progress
//!   into a [`PollingJob`](logibooks_core::PollingJob).
//! - [`JobApi`] and [`ListRefresher`] are the seams to the backend and to
//!   whatever list the job affects.
//! - [`AlertBus`] carries user-visible failure messages.

pub mod alerts;
pub mod api;
pub mod poller;

pub use alerts::{Alert, AlertBus};
pub use api::{JobApi, ListRefresher};
pub use poller::JobPoller;
