//! Logibooks domain types.
//!
//! Pure value types shared by the HTTP client and the job poller: the
//! composite parcel check status, locale label tables, and the value
//! types exchanged with long-running register jobs. No I/O lives here.

pub mod check_status;
pub mod error;
pub mod jobs;
pub mod locale;
pub mod types;

pub use check_status::{CheckSeverity, CheckStatusCode, FcStatus, SwStatus};
pub use jobs::{JobHandle, JobOperation, JobProgress, PollingJob};
pub use locale::Locale;
