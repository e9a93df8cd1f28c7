//! Value types for long-running register jobs.
//!
//! A register job (bulk validation or FEACN code lookup) runs on the
//! backend. The client only holds the server-issued [`JobHandle`], polls
//! [`JobProgress`], and mirrors it into a [`PollingJob`] for display.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// JobHandle
// ---------------------------------------------------------------------------

/// Opaque server-issued identifier of a running job.
///
/// The backend may send it as a JSON string or a JSON number; both are
/// kept in their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(raw: impl Into<String>) -> Result<Self, CoreError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(CoreError::Validation("job handle must not be empty".into()));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for JobHandle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        let text = match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s,
            Raw::Number(n) => n.to_string(),
        };
        JobHandle::new(text).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// JobProgress
// ---------------------------------------------------------------------------

/// Progress report returned by a job's progress endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProgress {
    pub total: i64,
    pub processed: i64,
    #[serde(default)]
    pub finished: bool,
}

impl JobProgress {
    /// `total` or `processed` value meaning the job vanished or was
    /// aborted server-side.
    pub const SENTINEL: i64 = -1;

    /// Whether polling should stop after this report.
    pub fn is_terminal(&self) -> bool {
        self.finished || self.total == Self::SENTINEL || self.processed == Self::SENTINEL
    }
}

// ---------------------------------------------------------------------------
// JobOperation
// ---------------------------------------------------------------------------

/// Kind of register job. Selects the start, progress and cancel endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobOperation {
    /// Stop-word and tariff validation of every parcel in a register.
    Validation,
    /// FEACN code lookup for every parcel in a register.
    FeacnLookup { extended: bool },
}

impl JobOperation {
    /// Stable name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            JobOperation::Validation => "validation",
            JobOperation::FeacnLookup { extended: false } => "feacn_lookup",
            JobOperation::FeacnLookup { extended: true } => "feacn_lookup_extended",
        }
    }
}

impl fmt::Display for JobOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// PollingJob
// ---------------------------------------------------------------------------

/// Client-side mirror of one in-flight job.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PollingJob {
    /// Register whose list is refreshed when the job ends.
    pub register_id: Option<DbId>,
    pub handle: Option<JobHandle>,
    pub total: i64,
    pub processed: i64,
    /// Whether a progress view should be visible.
    pub show: bool,
    pub operation: Option<JobOperation>,
}

impl PollingJob {
    /// Fresh state right after the server accepted a job.
    pub fn started(register_id: DbId, handle: JobHandle, operation: JobOperation) -> Self {
        Self {
            register_id: Some(register_id),
            handle: Some(handle),
            total: 0,
            processed: 0,
            show: true,
            operation: Some(operation),
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// Copy counters from a progress report.
    pub fn apply(&mut self, progress: &JobProgress) {
        self.total = progress.total;
        self.processed = progress.processed;
    }

    /// Drop the handle and hide the progress view. Counters keep their
    /// last values.
    pub fn finish(&mut self) {
        self.handle = None;
        self.operation = None;
        self.show = false;
    }

    /// Completion in whole percent, when `total` is known and positive.
    pub fn percent(&self) -> Option<u8> {
        if self.total <= 0 || self.processed < 0 {
            return None;
        }
        let pct = i128::from(self.processed.min(self.total)) * 100 / i128::from(self.total);
        u8::try_from(pct).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn handle_accepts_number_or_string() {
        let from_num: JobHandle = serde_json::from_value(json!(7)).unwrap();
        let from_str: JobHandle = serde_json::from_value(json!("b1c2")).unwrap();
        assert_eq!(from_num.as_str(), "7");
        assert_eq!(from_str.as_str(), "b1c2");
    }

    #[test]
    fn empty_handle_is_rejected() {
        assert_matches!(JobHandle::new("  "), Err(CoreError::Validation(_)));
        assert!(serde_json::from_value::<JobHandle>(json!("")).is_err());
    }

    #[test]
    fn progress_finished_defaults_to_false() {
        let p: JobProgress = serde_json::from_value(json!({"total": 3, "processed": 1})).unwrap();
        assert!(!p.finished);
        assert!(!p.is_terminal());
    }

    #[test]
    fn sentinels_are_terminal() {
        let both = JobProgress { total: -1, processed: -1, finished: false };
        let total_only = JobProgress { total: -1, processed: 4, finished: false };
        let processed_only = JobProgress { total: 10, processed: -1, finished: false };
        assert!(both.is_terminal());
        assert!(total_only.is_terminal());
        assert!(processed_only.is_terminal());
    }

    #[test]
    fn finished_is_terminal() {
        let p = JobProgress { total: 10, processed: 10, finished: true };
        assert!(p.is_terminal());
    }

    #[test]
    fn operation_names() {
        assert_eq!(JobOperation::Validation.name(), "validation");
        assert_eq!(JobOperation::FeacnLookup { extended: true }.to_string(), "feacn_lookup_extended");
    }

    #[test]
    fn polling_job_lifecycle() {
        let handle = JobHandle::new("42").unwrap();
        let mut job = PollingJob::started(3, handle.clone(), JobOperation::Validation);
        assert!(job.show);
        assert_eq!(job.handle, Some(handle));

        job.apply(&JobProgress { total: 8, processed: 2, finished: false });
        assert_eq!(job.percent(), Some(25));

        job.finish();
        assert!(!job.show);
        assert!(!job.is_active());
        assert_eq!(job.processed, 2);
    }

    #[test]
    fn percent_unknown_without_total() {
        let job = PollingJob::default();
        assert_eq!(job.percent(), None);
    }

    #[test]
    fn percent_handles_huge_counts() {
        let mut job = PollingJob::default();
        let big = i64::MAX / 10;
        job.apply(&JobProgress { total: big, processed: big, finished: false });
        assert_eq!(job.percent(), Some(100));

        job.apply(&JobProgress { total: i64::MAX, processed: i64::MAX / 2, finished: false });
        assert_eq!(job.percent(), Some(49));

        job.apply(&JobProgress { total: 10, processed: i64::MAX, finished: false });
        assert_eq!(job.percent(), Some(100));
    }
}
