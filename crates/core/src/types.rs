/// Register and parcel primary keys as issued by the backend.
pub type DbId = i64;

/// Alert and event timestamps, always UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
