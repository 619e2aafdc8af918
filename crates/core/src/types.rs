/// Identifiers handed out by the monitoring store (profiles, notifications).
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
