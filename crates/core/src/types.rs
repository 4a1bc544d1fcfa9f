use std::collections::HashMap;

/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Host-owned field values keyed by field definition id.
pub type ValueMap = HashMap<DbId, serde_json::Value>;
