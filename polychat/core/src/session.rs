//! Session History Records
//!
//! Read-only view of the host application's session store. The core only
//! consumes these records to derive the recently-used model ranking; it
//! never writes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One historical chat session, as recorded by the host application.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionEntry {
    /// Name of the model the session used.
    pub model: String,
    /// When the session was last active.
    pub updated_at: DateTime<Utc>,
}

impl SessionEntry {
    /// Create a session record.
    pub fn new(model: impl Into<String>, updated_at: DateTime<Utc>) -> Self {
        Self {
            model: model.into(),
            updated_at,
        }
    }
}
