//! Wire envelope for API responses
//!
//! Pure projection from pipeline outcomes to the response shape; no business
//! logic lives here.

use chrono::Utc;
use serde::Serialize;

use crate::model::NormalizedRecord;

/// Response envelope returned by every `/search` call
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub success: bool,
    pub message: String,
    pub data: Vec<NormalizedRecord>,
    /// ISO-8601 timestamp of when the response was built
    pub timestamp: String,
}

impl Envelope {
    /// Successful outcome; an empty record list is still a success
    pub fn ok(data: Vec<NormalizedRecord>) -> Self {
        Self {
            success: true,
            message: "ok".to_string(),
            data,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Failure outcome with a human-readable message and no data
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: Vec::new(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}
