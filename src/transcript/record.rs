use super::{Session, Speaker};
use crate::shared::ids::RecordId;
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// ISO-8601 local time without offset, to the second.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Appends `.ffffff` only when the sub-second part is non-zero.
pub fn format_timestamp(at: NaiveDateTime) -> String {
    let seconds = at.format(TIMESTAMP_FORMAT);
    match at.nanosecond() / 1_000 {
        0 => seconds.to_string(),
        micros => format!("{seconds}.{micros:06}"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DialogueEntry {
    pub role: Speaker,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TranscriptRecord {
    pub id: RecordId,
    pub timestamp: String,
    pub dialogue: Vec<DialogueEntry>,
}

impl TranscriptRecord {
    pub fn capture(id: RecordId, session: &Session) -> Self {
        Self::capture_at(id, chrono::Local::now().naive_local(), session)
    }

    pub fn capture_at(id: RecordId, at: NaiveDateTime, session: &Session) -> Self {
        Self {
            id,
            timestamp: format_timestamp(at),
            dialogue: session
                .turns()
                .iter()
                .map(|turn| DialogueEntry {
                    role: turn.speaker(),
                    content: turn.content().to_string(),
                })
                .collect(),
        }
    }
}
