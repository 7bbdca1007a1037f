//! Client-supplied row ids.

use super::error::TrackerError;

/// Largest id a client may choose. Also the largest integer a JSON number
/// carries exactly, and far enough below `i64::MAX` that the store can keep
/// assigning ids of its own.
pub const MAX_RECORD_ID: i64 = 1 << 53;

pub fn check_record_id(id: Option<i64>) -> Result<(), TrackerError> {
    match id {
        Some(id) if !(1..=MAX_RECORD_ID).contains(&id) => Err(TrackerError::validation(
            "id",
            format!("id must be between 1 and {MAX_RECORD_ID}"),
        )),
        _ => Ok(()),
    }
}
