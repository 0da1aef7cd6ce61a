//! Record identifier generation.
//!
//! Ids are UUIDv7 rendered in lowercase hyphenated form: a 48-bit unix
//! millisecond prefix followed by a monotonic counter and random bits. Because
//! every id has the same length and the hex alphabet sorts the same way as the
//! underlying bytes, lexical order equals creation order at millisecond
//! resolution, and ids from the same process stay ordered within a millisecond.

use uuid::Uuid;

use crate::constants::RECORD_ID_LENGTH;

/// Generate a fresh record identifier.
///
/// # Panics
/// Panics if the operating system's random source is unavailable.
pub fn new_record_id() -> String {
    Uuid::now_v7().as_hyphenated().to_string()
}

/// Check whether `id` has the shape of a generated record identifier.
pub fn is_record_id(id: &str) -> bool {
    id.len() == RECORD_ID_LENGTH
        && matches!(Uuid::try_parse(id), Ok(uuid) if uuid.get_version_num() == 7)
        && !id.bytes().any(|b| b.is_ascii_uppercase())
}
