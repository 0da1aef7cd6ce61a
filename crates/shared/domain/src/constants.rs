//! Domain-level constants.
//!
//! These constants define the backend tags and identifier format shared by
//! every store.

// =============================================================================
// Backend Tags
// =============================================================================

/// Wire tag of the relational (SQL) backend
pub const BACKEND_TAG_RELATIONAL: i32 = 1;

/// Wire tag of the schemaless key-value backend
pub const BACKEND_TAG_KEY_VALUE: i32 = 2;

// =============================================================================
// Identifiers
// =============================================================================

/// Length of a rendered record identifier (hyphenated UUID)
pub const RECORD_ID_LENGTH: usize = 36;
