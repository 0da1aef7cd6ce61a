//! Record entity and backend tag.

use serde::{Deserialize, Serialize};

use crate::constants::{BACKEND_TAG_KEY_VALUE, BACKEND_TAG_RELATIONAL};
use crate::error::DomainError;

/// Physical store that owns a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Relational,
    KeyValue,
}

impl Backend {
    /// Every backend, in federated listing order.
    pub const ALL: [Backend; 2] = [Backend::Relational, Backend::KeyValue];

    /// Numeric wire tag of this backend
    pub fn tag(self) -> i32 {
        match self {
            Backend::Relational => BACKEND_TAG_RELATIONAL,
            Backend::KeyValue => BACKEND_TAG_KEY_VALUE,
        }
    }

    /// Stable lowercase name used in logs and error messages
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Relational => "relational",
            Backend::KeyValue => "key_value",
        }
    }
}

impl TryFrom<i32> for Backend {
    type Error = DomainError;

    fn try_from(tag: i32) -> Result<Self, Self::Error> {
        match tag {
            BACKEND_TAG_RELATIONAL => Ok(Backend::Relational),
            BACKEND_TAG_KEY_VALUE => Ok(Backend::KeyValue),
            other => Err(DomainError::InvalidBackend(other)),
        }
    }
}

impl From<Backend> for i32 {
    fn from(backend: Backend) -> Self {
        backend.tag()
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record domain entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Store that owns this record; fixed at creation
    pub backend: Backend,
}

impl Record {
    /// Build a record from caller-supplied fields.
    pub fn new(id: String, input: RecordInput, backend: Backend) -> Self {
        Self {
            id,
            name: input.name,
            email: input.email,
            phone: input.phone,
            backend,
        }
    }

    /// Replace every mutable field. `id` and `backend` are left untouched.
    pub fn apply(&mut self, input: RecordInput) {
        self.name = input.name;
        self.email = input.email;
        self.phone = input.phone;
    }

    /// Mutable fields of this record
    pub fn input(&self) -> RecordInput {
        RecordInput {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// Mutable record fields supplied on create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordInput {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl RecordInput {
    pub fn new(name: impl Into<String>, email: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }
}
