//! Record and key types.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Logical cache key for the teacher verification query.
pub const TEACHER_VERIFICATION_KEY: &str = "teacher-verification";

// ============================================================================
// VERIFICATION RECORD
// ============================================================================

/// One teacher's verification status, as returned by the verification API.
///
/// The record layout belongs to the server, so the value is kept opaque: it
/// deserializes from any JSON value and serializes back unchanged. The
/// accessors below are read-only views and never fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationRecord(serde_json::Value);

impl VerificationRecord {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Look up a top-level field when the record is a JSON object.
    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.0.as_object().and_then(|object| object.get(field))
    }

    /// The record's `id` field, if present and a string.
    pub fn id(&self) -> Option<&str> {
        self.get("id").and_then(serde_json::Value::as_str)
    }

    /// The record's `status` field, if present and a string.
    pub fn status(&self) -> Option<&str> {
        self.get("status").and_then(serde_json::Value::as_str)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

impl From<serde_json::Value> for VerificationRecord {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

// ============================================================================
// QUERY KEY
// ============================================================================

/// Key identifying one cached query.
///
/// Static keys borrow their name, so cloning the constant key never allocates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Cow<'static, str>);

impl QueryKey {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// The fixed key under which verification records are cached.
    pub const fn teacher_verification() -> Self {
        Self::from_static(TEACHER_VERIFICATION_KEY)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for QueryKey {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}
