//! Strongly-typed identifiers for lockind

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Length of a rendered unlock secret (8-4-4-4-12 hex groups)
pub const UNLOCK_SECRET_LEN: usize = 36;

/// Per-session unlock secret
///
/// Generated fresh for every lockdown from a random v4 UUID and rendered in
/// its hyphenated form. The empty secret means "no active lockdown".
/// `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnlockSecret(String);

impl UnlockSecret {
    /// Generate a fresh, effectively unguessable secret
    pub fn generate() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    /// The cleared secret
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Debug for UnlockSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "UnlockSecret(<empty>)")
        } else {
            write!(f, "UnlockSecret(<{} chars>)", self.0.len())
        }
    }
}

/// Unique identifier for a connected IPC client
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
