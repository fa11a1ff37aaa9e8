//! Persistence state of a property schema.

use serde::{Deserialize, Serialize};

/// Whether a property originates from the imported data or was derived
/// during construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyState {
    /// Loaded from the source files; survives export.
    Persistent,
    /// Computed or injected during the build; not part of the source data.
    Transient,
}

impl Default for PropertyState {
    fn default() -> Self {
        PropertyState::Persistent
    }
}

impl std::fmt::Display for PropertyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyState::Persistent => write!(f, "PERSISTENT"),
            PropertyState::Transient => write!(f, "TRANSIENT"),
        }
    }
}
