//! Interned identifiers for node labels and relationship types.
//!
//! Labels and types are compared constantly during import, so both kinds of
//! identifier share a process-wide intern pool and carry an `Arc<str>`.
//! Interned names are never dropped for the lifetime of the process.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

static INTERN_POOL: Lazy<Mutex<HashSet<Arc<str>>>> = Lazy::new(|| Mutex::new(HashSet::new()));

fn intern(name: &str) -> Arc<str> {
    let mut pool = INTERN_POOL.lock();
    if let Some(existing) = pool.get(name) {
        Arc::clone(existing)
    } else {
        let interned: Arc<str> = Arc::from(name);
        pool.insert(Arc::clone(&interned));
        interned
    }
}

/// Trait for element identifiers (node labels, relationship types).
pub trait ElementIdentifier: Clone + Eq + Hash + Send + Sync {
    fn name(&self) -> &str;
}

/// Node label identifier.
#[derive(Clone, Debug, Eq)]
pub struct NodeLabel(Arc<str>);

impl NodeLabel {
    /// Special label representing all nodes.
    pub const ALL_NODES: &'static str = "*";

    pub fn of(name: impl AsRef<str>) -> Self {
        NodeLabel(intern(name.as_ref()))
    }

    pub fn all_nodes() -> Self {
        Self::of(Self::ALL_NODES)
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_all_nodes(&self) -> bool {
        &*self.0 == Self::ALL_NODES
    }
}

impl PartialEq for NodeLabel {
    fn eq(&self, other: &Self) -> bool {
        // Interned identifiers with equal content share a pointer.
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Hash for NodeLabel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl ElementIdentifier for NodeLabel {
    fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for NodeLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NodeLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(NodeLabel::of(name))
    }
}

/// Relationship type identifier.
#[derive(Clone, Debug, Eq)]
pub struct RelationshipType(Arc<str>);

impl RelationshipType {
    pub fn of(name: impl AsRef<str>) -> Self {
        RelationshipType(intern(name.as_ref()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl PartialEq for RelationshipType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Hash for RelationshipType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl ElementIdentifier for RelationshipType {
    fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for RelationshipType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RelationshipType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(RelationshipType::of(name))
    }
}
