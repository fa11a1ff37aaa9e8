//! Relationship directionality and load-time orientation.

use serde::{Deserialize, Serialize};

/// How a relationship type is stored in the final schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Directed,
    Undirected,
}

impl Direction {
    pub fn is_undirected(self) -> bool {
        self == Direction::Undirected
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Directed => write!(f, "DIRECTED"),
            Direction::Undirected => write!(f, "UNDIRECTED"),
        }
    }
}

/// Direction policy applied while loading relationships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// Store edges as given: source to target.
    Natural,
    /// Store edges flipped: target to source.
    Reverse,
    /// Store edges in both directions.
    Undirected,
}

impl Orientation {
    pub fn direction(self) -> Direction {
        match self {
            Orientation::Natural | Orientation::Reverse => Direction::Directed,
            Orientation::Undirected => Direction::Undirected,
        }
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Orientation::Natural
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Orientation::Natural => write!(f, "NATURAL"),
            Orientation::Reverse => write!(f, "REVERSE"),
            Orientation::Undirected => write!(f, "UNDIRECTED"),
        }
    }
}
