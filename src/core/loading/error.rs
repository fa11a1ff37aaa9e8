//! Error taxonomy of the construction engine.
//!
//! Row-level problems stay `Result`s inside the workers and are promoted to
//! batch-level errors at flush boundaries; configuration problems surface
//! synchronously at builder construction.

use crate::collections::growing_bitset::BitsetGrowError;
use crate::types::schema::SchemaError;
use std::time::Duration;
use thiserror::Error;

/// Invalid builder or import configuration, raised before any work starts.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("batch size must be positive")]
    BadBatchSize,

    #[error("concurrency must be positive")]
    BadConcurrency,

    #[error("id deduplication cannot be combined with the high-limit id map backing")]
    DedupWithHighLimitIdMap,

    #[error(
        "conflicting aggregations for relationship type '{relationship_type}': \
         NONE cannot be mixed with reducing aggregations"
    )]
    AggregationConflict { relationship_type: String },

    #[error(
        "relationship type '{relationship_type}' is undirected and always \
         maintains an inverse index; indexInverse must not be requested"
    )]
    InverseIndexWithUndirected { relationship_type: String },
}

/// Structural problems in the input data.
#[derive(Debug, Clone, Error)]
pub enum StructuralError {
    #[error("relationship references unmapped original node id {original_id}")]
    DanglingEndpoint { original_id: i64 },

    #[error(
        "a single relationship property per type was requested, but type \
         '{relationship_type}' carries {count} properties"
    )]
    MultipleRelationshipProperties {
        relationship_type: String,
        count: usize,
    },

    #[error("invalid header: expected first column '{expected}', found '{found}'")]
    InvalidHeader { expected: String, found: String },
}

/// Exhausted or failed runtime resources.
#[derive(Debug, Clone, Error)]
pub enum ResourceError {
    #[error("timed out acquiring a builder from the pool after {timeout:?}")]
    PoolAcquireTimeout { timeout: Duration },

    #[error(transparent)]
    BitsetGrowFailure(#[from] BitsetGrowError),

    #[error("failed to start worker pool: {message}")]
    WorkerPoolFailure { message: String },
}

/// Top-level error of the construction engine.
#[derive(Debug, Clone, Error)]
pub enum ImportError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

pub type LoadResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_errors_convert() {
        let error: ImportError = SchemaError::UnknownLabel {
            label: "Person".to_string(),
        }
        .into();
        assert!(matches!(error, ImportError::Schema(_)));
        assert!(error.to_string().contains("Person"));
    }

    #[test]
    fn structural_errors_name_the_offender() {
        let error = StructuralError::DanglingEndpoint { original_id: 99 };
        assert!(error.to_string().contains("99"));
    }
}
