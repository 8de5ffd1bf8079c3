//! Type-safe wrappers and core types for the embedding table.
//!
//! This module provides newtypes following the project's strict type safety
//! guidelines. All types implement necessary traits for ergonomic usage
//! while preventing primitive obsession.

use crate::error::{ShardError, ShardResult};
use serde::{Deserialize, Serialize};

/// Default embedding dimension (GloVe/word2vec style tables).
pub const DEFAULT_DIMENSION: usize = 300;

/// Default maximum word length in bytes, matching the source table format.
pub const DEFAULT_MAX_WORD_LEN: usize = 20;

/// Type-safe wrapper for worker identifiers.
///
/// Worker ids start at zero (the first partition), so a plain u16 is used
/// rather than a non-zero type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkerId(u16);

impl WorkerId {
    /// Creates a new `WorkerId`.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the underlying u16 value.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }

    /// Returns the id as an index into per-worker state vectors.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type-safe wrapper for row indices within a worker's partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowIndex(u32);

impl RowIndex {
    /// Creates a new `RowIndex`.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the underlying u32 value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Type-safe wrapper for vector dimensions.
///
/// Ensures runtime validation of vector dimensions to prevent dimension
/// mismatches during similarity computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorDimension(usize);

impl VectorDimension {
    /// Creates a new `VectorDimension` with validation.
    ///
    /// Returns an error if the dimension is zero.
    pub fn new(dim: usize) -> ShardResult<Self> {
        if dim == 0 {
            return Err(ShardError::Configuration {
                reason: "vector dimension cannot be zero".to_string(),
            });
        }
        Ok(Self(dim))
    }

    /// Returns the underlying dimension value.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Validates that a vector has the expected dimension.
    pub fn validate_vector(&self, vector: &[f32]) -> ShardResult<()> {
        if vector.len() != self.0 {
            return Err(ShardError::DimensionMismatch {
                expected: self.0,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

/// A word with an enforced maximum byte length.
///
/// The wire format reserves a fixed slot per word, so construction rejects
/// over-long (and empty) words deterministically rather than truncating.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoundedWord {
    text: String,
}

impl BoundedWord {
    /// Creates a new `BoundedWord`, rejecting empty or over-long input.
    pub fn new(text: impl Into<String>, max_len: usize) -> ShardResult<Self> {
        let text = text.into();
        if text.is_empty() {
            return Err(ShardError::Protocol {
                reason: "word cannot be empty".to_string(),
            });
        }
        if text.len() > max_len {
            return Err(ShardError::Protocol {
                reason: format!(
                    "word '{text}' is {} bytes, maximum is {max_len}",
                    text.len()
                ),
            });
        }
        Ok(Self { text })
    }

    /// Returns the word as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Consumes the wrapper, returning the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }
}

impl std::fmt::Display for BoundedWord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// One row of the embedding table: a word and its vector.
///
/// Immutable once loaded. After distribution, each row is owned by exactly
/// one worker store; the coordinator drops its copy.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRow {
    pub word: BoundedWord,
    pub vector: Vec<f32>,
}

impl EmbeddingRow {
    /// Creates a new row, validating the vector dimension.
    pub fn new(word: BoundedWord, vector: Vec<f32>, dimension: VectorDimension) -> ShardResult<Self> {
        dimension.validate_vector(&vector)?;
        Ok(Self { word, vector })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_id() {
        let id = WorkerId::new(3);
        assert_eq!(id.get(), 3);
        assert_eq!(id.index(), 3);
        assert!(WorkerId::new(0) < WorkerId::new(1));
    }

    #[test]
    fn test_vector_dimension() {
        let dim = VectorDimension::new(300).unwrap();
        assert_eq!(dim.get(), 300);

        // Invalid dimension
        assert!(VectorDimension::new(0).is_err());

        // Validation
        let vec = vec![0.1; 300];
        assert!(dim.validate_vector(&vec).is_ok());

        let wrong_vec = vec![0.1; 100];
        assert!(dim.validate_vector(&wrong_vec).is_err());
    }

    #[test]
    fn test_bounded_word_limits() {
        let word = BoundedWord::new("cat", 20).unwrap();
        assert_eq!(word.as_str(), "cat");

        // Exactly at the limit is fine
        assert!(BoundedWord::new("a".repeat(20), 20).is_ok());

        // Over the limit and empty are rejected, never truncated
        assert!(BoundedWord::new("a".repeat(21), 20).is_err());
        assert!(BoundedWord::new("", 20).is_err());
    }

    #[test]
    fn test_embedding_row_dimension_check() {
        let dim = VectorDimension::new(3).unwrap();
        let word = BoundedWord::new("cat", 20).unwrap();

        assert!(EmbeddingRow::new(word.clone(), vec![1.0, 0.0, 0.0], dim).is_ok());
        assert!(EmbeddingRow::new(word, vec![1.0, 0.0], dim).is_err());
    }
}
