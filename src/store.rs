//! Per-worker storage for an owned slice of the embedding table.
//!
//! A store holds its partition's rows plus the reported mask: one bool per
//! row recording whether that row was already surfaced as an answer for the
//! current query. The mask is private to the owning worker and reset at the
//! start of every query, so it needs no locking.

use crate::embedding::{EmbeddingRow, RowIndex, VectorDimension, dot};
use crate::error::ShardResult;

/// Storage and scoring for one worker's row range.
#[derive(Debug)]
pub struct WorkerStore {
    dimension: VectorDimension,
    rows: Vec<EmbeddingRow>,
    reported: Vec<bool>,
}

impl WorkerStore {
    /// Creates an empty store expecting vectors of `dimension`.
    #[must_use]
    pub fn new(dimension: VectorDimension) -> Self {
        Self {
            dimension,
            rows: Vec::new(),
            reported: Vec::new(),
        }
    }

    /// One-time bulk ingestion of this worker's row range.
    ///
    /// Rejects rows whose vector does not match the configured dimension.
    pub fn load(&mut self, rows: Vec<EmbeddingRow>) -> ShardResult<()> {
        for row in &rows {
            self.dimension.validate_vector(&row.vector)?;
        }
        self.reported = vec![false; rows.len()];
        self.rows = rows;
        Ok(())
    }

    /// Linear scan for `word`; returns the first exact, case-sensitive match.
    #[must_use]
    pub fn find_word(&self, word: &str) -> Option<RowIndex> {
        self.rows
            .iter()
            .position(|row| row.word.as_str() == word)
            .map(|i| RowIndex::new(i as u32))
    }

    /// Returns the vector stored at `index`.
    #[must_use]
    pub fn vector_of(&self, index: RowIndex) -> &[f32] {
        &self.rows[index.get() as usize].vector
    }

    /// Returns this store's best not-yet-reported row against `target`,
    /// marking it reported so the next call yields the next-best row.
    ///
    /// Ties break to the lowest row index. Returns `None` once every row
    /// has been reported for the current query.
    pub fn best_unreported(&mut self, target: &[f32]) -> Option<(RowIndex, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (i, row) in self.rows.iter().enumerate() {
            if self.reported[i] {
                continue;
            }
            let score = dot(target, &row.vector);
            // Strict comparison keeps the lowest index on ties.
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((i, score)),
            }
        }

        best.map(|(i, score)| {
            self.reported[i] = true;
            (RowIndex::new(i as u32), score)
        })
    }

    /// Clears the reported mask; called once at the start of every query.
    pub fn reset_reported_mask(&mut self) {
        self.reported.fill(false);
    }

    /// Returns the word stored at `index`.
    #[must_use]
    pub fn word_of(&self, index: RowIndex) -> &str {
        self.rows[index.get() as usize].word.as_str()
    }

    /// Number of rows owned by this store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when the store owns no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::BoundedWord;
    use crate::error::ShardError;

    fn row(word: &str, vector: Vec<f32>) -> EmbeddingRow {
        EmbeddingRow {
            word: BoundedWord::new(word, 20).unwrap(),
            vector,
        }
    }

    fn loaded_store() -> WorkerStore {
        let mut store = WorkerStore::new(VectorDimension::new(2).unwrap());
        store
            .load(vec![
                row("cat", vec![1.0, 0.0]),
                row("dog", vec![0.0, 1.0]),
                row("wolf", vec![0.0, 0.9]),
            ])
            .unwrap();
        store
    }

    #[test]
    fn test_load_rejects_wrong_dimension() {
        let mut store = WorkerStore::new(VectorDimension::new(2).unwrap());
        let err = store.load(vec![row("cat", vec![1.0, 0.0, 0.0])]).unwrap_err();
        assert!(matches!(err, ShardError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_find_word_is_exact_and_case_sensitive() {
        let store = loaded_store();
        assert_eq!(store.find_word("dog"), Some(RowIndex::new(1)));
        assert_eq!(store.find_word("Dog"), None);
        assert_eq!(store.find_word("do"), None);
        assert_eq!(store.find_word("fox"), None);
    }

    #[test]
    fn test_best_unreported_descends() {
        let mut store = loaded_store();
        let target = vec![0.0, 1.0]; // dog's own vector

        let (first, s1) = store.best_unreported(&target).unwrap();
        assert_eq!(store.word_of(first), "dog");
        assert!((s1 - 1.0).abs() < f32::EPSILON);

        let (second, s2) = store.best_unreported(&target).unwrap();
        assert_eq!(store.word_of(second), "wolf");
        assert!((s2 - 0.9).abs() < f32::EPSILON);

        let (third, s3) = store.best_unreported(&target).unwrap();
        assert_eq!(store.word_of(third), "cat");
        assert!(s3.abs() < f32::EPSILON);

        assert!(store.best_unreported(&target).is_none(), "exhausted");
    }

    #[test]
    fn test_ties_break_to_lowest_row_index() {
        let mut store = WorkerStore::new(VectorDimension::new(1).unwrap());
        store
            .load(vec![
                row("first", vec![0.5]),
                row("second", vec![0.5]),
                row("third", vec![0.5]),
            ])
            .unwrap();

        let target = vec![1.0];
        let (a, _) = store.best_unreported(&target).unwrap();
        let (b, _) = store.best_unreported(&target).unwrap();
        let (c, _) = store.best_unreported(&target).unwrap();
        assert_eq!(
            (a.get(), b.get(), c.get()),
            (0, 1, 2),
            "equal scores surface in row order"
        );
    }

    #[test]
    fn test_reset_reported_mask_restores_all_rows() {
        let mut store = loaded_store();
        let target = vec![0.0, 1.0];

        while store.best_unreported(&target).is_some() {}
        assert!(store.best_unreported(&target).is_none());

        store.reset_reported_mask();
        let (best, _) = store.best_unreported(&target).unwrap();
        assert_eq!(store.word_of(best), "dog");
    }
}
