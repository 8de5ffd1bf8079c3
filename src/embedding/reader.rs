//! Reader for tab-separated embedding tables.
//!
//! Each line holds a word followed by one float per dimension, all separated
//! by tabs. Lines are parsed in parallel with rayon (rows are independent),
//! preserving input order so row numbers in diagnostics match the file.

use crate::embedding::{BoundedWord, EmbeddingRow, VectorDimension};
use crate::error::{ShardError, ShardResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// What to do when a row fails to parse.
///
/// The policy is explicit configuration: bad rows are either logged and
/// dropped, or the whole load aborts. Neither path corrupts adjacent rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MalformedRowPolicy {
    /// Log each malformed row at WARN and continue without it.
    #[default]
    Skip,
    /// Fail the entire load on the first malformed row.
    Abort,
}

/// Reads an embedding table from `path`.
///
/// Returns rows in file order. Malformed rows are handled per `policy`;
/// every skipped row is logged, never silently dropped.
pub fn read_embedding_file(
    path: impl AsRef<Path>,
    dimension: VectorDimension,
    max_word_len: usize,
    policy: MalformedRowPolicy,
) -> ShardResult<Vec<EmbeddingRow>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| ShardError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let lines: Vec<&str> = contents.lines().collect();
    let parsed: Vec<ShardResult<EmbeddingRow>> = lines
        .par_iter()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| parse_row(line, number + 1, dimension, max_word_len))
        .collect();

    let mut rows = Vec::with_capacity(parsed.len());
    let mut skipped = 0usize;
    for result in parsed {
        match result {
            Ok(row) => rows.push(row),
            Err(err) => match policy {
                MalformedRowPolicy::Skip => {
                    warn!("skipping row: {err}");
                    skipped += 1;
                }
                MalformedRowPolicy::Abort => return Err(err),
            },
        }
    }

    info!(
        "loaded {} rows from {} ({} skipped)",
        rows.len(),
        path.display(),
        skipped
    );
    Ok(rows)
}

/// Parses one `word<TAB>f1<TAB>...<TAB>fD` line.
fn parse_row(
    line: &str,
    number: usize,
    dimension: VectorDimension,
    max_word_len: usize,
) -> ShardResult<EmbeddingRow> {
    let mut fields = line.split('\t');

    let word_field = fields.next().unwrap_or_default();
    let word =
        BoundedWord::new(word_field.trim(), max_word_len).map_err(|_| ShardError::MalformedRow {
            line: number,
            reason: format!(
                "word '{}' is empty or longer than {max_word_len} bytes",
                word_field.trim()
            ),
        })?;

    let mut vector = Vec::with_capacity(dimension.get());
    for field in fields {
        let value: f32 = field.trim().parse().map_err(|_| ShardError::MalformedRow {
            line: number,
            reason: format!("'{}' is not a float", field.trim()),
        })?;
        vector.push(value);
    }

    if vector.len() != dimension.get() {
        return Err(ShardError::MalformedRow {
            line: number,
            reason: format!(
                "expected {} components, found {}",
                dimension.get(),
                vector.len()
            ),
        });
    }

    Ok(EmbeddingRow { word, vector })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_well_formed_file() {
        let file = write_file("cat\t1.0\t0.0\ndog\t0.0\t1.0\n");
        let dim = VectorDimension::new(2).unwrap();

        let rows = read_embedding_file(file.path(), dim, 20, MalformedRowPolicy::Abort).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].word.as_str(), "cat");
        assert_eq!(rows[0].vector, vec![1.0, 0.0]);
        assert_eq!(rows[1].word.as_str(), "dog");
    }

    #[test]
    fn test_skip_policy_drops_bad_rows() {
        let file = write_file("cat\t1.0\t0.0\nbad\tnot_a_float\t0.5\nwolf\t0.0\t0.9\n");
        let dim = VectorDimension::new(2).unwrap();

        let rows = read_embedding_file(file.path(), dim, 20, MalformedRowPolicy::Skip).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].word.as_str(), "cat");
        assert_eq!(rows[1].word.as_str(), "wolf");
    }

    #[test]
    fn test_abort_policy_fails_load() {
        let file = write_file("cat\t1.0\t0.0\nbad\t0.5\n");
        let dim = VectorDimension::new(2).unwrap();

        let err = read_embedding_file(file.path(), dim, 20, MalformedRowPolicy::Abort).unwrap_err();
        assert!(matches!(err, ShardError::MalformedRow { line: 2, .. }));
    }

    #[test]
    fn test_wrong_component_count_rejected() {
        let dim = VectorDimension::new(3).unwrap();
        let err = parse_row("cat\t1.0\t0.0", 7, dim, 20).unwrap_err();
        assert!(matches!(err, ShardError::MalformedRow { line: 7, .. }));
    }

    #[test]
    fn test_overlong_word_rejected() {
        let dim = VectorDimension::new(1).unwrap();
        let long = "x".repeat(30);
        let err = parse_row(&format!("{long}\t1.0"), 1, dim, 20).unwrap_err();
        assert!(matches!(err, ShardError::MalformedRow { .. }));
    }

    #[test]
    fn test_blank_lines_ignored() {
        let file = write_file("cat\t1.0\n\ndog\t0.5\n");
        let dim = VectorDimension::new(1).unwrap();

        let rows = read_embedding_file(file.path(), dim, 20, MalformedRowPolicy::Abort).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let dim = VectorDimension::new(2).unwrap();
        let err = read_embedding_file("/nonexistent/table.tsv", dim, 20, MalformedRowPolicy::Skip)
            .unwrap_err();
        assert!(matches!(err, ShardError::FileRead { .. }));
    }
}
