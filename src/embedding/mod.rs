//! Embedding table types, similarity kernel, and file reader.

mod reader;
mod similarity;
mod types;

pub use reader::{MalformedRowPolicy, read_embedding_file};
pub use similarity::dot;
pub use types::{
    BoundedWord, DEFAULT_DIMENSION, DEFAULT_MAX_WORD_LEN, EmbeddingRow, RowIndex, VectorDimension,
    WorkerId,
};
