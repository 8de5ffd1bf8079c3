//! Partitioned nearest-neighbor lookup over a fixed word-embedding table.
//!
//! One coordinator splits the table across a fixed set of workers, then for
//! each operator query has the workers locate the word and score their own
//! rows, harvesting the global top-K from per-worker local orderings
//! without any node holding the full table or a full sorted ranking.

pub mod config;
pub mod coordinator;
pub mod embedding;
pub mod error;
pub mod partition;
pub mod protocol;
pub mod store;
pub mod transport;
pub mod worker;

// Explicit exports for better API clarity
pub use config::Settings;
pub use coordinator::{CoordinatorSession, HarvestState, QueryOutcome, RankedWord};
pub use embedding::{
    BoundedWord, EmbeddingRow, MalformedRowPolicy, RowIndex, VectorDimension, WorkerId, dot,
    read_embedding_file,
};
pub use error::{ShardError, ShardResult};
pub use partition::{Partition, PartitionPlan};
pub use protocol::{Command, CommandKind, FrameCodec, Reply, WorkerState};
pub use store::WorkerStore;
pub use transport::{ChannelLink, WorkerEndpoint, WorkerLink, channel_pair};
pub use worker::Worker;
