//! Message kinds exchanged between coordinator and workers.
//!
//! One coordinator-initiated command per round. `Load` is the one-time bulk
//! transfer before the command loop starts; the other three drive queries.

use crate::embedding::EmbeddingRow;

/// Commands sent by the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// One-time bulk transfer of this worker's row range.
    Load { rows: Vec<EmbeddingRow> },
    /// Ask whether this worker owns `word`; starts a new query.
    FindWord { word: String },
    /// Ask for the worker's best not-yet-reported row against `target`.
    Rank { target: Vec<f32> },
    /// Terminate the worker's processing loop.
    Exit,
}

impl Command {
    /// The command's kind, used by the state machine and logging.
    #[must_use]
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Load { .. } => CommandKind::Load,
            Self::FindWord { .. } => CommandKind::FindWord,
            Self::Rank { .. } => CommandKind::Rank,
            Self::Exit => CommandKind::Exit,
        }
    }
}

/// Discriminant-only view of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Load,
    FindWord,
    Rank,
    Exit,
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Load => "LOAD",
            Self::FindWord => "FIND_WORD",
            Self::Rank => "RANK",
            Self::Exit => "EXIT",
        };
        write!(f, "{name}")
    }
}

/// Replies sent by workers.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Whether this worker owns the queried word. When `owned` is true a
    /// `Vector` frame follows on the same channel.
    WordIndex { owned: bool },
    /// The owned word's vector, sent only after an owning `WordIndex`.
    Vector { vector: Vec<f32> },
    /// The worker's current best unreported row.
    Best { word: String, score: f32 },
    /// Every row in this worker's partition has been reported.
    Exhausted,
}
