//! Per-worker protocol state machine.
//!
//! `Idle` is the only state that accepts a new command; the worker must
//! fully answer the current command, including its conditional follow-up
//! frame, before returning to `Idle`. A command arriving anywhere else is
//! a protocol violation, fatal to that worker's session and never ignored.

use crate::error::{ShardError, ShardResult};
use crate::protocol::message::CommandKind;

/// Protocol state of one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Waiting for the one-time `Load` transfer.
    AwaitingLoad,
    /// Ready to accept the next command.
    Idle,
    /// Answering a `FindWord` (including the conditional vector frame).
    RespondingFind,
    /// Answering a `Rank`.
    RespondingRank,
    /// `Exit` received; the processing loop is done.
    Terminated,
}

impl WorkerState {
    /// Transition on receipt of a command.
    ///
    /// `Load` and `Exit` complete immediately; `FindWord` and `Rank` move
    /// into a responding state until [`WorkerState::on_replied`].
    pub fn on_command(self, kind: CommandKind) -> ShardResult<Self> {
        match (self, kind) {
            (Self::AwaitingLoad, CommandKind::Load) => Ok(Self::Idle),
            (Self::AwaitingLoad, CommandKind::Exit) => Ok(Self::Terminated),
            (Self::Idle, CommandKind::FindWord) => Ok(Self::RespondingFind),
            (Self::Idle, CommandKind::Rank) => Ok(Self::RespondingRank),
            (Self::Idle, CommandKind::Exit) => Ok(Self::Terminated),
            (state, kind) => Err(ShardError::Protocol {
                reason: format!("command {kind} not accepted in state {state:?}"),
            }),
        }
    }

    /// Transition after the current command's reply has been fully sent.
    #[must_use]
    pub fn on_replied(self) -> Self {
        match self {
            Self::RespondingFind | Self::RespondingRank => Self::Idle,
            other => other,
        }
    }
}
