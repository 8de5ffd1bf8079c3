//! The command protocol shared by coordinator and workers.
//!
//! Four coordinator-initiated message kinds (`LOAD`, `FIND_WORD`, `RANK`,
//! `EXIT`) with fixed-size binary frames and an explicit per-worker state
//! machine enforcing ordering.

mod codec;
mod message;
mod state;

pub use codec::FrameCodec;
pub use message::{Command, CommandKind, Reply};
pub use state::WorkerState;
