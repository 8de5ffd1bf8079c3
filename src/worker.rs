//! Worker run loop: receive a command, compute, reply, await the next.
//!
//! Each worker is a single sequential loop driven by the protocol state
//! machine. The worker answers the current command in full — including the
//! conditional vector frame after an owning `FIND_WORD` — before accepting
//! another.

use crate::embedding::VectorDimension;
use crate::error::{ShardError, ShardResult};
use crate::protocol::{Command, FrameCodec, Reply, WorkerState};
use crate::store::WorkerStore;
use crate::transport::WorkerEndpoint;
use std::thread::JoinHandle;
use tracing::{debug, error};

/// One worker: its endpoint, codec, owned rows, and protocol state.
pub struct Worker {
    endpoint: WorkerEndpoint,
    codec: FrameCodec,
    store: WorkerStore,
    state: WorkerState,
}

impl Worker {
    /// Creates a worker with an empty store, awaiting its `Load` transfer.
    #[must_use]
    pub fn new(endpoint: WorkerEndpoint, codec: FrameCodec, dimension: VectorDimension) -> Self {
        Self {
            endpoint,
            codec,
            store: WorkerStore::new(dimension),
            state: WorkerState::AwaitingLoad,
        }
    }

    /// Runs the processing loop until `Exit` or coordinator hang-up.
    pub fn run(mut self) -> ShardResult<()> {
        let id = self.endpoint.worker();
        loop {
            let frame = match self.endpoint.recv() {
                Ok(frame) => frame,
                Err(ShardError::Disconnected { .. }) => {
                    debug!("worker {id}: coordinator hung up, stopping");
                    return Ok(());
                }
                Err(err) => return Err(err),
            };

            let command = self.codec.decode_command(&frame)?;
            self.state = self.state.on_command(command.kind())?;

            match command {
                Command::Load { rows } => {
                    debug!("worker {id}: loaded {} rows", rows.len());
                    self.store.load(rows)?;
                }
                Command::FindWord { word } => {
                    // A FIND_WORD starts a new query; earlier reported
                    // state must not leak into it.
                    self.store.reset_reported_mask();
                    let owned_index = self.store.find_word(&word);
                    self.reply(&Reply::WordIndex {
                        owned: owned_index.is_some(),
                    })?;
                    if let Some(index) = owned_index {
                        debug!("worker {id}: owns '{word}'");
                        self.reply(&Reply::Vector {
                            vector: self.store.vector_of(index).to_vec(),
                        })?;
                    }
                    self.state = self.state.on_replied();
                }
                Command::Rank { target } => {
                    let reply = match self.store.best_unreported(&target) {
                        Some((index, score)) => Reply::Best {
                            word: self.store.word_of(index).to_string(),
                            score,
                        },
                        None => Reply::Exhausted,
                    };
                    self.reply(&reply)?;
                    self.state = self.state.on_replied();
                }
                Command::Exit => {
                    debug!("worker {id}: exit received");
                    return Ok(());
                }
            }
        }
    }

    fn reply(&self, reply: &Reply) -> ShardResult<()> {
        self.endpoint.send(self.codec.encode_reply(reply)?)
    }
}

/// Spawns a worker on its own named OS thread.
pub fn spawn(
    endpoint: WorkerEndpoint,
    codec: FrameCodec,
    dimension: VectorDimension,
) -> JoinHandle<()> {
    let id = endpoint.worker();
    std::thread::Builder::new()
        .name(format!("wordshard-worker-{id}"))
        .spawn(move || {
            if let Err(err) = Worker::new(endpoint, codec, dimension).run() {
                error!("worker {id} stopped with error: {err}");
            }
        })
        .expect("failed to spawn worker thread")
}
