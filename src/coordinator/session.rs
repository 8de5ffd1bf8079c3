//! Coordinator session: distribution and the per-query command rounds.
//!
//! The session is single-threaded and synchronous: it broadcasts a command,
//! then blocks on each addressed worker's reply in worker-id order before
//! advancing. Every receive uses a bounded wait; a worker that misses the
//! deadline is excluded from the current and all future rounds and the
//! session continues in degraded mode.

use crate::coordinator::harvest::{HarvestState, RankedWord};
use crate::embedding::{BoundedWord, EmbeddingRow, WorkerId};
use crate::error::{ShardError, ShardResult};
use crate::partition::PartitionPlan;
use crate::protocol::{Command, FrameCodec, Reply};
use crate::transport::WorkerLink;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of one operator query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// No live worker owns the query word. A normal outcome, not an error.
    NotFound,
    /// The global top-K, in non-increasing score order. `partial` is set
    /// when any worker was excluded before or during this query.
    Found {
        results: Vec<RankedWord>,
        partial: bool,
    },
}

/// The coordinator's view of the worker set for one run.
///
/// Holds the full table only transiently, while distributing; afterwards
/// the coordinator keeps no row data.
pub struct CoordinatorSession<L: WorkerLink> {
    links: Vec<L>,
    codec: FrameCodec,
    timeout: Duration,
    live: Vec<bool>,
}

impl<L: WorkerLink> CoordinatorSession<L> {
    /// Creates a session over an ordered worker set.
    ///
    /// Links must be supplied in worker-id order, ids 0..count.
    pub fn new(links: Vec<L>, codec: FrameCodec, timeout: Duration) -> ShardResult<Self> {
        for (i, link) in links.iter().enumerate() {
            if link.worker().index() != i {
                return Err(ShardError::Configuration {
                    reason: format!(
                        "worker links must be ordered by id: found worker {} at position {i}",
                        link.worker()
                    ),
                });
            }
        }
        let live = vec![true; links.len()];
        Ok(Self {
            links,
            codec,
            timeout,
            live,
        })
    }

    /// Total workers in the session, live or not.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.links.len()
    }

    /// Workers still participating in rounds.
    #[must_use]
    pub fn live_workers(&self) -> usize {
        self.live.iter().filter(|live| **live).count()
    }

    /// Splits the table per the partition plan and bulk-transfers each
    /// worker its range. Consumes the rows: after this the coordinator
    /// holds no row data.
    pub fn distribute(&mut self, rows: Vec<EmbeddingRow>) -> ShardResult<()> {
        let plan = PartitionPlan::new(rows.len(), self.links.len())?;
        info!(
            "distributing {} rows across {} workers",
            rows.len(),
            plan.worker_count()
        );

        // split_off in reverse partition order peels each worker's
        // contiguous range off the tail without copying the rest.
        let mut remaining = rows;
        for partition in plan.partitions().iter().rev() {
            let chunk = remaining.split_off(partition.start);
            debug!(
                "sending {} rows to worker {}",
                chunk.len(),
                partition.worker
            );
            self.send_to(partition.worker, &Command::Load { rows: chunk });
        }
        Ok(())
    }

    /// Drives one query end-to-end: locate the word's owner, fetch the
    /// target vector, then harvest the global top-K.
    pub fn query(&mut self, word: &str, k: usize) -> ShardResult<QueryOutcome> {
        // The loader enforces the same length bound, so a word the wire
        // cannot carry cannot be in the table either.
        if BoundedWord::new(word, self.codec.max_word_len()).is_err() {
            warn!(
                "query word '{word}' is empty or exceeds the {}-byte maximum",
                self.codec.max_word_len()
            );
            return Ok(QueryOutcome::NotFound);
        }

        let owners = self.locate_word(word)?;

        let Some((owner, target)) = self.resolve_owner(word, owners) else {
            debug!("'{word}' not found on any worker");
            return Ok(QueryOutcome::NotFound);
        };
        debug!("worker {owner} owns '{word}', harvesting top {k}");

        let results = self.harvest(&target, k);
        let partial = self.live_workers() < self.worker_count();
        if partial {
            warn!("results for '{word}' are partial: {} of {} workers reachable",
                self.live_workers(),
                self.worker_count()
            );
        }
        Ok(QueryOutcome::Found { results, partial })
    }

    /// Broadcasts `Exit` to every live worker, ending the run.
    pub fn shutdown(&mut self) {
        for worker in self.live_worker_ids() {
            self.send_to(worker, &Command::Exit);
        }
    }

    /// FIND_WORD round: broadcast, then collect one `WordIndex` (plus the
    /// conditional vector frame) per live worker, in worker-id order.
    fn locate_word(&mut self, word: &str) -> ShardResult<Vec<(WorkerId, Vec<f32>)>> {
        let command = Command::FindWord {
            word: word.to_string(),
        };
        let addressed: Vec<WorkerId> = self.live_worker_ids();
        for worker in &addressed {
            self.send_to(*worker, &command);
        }

        let mut owners = Vec::new();
        for worker in addressed {
            match self.recv_from(worker) {
                Some(Reply::WordIndex { owned: false }) => {}
                Some(Reply::WordIndex { owned: true }) => {
                    // Every claiming owner sends its vector frame; all of
                    // them must be drained to keep the channel FIFO clean.
                    match self.recv_from(worker) {
                        Some(Reply::Vector { vector }) => owners.push((worker, vector)),
                        Some(other) => self.drop_worker(
                            worker,
                            &format!("expected VECTOR after owning WORD_INDEX, got {other:?}"),
                        ),
                        None => {}
                    }
                }
                Some(other) => {
                    self.drop_worker(worker, &format!("expected WORD_INDEX, got {other:?}"));
                }
                None => {}
            }
        }
        Ok(owners)
    }

    /// Applies the duplicate-ownership tie-break: lowest worker id wins,
    /// every extra claim is logged as a data-quality warning.
    fn resolve_owner(
        &self,
        word: &str,
        owners: Vec<(WorkerId, Vec<f32>)>,
    ) -> Option<(WorkerId, Vec<f32>)> {
        let mut owners = owners.into_iter();
        let (kept, target) = owners.next()?;
        for (ignored, _) in owners {
            warn!(
                "{}",
                ShardError::DuplicateOwnership {
                    word: word.to_string(),
                    kept,
                    ignored,
                }
            );
        }
        Some((kept, target))
    }

    /// RANK rounds: ask each worker owing a candidate for its current best
    /// unreported row, then consume the single globally-best candidate.
    fn harvest(&mut self, target: &[f32], k: usize) -> Vec<RankedWord> {
        let mut state = HarvestState::new(self.worker_count(), k);
        for (i, live) in self.live.iter().enumerate() {
            if !live {
                state.remove_worker(WorkerId::new(i as u16));
            }
        }

        let command = Command::Rank {
            target: target.to_vec(),
        };
        while !state.complete() {
            let addressed: Vec<WorkerId> = state
                .needs_rank()
                .into_iter()
                .filter(|worker| self.live[worker.index()])
                .collect();
            for worker in &addressed {
                self.send_to(*worker, &command);
                if !self.live[worker.index()] {
                    state.remove_worker(*worker);
                }
            }
            for worker in addressed {
                if !self.live[worker.index()] {
                    continue;
                }
                match self.recv_from(worker) {
                    Some(Reply::Best { word, score }) => state.record_best(worker, word, score),
                    Some(Reply::Exhausted) => state.record_exhausted(worker),
                    Some(other) => {
                        self.drop_worker(worker, &format!("expected BEST/EXHAUSTED, got {other:?}"));
                        state.remove_worker(worker);
                    }
                    None => state.remove_worker(worker),
                }
            }

            if state.complete() {
                break;
            }
            if state.consume_winner().is_none() {
                break;
            }
        }
        state.into_results()
    }

    fn live_worker_ids(&self) -> Vec<WorkerId> {
        self.live
            .iter()
            .enumerate()
            .filter(|(_, live)| **live)
            .map(|(i, _)| WorkerId::new(i as u16))
            .collect()
    }

    /// Sends a command, excluding the worker on transport failure.
    fn send_to(&mut self, worker: WorkerId, command: &Command) {
        let frame = match self.codec.encode_command(command) {
            Ok(frame) => frame,
            Err(err) => {
                self.drop_worker(worker, &err.to_string());
                return;
            }
        };
        if let Err(err) = self.links[worker.index()].send(frame) {
            self.drop_worker(worker, &err.to_string());
        }
    }

    /// Receives and decodes one reply, excluding the worker on timeout,
    /// disconnect, or an undecodable frame.
    fn recv_from(&mut self, worker: WorkerId) -> Option<Reply> {
        match self.links[worker.index()].recv_timeout(self.timeout) {
            Ok(frame) => match self.codec.decode_reply(&frame) {
                Ok(reply) => Some(reply),
                Err(err) => {
                    self.drop_worker(worker, &err.to_string());
                    None
                }
            },
            Err(err) => {
                self.drop_worker(worker, &err.to_string());
                None
            }
        }
    }

    /// Marks a worker out of the session for good.
    fn drop_worker(&mut self, worker: WorkerId, reason: &str) {
        if self.live[worker.index()] {
            warn!("excluding worker {worker} from the session: {reason}");
            self.live[worker.index()] = false;
        }
    }
}
