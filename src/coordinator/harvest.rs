//! Merge state for the top-K harvest.
//!
//! The harvest is a distributed k-way merge of per-worker locally-monotonic
//! streams, each produced on demand. The coordinator caches each worker's
//! unconsumed candidate: a worker whose best lost a round is not asked
//! again — its cached candidate carries into the next round — so computing
//! a local best and consuming it stay decoupled and no candidate is ever
//! skipped. Only after a worker's candidate wins is that worker asked for
//! its next-best row.

use crate::embedding::WorkerId;

/// One worker's unconsumed best, held coordinator-side until it wins.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub word: String,
    pub score: f32,
}

/// A single harvested result.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedWord {
    pub word: String,
    pub score: f32,
}

/// Coordinator-side merge state for one query's harvest.
#[derive(Debug)]
pub struct HarvestState {
    pending: Vec<Option<Candidate>>,
    done: Vec<bool>,
    harvested: Vec<RankedWord>,
    k: usize,
}

impl HarvestState {
    /// Creates merge state for `worker_count` workers and a target of `k`.
    #[must_use]
    pub fn new(worker_count: usize, k: usize) -> Self {
        Self {
            pending: vec![None; worker_count],
            done: vec![false; worker_count],
            harvested: Vec::with_capacity(k),
            k,
        }
    }

    /// Workers that must be sent a `RANK` this round: live contributors
    /// with no cached candidate.
    #[must_use]
    pub fn needs_rank(&self) -> Vec<WorkerId> {
        self.pending
            .iter()
            .zip(&self.done)
            .enumerate()
            .filter(|(_, (pending, done))| pending.is_none() && !**done)
            .map(|(i, _)| WorkerId::new(i as u16))
            .collect()
    }

    /// Records a worker's `BEST` reply as its cached candidate.
    pub fn record_best(&mut self, worker: WorkerId, word: String, score: f32) {
        self.pending[worker.index()] = Some(Candidate { word, score });
    }

    /// Records that a worker has no unreported rows left.
    pub fn record_exhausted(&mut self, worker: WorkerId) {
        self.done[worker.index()] = true;
    }

    /// Removes a worker from the merge entirely (unreachable or protocol
    /// failure). Any cached candidate is discarded with it.
    pub fn remove_worker(&mut self, worker: WorkerId) {
        self.pending[worker.index()] = None;
        self.done[worker.index()] = true;
    }

    /// Consumes the best cached candidate: highest score, ties to the
    /// lowest worker id. Returns the winning worker, whose next `RANK`
    /// will yield its next-best row. `None` when no candidate is cached.
    pub fn consume_winner(&mut self) -> Option<WorkerId> {
        let winner = self
            .pending
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|c| (i, c.score)))
            // max_by with total_cmp keeps the *last* max; reversed index
            // order makes that the lowest worker id on ties.
            .rev()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)?;

        let candidate = self.pending[winner].take().expect("winner slot is occupied");
        self.harvested.push(RankedWord {
            word: candidate.word,
            score: candidate.score,
        });
        Some(WorkerId::new(winner as u16))
    }

    /// True when K results are collected or no worker can contribute.
    #[must_use]
    pub fn complete(&self) -> bool {
        self.harvested.len() >= self.k
            || self
                .pending
                .iter()
                .zip(&self.done)
                .all(|(pending, done)| pending.is_none() && *done)
    }

    /// Final results, in consumption (non-increasing score) order.
    #[must_use]
    pub fn into_results(self) -> Vec<RankedWord> {
        self.harvested
    }
}
