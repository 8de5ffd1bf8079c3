//! Point-to-point transport between the coordinator and one worker.
//!
//! The core only requires "send exactly this frame to endpoint E" and
//! "receive one frame from endpoint E, blocking until satisfied". Channels
//! are FIFO per direction with exactly-once delivery. The provided
//! implementation pairs crossbeam channels for in-process workers; the
//! [`WorkerLink`] trait keeps the coordinator decoupled from that choice.

use crate::embedding::WorkerId;
use crate::error::{ShardError, ShardResult};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use std::time::Duration;

/// Coordinator-side handle to one worker, addressed by an opaque id.
pub trait WorkerLink: Send {
    /// The worker this link addresses.
    fn worker(&self) -> WorkerId;

    /// Sends one frame to the worker.
    fn send(&self, frame: Vec<u8>) -> ShardResult<()>;

    /// Receives one frame from the worker, waiting at most `timeout`.
    ///
    /// A missed deadline surfaces as [`ShardError::Unreachable`] so the
    /// session can exclude the worker instead of stalling forever.
    fn recv_timeout(&self, timeout: Duration) -> ShardResult<Vec<u8>>;
}

/// Coordinator end of an in-process channel pair.
#[derive(Debug)]
pub struct ChannelLink {
    worker: WorkerId,
    commands: Sender<Vec<u8>>,
    replies: Receiver<Vec<u8>>,
}

/// Worker end of an in-process channel pair.
#[derive(Debug)]
pub struct WorkerEndpoint {
    worker: WorkerId,
    commands: Receiver<Vec<u8>>,
    replies: Sender<Vec<u8>>,
}

/// Creates a connected coordinator/worker endpoint pair for `worker`.
#[must_use]
pub fn channel_pair(worker: WorkerId) -> (ChannelLink, WorkerEndpoint) {
    let (command_tx, command_rx) = unbounded();
    let (reply_tx, reply_rx) = unbounded();
    (
        ChannelLink {
            worker,
            commands: command_tx,
            replies: reply_rx,
        },
        WorkerEndpoint {
            worker,
            commands: command_rx,
            replies: reply_tx,
        },
    )
}

impl WorkerLink for ChannelLink {
    fn worker(&self) -> WorkerId {
        self.worker
    }

    fn send(&self, frame: Vec<u8>) -> ShardResult<()> {
        self.commands
            .send(frame)
            .map_err(|_| ShardError::Disconnected {
                worker: self.worker,
            })
    }

    fn recv_timeout(&self, timeout: Duration) -> ShardResult<Vec<u8>> {
        self.replies.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => ShardError::Unreachable {
                worker: self.worker,
                waited_ms: timeout.as_millis() as u64,
            },
            RecvTimeoutError::Disconnected => ShardError::Disconnected {
                worker: self.worker,
            },
        })
    }
}

impl WorkerEndpoint {
    /// The worker this endpoint belongs to.
    #[must_use]
    pub fn worker(&self) -> WorkerId {
        self.worker
    }

    /// Receives the next command frame, blocking until one arrives.
    pub fn recv(&self) -> ShardResult<Vec<u8>> {
        self.commands.recv().map_err(|_| ShardError::Disconnected {
            worker: self.worker,
        })
    }

    /// Sends one reply frame to the coordinator.
    pub fn send(&self, frame: Vec<u8>) -> ShardResult<()> {
        self.replies
            .send(frame)
            .map_err(|_| ShardError::Disconnected {
                worker: self.worker,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_flow_both_ways_in_order() {
        let (link, endpoint) = channel_pair(WorkerId::new(0));

        link.send(vec![1]).unwrap();
        link.send(vec![2]).unwrap();
        assert_eq!(endpoint.recv().unwrap(), vec![1]);
        assert_eq!(endpoint.recv().unwrap(), vec![2]);

        endpoint.send(vec![3]).unwrap();
        assert_eq!(link.recv_timeout(Duration::from_secs(1)).unwrap(), vec![3]);
    }

    #[test]
    fn test_timeout_maps_to_unreachable() {
        let (link, _endpoint) = channel_pair(WorkerId::new(4));
        let err = link.recv_timeout(Duration::from_millis(10)).unwrap_err();
        assert!(matches!(
            err,
            ShardError::Unreachable { worker, .. } if worker == WorkerId::new(4)
        ));
    }

    #[test]
    fn test_dropped_endpoint_maps_to_disconnected() {
        let (link, endpoint) = channel_pair(WorkerId::new(1));
        drop(endpoint);

        assert!(matches!(
            link.send(vec![0]).unwrap_err(),
            ShardError::Disconnected { .. }
        ));
        assert!(matches!(
            link.recv_timeout(Duration::from_millis(10)).unwrap_err(),
            ShardError::Disconnected { .. }
        ));
    }
}
