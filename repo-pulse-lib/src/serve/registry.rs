use crate::facts::RepoSpec;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{Receiver, Sender, channel};

const LOG_TARGET: &str = "  registry";

/// Frames queued for one connection before newer frames are dropped for it.
const FRAME_QUEUE_CAPACITY: usize = 8;

/// Identifies one push-channel connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

#[derive(Debug)]
struct Connection {
    repo: RepoSpec,
    sender: Sender<String>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    connections: HashMap<ConnectionId, Connection>,
}

/// Open push-channel connections and the repository each one watches.
///
/// Each connection is represented by the sending half of a channel; the socket task owns
/// the receiving half and forwards whatever arrives to its client.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    inner: Mutex<Inner>,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a connection watching `repo`, returning its id and the stream of frames for it.
    pub fn register(&self, repo: RepoSpec) -> (ConnectionId, Receiver<String>) {
        let (sender, receiver) = channel(FRAME_QUEUE_CAPACITY);

        let mut inner = self.lock();
        let id = ConnectionId(inner.next_id);
        inner.next_id += 1;

        log::info!(target: LOG_TARGET, "Connection {} opened for '{repo}'", id.0);
        let _ = inner.connections.insert(id, Connection { repo, sender });

        (id, receiver)
    }

    /// Remove a connection. Returns `false` if it was already gone.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self.lock().connections.remove(&id);
        if let Some(conn) = &removed {
            log::info!(target: LOG_TARGET, "Connection {} closed for '{}'", id.0, conn.repo);
        }

        removed.is_some()
    }

    /// The distinct repositories watched by at least one connection.
    #[must_use]
    pub fn watched_repos(&self) -> Vec<RepoSpec> {
        let inner = self.lock();
        let mut seen = HashSet::new();
        inner
            .connections
            .values()
            .filter(|c| seen.insert(&c.repo))
            .map(|c| c.repo.clone())
            .collect()
    }

    /// Send `frame` to every connection watching `repo`.
    ///
    /// A connection whose queue is full misses this frame and gets the next one. Connections
    /// whose receiving side has gone away are dropped. Returns the number of connections the
    /// frame was queued for.
    pub fn broadcast(&self, repo: &RepoSpec, frame: &str) -> usize {
        let mut inner = self.lock();
        let mut delivered = 0;

        inner.connections.retain(|id, conn| {
            if conn.repo != *repo {
                return true;
            }

            match conn.sender.try_send(frame.to_string()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    log::debug!(target: LOG_TARGET, "Connection {} is lagging, skipping a frame for '{repo}'", id.0);
                    true
                }
                Err(TrySendError::Closed(_)) => {
                    log::debug!(target: LOG_TARGET, "Dropping stale connection {} for '{repo}'", id.0);
                    false
                }
            }
        });

        delivered
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().connections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
