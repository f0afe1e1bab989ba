//! Periodic refresh of watched repositories over WebSocket connections.

use super::registry::{ConnectionId, ConnectionRegistry};
use crate::facts::{Collector, FetchOutcome, RepoSpec};
use axum::extract::ws::{Message, WebSocket};
use chrono::{DateTime, Utc};
use core::time::Duration;
use futures_util::future::join_all;
use tokio::sync::mpsc::Receiver;

const LOG_TARGET: &str = "      push";

/// Owns the connection registry and refreshes every watched repository on a fixed interval.
///
/// A failed refresh is reported to the watching clients as an error frame and simply
/// tried again on the next tick.
#[derive(Debug)]
pub struct PushDriver {
    collector: Collector,
    registry: ConnectionRegistry,
    refresh_interval: Duration,
}

impl PushDriver {
    #[must_use]
    pub fn new(collector: Collector, refresh_interval: Duration) -> Self {
        Self {
            collector,
            registry: ConnectionRegistry::new(),
            refresh_interval,
        }
    }

    #[must_use]
    pub const fn collector(&self) -> &Collector {
        &self.collector
    }

    pub fn subscribe(&self, repo: RepoSpec) -> (ConnectionId, Receiver<String>) {
        self.registry.register(repo)
    }

    pub fn unsubscribe(&self, id: ConnectionId) {
        let _ = self.registry.unregister(id);
    }

    /// Refresh loop; runs until the task is dropped.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.refresh_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        // the first tick completes immediately; connections already got their first frame
        let _ = ticker.tick().await;

        loop {
            let _ = ticker.tick().await;
            let _ = self.refresh_once(Utc::now()).await;
        }
    }

    /// Collect every watched repository once and broadcast the result.
    ///
    /// Returns the number of frames delivered.
    pub async fn refresh_once(&self, now: DateTime<Utc>) -> usize {
        let repos = self.registry.watched_repos();
        if repos.is_empty() {
            return 0;
        }

        log::debug!(target: LOG_TARGET, "Refreshing {} watched repositor(ies)", repos.len());

        let frames = join_all(repos.iter().map(|repo| self.frame_for(repo, now))).await;
        repos
            .iter()
            .zip(frames)
            .map(|(repo, frame)| self.registry.broadcast(repo, &frame))
            .sum()
    }

    /// Build the frame sent to clients watching `repo`: the report JSON, or an error frame.
    pub async fn frame_for(&self, repo: &RepoSpec, now: DateTime<Utc>) -> String {
        match self.collector.collect(repo, now).await {
            FetchOutcome::Found(report) => match serde_json::to_string(&report) {
                Ok(json) => json,
                Err(e) => error_frame(repo, &format!("Unexpected error: {e}")),
            },
            FetchOutcome::NotFound => error_frame(repo, "Failed to fetch repository data: Repository not found"),
            FetchOutcome::Error(e) => error_frame(repo, &format!("Failed to fetch repository data: {e}")),
        }
    }
}

/// `{"error": true, "message": ..., "owner": ..., "repo": ...}`
#[must_use]
pub fn error_frame(repo: &RepoSpec, message: &str) -> String {
    serde_json::json!({
        "error": true,
        "message": message,
        "owner": repo.owner(),
        "repo": repo.repo(),
    })
    .to_string()
}

/// Serve one WebSocket client: an immediate frame, then whatever the driver broadcasts.
pub async fn handle_socket(mut socket: WebSocket, driver: &PushDriver, repo: RepoSpec) {
    let (id, mut frames) = driver.subscribe(repo.clone());

    let first = driver.frame_for(&repo, Utc::now()).await;
    if socket.send(Message::Text(first.into())).await.is_ok() {
        loop {
            tokio::select! {
                frame = frames.recv() => {
                    let Some(frame) = frame else { break };
                    if let Err(e) = socket.send(Message::Text(frame.into())).await {
                        log::debug!(target: LOG_TARGET, "Could not send to connection for '{repo}': {e}");
                        break;
                    }
                }
                incoming = socket.recv() => {
                    match incoming {
                        Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                        Some(Ok(_)) => {}
                    }
                }
            }
        }
    }

    driver.unsubscribe(id);
}
