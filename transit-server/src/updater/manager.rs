//! Background task that owns the live timetable.
//!
//! Batches arrive over a channel and are applied one at a time to a copy of
//! the current timetable. The copy is published as the new snapshot once the
//! batch is done, so readers keep seeing the previous snapshot until then.
//! When the network is rebuilt, a reset swaps in a timetable seeded from the
//! new network through the same channel, so it is ordered with the batches.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{Timetable, TripMutation, UpdateResult};

/// Errors from talking to the update manager.
#[derive(Debug, thiserror::Error)]
pub enum UpdateManagerError {
    /// The manager task is no longer running
    #[error("update manager has stopped")]
    Stopped,
}

impl From<mpsc::error::SendError<UpdateRequest>> for UpdateManagerError {
    fn from(_: mpsc::error::SendError<UpdateRequest>) -> Self {
        UpdateManagerError::Stopped
    }
}

impl From<oneshot::error::RecvError> for UpdateManagerError {
    fn from(_: oneshot::error::RecvError) -> Self {
        UpdateManagerError::Stopped
    }
}

/// Work queued for the manager task.
#[derive(Debug)]
pub enum UpdateRequest {
    /// Apply a batch of mutations
    Apply {
        mutations: Vec<TripMutation>,
        responder: oneshot::Sender<Arc<UpdateResult>>,
    },
    /// Replace the live timetable
    Reset {
        timetable: Timetable,
        responder: oneshot::Sender<()>,
    },
}

/// Cheap, cloneable access to the update manager.
#[derive(Debug, Clone)]
pub struct UpdateHandle {
    sender: mpsc::Sender<UpdateRequest>,
    timetable: watch::Receiver<Arc<Timetable>>,
    latest: watch::Receiver<Option<Arc<UpdateResult>>>,
}

impl UpdateHandle {
    /// Submit a batch and wait for its result.
    pub async fn submit(
        &self,
        mutations: Vec<TripMutation>,
    ) -> Result<Arc<UpdateResult>, UpdateManagerError> {
        let (responder, response) = oneshot::channel();
        self.sender
            .send(UpdateRequest::Apply {
                mutations,
                responder,
            })
            .await?;
        Ok(response.await?)
    }

    /// Replace the live timetable, for example with one seeded from a
    /// rebuilt network. Realtime changes applied so far are dropped.
    ///
    /// Batches submitted earlier are applied to the old timetable first.
    pub async fn reset(&self, timetable: Timetable) -> Result<(), UpdateManagerError> {
        let (responder, response) = oneshot::channel();
        self.sender
            .send(UpdateRequest::Reset {
                timetable,
                responder,
            })
            .await?;
        Ok(response.await?)
    }

    /// The current timetable snapshot.
    pub fn timetable(&self) -> Arc<Timetable> {
        self.timetable.borrow().clone()
    }

    /// Result of the most recent batch, if any has been applied.
    pub fn latest_result(&self) -> Option<Arc<UpdateResult>> {
        self.latest.borrow().clone()
    }
}

/// Owner of the live timetable.
pub struct UpdateManager {
    feed_id: String,
    receiver: mpsc::Receiver<UpdateRequest>,
    timetable: watch::Sender<Arc<Timetable>>,
    latest: watch::Sender<Option<Arc<UpdateResult>>>,
}

impl UpdateManager {
    /// Create a manager and a handle to it.
    ///
    /// `buffer` is the number of batches that may queue before `submit`
    /// waits.
    pub fn new(
        timetable: Timetable,
        feed_id: impl Into<String>,
        buffer: usize,
    ) -> (Self, UpdateHandle) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        let (timetable_tx, timetable_rx) = watch::channel(Arc::new(timetable));
        let (latest_tx, latest_rx) = watch::channel(None);

        let manager = Self {
            feed_id: feed_id.into(),
            receiver,
            timetable: timetable_tx,
            latest: latest_tx,
        };
        let handle = UpdateHandle {
            sender,
            timetable: timetable_rx,
            latest: latest_rx,
        };
        (manager, handle)
    }

    /// Run on the tokio runtime until every handle is dropped.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Apply batches until every handle is dropped.
    pub async fn run(mut self) {
        info!(feed_id = %self.feed_id, "Update manager started");

        while let Some(request) = self.receiver.recv().await {
            match request {
                UpdateRequest::Apply {
                    mutations,
                    responder,
                } => {
                    let result = self.apply(&mutations);
                    if responder.send(result).is_err() {
                        debug!(feed_id = %self.feed_id, "Update submitter went away before the result");
                    }
                }
                UpdateRequest::Reset {
                    timetable,
                    responder,
                } => {
                    self.reset(timetable);
                    if responder.send(()).is_err() {
                        debug!(feed_id = %self.feed_id, "Reset requester went away");
                    }
                }
            }
        }

        info!(feed_id = %self.feed_id, "Update manager stopped");
    }

    fn apply(&mut self, mutations: &[TripMutation]) -> Arc<UpdateResult> {
        let mut next = Timetable::clone(&self.timetable.borrow());
        let result = next.apply_batch(mutations, Utc::now());
        result.log_summary(&self.feed_id);

        if result.successful > 0 {
            self.timetable.send_replace(Arc::new(next));
        }

        let result = Arc::new(result);
        self.latest.send_replace(Some(Arc::clone(&result)));
        result
    }

    fn reset(&mut self, timetable: Timetable) {
        info!(
            feed_id = %self.feed_id,
            trips = timetable.len(),
            stops = timetable.stop_count(),
            "Live timetable reset"
        );
        self.timetable.send_replace(Arc::new(timetable));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FeedScopedId, RealTimeState, ServiceTime, StopIndex, StopTime, Trip};
    use crate::updater::UpdateErrorType;

    fn id(s: &str) -> FeedScopedId {
        FeedScopedId::parse(s).unwrap()
    }

    fn timetable() -> Timetable {
        timetable_with_stops(3)
    }

    fn timetable_with_stops(stop_count: usize) -> Timetable {
        let mut tt = Timetable::new(stop_count);
        tt.insert_scheduled(
            Trip::new(id("F:T1"), id("F:R1")),
            vec![
                StopTime::new(StopIndex(0), 1, ServiceTime::hms(9, 0, 0), ServiceTime::hms(9, 0, 0)),
                StopTime::new(StopIndex(1), 2, ServiceTime::hms(9, 10, 0), ServiceTime::hms(9, 10, 0)),
            ],
        );
        tt
    }

    #[tokio::test]
    async fn submit_publishes_new_snapshot() {
        let (manager, handle) = UpdateManager::new(timetable(), "F", 4);
        let task = manager.spawn();

        let before = handle.timetable();
        assert!(handle.latest_result().is_none());

        let result = handle
            .submit(vec![
                TripMutation::Cancel { trip_id: id("F:T1") },
                TripMutation::Cancel { trip_id: id("F:T9") },
            ])
            .await
            .unwrap();

        assert_eq!(result.successful, 1);
        assert_eq!(result.failure_count(UpdateErrorType::NoTripForCancellationFound), 1);

        // Old snapshot is untouched
        assert_eq!(before.trip(&id("F:T1")).unwrap().state, RealTimeState::Scheduled);
        let after = handle.timetable();
        assert_eq!(after.trip(&id("F:T1")).unwrap().state, RealTimeState::Canceled);
        assert!(after.updated_at().is_some());
        assert_eq!(handle.latest_result(), Some(result));

        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn failed_batch_keeps_snapshot() {
        let (manager, handle) = UpdateManager::new(timetable(), "F", 4);
        let task = manager.spawn();

        let before = handle.timetable();
        let result = handle
            .submit(vec![TripMutation::Delete { trip_id: id("F:T9") }])
            .await
            .unwrap();

        assert_eq!(result.failed, 1);
        assert!(Arc::ptr_eq(&before, &handle.timetable()));
        assert_eq!(handle.latest_result().unwrap().failed, 1);

        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn reset_replaces_stop_universe() {
        let (manager, handle) = UpdateManager::new(timetable(), "F", 4);
        let task = manager.spawn();

        let onto_new_stop = || {
            vec![TripMutation::Reroute {
                trip_id: id("F:T1"),
                stop_times: vec![
                    StopTime::new(StopIndex(0), 1, ServiceTime::hms(9, 0, 0), ServiceTime::hms(9, 0, 0)),
                    StopTime::new(StopIndex(4), 2, ServiceTime::hms(9, 15, 0), ServiceTime::hms(9, 15, 0)),
                ],
            }]
        };

        let result = handle.submit(onto_new_stop()).await.unwrap();
        assert_eq!(result.failure_count(UpdateErrorType::UnknownStop), 1);

        handle.reset(timetable_with_stops(5)).await.unwrap();
        assert_eq!(handle.timetable().stop_count(), 5);

        let result = handle.submit(onto_new_stop()).await.unwrap();
        assert_eq!(result.successful, 1);
        assert_eq!(
            handle.timetable().trip(&id("F:T1")).unwrap().state,
            RealTimeState::Modified
        );

        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn submit_after_stop_fails() {
        let (manager, handle) = UpdateManager::new(timetable(), "F", 1);
        drop(manager);

        let err = handle.submit(Vec::new()).await.unwrap_err();
        assert!(matches!(err, UpdateManagerError::Stopped));
    }
}
