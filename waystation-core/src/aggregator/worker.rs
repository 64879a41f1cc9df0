//! Background dispatch of aggregate recomputation on Tokio.
//!
//! A single worker task drains an unbounded channel, so jobs run one at a
//! time in submission order. Each job runs on the blocking pool because
//! store access is synchronous.

use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::{EntityStore, RestroomId};

use super::{AggregationError, RatingAggregator, RecomputeOutcome};

type Reply = oneshot::Sender<Result<RecomputeOutcome, AggregationError>>;

#[derive(Debug)]
struct Job {
    id: RestroomId,
    reply: Option<Reply>,
}

/// Handle for submitting recomputation jobs to the worker.
///
/// Clones share the same worker. The worker stops once every handle has
/// been dropped and the queue is drained.
#[derive(Debug, Clone)]
pub struct AggregationQueue {
    sender: mpsc::UnboundedSender<Job>,
}

impl AggregationQueue {
    /// Queue a recomputation without waiting for it.
    ///
    /// Never blocks. If the worker has stopped the job is dropped and a
    /// warning is logged.
    pub fn schedule(&self, id: RestroomId) {
        if self.sender.send(Job { id, reply: None }).is_err() {
            warn!("aggregation worker stopped; dropping recompute for restroom {id}");
        }
    }

    /// Queue a recomputation and wait for its outcome.
    ///
    /// Jobs queued earlier complete first, so once this returns every
    /// previously scheduled recompute has been applied.
    ///
    /// # Errors
    /// Returns [`AggregationError::WorkerStopped`] when the worker is gone,
    /// or the failure of the recomputation itself.
    pub async fn recompute_now(&self, id: RestroomId) -> Result<RecomputeOutcome, AggregationError> {
        let (reply, outcome) = oneshot::channel();
        self.sender
            .send(Job {
                id,
                reply: Some(reply),
            })
            .map_err(|_| AggregationError::WorkerStopped)?;
        outcome.await.map_err(|_| AggregationError::WorkerStopped)?
    }
}

/// Start the aggregation worker on the current Tokio runtime.
///
/// Returns the submission handle and the worker's join handle, which
/// completes after all queue handles are dropped and pending jobs finish.
///
/// # Panics
/// Panics when called outside a Tokio runtime.
pub fn spawn_aggregation_worker<S>(
    aggregator: RatingAggregator<S>,
) -> (AggregationQueue, JoinHandle<()>)
where
    S: EntityStore + 'static,
{
    let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
    let aggregator = Arc::new(aggregator);
    let handle = tokio::spawn(async move {
        while let Some(Job { id, reply }) = receiver.recv().await {
            let worker = Arc::clone(&aggregator);
            let outcome = tokio::task::spawn_blocking(move || worker.recompute_aggregates(id))
                .await
                .map_err(AggregationError::Task)
                .and_then(|result| result.map_err(AggregationError::from));
            match &outcome {
                Ok(result) => debug!("recompute for restroom {id} finished: {result:?}"),
                Err(error) => warn!("recompute for restroom {id} failed: {error}"),
            }
            if let Some(reply) = reply {
                // The caller may have stopped waiting.
                let _ = reply.send(outcome);
            }
        }
        debug!("aggregation queue closed; worker exiting");
    });
    (AggregationQueue { sender }, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingStore, MemoryStore, restroom_at, review_with};
    use std::sync::Arc;

    fn seeded_store() -> Arc<MemoryStore> {
        let store = MemoryStore::with_restrooms([restroom_at(1, 0.0, 0.0)]);
        store.add_review(review_with(1, 1, 10, [4, 5, 3, 4, 5, 4]));
        Arc::new(store)
    }

    #[tokio::test]
    async fn recompute_now_waits_for_the_write() {
        let store = seeded_store();
        let (queue, _worker) = spawn_aggregation_worker(RatingAggregator::new(Arc::clone(&store)));

        let outcome = queue
            .recompute_now(RestroomId(1))
            .await
            .expect("recompute");

        assert!(matches!(outcome, RecomputeOutcome::Updated(_)));
        assert_eq!(store.ratings_of(RestroomId(1)).review_count(), 1);
    }

    #[tokio::test]
    async fn scheduled_jobs_finish_before_later_awaited_job() {
        let store = seeded_store();
        let (queue, _worker) = spawn_aggregation_worker(RatingAggregator::new(Arc::clone(&store)));

        queue.schedule(RestroomId(1));
        store.add_review(review_with(2, 1, 11, [2; 6]));
        queue.schedule(RestroomId(1));
        queue
            .recompute_now(RestroomId(404))
            .await
            .expect("recompute");

        assert_eq!(store.ratings_of(RestroomId(1)).avg_cleanliness(), 3.0);
    }

    #[tokio::test]
    async fn worker_exits_when_queue_is_dropped() {
        let (queue, worker) = spawn_aggregation_worker(RatingAggregator::new(seeded_store()));
        queue.schedule(RestroomId(1));
        drop(queue);
        worker.await.expect("worker exits cleanly");
    }

    #[tokio::test]
    async fn failures_reach_awaiting_callers_only() {
        let (queue, _worker) = spawn_aggregation_worker(RatingAggregator::new(FailingStore));
        queue.schedule(RestroomId(1));
        let err = queue
            .recompute_now(RestroomId(1))
            .await
            .expect_err("store failure");
        assert!(matches!(err, AggregationError::Store(_)));
    }

    #[tokio::test]
    async fn stopped_worker_is_reported() {
        let (queue, worker) = spawn_aggregation_worker(RatingAggregator::new(seeded_store()));
        worker.abort();
        let _ = worker.await;
        let err = queue
            .recompute_now(RestroomId(1))
            .await
            .expect_err("worker stopped");
        assert!(matches!(err, AggregationError::WorkerStopped));
    }
}
