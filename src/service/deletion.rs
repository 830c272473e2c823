//! Fan-out/fan-in pipeline for soft-deleting a user's links.
//!
//! ```text
//!              ┌──────────┐
//!          ┌──▶│ worker 0 │──┐
//! job ──▶ jobs │   ...    │  ├──▶ collector ──▶ deleted ids
//!          └──▶│ worker N │──┘
//!              └──────────┘
//! ```
//!
//! A request's whole id list travels as one [`DeletionJob`], so one worker
//! picks it up and issues a single batch delete for it; the rest see the input
//! close and exit. A failed batch delete cancels the shared token, and nothing
//! is emitted after that. The pipeline is detached from the caller: dropping
//! the returned receiver does not stop the delete.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::storage::traits::Storage;

/// One request's worth of ids to delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionJob {
    /// Owner of the links.
    pub user_id: String,
    /// Short ids to soft-delete.
    pub short_ids: Vec<String>,
}

type JobQueue = Arc<Mutex<mpsc::Receiver<DeletionJob>>>;

/// Launches deletion jobs against a storage backend.
#[derive(Clone)]
pub struct DeletionPipeline {
    storage: Arc<dyn Storage>,
    workers: usize,
}

impl DeletionPipeline {
    /// Create a pipeline spawning `workers` tasks per job (at least one).
    pub fn new(storage: Arc<dyn Storage>, workers: usize) -> Self {
        Self {
            storage,
            workers: workers.max(1),
        }
    }

    /// Number of workers spawned per job.
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Start deleting `job` in the background.
    ///
    /// Returns a channel yielding each deleted id. It closes once every
    /// worker has exited, either after the job succeeded or after a backend
    /// failure stopped the pipeline.
    pub fn launch(&self, job: DeletionJob) -> mpsc::Receiver<String> {
        let cancel = CancellationToken::new();
        let (job_tx, job_rx) = mpsc::channel::<DeletionJob>(1);
        let jobs: JobQueue = Arc::new(Mutex::new(job_rx));

        let submit_cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = submit_cancel.cancelled() => {}
                sent = job_tx.send(job) => {
                    if sent.is_err() {
                        debug!("Deletion workers gone before job was submitted");
                    }
                }
            }
        });

        let outputs = (0..self.workers)
            .map(|worker| {
                let (tx, rx) = mpsc::channel(1);
                tokio::spawn(run_worker(
                    worker,
                    Arc::clone(&self.storage),
                    Arc::clone(&jobs),
                    cancel.clone(),
                    tx,
                ));
                rx
            })
            .collect();

        merge(outputs)
    }
}

async fn next_job(jobs: &Mutex<mpsc::Receiver<DeletionJob>>) -> Option<DeletionJob> {
    jobs.lock().await.recv().await
}

async fn run_worker(
    worker: usize,
    storage: Arc<dyn Storage>,
    jobs: JobQueue,
    cancel: CancellationToken,
    out: mpsc::Sender<String>,
) {
    loop {
        let job = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            job = next_job(&jobs) => job,
        };
        let Some(job) = job else {
            return;
        };

        if let Err(e) = storage
            .batch_delete_urls(&job.user_id, &job.short_ids)
            .await
        {
            error!(worker, user_id = %job.user_id, count = job.short_ids.len(), error = %e, "Batch delete failed, stopping pipeline");
            cancel.cancel();
            return;
        }

        for short_id in job.short_ids {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                sent = out.send(short_id) => {
                    if sent.is_err() {
                        return;
                    }
                }
            }
        }
    }
}

/// Funnel every worker channel into one, closed after the last worker is done.
fn merge(outputs: Vec<mpsc::Receiver<String>>) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(outputs.len().max(1));
    let mut forwarders = JoinSet::new();

    for mut output in outputs {
        let tx = tx.clone();
        forwarders.spawn(async move {
            let mut forwarded = 0_usize;
            while let Some(short_id) = output.recv().await {
                if tx.send(short_id).await.is_err() {
                    break;
                }
                forwarded += 1;
            }
            forwarded
        });
    }

    tokio::spawn(async move {
        let mut total = 0_usize;
        while let Some(joined) = forwarders.join_next().await {
            match joined {
                Ok(forwarded) => total += forwarded,
                Err(e) => error!(error = %e, "Deletion forwarder failed"),
            }
        }
        drop(tx);
        info!(deleted = total, "Deletion pipeline finished");
    });

    rx
}

/// Drain a deletion's output, logging each id and the final count.
pub async fn log_deleted(user_id: String, mut deleted: mpsc::Receiver<String>) {
    let mut count = 0_usize;
    while let Some(short_id) = deleted.recv().await {
        debug!(%user_id, %short_id, "Link deleted");
        count += 1;
    }
    info!(%user_id, count, "Deletion request completed");
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use async_trait::async_trait;
    use parking_lot::Mutex as SyncMutex;

    use super::*;
    use crate::domain::{Resolved, ShortenOutcome};
    use crate::error::{StorageError, StorageResult};
    use crate::storage::traits::LinkStorage;

    /// Records batch deletes, optionally failing them.
    #[derive(Default)]
    struct RecordingStorage {
        calls: SyncMutex<Vec<(String, Vec<String>)>>,
        fail: bool,
    }

    #[async_trait]
    impl LinkStorage for RecordingStorage {
        async fn update_data(&self, _: &str, _: &str) -> StorageResult<ShortenOutcome> {
            Err(StorageError::Unavailable)
        }

        async fn get_data(&self, _: &str) -> StorageResult<Resolved> {
            Err(StorageError::Unavailable)
        }

        async fn batch_delete_urls(&self, user_id: &str, short_ids: &[String]) -> StorageResult<()> {
            self.calls
                .lock()
                .push((user_id.to_string(), short_ids.to_vec()));
            if self.fail {
                Err(StorageError::Query("connection reset".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl Storage for RecordingStorage {
        async fn ping(&self) -> StorageResult<()> {
            Ok(())
        }

        async fn close(&self) -> StorageResult<()> {
            Ok(())
        }

        fn backend_name(&self) -> &'static str {
            "recording"
        }
    }

    fn job(ids: &[&str]) -> DeletionJob {
        DeletionJob {
            user_id: "user-1".to_string(),
            short_ids: ids.iter().map(ToString::to_string).collect(),
        }
    }

    async fn drain(mut rx: mpsc::Receiver<String>) -> Vec<String> {
        let mut ids = Vec::new();
        while let Some(id) = rx.recv().await {
            ids.push(id);
        }
        ids
    }

    #[tokio::test]
    async fn test_every_id_emitted_once() {
        let storage = Arc::new(RecordingStorage::default());
        let pipeline = DeletionPipeline::new(storage.clone(), 15);

        let ids = ["a", "b", "c", "d", "e"];
        let emitted = drain(pipeline.launch(job(&ids))).await;

        assert_eq!(emitted.len(), ids.len());
        let emitted: HashSet<_> = emitted.into_iter().collect();
        let expected: HashSet<_> = ids.iter().map(ToString::to_string).collect();
        assert_eq!(emitted, expected);
    }

    #[tokio::test]
    async fn test_single_batch_call_per_job() {
        let storage = Arc::new(RecordingStorage::default());
        let pipeline = DeletionPipeline::new(storage.clone(), 4);

        drain(pipeline.launch(job(&["a", "b", "c"]))).await;

        let calls = storage.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "user-1");
        assert_eq!(calls[0].1, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_backend_failure_emits_nothing() {
        let storage = Arc::new(RecordingStorage {
            fail: true,
            ..Default::default()
        });
        let pipeline = DeletionPipeline::new(storage.clone(), 15);

        let emitted = drain(pipeline.launch(job(&["a", "b"]))).await;

        assert!(emitted.is_empty());
        assert_eq!(storage.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_job_closes_channel() {
        let storage = Arc::new(RecordingStorage::default());
        let pipeline = DeletionPipeline::new(storage, 3);

        let emitted = drain(pipeline.launch(job(&[]))).await;
        assert!(emitted.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_receiver_still_deletes() {
        let storage = Arc::new(RecordingStorage::default());
        let pipeline = DeletionPipeline::new(storage.clone(), 2);

        drop(pipeline.launch(job(&["a"])));

        for _ in 0..50 {
            if !storage.calls.lock().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(storage.calls.lock().len(), 1);
    }

    #[test]
    fn test_zero_workers_clamped() {
        let storage = Arc::new(RecordingStorage::default());
        assert_eq!(DeletionPipeline::new(storage, 0).workers(), 1);
    }
}
