//! Background maintenance: periodic checkpoints and periodic archival.
//!
//! Two independent tasks on `tokio::time::interval`, each selecting on a
//! shared `CancellationToken` so shutdown can stop them cleanly before the
//! final flush.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use tutor_types::config::ScheduleConfig;

use crate::service::archivist::Archivist;
use crate::service::checkpoint::CheckpointWriter;
use crate::storage::archive_store::{CheckpointStore, SnapshotStore};

/// Handles of the running maintenance tasks.
pub struct Maintenance {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Maintenance {
    /// Start the checkpoint and archive tasks.
    ///
    /// The first tick of each interval is skipped, so nothing runs at spawn
    /// time; missed ticks are delayed rather than bunched.
    pub fn spawn<A, C>(
        archivist: Arc<Archivist<A>>,
        checkpoints: Arc<CheckpointWriter<C>>,
        schedule: ScheduleConfig,
        cancel: CancellationToken,
    ) -> Self
    where
        A: SnapshotStore + 'static,
        C: CheckpointStore + 'static,
    {
        let checkpoint_task = {
            let cancel = cancel.clone();
            let checkpoints = Arc::clone(&checkpoints);
            let mut ticks = ticker(schedule.checkpoint_interval_secs);
            tokio::spawn(async move {
                ticks.tick().await;
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = ticks.tick() => {
                            if let Err(e) = checkpoints.write_now().await {
                                tracing::warn!(error = %e, "checkpoint write failed");
                            }
                        }
                    }
                }
                tracing::debug!("checkpoint task stopped");
            })
        };

        let archive_task = {
            let cancel = cancel.clone();
            let mut ticks = ticker(schedule.archive_interval_secs);
            tokio::spawn(async move {
                ticks.tick().await;
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = ticks.tick() => run_archive_cycle(&archivist, &checkpoints).await,
                    }
                }
                tracing::debug!("archive task stopped");
            })
        };

        tracing::info!(
            checkpoint_secs = schedule.checkpoint_interval_secs,
            archive_secs = schedule.archive_interval_secs,
            "maintenance tasks started"
        );

        Self {
            cancel,
            handles: vec![checkpoint_task, archive_task],
        }
    }

    /// Cancel both tasks and wait for them to finish.
    ///
    /// A cycle already in progress completes before its task exits.
    pub async fn stop(self) {
        self.cancel.cancel();
        for result in join_all(self.handles).await {
            if let Err(e) = result {
                tracing::warn!(error = %e, "maintenance task ended abnormally");
            }
        }
    }
}

/// One periodic archival: flush, then rewrite the checkpoint so it no longer
/// holds the archived turns.
async fn run_archive_cycle<A, C>(archivist: &Archivist<A>, checkpoints: &CheckpointWriter<C>)
where
    A: SnapshotStore,
    C: CheckpointStore,
{
    match archivist.flush_now().await {
        Ok(report) => {
            tracing::info!(
                students = report.students,
                entries = report.entries,
                "periodic archive complete"
            );
            if let Err(e) = checkpoints.write_now().await {
                tracing::warn!(error = %e, "checkpoint rewrite after archive failed");
            }
        }
        Err(e) => tracing::error!(error = %e, "periodic archive failed, will retry next cycle"),
    }
}

fn ticker(secs: u64) -> Interval {
    let mut ticks = tokio::time::interval(Duration::from_secs(secs.max(1)));
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::log_store::LogStore;
    use crate::test_support::MemoryArchive;
    use tutor_types::chat::LogRole;

    fn components() -> (
        Arc<Archivist<MemoryArchive>>,
        Arc<CheckpointWriter<MemoryArchive>>,
        Arc<MemoryArchive>,
        Arc<LogStore>,
    ) {
        let archive = Arc::new(MemoryArchive::default());
        let log = Arc::new(LogStore::new());
        let archivist = Arc::new(Archivist::new(Arc::clone(&archive), Arc::clone(&log)));
        let checkpoints = Arc::new(CheckpointWriter::new(Arc::clone(&archive), Arc::clone(&log)));
        (archivist, checkpoints, archive, log)
    }

    fn schedule(checkpoint: u64, archive: u64) -> ScheduleConfig {
        ScheduleConfig {
            checkpoint_interval_secs: checkpoint,
            archive_interval_secs: archive,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_checkpoint_runs_on_interval_without_clearing() {
        let (archivist, checkpoints, archive, log) = components();
        log.append("1001", LogRole::Student, "hello");

        let maintenance = Maintenance::spawn(
            archivist,
            checkpoints,
            schedule(30, 3600),
            CancellationToken::new(),
        );
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(archive.checkpoint_writes(), 0);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(archive.checkpoint_writes() >= 1);
        assert_eq!(archive.checkpoint().unwrap()["1001"].len(), 1);
        assert_eq!(log.total_entries(), 1);
        assert!(archive.snapshots().is_empty());

        maintenance.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_archive_cycle_flushes_and_rewrites_checkpoint() {
        let (archivist, checkpoints, archive, log) = components();
        log.append("1001", LogRole::Student, "hello");
        log.append("1002", LogRole::Student, "hi");

        let maintenance = Maintenance::spawn(
            archivist,
            checkpoints,
            schedule(3600, 60),
            CancellationToken::new(),
        );
        tokio::time::sleep(Duration::from_secs(61)).await;

        assert_eq!(archive.snapshots().len(), 2);
        assert!(log.is_empty());
        // Checkpoint rewritten right after the flush holds nothing archived.
        assert!(archive.checkpoint().unwrap().is_empty());

        maintenance.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_tasks() {
        let (archivist, checkpoints, archive, log) = components();
        let cancel = CancellationToken::new();
        let maintenance = Maintenance::spawn(archivist, checkpoints, schedule(10, 20), cancel.clone());

        maintenance.stop().await;
        assert!(cancel.is_cancelled());

        log.append("1001", LogRole::Student, "after stop");
        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(archive.checkpoint_writes(), 0);
        assert!(archive.snapshots().is_empty());
    }
}
