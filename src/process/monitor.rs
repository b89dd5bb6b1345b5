use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::ProcessManager;

/// Handle to the background reconciliation task. Dropping it stops the task.
#[derive(Debug)]
pub struct MonitorHandle {
    task: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Periodically purge finished instances and broadcast the snapshot.
pub fn spawn_monitor(manager: Arc<ProcessManager>, interval: Duration) -> MonitorHandle {
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let status = manager.reconcile();
            tracing::trace!("Monitor tick: {} instances", status.instances.len());
        }
    });
    MonitorHandle { task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FlagSet, LaunchSettings};
    use crate::process::testing::MockSpawner;
    use crate::process::TokioSpawner;

    #[tokio::test]
    async fn monitor_publishes_periodically() {
        let manager = Arc::new(ProcessManager::new(Arc::new(TokioSpawner::new())));
        let mut sub = manager.subscribe();

        let handle = spawn_monitor(manager.clone(), Duration::from_millis(10));
        let status = tokio::time::timeout(Duration::from_secs(1), sub.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(!status.is_running);
        handle.cancel();
    }

    #[tokio::test]
    async fn monitor_purges_silently_exited_instance() {
        let spawner = MockSpawner::default();
        let manager = Arc::new(ProcessManager::new(Arc::new(spawner.clone())));
        manager
            .launch(&LaunchSettings::default(), FlagSet::new())
            .unwrap();
        spawner.mark_exited_silently(0);
        assert_eq!(manager.instances().len(), 1);

        let mut sub = manager.subscribe();
        let handle = spawn_monitor(manager.clone(), Duration::from_millis(10));
        let status = tokio::time::timeout(Duration::from_secs(1), sub.recv())
            .await
            .unwrap()
            .unwrap();

        assert!(!status.is_running, "monitor: tick should publish the purged snapshot");
        assert!(manager.instances().is_empty());
        handle.cancel();
    }

    #[tokio::test]
    async fn dropped_handle_stops_monitor() {
        let manager = Arc::new(ProcessManager::new(Arc::new(TokioSpawner::new())));
        let handle = spawn_monitor(manager.clone(), Duration::from_millis(10));
        drop(handle);
        tokio::time::sleep(Duration::from_millis(20)).await;

        // The aborted task released its clone of the manager.
        assert_eq!(Arc::strong_count(&manager), 1);
    }
}
