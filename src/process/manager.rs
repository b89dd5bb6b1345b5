use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::{ChildHandle, ExitEvent, LaunchCommand, ProcessSpawner, StatusBus, StatusSubscription};
use crate::error::{LauncherError, LauncherResult};
use crate::models::{FlagSet, Instance, InstanceId, InstanceIdGenerator, LaunchSettings, ProcessStatus};

pub const DEFAULT_KILL_GRACE: Duration = Duration::from_millis(5000);

struct TrackedInstance {
    instance: Instance,
    handle: Arc<dyn ChildHandle>,
}

#[derive(Default)]
struct Registry {
    instances: Vec<TrackedInstance>,
}

impl Registry {
    fn purge_finished(&mut self) -> usize {
        let before = self.instances.len();
        self.instances.retain(|t| !t.handle.is_finished());
        before - self.instances.len()
    }

    fn remove(&mut self, id: &InstanceId) -> Option<TrackedInstance> {
        let index = self.instances.iter().position(|t| &t.instance.id == id)?;
        Some(self.instances.remove(index))
    }

    fn snapshot(&self) -> ProcessStatus {
        ProcessStatus::from_instances(self.instances.iter().map(|t| t.instance.clone()).collect())
    }
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Admission control for a new launch given `running` live instances.
pub fn check_admission(running: usize, settings: &LaunchSettings) -> LauncherResult<()> {
    if running >= 1 && !settings.enable_multi_instance {
        return Err(LauncherError::AlreadyRunning);
    }
    if running >= settings.max_instances as usize {
        return Err(LauncherError::MaxInstancesReached(settings.max_instances));
    }
    Ok(())
}

/// Owns every game client launched during this run.
pub struct ProcessManager {
    spawner: Arc<dyn ProcessSpawner>,
    registry: Arc<Mutex<Registry>>,
    ids: InstanceIdGenerator,
    bus: StatusBus,
    kill_grace: Duration,
    escalations: Mutex<Vec<JoinHandle<()>>>,
}

impl ProcessManager {
    pub fn new(spawner: Arc<dyn ProcessSpawner>) -> Self {
        Self {
            spawner,
            registry: Arc::new(Mutex::new(Registry::default())),
            ids: InstanceIdGenerator::new(),
            bus: StatusBus::new(),
            kill_grace: DEFAULT_KILL_GRACE,
            escalations: Mutex::new(Vec::new()),
        }
    }

    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    pub fn subscribe(&self) -> StatusSubscription {
        let subscription = self.bus.subscribe();
        tracing::debug!("Status subscriber added ({} active)", self.bus.subscriber_count());
        subscription
    }

    /// Start one client with `flags`. Admission and registration happen
    /// under one lock so concurrent launches cannot overshoot the limit.
    pub fn launch(&self, settings: &LaunchSettings, flags: FlagSet) -> LauncherResult<InstanceId> {
        let command = LaunchCommand::build(settings, &flags);

        let (id, exit) = {
            let mut registry = lock(&self.registry);
            registry.purge_finished();
            check_admission(registry.instances.len(), settings)?;

            let spawned = self.spawner.spawn(&command).map_err(|e| {
                tracing::error!("Failed to spawn {}: {}", command.program.display(), e);
                LauncherError::SpawnFailure(format!("{}: {}", command.program.display(), e))
            })?;

            let id = self.ids.next_id();
            let pid = spawned.handle.pid();
            registry.instances.push(TrackedInstance {
                instance: Instance::new(id.clone(), pid, flags),
                handle: spawned.handle,
            });
            tracing::info!(
                "Launched {} as {} (pid {})",
                command.program.display(),
                id,
                pid
            );
            (id, spawned.exit)
        };

        tokio::spawn(watch_exit(
            self.registry.clone(),
            self.bus.clone(),
            id.clone(),
            exit,
        ));

        self.publish();
        Ok(id)
    }

    /// Terminate everything. Each signalled process gets one forced kill
    /// after the grace window if it is still alive.
    pub fn kill_all(&self) {
        let drained = std::mem::take(&mut lock(&self.registry).instances);
        if drained.is_empty() {
            return;
        }

        let mut escalations = self
            .escalations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        escalations.retain(|task| !task.is_finished());

        for tracked in drained {
            if tracked.handle.is_finished() {
                continue;
            }
            if let Err(e) = tracked.handle.terminate() {
                tracing::warn!("Failed to terminate {}: {}", tracked.instance.id, e);
            }

            let handle = tracked.handle;
            let id = tracked.instance.id;
            let grace = self.kill_grace;
            escalations.push(tokio::spawn(async move {
                tokio::time::sleep(grace).await;
                if handle.has_exited() {
                    return;
                }
                tracing::warn!("{} ignored termination, forcing kill", id);
                if let Err(e) = handle.force_kill() {
                    tracing::warn!("Failed to force kill {}: {}", id, e);
                }
            }));
        }
        drop(escalations);

        tracing::info!("Killed all instances");
        self.publish();
    }

    /// Wait for pending forced kills scheduled by `kill_all`.
    pub async fn wait_for_escalations(&self) {
        let pending: Vec<JoinHandle<()>> = std::mem::take(
            &mut *self
                .escalations
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for task in pending {
            let _ = task.await;
        }
    }

    pub fn kill_instance(&self, id: &InstanceId) -> bool {
        let tracked = {
            let mut registry = lock(&self.registry);
            let live = registry
                .instances
                .iter()
                .any(|t| &t.instance.id == id && !t.handle.is_finished());
            if live {
                registry.remove(id)
            } else {
                None
            }
        };

        let Some(tracked) = tracked else {
            return false;
        };
        if let Err(e) = tracked.handle.terminate() {
            tracing::warn!("Failed to terminate {}: {}", id, e);
        }
        tracing::info!("Killed {} (pid {})", id, tracked.instance.pid);
        self.publish();
        true
    }

    pub fn status(&self) -> ProcessStatus {
        let mut registry = lock(&self.registry);
        let purged = registry.purge_finished();
        if purged > 0 {
            tracing::debug!("Purged {} finished instances", purged);
        }
        registry.snapshot()
    }

    /// `status` followed by a broadcast of the result.
    pub fn reconcile(&self) -> ProcessStatus {
        let status = self.status();
        self.bus.publish(status.clone());
        status
    }

    pub fn instances(&self) -> Vec<Instance> {
        lock(&self.registry)
            .instances
            .iter()
            .map(|t| t.instance.clone())
            .collect()
    }

    pub fn is_running(&self) -> bool {
        !self.status().instances.is_empty()
    }

    fn publish(&self) {
        self.bus.publish(lock(&self.registry).snapshot());
    }
}

async fn watch_exit(
    registry: Arc<Mutex<Registry>>,
    bus: StatusBus,
    id: InstanceId,
    exit: oneshot::Receiver<ExitEvent>,
) {
    match exit.await {
        Ok(ExitEvent::Exited(code)) => {
            tracing::info!("{} exited with code {:?}", id, code);
        }
        Ok(ExitEvent::Failed(e)) => {
            tracing::error!("{} failed: {}", id, e);
        }
        Err(_) => {
            tracing::debug!("Exit watcher for {} dropped", id);
        }
    }

    let snapshot = {
        let mut registry = lock(&registry);
        registry.remove(&id).map(|_| registry.snapshot())
    };
    if let Some(status) = snapshot {
        bus.publish(status);
    }
}
