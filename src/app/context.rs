use anyhow::Context as _;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{HeadlessWindow, WindowHost};
use crate::config::LauncherConfig;
use crate::error::LauncherResult;
use crate::models::{AppSettings, FlagSet, InstanceId, ProcessStatus};
use crate::presence::{LogPresenceClient, Presence, PresenceClient, PresenceNotifier};
use crate::process::{spawn_monitor, MonitorHandle, ProcessManager, ProcessSpawner, TokioSpawner};
use crate::store::{
    ensure_valid_name, FlagStore, JsonFileStore, KeyValueStore, PresetCatalog, SettingsStore,
};

/// The collaborators an `AppContext` is assembled from.
pub struct AppServices {
    pub settings_store: Arc<dyn KeyValueStore>,
    pub flags_store: Arc<dyn KeyValueStore>,
    pub spawner: Arc<dyn ProcessSpawner>,
    pub presence_client: Arc<dyn PresenceClient>,
    pub window: Arc<dyn WindowHost>,
}

impl AppServices {
    pub fn production(config: &LauncherConfig) -> Self {
        Self {
            settings_store: Arc::new(JsonFileStore::new(config.settings_path())),
            flags_store: Arc::new(JsonFileStore::new(config.flags_path())),
            spawner: Arc::new(TokioSpawner::new()),
            presence_client: Arc::new(LogPresenceClient::new()),
            window: Arc::new(HeadlessWindow::new()),
        }
    }
}

/// Background work tied to a running session. Dropping it stops the work.
pub struct BackgroundTasks {
    monitor: MonitorHandle,
    presence: JoinHandle<()>,
}

impl BackgroundTasks {
    pub fn stop(self) {
        self.monitor.cancel();
        self.presence.abort();
        tracing::debug!("Background tasks stopped");
    }
}

impl Drop for BackgroundTasks {
    fn drop(&mut self) {
        self.monitor.cancel();
        self.presence.abort();
    }
}

/// Shared application state, built once per launcher run.
pub struct AppContext {
    config: LauncherConfig,
    settings: Mutex<SettingsStore>,
    flags: Mutex<FlagStore>,
    presets: PresetCatalog,
    processes: Arc<ProcessManager>,
    presence: PresenceNotifier,
    window: Arc<dyn WindowHost>,
}

impl AppContext {
    pub fn new(config: LauncherConfig, services: AppServices) -> LauncherResult<Self> {
        let settings = SettingsStore::load(services.settings_store)?;
        let flags = FlagStore::load(services.flags_store)?;
        let processes = Arc::new(
            ProcessManager::new(services.spawner).with_kill_grace(config.kill_grace()),
        );
        let presence = PresenceNotifier::new(
            services.presence_client,
            config.presence.client_id.clone(),
        )
        .with_reconnect_interval(config.reconnect_interval());

        Ok(Self {
            config,
            settings: Mutex::new(settings),
            flags: Mutex::new(flags),
            presets: PresetCatalog::new(),
            processes,
            presence,
            window: services.window,
        })
    }

    /// Context backed by the on-disk stores and real processes.
    pub fn open(config: LauncherConfig) -> anyhow::Result<Self> {
        let services = AppServices::production(&config);
        let data_dir = config.data_dir();
        Self::new(config, services)
            .with_context(|| format!("Failed to load launcher state from {:?}", data_dir))
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    pub fn processes(&self) -> &Arc<ProcessManager> {
        &self.processes
    }

    pub fn presence(&self) -> &PresenceNotifier {
        &self.presence
    }

    pub fn presets(&self) -> &PresetCatalog {
        &self.presets
    }

    pub fn window(&self) -> &Arc<dyn WindowHost> {
        &self.window
    }

    pub async fn settings(&self) -> MutexGuard<'_, SettingsStore> {
        self.settings.lock().await
    }

    pub async fn flags(&self) -> MutexGuard<'_, FlagStore> {
        self.flags.lock().await
    }

    /// Connect presence if enabled and start status reconciliation. The
    /// idle presence returns on the next tick once nothing is running.
    pub async fn start(self: &Arc<Self>) -> BackgroundTasks {
        let presence_enabled = self.settings.lock().await.settings().presence.enabled;
        if presence_enabled {
            self.presence.connect().await;
        }

        let monitor = spawn_monitor(self.processes.clone(), self.config.monitor_interval());

        let ctx = Arc::clone(self);
        let interval = self.config.monitor_interval();
        let presence = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !ctx.processes.is_running() {
                    ctx.presence.show_idle().await;
                }
            }
        });

        BackgroundTasks { monitor, presence }
    }

    /// Launch with the effective flags, overlaid by `overrides`.
    pub async fn launch(&self, overrides: FlagSet) -> LauncherResult<InstanceId> {
        let settings = self.settings.lock().await.get();
        for name in overrides.keys() {
            ensure_valid_name(name)?;
        }
        let mut flags = self.flags.lock().await.effective_flags();
        flags.extend(overrides);

        let id = self.processes.launch(&settings.launch, flags)?;

        if settings.presence.enabled {
            let started_at = settings
                .presence
                .show_elapsed_time
                .then(|| Utc::now().timestamp_millis());
            self.presence
                .update(&Presence::playing(&settings.presence.custom_status, started_at))
                .await;
        }
        Ok(id)
    }

    pub async fn kill_all(&self) {
        self.processes.kill_all();
        self.presence.clear().await;
    }

    pub fn kill(&self, id: &InstanceId) -> bool {
        self.processes.kill_instance(id)
    }

    pub fn status(&self) -> ProcessStatus {
        self.processes.status()
    }

    pub async fn apply_preset(&self, id: &str) -> LauncherResult<()> {
        let mut flags = self.flags.lock().await;
        let mut settings = self.settings.lock().await;
        self.presets.apply(id, &mut flags, &mut settings)
    }

    pub async fn replace_settings(&self, settings: AppSettings) -> LauncherResult<()> {
        self.settings.lock().await.set(settings)?;
        self.sync_presence().await;
        Ok(())
    }

    pub async fn update_settings(&self, patch: serde_json::Value) -> LauncherResult<()> {
        self.settings.lock().await.update(patch)?;
        self.sync_presence().await;
        Ok(())
    }

    /// Follow the presence toggle after a settings change.
    async fn sync_presence(&self) {
        let enabled = self.settings.lock().await.settings().presence.enabled;
        match (enabled, self.presence.is_connected()) {
            (true, false) if !self.presence.is_reconnecting() => self.presence.connect().await,
            (false, true) => self.presence.disconnect().await,
            _ => {}
        }
    }

    /// Disconnect presence and terminate every tracked instance.
    pub async fn shutdown(&self) {
        self.presence.disconnect().await;
        self.processes.kill_all();
        self.processes.wait_for_escalations().await;
        tracing::info!("Launcher shut down");
    }
}
