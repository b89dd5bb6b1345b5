mod bus;
mod command;
mod manager;
mod monitor;
mod spawner;
#[cfg(test)]
pub(crate) mod testing;

pub use bus::{StatusBus, StatusSubscription};
pub use command::{default_executable, resolve_executable, LaunchCommand, FLAG_ENV_PREFIX};
pub use manager::{check_admission, ProcessManager};
pub use monitor::{spawn_monitor, MonitorHandle};
pub use spawner::{ChildHandle, ExitEvent, ProcessSpawner, SpawnedChild, TokioSpawner};
