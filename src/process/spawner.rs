use std::io;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};

use super::LaunchCommand;

/// How a tracked child process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitEvent {
    Exited(Option<i32>),
    Failed(String),
}

/// Control surface over a spawned process. Signal methods must tolerate a
/// process that has already gone away.
pub trait ChildHandle: Send + Sync {
    fn pid(&self) -> u32;

    /// Exit has been observed.
    fn has_exited(&self) -> bool;

    /// A termination signal has been delivered.
    fn was_signaled(&self) -> bool;

    fn is_finished(&self) -> bool {
        self.has_exited() || self.was_signaled()
    }

    fn terminate(&self) -> io::Result<()>;

    fn force_kill(&self) -> io::Result<()>;
}

pub struct SpawnedChild {
    pub handle: Arc<dyn ChildHandle>,
    pub exit: oneshot::Receiver<ExitEvent>,
}

pub trait ProcessSpawner: Send + Sync {
    fn spawn(&self, command: &LaunchCommand) -> io::Result<SpawnedChild>;
}

/// Spawns real OS processes, detached from the launcher's lifetime.
#[derive(Debug, Clone, Default)]
pub struct TokioSpawner;

impl TokioSpawner {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessSpawner for TokioSpawner {
    fn spawn(&self, launch: &LaunchCommand) -> io::Result<SpawnedChild> {
        let mut command = Command::new(&launch.program);
        command
            .args(&launch.args)
            .envs(launch.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(false);

        #[cfg(unix)]
        command.process_group(0);

        #[cfg(windows)]
        {
            const DETACHED_PROCESS: u32 = 0x0000_0008;
            const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
            command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
        }

        let mut child = command.spawn()?;
        let pid = child.id().unwrap_or_default();

        let (kill_tx, mut kill_rx) = mpsc::unbounded_channel::<()>();
        let handle = Arc::new(OsChild {
            pid,
            exited: AtomicBool::new(false),
            signaled: AtomicBool::new(false),
            kill_tx,
        });

        let (exit_tx, exit_rx) = oneshot::channel();
        let watched = handle.clone();
        tokio::spawn(async move {
            let event = loop {
                tokio::select! {
                    status = child.wait() => {
                        break match status {
                            Ok(status) => ExitEvent::Exited(status.code()),
                            Err(e) => ExitEvent::Failed(e.to_string()),
                        };
                    }
                    Some(()) = kill_rx.recv() => {
                        if let Err(e) = child.start_kill() {
                            tracing::debug!("Hard kill of pid {} failed: {}", pid, e);
                        }
                    }
                }
            };
            watched.exited.store(true, Ordering::Release);
            let _ = exit_tx.send(event);
        });

        Ok(SpawnedChild {
            handle,
            exit: exit_rx,
        })
    }
}

struct OsChild {
    pid: u32,
    exited: AtomicBool,
    signaled: AtomicBool,
    kill_tx: mpsc::UnboundedSender<()>,
}

impl OsChild {
    fn request_hard_kill(&self) -> io::Result<()> {
        self.kill_tx
            .send(())
            .map_err(|_| io::Error::new(io::ErrorKind::NotFound, "process watcher has stopped"))
    }
}

impl ChildHandle for OsChild {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn has_exited(&self) -> bool {
        self.exited.load(Ordering::Acquire)
    }

    fn was_signaled(&self) -> bool {
        self.signaled.load(Ordering::Acquire)
    }

    #[cfg(unix)]
    fn terminate(&self) -> io::Result<()> {
        use nix::errno::Errno;
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        if self.has_exited() {
            return Ok(());
        }
        match kill(Pid::from_raw(self.pid as i32), Signal::SIGTERM) {
            Ok(()) => {
                self.signaled.store(true, Ordering::Release);
                Ok(())
            }
            // Exited between the check and the signal.
            Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(io::Error::from(e)),
        }
    }

    #[cfg(not(unix))]
    fn terminate(&self) -> io::Result<()> {
        if self.has_exited() {
            return Ok(());
        }
        self.request_hard_kill()?;
        self.signaled.store(true, Ordering::Release);
        Ok(())
    }

    fn force_kill(&self) -> io::Result<()> {
        if self.has_exited() {
            return Ok(());
        }
        self.request_hard_kill()?;
        self.signaled.store(true, Ordering::Release);
        Ok(())
    }
}
