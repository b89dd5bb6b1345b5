//! In-memory spawner for exercising the process manager without real
//! child processes.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use super::{ChildHandle, ExitEvent, LaunchCommand, ProcessSpawner, SpawnedChild};

pub struct MockChild {
    pub pid: u32,
    exited: AtomicBool,
    signaled: AtomicBool,
    exit_on_terminate: bool,
    pub terminations: AtomicUsize,
    pub force_kills: AtomicUsize,
}

impl ChildHandle for MockChild {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn has_exited(&self) -> bool {
        self.exited.load(Ordering::SeqCst)
    }

    fn was_signaled(&self) -> bool {
        self.signaled.load(Ordering::SeqCst)
    }

    fn terminate(&self) -> io::Result<()> {
        self.terminations.fetch_add(1, Ordering::SeqCst);
        self.signaled.store(true, Ordering::SeqCst);
        if self.exit_on_terminate {
            self.exited.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    fn force_kill(&self) -> io::Result<()> {
        self.force_kills.fetch_add(1, Ordering::SeqCst);
        self.exited.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct MockState {
    next_pid: u32,
    fail_with: Option<String>,
    exit_on_terminate: bool,
    children: Vec<Arc<MockChild>>,
    exits: HashMap<u32, oneshot::Sender<ExitEvent>>,
    commands: Vec<LaunchCommand>,
}

#[derive(Clone, Default)]
pub struct MockSpawner {
    state: Arc<Mutex<MockState>>,
}

impl MockSpawner {
    pub fn failing(message: &str) -> Self {
        let spawner = Self::default();
        spawner.state.lock().unwrap().fail_with = Some(message.to_string());
        spawner
    }

    /// Children exit as soon as they are asked to terminate.
    pub fn cooperative() -> Self {
        let spawner = Self::default();
        spawner.state.lock().unwrap().exit_on_terminate = true;
        spawner
    }

    pub fn child(&self, index: usize) -> Arc<MockChild> {
        self.state.lock().unwrap().children[index].clone()
    }

    pub fn commands(&self) -> Vec<LaunchCommand> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn exit(&self, pid: u32, code: i32) {
        let mut state = self.state.lock().unwrap();
        if let Some(child) = state.children.iter().find(|c| c.pid == pid) {
            child.exited.store(true, Ordering::SeqCst);
        }
        if let Some(tx) = state.exits.remove(&pid) {
            let _ = tx.send(ExitEvent::Exited(Some(code)));
        }
    }

    /// Mark a child exited without delivering the exit notification.
    pub fn mark_exited_silently(&self, index: usize) {
        self.child(index).exited.store(true, Ordering::SeqCst);
    }
}

impl ProcessSpawner for MockSpawner {
    fn spawn(&self, command: &LaunchCommand) -> io::Result<SpawnedChild> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.fail_with {
            return Err(io::Error::new(io::ErrorKind::NotFound, message.clone()));
        }
        state.commands.push(command.clone());
        state.next_pid += 1;
        let pid = 1000 + state.next_pid;
        let child = Arc::new(MockChild {
            pid,
            exited: AtomicBool::new(false),
            signaled: AtomicBool::new(false),
            exit_on_terminate: state.exit_on_terminate,
            terminations: AtomicUsize::new(0),
            force_kills: AtomicUsize::new(0),
        });
        let (tx, rx) = oneshot::channel();
        state.exits.insert(pid, tx);
        state.children.push(child.clone());
        Ok(SpawnedChild {
            handle: child,
            exit: rx,
        })
    }
}
