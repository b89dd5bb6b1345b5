use serde::Serialize;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowState {
    Normal,
    Minimized,
    Maximized,
    Hidden,
    Closed,
}

/// Whatever presents the launcher to the user. Closing ends the session.
pub trait WindowHost: Send + Sync {
    fn minimize(&self);
    /// Toggle between maximized and normal.
    fn maximize(&self);
    fn hide(&self);
    fn close(&self);
    fn state(&self) -> WindowState;
    fn open_external(&self, url: &str) -> anyhow::Result<()>;

    fn is_closed(&self) -> bool {
        self.state() == WindowState::Closed
    }
}

/// Window host for sessions without a UI; it only tracks state.
#[derive(Debug)]
pub struct HeadlessWindow {
    state: Mutex<WindowState>,
}

impl Default for HeadlessWindow {
    fn default() -> Self {
        Self {
            state: Mutex::new(WindowState::Normal),
        }
    }
}

impl HeadlessWindow {
    pub fn new() -> Self {
        Self::default()
    }

    fn transition(&self, next: impl FnOnce(WindowState) -> WindowState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == WindowState::Closed {
            return;
        }
        let updated = next(*state);
        if updated != *state {
            tracing::debug!("Window {:?} -> {:?}", *state, updated);
        }
        *state = updated;
    }
}

impl WindowHost for HeadlessWindow {
    fn minimize(&self) {
        self.transition(|_| WindowState::Minimized);
    }

    fn maximize(&self) {
        self.transition(|current| match current {
            WindowState::Maximized => WindowState::Normal,
            _ => WindowState::Maximized,
        });
    }

    fn hide(&self) {
        self.transition(|_| WindowState::Hidden);
    }

    fn close(&self) {
        self.transition(|_| WindowState::Closed);
    }

    fn state(&self) -> WindowState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open_external(&self, url: &str) -> anyhow::Result<()> {
        crate::utils::open_in_browser(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maximize_toggles() {
        let window = HeadlessWindow::new();
        window.maximize();
        assert_eq!(window.state(), WindowState::Maximized);
        window.maximize();
        assert_eq!(window.state(), WindowState::Normal);
    }

    #[test]
    fn closed_is_terminal() {
        let window = HeadlessWindow::new();
        window.close();
        window.minimize();
        assert!(window.is_closed());
    }

    #[test]
    fn hide_keeps_window_open() {
        let window = HeadlessWindow::new();
        window.hide();
        assert_eq!(window.state(), WindowState::Hidden);
        assert!(!window.is_closed());
    }
}
