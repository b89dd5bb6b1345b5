mod context;
mod handler;
mod window;

#[cfg(test)]
pub(crate) use context::tests as testing;
pub use context::{AppContext, AppServices, BackgroundTasks};
pub use handler::{handle, parse_command, AppCommand, VERSION};
pub use window::{HeadlessWindow, WindowHost, WindowState};
