mod client;
mod notifier;

pub use client::{LogPresenceClient, Presence, PresenceButton, PresenceClient};
pub use notifier::PresenceNotifier;
