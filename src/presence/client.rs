use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

pub const LAUNCHER_IMAGE_KEY: &str = "bloxlaunch_logo";
pub const LAUNCHER_IMAGE_TEXT: &str = "bloxlaunch";
pub const GAME_IMAGE_KEY: &str = "roblox_logo";
pub const GAME_IMAGE_TEXT: &str = "Roblox";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceButton {
    pub label: String,
    pub url: String,
}

/// Rich status shown in the chat client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large_image_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large_image_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small_image_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small_image_text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<PresenceButton>,
}

impl Presence {
    pub fn idle() -> Self {
        Self {
            details: Some("In Launcher".to_string()),
            state: Some("Idle".to_string()),
            large_image_key: Some(LAUNCHER_IMAGE_KEY.to_string()),
            large_image_text: Some(LAUNCHER_IMAGE_TEXT.to_string()),
            ..Default::default()
        }
    }

    /// Shown while a game client runs. An empty `custom_status` reads "In Game".
    pub fn playing(custom_status: &str, started_at: Option<i64>) -> Self {
        let state = if custom_status.trim().is_empty() {
            "In Game".to_string()
        } else {
            custom_status.to_string()
        };
        Self {
            details: Some("Playing Roblox".to_string()),
            state: Some(state),
            start_timestamp: started_at,
            large_image_key: Some(GAME_IMAGE_KEY.to_string()),
            large_image_text: Some(GAME_IMAGE_TEXT.to_string()),
            small_image_key: Some(LAUNCHER_IMAGE_KEY.to_string()),
            small_image_text: Some(LAUNCHER_IMAGE_TEXT.to_string()),
            ..Default::default()
        }
    }

    /// Fill unset images with the launcher artwork.
    pub fn with_default_images(mut self) -> Self {
        if self.large_image_key.is_none() {
            self.large_image_key = Some(LAUNCHER_IMAGE_KEY.to_string());
        }
        if self.large_image_text.is_none() {
            self.large_image_text = Some(LAUNCHER_IMAGE_TEXT.to_string());
        }
        self
    }
}

/// Boundary to the chat client's rich-presence IPC.
#[async_trait]
pub trait PresenceClient: Send + Sync {
    async fn connect(&self, client_id: &str) -> Result<()>;
    async fn set_activity(&self, presence: &Presence) -> Result<()>;
    async fn clear_activity(&self) -> Result<()>;
    async fn disconnect(&self) -> Result<()>;
}

/// Client that records activity through `tracing` only.
#[derive(Debug, Default)]
pub struct LogPresenceClient {
    connected: AtomicBool,
}

impl LogPresenceClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

#[async_trait]
impl PresenceClient for LogPresenceClient {
    async fn connect(&self, client_id: &str) -> Result<()> {
        self.connected.store(true, Ordering::Release);
        tracing::info!("Presence connected (client id {})", client_id);
        Ok(())
    }

    async fn set_activity(&self, presence: &Presence) -> Result<()> {
        tracing::info!(
            "Presence: {} / {}",
            presence.details.as_deref().unwrap_or("-"),
            presence.state.as_deref().unwrap_or("-")
        );
        Ok(())
    }

    async fn clear_activity(&self) -> Result<()> {
        tracing::info!("Presence cleared");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::Release);
        tracing::info!("Presence disconnected");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playing_uses_custom_status() {
        let p = Presence::playing("Grinding", Some(1_700_000_000_000));
        assert_eq!(p.details.as_deref(), Some("Playing Roblox"));
        assert_eq!(p.state.as_deref(), Some("Grinding"));
        assert_eq!(p.start_timestamp, Some(1_700_000_000_000));
    }

    #[test]
    fn playing_defaults_to_in_game() {
        let p = Presence::playing("  ", None);
        assert_eq!(p.state.as_deref(), Some("In Game"));
        assert!(p.start_timestamp.is_none());
    }

    #[test]
    fn idle_presence() {
        let p = Presence::idle();
        assert_eq!(p.details.as_deref(), Some("In Launcher"));
        assert_eq!(p.state.as_deref(), Some("Idle"));
    }

    #[test]
    fn default_images_do_not_override() {
        let p = Presence {
            large_image_key: Some("custom".to_string()),
            ..Default::default()
        }
        .with_default_images();
        assert_eq!(p.large_image_key.as_deref(), Some("custom"));
        assert_eq!(p.large_image_text.as_deref(), Some(LAUNCHER_IMAGE_TEXT));
    }

    #[test]
    fn presence_deserializes_partial_camel_case() {
        let p: Presence =
            serde_json::from_str(r#"{"details":"Lobby","startTimestamp":5}"#).unwrap();
        assert_eq!(p.details.as_deref(), Some("Lobby"));
        assert_eq!(p.start_timestamp, Some(5));
        assert!(p.buttons.is_empty());
    }

    #[tokio::test]
    async fn log_client_never_fails() {
        let client = LogPresenceClient::new();
        client.connect("123").await.unwrap();
        assert!(client.is_connected());
        client.set_activity(&Presence::idle()).await.unwrap();
        client.clear_activity().await.unwrap();
        client.disconnect().await.unwrap();
        assert!(!client.is_connected());
    }
}
