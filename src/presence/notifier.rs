use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{Presence, PresenceClient};

pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(30);

struct Inner {
    client: Arc<dyn PresenceClient>,
    client_id: String,
    connected: AtomicBool,
    idle: AtomicBool,
}

impl Inner {
    async fn try_connect(&self) -> anyhow::Result<()> {
        self.client.connect(&self.client_id).await?;
        self.connected.store(true, Ordering::Release);
        tracing::info!("Presence client connected");

        match self.client.set_activity(&Presence::idle()).await {
            Ok(()) => self.idle.store(true, Ordering::Release),
            Err(e) => tracing::warn!("Failed to set idle presence: {:#}", e),
        }
        Ok(())
    }
}

/// Keeps the chat client's rich status in sync with launcher state.
/// Failures are logged and trigger reconnection, never returned.
pub struct PresenceNotifier {
    inner: Arc<Inner>,
    reconnect_interval: Duration,
    reconnect: Mutex<Option<JoinHandle<()>>>,
}

impl PresenceNotifier {
    pub fn new(client: Arc<dyn PresenceClient>, client_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                client_id: client_id.into(),
                connected: AtomicBool::new(false),
                idle: AtomicBool::new(false),
            }),
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            reconnect: Mutex::new(None),
        }
    }

    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    pub async fn connect(&self) {
        if self.is_connected() {
            return;
        }
        if let Err(e) = self.inner.try_connect().await {
            tracing::warn!("Presence connection failed: {:#}", e);
            self.schedule_reconnect();
        }
    }

    pub async fn update(&self, presence: &Presence) {
        if !self.is_connected() {
            return;
        }
        self.inner.idle.store(false, Ordering::Release);
        if let Err(e) = self.inner.client.set_activity(presence).await {
            tracing::warn!("Failed to update presence: {:#}", e);
            self.mark_disconnected();
        }
    }

    pub async fn clear(&self) {
        if !self.is_connected() {
            return;
        }
        self.inner.idle.store(false, Ordering::Release);
        if let Err(e) = self.inner.client.clear_activity().await {
            tracing::warn!("Failed to clear presence: {:#}", e);
            self.mark_disconnected();
        }
    }

    /// Show the idle presence unless it is already showing.
    pub async fn show_idle(&self) {
        if !self.is_connected() || self.inner.idle.load(Ordering::Acquire) {
            return;
        }
        self.update(&Presence::idle()).await;
        if self.is_connected() {
            self.inner.idle.store(true, Ordering::Release);
        }
    }

    /// Stop reconnecting and close the connection.
    pub async fn disconnect(&self) {
        self.cancel_reconnect();
        self.inner.idle.store(false, Ordering::Release);
        if !self.inner.connected.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Err(e) = self.inner.client.clear_activity().await {
            tracing::debug!("Clearing presence on disconnect failed: {:#}", e);
        }
        if let Err(e) = self.inner.client.disconnect().await {
            tracing::debug!("Presence disconnect failed: {:#}", e);
        }
    }

    pub fn is_reconnecting(&self) -> bool {
        self.reconnect
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    fn mark_disconnected(&self) {
        self.inner.connected.store(false, Ordering::Release);
        self.schedule_reconnect();
    }

    fn schedule_reconnect(&self) {
        let mut slot = self.reconnect.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().map(|task| !task.is_finished()).unwrap_or(false) {
            return;
        }

        let inner = self.inner.clone();
        let interval = self.reconnect_interval;
        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if inner.connected.load(Ordering::Acquire) {
                    break;
                }
                tracing::info!("Attempting to reconnect presence client");
                match inner.try_connect().await {
                    Ok(()) => break,
                    Err(e) => tracing::debug!("Presence reconnect failed: {:#}", e),
                }
            }
        }));
    }

    fn cancel_reconnect(&self) {
        if let Some(task) = self
            .reconnect
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
    }
}

impl Drop for PresenceNotifier {
    fn drop(&mut self) {
        self.cancel_reconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[derive(Default)]
    struct MockState {
        calls: Vec<String>,
        connect_failures: usize,
        fail_activity: bool,
    }

    #[derive(Clone, Default)]
    struct MockPresenceClient {
        state: Arc<Mutex<MockState>>,
    }

    impl MockPresenceClient {
        fn failing_connects(n: usize) -> Self {
            let client = Self::default();
            client.state.lock().unwrap().connect_failures = n;
            client
        }

        fn calls(&self) -> Vec<String> {
            self.state.lock().unwrap().calls.clone()
        }

        fn set_fail_activity(&self, fail: bool) {
            self.state.lock().unwrap().fail_activity = fail;
        }
    }

    #[async_trait]
    impl PresenceClient for MockPresenceClient {
        async fn connect(&self, client_id: &str) -> anyhow::Result<()> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(format!("connect:{}", client_id));
            if state.connect_failures > 0 {
                state.connect_failures -= 1;
                anyhow::bail!("pipe not found");
            }
            Ok(())
        }

        async fn set_activity(&self, presence: &Presence) -> anyhow::Result<()> {
            let mut state = self.state.lock().unwrap();
            if state.fail_activity {
                anyhow::bail!("pipe closed");
            }
            state.calls.push(format!(
                "set:{}",
                presence.details.clone().unwrap_or_default()
            ));
            Ok(())
        }

        async fn clear_activity(&self) -> anyhow::Result<()> {
            self.state.lock().unwrap().calls.push("clear".to_string());
            Ok(())
        }

        async fn disconnect(&self) -> anyhow::Result<()> {
            self.state.lock().unwrap().calls.push("disconnect".to_string());
            Ok(())
        }
    }

    fn notifier(client: &MockPresenceClient) -> PresenceNotifier {
        PresenceNotifier::new(Arc::new(client.clone()), "42")
            .with_reconnect_interval(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn connect_sets_idle_presence() {
        let client = MockPresenceClient::default();
        let n = notifier(&client);

        n.connect().await;

        assert!(n.is_connected());
        assert_eq!(client.calls(), vec!["connect:42", "set:In Launcher"]);
    }

    #[tokio::test]
    async fn show_idle_only_replaces_other_activity() {
        let client = MockPresenceClient::default();
        let n = notifier(&client);
        n.connect().await;

        n.show_idle().await;
        assert_eq!(client.calls().len(), 2, "show_idle: should skip when already idle");

        n.clear().await;
        n.show_idle().await;
        n.show_idle().await;
        assert_eq!(
            client.calls(),
            vec!["connect:42", "set:In Launcher", "clear", "set:In Launcher"]
        );
    }

    #[tokio::test]
    async fn update_is_noop_while_disconnected() {
        let client = MockPresenceClient::default();
        let n = notifier(&client);

        n.update(&Presence::playing("", None)).await;
        n.clear().await;
        n.show_idle().await;

        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_connect_retries_until_success() {
        let client = MockPresenceClient::failing_connects(2);
        let n = notifier(&client);

        n.connect().await;
        assert!(!n.is_connected());
        assert!(n.is_reconnecting());

        tokio::time::timeout(Duration::from_secs(2), async {
            while !n.is_connected() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        let connects = client
            .calls()
            .iter()
            .filter(|c| c.starts_with("connect"))
            .count();
        assert_eq!(connects, 3);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!n.is_reconnecting(), "reconnect: task should stop after success");
    }

    #[tokio::test]
    async fn activity_failure_is_isolated() {
        let client = MockPresenceClient::default();
        let n = notifier(&client);
        n.connect().await;

        client.set_fail_activity(true);
        n.update(&Presence::playing("", None)).await;

        assert!(!n.is_connected());
        assert!(n.is_reconnecting());
        n.disconnect().await;
    }

    #[tokio::test]
    async fn disconnect_clears_and_stops() {
        let client = MockPresenceClient::default();
        let n = notifier(&client);
        n.connect().await;

        n.disconnect().await;

        assert!(!n.is_connected());
        let calls = client.calls();
        assert_eq!(&calls[calls.len() - 2..], &["clear", "disconnect"]);
    }
}
