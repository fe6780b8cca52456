use tokio::sync::mpsc;

use crate::config::{AppConfig, GenerationConfig};
use crate::core::api::{ApiClient, ApiResult};

use super::events::{AppEvent, Notification, NotificationLevel};

/// Centralized handle to backend services.
///
/// Created once at startup, then passed by reference to views. Views clone
/// the fields they move into spawned request tasks.
pub struct Services {
    pub api: ApiClient,
    pub generation: GenerationConfig,
    pub event_tx: mpsc::UnboundedSender<AppEvent>,
}

impl Services {
    /// Initialize services from config.
    pub fn init(
        config: &AppConfig,
        event_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> ApiResult<Self> {
        let api = ApiClient::new(&config.api)?;
        log::info!("API client initialized for {}", api.base_url());
        Ok(Self::new(api, config.generation.clone(), event_tx))
    }

    pub fn new(
        api: ApiClient,
        generation: GenerationConfig,
        event_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            api,
            generation,
            event_tx,
        }
    }

    /// Cloneable notifier for spawned tasks.
    pub fn notifier(&self) -> Notifier {
        Notifier {
            tx: self.event_tx.clone(),
        }
    }
}

/// Pushes notifications into the app event channel.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl Notifier {
    pub fn send(&self, message: impl Into<String>, level: NotificationLevel) {
        // Receiver gone means the app is shutting down
        let _ = self
            .tx
            .send(AppEvent::Notification(Notification::new(message, level)));
    }

    pub fn success(&self, message: impl Into<String>) {
        self.send(message, NotificationLevel::Success);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(message, NotificationLevel::Error);
    }
}
