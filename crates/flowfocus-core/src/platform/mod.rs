//! OS notification subsystem boundary.
//!
//! The engine only talks to the device through [`NotificationBackend`]. The
//! OS owns scheduled handles; callers rediscover them by listing everything
//! pending and matching on `data.type`.

mod memory;

pub use memory::{BackendOp, MemoryBackend};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::planner::{NotificationDescriptor, SemanticType, Trigger};

/// High-priority channel for session, break, goal and milestone alerts.
pub const DEFAULT_CHANNEL_ID: &str = "default";
/// Default-priority channel for daily and weekly recurring notifications.
pub const REMINDERS_CHANNEL_ID: &str = "reminders";

/// OS-assigned notification identifier.
pub type NotificationId = String;

/// Host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
    Web,
    Desktop,
}

impl Platform {
    /// Only Android has delivery channels.
    pub fn has_channels(self) -> bool {
        matches!(self, Platform::Android)
    }
}

/// OS authorization state for local notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

/// Delivery importance of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelPriority {
    Min,
    Low,
    Default,
    High,
    Max,
}

/// Delivery channel definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelConfig {
    pub id: String,
    pub name: String,
    pub priority: ChannelPriority,
    pub vibration_pattern: Vec<u64>,
    pub light_color: String,
    pub sound: Option<String>,
}

impl ChannelConfig {
    /// The two channels every install gets.
    pub fn builtin() -> [ChannelConfig; 2] {
        [
            ChannelConfig {
                id: DEFAULT_CHANNEL_ID.to_string(),
                name: "Flow Focus".to_string(),
                priority: ChannelPriority::Max,
                vibration_pattern: vec![0, 250, 250, 250],
                light_color: "#48BB78".to_string(),
                sound: Some("default".to_string()),
            },
            ChannelConfig {
                id: REMINDERS_CHANNEL_ID.to_string(),
                name: "Daily Reminders".to_string(),
                priority: ChannelPriority::Default,
                vibration_pattern: vec![0, 250, 250, 250],
                light_color: "#4299E1".to_string(),
                sound: Some("default".to_string()),
            },
        ]
    }
}

/// A queued notification as reported by the OS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingNotification {
    pub id: NotificationId,
    pub data: Map<String, Value>,
    pub trigger: Trigger,
}

impl PendingNotification {
    /// Semantic type from `data.type`, if present and known.
    pub fn semantic_type(&self) -> Option<SemanticType> {
        self.data.get("type")?.as_str()?.parse().ok()
    }
}

/// Local notification subsystem of the host OS.
#[async_trait]
pub trait NotificationBackend: Send + Sync {
    fn platform(&self) -> Platform;

    /// False on simulators and emulators.
    fn is_physical_device(&self) -> bool;

    async fn permission_status(&self) -> Result<PermissionStatus>;

    /// Show the OS permission prompt.
    async fn request_permission(&self) -> Result<PermissionStatus>;

    /// Create or update a delivery channel. Must be idempotent per `id`.
    async fn set_channel(&self, channel: &ChannelConfig) -> Result<()>;

    /// Queue a notification; immediate triggers are delivered right away.
    async fn enqueue(&self, descriptor: &NotificationDescriptor) -> Result<NotificationId>;

    /// Every notification still waiting to fire.
    async fn list_pending(&self) -> Result<Vec<PendingNotification>>;

    async fn cancel(&self, id: &str) -> Result<()>;

    async fn cancel_all(&self) -> Result<()>;
}
