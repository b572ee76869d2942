//! # Flow Focus Core Library
//!
//! Local notification scheduling and reconciliation for the Flow Focus timer.
//! Decides which reminder and celebration notifications should exist on the
//! device, persists the preferences that govern them, and keeps the OS queue
//! consistent with those preferences and with session, streak and goal events.
//!
//! ## Architecture
//!
//! - **Preference Store**: JSON-backed settings with field-level defaulting
//! - **Permission Gate**: OS authorization and delivery channels
//! - **Schedule Planner**: pure (settings, event) to descriptor decisions
//! - **Scheduling Engine**: OS queue access, cancel-by-type, at most one live
//!   handle per recurring type
//! - **Reconciler**: initialization and settings-change flows
//!
//! ## Key Components
//!
//! - [`NotificationService`]: the single owned entry point
//! - [`NotificationBackend`]: trait over the OS notification subsystem
//! - [`plan_one_shot`] / [`plan_recurring`]: planner functions

pub mod engine;
pub mod error;
pub mod flow;
pub mod logging;
pub mod permission;
pub mod planner;
pub mod platform;
pub mod reconciler;
pub mod response;
pub mod service;
pub mod settings;
pub mod storage;

pub use engine::{CancelReport, SchedulingEngine};
pub use error::{NotifyError, Result};
pub use flow::{FlowIntensity, FlowMetrics, MilestoneTracker, SessionEvent};
pub use permission::PermissionGate;
pub use planner::{plan_one_shot, plan_recurring, NotificationDescriptor, NotificationEvent, SemanticType, Trigger};
pub use platform::{
    ChannelConfig, ChannelPriority, MemoryBackend, NotificationBackend, NotificationId,
    PendingNotification, PermissionStatus, Platform,
};
pub use reconciler::{ReconcileReport, Reconciler, ReconcilerState, TypeOutcome};
pub use response::{route_response, PresentationOptions, ResponseAction};
pub use service::NotificationService;
pub use settings::{NotificationSettings, ReminderTime, SettingKey, SettingsPatch};
pub use storage::{FileStore, KeyValueStore, MemoryStore, PreferenceStore};
