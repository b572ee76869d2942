//! Notification service.
//!
//! The single owned entry point the rest of the app talks to: constructed
//! once at startup and passed by reference. Every method takes `&mut self`,
//! so scheduling steps are sequential by construction; hosts that share the
//! service across tasks put it behind their own async mutex.
//!
//! Event handlers never fail: a suppressed, unauthorized or rejected
//! notification simply does not exist.

use std::sync::Arc;

use chrono::Utc;
use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;

use crate::engine::SchedulingEngine;
use crate::error::Result;
use crate::flow::{FlowIntensity, FlowMetrics, MilestoneTracker, SessionEvent};
use crate::permission::PermissionGate;
use crate::planner::{plan_one_shot, NotificationEvent};
use crate::platform::{NotificationBackend, NotificationId};
use crate::reconciler::{ReconcileReport, Reconciler, ReconcilerState};
use crate::response::PresentationOptions;
use crate::settings::{NotificationSettings, ReminderTime, SettingKey, SettingsPatch};
use crate::storage::{FileStore, KeyValueStore, PreferenceStore};

/// Local notification scheduling for the whole app.
pub struct NotificationService {
    reconciler: Reconciler,
    rng: Mcg128Xsl64,
    milestones: MilestoneTracker,
    flow_intensity: Option<FlowIntensity>,
}

impl NotificationService {
    /// Build a service over an OS backend and a settings store.
    pub fn new(backend: Arc<dyn NotificationBackend>, kv: Arc<dyn KeyValueStore>) -> Self {
        let reconciler = Reconciler::new(
            PermissionGate::new(backend.clone()),
            PreferenceStore::new(kv),
            SchedulingEngine::new(backend),
        );
        Self {
            reconciler,
            rng: Mcg128Xsl64::from_entropy(),
            milestones: MilestoneTracker::new(),
            flow_intensity: None,
        }
    }

    /// Build a service persisting settings in the application data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn open(backend: Arc<dyn NotificationBackend>) -> Result<Self> {
        Ok(Self::new(backend, Arc::new(FileStore::open()?)))
    }

    /// Seed message selection, for reproducible copy.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mcg128Xsl64::seed_from_u64(seed);
        self
    }

    /// Resolve permission, load settings and reconcile recurring notifications.
    ///
    /// Returns the capability flag. Calling it again never re-prompts and
    /// leaves the queue unchanged when nothing else changed.
    pub async fn initialize(&mut self) -> bool {
        let report = self.reconciler.initialize().await;
        for kind in report.failures() {
            tracing::warn!(kind = %kind, "recurring notification left unscheduled, will retry next pass");
        }
        self.reconciler.engine().capability()
    }

    pub fn is_initialized(&self) -> bool {
        self.reconciler.state() != ReconcilerState::Uninitialized
    }

    /// Whether local notifications can work on this device at all.
    pub fn is_supported(&self) -> bool {
        self.reconciler.gate().is_supported()
    }

    pub fn has_permission(&self) -> bool {
        self.reconciler.engine().capability()
    }

    /// Read-only snapshot of the current settings.
    pub fn get_settings(&self) -> NotificationSettings {
        self.reconciler.settings().clone()
    }

    pub fn presentation_options(&self) -> PresentationOptions {
        PresentationOptions::for_settings(self.reconciler.settings())
    }

    /// Change one boolean setting and reconcile what it affects.
    ///
    /// A failed save is logged and leaves the previous settings in place.
    pub async fn update_setting(&mut self, key: SettingKey, value: bool) -> ReconcileReport {
        self.update_settings(&SettingsPatch::with(key, value)).await
    }

    /// Change one boolean setting addressed by its persisted name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownSetting` for names that are not boolean settings.
    pub async fn update_setting_by_name(&mut self, key: &str, value: bool) -> Result<ReconcileReport> {
        let key: SettingKey = key.parse()?;
        Ok(self.update_setting(key, value).await)
    }

    /// Set the daily reminder time ("HH:MM") and reschedule the reminder.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReminderTime` for malformed input; nothing is saved.
    pub async fn update_reminder_time(&mut self, time: &str) -> Result<ReconcileReport> {
        let time: ReminderTime = time.parse()?;
        Ok(self.update_settings(&SettingsPatch::reminder_time(time)).await)
    }

    /// Apply a partial update and reconcile the recurring types it affects.
    ///
    /// Persistence failures are logged, not returned: the previous settings
    /// stay in effect and the report is empty.
    pub async fn update_settings(&mut self, patch: &SettingsPatch) -> ReconcileReport {
        self.reconciler.on_setting_change(patch).await.unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to save notification settings");
            ReconcileReport::default()
        })
    }

    /// Restore defaults, clear every pending notification and reschedule.
    ///
    /// If the defaults cannot be saved nothing changes and the report is empty.
    pub async fn reset_settings(&mut self) -> ReconcileReport {
        self.reconciler.reset().await.unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to reset notification settings");
            ReconcileReport::default()
        })
    }

    /// A focus session (`is_break == false`) or break ended.
    pub async fn on_session_complete(&mut self, is_break: bool) -> Option<NotificationId> {
        self.fire(NotificationEvent::SessionComplete {
            is_break,
            at: Utc::now(),
            flow_intensity: self.flow_intensity,
        })
        .await
    }

    pub async fn on_goal_achieved(&mut self, title: &str) -> Option<NotificationId> {
        self.fire(NotificationEvent::GoalAchieved {
            title: title.to_string(),
        })
        .await
    }

    /// Only whitelisted streak counts notify.
    pub async fn on_streak_milestone(&mut self, count: u32) -> Option<NotificationId> {
        self.fire(NotificationEvent::StreakMilestone { count }).await
    }

    pub async fn on_break_reminder(&mut self, minutes: u32) -> Option<NotificationId> {
        self.fire(NotificationEvent::BreakReminder { minutes }).await
    }

    /// Session-lifecycle event from the background timer.
    pub async fn handle_session_event(&mut self, event: SessionEvent) -> Option<NotificationId> {
        let (is_break, at) = match event {
            SessionEvent::Started { .. } => return None,
            SessionEvent::Completed { at } => (false, at),
            SessionEvent::BreakCompleted { at } => (true, at),
        };
        self.fire(NotificationEvent::SessionComplete {
            is_break,
            at,
            flow_intensity: self.flow_intensity,
        })
        .await
    }

    /// New snapshot from the flow-metrics provider.
    ///
    /// Remembers the intensity for later session payloads and announces a
    /// streak milestone the first time the streak reaches one.
    pub async fn handle_flow_metrics(&mut self, metrics: FlowMetrics) -> Option<NotificationId> {
        self.flow_intensity = Some(metrics.flow_intensity);
        let count = self.milestones.observe(metrics.current_streak)?;
        self.on_streak_milestone(count).await
    }

    async fn fire(&mut self, event: NotificationEvent) -> Option<NotificationId> {
        let kind = event.semantic_type();
        let Some(descriptor) = plan_one_shot(&event, self.reconciler.settings(), &mut self.rng) else {
            tracing::debug!(kind = %kind, "notification suppressed by settings");
            return None;
        };

        match self.reconciler.engine().schedule_one_shot(&descriptor).await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(kind = %kind, error = %e, "failed to deliver notification");
                None
            }
        }
    }
}
