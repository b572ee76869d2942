//! Recurring-notification reconciliation.
//!
//! Recomputes which recurring notifications should exist from the current
//! settings and makes the OS queue match. Cancel-then-create per type makes
//! every pass idempotent, so no diff against previous state is needed.
//!
//! ## Entry points
//!
//! - [`Reconciler::initialize`]: permission gate, settings load, every
//!   recurring type (types run concurrently)
//! - [`Reconciler::on_setting_change`]: persist a patch, then only the
//!   recurring types the patch can affect
//! - [`Reconciler::reset`]: defaults, full queue clear, every recurring type

use serde::{Deserialize, Serialize};

use crate::engine::SchedulingEngine;
use crate::error::Result;
use crate::permission::PermissionGate;
use crate::planner::{plan_recurring, SemanticType};
use crate::platform::NotificationId;
use crate::settings::{NotificationSettings, SettingKey, SettingsPatch};
use crate::storage::PreferenceStore;

/// What a reconciliation pass did for one recurring type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TypeOutcome {
    /// A fresh handle now exists.
    Scheduled { id: NotificationId },
    /// The type is disabled; this many stale handles were removed.
    Cancelled { count: usize },
    /// Capability closed, nothing touched.
    Skipped,
    /// The OS boundary failed; the next pass retries.
    Failed { error: String },
}

/// Per-type outcomes of one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub outcomes: Vec<(SemanticType, TypeOutcome)>,
}

impl ReconcileReport {
    pub fn outcome(&self, kind: SemanticType) -> Option<&TypeOutcome> {
        self.outcomes
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, outcome)| outcome)
    }

    pub fn failures(&self) -> impl Iterator<Item = SemanticType> + '_ {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, TypeOutcome::Failed { .. }))
            .map(|(kind, _)| *kind)
    }

    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Lifecycle of the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcilerState {
    Uninitialized,
    /// Last pass returned; `granted` is the capability it ran with.
    Reconciled { granted: bool },
}

/// Recurring types whose desired notification can change under `patch`.
pub fn affected_types(patch: &SettingsPatch) -> Vec<SemanticType> {
    let mut daily = patch.touches_reminder_time();
    let mut weekly = false;

    for key in patch.touched_keys() {
        match key {
            SettingKey::Enabled | SettingKey::SoundEnabled => {
                daily = true;
                weekly = true;
            }
            SettingKey::DailyReminders => daily = true,
            SettingKey::WeeklyReports => weekly = true,
            SettingKey::SessionComplete
            | SettingKey::BreakComplete
            | SettingKey::MotivationalMessages
            | SettingKey::VibrationEnabled => {}
        }
    }

    let mut kinds = Vec::new();
    if daily {
        kinds.push(SemanticType::DailyReminder);
    }
    if weekly {
        kinds.push(SemanticType::WeeklyReport);
    }
    kinds
}

/// Bring one recurring type in line with `settings`.
///
/// Failures are logged and reported, never propagated.
pub async fn reconcile_type(
    engine: &SchedulingEngine,
    kind: SemanticType,
    settings: &NotificationSettings,
) -> TypeOutcome {
    if !engine.capability() {
        return TypeOutcome::Skipped;
    }

    let result = match plan_recurring(kind, settings) {
        Some(descriptor) => engine
            .schedule_recurring(kind, &descriptor)
            .await
            .map(|id| match id {
                Some(id) => TypeOutcome::Scheduled { id },
                None => TypeOutcome::Skipped,
            }),
        None => engine
            .cancel_by_type(kind)
            .await
            .map(|report| TypeOutcome::Cancelled {
                count: report.cancelled,
            }),
    };

    result.unwrap_or_else(|e| {
        tracing::warn!(kind = %kind, error = %e, "reconciliation failed for notification type");
        TypeOutcome::Failed {
            error: e.to_string(),
        }
    })
}

/// Orchestrates the permission gate, preference store and engine.
pub struct Reconciler {
    gate: PermissionGate,
    store: PreferenceStore,
    engine: SchedulingEngine,
    state: ReconcilerState,
}

impl Reconciler {
    pub fn new(gate: PermissionGate, store: PreferenceStore, engine: SchedulingEngine) -> Self {
        Self {
            gate,
            store,
            engine,
            state: ReconcilerState::Uninitialized,
        }
    }

    /// Gate, load settings, reconcile every recurring type.
    ///
    /// Safe to call on every app start: the pass is idempotent.
    pub async fn initialize(&mut self) -> ReconcileReport {
        let granted = self.gate.initialize().await;
        self.engine.set_capability(granted);
        let settings = self.store.load();

        let report = self.reconcile_all(&settings).await;
        self.state = ReconcilerState::Reconciled { granted };
        tracing::info!(
            granted,
            clean = report.is_clean(),
            "notification reconciliation complete"
        );
        report
    }

    /// Persist `patch`, then reconcile the recurring types it affects.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be persisted; nothing is
    /// rescheduled in that case.
    pub async fn on_setting_change(&mut self, patch: &SettingsPatch) -> Result<ReconcileReport> {
        let settings = self.store.save(patch)?;
        let kinds = affected_types(patch);

        let mut report = ReconcileReport::default();
        for kind in kinds {
            let outcome = reconcile_type(&self.engine, kind, &settings).await;
            report.outcomes.push((kind, outcome));
        }
        Ok(report)
    }

    /// Restore default settings, clear the queue and rebuild recurring types.
    ///
    /// # Errors
    ///
    /// Returns an error if the defaults cannot be persisted.
    pub async fn reset(&mut self) -> Result<ReconcileReport> {
        let settings = self.store.reset()?;
        if let Err(e) = self.engine.cancel_all().await {
            tracing::warn!(error = %e, "failed to clear notification queue during reset");
        }
        Ok(self.reconcile_all(&settings).await)
    }

    async fn reconcile_all(&self, settings: &NotificationSettings) -> ReconcileReport {
        let (daily, weekly) = tokio::join!(
            reconcile_type(&self.engine, SemanticType::DailyReminder, settings),
            reconcile_type(&self.engine, SemanticType::WeeklyReport, settings),
        );
        ReconcileReport {
            outcomes: vec![
                (SemanticType::DailyReminder, daily),
                (SemanticType::WeeklyReport, weekly),
            ],
        }
    }

    pub fn settings(&self) -> &NotificationSettings {
        self.store.get()
    }

    pub fn engine(&self) -> &SchedulingEngine {
        &self.engine
    }

    pub fn gate(&self) -> &PermissionGate {
        &self.gate
    }

    pub fn state(&self) -> ReconcilerState {
        self.state
    }
}
