//! Scheduling engine.
//!
//! The stateful core between planner output and the OS queue. One-shot
//! notifications are enqueued as-is; recurring types are kept at no more than
//! one live handle by cancelling by type before creating. Existing handles
//! are found by scanning the OS queue, never from a local id cache, so the
//! invariant survives restarts.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{NotifyError, Result};
use crate::planner::{NotificationDescriptor, SemanticType};
use crate::platform::{NotificationBackend, NotificationId};

/// Outcome of a type-scoped cancellation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelReport {
    /// Pending handles tagged with the type.
    pub matched: usize,
    pub cancelled: usize,
    pub failed: usize,
}

/// Engine over one OS notification queue.
pub struct SchedulingEngine {
    backend: Arc<dyn NotificationBackend>,
    capability: bool,
}

impl SchedulingEngine {
    /// Create an engine with the capability closed until the gate opens it.
    pub fn new(backend: Arc<dyn NotificationBackend>) -> Self {
        Self {
            backend,
            capability: false,
        }
    }

    pub fn set_capability(&mut self, granted: bool) {
        self.capability = granted;
    }

    pub fn capability(&self) -> bool {
        self.capability
    }

    /// Deliver a one-shot notification. Not deduplicated.
    ///
    /// Returns `Ok(None)` without touching the backend when the capability
    /// is closed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDescriptor` for recurring descriptors and `Backend`
    /// if the OS rejects the notification.
    pub async fn schedule_one_shot(
        &self,
        descriptor: &NotificationDescriptor,
    ) -> Result<Option<NotificationId>> {
        if !self.capability {
            tracing::debug!(kind = %descriptor.kind, "notification capability closed, skipping");
            return Ok(None);
        }
        descriptor.validate()?;
        if descriptor.kind.is_recurring() {
            return Err(NotifyError::InvalidDescriptor {
                kind: descriptor.kind,
                message: "recurring types go through schedule_recurring".to_string(),
            });
        }

        let id = self.backend.enqueue(descriptor).await?;
        tracing::info!(kind = %descriptor.kind, id = %id, "delivered notification");
        Ok(Some(id))
    }

    /// Replace the live notification of a recurring type.
    ///
    /// Cancels every pending handle of `kind` first and only then enqueues.
    /// If any stale handle survives cancellation nothing is created, so the
    /// queue never holds two handles of one recurring type.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDescriptor` if `descriptor` is not a valid `kind`
    /// recurring descriptor, `StaleHandles` if old handles could not be
    /// cancelled, and `Backend` if listing or enqueueing fails.
    pub async fn schedule_recurring(
        &self,
        kind: SemanticType,
        descriptor: &NotificationDescriptor,
    ) -> Result<Option<NotificationId>> {
        if !self.capability {
            tracing::debug!(kind = %kind, "notification capability closed, skipping");
            return Ok(None);
        }
        if descriptor.kind != kind || !kind.is_recurring() {
            return Err(NotifyError::InvalidDescriptor {
                kind,
                message: format!("descriptor of type {} is not recurring {}", descriptor.kind, kind),
            });
        }
        descriptor.validate()?;

        let report = self.cancel_by_type(kind).await?;
        if report.failed > 0 {
            return Err(NotifyError::StaleHandles {
                kind,
                count: report.failed,
            });
        }

        let id = self.backend.enqueue(descriptor).await?;
        tracing::info!(
            kind = %kind,
            id = %id,
            trigger = ?descriptor.trigger,
            replaced = report.cancelled,
            "scheduled recurring notification"
        );
        Ok(Some(id))
    }

    /// Cancel every pending notification whose `data.type` is `kind`.
    ///
    /// Zero matches is not an error. Individual cancel failures are logged,
    /// counted and do not stop the remaining cancellations.
    ///
    /// # Errors
    ///
    /// Returns `Backend` only if the pending queue cannot be listed.
    pub async fn cancel_by_type(&self, kind: SemanticType) -> Result<CancelReport> {
        if !self.capability {
            return Ok(CancelReport::default());
        }

        let pending = self.backend.list_pending().await?;
        let mut report = CancelReport::default();

        for notification in pending
            .iter()
            .filter(|n| n.semantic_type() == Some(kind))
        {
            report.matched += 1;
            match self.backend.cancel(&notification.id).await {
                Ok(()) => report.cancelled += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(kind = %kind, id = %notification.id, error = %e, "failed to cancel notification");
                }
            }
        }

        if report.matched > 0 {
            tracing::debug!(kind = %kind, cancelled = report.cancelled, failed = report.failed, "cancelled by type");
        }
        Ok(report)
    }

    /// Clear the whole pending queue. Only used by a full settings reset.
    ///
    /// # Errors
    ///
    /// Returns `Backend` if the OS call fails.
    pub async fn cancel_all(&self) -> Result<()> {
        if !self.capability {
            return Ok(());
        }
        self.backend.cancel_all().await?;
        tracing::info!("cancelled all pending notifications");
        Ok(())
    }
}
