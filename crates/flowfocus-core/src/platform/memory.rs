//! In-process notification subsystem.
//!
//! Behaves like the device queue: recurring notifications stay pending until
//! cancelled, immediate ones are delivered at once. Any operation can be made
//! to fail for exercising the degrade-and-continue paths.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::{
    ChannelConfig, NotificationBackend, NotificationId, PendingNotification, PermissionStatus,
    Platform,
};
use crate::error::{NotifyError, Result};
use crate::planner::{NotificationDescriptor, SemanticType};

/// Backend operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOp {
    PermissionStatus,
    RequestPermission,
    SetChannel,
    Enqueue,
    ListPending,
    Cancel,
    CancelAll,
}

impl BackendOp {
    fn name(self) -> &'static str {
        match self {
            BackendOp::PermissionStatus => "permission_status",
            BackendOp::RequestPermission => "request_permission",
            BackendOp::SetChannel => "set_channel",
            BackendOp::Enqueue => "enqueue",
            BackendOp::ListPending => "list_pending",
            BackendOp::Cancel => "cancel",
            BackendOp::CancelAll => "cancel_all",
        }
    }
}

struct State {
    permission: PermissionStatus,
    prompt_answer: PermissionStatus,
    permission_requests: usize,
    channels: BTreeMap<String, ChannelConfig>,
    channel_writes: usize,
    pending: Vec<(NotificationId, NotificationDescriptor)>,
    delivered: Vec<NotificationDescriptor>,
    failing_ops: HashSet<BackendOp>,
    failing_kinds: HashSet<SemanticType>,
}

/// In-memory [`NotificationBackend`].
pub struct MemoryBackend {
    platform: Platform,
    physical_device: bool,
    state: Mutex<State>,
}

impl MemoryBackend {
    /// Android device that has not been asked for permission yet and grants it
    /// when prompted.
    pub fn new() -> Self {
        Self::with_platform(Platform::Android)
    }

    pub fn with_platform(platform: Platform) -> Self {
        Self {
            platform,
            physical_device: true,
            state: Mutex::new(State {
                permission: PermissionStatus::Undetermined,
                prompt_answer: PermissionStatus::Granted,
                permission_requests: 0,
                channels: BTreeMap::new(),
                channel_writes: 0,
                pending: Vec::new(),
                delivered: Vec::new(),
                failing_ops: HashSet::new(),
                failing_kinds: HashSet::new(),
            }),
        }
    }

    /// Pretend to run on a simulator/emulator.
    pub fn simulator(mut self) -> Self {
        self.physical_device = false;
        self
    }

    /// Current permission state.
    pub fn with_permission(self, status: PermissionStatus) -> Self {
        self.state().permission = status;
        self
    }

    /// What the user answers when prompted.
    pub fn answering_prompt_with(self, status: PermissionStatus) -> Self {
        self.state().prompt_answer = status;
        self
    }

    /// Make every call of `op` fail until cleared.
    pub fn fail(&self, op: BackendOp) {
        self.state().failing_ops.insert(op);
    }

    /// Make enqueue and cancel fail only for notifications of `kind`.
    pub fn fail_kind(&self, kind: SemanticType) {
        self.state().failing_kinds.insert(kind);
    }

    pub fn clear_failures(&self) {
        let mut state = self.state();
        state.failing_ops.clear();
        state.failing_kinds.clear();
    }

    pub fn permission_requests(&self) -> usize {
        self.state().permission_requests
    }

    pub fn channels(&self) -> Vec<ChannelConfig> {
        self.state().channels.values().cloned().collect()
    }

    /// Number of `set_channel` calls that reached the backend.
    pub fn channel_writes(&self) -> usize {
        self.state().channel_writes
    }

    /// Pending descriptors of `kind`, in queue order.
    pub fn pending_of(&self, kind: SemanticType) -> Vec<NotificationDescriptor> {
        self.state()
            .pending
            .iter()
            .filter(|(_, d)| d.kind == kind)
            .map(|(_, d)| d.clone())
            .collect()
    }

    pub fn pending_len(&self) -> usize {
        self.state().pending.len()
    }

    /// Everything delivered immediately so far.
    pub fn delivered(&self) -> Vec<NotificationDescriptor> {
        self.state().delivered.clone()
    }

    /// Drop a pending notification behind the engine's back, as an OS
    /// reinstall or a user clearing notifications would.
    pub fn evict_all(&self) {
        self.state().pending.clear();
    }

    /// Queue a notification directly, e.g. a leftover from a previous run.
    pub fn inject_pending(&self, descriptor: NotificationDescriptor) -> NotificationId {
        let id = Uuid::new_v4().to_string();
        self.state().pending.push((id.clone(), descriptor));
        id
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self, state: &State, op: BackendOp) -> Result<()> {
        if state.failing_ops.contains(&op) {
            return Err(NotifyError::backend(op.name(), "injected failure"));
        }
        Ok(())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationBackend for MemoryBackend {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn is_physical_device(&self) -> bool {
        self.physical_device
    }

    async fn permission_status(&self) -> Result<PermissionStatus> {
        let state = self.state();
        self.check(&state, BackendOp::PermissionStatus)?;
        Ok(state.permission)
    }

    async fn request_permission(&self) -> Result<PermissionStatus> {
        let mut state = self.state();
        self.check(&state, BackendOp::RequestPermission)?;
        state.permission_requests += 1;
        state.permission = state.prompt_answer;
        Ok(state.permission)
    }

    async fn set_channel(&self, channel: &ChannelConfig) -> Result<()> {
        let mut state = self.state();
        self.check(&state, BackendOp::SetChannel)?;
        state.channel_writes += 1;
        state.channels.insert(channel.id.clone(), channel.clone());
        Ok(())
    }

    async fn enqueue(&self, descriptor: &NotificationDescriptor) -> Result<NotificationId> {
        let mut state = self.state();
        self.check(&state, BackendOp::Enqueue)?;
        if state.failing_kinds.contains(&descriptor.kind) {
            return Err(NotifyError::backend("enqueue", format!("injected failure for {}", descriptor.kind)));
        }

        let id = Uuid::new_v4().to_string();
        if descriptor.trigger.is_recurring() {
            state.pending.push((id.clone(), descriptor.clone()));
        } else {
            state.delivered.push(descriptor.clone());
        }
        Ok(id)
    }

    async fn list_pending(&self) -> Result<Vec<PendingNotification>> {
        let state = self.state();
        self.check(&state, BackendOp::ListPending)?;
        Ok(state
            .pending
            .iter()
            .map(|(id, d)| PendingNotification {
                id: id.clone(),
                data: d.data.clone(),
                trigger: d.trigger,
            })
            .collect())
    }

    async fn cancel(&self, id: &str) -> Result<()> {
        let mut state = self.state();
        self.check(&state, BackendOp::Cancel)?;
        let blocked = state
            .pending
            .iter()
            .any(|(pid, d)| pid == id && state.failing_kinds.contains(&d.kind));
        if blocked {
            return Err(NotifyError::backend("cancel", format!("injected failure for {id}")));
        }
        state.pending.retain(|(pid, _)| pid != id);
        Ok(())
    }

    async fn cancel_all(&self) -> Result<()> {
        let mut state = self.state();
        self.check(&state, BackendOp::CancelAll)?;
        state.pending.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{plan_recurring, SemanticType};
    use crate::settings::NotificationSettings;

    fn daily() -> NotificationDescriptor {
        plan_recurring(SemanticType::DailyReminder, &NotificationSettings::default()).unwrap()
    }

    #[tokio::test]
    async fn recurring_notifications_stay_pending() {
        let backend = MemoryBackend::new();
        let id = backend.enqueue(&daily()).await.unwrap();

        let pending = backend.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, id);
        assert_eq!(pending[0].semantic_type(), Some(SemanticType::DailyReminder));
        assert!(backend.delivered().is_empty());
    }

    #[tokio::test]
    async fn cancel_removes_only_that_id() {
        let backend = MemoryBackend::new();
        let first = backend.enqueue(&daily()).await.unwrap();
        backend.enqueue(&daily()).await.unwrap();

        backend.cancel(&first).await.unwrap();
        backend.cancel("unknown").await.unwrap();
        assert_eq!(backend.pending_len(), 1);
    }

    #[tokio::test]
    async fn set_channel_upserts_by_id() {
        let backend = MemoryBackend::new();
        for channel in ChannelConfig::builtin() {
            backend.set_channel(&channel).await.unwrap();
            backend.set_channel(&channel).await.unwrap();
        }
        assert_eq!(backend.channels().len(), 2);
        assert_eq!(backend.channel_writes(), 4);
    }

    #[tokio::test]
    async fn injected_failures_surface_as_backend_errors() {
        let backend = MemoryBackend::new();
        backend.fail(BackendOp::ListPending);
        assert!(matches!(
            backend.list_pending().await,
            Err(NotifyError::Backend { operation: "list_pending", .. })
        ));

        backend.clear_failures();
        backend.fail_kind(SemanticType::DailyReminder);
        assert!(backend.enqueue(&daily()).await.is_err());
    }

    #[tokio::test]
    async fn prompt_answer_becomes_permission() {
        let backend = MemoryBackend::new().answering_prompt_with(PermissionStatus::Denied);
        assert_eq!(
            backend.permission_status().await.unwrap(),
            PermissionStatus::Undetermined
        );
        assert_eq!(
            backend.request_permission().await.unwrap(),
            PermissionStatus::Denied
        );
        assert_eq!(backend.permission_requests(), 1);
    }
}
