//! Permission gate.
//!
//! Resolves whether this device may show local notifications at all, asks
//! the user at most once, and configures delivery channels once per gate.
//! Every scheduling call downstream is a silent no-op when the gate is closed.

use std::sync::Arc;

use crate::platform::{ChannelConfig, NotificationBackend, PermissionStatus, Platform};

/// OS-level capability check.
pub struct PermissionGate {
    backend: Arc<dyn NotificationBackend>,
    granted: bool,
    prompted: bool,
    channels_configured: bool,
}

impl PermissionGate {
    pub fn new(backend: Arc<dyn NotificationBackend>) -> Self {
        Self {
            backend,
            granted: false,
            prompted: false,
            channels_configured: false,
        }
    }

    /// Whether local notifications can work on this platform at all.
    pub fn is_supported(&self) -> bool {
        self.backend.platform() != Platform::Web && self.backend.is_physical_device()
    }

    /// Resolve the capability flag.
    ///
    /// Unsupported platforms return false without touching the backend. An
    /// undetermined status is prompted for once per gate; a denied status is
    /// never re-prompted. Backend failures are logged and count as denied.
    pub async fn initialize(&mut self) -> bool {
        if !self.is_supported() {
            tracing::info!(platform = ?self.backend.platform(), "local notifications not supported");
            self.granted = false;
            return false;
        }

        let status = match self.backend.permission_status().await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read notification permission");
                self.granted = false;
                return false;
            }
        };

        let status = match status {
            PermissionStatus::Undetermined if !self.prompted => {
                self.prompted = true;
                match self.backend.request_permission().await {
                    Ok(answer) => answer,
                    Err(e) => {
                        tracing::warn!(error = %e, "notification permission prompt failed");
                        PermissionStatus::Denied
                    }
                }
            }
            other => other,
        };

        self.granted = status == PermissionStatus::Granted;
        if !self.granted {
            tracing::info!(status = ?status, "notification permission not granted");
            return false;
        }

        self.configure_channels().await;
        true
    }

    /// Capability flag from the last `initialize`.
    pub fn is_granted(&self) -> bool {
        self.granted
    }

    async fn configure_channels(&mut self) {
        if self.channels_configured || !self.backend.platform().has_channels() {
            return;
        }

        let mut all_ok = true;
        for channel in ChannelConfig::builtin() {
            if let Err(e) = self.backend.set_channel(&channel).await {
                tracing::warn!(channel = %channel.id, error = %e, "failed to configure notification channel");
                all_ok = false;
            }
        }
        // Retried on the next initialize if any channel failed.
        self.channels_configured = all_ok;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{BackendOp, MemoryBackend};

    fn gate(backend: &Arc<MemoryBackend>) -> PermissionGate {
        PermissionGate::new(backend.clone())
    }

    #[tokio::test]
    async fn web_is_unsupported_and_untouched() {
        let backend = Arc::new(MemoryBackend::with_platform(Platform::Web));
        let mut gate = gate(&backend);

        assert!(!gate.initialize().await);
        assert_eq!(backend.permission_requests(), 0);
        assert!(backend.channels().is_empty());
    }

    #[tokio::test]
    async fn simulator_is_unsupported() {
        let backend = Arc::new(MemoryBackend::new().simulator());
        let mut gate = gate(&backend);
        assert!(!gate.is_supported());
        assert!(!gate.initialize().await);
        assert_eq!(backend.permission_requests(), 0);
    }

    #[tokio::test]
    async fn undetermined_prompts_once_and_configures_channels() {
        let backend = Arc::new(MemoryBackend::new());
        let mut gate = gate(&backend);

        assert!(gate.initialize().await);
        assert!(gate.is_granted());
        assert_eq!(backend.permission_requests(), 1);

        let channels = backend.channels();
        assert_eq!(channels.len(), 2);
        assert!(channels.iter().any(|c| c.id == "default" && c.name == "Flow Focus"));
        assert!(channels.iter().any(|c| c.id == "reminders" && c.name == "Daily Reminders"));
    }

    #[tokio::test]
    async fn repeated_initialize_does_not_duplicate_channels() {
        let backend = Arc::new(MemoryBackend::new());
        let mut gate = gate(&backend);

        assert!(gate.initialize().await);
        assert!(gate.initialize().await);
        assert_eq!(backend.channels().len(), 2);
        assert_eq!(backend.channel_writes(), 2);
        assert_eq!(backend.permission_requests(), 1);
    }

    #[tokio::test]
    async fn denied_prompt_is_not_retried() {
        let backend = Arc::new(MemoryBackend::new().answering_prompt_with(PermissionStatus::Denied));
        let mut gate = gate(&backend);

        assert!(!gate.initialize().await);
        assert!(!gate.initialize().await);
        assert_eq!(backend.permission_requests(), 1);
        assert!(backend.channels().is_empty());
    }

    #[tokio::test]
    async fn already_granted_skips_prompt() {
        let backend = Arc::new(MemoryBackend::new().with_permission(PermissionStatus::Granted));
        let mut gate = gate(&backend);

        assert!(gate.initialize().await);
        assert_eq!(backend.permission_requests(), 0);
    }

    #[tokio::test]
    async fn ios_has_no_channels() {
        let backend = Arc::new(
            MemoryBackend::with_platform(Platform::Ios).with_permission(PermissionStatus::Granted),
        );
        let mut gate = gate(&backend);

        assert!(gate.initialize().await);
        assert!(backend.channels().is_empty());
    }

    #[tokio::test]
    async fn backend_failure_counts_as_denied() {
        let backend = Arc::new(MemoryBackend::new());
        backend.fail(BackendOp::PermissionStatus);
        let mut gate = gate(&backend);

        assert!(!gate.initialize().await);
        assert!(!gate.is_granted());
    }

    #[tokio::test]
    async fn channel_failure_does_not_revoke_permission() {
        let backend = Arc::new(MemoryBackend::new().with_permission(PermissionStatus::Granted));
        backend.fail(BackendOp::SetChannel);
        let mut gate = gate(&backend);

        assert!(gate.initialize().await);
        assert!(backend.channels().is_empty());

        backend.clear_failures();
        assert!(gate.initialize().await);
        assert_eq!(backend.channels().len(), 2);
    }
}
