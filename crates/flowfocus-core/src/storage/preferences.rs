//! Preference store for notification settings.
//!
//! Owns the in-memory settings snapshot and the persisted JSON blob behind it.
//! Reads never fail: absent or corrupt data yields defaults. Writes only touch
//! the in-memory snapshot once the persisted copy has been replaced.

use std::sync::Arc;

use serde_json::Value;

use super::KeyValueStore;
use crate::error::Result;
use crate::settings::{NotificationSettings, SettingsPatch};

/// Fixed storage key of the settings blob.
pub const NOTIFICATION_SETTINGS_KEY: &str = "notification_settings";

/// Durable record of notification settings.
pub struct PreferenceStore {
    kv: Arc<dyn KeyValueStore>,
    current: NotificationSettings,
}

impl PreferenceStore {
    /// Create a store holding defaults until `load` is called.
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            current: NotificationSettings::default(),
        }
    }

    /// Load persisted settings, merged field by field over the defaults.
    ///
    /// Read and parse failures are logged and yield the defaults.
    pub fn load(&mut self) -> NotificationSettings {
        self.current = match self.kv.get(NOTIFICATION_SETTINGS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Value>(&raw) {
                Ok(value) => NotificationSettings::from_persisted(&value),
                Err(e) => {
                    tracing::warn!(error = %e, "corrupt notification settings, using defaults");
                    NotificationSettings::default()
                }
            },
            Ok(None) => {
                tracing::debug!("no persisted notification settings, using defaults");
                NotificationSettings::default()
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to read notification settings, using defaults");
                NotificationSettings::default()
            }
        };
        self.current.clone()
    }

    /// Merge `patch` over the current settings and persist the full result.
    ///
    /// # Errors
    ///
    /// Returns an error if the merged settings cannot be written. The
    /// in-memory snapshot is left untouched in that case.
    pub fn save(&mut self, patch: &SettingsPatch) -> Result<NotificationSettings> {
        let merged = patch.apply_to(&self.current);
        self.persist(&merged)?;
        self.current = merged;
        Ok(self.current.clone())
    }

    /// Overwrite the persisted settings with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the defaults cannot be written.
    pub fn reset(&mut self) -> Result<NotificationSettings> {
        let defaults = NotificationSettings::default();
        self.persist(&defaults)?;
        self.current = defaults;
        Ok(self.current.clone())
    }

    /// Current in-memory snapshot.
    pub fn get(&self) -> &NotificationSettings {
        &self.current
    }

    fn persist(&self, settings: &NotificationSettings) -> Result<()> {
        let content = serde_json::to_string(settings)?;
        self.kv.set(NOTIFICATION_SETTINGS_KEY, &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingKey;
    use crate::storage::{FileStore, MemoryStore};

    fn memory_store(kv: MemoryStore) -> (Arc<MemoryStore>, PreferenceStore) {
        let kv = Arc::new(kv);
        let store = PreferenceStore::new(kv.clone());
        (kv, store)
    }

    #[test]
    fn load_without_persisted_data_returns_defaults() {
        let (_, mut store) = memory_store(MemoryStore::new());
        assert_eq!(store.load(), NotificationSettings::default());
    }

    #[test]
    fn load_corrupt_blob_returns_defaults() {
        let (_, mut store) =
            memory_store(MemoryStore::new().with_entry(NOTIFICATION_SETTINGS_KEY, "{not json"));
        assert_eq!(store.load(), NotificationSettings::default());
    }

    #[test]
    fn load_read_failure_returns_defaults() {
        let kv = MemoryStore::new().with_entry(NOTIFICATION_SETTINGS_KEY, r#"{"enabled":false}"#);
        kv.set_fail_reads(true);
        let (_, mut store) = memory_store(kv);
        assert_eq!(store.load(), NotificationSettings::default());
    }

    #[test]
    fn load_merges_partial_blob() {
        let (_, mut store) = memory_store(
            MemoryStore::new().with_entry(NOTIFICATION_SETTINGS_KEY, r#"{"weeklyReports":false}"#),
        );
        let loaded = store.load();
        assert!(!loaded.weekly_reports);
        assert!(loaded.daily_reminders);
        assert_eq!(loaded.reminder_time, "09:00");
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let kv: Arc<dyn KeyValueStore> = Arc::new(FileStore::with_dir(dir.path()));

        let mut store = PreferenceStore::new(kv.clone());
        store.load();
        store
            .save(&SettingsPatch::with(SettingKey::DailyReminders, false))
            .unwrap();

        let mut reopened = PreferenceStore::new(kv);
        let loaded = reopened.load();
        assert_eq!(
            loaded,
            NotificationSettings {
                daily_reminders: false,
                ..NotificationSettings::default()
            }
        );
    }

    #[test]
    fn save_updates_snapshot_immediately() {
        let (_, mut store) = memory_store(MemoryStore::new());
        store.load();
        store
            .save(&SettingsPatch::with(SettingKey::SoundEnabled, false))
            .unwrap();
        assert!(!store.get().sound_enabled);
    }

    #[test]
    fn failed_save_keeps_prior_state() {
        let (kv, mut store) = memory_store(MemoryStore::new());
        store.load();
        store
            .save(&SettingsPatch::with(SettingKey::WeeklyReports, false))
            .unwrap();
        let persisted_before = kv.raw(NOTIFICATION_SETTINGS_KEY);

        kv.set_fail_writes(true);
        let result = store.save(&SettingsPatch::with(SettingKey::Enabled, false));

        assert!(result.is_err());
        assert!(store.get().enabled);
        assert!(!store.get().weekly_reports);
        assert_eq!(kv.raw(NOTIFICATION_SETTINGS_KEY), persisted_before);
    }

    #[test]
    fn saves_accumulate() {
        let (_, mut store) = memory_store(MemoryStore::new());
        store.load();
        store
            .save(&SettingsPatch::with(SettingKey::DailyReminders, false))
            .unwrap();
        let after = store
            .save(&SettingsPatch::with(SettingKey::VibrationEnabled, false))
            .unwrap();
        assert!(!after.daily_reminders);
        assert!(!after.vibration_enabled);
    }

    #[test]
    fn reset_restores_defaults() {
        let (kv, mut store) = memory_store(MemoryStore::new());
        store.load();
        store
            .save(&SettingsPatch::with(SettingKey::Enabled, false))
            .unwrap();
        store.reset().unwrap();

        assert_eq!(store.get(), &NotificationSettings::default());
        let raw = kv.raw(NOTIFICATION_SETTINGS_KEY).unwrap();
        let persisted: NotificationSettings = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted, NotificationSettings::default());
    }
}
