//! End-to-end notification scenarios.
//!
//! These tests drive the public service API against the in-memory OS queue
//! and a file-backed settings store, the way the app wires them at startup.

use std::sync::Arc;

use flowfocus_core::planner::messages::MOTIVATIONAL_MESSAGES;
use flowfocus_core::{
    FileStore, KeyValueStore, MemoryBackend, NotificationService, NotificationSettings,
    SemanticType, SettingKey, Trigger,
};
use proptest::prelude::*;

fn file_store(dir: &tempfile::TempDir) -> Arc<dyn KeyValueStore> {
    Arc::new(FileStore::with_dir(dir.path()))
}

fn service(backend: &Arc<MemoryBackend>, dir: &tempfile::TempDir) -> NotificationService {
    NotificationService::new(backend.clone(), file_store(dir)).with_seed(7)
}

fn recurring_counts(backend: &MemoryBackend) -> (usize, usize) {
    (
        backend.pending_of(SemanticType::DailyReminder).len(),
        backend.pending_of(SemanticType::WeeklyReport).len(),
    )
}

#[tokio::test]
async fn test_initialize_twice_matches_initialize_once() {
    let dir = tempfile::tempdir().unwrap();
    let once = Arc::new(MemoryBackend::new());
    let twice = Arc::new(MemoryBackend::new());

    service(&once, &dir).initialize().await;
    let mut svc = service(&twice, &dir);
    svc.initialize().await;
    svc.initialize().await;

    assert_eq!(recurring_counts(&once), recurring_counts(&twice));
    assert_eq!(recurring_counts(&twice), (1, 1));
}

#[tokio::test]
async fn test_restart_does_not_duplicate_recurring() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(MemoryBackend::new());

    for _ in 0..3 {
        let mut svc = service(&backend, &dir);
        svc.initialize().await;
    }

    assert_eq!(recurring_counts(&backend), (1, 1));
    assert_eq!(backend.permission_requests(), 1);
}

#[tokio::test]
async fn test_reminder_time_change_keeps_single_daily_handle() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(MemoryBackend::new());
    let mut svc = service(&backend, &dir);

    assert_eq!(svc.get_settings().reminder_time, "09:00");
    svc.initialize().await;

    let daily = backend.pending_of(SemanticType::DailyReminder);
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0].trigger, Trigger::DailyAt { hour: 9, minute: 0 });

    svc.update_reminder_time("18:30").await.unwrap();

    let daily = backend.pending_of(SemanticType::DailyReminder);
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0].trigger, Trigger::DailyAt { hour: 18, minute: 30 });
    assert_eq!(svc.get_settings().reminder_time, "18:30");
}

#[tokio::test]
async fn test_session_complete_enqueues_one_motivational_notification() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(MemoryBackend::new());
    let mut svc = service(&backend, &dir);
    svc.initialize().await;

    let settings = svc.get_settings();
    assert!(settings.session_complete && settings.motivational_messages);

    svc.on_session_complete(false).await;

    let delivered = backend.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].data["type"], serde_json::json!("session_complete"));
    assert!(!delivered[0].body.is_empty());
    assert!(MOTIVATIONAL_MESSAGES.contains(&delivered[0].body.as_str()));
}

#[tokio::test]
async fn test_settings_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(MemoryBackend::new());
    {
        let mut svc = service(&backend, &dir);
        svc.initialize().await;
        svc.update_setting(SettingKey::DailyReminders, false).await;
    }

    let mut svc = service(&backend, &dir);
    svc.initialize().await;

    assert_eq!(
        svc.get_settings(),
        NotificationSettings {
            daily_reminders: false,
            ..NotificationSettings::default()
        }
    );
    assert_eq!(recurring_counts(&backend), (0, 1));
}

#[tokio::test]
async fn test_corrupt_settings_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notification_settings.json"), "{{{").unwrap();
    let backend = Arc::new(MemoryBackend::new());

    let mut svc = service(&backend, &dir);
    assert!(svc.initialize().await);
    assert_eq!(svc.get_settings(), NotificationSettings::default());
    assert_eq!(recurring_counts(&backend), (1, 1));
}

#[tokio::test]
async fn test_reset_restores_defaults_and_rebuilds() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(MemoryBackend::new());
    let mut svc = service(&backend, &dir);
    svc.initialize().await;
    svc.update_setting(SettingKey::Enabled, false).await;
    assert_eq!(recurring_counts(&backend), (0, 0));

    svc.reset_settings().await;

    assert_eq!(svc.get_settings(), NotificationSettings::default());
    assert_eq!(recurring_counts(&backend), (1, 1));
}

#[derive(Debug, Clone)]
enum Change {
    Toggle(SettingKey, bool),
    Time(u32, u32),
}

fn change() -> impl Strategy<Value = Change> {
    prop_oneof![
        (0usize..SettingKey::ALL.len(), any::<bool>())
            .prop_map(|(i, v)| Change::Toggle(SettingKey::ALL[i], v)),
        (0u32..24, 0u32..60).prop_map(|(h, m)| Change::Time(h, m)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn reconciled_queue_matches_settings(changes in prop::collection::vec(change(), 1..12)) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let backend = Arc::new(MemoryBackend::new());
            let mut svc = service(&backend, &dir);
            svc.initialize().await;

            for change in changes {
                match change {
                    Change::Toggle(key, value) => {
                        svc.update_setting(key, value).await;
                    }
                    Change::Time(h, m) => {
                        svc.update_reminder_time(&format!("{h:02}:{m:02}")).await.unwrap();
                    }
                }

                let settings = svc.get_settings();
                let (daily, weekly) = recurring_counts(&backend);
                let want_daily = settings.enabled && settings.daily_reminders;
                let want_weekly = settings.enabled && settings.weekly_reports;
                assert_eq!(daily, usize::from(want_daily));
                assert_eq!(weekly, usize::from(want_weekly));

                if want_daily {
                    let time = settings.reminder_time();
                    assert_eq!(
                        backend.pending_of(SemanticType::DailyReminder)[0].trigger,
                        Trigger::DailyAt { hour: time.hour(), minute: time.minute() }
                    );
                }
            }
        });
    }
}
