//! Handling of delivered notifications.
//!
//! Maps a tapped notification's `data.type` to the screen the app should
//! open, and decides how notifications present while the app is foregrounded.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::planner::SemanticType;
use crate::settings::NotificationSettings;

/// Where to go after the user taps a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ResponseAction {
    OpenTimer,
    ShowAchievement { detail: Option<String> },
    OpenReport,
}

/// Route a tapped notification by its payload. Unknown payloads route nowhere.
pub fn route_response(data: &Map<String, Value>) -> Option<ResponseAction> {
    let kind: SemanticType = data.get("type")?.as_str()?.parse().ok()?;

    let action = match kind {
        SemanticType::SessionComplete
        | SemanticType::BreakComplete
        | SemanticType::DailyReminder
        | SemanticType::BreakReminder => ResponseAction::OpenTimer,
        SemanticType::GoalAchievement => ResponseAction::ShowAchievement {
            detail: data.get("goalTitle").and_then(Value::as_str).map(str::to_string),
        },
        SemanticType::StreakMilestone => ResponseAction::ShowAchievement {
            detail: data
                .get("streak")
                .and_then(Value::as_u64)
                .map(|streak| format!("{streak}-day streak")),
        },
        SemanticType::WeeklyReport => ResponseAction::OpenReport,
    };

    tracing::debug!(kind = %kind, action = ?action, "routing notification response");
    Some(action)
}

/// How a notification presents while the app is in the foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationOptions {
    pub show_alert: bool,
    pub show_banner: bool,
    pub show_list: bool,
    pub play_sound: bool,
    pub set_badge: bool,
}

impl PresentationOptions {
    pub fn for_settings(settings: &NotificationSettings) -> Self {
        Self {
            show_alert: true,
            show_banner: true,
            show_list: true,
            play_sound: settings.sound_enabled,
            set_badge: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn timer_types_open_timer() {
        for kind in ["session_complete", "break_complete", "daily_reminder", "break_reminder"] {
            assert_eq!(
                route_response(&data(json!({ "type": kind }))),
                Some(ResponseAction::OpenTimer)
            );
        }
    }

    #[test]
    fn achievements_carry_detail() {
        assert_eq!(
            route_response(&data(json!({ "type": "goal_achievement", "goalTitle": "Write book" }))),
            Some(ResponseAction::ShowAchievement {
                detail: Some("Write book".into())
            })
        );
        assert_eq!(
            route_response(&data(json!({ "type": "streak_milestone", "streak": 30 }))),
            Some(ResponseAction::ShowAchievement {
                detail: Some("30-day streak".into())
            })
        );
    }

    #[test]
    fn weekly_report_opens_report() {
        assert_eq!(
            route_response(&data(json!({ "type": "weekly_report" }))),
            Some(ResponseAction::OpenReport)
        );
    }

    #[test]
    fn unknown_payloads_route_nowhere() {
        assert_eq!(route_response(&data(json!({}))), None);
        assert_eq!(route_response(&data(json!({ "type": "promo" }))), None);
        assert_eq!(route_response(&data(json!({ "type": 3 }))), None);
    }

    #[test]
    fn presentation_follows_sound_setting() {
        let quiet = NotificationSettings {
            sound_enabled: false,
            ..NotificationSettings::default()
        };
        assert!(!PresentationOptions::for_settings(&quiet).play_sound);
        assert!(PresentationOptions::for_settings(&NotificationSettings::default()).play_sound);
    }
}
