//! Schedule planner.
//!
//! Pure decision logic: maps a settings snapshot plus an event (or a
//! recurring type) to zero or one notification descriptors. No I/O happens
//! here; randomness comes from the caller's RNG so tests can seed it.

pub mod messages;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc, Weekday};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{NotifyError, Result};
use crate::flow::FlowIntensity;
use crate::platform::{DEFAULT_CHANNEL_ID, REMINDERS_CHANNEL_ID};
use crate::settings::{NotificationSettings, SettingKey};

/// Purpose tag of a notification, stored as `data.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    SessionComplete,
    BreakComplete,
    DailyReminder,
    WeeklyReport,
    GoalAchievement,
    StreakMilestone,
    BreakReminder,
}

impl SemanticType {
    pub const ALL: [SemanticType; 7] = [
        SemanticType::SessionComplete,
        SemanticType::BreakComplete,
        SemanticType::DailyReminder,
        SemanticType::WeeklyReport,
        SemanticType::GoalAchievement,
        SemanticType::StreakMilestone,
        SemanticType::BreakReminder,
    ];

    /// Types that repeat on a schedule; at most one live handle each.
    pub const RECURRING: [SemanticType; 2] = [SemanticType::DailyReminder, SemanticType::WeeklyReport];

    pub fn as_str(self) -> &'static str {
        match self {
            SemanticType::SessionComplete => "session_complete",
            SemanticType::BreakComplete => "break_complete",
            SemanticType::DailyReminder => "daily_reminder",
            SemanticType::WeeklyReport => "weekly_report",
            SemanticType::GoalAchievement => "goal_achievement",
            SemanticType::StreakMilestone => "streak_milestone",
            SemanticType::BreakReminder => "break_reminder",
        }
    }

    pub fn is_recurring(self) -> bool {
        Self::RECURRING.contains(&self)
    }

    /// Delivery channel: reminders for recurring types, default otherwise.
    pub fn channel_id(self) -> &'static str {
        if self.is_recurring() {
            REMINDERS_CHANNEL_ID
        } else {
            DEFAULT_CHANNEL_ID
        }
    }

    /// Per-type switch that gates this type in addition to the master switch.
    pub fn gating_flag(self) -> Option<SettingKey> {
        match self {
            SemanticType::SessionComplete => Some(SettingKey::SessionComplete),
            SemanticType::BreakComplete => Some(SettingKey::BreakComplete),
            SemanticType::DailyReminder => Some(SettingKey::DailyReminders),
            SemanticType::WeeklyReport => Some(SettingKey::WeeklyReports),
            SemanticType::StreakMilestone => Some(SettingKey::MotivationalMessages),
            SemanticType::GoalAchievement | SemanticType::BreakReminder => None,
        }
    }

    /// Whether `settings` allow this type at all.
    pub fn is_allowed(self, settings: &NotificationSettings) -> bool {
        settings.enabled && self.gating_flag().map_or(true, |flag| settings.get(flag))
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SemanticType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        SemanticType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown notification type: {s}"))
    }
}

/// When a notification fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    Immediate,
    DailyAt {
        hour: u32,
        minute: u32,
    },
    WeeklyAt {
        weekday: Weekday,
        hour: u32,
        minute: u32,
    },
}

impl Trigger {
    pub fn is_recurring(&self) -> bool {
        !matches!(self, Trigger::Immediate)
    }
}

/// A notification the planner wants to exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationDescriptor {
    pub kind: SemanticType,
    pub title: String,
    pub body: String,
    pub sound: bool,
    /// Always carries `type` = `kind`.
    pub data: Map<String, Value>,
    pub trigger: Trigger,
}

impl NotificationDescriptor {
    fn new(
        kind: SemanticType,
        title: impl Into<String>,
        body: impl Into<String>,
        settings: &NotificationSettings,
        trigger: Trigger,
    ) -> Self {
        let mut data = Map::new();
        data.insert("type".to_string(), json!(kind.as_str()));
        Self {
            kind,
            title: title.into(),
            body: body.into(),
            sound: settings.sound_enabled,
            data,
            trigger,
        }
    }

    fn with_data(mut self, key: &str, value: Value) -> Self {
        self.data.insert(key.to_string(), value);
        self
    }

    pub fn channel_id(&self) -> &'static str {
        self.kind.channel_id()
    }

    /// Check the recurring-trigger rule and the `data.type` tag.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDescriptor` if a one-shot type carries a recurring
    /// trigger, a recurring type fires immediately, or `data.type` is wrong.
    pub fn validate(&self) -> Result<()> {
        if self.kind.is_recurring() != self.trigger.is_recurring() {
            return Err(NotifyError::InvalidDescriptor {
                kind: self.kind,
                message: format!("trigger {:?} does not match type", self.trigger),
            });
        }
        if self.data.get("type").and_then(Value::as_str) != Some(self.kind.as_str()) {
            return Err(NotifyError::InvalidDescriptor {
                kind: self.kind,
                message: "data.type tag is missing or wrong".to_string(),
            });
        }
        Ok(())
    }
}

/// Discrete events that may produce a one-shot notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NotificationEvent {
    SessionComplete {
        is_break: bool,
        at: DateTime<Utc>,
        #[serde(default)]
        flow_intensity: Option<FlowIntensity>,
    },
    GoalAchieved {
        title: String,
    },
    StreakMilestone {
        count: u32,
    },
    BreakReminder {
        minutes: u32,
    },
}

impl NotificationEvent {
    pub fn semantic_type(&self) -> SemanticType {
        match self {
            NotificationEvent::SessionComplete { is_break: true, .. } => SemanticType::BreakComplete,
            NotificationEvent::SessionComplete { is_break: false, .. } => SemanticType::SessionComplete,
            NotificationEvent::GoalAchieved { .. } => SemanticType::GoalAchievement,
            NotificationEvent::StreakMilestone { .. } => SemanticType::StreakMilestone,
            NotificationEvent::BreakReminder { .. } => SemanticType::BreakReminder,
        }
    }
}

fn pick<'a, R: Rng + ?Sized>(choices: &'a [&'a str], rng: &mut R) -> &'a str {
    choices.choose(rng).copied().unwrap_or_default()
}

/// Plan the one-shot notification for `event`, or `None` if suppressed.
///
/// Only session-complete wording depends on `motivational_messages`; break,
/// goal and milestone copy never does. Milestones are additionally gated by
/// `motivational_messages` and fire only for whitelisted streak counts.
pub fn plan_one_shot<R: Rng + ?Sized>(
    event: &NotificationEvent,
    settings: &NotificationSettings,
    rng: &mut R,
) -> Option<NotificationDescriptor> {
    let kind = event.semantic_type();
    if !kind.is_allowed(settings) {
        return None;
    }

    let descriptor = match event {
        NotificationEvent::SessionComplete {
            is_break,
            at,
            flow_intensity,
        } => {
            let descriptor = if *is_break {
                NotificationDescriptor::new(
                    kind,
                    messages::BREAK_COMPLETE_TITLE,
                    messages::BREAK_COMPLETE_BODY,
                    settings,
                    Trigger::Immediate,
                )
            } else {
                let body = if settings.motivational_messages {
                    pick(&messages::MOTIVATIONAL_MESSAGES, rng)
                } else {
                    messages::SESSION_COMPLETE_BODY
                };
                NotificationDescriptor::new(
                    kind,
                    messages::SESSION_COMPLETE_TITLE,
                    body,
                    settings,
                    Trigger::Immediate,
                )
            };
            let descriptor = descriptor.with_data("timestamp", json!(at.timestamp_millis()));
            match flow_intensity {
                Some(intensity) => descriptor.with_data("flowIntensity", json!(intensity)),
                None => descriptor,
            }
        }
        NotificationEvent::GoalAchieved { title } => {
            let celebrations = messages::goal_celebrations(title);
            let body = celebrations
                .choose(rng)
                .cloned()
                .unwrap_or_else(|| celebrations[0].clone());
            NotificationDescriptor::new(
                kind,
                messages::GOAL_ACHIEVED_TITLE,
                body,
                settings,
                Trigger::Immediate,
            )
            .with_data("goalTitle", json!(title))
        }
        NotificationEvent::StreakMilestone { count } => {
            let body = messages::milestone_message(*count)?;
            NotificationDescriptor::new(
                kind,
                messages::STREAK_MILESTONE_TITLE,
                body,
                settings,
                Trigger::Immediate,
            )
            .with_data("streak", json!(count))
        }
        NotificationEvent::BreakReminder { minutes } => NotificationDescriptor::new(
            kind,
            messages::BREAK_REMINDER_TITLE,
            messages::break_reminder_body(*minutes),
            settings,
            Trigger::Immediate,
        )
        .with_data("duration", json!(minutes)),
    };

    Some(descriptor)
}

/// Plan the recurring notification for `kind`, or `None` if it should not exist.
///
/// Non-recurring types always yield `None`.
pub fn plan_recurring(kind: SemanticType, settings: &NotificationSettings) -> Option<NotificationDescriptor> {
    if !kind.is_recurring() || !kind.is_allowed(settings) {
        return None;
    }

    match kind {
        SemanticType::DailyReminder => {
            let time = settings.reminder_time();
            Some(NotificationDescriptor::new(
                kind,
                messages::DAILY_REMINDER_TITLE,
                messages::DAILY_REMINDER_BODY,
                settings,
                Trigger::DailyAt {
                    hour: time.hour(),
                    minute: time.minute(),
                },
            ))
        }
        SemanticType::WeeklyReport => Some(NotificationDescriptor::new(
            kind,
            messages::WEEKLY_REPORT_TITLE,
            messages::WEEKLY_REPORT_BODY,
            settings,
            Trigger::WeeklyAt {
                weekday: Weekday::Mon,
                hour: 9,
                minute: 0,
            },
        )),
        _ => None,
    }
}
