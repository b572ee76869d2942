//! Notification preferences.
//!
//! Stores the user-facing switches that govern which notifications exist:
//! - Master switch and per-type switches
//! - Sound and vibration
//! - Wall-clock time of the daily reminder
//!
//! Serialized as camelCase JSON under the `notification_settings` key.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{NotifyError, Result};

/// Fallback daily reminder time.
pub const DEFAULT_REMINDER_TIME: &str = "09:00";

/// Notification settings singleton.
///
/// Never partial in memory: every field missing from a persisted blob falls
/// back to its default individually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub session_complete: bool,
    #[serde(default = "default_true")]
    pub break_complete: bool,
    #[serde(default = "default_true")]
    pub daily_reminders: bool,
    #[serde(default = "default_true")]
    pub weekly_reports: bool,
    #[serde(default = "default_true")]
    pub motivational_messages: bool,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default = "default_true")]
    pub vibration_enabled: bool,
    /// "HH:MM", 24-hour clock.
    #[serde(default = "default_reminder_time")]
    pub reminder_time: String,
}

fn default_true() -> bool {
    true
}
fn default_reminder_time() -> String {
    DEFAULT_REMINDER_TIME.into()
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            session_complete: true,
            break_complete: true,
            daily_reminders: true,
            weekly_reports: true,
            motivational_messages: true,
            sound_enabled: true,
            vibration_enabled: true,
            reminder_time: default_reminder_time(),
        }
    }
}

impl NotificationSettings {
    /// Build settings from a persisted JSON value, field by field.
    ///
    /// Known fields whose JSON type matches the default's type override the
    /// default. Unknown or mistyped fields are dropped. A non-object value
    /// yields the defaults.
    pub fn from_persisted(persisted: &Value) -> Self {
        let defaults = Self::default();
        let Some(overrides) = persisted.as_object() else {
            tracing::debug!("persisted notification settings are not an object, using defaults");
            return defaults;
        };

        let mut merged = match serde_json::to_value(&defaults) {
            Ok(Value::Object(map)) => map,
            _ => return defaults,
        };

        for (key, value) in overrides {
            match merged.get(key) {
                Some(existing) if same_json_type(existing, value) => {
                    merged.insert(key.clone(), value.clone());
                }
                Some(_) => {
                    tracing::debug!(field = %key, "ignoring mistyped persisted setting");
                }
                None => {
                    tracing::debug!(field = %key, "ignoring unknown persisted setting");
                }
            }
        }

        serde_json::from_value(Value::Object(merged)).unwrap_or(defaults)
    }

    /// Parsed daily reminder time, falling back to 09:00 when malformed.
    pub fn reminder_time(&self) -> ReminderTime {
        ReminderTime::parse_or_default(&self.reminder_time)
    }

    /// Read a boolean setting.
    pub fn get(&self, key: SettingKey) -> bool {
        match key {
            SettingKey::Enabled => self.enabled,
            SettingKey::SessionComplete => self.session_complete,
            SettingKey::BreakComplete => self.break_complete,
            SettingKey::DailyReminders => self.daily_reminders,
            SettingKey::WeeklyReports => self.weekly_reports,
            SettingKey::MotivationalMessages => self.motivational_messages,
            SettingKey::SoundEnabled => self.sound_enabled,
            SettingKey::VibrationEnabled => self.vibration_enabled,
        }
    }

    /// Write a boolean setting.
    pub fn set(&mut self, key: SettingKey, value: bool) {
        let slot = match key {
            SettingKey::Enabled => &mut self.enabled,
            SettingKey::SessionComplete => &mut self.session_complete,
            SettingKey::BreakComplete => &mut self.break_complete,
            SettingKey::DailyReminders => &mut self.daily_reminders,
            SettingKey::WeeklyReports => &mut self.weekly_reports,
            SettingKey::MotivationalMessages => &mut self.motivational_messages,
            SettingKey::SoundEnabled => &mut self.sound_enabled,
            SettingKey::VibrationEnabled => &mut self.vibration_enabled,
        };
        *slot = value;
    }
}

fn same_json_type(a: &Value, b: &Value) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

/// Boolean notification settings addressable by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SettingKey {
    Enabled,
    SessionComplete,
    BreakComplete,
    DailyReminders,
    WeeklyReports,
    MotivationalMessages,
    SoundEnabled,
    VibrationEnabled,
}

impl SettingKey {
    pub const ALL: [SettingKey; 8] = [
        SettingKey::Enabled,
        SettingKey::SessionComplete,
        SettingKey::BreakComplete,
        SettingKey::DailyReminders,
        SettingKey::WeeklyReports,
        SettingKey::MotivationalMessages,
        SettingKey::SoundEnabled,
        SettingKey::VibrationEnabled,
    ];

    /// Persisted (camelCase) field name.
    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::Enabled => "enabled",
            SettingKey::SessionComplete => "sessionComplete",
            SettingKey::BreakComplete => "breakComplete",
            SettingKey::DailyReminders => "dailyReminders",
            SettingKey::WeeklyReports => "weeklyReports",
            SettingKey::MotivationalMessages => "motivationalMessages",
            SettingKey::SoundEnabled => "soundEnabled",
            SettingKey::VibrationEnabled => "vibrationEnabled",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self> {
        SettingKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| NotifyError::UnknownSetting(s.to_string()))
    }
}

/// Partial settings update. `None` fields leave the current value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_complete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_complete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_reminders: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_reports: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motivational_messages: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibration_enabled: Option<bool>,
    /// Typed so an out-of-range time cannot reach storage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<ReminderTime>,
}

impl SettingsPatch {
    /// Patch touching a single boolean key.
    pub fn with(key: SettingKey, value: bool) -> Self {
        let mut patch = Self::default();
        let slot = match key {
            SettingKey::Enabled => &mut patch.enabled,
            SettingKey::SessionComplete => &mut patch.session_complete,
            SettingKey::BreakComplete => &mut patch.break_complete,
            SettingKey::DailyReminders => &mut patch.daily_reminders,
            SettingKey::WeeklyReports => &mut patch.weekly_reports,
            SettingKey::MotivationalMessages => &mut patch.motivational_messages,
            SettingKey::SoundEnabled => &mut patch.sound_enabled,
            SettingKey::VibrationEnabled => &mut patch.vibration_enabled,
        };
        *slot = Some(value);
        patch
    }

    /// Patch touching only the reminder time.
    pub fn reminder_time(time: ReminderTime) -> Self {
        Self {
            reminder_time: Some(time),
            ..Self::default()
        }
    }

    /// Merge this patch over `base`, returning the complete result.
    pub fn apply_to(&self, base: &NotificationSettings) -> NotificationSettings {
        let mut merged = base.clone();
        for key in SettingKey::ALL {
            if let Some(value) = self.get(key) {
                merged.set(key, value);
            }
        }
        if let Some(time) = self.reminder_time {
            merged.reminder_time = time.to_string();
        }
        merged
    }

    fn get(&self, key: SettingKey) -> Option<bool> {
        match key {
            SettingKey::Enabled => self.enabled,
            SettingKey::SessionComplete => self.session_complete,
            SettingKey::BreakComplete => self.break_complete,
            SettingKey::DailyReminders => self.daily_reminders,
            SettingKey::WeeklyReports => self.weekly_reports,
            SettingKey::MotivationalMessages => self.motivational_messages,
            SettingKey::SoundEnabled => self.sound_enabled,
            SettingKey::VibrationEnabled => self.vibration_enabled,
        }
    }

    /// Boolean keys present in this patch.
    pub fn touched_keys(&self) -> Vec<SettingKey> {
        SettingKey::ALL
            .into_iter()
            .filter(|key| self.get(*key).is_some())
            .collect()
    }

    pub fn touches_reminder_time(&self) -> bool {
        self.reminder_time.is_some()
    }
}

/// Wall-clock time of the daily reminder. Serialized as "HH:MM".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReminderTime {
    hour: u32,
    minute: u32,
}

impl ReminderTime {
    /// Create a reminder time, rejecting out-of-range values.
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    /// Parse "HH:MM", returning 09:00 for anything malformed or out of range.
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| {
            tracing::warn!(value = %s, "invalid reminder time, falling back to {}", DEFAULT_REMINDER_TIME);
            Self::default()
        })
    }

    pub fn hour(self) -> u32 {
        self.hour
    }

    pub fn minute(self) -> u32 {
        self.minute
    }
}

impl Default for ReminderTime {
    fn default() -> Self {
        Self { hour: 9, minute: 0 }
    }
}

impl FromStr for ReminderTime {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self> {
        let time = NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map_err(|_| NotifyError::InvalidReminderTime(s.to_string()))?;
        Ok(Self {
            hour: time.hour(),
            minute: time.minute(),
        })
    }
}

impl TryFrom<String> for ReminderTime {
    type Error = NotifyError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ReminderTime> for String {
    fn from(time: ReminderTime) -> Self {
        time.to_string()
    }
}

impl fmt::Display for ReminderTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}
