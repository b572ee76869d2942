//! Notification copy.

pub const SESSION_COMPLETE_TITLE: &str = "Focus Session Complete! 🎯";
pub const SESSION_COMPLETE_BODY: &str = "Time for a well-deserved break!";

pub const MOTIVATIONAL_MESSAGES: [&str; 5] = [
    "🎉 Amazing work! You're building incredible focus habits!",
    "🔥 You're on fire! That focus session was fantastic!",
    "⭐ Excellent! You're becoming a productivity master!",
    "🚀 Outstanding focus! You're reaching new heights!",
    "💪 Incredible dedication! Your consistency is inspiring!",
];

pub const BREAK_COMPLETE_TITLE: &str = "Break Complete! 🌟";
pub const BREAK_COMPLETE_BODY: &str = "Ready to dive back into deep work?";

pub const BREAK_REMINDER_TITLE: &str = "Break Time! ☕";

pub const DAILY_REMINDER_TITLE: &str = "Time to Focus! 🎯";
pub const DAILY_REMINDER_BODY: &str = "Start your day with a productive focus session.";

pub const WEEKLY_REPORT_TITLE: &str = "Weekly Focus Report 📊";
pub const WEEKLY_REPORT_BODY: &str = "Check out your productivity insights for this week!";

pub const GOAL_ACHIEVED_TITLE: &str = "Goal Achieved! 🎯";

pub const STREAK_MILESTONE_TITLE: &str = "Streak Milestone! 🔥";

/// Streak counts that earn a notification.
pub const STREAK_MILESTONES: [u32; 6] = [3, 7, 14, 30, 50, 100];

pub fn break_reminder_body(minutes: u32) -> String {
    format!("Take a {minutes}-minute break to recharge your mind.")
}

/// Celebration variants for a completed goal.
pub fn goal_celebrations(title: &str) -> [String; 4] {
    [
        format!("🏆 Goal achieved! \"{title}\" - You're unstoppable!"),
        format!("🎉 Congratulations! You've completed \"{title}\"!"),
        format!("⭐ Amazing! \"{title}\" is now complete!"),
        format!("🚀 Goal unlocked! \"{title}\" - Keep soaring!"),
    ]
}

/// Body text for a whitelisted streak count.
pub fn milestone_message(count: u32) -> Option<&'static str> {
    match count {
        3 => Some("🔥 3-day streak! You're building momentum!"),
        7 => Some("⭐ One week strong! Your consistency is paying off!"),
        14 => Some("🚀 Two weeks of focus! You're developing incredible habits!"),
        30 => Some("🏆 30-day streak! You're a focus champion!"),
        50 => Some("💎 50 days! Your dedication is truly inspiring!"),
        100 => Some("👑 100-day streak! You're a productivity legend!"),
        _ => None,
    }
}
