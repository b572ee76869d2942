//! Inbound signals from the timer and flow-metrics collaborators.
//!
//! The background timer reports discrete session-lifecycle events and the
//! flow-metrics provider reports an intensity classification plus streak
//! counters. Neither is computed here.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::planner::messages::STREAK_MILESTONES;

/// Flow-intensity classification of the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowIntensity {
    Low,
    Medium,
    High,
}

impl fmt::Display for FlowIntensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlowIntensity::Low => "low",
            FlowIntensity::Medium => "medium",
            FlowIntensity::High => "high",
        };
        f.write_str(s)
    }
}

/// Snapshot from the flow-metrics provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowMetrics {
    pub flow_intensity: FlowIntensity,
    /// Consecutive days with at least one completed session.
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// Session-lifecycle event from the background timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Started { at: DateTime<Utc> },
    Completed { at: DateTime<Utc> },
    BreakCompleted { at: DateTime<Utc> },
}

/// Announces each streak milestone once per climb.
///
/// The first observed streak is a baseline and never announces, since it
/// may have been reached before the app started. Repeated snapshots with the
/// same streak do not re-announce; a streak that resets and climbs back to a
/// milestone does.
#[derive(Debug, Clone, Default)]
pub struct MilestoneTracker {
    last_streak: Option<u32>,
}

impl MilestoneTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `streak`; returns it if it newly reached a milestone.
    pub fn observe(&mut self, streak: u32) -> Option<u32> {
        let previous = self.last_streak.replace(streak)?;
        if previous == streak || !STREAK_MILESTONES.contains(&streak) {
            return None;
        }
        Some(streak)
    }
}
