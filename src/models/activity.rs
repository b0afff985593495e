// src/models/activity.rs

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of entries kept in the activity log.
pub const ACTIVITY_CAPACITY: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityIcon {
    Note,
    Flashcard,
    Exam,
    Result,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub text: String,
    pub icon: ActivityIcon,
    pub timestamp: DateTime<Utc>,
}

/// Fixed-capacity activity log. Pushing onto a full log evicts the oldest entry.
///
/// Serialized as a plain array, oldest first. Loading an oversized array keeps
/// only the most recent `ACTIVITY_CAPACITY` entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Activity>", into = "Vec<Activity>")]
pub struct ActivityLog {
    entries: VecDeque<Activity>,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self {
            entries: VecDeque::with_capacity(ACTIVITY_CAPACITY),
        }
    }
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, activity: Activity) {
        if self.entries.len() == ACTIVITY_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(activity);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Activity> {
        self.entries.iter()
    }

    /// Newest first, as shown in the "recent activity" panel.
    pub fn recent(&self, limit: usize) -> Vec<&Activity> {
        self.entries.iter().rev().take(limit).collect()
    }
}

impl From<Vec<Activity>> for ActivityLog {
    fn from(items: Vec<Activity>) -> Self {
        let mut log = ActivityLog::new();
        for item in items {
            log.push(item);
        }
        log
    }
}

impl From<ActivityLog> for Vec<Activity> {
    fn from(log: ActivityLog) -> Self {
        log.entries.into_iter().collect()
    }
}
