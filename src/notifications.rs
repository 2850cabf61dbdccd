use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
    pub expires_at: DateTime<Utc>,
}

/// Toasts that expire on their own. Expired entries are hidden on read and
/// dropped by [`NotificationQueue::sweep`].
#[derive(Debug)]
pub struct NotificationQueue {
    ttl: chrono::Duration,
    next_id: u64,
    entries: Vec<Notification>,
}

impl NotificationQueue {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::seconds(3)),
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, message: impl Into<String>, kind: NotificationKind) -> u64 {
        self.push_at(message, kind, Utc::now())
    }

    pub fn push_at(
        &mut self,
        message: impl Into<String>,
        kind: NotificationKind,
        now: DateTime<Utc>,
    ) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.entries.push(Notification {
            id,
            message: message.into(),
            kind,
            expires_at: now + self.ttl,
        });
        id
    }

    pub fn active(&self) -> Vec<Notification> {
        self.active_at(Utc::now())
    }

    pub fn active_at(&self, now: DateTime<Utc>) -> Vec<Notification> {
        self.entries
            .iter()
            .filter(|n| n.expires_at > now)
            .cloned()
            .collect()
    }

    /// Drops expired entries and returns how many went.
    pub fn sweep(&mut self) -> usize {
        self.sweep_at(Utc::now())
    }

    pub fn sweep_at(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|n| n.expires_at > now);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
