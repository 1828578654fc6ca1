//! Transient, dismissible user-facing messages for mutation outcomes.

use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: Level,
    pub title: String,
    pub description: Option<String>,
}

impl Notification {
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            title: title.into(),
            description: None,
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationId(u64);

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct ActiveNotification {
    pub id: NotificationId,
    pub notification: Notification,
    expires_at: Instant,
}

/// Holds the notifications currently on screen.
#[derive(Debug)]
pub struct NotificationCenter {
    ttl: Duration,
    next_id: u64,
    active: Vec<ActiveNotification>,
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            next_id: 1,
            active: Vec::new(),
        }
    }

    pub fn push(&mut self, notification: Notification) -> NotificationId {
        let id = NotificationId(self.next_id);
        self.next_id += 1;
        debug!(title = %notification.title, "Showing notification");
        self.active.push(ActiveNotification {
            id,
            notification,
            expires_at: Instant::now() + self.ttl,
        });
        id
    }

    /// Pulls everything already published on the channel without waiting.
    pub fn drain(&mut self, receiver: &mut broadcast::Receiver<Notification>) -> usize {
        let mut count = 0;
        loop {
            match receiver.try_recv() {
                Ok(notification) => {
                    self.push(notification);
                    count += 1;
                }
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    debug!(skipped, "Notification receiver lagged");
                }
                Err(_) => break,
            }
        }
        count
    }

    pub fn dismiss(&mut self, id: NotificationId) -> bool {
        let before = self.active.len();
        self.active.retain(|active| active.id != id);
        self.active.len() != before
    }

    /// Notifications that have not expired yet, oldest first.
    pub fn active(&mut self) -> &[ActiveNotification] {
        let now = Instant::now();
        self.active.retain(|active| active.expires_at > now);
        &self.active
    }
}
