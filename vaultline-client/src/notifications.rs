//! User-facing notification service.
//!
//! Constructed once at bootstrap and injected wherever notifications are
//! raised; the rendering surface drains it. Only user-initiated action
//! failures are required to pass through here; background synchronization
//! errors go to the log instead.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
    Success,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

/// Bounded notification buffer; the oldest entries fall off first.
#[derive(Debug)]
pub struct Notifier {
    retain: usize,
    inner: Mutex<VecDeque<Notification>>,
}

impl Notifier {
    pub fn new(retain: usize) -> Self {
        Self {
            retain,
            inner: Mutex::new(VecDeque::new()),
        }
    }

    pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        let mut inner = self.inner.lock().expect("notifier mutex poisoned");
        inner.push_back(Notification::new(level, message));
        while inner.len() > self.retain {
            inner.pop_front();
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Error, message);
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        self.inner
            .lock()
            .expect("notifier mutex poisoned")
            .iter()
            .cloned()
            .collect()
    }

    /// Remove and return everything, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        self.inner
            .lock()
            .expect("notifier mutex poisoned")
            .drain(..)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_and_drain() {
        let notifier = Notifier::new(8);
        notifier.info("one");
        notifier.error("two");

        let drained = notifier.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].level, NotificationLevel::Info);
        assert_eq!(drained[1].message, "two");
        assert!(notifier.snapshot().is_empty());
    }

    #[test]
    fn test_retention_drops_oldest() {
        let notifier = Notifier::new(2);
        notifier.info("a");
        notifier.info("b");
        notifier.info("c");

        let kept = notifier.snapshot();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].message, "b");
        assert_eq!(kept[1].message, "c");
    }
}
