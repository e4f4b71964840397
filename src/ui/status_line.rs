use std::time::{Duration, Instant};

use crate::surface::{NoticeLevel, Notifier};

/// How long a notice stays on screen
pub const STATUS_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
struct StatusMessage {
    text: String,
    level: NoticeLevel,
    shown_at: Instant,
}

/// Footer notice shown to the user, replaced by each new notice
#[derive(Debug, Default)]
pub struct StatusLine {
    message: Option<StatusMessage>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<(&str, NoticeLevel)> {
        self.message.as_ref().map(|m| (m.text.as_str(), m.level))
    }

    /// Drop the notice once it is older than `ttl`
    pub fn expire(&mut self, now: Instant, ttl: Duration) {
        if self
            .message
            .as_ref()
            .is_some_and(|m| now.duration_since(m.shown_at) >= ttl)
        {
            self.message = None;
        }
    }

    pub fn clear(&mut self) {
        self.message = None;
    }
}

impl Notifier for StatusLine {
    fn notify(&mut self, level: NoticeLevel, message: &str) {
        tracing::debug!(?level, %message, "notice");
        self.message = Some(StatusMessage {
            text: message.to_string(),
            level,
            shown_at: Instant::now(),
        });
    }
}
