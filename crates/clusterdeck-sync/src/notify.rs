//! Notification relay between the core and whatever renders toasts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use clusterdeck_api::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

/// One user-facing notification. `timeout` of `None` means the notice
/// stays until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub details: Option<String>,
    pub timeout: Option<Duration>,
}

/// What the UI receives over the channel: either a notice to show, or
/// the signal that an earlier unreachable notice can come down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeEvent {
    Posted(Notice),
    UnreachableCleared,
}

/// Pushes notices over an mpsc channel to a single consumer.
///
/// Unreachable-server notices are deduplicated: while one is active no
/// further ones are emitted, and the next successful request of any kind
/// re-arms the dedup. `Unauthorized` failures never produce a notice;
/// they flip a session-wide forced-logout flag instead.
pub struct Notifier {
    tx: mpsc::UnboundedSender<NoticeEvent>,
    unreachable_active: AtomicBool,
    forced_logout: AtomicBool,
    success_timeout: Duration,
}

impl Notifier {
    pub fn new(success_timeout: Duration) -> (Self, mpsc::UnboundedReceiver<NoticeEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                unreachable_active: AtomicBool::new(false),
                forced_logout: AtomicBool::new(false),
                success_timeout,
            },
            rx,
        )
    }

    pub fn success(&self, title: impl Into<String>, message: impl Into<String>) {
        self.request_succeeded();
        self.push(Notice {
            severity: Severity::Success,
            title: title.into(),
            message: message.into(),
            details: None,
            timeout: Some(self.success_timeout),
        });
    }

    /// Routes a failure to the right surface.
    pub fn failure(&self, title: impl Into<String>, err: &ApiError) {
        match err {
            ApiError::Unauthorized => {
                self.forced_logout.store(true, Ordering::SeqCst);
            }
            ApiError::Unreachable { .. } => {
                if self.unreachable_active.swap(true, Ordering::SeqCst) {
                    debug!("suppressing duplicate unreachable notice");
                    return;
                }
                self.push(Notice {
                    severity: Severity::Error,
                    title: title.into(),
                    message: err.message(),
                    details: None,
                    timeout: None,
                });
            }
            _ => {
                self.push(Notice {
                    severity: Severity::Error,
                    title: title.into(),
                    message: err.message(),
                    details: err.details().map(|d| d.to_string()),
                    timeout: None,
                });
            }
        }
    }

    /// Any successful request re-arms the unreachable dedup and tells
    /// the consumer to take the standing notice down.
    pub fn request_succeeded(&self) {
        if self.unreachable_active.swap(false, Ordering::SeqCst) {
            if self.tx.send(NoticeEvent::UnreachableCleared).is_err() {
                debug!("clear signal dropped, consumer is gone");
            }
        }
    }

    pub fn unreachable_active(&self) -> bool {
        self.unreachable_active.load(Ordering::SeqCst)
    }

    pub fn forced_logout(&self) -> bool {
        self.forced_logout.load(Ordering::SeqCst)
    }

    fn push(&self, notice: Notice) {
        if self.tx.send(NoticeEvent::Posted(notice)).is_err() {
            debug!("notice dropped, consumer is gone");
        }
    }
}
