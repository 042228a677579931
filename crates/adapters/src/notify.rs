// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification adapter.

use ao_core::Priority;
use async_trait::async_trait;
use thiserror::Error;

/// Errors from notify operations.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// A human-facing notification.
#[derive(Debug, Clone)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub priority: Priority,
}

/// Adapter for sending notifications.
#[async_trait]
pub trait NotifyAdapter: Send + Sync + 'static {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Desktop notification adapter using notify-rust.
///
/// On macOS, `notify-rust` uses `mac-notification-sys` (Cocoa bindings) to
/// deliver via the Notification Center. The first notification triggers
/// `ensure_application_set()` which runs an AppleScript to look up a bundle
/// identifier; in a daemon without Automation permissions that AppleScript
/// blocks forever, so the bundle identifier is pre-set at construction time.
#[derive(Clone, Copy, Debug, Default)]
pub struct DesktopNotify;

impl DesktopNotify {
    pub fn new() -> Self {
        #[cfg(target_os = "macos")]
        {
            let _ = mac_notification_sys::set_application("com.apple.Terminal");
        }
        Self
    }
}

#[async_trait]
impl NotifyAdapter for DesktopNotify {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let title = format!("[{}] {}", notification.priority, notification.title);
        let body = notification.body.clone();
        // Notification::show() is synchronous on macOS. Fire-and-forget on
        // tokio's bounded blocking pool so the poll loop never waits on the
        // notification daemon.
        tokio::task::spawn_blocking(move || {
            match notify_rust::Notification::new().summary(&title).body(&body).show() {
                Ok(_) => tracing::debug!(%title, "desktop notification sent"),
                Err(e) => tracing::warn!(%title, error = %e, "desktop notification failed"),
            }
        });
        Ok(())
    }
}
