// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification fan-out per priority band.

use ao_adapters::{Notification, PluginRegistry};
use ao_config::{Config, ProjectConfig};
use ao_core::Priority;
use std::sync::Arc;

/// Routes notifications to the notifiers configured for a priority band.
///
/// Unknown notifier names and individual send failures are logged and
/// skipped; notification is always best-effort.
#[derive(Clone)]
pub struct NotificationRouter {
    config: Arc<Config>,
    registry: Arc<PluginRegistry>,
}

impl NotificationRouter {
    pub fn new(config: Arc<Config>, registry: Arc<PluginRegistry>) -> Self {
        Self { config, registry }
    }

    pub async fn notify(
        &self,
        project: &ProjectConfig,
        priority: Priority,
        title: &str,
        body: &str,
    ) {
        let names: Vec<String> = self.config.notifiers_for(project, priority).to_vec();
        self.fan_out(&names, priority, title, body).await;
    }

    /// Notify without project context (e.g. the all-complete event):
    /// routing table first, then the default notifiers.
    pub async fn notify_global(&self, priority: Priority, title: &str, body: &str) {
        let routed = self.config.notification_routing.for_priority(priority);
        let names: Vec<String> = if routed.is_empty() {
            self.config.defaults.notifiers.clone()
        } else {
            routed.to_vec()
        };
        self.fan_out(&names, priority, title, body).await;
    }

    async fn fan_out(&self, names: &[String], priority: Priority, title: &str, body: &str) {
        let notification = Notification {
            title: title.to_string(),
            body: body.to_string(),
            priority,
        };
        for name in names {
            let Some(notifier) = self.registry.notifier(name) else {
                tracing::warn!(notifier = %name, "unknown notifier, skipping");
                continue;
            };
            if let Err(e) = notifier.notify(&notification).await {
                tracing::warn!(notifier = %name, error = %e, "notification failed");
            }
        }
    }
}
