// Copyright 2025 the AirAware Desktop authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! User-facing notification toasts.
//!
//! Short, non-blocking, auto-dismissing messages drawn over the map:
//! credential validation errors, search errors, fetch warnings (empty data),
//! and fetch errors (request failed).

use chrono::{DateTime, Utc};
use eframe::egui;

/// How long a notification stays on screen
const DISMISS_AFTER_SECONDS: i64 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Warning,
    Error,
}

impl NotificationLevel {
    fn background(self) -> egui::Color32 {
        match self {
            NotificationLevel::Warning => egui::Color32::from_rgb(255, 200, 100),
            NotificationLevel::Error => egui::Color32::from_rgb(220, 50, 50),
        }
    }

    fn foreground(self) -> egui::Color32 {
        match self {
            NotificationLevel::Warning => egui::Color32::from_rgb(40, 30, 0),
            NotificationLevel::Error => egui::Color32::WHITE,
        }
    }
}

/// One timestamped message
#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Collects notifications and draws the live ones as stacked bubbles.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    entries: Vec<Notification>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.entries.push(Notification {
            level,
            message: message.into(),
            created_at: Utc::now(),
        });
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(NotificationLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(NotificationLevel::Error, message);
    }

    /// Drop entries past their display window
    pub fn prune(&mut self) {
        let now = Utc::now();
        self.entries
            .retain(|n| (now - n.created_at).num_seconds() < DISMISS_AFTER_SECONDS);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[Notification] {
        &self.entries
    }

    /// Paint live notifications as stacked bubbles at the top center.
    pub fn draw(&self, ctx: &egui::Context) {
        if self.entries.is_empty() {
            return;
        }

        let screen = ctx.screen_rect();
        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Foreground,
            egui::Id::new("notification_toasts"),
        ));

        let mut y = screen.top() + 24.0;
        for notification in &self.entries {
            let pos = egui::pos2(screen.center().x, y);
            let galley = painter.layout_no_wrap(
                notification.message.clone(),
                egui::FontId::proportional(12.0),
                notification.level.foreground(),
            );

            let padding = egui::vec2(12.0, 6.0);
            let bubble = egui::Rect::from_center_size(pos, galley.size() + padding * 2.0);
            painter.rect_filled(bubble, 5.0, notification.level.background());
            painter.text(
                pos,
                egui::Align2::CENTER_CENTER,
                &notification.message,
                egui::FontId::proportional(12.0),
                notification.level.foreground(),
            );

            y += bubble.height() + 6.0;
        }
    }
}
