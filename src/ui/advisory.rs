//! Transient warning shown over the chart, dismissed automatically.

use std::time::{Duration, Instant};

use egui::{Align2, Context, RichText};

use crate::ui::theme;

#[derive(Debug, Clone, PartialEq)]
pub struct Advisory {
    pub message: String,
    shown_at: Instant,
    ttl: Duration,
}

impl Advisory {
    pub fn new(message: impl Into<String>, now: Instant, ttl: Duration) -> Self {
        Self {
            message: message.into(),
            shown_at: now,
            ttl,
        }
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.ttl.saturating_sub(now.saturating_duration_since(self.shown_at))
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.remaining(now).is_zero()
    }
}

/// Replace the current advisory. Repeating the message that is already on
/// screen only restarts its timer.
pub fn post(slot: &mut Option<Advisory>, message: String, now: Instant, ttl: Duration) {
    match slot {
        Some(current) if current.message == message => current.shown_at = now,
        _ => *slot = Some(Advisory::new(message, now, ttl)),
    }
}

/// Draw the advisory (if still live) and schedule the repaint that hides it.
pub fn show(ctx: &Context, slot: &mut Option<Advisory>) {
    let now = Instant::now();
    if slot.as_ref().is_some_and(|a| a.is_expired(now)) {
        *slot = None;
    }
    let Some(advisory) = slot.as_ref() else {
        return;
    };

    egui::Area::new(egui::Id::new("advisory"))
        .anchor(Align2::CENTER_BOTTOM, [0.0, -36.0])
        .interactable(false)
        .show(ctx, |ui| {
            egui::Frame::none()
                .fill(theme::ADVISORY_BG)
                .stroke(egui::Stroke::new(1.0, theme::CONNECTOR_BROKEN))
                .rounding(egui::Rounding::same(6.0))
                .inner_margin(egui::Margin::symmetric(12.0, 6.0))
                .show(ui, |ui| {
                    ui.label(
                        RichText::new(format!(
                            "{}  {}",
                            egui_phosphor::regular::WARNING,
                            advisory.message
                        ))
                        .color(theme::TEXT_PRIMARY),
                    );
                });
        });

    ctx.request_repaint_after(advisory.remaining(now));
}
