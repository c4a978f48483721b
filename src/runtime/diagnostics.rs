use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::json;

use crate::logging::{LogLevel, Logger, TARGET_METRICS, event_with_fields, json_kv};
use crate::metrics::LayoutMetrics;

use super::observer::{ChangePhase, LayoutChange, LayoutObserver, PhaseEvent};

const TARGET_LIFECYCLE: &str = "gridboard::lifecycle";

/// Logs gesture phases and committed layouts for debugging.
pub struct LifecycleLogger {
    logger: Logger,
    level: LogLevel,
    log_moves: bool,
    log_items: bool,
}

impl LifecycleLogger {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            level: LogLevel::Debug,
            log_moves: false,
            log_items: false,
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Also log every `dragging`/`resizing` step. Noisy.
    pub fn log_moves(mut self, enabled: bool) -> Self {
        self.log_moves = enabled;
        self
    }

    /// Attach the full item list to `layout_changed` events.
    pub fn log_items(mut self, enabled: bool) -> Self {
        self.log_items = enabled;
        self
    }

    fn emit(&self, message: &str, fields: impl IntoIterator<Item = (String, serde_json::Value)>) {
        let event = event_with_fields(self.level, TARGET_LIFECYCLE, message, fields);
        let _ = self.logger.log_event(event);
    }
}

impl LayoutObserver for LifecycleLogger {
    fn name(&self) -> &str {
        "diagnostics.lifecycle_logger"
    }

    fn on_phase(&mut self, event: &PhaseEvent) {
        if !self.log_moves && matches!(event.phase, ChangePhase::Dragging | ChangePhase::Resizing) {
            return;
        }
        self.emit(
            "phase",
            [
                json_kv("item", event.item.as_str()),
                json_kv("phase", event.phase.as_str()),
                json_kv(
                    "offset",
                    json!({
                        "left": event.offset.left,
                        "top": event.offset.top,
                        "width": event.offset.width,
                        "height": event.offset.height,
                    }),
                ),
            ],
        );
    }

    fn on_layout_change(&mut self, change: &LayoutChange) {
        let mut fields = vec![
            json_kv("items", change.items.len()),
            json_kv("changed", change.changed),
            json_kv("digest", change.digest.to_hex().as_str()),
        ];
        if self.log_items {
            fields.push(json_kv(
                "layout",
                serde_json::to_value(&change.items).unwrap_or_default(),
            ));
        }
        self.emit("layout_changed", fields);
    }
}

/// Emits metrics snapshots when layouts commit, at most once per interval.
pub struct MetricsSnapshotObserver {
    logger: Logger,
    metrics: Arc<Mutex<LayoutMetrics>>,
    target: String,
    interval: Duration,
    last_emit: Option<Instant>,
    started_at: Instant,
}

impl MetricsSnapshotObserver {
    pub fn new(logger: Logger, metrics: Arc<Mutex<LayoutMetrics>>) -> Self {
        Self {
            logger,
            metrics,
            target: TARGET_METRICS.to_string(),
            interval: Duration::from_secs(5),
            last_emit: None,
            started_at: Instant::now(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    fn emit_snapshot(&mut self) {
        let now = Instant::now();
        if let Some(last) = self.last_emit {
            if now.duration_since(last) < self.interval {
                return;
            }
        }

        self.last_emit = Some(now);
        let uptime = now.duration_since(self.started_at);

        if let Ok(guard) = self.metrics.lock() {
            let event = guard.snapshot(uptime).to_log_event(&self.target);
            let _ = self.logger.log_event(event);
        }
    }
}

impl LayoutObserver for MetricsSnapshotObserver {
    fn name(&self) -> &str {
        "diagnostics.metrics_snapshot"
    }

    fn on_layout_change(&mut self, _change: &LayoutChange) {
        self.emit_snapshot();
    }
}
