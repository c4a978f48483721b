use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::time::Duration;

/// Counters for one layout container.
#[derive(Debug, Default, Clone)]
pub struct LayoutMetrics {
    frames: u64,
    reflows: u64,
    items_placed: u64,
    gestures_started: u64,
    gestures_cancelled: u64,
    autoscroll_ticks: u64,
    layout_changes: u64,
}

impl LayoutMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame(&mut self) {
        self.frames = self.frames.saturating_add(1);
    }

    pub fn record_reflow(&mut self, items: usize) {
        self.reflows = self.reflows.saturating_add(1);
        self.items_placed = self.items_placed.saturating_add(items as u64);
    }

    pub fn record_gesture_started(&mut self) {
        self.gestures_started = self.gestures_started.saturating_add(1);
    }

    pub fn record_gesture_cancelled(&mut self) {
        self.gestures_cancelled = self.gestures_cancelled.saturating_add(1);
    }

    pub fn record_autoscroll_tick(&mut self) {
        self.autoscroll_ticks = self.autoscroll_ticks.saturating_add(1);
    }

    pub fn record_layout_change(&mut self) {
        self.layout_changes = self.layout_changes.saturating_add(1);
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            frames: self.frames,
            reflows: self.reflows,
            items_placed: self.items_placed,
            gestures_started: self.gestures_started,
            gestures_cancelled: self.gestures_cancelled,
            autoscroll_ticks: self.autoscroll_ticks,
            layout_changes: self.layout_changes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub frames: u64,
    pub reflows: u64,
    pub items_placed: u64,
    pub gestures_started: u64,
    pub gestures_cancelled: u64,
    pub autoscroll_ticks: u64,
    pub layout_changes: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "layout_metrics", self.as_fields())
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        map.insert("frames".to_string(), json!(self.frames));
        map.insert("reflows".to_string(), json!(self.reflows));
        map.insert("items_placed".to_string(), json!(self.items_placed));
        map.insert("gestures_started".to_string(), json!(self.gestures_started));
        map.insert(
            "gestures_cancelled".to_string(),
            json!(self.gestures_cancelled),
        );
        map.insert("autoscroll_ticks".to_string(), json!(self.autoscroll_ticks));
        map.insert("layout_changes".to_string(), json!(self.layout_changes));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::TARGET_METRICS;

    #[test]
    fn snapshot_reports_counters() {
        let mut metrics = LayoutMetrics::new();
        metrics.record_frame();
        metrics.record_reflow(3);
        metrics.record_reflow(2);
        metrics.record_gesture_started();
        let snapshot = metrics.snapshot(Duration::from_millis(1500));
        assert_eq!(snapshot.reflows, 2);
        assert_eq!(snapshot.items_placed, 5);

        let event = snapshot.to_log_event(TARGET_METRICS);
        assert_eq!(event.message, "layout_metrics");
        assert_eq!(event.fields["uptime_ms"], 1500);
        assert_eq!(event.fields["gestures_started"], 1);
    }
}
