use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use blake3::Hash;

use crate::config::GridConfig;
use crate::error::Result;
use crate::geometry::{GridPosition, PixelRect, Rect, ScrollPosition};
use crate::gesture::{GestureEvent, HandleKind, PointerEnd, PointerInput, PointerMove};
use crate::layout::{GridCoordinator, ScreenSize};
use crate::logging::{
    LogLevel, Logger, TARGET_AUTOSCROLL, TARGET_CONTAINER, TARGET_GESTURE, TARGET_METRICS,
    event_with_fields, json_kv,
};
use crate::metrics::LayoutMetrics;
use crate::registry::{Item, ItemId, ItemPatch, ItemSpec, LayoutItem, LayoutService, ListenerHost};
use crate::render::{GridMetrics, GridStyler, StyleTarget, Styler};

pub mod autoscroll;
pub mod diagnostics;
pub mod drag;
pub mod driver;
pub mod observer;
pub mod scheduler;

use autoscroll::{AutoScroller, SafeZone, ScrollDirection, ScrollMetrics};
use drag::{PositionOffset, ShiftTargets, calculate_new_position};
use observer::{ChangePhase, LayoutChange, LayoutObserver, PhaseEvent};
use scheduler::FrameScheduler;

/// Runtime knobs that are not part of the persisted grid configuration.
#[derive(Clone)]
pub struct ContainerOptions {
    /// Optional structured logger used by the container.
    pub logger: Option<Logger>,
    /// Metrics accumulator used for periodic snapshots.
    pub metrics: Option<Arc<Mutex<LayoutMetrics>>>,
    /// Interval between metrics snapshot emissions. Zero disables snapshots.
    pub metrics_interval: Duration,
    /// Target field used when emitting metrics snapshots.
    pub metrics_target: String,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            logger: None,
            metrics: None,
            metrics_interval: Duration::from_secs(5),
            metrics_target: TARGET_METRICS.to_string(),
        }
    }
}

impl ContainerOptions {
    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(LayoutMetrics::new())));
        }
    }

    pub fn disable_metrics(&mut self) {
        self.metrics = None;
    }

    /// Access the shared metrics handle if metrics are enabled.
    pub fn metrics_handle(&self) -> Option<Arc<Mutex<LayoutMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}

/// Whether an input was taken by the container.
///
/// `Consumed` means the host must stop propagating the event so no ancestor
/// starts a second gesture for the same pointer sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFlow {
    Continue,
    Consumed,
}

/// What one animation frame did.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameReport {
    pub reflowed: bool,
    /// Vertical scroll the host must apply to the scroll node this frame.
    pub scroll_by: Option<f64>,
}

#[derive(Debug, Clone)]
struct ActiveGesture {
    item: ItemId,
    handle: HandleKind,
    started: bool,
    /// Client frame of the item when the drag started.
    frame: PixelRect,
    anchor: GridPosition,
    offset: PositionOffset,
    targets: ShiftTargets,
    /// Last position shown by the placeholder.
    tentative: Option<GridPosition>,
}

/// Lays out dashboard items on a responsive grid and drives drag/resize.
///
/// The host forwards viewport, scroll and pointer input, calls
/// [`on_animation_frame`](Self::on_animation_frame) once per frame, and
/// receives positions through its [`Styler`] and committed layouts through
/// registered [`LayoutObserver`]s.
pub struct LayoutContainer<S: Styler = GridStyler> {
    config: GridConfig,
    options: ContainerOptions,
    service: LayoutService,
    styler: S,
    observers: Vec<Box<dyn LayoutObserver>>,
    coordinator: GridCoordinator,
    screen: ScreenSize,
    cols: u16,
    metrics: GridMetrics,
    container_rect: PixelRect,
    scroll: ScrollMetrics,
    autoscroll: AutoScroller,
    scheduler: FrameScheduler,
    items: Vec<ItemId>,
    editable: bool,
    gesture: Option<ActiveGesture>,
    placeholder_visible: bool,
    first_layout: bool,
    last_digest: Option<Hash>,
    started_at: Instant,
    last_metrics_emit: Option<Instant>,
}

impl LayoutContainer<GridStyler> {
    pub fn with_grid_styler(config: GridConfig) -> Result<Self> {
        Self::new(config, GridStyler::new())
    }
}

impl<S: Styler> LayoutContainer<S> {
    pub fn new(config: GridConfig, styler: S) -> Result<Self> {
        config.validate()?;
        let screen = ScreenSize::Large;
        let cols = config.columns_for(screen);
        let metrics =
            GridMetrics::for_container(0.0, cols, config.gutter, config.row_height_for(screen));
        let mut styler = styler;
        styler.set_metrics(metrics);
        Ok(Self {
            autoscroll: AutoScroller::new(config.auto_scroll_step),
            first_layout: config.disable_first_render_animation,
            coordinator: GridCoordinator::new(cols),
            config,
            options: ContainerOptions::default(),
            service: LayoutService::new(),
            styler,
            observers: Vec::new(),
            screen,
            cols,
            metrics,
            container_rect: PixelRect::default(),
            scroll: ScrollMetrics::default(),
            scheduler: FrameScheduler::new(),
            items: Vec::new(),
            editable: false,
            gesture: None,
            placeholder_visible: false,
            last_digest: None,
            started_at: Instant::now(),
            last_metrics_emit: None,
        })
    }

    pub fn with_options(mut self, options: ContainerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options_mut(&mut self) -> &mut ContainerOptions {
        &mut self.options
    }

    pub fn set_listener_host<H>(&mut self, host: H)
    where
        H: ListenerHost + 'static,
    {
        self.service.set_listener_host(host);
    }

    pub fn register_observer<O>(&mut self, observer: O)
    where
        O: LayoutObserver + 'static,
    {
        self.log(
            LogLevel::Debug,
            TARGET_CONTAINER,
            "observer_registered",
            [json_kv("observer", observer.name())],
        );
        self.observers.push(Box::new(observer));
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn styler(&self) -> &S {
        &self.styler
    }

    pub fn styler_mut(&mut self) -> &mut S {
        &mut self.styler
    }

    pub fn service(&self) -> &LayoutService {
        &self.service
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn screen(&self) -> ScreenSize {
        self.screen
    }

    pub fn grid_metrics(&self) -> GridMetrics {
        self.metrics
    }

    pub fn container_rect(&self) -> PixelRect {
        self.container_rect
    }

    pub fn scroll_metrics(&self) -> ScrollMetrics {
        self.scroll
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn is_placeholder_visible(&self) -> bool {
        self.placeholder_visible
    }

    pub fn auto_scroll_direction(&self) -> ScrollDirection {
        self.autoscroll.direction()
    }

    pub fn is_auto_scrolling(&self) -> bool {
        self.autoscroll.is_running()
    }

    pub fn has_pending_reflow(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Item and handle of the gesture in progress, once it crossed the
    /// drag threshold.
    pub fn active_gesture(&self) -> Option<(&str, HandleKind)> {
        self.gesture
            .as_ref()
            .filter(|gesture| gesture.started)
            .map(|gesture| (gesture.item.as_str(), gesture.handle))
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.service.item(id)
    }

    pub fn rect_of(&self, id: &str) -> Option<Rect> {
        self.service.item(id).map(Item::rect)
    }

    /// Items in layout order as of the last pass.
    pub fn ordered_items(&self) -> &[ItemId] {
        &self.items
    }

    /// Client-space frame of an item's current rect.
    pub fn item_client_frame(&self, id: &str) -> Option<PixelRect> {
        let item = self.service.item(id)?;
        if item.rect().is_empty() {
            return None;
        }
        Some(self.client_frame(item.rect().position()))
    }

    /// Pixel height of the laid-out grid.
    pub fn content_height(&self) -> f64 {
        let rows = self
            .items
            .iter()
            .filter_map(|id| self.service.item(id))
            .map(|item| item.rect().bottom())
            .max()
            .unwrap_or(0);
        self.metrics.content_height(rows)
    }

    pub fn layout_items(&self) -> Vec<LayoutItem> {
        self.items
            .iter()
            .filter_map(|id| self.service.item(id))
            .map(Item::to_layout_item)
            .collect()
    }

    pub fn register_item(&mut self, spec: ItemSpec) -> Result<()> {
        let id = spec.id.clone();
        self.service.register_item(spec, &self.config.columns)?;
        if self.editable {
            self.service.enable_gestures(&self.config.gesture);
        }
        self.scheduler.request();
        self.log(
            LogLevel::Debug,
            TARGET_CONTAINER,
            "item_registered",
            [json_kv("item", id)],
        );
        Ok(())
    }

    pub fn update_item(&mut self, id: &str, patch: ItemPatch) -> Result<()> {
        let repack = self.service.layout_item(id, patch, &self.config.columns)?;
        self.scheduler.request();
        self.log(
            LogLevel::Debug,
            TARGET_CONTAINER,
            "item_updated",
            [json_kv("item", id), json_kv("repack", repack)],
        );
        Ok(())
    }

    pub fn remove_item(&mut self, id: &str) -> Result<()> {
        let (_item, ended) = self.service.remove_item(id)?;
        if self.gesture.as_ref().is_some_and(|gesture| gesture.item == id) {
            let started = self.gesture.take().is_some_and(|gesture| gesture.started);
            self.remove_placeholder();
            self.stop_scrolling();
            if started || ended.is_some() {
                self.with_metrics(LayoutMetrics::record_gesture_cancelled);
                self.log(
                    LogLevel::Info,
                    TARGET_GESTURE,
                    "gesture_cancelled",
                    [json_kv("item", id), json_kv("reason", "item_removed")],
                );
            }
        }
        self.items.retain(|entry| entry != id);
        self.styler.remove(&StyleTarget::item(id));
        self.scheduler.request();
        self.log(
            LogLevel::Debug,
            TARGET_CONTAINER,
            "item_removed",
            [json_kv("item", id)],
        );
        Ok(())
    }

    /// Switch breakpoint for a viewport `width` pixels wide. Returns whether
    /// the breakpoint changed.
    pub fn set_viewport_width(&mut self, width: f64) -> bool {
        let screen = self.config.screen_for_width(width);
        if screen == self.screen {
            return false;
        }
        let previous = self.screen;
        self.screen = screen;
        self.cols = self.config.columns_for(screen);
        self.coordinator = GridCoordinator::new(self.cols);
        self.cache_dimension();
        self.scheduler.request();
        self.log(
            LogLevel::Info,
            TARGET_CONTAINER,
            "breakpoint_changed",
            [
                json_kv("from", previous.as_str()),
                json_kv("to", screen.as_str()),
                json_kv("cols", self.cols),
            ],
        );
        true
    }

    /// Client rect of the container element, as reported by a resize observer.
    pub fn set_container_rect(&mut self, rect: PixelRect) {
        self.container_rect = rect;
        self.cache_dimension();
    }

    pub fn set_scroll_metrics(&mut self, metrics: ScrollMetrics) {
        self.scroll = metrics;
    }

    /// The scroll node moved to `position`.
    ///
    /// The cached container rect follows the content; a running gesture keeps
    /// its pickup point over the same content.
    pub fn on_scroll(&mut self, position: ScrollPosition) {
        let top = self.scroll.position.top - position.top;
        let left = self.scroll.position.left - position.left;
        self.scroll.position = position;
        if top == 0.0 && left == 0.0 {
            return;
        }
        self.container_rect.shift(top, left);
        if let Some(gesture) = self.gesture.as_ref() {
            self.service.shift_pickup(&gesture.item, 0.0, top);
        }
    }

    pub fn set_editable(&mut self, editable: bool) {
        if editable == self.editable {
            return;
        }
        self.editable = editable;
        if editable {
            self.service.enable_gestures(&self.config.gesture);
        } else {
            for (id, end) in self.service.disable_gestures() {
                self.end_drawing(&id, end);
            }
            self.gesture = None;
            self.remove_placeholder();
            self.stop_scrolling();
        }
        self.log(
            LogLevel::Info,
            TARGET_CONTAINER,
            "edit_mode_changed",
            [json_kv("editable", editable)],
        );
    }

    pub fn pointer_down(&mut self, id: &str, handle: HandleKind, input: PointerInput) -> EventFlow {
        if !self.editable {
            return EventFlow::Continue;
        }
        let Some(down) = self
            .service
            .pointer_down(id, handle, &input, self.scroll.position)
        else {
            return EventFlow::Continue;
        };
        self.stop_scrolling();
        self.gesture = Some(ActiveGesture {
            item: id.to_string(),
            handle,
            started: false,
            frame: PixelRect::default(),
            anchor: GridPosition::default(),
            offset: PositionOffset::default(),
            targets: ShiftTargets::default(),
            tentative: None,
        });
        self.log(
            LogLevel::Debug,
            TARGET_GESTURE,
            "pointer_down",
            [
                json_kv("item", id),
                json_kv("handle", down.handle.as_str()),
                json_kv("x", down.pickup_position.x),
                json_kv("y", down.pickup_position.y),
            ],
        );
        EventFlow::Consumed
    }

    /// Document-level pointer move. A real move always interrupts edge
    /// scrolling; the gesture decides again whether it should run.
    pub fn pointer_move(&mut self, input: PointerInput) {
        let was_scrolling = self.autoscroll.stop();
        let events = self.service.pointer_move(&input);
        self.handle_gesture_events(events);
        if was_scrolling && !self.autoscroll.is_running() {
            self.log_autoscroll_stopped();
        }
    }

    pub fn pointer_up(&mut self, input: PointerInput) {
        for (id, end) in self.service.pointer_up(&input) {
            self.end_drawing(&id, end);
        }
    }

    /// Schedule a full reflow for the next animation frame.
    pub fn request_reflow(&mut self) {
        self.scheduler.request();
    }

    /// Run everything that was waiting for an animation frame: at most one
    /// reflow, then one auto-scroll step.
    pub fn on_animation_frame(&mut self) -> FrameReport {
        let mut report = FrameReport::default();
        self.with_metrics(LayoutMetrics::record_frame);

        if self.scheduler.take_due() {
            self.reflow();
            report.reflowed = true;
        }

        if let Some(amount) = self.autoscroll.tick(&self.scroll) {
            let events = self.service.increment_scroll(amount);
            self.handle_gesture_events(events);
            self.scroll.position.top += amount;
            self.container_rect.shift(-amount, 0.0);
            if let Some(gesture) = self.gesture.as_ref() {
                self.service.shift_pickup(&gesture.item, 0.0, -amount);
            }
            self.with_metrics(LayoutMetrics::record_autoscroll_tick);
            report.scroll_by = Some(amount);
        }

        self.maybe_emit_metrics();
        report
    }

    /// Full layout pass, run immediately.
    ///
    /// Items being dragged or resized are reserved first, at the position
    /// the placeholder currently shows.
    /// The first pass on a coordinator packs everything; later passes keep
    /// each placed item's column and only compact it upwards.
    pub fn reflow(&mut self) {
        self.scheduler.cancel();
        if let Some(ordered) = self.service.take_published() {
            self.items = ordered;
        }

        let initialized = self.coordinator.initialized();
        self.coordinator.reset();
        for id in &self.items {
            if let Some(item) = self.service.item(id).filter(|item| item.is_stamped()) {
                let reserved = self
                    .gesture
                    .as_ref()
                    .filter(|gesture| &gesture.item == id)
                    .and_then(|gesture| gesture.tentative)
                    .map_or(item.rect(), Rect::from);
                self.coordinator.placed(reserved);
            }
        }
        for id in &self.items {
            let Some(item) = self.service.item_mut(id) else {
                continue;
            };
            if item.stamp {
                continue;
            }
            let requested = footprint(item, self.screen);
            item.rect = if initialized && !item.rect.is_empty() {
                self.coordinator.column_pack(requested)
            } else {
                self.coordinator.pack(requested)
            };
        }
        self.coordinator.complete_pass();

        let first_layout = self.first_layout;
        self.apply_layout(first_layout);
        self.first_layout = false;

        self.with_metrics(|metrics| metrics.record_reflow(self.items.len()));
        self.log(
            LogLevel::Debug,
            TARGET_CONTAINER,
            "reflow",
            [
                json_kv("items", self.items.len()),
                json_kv("cols", self.cols),
                json_kv("depth", self.coordinator.depth()),
                json_kv("column_pack", initialized),
            ],
        );
    }

    /// Stop everything and release the shared listeners.
    pub fn destroy(&mut self) {
        self.stop_scrolling();
        if let Some(gesture) = self.gesture.take() {
            self.service.cancel(&gesture.item);
        }
        self.remove_placeholder();
        self.service.destroy();
        self.items.clear();
        self.scheduler.cancel();
        self.editable = false;
        let uptime_ms = self.started_at.elapsed().as_millis() as u64;
        self.log(
            LogLevel::Info,
            TARGET_CONTAINER,
            "container_destroyed",
            [json_kv("uptime_ms", uptime_ms)],
        );
    }

    fn handle_gesture_events(&mut self, events: Vec<(ItemId, GestureEvent)>) {
        for (id, event) in events {
            match event {
                GestureEvent::Started { .. } => self.start_drawing(&id),
                GestureEvent::Move(event) => self.drawing(&id, &event),
                GestureEvent::End(end) => self.end_drawing(&id, end),
                GestureEvent::Down(_) => {}
            }
        }
    }

    fn start_drawing(&mut self, id: &str) {
        let Some(rect) = self.service.item(id).map(Item::rect) else {
            return;
        };
        let frame = self.client_frame(rect.position());
        let placed: Vec<Rect> = self
            .items
            .iter()
            .filter_map(|item| self.service.item(item).map(Item::rect))
            .collect();
        let cols = self.cols;
        let Some(gesture) = self.gesture.as_mut().filter(|gesture| gesture.item == id) else {
            return;
        };
        gesture.started = true;
        gesture.frame = frame;
        gesture.anchor = rect.position();
        gesture.offset = PositionOffset::default();
        if gesture.handle == HandleKind::Drag {
            gesture.targets = ShiftTargets::collect(cols, rect, placed.iter());
        }
        let handle = gesture.handle;
        if let Some(item) = self.service.item_mut(id) {
            item.stamp = true;
        }

        let phase = match handle {
            HandleKind::Drag => ChangePhase::StartDragging,
            HandleKind::Resize => ChangePhase::StartResizing,
        };
        self.notify_phase(id, phase, PositionOffset::default());
        self.with_metrics(LayoutMetrics::record_gesture_started);
        self.log(
            LogLevel::Info,
            TARGET_GESTURE,
            "gesture_started",
            [
                json_kv("item", id),
                json_kv("handle", handle.as_str()),
                json_kv("column", rect.x()),
                json_kv("row", rect.y()),
            ],
        );
    }

    fn drawing(&mut self, id: &str, event: &PointerMove) {
        let container = self.container_rect;
        let metrics = self.metrics;
        let cols = self.cols;
        let Some(gesture) = self
            .gesture
            .as_mut()
            .filter(|gesture| gesture.item == id && gesture.started)
        else {
            return;
        };

        let frame = gesture.frame;
        let phase = match gesture.handle {
            HandleKind::Drag => {
                let mut left = event.pointer_position.x - event.pickup_position.x;
                let top = event.pointer_position.y - event.pickup_position.y;
                if left + frame.left < container.left {
                    left = container.left - frame.left;
                }
                if left + frame.right() > container.right() - 1.0 {
                    left = container.right() - frame.right() - 1.0;
                }
                gesture.offset.left = left;
                gesture.offset.top = top;
                ChangePhase::Dragging
            }
            HandleKind::Resize => {
                let height = (frame.height + event.distance.y).max(metrics.row_height);
                let mut width = (frame.width + event.distance.x).max(metrics.column_width);
                if width + frame.left > container.right() - 1.0 {
                    width = container.right() - frame.left - 1.0;
                }
                gesture.offset.width = width - frame.width;
                gesture.offset.height = height - frame.height;
                ChangePhase::Resizing
            }
        };
        let offset = gesture.offset;
        let candidate = calculate_new_position(gesture.anchor, &offset, &metrics, cols);

        let tentative = match phase {
            ChangePhase::Dragging => {
                let target = gesture.targets.nearest(candidate.column_start, candidate.row_start);
                let Some(item) = self.service.item_mut(id) else {
                    return;
                };
                if let Some((column, row)) = target {
                    item.rect.set_x(column);
                    item.rect.set_y(row);
                }
                item.rect.position()
            }
            _ => candidate.resized(gesture.anchor, cols),
        };
        if let Some(gesture) = self.gesture.as_mut() {
            gesture.tentative = Some(tentative);
        }

        self.notify_phase(id, phase, offset);
        self.show_placeholder(tentative);
        self.fit(tentative);

        if !event.is_scrolling {
            self.start_scrolling_if_necessary(event.pointer_position.y);
        }
    }

    fn end_drawing(&mut self, id: &str, end: PointerEnd) {
        let Some(gesture) = self.gesture.take_if(|gesture| gesture.item == id) else {
            return;
        };
        self.stop_scrolling();

        if !gesture.started {
            if end.cancelled {
                self.with_metrics(LayoutMetrics::record_gesture_cancelled);
                self.log(
                    LogLevel::Info,
                    TARGET_GESTURE,
                    "gesture_cancelled",
                    [json_kv("item", id), json_kv("reason", "before_start")],
                );
            }
            return;
        }

        let phase = match gesture.handle {
            HandleKind::Drag => ChangePhase::EndDragging,
            HandleKind::Resize => ChangePhase::EndResizing,
        };
        self.notify_phase(id, phase, gesture.offset);

        let resized = match gesture.handle {
            HandleKind::Resize => Some(
                calculate_new_position(gesture.anchor, &gesture.offset, &self.metrics, self.cols)
                    .resized(gesture.anchor, self.cols),
            ),
            HandleKind::Drag => None,
        };
        // Neighbours may have reflowed into the grown area since the last move.
        if let Some(position) = resized.filter(|_| self.service.item(id).is_some()) {
            self.fit(position);
        }

        let Some(item) = self.service.item_mut(id) else {
            self.remove_placeholder();
            return;
        };
        item.stamp = false;
        if let Some(position) = resized {
            item.rect = Rect::from(position);
        }
        let position = item.rect.position();
        self.remove_placeholder();
        self.styler
            .set_position(&StyleTarget::item(id), position, false);
        self.sort_items_by_position();

        if let Some(position) = resized {
            let anchor = gesture.anchor;
            let column_offset = i32::from(position.column_end - position.column_start)
                - i32::from(anchor.column_end - anchor.column_start);
            let screen = self.screen;
            let table = self.config.columns;
            if let Some(item) = self.service.item_mut(id) {
                item.update_screen_columns(column_offset, screen, &table);
                item.rows = position.row_end - position.row_start;
            }
        }

        self.log(
            LogLevel::Info,
            TARGET_GESTURE,
            "gesture_ended",
            [
                json_kv("item", id),
                json_kv("handle", gesture.handle.as_str()),
                json_kv("cancelled", end.cancelled),
                json_kv("column", position.column_start),
                json_kv("row", position.row_start),
            ],
        );
        self.dispatch_change();
    }

    /// Reserve `position` and flow every other item around it.
    fn fit(&mut self, position: GridPosition) {
        self.coordinator.reset();
        self.coordinator.placed(Rect::from(position));
        self.shift_layout();
    }

    fn shift_layout(&mut self) {
        for id in &self.items {
            let Some(item) = self.service.item_mut(id) else {
                continue;
            };
            if item.stamp {
                continue;
            }
            let requested = footprint(item, self.screen);
            item.rect = if item.rect.is_empty() {
                self.coordinator.pack(requested)
            } else {
                self.coordinator.column_pack(requested)
            };
        }
        self.apply_layout(false);
    }

    fn apply_layout(&mut self, first_layout: bool) {
        for id in &self.items {
            if let Some(item) = self.service.item(id).filter(|item| !item.is_stamped()) {
                self.styler.set_position(
                    &StyleTarget::Item(id.clone()),
                    item.rect().position(),
                    first_layout,
                );
            }
        }
    }

    fn sort_items_by_position(&mut self) {
        let service = &self.service;
        self.items.sort_by_key(|id| {
            service
                .item(id)
                .map(|item| (item.rect().y(), item.rect().x()))
                .unwrap_or((u16::MAX, u16::MAX))
        });
        for (index, id) in self.items.iter().enumerate() {
            if let Some(item) = self.service.item_mut(id) {
                item.order = Some(index as i32);
            }
        }
    }

    fn dispatch_change(&mut self) {
        match LayoutChange::new(self.layout_items(), self.last_digest.as_ref()) {
            Ok(change) => {
                self.last_digest = Some(change.digest);
                for observer in self.observers.iter_mut() {
                    observer.on_layout_change(&change);
                }
                self.with_metrics(LayoutMetrics::record_layout_change);
                self.log(
                    LogLevel::Info,
                    TARGET_CONTAINER,
                    "layout_changed",
                    [
                        json_kv("items", change.items.len()),
                        json_kv("changed", change.changed),
                        json_kv("digest", change.digest.to_hex().as_str()),
                    ],
                );
            }
            Err(err) => {
                self.log(
                    LogLevel::Warn,
                    TARGET_CONTAINER,
                    "layout_change_failed",
                    [json_kv("error", err.to_string())],
                );
            }
        }
    }

    fn notify_phase(&mut self, id: &str, phase: ChangePhase, offset: PositionOffset) {
        if self.observers.is_empty() {
            return;
        }
        let event = PhaseEvent {
            item: id.to_string(),
            phase,
            offset,
        };
        for observer in self.observers.iter_mut() {
            observer.on_phase(&event);
        }
    }

    fn show_placeholder(&mut self, position: GridPosition) {
        self.styler
            .set_position(&StyleTarget::Placeholder, position, !self.placeholder_visible);
        if !self.placeholder_visible {
            self.styler.set_placeholder_visible(true);
            self.placeholder_visible = true;
        }
    }

    fn remove_placeholder(&mut self) {
        if self.placeholder_visible {
            self.styler.set_placeholder_visible(false);
            self.placeholder_visible = false;
        }
    }

    fn start_scrolling_if_necessary(&mut self, pointer_y: f64) {
        let was_running = self.autoscroll.is_running();
        let zone = SafeZone::new(
            &self.scroll,
            &self.container_rect,
            self.config.padding_top,
            self.config.padding_bottom,
        );
        let direction = self
            .autoscroll
            .evaluate(pointer_y, zone, self.scroll.position.top);
        if !was_running && self.autoscroll.is_running() {
            self.log(
                LogLevel::Debug,
                TARGET_AUTOSCROLL,
                "autoscroll_started",
                [json_kv("direction", direction.as_str())],
            );
        }
    }

    fn stop_scrolling(&mut self) {
        if self.autoscroll.stop() {
            self.log_autoscroll_stopped();
        }
    }

    fn log_autoscroll_stopped(&self) {
        self.log(
            LogLevel::Debug,
            TARGET_AUTOSCROLL,
            "autoscroll_stopped",
            [json_kv("scroll_top", self.scroll.position.top)],
        );
    }

    fn cache_dimension(&mut self) {
        self.metrics = GridMetrics::for_container(
            self.container_rect.width,
            self.cols,
            self.config.gutter,
            self.config.row_height_for(self.screen),
        );
        self.styler.set_metrics(self.metrics);
    }

    fn client_frame(&self, position: GridPosition) -> PixelRect {
        let mut frame = self.metrics.frame(position);
        frame.shift(self.container_rect.top, self.container_rect.left);
        frame
    }

    fn with_metrics(&self, record: impl FnOnce(&mut LayoutMetrics)) {
        if let Some(metrics) = self.options.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                record(&mut *guard);
            }
        }
    }

    fn maybe_emit_metrics(&mut self) {
        if self.options.metrics.is_none() || self.options.metrics_interval.is_zero() {
            return;
        }

        let now = Instant::now();
        match self.last_metrics_emit {
            Some(last) if now.duration_since(last) < self.options.metrics_interval => return,
            None => {
                self.last_metrics_emit = Some(now);
                return;
            }
            _ => self.last_metrics_emit = Some(now),
        }

        let uptime = now.duration_since(self.started_at);
        if let (Some(logger), Some(metrics)) =
            (self.options.logger.as_ref(), self.options.metrics.as_ref())
        {
            if let Ok(guard) = metrics.lock() {
                let event = guard
                    .snapshot(uptime)
                    .to_log_event(&self.options.metrics_target);
                let _ = logger.log_event(event);
            }
        }
    }

    fn log<I>(&self, level: LogLevel, target: &str, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.options.logger.as_ref() {
            let _ = logger.log_event(event_with_fields(level, target, message, fields));
        }
    }
}

/// `item`'s requested span and height at its current position.
fn footprint(item: &Item, screen: ScreenSize) -> Rect {
    let rect = item.rect();
    Rect::sized(rect.x(), rect.y(), item.cols_for(screen), item.rows())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point;
    use crate::logging::MemorySink;
    use crate::runtime::observer::RecordingObserver;

    // 1288px wide at the large breakpoint: 100px columns, 16px row pitch.
    const WIDTH: f64 = 1288.0;

    fn container(specs: &[(&str, u16, u16)]) -> LayoutContainer {
        container_with(GridConfig::default(), specs)
    }

    fn container_with(config: GridConfig, specs: &[(&str, u16, u16)]) -> LayoutContainer {
        let mut container = LayoutContainer::with_grid_styler(config).unwrap();
        container.set_viewport_width(WIDTH);
        container.set_container_rect(PixelRect::new(0.0, 0.0, WIDTH, 2000.0));
        container.set_scroll_metrics(ScrollMetrics::new(
            PixelRect::new(0.0, 0.0, WIDTH, 600.0),
            ScrollPosition::default(),
            1400.0,
        ));
        for (id, cols, rows) in specs {
            container
                .register_item(ItemSpec::new(*id, *cols, *rows))
                .unwrap();
        }
        container.on_animation_frame();
        container
    }

    fn position(container: &LayoutContainer, id: &str) -> (u16, u16, u16, u16) {
        let rect = container.rect_of(id).unwrap();
        (rect.x(), rect.y(), rect.right(), rect.bottom())
    }

    fn assert_valid_layout(container: &LayoutContainer) {
        let rects: Vec<Rect> = container
            .ordered_items()
            .iter()
            .map(|id| container.rect_of(id).unwrap())
            .collect();
        for (index, rect) in rects.iter().enumerate() {
            assert!(!rect.is_empty());
            assert!(rect.right() <= container.cols());
            for other in &rects[index + 1..] {
                assert!(!rect.intersects(other), "{rect:?} overlaps {other:?}");
            }
        }
    }

    fn drag_a_two_columns(container: &mut LayoutContainer) {
        container.set_editable(true);
        let flow = container.pointer_down("a", HandleKind::Drag, PointerInput::mouse(10.0, 5.0, 0));
        assert_eq!(flow, EventFlow::Consumed);
        container.pointer_move(PointerInput::mouse(20.0, 5.0, 10));
        container.pointer_move(PointerInput::mouse(240.0, 5.0, 20));
    }

    #[test]
    fn equal_items_fill_one_row() {
        let container = container(&[("a", 4, 2), ("b", 4, 2), ("c", 4, 2)]);
        assert_eq!(position(&container, "a"), (0, 0, 4, 2));
        assert_eq!(position(&container, "b"), (4, 0, 8, 2));
        assert_eq!(position(&container, "c"), (8, 0, 12, 2));
    }

    #[test]
    fn wide_items_stack() {
        let container = container(&[("a", 8, 2), ("b", 8, 2)]);
        assert_eq!(position(&container, "a"), (0, 0, 8, 2));
        assert_eq!(position(&container, "b"), (0, 2, 8, 4));
    }

    #[test]
    fn reflow_waits_for_the_next_frame() {
        let mut container = container(&[("a", 4, 2)]);
        container.register_item(ItemSpec::new("b", 4, 2)).unwrap();
        container.update_item("a", ItemPatch { rows: Some(3), ..ItemPatch::default() }).unwrap();
        assert!(container.has_pending_reflow());
        assert!(container.rect_of("b").unwrap().is_empty());

        let report = container.on_animation_frame();
        assert!(report.reflowed);
        assert_eq!(position(&container, "b"), (4, 0, 8, 2));
        assert!(!container.on_animation_frame().reflowed);
    }

    #[test]
    fn reflow_is_idempotent_and_never_overlaps() {
        let mut container = container(&[
            ("a", 5, 3),
            ("b", 7, 1),
            ("c", 12, 2),
            ("d", 3, 4),
            ("e", 20, 1),
            ("f", 6, 2),
        ]);
        assert_valid_layout(&container);
        let before: Vec<_> = ["a", "b", "c", "d", "e", "f"]
            .iter()
            .map(|id| position(&container, id))
            .collect();
        container.reflow();
        let after: Vec<_> = ["a", "b", "c", "d", "e", "f"]
            .iter()
            .map(|id| position(&container, id))
            .collect();
        assert_eq!(before, after);
        assert_valid_layout(&container);
    }

    #[test]
    fn items_follow_their_order() {
        let mut container = LayoutContainer::with_grid_styler(GridConfig::default()).unwrap();
        container.register_item(ItemSpec::new("a", 4, 2).with_order(2)).unwrap();
        container.register_item(ItemSpec::new("b", 4, 2)).unwrap();
        container.register_item(ItemSpec::new("c", 4, 2).with_order(0)).unwrap();
        container.on_animation_frame();
        assert_eq!(container.ordered_items(), ["c", "b", "a"]);
        assert_eq!(position(&container, "c"), (0, 0, 4, 2));
    }

    #[test]
    fn dragging_snaps_and_flows_neighbours() {
        let mut container = container(&[("a", 4, 2), ("b", 4, 2), ("c", 4, 2)]);
        let observer = RecordingObserver::new();
        container.register_observer(observer.clone());
        drag_a_two_columns(&mut container);

        assert_eq!(container.active_gesture(), Some(("a", HandleKind::Drag)));
        assert_eq!(position(&container, "a"), (2, 0, 6, 2));
        assert_eq!(position(&container, "b"), (4, 2, 8, 4));
        assert_eq!(position(&container, "c"), (8, 0, 12, 2));
        assert!(container.is_placeholder_visible());
        assert_eq!(
            container.styler().placeholder().unwrap().position,
            container.rect_of("a").unwrap().position()
        );
        assert_valid_layout(&container);

        container.pointer_up(PointerInput::mouse(240.0, 5.0, 30));
        assert!(container.active_gesture().is_none());
        assert!(!container.is_placeholder_visible());
        assert!(!container.item("a").unwrap().is_stamped());
        assert_eq!(container.ordered_items(), ["a", "c", "b"]);
        assert!(container.styler().item_frame("a").unwrap().animated);

        assert_eq!(
            observer.phases(),
            vec![
                ChangePhase::StartDragging,
                ChangePhase::Dragging,
                ChangePhase::EndDragging
            ]
        );
        let changes = observer.changes();
        assert_eq!(changes.len(), 1);
        let orders: Vec<_> = changes[0]
            .items
            .iter()
            .map(|item| (item.id.as_str(), item.order))
            .collect();
        assert_eq!(orders, vec![("a", 0), ("c", 1), ("b", 2)]);
        assert!(changes[0].changed);
        assert!(!container.service().has_global_listeners());
    }

    #[test]
    fn resizing_grows_the_far_edges_and_updates_spans() {
        let mut container = container(&[("a", 4, 2), ("b", 4, 2)]);
        let observer = RecordingObserver::new();
        container.register_observer(observer.clone());
        container.set_editable(true);

        container.pointer_down("a", HandleKind::Resize, PointerInput::mouse(420.0, 20.0, 0));
        container.pointer_move(PointerInput::mouse(430.0, 20.0, 10));
        container.pointer_move(PointerInput::mouse(528.0, 36.0, 20));
        assert_eq!(
            container.styler().placeholder().unwrap().position,
            GridPosition {
                column_start: 0,
                column_end: 5,
                row_start: 0,
                row_end: 3,
            }
        );
        assert_eq!(position(&container, "b"), (4, 3, 8, 5));

        container.pointer_up(PointerInput::mouse(528.0, 36.0, 30));
        assert_eq!(position(&container, "a"), (0, 0, 5, 3));
        let item = container.item("a").unwrap();
        assert_eq!((item.cols(), item.rows()), (5, 3));
        assert_eq!(item.screen_columns()[ScreenSize::Large], 5);
        assert_eq!(
            observer.phases().last(),
            Some(&ChangePhase::EndResizing)
        );
        assert_eq!(observer.changes()[0].items[0].cols, 5);
    }

    #[test]
    fn reflow_during_resize_keeps_neighbours_clear() {
        let mut container = container(&[("a", 4, 2), ("b", 4, 2)]);
        container.set_editable(true);
        container.pointer_down("a", HandleKind::Resize, PointerInput::mouse(420.0, 20.0, 0));
        container.pointer_move(PointerInput::mouse(430.0, 20.0, 10));
        container.pointer_move(PointerInput::mouse(528.0, 36.0, 20));

        container.request_reflow();
        assert!(container.on_animation_frame().reflowed);
        assert_eq!(position(&container, "b"), (4, 3, 8, 5));
        let shown = Rect::from(container.styler().placeholder().unwrap().position);
        assert!(!shown.intersects(&container.rect_of("b").unwrap()));

        container.pointer_up(PointerInput::mouse(528.0, 36.0, 30));
        assert_eq!(position(&container, "a"), (0, 0, 5, 3));
        assert_eq!(position(&container, "b"), (4, 3, 8, 5));
        assert_valid_layout(&container);
    }

    #[test]
    fn item_changes_during_resize_commit_without_overlap() {
        let mut container = container(&[("a", 4, 2), ("b", 4, 2)]);
        container.set_editable(true);
        container.pointer_down("a", HandleKind::Resize, PointerInput::mouse(420.0, 20.0, 0));
        container.pointer_move(PointerInput::mouse(430.0, 20.0, 10));
        container.pointer_move(PointerInput::mouse(528.0, 36.0, 20));

        container.register_item(ItemSpec::new("c", 3, 2)).unwrap();
        container
            .update_item("b", ItemPatch { rows: Some(1), ..ItemPatch::default() })
            .unwrap();
        container.on_animation_frame();
        assert_valid_layout(&container);

        container.pointer_up(PointerInput::mouse(528.0, 36.0, 30));
        assert_eq!(position(&container, "a"), (0, 0, 5, 3));
        assert_valid_layout(&container);
    }

    #[test]
    fn reflow_during_drag_keeps_the_layout_valid() {
        let mut container = container(&[("a", 4, 2), ("b", 4, 2), ("c", 4, 2)]);
        drag_a_two_columns(&mut container);

        container.register_item(ItemSpec::new("d", 4, 2)).unwrap();
        assert!(container.on_animation_frame().reflowed);
        assert_eq!(position(&container, "a"), (2, 0, 6, 2));
        assert_eq!(position(&container, "b"), (4, 2, 8, 4));
        assert_valid_layout(&container);

        container.pointer_up(PointerInput::mouse(240.0, 5.0, 30));
        assert_eq!(position(&container, "a"), (2, 0, 6, 2));
        assert_valid_layout(&container);
    }

    #[test]
    fn resize_never_passes_the_right_edge() {
        let mut container = container(&[("a", 4, 2)]);
        container.set_editable(true);
        container.pointer_down("a", HandleKind::Resize, PointerInput::mouse(420.0, 20.0, 0));
        container.pointer_move(PointerInput::mouse(430.0, 20.0, 10));
        container.pointer_move(PointerInput::mouse(5000.0, 20.0, 20));
        container.pointer_up(PointerInput::mouse(5000.0, 20.0, 30));
        assert_eq!(position(&container, "a"), (0, 0, 12, 2));
    }

    #[test]
    fn fast_move_before_delay_cancels_without_phases() {
        let mut config = GridConfig::default();
        config.gesture.drag_start_delay_ms = 100;
        let mut container = container_with(config, &[("a", 4, 2)]);
        container.options_mut().enable_metrics();
        let observer = RecordingObserver::new();
        container.register_observer(observer.clone());
        container.set_editable(true);

        container.pointer_down("a", HandleKind::Drag, PointerInput::mouse(10.0, 5.0, 0));
        assert!(container.service().has_global_listeners());
        container.pointer_move(PointerInput::mouse(40.0, 5.0, 10));

        assert!(observer.phases().is_empty());
        assert!(observer.changes().is_empty());
        assert!(container.active_gesture().is_none());
        assert!(!container.service().has_global_listeners());
        assert!(!container.item("a").unwrap().is_stamped());
        let metrics = container.options_mut().metrics_handle().unwrap();
        let snapshot = metrics.lock().unwrap().snapshot(Duration::ZERO);
        assert_eq!(snapshot.gestures_cancelled, 1);
        assert_eq!(snapshot.gestures_started, 0);
    }

    #[test]
    fn pointer_down_is_ignored_outside_edit_mode_and_during_a_gesture() {
        let mut container = container(&[("a", 4, 2), ("b", 4, 2)]);
        let down = PointerInput::mouse(10.0, 5.0, 0);
        assert_eq!(container.pointer_down("a", HandleKind::Drag, down), EventFlow::Continue);
        container.set_editable(true);
        assert_eq!(container.pointer_down("a", HandleKind::Drag, down), EventFlow::Consumed);
        assert_eq!(container.pointer_down("b", HandleKind::Drag, down), EventFlow::Continue);
    }

    #[test]
    fn edge_autoscroll_ticks_shift_the_pickup_and_clamp() {
        let mut container = container(&[("a", 4, 2), ("b", 4, 2)]);
        drag_a_two_columns(&mut container);
        container.pointer_move(PointerInput::mouse(240.0, 650.0, 30));
        assert_eq!(container.auto_scroll_direction(), ScrollDirection::Down);

        let report = container.on_animation_frame();
        assert_eq!(report.scroll_by, Some(2.0));
        assert_eq!(container.scroll_metrics().position.top, 2.0);
        assert_eq!(container.container_rect().top, -2.0);
        assert_eq!(
            container.service().tracker("a").unwrap().pickup_position(),
            Some(Point::new(10.0, 3.0))
        );

        let mut scroll = container.scroll_metrics();
        scroll.max_top = 3.0;
        container.set_scroll_metrics(scroll);
        assert_eq!(container.on_animation_frame().scroll_by, Some(1.0));
        assert_eq!(container.on_animation_frame().scroll_by, None);

        container.pointer_move(PointerInput::mouse(240.0, 300.0, 40));
        assert!(!container.is_auto_scrolling());
        container.pointer_up(PointerInput::mouse(240.0, 300.0, 50));
        assert!(!container.is_auto_scrolling());
        assert_valid_layout(&container);
    }

    #[test]
    fn external_scroll_moves_the_container_and_pickup() {
        let mut container = container(&[("a", 4, 2)]);
        drag_a_two_columns(&mut container);
        container.on_scroll(ScrollPosition::new(100.0, 0.0));
        assert_eq!(container.container_rect().top, -100.0);
        assert_eq!(
            container.service().tracker("a").unwrap().pickup_position(),
            Some(Point::new(10.0, -95.0))
        );
    }

    #[test]
    fn breakpoint_change_repacks_on_the_narrower_grid() {
        let mut container = container(&[("a", 4, 2), ("b", 4, 2), ("c", 4, 2)]);
        assert!(container.set_viewport_width(700.0));
        assert_eq!(container.screen(), ScreenSize::Small);
        assert_eq!(container.cols(), 6);
        assert!(!container.set_viewport_width(720.0));

        container.on_animation_frame();
        assert_eq!(position(&container, "a"), (0, 0, 4, 2));
        assert_eq!(position(&container, "b"), (0, 2, 4, 4));
        assert_eq!(position(&container, "c"), (0, 4, 4, 6));
        assert_valid_layout(&container);
    }

    #[test]
    fn leaving_edit_mode_commits_the_running_drag() {
        let mut container = container(&[("a", 4, 2), ("b", 4, 2), ("c", 4, 2)]);
        let observer = RecordingObserver::new();
        container.register_observer(observer.clone());
        drag_a_two_columns(&mut container);

        container.set_editable(false);
        assert!(container.active_gesture().is_none());
        assert!(!container.is_placeholder_visible());
        assert!(!container.service().has_global_listeners());
        assert_eq!(observer.phases().last(), Some(&ChangePhase::EndDragging));
        assert_eq!(observer.changes().len(), 1);
        assert_eq!(
            container.pointer_down("a", HandleKind::Drag, PointerInput::mouse(10.0, 5.0, 100)),
            EventFlow::Continue
        );
    }

    #[test]
    fn removing_the_dragged_item_drops_the_gesture() {
        let mut container = container(&[("a", 4, 2), ("b", 4, 2)]);
        let observer = RecordingObserver::new();
        container.register_observer(observer.clone());
        drag_a_two_columns(&mut container);

        container.remove_item("a").unwrap();
        assert!(container.active_gesture().is_none());
        assert!(!container.is_placeholder_visible());
        assert!(observer.changes().is_empty());
        assert!(container.styler().item_frame("a").is_none());
        container.on_animation_frame();
        assert_eq!(position(&container, "b"), (4, 0, 8, 2));
        assert!(container.remove_item("a").is_err());
    }

    #[test]
    fn committed_layouts_are_logged() {
        let sink = MemorySink::new();
        let mut container = container(&[("a", 4, 2), ("b", 4, 2), ("c", 4, 2)]);
        container.options_mut().logger = Some(Logger::new(sink.clone()));
        drag_a_two_columns(&mut container);
        container.pointer_up(PointerInput::mouse(240.0, 5.0, 30));

        assert!(sink
            .messages(TARGET_GESTURE)
            .contains(&"gesture_started".to_string()));
        assert!(sink
            .messages(TARGET_CONTAINER)
            .contains(&"layout_changed".to_string()));
    }

    #[test]
    fn destroy_releases_everything() {
        let mut container = container(&[("a", 4, 2)]);
        drag_a_two_columns(&mut container);
        container.destroy();
        assert!(container.ordered_items().is_empty());
        assert!(container.service().is_empty());
        assert!(!container.service().has_global_listeners());
        assert!(!container.is_editable());
        assert!(!container.has_pending_reflow());
    }
}
