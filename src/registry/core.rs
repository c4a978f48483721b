use std::collections::{BTreeSet, HashMap};

use crate::error::{LayoutError, Result};
use crate::gesture::{
    GestureConfig, GestureEvent, HandleKind, PointerDown, PointerEnd, PointerGestureTracker,
    PointerInput, PointerSource,
};
use crate::layout::ScreenColumns;
use crate::registry::item::{Item, ItemId, ItemPatch, ItemSpec};
use crate::ScrollPosition;

/// Installs and removes the shared document-level pointer listeners.
///
/// The service calls `install` when the first gesture becomes active and
/// `remove` once the last one ended, so hosts pay for one listener set no
/// matter how many items are registered.
pub trait ListenerHost: Send {
    fn install(&mut self, source: PointerSource);
    fn remove(&mut self);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListenerHost;

impl ListenerHost for NoopListenerHost {
    fn install(&mut self, _source: PointerSource) {}
    fn remove(&mut self) {}
}

/// Item registry and pointer-stream broker for one container.
pub struct LayoutService {
    entries: HashMap<ItemId, Item>,
    registration: Vec<ItemId>,
    trackers: HashMap<ItemId, PointerGestureTracker>,
    active: BTreeSet<ItemId>,
    host: Box<dyn ListenerHost>,
    listening: bool,
    last_move: Option<PointerInput>,
    published: bool,
}

impl Default for LayoutService {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutService {
    pub fn new() -> Self {
        Self::with_host(NoopListenerHost)
    }

    pub fn with_host<H>(host: H) -> Self
    where
        H: ListenerHost + 'static,
    {
        Self {
            entries: HashMap::new(),
            registration: Vec::new(),
            trackers: HashMap::new(),
            active: BTreeSet::new(),
            host: Box::new(host),
            listening: false,
            last_move: None,
            published: false,
        }
    }

    pub fn set_listener_host<H>(&mut self, host: H)
    where
        H: ListenerHost + 'static,
    {
        if self.listening {
            self.host.remove();
            self.listening = false;
        }
        self.host = Box::new(host);
    }

    pub fn register_item(&mut self, spec: ItemSpec, table: &ScreenColumns) -> Result<()> {
        if self.entries.contains_key(&spec.id) {
            return Err(LayoutError::DuplicateItem(spec.id));
        }
        let id = spec.id.clone();
        self.entries.insert(id.clone(), Item::from_spec(spec, table));
        self.registration.push(id);
        self.published = true;
        Ok(())
    }

    /// Apply a patch and republish. Returns whether the item lost its rect.
    pub fn layout_item(
        &mut self,
        id: &str,
        patch: ItemPatch,
        table: &ScreenColumns,
    ) -> Result<bool> {
        let item = self
            .entries
            .get_mut(id)
            .ok_or_else(|| LayoutError::ItemNotFound(id.to_string()))?;
        let repack = item.apply_patch(patch, table);
        self.published = true;
        Ok(repack)
    }

    /// Drop an item, ending its gesture if one is running.
    pub fn remove_item(&mut self, id: &str) -> Result<(Item, Option<PointerEnd>)> {
        let item = self
            .entries
            .remove(id)
            .ok_or_else(|| LayoutError::ItemNotFound(id.to_string()))?;
        self.registration.retain(|entry| entry != id);
        let ended = self
            .trackers
            .remove(id)
            .and_then(|mut tracker| tracker.cancel());
        self.stop_listener(id);
        self.published = true;
        Ok((item, ended))
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.entries.get(id)
    }

    pub fn item_mut(&mut self, id: &str) -> Option<&mut Item> {
        self.entries.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids sorted by `order`; items without one take their registration index.
    pub fn ordered_items(&mut self) -> Vec<ItemId> {
        for (index, id) in self.registration.iter().enumerate() {
            if let Some(item) = self.entries.get_mut(id) {
                if item.order.is_none() {
                    item.order = Some(index as i32);
                }
            }
        }
        let mut ordered: Vec<(i32, ItemId)> = self
            .registration
            .iter()
            .filter_map(|id| {
                self.entries
                    .get(id)
                    .map(|item| (item.order.unwrap_or_default(), id.clone()))
            })
            .collect();
        ordered.sort_by_key(|(order, _)| *order);
        ordered.into_iter().map(|(_, id)| id).collect()
    }

    /// Returns the ordered list if membership or order changed since the
    /// last call.
    pub fn take_published(&mut self) -> Option<Vec<ItemId>> {
        if !self.published {
            return None;
        }
        self.published = false;
        Some(self.ordered_items())
    }

    pub fn republish(&mut self) {
        self.published = true;
    }

    pub fn has_published(&self) -> bool {
        self.published
    }

    /// Give every item a gesture tracker. Idempotent.
    pub fn enable_gestures(&mut self, config: &GestureConfig) {
        for id in &self.registration {
            self.trackers
                .entry(id.clone())
                .or_insert_with(|| PointerGestureTracker::new(config.clone()));
        }
    }

    /// Cancel running gestures and drop every tracker.
    pub fn disable_gestures(&mut self) -> Vec<(ItemId, PointerEnd)> {
        let mut ended = Vec::new();
        for (id, mut tracker) in self.trackers.drain() {
            if let Some(end) = tracker.cancel() {
                ended.push((id, end));
            }
        }
        ended.sort_by(|a, b| a.0.cmp(&b.0));
        self.active.clear();
        self.clear_listeners();
        ended
    }

    pub fn has_tracker(&self, id: &str) -> bool {
        self.trackers.contains_key(id)
    }

    pub fn tracker(&self, id: &str) -> Option<&PointerGestureTracker> {
        self.trackers.get(id)
    }

    /// Route a pointer-down to `id`'s tracker.
    ///
    /// Only one gesture runs at a time: a down while any gesture is active is
    /// ignored, as is one on an item without a tracker.
    pub fn pointer_down(
        &mut self,
        id: &str,
        handle: HandleKind,
        input: &PointerInput,
        scroll: ScrollPosition,
    ) -> Option<PointerDown> {
        if !self.active.is_empty() {
            return None;
        }
        let tracker = self.trackers.get_mut(id)?;
        let down = tracker.pointer_down(handle, input, scroll)?;
        self.start_listener(id, input.source);
        Some(down)
    }

    /// Feed a real pointer move to every active gesture.
    pub fn pointer_move(&mut self, input: &PointerInput) -> Vec<(ItemId, GestureEvent)> {
        if self.active.is_empty() {
            return Vec::new();
        }
        self.last_move = Some(*input);
        self.dispatch_move(input, 0.0)
    }

    /// Replay the latest pointer move with `amount` pixels of synthetic
    /// vertical scroll. Nothing happens before the first real move.
    pub fn increment_scroll(&mut self, amount: f64) -> Vec<(ItemId, GestureEvent)> {
        match self.last_move {
            Some(input) if !self.active.is_empty() => self.dispatch_move(&input, amount),
            _ => Vec::new(),
        }
    }

    pub fn pointer_up(&mut self, input: &PointerInput) -> Vec<(ItemId, PointerEnd)> {
        let active: Vec<ItemId> = self.active.iter().cloned().collect();
        let mut ended = Vec::new();
        for id in active {
            if let Some(end) = self
                .trackers
                .get_mut(&id)
                .and_then(|tracker| tracker.pointer_up(input))
            {
                ended.push((id.clone(), end));
            }
            self.stop_listener(&id);
        }
        ended
    }

    /// Cancel the gesture on `id`, if any.
    pub fn cancel(&mut self, id: &str) -> Option<PointerEnd> {
        let end = self.trackers.get_mut(id).and_then(|tracker| tracker.cancel());
        self.stop_listener(id);
        end
    }

    pub fn shift_pickup(&mut self, id: &str, dx: f64, dy: f64) {
        if let Some(tracker) = self.trackers.get_mut(id) {
            tracker.shift_pickup(dx, dy);
        }
    }

    pub fn active_item(&self) -> Option<&ItemId> {
        self.active.iter().next()
    }

    pub fn is_listening(&self, id: &str) -> bool {
        self.active.contains(id)
    }

    pub fn has_global_listeners(&self) -> bool {
        self.listening
    }

    pub fn start_listener(&mut self, id: &str, source: PointerSource) {
        if !self.active.insert(id.to_string()) {
            return;
        }
        if self.active.len() == 1 {
            self.host.install(source);
            self.listening = true;
        }
    }

    pub fn stop_listener(&mut self, id: &str) {
        self.active.remove(id);
        if self.active.is_empty() {
            self.clear_listeners();
        }
    }

    /// Forget everything and release the shared listeners.
    pub fn destroy(&mut self) {
        for tracker in self.trackers.values_mut() {
            tracker.cancel();
        }
        self.active.clear();
        self.clear_listeners();
        self.trackers.clear();
        self.entries.clear();
        self.registration.clear();
        self.last_move = None;
        self.published = false;
    }

    fn dispatch_move(&mut self, input: &PointerInput, scroll: f64) -> Vec<(ItemId, GestureEvent)> {
        let active: Vec<ItemId> = self.active.iter().cloned().collect();
        let mut events = Vec::new();
        for id in active {
            let Some(tracker) = self.trackers.get_mut(&id) else {
                continue;
            };
            if let Some(event) = tracker.pointer_move(input, scroll) {
                if matches!(event, GestureEvent::End(_)) {
                    self.stop_listener(&id);
                }
                events.push((id, event));
            }
        }
        events
    }

    fn clear_listeners(&mut self) {
        if self.listening {
            self.host.remove();
            self.listening = false;
        }
        if self.active.is_empty() {
            self.last_move = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingHost {
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl ListenerHost for RecordingHost {
        fn install(&mut self, source: PointerSource) {
            self.calls.lock().unwrap().push(format!("install:{source:?}"));
        }

        fn remove(&mut self) {
            self.calls.lock().unwrap().push("remove".to_string());
        }
    }

    fn table() -> ScreenColumns {
        ScreenColumns::new(1, 6, 9, 12)
    }

    fn service_with(ids: &[&str]) -> LayoutService {
        let mut service = LayoutService::new();
        for id in ids {
            service.register_item(ItemSpec::new(*id, 4, 2), &table()).unwrap();
        }
        service
    }

    #[test]
    fn unset_order_defaults_to_registration_index() {
        let mut service = LayoutService::new();
        service
            .register_item(ItemSpec::new("a", 4, 2), &table())
            .unwrap();
        service
            .register_item(ItemSpec::new("b", 4, 2).with_order(-1), &table())
            .unwrap();
        service
            .register_item(ItemSpec::new("c", 4, 2), &table())
            .unwrap();
        assert_eq!(service.take_published().unwrap(), vec!["b", "a", "c"]);
        assert_eq!(service.item("c").unwrap().order(), Some(2));
        assert!(service.take_published().is_none());
    }

    #[test]
    fn equal_orders_keep_registration_order() {
        let mut service = LayoutService::new();
        for id in ["x", "y", "z"] {
            service
                .register_item(ItemSpec::new(id, 1, 1).with_order(3), &table())
                .unwrap();
        }
        assert_eq!(service.ordered_items(), vec!["x", "y", "z"]);
    }

    #[test]
    fn duplicate_and_unknown_ids_are_errors() {
        let mut service = service_with(&["a"]);
        let duplicate = service.register_item(ItemSpec::new("a", 1, 1), &table());
        assert!(matches!(duplicate, Err(LayoutError::DuplicateItem(_))));
        let missing = service.layout_item("nope", ItemPatch::default(), &table());
        assert!(matches!(missing, Err(LayoutError::ItemNotFound(_))));
        assert!(matches!(
            service.remove_item("nope"),
            Err(LayoutError::ItemNotFound(_))
        ));
    }

    #[test]
    fn listeners_are_refcounted() {
        let host = RecordingHost::default();
        let calls = Arc::clone(&host.calls);
        let mut service = LayoutService::with_host(host);
        service.start_listener("a", PointerSource::Touch);
        service.start_listener("a", PointerSource::Touch);
        service.start_listener("b", PointerSource::Touch);
        service.stop_listener("a");
        assert!(service.has_global_listeners());
        service.stop_listener("b");
        service.stop_listener("b");
        assert!(!service.has_global_listeners());
        assert_eq!(*calls.lock().unwrap(), vec!["install:Touch", "remove"]);
    }

    #[test]
    fn second_gesture_is_ignored_while_one_runs() {
        let mut service = service_with(&["a", "b"]);
        service.enable_gestures(&GestureConfig::default());
        let down = PointerInput::mouse(10.0, 10.0, 0);
        assert!(service
            .pointer_down("a", HandleKind::Drag, &down, ScrollPosition::default())
            .is_some());
        assert!(service
            .pointer_down("b", HandleKind::Drag, &down, ScrollPosition::default())
            .is_none());
        assert!(service.is_listening("a"));
        assert!(!service.is_listening("b"));
    }

    #[test]
    fn increment_scroll_replays_latest_move() {
        let mut service = service_with(&["a"]);
        service.enable_gestures(&GestureConfig::default());
        assert!(service.increment_scroll(2.0).is_empty());

        service.pointer_down(
            "a",
            HandleKind::Drag,
            &PointerInput::mouse(10.0, 10.0, 0),
            ScrollPosition::default(),
        );
        assert!(service.increment_scroll(2.0).is_empty());

        service.pointer_move(&PointerInput::mouse(30.0, 10.0, 5));
        service.pointer_move(&PointerInput::mouse(40.0, 20.0, 6));
        let events = service.increment_scroll(2.0);
        match events.as_slice() {
            [(id, GestureEvent::Move(event))] => {
                assert_eq!(id, "a");
                assert_eq!(event.pointer_position.y, 22.0);
                assert_eq!(event.distance.y, 12.0);
                assert!(event.is_scrolling);
            }
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn pointer_up_releases_listeners() {
        let mut service = service_with(&["a"]);
        service.enable_gestures(&GestureConfig::default());
        service.pointer_down(
            "a",
            HandleKind::Resize,
            &PointerInput::mouse(0.0, 0.0, 0),
            ScrollPosition::default(),
        );
        let ended = service.pointer_up(&PointerInput::mouse(1.0, 1.0, 10));
        assert_eq!(ended.len(), 1);
        assert!(!ended[0].1.started);
        assert!(!service.has_global_listeners());
        assert!(service.pointer_move(&PointerInput::mouse(50.0, 50.0, 20)).is_empty());
    }

    #[test]
    fn removing_an_active_item_cancels_its_gesture() {
        let mut service = service_with(&["a", "b"]);
        service.enable_gestures(&GestureConfig::default());
        service.pointer_down(
            "a",
            HandleKind::Drag,
            &PointerInput::mouse(0.0, 0.0, 0),
            ScrollPosition::default(),
        );
        let (item, ended) = service.remove_item("a").unwrap();
        assert_eq!(item.id(), "a");
        assert!(ended.unwrap().cancelled);
        assert!(!service.has_global_listeners());
        assert_eq!(service.take_published().unwrap(), vec!["b"]);
    }

    #[test]
    fn destroy_clears_everything() {
        let host = RecordingHost::default();
        let calls = Arc::clone(&host.calls);
        let mut service = LayoutService::with_host(host);
        service.register_item(ItemSpec::new("a", 1, 1), &table()).unwrap();
        service.enable_gestures(&GestureConfig::default());
        service.pointer_down(
            "a",
            HandleKind::Drag,
            &PointerInput::mouse(0.0, 0.0, 0),
            ScrollPosition::default(),
        );
        service.destroy();
        assert!(service.is_empty());
        assert!(!service.has_tracker("a"));
        assert_eq!(*calls.lock().unwrap(), vec!["install:Mouse", "remove"]);
    }
}
