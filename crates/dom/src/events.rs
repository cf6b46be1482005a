//! Transition events and listener dispatch.

use crate::node::NodeId;
use std::collections::HashMap;
use std::sync::Arc;

/// Fired on an element when one of its CSS transitions completes.
pub const TRANSITION_END: &str = "transitionend";

/// Event phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventPhase {
    None,
    AtTarget,
    Bubbling,
}

/// A dispatched event. Transition events always bubble.
#[derive(Clone, Debug)]
pub struct Event {
    pub event_type: String,
    pub target: Option<NodeId>,
    pub current_target: Option<NodeId>,
    pub phase: EventPhase,
    /// Timestamp in milliseconds on the window clock.
    pub timestamp: f64,
    /// Property the transition animated.
    pub property_name: String,
    /// Seconds the transition had been running when the event fired.
    pub elapsed_time: f64,
}

impl Event {
    /// A `transition*` event for one property.
    pub fn transition(event_type: &str, property: &str, elapsed_time: f64, timestamp: f64) -> Self {
        Self {
            event_type: event_type.to_string(),
            target: None,
            current_target: None,
            phase: EventPhase::None,
            timestamp,
            property_name: property.to_string(),
            elapsed_time,
        }
    }
}

/// Event listener callback type.
pub type EventCallback = Arc<dyn Fn(&mut Event) + Send + Sync>;

/// Event listener options.
#[derive(Clone, Debug, Default)]
pub struct EventListenerOptions {
    /// Drop the listener after its first invocation.
    pub once: bool,
}

impl EventListenerOptions {
    pub fn once() -> Self {
        Self { once: true }
    }
}

#[derive(Clone)]
struct EventListener {
    id: u64,
    callback: EventCallback,
    options: EventListenerOptions,
}

/// Listener registry and dispatch.
///
/// Callbacks run while the owning document is borrowed, so they must not
/// call back into it; hosts queue follow-up work instead.
#[derive(Default)]
pub struct EventManager {
    listeners: HashMap<NodeId, HashMap<String, Vec<EventListener>>>,
    next_id: u64,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        callback: EventCallback,
        options: EventListenerOptions,
    ) {
        self.next_id += 1;
        self.listeners
            .entry(node)
            .or_default()
            .entry(event_type.to_string())
            .or_default()
            .push(EventListener {
                id: self.next_id,
                callback,
                options,
            });
    }

    /// Number of listeners for a node and event type.
    pub fn listener_count(&self, node: NodeId, event_type: &str) -> usize {
        self.listeners
            .get(&node)
            .and_then(|n| n.get(event_type))
            .map_or(0, |l| l.len())
    }

    /// Dispatch to `target`, then bubble. `path` starts at the target and
    /// walks up to the root.
    pub fn dispatch(&mut self, target: NodeId, event: &mut Event, path: &[NodeId]) {
        event.target = Some(target);

        for (depth, &node) in path.iter().enumerate() {
            event.phase = if depth == 0 {
                EventPhase::AtTarget
            } else {
                EventPhase::Bubbling
            };
            event.current_target = Some(node);
            self.invoke_listeners(node, event);
        }

        event.phase = EventPhase::None;
    }

    fn invoke_listeners(&mut self, node: NodeId, event: &mut Event) {
        let Some(type_listeners) = self
            .listeners
            .get_mut(&node)
            .and_then(|n| n.get_mut(&event.event_type))
        else {
            return;
        };

        // Listeners added by a callback wait for the next event
        let snapshot = type_listeners.clone();
        type_listeners.retain(|l| !l.options.once);
        for listener in &snapshot {
            (listener.callback)(event);
        }
    }

    /// Remove all listeners for a node.
    pub fn remove_all(&mut self, node: NodeId) {
        self.listeners.remove(&node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn node_ids(n: usize) -> Vec<NodeId> {
        let mut map: SlotMap<NodeId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn test_once_listener_fires_once() {
        let ids = node_ids(1);
        let mut events = EventManager::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        events.add_listener(
            ids[0],
            TRANSITION_END,
            Arc::new(move |_: &mut Event| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
            EventListenerOptions::once(),
        );

        for _ in 0..2 {
            let mut event = Event::transition(TRANSITION_END, "left", 0.3, 300.0);
            events.dispatch(ids[0], &mut event, &ids);
        }

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(events.listener_count(ids[0], TRANSITION_END), 0);
    }

    #[test]
    fn test_bubbles_to_ancestor() {
        let ids = node_ids(2);
        let (child, parent) = (ids[0], ids[1]);
        let mut events = EventManager::new();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let log = seen.clone();
        events.add_listener(
            parent,
            TRANSITION_END,
            Arc::new(move |e: &mut Event| log.lock().push((e.target, e.phase))),
            EventListenerOptions::default(),
        );

        let mut event = Event::transition(TRANSITION_END, "top", 0.1, 0.0);
        events.dispatch(child, &mut event, &[child, parent]);

        assert_eq!(*seen.lock(), vec![(Some(child), EventPhase::Bubbling)]);
        assert_eq!(event.phase, EventPhase::None);
        assert_eq!(events.listener_count(parent, TRANSITION_END), 1);
    }

    #[test]
    fn test_other_event_types_are_ignored() {
        let ids = node_ids(1);
        let mut events = EventManager::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        events.add_listener(
            ids[0],
            TRANSITION_END,
            Arc::new(move |_: &mut Event| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
            EventListenerOptions::once(),
        );

        let mut event = Event::transition("transitioncancel", "left", 0.0, 0.0);
        events.dispatch(ids[0], &mut event, &ids);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(events.listener_count(ids[0], TRANSITION_END), 1);
    }
}
