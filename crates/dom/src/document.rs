//! DOM Document implementation.

use crate::element::{ElementData, TagName};
use crate::events::{Event, EventCallback, EventListenerOptions, EventManager, TRANSITION_END};
use crate::node::NodeId;
use crate::style::{initial_value, parse_transform, StyleRule, UA_DEFAULTS};
use crate::transition::{NumericValue, RunningTransition, TransitionSet, TransitionSpec};
use crate::tree::DomTree;
use crate::window::Window;
use common::{Px, Rect};
use indexmap::IndexSet;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

/// DOM Document.
pub struct Document {
    /// The DOM tree.
    pub tree: DomTree,
    /// Window (viewport, clock and task queues).
    pub window: Window,
    /// Event listeners.
    pub events: EventManager,
    /// Running CSS transitions.
    pub transitions: TransitionSet,
    /// Class rules, in insertion order.
    rules: Vec<StyleRule>,
    /// Document element (<html>).
    document_element: NodeId,
    /// Body element.
    body: NodeId,
}

impl Document {
    pub fn new() -> Self {
        let mut tree = DomTree::new();
        let window = Window::new();
        let root = tree.root();

        let html = tree.create_element(ElementData::new(TagName::new("html")));
        let body = tree.create_element(ElementData::new(TagName::new("body")));
        tree.append_child(root, html);
        tree.append_child(html, body);

        let viewport = Rect::new(0.0, 0.0, window.inner_width as f32, window.inner_height as f32);
        tree.set_layout_box(html, Some(viewport));
        tree.set_layout_box(body, Some(viewport));

        Self {
            tree,
            window,
            events: EventManager::new(),
            transitions: TransitionSet::new(),
            rules: Vec::new(),
            document_element: html,
            body,
        }
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    /// Get body element.
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Create an element.
    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.tree.create_element(ElementData::new(TagName::new(tag_name)))
    }

    /// Append a child, moving it from its old parent if needed.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.cancel_transitions_in(child);
        self.tree.append_child(parent, child);
    }

    /// Append child to body.
    pub fn append_to_body(&mut self, node: NodeId) {
        let body = self.body;
        self.append_child(body, node);
    }

    /// Take a node out of the tree, keeping it alive for reinsertion.
    pub fn detach(&mut self, node: NodeId) {
        self.cancel_transitions_in(node);
        self.tree.remove_from_parent(node);
    }

    /// Remove a node and its subtree, freeing their storage and listeners.
    pub fn remove(&mut self, node: NodeId) {
        if node == self.root() || node == self.document_element || node == self.body {
            return;
        }
        let subtree: Vec<NodeId> = std::iter::once(node)
            .chain(self.tree.descendants(node))
            .collect();
        for &id in &subtree {
            self.transitions.cancel_node(id);
            self.events.remove_all(id);
        }
        self.tree.remove(node);
    }

    fn cancel_transitions_in(&mut self, node: NodeId) {
        let subtree: Vec<NodeId> = std::iter::once(node)
            .chain(self.tree.descendants(node))
            .collect();
        for id in subtree {
            self.transitions.cancel_node(id);
        }
    }

    /// Clone a node; the copy is detached and has no layout box.
    pub fn clone_node(&mut self, node: NodeId, deep: bool) -> Option<NodeId> {
        self.tree.clone_node(node, deep)
    }

    /// Whether the node is in the document.
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.tree.is_connected(node)
    }

    /// Query selector.
    pub fn query_selector(&self, selector: &str) -> Option<NodeId> {
        self.tree.query_selector(selector)
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(elem) = self.tree.get_element_mut(node) {
            elem.set_attribute(name, value);
        }
    }

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.tree
            .get_element(node)
            .and_then(|e| e.get_attribute(name))
            .map(str::to_string)
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(elem) = self.tree.get_element_mut(node) {
            elem.remove_attribute(name);
        }
    }

    /// Add a `.class { ... }` rule.
    pub fn add_rule(&mut self, class: &str, css: &str) {
        self.rules.push(StyleRule::new(class, css));
    }

    /// Assign the layout box of a node, as a layout pass would.
    pub fn set_layout_box(&mut self, node: NodeId, rect: Rect) {
        self.tree.set_layout_box(node, Some(rect));
    }

    /// Inline style value of one property.
    pub fn inline_style(&self, node: NodeId, name: &str) -> Option<String> {
        self.tree
            .get_element(node)
            .and_then(|e| e.style.get(name))
            .map(str::to_string)
    }

    /// Set an inline style property, starting a CSS transition when the
    /// element's `transition` covers it.
    ///
    /// Returns `true` when a transition was started.
    pub fn set_style_property(&mut self, node: NodeId, name: &str, value: &str) -> bool {
        let name = name.trim().to_ascii_lowercase();
        let before = self.computed_value(node, &name);

        match self.tree.get_element_mut(node) {
            Some(elem) => elem.set_style_property(&name, value),
            None => return false,
        }

        self.update_transition(node, &name, before)
    }

    /// Remove an inline style property.
    pub fn remove_style_property(&mut self, node: NodeId, name: &str) -> bool {
        let name = name.trim().to_ascii_lowercase();
        let before = self.computed_value(node, &name);

        match self.tree.get_element_mut(node) {
            Some(elem) => {
                elem.remove_style_property(&name);
            }
            None => return false,
        }

        self.update_transition(node, &name, before)
    }

    fn update_transition(&mut self, node: NodeId, name: &str, before: Option<String>) -> bool {
        // Re-setting the value a transition is already heading to keeps it running
        if let Some(running) = self.transitions.get(node, name) {
            let target = self.specified_value(node, name);
            if target.as_deref().and_then(NumericValue::parse) == Some(running.to) {
                return false;
            }
        }
        self.transitions.cancel(node, name);

        if !self.is_rendered(node) {
            return false;
        }

        let after = self.computed_value(node, name);
        let (Some(before), Some(after)) = (before, after) else {
            return false;
        };
        if before == after {
            return false;
        }
        let (Some(from), Some(to)) = (NumericValue::parse(&before), NumericValue::parse(&after)) else {
            return false;
        };

        let specs = self
            .computed_value(node, "transition")
            .map(|v| TransitionSpec::parse_list(&v))
            .unwrap_or_default();
        let Some(spec) = TransitionSpec::find(&specs, name) else {
            return false;
        };
        // Zero-length transitions do not run and never fire `transitionend`
        if spec.duration.is_zero() {
            return false;
        }

        tracing::trace!(property = name, from = %before, to = %after, "starting transition");
        self.transitions.start(
            node,
            RunningTransition {
                property: name.to_string(),
                from,
                to,
                start: self.window.now() + spec.delay,
                duration: spec.duration,
                timing: spec.timing,
            },
        );
        true
    }

    /// Value a property resolves to before transitions are applied.
    fn specified_value(&self, node: NodeId, name: &str) -> Option<String> {
        let elem = self.tree.get_element(node)?;

        if let Some(value) = elem.style.get(name) {
            return Some(value.to_string());
        }

        let from_rule = self
            .rules
            .iter()
            .rev()
            .filter(|rule| elem.has_class(&rule.class))
            .find_map(|rule| rule.declarations.get(name));
        if let Some(value) = from_rule {
            return Some(value.to_string());
        }

        match name {
            "display" => Some(elem.default_display().to_string()),
            "width" | "height" => {
                let layout = self.tree.get(node)?.layout_box;
                match layout {
                    Some(rect) if name == "width" => Some(Px(rect.width).to_string()),
                    Some(rect) => Some(Px(rect.height).to_string()),
                    None => initial_value(name).map(str::to_string),
                }
            }
            _ => initial_value(name).map(str::to_string),
        }
    }

    /// Computed value of one property; `None` for unknown properties.
    pub fn computed_value(&self, node: NodeId, name: &str) -> Option<String> {
        if let Some(running) = self.transitions.get(node, name) {
            return Some(running.value_at(self.window.now()));
        }
        self.specified_value(node, name)
    }

    /// Every property of the computed style, in a stable order.
    pub fn computed_styles(&self, node: NodeId) -> Vec<(String, String)> {
        let Some(elem) = self.tree.get_element(node) else {
            return Vec::new();
        };

        let mut names: IndexSet<String> = UA_DEFAULTS
            .iter()
            .map(|(name, _)| name.to_string())
            .collect();
        for rule in self.rules.iter().filter(|r| elem.has_class(&r.class)) {
            for (name, _) in rule.declarations.iter() {
                names.insert(name.to_string());
            }
        }
        for (name, _) in elem.style.iter() {
            names.insert(name.to_string());
        }

        names
            .into_iter()
            .filter_map(|name| {
                let value = self.computed_value(node, &name)?;
                Some((name, value))
            })
            .collect()
    }

    /// Whether the node is connected and neither it nor an ancestor is `display: none`.
    pub fn is_rendered(&self, node: NodeId) -> bool {
        if !self.tree.is_connected(node) {
            return false;
        }
        std::iter::once(node)
            .chain(self.tree.ancestors(node))
            .filter(|&id| self.tree.get_element(id).is_some())
            .all(|id| self.specified_value(id, "display").as_deref() != Some("none"))
    }

    /// `getBoundingClientRect()`: zero for nodes that are not rendered.
    pub fn bounding_client_rect(&self, node: NodeId) -> Rect {
        if !self.is_rendered(node) {
            return Rect::ZERO;
        }
        let layout = self
            .tree
            .get(node)
            .and_then(|n| n.layout_box)
            .unwrap_or(Rect::ZERO);

        let px = |name: &str| {
            self.computed_value(node, name)
                .and_then(|v| Px::parse(&v))
                .map(Px::get)
        };

        let position = self.computed_value(node, "position").unwrap_or_default();
        let rect = match position.as_str() {
            "fixed" | "absolute" => {
                let mut rect = Rect::new(
                    px("left").unwrap_or(layout.x),
                    px("top").unwrap_or(layout.y),
                    px("width").unwrap_or(layout.width),
                    px("height").unwrap_or(layout.height),
                );
                if position == "absolute" {
                    // The parent stands in for the containing block
                    if let Some(parent) = self.tree.parent(node) {
                        if self.tree.get_element(parent).is_some() {
                            let origin = self.bounding_client_rect(parent);
                            rect = rect.translate(origin.x, origin.y);
                        }
                    }
                }
                rect
            }
            _ => layout,
        };

        match self
            .computed_value(node, "transform")
            .and_then(|v| parse_transform(&v, rect))
        {
            Some(transform) => transform.transform_rect(rect),
            None => rect,
        }
    }

    /// Add an event listener.
    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        callback: EventCallback,
        options: EventListenerOptions,
    ) {
        self.events.add_listener(node, event_type, callback, options);
    }

    /// Dispatch an event along the node's ancestor path.
    pub fn dispatch_event(&mut self, target: NodeId, event: &mut Event) {
        let path: Vec<NodeId> = std::iter::once(target)
            .chain(self.tree.ancestors(target))
            .collect();
        self.events.dispatch(target, event, &path);
    }

    /// Move the clock forward.
    pub fn advance(&mut self, delta: Duration) {
        self.window.advance(delta);
    }

    /// Finish transitions that reached their end and fire `transitionend`.
    ///
    /// Returns the number of events dispatched.
    pub fn update_animations(&mut self) -> usize {
        let now = self.window.now();
        let finished = self.transitions.take_finished(now);
        let count = finished.len();
        for (node, transition) in finished {
            let mut event = Event::transition(
                TRANSITION_END,
                &transition.property,
                transition.duration.as_secs_f64(),
                self.window.now_ms(),
            );
            self.dispatch_event(node, &mut event);
        }
        count
    }

    /// Number of transitions running on a node.
    pub fn running_transitions(&self, node: NodeId) -> usize {
        self.transitions.count(node)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared document reference.
pub type DocumentRef = Arc<RwLock<Document>>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn boxed(doc: &mut Document, rect: Rect) -> NodeId {
        let div = doc.create_element("div");
        doc.append_to_body(div);
        doc.set_layout_box(div, rect);
        div
    }

    #[test]
    fn test_document_creation() {
        let doc = Document::new();
        assert!(doc.is_connected(doc.body()));
        assert_eq!(doc.bounding_client_rect(doc.body()).width, 1920.0);
    }

    #[test]
    fn test_computed_style_cascade() {
        let mut doc = Document::new();
        doc.add_rule(".faded", "opacity: 0.5; color: red");
        let div = boxed(&mut doc, Rect::new(0.0, 0.0, 40.0, 30.0));
        doc.set_attribute(div, "class", "faded");
        doc.set_style_property(div, "color", "blue");

        assert_eq!(doc.computed_value(div, "opacity").as_deref(), Some("0.5"));
        assert_eq!(doc.computed_value(div, "color").as_deref(), Some("blue"));
        assert_eq!(doc.computed_value(div, "display").as_deref(), Some("block"));
        assert_eq!(doc.computed_value(div, "width").as_deref(), Some("40px"));
        assert_eq!(doc.computed_value(div, "no-such-prop"), None);

        let styles = doc.computed_styles(div);
        assert!(styles.iter().any(|(n, v)| n == "visibility" && v == "visible"));
    }

    #[test]
    fn test_bounding_rect_display_none() {
        let mut doc = Document::new();
        let outer = boxed(&mut doc, Rect::new(0.0, 0.0, 100.0, 100.0));
        let inner = doc.create_element("div");
        doc.append_child(outer, inner);
        doc.set_layout_box(inner, Rect::new(10.0, 10.0, 20.0, 20.0));
        assert_eq!(doc.bounding_client_rect(inner), Rect::new(10.0, 10.0, 20.0, 20.0));

        doc.set_style_property(outer, "display", "none");
        assert_eq!(doc.bounding_client_rect(inner), Rect::ZERO);

        doc.set_style_property(outer, "display", "");
        doc.detach(inner);
        assert_eq!(doc.bounding_client_rect(inner), Rect::ZERO);
    }

    #[test]
    fn test_bounding_rect_positioned() {
        let mut doc = Document::new();
        let container = boxed(&mut doc, Rect::new(50.0, 60.0, 300.0, 300.0));
        let child = doc.create_element("div");
        doc.append_child(container, child);
        for (name, value) in [
            ("position", "absolute"),
            ("left", "10px"),
            ("top", "20px"),
            ("width", "30px"),
            ("height", "40px"),
        ] {
            doc.set_style_property(child, name, value);
        }
        assert_eq!(doc.bounding_client_rect(child), Rect::new(60.0, 80.0, 30.0, 40.0));

        doc.set_style_property(child, "position", "fixed");
        assert_eq!(doc.bounding_client_rect(child), Rect::new(10.0, 20.0, 30.0, 40.0));
    }

    #[test]
    fn test_bounding_rect_transform() {
        let mut doc = Document::new();
        let div = boxed(&mut doc, Rect::new(0.0, 0.0, 100.0, 100.0));
        doc.set_style_property(div, "transform", "translateX(15px)");
        let rect = doc.bounding_client_rect(div);
        assert!(rect.approx_eq(&Rect::new(15.0, 0.0, 100.0, 100.0), 0.001));
    }

    #[test]
    fn test_transition_runs_and_fires_transitionend() {
        let mut doc = Document::new();
        let div = boxed(&mut doc, Rect::ZERO);
        doc.set_style_property(div, "position", "fixed");
        doc.set_style_property(div, "left", "0px");
        doc.set_style_property(div, "transition", "all 100ms linear 0ms");

        let ended = Arc::new(AtomicUsize::new(0));
        let counter = ended.clone();
        doc.add_event_listener(
            div,
            "transitionend",
            Arc::new(move |_: &mut Event| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
            EventListenerOptions::once(),
        );

        assert!(doc.set_style_property(div, "left", "100px"));
        doc.advance(Duration::from_millis(50));
        assert_eq!(doc.computed_value(div, "left").as_deref(), Some("50px"));
        assert_eq!(doc.update_animations(), 0);

        doc.advance(Duration::from_millis(50));
        assert_eq!(doc.update_animations(), 1);
        assert_eq!(ended.load(Ordering::SeqCst), 1);
        assert_eq!(doc.computed_value(div, "left").as_deref(), Some("100px"));
    }

    #[test]
    fn test_zero_duration_starts_nothing() {
        let mut doc = Document::new();
        let div = boxed(&mut doc, Rect::ZERO);
        doc.set_style_property(div, "left", "0px");
        doc.set_style_property(div, "transition", "all 0ms ease 0ms");
        assert!(!doc.set_style_property(div, "left", "10px"));
        assert_eq!(doc.running_transitions(div), 0);
    }

    #[test]
    fn test_detach_cancels_transitions() {
        let mut doc = Document::new();
        let div = boxed(&mut doc, Rect::ZERO);
        doc.set_style_property(div, "top", "0px");
        doc.set_style_property(div, "transition", "top 1s");
        doc.set_style_property(div, "top", "10px");
        assert_eq!(doc.running_transitions(div), 1);

        doc.detach(div);
        assert_eq!(doc.running_transitions(div), 0);

        doc.remove(div);
        assert!(doc.tree.get(div).is_none());
    }
}
