//! `HeroHost` implementation over the in-process DOM.

use crate::config::HeroConfig;
use crate::host::{HeroHost, HostCallback};
use common::{HeroError, HeroResult, Rect};
use dom::{Document, DocumentRef, Event, EventListenerOptions, NodeId, TaskQueue, TRANSITION_END};
use futures::channel::oneshot;
use futures::future::{BoxFuture, FutureExt};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;

/// A shared document driven by an explicit event loop.
///
/// Nothing runs on its own: the owner pumps microtasks, timers and frames
/// through [`flush_microtasks`](Self::flush_microtasks),
/// [`advance`](Self::advance) and [`run_frame`](Self::run_frame). Every
/// callback runs with the document unlocked.
#[derive(Clone)]
pub struct DomHost {
    document: DocumentRef,
    microtasks: TaskQueue,
    hero_attribute: Arc<str>,
    clone_attribute: Arc<str>,
}

impl DomHost {
    pub fn new(document: Document) -> Self {
        Self::with_config(document, &HeroConfig::default())
    }

    /// Use the attribute names of `config` for target lookup.
    pub fn with_config(document: Document, config: &HeroConfig) -> Self {
        let microtasks = document.window.microtasks().clone();
        Self {
            document: Arc::new(RwLock::new(document)),
            microtasks,
            hero_attribute: config.hero_attribute.as_str().into(),
            clone_attribute: config.clone_attribute.as_str().into(),
        }
    }

    pub fn document(&self) -> &DocumentRef {
        &self.document
    }

    /// Run microtasks until the queue is empty, including ones queued meanwhile.
    ///
    /// Returns `true` if anything ran.
    pub fn flush_microtasks(&self) -> bool {
        let mut ran = false;
        while let Some(task) = self.microtasks.pop() {
            task();
            ran = true;
        }
        ran
    }

    /// Move the clock forward and fire the timers that came due.
    pub fn advance(&self, delta: Duration) -> usize {
        let due = {
            let mut document = self.document.write();
            document.advance(delta);
            document.window.process_timers()
        };
        let fired = due.len();
        for task in due {
            task();
        }
        fired
    }

    /// One rendering frame: finish due transitions, then run frame callbacks.
    pub fn run_frame(&self) -> usize {
        let (callbacks, timestamp) = {
            let mut document = self.document.write();
            let ended = document.update_animations();
            if ended > 0 {
                tracing::trace!(ended, "transitions ended this frame");
            }
            (
                document.window.process_animation_frames(),
                document.window.now_ms(),
            )
        };
        let count = callbacks.len();
        for callback in callbacks {
            callback(timestamp);
        }
        count
    }
}

impl std::fmt::Debug for DomHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomHost")
            .field("microtasks", &self.microtasks)
            .field("hero_attribute", &self.hero_attribute)
            .finish()
    }
}

impl HeroHost for DomHost {
    type Element = NodeId;

    fn root(&self) -> NodeId {
        self.document.read().body()
    }

    fn query_selector(&self, selector: &str) -> Option<NodeId> {
        self.document.read().query_selector(selector)
    }

    fn find_hero_target(&self, id: &str, exclude: &NodeId) -> Option<NodeId> {
        let document = self.document.read();
        document
            .tree
            .find_elements_by_attribute(&self.hero_attribute, id)
            .into_iter()
            .find(|&node| {
                node != *exclude
                    && document.get_attribute(node, &self.clone_attribute).is_none()
                    && document.is_rendered(node)
            })
    }

    fn is_connected(&self, element: &NodeId) -> bool {
        self.document.read().is_connected(*element)
    }

    fn bounding_client_rect(&self, element: &NodeId) -> Rect {
        self.document.read().bounding_client_rect(*element)
    }

    fn inline_style(&self, element: &NodeId, name: &str) -> Option<String> {
        self.document.read().inline_style(*element, name)
    }

    fn set_inline_style(&self, element: &NodeId, name: &str, value: &str) {
        self.document.write().set_style_property(*element, name, value);
    }

    fn remove_inline_style(&self, element: &NodeId, name: &str) {
        self.document.write().remove_style_property(*element, name);
    }

    fn computed_style(&self, element: &NodeId, name: &str) -> Option<String> {
        self.document.read().computed_value(*element, name)
    }

    fn computed_styles(&self, element: &NodeId) -> Vec<(String, String)> {
        self.document.read().computed_styles(*element)
    }

    fn set_attribute(&self, element: &NodeId, name: &str, value: &str) {
        self.document.write().set_attribute(*element, name, value);
    }

    fn clone_element(&self, element: &NodeId) -> HeroResult<NodeId> {
        self.document
            .write()
            .clone_node(*element, true)
            .ok_or_else(|| HeroError::host(format!("cannot clone {:?}: no such node", element)))
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) -> HeroResult<()> {
        let mut document = self.document.write();
        for node in [parent, child] {
            if document.tree.get_element(*node).is_none() {
                return Err(HeroError::host(format!("cannot append: {:?} is not an element", node)));
            }
        }
        document.append_child(*parent, *child);
        Ok(())
    }

    fn remove_child(&self, element: &NodeId) {
        self.document.write().detach(*element);
    }

    fn release(&self, element: &NodeId) {
        self.document.write().remove(*element);
    }

    fn now(&self) -> Duration {
        self.document.read().window.now()
    }

    fn settle(&self) -> BoxFuture<'static, ()> {
        let (tx, rx) = oneshot::channel();
        self.microtasks.push(Box::new(move || {
            let _ = tx.send(());
        }));
        async move {
            let _ = rx.await;
        }
        .boxed()
    }

    fn next_frame(&self) -> BoxFuture<'static, ()> {
        let (tx, rx) = oneshot::channel();
        self.document
            .write()
            .window
            .request_animation_frame(Box::new(move |_| {
                let _ = tx.send(());
            }));
        async move {
            let _ = rx.await;
        }
        .boxed()
    }

    fn request_frame(&self, callback: HostCallback) {
        self.document
            .write()
            .window
            .request_animation_frame(Box::new(move |_| callback()));
    }

    fn queue_microtask(&self, task: HostCallback) {
        self.microtasks.push(task);
    }

    fn on_transition_end(&self, element: &NodeId, callback: HostCallback) {
        // Listeners run under the document lock; hand the callback to the
        // microtask queue instead of running it there.
        let slot = Mutex::new(Some(callback));
        let queue = self.microtasks.clone();
        self.document.write().add_event_listener(
            *element,
            TRANSITION_END,
            Arc::new(move |_: &mut Event| {
                if let Some(callback) = slot.lock().take() {
                    queue.push(callback);
                }
            }),
            EventListenerOptions::once(),
        );
    }

    fn set_timeout(&self, delay: Duration, callback: HostCallback) {
        self.document.write().window.set_timeout(callback, delay);
    }
}
