//! The capabilities the engine needs from a rendering host.

use common::{HeroResult, Rect};
use futures::future::BoxFuture;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

/// Deferred work handed to the host.
pub type HostCallback = Box<dyn FnOnce() + Send + Sync>;

/// A view tree the engine can measure, restyle and animate.
///
/// Every method is synchronous except the two suspension points, and none
/// of them may call back into the engine before returning; callbacks are
/// only ever run later, from the host's own event loop.
pub trait HeroHost: Clone + Send + Sync + 'static {
    /// Handle to one element. Equality is element identity.
    type Element: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    /// The default animation container (the document body).
    fn root(&self) -> Self::Element;

    /// First connected element matching a selector.
    fn query_selector(&self, selector: &str) -> Option<Self::Element>;

    /// A connected, displayed, non-clone element carrying the hero id,
    /// other than `exclude`.
    fn find_hero_target(&self, id: &str, exclude: &Self::Element) -> Option<Self::Element>;

    fn is_connected(&self, element: &Self::Element) -> bool;

    /// Viewport rectangle of the element as currently rendered.
    fn bounding_client_rect(&self, element: &Self::Element) -> Rect;

    fn inline_style(&self, element: &Self::Element, name: &str) -> Option<String>;
    fn set_inline_style(&self, element: &Self::Element, name: &str, value: &str);
    fn remove_inline_style(&self, element: &Self::Element, name: &str);

    fn computed_style(&self, element: &Self::Element, name: &str) -> Option<String>;

    /// Every computed property, in a stable order.
    fn computed_styles(&self, element: &Self::Element) -> Vec<(String, String)>;

    fn set_attribute(&self, element: &Self::Element, name: &str, value: &str);

    /// Deep clone; the copy is detached.
    fn clone_element(&self, element: &Self::Element) -> HeroResult<Self::Element>;

    fn append_child(&self, parent: &Self::Element, child: &Self::Element) -> HeroResult<()>;

    /// Detach an element from its parent; a no-op when already detached.
    fn remove_child(&self, element: &Self::Element);

    /// Drop an element the engine created and no longer needs.
    fn release(&self, element: &Self::Element);

    /// Monotonic clock.
    fn now(&self) -> Duration;

    /// Resolves once pending tree updates have been applied.
    fn settle(&self) -> BoxFuture<'static, ()>;

    /// Resolves at the next rendering frame.
    fn next_frame(&self) -> BoxFuture<'static, ()>;

    /// Run a callback at the next rendering frame.
    fn request_frame(&self, callback: HostCallback);

    fn queue_microtask(&self, task: HostCallback);

    /// Run a callback once, the first time a transition on the element ends.
    fn on_transition_end(&self, element: &Self::Element, callback: HostCallback);

    fn set_timeout(&self, delay: Duration, callback: HostCallback);
}
