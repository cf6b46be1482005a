//! Test harness: a `DomHost`, an engine on it and a local executor.

use crate::binding::HeroBinding;
use crate::config::{AnimationConfig, HeroConfig};
use crate::dom_host::DomHost;
use crate::engine::{HeroEngine, TransitionOutcome};
use crate::host::HeroHost;
use common::{HeroResult, Rect};
use dom::{Document, NodeId};
use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

pub(crate) type OutcomeSlot = Arc<Mutex<Option<HeroResult<TransitionOutcome>>>>;

pub(crate) struct Harness {
    pub host: DomHost,
    pub engine: HeroEngine<DomHost>,
    pool: LocalPool,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(HeroConfig::default())
    }

    pub fn with_config(config: HeroConfig) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();

        let host = DomHost::with_config(Document::new(), &config);
        let engine = HeroEngine::with_config(host.clone(), config);
        Self {
            host,
            engine,
            pool: LocalPool::new(),
        }
    }

    pub fn binding(&self) -> HeroBinding<DomHost, LocalSpawner> {
        HeroBinding::new(self.engine.clone(), self.pool.spawner())
    }

    /// A laid-out `div` appended to the body.
    pub fn element(&self, attributes: &[(&str, &str)], rect: Rect) -> NodeId {
        let mut document = self.host.document().write();
        let node = document.create_element("div");
        for (name, value) in attributes {
            document.set_attribute(node, name, value);
        }
        document.set_layout_box(node, rect);
        document.append_to_body(node);
        node
    }

    /// An element carrying `id`, registered with the engine.
    pub fn hero(&self, id: &str, rect: Rect) -> NodeId {
        let node = self.element(&[("data-hero-id", id)], rect);
        self.engine.register(node, id);
        node
    }

    pub fn hide(&self, node: NodeId) {
        self.host.set_inline_style(&node, "display", "none");
    }

    pub fn show(&self, node: NodeId) {
        self.host.remove_inline_style(&node, "display");
    }

    pub fn config(&self, id: &str) -> AnimationConfig<NodeId> {
        AnimationConfig::new(id, self.engine.config())
    }

    pub fn spawn(&self, source: NodeId, config: AnimationConfig<NodeId>) -> OutcomeSlot {
        let slot: OutcomeSlot = Arc::new(Mutex::new(None));
        let result = slot.clone();
        let engine = self.engine.clone();
        self.pool
            .spawner()
            .spawn_local(async move {
                let outcome = engine.run_transition(source, config).await;
                *result.lock() = Some(outcome);
            })
            .expect("spawn transition");
        slot
    }

    pub fn outcome(&self, slot: &OutcomeSlot) -> Option<TransitionOutcome> {
        slot.lock()
            .clone()
            .map(|result| result.expect("transition failed"))
    }

    /// Run tasks and microtasks until neither makes progress.
    pub fn drain(&mut self) {
        loop {
            self.pool.run_until_stalled();
            if !self.host.flush_microtasks() {
                break;
            }
        }
    }

    /// Advance the clock by `ms`, then render one frame.
    pub fn frame(&mut self, ms: u64) {
        self.host.advance(Duration::from_millis(ms));
        self.drain();
        self.host.run_frame();
        self.drain();
    }

    pub fn style(&self, node: NodeId, name: &str) -> Option<String> {
        self.host.inline_style(&node, name)
    }

    pub fn rect(&self, node: NodeId) -> Rect {
        self.host.bounding_client_rect(&node)
    }

    /// Attached proxies.
    pub fn proxies(&self) -> Vec<NodeId> {
        self.host
            .document()
            .read()
            .tree
            .find_elements_by_attribute(&self.engine.config().clone_attribute, "true")
    }

    pub fn single_proxy(&self) -> NodeId {
        let proxies = self.proxies();
        assert_eq!(proxies.len(), 1, "expected exactly one attached proxy");
        proxies[0]
    }
}
