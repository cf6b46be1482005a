//! The transition engine: registry, animation store and the FLIP orchestration.

use crate::config::{AnimationConfig, Container, HeroConfig};
use crate::geometry::{capture_rect, resolve_position};
use crate::host::{HeroHost, HostCallback};
use crate::registry::{IdentityRegistry, PairInfo, PairMode, PairValidation};
use crate::state::{AnimationState, LegId};
use crate::styles::copy_styles;
use common::{HeroResult, Px, Rect, Time};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How a call to [`HeroEngine::run_transition`] ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The proxy is animating; completion will follow on its own.
    Started { duration: Duration },
    /// No element to fly to was found.
    NoTarget,
    /// A later transition for the same id took over first.
    Superseded,
}

/// What an interrupting call inherits from the animation it took over.
struct TakeOver<E> {
    frozen: Option<E>,
    duration: Duration,
}

struct EngineInner<H: HeroHost> {
    host: H,
    config: HeroConfig,
    registry: Mutex<IdentityRegistry<H::Element>>,
    animations: Mutex<HashMap<String, AnimationState<H::Element>>>,
    next_leg: AtomicU64,
}

/// Hero transition engine over a host.
///
/// Cheap to clone; clones share the registry and the animation store.
pub struct HeroEngine<H: HeroHost> {
    inner: Arc<EngineInner<H>>,
}

impl<H: HeroHost> Clone for HeroEngine<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<H: HeroHost> HeroEngine<H> {
    pub fn new(host: H) -> Self {
        Self::with_config(host, HeroConfig::default())
    }

    pub fn with_config(host: H, config: HeroConfig) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                host,
                config,
                registry: Mutex::new(IdentityRegistry::new()),
                animations: Mutex::new(HashMap::new()),
                next_leg: AtomicU64::new(1),
            }),
        }
    }

    pub fn host(&self) -> &H {
        &self.inner.host
    }

    pub fn config(&self) -> &HeroConfig {
        &self.inner.config
    }

    /// Add an element to the set claiming `id`.
    pub fn register(&self, element: H::Element, id: &str) {
        if self.inner.registry.lock().register(element, id) {
            tracing::trace!(hero_id = id, "registered hero element");
        }
    }

    /// Remove an element from `id`, forgetting its pair classification.
    pub fn unregister(&self, element: &H::Element, id: &str) {
        if self.inner.registry.lock().unregister(element, id) {
            tracing::trace!(hero_id = id, "unregistered hero element");
        }
    }

    /// Classify the elements currently registered under `id`.
    pub fn validate_pair(&self, id: &str) -> PairValidation {
        let host = &self.inner.host;
        let result = self
            .inner
            .registry
            .lock()
            .validate(id, |element| display_of(host, element));
        tracing::debug!(hero_id = id, ?result, "validated hero pair");
        result
    }

    /// Validate `id` once the current batch of registrations has finished.
    pub fn schedule_validation(&self, id: &str) {
        let engine = self.clone();
        let id = id.to_string();
        self.inner.host.queue_microtask(Box::new(move || {
            engine.validate_pair(&id);
        }));
    }

    /// Pair classification of an element, if validated.
    pub fn pair_info(&self, element: &H::Element) -> Option<PairInfo> {
        self.inner.registry.lock().pair_info(element).cloned()
    }

    /// Computed `display` of an element, `block` when the host has none.
    pub fn display_of(&self, element: &H::Element) -> String {
        display_of(&self.inner.host, element)
    }

    /// Record an observed `display` value in the element's pair entry.
    pub fn refresh_pair(&self, element: &H::Element, display: &str) -> Option<PairInfo> {
        let mut registry = self.inner.registry.lock();
        let info = registry.pair_info_mut(element)?;
        info.observe(display);
        Some(info.clone())
    }

    /// Elements registered under `id`, in registration order.
    pub fn registered(&self, id: &str) -> Vec<H::Element> {
        self.inner.registry.lock().members(id)
    }

    pub fn is_animating(&self, id: &str) -> bool {
        self.inner.animations.lock().contains_key(id)
    }

    /// Snapshot of the animation running for `id`.
    pub fn animation(&self, id: &str) -> Option<AnimationState<H::Element>> {
        self.inner.animations.lock().get(id).cloned()
    }

    /// Number of ids with an animation in progress.
    pub fn active_animations(&self) -> usize {
        self.inner.animations.lock().len()
    }

    /// Animate a proxy of `source` to the element paired with it.
    ///
    /// If a transition for the same id is still running it is interrupted:
    /// the proxy is frozen where it is and flies on from there, taking the
    /// time already spent into account.
    #[tracing::instrument(skip_all, fields(hero_id = %config.id))]
    pub async fn run_transition(
        &self,
        source: H::Element,
        config: AnimationConfig<H::Element>,
    ) -> HeroResult<TransitionOutcome> {
        let host = &self.inner.host;
        let id = config.id.as_str();
        let leg = self.inner.next_leg.fetch_add(1, Ordering::Relaxed);

        let container = self.resolve_container(&config.container);
        let container_rect = capture_rect(host, &container);

        // `claimed`: this call took over a running animation.
        // `frozen`: the source is a temporary clone owned by this call.
        let (source, duration, claimed, frozen) =
            match self.take_over(id, leg, &container, config.duration)? {
                Some(TakeOver { frozen: Some(clone), duration }) => (clone, duration, true, true),
                Some(TakeOver { frozen: None, duration }) => (source, duration, true, false),
                None => (source, config.duration, false, false),
            };

        let visibility = if frozen {
            None
        } else {
            self.pair_info(&source)
                .filter(|info| info.mode == PairMode::Visibility)
        };

        if let Some(info) = &visibility {
            let display = info.natural_display.as_deref().unwrap_or("block");
            host.set_inline_style(&source, "display", display);
            host.settle().await;
        }

        let rect = capture_rect(host, &source);
        let proxy = match host.clone_element(&source) {
            Ok(proxy) => proxy,
            Err(err) => {
                if visibility.is_some() {
                    host.set_inline_style(&source, "display", "none");
                }
                if frozen {
                    host.remove_child(&source);
                    host.release(&source);
                }
                if claimed {
                    self.abandon(id, leg);
                }
                return Err(err);
            }
        };
        copy_styles(host, &source, &proxy);

        if visibility.is_some() {
            host.set_inline_style(&source, "display", "none");
        }
        if frozen {
            host.remove_child(&source);
            host.release(&source);
        }
        host.settle().await;

        let target = if visibility.is_some() {
            self.inner.registry.lock().partner(id, &source)
        } else {
            host.find_hero_target(id, &source)
        };
        let Some(target) = target else {
            tracing::debug!("no target element, aborting");
            host.release(&proxy);
            if claimed {
                self.abandon(id, leg);
            }
            return Ok(TransitionOutcome::NoTarget);
        };

        let target_rect = capture_rect(host, &target);
        let from = resolve_position(rect, container_rect, config.position);
        host.set_inline_style(&proxy, "position", config.position.as_str());
        host.set_inline_style(&proxy, "z-index", &config.z_index.to_string());
        set_box(host, &proxy, from.x, from.y, rect);
        host.set_attribute(&proxy, &self.inner.config.clone_attribute, "true");

        if !self.install_leg(id, leg, claimed, &proxy, &target, duration) {
            tracing::debug!("superseded before the proxy was attached");
            host.release(&proxy);
            return Ok(TransitionOutcome::Superseded);
        }

        host.set_inline_style(&target, "visibility", "hidden");
        if let Err(err) = host.append_child(&container, &proxy) {
            host.set_inline_style(&target, "visibility", "visible");
            self.abandon(id, leg);
            host.release(&proxy);
            return Err(err);
        }
        tracing::trace!(?rect, ?target_rect, duration_ms = duration.as_millis() as u64, "proxy attached");

        host.next_frame().await;
        if !self.is_current(id, leg) {
            tracing::debug!("superseded before the leg started");
            return Ok(TransitionOutcome::Superseded);
        }

        let fired = Arc::new(AtomicBool::new(false));
        host.on_transition_end(&proxy, self.completion(id, leg, fired.clone()));
        host.set_timeout(
            duration + config.delay + self.inner.config.completion_grace,
            self.completion(id, leg, fired),
        );

        host.set_inline_style(
            &proxy,
            "transition",
            &format!(
                "all {} {} {}",
                Time::from(duration),
                config.timing_function,
                Time::from(config.delay)
            ),
        );
        copy_styles(host, &target, &proxy);
        let to = resolve_position(target_rect, container_rect, config.position);
        set_box(host, &proxy, to.x, to.y, target_rect);

        Ok(TransitionOutcome::Started { duration })
    }

    fn resolve_container(&self, container: &Container<H::Element>) -> H::Element {
        let host = &self.inner.host;
        let resolved = match container {
            Container::Root => return host.root(),
            Container::Element(element) => Some(element.clone()),
            Container::Selector(selector) => host.query_selector(selector),
            Container::Ref(reference) => reference.read().clone(),
        };

        match resolved {
            Some(element) if host.is_connected(&element) => element,
            _ => {
                tracing::debug!("animation container unresolved, using root");
                host.root()
            }
        }
    }

    /// Interrupt the running animation for `id`, if any.
    ///
    /// Freezes the current proxy into a clone attached to `container` and
    /// drops the old proxy. A proxy that was never attached (its leg was
    /// itself superseded before starting) has nothing to freeze, and the
    /// caller's own source is used.
    fn take_over(
        &self,
        id: &str,
        leg: LegId,
        container: &H::Element,
        configured: Duration,
    ) -> HeroResult<Option<TakeOver<H::Element>>> {
        let host = &self.inner.host;
        let now = host.now();

        let (old_proxy, old_target, resume) = {
            let mut animations = self.inner.animations.lock();
            let Some(state) = animations.get_mut(id) else {
                return Ok(None);
            };
            let resume = state.interrupt(now, configured, leg);
            (state.proxy.clone(), state.target.clone(), resume)
        };
        tracing::debug!(
            direction = ?resume.direction,
            elapsed_ms = resume.elapsed.as_millis() as u64,
            leg_ms = resume.leg_duration.as_millis() as u64,
            "interrupting running transition"
        );

        if !host.is_connected(&old_proxy) {
            host.set_inline_style(&old_target, "visibility", "visible");
            return Ok(Some(TakeOver {
                frozen: None,
                duration: resume.leg_duration,
            }));
        }

        let frozen = host.clone_element(&old_proxy).and_then(|frozen| {
            copy_styles(host, &old_proxy, &frozen);
            for name in ["left", "top", "width", "height"] {
                if let Some(value) = host.computed_style(&old_proxy, name) {
                    host.set_inline_style(&frozen, name, &value);
                }
            }
            match host.append_child(container, &frozen) {
                Ok(()) => Ok(frozen),
                Err(err) => {
                    host.release(&frozen);
                    Err(err)
                }
            }
        });

        host.remove_child(&old_proxy);
        host.release(&old_proxy);
        host.set_inline_style(&old_target, "visibility", "visible");

        match frozen {
            Ok(frozen) => Ok(Some(TakeOver {
                frozen: Some(frozen),
                duration: resume.leg_duration,
            })),
            Err(err) => {
                self.abandon(id, leg);
                Err(err)
            }
        }
    }

    /// Record the leg about to start. Returns `false` if a later call owns the id.
    fn install_leg(
        &self,
        id: &str,
        leg: LegId,
        claimed: bool,
        proxy: &H::Element,
        target: &H::Element,
        duration: Duration,
    ) -> bool {
        let host = &self.inner.host;
        let now = host.now();

        let stale = {
            let mut animations = self.inner.animations.lock();
            if let Some(state) = animations.get_mut(id).filter(|state| state.is_current(leg)) {
                state.begin_leg(proxy.clone(), target.clone(), now, duration);
                return true;
            }
            if claimed {
                return false;
            }
            animations.insert(
                id.to_string(),
                AnimationState::new(proxy.clone(), target.clone(), leg, now, duration),
            )
        };

        // Another call started a leg while this one was suspended
        if let Some(stale) = stale {
            tracing::debug!("replacing a concurrently started animation");
            host.remove_child(&stale.proxy);
            host.release(&stale.proxy);
            host.set_inline_style(&stale.target, "visibility", "visible");
        }
        true
    }

    fn is_current(&self, id: &str, leg: LegId) -> bool {
        self.inner
            .animations
            .lock()
            .get(id)
            .is_some_and(|state| state.is_current(leg))
    }

    /// Remove the state for `id` if `leg` still owns it.
    fn abandon(&self, id: &str, leg: LegId) -> Option<AnimationState<H::Element>> {
        let mut animations = self.inner.animations.lock();
        if !animations.get(id).is_some_and(|state| state.is_current(leg)) {
            return None;
        }
        let state = animations.remove(id);
        if animations.is_empty() {
            animations.shrink_to_fit();
        }
        state
    }

    /// One-shot completion for a leg; `fired` is shared by every trigger of the leg.
    fn completion(&self, id: &str, leg: LegId, fired: Arc<AtomicBool>) -> HostCallback {
        let engine = self.clone();
        let id = id.to_string();
        Box::new(move || {
            if !fired.swap(true, Ordering::AcqRel) {
                engine.finish(&id, leg);
            }
        })
    }

    fn finish(&self, id: &str, leg: LegId) {
        let Some(state) = self.abandon(id, leg) else {
            tracing::trace!(hero_id = id, leg, "stale completion ignored");
            return;
        };
        let host = &self.inner.host;
        host.set_inline_style(&state.target, "visibility", "visible");
        host.remove_child(&state.proxy);
        host.release(&state.proxy);
        tracing::debug!(hero_id = id, legs = state.count, "hero transition finished");
    }
}

fn display_of<H: HeroHost>(host: &H, element: &H::Element) -> String {
    host.computed_style(element, "display")
        .unwrap_or_else(|| "block".to_string())
}

fn set_box<H: HeroHost>(host: &H, element: &H::Element, left: f32, top: f32, size: Rect) {
    host.set_inline_style(element, "left", &Px(left).to_string());
    host.set_inline_style(element, "top", &Px(top).to_string());
    host.set_inline_style(element, "width", &Px(size.width).to_string());
    host.set_inline_style(element, "height", &Px(size.height).to_string());
}
