//! Element lifecycle glue: what a framework directive calls on mount, update
//! and unmount.

use crate::config::HeroOptions;
use crate::engine::HeroEngine;
use crate::host::HeroHost;
use crate::registry::PairMode;
use common::{HeroError, HeroResult};
use futures::future::FutureExt;
use futures::task::{noop_waker, LocalSpawn, LocalSpawnExt};
use std::task::Context;

/// Binds elements to an engine and launches their transitions on a spawner.
pub struct HeroBinding<H: HeroHost, S> {
    engine: HeroEngine<H>,
    spawner: S,
}

impl<H: HeroHost, S: LocalSpawn> HeroBinding<H, S> {
    pub fn new(engine: HeroEngine<H>, spawner: S) -> Self {
        Self { engine, spawner }
    }

    pub fn engine(&self) -> &HeroEngine<H> {
        &self.engine
    }

    /// The element was inserted: stamp its id, register it and validate
    /// the pair once the surrounding batch of mounts is done.
    pub fn mounted(&self, element: &H::Element, options: &HeroOptions) {
        let config = self.engine.config();
        self.engine
            .host()
            .set_attribute(element, &config.hero_attribute, &options.id);
        self.engine.register(element.clone(), &options.id);
        self.engine.schedule_validation(&options.id);
    }

    /// The element's owner re-rendered.
    ///
    /// A visibility-pair element that was showing before this update is
    /// the one being toggled away, so it flies to its partner.
    pub fn updated(&self, element: &H::Element, options: &HeroOptions) -> HeroResult<()> {
        let Some(info) = self.engine.pair_info(element) else {
            return Ok(());
        };
        if info.mode != PairMode::Visibility {
            return Ok(());
        }

        let display = self.engine.display_of(element);
        let launched = if info.was_hidden {
            Ok(())
        } else {
            self.launch(element.clone(), options)
        };
        self.engine.refresh_pair(element, &display);
        launched
    }

    /// The element is about to be removed.
    pub fn before_unmount(&self, element: &H::Element, options: &HeroOptions) -> HeroResult<()> {
        let presence = self
            .engine
            .pair_info(element)
            .is_some_and(|info| info.mode == PairMode::Presence);
        let launched = if presence {
            self.launch(element.clone(), options)
        } else {
            Ok(())
        };
        self.engine.unregister(element, &options.id);
        launched
    }

    /// Start a transition, running it up to its first suspension point
    /// before returning so the source is measured while still in place.
    fn launch(&self, source: H::Element, options: &HeroOptions) -> HeroResult<()> {
        let config = options.resolve(self.engine.config());
        let engine = self.engine.clone();
        let mut transition = async move {
            match engine.run_transition(source, config).await {
                Ok(outcome) => tracing::trace!(?outcome, "hero transition settled"),
                Err(err) => tracing::warn!(%err, "hero transition failed"),
            }
        }
        .boxed_local();

        let waker = noop_waker();
        if transition.poll_unpin(&mut Context::from_waker(&waker)).is_ready() {
            return Ok(());
        }
        self.spawner
            .spawn_local(transition)
            .map_err(|err| HeroError::internal(format!("cannot spawn hero transition: {}", err)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use common::Rect;

    #[test]
    fn test_mounted_stamps_and_validates() {
        let mut h = Harness::new();
        let binding = h.binding();
        let a = h.element(&[], Rect::new(0.0, 0.0, 10.0, 10.0));

        binding.mounted(&a, &HeroOptions::new("solo"));
        assert_eq!(
            h.host.document().read().get_attribute(a, "data-hero-id").as_deref(),
            Some("solo")
        );
        assert_eq!(h.engine.registered("solo"), vec![a]);

        h.drain();
        assert_eq!(h.engine.pair_info(&a).unwrap().mode, PairMode::Presence);
        assert!(h.engine.registered("solo").is_empty());
    }

    #[test]
    fn test_visibility_pair_toggle() {
        let mut h = Harness::new();
        let binding = h.binding();
        let options = HeroOptions::new("card-1").with_duration(400u64);
        let a = h.element(&[], Rect::new(0.0, 0.0, 100.0, 100.0));
        let b = h.element(&[], Rect::new(600.0, 200.0, 300.0, 300.0));
        h.hide(b);
        binding.mounted(&a, &options);
        binding.mounted(&b, &options);
        h.drain();

        // A framework patch swaps which element is displayed
        h.hide(a);
        h.show(b);
        binding.updated(&a, &options).unwrap();
        binding.updated(&b, &options).unwrap();

        assert!(h.engine.pair_info(&a).unwrap().was_hidden);
        let shown = h.engine.pair_info(&b).unwrap();
        assert!(!shown.was_hidden);
        assert_eq!(shown.natural_display.as_deref(), Some("block"));

        h.drain();
        let proxy = h.single_proxy();
        assert_eq!(h.rect(proxy), Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(h.style(a, "display").as_deref(), Some("none"));

        h.frame(16);
        h.frame(400);
        assert!(h.proxies().is_empty());
        assert!(!h.engine.is_animating("card-1"));
        assert_eq!(h.style(b, "visibility").as_deref(), Some("visible"));

        // And back again
        h.hide(b);
        h.show(a);
        binding.updated(&a, &options).unwrap();
        binding.updated(&b, &options).unwrap();
        h.drain();
        assert_eq!(h.engine.animation("card-1").unwrap().target, a);
        assert_eq!(h.rect(h.single_proxy()), Rect::new(600.0, 200.0, 300.0, 300.0));
    }

    #[test]
    fn test_update_without_toggle_on_hidden_element_is_quiet() {
        let mut h = Harness::new();
        let binding = h.binding();
        let options = HeroOptions::new("card-2");
        let a = h.element(&[], Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = h.element(&[], Rect::new(50.0, 0.0, 10.0, 10.0));
        h.hide(b);
        binding.mounted(&a, &options);
        binding.mounted(&b, &options);
        h.drain();

        binding.updated(&b, &options).unwrap();
        h.drain();
        assert!(h.proxies().is_empty());
        assert!(!h.engine.is_animating("card-2"));
    }

    #[test]
    fn test_presence_pair_swap() {
        let mut h = Harness::new();
        let binding = h.binding();
        let options = HeroOptions::new("x").with_position(crate::config::PositionMode::Fixed);
        let a = h.element(&[], Rect::new(20.0, 20.0, 80.0, 80.0));
        binding.mounted(&a, &options);
        h.drain();
        assert_eq!(h.engine.pair_info(&a).unwrap().mode, PairMode::Presence);

        // B is inserted in the same patch that removes A
        let b = h.element(&[], Rect::new(400.0, 100.0, 160.0, 160.0));
        binding.mounted(&b, &options);
        binding.before_unmount(&a, &options).unwrap();
        h.host.document().write().remove(a);
        assert!(h.engine.pair_info(&a).is_none());

        h.drain();
        let proxy = h.single_proxy();
        assert_eq!(h.rect(proxy), Rect::new(20.0, 20.0, 80.0, 80.0));
        assert_eq!(h.style(b, "visibility").as_deref(), Some("hidden"));

        h.frame(16);
        h.frame(1000);
        assert!(h.proxies().is_empty());
        assert_eq!(h.style(b, "visibility").as_deref(), Some("visible"));
        assert_eq!(h.engine.active_animations(), 0);
    }

    #[test]
    fn test_unmount_of_visibility_pair_does_not_animate() {
        let mut h = Harness::new();
        let binding = h.binding();
        let options = HeroOptions::new("gone");
        let a = h.element(&[], Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = h.element(&[], Rect::new(50.0, 0.0, 10.0, 10.0));
        binding.mounted(&a, &options);
        binding.mounted(&b, &options);
        h.drain();

        binding.before_unmount(&a, &options).unwrap();
        h.drain();
        assert!(h.proxies().is_empty());
        assert_eq!(h.engine.registered("gone"), vec![b]);
    }
}
