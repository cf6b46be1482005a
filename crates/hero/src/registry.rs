//! Identity registry: which elements currently claim each hero id.

use common::HeroError;
use indexmap::IndexSet;
use std::collections::HashMap;
use std::hash::Hash;

/// How a validated pair switches between its two elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PairMode {
    /// Both elements stay in the tree; `display` toggles between them.
    Visibility,
    /// One element is removed as the other is inserted.
    Presence,
}

/// Side-table entry for a validated element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairInfo {
    pub mode: PairMode,
    /// Whether the element was `display: none` at the last observation.
    pub was_hidden: bool,
    /// The `display` value it shows with, once seen visible.
    pub natural_display: Option<String>,
}

impl PairInfo {
    fn visibility(display: &str) -> Self {
        let hidden = display == "none";
        Self {
            mode: PairMode::Visibility,
            was_hidden: hidden,
            natural_display: (!hidden).then(|| display.to_string()),
        }
    }

    fn presence() -> Self {
        Self {
            mode: PairMode::Presence,
            was_hidden: false,
            natural_display: None,
        }
    }

    /// Record a fresh `display` observation.
    pub fn observe(&mut self, display: &str) {
        self.was_hidden = display == "none";
        if !self.was_hidden && self.natural_display.is_none() {
            self.natural_display = Some(display.to_string());
        }
    }
}

/// What `validate` found for an id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PairValidation {
    /// Nothing registered under the id.
    Absent,
    /// Two elements: both marked as a visibility pair.
    Visibility,
    /// One element: marked as a presence pair and the id entry dropped.
    Presence,
    /// More than two elements; nothing was changed.
    Overflow { count: usize },
}

/// Hero id to element set, plus the pair side table.
#[derive(Debug)]
pub struct IdentityRegistry<E> {
    heroes: HashMap<String, IndexSet<E>>,
    pairs: HashMap<E, PairInfo>,
}

impl<E: Clone + Eq + Hash> IdentityRegistry<E> {
    pub fn new() -> Self {
        Self {
            heroes: HashMap::new(),
            pairs: HashMap::new(),
        }
    }

    /// Add an element under an id; registering twice is a no-op.
    pub fn register(&mut self, element: E, id: &str) -> bool {
        self.heroes.entry(id.to_string()).or_default().insert(element)
    }

    /// Remove an element from an id, dropping the id once empty.
    pub fn unregister(&mut self, element: &E, id: &str) -> bool {
        self.pairs.remove(element);
        if self.pairs.is_empty() {
            self.pairs.shrink_to_fit();
        }

        let Some(set) = self.heroes.get_mut(id) else {
            return false;
        };
        let removed = set.shift_remove(element);
        if set.is_empty() {
            self.heroes.remove(id);
            if self.heroes.is_empty() {
                self.heroes.shrink_to_fit();
            }
        }
        removed
    }

    /// Classify the elements under `id`. `display_of` reports each
    /// element's computed `display`.
    pub fn validate<F>(&mut self, id: &str, display_of: F) -> PairValidation
    where
        F: Fn(&E) -> String,
    {
        let Some(set) = self.heroes.get(id) else {
            return PairValidation::Absent;
        };

        match set.len() {
            2 => {
                for element in set {
                    let info = PairInfo::visibility(&display_of(element));
                    self.pairs.insert(element.clone(), info);
                }
                PairValidation::Visibility
            }
            0 | 1 => {
                for element in set {
                    self.pairs.insert(element.clone(), PairInfo::presence());
                }
                self.heroes.remove(id);
                PairValidation::Presence
            }
            count => {
                tracing::error!("{}", HeroError::duplicate(id, count));
                PairValidation::Overflow { count }
            }
        }
    }

    /// Elements registered under an id, in registration order.
    pub fn members(&self, id: &str) -> Vec<E> {
        self.heroes
            .get(id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The registered element of a visibility pair that is not `element`.
    pub fn partner(&self, id: &str, element: &E) -> Option<E> {
        self.heroes
            .get(id)?
            .iter()
            .find(|candidate| *candidate != element)
            .cloned()
    }

    pub fn pair_info(&self, element: &E) -> Option<&PairInfo> {
        self.pairs.get(element)
    }

    pub fn pair_info_mut(&mut self, element: &E) -> Option<&mut PairInfo> {
        self.pairs.get_mut(element)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.heroes.contains_key(id)
    }

    /// Number of ids with at least one element.
    pub fn len(&self) -> usize {
        self.heroes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heroes.is_empty()
    }
}

impl<E: Clone + Eq + Hash> Default for IdentityRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = IdentityRegistry::new();
        assert!(registry.register(1u32, "a"));
        assert!(!registry.register(1u32, "a"));
        registry.register(2, "a");
        assert_eq!(registry.members("a"), vec![1, 2]);
    }

    #[test]
    fn test_unregister_drops_empty_id() {
        let mut registry = IdentityRegistry::new();
        registry.register(1u32, "a");
        assert!(registry.unregister(&1, "a"));
        assert!(!registry.contains("a"));
        assert!(!registry.unregister(&1, "a"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister_then_register_restores_membership() {
        let mut registry = IdentityRegistry::new();
        registry.register(1u32, "a");
        registry.register(2, "a");
        registry.unregister(&1, "a");
        registry.register(1, "a");
        let mut members = registry.members("a");
        members.sort();
        assert_eq!(members, vec![1, 2]);
    }

    #[test]
    fn test_validate_visibility_pair() {
        let mut registry = IdentityRegistry::new();
        registry.register(1u32, "card-1");
        registry.register(2, "card-1");

        let result = registry.validate("card-1", |el| {
            if *el == 1 { "flex".to_string() } else { "none".to_string() }
        });
        assert_eq!(result, PairValidation::Visibility);

        let shown = registry.pair_info(&1).unwrap();
        assert_eq!(shown.mode, PairMode::Visibility);
        assert!(!shown.was_hidden);
        assert_eq!(shown.natural_display.as_deref(), Some("flex"));

        let hidden = registry.pair_info(&2).unwrap();
        assert!(hidden.was_hidden);
        assert_eq!(hidden.natural_display, None);
        assert_eq!(registry.partner("card-1", &1), Some(2));
    }

    #[test]
    fn test_validate_presence_pair() {
        let mut registry = IdentityRegistry::new();
        registry.register(7u32, "x");
        assert_eq!(registry.validate("x", |_| "block".into()), PairValidation::Presence);
        assert_eq!(registry.pair_info(&7).unwrap().mode, PairMode::Presence);
        assert!(!registry.contains("x"));

        registry.unregister(&7, "x");
        assert!(registry.pair_info(&7).is_none());
    }

    #[test]
    fn test_validate_overflow_changes_nothing() {
        let mut registry = IdentityRegistry::new();
        for el in 0u32..3 {
            registry.register(el, "crowded");
        }
        assert_eq!(
            registry.validate("crowded", |_| "block".into()),
            PairValidation::Overflow { count: 3 }
        );
        assert!(registry.pair_info(&0).is_none());
        assert_eq!(registry.members("crowded").len(), 3);
        assert_eq!(registry.validate("missing", |_| "block".into()), PairValidation::Absent);
    }

    #[test]
    fn test_observe_keeps_first_natural_display() {
        let mut info = PairInfo::visibility("none");
        info.observe("grid");
        info.observe("block");
        assert_eq!(info.natural_display.as_deref(), Some("grid"));
        info.observe("none");
        assert!(info.was_hidden);
    }
}
