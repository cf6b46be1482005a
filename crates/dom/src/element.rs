//! Element data: tag, attributes and the parsed inline style.

use crate::style::StyleDeclarations;
use bitflags::bitflags;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

/// Lowercase tag name, interned across documents.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TagName(Arc<str>);

impl TagName {
    pub fn new(name: &str) -> Self {
        static INTERNED: Lazy<RwLock<HashMap<String, Arc<str>>>> =
            Lazy::new(|| RwLock::new(HashMap::new()));

        let lower = name.to_ascii_lowercase();
        if let Some(interned) = INTERNED.read().get(&lower) {
            return TagName(interned.clone());
        }

        let mut cache = INTERNED.write();
        let interned = cache
            .entry(lower)
            .or_insert_with_key(|key| Arc::from(key.as_str()))
            .clone();
        TagName(interned)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TagName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

bitflags! {
    /// Properties derived from the tag and attributes.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ElementFlags: u8 {
        /// Block-level by default.
        const BLOCK = 1 << 0;
        /// Carries the `hidden` attribute.
        const HIDDEN = 1 << 1;
    }
}

/// Element-specific data.
#[derive(Clone, Debug)]
pub struct ElementData {
    pub tag_name: TagName,
    /// Attributes by lowercase name, in insertion order.
    attributes: IndexMap<Arc<str>, String>,
    /// `id` attribute, cached for selector matching.
    pub id: Option<Arc<str>>,
    /// `class` attribute, split.
    pub classes: SmallVec<[Arc<str>; 4]>,
    pub flags: ElementFlags,
    /// Parsed `style` attribute.
    pub style: StyleDeclarations,
}

impl ElementData {
    pub fn new(tag_name: TagName) -> Self {
        let mut flags = ElementFlags::empty();
        if matches!(
            tag_name.as_str(),
            "article" | "aside" | "body" | "div" | "figure" | "footer" | "header" | "html" | "li"
                | "main" | "nav" | "ol" | "p" | "section" | "ul"
        ) {
            flags |= ElementFlags::BLOCK;
        }

        Self {
            tag_name,
            attributes: IndexMap::new(),
            id: None,
            classes: SmallVec::new(),
            flags,
            style: StyleDeclarations::new(),
        }
    }

    /// Set an attribute, updating the cached views of `id`, `class`,
    /// `style` and `hidden`.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match name.as_str() {
            "id" => self.id = Some(Arc::from(value)),
            "class" => self.classes = value.split_whitespace().map(Arc::from).collect(),
            "style" => self.style = StyleDeclarations::parse(value),
            "hidden" => self.flags.insert(ElementFlags::HIDDEN),
            _ => {}
        }
        self.attributes.insert(Arc::from(name), value.to_string());
    }

    pub fn remove_attribute(&mut self, name: &str) {
        let name = name.to_ascii_lowercase();
        match name.as_str() {
            "id" => self.id = None,
            "class" => self.classes.clear(),
            "style" => self.style = StyleDeclarations::new(),
            "hidden" => self.flags.remove(ElementFlags::HIDDEN),
            _ => {}
        }
        self.attributes.shift_remove(name.as_str());
    }

    #[inline]
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name.to_ascii_lowercase().as_str())
            .map(String::as_str)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c.as_ref() == class)
    }

    /// Set one inline style property, keeping the `style` attribute in sync.
    pub fn set_style_property(&mut self, name: &str, value: &str) {
        self.style.set(name, value);
        self.sync_style_attribute();
    }

    pub fn remove_style_property(&mut self, name: &str) -> Option<String> {
        let old = self.style.remove(name);
        self.sync_style_attribute();
        old
    }

    fn sync_style_attribute(&mut self) {
        if self.style.is_empty() {
            self.attributes.shift_remove("style");
        } else {
            self.attributes.insert(Arc::from("style"), self.style.to_string());
        }
    }

    /// `display` value used when no rule or inline style sets one.
    pub fn default_display(&self) -> &'static str {
        if self.flags.contains(ElementFlags::HIDDEN) {
            "none"
        } else if self.flags.contains(ElementFlags::BLOCK) {
            "block"
        } else {
            "inline"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn div() -> ElementData {
        ElementData::new(TagName::new("div"))
    }

    #[test]
    fn test_tag_name_interned_lowercase() {
        let a = TagName::new("DIV");
        let b = TagName::new("div");
        assert_eq!(a.as_str(), "div");
        assert!(Arc::ptr_eq(&a.0, &b.0));
    }

    #[test]
    fn test_element_attributes() {
        let mut elem = div();
        elem.set_attribute("ID", "test");
        elem.set_attribute("class", "foo bar baz");
        elem.set_attribute("data-hero-id", "card-1");

        assert_eq!(elem.id.as_deref(), Some("test"));
        assert_eq!(elem.get_attribute("id"), Some("test"));
        assert_eq!(elem.get_attribute("Data-Hero-Id"), Some("card-1"));
        assert!(elem.has_class("bar"));
        assert!(!elem.has_class("qux"));

        elem.remove_attribute("class");
        assert!(!elem.has_class("foo"));
        assert_eq!(elem.get_attribute("class"), None);
    }

    #[test]
    fn test_style_attribute_sync() {
        let mut elem = div();
        elem.set_attribute("style", "display: none");
        assert_eq!(elem.style.get("display"), Some("none"));

        elem.set_style_property("visibility", "hidden");
        assert_eq!(
            elem.get_attribute("style"),
            Some("display: none; visibility: hidden;")
        );

        elem.remove_style_property("display");
        elem.remove_style_property("visibility");
        assert_eq!(elem.get_attribute("style"), None);
    }

    #[test]
    fn test_default_display() {
        let span = ElementData::new(TagName::new("span"));
        let mut hidden = div();
        hidden.set_attribute("hidden", "");

        assert_eq!(div().default_display(), "block");
        assert_eq!(span.default_display(), "inline");
        assert_eq!(hidden.default_display(), "none");
        hidden.remove_attribute("hidden");
        assert_eq!(hidden.default_display(), "block");
    }
}
