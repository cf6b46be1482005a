//! Inline style declarations, class rules and user-agent defaults.

use common::{Px, Rect, Transform};
use indexmap::IndexMap;
use std::fmt;

/// An ordered block of `property: value` declarations (the `style` attribute).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleDeclarations {
    props: IndexMap<String, String>,
}

impl StyleDeclarations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a declaration block such as `left: 10px; display: none`.
    pub fn parse(css: &str) -> Self {
        let mut decls = Self::new();
        for declaration in css.split(';') {
            if let Some((name, value)) = declaration.split_once(':') {
                let name = name.trim();
                let value = value.trim();
                if !name.is_empty() && !value.is_empty() {
                    decls.set(name, value);
                }
            }
        }
        decls
    }

    /// Set a property; an empty value removes it, as `style.setProperty` does.
    pub fn set(&mut self, name: &str, value: &str) {
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();
        if value.is_empty() {
            self.props.shift_remove(&name);
        } else {
            self.props.insert(name, value.to_string());
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.props.get(name).map(|s| s.as_str())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.props.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.props.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for StyleDeclarations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in &self.props {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}: {};", name, value)?;
            first = false;
        }
        Ok(())
    }
}

/// A class selector rule, the only kind of author rule the document keeps.
#[derive(Clone, Debug)]
pub struct StyleRule {
    pub class: String,
    pub declarations: StyleDeclarations,
}

impl StyleRule {
    pub fn new(class: &str, css: &str) -> Self {
        Self {
            class: class.trim_start_matches('.').to_string(),
            declarations: StyleDeclarations::parse(css),
        }
    }
}

/// Initial values for the properties every element reports in its computed style.
///
/// `display` is element-dependent and `width`/`height` come from layout,
/// so those are resolved by the document.
pub const UA_DEFAULTS: &[(&str, &str)] = &[
    ("display", "inline"),
    ("position", "static"),
    ("visibility", "visible"),
    ("opacity", "1"),
    ("color", "rgb(0, 0, 0)"),
    ("background-color", "rgba(0, 0, 0, 0)"),
    ("border-radius", "0px"),
    ("box-sizing", "content-box"),
    ("font-size", "16px"),
    ("font-weight", "400"),
    ("overflow", "visible"),
    ("transform", "none"),
    ("transition", "all 0s ease 0s"),
    ("z-index", "auto"),
    ("left", "auto"),
    ("top", "auto"),
    ("right", "auto"),
    ("bottom", "auto"),
    ("width", "auto"),
    ("height", "auto"),
    ("text-decoration", "none"),
];

/// Initial value of a property, if it is one the document knows about.
pub fn initial_value(name: &str) -> Option<&'static str> {
    UA_DEFAULTS
        .iter()
        .find(|(prop, _)| *prop == name)
        .map(|(_, value)| *value)
}

/// Parse a `transform` value made of translate/scale functions.
///
/// Returns `None` for `none` or an unsupported function. The transform is
/// anchored at the centre of `rect`, matching the default `transform-origin`.
pub fn parse_transform(value: &str, rect: Rect) -> Option<Transform> {
    let value = value.trim();
    if value.is_empty() || value == "none" {
        return None;
    }

    let mut transform = Transform::IDENTITY;
    let mut rest = value;
    while !rest.is_empty() {
        let open = rest.find('(')?;
        let close = rest.find(')')?;
        let name = rest[..open].trim();
        let args: Vec<&str> = rest[open + 1..close].split(',').map(str::trim).collect();
        let step = match name {
            "translate" => {
                let x = Px::parse(args.first()?)?.get();
                let y = args.get(1).map_or(Some(Px::ZERO), |a| Px::parse(a))?.get();
                Transform::translation(x, y)
            }
            "translateX" => Transform::translation(Px::parse(args.first()?)?.get(), 0.0),
            "translateY" => Transform::translation(0.0, Px::parse(args.first()?)?.get()),
            "scale" => {
                let sx = args.first()?.parse::<f32>().ok()?;
                let sy = args.get(1).map_or(Some(sx), |a| a.parse::<f32>().ok())?;
                Transform::scale(sx, sy)
            }
            _ => return None,
        };
        // CSS applies the rightmost function to the element first
        transform = step.then(&transform);
        rest = rest[close + 1..].trim_start();
    }

    Some(transform.around(rect.center()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_declarations() {
        let decls = StyleDeclarations::parse("left: 10px; Display:none;; bogus");
        assert_eq!(decls.get("left"), Some("10px"));
        assert_eq!(decls.get("display"), Some("none"));
        assert_eq!(decls.len(), 2);
    }

    #[test]
    fn test_set_empty_removes() {
        let mut decls = StyleDeclarations::parse("transition: none");
        decls.set("transition", "");
        assert!(decls.is_empty());
    }

    #[test]
    fn test_serialize() {
        let mut decls = StyleDeclarations::new();
        decls.set("position", "fixed");
        decls.set("z-index", "9999");
        assert_eq!(decls.to_string(), "position: fixed; z-index: 9999;");
    }

    #[test]
    fn test_parse_transform() {
        let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
        let t = parse_transform("translate(10px, 20px)", rect).unwrap();
        let moved = t.transform_rect(rect);
        assert!(moved.approx_eq(&Rect::new(10.0, 20.0, 100.0, 100.0), 0.001));

        let scaled = parse_transform("scale(0.5)", rect).unwrap().transform_rect(rect);
        assert!(scaled.approx_eq(&Rect::new(25.0, 25.0, 50.0, 50.0), 0.001));

        assert!(parse_transform("none", rect).is_none());
        assert!(parse_transform("rotate(45deg)", rect).is_none());
    }

    #[test]
    fn test_class_rule() {
        let rule = StyleRule::new(".card", "opacity: 0.5");
        assert_eq!(rule.class, "card");
        assert_eq!(rule.declarations.get("opacity"), Some("0.5"));
        assert_eq!(initial_value("visibility"), Some("visible"));
    }
}
