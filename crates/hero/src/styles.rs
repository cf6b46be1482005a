//! Style snapshot from one element onto another.

use crate::host::HeroHost;

/// Substrings of property names the engine manages itself.
pub const EXCLUDED_PROPERTIES: &[&str] = &[
    "transition",
    "animation",
    "visibility",
    "position",
    "z-index",
    "left",
    "top",
    "right",
    "bottom",
    "inset",
    "width",
    "height",
    "text-decoration",
];

/// Whether a property is left alone by `copy_styles`.
///
/// Matching is by substring, so `border-top-width` and `max-width` are
/// skipped as well.
pub fn is_excluded(property: &str) -> bool {
    EXCLUDED_PROPERTIES
        .iter()
        .any(|excluded| property.contains(excluded))
}

/// Write every non-excluded computed property of `source` into the inline
/// style of `target`. Returns how many properties were copied.
pub fn copy_styles<H: HeroHost>(host: &H, source: &H::Element, target: &H::Element) -> usize {
    let mut copied = 0;
    for (name, value) in host.computed_styles(source) {
        if is_excluded(&name) {
            continue;
        }
        host.set_inline_style(target, &name, &value);
        copied += 1;
    }
    tracing::trace!(copied, "copied computed styles");
    copied
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusions_match_substrings() {
        for name in [
            "transition",
            "transition-duration",
            "animation-name",
            "z-index",
            "border-top-width",
            "max-width",
            "inset-inline-start",
            "text-decoration-line",
            "visibility",
        ] {
            assert!(is_excluded(name), "{} should be excluded", name);
        }
        for name in ["opacity", "color", "background-color", "border-radius", "transform", "display"] {
            assert!(!is_excluded(name), "{} should be copied", name);
        }
    }
}
