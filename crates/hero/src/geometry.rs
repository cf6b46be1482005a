//! Layout capture that ignores in-flight transforms and transitions.

use crate::config::PositionMode;
use crate::host::HeroHost;
use common::{Point, Rect};

/// Untransformed viewport rectangle of an element.
///
/// Inline `transform` and `transition` are neutralised for the read.
/// `transform` comes back immediately; `transition` only at the next frame,
/// so restoring it cannot animate the element back from the measured state.
pub fn capture_rect<H: HeroHost>(host: &H, element: &H::Element) -> Rect {
    let transform = host.inline_style(element, "transform");
    let transition = host.inline_style(element, "transition");

    host.set_inline_style(element, "transform", "none");
    host.set_inline_style(element, "transition", "none");
    let rect = host.bounding_client_rect(element);
    restore(host, element, "transform", transform);

    let deferred_host = host.clone();
    let deferred_element = element.clone();
    host.request_frame(Box::new(move || {
        restore(&deferred_host, &deferred_element, "transition", transition);
    }));

    rect
}

fn restore<H: HeroHost>(host: &H, element: &H::Element, name: &str, value: Option<String>) {
    match value {
        Some(value) => host.set_inline_style(element, name, &value),
        None => host.remove_inline_style(element, name),
    }
}

/// Top-left corner the proxy should use for `rect`.
pub fn resolve_position(rect: Rect, container: Rect, mode: PositionMode) -> Point {
    match mode {
        PositionMode::Absolute => rect.relative_to(container.origin()).origin(),
        PositionMode::Fixed => rect.origin(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_position() {
        let rect = Rect::new(120.0, 80.0, 50.0, 50.0);
        let container = Rect::new(100.0, 50.0, 400.0, 400.0);

        assert_eq!(resolve_position(rect, container, PositionMode::Fixed), Point::new(120.0, 80.0));
        assert_eq!(
            resolve_position(rect, container, PositionMode::Absolute),
            Point::new(20.0, 30.0)
        );
    }
}
