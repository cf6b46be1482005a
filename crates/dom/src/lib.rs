//! DOM (Document Object Model) implementation.
//!
//! A lightweight in-process document: node tree, inline styles and class
//! rules, computed style and bounding-rect resolution, CSS transitions and a
//! window with a manual clock. It is the rendering host the hero engine runs
//! against.

pub mod document;
pub mod element;
pub mod events;
pub mod node;
pub mod style;
pub mod transition;
pub mod tree;
pub mod window;

pub use document::{Document, DocumentRef};
pub use element::{ElementData, ElementFlags, TagName};
pub use events::{Event, EventCallback, EventListenerOptions, EventPhase, TRANSITION_END};
pub use node::{Node, NodeData, NodeId};
pub use style::{StyleDeclarations, StyleRule};
pub use transition::{RunningTransition, TransitionSpec};
pub use tree::{DomTree, SimpleSelector};
pub use window::{AnimationFrameCallback, Task, TaskQueue, Window};
