//! Page capabilities the widget consumes. The widget never touches a real
//! document directly; a host provides an implementation of [`Dom`].

use serde::{Deserialize, Serialize};

use crate::types::{DomEvent, ListView, Rect, ScrollOffset};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenTarget {
    Element(NodeId),
    Document,
    Window,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenKind {
    Input,
    KeyDown,
    Click,
    Resize,
    Scroll,
}

pub trait Dom: Send + Sync {
    fn query(&self, selector: &str) -> Option<NodeId>;

    /// Whether the node has an editable value (input, textarea, select).
    fn is_form_control(&self, node: NodeId) -> bool;

    fn set_value(&self, node: NodeId, value: &str);

    fn set_text(&self, node: NodeId, text: &str);

    /// Viewport-relative rectangle of the node.
    fn bounding_rect(&self, node: NodeId) -> Rect;

    fn scroll_offset(&self) -> ScrollOffset;

    /// Inject a stylesheet scoped to one widget instance.
    fn inject_style(&self, instance: &str, css: &str) -> NodeId;

    /// Create the (initially hidden) container the suggestion list renders into.
    fn create_list(&self, instance: &str) -> NodeId;

    fn remove(&self, node: NodeId);

    fn render_list(&self, list: NodeId, view: &ListView);

    fn listen(&self, target: ListenTarget, kind: ListenKind) -> ListenerId;

    fn unlisten(&self, id: ListenerId);

    /// Returns `false` when a listener cancelled the event.
    fn dispatch(&self, target: NodeId, event: &DomEvent) -> bool;
}
