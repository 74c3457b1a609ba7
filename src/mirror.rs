use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::dom::{Dom, ListenKind, ListenTarget, ListenerId, NodeId};
use crate::types::{DomEvent, ListView, Rect, ScrollOffset};

/// One element the host page reports, addressed by the selector the
/// configuration uses for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    pub selector: String,
    #[serde(default)]
    pub form_control: bool,
    #[serde(default)]
    pub rect: Rect,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormSnapshot {
    #[serde(default)]
    pub elements: Vec<ElementSnapshot>,
    #[serde(default)]
    pub scroll: ScrollOffset,
}

/// A mutation the host must replay on the real page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DomPatch {
    SetValue { selector: String, value: String },
    SetText { selector: String, text: String },
    InjectStyle { node: NodeId, instance: String, css: String },
    CreateList { node: NodeId, instance: String },
    Remove { node: NodeId },
    RenderList { node: NodeId, view: ListView },
    Listen { id: ListenerId, target: ListenTarget, kind: ListenKind },
    Unlisten { id: ListenerId },
    Dispatch { selector: String, event: DomEvent },
}

pub type PatchSink = Arc<dyn Fn(DomPatch) + Send + Sync>;

#[derive(Debug, Clone)]
struct MirrorElement {
    selector: String,
    form_control: bool,
    value: String,
    text: String,
    rect: Rect,
}

#[derive(Debug, Clone)]
struct Injected {
    instance: String,
    list: Option<ListView>,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    elements: BTreeMap<NodeId, MirrorElement>,
    injected: BTreeMap<NodeId, Injected>,
    listeners: BTreeMap<ListenerId, (ListenTarget, ListenKind)>,
    scroll: ScrollOffset,
    events: Vec<(String, DomEvent)>,
}

impl Inner {
    fn alloc(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process copy of the host form. Reads are answered from the snapshot;
/// writes update the copy and are emitted as [`DomPatch`]es.
pub struct MirrorDom {
    inner: RwLock<Inner>,
    sink: Option<PatchSink>,
    pending: Mutex<Vec<DomPatch>>,
}

impl MirrorDom {
    pub fn new(snapshot: FormSnapshot) -> Self {
        let mirror = Self {
            inner: RwLock::new(Inner::default()),
            sink: None,
            pending: Mutex::new(Vec::new()),
        };
        mirror.load(snapshot);
        mirror
    }

    /// Forward every patch to `sink` instead of queueing it.
    pub fn with_sink(snapshot: FormSnapshot, sink: PatchSink) -> Self {
        let mut mirror = Self::new(snapshot);
        mirror.sink = Some(sink);
        mirror
    }

    fn load(&self, snapshot: FormSnapshot) {
        let mut inner = self.inner.write();
        inner.scroll = snapshot.scroll;
        for el in snapshot.elements {
            let selector = el.selector.trim().to_string();
            if inner.elements.values().any(|e| e.selector == selector) {
                continue;
            }
            let id = NodeId(inner.alloc());
            inner.elements.insert(
                id,
                MirrorElement {
                    selector,
                    form_control: el.form_control,
                    value: String::new(),
                    text: String::new(),
                    rect: el.rect,
                },
            );
        }
    }

    fn emit(&self, patch: DomPatch) {
        match &self.sink {
            Some(sink) => sink(patch),
            None => self.pending.lock().push(patch),
        }
    }

    /// Drain patches queued since the last call (only when no sink is set).
    pub fn take_patches(&self) -> Vec<DomPatch> {
        std::mem::take(&mut *self.pending.lock())
    }

    pub fn update_rect(&self, selector: &str, rect: Rect) -> bool {
        let mut inner = self.inner.write();
        match inner.elements.values_mut().find(|e| e.selector == selector) {
            Some(el) => {
                el.rect = rect;
                true
            }
            None => false,
        }
    }

    pub fn set_scroll(&self, scroll: ScrollOffset) {
        self.inner.write().scroll = scroll;
    }

    pub fn value_of(&self, selector: &str) -> Option<String> {
        let inner = self.inner.read();
        inner
            .elements
            .values()
            .find(|e| e.selector == selector)
            .map(|e| e.value.clone())
    }

    pub fn text_of(&self, selector: &str) -> Option<String> {
        let inner = self.inner.read();
        inner
            .elements
            .values()
            .find(|e| e.selector == selector)
            .map(|e| e.text.clone())
    }

    /// Events dispatched so far, with the selector of their target.
    pub fn events(&self) -> Vec<(String, DomEvent)> {
        self.inner.read().events.clone()
    }

    /// Most recent view rendered into the given list node.
    pub fn list_view(&self, node: NodeId) -> Option<ListView> {
        self.inner.read().injected.get(&node).and_then(|i| i.list.clone())
    }

    pub fn injected_count(&self) -> usize {
        self.inner.read().injected.len()
    }

    pub fn injected_for(&self, instance: &str) -> usize {
        self.inner
            .read()
            .injected
            .values()
            .filter(|i| i.instance == instance)
            .count()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.read().listeners.len()
    }

    fn selector_of(&self, node: NodeId) -> Option<String> {
        self.inner.read().elements.get(&node).map(|e| e.selector.clone())
    }
}

impl Dom for MirrorDom {
    fn query(&self, selector: &str) -> Option<NodeId> {
        let selector = selector.trim();
        let inner = self.inner.read();
        inner
            .elements
            .iter()
            .find(|(_, e)| e.selector == selector)
            .map(|(id, _)| *id)
    }

    fn is_form_control(&self, node: NodeId) -> bool {
        self.inner
            .read()
            .elements
            .get(&node)
            .map(|e| e.form_control)
            .unwrap_or(false)
    }

    fn set_value(&self, node: NodeId, value: &str) {
        let selector = {
            let mut inner = self.inner.write();
            let Some(el) = inner.elements.get_mut(&node) else { return };
            el.value = value.to_string();
            el.selector.clone()
        };
        self.emit(DomPatch::SetValue {
            selector,
            value: value.to_string(),
        });
    }

    fn set_text(&self, node: NodeId, text: &str) {
        let selector = {
            let mut inner = self.inner.write();
            let Some(el) = inner.elements.get_mut(&node) else { return };
            el.text = text.to_string();
            el.selector.clone()
        };
        self.emit(DomPatch::SetText {
            selector,
            text: text.to_string(),
        });
    }

    fn bounding_rect(&self, node: NodeId) -> Rect {
        self.inner
            .read()
            .elements
            .get(&node)
            .map(|e| e.rect)
            .unwrap_or_default()
    }

    fn scroll_offset(&self) -> ScrollOffset {
        self.inner.read().scroll
    }

    fn inject_style(&self, instance: &str, css: &str) -> NodeId {
        let node = {
            let mut inner = self.inner.write();
            let node = NodeId(inner.alloc());
            inner.injected.insert(
                node,
                Injected {
                    instance: instance.to_string(),
                    list: None,
                },
            );
            node
        };
        self.emit(DomPatch::InjectStyle {
            node,
            instance: instance.to_string(),
            css: css.to_string(),
        });
        node
    }

    fn create_list(&self, instance: &str) -> NodeId {
        let node = {
            let mut inner = self.inner.write();
            let node = NodeId(inner.alloc());
            inner.injected.insert(
                node,
                Injected {
                    instance: instance.to_string(),
                    list: None,
                },
            );
            node
        };
        self.emit(DomPatch::CreateList {
            node,
            instance: instance.to_string(),
        });
        node
    }

    fn remove(&self, node: NodeId) {
        let removed = self.inner.write().injected.remove(&node).is_some();
        if removed {
            self.emit(DomPatch::Remove { node });
        }
    }

    fn render_list(&self, list: NodeId, view: &ListView) {
        {
            let mut inner = self.inner.write();
            let Some(injected) = inner.injected.get_mut(&list) else { return };
            injected.list = Some(view.clone());
        }
        self.emit(DomPatch::RenderList {
            node: list,
            view: view.clone(),
        });
    }

    fn listen(&self, target: ListenTarget, kind: ListenKind) -> ListenerId {
        let id = {
            let mut inner = self.inner.write();
            let id = ListenerId(inner.alloc());
            inner.listeners.insert(id, (target, kind));
            id
        };
        self.emit(DomPatch::Listen { id, target, kind });
        id
    }

    fn unlisten(&self, id: ListenerId) {
        let removed = self.inner.write().listeners.remove(&id).is_some();
        if removed {
            self.emit(DomPatch::Unlisten { id });
        }
    }

    fn dispatch(&self, target: NodeId, event: &DomEvent) -> bool {
        let Some(selector) = self.selector_of(target) else { return false };
        self.inner.write().events.push((selector.clone(), event.clone()));
        self.emit(DomPatch::Dispatch {
            selector,
            event: event.clone(),
        });
        true
    }
}
