//! The address widget: wires input, lookups, the suggestion list and field
//! population together for one search input on the page.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::runtime::Handle;

use crate::api::AddressApi;
use crate::config::Config;
use crate::dom::{Dom, ListenKind, ListenTarget, ListenerId, NodeId};
use crate::error::{ApiError, AttachError, SelectError};
use crate::fetcher::fetch_suggestions;
use crate::list::{place_below, KeyOutcome, SuggestionList, ACTIVE_CLASS, FUZZY_CLASS, ITEM_CLASS};
use crate::request::{Debouncer, RequestController, RequestToken};
use crate::select::{populate, resolve_record, write_element, PopulationReport};
use crate::types::{DomEvent, Key, Suggestion};

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Nodes and listeners owned by one widget instance.
struct Mount {
    style: NodeId,
    list: NodeId,
    listeners: Vec<ListenerId>,
}

/// Result of a completed selection.
#[derive(Debug, Clone)]
pub struct Selection {
    pub record: Value,
    pub report: PopulationReport,
    /// `false` if a page listener cancelled the select event.
    pub dispatched: bool,
}

struct Inner {
    instance: String,
    config: Config,
    dom: Arc<dyn Dom>,
    api: Arc<dyn AddressApi>,
    runtime: Handle,
    input: NodeId,
    list: RwLock<SuggestionList>,
    requests: RequestController,
    debouncer: Debouncer,
    mount: Mutex<Option<Mount>>,
    detached: AtomicBool,
}

pub struct AddressWidget {
    inner: Arc<Inner>,
}

impl AddressWidget {
    /// Attach to the page using the ambient tokio runtime.
    pub fn attach(
        config: Config,
        dom: Arc<dyn Dom>,
        api: Arc<dyn AddressApi>,
    ) -> Result<Self, AttachError> {
        let runtime = Handle::try_current().map_err(|_| {
            tracing::error!("address widget needs a tokio runtime");
            AttachError::NoRuntime
        })?;
        Self::attach_with_runtime(config, dom, api, runtime)
    }

    pub fn attach_with_runtime(
        config: Config,
        dom: Arc<dyn Dom>,
        api: Arc<dyn AddressApi>,
        runtime: Handle,
    ) -> Result<Self, AttachError> {
        let selector = config.search().selector.clone();
        let Some(input) = dom.query(&selector) else {
            tracing::error!(%selector, "search input not found, address widget not attached");
            return Err(AttachError::SearchInputNotFound(selector));
        };

        let instance = format!("netsi-address-{}", NEXT_INSTANCE.fetch_add(1, Ordering::SeqCst));
        let style = dom.inject_style(&instance, &stylesheet(&instance));
        let list = dom.create_list(&instance);
        let listeners = vec![
            dom.listen(ListenTarget::Element(input), ListenKind::Input),
            dom.listen(ListenTarget::Element(input), ListenKind::KeyDown),
            dom.listen(ListenTarget::Document, ListenKind::Click),
            dom.listen(ListenTarget::Window, ListenKind::Resize),
            dom.listen(ListenTarget::Window, ListenKind::Scroll),
        ];
        tracing::info!(%instance, %selector, "address widget attached");

        let debouncer = Debouncer::new(config.debounce());
        Ok(Self {
            inner: Arc::new(Inner {
                instance,
                config,
                dom,
                api,
                runtime,
                input,
                list: RwLock::new(SuggestionList::new()),
                requests: RequestController::new(),
                debouncer,
                mount: Mutex::new(Some(Mount {
                    style,
                    list,
                    listeners,
                })),
                detached: AtomicBool::new(false),
            }),
        })
    }

    pub fn instance(&self) -> &str {
        &self.inner.instance
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn input_node(&self) -> NodeId {
        self.inner.input
    }

    pub fn list_node(&self) -> Option<NodeId> {
        self.inner.mount.lock().as_ref().map(|m| m.list)
    }

    pub fn is_open(&self) -> bool {
        self.inner.list.read().is_open()
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.inner.list.read().highlighted()
    }

    pub fn suggestions(&self) -> Vec<Suggestion> {
        self.inner.list.read().suggestions().to_vec()
    }

    pub fn is_detached(&self) -> bool {
        self.inner.detached.load(Ordering::SeqCst)
    }

    /// Raw input event. Blank input closes the list at once; anything else
    /// restarts the debounce timer.
    pub fn on_input(&self, value: &str) {
        if self.is_detached() {
            return;
        }
        if value.trim().is_empty() {
            self.inner.debouncer.cancel();
            self.inner.requests.cancel();
            self.inner.close_list();
            return;
        }
        let inner = self.inner.clone();
        let value = value.to_string();
        self.inner
            .debouncer
            .schedule(&self.inner.runtime, async move { Inner::start_lookup(&inner, value) });
    }

    /// Key pressed in the search input. Returns whether the widget handled it,
    /// in which case the host should suppress the default action.
    pub async fn on_key(&self, key: Key) -> bool {
        if self.is_detached() {
            return false;
        }
        let outcome = self.inner.list.write().handle_key(key);
        match outcome {
            KeyOutcome::Ignored => false,
            KeyOutcome::Moved(_) | KeyOutcome::Closed => {
                self.inner.render();
                true
            }
            KeyOutcome::Select(suggestion) => {
                // failures are logged inside select
                let _ = self.select(suggestion).await;
                true
            }
        }
    }

    /// Click on the item at `index` of the shown list.
    pub async fn click_item(&self, index: usize) -> Result<Selection, SelectError> {
        let suggestion = {
            let list = self.inner.list.read();
            match list.get(index) {
                Some(s) => s.clone(),
                None => {
                    return Err(SelectError::OutOfRange {
                        index,
                        count: list.suggestions().len(),
                    })
                }
            }
        };
        self.select(suggestion).await
    }

    /// Document-level click. Clicks outside both the input and the list close it.
    pub fn on_document_click(&self, inside_widget: bool) {
        if !inside_widget && !self.is_detached() && self.is_open() {
            self.inner.close_list();
        }
    }

    /// Window resize or scroll: re-place an open list under the input.
    pub fn on_viewport_change(&self) {
        if !self.is_detached() && self.is_open() {
            self.inner.render();
        }
    }

    /// Fill the form from `suggestion` and fire the select event.
    ///
    /// If the suggestion only references its address, the full record is
    /// fetched first; when that fails nothing on the page changes.
    pub async fn select(&self, suggestion: Suggestion) -> Result<Selection, SelectError> {
        let inner = &self.inner;
        if self.is_detached() {
            return Err(SelectError::Detached);
        }

        let record = match resolve_record(inner.api.as_ref(), &inner.config, &suggestion).await {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(error = %e, text = %suggestion.text, "could not load address, selection aborted");
                return Err(SelectError::Detail(e));
            }
        };
        if self.is_detached() {
            return Err(SelectError::Detached);
        }

        inner.debouncer.cancel();
        inner.requests.cancel();
        inner.close_list();

        let dom = inner.dom.as_ref();
        write_element(dom, inner.input, &suggestion.text);
        let report = populate(dom, &inner.config, &record);
        let dispatched = dom.dispatch(inner.input, &DomEvent::select(record.clone()));
        tracing::info!(
            instance = %inner.instance,
            fields = report.written(),
            fuzzy = suggestion.fuzzy,
            "address selected"
        );

        Ok(Selection {
            record,
            report,
            dispatched,
        })
    }

    /// Release listeners and injected nodes. Safe to call more than once;
    /// returns `true` only for the call that did the work.
    pub fn detach(&self) -> bool {
        let inner = &self.inner;
        if inner.detached.swap(true, Ordering::SeqCst) {
            return false;
        }
        inner.debouncer.cancel();
        inner.requests.cancel();
        inner.list.write().close();

        if let Some(mount) = inner.mount.lock().take() {
            for id in mount.listeners {
                inner.dom.unlisten(id);
            }
            inner.dom.remove(mount.list);
            inner.dom.remove(mount.style);
        }
        tracing::info!(instance = %inner.instance, "address widget detached");
        true
    }
}

impl Drop for AddressWidget {
    fn drop(&mut self) {
        self.detach();
    }
}

impl Inner {
    fn start_lookup(inner: &Arc<Self>, value: String) {
        if inner.detached.load(Ordering::SeqCst) {
            return;
        }
        let token = inner.requests.begin();
        tracing::debug!(query = %value.trim(), "address lookup");
        let task_inner = inner.clone();
        let task = inner.runtime.spawn(async move {
            let result =
                fetch_suggestions(task_inner.api.as_ref(), &task_inner.config, &value).await;
            task_inner.apply_results(token, &value, result);
        });
        inner.requests.track(token, task.abort_handle());
    }

    fn apply_results(&self, token: RequestToken, query: &str, result: Result<Vec<Suggestion>, ApiError>) {
        if !self.requests.is_current(token) {
            tracing::debug!(query = %query.trim(), "discarding stale lookup result");
            return;
        }
        self.requests.finish(token);
        if self.detached.load(Ordering::SeqCst) {
            return;
        }

        match result {
            Ok(suggestions) => {
                let count = suggestions.len();
                self.list.write().show(suggestions);
                tracing::debug!(query = %query.trim(), count, "lookup settled");
            }
            Err(e) => {
                tracing::warn!(query = %query.trim(), error = %e, "address lookup failed");
                self.list.write().close();
            }
        }
        self.render();
    }

    fn close_list(&self) {
        self.list.write().close();
        self.render();
    }

    fn render(&self) {
        let Some(list_node) = self.mount.lock().as_ref().map(|m| m.list) else {
            return;
        };
        let position = place_below(self.dom.bounding_rect(self.input), self.dom.scroll_offset());
        let view = self.list.read().view(&self.instance, Some(position));
        self.dom.render_list(list_node, &view);
    }
}

fn stylesheet(instance: &str) -> String {
    format!(
        r#"[data-netsi-instance="{instance}"] {{ position: absolute; z-index: 1000; margin: 0; padding: 0; list-style: none; background: #fff; border: 1px solid #c8c8c8; box-shadow: 0 2px 6px rgba(0,0,0,.15); max-height: 18em; overflow-y: auto; }}
[data-netsi-instance="{instance}"][hidden] {{ display: none; }}
[data-netsi-instance="{instance}"] .{ITEM_CLASS} {{ padding: .35em .6em; cursor: pointer; }}
[data-netsi-instance="{instance}"] .{ACTIVE_CLASS} {{ background: #e6effa; }}
[data-netsi-instance="{instance}"] .{FUZZY_CLASS} {{ font-style: italic; color: #555; }}
"#
    )
}
