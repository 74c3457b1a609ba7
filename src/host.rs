//! Tauri shell: the form lives in the webview, the widget runs here and
//! sends its page mutations back as `netsi-address:patch` events.

use std::sync::Arc;

use serde_json::Value;
use tauri::Emitter;

use crate::api::DawaClient;
use crate::config::Config;
use crate::mirror::{DomPatch, FormSnapshot, MirrorDom};
use crate::state::{AppState, Session};
use crate::types::{Key, Rect, ScrollOffset};
use crate::widget::AddressWidget;

pub const PATCH_EVENT: &str = "netsi-address:patch";

#[tauri::command]
pub async fn attach_widget(
    config: Value,
    snapshot: FormSnapshot,
    state: tauri::State<'_, AppState>,
    app_handle: tauri::AppHandle,
) -> Result<String, String> {
    let config = Config::from_json(config).map_err(|e| {
        tracing::error!(error = %e, "invalid address widget configuration");
        e.to_string()
    })?;

    let handle_clone = app_handle.clone();
    let sink = Arc::new(move |patch: DomPatch| {
        if let Err(e) = handle_clone.emit(PATCH_EVENT, &patch) {
            tracing::warn!(error = %e, "failed to forward DOM patch");
        }
    });
    let dom = Arc::new(MirrorDom::with_sink(snapshot, sink));
    let api = DawaClient::new(config.endpoint().clone()).map_err(|e| e.to_string())?;

    let widget = AddressWidget::attach(config, dom.clone(), Arc::new(api)).map_err(|e| e.to_string())?;
    let instance = widget.instance().to_string();
    state.replace(Some(Session { widget, dom }));
    Ok(instance)
}

#[tauri::command]
pub fn address_input(value: String, state: tauri::State<'_, AppState>) -> Result<(), String> {
    state.current()?.widget.on_input(&value);
    Ok(())
}

#[tauri::command]
pub async fn address_key(key: String, state: tauri::State<'_, AppState>) -> Result<bool, String> {
    let session = state.current()?;
    Ok(session.widget.on_key(Key::from_name(&key)).await)
}

#[tauri::command]
pub async fn address_click(index: usize, state: tauri::State<'_, AppState>) -> Result<Value, String> {
    let session = state.current()?;
    let selection = session.widget.click_item(index).await.map_err(|e| e.to_string())?;
    Ok(selection.record)
}

#[tauri::command]
pub fn address_document_click(inside: bool, state: tauri::State<'_, AppState>) -> Result<(), String> {
    state.current()?.widget.on_document_click(inside);
    Ok(())
}

// The webview reports fresh input geometry on resize/scroll.
#[tauri::command]
pub fn address_viewport(
    rect: Rect,
    scroll: ScrollOffset,
    state: tauri::State<'_, AppState>,
) -> Result<(), String> {
    let session = state.current()?;
    let selector = session.widget.config().search().selector.clone();
    session.dom.update_rect(&selector, rect);
    session.dom.set_scroll(scroll);
    session.widget.on_viewport_change();
    Ok(())
}

#[tauri::command]
pub fn detach_widget(state: tauri::State<'_, AppState>) -> Result<bool, String> {
    Ok(state.replace(None).is_some())
}

pub fn run() {
    tauri::Builder::default()
        .manage(AppState::default())
        .invoke_handler(tauri::generate_handler![
            attach_widget,
            address_input,
            address_key,
            address_click,
            address_document_click,
            address_viewport,
            detach_widget
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
