#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use netsi_address_lib::{
    AddressApi, AddressWidget, ApiError, Config, ElementSnapshot, FormSnapshot, MirrorDom,
    PartialConfig, Rect, ScrollOffset, SearchQuery, Suggestion,
};
use parking_lot::Mutex;
use serde_json::{json, Value};

#[derive(Clone)]
struct Scripted {
    delay: Duration,
    result: Result<Vec<Suggestion>, u16>,
}

/// Address API fake answering from a script keyed by (query text, fuzzy).
#[derive(Default)]
pub struct ScriptedApi {
    searches: Mutex<HashMap<(String, bool), Scripted>>,
    details: Mutex<HashMap<String, Result<Value, u16>>>,
    calls: Mutex<Vec<SearchQuery>>,
    detail_calls: Mutex<Vec<String>>,
}

impl ScriptedApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, text: &str, fuzzy: bool, suggestions: Vec<Suggestion>) {
        self.respond_after(text, fuzzy, Duration::ZERO, suggestions);
    }

    pub fn respond_after(&self, text: &str, fuzzy: bool, delay: Duration, suggestions: Vec<Suggestion>) {
        self.searches.lock().insert(
            (text.to_string(), fuzzy),
            Scripted { delay, result: Ok(suggestions) },
        );
    }

    pub fn fail(&self, text: &str, fuzzy: bool, status: u16) {
        self.searches.lock().insert(
            (text.to_string(), fuzzy),
            Scripted { delay: Duration::ZERO, result: Err(status) },
        );
    }

    pub fn detail(&self, href: &str, record: Value) {
        self.details.lock().insert(href.to_string(), Ok(record));
    }

    pub fn detail_fails(&self, href: &str, status: u16) {
        self.details.lock().insert(href.to_string(), Err(status));
    }

    pub fn calls(&self) -> Vec<SearchQuery> {
        self.calls.lock().clone()
    }

    pub fn detail_calls(&self) -> Vec<String> {
        self.detail_calls.lock().clone()
    }
}

#[async_trait]
impl AddressApi for ScriptedApi {
    async fn autocomplete(&self, query: &SearchQuery) -> Result<Vec<Suggestion>, ApiError> {
        self.calls.lock().push(query.clone());
        let scripted = self
            .searches
            .lock()
            .get(&(query.text.clone(), query.fuzzy))
            .cloned();
        let Some(scripted) = scripted else {
            return Ok(Vec::new());
        };
        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        scripted.result.map_err(|status| ApiError::Status {
            status,
            body: "scripted failure".into(),
        })
    }

    async fn fetch_detail(&self, href: &str) -> Result<Value, ApiError> {
        self.detail_calls.lock().push(href.to_string());
        match self.details.lock().get(href).cloned() {
            Some(Ok(record)) => Ok(record),
            Some(Err(status)) => Err(ApiError::Status {
                status,
                body: "scripted failure".into(),
            }),
            None => Err(ApiError::Status {
                status: 404,
                body: "not found".into(),
            }),
        }
    }
}

pub const SEARCH_RECT: Rect = Rect {
    left: 20.0,
    top: 50.0,
    width: 400.0,
    height: 28.0,
};

/// The default form: every default selector present, the city as plain text.
pub fn form(extra: &[&str]) -> FormSnapshot {
    let mut elements: Vec<ElementSnapshot> = [
        "#netsi-street",
        "#netsi-house-number",
        "#netsi-floor",
        "#netsi-door",
        "#netsi-zip",
        "#netsi-address-id",
    ]
    .iter()
    .chain(extra.iter())
    .map(|selector| ElementSnapshot {
        selector: selector.to_string(),
        form_control: true,
        rect: Rect::default(),
    })
    .collect();
    elements.push(ElementSnapshot {
        selector: "#netsi-address".into(),
        form_control: true,
        rect: SEARCH_RECT,
    });
    elements.push(ElementSnapshot {
        selector: "#netsi-city".into(),
        form_control: false,
        rect: Rect::default(),
    });
    FormSnapshot {
        elements,
        scroll: ScrollOffset { x: 0.0, y: 10.0 },
    }
}

pub fn attach(api: Arc<ScriptedApi>, partial: PartialConfig) -> (AddressWidget, Arc<MirrorDom>) {
    let dom = Arc::new(MirrorDom::new(form(&["#created"])));
    let config = Config::merge(partial).expect("valid config");
    let widget = AddressWidget::attach(config, dom.clone(), api).expect("attached");
    (widget, dom)
}

/// Let debounce timers and scripted responses run to completion.
pub async fn settle() {
    tokio::time::sleep(Duration::from_secs(10)).await;
}

pub fn raadhus_record() -> Value {
    json!({
        "id": "0a3f50a0-4660-32b8-e044-0003ba298018",
        "etage": null,
        "dør": null,
        "adressebetegnelse": "Rådhuspladsen 1, 1550 København V",
        "historik": {"oprettet": "2000-02-05T15:24:05.000"},
        "adgangsadresse": {
            "husnr": "1",
            "vejstykke": {"navn": "Rådhuspladsen"},
            "postnummer": {"nr": "1550", "navn": "København V"}
        }
    })
}

pub fn raadhus() -> Suggestion {
    Suggestion::new("Rådhuspladsen 1, 1550 København K", raadhus_record())
}
