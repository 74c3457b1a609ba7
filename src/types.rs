use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the event fired on the search input after a selection.
pub const SELECT_EVENT: &str = "netsi-address:select";

/// One candidate address returned by a lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "tekst")]
    pub text: String,       // display label
    #[serde(rename = "adresse", default)]
    pub record: Value,      // opaque address record, possibly only a reference
    #[serde(default, skip_deserializing)]
    pub fuzzy: bool,        // came from the typo-tolerant fallback
}

impl Suggestion {
    pub fn new(text: impl Into<String>, record: Value) -> Self {
        Self {
            text: text.into(),
            record,
            fuzzy: false,
        }
    }

    /// Link to the full record, when the API returned a reference.
    pub fn href(&self) -> Option<&str> {
        self.record.get("href").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollOffset {
    pub x: f64,
    pub y: f64,
}

/// Page coordinates of the suggestion list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ListPosition {
    pub left: f64,
    pub top: f64,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub text: String,
    pub fuzzy: bool,
    pub highlighted: bool,
    pub class: String,
}

/// Everything a host needs to draw the suggestion list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListView {
    pub instance: String,
    pub open: bool,
    pub items: Vec<ListItem>,
    pub position: Option<ListPosition>,
}

/// Event dispatched into the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomEvent {
    pub name: String,
    pub detail: Value,
    pub bubbles: bool,
    pub cancelable: bool,
    pub composed: bool,
}

impl DomEvent {
    pub fn select(record: Value) -> Self {
        Self {
            name: SELECT_EVENT.to_string(),
            detail: record,
            bubbles: true,
            cancelable: true,
            composed: true,
        }
    }
}

/// Keys the suggestion list reacts to. Anything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
    #[serde(other)]
    Other,
}

impl Key {
    pub fn from_name(name: &str) -> Self {
        match name {
            "ArrowDown" | "Down" => Key::ArrowDown,
            "ArrowUp" | "Up" => Key::ArrowUp,
            "Enter" => Key::Enter,
            "Escape" | "Esc" => Key::Escape,
            _ => Key::Other,
        }
    }
}
