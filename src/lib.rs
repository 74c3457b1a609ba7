pub mod api;
pub mod config;
pub mod dom;
pub mod error;
pub mod fetcher;
pub mod list;
pub mod mirror;
pub mod path;
pub mod request;
pub mod select;
pub mod state;
pub mod transform;
pub mod types;
pub mod widget;

#[cfg(feature = "desktop")]
pub mod host;

pub use api::{AddressApi, DawaClient, SearchQuery};
pub use config::{Config, FieldMapping, PartialConfig, SEARCH_FIELD};
pub use dom::{Dom, NodeId};
pub use error::{ApiError, AttachError, ConfigError, SelectError, TransformError};
pub use mirror::{DomPatch, ElementSnapshot, FormSnapshot, MirrorDom};
pub use transform::Transform;
pub use types::{DomEvent, Key, ListView, Rect, ScrollOffset, Suggestion, SELECT_EVENT};
pub use widget::{AddressWidget, Selection};
