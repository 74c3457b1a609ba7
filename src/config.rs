use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::ConfigError;
use crate::path::display_value;
use crate::transform::Transform;

/// Field path reserved for the primary search input.
pub const SEARCH_FIELD: &str = "search";
pub const DEFAULT_DEBOUNCE_MS: u64 = 350;
pub const DEFAULT_ENDPOINT: &str = "https://api.dataforsyningen.dk/adresser/autocomplete";

// Parameters the widget sets itself; pass-through keys may not shadow them.
const RESERVED_PARAMS: [&str; 2] = ["q", "fuzzy"];

pub const DEFAULT_FIELDS: &[(&str, &str)] = &[
    (SEARCH_FIELD, "#netsi-address"),
    ("adgangsadresse.vejstykke.navn", "#netsi-street"),
    ("adgangsadresse.husnr", "#netsi-house-number"),
    ("etage", "#netsi-floor"),
    ("dør", "#netsi-door"),
    ("adgangsadresse.postnummer.nr", "#netsi-zip"),
    ("adgangsadresse.postnummer.navn", "#netsi-city"),
    ("id", "#netsi-address-id"),
];

/// Target element for one field path, with an optional value transform.
#[derive(Debug, Clone)]
pub struct FieldMapping {
    pub selector: String,
    pub transform: Option<Transform>,
}

impl FieldMapping {
    pub fn selector(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            transform: None,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }
}

/// Settings supplied by the host application. Anything left unset falls back
/// to the defaults when merged into a [`Config`].
#[derive(Debug, Clone, Default)]
pub struct PartialConfig {
    /// `None` removes a default mapping.
    pub fields: BTreeMap<String, Option<FieldMapping>>,
    pub params: BTreeMap<String, Value>,
    pub use_fuzzy_fallback: Option<bool>,
    pub debounce: Option<Duration>,
    pub endpoint: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFieldSpec {
    Selector(String),
    Detailed {
        selector: String,
        #[serde(default)]
        transform: Option<String>,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    #[serde(default)]
    fields: BTreeMap<String, Option<RawFieldSpec>>,
    use_fuzzy_fallback: Option<bool>,
    debounce_ms: Option<u64>,
    endpoint: Option<String>,
    #[serde(flatten)]
    params: BTreeMap<String, Value>,
}

impl PartialConfig {
    /// Parse the JSON configuration object set by the host page.
    pub fn from_json(value: Value) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            serde_json::from_value(value).map_err(|e| ConfigError::Malformed(e.to_string()))?;

        let mut fields = BTreeMap::new();
        for (path, entry) in raw.fields {
            let mapping = match entry {
                None => None,
                Some(RawFieldSpec::Selector(selector)) => Some(FieldMapping::selector(selector)),
                Some(RawFieldSpec::Detailed { selector, transform }) => {
                    let mut mapping = FieldMapping::selector(selector);
                    if let Some(name) = transform {
                        mapping.transform = Some(Transform::named(&name)?);
                    }
                    Some(mapping)
                }
            };
            fields.insert(path, mapping);
        }

        Ok(Self {
            fields,
            params: raw.params,
            use_fuzzy_fallback: raw.use_fuzzy_fallback,
            debounce: raw.debounce_ms.map(Duration::from_millis),
            endpoint: raw.endpoint,
        })
    }

    pub fn field(mut self, path: impl Into<String>, mapping: FieldMapping) -> Self {
        self.fields.insert(path.into(), Some(mapping));
        self
    }

    pub fn without_field(mut self, path: impl Into<String>) -> Self {
        self.fields.insert(path.into(), None);
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn fuzzy_fallback(mut self, enabled: bool) -> Self {
        self.use_fuzzy_fallback = Some(enabled);
        self
    }

    pub fn debounce(mut self, delay: Duration) -> Self {
        self.debounce = Some(delay);
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }
}

/// Effective configuration: defaults merged with the host's settings.
#[derive(Debug, Clone)]
pub struct Config {
    search: FieldMapping,
    fields: BTreeMap<String, FieldMapping>,
    params: BTreeMap<String, String>,
    use_fuzzy_fallback: bool,
    debounce: Duration,
    endpoint: Url,
}

impl Config {
    pub fn merge(partial: PartialConfig) -> Result<Self, ConfigError> {
        let mut fields: BTreeMap<String, FieldMapping> = DEFAULT_FIELDS
            .iter()
            .map(|(path, selector)| (path.to_string(), FieldMapping::selector(*selector)))
            .collect();

        for (path, mapping) in partial.fields {
            match mapping {
                Some(mapping) if mapping.selector.trim().is_empty() => {
                    if path == SEARCH_FIELD {
                        return Err(ConfigError::MissingSearchSelector);
                    }
                    tracing::warn!(field = %path, "dropping field mapping with an empty selector");
                    fields.remove(&path);
                }
                Some(mapping) => {
                    fields.insert(path, mapping);
                }
                None => {
                    fields.remove(&path);
                }
            }
        }

        let search = fields
            .remove(SEARCH_FIELD)
            .ok_or(ConfigError::MissingSearchSelector)?;

        let mut params = BTreeMap::new();
        for (key, value) in partial.params {
            if RESERVED_PARAMS.contains(&key.as_str()) {
                tracing::warn!(param = %key, "ignoring pass-through parameter that shadows a widget parameter");
                continue;
            }
            if value.is_null() {
                continue;
            }
            params.insert(key, display_value(&value));
        }

        let endpoint_str = partial.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
        let endpoint = Url::parse(endpoint_str).map_err(|e| ConfigError::InvalidEndpoint {
            url: endpoint_str.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEndpoint {
                url: endpoint_str.to_string(),
                reason: format!("unsupported scheme `{}`", endpoint.scheme()),
            });
        }

        Ok(Self {
            search,
            fields,
            params,
            use_fuzzy_fallback: partial.use_fuzzy_fallback.unwrap_or(false),
            debounce: partial
                .debounce
                .unwrap_or(Duration::from_millis(DEFAULT_DEBOUNCE_MS)),
            endpoint,
        })
    }

    pub fn from_json(value: Value) -> Result<Self, ConfigError> {
        Self::merge(PartialConfig::from_json(value)?)
    }

    pub fn search(&self) -> &FieldMapping {
        &self.search
    }

    /// Field mappings other than the search input, ordered by path.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldMapping)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn field(&self, path: &str) -> Option<&FieldMapping> {
        if path == SEARCH_FIELD {
            return Some(&self.search);
        }
        self.fields.get(path)
    }

    /// Pass-through request parameters, already string-coerced.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn use_fuzzy_fallback(&self) -> bool {
        self.use_fuzzy_fallback
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}
