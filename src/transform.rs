use std::fmt::{self, Write};
use std::sync::Arc;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::error::{ConfigError, TransformError};
use crate::path::display_value;

type TransformFn = dyn Fn(&Value, &Value) -> Result<String, TransformError> + Send + Sync;

/// Value mapper applied to a resolved field before it is written to the page.
///
/// Called with the raw resolved value (`Value::Null` when the path is missing)
/// and the full address record.
#[derive(Clone)]
pub struct Transform {
    name: String,
    func: Arc<TransformFn>,
}

impl Transform {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value, &Value) -> Result<String, TransformError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Look up a built-in transform by the name used in JSON configuration.
    ///
    /// Known names: `upper`, `lower`, and `date:<strftime pattern>`.
    pub fn named(name: &str) -> Result<Self, ConfigError> {
        let name = name.trim();
        if let Some(pattern) = name.strip_prefix("date:") {
            return Self::date(pattern);
        }
        match name {
            "upper" => Ok(Self::new("upper", |raw, _| Ok(display_value(raw).to_uppercase()))),
            "lower" => Ok(Self::new("lower", |raw, _| Ok(display_value(raw).to_lowercase()))),
            other => Err(ConfigError::UnknownTransform(other.to_string())),
        }
    }

    /// Reformat an ISO-8601 timestamp or date using a `strftime` pattern.
    pub fn date(pattern: &str) -> Result<Self, ConfigError> {
        let name = format!("date:{pattern}");
        if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::InvalidTransform {
                name,
                reason: "unsupported strftime pattern".into(),
            });
        }
        let pattern = pattern.to_string();
        let err_name = name.clone();
        Ok(Self::new(name, move |raw, _| {
            let Some(text) = raw.as_str() else {
                return Err(TransformError::new(&err_name, "value is not a string"));
            };
            let text = text.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
                return render(&err_name, dt.format(&pattern));
            }
            if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
                return render(&err_name, dt.format(&pattern));
            }
            if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
                return render(&err_name, d.format(&pattern));
            }
            Err(TransformError::new(
                &err_name,
                format!("`{text}` is not an ISO-8601 date"),
            ))
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, raw: &Value, record: &Value) -> Result<String, TransformError> {
        (self.func)(raw, record)
    }
}

// chrono reports unformattable items through `fmt::Error`.
fn render(name: &str, formatted: impl fmt::Display) -> Result<String, TransformError> {
    let mut out = String::new();
    write!(out, "{formatted}")
        .map_err(|_| TransformError::new(name, "value cannot be formatted with this pattern"))?;
    Ok(out)
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Transform").field(&self.name).finish()
    }
}
