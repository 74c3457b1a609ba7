use serde_json::Value;

// JSON Pointer token escape (~0, ~1)
pub fn escape_pointer_token(raw: &str) -> String {
    raw.replace('~', "~0").replace('/', "~1")
}

/// Convert a dot-separated field path (`adgangsadresse.postnummer.nr`) into a
/// JSON Pointer (`/adgangsadresse/postnummer/nr`). Numeric segments index arrays.
pub fn to_pointer(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    path.split('.')
        .map(|segment| format!("/{}", escape_pointer_token(segment)))
        .collect()
}

/// Resolve a dot path against a record. Any missing segment yields `None`.
pub fn resolve<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    record.pointer(&to_pointer(path))
}

/// First segment of a dot path, i.e. the top-level key it reads from.
pub fn root_segment(path: &str) -> &str {
    path.split('.').next().unwrap_or(path)
}

/// String form used when writing a value into the page.
pub fn display_value(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(_) | Value::Object(_) => v.to_string(),
    }
}
