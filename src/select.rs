use serde_json::Value;

use crate::api::AddressApi;
use crate::config::Config;
use crate::dom::{Dom, NodeId};
use crate::error::ApiError;
use crate::path::{display_value, resolve, root_segment};
use crate::types::Suggestion;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome {
    Written(String),
    NoElement,
    TransformFailed(String),
}

/// Per-field result of writing a record into the page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulationReport {
    pub fields: Vec<(String, FieldOutcome)>,
}

impl PopulationReport {
    pub fn outcome(&self, path: &str) -> Option<&FieldOutcome> {
        self.fields.iter().find(|(p, _)| p == path).map(|(_, o)| o)
    }

    pub fn written(&self) -> usize {
        self.fields
            .iter()
            .filter(|(_, o)| matches!(o, FieldOutcome::Written(_)))
            .count()
    }
}

// Key every full address record carries; reference records from the
// autocomplete endpoint omit it.
const ACCESS_ADDRESS_KEY: &str = "adgangsadresse";

/// A record only references the full address when it carries an `href` and
/// lacks the access address or the top-level key some mapped field reads from.
pub fn needs_detail(record: &Value, config: &Config) -> bool {
    if record.get("href").and_then(Value::as_str).is_none() {
        return false;
    }
    record.get(ACCESS_ADDRESS_KEY).is_none()
        || config
            .fields()
            .any(|(path, _)| record.get(root_segment(path)).is_none())
}

/// Full record for a suggestion, following its reference link when needed.
pub async fn resolve_record(
    api: &dyn AddressApi,
    config: &Config,
    suggestion: &Suggestion,
) -> Result<Value, ApiError> {
    if !needs_detail(&suggestion.record, config) {
        return Ok(suggestion.record.clone());
    }
    let href = suggestion.href().unwrap_or_default();
    tracing::debug!(%href, "fetching full address record");
    api.fetch_detail(href).await
}

/// Form controls get their value set, anything else its text content.
pub fn write_element(dom: &dyn Dom, node: NodeId, value: &str) {
    if dom.is_form_control(node) {
        dom.set_value(node, value);
    } else {
        dom.set_text(node, value);
    }
}

/// Write every mapped field of `record` into the page. Each field stands
/// alone: a missing element or failing transform skips only that field.
pub fn populate(dom: &dyn Dom, config: &Config, record: &Value) -> PopulationReport {
    let mut report = PopulationReport::default();
    for (path, mapping) in config.fields() {
        let Some(node) = dom.query(&mapping.selector) else {
            report.fields.push((path.to_string(), FieldOutcome::NoElement));
            continue;
        };

        let raw = resolve(record, path).unwrap_or(&Value::Null);
        let value = match &mapping.transform {
            Some(transform) => match transform.apply(raw, record) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(field = %path, error = %e, "transform failed, field skipped");
                    report
                        .fields
                        .push((path.to_string(), FieldOutcome::TransformFailed(e.to_string())));
                    continue;
                }
            },
            None => display_value(raw),
        };

        write_element(dom, node, &value);
        report.fields.push((path.to_string(), FieldOutcome::Written(value)));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldMapping, PartialConfig};
    use crate::error::TransformError;
    use crate::mirror::{ElementSnapshot, FormSnapshot, MirrorDom};
    use crate::transform::Transform;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn element(selector: &str, form_control: bool) -> ElementSnapshot {
        ElementSnapshot {
            selector: selector.into(),
            form_control,
            rect: Default::default(),
        }
    }

    fn record() -> Value {
        json!({
            "id": "0a3f50a0-4660-32b8-e044-0003ba298018",
            "etage": null,
            "dør": null,
            "historik": {"oprettet": "2000-02-05T15:24:05.000"},
            "adgangsadresse": {
                "husnr": "1",
                "vejstykke": {"navn": "Rådhuspladsen"},
                "postnummer": {"nr": "1550", "navn": "København V"}
            }
        })
    }

    #[test]
    fn detail_needed_only_for_references() {
        let config = Config::merge(PartialConfig::default()).unwrap();
        assert!(!needs_detail(&record(), &config));
        assert!(needs_detail(&json!({"id": "x", "href": "/adresser/x"}), &config));
        assert!(!needs_detail(&json!({"id": "x"}), &config));
    }

    #[test]
    fn references_fetch_detail_even_when_only_top_level_keys_are_mapped() {
        let config = Config::from_json(json!({
            "fields": {
                "adgangsadresse.vejstykke.navn": null,
                "adgangsadresse.husnr": null,
                "adgangsadresse.postnummer.nr": null,
                "adgangsadresse.postnummer.navn": null
            }
        }))
        .unwrap();
        let reference = json!({"id": "x", "etage": "1", "dør": "tv", "href": "/adresser/x"});
        assert!(needs_detail(&reference, &config));

        let mut full = record();
        full["href"] = json!("/adresser/x");
        assert!(!needs_detail(&full, &config));
    }

    #[test]
    fn populates_controls_and_text_nodes() {
        let dom = MirrorDom::new(FormSnapshot {
            elements: vec![
                element("#netsi-street", true),
                element("#netsi-zip", true),
                element("#netsi-city", false),
                element("#netsi-floor", true),
            ],
            ..Default::default()
        });
        let config = Config::merge(PartialConfig::default()).unwrap();
        let report = populate(&dom, &config, &record());

        assert_eq!(dom.value_of("#netsi-street").as_deref(), Some("Rådhuspladsen"));
        assert_eq!(dom.value_of("#netsi-zip").as_deref(), Some("1550"));
        assert_eq!(dom.text_of("#netsi-city").as_deref(), Some("København V"));
        assert_eq!(dom.value_of("#netsi-city").as_deref(), Some(""));
        assert_eq!(dom.value_of("#netsi-floor").as_deref(), Some(""));
        assert_eq!(report.outcome("dør"), Some(&FieldOutcome::NoElement));
        assert_eq!(report.written(), 4);
    }

    #[test]
    fn transform_result_replaces_raw_value() {
        let dom = MirrorDom::new(FormSnapshot {
            elements: vec![element("#created", true)],
            ..Default::default()
        });
        let config = Config::merge(PartialConfig::default().field(
            "historik.oprettet",
            FieldMapping::selector("#created").with_transform(Transform::date("%d.%m.%Y").unwrap()),
        ))
        .unwrap();
        populate(&dom, &config, &record());
        assert_eq!(dom.value_of("#created").as_deref(), Some("05.02.2000"));
    }

    #[test]
    fn failing_transform_skips_only_its_field() {
        let dom = MirrorDom::new(FormSnapshot {
            elements: vec![element("#netsi-street", true), element("#netsi-zip", true)],
            ..Default::default()
        });
        let broken = Transform::new("broken", |_, _| Err(TransformError::new("broken", "boom")));
        let config = Config::merge(PartialConfig::default().field(
            "adgangsadresse.vejstykke.navn",
            FieldMapping::selector("#netsi-street").with_transform(broken),
        ))
        .unwrap();
        let report = populate(&dom, &config, &record());

        assert!(matches!(
            report.outcome("adgangsadresse.vejstykke.navn"),
            Some(FieldOutcome::TransformFailed(_))
        ));
        assert_eq!(dom.value_of("#netsi-street").as_deref(), Some(""));
        assert_eq!(dom.value_of("#netsi-zip").as_deref(), Some("1550"));
    }

    #[test]
    fn unformattable_date_skips_only_its_field() {
        let dom = MirrorDom::new(FormSnapshot {
            elements: vec![
                element("#created", true),
                element("#netsi-street", true),
                element("#netsi-address-id", true),
            ],
            ..Default::default()
        });
        let config = Config::merge(PartialConfig::default().field(
            "historik.oprettet",
            FieldMapping::selector("#created").with_transform(Transform::date("%H:%M").unwrap()),
        ))
        .unwrap();
        let mut record = record();
        record["historik"]["oprettet"] = json!("2000-02-05");

        let report = populate(&dom, &config, &record);

        assert!(matches!(
            report.outcome("historik.oprettet"),
            Some(FieldOutcome::TransformFailed(_))
        ));
        assert_eq!(dom.value_of("#created").as_deref(), Some(""));
        assert_eq!(dom.value_of("#netsi-street").as_deref(), Some("Rådhuspladsen"));
        assert_eq!(
            dom.value_of("#netsi-address-id").as_deref(),
            Some("0a3f50a0-4660-32b8-e044-0003ba298018")
        );
    }
}
