use crate::api::{AddressApi, SearchQuery};
use crate::config::Config;
use crate::error::ApiError;
use crate::types::Suggestion;

/// Look up suggestions for the current input value.
///
/// Blank input returns an empty list without calling the API. When the exact
/// search finds nothing and fuzzy fallback is enabled, a second, typo-tolerant
/// search runs and its results are tagged as fuzzy.
pub async fn fetch_suggestions(
    api: &dyn AddressApi,
    config: &Config,
    input: &str,
) -> Result<Vec<Suggestion>, ApiError> {
    let text = input.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = SearchQuery {
        text: text.to_string(),
        params: config.params().clone(),
        fuzzy: false,
    };
    let primary = api.autocomplete(&query).await?;
    if !primary.is_empty() || !config.use_fuzzy_fallback() {
        return Ok(primary);
    }

    tracing::debug!(query = %text, "no exact matches, retrying with fuzzy search");
    query.fuzzy = true;
    let mut fallback = api.autocomplete(&query).await?;
    for suggestion in &mut fallback {
        suggestion.fuzzy = true;
    }
    Ok(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PartialConfig;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::{json, Value};

    struct Scripted {
        exact: Vec<Suggestion>,
        fuzzy: Vec<Suggestion>,
        calls: Mutex<Vec<SearchQuery>>,
    }

    impl Scripted {
        fn new(exact: Vec<Suggestion>, fuzzy: Vec<Suggestion>) -> Self {
            Self { exact, fuzzy, calls: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl AddressApi for Scripted {
        async fn autocomplete(&self, query: &SearchQuery) -> Result<Vec<Suggestion>, ApiError> {
            self.calls.lock().push(query.clone());
            Ok(if query.fuzzy { self.fuzzy.clone() } else { self.exact.clone() })
        }

        async fn fetch_detail(&self, _href: &str) -> Result<Value, ApiError> {
            Ok(Value::Null)
        }
    }

    fn config(fuzzy: bool) -> Config {
        Config::merge(PartialConfig::default().fuzzy_fallback(fuzzy).param("per_side", 5)).unwrap()
    }

    fn hit(text: &str) -> Suggestion {
        Suggestion::new(text, json!({"id": text}))
    }

    #[tokio::test]
    async fn blank_input_makes_no_call() {
        let api = Scripted::new(vec![hit("a")], vec![]);
        let out = fetch_suggestions(&api, &config(true), "   ").await.unwrap();
        assert!(out.is_empty());
        assert!(api.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn exact_hits_skip_fallback() {
        let api = Scripted::new(vec![hit("Rådhuspladsen 1")], vec![hit("other")]);
        let out = fetch_suggestions(&api, &config(true), "  Rådhuspladsen ").await.unwrap();
        assert_eq!(out.len(), 1);
        assert!(!out[0].fuzzy);
        let calls = api.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].text, "Rådhuspladsen");
        assert_eq!(calls[0].params["per_side"], "5");
    }

    #[tokio::test]
    async fn zero_hits_fall_back_to_fuzzy_when_enabled() {
        let api = Scripted::new(vec![], vec![hit("Rådhuspladsen 1")]);
        let out = fetch_suggestions(&api, &config(true), "Rådhusplasen").await.unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0].fuzzy);
        let calls = api.calls.lock();
        assert_eq!(calls.len(), 2);
        assert!(!calls[0].fuzzy);
        assert!(calls[1].fuzzy);
    }

    #[tokio::test]
    async fn zero_hits_without_flag_make_one_call() {
        let api = Scripted::new(vec![], vec![hit("Rådhuspladsen 1")]);
        let out = fetch_suggestions(&api, &config(false), "Rådhusplasen").await.unwrap();
        assert!(out.is_empty());
        assert_eq!(api.calls.lock().len(), 1);
    }
}
