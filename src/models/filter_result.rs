use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

/// Per-symbol metadata attached by a filter stage (currently always empty)
pub type Annotation = Map<String, Value>;

/// Output of one filter stage: surviving symbols in ranked order
///
/// Serializes as a JSON object whose key order is the ranking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterResult {
    entries: Vec<(String, Annotation)>,
}

impl FilterResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a symbol; a symbol already present keeps its first position.
    pub fn insert(&mut self, symbol: impl Into<String>, annotation: Annotation) -> bool {
        let symbol = symbol.into();
        if self.contains(&symbol) {
            return false;
        }
        self.entries.push((symbol, annotation));
        true
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.entries.iter().any(|(s, _)| s == symbol)
    }

    pub fn get(&self, symbol: &str) -> Option<&Annotation> {
        self.entries
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, a)| a)
    }

    /// Symbols in ranked order
    pub fn symbols(&self) -> Vec<&str> {
        self.entries.iter().map(|(s, _)| s.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Annotation)> {
        self.entries.iter().map(|(s, a)| (s.as_str(), a))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FilterResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (symbol, annotation) in &self.entries {
            map.serialize_entry(symbol, annotation)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_order_and_rejects_duplicates() {
        let mut result = FilterResult::new();
        assert!(result.insert("ETHUSDT", Annotation::new()));
        assert!(result.insert("BTCUSDT", Annotation::new()));
        assert!(!result.insert("ETHUSDT", Annotation::new()));

        assert_eq!(result.symbols(), vec!["ETHUSDT", "BTCUSDT"]);
        assert_eq!(result.len(), 2);
        assert!(result.contains("BTCUSDT"));
        assert!(result.get("XRPUSDT").is_none());
        assert!(result.iter().all(|(_, annotation)| annotation.is_empty()));
    }

    #[test]
    fn test_serialize_preserves_ranked_order() {
        let mut result = FilterResult::new();
        result.insert("ZECUSDT", Annotation::new());
        result.insert("ADAUSDT", Annotation::new());

        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"ZECUSDT":{},"ADAUSDT":{}}"#);
    }
}
