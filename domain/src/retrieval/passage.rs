//! Retrieved passages

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque metadata attached to a passage by the index (source file, page, ...).
pub type SourceMetadata = Map<String, Value>;

/// A document chunk returned by a hybrid search (Value Object)
///
/// Passages live only for the duration of one query; the retrieval cache
/// stores them by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub text: String,
    pub relevance_score: f32,
    #[serde(default)]
    pub source_metadata: SourceMetadata,
}

impl RetrievedPassage {
    pub fn new(text: impl Into<String>, relevance_score: f32) -> Self {
        Self {
            text: text.into(),
            relevance_score,
            source_metadata: SourceMetadata::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: SourceMetadata) -> Self {
        self.source_metadata = metadata;
        self
    }

    /// Best-effort human label for the passage source.
    ///
    /// Looks at the usual metadata keys written by ingestion pipelines.
    pub fn source_label(&self) -> Option<&str> {
        ["source", "file_name", "title", "document"]
            .iter()
            .find_map(|key| self.source_metadata.get(*key).and_then(Value::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_source_label_prefers_source_key() {
        let mut metadata = SourceMetadata::new();
        metadata.insert("title".to_string(), json!("SME Loan Guide"));
        metadata.insert("source".to_string(), json!("sme_loans.pdf"));

        let passage = RetrievedPassage::new("Tenor is up to 5 years.", 0.82).with_metadata(metadata);
        assert_eq!(passage.source_label(), Some("sme_loans.pdf"));
    }

    #[test]
    fn test_source_label_missing() {
        let passage = RetrievedPassage::new("text", 0.1);
        assert_eq!(passage.source_label(), None);
    }

    #[test]
    fn test_deserialize_without_metadata() {
        let passage: RetrievedPassage =
            serde_json::from_str(r#"{"text":"a","relevance_score":0.5}"#).unwrap();
        assert!(passage.source_metadata.is_empty());
    }
}
