use std::collections::BTreeMap;

use crate::data_models::{
    Highlight, HighlightField, MatchType, MultiMatch, QueryClause, SearchQuery,
};

/// Number of hits requested per search. There is no pagination.
pub const DEFAULT_RESULT_SIZE: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct WeightedField {
    pub name: String,
    pub boost: Option<u32>,
}

impl WeightedField {
    pub fn new(name: impl Into<String>, boost: Option<u32>) -> Self {
        Self {
            name: name.into(),
            boost,
        }
    }

    /// Elasticsearch `field^boost` notation.
    pub fn boosted_name(&self) -> String {
        match self.boost {
            Some(boost) => format!("{}^{}", self.name, boost),
            None => self.name.clone(),
        }
    }
}

/// Builds the query document sent for every search.
///
/// Defaults: phrase-prefix match over `title^3` and `content`, highlights on
/// `content`, at most [`DEFAULT_RESULT_SIZE`] hits.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    fields: Vec<WeightedField>,
    match_type: MatchType,
    highlight_field: String,
    size: usize,
}

impl Default for QueryEngine {
    fn default() -> Self {
        Self {
            fields: vec![
                WeightedField::new("title", Some(3)),
                WeightedField::new("content", None),
            ],
            match_type: MatchType::PhrasePrefix,
            highlight_field: "content".to_string(),
            size: DEFAULT_RESULT_SIZE,
        }
    }
}

impl QueryEngine {
    pub fn new(
        fields: Vec<WeightedField>,
        match_type: MatchType,
        highlight_field: impl Into<String>,
        size: usize,
    ) -> Self {
        Self {
            fields,
            match_type,
            highlight_field: highlight_field.into(),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn highlight_field(&self) -> &str {
        &self.highlight_field
    }

    /// The text goes into `query.multi_match.query` untouched.
    pub fn build(&self, text: &str) -> SearchQuery {
        let mut highlight_fields = BTreeMap::new();
        highlight_fields.insert(self.highlight_field.clone(), HighlightField::default());

        SearchQuery {
            query: QueryClause {
                multi_match: MultiMatch {
                    query: text.to_string(),
                    match_type: self.match_type,
                    fields: self.fields.iter().map(WeightedField::boosted_name).collect(),
                },
            },
            highlight: Highlight {
                fields: highlight_fields,
            },
            size: self.size,
        }
    }

    pub fn build_json(&self, text: &str) -> serde_json::Value {
        // Plain derived structs with string keys always serialize.
        serde_json::to_value(self.build(text)).unwrap_or_default()
    }
}

#[test]
fn test_default_query_document_shape() {
    let engine = QueryEngine::default();
    let got = engine.build_json("getting started");
    let expected = serde_json::json!({
        "query": {
            "multi_match": {
                "query": "getting started",
                "type": "phrase_prefix",
                "fields": ["title^3", "content"]
            }
        },
        "highlight": {
            "fields": {
                "content": {}
            }
        },
        "size": 50
    });
    assert_eq!(got, expected);
}

#[test]
fn test_query_text_is_passed_verbatim() {
    let engine = QueryEngine::default();
    for text in [
        "",
        "   padded   ",
        "quotes \" and \\ backslashes",
        "<script>alert(1)</script>",
        "юникод 検索 🔍",
        "title^3 OR content:*",
    ] {
        let query = engine.build(text);
        assert_eq!(query.query.multi_match.query, text);

        let json = engine.build_json(text);
        assert_eq!(json["query"]["multi_match"]["query"].as_str(), Some(text));
    }
}

#[test]
fn test_custom_engine_fields_and_size() {
    let engine = QueryEngine::new(
        vec![
            WeightedField::new("headline", Some(5)),
            WeightedField::new("body", Some(1)),
            WeightedField::new("tags", None),
        ],
        MatchType::BestFields,
        "body",
        10,
    );
    let json = engine.build_json("rust");
    assert_eq!(json["query"]["multi_match"]["type"], "best_fields");
    assert_eq!(
        json["query"]["multi_match"]["fields"],
        serde_json::json!(["headline^5", "body^1", "tags"])
    );
    assert_eq!(json["highlight"]["fields"], serde_json::json!({"body": {}}));
    assert_eq!(json["size"], 10);
    assert_eq!(engine.size(), 10);
    assert_eq!(engine.highlight_field(), "body");
}
