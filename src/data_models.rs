use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// Outbound query document
// =============================================================================

/// The request body POSTed to `_search`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub query: QueryClause,
    pub highlight: Highlight,
    pub size: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct QueryClause {
    pub multi_match: MultiMatch,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MultiMatch {
    pub query: String,
    #[serde(rename = "type")]
    pub match_type: MatchType,
    /// Field names, optionally boosted with the `name^N` syntax.
    pub fields: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    BestFields,
    MostFields,
    CrossFields,
    Phrase,
    PhrasePrefix,
    BoolPrefix,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Highlight {
    pub fields: BTreeMap<String, HighlightField>,
}

/// Serializes as `{}`, i.e. engine defaults for the field.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct HighlightField {}

// =============================================================================
// Inbound search response
// =============================================================================

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SearchResponse {
    pub hits: Hits,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Hits {
    pub total: TotalHits,
    pub hits: Vec<Hit>,
}

/// `hits.total` is `{"value": N, "relation": "eq"}` on 7.x+ and a bare number before that.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum TotalHits {
    Object {
        value: u64,
        #[serde(default)]
        relation: Option<String>,
    },
    Count(u64),
}

impl TotalHits {
    pub fn value(&self) -> u64 {
        match self {
            TotalHits::Object { value, .. } => *value,
            TotalHits::Count(value) => *value,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Hit {
    #[serde(rename = "_source")]
    pub source: HitSource,
    #[serde(default)]
    pub highlight: HitHighlight,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct HitSource {
    /// Pages without a heading are indexed with a null title.
    #[serde(default)]
    pub title: Option<String>,
    pub url: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct HitHighlight {
    #[serde(default)]
    pub content: Vec<String>,
}

/// Error document returned by the cluster alongside a non-2xx status.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorBody {
    pub error: ErrorDetail,
    #[serde(default)]
    pub status: Option<u16>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ErrorDetail {
    Structured {
        #[serde(rename = "type")]
        error_type: String,
        #[serde(default)]
        reason: Option<String>,
    },
    Message(String),
}

impl ErrorDetail {
    pub fn error_type(&self) -> Option<&str> {
        match self {
            ErrorDetail::Structured { error_type, .. } => Some(error_type),
            ErrorDetail::Message(_) => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ErrorDetail::Structured {
                error_type,
                reason: Some(reason),
            } => format!("{error_type}: {reason}"),
            ErrorDetail::Structured { error_type, .. } => error_type.clone(),
            ErrorDetail::Message(msg) => msg.clone(),
        }
    }
}

// =============================================================================
// Index maintenance
// =============================================================================

/// One documentation page as stored in the index.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IndexedPage {
    pub url: String,
    pub title: Option<String>,
    pub content: String,
}

impl IndexedPage {
    pub fn new(url: String, title: Option<String>, content: String) -> IndexedPage {
        IndexedPage {
            url,
            title,
            content,
        }
    }
}

/// Body of index create/delete responses.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct AcknowledgedResponse {
    #[serde(default)]
    pub acknowledged: Option<bool>,
    #[serde(default)]
    pub error: Option<ErrorDetail>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct BulkResponse {
    /// Absent means we cannot tell, which counts as a failure.
    #[serde(default)]
    pub errors: Option<bool>,
}
