//! Retrieval service trait: the boundary to the document store.
//!
//! The pipeline only ever reads from it. Implementations must tolerate an
//! empty or partially-initialized store by returning no documents.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;
use crate::tutoring::Level;

/// A passage returned by the retrieval service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDocument {
    /// Unique ID for this passage
    pub id: String,

    /// Passage body
    pub content: String,

    /// Topic label from the store's metadata
    pub topic: String,

    /// Difficulty, 1 (basic) to 5 (theory)
    pub level: u8,

    /// Keyword tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    /// Relevance score (set by search operations)
    #[serde(default)]
    pub score: f32,
}

impl RetrievedDocument {
    /// Whether the passage is at or below the given difficulty.
    pub fn within(&self, max_level: Option<Level>) -> bool {
        max_level.is_none_or(|max| self.level <= max.get())
    }
}

/// Store summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalStats {
    pub count: usize,
    pub status: String,
    /// Backend kind (e.g., "keyword", "empty")
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
}

/// The core RetrievalService trait.
///
/// Implementations: keyword store with a seed corpus, empty store, and test doubles.
#[async_trait]
pub trait RetrievalService: Send + Sync {
    /// The backend name (e.g., "keyword", "empty").
    fn name(&self) -> &str;

    /// Search passages relevant to `query`, at most `top_k`, filtered to
    /// difficulty `<= max_level` when given.
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        max_level: Option<Level>,
    ) -> std::result::Result<Vec<RetrievedDocument>, RetrievalError>;

    /// List passages whose topic label contains `topic`.
    async fn search_by_topic(
        &self,
        topic: &str,
        level: Option<Level>,
        top_k: usize,
    ) -> std::result::Result<Vec<RetrievedDocument>, RetrievalError>;

    async fn stats(&self) -> std::result::Result<RetrievalStats, RetrievalError>;
}
