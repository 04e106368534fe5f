//! Empty store: a retrieval service with nothing in it.

use async_trait::async_trait;
use vectormentor_core::error::RetrievalError;
use vectormentor_core::retrieval::{RetrievalService, RetrievalStats, RetrievedDocument};
use vectormentor_core::tutoring::Level;

/// Returns no documents for every query.
pub struct EmptyStore;

#[async_trait]
impl RetrievalService for EmptyStore {
    fn name(&self) -> &str { "empty" }

    async fn search(
        &self,
        _query: &str,
        _top_k: usize,
        _max_level: Option<Level>,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        Ok(Vec::new())
    }

    async fn search_by_topic(
        &self,
        _topic: &str,
        _level: Option<Level>,
        _top_k: usize,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        Ok(Vec::new())
    }

    async fn stats(&self) -> Result<RetrievalStats, RetrievalError> {
        Ok(RetrievalStats {
            count: 0,
            status: "empty".into(),
            kind: "empty".into(),
            topics: Vec::new(),
        })
    }
}
