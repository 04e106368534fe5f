//! Keyword store: in-memory passages ranked by term overlap.
//!
//! Each query word scores +2 when it occurs in a passage body and +3 when it
//! is one of the passage's keyword tags. Both sides are accent-folded, so
//! "multiplicacion" finds "multiplicación". Passages above the requested
//! difficulty are dropped before ranking; zero-score passages never match.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use vectormentor_core::error::RetrievalError;
use vectormentor_core::retrieval::{RetrievalService, RetrievalStats, RetrievedDocument};
use vectormentor_core::text::normalize;
use vectormentor_core::tutoring::Level;

use crate::corpus::{load_corpus, seed_documents};

const BODY_HIT: f32 = 2.0;
const KEYWORD_HIT: f32 = 3.0;

pub struct KeywordStore {
    documents: Arc<RwLock<Vec<RetrievedDocument>>>,
}

impl KeywordStore {
    pub fn new(documents: Vec<RetrievedDocument>) -> Self {
        Self {
            documents: Arc::new(RwLock::new(documents)),
        }
    }

    /// A store holding the built-in linear-algebra passages.
    pub fn seeded() -> Self {
        Self::new(seed_documents())
    }

    /// A store holding the passages of a TOML corpus file.
    pub fn from_corpus_file(path: &Path) -> Result<Self, RetrievalError> {
        let documents = load_corpus(path)?;
        tracing::info!(path = %path.display(), count = documents.len(), "Loaded corpus");
        Ok(Self::new(documents))
    }

    pub async fn add_documents(&self, documents: Vec<RetrievedDocument>) {
        let added = documents.len();
        self.documents.write().await.extend(documents);
        tracing::debug!(added, "Documents added to keyword store");
    }
}

impl Default for KeywordStore {
    fn default() -> Self {
        Self::seeded()
    }
}

fn query_terms(query: &str) -> Vec<String> {
    normalize(query)
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|word| !word.is_empty())
        .collect()
}

fn score(document: &RetrievedDocument, terms: &[String]) -> f32 {
    let body = normalize(&document.content);
    terms
        .iter()
        .map(|term| {
            let mut points = 0.0;
            if body.contains(term.as_str()) {
                points += BODY_HIT;
            }
            if document.keywords.iter().any(|k| normalize(k) == *term) {
                points += KEYWORD_HIT;
            }
            points
        })
        .sum()
}

#[async_trait]
impl RetrievalService for KeywordStore {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn search(
        &self,
        query: &str,
        top_k: usize,
        max_level: Option<Level>,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        let terms = query_terms(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let documents = self.documents.read().await;
        let mut results: Vec<RetrievedDocument> = documents
            .iter()
            .filter(|d| d.within(max_level))
            .filter_map(|d| {
                let s = score(d, &terms);
                (s > 0.0).then(|| RetrievedDocument { score: s, ..d.clone() })
            })
            .collect();

        // Stable sort keeps corpus order among equal scores
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(top_k);

        tracing::debug!(query, hits = results.len(), "Keyword search");
        Ok(results)
    }

    async fn search_by_topic(
        &self,
        topic: &str,
        level: Option<Level>,
        top_k: usize,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        let needle = topic.to_lowercase();
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .filter(|d| d.topic.to_lowercase().contains(&needle))
            .filter(|d| d.within(level))
            .take(top_k)
            .cloned()
            .collect())
    }

    async fn stats(&self) -> Result<RetrievalStats, RetrievalError> {
        let documents = self.documents.read().await;
        let topics: BTreeSet<&str> = documents.iter().map(|d| d.topic.as_str()).collect();
        Ok(RetrievalStats {
            count: documents.len(),
            status: if documents.is_empty() { "empty".into() } else { "active".into() },
            kind: "keyword_search".into(),
            topics: topics.into_iter().map(String::from).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, topic: &str, level: u8, keywords: &[&str], content: &str) -> RetrievedDocument {
        RetrievedDocument {
            id: id.into(),
            content: content.into(),
            topic: topic.into(),
            level,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            score: 0.0,
        }
    }

    fn small_store() -> KeywordStore {
        KeywordStore::new(vec![
            doc("a", "vectores", 1, &["vector"], "Un vector tiene magnitud y dirección"),
            doc("b", "matrices", 2, &["matriz"], "Una matriz tiene filas y columnas"),
            doc("c", "espacios_vectoriales", 4, &["vector", "base"], "Una base de vectores genera el espacio"),
        ])
    }

    #[tokio::test]
    async fn scores_body_and_keyword_hits() {
        let store = small_store();
        let results = store.search("¿Qué es un vector?", 5, Some(Level::clamped(3))).await.unwrap();
        assert_eq!(results[0].id, "a");
        assert_eq!(results[1].id, "b");
        // "vector" in body (+2) and keyword (+3), "un" in body (+2)
        assert_eq!(results[0].score, 7.0);
    }

    #[tokio::test]
    async fn level_filter_excludes_harder_passages() {
        let store = small_store();
        let results = store.search("vector base", 5, Some(Level::clamped(3))).await.unwrap();
        assert!(results.iter().all(|d| d.level <= 3));
        assert!(results.iter().all(|d| d.id != "c"));
    }

    #[tokio::test]
    async fn zero_score_passages_do_not_match() {
        let store = small_store();
        let results = store.search("xyz", 5, None).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn top_k_bounds_results() {
        let store = KeywordStore::seeded();
        let results = store.search("producto de matrices", 2, None).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn accents_are_folded_on_both_sides() {
        let store = KeywordStore::seeded();
        let results = store.search("multiplicacion matrices", 5, Some(Level::clamped(3))).await.unwrap();
        assert_eq!(results[0].id, "multiplicacion_matrices");
        assert!(results[0].score > results[1].score);

        let store = small_store();
        let results = store.search("DIRECCIÓN", 5, None).await.unwrap();
        assert_eq!(results[0].id, "a");
    }

    #[tokio::test]
    async fn empty_query_returns_nothing() {
        let store = KeywordStore::seeded();
        assert!(store.search("  ¿? ", 5, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_by_topic_matches_substring_and_level() {
        let store = small_store();
        let results = store.search_by_topic("vector", None, 5).await.unwrap();
        assert_eq!(results.len(), 2);

        let results = store.search_by_topic("vector", Some(Level::clamped(2)), 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "a");
    }

    #[tokio::test]
    async fn empty_store_reports_empty_status() {
        let store = KeywordStore::new(Vec::new());
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.count, 0);
        assert_eq!(stats.status, "empty");
        assert!(store.search("vector", 5, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stats_list_distinct_topics() {
        let store = small_store();
        store
            .add_documents(vec![doc("d", "vectores", 2, &[], "Suma de vectores")])
            .await;
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.topics.len(), 3);
        assert_eq!(stats.kind, "keyword_search");
    }
}
