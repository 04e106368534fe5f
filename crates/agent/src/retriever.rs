//! Retrieval stage.
//!
//! Rewrites the student text into a search query, runs one level-filtered
//! search against the [`RetrievalService`] and adapts the best passages to
//! the student's level. A failing store reads as "no content", a failing
//! completion call degrades to the raw passages.

use std::sync::Arc;
use tracing::{debug, warn};
use vectormentor_core::retrieval::{RetrievalService, RetrievedDocument};
use vectormentor_core::tutoring::{Level, TopicId, Trend};

use crate::llm::AgentLlm;
use crate::progress::adaptation_hint;

/// Digest used when the search produced nothing usable.
pub const NOTHING_FOUND: &str = "No se encontró contenido específico para tu consulta.";

#[derive(Debug, Clone)]
pub struct RetrievalOutput {
    pub digest: String,
    /// Documents the search returned, at or below the requested level.
    pub documents: Vec<RetrievedDocument>,
    pub query: String,
    pub degraded: Vec<String>,
}

pub struct Retriever {
    llm: AgentLlm,
    store: Arc<dyn RetrievalService>,
    top_k: usize,
    digest_documents: usize,
    degraded_chars: usize,
}

/// Cut to `limit` characters, marking the cut.
fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte, _)) => format!("{}...", &text[..byte]),
        None => text.to_string(),
    }
}

impl Retriever {
    pub fn new(
        llm: AgentLlm,
        store: Arc<dyn RetrievalService>,
        top_k: usize,
        digest_documents: usize,
        degraded_chars: usize,
    ) -> Self {
        Self {
            llm,
            store,
            top_k,
            digest_documents,
            degraded_chars,
        }
    }

    pub fn store(&self) -> &Arc<dyn RetrievalService> {
        &self.store
    }

    /// `trend` is the trend before this turn and only shapes the adaptation prompt.
    pub async fn retrieve(
        &self,
        text: &str,
        topic: TopicId,
        level: Level,
        trend: Trend,
    ) -> RetrievalOutput {
        let mut degraded = Vec::new();
        let query = self.build_query(text, topic, &mut degraded).await;

        let documents = match self.store.search(&query, self.top_k, Some(level)).await {
            Ok(documents) => documents
                .into_iter()
                .filter(|d| d.within(Some(level)))
                .collect::<Vec<_>>(),
            Err(e) => {
                warn!(
                    store = self.store.name(),
                    error = %e,
                    "Search failed, treating as no content"
                );
                degraded.push(e.to_string());
                return RetrievalOutput {
                    digest: NOTHING_FOUND.to_string(),
                    documents: Vec::new(),
                    query,
                    degraded,
                };
            }
        };

        if documents.is_empty() {
            debug!(query = %query, "No documents found");
            return RetrievalOutput {
                digest: NOTHING_FOUND.to_string(),
                documents,
                query,
                degraded,
            };
        }

        let combined = documents
            .iter()
            .take(self.digest_documents)
            .map(|d| d.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = adaptation_prompt(&combined, topic, level, trend);
        let digest = match self.llm.complete(&prompt).await {
            Ok(adapted) => adapted,
            Err(e) => {
                warn!(error = %e, "Adaptation failed, using raw passages");
                degraded.push(e.to_string());
                truncate_chars(&combined, self.degraded_chars)
            }
        };

        debug!(query = %query, documents = documents.len(), "Retrieved");
        RetrievalOutput {
            digest,
            documents,
            query,
            degraded,
        }
    }

    async fn build_query(&self, text: &str, topic: TopicId, degraded: &mut Vec<String>) -> String {
        let prompt = format!(
            "Reescribe la consulta del estudiante como una búsqueda breve de palabras clave \
             de álgebra lineal.\n\nConsulta: \"{text}\"\n\nResponde SOLO con la búsqueda."
        );
        match self.llm.complete(&prompt).await {
            Ok(query) => query,
            Err(e) => {
                warn!(error = %e, "Query rewrite failed, using fallback query");
                degraded.push(e.to_string());
                if topic == TopicId::General {
                    text.to_string()
                } else {
                    topic.display_name()
                }
            }
        }
    }
}

fn adaptation_prompt(content: &str, topic: TopicId, level: Level, trend: Trend) -> String {
    let mut prompt = format!(
        "Adapta el siguiente contenido sobre {topic} para un estudiante de nivel {level}/5 \
         (1 = principiante, 5 = avanzado). Conserva las fórmulas y los ejemplos numéricos.\n\n\
         Contenido:\n{content}",
        topic = topic.display_name()
    );
    if let Some(hint) = adaptation_hint(trend) {
        prompt.push_str("\n\n");
        prompt.push_str(hint);
    }
    prompt
}
