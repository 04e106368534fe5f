//! Comprehension assessor.
//!
//! Resolves the topic (keyword table, then a one-label completion call),
//! scores the level according to the interaction type, and fills in gaps and
//! the next step from the [`Catalog`]. Every failure collapses to the
//! documented defaults; nothing is raised past `assess`.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use vectormentor_core::history::BoundedHistory;
use vectormentor_core::tutoring::{Assessment, InteractionType, Level, TopicId, Turn};

use crate::catalog::Catalog;
use crate::llm::AgentLlm;
use crate::text::{Tokens, normalize};

/// Confidence assumed when a scored reply omits it.
const MISSING_CONFIDENCE: f32 = 0.7;

/// Keyword → topic table. Overlaps are resolved by phrase length, so
/// "producto de matrices" beats "matrices". Entries also match their
/// plurals ("inversa" in "inversas").
const TOPIC_KEYWORDS: &[(&str, TopicId)] = &[
    ("producto de matrices", TopicId::MultiplicacionMatrices),
    ("multiplicacion de matrices", TopicId::MultiplicacionMatrices),
    ("multiplicar matrices", TopicId::MultiplicacionMatrices),
    ("producto matriz", TopicId::MultiplicacionMatrices),
    ("producto punto", TopicId::ProductoPunto),
    ("producto escalar", TopicId::ProductoPunto),
    ("dot product", TopicId::ProductoPunto),
    ("determinante", TopicId::Determinantes),
    ("determinantes", TopicId::Determinantes),
    ("det", TopicId::Determinantes),
    ("matriz inversa", TopicId::MatrizInversa),
    ("matrices inversas", TopicId::MatrizInversa),
    ("inversa", TopicId::MatrizInversa),
    ("matriz transpuesta", TopicId::MatrizTranspuesta),
    ("matrices transpuestas", TopicId::MatrizTranspuesta),
    ("transpuesta", TopicId::MatrizTranspuesta),
    ("vector", TopicId::Vectores),
    ("vectores", TopicId::Vectores),
    ("matriz", TopicId::Matrices),
    ("matrices", TopicId::Matrices),
    ("sistema de ecuaciones", TopicId::SistemasLineales),
    ("sistema", TopicId::SistemasLineales),
    ("ecuaciones", TopicId::SistemasLineales),
    ("lineal", TopicId::SistemasLineales),
    ("suma", TopicId::OperacionesBasicas),
    ("resta", TopicId::OperacionesBasicas),
    ("magnitud", TopicId::MagnitudVectores),
    ("norma", TopicId::MagnitudVectores),
    ("unitario", TopicId::VectoresUnitarios),
    ("ortogonal", TopicId::Ortogonalidad),
    ("perpendicular", TopicId::Ortogonalidad),
    ("espacio vectorial", TopicId::EspaciosVectoriales),
    ("base", TopicId::EspaciosVectoriales),
    ("dimension", TopicId::EspaciosVectoriales),
    ("independencia lineal", TopicId::IndependenciaLineal),
    ("independencia", TopicId::IndependenciaLineal),
];

/// Most specific keyword match: most tokens, then most characters, then
/// table order.
pub fn topic_by_keywords(text: &str) -> Option<TopicId> {
    let tokens = Tokens::new(text);
    let mut best: Option<(usize, usize, TopicId)> = None;
    for (phrase, topic) in TOPIC_KEYWORDS {
        if !tokens.has_phrase_or_plural(phrase) {
            continue;
        }
        let rank = (Tokens::phrase_len(phrase), phrase.len());
        if best.is_none_or(|(t, c, _)| rank > (t, c)) {
            best = Some((rank.0, rank.1, *topic));
        }
    }
    best.map(|(_, _, topic)| topic)
}

/// Slice from the first `{` to the last `}` and parse it.
fn extract_json(response: &str) -> Option<Value> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&response[start..=end]).ok()
}

fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn coerce_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

/// Fields read from a scoring reply.
#[derive(Debug, Clone, PartialEq)]
struct Scored {
    level: Level,
    subtopics: Vec<String>,
    strengths: Vec<String>,
    errors: Vec<String>,
    confidence: f32,
}

/// Coerce a scoring reply. `None` when no object with a usable `level` is found.
fn parse_scored(response: &str) -> Option<Scored> {
    let value = extract_json(response)?;
    let object = value.as_object()?;
    let level = coerce_number(object.get("level")?)?;
    let confidence = object
        .get("confidence")
        .and_then(coerce_number)
        .map(|c| c as f32)
        .unwrap_or(MISSING_CONFIDENCE);
    Some(Scored {
        level: Level::clamped(level.round() as i64),
        subtopics: coerce_list(object.get("subtopics")),
        strengths: coerce_list(object.get("strengths")),
        errors: coerce_list(object.get("errors")),
        confidence,
    })
}

/// The latest tutor output that reads like a question or a task.
fn original_question(history: &BoundedHistory<Turn>) -> Option<String> {
    history.iter().rev().find_map(|turn| {
        let text = if turn.exercise.is_empty() {
            turn.response.clone()
        } else {
            format!("{}\n\n{}", turn.response, turn.exercise)
        };
        (text.contains('?') || normalize(&text).contains("calcula")).then_some(text)
    })
}

#[derive(Debug, Clone)]
pub struct AssessorOutput {
    pub assessment: Assessment,
    pub degraded: Vec<String>,
}

pub struct Assessor {
    llm: AgentLlm,
    catalog: Arc<Catalog>,
}

impl Assessor {
    pub fn new(llm: AgentLlm, catalog: Arc<Catalog>) -> Self {
        Self { llm, catalog }
    }

    pub async fn assess(
        &self,
        text: &str,
        interaction_type: InteractionType,
        history: &BoundedHistory<Turn>,
    ) -> AssessorOutput {
        let mut degraded = Vec::new();

        if !interaction_type.is_scored() {
            let topic = topic_by_keywords(text).unwrap_or(TopicId::General);
            let level = Level::default();
            debug!(%topic, %interaction_type, "Unscored interaction, using defaults");
            let assessment = Assessment::new(level, topic)
                .with_subtopics(vec![topic.as_str().to_string()])
                .with_knowledge_gaps(self.catalog.gaps_for(topic, level))
                .with_next_step(self.catalog.next_step(topic, level));
            return AssessorOutput { assessment, degraded };
        }

        let topic = self.resolve_topic(text, &mut degraded).await;

        let prompt = if interaction_type == InteractionType::Answer {
            let question = original_question(history);
            if question.is_none() {
                debug!("No prior question found for answer");
            }
            answer_prompt(text, question.as_deref().unwrap_or("(sin pregunta previa)"), topic)
        } else {
            question_prompt(text, topic)
        };

        let scored = match self.llm.complete(&prompt).await {
            Ok(response) => {
                let parsed = parse_scored(&response);
                if parsed.is_none() {
                    warn!(response = %response, "Unparseable assessment, using defaults");
                    degraded.push("unparseable assessment output".to_string());
                }
                parsed
            }
            Err(e) => {
                warn!(error = %e, "Assessment call failed, using defaults");
                degraded.push(e.to_string());
                None
            }
        };

        let assessment = match scored {
            Some(scored) => Assessment::new(scored.level, topic)
                .with_subtopics(scored.subtopics)
                .with_strengths(scored.strengths)
                .with_errors(scored.errors)
                .with_confidence(scored.confidence),
            None => Assessment::fallback(topic),
        };
        let level = assessment.level();
        let assessment = assessment
            .with_knowledge_gaps(self.catalog.gaps_for(topic, level))
            .with_next_step(self.catalog.next_step(topic, level));

        debug!(%topic, level = level.get(), confidence = assessment.confidence(), "Assessed");
        AssessorOutput { assessment, degraded }
    }

    async fn resolve_topic(&self, text: &str, degraded: &mut Vec<String>) -> TopicId {
        if let Some(topic) = topic_by_keywords(text) {
            return topic;
        }

        let labels: Vec<&str> = TopicId::ALL.iter().map(|t| t.as_str()).collect();
        let prompt = format!(
            "Identifica el tema de álgebra lineal de este mensaje.\n\
             Temas posibles: {}\n\n\
             Mensaje: \"{text}\"\n\n\
             Responde SOLO con el identificador del tema.",
            labels.join(", ")
        );

        match self.llm.complete(&prompt).await {
            Ok(response) => response.parse::<TopicId>().unwrap_or_else(|_| {
                debug!(response = %response, "Unknown topic label, using general");
                TopicId::General
            }),
            Err(e) => {
                warn!(error = %e, "Topic call failed, using general");
                degraded.push(e.to_string());
                TopicId::General
            }
        }
    }
}

fn question_prompt(text: &str, topic: TopicId) -> String {
    format!(
        "Evalúa el nivel de sofisticación de esta pregunta sobre {topic}.\n\n\
         Pregunta: \"{text}\"\n\n\
         Escala:\n\
         1 = pregunta básica del tipo \"¿qué es?\"\n\
         2 = pide un ejemplo o una operación simple\n\
         3 = pregunta por un procedimiento o cálculo\n\
         4 = relaciona conceptos o pide aplicaciones\n\
         5 = pregunta por teoría o demostraciones\n\n\
         Responde SOLO con JSON:\n\
         {{\"level\": <1-5>, \"subtopics\": [\"...\"], \"confidence\": <0.0-1.0>}}",
        topic = topic.display_name()
    )
}

fn answer_prompt(text: &str, question: &str, topic: TopicId) -> String {
    format!(
        "Evalúa la respuesta del estudiante sobre {topic}.\n\n\
         Pregunta original:\n{question}\n\n\
         Respuesta del estudiante: \"{text}\"\n\n\
         Responde SOLO con JSON:\n\
         {{\"level\": <1-5>, \"subtopics\": [\"...\"], \"strengths\": [\"...\"], \
         \"errors\": [\"...\"], \"confidence\": <0.0-1.0>}}",
        topic = topic.display_name()
    )
}
