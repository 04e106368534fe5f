//! Tutoring domain types.
//!
//! The closed vocabularies the pipeline routes on, the bounded comprehension
//! level, and the per-turn records. Everything the language model returns is
//! coerced into these shapes at the agent boundary, so downstream stages never
//! see an out-of-range level or an oversized gap list.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── Level ──────────────────────────────────────────────────────────────────

/// Comprehension level, always within `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Level(u8);

impl Level {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Build a level, rejecting values outside `1..=5`.
    pub fn new(value: i64) -> Option<Self> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Some(Self(value as u8))
        } else {
            None
        }
    }

    /// Build a level, clamping out-of-range values to the nearest bound.
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Level {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<u8> for Level {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value as i64).ok_or_else(|| format!("level {value} outside 1..=5"))
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Interaction type ───────────────────────────────────────────────────────

/// What kind of utterance the student produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    Question,
    ExamplesRequest,
    ProcedureRequest,
    Greeting,
    Answer,
    DefinitionRequest,
    CalculationRequest,
    Statement,
}

impl InteractionType {
    pub const ALL: [InteractionType; 8] = [
        Self::Question,
        Self::ExamplesRequest,
        Self::ProcedureRequest,
        Self::Greeting,
        Self::Answer,
        Self::DefinitionRequest,
        Self::CalculationRequest,
        Self::Statement,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::ExamplesRequest => "examples_request",
            Self::ProcedureRequest => "procedure_request",
            Self::Greeting => "greeting",
            Self::Answer => "answer",
            Self::DefinitionRequest => "definition_request",
            Self::CalculationRequest => "calculation_request",
            Self::Statement => "statement",
        }
    }

    /// Whether the Assessor scores this interaction with an external call.
    /// Greetings and statements are short-circuited.
    pub fn is_scored(self) -> bool {
        !matches!(self, Self::Greeting | Self::Statement)
    }

    /// Whether a practice exercise may follow the response.
    pub fn allows_exercise(self) -> bool {
        !matches!(self, Self::Greeting | Self::Answer)
    }
}

impl FromStr for InteractionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '.')
            .to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == label)
            .ok_or_else(|| format!("unknown interaction type: {s}"))
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Topic ──────────────────────────────────────────────────────────────────

/// Closed topic vocabulary for the linear-algebra curriculum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicId {
    Vectores,
    OperacionesBasicas,
    MagnitudVectores,
    VectoresUnitarios,
    ProductoPunto,
    Ortogonalidad,
    Matrices,
    MultiplicacionMatrices,
    Determinantes,
    MatrizInversa,
    MatrizTranspuesta,
    SistemasLineales,
    EspaciosVectoriales,
    IndependenciaLineal,
    /// Catch-all when nothing more specific applies.
    #[serde(rename = "algebra_lineal")]
    General,
}

impl TopicId {
    pub const ALL: [TopicId; 15] = [
        Self::Vectores,
        Self::OperacionesBasicas,
        Self::MagnitudVectores,
        Self::VectoresUnitarios,
        Self::ProductoPunto,
        Self::Ortogonalidad,
        Self::Matrices,
        Self::MultiplicacionMatrices,
        Self::Determinantes,
        Self::MatrizInversa,
        Self::MatrizTranspuesta,
        Self::SistemasLineales,
        Self::EspaciosVectoriales,
        Self::IndependenciaLineal,
        Self::General,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vectores => "vectores",
            Self::OperacionesBasicas => "operaciones_basicas",
            Self::MagnitudVectores => "magnitud_vectores",
            Self::VectoresUnitarios => "vectores_unitarios",
            Self::ProductoPunto => "producto_punto",
            Self::Ortogonalidad => "ortogonalidad",
            Self::Matrices => "matrices",
            Self::MultiplicacionMatrices => "multiplicacion_matrices",
            Self::Determinantes => "determinantes",
            Self::MatrizInversa => "matriz_inversa",
            Self::MatrizTranspuesta => "matriz_transpuesta",
            Self::SistemasLineales => "sistemas_lineales",
            Self::EspaciosVectoriales => "espacios_vectoriales",
            Self::IndependenciaLineal => "independencia_lineal",
            Self::General => "algebra_lineal",
        }
    }

    /// Human-readable name used inside prompts and suggestions.
    pub fn display_name(self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl FromStr for TopicId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '.')
            .to_lowercase()
            .replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|topic| topic.as_str() == label)
            .ok_or_else(|| format!("unknown topic: {s}"))
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Assessment ─────────────────────────────────────────────────────────────

/// Evaluation of one turn.
///
/// Built once by the Assessor and read-only afterwards. Knowledge gaps are
/// capped at [`Assessment::MAX_GAPS`] and always empty at level 4 or above.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    level: Level,
    topic: TopicId,
    subtopics: Vec<String>,
    knowledge_gaps: Vec<String>,
    strengths: Vec<String>,
    errors: Vec<String>,
    confidence: f32,
    next_step: String,
}

impl Assessment {
    pub const MAX_GAPS: usize = 2;
    pub const DEFAULT_CONFIDENCE: f32 = 0.5;

    pub fn new(level: Level, topic: TopicId) -> Self {
        Self {
            level,
            topic,
            subtopics: Vec::new(),
            knowledge_gaps: Vec::new(),
            strengths: Vec::new(),
            errors: Vec::new(),
            confidence: Self::DEFAULT_CONFIDENCE,
            next_step: String::new(),
        }
    }

    /// Level 3, confidence 0.5, empty lists.
    pub fn fallback(topic: TopicId) -> Self {
        Self::new(Level::default(), topic)
    }

    pub fn with_subtopics(mut self, subtopics: Vec<String>) -> Self {
        self.subtopics = subtopics;
        self
    }

    pub fn with_strengths(mut self, strengths: Vec<String>) -> Self {
        self.strengths = strengths;
        self
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }

    /// Set confidence, clamped to `0.0..=1.0`. Non-finite values fall back
    /// to the default.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            Self::DEFAULT_CONFIDENCE
        };
        self
    }

    pub fn with_knowledge_gaps(mut self, mut gaps: Vec<String>) -> Self {
        if self.level.get() >= 4 {
            gaps.clear();
        }
        gaps.truncate(Self::MAX_GAPS);
        self.knowledge_gaps = gaps;
        self
    }

    pub fn with_next_step(mut self, next_step: impl Into<String>) -> Self {
        self.next_step = next_step.into();
        self
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn topic(&self) -> TopicId {
        self.topic
    }

    pub fn subtopics(&self) -> &[String] {
        &self.subtopics
    }

    pub fn knowledge_gaps(&self) -> &[String] {
        &self.knowledge_gaps
    }

    pub fn strengths(&self) -> &[String] {
        &self.strengths
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn next_step(&self) -> &str {
        &self.next_step
    }
}

// ── Turn ───────────────────────────────────────────────────────────────────

/// One completed request/response cycle.
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub input: String,
    pub interaction_type: InteractionType,
    pub assessment: Assessment,
    /// Level-adapted retrieval digest, empty when retrieval was skipped.
    pub digest: String,
    pub response: String,
    /// Practice exercise, empty when none was produced.
    pub exercise: String,
}

// ── Trend ──────────────────────────────────────────────────────────────────

/// Direction of recent level changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    #[default]
    #[serde(rename = "inicial")]
    Initial,
    #[serde(rename = "evaluando")]
    Evaluating,
    #[serde(rename = "mejorando")]
    Improving,
    #[serde(rename = "declinando")]
    Declining,
    #[serde(rename = "estable")]
    Stable,
}

impl Trend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "inicial",
            Self::Evaluating => "evaluando",
            Self::Improving => "mejorando",
            Self::Declining => "declinando",
            Self::Stable => "estable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
