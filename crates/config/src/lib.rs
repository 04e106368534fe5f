//! Configuration loading, validation, and management for VectorMentor.
//!
//! Loads configuration from `~/.vectormentor/config.toml` with environment
//! variable overrides. Validates all settings at startup.
//!
//! The tutoring catalog (knowledge gaps per topic, next-step phrasing and
//! topic suggestions) is configuration data as well, so a deployment can
//! swap curriculum wording without touching the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.vectormentor/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the text-completion service (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default completion provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Upper bound on a single completion call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Per-agent prompt profiles
    #[serde(default)]
    pub agents: AgentsConfig,

    /// Session history configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Tutor configuration
    #[serde(default)]
    pub tutor: TutorConfig,

    /// Progress tracking configuration
    #[serde(default)]
    pub progress: ProgressConfig,

    /// Knowledge-gap and suggestion catalog
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_request_timeout_secs() -> u64 {
    60
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("agents", &self.agents)
            .field("session", &self.session)
            .field("retrieval", &self.retrieval)
            .field("tutor", &self.tutor)
            .field("progress", &self.progress)
            .field("catalog", &self.catalog)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

// ── Agents ─────────────────────────────────────────────────────────────────

/// Sampling parameters and system prompt for one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentsConfig {
    #[serde(default = "default_coordinator_profile")]
    pub coordinator: AgentProfile,

    #[serde(default = "default_assessor_profile")]
    pub assessor: AgentProfile,

    #[serde(default = "default_retriever_profile")]
    pub retriever: AgentProfile,

    #[serde(default = "default_tutor_profile")]
    pub tutor: AgentProfile,
}

fn default_coordinator_profile() -> AgentProfile {
    AgentProfile {
        temperature: 0.7,
        max_tokens: 500,
        system_prompt: "Eres el coordinador de un sistema de tutoría académica. \
            Tu trabajo es orquestar la interacción entre diferentes agentes especializados \
            para proporcionar la mejor experiencia de aprendizaje al estudiante."
            .into(),
    }
}

fn default_assessor_profile() -> AgentProfile {
    AgentProfile {
        temperature: 0.3,
        max_tokens: 300,
        system_prompt: "Eres un evaluador experto en álgebra lineal. \
            Analiza las respuestas del estudiante y determina su nivel de comprensión \
            en una escala de 1-5. Identifica gaps de conocimiento y sugiere el siguiente paso."
            .into(),
    }
}

fn default_retriever_profile() -> AgentProfile {
    AgentProfile {
        temperature: 0.1,
        max_tokens: 200,
        system_prompt: "Eres un especialista en recuperación de contenido educativo. \
            Tu trabajo es encontrar el material más relevante y apropiado para el nivel \
            del estudiante."
            .into(),
    }
}

fn default_tutor_profile() -> AgentProfile {
    AgentProfile {
        temperature: 0.8,
        max_tokens: 600,
        system_prompt: "Eres un tutor experto en álgebra lineal. \
            Explica conceptos de manera clara y adaptada al nivel del estudiante. \
            Usa ejemplos, analogías y un lenguaje accesible."
            .into(),
    }
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            coordinator: default_coordinator_profile(),
            assessor: default_assessor_profile(),
            retriever: default_retriever_profile(),
            tutor: default_tutor_profile(),
        }
    }
}

// ── Session ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Turns kept per session before the oldest is evicted
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// Messages kept in each agent's rolling prompt history
    #[serde(default = "default_agent_history")]
    pub agent_history: usize,

    /// Append the underlying error to apology messages
    #[serde(default)]
    pub show_diagnostics: bool,
}

fn default_max_turns() -> usize {
    20
}
fn default_agent_history() -> usize {
    10
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            agent_history: default_agent_history(),
            show_diagnostics: false,
        }
    }
}

// ── Retrieval ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Documents folded into the digest
    #[serde(default = "default_digest_documents")]
    pub digest_documents: usize,

    /// Character budget for the digest when level adaptation fails
    #[serde(default = "default_degraded_digest_chars")]
    pub degraded_digest_chars: usize,

    /// Optional TOML corpus replacing the built-in seed passages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corpus_path: Option<PathBuf>,
}

fn default_top_k() -> usize {
    5
}
fn default_digest_documents() -> usize {
    3
}
fn default_degraded_digest_chars() -> usize {
    500
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            digest_documents: default_digest_documents(),
            degraded_digest_chars: default_degraded_digest_chars(),
            corpus_path: None,
        }
    }
}

// ── Tutor ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorConfig {
    /// Probability of skipping the practice exercise on eligible turns
    #[serde(default = "default_exercise_skip_probability")]
    pub exercise_skip_probability: f64,
}

fn default_exercise_skip_probability() -> f64 {
    0.6
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            exercise_skip_probability: default_exercise_skip_probability(),
        }
    }
}

// ── Progress ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Mean-level delta between windows that counts as a change in trend
    #[serde(default = "default_trend_threshold")]
    pub trend_threshold: f64,
}

fn default_trend_threshold() -> f64 {
    0.3
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            trend_threshold: default_trend_threshold(),
        }
    }
}

// ── Catalog ────────────────────────────────────────────────────────────────

/// Next-step phrasing by level band. `{topic}` is replaced with the topic name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextStepTemplates {
    /// Levels 1 and 2
    pub review: String,
    /// Level 3
    pub practice: String,
    /// Level 4
    pub explore: String,
    /// Level 5
    pub deepen: String,
}

impl Default for NextStepTemplates {
    fn default() -> Self {
        Self {
            review: "Repasar conceptos básicos de {topic}".into(),
            practice: "Practicar ejercicios de {topic}".into(),
            explore: "Explorar aplicaciones de {topic}".into(),
            deepen: "Profundizar en teoría de {topic}".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Knowledge gaps keyed by topic identifier
    #[serde(default = "default_gaps")]
    pub gaps: HashMap<String, Vec<String>>,

    /// Gap used when a topic has no catalog entry
    #[serde(default = "default_generic_gap")]
    pub generic_gap: String,

    #[serde(default)]
    pub next_steps: NextStepTemplates,

    /// Next-topic suggestions keyed by the most recent topic identifier
    #[serde(default = "default_suggestions")]
    pub suggestions: HashMap<String, String>,

    /// Suggestion before any interaction
    #[serde(default = "default_start_suggestion")]
    pub start_suggestion: String,

    /// Suggestion for topics without an entry
    #[serde(default = "default_fallback_suggestion")]
    pub fallback_suggestion: String,
}

fn default_gaps() -> HashMap<String, Vec<String>> {
    let entries: [(&str, [&str; 3]); 4] = [
        (
            "multiplicacion_matrices",
            [
                "condición de compatibilidad para multiplicación",
                "cálculo elemento a elemento",
                "interpretación del resultado",
            ],
        ),
        (
            "producto_punto",
            [
                "fórmula del producto punto",
                "interpretación geométrica",
                "relación con ángulos",
            ],
        ),
        (
            "vectores",
            [
                "representación de vectores",
                "operaciones básicas",
                "magnitud y dirección",
            ],
        ),
        (
            "matrices",
            [
                "notación matricial",
                "tipos de matrices",
                "operaciones básicas",
            ],
        ),
    ];
    entries
        .into_iter()
        .map(|(topic, gaps)| (topic.to_string(), gaps.iter().map(|g| g.to_string()).collect()))
        .collect()
}

fn default_generic_gap() -> String {
    "conceptos fundamentales".into()
}

fn default_suggestions() -> HashMap<String, String> {
    [
        ("vectores", "¿Qué tal si exploramos el producto punto entre vectores?"),
        ("matrices", "Podrías aprender sobre determinantes de matrices"),
        ("sistemas_lineales", "Los métodos de eliminación gaussiana son muy útiles"),
    ]
    .into_iter()
    .map(|(topic, text)| (topic.to_string(), text.to_string()))
    .collect()
}

fn default_start_suggestion() -> String {
    "Te sugiero comenzar con conceptos básicos de vectores".into()
}

fn default_fallback_suggestion() -> String {
    "Continúa explorando los temas que más te interesen".into()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            gaps: default_gaps(),
            generic_gap: default_generic_gap(),
            next_steps: NextStepTemplates::default(),
            suggestions: default_suggestions(),
            start_suggestion: default_start_suggestion(),
            fallback_suggestion: default_fallback_suggestion(),
        }
    }
}

// ── Loading ────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from the default path (~/.vectormentor/config.toml).
    ///
    /// Also checks environment variables:
    /// - `VECTORMENTOR_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `VECTORMENTOR_PROVIDER`
    /// - `VECTORMENTOR_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("VECTORMENTOR_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .filter(|key| !key.trim().is_empty());
        }

        if let Ok(provider) = std::env::var("VECTORMENTOR_PROVIDER") {
            config.default_provider = provider;
        }

        if let Ok(model) = std::env::var("VECTORMENTOR_MODEL") {
            config.default_model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".vectormentor")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let profiles = [
            ("coordinator", &self.agents.coordinator),
            ("assessor", &self.agents.assessor),
            ("retriever", &self.agents.retriever),
            ("tutor", &self.agents.tutor),
        ];
        for (name, profile) in profiles {
            if !(0.0..=2.0).contains(&profile.temperature) {
                return Err(ConfigError::ValidationError(format!(
                    "agents.{name}.temperature must be between 0.0 and 2.0"
                )));
            }
            if profile.max_tokens == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "agents.{name}.max_tokens must be > 0"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.tutor.exercise_skip_probability) {
            return Err(ConfigError::ValidationError(
                "tutor.exercise_skip_probability must be between 0.0 and 1.0".into(),
            ));
        }

        if self.session.max_turns == 0 || self.session.agent_history == 0 {
            return Err(ConfigError::ValidationError(
                "session.max_turns and session.agent_history must be >= 1".into(),
            ));
        }

        if self.retrieval.top_k == 0 || self.retrieval.digest_documents == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k and retrieval.digest_documents must be >= 1".into(),
            ));
        }

        if !self.progress.trend_threshold.is_finite() || self.progress.trend_threshold < 0.0 {
            return Err(ConfigError::ValidationError(
                "progress.trend_threshold must be a non-negative number".into(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// API key for the default provider: the provider's own key wins over the
    /// top-level one.
    pub fn resolved_api_key(&self) -> Option<&str> {
        self.providers
            .get(&self.default_provider)
            .and_then(|p| p.api_key.as_deref())
            .or(self.api_key.as_deref())
            .filter(|key| !key.trim().is_empty())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.resolved_api_key().is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            request_timeout_secs: default_request_timeout_secs(),
            agents: AgentsConfig::default(),
            session: SessionConfig::default(),
            retrieval: RetrievalConfig::default(),
            tutor: TutorConfig::default(),
            progress: ProgressConfig::default(),
            catalog: CatalogConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_model, "gpt-4o-mini");
        assert_eq!(config.session.max_turns, 20);
        assert_eq!(config.session.agent_history, 10);
        assert_eq!(config.retrieval.top_k, 5);
    }

    #[test]
    fn agent_profiles_match_defaults() {
        let agents = AgentsConfig::default();
        assert_eq!(agents.assessor.max_tokens, 300);
        assert!((agents.retriever.temperature - 0.1).abs() < f32::EPSILON);
        assert!((agents.tutor.temperature - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.catalog.gaps.len(), config.catalog.gaps.len());
        assert_eq!(parsed.catalog.next_steps.practice, config.catalog.next_steps.practice);
    }

    #[test]
    fn invalid_skip_probability_rejected() {
        let mut config = AppConfig::default();
        config.tutor.exercise_skip_probability = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_agent_temperature_rejected() {
        let mut config = AppConfig::default();
        config.agents.tutor.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_history_rejected() {
        let mut config = AppConfig::default();
        config.session.agent_history = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        let config = result.unwrap();
        assert_eq!(config.default_provider, "openai");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "default_model = \"gpt-4o\"\n\n[session]\nmax_turns = 5\n\n[catalog.suggestions]\nvectores = \"Prueba el producto cruz\""
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.session.max_turns, 5);
        assert_eq!(config.session.agent_history, 10);
        assert_eq!(config.catalog.suggestions["vectores"], "Prueba el producto cruz");
        assert_eq!(config.agents.assessor.max_tokens, 300);
    }

    #[test]
    fn invalid_file_reports_validation_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[retrieval]\ntop_k = 0").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_model = [").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn provider_key_takes_precedence() {
        let mut config = AppConfig {
            api_key: Some("top-level".into()),
            ..AppConfig::default()
        };
        assert_eq!(config.resolved_api_key(), Some("top-level"));

        config.providers.insert(
            "openai".into(),
            ProviderConfig {
                api_key: Some("sk-provider".into()),
                ..Default::default()
            },
        );
        assert_eq!(config.resolved_api_key(), Some("sk-provider"));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let config = AppConfig {
            api_key: Some("   ".into()),
            ..AppConfig::default()
        };
        assert!(!config.has_api_key());
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-4o-mini"));
        assert!(toml_str.contains("exercise_skip_probability"));
    }
}
