//! End-to-end pipeline tests.
//!
//! These drive whole turns through the orchestrator and the session manager
//! with scripted providers and in-memory stores, verifying:
//! - A definition question is classified, scored at a basic level and answered
//! - Total provider outage still yields the apology and default assessment
//! - A failing retrieval store degrades to the "nothing found" digest
//! - Answers are scored against the previous exercise
//! - Skipped assessment/retrieval fall back to default topic and level
//! - Local-only mode answers from the keyword corpus, accent-insensitively
//! - Concurrent turns on one session are rejected
//! - Reset restores a fresh session

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use vectormentor_agent::{APOLOGY, FixedGate, NOTHING_FOUND};
use vectormentor_config::AppConfig;
use vectormentor_core::error::{ProviderError, RetrievalError};
use vectormentor_core::event::{DomainEvent, EventBus};
use vectormentor_core::message::Message;
use vectormentor_core::provider::{Provider, ProviderRequest, ProviderResponse};
use vectormentor_core::retrieval::{RetrievalService, RetrievalStats, RetrievedDocument};
use vectormentor_core::tutoring::{InteractionType, Level, TopicId};
use vectormentor_knowledge::{EmptyStore, KeywordStore};
use vectormentor_providers::OfflineProvider;
use vectormentor_workflow::{
    Orchestrator, Routing, RuntimeInfo, Session, SessionManager, WorkflowError,
};

// ── Test doubles ───────────────────────────────────────────────────────────

fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: None,
        model: "mock-model".into(),
    }
}

/// Answers by the first rule whose key occurs in the user prompt.
struct KeyedProvider {
    rules: Vec<(&'static str, &'static str)>,
    fallback: &'static str,
    prompts: Mutex<Vec<String>>,
}

impl KeyedProvider {
    fn new(rules: Vec<(&'static str, &'static str)>, fallback: &'static str) -> Self {
        Self {
            rules,
            fallback,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A well-behaved tutor: basic level, one exercise.
    fn tutor() -> Self {
        Self::new(
            vec![
                ("Clasifica este mensaje", "question"),
                ("Identifica el tema", "vectores"),
                (
                    "Evalúa el nivel",
                    r#"{"level": 1, "subtopics": ["definición de vector"], "confidence": 0.9}"#,
                ),
                (
                    "Evalúa la respuesta",
                    r#"{"level": 3, "subtopics": ["magnitud"], "strengths": ["aplicó Pitágoras"], "errors": [], "confidence": 0.8}"#,
                ),
                ("Reescribe la consulta", "vector magnitud dirección"),
                ("Adapta el siguiente contenido", "Un vector es una flecha con magnitud y dirección."),
                ("Crea UN ejercicio", "**Ejercicio de práctica:** Calcula la magnitud de (3, 4)."),
            ],
            "Un vector es una cantidad con magnitud y dirección, por ejemplo (3, 4).",
        )
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for KeyedProvider {
    fn name(&self) -> &str {
        "keyed_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let prompt = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
        let reply = self
            .rules
            .iter()
            .find(|(key, _)| prompt.contains(key))
            .map(|(_, reply)| *reply)
            .unwrap_or(self.fallback);
        self.prompts.lock().unwrap().push(prompt);
        Ok(text_response(reply))
    }
}

struct FailingProvider;

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::Network("connection refused".into()))
    }
}

/// Holds every call until released.
struct HeldProvider {
    started: AtomicBool,
    release: Semaphore,
}

#[async_trait]
impl Provider for HeldProvider {
    fn name(&self) -> &str {
        "held"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.started.store(true, Ordering::SeqCst);
        let _permit = self
            .release
            .acquire()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(text_response(r#"{"level": 2}"#))
    }
}

struct BrokenStore;

#[async_trait]
impl RetrievalService for BrokenStore {
    fn name(&self) -> &str {
        "broken"
    }

    async fn search(
        &self,
        _query: &str,
        _top_k: usize,
        _max_level: Option<Level>,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        Err(RetrievalError::Unavailable("index offline".into()))
    }

    async fn search_by_topic(
        &self,
        _topic: &str,
        _level: Option<Level>,
        _top_k: usize,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        Err(RetrievalError::Unavailable("index offline".into()))
    }

    async fn stats(&self) -> Result<RetrievalStats, RetrievalError> {
        Err(RetrievalError::Unavailable("index offline".into()))
    }
}

// ── Wiring ─────────────────────────────────────────────────────────────────

fn orchestrator(
    provider: Arc<dyn Provider>,
    store: Arc<dyn RetrievalService>,
    offer_exercise: bool,
    local_only: bool,
) -> Orchestrator {
    Orchestrator::from_config(
        &AppConfig::default(),
        provider,
        store,
        Arc::new(FixedGate(offer_exercise)),
        Arc::new(EventBus::default()),
        local_only,
    )
}

fn session() -> Session {
    let config = AppConfig::default();
    Session::new("test", &config.session, config.progress.trend_threshold)
}

fn manager(orchestrator: Orchestrator) -> SessionManager {
    let config = AppConfig::default();
    let info = RuntimeInfo {
        provider: "mock".into(),
        model: config.default_model.clone(),
        local_only: orchestrator.is_local_only(),
    };
    SessionManager::new(
        Arc::new(orchestrator),
        config.session.clone(),
        config.progress.trend_threshold,
        info,
    )
}

// ── Scenarios ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn definition_question_end_to_end() {
    let provider = Arc::new(KeyedProvider::tutor());
    let orch = orchestrator(provider.clone(), Arc::new(KeywordStore::seeded()), true, false);
    let mut session = session();

    let outcome = orch.process_turn(&mut session, "¿Qué es un vector?").await;

    assert_eq!(outcome.interaction_type, InteractionType::DefinitionRequest);
    assert!((1..=2).contains(&outcome.assessment.level().get()));
    assert_eq!(outcome.assessment.topic(), TopicId::Vectores);
    assert!(outcome.assessment.knowledge_gaps().len() <= 2);
    assert!(!outcome.response.is_empty());
    assert_eq!(
        outcome.practice_exercise,
        "**Ejercicio de práctica:** Calcula la magnitud de (3, 4)."
    );
    assert!(outcome.response.ends_with(&format!("\n\n{}", outcome.practice_exercise)));
    assert!(outcome.degraded_stages.is_empty());

    assert_eq!(session.progress().total_interactions(), 1);
    assert_eq!(session.turns().len(), 1);
    let turn = session.turns().last().unwrap();
    assert_eq!(turn.digest, "Un vector es una flecha con magnitud y dirección.");
    assert_eq!(session.messages().len(), 2);

    // Keyword classification: no classifier call, and the topic came from keywords too
    assert!(provider.prompts().iter().all(|p| !p.contains("Clasifica este mensaje")));
    assert!(provider.prompts().iter().all(|p| !p.contains("Identifica el tema")));
}

#[tokio::test]
async fn total_outage_still_answers() {
    let orch = orchestrator(Arc::new(FailingProvider), Arc::new(KeywordStore::seeded()), true, false);
    let mut session = session();

    for text in ["¿Qué es un vector?", "Hola", "cuéntame algo"] {
        let outcome = orch.process_turn(&mut session, text).await;
        assert_eq!(outcome.response, APOLOGY);
        assert_eq!(outcome.practice_exercise, "");
        assert_eq!(outcome.assessment.level().get(), 3);
        assert!(outcome.degraded_stages.iter().any(|s| s == "tutor"));
    }
    assert_eq!(session.progress().total_interactions(), 3);
}

#[tokio::test]
async fn diagnostics_suffix_when_enabled() {
    let mut config = AppConfig::default();
    config.session.show_diagnostics = true;
    let orch = Orchestrator::from_config(
        &config,
        Arc::new(FailingProvider),
        Arc::new(EmptyStore),
        Arc::new(FixedGate(false)),
        Arc::new(EventBus::default()),
        false,
    );
    let outcome = orch.process_turn(&mut session(), "¿Qué es una matriz?").await;
    assert!(outcome.response.starts_with(APOLOGY));
    assert!(outcome.response.contains("*Error:"));
}

#[tokio::test]
async fn retrieval_failure_continues_to_tutor() {
    let provider = Arc::new(KeyedProvider::tutor());
    let orch = orchestrator(provider.clone(), Arc::new(BrokenStore), false, false);
    let mut session = session();

    let outcome = orch.process_turn(&mut session, "¿Qué es un vector?").await;

    assert_eq!(session.turns().last().unwrap().digest, NOTHING_FOUND);
    assert_eq!(outcome.degraded_stages, vec!["retriever".to_string()]);
    assert!(outcome.response.starts_with("Un vector es una cantidad"));
    // The tutor prompt carried the sentinel digest
    assert!(provider.prompts().last().unwrap().contains(NOTHING_FOUND));
}

#[tokio::test]
async fn answer_is_scored_against_previous_exercise() {
    let provider = Arc::new(KeyedProvider::tutor());
    let orch = orchestrator(provider.clone(), Arc::new(KeywordStore::seeded()), true, false);
    let mut session = session();

    orch.process_turn(&mut session, "¿Qué es un vector?").await;

    // "answer" label for the free-form reply
    let provider = Arc::new(KeyedProvider::new(
        vec![
            ("Clasifica este mensaje", "answer"),
            ("Identifica el tema", "magnitud_vectores"),
            (
                "Evalúa la respuesta",
                r#"{"level": 3, "strengths": ["aplicó Pitágoras"], "errors": [], "confidence": 0.8}"#,
            ),
            ("Reescribe la consulta", "magnitud vector"),
            ("Adapta el siguiente contenido", "La magnitud es la raíz de la suma de cuadrados."),
        ],
        "¡Correcto! La magnitud de (3, 4) es 5.",
    ));
    let orch2 = orchestrator(provider.clone(), Arc::new(KeywordStore::seeded()), true, false);
    let outcome = orch2.process_turn(&mut session, "El resultado es 5").await;

    assert_eq!(outcome.interaction_type, InteractionType::Answer);
    assert_eq!(outcome.assessment.strengths(), &["aplicó Pitágoras".to_string()]);
    assert_eq!(outcome.practice_exercise, "");
    assert_eq!(outcome.response, "¡Correcto! La magnitud de (3, 4) es 5.");

    let prompts = provider.prompts();
    let scoring = prompts.iter().find(|p| p.contains("Evalúa la respuesta")).unwrap();
    assert!(scoring.contains("Calcula la magnitud de (3, 4)"));
    // Previous turn is in the tutor's conversation context
    assert!(prompts.last().unwrap().contains("Estudiante: ¿Qué es un vector?"));
    assert_eq!(session.progress().total_interactions(), 2);
}

#[tokio::test]
async fn skipped_stages_use_defaults() {
    let provider = Arc::new(KeyedProvider::tutor());
    let orch = orchestrator(provider.clone(), Arc::new(KeywordStore::seeded()), false, false)
        .with_routing(Routing {
            needs_assessment: false,
            needs_retrieval: false,
        });
    let mut session = session();

    let outcome = orch.process_turn(&mut session, "¿Qué es un vector?").await;

    assert_eq!(outcome.assessment.topic(), TopicId::Vectores);
    assert_eq!(outcome.assessment.level().get(), 3);
    assert!(!outcome.response.is_empty());
    // Progress only moves through the assessor
    assert_eq!(session.progress().total_interactions(), 0);
    assert_eq!(session.turns().len(), 1);
    assert_eq!(session.turns().last().unwrap().digest, "");
    assert!(provider.prompts().iter().all(|p| !p.contains("Evalúa")));
    assert!(provider.prompts().iter().all(|p| !p.contains("Reescribe")));
}

#[tokio::test]
async fn stored_turn_matches_the_outcome() {
    let provider = Arc::new(KeyedProvider::tutor());
    let orch = orchestrator(provider, Arc::new(KeywordStore::seeded()), true, false);
    let mut session = session();

    let outcome = orch.process_turn(&mut session, "¿Qué es un vector?").await;
    let turn = session.turns().last().unwrap();

    assert_eq!(turn.assessment.level(), outcome.assessment.level());
    assert_eq!(turn.assessment.topic(), outcome.assessment.topic());
    assert_eq!(turn.exercise, outcome.practice_exercise);
    assert_eq!(format!("{}\n\n{}", turn.response, turn.exercise), outcome.response);
    assert_eq!(session.progress().current_level(), outcome.assessment.level());
}

#[tokio::test]
async fn skipped_assessment_retrieves_with_defaults() {
    let provider = Arc::new(KeyedProvider::tutor());
    let orch = orchestrator(provider.clone(), Arc::new(KeywordStore::seeded()), false, false)
        .with_routing(Routing {
            needs_assessment: false,
            needs_retrieval: true,
        });
    orch.process_turn(&mut session(), "¿Qué es un vector?").await;

    let prompts = provider.prompts();
    let adapt = prompts.iter().find(|p| p.contains("Adapta el siguiente contenido")).unwrap();
    assert!(adapt.contains("sobre vectores"));
    assert!(adapt.contains("nivel 3/5"));
}

#[tokio::test]
async fn local_only_mode_answers_from_corpus() {
    let bus = Arc::new(EventBus::default());
    let mut events = bus.subscribe();
    let orch = Orchestrator::from_config(
        &AppConfig::default(),
        Arc::new(OfflineProvider),
        Arc::new(KeywordStore::seeded()),
        Arc::new(FixedGate(true)),
        bus,
        true,
    );
    assert!(orch.is_local_only());
    let mut session = session();

    let outcome = orch.process_turn(&mut session, "¿Qué es un vector?").await;
    assert!(outcome.response.starts_with("**📚 Información sobre: \"¿Qué es un vector?\"**"));
    assert!(outcome.response.contains("VECTORES BÁSICOS"));
    assert!(outcome.response.ends_with("*Sistema funcionando en modo local*"));
    assert_eq!(outcome.practice_exercise, "");

    let outcome = orch.process_turn(&mut session, "¿Qué tiempo hace hoy?").await;
    assert!(outcome.response.starts_with("Lo siento, soy VectorMentor"));

    let mut completed = 0;
    let mut degraded = 0;
    while let Ok(event) = events.try_recv() {
        match event.as_ref() {
            DomainEvent::TurnCompleted { .. } => completed += 1,
            DomainEvent::StageDegraded { .. } => degraded += 1,
            _ => {}
        }
    }
    assert_eq!(completed, 2);
    assert!(degraded > 0);
}

#[tokio::test]
async fn local_only_mode_picks_the_dedicated_passage() {
    let orch = orchestrator(Arc::new(OfflineProvider), Arc::new(KeywordStore::seeded()), true, true);
    let mut session = session();

    let outcome = orch
        .process_turn(&mut session, "¿Qué es el producto de matrices?")
        .await;
    assert_eq!(outcome.assessment.topic(), TopicId::MultiplicacionMatrices);
    assert!(outcome.response.contains("MULTIPLICACIÓN DE MATRICES"));
}

#[tokio::test]
async fn concurrent_turn_on_same_session_is_rejected() {
    let provider = Arc::new(HeldProvider {
        started: AtomicBool::new(false),
        release: Semaphore::new(0),
    });
    let orch = orchestrator(provider.clone(), Arc::new(EmptyStore), false, false);
    let manager = Arc::new(manager(orch));

    let first = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.process_turn("s1", "¿Qué es un vector?").await })
    };
    for _ in 0..100 {
        if provider.started.load(Ordering::SeqCst) {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(provider.started.load(Ordering::SeqCst));

    let second = manager.process_turn("s1", "¿Qué es una matriz?").await;
    assert!(matches!(second, Err(WorkflowError::SessionBusy(_))));
    assert!(matches!(manager.reset("s1").await, Err(WorkflowError::SessionBusy(_))));

    provider.release.add_permits(1);
    let outcome = first.await.unwrap().unwrap();
    assert!(!outcome.response.is_empty());
    assert_eq!(manager.get_stats("s1").await.unwrap().interactions, 1);
}

#[tokio::test]
async fn reset_restores_fresh_session() {
    let bus_orch = orchestrator(Arc::new(KeyedProvider::tutor()), Arc::new(KeywordStore::seeded()), false, false);
    let mut events = bus_orch.event_bus().subscribe();
    let manager = manager(bus_orch);

    manager.process_turn("s1", "¿Qué es un vector?").await.unwrap();
    manager.process_turn("s1", "¿Qué es una matriz?").await.unwrap();

    let stats = manager.get_stats("s1").await.unwrap();
    assert_eq!(stats.interactions, 2);
    assert_eq!(stats.topics_covered, 2);
    assert_eq!(stats.average_level, 1.0);
    assert_eq!(
        manager.suggest_next_topic("s1").await.unwrap(),
        "Podrías aprender sobre determinantes de matrices"
    );

    manager.reset("s1").await.unwrap();
    let stats = manager.get_stats("s1").await.unwrap();
    assert_eq!(stats.interactions, 0);
    assert_eq!(stats.current_level, 3);
    assert_eq!(stats.average_level, 3.0);
    assert_eq!(stats.topics_covered, 0);
    assert_eq!(
        manager.suggest_next_topic("s1").await.unwrap(),
        "Te sugiero comenzar con conceptos básicos de vectores"
    );

    let mut saw_reset = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event.as_ref(), DomainEvent::SessionReset { .. }) {
            saw_reset = true;
        }
    }
    assert!(saw_reset);
}

#[tokio::test]
async fn sessions_are_independent() {
    let manager = manager(orchestrator(
        Arc::new(KeyedProvider::tutor()),
        Arc::new(KeywordStore::seeded()),
        false,
        false,
    ));
    manager.process_turn("a", "¿Qué es un vector?").await.unwrap();
    manager.process_turn("b", "¿Qué es un vector?").await.unwrap();
    manager.process_turn("b", "¿Qué es una matriz?").await.unwrap();

    assert_eq!(manager.get_stats("a").await.unwrap().interactions, 1);
    assert_eq!(manager.get_stats("b").await.unwrap().interactions, 2);
}
