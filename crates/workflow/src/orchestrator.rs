//! The tutoring pipeline.
//!
//! One turn runs the fixed stage order
//!
//! ```text
//! coordinator ─┬─ assessor ─┬─ retriever ─┬─ tutor ─ synthesizer
//!              └────────────┴─────────────┘
//! ```
//!
//! with two branch points: the coordinator decides whether assessment and
//! retrieval run. Stages never abort the turn; each one hands the next a
//! fallback value when its external call fails, and reports the failure as
//! a [`DomainEvent::StageDegraded`].
//!
//! The orchestrator holds no lock. Callers must not run two turns on the
//! same [`Session`] at once; [`crate::SessionManager`] enforces that.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use vectormentor_agent::{
    AgentLlm, Assessor, Catalog, Classifier, ExerciseGate, ProgressSnapshot, RetrievalOutput,
    Retriever, Tutor, TutorOutput, TutorRequest,
};
use vectormentor_config::AppConfig;
use vectormentor_core::event::{DomainEvent, EventBus};
use vectormentor_core::message::Message;
use vectormentor_core::provider::Provider;
use vectormentor_core::retrieval::RetrievalService;
use vectormentor_core::tutoring::{Assessment, InteractionType, Level, TopicId, Trend, Turn};

use crate::local::local_response;
use crate::session::Session;

/// Topic used when assessment is skipped.
const UNASSESSED_TOPIC: TopicId = TopicId::Vectores;

/// Messages of recent conversation included in the tutor prompt.
const CONTEXT_MESSAGES: usize = 3;

/// Which optional stages the coordinator schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Routing {
    pub needs_assessment: bool,
    pub needs_retrieval: bool,
}

impl Default for Routing {
    fn default() -> Self {
        Self {
            needs_assessment: true,
            needs_retrieval: true,
        }
    }
}

/// What produces the final response.
pub enum Responder {
    /// Prompted generation through the completion service.
    Tutor(Tutor),
    /// Deterministic replies from retrieved passages.
    Local,
}

/// Result of one turn, for structured callers.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    /// Tutor response with the exercise appended.
    pub response: String,
    pub assessment: Assessment,
    pub practice_exercise: String,
    pub interaction_type: InteractionType,
    /// Trend after this turn.
    pub trend: Trend,
    /// Stages that fell back to a default value.
    pub degraded_stages: Vec<String>,
}

/// Per-turn scratch record the stages read from and write to.
struct TurnState {
    input: String,
    interaction_type: InteractionType,
    /// Progress before this turn's update.
    prior: ProgressSnapshot,
    context: Vec<Message>,
    routing: Routing,
    retrieval: Option<RetrievalOutput>,
    degraded_stages: Vec<String>,
}

pub struct Orchestrator {
    classifier: Classifier,
    assessor: Assessor,
    retriever: Retriever,
    responder: Responder,
    catalog: Arc<Catalog>,
    event_bus: Arc<EventBus>,
    routing: Routing,
}

impl Orchestrator {
    pub fn new(
        classifier: Classifier,
        assessor: Assessor,
        retriever: Retriever,
        responder: Responder,
        catalog: Arc<Catalog>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            classifier,
            assessor,
            retriever,
            responder,
            catalog,
            event_bus,
            routing: Routing::default(),
        }
    }

    /// Wire every agent from configuration.
    ///
    /// With `local_only` the tutor stage is the deterministic responder and
    /// no exercise is ever requested.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        store: Arc<dyn RetrievalService>,
        gate: Arc<dyn ExerciseGate>,
        event_bus: Arc<EventBus>,
        local_only: bool,
    ) -> Self {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let model = config.default_model.as_str();
        let agents = &config.agents;
        let catalog = Arc::new(Catalog::from_config(&config.catalog));

        let llm = |role: &'static str, profile: &vectormentor_config::AgentProfile| {
            AgentLlm::new(role, provider.clone(), model, profile.clone(), timeout)
        };

        let classifier = Classifier::new(llm("coordinator", &agents.coordinator));
        let assessor = Assessor::new(llm("assessor", &agents.assessor), catalog.clone());
        let retriever = Retriever::new(
            llm("retriever", &agents.retriever),
            store,
            config.retrieval.top_k,
            config.retrieval.digest_documents,
            config.retrieval.degraded_digest_chars,
        );
        let responder = if local_only {
            Responder::Local
        } else {
            Responder::Tutor(Tutor::new(
                llm("tutor", &agents.tutor),
                gate,
                config.session.show_diagnostics,
            ))
        };

        Self::new(classifier, assessor, retriever, responder, catalog, event_bus)
    }

    pub fn with_routing(mut self, routing: Routing) -> Self {
        self.routing = routing;
        self
    }

    pub fn is_local_only(&self) -> bool {
        matches!(self.responder, Responder::Local)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &Arc<dyn RetrievalService> {
        self.retriever.store()
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// Run one student input through every stage and append the turn.
    pub async fn process_turn(&self, session: &mut Session, text: &str) -> TurnOutcome {
        let mut state = self.coordinate(session, text).await;

        let assessed = if state.routing.needs_assessment {
            Some(self.assess(session, &mut state).await)
        } else {
            None
        };
        if state.routing.needs_retrieval {
            self.retrieve(session.id(), assessed.as_ref(), &mut state).await;
        }
        let assessment = assessed.unwrap_or_else(|| Assessment::fallback(UNASSESSED_TOPIC));
        let output = self.respond(session.id(), &assessment, &mut state).await;
        self.synthesize(session, state, assessment, output)
    }

    async fn coordinate(&self, session: &Session, text: &str) -> TurnState {
        let classified = self.classifier.classify(text).await;
        let mut degraded_stages = Vec::new();
        for error in &classified.degraded {
            self.degraded(session.id(), "classifier", error, &mut degraded_stages);
        }

        let prior = session.progress.snapshot();
        debug!(
            session_id = session.id(),
            interaction_type = %classified.interaction_type,
            prior_trend = %prior.trend,
            "Turn coordinated"
        );

        TurnState {
            input: text.to_string(),
            interaction_type: classified.interaction_type,
            prior,
            context: session.messages.latest(CONTEXT_MESSAGES).cloned().collect(),
            routing: self.routing,
            retrieval: None,
            degraded_stages,
        }
    }

    async fn assess(&self, session: &mut Session, state: &mut TurnState) -> Assessment {
        let out = self
            .assessor
            .assess(&state.input, state.interaction_type, &session.turns)
            .await;
        for error in &out.degraded {
            self.degraded(session.id(), "assessor", error, &mut state.degraded_stages);
        }

        // Later stages of this turn see the updated progress
        let assessment = out.assessment;
        session.progress.update(assessment.level(), assessment.topic());
        info!(
            session_id = session.id(),
            level = assessment.level().get(),
            topic = %assessment.topic(),
            "Assessment complete"
        );
        assessment
    }

    async fn retrieve(
        &self,
        session_id: &str,
        assessment: Option<&Assessment>,
        state: &mut TurnState,
    ) {
        let (topic, level) = match assessment {
            Some(a) => (a.topic(), a.level()),
            None => (UNASSESSED_TOPIC, Level::default()),
        };
        let out = self
            .retriever
            .retrieve(&state.input, topic, level, state.prior.trend)
            .await;
        for error in &out.degraded {
            self.degraded(session_id, "retriever", error, &mut state.degraded_stages);
        }
        info!(session_id, documents = out.documents.len(), "Retrieval complete");
        state.retrieval = Some(out);
    }

    async fn respond(
        &self,
        session_id: &str,
        assessment: &Assessment,
        state: &mut TurnState,
    ) -> TutorOutput {
        let (digest, documents) = match &state.retrieval {
            Some(r) => (r.digest.as_str(), r.documents.as_slice()),
            None => ("", &[][..]),
        };

        let output = match &self.responder {
            Responder::Tutor(tutor) => {
                let request = TutorRequest {
                    text: &state.input,
                    interaction_type: state.interaction_type,
                    assessment,
                    digest,
                    context: &state.context,
                    trend: state.prior.trend,
                };
                tutor.generate(&request).await
            }
            Responder::Local => TutorOutput {
                response: local_response(&state.input, documents),
                exercise: String::new(),
                strategy: vectormentor_agent::Strategy::Generic,
                degraded: Vec::new(),
            },
        };

        for error in &output.degraded {
            self.degraded(session_id, "tutor", error, &mut state.degraded_stages);
        }
        debug!(session_id, strategy = output.strategy.as_str(), "Response generated");
        output
    }

    fn synthesize(
        &self,
        session: &mut Session,
        state: TurnState,
        assessment: Assessment,
        output: TutorOutput,
    ) -> TurnOutcome {
        let TurnState {
            input,
            interaction_type,
            retrieval,
            degraded_stages,
            ..
        } = state;

        let TutorOutput { response, exercise, .. } = output;
        debug_assert!(!response.trim().is_empty(), "responder produced an empty response");

        let synthesized = if exercise.is_empty() {
            response.clone()
        } else {
            format!("{response}\n\n{exercise}")
        };

        session.messages.push(Message::user(input.as_str()));
        session.messages.push(Message::assistant(synthesized.as_str()));
        session.turns.push(Turn {
            input,
            interaction_type,
            assessment: assessment.clone(),
            digest: retrieval.map(|r| r.digest).unwrap_or_default(),
            response,
            exercise: exercise.clone(),
        });

        let trend = session.progress.trend();
        self.event_bus.publish(DomainEvent::TurnCompleted {
            session_id: session.id().to_string(),
            interaction_type: interaction_type.to_string(),
            level: assessment.level().get(),
            topic: assessment.topic().to_string(),
            trend: trend.to_string(),
            timestamp: Utc::now(),
        });
        info!(
            session_id = session.id(),
            interaction_type = %interaction_type,
            degraded = degraded_stages.len(),
            "Turn completed"
        );

        TurnOutcome {
            response: synthesized,
            assessment,
            practice_exercise: exercise,
            interaction_type,
            trend,
            degraded_stages,
        }
    }

    fn degraded(&self, session_id: &str, stage: &str, error: &str, stages: &mut Vec<String>) {
        warn!(session_id, stage, error, "Stage degraded");
        if !stages.iter().any(|s| s == stage) {
            stages.push(stage.to_string());
        }
        self.event_bus.publish(DomainEvent::StageDegraded {
            session_id: session_id.to_string(),
            stage: stage.to_string(),
            error_message: error.to_string(),
            timestamp: Utc::now(),
        });
    }

    /// Clear a session and announce it.
    pub fn reset(&self, session: &mut Session) {
        session.reset();
        self.event_bus.publish(DomainEvent::SessionReset {
            session_id: session.id().to_string(),
            timestamp: Utc::now(),
        });
        info!(session_id = session.id(), "Session reset");
    }
}
