//! Session-keyed runtime.
//!
//! Each session sits behind its own async mutex. A turn takes the lock
//! without waiting; a second submission for the same session while one is
//! in flight is rejected with [`WorkflowError::SessionBusy`]. Different
//! sessions run concurrently.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use vectormentor_agent::RandomGate;
use vectormentor_config::{AppConfig, SessionConfig};
use vectormentor_core::event::EventBus;
use vectormentor_core::retrieval::{RetrievalService, RetrievalStats, RetrievedDocument};
use vectormentor_core::tutoring::{Level, TopicId};
use vectormentor_knowledge::KeywordStore;

use crate::error::{Result, WorkflowError};
use crate::orchestrator::{Orchestrator, TurnOutcome};
use crate::session::{Session, SessionStats};

/// Passages returned by [`SessionManager::browse_topic`].
const BROWSE_LIMIT: usize = 3;

/// How the runtime was wired, for status displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeInfo {
    pub provider: String,
    pub model: String,
    pub local_only: bool,
}

pub struct SessionManager {
    orchestrator: Arc<Orchestrator>,
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
    session_config: SessionConfig,
    trend_threshold: f64,
    info: RuntimeInfo,
}

impl SessionManager {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        session_config: SessionConfig,
        trend_threshold: f64,
        info: RuntimeInfo,
    ) -> Self {
        Self {
            orchestrator,
            sessions: RwLock::new(HashMap::new()),
            session_config,
            trend_threshold,
            info,
        }
    }

    /// Build the whole runtime from configuration.
    ///
    /// Credentials are checked here: without an API key the runtime starts
    /// in local-only mode.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let router = vectormentor_providers::build_from_config(config)
            .map_err(|e| WorkflowError::Config(format!("provider setup failed: {e}")))?;
        let provider = router.default().ok_or_else(|| {
            WorkflowError::Config(format!("provider '{}' not available", config.default_provider))
        })?;
        let local_only = router.is_offline();

        let store: Arc<dyn RetrievalService> = match &config.retrieval.corpus_path {
            Some(path) => Arc::new(
                KeywordStore::from_corpus_file(path)
                    .map_err(|e| WorkflowError::Config(format!("corpus load failed: {e}")))?,
            ),
            None => Arc::new(KeywordStore::seeded()),
        };

        let info = RuntimeInfo {
            provider: provider.name().to_string(),
            model: config.default_model.clone(),
            local_only,
        };
        let orchestrator = Orchestrator::from_config(
            config,
            provider,
            store,
            Arc::new(RandomGate::new(config.tutor.exercise_skip_probability)),
            Arc::new(EventBus::default()),
            local_only,
        );

        info!(
            provider = %info.provider,
            model = %info.model,
            local_only,
            "Tutoring runtime ready"
        );
        Ok(Self::new(
            Arc::new(orchestrator),
            config.session.clone(),
            config.progress.trend_threshold,
            info,
        ))
    }

    pub fn info(&self) -> &RuntimeInfo {
        &self.info
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    /// Open a session with a fresh id.
    pub async fn create_session(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.session_handle(&id).await;
        id
    }

    pub async fn session_ids(&self) -> Vec<String> {
        self.sessions.read().await.keys().cloned().collect()
    }

    pub async fn remove_session(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    /// Existing session, or a new one under `session_id`.
    async fn session_handle(&self, session_id: &str) -> Arc<Mutex<Session>> {
        if let Some(session) = self.sessions.read().await.get(session_id) {
            return session.clone();
        }
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                info!(session_id, "Session created");
                Arc::new(Mutex::new(Session::new(
                    session_id,
                    &self.session_config,
                    self.trend_threshold,
                )))
            })
            .clone()
    }

    async fn existing(&self, session_id: &str) -> Result<Arc<Mutex<Session>>> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| WorkflowError::SessionNotFound(session_id.to_string()))
    }

    /// Run one turn. Unknown ids open a new session.
    pub async fn process_turn(&self, session_id: &str, text: &str) -> Result<TurnOutcome> {
        let handle = self.session_handle(session_id).await;
        let mut session = handle
            .try_lock_owned()
            .map_err(|_| WorkflowError::SessionBusy(session_id.to_string()))?;
        Ok(self.orchestrator.process_turn(&mut session, text).await)
    }

    pub async fn get_stats(&self, session_id: &str) -> Result<SessionStats> {
        let handle = self.existing(session_id).await?;
        let session = handle.lock().await;
        Ok(session.stats())
    }

    pub async fn reset(&self, session_id: &str) -> Result<()> {
        let handle = self.existing(session_id).await?;
        let mut session = handle
            .try_lock_owned()
            .map_err(|_| WorkflowError::SessionBusy(session_id.to_string()))?;
        self.orchestrator.reset(&mut session);
        Ok(())
    }

    /// Suggestion keyed by the session's most recent topic.
    pub async fn suggest_next_topic(&self, session_id: &str) -> Result<String> {
        let handle = self.existing(session_id).await?;
        let last_topic = handle.lock().await.progress().last_topic();
        Ok(self.orchestrator.catalog().suggest_next(last_topic))
    }

    /// Passages for a topic, optionally capped at a level. A failing store
    /// reads as no passages.
    pub async fn browse_topic(
        &self,
        topic: TopicId,
        level: Option<Level>,
    ) -> Vec<RetrievedDocument> {
        match self
            .orchestrator
            .store()
            .search_by_topic(topic.as_str(), level, BROWSE_LIMIT)
            .await
        {
            Ok(documents) => documents,
            Err(e) => {
                tracing::warn!(%topic, error = %e, "Topic browse failed");
                Vec::new()
            }
        }
    }

    pub async fn retrieval_stats(&self) -> Option<RetrievalStats> {
        match self.orchestrator.store().stats().await {
            Ok(stats) => Some(stats),
            Err(e) => {
                tracing::warn!(error = %e, "Retrieval stats unavailable");
                None
            }
        }
    }
}
