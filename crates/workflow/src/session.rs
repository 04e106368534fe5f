//! Per-session state: turn history, progress and the coordinator's rolling
//! message history. A session is only ever mutated by the one turn in flight.

use chrono::{DateTime, Utc};
use serde::Serialize;
use vectormentor_agent::ProgressTracker;
use vectormentor_config::SessionConfig;
use vectormentor_core::history::BoundedHistory;
use vectormentor_core::message::Message;
use vectormentor_core::tutoring::{TopicId, Trend, Turn};

/// Summary reported by `get_stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStats {
    pub interactions: usize,
    pub current_level: u8,
    pub average_level: f64,
    pub trend: Trend,
    pub topics_covered: usize,
    pub most_studied_topic: Option<TopicId>,
}

pub struct Session {
    id: String,
    pub(crate) turns: BoundedHistory<Turn>,
    pub(crate) progress: ProgressTracker,
    /// Student and tutor messages, newest last.
    pub(crate) messages: BoundedHistory<Message>,
    created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>, config: &SessionConfig, trend_threshold: f64) -> Self {
        Self {
            id: id.into(),
            turns: BoundedHistory::new(config.max_turns),
            progress: ProgressTracker::new(trend_threshold),
            messages: BoundedHistory::new(config.agent_history),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn turns(&self) -> &BoundedHistory<Turn> {
        &self.turns
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn messages(&self) -> &BoundedHistory<Message> {
        &self.messages
    }

    /// Clear progress, turns and rolling messages.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.progress.reset();
        self.messages.clear();
    }

    pub fn stats(&self) -> SessionStats {
        let progress = &self.progress;
        SessionStats {
            interactions: progress.total_interactions(),
            current_level: progress.current_level().get(),
            average_level: progress.average_level(),
            trend: progress.trend(),
            topics_covered: progress.topics_covered(),
            most_studied_topic: progress.most_studied_topic(),
        }
    }
}
