//! Cross-turn student progress.
//!
//! Every assessed turn appends its level and topic. The trend compares the
//! mean of the last three levels against the mean of the (up to) three
//! before them; `total_interactions` is always the history length.

use serde::Serialize;
use vectormentor_core::tutoring::{Level, TopicId, Trend};

/// Size of the recent and prior comparison windows.
const WINDOW: usize = 3;

/// Default improvement/decline threshold between window means.
pub const DEFAULT_TREND_THRESHOLD: f64 = 0.3;

fn mean(levels: &[Level]) -> f64 {
    levels.iter().map(|l| l.get() as f64).sum::<f64>() / levels.len() as f64
}

/// Trend of a level history.
///
/// Fewer than two points is `Initial`, two or three is `Evaluating`. From
/// four points on, the last three are compared with the slice
/// `[n-6 .. n-3]`, clipped at the start of the history.
pub fn compute_trend(history: &[Level], threshold: f64) -> Trend {
    let n = history.len();
    if n < 2 {
        return Trend::Initial;
    }
    if n <= WINDOW {
        return Trend::Evaluating;
    }
    let recent = mean(&history[n - WINDOW..]);
    let prior = mean(&history[n.saturating_sub(2 * WINDOW)..n - WINDOW]);
    let delta = recent - prior;
    if delta > threshold {
        Trend::Improving
    } else if delta < -threshold {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// Extra instruction for content adaptation, from the trend before this turn.
pub fn adaptation_hint(trend: Trend) -> Option<&'static str> {
    match trend {
        Trend::Improving => Some(
            "El estudiante está mejorando: añade un pequeño desafío adicional.",
        ),
        Trend::Declining => Some(
            "El estudiante tiene dificultades: explica más despacio y con más pasos intermedios.",
        ),
        _ => None,
    }
}

/// Read-only view of progress handed to the pipeline stages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub current_level: Level,
    pub trend: Trend,
    pub total_interactions: usize,
    pub average_level: f64,
    pub topics_covered: usize,
    pub most_studied_topic: Option<TopicId>,
    pub last_topic: Option<TopicId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressTracker {
    current_level: Level,
    level_history: Vec<Level>,
    /// Interaction count per topic, in first-seen order.
    topic_counts: Vec<(TopicId, u32)>,
    last_topic: Option<TopicId>,
    trend: Trend,
    threshold: f64,
}

impl ProgressTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            current_level: Level::default(),
            level_history: Vec::new(),
            topic_counts: Vec::new(),
            last_topic: None,
            trend: Trend::Initial,
            threshold,
        }
    }

    /// Fold one assessed turn into the history and recompute the trend.
    pub fn update(&mut self, level: Level, topic: TopicId) {
        self.level_history.push(level);
        self.current_level = level;
        match self.topic_counts.iter_mut().find(|(t, _)| *t == topic) {
            Some((_, count)) => *count += 1,
            None => self.topic_counts.push((topic, 1)),
        }
        self.last_topic = Some(topic);
        self.trend = compute_trend(&self.level_history, self.threshold);
        tracing::debug!(
            level = level.get(),
            %topic,
            trend = %self.trend,
            interactions = self.level_history.len(),
            "Progress updated"
        );
    }

    pub fn trend(&self) -> Trend {
        self.trend
    }

    /// Back to the initial-session state. The threshold is kept.
    pub fn reset(&mut self) {
        *self = Self::new(self.threshold);
    }

    pub fn current_level(&self) -> Level {
        self.current_level
    }

    pub fn level_history(&self) -> &[Level] {
        &self.level_history
    }

    pub fn total_interactions(&self) -> usize {
        self.level_history.len()
    }

    /// Mean of all recorded levels, 3.0 before the first interaction.
    pub fn average_level(&self) -> f64 {
        if self.level_history.is_empty() {
            Level::default().get() as f64
        } else {
            mean(&self.level_history)
        }
    }

    pub fn topics_covered(&self) -> usize {
        self.topic_counts.len()
    }

    /// Highest count; ties go to the topic seen first.
    pub fn most_studied_topic(&self) -> Option<TopicId> {
        self.topic_counts
            .iter()
            .fold(None, |best: Option<(TopicId, u32)>, &(topic, count)| match best {
                Some((_, top)) if top >= count => best,
                _ => Some((topic, count)),
            })
            .map(|(topic, _)| topic)
    }

    pub fn last_topic(&self) -> Option<TopicId> {
        self.last_topic
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            current_level: self.current_level,
            trend: self.trend,
            total_interactions: self.total_interactions(),
            average_level: self.average_level(),
            topics_covered: self.topics_covered(),
            most_studied_topic: self.most_studied_topic(),
            last_topic: self.last_topic,
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(DEFAULT_TREND_THRESHOLD)
    }
}
