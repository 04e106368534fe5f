//! Knowledge-gap and suggestion lookups.
//!
//! The wording comes from configuration. This module only decides which
//! entry applies for a `(topic, level)` pair and what the defaults are.

use std::collections::HashMap;
use vectormentor_config::{CatalogConfig, NextStepTemplates};
use vectormentor_core::tutoring::{Level, TopicId};

#[derive(Debug, Clone)]
pub struct Catalog {
    gaps: HashMap<TopicId, Vec<String>>,
    generic_gap: String,
    next_steps: NextStepTemplates,
    suggestions: HashMap<TopicId, String>,
    start_suggestion: String,
    fallback_suggestion: String,
}

fn keyed_by_topic<V: Clone>(entries: &HashMap<String, V>, section: &str) -> HashMap<TopicId, V> {
    entries
        .iter()
        .filter_map(|(key, value)| match key.parse::<TopicId>() {
            Ok(topic) => Some((topic, value.clone())),
            Err(_) => {
                tracing::warn!(section, key = %key, "Ignoring catalog entry for unknown topic");
                None
            }
        })
        .collect()
}

impl Catalog {
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            gaps: keyed_by_topic(&config.gaps, "gaps"),
            generic_gap: config.generic_gap.clone(),
            next_steps: config.next_steps.clone(),
            suggestions: keyed_by_topic(&config.suggestions, "suggestions"),
            start_suggestion: config.start_suggestion.clone(),
            fallback_suggestion: config.fallback_suggestion.clone(),
        }
    }

    /// Gaps for a topic: none at level 4 and above, the generic gap for
    /// unknown topics, never more than two.
    pub fn gaps_for(&self, topic: TopicId, level: Level) -> Vec<String> {
        if level.get() >= 4 {
            return Vec::new();
        }
        let mut gaps = self
            .gaps
            .get(&topic)
            .cloned()
            .unwrap_or_else(|| vec![self.generic_gap.clone()]);
        gaps.truncate(2);
        gaps
    }

    pub fn next_step(&self, topic: TopicId, level: Level) -> String {
        let template = match level.get() {
            0..=2 => &self.next_steps.review,
            3 => &self.next_steps.practice,
            4 => &self.next_steps.explore,
            _ => &self.next_steps.deepen,
        };
        template.replace("{topic}", &topic.display_name())
    }

    /// Suggestion keyed by the most recent topic; `None` means no interaction yet.
    pub fn suggest_next(&self, last_topic: Option<TopicId>) -> String {
        match last_topic {
            None => self.start_suggestion.clone(),
            Some(topic) => self
                .suggestions
                .get(&topic)
                .cloned()
                .unwrap_or_else(|| self.fallback_suggestion.clone()),
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::from_config(&CatalogConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(n: i64) -> Level {
        Level::clamped(n)
    }

    #[test]
    fn known_topic_gaps_truncated_to_two() {
        let catalog = Catalog::default();
        let gaps = catalog.gaps_for(TopicId::MultiplicacionMatrices, level(2));
        assert_eq!(
            gaps,
            vec![
                "condición de compatibilidad para multiplicación".to_string(),
                "cálculo elemento a elemento".to_string(),
            ]
        );
    }

    #[test]
    fn unknown_topic_gets_generic_gap() {
        let catalog = Catalog::default();
        assert_eq!(
            catalog.gaps_for(TopicId::Determinantes, level(3)),
            vec!["conceptos fundamentales".to_string()]
        );
    }

    #[test]
    fn high_levels_have_no_gaps() {
        let catalog = Catalog::default();
        assert!(catalog.gaps_for(TopicId::Vectores, level(4)).is_empty());
        assert!(catalog.gaps_for(TopicId::Vectores, level(5)).is_empty());
    }

    #[test]
    fn next_step_by_level_band() {
        let catalog = Catalog::default();
        assert_eq!(catalog.next_step(TopicId::Vectores, level(1)), "Repasar conceptos básicos de vectores");
        assert_eq!(catalog.next_step(TopicId::Vectores, level(2)), "Repasar conceptos básicos de vectores");
        assert_eq!(
            catalog.next_step(TopicId::ProductoPunto, level(3)),
            "Practicar ejercicios de producto punto"
        );
        assert_eq!(catalog.next_step(TopicId::Matrices, level(4)), "Explorar aplicaciones de matrices");
        assert_eq!(catalog.next_step(TopicId::Matrices, level(5)), "Profundizar en teoría de matrices");
    }

    #[test]
    fn suggestions() {
        let catalog = Catalog::default();
        assert_eq!(
            catalog.suggest_next(None),
            "Te sugiero comenzar con conceptos básicos de vectores"
        );
        assert_eq!(
            catalog.suggest_next(Some(TopicId::Vectores)),
            "¿Qué tal si exploramos el producto punto entre vectores?"
        );
        assert_eq!(
            catalog.suggest_next(Some(TopicId::Ortogonalidad)),
            "Continúa explorando los temas que más te interesen"
        );
    }

    #[test]
    fn unknown_config_keys_are_ignored() {
        let mut config = CatalogConfig::default();
        config.gaps.insert("topologia".into(), vec!["abiertos".into()]);
        let catalog = Catalog::from_config(&config);
        assert_eq!(catalog.gaps.len(), 4);
    }
}
