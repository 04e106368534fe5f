//! Interaction classifier.
//!
//! A keyword pass over fixed trigger phrases runs first, in priority order
//! definition → procedure → examples → calculation; the first group with a
//! hit decides. Only when nothing fires is the completion service asked for
//! one label from the closed vocabulary. Any failure there yields `question`.

use tracing::{debug, warn};
use vectormentor_core::tutoring::InteractionType;

use crate::llm::AgentLlm;
use crate::text::Tokens;

const TRIGGERS: [(InteractionType, &[&str]); 4] = [
    (
        InteractionType::DefinitionRequest,
        &["que es", "que son", "que significa", "define", "definicion", "definir", "concepto de"],
    ),
    (
        InteractionType::ProcedureRequest,
        &[
            "como se", "como calculo", "como calcular", "como hago", "como resuelvo", "como puedo",
            "paso a paso", "pasos", "procedimiento", "metodo",
        ],
    ),
    (
        InteractionType::ExamplesRequest,
        &["ejemplo", "ejemplos", "muestrame", "ilustra"],
    ),
    (
        InteractionType::CalculationRequest,
        &[
            "calcula", "calcular", "calcule", "resuelve", "resolver", "cuanto es", "cuanto vale",
            "halla", "hallar", "encuentra",
        ],
    ),
];

/// Keyword fast path. `None` when no trigger phrase occurs.
pub fn classify_by_keywords(text: &str) -> Option<InteractionType> {
    let tokens = Tokens::new(text);
    TRIGGERS
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|p| tokens.has_phrase(p)))
        .map(|(kind, _)| *kind)
}

/// Pull a label out of a free-form completion.
fn parse_label(response: &str) -> Option<InteractionType> {
    if let Ok(kind) = response.parse::<InteractionType>() {
        return Some(kind);
    }
    let lowered = response.to_lowercase();
    let mut labels = InteractionType::ALL;
    labels.sort_by_key(|kind| std::cmp::Reverse(kind.as_str().len()));
    labels.into_iter().find(|kind| lowered.contains(kind.as_str()))
}

#[derive(Debug, Clone)]
pub struct ClassifierOutput {
    pub interaction_type: InteractionType,
    pub degraded: Vec<String>,
}

pub struct Classifier {
    llm: AgentLlm,
}

impl Classifier {
    pub fn new(llm: AgentLlm) -> Self {
        Self { llm }
    }

    pub async fn classify(&self, text: &str) -> ClassifierOutput {
        if let Some(kind) = classify_by_keywords(text) {
            debug!(interaction_type = %kind, "Classified by keyword");
            return ClassifierOutput {
                interaction_type: kind,
                degraded: Vec::new(),
            };
        }

        let prompt = format!(
            "Clasifica este mensaje del estudiante en UNA de estas categorías:\n\
             - question: pregunta sobre un concepto\n\
             - examples_request: pide ejemplos\n\
             - procedure_request: pregunta cómo hacer algo\n\
             - greeting: saludo\n\
             - answer: responde a un ejercicio planteado\n\
             - definition_request: pide una definición\n\
             - calculation_request: pide un cálculo concreto\n\
             - statement: comentario o afirmación\n\n\
             Mensaje: \"{text}\"\n\n\
             Responde SOLO con la categoría."
        );

        match self.llm.complete(&prompt).await {
            Ok(response) => match parse_label(&response) {
                Some(kind) => {
                    debug!(interaction_type = %kind, "Classified by completion");
                    ClassifierOutput {
                        interaction_type: kind,
                        degraded: Vec::new(),
                    }
                }
                None => {
                    warn!(response = %response, "Unrecognized interaction label, using question");
                    ClassifierOutput {
                        interaction_type: InteractionType::Question,
                        degraded: vec![format!("unrecognized interaction label: {response}")],
                    }
                }
            },
            Err(e) => {
                warn!(error = %e, "Classification call failed, using question");
                ClassifierOutput {
                    interaction_type: InteractionType::Question,
                    degraded: vec![e.to_string()],
                }
            }
        }
    }
}
