//! Response generation.
//!
//! A routing table picks one prompt strategy from the interaction type and
//! a few text patterns. The strategy issues exactly one completion call;
//! an [`ExerciseGate`] then decides whether a second call asks for a
//! practice exercise.

use std::sync::Arc;
use tracing::{debug, warn};
use vectormentor_core::message::{Message, Role};
use vectormentor_core::tutoring::{Assessment, InteractionType, Trend};

use crate::llm::AgentLlm;
use crate::progress::adaptation_hint;
use crate::text::Tokens;

/// Fixed reply when the response call fails.
pub const APOLOGY: &str = "Lo siento, ha ocurrido un error procesando tu solicitud.";

/// The apology, with the error appended when diagnostics are on.
pub fn apology(error: &str, show_diagnostics: bool) -> String {
    if show_diagnostics {
        format!("{APOLOGY}\n\n*Error: {error}*")
    } else {
        APOLOGY.to_string()
    }
}

/// Reply the exercise prompt asks for when no exercise fits.
const NO_EXERCISE: &str = "\"\"";

// ── Exercise gate ──────────────────────────────────────────────────────────

/// Decides whether an eligible turn gets a practice exercise.
pub trait ExerciseGate: Send + Sync {
    fn should_offer(&self) -> bool;
}

/// Skips with a fixed probability.
#[derive(Debug, Clone, Copy)]
pub struct RandomGate {
    pub skip_probability: f64,
}

impl RandomGate {
    pub fn new(skip_probability: f64) -> Self {
        Self { skip_probability }
    }
}

impl ExerciseGate for RandomGate {
    fn should_offer(&self) -> bool {
        rand::random::<f64>() >= self.skip_probability
    }
}

/// Always offers or always skips.
#[derive(Debug, Clone, Copy)]
pub struct FixedGate(pub bool);

impl ExerciseGate for FixedGate {
    fn should_offer(&self) -> bool {
        self.0
    }
}

// ── Strategy ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    MatrixMultiplication,
    Examples,
    DirectConcept,
    Procedure,
    Feedback,
    Greeting,
    Generic,
}

impl Strategy {
    /// Routing table. Greetings and answers go by type alone; the rest also
    /// look at the text, so "producto de matrices" reaches the matrix
    /// explainer under any type.
    pub fn select(text: &str, interaction_type: InteractionType) -> Self {
        match interaction_type {
            InteractionType::Greeting => return Self::Greeting,
            InteractionType::Answer => return Self::Feedback,
            _ => {}
        }
        let tokens = Tokens::new(text);
        if tokens.has_phrase("producto") && tokens.has_phrase("matrices") {
            Self::MatrixMultiplication
        } else if interaction_type == InteractionType::ExamplesRequest
            || tokens.has_phrase("ejemplo")
            || tokens.has_phrase("ejemplos")
        {
            Self::Examples
        } else if interaction_type == InteractionType::DefinitionRequest || tokens.has_phrase("que es") {
            Self::DirectConcept
        } else if matches!(
            interaction_type,
            InteractionType::ProcedureRequest | InteractionType::CalculationRequest
        ) || tokens.has_phrase("como")
        {
            Self::Procedure
        } else {
            Self::Generic
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MatrixMultiplication => "matrix_multiplication",
            Self::Examples => "examples",
            Self::DirectConcept => "direct_concept",
            Self::Procedure => "procedure",
            Self::Feedback => "feedback",
            Self::Greeting => "greeting",
            Self::Generic => "generic",
        }
    }
}

// ── Tutor ──────────────────────────────────────────────────────────────────

pub struct TutorRequest<'a> {
    pub text: &'a str,
    pub interaction_type: InteractionType,
    pub assessment: &'a Assessment,
    pub digest: &'a str,
    /// Recent conversation, oldest first.
    pub context: &'a [Message],
    /// Trend before this turn.
    pub trend: Trend,
}

#[derive(Debug, Clone)]
pub struct TutorOutput {
    pub response: String,
    /// Empty when no exercise was produced.
    pub exercise: String,
    pub strategy: Strategy,
    pub degraded: Vec<String>,
}

pub struct Tutor {
    llm: AgentLlm,
    gate: Arc<dyn ExerciseGate>,
    show_diagnostics: bool,
}

impl Tutor {
    pub fn new(llm: AgentLlm, gate: Arc<dyn ExerciseGate>, show_diagnostics: bool) -> Self {
        Self {
            llm,
            gate,
            show_diagnostics,
        }
    }

    pub async fn generate(&self, request: &TutorRequest<'_>) -> TutorOutput {
        let strategy = Strategy::select(request.text, request.interaction_type);
        debug!(strategy = strategy.as_str(), "Tutor strategy selected");

        let response = match self.llm.complete(&build_prompt(strategy, request)).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Response generation failed, replying with apology");
                return TutorOutput {
                    response: apology(&e.to_string(), self.show_diagnostics),
                    exercise: String::new(),
                    strategy,
                    degraded: vec![e.to_string()],
                };
            }
        };

        let mut degraded = Vec::new();
        let exercise = if request.interaction_type.allows_exercise() && self.gate.should_offer() {
            match self.llm.complete(&exercise_prompt(request.text, request.assessment)).await {
                Ok(text) if text == NO_EXERCISE => String::new(),
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Exercise generation failed, keeping response");
                    degraded.push(e.to_string());
                    String::new()
                }
            }
        } else {
            String::new()
        };

        TutorOutput {
            response,
            exercise,
            strategy,
            degraded,
        }
    }
}

// ── Prompts ────────────────────────────────────────────────────────────────

fn context_block(context: &[Message]) -> String {
    context
        .iter()
        .filter_map(|m| match m.role {
            Role::User => Some(format!("Estudiante: {}", m.content)),
            Role::Assistant => Some(format!("Tutor: {}", m.content)),
            Role::System => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_prompt(strategy: Strategy, request: &TutorRequest<'_>) -> String {
    let assessment = request.assessment;
    let level = assessment.level();
    let topic = assessment.topic().display_name();
    let text = request.text;
    let digest = request.digest;

    let body = match strategy {
        Strategy::Greeting => format!(
            "El estudiante te saluda: \"{text}\"\n\n\
             Responde con una bienvenida breve y cálida. Preséntate como tutor de álgebra \
             lineal y menciona dos o tres temas en los que puedes ayudar."
        ),
        Strategy::Feedback => {
            let strengths = list_or_none(assessment.strengths());
            let errors = list_or_none(assessment.errors());
            format!(
                "El estudiante respondió a un ejercicio de {topic}: \"{text}\"\n\n\
                 Nivel evaluado: {level}/5\n\
                 Fortalezas: {strengths}\n\
                 Errores: {errors}\n\n\
                 Da retroalimentación constructiva: reconoce lo correcto, corrige los errores \
                 con una explicación breve y anima a continuar."
            )
        }
        Strategy::MatrixMultiplication => format!(
            "Pregunta del estudiante (nivel {level}/5): \"{text}\"\n\n\
             Contenido de referencia:\n{digest}\n\n\
             Explica la multiplicación de matrices: la condición de compatibilidad \
             (columnas de A = filas de B), el cálculo de cada elemento como producto de \
             fila por columna y un ejemplo numérico 2×2 resuelto paso a paso."
        ),
        Strategy::Examples => format!(
            "El estudiante pide ejemplos de {topic} (nivel {level}/5): \"{text}\"\n\n\
             Contenido de referencia:\n{digest}\n\n\
             Da dos o tres ejemplos numéricos concretos, de menor a mayor dificultad, \
             resolviendo cada uno."
        ),
        Strategy::DirectConcept => format!(
            "El estudiante pregunta qué es un concepto de {topic} (nivel {level}/5): \"{text}\"\n\n\
             Contenido de referencia:\n{digest}\n\n\
             Da una definición directa y clara, seguida de un ejemplo sencillo."
        ),
        Strategy::Procedure => format!(
            "El estudiante pregunta cómo hacer algo en {topic} (nivel {level}/5): \"{text}\"\n\n\
             Contenido de referencia:\n{digest}\n\n\
             Explica el procedimiento en pasos numerados y aplícalo a un ejemplo concreto."
        ),
        Strategy::Generic => format!(
            "Pregunta del estudiante sobre {topic} (nivel {level}/5): \"{text}\"\n\n\
             Contenido de referencia:\n{digest}\n\n\
             Responde de forma clara y adaptada al nivel del estudiante."
        ),
    };

    let mut prompt = body;
    let gaps = assessment.knowledge_gaps();
    if !gaps.is_empty() && strategy != Strategy::Greeting {
        prompt.push_str(&format!("\n\nRefuerza estos puntos: {}.", gaps.join(", ")));
    }
    if let Some(hint) = adaptation_hint(request.trend) {
        prompt.push_str("\n\n");
        prompt.push_str(hint);
    }
    let context = context_block(request.context);
    if !context.is_empty() {
        prompt.push_str("\n\nConversación reciente:\n");
        prompt.push_str(&context);
    }
    prompt
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "ninguno identificado".to_string()
    } else {
        items.join(", ")
    }
}

fn exercise_prompt(text: &str, assessment: &Assessment) -> String {
    format!(
        "Crea UN ejercicio de práctica sobre {topic} para un estudiante de nivel {level}/5, \
         relacionado con la pregunta del estudiante: \"{text}\"\n\
         Usa valores numéricos concretos, nunca variables simbólicas.\n\
         Formato: **Ejercicio de práctica:** <enunciado>\n\
         Si no es posible crear un ejercicio adecuado, responde solo con {NO_EXERCISE}.",
        topic = assessment.topic().display_name(),
        level = assessment.level()
    )
}
