//! Local-only responder.
//!
//! Stands in for the tutor when no text-completion service is configured.
//! Linear-algebra input with retrieved passages gets the best passage back;
//! anything else gets the off-topic notice.

use vectormentor_agent::APOLOGY;
use vectormentor_agent::text::Tokens;
use vectormentor_core::retrieval::RetrievedDocument;

const ALGEBRA_TERMS: &[&str] = &[
    "vector", "vectores", "matriz", "matrices", "determinante", "determinantes",
    "producto", "punto", "escalar", "cruz", "sistema", "sistemas", "ecuacion", "ecuaciones",
    "lineal", "lineales", "espacio", "espacios", "vectorial", "base", "dimension",
    "independencia", "transpuesta", "inversa", "magnitud", "norma", "ortogonal",
    "perpendicular", "unitario", "eigenvalor", "autovalor", "algebra", "gauss", "cramer",
];

const OFF_TOPIC: &str = "Lo siento, soy VectorMentor, especializado únicamente en álgebra lineal. \
Puedo ayudarte con:\n\n\
- Vectores y sus operaciones\n\
- Producto punto y ortogonalidad\n\
- Matrices y multiplicación de matrices\n\
- Determinantes y matriz inversa\n\
- Sistemas de ecuaciones lineales\n\
- Espacios vectoriales e independencia lineal\n\n\
¿Sobre cuál de estos temas quieres preguntar?";

/// Whether the input mentions any linear-algebra term.
pub fn is_algebra_related(text: &str) -> bool {
    let tokens = Tokens::new(text);
    ALGEBRA_TERMS.iter().any(|term| tokens.has_phrase_or_plural(term))
}

/// Deterministic reply built from the retrieved passages alone.
pub fn local_response(text: &str, documents: &[RetrievedDocument]) -> String {
    if !is_algebra_related(text) {
        return OFF_TOPIC.to_string();
    }
    match documents.first() {
        Some(best) => format!(
            "**📚 Información sobre: \"{text}\"**\n\n{}\n\n*Sistema funcionando en modo local*",
            best.content
        ),
        None => APOLOGY.to_string(),
    }
}
