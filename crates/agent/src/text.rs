//! Accent-insensitive phrase matching over student input.
//!
//! Input is lowercased, stripped of Spanish diacritics and split into
//! alphanumeric tokens. A phrase matches only on whole tokens, so `det`
//! does not fire inside `detalle`.

pub use vectormentor_core::text::normalize;

/// Tokenized, normalized text.
#[derive(Debug, Clone)]
pub struct Tokens(Vec<String>);

impl Tokens {
    pub fn new(text: &str) -> Self {
        Self(
            normalize(text)
                .split(|c: char| !c.is_alphanumeric())
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Whether `phrase` occurs as a contiguous run of whole tokens.
    pub fn has_phrase(&self, phrase: &str) -> bool {
        let needle = Tokens::new(phrase).0;
        if needle.is_empty() || needle.len() > self.0.len() {
            return false;
        }
        self.0.windows(needle.len()).any(|window| window == needle.as_slice())
    }

    /// Like [`has_phrase`](Self::has_phrase), but each input token may also
    /// be the Spanish plural (`-s`, `-es`) of the phrase token.
    pub fn has_phrase_or_plural(&self, phrase: &str) -> bool {
        let needle = Tokens::new(phrase).0;
        if needle.is_empty() || needle.len() > self.0.len() {
            return false;
        }
        self.0
            .windows(needle.len())
            .any(|window| window.iter().zip(&needle).all(|(word, stem)| is_inflection(word, stem)))
    }

    /// Number of tokens in `phrase`, used to rank overlapping matches.
    pub fn phrase_len(phrase: &str) -> usize {
        Tokens::new(phrase).0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `word` is `stem` or its plural.
fn is_inflection(word: &str, stem: &str) -> bool {
    matches!(word.strip_prefix(stem), Some("" | "s" | "es"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_whole_token_phrases() {
        let tokens = Tokens::new("¿Cómo se calcula el producto de matrices?");
        assert!(tokens.has_phrase("como se"));
        assert!(tokens.has_phrase("producto de matrices"));
        assert!(!tokens.has_phrase("producto matrices"));
    }

    #[test]
    fn does_not_match_inside_words() {
        let tokens = Tokens::new("Explícame con más detalle");
        assert!(!tokens.has_phrase("det"));
        assert!(tokens.has_phrase("detalle"));
    }

    #[test]
    fn plural_forms_match_their_singular() {
        let tokens = Tokens::new("¿Cuándo dos rectas son perpendiculares?");
        assert!(tokens.has_phrase_or_plural("perpendicular"));
        assert!(!tokens.has_phrase("perpendicular"));
        assert!(Tokens::new("matrices inversas").has_phrase_or_plural("matrices inversa"));
        assert!(Tokens::new("resuelvo sistemas").has_phrase_or_plural("sistema"));
    }

    #[test]
    fn plural_matching_still_needs_whole_words() {
        let tokens = Tokens::new("Explícame con más detalle");
        assert!(!tokens.has_phrase_or_plural("det"));
        assert!(!Tokens::new("vectorial").has_phrase_or_plural("vector"));
    }

    #[test]
    fn empty_phrase_never_matches() {
        assert!(!Tokens::new("hola").has_phrase("  "));
        assert!(Tokens::new("¿?").is_empty());
    }
}
