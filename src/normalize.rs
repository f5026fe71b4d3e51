//! Query text normalization shared by every text-matching source.
//!
//! Normalization is deliberately naive: fold case and diacritics, drop
//! punctuation, discard stop-words and very short tokens, and pair each
//! surviving word with a singular form obtained by dropping a trailing `s`.
//!
//! ```rust
//! use knowledge_harness::normalize::Normalizer;
//!
//! let terms = Normalizer::new(3).normalize("¿Dónde están las Armas?");
//! assert!(terms.contains("armas"));
//! assert!(terms.contains("arma"));
//! assert!(!terms.contains("las"));
//! ```

use std::collections::{BTreeSet, HashSet};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Connectors, pronouns, and a denylist of insults that carry no search signal.
const STOPWORDS: &[&str] = &[
    // connectors and function words
    "que", "como", "es", "cuando", "donde", "quien", "cual", "porque", "para", "por", "con",
    "sin", "del", "al", "de", "la", "el", "los", "las", "un", "una", "unos", "unas", "a", "en",
    "y", "o", "u", "ni", "no", "sí", "ya", "lo", "le", "les", "me", "te", "se", "son", "sobre",
    "entre",
    // pronouns and determiners
    "mi", "mis", "tu", "tus", "su", "sus", "nuestro", "nuestra", "nuestros", "nuestras",
    "vuestro", "vuestra", "vuestros", "vuestras", "mío", "mía", "míos", "mías", "tuyo", "tuya",
    "tuyos", "tuyas", "suyo", "suya", "suyos", "suyas", "todo", "todos", "toda", "todas", "cada",
    "algún", "ningún", "algo", "nada", "más", "menos", "muy", "este", "esta", "estos", "estas",
    "ese", "esa", "esos", "esas", "aquel", "aquella", "aquellos", "aquellas",
    // adverbs
    "entonces", "luego", "también", "tampoco", "incluso", "aunque", "mientras", "siempre",
    "nunca", "bien", "mal", "aquí", "allí", "allá", "acá", "ahora", "antes", "después",
    // profanity (Rioplatense)
    "boludo", "boluda", "pelotudo", "pelotuda", "gordo", "gorda", "mogólico", "mogólica",
    "idiota", "imbécil", "tarado", "tarada", "pelotudez", "pelotudeces", "mierda", "carajo",
    "concha", "pija", "puto", "puta", "putita", "reputo", "reputa", "reputísima", "culiado",
    "culiada", "chupala", "chupame", "ortiva", "lpm", "lpmqlp", "hijo", "hija", "hdp",
    "hijodeputa", "andate", "andá", "salame", "gil", "gila", "forro", "forra", "cornudo",
    "cornuda", "bobo", "boba", "zorra", "zorro", "lacra", "rata", "careta", "mierdero", "ñeri",
];

/// Lowercase, strip diacritics, remove everything that is not a letter,
/// digit, or whitespace, and collapse runs of whitespace to one space.
pub fn fold(raw: &str) -> String {
    let stripped: String = raw
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Naive singular: drop one trailing `s` from words longer than three chars.
pub fn singularize(word: &str) -> &str {
    if word.chars().count() > 3 {
        word.strip_suffix('s').unwrap_or(word)
    } else {
        word
    }
}

/// A surviving query word together with its naive singular.
///
/// When the word is already singular both fields are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub surface: String,
    pub singular: String,
}

impl Term {
    /// The distinct spellings of this term (one or two).
    pub fn variants(&self) -> impl Iterator<Item = &str> {
        let extra = (self.singular != self.surface).then_some(self.singular.as_str());
        std::iter::once(self.surface.as_str()).chain(extra)
    }

    /// True when any variant occurs in the already-folded `haystack`.
    pub fn found_in(&self, haystack: &str) -> bool {
        self.variants().any(|v| haystack.contains(v))
    }
}

/// Tokenizer configured with a minimum token length.
#[derive(Debug, Clone)]
pub struct Normalizer {
    min_len: usize,
    stopwords: HashSet<String>,
}

impl Normalizer {
    /// Build a normalizer dropping tokens shorter than `min_len` chars.
    pub fn new(min_len: usize) -> Self {
        Self {
            min_len,
            stopwords: STOPWORDS.iter().map(|w| fold(w)).collect(),
        }
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    /// Surviving query words, in query order, without duplicates.
    pub fn terms(&self, raw: &str) -> Vec<Term> {
        let folded = fold(raw);
        let mut seen = HashSet::new();
        folded
            .split(' ')
            .filter(|t| t.chars().count() >= self.min_len && !self.is_stopword(t))
            .filter(|t| seen.insert(t.to_string()))
            .map(|t| Term {
                surface: t.to_string(),
                singular: singularize(t).to_string(),
            })
            .collect()
    }

    /// Flat term set: every surviving token plus its singular form.
    ///
    /// An empty set means no match is possible and callers should stop.
    pub fn normalize(&self, raw: &str) -> BTreeSet<String> {
        self.terms(raw)
            .iter()
            .flat_map(|t| t.variants().map(str::to_string).collect::<Vec<_>>())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_strips_diacritics_and_punctuation() {
        assert_eq!(fold("  ¿Cuánta VIDA tiene un Clérigo?! "), "cuanta vida tiene un clerigo");
        assert_eq!(fold("Paladín,  elfo-oscuro"), "paladin elfooscuro");
        assert_eq!(fold("ñandú"), "nandu");
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("armas"), "arma");
        assert_eq!(singularize("mas"), "mas");
        assert_eq!(singularize("arma"), "arma");
        assert_eq!(singularize("dioses"), "diose");
    }

    #[test]
    fn test_stopwords_and_short_tokens_dropped() {
        let n = Normalizer::new(3);
        let terms = n.normalize("que es la espada de fuego");
        assert_eq!(
            terms.into_iter().collect::<Vec<_>>(),
            vec!["espada".to_string(), "fuego".to_string()]
        );
    }

    #[test]
    fn test_accented_stopwords_are_folded() {
        let n = Normalizer::new(2);
        assert!(n.normalize("más").is_empty());
        assert!(n.normalize("mas").is_empty());
    }

    #[test]
    fn test_profanity_carries_no_signal() {
        let n = Normalizer::new(2);
        assert!(n.normalize("boludo pelotudo").is_empty());
        assert!(n.normalize("!!! ???").is_empty());
    }

    #[test]
    fn test_min_len_is_configurable() {
        assert!(Normalizer::new(2).normalize("hp").contains("hp"));
        assert!(Normalizer::new(3).normalize("hp").is_empty());
    }

    #[test]
    fn test_plural_adds_singular() {
        let terms = Normalizer::new(3).normalize("hechizos");
        assert!(terms.contains("hechizos"));
        assert!(terms.contains("hechizo"));
        assert_eq!(terms.len(), 2);
    }

    #[test]
    fn test_normalize_idempotent_on_normalized_tokens() {
        let n = Normalizer::new(3);
        let first = n.normalize("Los Dragones del Bosque Oscuro");
        let joined = first.iter().cloned().collect::<Vec<_>>().join(" ");
        let second = n.normalize(&joined);
        assert!(second.is_superset(&first));

        let singular = n.normalize("espada");
        assert_eq!(n.normalize("espada"), singular);
    }

    #[test]
    fn test_terms_keep_order_and_dedupe() {
        let terms = Normalizer::new(3).terms("dragon fuego dragon");
        let surfaces: Vec<&str> = terms.iter().map(|t| t.surface.as_str()).collect();
        assert_eq!(surfaces, vec!["dragon", "fuego"]);
    }

    #[test]
    fn test_term_found_in_either_form() {
        let term = &Normalizer::new(3).terms("pociones")[0];
        assert!(term.found_in("una pocione roja"));
        assert!(term.found_in("las pociones"));
        assert!(!term.found_in("pocima"));
    }
}
