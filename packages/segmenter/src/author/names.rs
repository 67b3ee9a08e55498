//! Author name cleaning and validation.

use std::sync::LazyLock;

use regex::Regex;

use crate::text::{fold_diacritics, is_all_caps, normalize_spaces};

/// Two to four capitalized tokens on one line, allowing Spanish connectors.
///
/// Contains exactly one capture group. Case-sensitive on purpose; embed it
/// only in patterns that scope any `(?i)` flag to their own groups.
pub const NAME_PATTERN: &str = r"(\p{Lu}[\p{Ll}'’\-]+(?:[ \t]+(?:(?:de|del|de[ \t]+la|y)[ \t]+)?\p{Lu}[\p{Ll}'’\-]+){1,3})";

/// Lowercase tokens allowed inside a name.
pub const NAME_CONNECTORS: &[&str] = &["de", "del", "la", "las", "los", "y", "da", "do", "van", "von"];

/// Folded tokens that never appear in a person's name.
const STOP_TOKENS: &[&str] = &[
    "el", "un", "una", "que", "en", "con", "por", "para", "sin", "the", "and", "of", "no", "si",
    "mi", "tu", "su", "este", "esta",
];

/// Folded substrings marking a section or book title rather than a name.
pub const SECTION_TITLE_WORDS: &[&str] = &[
    "capitulo", "chapter", "indice", "prologo", "introduccion", "epilogo", "parte", "poema",
    "soneto", "antologia", "editorial", "ediciones", "copyright", "isbn", "derechos", "reservados",
    "biblioteca", "pagina", "obras completas", "libro", "tomo", "volumen", "canto", "coleccion",
];

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static LEADING_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?i:autora?\s*:|author\s*:|escrito\s+por|written\s+by|por\s|by\s|copyright\b|©|\(c\))\s*)+",
    )
    .expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\(?\d{4}\)?[,\s]+|[,\s]*\(?\d{4}\)?$").expect("valid regex")
});

const EDGE_NOISE: &[char] = &[
    '—', '–', '-', '*', '"', '\'', '«', '»', '“', '”', '(', ')', '[', ']', ',', ';', ':', '.', '_',
];

fn clean_step(raw: &str) -> String {
    let text = normalize_spaces(raw);
    let text = LEADING_LABEL.replace(&text, "");
    let text = YEAR.replace_all(&text, "");
    let text = text.trim_matches(|c: char| EDGE_NOISE.contains(&c) || c.is_whitespace());
    if is_all_caps(text) {
        title_case_name(text)
    } else {
        text.to_string()
    }
}

fn title_case_name(text: &str) -> String {
    text.split_whitespace()
        .map(|token| {
            let lower = token.to_lowercase();
            if NAME_CONNECTORS.contains(&lower.as_str()) {
                return lower;
            }
            let mut chars = lower.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip labels, years, quotes and dashes from a raw author string.
///
/// Repeats until nothing changes, so cleaning twice equals cleaning once.
///
/// # Examples
/// ```
/// use biblio_segmenter::author::clean_author_name;
///
/// assert_eq!(clean_author_name("— Por JUAN PÉREZ, 1998."), "Juan Pérez");
/// ```
#[must_use]
pub fn clean_author_name(raw: &str) -> String {
    let mut current = raw.to_string();
    loop {
        let next = clean_step(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Whether a cleaned string has the shape of a person's name.
///
/// At least two capitalized tokens; other tokens must be connectors. Stop
/// words, digits and section-title words disqualify.
#[must_use]
pub fn is_valid_author_name(name: &str) -> bool {
    let tokens: Vec<&str> = name.split_whitespace().collect();
    if tokens.len() < 2 || tokens.len() > 6 || name.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }

    let mut capitalized = 0;
    for token in &tokens {
        let folded = fold_diacritics(token);
        if STOP_TOKENS.contains(&folded.as_str()) {
            return false;
        }
        if token.chars().next().is_some_and(char::is_uppercase) {
            capitalized += 1;
        } else if !NAME_CONNECTORS.contains(&folded.as_str()) {
            return false;
        }
    }
    if capitalized < 2 {
        return false;
    }

    let folded = fold_diacritics(name);
    !SECTION_TITLE_WORDS.iter().any(|word| folded.contains(word))
}

/// Two to four capitalized tokens, ignoring connectors.
#[must_use]
pub fn has_name_shape(name: &str) -> bool {
    let capitalized = name
        .split_whitespace()
        .filter(|token| token.chars().next().is_some_and(char::is_uppercase))
        .count();
    (2..=4).contains(&capitalized)
}

/// Same person once diacritics and case are folded.
#[must_use]
pub fn same_name(a: &str, b: &str) -> bool {
    fold_diacritics(a) == fold_diacritics(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_author_name() {
        assert_eq!(clean_author_name("  Autor:  Juan   Pérez "), "Juan Pérez");
        assert_eq!(clean_author_name("**Ana María Matute**"), "Ana María Matute");
        assert_eq!(clean_author_name("(Borges, 1949)"), "Borges");
        assert_eq!(clean_author_name("MIGUEL DE UNAMUNO"), "Miguel de Unamuno");
        assert_eq!(clean_author_name("© 2001 Laura Esquivel"), "Laura Esquivel");
    }

    #[test]
    fn test_clean_author_name_idempotent() {
        let samples = [
            "— Por «RUBÉN DARÍO», 1905.",
            "by by Edgar Allan Poe",
            "Copyright (c) Isabel Allende",
            "___",
            "",
            "Gabriela Mistral (1945)",
        ];
        for raw in samples {
            let once = clean_author_name(raw);
            assert_eq!(clean_author_name(&once), once, "{raw}");
        }
    }

    #[test]
    fn test_is_valid_author_name() {
        assert!(is_valid_author_name("Juan Pérez"));
        assert!(is_valid_author_name("Miguel de Cervantes"));
        assert!(is_valid_author_name("Sor Juana Inés de la Cruz"));
        assert!(!is_valid_author_name("Borges"));
        assert!(!is_valid_author_name("El Quijote"));
        assert!(!is_valid_author_name("Capítulo Primero"));
        assert!(!is_valid_author_name("Poemas Escogidos"));
        assert!(!is_valid_author_name("Juan pérez"));
        assert!(!is_valid_author_name("Juan Pérez 2"));
    }

    #[test]
    fn test_name_pattern_stops_at_line_end() {
        let re = Regex::new(NAME_PATTERN).unwrap();
        let caps = re.captures("Juan Pérez\nJuan Pérez nació").unwrap();
        assert_eq!(&caps[1], "Juan Pérez");
        let caps = re.captures("Miguel de Cervantes Saavedra").unwrap();
        assert_eq!(&caps[1], "Miguel de Cervantes Saavedra");
    }

    #[test]
    fn test_has_name_shape_and_same_name() {
        assert!(has_name_shape("Rubén Darío"));
        assert!(!has_name_shape("Darío"));
        assert!(same_name("Rubén Darío", "ruben dario"));
    }
}
