//! Text collations registered on population connections.
//!
//! Room marks locale-aware columns with `COLLATE LOCALIZED` or
//! `COLLATE UNICODE`. SQLite does not know these names, so every connection
//! gets them bound to a [`TextCollator`].

use crate::error::PrefillerError;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Collation names Room emits for locale-aware text columns.
pub const COLLATION_NAMES: [&str; 2] = ["LOCALIZED", "UNICODE"];

/// Compares two strings for the database engine.
pub trait TextCollator: Send + Sync {
    fn compare(&self, left: &str, right: &str) -> Ordering;
}

pub type SharedCollator = Arc<dyn TextCollator>;

/// Locale-neutral code point order.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrdinalCollator;

impl TextCollator for OrdinalCollator {
    fn compare(&self, left: &str, right: &str) -> Ordering {
        left.cmp(right)
    }
}

/// A parsed `language[_COUNTRY]` locale such as `de_DE` or `sv`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale {
    pub language: String,
    pub country: Option<String>,
}

impl Locale {
    /// Accepts `_` or `-` as separator; normalizes case.
    pub fn parse(tag: &str) -> Result<Self, PrefillerError> {
        let invalid = |reason: &str| PrefillerError::InvalidLocale {
            locale: tag.to_string(),
            reason: reason.to_string(),
        };
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty locale identifier"));
        }

        let mut parts = trimmed.split(['_', '-']);
        let language = parts.next().unwrap_or_default().to_ascii_lowercase();
        if !(2..=3).contains(&language.len()) || !language.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(invalid("language must be 2 or 3 ASCII letters"));
        }
        let country = parts
            .next()
            .filter(|c| !c.is_empty())
            .map(|c| c.to_ascii_uppercase());

        Ok(Self { language, country })
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.country {
            Some(country) => write!(f, "{}_{country}", self.language),
            None => f.write_str(&self.language),
        }
    }
}

/// Primary-strength comparison tailored for a handful of locales, with
/// code point order as the tie-breaker so the result is a total order.
#[derive(Debug, Clone)]
pub struct LocaleCollator {
    locale: Locale,
}

impl LocaleCollator {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    fn sort_key(&self, text: &str) -> Vec<u32> {
        let language = self.locale.language.as_str();
        text.chars().flat_map(|ch| weights(ch, language)).collect()
    }
}

impl TextCollator for LocaleCollator {
    fn compare(&self, left: &str, right: &str) -> Ordering {
        self.sort_key(left)
            .cmp(&self.sort_key(right))
            .then_with(|| left.cmp(right))
    }
}

/// Collator for an optional locale tag; `None` means ordinal.
pub fn collator_for(locale: Option<&str>) -> Result<SharedCollator, PrefillerError> {
    match locale {
        Some(tag) => {
            let collator = LocaleCollator::new(Locale::parse(tag)?);
            debug!(locale = %collator.locale(), "using locale collation");
            Ok(Arc::new(collator))
        }
        None => Ok(Arc::new(OrdinalCollator)),
    }
}

fn lower(ch: char) -> u32 {
    u32::from(ch.to_lowercase().next().unwrap_or(ch))
}

/// Sorts after every code point; `[base, AFTER]` places a letter between
/// `base` and the next letter.
const AFTER: u32 = 0x11_0000;

fn weights(ch: char, language: &str) -> Vec<u32> {
    match (language, ch) {
        ("de", 'ä' | 'Ä') => vec![u32::from('a'), u32::from('e')],
        ("de", 'ö' | 'Ö') => vec![u32::from('o'), u32::from('e')],
        ("de", 'ü' | 'Ü') => vec![u32::from('u'), u32::from('e')],
        ("de", 'ß') => vec![u32::from('s'), u32::from('s')],
        ("sv" | "fi", 'å' | 'Å') => vec![u32::from('z'), AFTER, 1],
        ("sv" | "fi", 'ä' | 'Ä') => vec![u32::from('z'), AFTER, 2],
        ("sv" | "fi", 'ö' | 'Ö') => vec![u32::from('z'), AFTER, 3],
        ("es", 'ñ' | 'Ñ') => vec![u32::from('n'), AFTER],
        ("tr" | "az", 'ı' | 'I') => vec![u32::from('h'), AFTER],
        ("tr" | "az", 'İ') => vec![u32::from('i')],
        ("de" | "sv" | "fi" | "es" | "tr" | "az", _) => vec![lower(ch)],
        _ => vec![lower(strip_diacritic(ch))],
    }
}

/// Base letter for common Latin-1 accented characters.
fn strip_diacritic(ch: char) -> char {
    match ch {
        'À'..='Å' | 'à'..='å' | 'Æ' | 'æ' => 'a',
        'Ç' | 'ç' => 'c',
        'È'..='Ë' | 'è'..='ë' => 'e',
        'Ì'..='Ï' | 'ì'..='ï' => 'i',
        'Ñ' | 'ñ' => 'n',
        'Ò'..='Ö' | 'ò'..='ö' | 'Ø' | 'ø' => 'o',
        'Ù'..='Ü' | 'ù'..='ü' => 'u',
        'Ý' | 'ý' | 'ÿ' => 'y',
        _ => ch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(collator: &dyn TextCollator, words: &[&str]) -> Vec<String> {
        let mut words: Vec<String> = words.iter().map(|w| w.to_string()).collect();
        words.sort_by(|a, b| collator.compare(a, b));
        words
    }

    #[test]
    fn ordinal_is_code_point_order() {
        assert_eq!(sorted(&OrdinalCollator, &["b", "B", "a", "ä"]), vec!["B", "a", "b", "ä"]);
    }

    #[test]
    fn parses_locale_tags() {
        let locale = Locale::parse("de-de").unwrap();
        assert_eq!(locale.language, "de");
        assert_eq!(locale.country.as_deref(), Some("DE"));
        assert_eq!(locale.to_string(), "de_DE");
        assert_eq!(Locale::parse("sv").unwrap().to_string(), "sv");
    }

    #[test]
    fn rejects_malformed_locales() {
        assert!(matches!(Locale::parse(""), Err(PrefillerError::InvalidLocale { .. })));
        assert!(Locale::parse("x").is_err());
        assert!(Locale::parse("d3_DE").is_err());
    }

    #[test]
    fn german_expands_umlauts() {
        let collator = LocaleCollator::new(Locale::parse("de_DE").unwrap());
        assert_eq!(collator.compare("Müller", "Mueller"), Ordering::Greater);
        assert_eq!(collator.compare("Müller", "Muf"), Ordering::Less);
        assert_eq!(sorted(&collator, &["Zebra", "Äpfel", "Bär"]), vec!["Äpfel", "Bär", "Zebra"]);
    }

    #[test]
    fn swedish_sorts_ring_a_after_z() {
        let collator = LocaleCollator::new(Locale::parse("sv_SE").unwrap());
        assert_eq!(sorted(&collator, &["Åsa", "Zorn", "Anna"]), vec!["Anna", "Zorn", "Åsa"]);
        assert_eq!(sorted(&collator, &["ö", "ä", "å"]), vec!["å", "ä", "ö"]);
    }

    #[test]
    fn tailored_letters_sit_between_neighbours() {
        let spanish = LocaleCollator::new(Locale::parse("es").unwrap());
        assert_eq!(sorted(&spanish, &["oso", "ñu", "nube"]), vec!["nube", "ñu", "oso"]);

        let turkish = LocaleCollator::new(Locale::parse("tr_TR").unwrap());
        assert_eq!(sorted(&turkish, &["ip", "ıp", "hz"]), vec!["hz", "ıp", "ip"]);
    }

    #[test]
    fn root_locale_ignores_case_and_accents_first() {
        let collator = LocaleCollator::new(Locale::parse("en").unwrap());
        assert_eq!(sorted(&collator, &["zoo", "Éclair", "apple"]), vec!["apple", "Éclair", "zoo"]);
        assert_eq!(collator.compare("abc", "abc"), Ordering::Equal);
        assert_ne!(collator.compare("abc", "ABC"), Ordering::Equal);
    }

    #[test]
    fn collator_for_defaults_to_ordinal() {
        let collator = collator_for(None).unwrap();
        assert_eq!(collator.compare("B", "a"), Ordering::Less);
        let collator = collator_for(Some("de")).unwrap();
        assert_eq!(collator.compare("B", "a"), Ordering::Greater);
    }
}
