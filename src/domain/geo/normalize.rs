//! Address text canonicalization

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Whole-token abbreviations and their expansions
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("rd", "road"),
    ("st", "street"),
    ("ave", "avenue"),
    ("mh", "maharashtra"),
    ("maha", "maharashtra"),
];

/// Canonicalize an address string for keying and embedding
///
/// Lowercases, trims, collapses whitespace, strips everything that is neither
/// alphanumeric nor whitespace, then expands known abbreviations token by
/// token. Whitespace is collapsed again after stripping so the result is a
/// fixed point: `normalize_address(&normalize_address(x)) == normalize_address(x)`.
pub fn normalize_address(text: &str) -> String {
    let lowered = text.to_lowercase();
    let collapsed = collapse_whitespace(&lowered);

    let stripped: String = collapsed
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    collapse_whitespace(&stripped)
        .split(' ')
        .map(expand_abbreviation)
        .collect::<Vec<_>>()
        .join(" ")
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text.trim(), " ").into_owned()
}

fn expand_abbreviation(token: &str) -> &str {
    ABBREVIATIONS
        .iter()
        .find(|(short, _)| *short == token)
        .map(|(_, long)| *long)
        .unwrap_or(token)
}
