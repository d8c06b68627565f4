//! Naming helpers: slugs, identifiers and display titles derived from
//! free-text screen names.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CAMEL_HUMP_RE: Regex = Regex::new(r"([a-z0-9])([A-Z])").unwrap();
    static ref WORD_SPLIT_RE: Regex = Regex::new(r"[^A-Za-z0-9]+").unwrap();
    static ref IDENTIFIER_RE: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap();
}

fn words(input: &str) -> Vec<String> {
    let spaced = CAMEL_HUMP_RE.replace_all(input.trim(), "$1 $2");
    WORD_SPLIT_RE
        .split(&spaced)
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `"Account Settings"` -> `"account-settings"`. Empty when the input has no
/// alphanumeric content.
pub fn slugify(input: &str) -> String {
    words(input).join("-")
}

/// `"account-settings"` -> `"AccountSettings"`. Always a valid identifier for
/// non-empty input.
pub fn pascal_case(input: &str) -> String {
    let joined: String = words(input).iter().map(|w| capitalize(w)).collect();
    if joined.starts_with(|c: char| c.is_ascii_digit()) {
        format!("Screen{}", joined)
    } else {
        joined
    }
}

/// `"account-settings"` -> `"Account Settings"`.
pub fn humanize(input: &str) -> String {
    words(input)
        .iter()
        .map(|w| capitalize(w))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn default_component_name(slug: &str) -> String {
    format!("{}Screen", pascal_case(slug))
}

/// Reserved words, strict-mode reserved words and literals that cannot be
/// used as a binding name in a module.
const RESERVED_WORDS: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally", "for", "function",
    "if", "implements", "import", "in", "instanceof", "interface", "let", "new", "null",
    "package", "private", "protected", "public", "return", "static", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER_RE.is_match(name) && !RESERVED_WORDS.contains(&name)
}
