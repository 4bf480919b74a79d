use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::NAME_SUFFIXES;

/// Whole-word, case-insensitive street keyword rewrites. Replacements never
/// match their own patterns, so the pass is idempotent.
static ADDRESS_ABBREVIATIONS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"\bHighway\b", "Hwy"),
        (r"\bBoulevard\b", "Blvd"),
        (r"\bNortheast\b", "NE"),
        (r"\bSoutheast\b", "SE"),
        (r"\bNorthwest\b", "NW"),
        (r"\bSouthwest\b", "SW"),
    ]
    .iter()
    .map(|(pattern, replacement)| {
        (Regex::new(&format!("(?i){pattern}")).unwrap(), *replacement)
    })
    .collect()
});

/// Rewrites a raw name into "First [Middle...] Last [Suffix]" form.
///
/// "Last, Rest" input is flipped to "Rest Last" first; a suffix riding
/// along with the given names moves to the end. Every other token is
/// capitalized per word, hyphenated tokens per segment. Blank input passes
/// through unchanged.
pub fn normalize_name(raw: &str) -> String {
    let name = raw.trim();
    if name.is_empty() {
        return raw.to_string();
    }

    let segments: Vec<&str> = name.split(',').collect();
    let mut tokens: Vec<&str> = Vec::new();
    let mut suffixes: Vec<&str> = Vec::new();
    if segments.len() >= 2 {
        let last = segments[0].trim();
        let rest = segments[1].trim();
        for token in rest.split_whitespace() {
            if NAME_SUFFIXES.contains(&token) {
                suffixes.push(token);
            } else {
                tokens.push(token);
            }
        }
        tokens.extend(last.split_whitespace());
    } else {
        tokens.extend(name.split_whitespace());
    }
    tokens.extend(suffixes);

    tokens
        .iter()
        .map(|t| capitalize_token(t))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonicalizes a race code to one of {White, Black, Hispanic, Other};
/// unmatched values come back title-cased. Blank input passes through
/// unchanged.
pub fn normalize_race(raw: &str) -> String {
    let value = raw.trim();
    if value.is_empty() {
        return raw.to_string();
    }
    match value.to_uppercase().as_str() {
        "W" | "WHITE" => "White".to_string(),
        "B" | "BLACK" => "Black".to_string(),
        "H" | "HISPANIC" => "Hispanic".to_string(),
        "O" | "OTHER" => "Other".to_string(),
        _ => capitalize_word(value),
    }
}

/// Applies the street keyword abbreviations. Blank input passes through
/// unchanged.
pub fn abbreviate_address(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return raw.to_string();
    }
    let mut value = trimmed.to_string();
    for (pattern, replacement) in ADDRESS_ABBREVIATIONS.iter() {
        value = pattern.replace_all(&value, *replacement).into_owned();
    }
    value
}

fn capitalize_token(token: &str) -> String {
    if NAME_SUFFIXES.contains(&token) {
        return token.to_string();
    }
    if token.contains('-') {
        token
            .split('-')
            .map(capitalize_word)
            .collect::<Vec<_>>()
            .join("-")
    } else {
        capitalize_word(token)
    }
}

fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}
