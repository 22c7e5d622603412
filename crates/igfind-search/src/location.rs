//! Address parsing and location-token matching.
//!
//! Addresses arrive as free text, usually `"street, city, ST zip"`. Parsing is
//! best effort: every part is optional and nothing here ever fails.

use std::collections::BTreeSet;

use crate::text::{contains_phrase, words};

const COUNTRY_SUFFIXES: &[&str] = &["usa", "us", "united states", "united states of america"];

const STREET_SUFFIXES: &[&str] = &[
    "st", "street", "ave", "avenue", "rd", "road", "blvd", "boulevard", "dr", "drive", "ln",
    "lane", "way", "pl", "place", "ct", "court", "sq", "square", "hwy", "highway", "pkwy",
    "parkway", "ste", "suite", "unit", "north", "south", "east", "west",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressParts {
    pub street: Option<String>,
    pub city: Option<String>,
    /// Two-letter code, upper-cased.
    pub state: Option<String>,
    pub zip: Option<String>,
}

fn is_zip(token: &str) -> bool {
    let digits = token.split('-').next().unwrap_or("");
    digits.len() == 5 && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_state_code(token: &str) -> bool {
    token.len() == 2
        && token.chars().all(|c| c.is_ascii_uppercase())
        && !STREET_SUFFIXES.contains(&token.to_ascii_lowercase().as_str())
}

#[must_use]
pub fn parse_address(address: &str) -> AddressParts {
    let mut parts: Vec<&str> = address
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    if parts
        .last()
        .is_some_and(|p| COUNTRY_SUFFIXES.contains(&p.to_lowercase().as_str()))
    {
        parts.pop();
    }

    let mut out = AddressParts::default();
    let Some(last) = parts.last().copied() else {
        return out;
    };

    // Scan from the end so "St Louis MO" takes MO as the state.
    let mut leftover: Vec<&str> = Vec::new();
    for token in last.split_whitespace().rev() {
        if out.zip.is_none() && is_zip(token) {
            out.zip = Some(token.to_string());
        } else if out.state.is_none() && is_state_code(token) {
            out.state = Some(token.to_ascii_uppercase());
        } else {
            leftover.push(token);
        }
    }
    leftover.reverse();

    let last_was_region = out.zip.is_some() || out.state.is_some();
    let remaining: &[&str] = if last_was_region {
        &parts[..parts.len() - 1]
    } else {
        &parts[..]
    };

    if last_was_region && !leftover.is_empty() {
        // "Boston MA 02115" with no comma before the state.
        out.city = Some(leftover.join(" "));
    }

    let starts_with_digit = |p: &str| p.chars().next().is_some_and(|c| c.is_ascii_digit());

    match remaining {
        [] => {}
        [only] => {
            if starts_with_digit(only) {
                out.street = Some((*only).to_string());
            } else if out.city.is_none() {
                out.city = Some((*only).to_string());
            }
        }
        [first, .., city] => {
            out.street = Some((*first).to_string());
            if out.city.is_none() {
                out.city = Some((*city).to_string());
            }
        }
    }

    out
}

/// Lower-cased tokens that indicate this address: city, state code, zip,
/// and the distinctive words of the street name.
#[must_use]
pub fn location_tokens(address: &str) -> Vec<String> {
    let parts = parse_address(address);
    let mut tokens: Vec<String> = Vec::new();
    let mut push = |t: String| {
        if !t.is_empty() && !tokens.contains(&t) {
            tokens.push(t);
        }
    };
    if let Some(city) = &parts.city {
        push(city.to_lowercase());
    }
    if let Some(state) = &parts.state {
        push(state.to_lowercase());
    }
    if let Some(zip) = &parts.zip {
        push(zip.chars().take(5).collect());
    }
    if let Some(street) = &parts.street {
        for word in words(street) {
            let numeric = word.chars().all(|c| c.is_ascii_digit());
            if !numeric && word.len() > 2 && !STREET_SUFFIXES.contains(&word.as_str()) {
                push(word);
            }
        }
    }
    tokens
}

/// Tokens that point at the target's region (city, state, zip) plus any
/// configured extras. Street words are excluded: they say little about which
/// city a profile belongs to.
#[must_use]
pub fn region_indicators(address: &str, extra: &[String]) -> Vec<String> {
    let parts = parse_address(address);
    let mut out: Vec<String> = Vec::new();
    if let Some(city) = parts.city {
        out.push(city.to_lowercase());
    }
    if let Some(state) = parts.state {
        out.push(state.to_lowercase());
    }
    if let Some(zip) = parts.zip {
        out.push(zip.chars().take(5).collect());
    }
    for token in extra {
        let t = token.trim().to_lowercase();
        if !t.is_empty() && !out.contains(&t) {
            out.push(t);
        }
    }
    out
}

/// Which of `tokens` appear as whole words in `text`.
#[must_use]
pub fn matched_tokens(text: &str, tokens: &[String]) -> BTreeSet<String> {
    tokens
        .iter()
        .filter(|t| contains_phrase(text, t))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_street_city_state_zip() {
        let parts = parse_address("123 Main St, Boston, MA 02115");
        assert_eq!(parts.street.as_deref(), Some("123 Main St"));
        assert_eq!(parts.city.as_deref(), Some("Boston"));
        assert_eq!(parts.state.as_deref(), Some("MA"));
        assert_eq!(parts.zip.as_deref(), Some("02115"));
    }

    #[test]
    fn parses_without_zip_and_with_country() {
        let parts = parse_address("55 Fruit St, Boston, MA, USA");
        assert_eq!(parts.city.as_deref(), Some("Boston"));
        assert_eq!(parts.state.as_deref(), Some("MA"));
        assert!(parts.zip.is_none());
    }

    #[test]
    fn parses_city_and_state_in_one_part() {
        let parts = parse_address("1 Elm St, Cambridge MA 02139");
        assert_eq!(parts.street.as_deref(), Some("1 Elm St"));
        assert_eq!(parts.city.as_deref(), Some("Cambridge"));
        assert_eq!(parts.zip.as_deref(), Some("02139"));
    }

    #[test]
    fn street_suffix_is_not_a_state() {
        let parts = parse_address("123 Main ST");
        assert!(parts.state.is_none());
        assert_eq!(parts.street.as_deref(), Some("123 Main ST"));
    }

    #[test]
    fn empty_address_parses_to_nothing() {
        assert_eq!(parse_address("   "), AddressParts::default());
    }

    #[test]
    fn location_tokens_skip_numbers_and_suffixes() {
        let tokens = location_tokens("123 Main St, Boston, MA 02115");
        assert_eq!(tokens, vec!["boston", "ma", "02115", "main"]);
    }

    #[test]
    fn region_indicators_merge_extras() {
        let extra = vec!["Back Bay".to_owned(), "boston".to_owned()];
        let got = region_indicators("123 Main St, Boston, MA", &extra);
        assert_eq!(got, vec!["boston", "ma", "back bay"]);
    }

    #[test]
    fn matched_tokens_are_whole_words() {
        let tokens = vec!["boston".to_owned(), "ma".to_owned()];
        let found = matched_tokens("Serving Boston since 1990. Email us!", &tokens);
        assert_eq!(found.len(), 1);
        assert!(found.contains("boston"));
    }
}
