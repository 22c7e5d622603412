//! Small text helpers shared by adapters, verification and scoring.

/// Restaurant/food-domain keywords looked for in page and bio text.
pub const FOOD_KEYWORDS: &[&str] = &[
    "restaurant",
    "food",
    "eat",
    "kitchen",
    "cafe",
    "café",
    "bar",
    "grill",
    "pizza",
    "bistro",
    "dining",
    "menu",
    "taqueria",
    "bakery",
    "coffee",
    "brunch",
    "sushi",
    "burger",
    "taco",
    "chef",
    "cuisine",
    "diner",
    "takeout",
    "delivery",
];

/// Generic words that say nothing about which restaurant a handle is for.
pub const GENERIC_NAME_WORDS: &[&str] = &[
    "the",
    "and",
    "restaurant",
    "restaurants",
    "kitchen",
    "cafe",
    "bar",
    "grill",
    "bistro",
    "eatery",
    "house",
    "co",
    "company",
];

/// Lower-cased alphanumeric words, with apostrophes dropped so that
/// "Joe's" becomes "joes".
#[must_use]
pub fn words(s: &str) -> Vec<String> {
    s.to_lowercase()
        .replace(['\'', '’'], "")
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Words of a restaurant name that carry signal: longer than two characters,
/// falling back to every word when the name is all short words.
#[must_use]
pub fn name_words(name: &str) -> Vec<String> {
    let all = words(name);
    let long: Vec<String> = all.iter().filter(|w| w.chars().count() > 2).cloned().collect();
    if long.is_empty() {
        all
    } else {
        long
    }
}

/// [`name_words`] without generic restaurant vocabulary. Falls back to the
/// plain name words when nothing else remains.
#[must_use]
pub fn meaningful_name_words(name: &str) -> Vec<String> {
    let base = name_words(name);
    let meaningful: Vec<String> = base
        .iter()
        .filter(|w| !GENERIC_NAME_WORDS.contains(&w.as_str()))
        .cloned()
        .collect();
    if meaningful.is_empty() {
        base
    } else {
        meaningful
    }
}

/// Lower-cased ASCII alphanumerics only.
#[must_use]
pub fn alnum_lower(s: &str) -> String {
    s.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Fraction of `words` found as substrings of `haystack` (already lower-cased).
/// Zero when `words` is empty.
#[must_use]
pub fn coverage(words: &[String], haystack: &str) -> f64 {
    if words.is_empty() {
        return 0.0;
    }
    let hits = words.iter().filter(|w| haystack.contains(w.as_str())).count();
    #[allow(clippy::cast_precision_loss)]
    let ratio = hits as f64 / words.len() as f64;
    ratio
}

/// Any [`FOOD_KEYWORDS`] entry as a whole word, singular or with a plain
/// plural `s` ("tacos", "burgers"). "barber" and "theater" do not count.
#[must_use]
pub fn contains_food_keyword(text: &str) -> bool {
    FOOD_KEYWORDS
        .iter()
        .any(|k| contains_phrase(text, k) || contains_phrase(text, &format!("{k}s")))
}

/// Whole-word (or whole-phrase) match of `phrase` in `haystack`, case-insensitive.
#[must_use]
pub fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    let phrase = phrase.trim().to_lowercase();
    if phrase.is_empty() {
        return false;
    }
    let hay = haystack.to_lowercase();
    let mut from = 0;
    while let Some(pos) = hay[from..].find(&phrase) {
        let start = from + pos;
        let end = start + phrase.len();
        let before_ok = hay[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = hay[end..].chars().next().is_none_or(|c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        from = start + phrase.chars().next().map_or(1, char::len_utf8);
    }
    false
}

/// Drop parenthetical or bracketed qualifiers: "Anna's Taqueria (MGH)"
/// becomes "Anna's Taqueria". Returns `None` when nothing changes or
/// nothing is left.
#[must_use]
pub fn simplify_name(name: &str) -> Option<String> {
    let mut out = String::with_capacity(name.len());
    let mut depth = 0usize;
    for c in name.chars() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    let simplified = out
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == '-' || c == ',' || c.is_whitespace())
        .to_string();
    if simplified.is_empty() || simplified == name.trim() {
        None
    } else {
        Some(simplified)
    }
}

/// Truncate to at most `max_chars` characters on a char boundary.
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
