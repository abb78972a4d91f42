//! Text canonicalization applied before any pattern matching.

use std::sync::LazyLock;

use regex::Regex;

/// Multi-character obfuscations, applied before per-character substitution
/// so `fr33` becomes `free` rather than `freee`-style fragments.
const WORD_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("fr33", "free"),
    ("go0gle", "google"),
    ("paypa1", "paypal"),
    ("c1ick", "click"),
    ("w0n", "win"),
    ("won", "win"),
    ("pr1nce", "prince"),
    ("n1gerian", "nigerian"),
    ("0ffer", "offer"),
];

#[allow(clippy::expect_used)] // static pattern, covered by tests
static TERMINAL_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]{2,}").expect("terminal punctuation pattern"));

#[allow(clippy::expect_used)] // static pattern, covered by tests
static STANDALONE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+\b").expect("standalone number pattern"));

/// Spell out the standalone numbers spam copy leans on.
const fn number_word(digits: &str) -> Option<&'static str> {
    match digits.as_bytes() {
        b"1" => Some("one"),
        b"50" => Some("fifty"),
        b"100" => Some("hundred"),
        b"1000" => Some("thousand"),
        b"1000000" => Some("million"),
        _ => None,
    }
}

/// Substitute single leet characters back to the letters they stand for.
const fn canonical_char(c: char) -> char {
    match c {
        '0' => 'o',
        '1' => 'i',
        '3' => 'e',
        '4' => 'a',
        '5' => 's',
        '7' => 't',
        '9' => 'g',
        '$' => 's',
        '!' => 'i',
        '@' => 'a',
        other => other,
    }
}

/// Canonicalize raw text for rule matching.
///
/// Lowercases, collapses runs of terminal punctuation (`!!!`, `???`) into a
/// single space, rewrites known leet-speak obfuscations back to canonical
/// words, spells out common spam numbers, and substitutes single obfuscation
/// characters. Total and deterministic: it never fails, and
/// `normalize(normalize(x)) == normalize(x)` for every input.
///
/// Punctuation collapse runs before character substitution so `!` runs are
/// treated as punctuation, not as obfuscated `i`s.
#[must_use]
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut out = TERMINAL_PUNCT.replace_all(&lowered, " ").into_owned();

    for (obfuscated, canonical) in WORD_SUBSTITUTIONS {
        out = out.replace(obfuscated, canonical);
    }

    out = STANDALONE_NUMBER
        .replace_all(&out, |caps: &regex::Captures<'_>| {
            number_word(&caps[0]).unwrap_or(&caps[0]).to_owned()
        })
        .into_owned();

    out.chars().map(canonical_char).collect()
}
