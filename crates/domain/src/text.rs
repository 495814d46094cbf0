//! Message body normalization
//!
//! Platforms render posts as plain text, so markdown syntax is stripped before
//! publishing. Platform entity mentions listed in an allow-list are shielded
//! from stripping and come out byte-identical. Newlines are never removed.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// LinkedIn organization mention, e.g. `@[Acme](urn:li:organization:123)`
pub const LINKEDIN_ORGANIZATION_MENTION: &str = r"@\[[^\]\n]+\]\(urn:li:organization:\d+\)";

/// Private-use code points eligible as shield delimiters
const SHIELD_CANDIDATES: [std::ops::RangeInclusive<u32>; 3] =
    [0xE000..=0xF8FF, 0xF0000..=0xFFFFD, 0x100000..=0x10FFFD];

// Every rule removes at least one character when it matches and none of them
// can match a newline.
static RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        // code fences
        (r"(?m)^[ \t]*```[^\n]*$", ""),
        // horizontal rules
        (r"(?m)^[ \t]*(?:(?:-[ \t]*){3,}|(?:\*[ \t]*){3,}|(?:_[ \t]*){3,})$", ""),
        // images keep their alt text
        (r"!\[([^\]\n]*)\]\([^)\n]*\)", "$1"),
        // links keep their label
        (r"\[([^\]\n]*)\]\([^)\n]*\)", "$1"),
        // headings
        (r"(?m)^([ \t]*)#{1,6}[ \t]+", "$1"),
        // block quotes
        (r"(?m)^([ \t]*)>[ \t]?", "$1"),
        // list leaders
        (r"(?m)^([ \t]*)(?:[-*+]|\d+\.)[ \t]+", "$1"),
        // strong
        (r"\*\*([^*\s](?:[^*\n]*[^*\s])?)\*\*", "$1"),
        (r"(^|[^\w])__([^_\s](?:[^_\n]*[^_\s])?)__($|[^\w])", "$1$2$3"),
        // emphasis
        (r"\*([^*\s](?:[^*\n]*[^*\s])?)\*", "$1"),
        (r"(^|[^\w])_([^_\s](?:[^_\n]*[^_\s])?)_($|[^\w])", "$1$2$3"),
        // strike-through
        (r"~~([^~\n]+)~~", "$1"),
        // inline code
        (r"`([^`\n]+)`", "$1"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        (
            Regex::new(pattern).expect("valid markdown pattern"),
            replacement,
        )
    })
    .collect()
});

static LINKEDIN_ALLOW_LIST: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![Regex::new(LINKEDIN_ORGANIZATION_MENTION).expect("valid mention pattern")]
});

/// Strips markdown from message bodies, keeping allow-listed mentions
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    except: Vec<Regex>,
}

impl Normalizer {
    pub fn new(except: Vec<Regex>) -> Self {
        Self { except }
    }

    /// Normalizer that keeps LinkedIn organization mentions
    pub fn linkedin() -> Self {
        Self::new(LINKEDIN_ALLOW_LIST.clone())
    }

    pub fn normalize(&self, text: &str) -> String {
        strip_markdown(text, &self.except)
    }
}

/// Remove markdown syntax from `text`, leaving matches of `except` untouched
///
/// Rules are applied until the text stops changing, so the result is a fixed
/// point and normalizing it again returns it unchanged.
pub fn strip_markdown(text: &str, except: &[Regex]) -> String {
    // Delimiters never occur in `text`, so only shields placed here are restored
    let Some((open, close)) = shield_delimiters(text) else {
        return fixed_point(text.to_string());
    };

    let mut shielded: Vec<String> = Vec::new();
    let mut current = text.to_string();

    for pattern in except {
        current = pattern
            .replace_all(&current, |caps: &Captures| {
                shielded.push(caps[0].to_string());
                format!("{}{}{}", open, shielded.len() - 1, close)
            })
            .into_owned();
    }

    current = fixed_point(current);
    for (index, original) in shielded.iter().enumerate() {
        current = current.replace(&format!("{}{}{}", open, index, close), original);
    }
    current
}

/// First two private-use characters absent from `text`
fn shield_delimiters(text: &str) -> Option<(char, char)> {
    let mut free = SHIELD_CANDIDATES
        .iter()
        .flat_map(|range| range.clone())
        .filter_map(char::from_u32)
        .filter(|c| !text.contains(*c));
    Some((free.next()?, free.next()?))
}

fn fixed_point(mut current: String) -> String {
    loop {
        let next = apply_rules(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn apply_rules(text: &str) -> String {
    RULES
        .iter()
        .fold(text.to_string(), |acc, (pattern, replacement)| {
            pattern.replace_all(&acc, *replacement).into_owned()
        })
}
