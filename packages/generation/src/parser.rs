//! Parsing and cleanup of model responses.
//!
//! The prompt asks for `[제목]` / `[본문]` sections. Models mostly comply,
//! so the parser is forgiving: missing markers fall back to treating the
//! first line as the title, and a body-only response is returned as-is.

use std::sync::LazyLock;

use regex::Regex;

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[제목\]\s*\n(.+)").unwrap()
});

static BODY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[본문\]\s*\n([\s\S]+)").unwrap()
});

/// Invisible and formatting code points stripped from generated text:
/// zero-width characters, directional marks, Hangul fillers, and
/// non-breaking space variants. Pasting these into a blog editor breaks
/// copy detection tools and spacing.
static INVISIBLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[\u{00A0}\u{00AD}\u{034F}\u{061C}\u{115F}\u{1160}\u{17B4}\u{17B5}\u{180E}\u{200B}-\u{200F}\u{202A}-\u{202E}\u{2060}\u{2066}-\u{2069}\u{2028}\u{2029}\u{205F}\u{3000}\u{3164}\u{FEFF}\u{FFA0}\u{FFF9}-\u{FFFB}]",
    )
    .unwrap()
});

/// Title and body split out of a raw model response.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedArticle {
    pub title: String,
    pub body: String,
}

/// Split a titled response into title and body.
///
/// Looks for the `[제목]` and `[본문]` markers independently. When
/// neither is present the first line becomes the title and the rest the
/// body. When only one marker is present the other field keeps its
/// default (empty title, whole raw text as body).
pub fn parse_response(raw: &str) -> ParsedArticle {
    let title_caps = TITLE_RE.captures(raw);
    let body_caps = BODY_RE.captures(raw);

    let mut title = String::new();
    let mut body = raw.to_string();

    if let Some(caps) = &title_caps {
        title = caps[1].trim().to_string();
    }
    if let Some(caps) = &body_caps {
        body = caps[1].trim().to_string();
    }

    if title_caps.is_none() && body_caps.is_none() {
        let trimmed = raw.trim();
        match trimmed.split_once('\n') {
            Some((first, rest)) => {
                title = first.trim().to_string();
                body = rest.trim().to_string();
            }
            None => {
                title = trimmed.to_string();
                body = String::new();
            }
        }
    }

    ParsedArticle { title, body }
}

/// Extract the body of a response requested without a title section.
///
/// Only the `[본문]` marker is honored; a response without it is used
/// whole.
pub fn extract_body(raw: &str) -> String {
    match BODY_RE.captures(raw) {
        Some(caps) => caps[1].trim().to_string(),
        None => raw.to_string(),
    }
}

/// Delete invisible and formatting code points from generated text.
pub fn clean_invisible_chars(text: &str) -> String {
    INVISIBLE_RE.replace_all(text, "").into_owned()
}

/// Character count of a body: sum of line lengths with blank lines
/// excluded and per-line leading/trailing whitespace not counted.
pub fn char_count(body: &str) -> usize {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.chars().count())
        .sum()
}
