//! Heuristic "main content" snippet extraction.
//!
//! Looks for a takeaways heading first and falls back to the leading sentences
//! of the text. Lengths are counted in characters, not bytes.

pub const DEFAULT_MARKERS: &[&str] = &[
    "main takeaways and insights:",
    "main takeaways and insights",
    "main takeaways:",
    "main takeaways",
    "key takeaways:",
    "key takeaways",
    "takeaways:",
    "takeaways",
];
pub const MARKER_WINDOW_CHARS: usize = 800;
pub const MAX_SNIPPET_CHARS: usize = 400;
pub const FALLBACK_SENTENCES: usize = 3;
pub const ELLIPSIS: &str = "...";

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Matched ASCII case-insensitively; earlier entries win ties.
    pub markers: Vec<String>,
    pub window_chars: usize,
    pub max_chars: usize,
    pub fallback_sentences: usize,
    pub ellipsis: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            markers: DEFAULT_MARKERS.iter().map(|m| m.to_string()).collect(),
            window_chars: MARKER_WINDOW_CHARS,
            max_chars: MAX_SNIPPET_CHARS,
            fallback_sentences: FALLBACK_SENTENCES,
            ellipsis: ELLIPSIS.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContentSummaryExtractor {
    config: ExtractorConfig,
}

impl ContentSummaryExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn extract(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let candidate = match self.find_marker(text) {
            Some(end) => self.block_after_marker(&text[end..]),
            None => self.leading_sentences(text),
        };

        self.truncate(candidate)
    }

    /// Byte offset just past the earliest marker occurrence.
    fn find_marker(&self, text: &str) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for marker in self.config.markers.iter().filter(|m| !m.is_empty()) {
            if let Some(start) = find_ignore_ascii_case(text, marker) {
                if best.is_none_or(|(s, _)| start < s) {
                    best = Some((start, start + marker.len()));
                }
            }
        }
        best.map(|(_, end)| end)
    }

    fn block_after_marker(&self, rest: &str) -> String {
        let window: String = rest.chars().take(self.config.window_chars).collect();
        let snippet = window
            .trim()
            .trim_start_matches(|c: char| c == ':' || c.is_whitespace());
        let block = split_blank_line(snippet);
        block.trim().to_string()
    }

    fn leading_sentences(&self, text: &str) -> String {
        let trimmed = text.trim();
        let sentences = split_sentences(trimmed);
        if sentences.len() >= self.config.fallback_sentences {
            sentences[..self.config.fallback_sentences].join(" ")
        } else {
            trimmed.to_string()
        }
    }

    fn truncate(&self, candidate: String) -> String {
        let max = self.config.max_chars;
        if candidate.chars().count() <= max {
            return candidate;
        }

        let cut = candidate
            .char_indices()
            .nth(max)
            .map(|(i, _)| i)
            .unwrap_or(candidate.len());
        let window = &candidate[..cut];
        let kept = match window.rfind(char::is_whitespace) {
            Some(i) => window[..i].trim_end(),
            None => window,
        };
        format!("{}{}", kept, self.config.ellipsis)
    }
}

/// Extract with the default markers and limits.
pub fn extract_main_content(text: &str) -> String {
    ContentSummaryExtractor::default().extract(text)
}

fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let pat = needle.as_bytes();
    if pat.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - pat.len())
        .filter(|&i| haystack.is_char_boundary(i))
        .find(|&i| hay[i..i + pat.len()].eq_ignore_ascii_case(pat))
}

/// Text before the first blank line (two newlines, optionally with `\r`).
fn split_blank_line(text: &str) -> &str {
    let normalized_end = text
        .match_indices('\n')
        .find(|(i, _)| {
            let after = &text[i + 1..];
            let after = after.trim_start_matches([' ', '\t', '\r']);
            after.starts_with('\n')
        })
        .map(|(i, _)| i);

    match normalized_end {
        Some(i) => &text[..i],
        None => text,
    }
}

/// Sentences end at `.`, `!` or `?` followed by whitespace.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let Some(&(next_i, next)) = chars.peek() else {
            break;
        };
        if !next.is_whitespace() {
            continue;
        }

        sentences.push(&text[start..next_i]);
        while let Some(&(_, ws)) = chars.peek() {
            if !ws.is_whitespace() {
                break;
            }
            chars.next();
        }
        start = chars.peek().map(|&(j, _)| j).unwrap_or(text.len());
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}
