use regex::Regex;
use std::sync::OnceLock;

fn terminal_punctuation() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[.!?]+\s+").expect("sentence split pattern is valid"))
}

/// Candidate sentences: non-empty trimmed lines, each split after terminal
/// punctuation that is followed by whitespace. The final sentence of a line
/// keeps its trailing punctuation.
pub fn split_sentences(text: &str) -> Vec<String> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .flat_map(|line| terminal_punctuation().split(line))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Length in characters, not bytes.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}
