//! Caption tokenization helpers shared by transforms and construction.

use std::collections::HashSet;

use crate::constants::text::STOPWORDS;

/// Lowercased ASCII-alphanumeric token runs of `text`, in order.
///
/// Non-alphanumeric characters (including underscores) separate tokens, so
/// `"Two dogs, one ball."` yields `["two", "dogs", "one", "ball"]`.
pub fn alnum_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        let lowered = ch.to_ascii_lowercase();
        if lowered.is_ascii_alphanumeric() {
            current.push(lowered);
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Noun-like tokens of `text`: alphanumeric runs longer than two characters
/// that are not stopwords.
pub fn noun_tokens(text: &str) -> HashSet<String> {
    alnum_tokens(text)
        .into_iter()
        .filter(|token| token.len() > 2 && !STOPWORDS.contains(&token.as_str()))
        .collect()
}

/// A standalone word occurrence in the original text.
///
/// Runs cover alphanumerics plus underscore, so `not` inside `cannot` or
/// `not_here` is never reported as a standalone word.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WordRun {
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
    /// Lowercased run content used for matching.
    pub lowered: String,
}

/// Word-character runs of `text` with byte offsets, in order.
pub fn word_runs(text: &str) -> Vec<WordRun> {
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;
    let mut lowered = String::new();
    for (idx, ch) in text.char_indices() {
        if ch.is_alphanumeric() || ch == '_' {
            if start.is_none() {
                start = Some(idx);
            }
            for low in ch.to_lowercase() {
                lowered.push(low);
            }
        } else if let Some(begin) = start.take() {
            runs.push(WordRun {
                start: begin,
                end: idx,
                lowered: std::mem::take(&mut lowered),
            });
        }
    }
    if let Some(begin) = start {
        runs.push(WordRun {
            start: begin,
            end: text.len(),
            lowered,
        });
    }
    runs
}

/// Replace the byte range `[start, end)` of `text` with `replacement`.
pub fn replace_range(text: &str, start: usize, end: usize, replacement: &str) -> String {
    let mut result = String::with_capacity(text.len() + replacement.len());
    result.push_str(&text[..start]);
    result.push_str(replacement);
    result.push_str(&text[end..]);
    result
}
