//! Extractive summarization.
//!
//! Scores every sentence of the article text and keeps the best few, in their
//! original order. Scoring combines overlap with the title, density of the
//! article's most frequent keywords, closeness to an ideal sentence length, and
//! position in the text.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

/// Sentence boundary: terminal punctuation followed by whitespace.
static SENTENCE_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([.!?]["')\]]?)\s+"#).expect("sentence regex"));

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}']+").expect("word regex"));

/// Sentence length (in words) that receives the full length score.
const IDEAL_SENTENCE_WORDS: f64 = 20.0;

/// Number of top keywords considered when scoring.
const KEYWORD_COUNT: usize = 10;

/// Sentences shorter than this are dropped before scoring.
const MIN_SENTENCE_WORDS: usize = 3;

const TITLE_WEIGHT: f64 = 1.5;
const KEYWORD_WEIGHT: f64 = 2.0;
const LENGTH_WEIGHT: f64 = 0.5;
const POSITION_WEIGHT: f64 = 1.0;

const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few",
    "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its",
    "itself", "just", "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off",
    "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "said",
    "same", "says", "she", "should", "so", "some", "such", "than", "that", "the", "their",
    "theirs", "them", "themselves", "then", "there", "these", "they", "this", "those", "through",
    "to", "too", "under", "until", "up", "very", "was", "we", "were", "what", "when", "where",
    "which", "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours",
    "yourself", "yourselves",
];

static STOPWORD_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOPWORDS.iter().copied().collect());

/// Limits applied to a summary.
#[derive(Debug, Clone, Copy)]
pub struct SummaryOptions {
    pub max_sentences: usize,
    pub max_chars: usize,
}

/// Summarize `text`, using `title` as a relevance hint.
///
/// Returns `None` when the text contains no usable sentences.
pub fn summarize(title: Option<&str>, text: &str, options: SummaryOptions) -> Option<String> {
    if options.max_sentences == 0 || options.max_chars == 0 {
        return None;
    }

    let sentences: Vec<String> = split_sentences(text)
        .into_iter()
        .filter(|s| s.split_whitespace().count() >= MIN_SENTENCE_WORDS)
        .collect();
    if sentences.is_empty() {
        return None;
    }

    let title_words: HashSet<String> = title
        .map(content_words)
        .unwrap_or_default()
        .into_iter()
        .collect();
    let keywords = top_keywords(text, KEYWORD_COUNT);
    let total = sentences.len();

    let mut scored: Vec<(usize, f64)> = sentences
        .iter()
        .enumerate()
        .map(|(i, s)| (i, score_sentence(s, i, total, &title_words, &keywords)))
        .collect();

    // Highest score first; earlier sentence wins a tie.
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    let mut chosen: Vec<usize> = scored
        .into_iter()
        .take(options.max_sentences)
        .map(|(i, _)| i)
        .collect();
    chosen.sort_unstable();

    let summary = chosen
        .into_iter()
        .map(|i| sentences[i].as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let summary = truncate_at_boundary(&summary, options.max_chars);
    if summary.is_empty() { None } else { Some(summary) }
}

/// Split text into trimmed sentences.
pub(crate) fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for caps in SENTENCE_END_RE.captures_iter(text) {
        let (Some(whole), Some(punct)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let sentence = text[start..punct.end()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_string());
        }
        start = whole.end();
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }

    sentences
}

/// Lowercased non-stopword words.
fn content_words(text: &str) -> Vec<String> {
    WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| w.chars().count() > 1 && !STOPWORD_SET.contains(w.as_str()))
        .collect()
}

/// The `n` most frequent content words; ties broken alphabetically.
fn top_keywords(text: &str, n: usize) -> HashSet<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in content_words(text) {
        *counts.entry(word).or_default() += 1;
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(n).map(|(w, _)| w).collect()
}

fn score_sentence(
    sentence: &str,
    index: usize,
    total: usize,
    title_words: &HashSet<String>,
    keywords: &HashSet<String>,
) -> f64 {
    let words = content_words(sentence);
    let word_count = sentence.split_whitespace().count() as f64;

    let title_score = if title_words.is_empty() {
        0.0
    } else {
        let overlap = words.iter().filter(|w| title_words.contains(*w)).count();
        overlap as f64 / title_words.len() as f64
    };

    let keyword_score = if words.is_empty() {
        0.0
    } else {
        let hits = words.iter().filter(|w| keywords.contains(*w)).count();
        hits as f64 / words.len() as f64
    };

    let length_score =
        (1.0 - (IDEAL_SENTENCE_WORDS - word_count).abs() / IDEAL_SENTENCE_WORDS).max(0.0);

    // Leading sentences of a news article usually carry the story.
    let position_score = 1.0 - index as f64 / total as f64;

    title_score * TITLE_WEIGHT
        + keyword_score * KEYWORD_WEIGHT
        + length_score * LENGTH_WEIGHT
        + position_score * POSITION_WEIGHT
}

/// Cut `text` to at most `max_chars` characters, backing off to the last
/// sentence end or word break.
pub(crate) fn truncate_at_boundary(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let byte_end = text
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let head = &text[..byte_end];

    if let Some(pos) = head.rfind(['.', '!', '?']).filter(|&p| p > 0) {
        return head[..=pos].trim().to_string();
    }
    if let Some(pos) = head.rfind(char::is_whitespace) {
        return head[..pos].trim_end().to_string();
    }
    head.to_string()
}
