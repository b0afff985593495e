// src/study/generator.rs

//! Rule-based flashcard generation from extracted note text.
//!
//! Stages run in a fixed order (definitions, key terms, existing questions,
//! fill-in-the-blank, summaries) and duplicates are dropped by exact question
//! text, so an earlier stage wins over a later one.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::models::flashcard::{CardKind, GeneratedCard};

/// Maximum cards returned by `generate`.
pub const MAX_CARDS: usize = 10;

const KEY_TERM_LIMIT: usize = 8;
const KEY_TERM_CARDS: usize = 5;
const QUESTION_LIMIT: usize = 3;
const FILL_BLANK_LIMIT: usize = 3;
const SUMMARY_LIMIT: usize = 2;
const SUMMARY_MIN_CHARS: usize = 100;
const BLANK: &str = "_____";

static SENTENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]+(?:[.!?]+|$)").expect("valid sentence regex"));

static DEFINITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^(.+?)\s+(is defined as|defined as|refers to|means|is|are)\s+(.+)$")
        .expect("valid definition regex")
});

static CAPITALIZED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][a-zA-Z]+(?:[ \t]+[A-Z][a-zA-Z]+)*\b").expect("valid term regex")
});

static QUESTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?\n]+\?").expect("valid question regex"));

static FOLLOWING_SENTENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([^.!?]*[.!?]?)").expect("valid answer regex"));

static PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid paragraph regex"));

const STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "although", "an", "and", "any", "are", "as", "at",
    "be", "because", "been", "before", "but", "by", "can", "could", "did", "do", "does",
    "during", "each", "every", "for", "from", "had", "has", "have", "he", "her", "his", "how",
    "however", "i", "if", "in", "into", "is", "it", "its", "many", "me", "most", "my", "not",
    "of", "on", "one", "or", "our", "she", "should", "so", "some", "such", "than", "that", "the",
    "their", "then", "there", "these", "they", "this", "those", "to", "was", "we", "were", "what",
    "when", "where", "which", "while", "who", "why", "will", "with", "would", "you", "your",
];

fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word.to_lowercase().as_str())
}

/// Splits text into trimmed sentences, keeping terminal punctuation.
pub fn split_sentences(text: &str) -> Vec<&str> {
    SENTENCE_RE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Produces up to `MAX_CARDS` question/answer pairs from `text`.
pub fn generate(text: &str) -> Vec<GeneratedCard> {
    let sentences = split_sentences(text);

    let candidates = definitions(&sentences)
        .into_iter()
        .chain(key_term_cards(text, &sentences))
        .chain(existing_questions(text))
        .chain(fill_in_blanks(&sentences))
        .chain(summaries(text));

    let mut seen = HashSet::new();
    let mut cards = Vec::new();
    for card in candidates {
        if cards.len() == MAX_CARDS {
            break;
        }
        if seen.insert(card.question.clone()) {
            cards.push(card);
        }
    }

    tracing::debug!("Generated {} flashcard(s) from {} chars", cards.len(), text.len());
    cards
}

/// `<term> is|are|means|refers to|defined as <definition>` sentences.
fn definitions(sentences: &[&str]) -> Vec<GeneratedCard> {
    sentences
        .iter()
        .filter_map(|sentence| {
            let caps = DEFINITION_RE.captures(sentence)?;
            let term = caps.get(1)?.as_str().trim();
            let verb = caps.get(2)?.as_str().to_lowercase();
            let definition = caps.get(3)?.as_str().trim();

            // Long subjects are clauses, not terms.
            if term.chars().count() <= 2 || term.split_whitespace().count() > 6 || is_stopword(term) {
                return None;
            }
            if definition.chars().count() <= 5 {
                return None;
            }

            let question = if verb == "are" {
                format!("What are {}?", term)
            } else {
                format!("What is {}?", term)
            };
            Some(GeneratedCard::new(question, definition, CardKind::Definition))
        })
        .collect()
}

/// Capitalized phrases ranked by frequency, ties in order of first appearance.
/// Leading stopwords ("The Roman Empire") are dropped from each phrase.
pub fn key_terms(text: &str) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for m in CAPITALIZED_RE.find_iter(text) {
        let words: Vec<&str> = m
            .as_str()
            .split_whitespace()
            .skip_while(|w| is_stopword(w))
            .collect();
        if words.is_empty() {
            continue;
        }
        let term = words.join(" ");
        if term.chars().count() < 3 {
            continue;
        }

        match index.get(&term) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(term.clone(), counts.len());
                counts.push((term, 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(KEY_TERM_LIMIT);
    counts
}

fn key_term_cards(text: &str, sentences: &[&str]) -> Vec<GeneratedCard> {
    key_terms(text)
        .into_iter()
        .take(KEY_TERM_CARDS)
        .filter_map(|(term, _)| {
            let needle = term.to_lowercase();
            let context = sentences
                .iter()
                .find(|s| s.to_lowercase().contains(&needle))?;
            Some(GeneratedCard::new(
                format!("What is significant about {}?", term),
                *context,
                CardKind::Concept,
            ))
        })
        .collect()
}

/// Questions already written in the notes, answered by the sentence after them.
fn existing_questions(text: &str) -> Vec<GeneratedCard> {
    QUESTION_RE
        .find_iter(text)
        .take(QUESTION_LIMIT)
        .filter_map(|m| {
            let question = m.as_str().trim();
            let rest = &text[m.end()..];
            let answer = FOLLOWING_SENTENCE_RE
                .captures(rest)
                .and_then(|c| c.get(1))
                .map(|a| a.as_str().trim())?;

            let stripped = answer.trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace());
            if stripped.chars().count() <= 3 || answer.ends_with('?') {
                return None;
            }
            Some(GeneratedCard::new(question, answer, CardKind::Question))
        })
        .collect()
}

fn fill_in_blanks(sentences: &[&str]) -> Vec<GeneratedCard> {
    sentences
        .iter()
        .filter(|s| (5..=15).contains(&s.split_whitespace().count()))
        .take(FILL_BLANK_LIMIT)
        .filter_map(|sentence| {
            let words: Vec<&str> = sentence.split_whitespace().collect();
            let middle = words.len() / 2;
            let word = words[middle];
            let clean = word.trim_matches(|c: char| !c.is_alphanumeric());
            if clean.chars().count() < 3 || is_stopword(clean) {
                return None;
            }

            let blanked: Vec<String> = words
                .iter()
                .enumerate()
                .map(|(i, w)| {
                    if i == middle {
                        w.replacen(clean, BLANK, 1)
                    } else {
                        w.to_string()
                    }
                })
                .collect();

            Some(GeneratedCard::new(
                format!("Fill in the blank: {}", blanked.join(" ")),
                clean,
                CardKind::FillBlank,
            ))
        })
        .collect()
}

fn summaries(text: &str) -> Vec<GeneratedCard> {
    PARAGRAPH_RE
        .split(text)
        .map(str::trim)
        .filter(|p| p.chars().count() > SUMMARY_MIN_CHARS)
        .take(SUMMARY_LIMIT)
        .filter_map(|paragraph| {
            let sentences = split_sentences(paragraph);
            let first = *sentences.first()?;
            let last = *sentences.last()?;
            let summary = if sentences.len() > 1 {
                format!("{} {}", first, last)
            } else {
                first.to_string()
            };

            let opening: Vec<&str> = paragraph.split_whitespace().take(6).collect();
            Some(GeneratedCard::new(
                format!("Summarize the passage beginning \"{}...\"", opening.join(" ")),
                summary,
                CardKind::Summary,
            ))
        })
        .collect()
}
