use std::collections::HashSet;

use lazy_static::lazy_static;
use log::info;
use regex::Regex;

pub const DEFAULT_MAX_KEYWORDS: usize = 10;
const MIN_KEYWORD_LENGTH: usize = 3;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"[^\w\s\-]").unwrap();
    static ref STOPWORDS: HashSet<&'static str> = [
        "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is",
        "it", "its", "of", "on", "that", "the", "to", "was", "will", "with", "would", "could",
        "should", "can", "i", "my", "we", "our", "this", "these", "those", "am", "been", "have",
        "had", "do", "does", "did", "but", "if", "or", "because", "until", "while", "about",
        "into", "through", "want", "need",
    ]
    .into_iter()
    .collect();
}

/// Reduces a free text description of an invention to a space separated list of search
/// keywords: lower case, punctuation removed, stopwords and short words dropped, duplicates
/// removed keeping the first occurrence, and at most `max_keywords` of them.
#[must_use]
pub fn extract_keywords(user_idea: &str, max_keywords: usize) -> String {
    let text = user_idea.to_lowercase();
    let text = NON_WORD.replace_all(&text, " ");

    let mut seen = HashSet::new();
    let keywords: Vec<&str> = text
        .split_whitespace()
        .filter(|word| !STOPWORDS.contains(word) && word.chars().count() >= MIN_KEYWORD_LENGTH)
        .filter(|word| seen.insert(*word))
        .take(max_keywords)
        .collect();

    info!("Extracted keywords: {keywords:?}");
    keywords.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopwords_and_short_words_are_dropped() {
        let keywords = extract_keywords(
            "A mobile device with a touchscreen interface for browsing the internet",
            DEFAULT_MAX_KEYWORDS,
        );
        assert_eq!(keywords, "mobile device touchscreen interface browsing internet");
    }

    #[test]
    fn punctuation_is_removed_and_hyphens_kept() {
        let keywords = extract_keywords("I want a self-driving car! (Electric, solar-powered.)", 10);
        assert_eq!(keywords, "self-driving car electric solar-powered");
    }

    #[test]
    fn duplicates_removed_and_limit_applied() {
        let keywords = extract_keywords("Battery battery BATTERY charger cell pack module", 3);
        assert_eq!(keywords, "battery charger cell");
    }

    #[test]
    fn nothing_left_gives_empty_string() {
        assert_eq!(extract_keywords("I want to do it", 10), "");
    }
}
