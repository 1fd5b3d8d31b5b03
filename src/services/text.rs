//! Text matching helpers shared by the search and analytics services.
//!
//! Titles mix CJK and Latin text, so tokenization treats each CJK character
//! as its own token and groups ASCII alphanumerics into words. Similarity is
//! Jaccard overlap of character bigrams, which behaves reasonably for both
//! scripts without a segmentation dependency.

use std::collections::HashSet;

fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

/// Split text into lowercase tokens: ASCII word runs plus single CJK chars.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            word.push(c.to_ascii_lowercase());
        } else {
            if !word.is_empty() {
                tokens.push(std::mem::take(&mut word));
            }
            if is_cjk(c) {
                tokens.push(c.to_string());
            }
        }
    }
    if !word.is_empty() {
        tokens.push(word);
    }
    tokens
}

fn bigrams(text: &str) -> HashSet<(char, char)> {
    let chars: Vec<char> = text
        .chars()
        .filter(|c| c.is_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

/// Character-bigram Jaccard similarity in [0, 1].
pub fn similarity(a: &str, b: &str) -> f64 {
    let ba = bigrams(a);
    let bb = bigrams(b);
    if ba.is_empty() || bb.is_empty() {
        // Too short for bigrams: fall back to containment.
        let an = a.trim().to_lowercase();
        let bn = b.trim().to_lowercase();
        if an.is_empty() || bn.is_empty() {
            return 0.0;
        }
        return if bn.contains(&an) || an.contains(&bn) {
            1.0
        } else {
            0.0
        };
    }
    let inter = ba.intersection(&bb).count() as f64;
    let union = ba.union(&bb).count() as f64;
    inter / union
}

/// Fraction of `reference`'s tokens that occur in `text`.
pub fn keyword_overlap(reference: &str, text: &str) -> f64 {
    let ref_tokens: HashSet<String> = tokenize(reference).into_iter().collect();
    if ref_tokens.is_empty() {
        return 0.0;
    }
    let text_tokens: HashSet<String> = tokenize(text).into_iter().collect();
    let hits = ref_tokens.intersection(&text_tokens).count() as f64;
    hits / ref_tokens.len() as f64
}

/// Case-insensitive containment check.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
