use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use canon_core::errors::EnrichmentError;

static WORD: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[A-Za-z][A-Za-z'\-]{2,}").ok());

const STOPWORDS: &[&str] = &[
    "about", "after", "again", "all", "also", "and", "any", "are", "but", "can", "for", "from",
    "had", "has", "have", "her", "hers", "him", "his", "into", "its", "not", "now", "off", "once",
    "one", "only", "our", "out", "over", "she", "than", "that", "the", "their", "them", "then",
    "there", "these", "they", "this", "those", "through", "too", "under", "until", "was", "were",
    "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with", "would",
    "you", "your",
];

/// Most frequent non-stopword words of `text`, lowercased.
///
/// Ties are broken alphabetically so the result is stable.
pub fn extract_keywords(text: &str, max: usize) -> Result<Vec<String>, EnrichmentError> {
    let word = WORD.as_ref().ok_or_else(|| EnrichmentError::Failed {
        reason: "keyword pattern failed to compile".to_string(),
    })?;

    let mut counts: HashMap<String, usize> = HashMap::new();
    for m in word.find_iter(text) {
        let w = m.as_str().trim_matches(|c| c == '\'' || c == '-').to_lowercase();
        if w.len() < 3 || STOPWORDS.contains(&w.as_str()) {
            continue;
        }
        *counts.entry(w).or_insert(0) += 1;
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(ranked.into_iter().take(max).map(|(w, _)| w).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_by_frequency_then_alphabet() {
        let words = extract_keywords("Tide and tide; the storm, the STORM, the tide. Ash.", 3).unwrap();
        assert_eq!(words, vec!["tide", "storm", "ash"]);
    }

    #[test]
    fn empty_text_has_no_keywords() {
        assert!(extract_keywords("", 5).unwrap().is_empty());
        assert!(extract_keywords("a an of", 5).unwrap().is_empty());
    }
}
