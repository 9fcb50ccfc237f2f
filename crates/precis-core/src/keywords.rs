use std::collections::HashMap;

use crate::model::TaggedToken;

/// Keywords returned when the caller does not ask for a specific number.
pub const DEFAULT_KEYWORD_COUNT: usize = 5;

/// Rank the keyword-class tokens (nouns, adjectives, verbs) by frequency.
///
/// Surface forms are compared exactly: no case folding, no lemmatization.
/// Ties keep the order in which forms first appear in `tokens`.
pub fn rank_keywords(tokens: &[TaggedToken], num_keywords: usize) -> Vec<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for token in tokens.iter().filter(|t| t.pos.is_keyword_class()) {
        match index.get(token.text.as_str()) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(token.text.as_str(), counts.len());
                counts.push((token.text.as_str(), 1));
            }
        }
    }

    // sort_by is stable, so equal counts stay in first-occurrence order
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    counts
        .into_iter()
        .take(num_keywords)
        .map(|(text, _)| text.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PartOfSpeech::{self, *};

    fn toks(items: &[(&str, PartOfSpeech)]) -> Vec<TaggedToken> {
        items.iter().map(|(t, p)| TaggedToken::new(*t, *p)).collect()
    }

    #[test]
    fn most_frequent_first() {
        let tokens = toks(&[
            ("model", Noun),
            ("runs", Verb),
            ("model", Noun),
            ("fast", Adj),
            ("model", Noun),
            ("runs", Verb),
        ]);
        assert_eq!(rank_keywords(&tokens, 5), vec!["model", "runs", "fast"]);
    }

    #[test]
    fn ties_keep_first_occurrence_order() {
        let tokens = toks(&[
            ("zebra", Noun),
            ("apple", Noun),
            ("quick", Adj),
            ("apple", Noun),
            ("zebra", Noun),
            ("jumps", Verb),
            ("quick", Adj),
        ]);
        assert_eq!(
            rank_keywords(&tokens, 4),
            vec!["zebra", "apple", "quick", "jumps"]
        );
    }

    #[test]
    fn filters_other_classes() {
        let tokens = toks(&[
            ("the", Det),
            ("London", Propn),
            ("is", Aux),
            ("big", Adj),
            (".", Punct),
        ]);
        assert_eq!(rank_keywords(&tokens, 5), vec!["big"]);
    }

    #[test]
    fn surface_forms_are_case_sensitive() {
        let tokens = toks(&[("Data", Noun), ("data", Noun), ("data", Noun)]);
        assert_eq!(rank_keywords(&tokens, 5), vec!["data", "Data"]);
    }

    #[test]
    fn truncates_and_handles_empty() {
        let tokens = toks(&[("a", Noun), ("b", Noun), ("c", Noun)]);
        assert_eq!(rank_keywords(&tokens, 2), vec!["a", "b"]);
        assert!(rank_keywords(&[], 5).is_empty());
        assert!(rank_keywords(&tokens, 0).is_empty());
    }
}
