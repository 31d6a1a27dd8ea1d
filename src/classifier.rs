use crate::lexicon::{DEFINITIVE_PHRASES, Technique};
use crate::text::{contains_phrase, contains_word_start};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    /// The explanation names the device outright.
    Definitive,
    /// Scored from keyword hits.
    Heuristic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TechniqueMatch {
    pub technique: Technique,
    pub score: usize,
    pub tier: MatchTier,
}

impl TechniqueMatch {
    pub fn confidence(&self) -> f32 {
        match self.tier {
            MatchTier::Definitive => 1.0,
            MatchTier::Heuristic => {
                let score = self.score as f32;
                (score / (score + 2.0)).min(0.9)
            }
        }
    }

    pub fn is_definitive(&self) -> bool {
        self.tier == MatchTier::Definitive
    }
}

/// Ranks the techniques an explanation describes, most likely first.
///
/// A definitive phrase short-circuits to a single match. Otherwise every
/// technique is scored by the word count of each keyword it finds, and
/// techniques below their minimum score are dropped. Ties keep registration
/// order. An empty result means nothing cleared its threshold.
pub fn classify(explanation: &str) -> Vec<TechniqueMatch> {
    let lower = explanation.to_lowercase();
    if let Some(technique) = definitive(&lower) {
        return vec![TechniqueMatch {
            technique,
            score: usize::MAX,
            tier: MatchTier::Definitive,
        }];
    }

    let mut matches: Vec<TechniqueMatch> = Technique::ALL
        .into_iter()
        .filter_map(|technique| {
            let score = keyword_score(&lower, technique);
            (score > 0 && score >= technique.min_score()).then_some(TechniqueMatch {
                technique,
                score,
                tier: MatchTier::Heuristic,
            })
        })
        .collect();
    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches
}

/// The single most likely technique, if any.
pub fn primary(explanation: &str) -> Option<Technique> {
    classify(explanation).first().map(|m| m.technique)
}

fn definitive(lower: &str) -> Option<Technique> {
    DEFINITIVE_PHRASES
        .iter()
        .find(|(phrase, _)| contains_word_start(lower, phrase))
        .map(|(_, technique)| *technique)
}

fn keyword_score(lower: &str, technique: Technique) -> usize {
    technique
        .keywords()
        .iter()
        .filter(|keyword| contains_phrase(lower, keyword))
        .map(|keyword| keyword.split_whitespace().count())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_anagram_beats_busier_charade_wording() {
        let text = "An anagram of LATE after A, with ON then TO before IT, followed by E plus S.";
        assert!(keyword_score(&text.to_lowercase(), Technique::Charade) > 4);
        let matches = classify(text);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].technique, Technique::Anagram);
        assert!(matches[0].is_definitive());
        assert_eq!(matches[0].confidence(), 1.0);
    }

    #[test]
    fn definitive_phrases_match_inflections() {
        assert_eq!(primary("GOD anagrammed"), Some(Technique::Anagram));
        assert_eq!(primary("Two homophones here"), Some(Technique::Homophone));
        assert_eq!(
            primary("A double definition: cruel and unkind"),
            Some(Technique::DoubleDefinition)
        );
    }

    #[test]
    fn common_words_alone_do_not_make_a_charade() {
        // "with" and "after" score 2, short of the charade threshold.
        assert!(classify("Tea with milk after dinner").is_empty());
    }

    #[test]
    fn charade_needs_enough_evidence() {
        let matches = classify("GO followed by AT, plus nothing else, then done.");
        assert_eq!(matches[0].technique, Technique::Charade);
        assert_eq!(matches[0].score, 4);
        assert_eq!(matches[0].tier, MatchTier::Heuristic);
    }

    #[test]
    fn deletion_threshold_filters_a_lone_short() {
        assert!(
            classify("A short clue")
                .iter()
                .all(|m| m.technique != Technique::Deletion)
        );
        let matches = classify("Headless BEAST without its B, dropped");
        assert_eq!(matches[0].technique, Technique::Deletion);
    }

    #[test]
    fn ranks_by_score() {
        let matches = classify("DOG reversed, read back, going up inside CAT");
        assert_eq!(matches[0].technique, Technique::Reversal);
        assert!(matches.iter().any(|m| m.technique == Technique::Insertion));
        assert!(matches[0].score >= matches[1].score);
        assert!(matches[0].confidence() < 1.0);
    }

    #[test]
    fn ties_keep_registration_order() {
        // "hidden" and "reversed" both score 1.
        let matches = classify("hidden and reversed");
        assert_eq!(matches[0].technique, Technique::Hidden);
        assert_eq!(matches[1].technique, Technique::Reversal);
    }

    #[test]
    fn nothing_recognisable_is_empty() {
        assert!(classify("").is_empty());
        assert!(classify("Lovely surface reading.").is_empty());
    }
}
