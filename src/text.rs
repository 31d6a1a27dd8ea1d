//! Text primitives shared by the deterministic pipeline.

use once_cell::sync::Lazy;
use regex::Regex;

pub const MASK: &str = "[...]";

static UPPERCASE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]{2,}").expect("valid regex"));
static CAPS_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z]{3,}\b").expect("valid regex"));
static CAPS_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z]{2,}\b").expect("valid regex"));

const CONNECTORS: &[&str] = &["gives", "giving", "plus", "=", "+", "leads to", "makes"];

/// Maximal runs of two or more ASCII capitals, in order of appearance.
pub fn uppercase_runs(text: &str) -> Vec<&str> {
    UPPERCASE_RUN.find_iter(text).map(|m| m.as_str()).collect()
}

pub fn has_uppercase_run(text: &str) -> bool {
    UPPERCASE_RUN.is_match(text)
}

/// Longest all-caps word of three or more letters; the first wins a tie.
pub fn answer_proxy(text: &str) -> Option<&str> {
    let mut best: Option<&str> = None;
    for word in CAPS_WORD.find_iter(text).map(|m| m.as_str()) {
        if best.is_none_or(|current| word.len() > current.len()) {
            best = Some(word);
        }
    }
    best
}

/// Ranks a paragraph by how much derivation it carries: capitalised tokens
/// plus structural connectors.
pub fn density(paragraph: &str) -> usize {
    let caps = CAPS_TOKEN.find_iter(paragraph).count();
    let lower = paragraph.to_lowercase();
    let connectors = CONNECTORS
        .iter()
        .filter(|connector| {
            if connector.chars().all(char::is_alphabetic) {
                contains_phrase(&lower, connector)
            } else {
                lower.contains(*connector)
            }
        })
        .count();
    caps + connectors
}

/// The densest paragraph; earlier paragraphs win ties.
pub fn densest_paragraph<S: AsRef<str>>(paragraphs: &[S]) -> Option<&str> {
    let mut best: Option<(&str, usize)> = None;
    for paragraph in paragraphs.iter().map(AsRef::as_ref) {
        if paragraph.trim().is_empty() {
            continue;
        }
        let score = density(paragraph);
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((paragraph, score));
        }
    }
    best.map(|(paragraph, _)| paragraph)
}

/// Whole-phrase search over already lowercased text.
pub fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    find_phrase(haystack, phrase).is_some()
}

/// Like [`contains_phrase`] but allows the match to run on into a longer
/// word, so `anagram` also finds `anagrammed`.
pub fn contains_word_start(haystack: &str, phrase: &str) -> bool {
    !phrase.is_empty()
        && haystack.match_indices(phrase).any(|(idx, _)| {
            !haystack[..idx]
                .chars()
                .next_back()
                .is_some_and(char::is_alphanumeric)
        })
}

/// Byte offset of the first whole-phrase occurrence of `phrase`.
pub fn find_phrase(haystack: &str, phrase: &str) -> Option<usize> {
    if phrase.is_empty() {
        return None;
    }
    haystack.match_indices(phrase).map(|(idx, _)| idx).find(|&idx| {
        let before = haystack[..idx].chars().next_back();
        let after = haystack[idx + phrase.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn closing_quote(open: char) -> Option<char> {
    match open {
        '\'' => Some('\''),
        '"' => Some('"'),
        '\u{2018}' => Some('\u{2019}'),
        '\u{201C}' => Some('\u{201D}'),
        _ => None,
    }
}

const MAX_FRAGMENT_CHARS: usize = 60;

/// Quoted clue fragments such as `'simple'` or `“at heart”`.
///
/// An opening quote must not follow a letter and a closing quote must not be
/// followed by one, so apostrophes in `don't` or `setter's` are skipped.
pub fn quoted_fragments(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut fragments = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let Some(close) = closing_quote(chars[i]) else {
            i += 1;
            continue;
        };
        if i > 0 && chars[i - 1].is_alphanumeric() {
            i += 1;
            continue;
        }
        let start = i + 1;
        let end = (start..chars.len().min(start + MAX_FRAGMENT_CHARS + 1)).find(|&j| {
            chars[j] == close && !chars.get(j + 1).is_some_and(|c| c.is_alphanumeric())
        });
        match end {
            Some(end) if end > start => {
                let fragment: String = chars[start..end].iter().collect();
                let trimmed = fragment.trim();
                if !trimmed.is_empty() && trimmed.chars().any(char::is_alphabetic) {
                    fragments.push(trimmed.to_string());
                }
                i = end + 1;
            }
            _ => i += 1,
        }
    }
    fragments
}

pub fn letter_count(text: &str) -> usize {
    text.chars().filter(|c| c.is_alphabetic()).count()
}

/// Strips surrounding whitespace, quotes, brackets and punctuation.
pub fn tidy(fragment: &str) -> &str {
    fragment.trim_matches(|c: char| {
        c.is_whitespace()
            || matches!(
                c,
                '\'' | '"'
                    | '\u{2018}'
                    | '\u{2019}'
                    | '\u{201C}'
                    | '\u{201D}'
                    | '('
                    | ')'
                    | '.'
                    | ','
                    | ';'
                    | ':'
                    | '!'
                    | '?'
            )
    })
}

/// Masks answer material out of text destined for hint levels one to three.
///
/// Any capitalised run in the output that contains, or is contained in, a
/// capitalised run of the source is replaced with [`MASK`]. A caller-supplied
/// answer is also masked as a whole word in any case.
#[derive(Debug, Clone, Default)]
pub struct Scrubber {
    source_runs: Vec<String>,
    answer: Option<Regex>,
}

impl Scrubber {
    pub fn new<S: AsRef<str>>(paragraphs: &[S], answer: Option<&str>) -> Self {
        let mut source_runs: Vec<String> = Vec::new();
        for paragraph in paragraphs {
            for run in uppercase_runs(paragraph.as_ref()) {
                if !source_runs.iter().any(|known| known == run) {
                    source_runs.push(run.to_string());
                }
            }
        }
        let answer = answer
            .map(|answer| answer.trim())
            .filter(|answer| letter_count(answer) >= 2)
            .and_then(|answer| {
                let pattern = answer
                    .split_whitespace()
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(r"[\s-]*");
                Regex::new(&format!(r"(?i)\b{pattern}\b")).ok()
            });
        Self {
            source_runs,
            answer,
        }
    }

    pub fn source_runs(&self) -> &[String] {
        &self.source_runs
    }

    fn is_leak(&self, run: &str) -> bool {
        self.source_runs
            .iter()
            .any(|source| source.contains(run) || run.contains(source.as_str()))
    }

    pub fn scrub(&self, text: &str) -> String {
        let masked = UPPERCASE_RUN.replace_all(text, |caps: &regex::Captures<'_>| {
            let run = &caps[0];
            if self.is_leak(run) {
                MASK.to_string()
            } else {
                run.to_string()
            }
        });
        match &self.answer {
            Some(answer) => answer.replace_all(&masked, MASK).into_owned(),
            None => masked.into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_uppercase_runs() {
        assert_eq!(
            uppercase_runs("EASY in GOON, then A and DoG"),
            vec!["EASY", "GOON"]
        );
        assert!(!has_uppercase_run("Only Title Case Here"));
    }

    #[test]
    fn answer_proxy_prefers_longest_then_first() {
        assert_eq!(answer_proxy("GO + AT = GOAT"), Some("GOAT"));
        assert_eq!(answer_proxy("CAT and DOG"), Some("CAT"));
        assert_eq!(answer_proxy("no capitals"), None);
        assert_eq!(answer_proxy("OK AT"), None);
    }

    #[test]
    fn density_counts_caps_and_connectors() {
        assert_eq!(density("Nothing to see."), 0);
        assert_eq!(density("GO plus AT gives GOAT"), 5);
        let paragraphs = ["Lovely clue.", "GO + AT = GOAT", ""];
        assert_eq!(densest_paragraph(&paragraphs), Some("GO + AT = GOAT"));
        let blank: [&str; 1] = ["  "];
        assert_eq!(densest_paragraph(&blank), None);
    }

    #[test]
    fn phrase_matching_respects_word_boundaries() {
        assert!(contains_phrase("an anagram of late", "anagram"));
        assert!(!contains_phrase("the cdrom drive", "cd"));
        assert!(contains_phrase("a double definition.", "double definition"));
        assert!(!contains_phrase("without", "with"));
        assert_eq!(find_phrase("with without", "without"), Some(5));
        assert!(contains_word_start("it was anagrammed", "anagram"));
        assert!(!contains_word_start("a pseudoanagram", "anagram"));
    }

    #[test]
    fn quoted_fragments_skip_apostrophes() {
        let text =
            "An envelope ('at heart') of EASY ('simple') in GOON ('old comedian'). Don't worry, it's fine.";
        assert_eq!(
            quoted_fragments(text),
            vec!["at heart", "simple", "old comedian"]
        );
        assert_eq!(
            quoted_fragments("The definition is \u{201C}to travel\u{201D}."),
            vec!["to travel"]
        );
        assert!(quoted_fragments("setter's puzzle isn't hard").is_empty());
    }

    #[test]
    fn tidy_strips_wrapping() {
        assert_eq!(tidy(" 'mixed', "), "mixed");
        assert_eq!(tidy("(simple)."), "simple");
    }

    #[test]
    fn scrubber_masks_related_runs_only() {
        let scrubber = Scrubber::new(&["An anagram of LATE."], None);
        assert_eq!(scrubber.scrub("Rearrange LATE"), "Rearrange [...]");
        assert_eq!(scrubber.scrub("AT then LATER"), "[...] then [...]");
        assert_eq!(scrubber.scrub("BBC radio"), "BBC radio");
    }

    #[test]
    fn scrubber_masks_supplied_answer_in_any_case() {
        let scrubber = Scrubber::new(&["No capitals here."], Some("Tale"));
        assert_eq!(scrubber.scrub("a tale of woe, TALE"), "a [...] of woe, [...]");
        assert_eq!(scrubber.scrub("retaliate"), "retaliate");
    }
}
