//! Construction hints: how the answer is put together, without the answer.
//!
//! Each technique has an ordered ladder of strategies. The first one that
//! finds something wins, and every ladder ends in a generic instruction for
//! its technique, so extraction never comes back empty. Output is scrubbed of
//! capitalised runs from the explanation before it is returned.

use crate::lexicon::{ANAGRAM_INDICATORS, DeletionKind, Technique};
use crate::text::{
    Scrubber, contains_phrase, has_uppercase_run, letter_count, tidy, uppercase_runs,
};
use once_cell::sync::Lazy;
use regex::Regex;

/// Level-three text when no technique was recognised.
pub const GENERIC_CONSTRUCTION: &str =
    "Split the clue into definition and wordplay, then work out how the remaining words build the answer piece by piece.";

const TERMINATOR: &str =
    r"(?:\s*[(.,;:!?=+]|\s+(?:gives|giving|to|with|and|plus|in|around|inside|then|for|is|making|means)\b|$)";

fn lazy_regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

static ANAGRAM_OF: Lazy<Regex> = Lazy::new(|| {
    lazy_regex(&format!(
        r"(?i)\banagram\s*(?:\([^)]*\)\s*)?of\s+([a-z][a-z' ]{{0,40}}?){TERMINATOR}"
    ))
});
static ANAGRAM_STAR: Lazy<Regex> = Lazy::new(|| lazy_regex(r"\b([A-Z][A-Z ]*[A-Z])\)?\*"));
static ANAGRAM_PAREN: Lazy<Regex> = Lazy::new(|| {
    lazy_regex(r#"(?i)\banagram\s*\(\s*['"‘“]?([^)'"’”]+?)['"’”]?\s*\)"#)
});
static HIDDEN_IN: Lazy<Regex> = Lazy::new(|| {
    lazy_regex(r"(?i)\b(?:hidden|concealed|lurking|buried)\s+(?:in|within|inside|among)\s+(.{2,60}?)(?:[.;:!?]|$)")
});
static REVERSED: Lazy<Regex> = Lazy::new(|| {
    lazy_regex(r"\b([A-Z][A-Z ]*[A-Z])\s*(?:\([^)]*\)\s*)?(?:reversed|backwards|returned|going up|read back|turned back|upside down)")
});
static REVERSAL_OF: Lazy<Regex> = Lazy::new(|| {
    lazy_regex(&format!(
        r"(?i)\breversal\s*(?:\([^)]*\)\s*)?of\s+([a-z][a-z' ]{{0,40}}?){TERMINATOR}"
    ))
});
static REVERSAL_PAREN: Lazy<Regex> = Lazy::new(|| {
    lazy_regex(r#"(?i)\brevers(?:al|ed)\s*\(\s*['"‘“]([^)'"’”]+)['"’”]\s*\)"#)
});
static CAPS_IN_CAPS: Lazy<Regex> = Lazy::new(|| {
    lazy_regex(r"\b([A-Z]+(?: [A-Z]+)*)\s*(?:\([^)]*\)\s*)?(?:in|inside|within|into|going into|entering)\s+([A-Z]+(?: [A-Z]+)*)\b")
});
static CAPS_AROUND_CAPS: Lazy<Regex> = Lazy::new(|| {
    lazy_regex(r"\b([A-Z]+(?: [A-Z]+)*)\s*(?:\([^)]*\)\s*)?(?:around|round|about|outside|containing|holding|embracing)\s+([A-Z]+(?: [A-Z]+)*)\b")
});
static ENVELOPE_PAREN: Lazy<Regex> = Lazy::new(|| {
    lazy_regex(r#"(?i)\b(?:envelope|container|insertion|inserted|around|inside)\s*\(\s*['"‘“]([^)'"’”]+)['"’”]\s*\)"#)
});
static SOUNDS_LIKE: Lazy<Regex> = Lazy::new(|| {
    lazy_regex(r"(?i)\b(?:sounds like|homophone of|sound of)\s+(.{2,40}?)(?:[.;:!?,]|$)")
});
static CAPS_MINUS_CAPS: Lazy<Regex> = Lazy::new(|| {
    lazy_regex(r"\b([A-Z]{2,})\s*(?:\([^)]*\)\s*)?(?:without|minus|less|losing|dropping|missing)\s+(?:its\s+)?([A-Z]+)\b")
});
static ABBREVIATION_FOR: Lazy<Regex> = Lazy::new(|| {
    lazy_regex(r#"(?i)\b(?:abbreviation|abbr\.?|short)\s+(?:for|of)\s+['"‘“]?([a-z][a-z ]{1,30}?)['"’”]?(?:[.,;:)]|\s+(?:and|plus|with|in)\b|$)"#)
});
static FIRST_LETTERS_OF: Lazy<Regex> = Lazy::new(|| {
    lazy_regex(r"(?i)\b(?:first|initial|opening)\s+letters?\s+of\s+(.{2,60}?)(?:[.;:!?]|$)")
});
static LAST_LETTERS_OF: Lazy<Regex> = Lazy::new(|| {
    lazy_regex(r"(?i)\b(?:last|final|closing|end)\s+letters?\s+of\s+(.{2,60}?)(?:[.;:!?]|$)")
});
static ALTERNATE_LETTERS_OF: Lazy<Regex> = Lazy::new(|| {
    lazy_regex(r"(?i)\b(odd|even|alternate)\s+letters\s+of\s+(.{2,60}?)(?:[.;:!?]|$)")
});
static SENTENCE_SPLIT: Lazy<Regex> = Lazy::new(|| lazy_regex(r"[.;!?]\s+"));
static CAPS_TOKEN: Lazy<Regex> = Lazy::new(|| lazy_regex(r"\b[A-Z]{2,}\b"));

/// What a strategy gets to look at.
pub struct Extraction<'a> {
    text: &'a str,
    lower: String,
    fragments: &'a [String],
}

impl<'a> Extraction<'a> {
    pub fn new(text: &'a str, fragments: &'a [String]) -> Self {
        Self {
            text,
            lower: text.to_lowercase(),
            fragments,
        }
    }

    fn capture(&self, regex: &Regex, group: usize) -> Option<&'a str> {
        regex
            .captures(self.text)
            .and_then(|caps| caps.get(group))
            .map(|m| tidy(m.as_str()))
            .filter(|value| !value.is_empty())
    }

    /// Like `capture`, but rejects phrases such as "the letters" that only
    /// point back at the clue.
    fn capture_content(&self, regex: &Regex, group: usize) -> Option<&'a str> {
        self.capture(regex, group).filter(|value| !is_filler(value))
    }

    /// First quoted fragment that reads as one of `indicators`.
    fn fragment_indicator(&self, indicators: &[&str]) -> Option<&'a str> {
        self.fragments.iter().map(|f| tidy(f)).find(|fragment| {
            let lower = fragment.to_lowercase();
            indicators.iter().any(|ind| contains_phrase(&lower, ind))
        })
    }

    /// Indicator phrase found anywhere in the prose.
    fn text_indicator(&self, indicators: &[&'static str], min_len: usize) -> Option<&'static str> {
        indicators
            .iter()
            .copied()
            .filter(|ind| ind.len() >= min_len)
            .find(|ind| contains_phrase(&self.lower, ind))
    }

    fn clean_fragments(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.fragments
            .iter()
            .map(|f| tidy(f))
            .filter(|f| !f.is_empty() && !has_uppercase_run(f))
    }
}

pub type Strategy = fn(&Extraction<'_>) -> Option<String>;

const FILLER_WORDS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "its", "it", "of", "letter", "letters",
    "word", "words", "clue", "clue's", "surface", "phrase", "answer", "whole", "rest",
];

fn is_filler(phrase: &str) -> bool {
    phrase
        .split_whitespace()
        .all(|word| FILLER_WORDS.iter().any(|filler| word.eq_ignore_ascii_case(filler)))
}

/// Builds the construction hint for `technique` from the explanation.
pub fn extract(explanation: &str, fragments: &[String], technique: Option<Technique>) -> String {
    let scrubber = Scrubber::new(&[explanation], None);
    let raw = match technique {
        Some(technique) => {
            let extraction = Extraction::new(explanation, fragments);
            run_ladder(&extraction, strategies(technique))
                .unwrap_or_else(|| technique.generic_construction().to_string())
        }
        None => GENERIC_CONSTRUCTION.to_string(),
    };
    scrubber.scrub(&raw)
}

pub fn run_ladder(extraction: &Extraction<'_>, ladder: &[Strategy]) -> Option<String> {
    ladder
        .iter()
        .find_map(|strategy| strategy(extraction))
        .filter(|hint| !hint.trim().is_empty())
}

const ANAGRAM_LADDER: &[Strategy] = &[
    anagram_indicator_and_fodder,
    anagram_fodder,
    anagram_indicator,
];
const HIDDEN_LADDER: &[Strategy] = &[hidden_place, hidden_fragment];
const REVERSAL_LADDER: &[Strategy] = &[
    reversal_indicator_and_component,
    reversal_component,
    reversal_indicator,
];
const CONTAINER_LADDER: &[Strategy] = &[container_pieces, container_indicator];
const INSERTION_LADDER: &[Strategy] = &[insertion_pieces, insertion_indicator];
const HOMOPHONE_LADDER: &[Strategy] = &[homophone_target, homophone_indicator];
const DOUBLE_DEFINITION_LADDER: &[Strategy] =
    &[double_definition_pair, double_definition_single];
const CHARADE_LADDER: &[Strategy] = &[charade_pieces, charade_fragments];
const DELETION_LADDER: &[Strategy] = &[deletion_kind_fragment, deletion_pieces, deletion_kind];
const ABBREVIATION_LADDER: &[Strategy] = &[abbreviation_source, abbreviation_fragment];
const INITIAL_LETTERS_LADDER: &[Strategy] = &[initial_letters_place, initial_letters_indicator];
const FINAL_LETTERS_LADDER: &[Strategy] = &[final_letters_place, final_letters_indicator];
const SPOONERISM_LADDER: &[Strategy] = &[spoonerism_fragments];
const CRYPTIC_DEFINITION_LADDER: &[Strategy] = &[cryptic_definition_fragment];
const LETTER_SELECTION_LADDER: &[Strategy] =
    &[letter_selection_place, letter_selection_indicator];

/// Specific-to-generic strategies for a technique, excluding the final
/// generic instruction.
pub fn strategies(technique: Technique) -> &'static [Strategy] {
    match technique {
        Technique::Anagram => ANAGRAM_LADDER,
        Technique::Hidden => HIDDEN_LADDER,
        Technique::Reversal => REVERSAL_LADDER,
        Technique::Container => CONTAINER_LADDER,
        Technique::Insertion => INSERTION_LADDER,
        Technique::Homophone => HOMOPHONE_LADDER,
        Technique::DoubleDefinition => DOUBLE_DEFINITION_LADDER,
        Technique::Charade => CHARADE_LADDER,
        Technique::Deletion => DELETION_LADDER,
        Technique::Abbreviation => ABBREVIATION_LADDER,
        Technique::InitialLetters => INITIAL_LETTERS_LADDER,
        Technique::FinalLetters => FINAL_LETTERS_LADDER,
        Technique::Spoonerism => SPOONERISM_LADDER,
        Technique::CrypticDefinition => CRYPTIC_DEFINITION_LADDER,
        Technique::LetterSelection => LETTER_SELECTION_LADDER,
    }
}

fn is_capitalised(piece: &str) -> bool {
    piece.chars().any(char::is_uppercase) && !piece.chars().any(char::is_lowercase)
}

/// Renders fodder or a component without copying capitalised letters.
fn describe_piece(piece: &str) -> String {
    let piece = tidy(piece);
    if is_capitalised(piece) || has_uppercase_run(piece) {
        format!("{}-letter", letter_count(piece))
    } else {
        format!("'{piece}'")
    }
}

fn describe_fodder(fodder: &str) -> String {
    let fodder = tidy(fodder);
    if has_uppercase_run(fodder) {
        format!("the {} letters of the fodder", letter_count(fodder))
    } else {
        format!("the letters of '{fodder}'")
    }
}

fn piece_phrase(piece: &str) -> String {
    let described = describe_piece(piece);
    if described.starts_with('\'') {
        described
    } else {
        format!("a {described} piece")
    }
}

// Anagram

fn anagram_fodder_text<'a>(ex: &Extraction<'a>) -> Option<&'a str> {
    ex.capture_content(&ANAGRAM_OF, 1)
        .or_else(|| ex.capture(&ANAGRAM_STAR, 1))
}

fn anagram_indicator_text<'a>(ex: &Extraction<'a>) -> Option<&'a str> {
    ex.capture(&ANAGRAM_PAREN, 1)
        .or_else(|| ex.fragment_indicator(ANAGRAM_INDICATORS))
        .or_else(|| ex.text_indicator(ANAGRAM_INDICATORS, 5))
}

fn anagram_indicator_and_fodder(ex: &Extraction<'_>) -> Option<String> {
    let fodder = anagram_fodder_text(ex)?;
    let indicator = anagram_indicator_text(ex)?;
    Some(format!(
        "'{indicator}' is the anagram indicator: rearrange {}.",
        describe_fodder(fodder)
    ))
}

fn anagram_fodder(ex: &Extraction<'_>) -> Option<String> {
    let fodder = anagram_fodder_text(ex)?;
    Some(format!("Rearrange {} to find the answer.", describe_fodder(fodder)))
}

fn anagram_indicator(ex: &Extraction<'_>) -> Option<String> {
    let indicator = anagram_indicator_text(ex)?;
    Some(format!(
        "'{indicator}' is the anagram indicator: find the fodder next to it and rearrange its letters."
    ))
}

// Hidden word

fn hidden_place(ex: &Extraction<'_>) -> Option<String> {
    let place = ex.capture_content(&HIDDEN_IN, 1)?;
    if has_uppercase_run(place) {
        return None;
    }
    Some(format!("Look for the answer hidden inside '{place}'."))
}

fn hidden_fragment(ex: &Extraction<'_>) -> Option<String> {
    let fragment = ex.clean_fragments().next()?;
    Some(format!("The answer is hiding in plain sight, probably within '{fragment}'."))
}

// Reversal

fn reversal_component_text<'a>(ex: &Extraction<'a>) -> Option<&'a str> {
    ex.capture(&REVERSED, 1)
        .or_else(|| ex.capture_content(&REVERSAL_OF, 1))
}

fn reversal_indicator_text<'a>(ex: &Extraction<'a>) -> Option<&'a str> {
    ex.capture(&REVERSAL_PAREN, 1)
        .or_else(|| ex.fragment_indicator(Technique::Reversal.indicators()))
}

fn reversal_indicator_and_component(ex: &Extraction<'_>) -> Option<String> {
    let component = reversal_component_text(ex)?;
    let indicator = reversal_indicator_text(ex)?;
    Some(format!(
        "'{indicator}' signals a reversal: write {} backwards.",
        piece_phrase(component)
    ))
}

fn reversal_component(ex: &Extraction<'_>) -> Option<String> {
    let component = reversal_component_text(ex)?;
    Some(format!(
        "Part of the wordplay, {}, is written backwards.",
        piece_phrase(component)
    ))
}

fn reversal_indicator(ex: &Extraction<'_>) -> Option<String> {
    let indicator = reversal_indicator_text(ex)?;
    Some(format!("'{indicator}' signals that part of the wordplay is read backwards."))
}

// Container and insertion

/// (outer, inner) pieces, whichever way round the explanation puts them.
fn nested_pieces<'a>(ex: &Extraction<'a>) -> Option<(&'a str, &'a str)> {
    if let Some(caps) = CAPS_IN_CAPS.captures(ex.text) {
        return Some((caps.get(2)?.as_str(), caps.get(1)?.as_str()));
    }
    let caps = CAPS_AROUND_CAPS.captures(ex.text)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

fn nesting_indicator<'a>(ex: &Extraction<'a>, technique: Technique) -> Option<&'a str> {
    ex.capture(&ENVELOPE_PAREN, 1)
        .or_else(|| ex.fragment_indicator(technique.indicators()))
}

fn container_pieces(ex: &Extraction<'_>) -> Option<String> {
    let (outer, inner) = nested_pieces(ex)?;
    Some(format!(
        "Wrap {} around {}.",
        piece_phrase(outer),
        piece_phrase(inner)
    ))
}

fn container_indicator(ex: &Extraction<'_>) -> Option<String> {
    let indicator = nesting_indicator(ex, Technique::Container)?;
    Some(format!("'{indicator}' tells you one part of the wordplay goes around another."))
}

fn insertion_pieces(ex: &Extraction<'_>) -> Option<String> {
    let (outer, inner) = nested_pieces(ex)?;
    Some(format!(
        "Put {} inside {}.",
        piece_phrase(inner),
        piece_phrase(outer)
    ))
}

fn insertion_indicator(ex: &Extraction<'_>) -> Option<String> {
    let indicator = nesting_indicator(ex, Technique::Insertion)?;
    Some(format!("'{indicator}' tells you one part of the wordplay goes inside another."))
}

// Homophone

fn homophone_target(ex: &Extraction<'_>) -> Option<String> {
    let target = ex.capture(&SOUNDS_LIKE, 1)?;
    if has_uppercase_run(target) {
        Some(format!(
            "The answer sounds like a {}-letter word from the wordplay.",
            letter_count(target)
        ))
    } else {
        Some(format!("The answer sounds like '{target}'."))
    }
}

fn homophone_indicator(ex: &Extraction<'_>) -> Option<String> {
    let indicators = Technique::Homophone.indicators();
    let indicator = ex
        .fragment_indicator(indicators)
        .or_else(|| ex.text_indicator(indicators, 5))?;
    Some(format!(
        "'{indicator}' is the homophone indicator: think about how a word sounds, not how it is spelled."
    ))
}

// Double definition

fn double_definition_pair(ex: &Extraction<'_>) -> Option<String> {
    let mut fragments = ex.clean_fragments();
    let first = fragments.next()?;
    let second = fragments.find(|f| !f.eq_ignore_ascii_case(first))?;
    Some(format!("Find one word that fits both '{first}' and '{second}'."))
}

fn double_definition_single(ex: &Extraction<'_>) -> Option<String> {
    let first = ex.clean_fragments().next()?;
    Some(format!(
        "One meaning is '{first}'; the rest of the clue gives a second, independent meaning."
    ))
}

// Charade

fn charade_pieces(ex: &Extraction<'_>) -> Option<String> {
    SENTENCE_SPLIT
        .split(ex.text)
        .filter_map(|sentence| {
            let lower = sentence.to_lowercase();
            let joined = sentence.contains('+')
                || ["plus", "followed by", "then", "after", "and"]
                    .iter()
                    .any(|connector| contains_phrase(&lower, connector));
            if !joined {
                return None;
            }
            let mut pieces = CAPS_TOKEN.find_iter(sentence).count();
            if sentence.contains('=')
                || contains_phrase(&lower, "gives")
                || contains_phrase(&lower, "giving")
            {
                pieces = pieces.saturating_sub(1);
            }
            (pieces >= 2).then_some(pieces)
        })
        .next()
        .map(|pieces| format!("Build the answer from {pieces} pieces placed one after another."))
}

fn charade_fragments(ex: &Extraction<'_>) -> Option<String> {
    let mut fragments = ex.clean_fragments();
    let first = fragments.next()?;
    let second = fragments.next()?;
    Some(format!("Work out short words for '{first}' and '{second}', then join them in order."))
}

// Deletion

fn deletion_kind_of(ex: &Extraction<'_>) -> Option<(DeletionKind, &'static str)> {
    DeletionKind::ALL.into_iter().find_map(|kind| {
        kind.keywords()
            .iter()
            .find(|keyword| contains_phrase(&ex.lower, keyword))
            .map(|keyword| (kind, *keyword))
    })
}

fn deletion_kind_fragment(ex: &Extraction<'_>) -> Option<String> {
    let (kind, _) = deletion_kind_of(ex)?;
    let fragment = ex.fragment_indicator(kind.keywords())?;
    Some(format!("'{fragment}' tells you to {}.", kind.instruction()))
}

fn deletion_pieces(ex: &Extraction<'_>) -> Option<String> {
    let caps = CAPS_MINUS_CAPS.captures(ex.text)?;
    let whole = letter_count(caps.get(1)?.as_str());
    let removed = letter_count(caps.get(2)?.as_str());
    let unit = if removed == 1 { "letter" } else { "letters" };
    Some(format!("Start from a {whole}-letter word and take away {removed} {unit}."))
}

fn deletion_kind(ex: &Extraction<'_>) -> Option<String> {
    let (kind, keyword) = deletion_kind_of(ex)?;
    Some(format!(
        "The explanation calls it {keyword}: {} of a word from the wordplay.",
        kind.instruction()
    ))
}

// Abbreviation

fn abbreviation_source(ex: &Extraction<'_>) -> Option<String> {
    let source = ex.capture(&ABBREVIATION_FOR, 1)?;
    if has_uppercase_run(source) {
        return None;
    }
    Some(format!("'{source}' is shortened to a standard abbreviation."))
}

fn abbreviation_fragment(ex: &Extraction<'_>) -> Option<String> {
    let fragment = ex.clean_fragments().next()?;
    Some(format!(
        "Look for a standard abbreviation: '{fragment}' can be shortened to a letter or two."
    ))
}

// Initial, final and alternate letters

fn letters_place<'a>(ex: &Extraction<'a>, regex: &Regex) -> Option<&'a str> {
    ex.capture(regex, 1).filter(|place| !has_uppercase_run(place))
}

fn initial_letters_place(ex: &Extraction<'_>) -> Option<String> {
    let place = letters_place(ex, &FIRST_LETTERS_OF)?;
    Some(format!("Take the first letters of '{place}'."))
}

fn initial_letters_indicator(ex: &Extraction<'_>) -> Option<String> {
    let indicator = ex.fragment_indicator(Technique::InitialLetters.indicators())?;
    Some(format!("'{indicator}' tells you to take first letters."))
}

fn final_letters_place(ex: &Extraction<'_>) -> Option<String> {
    let place = letters_place(ex, &LAST_LETTERS_OF)?;
    Some(format!("Take the last letters of '{place}'."))
}

fn final_letters_indicator(ex: &Extraction<'_>) -> Option<String> {
    let indicator = ex.fragment_indicator(Technique::FinalLetters.indicators())?;
    Some(format!("'{indicator}' tells you to take last letters."))
}

fn letter_selection_place(ex: &Extraction<'_>) -> Option<String> {
    let caps = ALTERNATE_LETTERS_OF.captures(ex.text)?;
    let which = caps.get(1)?.as_str().to_lowercase();
    let place = tidy(caps.get(2)?.as_str());
    if place.is_empty() || has_uppercase_run(place) {
        return None;
    }
    Some(format!("Take the {which} letters of '{place}'."))
}

fn letter_selection_indicator(ex: &Extraction<'_>) -> Option<String> {
    let indicator = ex.fragment_indicator(Technique::LetterSelection.indicators())?;
    Some(format!("'{indicator}' points to a regular selection of letters."))
}

// Spoonerism and cryptic definition

fn spoonerism_fragments(ex: &Extraction<'_>) -> Option<String> {
    let mut fragments = ex
        .clean_fragments()
        .filter(|f| !f.to_lowercase().starts_with("spooner"));
    let first = fragments.next()?;
    let second = fragments.next()?;
    Some(format!("Swap the opening sounds of words suggested by '{first}' and '{second}'."))
}

fn cryptic_definition_fragment(ex: &Extraction<'_>) -> Option<String> {
    let fragment = ex.clean_fragments().next()?;
    Some(format!("Read the clue as a playful description: '{fragment}' is the key to the pun."))
}

/// True if `hint` copies a capitalised run from `explanation`.
pub fn leaks(explanation: &str, hint: &str) -> bool {
    uppercase_runs(explanation)
        .into_iter()
        .any(|run| hint.contains(run))
}
