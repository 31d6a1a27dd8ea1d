//! Deterministic four-level hint assembly.
//!
//! Every level is produced by an ordered ladder of strategies and the first
//! one that returns something wins. Levels one to three are scrubbed of
//! capitalised runs found in the explanation and of any supplied answer.

use crate::author::AuthorStyle;
use crate::classifier::{TechniqueMatch, classify};
use crate::extractor::{GENERIC_CONSTRUCTION, extract};
use crate::lexicon::Technique;
use crate::text::{Scrubber, answer_proxy, densest_paragraph, quoted_fragments, tidy};
use crate::{HintRequest, Hints};
use once_cell::sync::Lazy;
use regex::Regex;

pub const NO_EXPLANATION: &str = "No explanation available.";

const GENERIC_DEFINITION: &str =
    "The definition is usually found at the very start or the very end of the clue.";
const GENERIC_TECHNIQUE: &str =
    "Think about where the definition ends and the wordplay begins, then work out which device the wordplay uses.";

/// Returned when there is nothing at all to work from.
pub const EMPTY_QUADRUPLE: [&str; 4] = [
    "Look at the clue structure: the definition sits at one end and the wordplay fills the rest.",
    "Decide which cryptic device the wordplay uses, such as an anagram, a hidden word or a charade.",
    GENERIC_CONSTRUCTION,
    NO_EXPLANATION,
];

// "Definition: 'to travel'", "the definition is to travel"
static DEFINITION_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\bdefinition\s*(?:is\b|:|=|-)\s*['"\u{2018}\u{201C}]?([^'"\u{2019}\u{201D}.;()\n]{2,60})"#,
    )
    .expect("valid regex")
});
// "double definition: cruel and unkind"
static LABELLED_DOUBLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bdouble\s+definition\s*(?::|=|-)\s*([^.;()\n]{2,80})").expect("valid regex")
});
static DEFINITION_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+and\s+|\s*[,/]\s*").expect("valid regex"));
// Technique labels that end in "definition" and never introduce one.
const DEFINITION_LABELS: [&str; 2] = ["double", "cryptic"];
// "'old' means ...", "'to travel' is the definition"
static QUOTED_MEANING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"['"\u{2018}\u{201C}]([^'"\u{2019}\u{201D}]{2,40})['"\u{2019}\u{201D}]\s*(?:means\b|=|is\s+the\s+definition\b)"#,
    )
    .expect("valid regex")
});

const MAX_DEFINITION_WORDS: usize = 5;

/// Everything the ladders read, computed once per clue.
struct Context<'a> {
    paragraphs: Vec<&'a str>,
    joined: String,
    definitions: Vec<&'a str>,
    author: AuthorStyle,
    answer: Option<&'a str>,
    matches: Vec<TechniqueMatch>,
}

impl<'a> Context<'a> {
    fn new<S: AsRef<str>>(
        paragraphs: &'a [S],
        author: AuthorStyle,
        definitions: &'a [String],
        answer: Option<&'a str>,
    ) -> Self {
        let paragraphs: Vec<&str> = paragraphs
            .iter()
            .map(|p| p.as_ref().trim())
            .filter(|p| !p.is_empty())
            .collect();
        let joined = paragraphs.join(" ");
        let matches = classify(&joined);
        Self {
            paragraphs,
            joined,
            definitions: definitions
                .iter()
                .map(|d| d.trim())
                .filter(|d| !d.is_empty())
                .collect(),
            author,
            answer: answer.map(str::trim).filter(|a| !a.is_empty()),
            matches,
        }
    }

    fn is_double_definition(&self) -> bool {
        self.definitions.len() >= 2
    }

    /// Technique that drives the construction hint.
    fn technique(&self) -> Option<Technique> {
        if self.is_double_definition() {
            Some(Technique::DoubleDefinition)
        } else {
            self.matches.first().map(|m| m.technique)
        }
    }
}

type DefinitionStrategy = fn(&Context<'_>) -> Option<String>;

const DEFINITION_LADDER: &[DefinitionStrategy] = &[
    supplied_definitions,
    labelled_double,
    marked_definition,
    quoted_meaning,
    quoted_candidate,
];

/// Builds the four hints from the explanation alone.
pub fn assemble<S: AsRef<str>>(
    paragraphs: &[S],
    author: AuthorStyle,
    definitions: &[String],
) -> Hints {
    assemble_with_answer(paragraphs, author, definitions, None)
}

/// Like [`assemble`], preferring a known answer over the capitalised-word
/// guess and masking it from the first three levels.
pub fn assemble_with_answer<S: AsRef<str>>(
    paragraphs: &[S],
    author: AuthorStyle,
    definitions: &[String],
    answer: Option<&str>,
) -> Hints {
    let ctx = Context::new(paragraphs, author, definitions, answer);
    if ctx.paragraphs.is_empty() && ctx.definitions.is_empty() {
        let [hint1, hint2, hint3, _] = EMPTY_QUADRUPLE.map(str::to_string);
        return Hints::new(hint1, hint2, hint3, full_explanation(&ctx));
    }

    let scrubber = Scrubber::new(&ctx.paragraphs, ctx.answer);
    let hint1 = scrubber.scrub(&definition_hint(&ctx));
    let hint2 = scrubber.scrub(&technique_hint(&ctx));
    let mut hint3 = scrubber.scrub(&construction_hint(&ctx));
    if hint3 == hint1 || hint3 == hint2 {
        hint3 = scrubber.scrub(
            ctx.technique()
                .map(Technique::generic_construction)
                .filter(|alt| *alt != hint3)
                .unwrap_or(GENERIC_CONSTRUCTION),
        );
    }
    Hints::new(hint1, hint2, hint3, full_explanation(&ctx))
}

/// Runs the deterministic pipeline over a full request.
pub fn assemble_request(request: &HintRequest) -> Hints {
    assemble_with_answer(
        &request.paragraphs,
        request.author,
        &request.definitions,
        request.answer(),
    )
}

fn definition_hint(ctx: &Context<'_>) -> String {
    DEFINITION_LADDER
        .iter()
        .find_map(|strategy| strategy(ctx))
        .unwrap_or_else(|| GENERIC_DEFINITION.to_string())
}

fn supplied_definitions(ctx: &Context<'_>) -> Option<String> {
    match ctx.definitions.as_slice() {
        [] => None,
        [first, second, ..] => Some(format!(
            "Two definitions here: '{first}' and '{second}' both lead to the answer."
        )),
        [only] if ctx.author.marks_definitions() => Some(format!("The definition is '{only}'.")),
        [only] => Some(format!("The definition appears to be '{only}'.")),
    }
}

fn labelled_double(ctx: &Context<'_>) -> Option<String> {
    let caps = LABELLED_DOUBLE.captures(&ctx.joined)?;
    let mut halves = DEFINITION_SEPARATOR
        .split(caps.get(1)?.as_str())
        .map(tidy)
        .filter(|half| !half.is_empty());
    let first = halves.next()?;
    let second = halves.next()?;
    Some(format!("Two definitions here: '{first}' and '{second}' both lead to the answer."))
}

fn marked_definition(ctx: &Context<'_>) -> Option<String> {
    DEFINITION_MARKER
        .captures_iter(&ctx.joined)
        .filter(|caps| {
            let start = caps.get(0).map_or(0, |m| m.start());
            !follows_label(&ctx.joined[..start])
        })
        .find_map(|caps| {
            let phrase = tidy(caps.get(1)?.as_str());
            (!phrase.is_empty()).then(|| format!("The definition is '{phrase}'."))
        })
}

/// Whether the text just before a "definition" marker names a technique.
fn follows_label(before: &str) -> bool {
    let Some(word) = before.split_whitespace().next_back() else {
        return false;
    };
    DEFINITION_LABELS
        .iter()
        .any(|label| word.eq_ignore_ascii_case(label))
}

fn quoted_meaning(ctx: &Context<'_>) -> Option<String> {
    let caps = QUOTED_MEANING.captures(&ctx.joined)?;
    let phrase = tidy(caps.get(1)?.as_str());
    (!phrase.is_empty()).then(|| format!("The definition looks like '{phrase}'."))
}

/// Longest short quoted phrase in the first paragraph; the first wins a tie.
fn quoted_candidate(ctx: &Context<'_>) -> Option<String> {
    let first = ctx.paragraphs.first()?;
    let best = quoted_fragments(first)
        .into_iter()
        .filter(|fragment| fragment.split_whitespace().count() <= MAX_DEFINITION_WORDS)
        .fold(None::<String>, |best, fragment| match best {
            Some(current) if current.len() >= fragment.len() => Some(current),
            _ => Some(fragment),
        })?;
    Some(format!("Look at either end of the clue: '{best}' is the likely definition."))
}

fn technique_hint(ctx: &Context<'_>) -> String {
    if ctx.is_double_definition() {
        return Technique::DoubleDefinition.hint().to_string();
    }
    match ctx.matches.as_slice() {
        [] => GENERIC_TECHNIQUE.to_string(),
        [first, second, ..] if is_compound(first, second) => format!(
            "This clue combines {} and {}.",
            first.technique.label(),
            second.technique.label()
        ),
        [first, ..] => first.technique.hint().to_string(),
    }
}

/// Two heuristic devices of comparable weight.
fn is_compound(first: &TechniqueMatch, second: &TechniqueMatch) -> bool {
    !first.is_definitive()
        && !second.is_definitive()
        && second.score >= 2
        && second.score * 2 >= first.score
}

fn construction_hint(ctx: &Context<'_>) -> String {
    if ctx.paragraphs.is_empty() {
        return ctx
            .technique()
            .map(Technique::generic_construction)
            .unwrap_or(GENERIC_CONSTRUCTION)
            .to_string();
    }
    let fragments = quoted_fragments(&ctx.joined);
    extract(&ctx.joined, &fragments, ctx.technique())
}

fn full_explanation(ctx: &Context<'_>) -> String {
    let mut parts = Vec::new();
    let answer = ctx.answer.or_else(|| answer_proxy(&ctx.joined));
    if let Some(answer) = answer {
        parts.push(format!("Answer: {answer}"));
    }
    match ctx.definitions.as_slice() {
        [] => {}
        [only] => parts.push(format!("Definition: '{only}'")),
        many => {
            let quoted: Vec<String> = many.iter().map(|d| format!("'{d}'")).collect();
            parts.push(format!("Definitions: {}", quoted.join(" and ")));
        }
    }
    match densest_paragraph(&ctx.paragraphs) {
        Some(wordplay) => {
            parts.push(format!("Wordplay: {wordplay}"));
            if ctx.paragraphs.len() > 1 {
                parts.push(format!("Full analysis: {}", ctx.joined));
            }
        }
        None => parts.push(NO_EXPLANATION.to_string()),
    }
    parts.join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::leaks;

    fn defs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn assert_no_leak(paragraphs: &[&str], hints: &Hints) {
        let source = paragraphs.join(" ");
        for level in 1..=3 {
            let hint = hints.level(level).unwrap();
            assert!(!leaks(&source, hint), "level {level} leaked: {hint}");
        }
    }

    #[test]
    fn explicit_anagram_scenario() {
        let paragraphs = ["An anagram of LATE gives a word meaning old."];
        let hints = assemble(&paragraphs, AuthorStyle::Generic, &[]);
        assert!(hints.level(2).unwrap().contains("anagram"));
        assert_eq!(
            hints.level(3),
            Some("Rearrange the 4 letters of the fodder to find the answer.")
        );
        let full = hints.level(4).unwrap();
        assert!(full.contains("LATE"));
        assert!(full.contains("anagram"));
        assert_no_leak(&paragraphs, &hints);
    }

    #[test]
    fn double_definition_scenario() {
        let paragraphs = ["Both meanings apply here."];
        let hints = assemble(&paragraphs, AuthorStyle::Generic, &defs(&["cruel", "unkind"]));
        let first = hints.level(1).unwrap();
        assert!(first.contains("cruel") && first.contains("unkind"));
        assert_eq!(hints.level(2), Some(Technique::DoubleDefinition.hint()));
        assert!(hints.level(4).unwrap().contains("Definitions: 'cruel' and 'unkind'"));
    }

    #[test]
    fn empty_input_gives_fixed_quadruple() {
        let hints = assemble::<&str>(&[], AuthorStyle::Generic, &[]);
        assert!(hints.level(1).unwrap().contains("clue structure"));
        assert_eq!(hints.level(4), Some(NO_EXPLANATION));
        assert!(hints.iter().all(|h| !h.is_empty()));
        let blank = assemble(&["  ", ""], AuthorStyle::PeterO, &[]);
        assert_eq!(blank, hints);
    }

    #[test]
    fn labelled_double_definition_names_both_halves() {
        let paragraphs = ["A double definition: cruel and unkind, MEAN."];
        let hints = assemble(&paragraphs, AuthorStyle::Generic, &[]);
        assert_eq!(
            hints.level(1),
            Some("Two definitions here: 'cruel' and 'unkind' both lead to the answer.")
        );
        assert_eq!(hints.level(2), Some(Technique::DoubleDefinition.hint()));
        assert_no_leak(&paragraphs, &hints);
    }

    #[test]
    fn technique_labels_are_not_definition_markers() {
        let paragraphs = ["Cryptic definition: a whole clue about a PIANO."];
        let hints = assemble(&paragraphs, AuthorStyle::Generic, &[]);
        assert_eq!(hints.level(1), Some(GENERIC_DEFINITION));

        let paragraphs = ["Not a cryptic definition. Definition: 'to travel'. GO + AT."];
        let hints = assemble(&paragraphs, AuthorStyle::Generic, &[]);
        assert_eq!(hints.level(1), Some("The definition is 'to travel'."));
    }

    #[test]
    fn definitions_without_paragraphs() {
        let hints = assemble::<&str>(&[], AuthorStyle::Generic, &defs(&["old"]));
        assert_eq!(hints.level(1), Some("The definition appears to be 'old'."));
        assert_eq!(hints.level(2), Some(GENERIC_TECHNIQUE));
        assert_eq!(hints.level(3), Some(GENERIC_CONSTRUCTION));
        assert_eq!(hints.level(4), Some("Definition: 'old' | No explanation available."));
    }

    #[test]
    fn marking_authors_state_the_definition() {
        let paragraphs = ["GO + AT"];
        let hints = assemble(&paragraphs, AuthorStyle::PeterO, &defs(&["butter"]));
        assert_eq!(hints.level(1), Some("The definition is 'butter'."));
    }

    #[test]
    fn definition_ladder_order() {
        let marked = ["Definition: 'to travel'. GO + AT."];
        let hints = assemble(&marked, AuthorStyle::Generic, &[]);
        assert_eq!(hints.level(1), Some("The definition is 'to travel'."));

        let meaning = ["'old' means aged. An anagram of LATE."];
        let hints = assemble(&meaning, AuthorStyle::Generic, &[]);
        assert_eq!(hints.level(1), Some("The definition looks like 'old'."));

        let quoted = ["EASY ('simple') in GOON ('old comedian')."];
        let hints = assemble(&quoted, AuthorStyle::Generic, &[]);
        assert_eq!(
            hints.level(1),
            Some("Look at either end of the clue: 'old comedian' is the likely definition.")
        );

        let nothing = ["A lovely surface."];
        let hints = assemble(&nothing, AuthorStyle::Generic, &[]);
        assert_eq!(hints.level(1), Some(GENERIC_DEFINITION));
        assert_eq!(hints.level(2), Some(GENERIC_TECHNIQUE));
    }

    #[test]
    fn compound_devices_are_named_together() {
        let paragraphs = ["DOG reversed going up, placed in, inside TAB"];
        let hints = assemble(&paragraphs, AuthorStyle::Generic, &[]);
        assert_eq!(
            hints.level(2),
            Some("This clue combines a reversal and an insertion.")
        );
        assert_no_leak(&paragraphs, &hints);
    }

    #[test]
    fn supplied_answer_wins_and_is_masked() {
        let paragraphs = ["GO + AT gives the answer; 'goat' means butter."];
        let hints = assemble_with_answer(&paragraphs, AuthorStyle::Generic, &[], Some("goat"));
        assert!(hints.level(4).unwrap().starts_with("Answer: goat | "));
        for level in 1..=3 {
            assert!(!hints.level(level).unwrap().to_lowercase().contains("goat"));
        }
    }

    #[test]
    fn answer_proxy_feeds_the_full_explanation() {
        let paragraphs = ["Lovely clue.", "GO + AT = GOAT"];
        let hints = assemble(&paragraphs, AuthorStyle::Generic, &[]);
        assert_eq!(
            hints.level(4),
            Some("Answer: GOAT | Wordplay: GO + AT = GOAT | Full analysis: Lovely clue. GO + AT = GOAT")
        );
        assert_no_leak(&paragraphs, &hints);
    }

    #[test]
    fn full_explanation_carries_every_paragraph() {
        let paragraphs = [
            "A nice clue.",
            "EASY ('simple') in GOON ('old comedian').",
            "Thanks to the setter.",
        ];
        let hints = assemble(&paragraphs, AuthorStyle::Generic, &[]);
        let full = hints.level(4).unwrap();
        for paragraph in paragraphs {
            assert!(full.contains(paragraph));
        }
        assert!(hints.level(1).unwrap().len() < full.len());
        assert_no_leak(&paragraphs, &hints);
    }

    #[test]
    fn construction_never_duplicates_earlier_levels() {
        let paragraphs = ["An anagram of LATE."];
        let hints = assemble(&paragraphs, AuthorStyle::Generic, &[]);
        assert_ne!(hints.level(3), hints.level(1));
        assert_ne!(hints.level(3), hints.level(2));
    }

    #[test]
    fn request_path_matches_direct_call() {
        let request = HintRequest::new(["An anagram of LATE gives a word meaning old."])
            .with_definitions(["old"])
            .with_answer("TALE");
        let direct = assemble_with_answer(
            &request.paragraphs,
            AuthorStyle::Generic,
            &request.definitions,
            Some("TALE"),
        );
        assert_eq!(assemble_request(&request), direct);
    }
}
