use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wordplay devices recognised by the classifier, in registration order.
///
/// Registration order matters: it is the final tie-breaker when two techniques
/// score the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technique {
    Anagram,
    Hidden,
    Reversal,
    Container,
    Insertion,
    Homophone,
    DoubleDefinition,
    Charade,
    Deletion,
    Abbreviation,
    InitialLetters,
    FinalLetters,
    Spoonerism,
    CrypticDefinition,
    LetterSelection,
}

impl Technique {
    pub const ALL: [Technique; 15] = [
        Technique::Anagram,
        Technique::Hidden,
        Technique::Reversal,
        Technique::Container,
        Technique::Insertion,
        Technique::Homophone,
        Technique::DoubleDefinition,
        Technique::Charade,
        Technique::Deletion,
        Technique::Abbreviation,
        Technique::InitialLetters,
        Technique::FinalLetters,
        Technique::Spoonerism,
        Technique::CrypticDefinition,
        Technique::LetterSelection,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Technique::Anagram => "anagram",
            Technique::Hidden => "hidden",
            Technique::Reversal => "reversal",
            Technique::Container => "container",
            Technique::Insertion => "insertion",
            Technique::Homophone => "homophone",
            Technique::DoubleDefinition => "double_definition",
            Technique::Charade => "charade",
            Technique::Deletion => "deletion",
            Technique::Abbreviation => "abbreviation",
            Technique::InitialLetters => "initial_letters",
            Technique::FinalLetters => "final_letters",
            Technique::Spoonerism => "spoonerism",
            Technique::CrypticDefinition => "cryptic_definition",
            Technique::LetterSelection => "letter_selection",
        }
    }

    /// Noun phrase used when two devices are named together.
    pub fn label(self) -> &'static str {
        match self {
            Technique::Anagram => "an anagram",
            Technique::Hidden => "a hidden word",
            Technique::Reversal => "a reversal",
            Technique::Container => "a container",
            Technique::Insertion => "an insertion",
            Technique::Homophone => "a homophone",
            Technique::DoubleDefinition => "a double definition",
            Technique::Charade => "a charade",
            Technique::Deletion => "a deletion",
            Technique::Abbreviation => "an abbreviation",
            Technique::InitialLetters => "initial letters",
            Technique::FinalLetters => "final letters",
            Technique::Spoonerism => "a spoonerism",
            Technique::CrypticDefinition => "a cryptic definition",
            Technique::LetterSelection => "letter selection",
        }
    }

    /// Lowercase phrases scored by the heuristic tier. Each hit is worth the
    /// number of words in the phrase.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Technique::Anagram => &[
                "anagram",
                "anagrammed",
                "anagrind",
                "mixed",
                "mixed up",
                "confused",
                "scrambled",
                "rearranged",
                "jumbled",
                "shuffled",
                "reordered",
                "letters of",
            ],
            Technique::Hidden => &[
                "hidden",
                "hidden in",
                "hidden within",
                "concealed",
                "concealed in",
                "lurking",
                "buried in",
                "some of",
                "part of",
            ],
            Technique::Reversal => &[
                "reversal",
                "reversed",
                "reverse",
                "backwards",
                "back",
                "returned",
                "going up",
                "reflected",
                "read back",
                "turned over",
                "retreating",
            ],
            Technique::Container => &[
                "container",
                "envelope",
                "around",
                "outside",
                "containing",
                "contains",
                "holding",
                "enveloping",
                "embracing",
                "clutching",
                "swallowing",
                "surrounding",
            ],
            Technique::Insertion => &[
                "insertion",
                "inserted",
                "inserted into",
                "inside",
                "put in",
                "goes in",
                "going into",
                "entering",
                "interrupting",
                "placed in",
            ],
            Technique::Homophone => &[
                "homophone",
                "sounds like",
                "sound of",
                "we hear",
                "heard",
                "reportedly",
                "aloud",
                "on the radio",
                "spoken",
            ],
            Technique::DoubleDefinition => &[
                "double definition",
                "two definitions",
                "two meanings",
                "double meaning",
                "dd",
            ],
            Technique::Charade => &[
                "charade",
                "followed by",
                "plus",
                "after",
                "with",
                "then",
                "next to",
                "and then",
                "before",
                "put together",
            ],
            Technique::Deletion => &[
                "deletion",
                "without",
                "removed",
                "dropped",
                "dropping",
                "missing",
                "headless",
                "endless",
                "heartless",
                "beheaded",
                "curtailed",
                "short",
                "lacking",
                "losing",
                "minus",
                "cut",
            ],
            Technique::Abbreviation => &[
                "abbreviation",
                "abbreviated",
                "abbr",
                "short for",
                "stands for",
                "symbol",
                "chemical symbol",
            ],
            Technique::InitialLetters => &[
                "initial letters",
                "first letters",
                "first letter of",
                "initially",
                "leaders",
                "heads of",
                "starts of",
                "initials",
            ],
            Technique::FinalLetters => &[
                "final letters",
                "last letters",
                "last letter of",
                "finally",
                "ultimately",
                "ends of",
                "tails of",
            ],
            Technique::Spoonerism => &["spoonerism", "spooner", "swapping initial sounds"],
            Technique::CrypticDefinition => &[
                "cryptic definition",
                "cryptic def",
                "cd",
                "whimsical definition",
                "cryptically defined",
            ],
            Technique::LetterSelection => &[
                "alternate letters",
                "odd letters",
                "even letters",
                "every other letter",
                "regularly",
                "oddly",
                "evenly",
                "alternately",
                "letter selection",
            ],
        }
    }

    /// Minimum heuristic score before the technique is a candidate at all.
    ///
    /// Deletion and charade keywords are everyday words ("short", "with",
    /// "after") and match nearly every explanation below these thresholds.
    pub fn min_score(self) -> usize {
        match self {
            Technique::Deletion => 3,
            Technique::Charade => 4,
            _ => 1,
        }
    }

    /// Canned level-two hint for the technique.
    pub fn hint(self) -> &'static str {
        match self {
            Technique::Anagram => {
                "This clue uses an anagram: some of the clue's letters need rearranging."
            }
            Technique::Hidden => "The answer is hidden in the clue, spelled out across its words.",
            Technique::Reversal => "This clue involves a reversal: something is read backwards.",
            Technique::Container => "This is a container clue: one part goes around another.",
            Technique::Insertion => "This is an insertion clue: one part goes inside another.",
            Technique::Homophone => "This clue uses a homophone: listen for a word that sounds alike.",
            Technique::DoubleDefinition => {
                "This is a double definition: two separate meanings of the same word."
            }
            Technique::Charade => "This is a charade: build the answer by joining parts in order.",
            Technique::Deletion => "This clue involves a deletion: letters are taken away.",
            Technique::Abbreviation => {
                "This clue relies on abbreviations: look for words with standard short forms."
            }
            Technique::InitialLetters => "Look at the first letters of some words in the clue.",
            Technique::FinalLetters => "Look at the last letters of some words in the clue.",
            Technique::Spoonerism => "This is a spoonerism: swap the initial sounds of two words.",
            Technique::CrypticDefinition => {
                "This is a cryptic definition: the whole clue is a playful description."
            }
            Technique::LetterSelection => {
                "This clue selects letters: take alternate or regularly spaced letters."
            }
        }
    }

    /// Level-three instruction when nothing more specific can be extracted.
    pub fn generic_construction(self) -> &'static str {
        match self {
            Technique::Anagram => {
                "Find the anagram indicator, then rearrange the letters of the words it points to."
            }
            Technique::Hidden => "Look for the answer running across consecutive words of the clue.",
            Technique::Reversal => {
                "Work out the word or abbreviation the wordplay gives you and read it backwards."
            }
            Technique::Container => {
                "Find two pieces in the wordplay and wrap one of them around the other."
            }
            Technique::Insertion => "Find two pieces in the wordplay and put one inside the other.",
            Technique::Homophone => {
                "Say the wordplay part out loud: the answer sounds like another word."
            }
            Technique::DoubleDefinition => {
                "The clue splits into two independent definitions of the same word."
            }
            Technique::Charade => {
                "Build the answer in pieces: each part of the wordplay gives a few letters, joined in order."
            }
            Technique::Deletion => {
                "Something in the wordplay loses one or more letters: work out what is removed."
            }
            Technique::Abbreviation => {
                "Swap one or more clue words for their standard abbreviations."
            }
            Technique::InitialLetters => {
                "Take the first letter of several consecutive words in the clue."
            }
            Technique::FinalLetters => {
                "Take the last letter of several consecutive words in the clue."
            }
            Technique::Spoonerism => {
                "Find two words from the wordplay and swap their initial sounds."
            }
            Technique::CrypticDefinition => {
                "Read the whole clue as a pun rather than a set of instructions."
            }
            Technique::LetterSelection => {
                "Take every other letter from a stretch of the clue, odd or even."
            }
        }
    }

    /// Words in a clue that commonly signal the technique.
    pub fn indicators(self) -> &'static [&'static str] {
        match self {
            Technique::Anagram => ANAGRAM_INDICATORS,
            Technique::Hidden => &[
                "in", "within", "inside", "some", "part", "partly", "held by", "concealed",
                "hiding", "holds", "contained in",
            ],
            Technique::Reversal => &[
                "back", "returned", "returning", "up", "reflected", "retiring", "over",
                "recalled", "retreating", "reversed", "going west", "rising",
            ],
            Technique::Container => &[
                "around", "about", "outside", "holding", "containing", "embracing", "clutching",
                "swallowing", "keeping", "grabbing", "gripping", "hugging", "at heart",
            ],
            Technique::Insertion => &[
                "in", "inside", "within", "into", "entering", "interrupting", "breaking",
                "piercing", "penetrating", "among",
            ],
            Technique::Homophone => &[
                "we hear", "reportedly", "say", "said", "on the radio", "sounds like", "aloud",
                "heard", "so to speak", "broadcast", "for the audience",
            ],
            Technique::DoubleDefinition => &[],
            Technique::Charade => &[
                "with", "after", "before", "then", "by", "next to", "beside", "following",
                "and",
            ],
            Technique::Deletion => &[
                "headless", "beheaded", "topless", "endless", "tailless", "curtailed", "short",
                "heartless", "gutted", "empty", "without", "losing", "dropping", "missing",
            ],
            Technique::Abbreviation => &["briefly", "in short", "shortly", "for short"],
            Technique::InitialLetters => &[
                "initially", "at first", "leaders", "heads", "starts", "first of", "openers",
                "primarily",
            ],
            Technique::FinalLetters => &[
                "finally", "ultimately", "at last", "ends", "tails", "last of", "closing",
            ],
            Technique::Spoonerism => &["spooner", "spooner's"],
            Technique::CrypticDefinition => &[],
            Technique::LetterSelection => &[
                "oddly", "evenly", "regularly", "alternately", "odd", "even", "every other",
            ],
        }
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Technique {
    type Err = UnknownTechnique;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Technique::ALL
            .into_iter()
            .find(|technique| technique.name() == needle)
            .ok_or_else(|| UnknownTechnique(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown technique {0:?}")]
pub struct UnknownTechnique(pub String);

/// Phrases that name a device outright. The first hit wins and skips scoring.
pub const DEFINITIVE_PHRASES: &[(&str, Technique)] = &[
    ("anagram", Technique::Anagram),
    ("double definition", Technique::DoubleDefinition),
    ("homophone", Technique::Homophone),
    ("spoonerism", Technique::Spoonerism),
    ("cryptic definition", Technique::CrypticDefinition),
];

pub const ANAGRAM_INDICATORS: &[&str] = &[
    "mixed",
    "confused",
    "scrambled",
    "rearranged",
    "jumbled",
    "broken",
    "messy",
    "wild",
    "crazy",
    "shuffled",
    "reordered",
    "arranged",
    "novel",
    "new",
    "strange",
    "odd",
    "awful",
    "terrible",
    "bad",
    "badly",
    "upset",
    "disturbed",
    "drunk",
    "mad",
    "crooked",
    "twisted",
    "wrecked",
    "ruined",
    "damaged",
    "destroyed",
    "out",
    "off",
    "loose",
    "free",
    "changed",
    "converted",
    "transformed",
    "revised",
    "designed",
    "cooked",
    "dancing",
    "moving",
    "shaken",
    "stirred",
    "tortured",
    "unusual",
    "involved",
    "complicated",
    "poor",
    "sorted",
    "organised",
    "organized",
    "fancy",
    "wayward",
    "erratic",
    "bizarre",
    "exotic",
    "in a mess",
    "all over the place",
];

/// Which part of a word a deletion removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionKind {
    First,
    Last,
    Middle,
}

impl DeletionKind {
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            DeletionKind::First => &[
                "headless",
                "beheaded",
                "topless",
                "decapitated",
                "leaderless",
                "first letter removed",
                "without its first",
                "losing its first",
                "missing its first",
            ],
            DeletionKind::Last => &[
                "endless",
                "tailless",
                "curtailed",
                "docked",
                "unfinished",
                "cut short",
                "last letter removed",
                "without its last",
                "losing its last",
                "without end",
                "short",
            ],
            DeletionKind::Middle => &[
                "heartless",
                "gutted",
                "disheartened",
                "hollow",
                "empty",
                "emptied",
                "middle removed",
                "without heart",
                "losing its heart",
            ],
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            DeletionKind::First => "remove the first letter",
            DeletionKind::Last => "remove the last letter",
            DeletionKind::Middle => "remove the middle letter or letters",
        }
    }

    pub const ALL: [DeletionKind; 3] = [
        DeletionKind::First,
        DeletionKind::Middle,
        DeletionKind::Last,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique_and_round_trip() {
        let names: HashSet<_> = Technique::ALL.iter().map(|t| t.name()).collect();
        assert_eq!(names.len(), Technique::ALL.len());
        for technique in Technique::ALL {
            assert_eq!(technique.name().parse::<Technique>(), Ok(technique));
        }
        assert_eq!("Double Definition".parse(), Ok(Technique::DoubleDefinition));
        assert!("pangram".parse::<Technique>().is_err());
    }

    #[test]
    fn keywords_are_lowercase() {
        for technique in Technique::ALL {
            for keyword in technique.keywords() {
                assert_eq!(*keyword, keyword.to_lowercase(), "{technique}: {keyword}");
            }
        }
    }

    #[test]
    fn common_word_techniques_need_higher_scores() {
        assert_eq!(Technique::Deletion.min_score(), 3);
        assert_eq!(Technique::Charade.min_score(), 4);
        assert_eq!(Technique::Anagram.min_score(), 1);
    }

    #[test]
    fn canned_phrasing_has_no_uppercase_runs() {
        for technique in Technique::ALL {
            for text in [technique.hint(), technique.generic_construction()] {
                let has_run = text
                    .as_bytes()
                    .windows(2)
                    .any(|w| w[0].is_ascii_uppercase() && w[1].is_ascii_uppercase());
                assert!(!has_run, "{text}");
            }
        }
    }

    #[test]
    fn serde_uses_snake_case_names() {
        let json = serde_json::to_string(&Technique::InitialLetters).unwrap();
        assert_eq!(json, "\"initial_letters\"");
    }
}
