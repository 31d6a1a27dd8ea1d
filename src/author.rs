use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Blogger whose analysis a page was written by. Only affects how upstream
/// definitions are rendered, never the four-level structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorStyle {
    PeterO,
    Verlaine,
    Vinyl,
    Pommers,
    Jackkt,
    BertAndJoyce,
    AlanKd,
    Cornick,
    #[default]
    Generic,
}

impl AuthorStyle {
    /// Known authors in detection priority order.
    pub const KNOWN: [AuthorStyle; 8] = [
        AuthorStyle::PeterO,
        AuthorStyle::Verlaine,
        AuthorStyle::Vinyl,
        AuthorStyle::Pommers,
        AuthorStyle::Jackkt,
        AuthorStyle::BertAndJoyce,
        AuthorStyle::AlanKd,
        AuthorStyle::Cornick,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            AuthorStyle::PeterO => "petero",
            AuthorStyle::Verlaine => "verlaine",
            AuthorStyle::Vinyl => "vinyl",
            AuthorStyle::Pommers => "pommers",
            AuthorStyle::Jackkt => "jackkt",
            AuthorStyle::BertAndJoyce => "bertandjoyce",
            AuthorStyle::AlanKd => "alankd",
            AuthorStyle::Cornick => "cornick",
            AuthorStyle::Generic => "generic",
        }
    }

    /// Whether the author underlines or italicises definitions, making
    /// markup-derived definitions authoritative.
    pub fn marks_definitions(self) -> bool {
        matches!(
            self,
            AuthorStyle::PeterO | AuthorStyle::Verlaine | AuthorStyle::Pommers
        )
    }

    /// Parses a tag, degrading anything unrecognised to [`AuthorStyle::Generic`].
    pub fn from_tag_lossy(tag: &str) -> Self {
        tag.parse().unwrap_or_default()
    }

    fn known_by_tag(tag: &str) -> Option<Self> {
        Self::KNOWN.into_iter().find(|author| author.tag() == tag)
    }
}

impl fmt::Display for AuthorStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown author style {0:?}")]
pub struct ParseAuthorError(pub String);

impl FromStr for AuthorStyle {
    type Err = ParseAuthorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let tag = value.trim().to_ascii_lowercase();
        if tag == AuthorStyle::Generic.tag() {
            return Ok(AuthorStyle::Generic);
        }
        AuthorStyle::known_by_tag(&tag).ok_or_else(|| ParseAuthorError(value.to_string()))
    }
}

// "at 2:29 am by PeterO", "posted on 12 May by verlaine"
static BYLINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:at|posted)\s+.*?\s+by\s+([a-z]+)").expect("valid regex")
});

/// Classifies the analysis author from the page URL and body text.
///
/// A byline naming a known author wins, then any known name in the body,
/// then any known name in the URL. Everything else is generic.
pub fn detect_author(url: &str, content: &str) -> AuthorStyle {
    if let Some(author) = BYLINE
        .captures(content)
        .and_then(|caps| caps.get(1))
        .and_then(|name| AuthorStyle::known_by_tag(&name.as_str().to_ascii_lowercase()))
    {
        return author;
    }

    let content = content.to_lowercase();
    if let Some(author) = AuthorStyle::KNOWN
        .into_iter()
        .find(|author| content.contains(author.tag()))
    {
        return author;
    }

    let url = url.to_lowercase();
    AuthorStyle::KNOWN
        .into_iter()
        .find(|author| url.contains(author.tag()))
        .unwrap_or(AuthorStyle::Generic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byline_beats_url() {
        let author = detect_author(
            "https://www.fifteensquared.net/2024/05/01/vinyl-guardian/",
            "Guardian 29,381 posted at 2:29 am by PeterO",
        );
        assert_eq!(author, AuthorStyle::PeterO);
        assert_eq!(author.tag(), "petero");
    }

    #[test]
    fn name_in_content_without_byline() {
        let author = detect_author(
            "https://www.fifteensquared.net/2024/05/01/guardian-29381/",
            "Thanks to Verlaine for the blog and to the setter.",
        );
        assert_eq!(author, AuthorStyle::Verlaine);
    }

    #[test]
    fn url_is_the_last_resort() {
        let author = detect_author(
            "https://www.fifteensquared.net/2024/05/01/guardian-cryptic-by-vinyl/",
            "A gentle puzzle today.",
        );
        assert_eq!(author, AuthorStyle::Vinyl);
    }

    #[test]
    fn unknown_everything_is_generic() {
        assert_eq!(detect_author("", ""), AuthorStyle::Generic);
        assert_eq!(
            detect_author("https://example.com/post", "posted at noon by somebody"),
            AuthorStyle::Generic
        );
    }

    #[test]
    fn unknown_byline_falls_through_to_content_scan() {
        let author = detect_author("", "posted at 9am by guest. Normally pommers blogs this one.");
        assert_eq!(author, AuthorStyle::Pommers);
    }

    #[test]
    fn content_scan_uses_table_order() {
        let author = detect_author("", "vinyl and petero were both mentioned");
        assert_eq!(author, AuthorStyle::PeterO);
    }

    #[test]
    fn tags_parse_back() {
        for author in AuthorStyle::KNOWN {
            assert_eq!(author.tag().parse(), Ok(author));
        }
        assert_eq!("Generic".parse(), Ok(AuthorStyle::Generic));
        assert!("shirley".parse::<AuthorStyle>().is_err());
        assert_eq!(AuthorStyle::from_tag_lossy("shirley"), AuthorStyle::Generic);
    }
}
