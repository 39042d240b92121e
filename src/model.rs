//! Pack model: packs, categories, questions, players and board cells.
//! Field names match the JSON pack format so documents round-trip unchanged.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ImportError;

/// Default value of the first question in a new category.
pub const DEFAULT_VALUE: i64 = 100;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub value: i64,
    pub question: String,
    pub answer: String,
    /// Chess position shown with the question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Solution line in UCI notation, e.g. `["e2e4", "e7e5"]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moves: Option<Vec<String>>,
}

impl Question {
    pub fn blank(value: i64) -> Self {
        Self {
            value,
            question: String::new(),
            answer: String::new(),
            fen: None,
            image: None,
            moves: None,
        }
    }

    /// FEN to display, ignoring blank strings.
    pub fn position(&self) -> Option<&str> {
        self.fen.as_deref().map(str::trim).filter(|f| !f.is_empty())
    }
}

const IMAGE_SCHEMES: [&str; 2] = ["http://", "https://"];

/// Returns the trimmed URL when it is safe to print: an http or https URL
/// with a host and no control characters. Anything else is never shown.
pub fn safe_image_url(url: &str) -> Option<&str> {
    let url = url.trim();
    let rest = IMAGE_SCHEMES.iter().find_map(|scheme| {
        url.get(..scheme.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(scheme))
            .map(|_| &url[scheme.len()..])
    })?;
    if rest.is_empty() || rest.starts_with('/') || url.chars().any(char::is_control) {
        return None;
    }
    Some(url)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub questions: Vec<Question>,
}

impl Category {
    pub fn blank() -> Self {
        Self {
            name: String::new(),
            questions: vec![Question::blank(DEFAULT_VALUE)],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pack {
    pub title: String,
    pub categories: Vec<Category>,
}

impl Pack {
    /// Starting point for the editor: one category holding one question.
    pub fn blank() -> Self {
        Self {
            title: String::new(),
            categories: vec![Category::blank()],
        }
    }

    pub fn total_questions(&self) -> usize {
        self.categories.iter().map(|c| c.questions.len()).sum()
    }

    pub fn question(&self, cell: Cell) -> Option<&Question> {
        self.categories
            .get(cell.category)
            .and_then(|c| c.questions.get(cell.question))
    }

    /// Every addressable cell, category by category.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.categories.iter().enumerate().flat_map(|(ci, cat)| {
            (0..cat.questions.len()).map(move |qi| Cell::new(ci, qi))
        })
    }

    /// Distinct question values in ascending order; these are the board columns.
    pub fn values(&self) -> Vec<i64> {
        self.categories
            .iter()
            .flat_map(|c| c.questions.iter().map(|q| q.value))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Parses a standalone pack document.
    ///
    /// Rejects anything that is not JSON, and documents without a non-empty
    /// `title` string or a `categories` array.
    pub fn from_json(text: &str) -> Result<Self, ImportError> {
        let doc: Value = serde_json::from_str(text)?;

        let has_title = doc
            .get("title")
            .and_then(Value::as_str)
            .is_some_and(|t| !t.is_empty());
        let has_categories = doc.get("categories").is_some_and(Value::is_array);
        if !has_title || !has_categories {
            return Err(ImportError::MissingFields);
        }

        Ok(serde_json::from_value(doc)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// File name used when exporting, falling back to `pack.json`.
    pub fn export_file_name(&self) -> String {
        let stem: String = self
            .title
            .trim()
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        if stem.trim_matches('_').is_empty() {
            "pack.json".to_string()
        } else {
            format!("{stem}.json")
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub score: i64,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            score: 0,
        }
    }
}

/// Board coordinate: category index, then question index within it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub category: usize,
    pub question: usize,
}

impl Cell {
    pub const fn new(category: usize, question: usize) -> Self {
        Self { category, question }
    }
}

/// Storage key form, `"<category>-<question>"`.
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.category, self.question)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCellError(String);

impl fmt::Display for ParseCellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid cell key '{}'", self.0)
    }
}

impl std::error::Error for ParseCellError {}

impl FromStr for Cell {
    type Err = ParseCellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseCellError(s.to_string());
        let (category, question) = s.split_once('-').ok_or_else(err)?;
        Ok(Self {
            category: category.parse().map_err(|_| err())?,
            question: question.parse().map_err(|_| err())?,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn question(value: i64, text: &str, answer: &str) -> Question {
        Question {
            question: text.to_string(),
            answer: answer.to_string(),
            ..Question::blank(value)
        }
    }

    /// Two categories: "Openings" with 100/200, "Endgames" with 100.
    pub(crate) fn sample_pack() -> Pack {
        Pack {
            title: "Chess Night".to_string(),
            categories: vec![
                Category {
                    name: "Openings".to_string(),
                    questions: vec![
                        question(100, "1.e4 e5 2.Nf3 Nc6 3.Bb5?", "Ruy Lopez"),
                        question(200, "1.d4 Nf6 2.c4 e6 3.Nc3 Bb4?", "Nimzo-Indian"),
                    ],
                },
                Category {
                    name: "Endgames".to_string(),
                    questions: vec![question(100, "K+Q vs K: can White mate?", "Yes")],
                },
            ],
        }
    }

    #[test]
    fn test_cell_key_round_trip() {
        let cell = Cell::new(3, 12);
        assert_eq!(cell.to_string(), "3-12");
        assert_eq!("3-12".parse::<Cell>(), Ok(cell));
    }

    #[test]
    fn test_cell_rejects_malformed_keys() {
        for key in ["", "3", "3-", "-1", "a-b", "1-2-3", "1--2"] {
            assert!(key.parse::<Cell>().is_err(), "accepted {key:?}");
        }
    }

    #[test]
    fn test_pack_counts_and_columns() {
        let pack = sample_pack();
        assert_eq!(pack.total_questions(), 3);
        assert_eq!(pack.values(), vec![100, 200]);
        assert_eq!(pack.cells().count(), 3);
        assert_eq!(pack.question(Cell::new(0, 1)).map(|q| q.value), Some(200));
        assert!(pack.question(Cell::new(1, 1)).is_none());
        assert!(pack.question(Cell::new(5, 0)).is_none());
    }

    #[test]
    fn test_from_json_accepts_minimal_pack() {
        let text = r#"{"title":"T","categories":[{"name":"C","questions":[{"value":100,"question":"Q","answer":"A"}]}]}"#;
        let pack = Pack::from_json(text).unwrap();
        assert_eq!(pack.title, "T");
        assert_eq!(pack.categories[0].questions[0].fen, None);
    }

    #[test]
    fn test_from_json_rejects_non_json() {
        assert!(matches!(Pack::from_json("not json"), Err(ImportError::Json(_))));
    }

    #[test]
    fn test_from_json_requires_title_and_categories() {
        for text in [
            r#"{"categories":[]}"#,
            r#"{"title":"","categories":[]}"#,
            r#"{"title":"T"}"#,
            r#"{"title":"T","categories":{}}"#,
            r#"[1,2,3]"#,
        ] {
            assert!(
                matches!(Pack::from_json(text), Err(ImportError::MissingFields)),
                "accepted {text}"
            );
        }
    }

    #[test]
    fn test_export_omits_absent_optionals() {
        let json = sample_pack().to_json_pretty().unwrap();
        assert!(!json.contains("\"fen\""));
        assert!(!json.contains("\"moves\""));
        assert_eq!(Pack::from_json(&json).unwrap(), sample_pack());
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(sample_pack().export_file_name(), "Chess_Night.json");
        let untitled = Pack {
            title: "  ".to_string(),
            ..sample_pack()
        };
        assert_eq!(untitled.export_file_name(), "pack.json");
    }

    #[test]
    fn test_safe_image_url_allows_http_and_https() {
        assert_eq!(safe_image_url(" https://example.org/board.png "), Some("https://example.org/board.png"));
        assert_eq!(safe_image_url("HTTP://example.org/a.png"), Some("HTTP://example.org/a.png"));
    }

    #[test]
    fn test_safe_image_url_rejects_other_schemes() {
        for url in [
            "",
            "javascript:alert(1)",
            "file:///etc/passwd",
            "data:image/png;base64,AAAA",
            "ftp://example.org/a.png",
            "https://",
            "http:///path",
            "example.org/a.png",
        ] {
            assert_eq!(safe_image_url(url), None, "accepted {url:?}");
        }
    }

    #[test]
    fn test_safe_image_url_rejects_control_characters() {
        assert_eq!(safe_image_url("https://example.org/\x1b[2Ja.png"), None);
        assert_eq!(safe_image_url("https://example.org/a\nb.png"), None);
        assert_eq!(safe_image_url("https://exa\u{7f}mple.org"), None);
    }

    #[test]
    fn test_blank_question_position_ignores_whitespace() {
        let mut q = Question::blank(100);
        q.fen = Some("   ".to_string());
        assert_eq!(q.position(), None);
    }
}
