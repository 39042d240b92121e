//! Chess study PGN → pack conversion.
//!
//! Every chapter carrying both a `ChapterName` and a `FEN` tag becomes one
//! question. `ChapterName "Rook endings (200)"` files the question under
//! "Rook endings" worth 200; without a value in parentheses it is worth 100.

use std::ops::ControlFlow;
use std::sync::LazyLock;

use pgn_reader::{RawComment, RawTag, Reader, SanPlus, Skip, Visitor};
use regex::Regex;
use shakmaty::Color;
use tracing::{debug, info};

use crate::error::ImportError;
use crate::fen;
use crate::model::{Category, DEFAULT_VALUE, Pack, Question};

static CHAPTER_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?)\s*\((\d+)\)\s*$").expect("valid chapter value regex")
});

/// Placeholder answer for chapters with neither comment nor moves.
const NO_ANSWER: &str = "—";

#[derive(Default)]
struct ChapterTags {
    study_name: Option<String>,
    chapter_name: Option<String>,
    fen: Option<String>,
}

#[derive(Default)]
struct Chapter {
    tags: ChapterTags,
    comment: Option<String>,
    line: Vec<SanPlus>,
}

struct StudyVisitor;

fn tag_text(value: RawTag<'_>) -> Option<String> {
    let text = String::from_utf8_lossy(value.as_bytes()).trim().to_string();
    (!text.is_empty()).then_some(text)
}

impl Visitor for StudyVisitor {
    type Tags = ChapterTags;
    type Movetext = Chapter;
    type Output = Chapter;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(ChapterTags::default())
    }

    fn tag(&mut self, tags: &mut Self::Tags, key: &[u8], value: RawTag<'_>) -> ControlFlow<Self::Output> {
        let slot = match key {
            b"StudyName" => &mut tags.study_name,
            b"ChapterName" => &mut tags.chapter_name,
            b"FEN" => &mut tags.fen,
            _ => return ControlFlow::Continue(()),
        };
        *slot = tag_text(value);
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        ControlFlow::Continue(Chapter {
            tags,
            ..Chapter::default()
        })
    }

    fn begin_variation(&mut self, _: &mut Self::Movetext) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn san(&mut self, chapter: &mut Self::Movetext, san: SanPlus) -> ControlFlow<Self::Output> {
        chapter.line.push(san);
        ControlFlow::Continue(())
    }

    fn comment(&mut self, chapter: &mut Self::Movetext, comment: RawComment<'_>) -> ControlFlow<Self::Output> {
        if chapter.comment.is_none() {
            let text = String::from_utf8_lossy(comment.as_bytes());
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if !text.is_empty() {
                chapter.comment = Some(text);
            }
        }
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, chapter: Self::Movetext) -> Self::Output {
        chapter
    }
}

/// `"Theme (200)"` → `("Theme", 200)`; anything else is worth the default.
pub fn split_chapter_name(name: &str) -> (String, i64) {
    CHAPTER_VALUE
        .captures(name)
        .and_then(|caps| Some((caps[1].trim().to_string(), caps[2].parse().ok()?)))
        .unwrap_or_else(|| (name.trim().to_string(), DEFAULT_VALUE))
}

fn prompt_for(fen: &str) -> &'static str {
    match fen::side_to_move(fen) {
        Ok(Color::White) => "White to move",
        Ok(Color::Black) => "Black to move",
        Err(_) => "Find the best move",
    }
}

/// Mainline in numbered SAN, continuing the FEN's move counter.
fn numbered_line(fen: &str, line: &[SanPlus]) -> String {
    let mut number: u32 = fen
        .split_whitespace()
        .nth(5)
        .and_then(|n| n.parse().ok())
        .unwrap_or(1);
    let mut white = !matches!(fen::side_to_move(fen), Ok(Color::Black));

    let mut parts = Vec::with_capacity(line.len() + line.len() / 2 + 1);
    for (i, san) in line.iter().enumerate() {
        if white {
            parts.push(format!("{number}."));
        } else if i == 0 {
            parts.push(format!("{number}..."));
        }
        parts.push(san.to_string());
        if !white {
            number += 1;
        }
        white = !white;
    }
    parts.join(" ")
}

fn chapter_question(chapter: &Chapter, fen: &str, value: i64) -> Question {
    let answer = match &chapter.comment {
        Some(comment) => comment.clone(),
        None if !chapter.line.is_empty() => numbered_line(fen, &chapter.line),
        None => NO_ANSWER.to_string(),
    };

    let moves = if chapter.line.is_empty() {
        None
    } else {
        match fen::san_line_to_uci(fen, &chapter.line) {
            Ok(moves) => Some(moves),
            Err(e) => {
                debug!(error = %e, "mainline does not replay, keeping text answer only");
                None
            }
        }
    };

    Question {
        value,
        question: prompt_for(fen).to_string(),
        answer,
        fen: Some(fen.to_string()),
        image: None,
        moves,
    }
}

/// Converts a study export. `fallback_title` names the pack when no chapter
/// carries a `StudyName` tag.
pub fn study_to_pack(pgn: &str, fallback_title: &str) -> Result<Pack, ImportError> {
    let mut reader = Reader::new(pgn.as_bytes());
    let mut visitor = StudyVisitor;

    let mut title: Option<String> = None;
    let mut categories: Vec<Category> = Vec::new();
    let mut skipped = 0usize;

    while let Some(chapter) = reader.read_game(&mut visitor)? {
        let (Some(name), Some(fen)) = (&chapter.tags.chapter_name, &chapter.tags.fen) else {
            skipped += 1;
            continue;
        };

        if title.is_none() {
            title = Some(
                chapter
                    .tags
                    .study_name
                    .clone()
                    .unwrap_or_else(|| fallback_title.to_string()),
            );
        }

        let (category, value) = split_chapter_name(name);
        let question = chapter_question(&chapter, fen, value);
        match categories.iter_mut().find(|c| c.name == category) {
            Some(existing) => existing.questions.push(question),
            None => categories.push(Category {
                name: category,
                questions: vec![question],
            }),
        }
    }

    if categories.is_empty() {
        return Err(ImportError::NoChapters);
    }

    for category in &mut categories {
        category.questions.sort_by_key(|q| q.value);
    }

    let pack = Pack {
        title: title.unwrap_or_else(|| fallback_title.to_string()),
        categories,
    };
    info!(
        title = %pack.title,
        categories = pack.categories.len(),
        questions = pack.total_questions(),
        skipped,
        "converted study"
    );
    Ok(pack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_pack;

    const STUDY: &str = r#"[Event "Mates: Back rank"]
[StudyName "Mating Patterns"]
[ChapterName "Back rank (200)"]
[FEN "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1"]

1. Ra8# *

[Event "Mates: Mirror"]
[StudyName "Mating Patterns"]
[ChapterName "Back rank (100)"]
[FEN "r5k1/8/8/8/8/8/5PPP/6K1 b - - 0 12"]

{ Rook to the first rank } 12... Ra1# *

[Event "Mates: Opening"]
[StudyName "Mating Patterns"]
[ChapterName "Openings"]
[FEN "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"]

*

[Event "Mates: Intro"]
[StudyName "Mating Patterns"]
[ChapterName "Introduction"]

1. e4 *

[Event "Mates: Broken"]
[StudyName "Mating Patterns"]
[ChapterName "Openings (300)"]
[FEN "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"]

1. e5 *
"#;

    #[test]
    fn test_split_chapter_name() {
        assert_eq!(split_chapter_name("Rook endings (200)"), ("Rook endings".to_string(), 200));
        assert_eq!(split_chapter_name("  Tactics  "), ("Tactics".to_string(), 100));
        assert_eq!(split_chapter_name("Traps (x)"), ("Traps (x)".to_string(), 100));
        assert_eq!(
            split_chapter_name("Huge (99999999999999999999)"),
            ("Huge (99999999999999999999)".to_string(), 100)
        );
    }

    #[test]
    fn test_study_conversion() {
        let pack = study_to_pack(STUDY, "fallback").unwrap();
        assert_eq!(pack.title, "Mating Patterns");

        let names: Vec<&str> = pack.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Back rank", "Openings"]);

        let back_rank = &pack.categories[0].questions;
        assert_eq!(back_rank.iter().map(|q| q.value).collect::<Vec<_>>(), vec![100, 200]);

        let black = &back_rank[0];
        assert_eq!(black.question, "Black to move");
        assert_eq!(black.answer, "Rook to the first rank");
        assert_eq!(black.moves, Some(vec!["a8a1".to_string()]));

        let white = &back_rank[1];
        assert_eq!(white.question, "White to move");
        assert_eq!(white.answer, "1. Ra8#");
        assert_eq!(white.moves, Some(vec!["a1a8".to_string()]));
    }

    #[test]
    fn test_chapters_without_moves_or_legal_line() {
        let pack = study_to_pack(STUDY, "fallback").unwrap();
        let openings = &pack.categories[1].questions;
        assert_eq!(openings[0].value, 100);
        assert_eq!(openings[0].answer, NO_ANSWER);
        assert_eq!(openings[0].moves, None);

        assert_eq!(openings[1].value, 300);
        assert_eq!(openings[1].answer, "1. e5");
        assert_eq!(openings[1].moves, None);
    }

    #[test]
    fn test_converted_pack_validates() {
        let pack = study_to_pack(STUDY, "fallback").unwrap();
        assert_eq!(validate_pack(&pack), Ok(()));
    }

    #[test]
    fn test_title_falls_back_to_file_stem() {
        let pgn = "[ChapterName \"C\"]\n[FEN \"8/8/8/8/8/8/8/K6k w - - 0 1\"]\n\n*\n";
        let pack = study_to_pack(pgn, "my-study").unwrap();
        assert_eq!(pack.title, "my-study");
    }

    #[test]
    fn test_no_usable_chapter() {
        let pgn = "[Event \"x\"]\n[ChapterName \"C\"]\n\n1. e4 *\n";
        assert!(matches!(study_to_pack(pgn, "x"), Err(ImportError::NoChapters)));
        assert!(matches!(study_to_pack("", "x"), Err(ImportError::NoChapters)));
    }

    #[test]
    fn test_numbered_line_from_black() {
        let line: Vec<SanPlus> = ["Ra1+", "Kh2", "Rh1#"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        assert_eq!(
            numbered_line("r5k1/8/8/8/8/8/6K1/8 b - - 3 40", &line),
            "40... Ra1+ 41. Kh2 Rh1#"
        );
    }
}
