//! FEN helpers for chess-puzzle questions.
//! Syntax is checked with shakmaty's parser; legality is only looked at when
//! a solution line has to be replayed.
//! Diagrams are plain text so they print in any terminal.

use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, Position};

use crate::error::FenError;

/// Placement, side to move, castling, en passant, halfmove, fullmove.
const FEN_FIELDS: usize = 6;

const FILES: &str = "a b c d e f g h";

/// Castling rights in the only order standard FEN writes them.
const CASTLING: &str = "KQkq";

/// Checks that `fen` is a complete, well-formed FEN record for standard chess.
///
/// shakmaty also reads variant extensions (pockets, promoted markers,
/// Shredder castling), so those are refused here before it sees the text.
pub fn parse_fen(fen: &str) -> Result<Fen, FenError> {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    if fields.len() != FEN_FIELDS {
        return Err(FenError::FieldCount(fields.len()));
    }

    let board = fields[0];
    if board.contains('[') {
        return Err(FenError::Variant("crazyhouse pockets"));
    }
    if board.contains('~') {
        return Err(FenError::Variant("promoted piece markers"));
    }
    check_castling(fields[2])?;
    if fields[5].parse::<u32>().is_ok_and(|n| n == 0) {
        return Err(FenError::Fullmove(fields[5].to_string()));
    }

    let white = board.chars().filter(|&c| c == 'K').count();
    let black = board.chars().filter(|&c| c == 'k').count();
    if white != 1 || black != 1 {
        return Err(FenError::KingCount { white, black });
    }

    let normalized = fields.join(" ");
    Fen::from_ascii(normalized.as_bytes()).map_err(|e| FenError::Syntax(e.to_string()))
}

/// Accepts `-` or a non-empty, in-order subset of `KQkq`.
fn check_castling(field: &str) -> Result<(), FenError> {
    if field == "-" {
        return Ok(());
    }
    let mut rest = CASTLING;
    for c in field.chars() {
        match rest.find(c) {
            Some(i) => rest = &rest[i + 1..],
            None => return Err(FenError::Castling(field.to_string())),
        }
    }
    Ok(())
}

pub fn is_valid_fen(fen: &str) -> bool {
    parse_fen(fen).is_ok()
}

/// Side to move of a well-formed FEN.
pub fn side_to_move(fen: &str) -> Result<Color, FenError> {
    parse_fen(fen)?;
    match fen.split_whitespace().nth(1) {
        Some("b") => Ok(Color::Black),
        _ => Ok(Color::White),
    }
}

/// Draws the position with rank 8 on top, White pieces uppercase.
pub fn diagram(fen: &str) -> Result<String, FenError> {
    parse_fen(fen)?;

    let placement = fen.split_whitespace().next().unwrap_or_default();

    let mut out = String::new();
    for (i, rank) in placement.split('/').take(8).enumerate() {
        let squares: Vec<String> = expand_rank(rank).chars().map(String::from).collect();
        out.push_str(&format!("{} {}\n", 8 - i, squares.join(" ")));
    }
    out.push_str(&format!("  {FILES}"));
    Ok(out)
}

/// Expands digit runs into dots: `"r3k2r"` becomes `"r...k..r"`.
fn expand_rank(rank: &str) -> String {
    let mut result = String::new();
    for c in rank.chars() {
        if let Some(n) = c.to_digit(10) {
            result.push_str(&".".repeat(n as usize));
        } else {
            result.push(c);
        }
    }
    result
}

fn position(fen: &str) -> Result<Chess, FenError> {
    parse_fen(fen)?
        .into_position(CastlingMode::Standard)
        .map_err(|e| FenError::Position(e.to_string()))
}

/// Replays a UCI line from `fen`, failing on the first unplayable move.
pub fn check_uci_line(fen: &str, moves: &[String]) -> Result<(), FenError> {
    let mut pos = position(fen)?;

    for (i, text) in moves.iter().enumerate() {
        let unplayable = |reason: String| FenError::Move {
            index: i + 1,
            mv: text.clone(),
            reason,
        };
        let uci: UciMove = text.parse().map_err(|e| unplayable(format!("{e}")))?;
        let m = uci.to_move(&pos).map_err(|e| unplayable(format!("{e}")))?;
        pos.play_unchecked(m);
    }

    Ok(())
}

/// Converts a SAN mainline into UCI strings, playing it from `fen`.
pub fn san_line_to_uci(fen: &str, line: &[SanPlus]) -> Result<Vec<String>, FenError> {
    let mut pos = position(fen)?;
    let mut out = Vec::with_capacity(line.len());

    for (i, san) in line.iter().enumerate() {
        let m = san.san.to_move(&pos).map_err(|e| FenError::Move {
            index: i + 1,
            mv: san.to_string(),
            reason: e.to_string(),
        })?;
        out.push(m.clone().to_uci(CastlingMode::Standard).to_string());
        pos.play_unchecked(m);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_accepts_start_position() {
        assert!(is_valid_fen(START));
        assert!(is_valid_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/4K2R b Kkq - 12 40"));
    }

    #[test]
    fn test_tolerates_extra_whitespace_between_fields() {
        assert!(is_valid_fen("  8/8/8/8/8/8/8/K6k   w  -  -  0  1 "));
    }

    #[test]
    fn test_rejects_missing_fields() {
        assert_eq!(
            parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -").unwrap_err(),
            FenError::FieldCount(4)
        );
        assert_eq!(parse_fen("").unwrap_err(), FenError::FieldCount(0));
    }

    #[test]
    fn test_rejects_malformed_fields() {
        assert!(!is_valid_fen("not a fen string at all"));
        assert!(!is_valid_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNX w KQkq - 0 1"));
        assert!(!is_valid_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1"));
        assert!(!is_valid_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq z9 0 1"));
    }

    #[test]
    fn test_rejects_crazyhouse_extensions() {
        assert_eq!(
            parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR[Qn] w KQkq - 0 1").unwrap_err(),
            FenError::Variant("crazyhouse pockets")
        );
        assert_eq!(
            parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQ~KBNR w KQkq - 0 1").unwrap_err(),
            FenError::Variant("promoted piece markers")
        );
    }

    #[test]
    fn test_rejects_shredder_castling() {
        assert_eq!(
            parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w HAha - 0 1").unwrap_err(),
            FenError::Castling("HAha".to_string())
        );
        assert!(!is_valid_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w qkQK - 0 1"));
        assert!(!is_valid_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KK - 0 1"));
        assert!(is_valid_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w Qk - 0 1"));
    }

    #[test]
    fn test_rejects_fullmove_zero() {
        assert_eq!(
            parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 0").unwrap_err(),
            FenError::Fullmove("0".to_string())
        );
    }

    #[test]
    fn test_requires_one_king_per_side() {
        assert_eq!(
            parse_fen("8/8/8/8/8/8/8/8 w - - 0 1").unwrap_err(),
            FenError::KingCount { white: 0, black: 0 }
        );
        assert_eq!(
            parse_fen("k7/8/8/8/8/8/8/KK6 w - - 0 1").unwrap_err(),
            FenError::KingCount { white: 2, black: 1 }
        );
    }

    #[test]
    fn test_side_to_move() {
        assert_eq!(side_to_move(START), Ok(Color::White));
        assert_eq!(
            side_to_move("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"),
            Ok(Color::Black)
        );
    }

    #[test]
    fn test_expand_rank() {
        assert_eq!(expand_rank("r3k2r"), "r...k..r");
        assert_eq!(expand_rank("8"), "........");
    }

    #[test]
    fn test_diagram_layout() {
        let text = diagram(START).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "8 r n b q k b n r");
        assert_eq!(lines[4], "4 . . . . . . . .");
        assert_eq!(lines[7], "1 R N B Q K B N R");
        assert_eq!(lines[8], "  a b c d e f g h");
    }

    #[test]
    fn test_diagram_rejects_bad_fen() {
        assert!(diagram("8/8/8 w - - 0 1").is_err());
    }

    #[test]
    fn test_check_uci_line() {
        let line = vec!["e2e4".to_string(), "e7e5".to_string(), "g1f3".to_string()];
        assert!(check_uci_line(START, &line).is_ok());

        let illegal = vec!["e2e4".to_string(), "e2e4".to_string()];
        let err = check_uci_line(START, &illegal).unwrap_err();
        assert!(matches!(err, FenError::Move { index: 2, .. }));
    }

    #[test]
    fn test_san_line_to_uci() {
        let line: Vec<SanPlus> = ["e4", "e5", "Nf3", "Nc6", "Bb5"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        let uci = san_line_to_uci(START, &line).unwrap();
        assert_eq!(uci, vec!["e2e4", "e7e5", "g1f3", "b8c6", "f1b5"]);
    }

    #[test]
    fn test_san_line_to_uci_reports_illegal_move() {
        let line: Vec<SanPlus> = ["e4", "Ke2", "Qh5"].iter().map(|s| s.parse().unwrap()).collect();
        let err = san_line_to_uci(START, &line).unwrap_err();
        assert!(matches!(err, FenError::Move { index: 2, .. }));
    }
}
