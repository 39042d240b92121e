//! Error types for the game host.
//!
//! Each concern gets its own `thiserror` enum so callers can match on what
//! went wrong; the binary wraps them in `anyhow` at the edges.

use thiserror::Error;

use crate::model::Cell;

/// First problem found in a pack, in checking order.
///
/// Question positions are 1-based, as shown to the pack author.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Pack title is missing")]
    MissingTitle,

    #[error("Pack has no categories")]
    NoCategories,

    #[error("Category {position}: name is missing")]
    MissingCategoryName { position: usize },

    #[error("\"{category}\": add at least one question")]
    EmptyCategory { category: String },

    #[error("\"{category}\"[{position}]: question text is missing")]
    MissingQuestionText { category: String, position: usize },

    #[error("\"{category}\"[{position}]: answer is missing")]
    MissingAnswerText { category: String, position: usize },

    #[error("\"{category}\"[{position}]: invalid FEN ({reason})")]
    InvalidFen {
        category: String,
        position: usize,
        reason: String,
    },
}

/// Failure to read a standalone pack document.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Pack document has no \"title\" or \"categories\" field")]
    MissingFields,

    #[error("Invalid PGN: {0}")]
    Pgn(#[from] std::io::Error),

    #[error("PGN contains no chapter with both ChapterName and FEN tags")]
    NoChapters,
}

/// Key-value host failures. Readers turn these into empty collections.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("expected 6 fields, found {0}")]
    FieldCount(usize),

    #[error("{0}")]
    Syntax(String),

    #[error("not standard chess: {0}")]
    Variant(&'static str),

    #[error("castling field must be '-' or drawn from KQkq in order, found {0}")]
    Castling(String),

    #[error("fullmove number must be at least 1, found {0}")]
    Fullmove(String),

    #[error("expected exactly 1 king per side, found {white} white and {black} black")]
    KingCount { white: usize, black: usize },

    #[error("illegal position: {0}")]
    Position(String),

    #[error("move {index} ({mv}) is not playable: {reason}")]
    Move {
        index: usize,
        mv: String,
        reason: String,
    },
}

/// Rejected session transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("A game needs at least one player")]
    NoPlayers,

    #[error("No question at {0}")]
    NoSuchCell(Cell),

    #[error("Question {0} was already played")]
    AlreadyAnswered(Cell),

    #[error("Another question is still open")]
    QuestionOpen,

    #[error("No question is open")]
    NoOpenQuestion,

    #[error("Question is locked")]
    Locked,

    #[error("Select at least one player to award points")]
    NoPlayerSelected,

    #[error("Reveal the answer before skipping")]
    AnswerHidden,

    #[error("No player #{0}")]
    NoSuchPlayer(usize),

    #[error("Game is already over")]
    Completed,
}

/// Errors surfaced by the session context to the views.
#[derive(Error, Debug)]
pub enum ContextError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error("No pack #{0}")]
    NoSuchPack(usize),

    #[error("No saved game with id {0}")]
    NoSuchSave(String),

    #[error("No game in progress")]
    NoActiveGame,
}
