//! Game session model.
//!
//! A session is created from setup, moves between the board and an open
//! question, and completes once every question is answered or the host ends
//! it. All rules live here so they can be exercised without a terminal; the
//! session context decides when to persist.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GameError;
use crate::model::{Category, Cell, Pack, Player, Question};
use crate::storage::saves::answered_keys;

/// Question currently on screen, with the presenter's choices so far.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenQuestion {
    pub cell: Cell,
    selected: BTreeSet<usize>,
    answer_shown: bool,
    locked: bool,
}

impl OpenQuestion {
    fn new(cell: Cell) -> Self {
        Self {
            cell,
            selected: BTreeSet::new(),
            answer_shown: false,
            locked: false,
        }
    }

    /// Indices of the players who will receive the points.
    pub fn selected(&self) -> &BTreeSet<usize> {
        &self.selected
    }

    pub fn answer_shown(&self) -> bool {
        self.answer_shown
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Board,
    Question,
    Completed,
}

/// Where the session goes after a question is resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Board,
    Completed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Standing {
    pub name: String,
    pub score: i64,
    pub winner: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    pub id: String,
    pub pack: Pack,
    pub players: Vec<Player>,
    /// Seconds per question; 0 disables the countdown.
    pub timer_secs: u32,
    #[serde(with = "answered_keys")]
    answered: BTreeSet<Cell>,
    #[serde(skip)]
    open: Option<OpenQuestion>,
    #[serde(skip)]
    ended: bool,
}

impl GameSession {
    /// Starts a game on its own copy of `pack`. Blank names become `Player N`.
    pub fn new(pack: Pack, names: &[String], timer_secs: u32) -> Result<Self, GameError> {
        if names.is_empty() {
            return Err(GameError::NoPlayers);
        }

        let players = names
            .iter()
            .enumerate()
            .map(|(i, name)| match name.trim() {
                "" => Player::new(format!("Player {}", i + 1)),
                trimmed => Player::new(trimmed),
            })
            .collect();

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            pack,
            players,
            timer_secs,
            answered: BTreeSet::new(),
            open: None,
            ended: false,
        })
    }

    pub fn answered(&self) -> &BTreeSet<Cell> {
        &self.answered
    }

    pub fn is_answered(&self, cell: Cell) -> bool {
        self.answered.contains(&cell)
    }

    pub fn total_questions(&self) -> usize {
        self.pack.total_questions()
    }

    pub fn remaining(&self) -> usize {
        self.total_questions().saturating_sub(self.answered.len())
    }

    /// Forgets answered cells the pack has no question for, so a stored
    /// game cannot count phantom cells toward completion. Returns how many
    /// were dropped.
    pub fn drop_unknown_answers(&mut self) -> usize {
        let before = self.answered.len();
        let pack = &self.pack;
        self.answered.retain(|cell| pack.question(*cell).is_some());
        before - self.answered.len()
    }

    pub fn is_complete(&self) -> bool {
        self.ended || self.answered.len() >= self.total_questions()
    }

    pub fn phase(&self) -> Phase {
        if self.is_complete() {
            Phase::Completed
        } else if self.open.is_some() {
            Phase::Question
        } else {
            Phase::Board
        }
    }

    pub fn open_question(&self) -> Option<&OpenQuestion> {
        self.open.as_ref()
    }

    /// Category and question behind the open cell.
    pub fn current(&self) -> Option<(&Category, &Question)> {
        let cell = self.open.as_ref()?.cell;
        let category = self.pack.categories.get(cell.category)?;
        Some((category, category.questions.get(cell.question)?))
    }

    /// Board → question.
    pub fn open(&mut self, cell: Cell) -> Result<(), GameError> {
        if self.is_complete() {
            return Err(GameError::Completed);
        }
        if self.open.is_some() {
            return Err(GameError::QuestionOpen);
        }
        if self.pack.question(cell).is_none() {
            return Err(GameError::NoSuchCell(cell));
        }
        if self.is_answered(cell) {
            return Err(GameError::AlreadyAnswered(cell));
        }

        self.open = Some(OpenQuestion::new(cell));
        Ok(())
    }

    fn open_mut(&mut self) -> Result<&mut OpenQuestion, GameError> {
        self.open.as_mut().ok_or(GameError::NoOpenQuestion)
    }

    fn unlocked_mut(&mut self) -> Result<&mut OpenQuestion, GameError> {
        let open = self.open_mut()?;
        if open.locked {
            return Err(GameError::Locked);
        }
        Ok(open)
    }

    /// Selects or deselects a player; returns whether they are now selected.
    pub fn toggle_player(&mut self, index: usize) -> Result<bool, GameError> {
        if index >= self.players.len() {
            return Err(GameError::NoSuchPlayer(index));
        }
        let open = self.unlocked_mut()?;
        if open.selected.remove(&index) {
            Ok(false)
        } else {
            open.selected.insert(index);
            Ok(true)
        }
    }

    pub fn reveal_answer(&mut self) -> Result<(), GameError> {
        self.unlocked_mut()?.answer_shown = true;
        Ok(())
    }

    /// Countdown ran out: the answer is shown even while locked.
    pub fn timer_expired(&mut self) -> Result<(), GameError> {
        self.open_mut()?.answer_shown = true;
        Ok(())
    }

    /// Returns whether the question is now locked.
    pub fn toggle_lock(&mut self) -> Result<bool, GameError> {
        let open = self.open_mut()?;
        open.locked = !open.locked;
        Ok(open.locked)
    }

    /// Awards the question's value to every selected player.
    pub fn confirm(&mut self) -> Result<Transition, GameError> {
        let open = self.unlocked_mut()?;
        if open.selected.is_empty() {
            return Err(GameError::NoPlayerSelected);
        }
        let cell = open.cell;
        let selected = open.selected.clone();

        let value = self
            .pack
            .question(cell)
            .map(|q| q.value)
            .ok_or(GameError::NoSuchCell(cell))?;
        for index in selected {
            if let Some(player) = self.players.get_mut(index) {
                player.score = player.score.saturating_add(value);
            }
        }

        Ok(self.close_answered(cell))
    }

    /// Closes the question without awarding anyone.
    pub fn skip(&mut self) -> Result<Transition, GameError> {
        let open = self.unlocked_mut()?;
        if !open.answer_shown {
            return Err(GameError::AnswerHidden);
        }
        let cell = open.cell;
        Ok(self.close_answered(cell))
    }

    /// Back to the board; the question stays playable.
    pub fn peek(&mut self) -> Result<(), GameError> {
        self.unlocked_mut()?;
        self.open = None;
        Ok(())
    }

    /// Host ends the game early.
    pub fn finish(&mut self) {
        self.open = None;
        self.ended = true;
    }

    fn close_answered(&mut self, cell: Cell) -> Transition {
        self.answered.insert(cell);
        self.open = None;
        if self.is_complete() {
            Transition::Completed
        } else {
            Transition::Board
        }
    }

    /// Players by descending score. Everyone tied at a positive top score wins.
    pub fn standings(&self) -> Vec<Standing> {
        let mut players = self.players.clone();
        players.sort_by(|a, b| b.score.cmp(&a.score));
        let top = players.first().map(|p| p.score).unwrap_or(0);

        players
            .into_iter()
            .map(|p| Standing {
                winner: p.score == top && top > 0,
                name: p.name,
                score: p.score,
            })
            .collect()
    }
}
