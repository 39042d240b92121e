//! Editing operations on a pack that has not been saved yet.
//!
//! The editor view works on a `PackDraft`; nothing here validates, that
//! happens when the draft is saved.

use crate::model::{Category, Cell, DEFAULT_VALUE, Pack, Question};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackDraft {
    pub pack: Pack,
    /// Stored offset being edited, `None` for a new pack.
    pub offset: Option<usize>,
}

impl PackDraft {
    pub fn new() -> Self {
        Self {
            pack: Pack::blank(),
            offset: None,
        }
    }

    pub fn edit(pack: Pack, offset: usize) -> Self {
        Self {
            pack,
            offset: Some(offset),
        }
    }

    pub fn question_mut(&mut self, cell: Cell) -> Option<&mut Question> {
        self.pack
            .categories
            .get_mut(cell.category)
            .and_then(|c| c.questions.get_mut(cell.question))
    }

    /// Appends a category holding one blank question. Returns its index.
    pub fn add_category(&mut self) -> usize {
        self.pack.categories.push(Category::blank());
        self.pack.categories.len() - 1
    }

    pub fn remove_category(&mut self, index: usize) -> Option<Category> {
        (index < self.pack.categories.len()).then(|| self.pack.categories.remove(index))
    }

    /// Appends a blank question worth 100 more than the category's last one.
    pub fn add_question(&mut self, category: usize) -> Option<Cell> {
        let questions = &mut self.pack.categories.get_mut(category)?.questions;
        let value = questions
            .last()
            .map_or(DEFAULT_VALUE, |q| q.value.saturating_add(DEFAULT_VALUE));
        questions.push(Question::blank(value));
        Some(Cell::new(category, questions.len() - 1))
    }

    /// Inserts a copy right after the original.
    pub fn duplicate_question(&mut self, cell: Cell) -> Option<Cell> {
        let questions = &mut self.pack.categories.get_mut(cell.category)?.questions;
        let copy = questions.get(cell.question)?.clone();
        questions.insert(cell.question + 1, copy);
        Some(Cell::new(cell.category, cell.question + 1))
    }

    pub fn remove_question(&mut self, cell: Cell) -> Option<Question> {
        let questions = &mut self.pack.categories.get_mut(cell.category)?.questions;
        (cell.question < questions.len()).then(|| questions.remove(cell.question))
    }

    /// Swaps with the previous question. Returns the new position.
    pub fn move_up(&mut self, cell: Cell) -> Option<Cell> {
        if cell.question == 0 {
            return None;
        }
        let questions = &mut self.pack.categories.get_mut(cell.category)?.questions;
        if cell.question >= questions.len() {
            return None;
        }
        questions.swap(cell.question - 1, cell.question);
        Some(Cell::new(cell.category, cell.question - 1))
    }

    /// Swaps with the next question. Returns the new position.
    pub fn move_down(&mut self, cell: Cell) -> Option<Cell> {
        let questions = &mut self.pack.categories.get_mut(cell.category)?.questions;
        if cell.question + 1 >= questions.len() {
            return None;
        }
        questions.swap(cell.question, cell.question + 1);
        Some(Cell::new(cell.category, cell.question + 1))
    }
}

impl Default for PackDraft {
    fn default() -> Self {
        Self::new()
    }
}

/// Optional text field: blank input clears it.
pub fn optional_text(input: &str) -> Option<String> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
