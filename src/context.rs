//! Shared state handed to every view: the stores, the setup draft and the
//! game in progress. Session transitions go through here so that saving
//! happens in exactly one place.

use tracing::{info, warn};

use crate::error::ContextError;
use crate::game::{GameSession, Standing, Transition};
use crate::model::{Cell, Pack};
use crate::storage::{PackStore, SaveStore};
use crate::validate::validate_pack;

/// Choices made on the setup view before a game starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetupDraft {
    pub pack_index: usize,
    pub players: Vec<String>,
    pub timer_secs: u32,
}

pub struct AppContext {
    pub packs: PackStore,
    pub saves: SaveStore,
    pub setup: SetupDraft,
    game: Option<GameSession>,
}

impl AppContext {
    pub fn new(packs: PackStore, saves: SaveStore, players: Vec<String>, timer_secs: u32) -> Self {
        Self {
            packs,
            saves,
            setup: SetupDraft {
                pack_index: 0,
                players,
                timer_secs,
            },
            game: None,
        }
    }

    pub fn game(&self) -> Option<&GameSession> {
        self.game.as_ref()
    }

    fn game_mut(&mut self) -> Result<&mut GameSession, ContextError> {
        self.game.as_mut().ok_or(ContextError::NoActiveGame)
    }

    /// Starts a game from the setup draft. The pack must validate.
    pub fn start_game(&mut self) -> Result<&GameSession, ContextError> {
        let pack = self
            .packs
            .get(self.setup.pack_index)
            .ok_or(ContextError::NoSuchPack(self.setup.pack_index))?;
        validate_pack(&pack)?;

        let session = GameSession::new(pack, &self.setup.players, self.setup.timer_secs)?;
        info!(id = %session.id, pack = %session.pack.title, players = session.players.len(), "game started");
        self.saves.save_game(&session);
        Ok(self.game.insert(session))
    }

    /// Continues a saved game, always from the board. Answered cells the
    /// pack has no question for are dropped; a game that turns out to be
    /// complete loses its slot and resumes straight into results.
    pub fn resume(&mut self, id: &str) -> Result<&GameSession, ContextError> {
        let mut session = self
            .saves
            .find(id)
            .ok_or_else(|| ContextError::NoSuchSave(id.to_string()))?
            .state;

        let dropped = session.drop_unknown_answers();
        if dropped > 0 {
            warn!(id, dropped, "ignoring answered cells outside the pack");
        }
        if session.is_complete() {
            info!(id, "saved game was already complete");
            self.saves.delete(id);
        }
        info!(id, answered = session.answered().len(), "game resumed");
        Ok(self.game.insert(session))
    }

    pub fn open(&mut self, cell: Cell) -> Result<(), ContextError> {
        Ok(self.game_mut()?.open(cell)?)
    }

    pub fn toggle_player(&mut self, index: usize) -> Result<bool, ContextError> {
        Ok(self.game_mut()?.toggle_player(index)?)
    }

    pub fn reveal_answer(&mut self) -> Result<(), ContextError> {
        Ok(self.game_mut()?.reveal_answer()?)
    }

    pub fn timer_expired(&mut self) -> Result<(), ContextError> {
        Ok(self.game_mut()?.timer_expired()?)
    }

    pub fn toggle_lock(&mut self) -> Result<bool, ContextError> {
        Ok(self.game_mut()?.toggle_lock()?)
    }

    pub fn confirm(&mut self) -> Result<Transition, ContextError> {
        let transition = self.game_mut()?.confirm()?;
        self.persist(transition);
        Ok(transition)
    }

    pub fn skip(&mut self) -> Result<Transition, ContextError> {
        let transition = self.game_mut()?.skip()?;
        self.persist(transition);
        Ok(transition)
    }

    pub fn peek(&mut self) -> Result<(), ContextError> {
        Ok(self.game_mut()?.peek()?)
    }

    /// Ends the game, drops its save slot and returns the final standings.
    pub fn end_game(&mut self) -> Result<Vec<Standing>, ContextError> {
        let game = self.game_mut()?;
        game.finish();
        let id = game.id.clone();
        let standings = game.standings();
        self.saves.delete(&id);
        info!(id = %id, "game ended");
        Ok(standings)
    }

    /// Forgets the game so a new one can start. A completed game also
    /// loses its save slot.
    pub fn clear_game(&mut self) {
        if let Some(game) = self.game.take().filter(GameSession::is_complete) {
            self.saves.delete(&game.id);
        }
    }

    fn persist(&mut self, transition: Transition) {
        let Some(game) = self.game.as_ref() else {
            return;
        };
        match transition {
            Transition::Board => self.saves.save_game(game),
            Transition::Completed => {
                info!(id = %game.id, "all questions played");
                self.saves.delete(&game.id);
            }
        }
    }

    /// Parses, validates and stores a pack document. Returns its list index.
    pub fn import_pack(&mut self, text: &str) -> Result<usize, ContextError> {
        let pack = Pack::from_json(text)?;
        self.save_pack(pack, None)
    }

    /// Validates and stores a pack, replacing the stored one at `offset`.
    pub fn save_pack(&mut self, pack: Pack, offset: Option<usize>) -> Result<usize, ContextError> {
        validate_pack(&pack)?;
        let stored = self.packs.upsert(pack, offset);
        Ok(self.packs.builtin_count() + stored)
    }

    /// Saves the pack and selects it for the next game.
    pub fn save_and_play(&mut self, pack: Pack, offset: Option<usize>) -> Result<usize, ContextError> {
        let index = self.save_pack(pack, offset)?;
        self.setup.pack_index = index;
        Ok(index)
    }

    /// Deletes the pack at a list index. Built-in packs cannot be deleted.
    pub fn delete_pack(&mut self, index: usize) -> Result<(), ContextError> {
        let offset = index
            .checked_sub(self.packs.builtin_count())
            .ok_or(ContextError::NoSuchPack(index))?;
        self.packs.delete(offset);
        if self.setup.pack_index >= self.packs.list().len() {
            self.setup.pack_index = 0;
        }
        Ok(())
    }
}
