use anyhow::Result;

use super::{confirm, pick, report};
use crate::context::AppContext;
use crate::router::{Screen, View};
use crate::storage::EmptyReason;

pub struct HomeView;

impl HomeView {
    fn choose_save(ctx: &AppContext, prompt: &str) -> Result<Option<String>> {
        let slots = ctx.saves.newest_first();
        if slots.is_empty() {
            report("No saved games");
            return Ok(None);
        }
        let labels: Vec<String> = slots
            .iter()
            .map(|s| {
                format!(
                    "{}  ({}, {} of {} played)",
                    s.name,
                    s.saved_at_display(),
                    s.state.answered().len(),
                    s.state.total_questions()
                )
            })
            .collect();
        Ok(pick(prompt, &labels, 0)?.map(|i| slots[i].id.clone()))
    }
}

impl View for HomeView {
    fn render(&mut self, ctx: &mut AppContext) -> Result<Option<Screen>> {
        println!("\n=== Jeopardy ===");
        if let Some(EmptyReason::Corrupt(e)) = ctx.saves.load().empty_reason() {
            report(format!("Saved games could not be read ({e})"));
        }

        let saves = ctx.saves.list().len();
        let items = [
            "New game".to_string(),
            format!("Continue a saved game ({saves})"),
            "Pack editor".to_string(),
            "Delete a saved game".to_string(),
            "Quit".to_string(),
        ];

        match pick("Main menu", &items, 0)? {
            Some(0) => Ok(Some(Screen::Setup)),
            Some(1) => {
                let Some(id) = Self::choose_save(ctx, "Continue which game?")? else {
                    return Ok(Some(Screen::Home));
                };
                match ctx.resume(&id) {
                    Ok(_) => Ok(Some(Screen::Board)),
                    Err(e) => {
                        report(e);
                        Ok(Some(Screen::Home))
                    }
                }
            }
            Some(2) => Ok(Some(Screen::Editor)),
            Some(3) => {
                if let Some(id) = Self::choose_save(ctx, "Delete which game?")? {
                    if confirm("Delete this saved game?")? {
                        ctx.saves.delete(&id);
                    }
                }
                Ok(Some(Screen::Home))
            }
            _ => Ok(None),
        }
    }
}
