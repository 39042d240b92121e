use anyhow::Result;

use super::pick;
use crate::context::AppContext;
use crate::game::Standing;
use crate::router::{Screen, View};

pub struct ResultsView;

fn podium(standings: &[Standing]) -> String {
    standings
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let crown = if s.winner { " *" } else { "" };
            format!("{:>2}. {:<20} {:>6}{crown}", i + 1, s.name, s.score)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

impl View for ResultsView {
    fn render(&mut self, ctx: &mut AppContext) -> Result<Option<Screen>> {
        let Some(game) = ctx.game() else {
            return Ok(Some(Screen::Home));
        };

        println!("\n=== Final scores: {} ===", game.pack.title);
        println!("{}", podium(&game.standings()));
        ctx.clear_game();

        let items = ["New game", "Main menu", "Quit"];
        let next = pick("What now?", &items, 0)?;
        Ok(match next {
            Some(0) => Some(Screen::Setup),
            Some(1) => Some(Screen::Home),
            _ => None,
        })
    }
}
