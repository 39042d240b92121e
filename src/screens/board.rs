use anyhow::Result;

use super::{confirm, pick, report};
use crate::context::AppContext;
use crate::game::GameSession;
use crate::model::Cell;
use crate::router::{Screen, View};

pub struct BoardView;

/// Grid of categories against values; played cells show as dots.
fn grid(game: &GameSession) -> String {
    let values = game.pack.values();
    let name_width = game
        .pack
        .categories
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for (ci, category) in game.pack.categories.iter().enumerate() {
        out.push_str(&format!("{:<name_width$} ", category.name));
        for value in &values {
            let open = category
                .questions
                .iter()
                .enumerate()
                .any(|(qi, q)| q.value == *value && !game.is_answered(Cell::new(ci, qi)));
            let label = if open { value.to_string() } else { "·".to_string() };
            out.push_str(&format!("{label:>6}"));
        }
        out.push('\n');
    }
    out
}

fn scoreline(game: &GameSession) -> String {
    game.players
        .iter()
        .map(|p| format!("{}: {}", p.name, p.score))
        .collect::<Vec<_>>()
        .join("   ")
}

impl View for BoardView {
    fn render(&mut self, ctx: &mut AppContext) -> Result<Option<Screen>> {
        let Some(game) = ctx.game() else {
            return Ok(Some(Screen::Home));
        };

        println!("\n=== {} ===", game.pack.title);
        print!("{}", grid(game));
        println!("{}", scoreline(game));
        println!("{} of {} questions left", game.remaining(), game.total_questions());

        let open: Vec<Cell> = game.pack.cells().filter(|c| !game.is_answered(*c)).collect();
        let mut items: Vec<String> = open
            .iter()
            .filter_map(|cell| {
                let category = game.pack.categories.get(cell.category)?;
                let question = category.questions.get(cell.question)?;
                Some(format!("{} for {}", category.name, question.value))
            })
            .collect();
        items.push("End game".to_string());
        items.push("Back to menu (game stays saved)".to_string());

        match pick("Pick a question", &items, 0)? {
            Some(i) if i < open.len() => match ctx.open(open[i]) {
                Ok(()) => Ok(Some(Screen::Question)),
                Err(e) => {
                    report(e);
                    Ok(Some(Screen::Board))
                }
            },
            Some(i) if i == open.len() => {
                if confirm("End the game now?")? {
                    ctx.end_game()?;
                    Ok(Some(Screen::Results))
                } else {
                    Ok(Some(Screen::Board))
                }
            }
            _ => {
                ctx.clear_game();
                Ok(Some(Screen::Home))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::sample_pack;

    #[test]
    fn test_grid_marks_played_cells() {
        let mut game = GameSession::new(sample_pack(), &["A".to_string()], 0).unwrap();
        game.open(Cell::new(0, 1)).unwrap();
        game.reveal_answer().unwrap();
        game.skip().unwrap();

        let rows: Vec<String> = grid(&game).lines().map(|l| l.split_whitespace().collect::<Vec<_>>().join(" ")).collect();
        assert_eq!(rows, vec!["Openings 100 ·", "Endgames 100 ·"]);
    }
}
