use anyhow::Result;

use super::{pick, report, text};
use crate::context::AppContext;
use crate::router::{Screen, View};

pub struct SetupView;

/// `"Alice, Bob,,"` → `["Alice", "Bob", "", ""]`; blanks get default names later.
fn split_names(input: &str) -> Vec<String> {
    if input.trim().is_empty() {
        return Vec::new();
    }
    input.split(',').map(|n| n.trim().to_string()).collect()
}

impl View for SetupView {
    fn render(&mut self, ctx: &mut AppContext) -> Result<Option<Screen>> {
        loop {
            let packs = ctx.packs.list();
            if packs.is_empty() {
                report("No packs available; create one in the editor");
                return Ok(Some(Screen::Home));
            }
            if ctx.setup.pack_index >= packs.len() {
                ctx.setup.pack_index = 0;
            }

            let pack = &packs[ctx.setup.pack_index];
            let timer = match ctx.setup.timer_secs {
                0 => "off".to_string(),
                s => format!("{s}s"),
            };
            let items = [
                format!("Pack: {} ({} questions)", pack.title, pack.total_questions()),
                format!("Players: {}", ctx.setup.players.join(", ")),
                format!("Timer: {timer}"),
                "Start game".to_string(),
                "Back".to_string(),
            ];

            match pick("Game setup", &items, 3)? {
                Some(0) => {
                    let builtin = ctx.packs.builtin_count();
                    let labels: Vec<String> = packs
                        .iter()
                        .enumerate()
                        .map(|(i, p)| {
                            let origin = if i < builtin { "built-in" } else { "custom" };
                            format!("{} [{origin}]", p.title)
                        })
                        .collect();
                    if let Some(i) = pick("Pack", &labels, ctx.setup.pack_index)? {
                        ctx.setup.pack_index = i;
                    }
                }
                Some(1) => {
                    let input = text("Player names, comma separated", &ctx.setup.players.join(", "))?;
                    let names = split_names(&input);
                    if names.is_empty() {
                        report("At least one player is needed");
                    } else {
                        ctx.setup.players = names;
                    }
                }
                Some(2) => {
                    let input = text("Seconds per question (0 = off)", &ctx.setup.timer_secs.to_string())?;
                    match input.trim().parse() {
                        Ok(secs) => ctx.setup.timer_secs = secs,
                        Err(_) => report(format!("Not a number of seconds: {input}")),
                    }
                }
                Some(3) => match ctx.start_game() {
                    Ok(_) => return Ok(Some(Screen::Board)),
                    Err(e) => report(e),
                },
                _ => return Ok(Some(Screen::Home)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_names_keeps_blank_slots() {
        assert_eq!(split_names("Alice, Bob,,"), vec!["Alice", "Bob", "", ""]);
        assert!(split_names("   ").is_empty());
    }
}
