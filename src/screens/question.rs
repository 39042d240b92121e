use anyhow::Result;
use tokio::runtime::Handle;

use super::{pick, report};
use crate::context::AppContext;
use crate::countdown::Countdown;
use crate::fen;
use crate::game::Transition;
use crate::model::safe_image_url;
use crate::router::{Screen, View};

/// Actions offered under the question, in menu order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    Toggle(usize),
    Reveal,
    Lock,
    Confirm,
    Skip,
    Peek,
}

pub struct QuestionView {
    runtime: Handle,
}

impl QuestionView {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    fn print_question(ctx: &AppContext) {
        let Some(game) = ctx.game() else { return };
        let Some((category, question)) = game.current() else { return };

        println!("\n--- {} for {} ---", category.name, question.value);
        println!("{}", question.question);
        if let Some(position) = question.position() {
            match fen::diagram(position) {
                Ok(board) => println!("\n{board}\n"),
                Err(e) => report(format!("Cannot draw position: {e}")),
            }
        }
        if let Some(url) = question.image.as_deref().and_then(safe_image_url) {
            println!("Image: {url}");
        }
    }

    fn print_answer(ctx: &AppContext) {
        let Some((_, question)) = ctx.game().and_then(|g| g.current()) else {
            return;
        };
        println!(">>> Answer: {}", question.answer);
        if let Some(moves) = question.moves.as_ref().filter(|m| !m.is_empty()) {
            println!(">>> Line: {}", moves.join(" "));
        }
    }
}

/// Stops the countdown once the answer is shown. Returns whether it ran out
/// while the answer was still hidden.
fn countdown_ran_out(countdown: &mut Countdown, answer_shown: bool) -> bool {
    if answer_shown {
        countdown.cancel();
        return false;
    }
    countdown.expired()
}

impl View for QuestionView {
    fn render(&mut self, ctx: &mut AppContext) -> Result<Option<Screen>> {
        let Some(timer_secs) = ctx.game().map(|g| g.timer_secs) else {
            return Ok(Some(Screen::Home));
        };

        Self::print_question(ctx);
        let mut countdown = Countdown::new(self.runtime.clone());
        countdown.start(timer_secs);
        let mut answer_printed = false;

        loop {
            let Some(game) = ctx.game() else {
                return Ok(Some(Screen::Home));
            };
            let Some(open) = game.open_question() else {
                return Ok(Some(Screen::Board));
            };

            // Expiry is noticed at the next prompt, not while one is waiting.
            if countdown_ran_out(&mut countdown, open.answer_shown()) {
                println!("Time is up!");
                ctx.timer_expired()?;
                continue;
            }
            if open.answer_shown() && !answer_printed {
                Self::print_answer(ctx);
                answer_printed = true;
                continue;
            }

            let mut actions: Vec<(Action, String)> = game
                .players
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    let mark = if open.selected().contains(&i) { "x" } else { " " };
                    (Action::Toggle(i), format!("[{mark}] {}", p.name))
                })
                .collect();
            if !open.answer_shown() {
                actions.push((Action::Reveal, "Show answer".to_string()));
            }
            let lock_label = if open.is_locked() { "Unlock" } else { "Lock" };
            actions.push((Action::Lock, lock_label.to_string()));
            actions.push((Action::Confirm, "Award points".to_string()));
            if open.answer_shown() {
                actions.push((Action::Skip, "Nobody got it".to_string()));
            }
            actions.push((Action::Peek, "Back to board".to_string()));

            let prompt = if countdown.is_running() {
                format!("{}s left", countdown.remaining())
            } else if open.is_locked() {
                "Locked".to_string()
            } else {
                "Question".to_string()
            };

            let labels: Vec<&str> = actions.iter().map(|(_, l)| l.as_str()).collect();
            let Some(choice) = pick(&prompt, &labels, 0)? else {
                continue;
            };

            let outcome = match actions[choice].0 {
                Action::Toggle(i) => ctx.toggle_player(i).map(|_| None),
                Action::Reveal => ctx.reveal_answer().map(|_| None),
                Action::Lock => ctx.toggle_lock().map(|_| None),
                Action::Confirm => ctx.confirm().map(Some),
                Action::Skip => ctx.skip().map(Some),
                Action::Peek => ctx.peek().map(|_| Some(Transition::Board)),
            };

            match outcome {
                Ok(Some(Transition::Board)) => return Ok(Some(Screen::Board)),
                Ok(Some(Transition::Completed)) => return Ok(Some(Screen::Results)),
                Ok(None) => {}
                Err(e) => report(e),
            }
        }
    }
}
