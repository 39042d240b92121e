//! Terminal views, one per screen. Each view is a short `dialoguer` prompt
//! loop that hands the next screen back to the router.

use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use tokio::runtime::Handle;

use crate::router::{Router, Screen};

mod board;
mod editor;
mod home;
mod question;
mod results;
mod setup;

pub use board::BoardView;
pub use editor::EditorView;
pub use home::HomeView;
pub use question::QuestionView;
pub use results::ResultsView;
pub use setup::SetupView;

/// Router with every view registered.
pub fn router(runtime: Handle) -> Router {
    let mut router = Router::new();
    router
        .register(Screen::Home, Box::new(HomeView))
        .register(Screen::Setup, Box::new(SetupView))
        .register(Screen::Board, Box::new(BoardView))
        .register(Screen::Question, Box::new(QuestionView::new(runtime)))
        .register(Screen::Results, Box::new(ResultsView))
        .register(Screen::Editor, Box::new(EditorView::default()));
    router
}

pub(crate) fn theme() -> ColorfulTheme {
    ColorfulTheme::default()
}

/// Single choice; `None` when the user escapes.
pub(crate) fn pick<T: ToString>(prompt: &str, items: &[T], default: usize) -> Result<Option<usize>> {
    let choice = Select::with_theme(&theme())
        .with_prompt(prompt)
        .items(items)
        .default(default.min(items.len().saturating_sub(1)))
        .interact_opt()?;
    Ok(choice)
}

pub(crate) fn text(prompt: &str, initial: &str) -> Result<String> {
    let value: String = Input::with_theme(&theme())
        .with_prompt(prompt)
        .with_initial_text(initial)
        .allow_empty(true)
        .interact_text()?;
    Ok(value)
}

pub(crate) fn confirm(prompt: &str) -> Result<bool> {
    Ok(Confirm::with_theme(&theme())
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

/// Prints a recoverable problem and keeps the view running.
pub(crate) fn report(error: impl std::fmt::Display) {
    eprintln!("  ! {error}");
}
