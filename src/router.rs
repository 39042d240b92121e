//! Screen router: exactly one view is active at a time.
//!
//! Views return the screen to show next; `resolve` applies the guards so a
//! view never runs without the state it needs.

use std::collections::HashMap;
use std::fmt;

use anyhow::Result;
use tracing::{debug, warn};

use crate::context::AppContext;
use crate::game::Phase;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Screen {
    Home,
    Setup,
    Board,
    Question,
    Results,
    Editor,
}

impl Screen {
    pub fn name(self) -> &'static str {
        match self {
            Screen::Home => "home",
            Screen::Setup => "setup",
            Screen::Board => "game-board",
            Screen::Question => "question",
            Screen::Results => "results",
            Screen::Editor => "editor",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Screen actually shown when `requested` is asked for.
pub fn resolve(requested: Screen, ctx: &AppContext) -> Screen {
    let phase = ctx.game().map(|g| g.phase());
    match (requested, phase) {
        (Screen::Board | Screen::Question | Screen::Results, None) => Screen::Home,
        (Screen::Board | Screen::Question, Some(Phase::Completed)) => Screen::Results,
        (Screen::Question, Some(Phase::Board)) => Screen::Board,
        (Screen::Board, Some(Phase::Question)) => Screen::Question,
        (screen, _) => screen,
    }
}

pub trait View {
    /// Shows the view once. `Ok(None)` quits the application.
    fn render(&mut self, ctx: &mut AppContext) -> Result<Option<Screen>>;
}

pub struct Router {
    views: HashMap<Screen, Box<dyn View>>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            views: HashMap::new(),
        }
    }

    pub fn register(&mut self, screen: Screen, view: Box<dyn View>) -> &mut Self {
        self.views.insert(screen, view);
        self
    }

    /// Runs views until one asks to quit. A view error is logged and sends
    /// the user home; an error on the home view itself ends the run.
    pub fn run(&mut self, ctx: &mut AppContext, start: Screen) -> Result<()> {
        let mut current = resolve(start, ctx);
        loop {
            let view = self
                .views
                .get_mut(&current)
                .ok_or_else(|| anyhow::anyhow!("no view registered for {current}"))?;

            debug!(screen = %current, "render");
            let next = match view.render(ctx) {
                Ok(Some(next)) => next,
                Ok(None) => return Ok(()),
                Err(e) => {
                    warn!(screen = %current, error = %e, "view failed");
                    eprintln!("Error: {e:#}");
                    if current == Screen::Home {
                        return Err(e);
                    }
                    Screen::Home
                }
            };

            let resolved = resolve(next, ctx);
            if resolved != next {
                debug!(requested = %next, shown = %resolved, "redirected");
            }
            current = resolved;
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
