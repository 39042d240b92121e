//! Pack editor: the custom pack library plus a nested menu for editing one
//! pack. Drafts are only validated when saved.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::{confirm, pick, report, text};
use crate::context::AppContext;
use crate::draft::{PackDraft, optional_text};
use crate::fen;
use crate::model::{Cell, Pack, safe_image_url};
use crate::pgn;
use crate::router::{Screen, View};
use crate::validate::validate_pack;

#[derive(Default)]
pub struct EditorView;

fn read_file(path: &str) -> Result<String> {
    fs::read_to_string(path.trim()).with_context(|| format!("Failed to read {}", path.trim()))
}

impl EditorView {
    fn library(&mut self, ctx: &mut AppContext) -> Result<Option<Screen>> {
        loop {
            let builtin = ctx.packs.builtin_count();
            let stored = ctx.packs.stored().into_vec();

            let mut items = vec!["New pack".to_string()];
            items.extend(stored.iter().map(|p| format!("Edit: {}", p.title)));
            let actions = [
                "Import JSON file",
                "Import PGN study",
                "Export a pack to JSON",
                "Delete a custom pack",
                "Back",
            ];
            items.extend(actions.iter().map(|a| a.to_string()));

            let Some(choice) = pick("Pack editor", &items, 0)? else {
                return Ok(Some(Screen::Home));
            };
            let action = choice.checked_sub(1 + stored.len());

            match (choice, action) {
                (0, _) => {
                    if let Some(next) = self.edit(ctx, PackDraft::new())? {
                        return Ok(Some(next));
                    }
                }
                (i, None) => {
                    let draft = PackDraft::edit(stored[i - 1].clone(), i - 1);
                    if let Some(next) = self.edit(ctx, draft)? {
                        return Ok(Some(next));
                    }
                }
                (_, Some(0)) => {
                    let path = text("Path to JSON pack", "")?;
                    match read_file(&path).map_err(|e| format!("{e:#}")).and_then(|t| {
                        ctx.import_pack(&t).map_err(|e| e.to_string())
                    }) {
                        Ok(index) => println!("Imported as pack #{}", index + 1),
                        Err(e) => report(e),
                    }
                }
                (_, Some(1)) => {
                    let path = text("Path to PGN study", "")?;
                    if let Err(e) = import_study(ctx, &path) {
                        report(format!("{e:#}"));
                    }
                }
                (_, Some(2)) => {
                    let packs = ctx.packs.list();
                    let titles: Vec<&str> = packs.iter().map(|p| p.title.as_str()).collect();
                    if let Some(i) = pick("Export which pack?", &titles, 0)? {
                        let out = text("Write to", &packs[i].export_file_name())?;
                        match write_pack(&packs[i], &out) {
                            Ok(()) => println!("Wrote {}", out.trim()),
                            Err(e) => report(format!("{e:#}")),
                        }
                    }
                }
                (_, Some(3)) => {
                    if stored.is_empty() {
                        report("No custom packs to delete");
                        continue;
                    }
                    let titles: Vec<&str> = stored.iter().map(|p| p.title.as_str()).collect();
                    if let Some(i) = pick("Delete which pack?", &titles, 0)? {
                        if confirm(&format!("Delete \"{}\"?", stored[i].title))? {
                            ctx.delete_pack(builtin + i)?;
                        }
                    }
                }
                _ => return Ok(Some(Screen::Home)),
            }
        }
    }

    /// Edits one pack until it is saved or discarded. Returns `Some(Setup)`
    /// when the host chose to play the saved pack right away.
    fn edit(&mut self, ctx: &mut AppContext, mut draft: PackDraft) -> Result<Option<Screen>> {
        loop {
            let mut items = vec![format!("Title: {}", draft.pack.title)];
            items.extend(
                draft
                    .pack
                    .categories
                    .iter()
                    .map(|c| format!("Category: {} ({} questions)", c.name, c.questions.len())),
            );
            let categories = draft.pack.categories.len();
            items.extend(
                ["Add category", "Save", "Save and play", "Export", "Discard changes"].map(String::from),
            );

            let Some(choice) = pick("Edit pack", &items, 0)? else {
                continue;
            };
            match choice.checked_sub(categories + 1) {
                _ if choice == 0 => draft.pack.title = text("Title", &draft.pack.title)?,
                None => edit_category(&mut draft, choice - 1)?,
                Some(0) => {
                    let ci = draft.add_category();
                    edit_category(&mut draft, ci)?;
                }
                Some(1) => match ctx.save_pack(draft.pack.clone(), draft.offset) {
                    Ok(index) => {
                        println!("Saved as pack #{}", index + 1);
                        return Ok(None);
                    }
                    Err(e) => report(e),
                },
                Some(2) => match ctx.save_and_play(draft.pack.clone(), draft.offset) {
                    Ok(index) => {
                        println!("Saved as pack #{}", index + 1);
                        return Ok(Some(Screen::Setup));
                    }
                    Err(e) => report(e),
                },
                Some(3) => {
                    if let Err(e) = validate_pack(&draft.pack) {
                        report(e);
                        continue;
                    }
                    let out = text("Write to", &draft.pack.export_file_name())?;
                    match write_pack(&draft.pack, &out) {
                        Ok(()) => println!("Wrote {}", out.trim()),
                        Err(e) => report(format!("{e:#}")),
                    }
                }
                _ => {
                    if confirm("Discard unsaved changes?")? {
                        return Ok(None);
                    }
                }
            }
        }
    }
}

impl View for EditorView {
    fn render(&mut self, ctx: &mut AppContext) -> Result<Option<Screen>> {
        self.library(ctx)
    }
}

fn write_pack(pack: &Pack, path: &str) -> Result<()> {
    let json = pack.to_json_pretty()?;
    fs::write(path.trim(), json).with_context(|| format!("Failed to write {}", path.trim()))
}

fn import_study(ctx: &mut AppContext, path: &str) -> Result<()> {
    let path = Path::new(path.trim());
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("Study");

    let pack = pgn::study_to_pack(&text, stem)?;
    let index = ctx.save_pack(pack, None)?;
    println!("Imported study as pack #{}", index + 1);
    Ok(())
}

/// Menu label for a stored image URL; unsafe URLs are never echoed.
fn image_label(image: Option<&str>) -> &str {
    match image {
        None => "-",
        Some(url) => safe_image_url(url).unwrap_or("(hidden: not an http/https URL)"),
    }
}

fn edit_category(draft: &mut PackDraft, ci: usize) -> Result<()> {
    loop {
        let Some(category) = draft.pack.categories.get(ci) else {
            return Ok(());
        };
        let mut items = vec![format!("Name: {}", category.name)];
        items.extend(
            category
                .questions
                .iter()
                .map(|q| format!("{}: {}", q.value, q.question)),
        );
        let questions = category.questions.len();
        items.extend(["Add question", "Remove category", "Back"].map(String::from));

        let Some(choice) = pick("Edit category", &items, 0)? else {
            return Ok(());
        };
        match choice {
            0 => {
                let name = text("Category name", &draft.pack.categories[ci].name)?;
                draft.pack.categories[ci].name = name;
            }
            i if i <= questions => edit_question(draft, Cell::new(ci, i - 1))?,
            i if i == questions + 1 => {
                if let Some(cell) = draft.add_question(ci) {
                    edit_question(draft, cell)?;
                }
            }
            i if i == questions + 2 => {
                if confirm("Remove this category and its questions?")? {
                    draft.remove_category(ci);
                    return Ok(());
                }
            }
            _ => return Ok(()),
        }
    }
}

fn edit_question(draft: &mut PackDraft, mut cell: Cell) -> Result<()> {
    loop {
        let Some(q) = draft.question_mut(cell) else {
            return Ok(());
        };
        let items = [
            format!("Value: {}", q.value),
            format!("Question: {}", q.question),
            format!("Answer: {}", q.answer),
            format!("Image URL: {}", image_label(q.image.as_deref())),
            format!("FEN: {}", q.fen.as_deref().unwrap_or("-")),
            format!("Solution (UCI): {}", q.moves.as_ref().map(|m| m.join(" ")).unwrap_or_default()),
            "Move up".to_string(),
            "Move down".to_string(),
            "Duplicate".to_string(),
            "Remove".to_string(),
            "Back".to_string(),
        ];

        let Some(choice) = pick("Edit question", &items, 0)? else {
            return Ok(());
        };
        match choice {
            0 => {
                let input = text("Value", &q.value.to_string())?;
                match input.trim().parse() {
                    Ok(value) => q.value = value,
                    Err(_) => report(format!("Not a whole number: {input}")),
                }
            }
            1 => q.question = text("Question", &q.question)?,
            2 => q.answer = text("Answer", &q.answer)?,
            3 => {
                let current = q.image.as_deref().and_then(safe_image_url).unwrap_or("");
                q.image = optional_text(&text("Image URL", current)?);
                if q.image.as_deref().is_some_and(|url| safe_image_url(url).is_none()) {
                    report("Only http and https image URLs are shown during play");
                }
            }
            4 => {
                q.fen = optional_text(&text("FEN", q.fen.as_deref().unwrap_or(""))?);
                if q.position().is_some_and(|p| !fen::is_valid_fen(p)) {
                    report("Invalid FEN, the pack will not save until it is fixed");
                }
            }
            5 => {
                let current = q.moves.as_ref().map(|m| m.join(" ")).unwrap_or_default();
                let line: Vec<String> = text("Moves, space separated", &current)?
                    .split_whitespace()
                    .map(String::from)
                    .collect();
                if let (Some(position), false) = (q.position(), line.is_empty()) {
                    if let Err(e) = fen::check_uci_line(position, &line) {
                        report(format!("Warning: {e}"));
                    }
                }
                q.moves = (!line.is_empty()).then_some(line);
            }
            6 => cell = draft.move_up(cell).unwrap_or(cell),
            7 => cell = draft.move_down(cell).unwrap_or(cell),
            8 => cell = draft.duplicate_question(cell).unwrap_or(cell),
            9 => {
                if confirm("Remove this question?")? {
                    draft.remove_question(cell);
                    return Ok(());
                }
            }
            _ => return Ok(()),
        }
    }
}
