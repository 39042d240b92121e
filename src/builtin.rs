//! Packs shipped inside the binary, embedded from `packs/` at compile time.

use include_dir::{Dir, include_dir};
use tracing::warn;

use crate::model::Pack;

static PACKS_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/packs");

/// Every embedded `*.json` pack, ordered by file name. Files that do not
/// parse are skipped.
pub fn builtin_packs() -> Vec<Pack> {
    let mut files: Vec<_> = PACKS_DIR
        .files()
        .filter(|f| f.path().extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort_by(|a, b| a.path().cmp(b.path()));

    files
        .into_iter()
        .filter_map(|file| {
            let name = file.path().display().to_string();
            let Some(text) = file.contents_utf8() else {
                warn!(file = %name, "built-in pack is not UTF-8");
                return None;
            };
            match Pack::from_json(text) {
                Ok(pack) => Some(pack),
                Err(e) => {
                    warn!(file = %name, error = %e, "skipping built-in pack");
                    None
                }
            }
        })
        .collect()
}
