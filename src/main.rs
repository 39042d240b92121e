mod builtin;
mod config;
mod context;
mod countdown;
mod draft;
mod error;
mod fen;
mod game;
mod model;
mod pgn;
mod router;
mod screens;
mod storage;
mod validate;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Arg, ArgAction, ArgMatches, Command};
use tokio::runtime::Handle;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, DATA_DIR_ENV};
use crate::context::AppContext;
use crate::model::Pack;
use crate::router::Screen;
use crate::storage::{DirStore, KeyValueStore, MemoryStore, PackStore, SaveStore};
use crate::validate::validate_pack;

fn build_cli() -> Command {
    Command::new("jeopardy-rs")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Jeopardy-style trivia host with chess puzzle questions")
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .value_name("DIR")
                .help("Directory for custom packs and saved games")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("ephemeral")
                .long("ephemeral")
                .help("Keep packs and saves in memory only")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log debug output to stderr")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(Command::new("play").about("Start the interactive game (default)"))
        .subcommand(Command::new("packs").about("List available packs"))
        .subcommand(Command::new("saves").about("List saved games"))
        .subcommand(
            Command::new("validate")
                .about("Check a pack JSON file")
                .arg(path_arg("file", "Pack JSON file")),
        )
        .subcommand(
            Command::new("import")
                .about("Validate a pack JSON file and add it to the custom packs")
                .arg(path_arg("file", "Pack JSON file")),
        )
        .subcommand(
            Command::new("export")
                .about("Write a pack to a JSON file")
                .arg(
                    Arg::new("index")
                        .required(true)
                        .value_name("N")
                        .help("Pack number as shown by `packs`")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(out_arg()),
        )
        .subcommand(
            Command::new("import-pgn")
                .about("Convert a chess study PGN into a pack")
                .arg(path_arg("file", "Study PGN file"))
                .arg(out_arg().help("Write the pack here instead of adding it to the custom packs")),
        )
        .subcommand(
            Command::new("delete-save")
                .about("Delete a saved game")
                .arg(Arg::new("id").required(true).help("Saved game id")),
        )
}

fn path_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .required(true)
        .value_name("FILE")
        .help(help)
        .value_parser(clap::value_parser!(PathBuf))
}

fn out_arg() -> Arg {
    Arg::new("out")
        .long("out")
        .short('o')
        .value_name("FILE")
        .help("Output file")
        .value_parser(clap::value_parser!(PathBuf))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "jeopardy_rs=debug" } else { "jeopardy_rs=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open_store(matches: &ArgMatches, config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    if matches.get_flag("ephemeral") {
        info!("using in-memory storage");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let flag = matches.get_one::<PathBuf>("data-dir").map(PathBuf::as_path);
    let env = std::env::var_os(DATA_DIR_ENV).map(PathBuf::from);
    let store = DirStore::new(config.resolve_data_dir(flag, env)?);
    info!(dir = %store.root().display(), "using data directory");
    Ok(Arc::new(store))
}

fn read_pack_file(path: &Path) -> Result<Pack> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Pack::from_json(&text).with_context(|| format!("Failed to import {}", path.display()))
}

fn required_path<'a>(sub: &'a ArgMatches, name: &str) -> Result<&'a PathBuf> {
    sub.get_one::<PathBuf>(name)
        .with_context(|| format!("missing <{name}>"))
}

async fn play(mut ctx: AppContext) -> Result<()> {
    let runtime = Handle::current();
    tokio::task::spawn_blocking(move || {
        let mut router = screens::router(runtime);
        router.run(&mut ctx, Screen::Home)
    })
    .await
    .map_err(|e| anyhow::anyhow!("Interactive session failed: {}", e))?
}

fn list_packs(ctx: &AppContext) {
    let builtin = ctx.packs.builtin_count();
    for (i, pack) in ctx.packs.list().iter().enumerate() {
        let origin = if i < builtin { "built-in" } else { "custom" };
        println!(
            "{:>3}. {} [{origin}] {} categories, {} questions",
            i + 1,
            pack.title,
            pack.categories.len(),
            pack.total_questions()
        );
    }
}

fn list_saves(ctx: &AppContext) {
    let slots = ctx.saves.newest_first();
    if slots.is_empty() {
        println!("No saved games");
    }
    for slot in slots {
        println!(
            "{}  {}  {}  ({} of {} played)",
            slot.id,
            slot.saved_at_display(),
            slot.name,
            slot.state.answered().len(),
            slot.state.total_questions()
        );
    }
}

fn export_pack(ctx: &AppContext, number: usize, out: Option<&PathBuf>) -> Result<()> {
    let pack = number
        .checked_sub(1)
        .and_then(|i| ctx.packs.get(i))
        .with_context(|| format!("No pack #{number}"))?;
    let out = out.cloned().unwrap_or_else(|| PathBuf::from(pack.export_file_name()));
    fs::write(&out, pack.to_json_pretty()?).with_context(|| format!("Failed to write {}", out.display()))?;
    println!("Wrote {}", out.display());
    Ok(())
}

fn import_pgn(ctx: &mut AppContext, path: &Path, out: Option<&PathBuf>) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("Study");
    let pack = pgn::study_to_pack(&text, stem).with_context(|| format!("Failed to convert {}", path.display()))?;

    for category in &pack.categories {
        let values: Vec<String> = category.questions.iter().map(|q| q.value.to_string()).collect();
        println!("  {}: {}", category.name, values.join(", "));
    }

    match out {
        Some(out) => {
            validate_pack(&pack)?;
            fs::write(out, pack.to_json_pretty()?).with_context(|| format!("Failed to write {}", out.display()))?;
            println!("Wrote {}", out.display());
        }
        None => {
            let index = ctx.save_pack(pack, None)?;
            println!("Added as pack #{}", index + 1);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    let config = Config::load().context("Failed to load configuration")?;
    debug!(?config, "configuration loaded");

    let kv = open_store(&matches, &config)?;
    let mut ctx = AppContext::new(
        PackStore::new(kv.clone(), builtin::builtin_packs()),
        SaveStore::new(kv),
        config.default_players.clone(),
        config.default_timer_secs,
    );

    match matches.subcommand() {
        None | Some(("play", _)) => play(ctx).await,
        Some(("packs", _)) => {
            list_packs(&ctx);
            Ok(())
        }
        Some(("saves", _)) => {
            list_saves(&ctx);
            Ok(())
        }
        Some(("validate", sub)) => {
            let path = required_path(sub, "file")?;
            let pack = read_pack_file(path)?;
            validate_pack(&pack).with_context(|| format!("{} is not a valid pack", path.display()))?;
            println!("OK: {} ({} questions)", pack.title, pack.total_questions());
            Ok(())
        }
        Some(("import", sub)) => {
            let path = required_path(sub, "file")?;
            let index = ctx.save_pack(read_pack_file(path)?, None)?;
            println!("Added as pack #{}", index + 1);
            Ok(())
        }
        Some(("export", sub)) => {
            let number = *sub.get_one::<usize>("index").context("missing <index>")?;
            export_pack(&ctx, number, sub.get_one::<PathBuf>("out"))
        }
        Some(("import-pgn", sub)) => {
            let path = required_path(sub, "file")?;
            import_pgn(&mut ctx, path, sub.get_one::<PathBuf>("out"))
        }
        Some(("delete-save", sub)) => {
            let id = sub.get_one::<String>("id").context("missing <id>")?;
            if ctx.saves.find(id).is_none() {
                bail!("No saved game with id {id}");
            }
            ctx.saves.delete(id);
            println!("Deleted {id}");
            Ok(())
        }
        Some((other, _)) => bail!("Unknown command: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_play() {
        let matches = build_cli().try_get_matches_from(["jeopardy-rs"]).unwrap();
        assert!(matches.subcommand().is_none());
        assert!(!matches.get_flag("ephemeral"));
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let matches = build_cli()
            .try_get_matches_from(["jeopardy-rs", "export", "2", "--out", "x.json", "--data-dir", "/tmp/j"])
            .unwrap();
        assert_eq!(
            matches.get_one::<PathBuf>("data-dir"),
            Some(&PathBuf::from("/tmp/j"))
        );
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "export");
        assert_eq!(sub.get_one::<usize>("index"), Some(&2));
        assert_eq!(sub.get_one::<PathBuf>("out"), Some(&PathBuf::from("x.json")));
    }

    #[test]
    fn test_cli_rejects_bad_index() {
        assert!(build_cli().try_get_matches_from(["jeopardy-rs", "export", "two"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        build_cli().debug_assert();
    }
}
