#![deny(missing_docs)]
//! Tileset coverage command-line interface.
//!
//! Reads the game's item and monster data, classifies it against every
//! tileset found under `gfx` and writes one HTML report per tileset.

use clap::Parser;
use log::{error, info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tilecov_core::{
    COVERAGE_CSS, FileSystem, JsonFileTree, StdFileSystem, TilecovConfig, Tileset,
    TilesetCoverage, is_hidden, render_json, render_summary_text, render_tileset_html,
};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Data directories below `data/json` that are classified.
const DATA_DIRS: [&str; 2] = ["items", "monsters"];

#[derive(Parser, Debug)]
#[command(name = "tilecov", version, about = "Tileset coverage reports")]
struct Cli {
    /// Directory containing tilecov.ini; created with defaults when missing.
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,
    /// Game directory, overriding GAME_DIR from tilecov.ini.
    #[arg(long, env = "TILECOV_GAME_DIR")]
    game_dir: Option<PathBuf>,
    /// Report directory, overriding OUTPUT_DIR from tilecov.ini.
    #[arg(long, env = "TILECOV_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,
    /// Classify overlay objects too.
    #[arg(long)]
    include_overlays: bool,
    /// Maximum number of tilesets classified at once.
    #[arg(short = 'j', long, default_value_t = 4)]
    jobs: usize,
    /// Also write coverage.json next to the HTML reports.
    #[arg(long)]
    json: bool,
}

#[cfg(not(test))]
#[tokio::main]
async fn main() -> CliResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    run(cli).await
}

#[cfg(test)]
fn main() {}

async fn run(cli: Cli) -> CliResult<()> {
    let config = TilecovConfig::load_or_init(&cli.config_dir)?
        .with_overrides(cli.game_dir, cli.output_dir);
    config.validate()?;

    let trees = Arc::new(load_file_trees(config.json_dir()).await?);
    let tileset_dirs = find_tileset_dirs(&config.gfx_dir()).await?;
    if tileset_dirs.is_empty() {
        println!("No tilesets found in {}.", config.gfx_dir().display());
        return Ok(());
    }

    let coverages = classify_tilesets(tileset_dirs, trees, cli.include_overlays, cli.jobs).await?;
    let written = emit_reports(&config.output_dir, &config.game_dir, &coverages, cli.json).await?;
    info!(
        "wrote {} files to {}",
        written.len(),
        config.output_dir.display()
    );
    print!("{}", render_summary_text(&coverages));
    Ok(())
}

async fn load_file_trees(json_dir: PathBuf) -> CliResult<Vec<JsonFileTree>> {
    let trees = tokio::task::spawn_blocking(move || {
        let fs = StdFileSystem::new();
        DATA_DIRS
            .iter()
            .map(|dir| JsonFileTree::load(&fs, &json_dir, Some(Path::new(dir))))
            .collect::<tilecov_core::Result<Vec<_>>>()
    })
    .await??;

    for (dir, tree) in DATA_DIRS.iter().zip(&trees) {
        info!("{dir}: {} files decoded", tree.len());
        if !tree.skipped().is_empty() {
            warn!("{dir}: {} files skipped", tree.skipped().len());
        }
    }
    Ok(trees)
}

async fn find_tileset_dirs(gfx_dir: &Path) -> CliResult<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(gfx_dir).await?;
    let mut dirs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let file_type = entry.file_type().await?;
        if !file_type.is_dir() {
            continue;
        }
        let entry_path = entry.path();
        if is_hidden(&entry_path) {
            continue;
        }
        dirs.push(entry_path);
    }
    dirs.sort();
    Ok(dirs)
}

async fn classify_tilesets(
    tileset_dirs: Vec<PathBuf>,
    trees: Arc<Vec<JsonFileTree>>,
    include_overlays: bool,
    jobs: usize,
) -> CliResult<Vec<TilesetCoverage>> {
    let jobs = if jobs == 0 { 1 } else { jobs };
    let semaphore = Arc::new(Semaphore::new(jobs));
    let mut tasks = JoinSet::new();

    for dir in tileset_dirs {
        let permit = semaphore.clone().acquire_owned().await?;
        let trees = trees.clone();
        tasks.spawn_blocking(move || {
            let _permit = permit;
            let result = classify_tileset(&StdFileSystem::new(), &dir, &trees, include_overlays);
            (dir, result)
        });
    }

    let mut coverages = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let (dir, result) = joined?;
        match result {
            Ok(coverage) => {
                info!("classified tileset {} ({})", coverage.display_name(), dir.display());
                coverages.push(coverage);
            }
            Err(err) => error!("skipping tileset {}: {err}", dir.display()),
        }
    }
    coverages.sort_by(|left, right| left.name().cmp(right.name()));
    Ok(coverages)
}

fn classify_tileset<F: FileSystem + ?Sized>(
    fs: &F,
    dir: &Path,
    trees: &[JsonFileTree],
    include_overlays: bool,
) -> tilecov_core::Result<TilesetCoverage> {
    let tileset = Tileset::load(fs, dir)?;
    let mut builder = TilesetCoverage::builder(&tileset);
    if !include_overlays {
        builder = builder.exclude_overlays();
    }
    for tree in trees {
        for (path, objects) in tree.files() {
            builder = builder.with_objects(tree.root().join(path), objects);
        }
    }
    Ok(builder.build())
}

async fn emit_reports(
    output_dir: &Path,
    game_root: &Path,
    coverages: &[TilesetCoverage],
    json: bool,
) -> CliResult<Vec<PathBuf>> {
    tokio::fs::create_dir_all(output_dir).await?;
    let mut written = Vec::new();

    let css_path = output_dir.join("coverage.css");
    tokio::fs::write(&css_path, COVERAGE_CSS).await?;
    written.push(css_path);

    let mut used = HashSet::new();
    for coverage in coverages {
        let Some(stem) = report_stem(coverage.name(), &mut used) else {
            error!(
                "skipping report for tileset {:?}: name is not a valid file name",
                coverage.name()
            );
            continue;
        };
        let html_path = output_dir.join(format!("{stem}.html"));
        tokio::fs::write(&html_path, render_tileset_html(coverage, game_root)).await?;
        written.push(html_path);
    }

    if json {
        let json_path = output_dir.join("coverage.json");
        tokio::fs::write(&json_path, render_json(coverages)?).await?;
        written.push(json_path);
    }
    Ok(written)
}

/// File stem for a tileset report, unique among `used`.
///
/// Names that are empty, `.`, `..` or contain a path separator are rejected.
/// A name already in `used` gets a `-2`, `-3`, ... suffix.
fn report_stem(name: &str, used: &mut HashSet<String>) -> Option<String> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return None;
    }
    let mut stem = name.to_string();
    let mut suffix = 1;
    while !used.insert(stem.clone()) {
        suffix += 1;
        stem = format!("{name}-{suffix}");
    }
    if suffix > 1 {
        warn!("report name {name:?} is used by another tileset, writing {stem}.html");
    }
    Some(stem)
}
