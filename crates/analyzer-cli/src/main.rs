mod config;
mod display;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chess_analysis::{
    load_game, resolve_book, AnalysisEngine, ClassifierConfig, GameAnalyzer, GameInfo,
    MoveClassifier, PolyglotBook, Report,
};
use clap::{Parser, ValueEnum};
use config::AnalyzerConfig;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "chess-analyze")]
#[command(version, about = "Rate every move of a chess game with a UCI engine")]
struct Cli {
    /// PGN file to analyze (first game only)
    pgn_file: PathBuf,
    /// Search depth per position
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    depth: Option<u32>,
    /// Opening book: bundled name or path to a Polyglot .bin file
    #[arg(short, long)]
    book: Option<String>,
    /// Disable opening book detection
    #[arg(long, conflicts_with = "book")]
    no_book: bool,
    /// Path to the UCI engine executable
    #[arg(short, long)]
    engine: Option<String>,
    /// Configuration file (default: chess-analyze.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Classification thresholds to use
    #[arg(short, long, value_parser = ClassifierConfig::PRESETS)]
    preset: Option<String>,
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    game: &'a GameInfo,
    report: &'a Report,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Folds command-line overrides into the file configuration.
fn apply_overrides(mut config: AnalyzerConfig, cli: &Cli) -> AnalyzerConfig {
    if let Some(depth) = cli.depth {
        config.analysis.depth = depth;
    }
    if let Some(engine) = &cli.engine {
        config.engine.path = engine.clone();
    }
    if let Some(book) = &cli.book {
        config.book.name = book.clone();
        config.book.enabled = true;
    }
    if cli.no_book {
        config.book.enabled = false;
    }
    if let Some(preset) = &cli.preset {
        config.classifier.preset = preset.clone();
    }
    config
}

/// Opens the configured book. Problems are logged and analysis continues
/// without book detection.
fn open_book(config: &AnalyzerConfig) -> Option<PolyglotBook> {
    if !config.book.enabled {
        return None;
    }
    let path = resolve_book(&config.book.name, &config.book.resolved_books_dir());
    match PolyglotBook::open(&path) {
        Ok(book) => {
            info!(path = %path.display(), entries = book.len(), "using opening book");
            Some(book)
        }
        Err(e) => {
            warn!("opening book unavailable, continuing without it: {}", e);
            None
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config =
        AnalyzerConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let config = apply_overrides(config, &cli);

    let classifier_config = config.classifier.build()?;
    let classifier =
        MoveClassifier::new(classifier_config).context("invalid classifier rules")?;

    let game = load_game(&cli.pgn_file)
        .with_context(|| format!("failed to load {}", cli.pgn_file.display()))?;

    let mut analyzer = GameAnalyzer::new(classifier, config.analysis.clone());
    if let Some(book) = open_book(&config) {
        analyzer = analyzer.with_book(book);
    }

    let mut engine = AnalysisEngine::new(&config.engine)
        .with_context(|| format!("failed to start engine at {}", config.engine.path))?;
    info!(engine = engine.name(), depth = config.analysis.depth, "starting analysis");

    let report = if cli.format == OutputFormat::Table {
        print!("{}", display::render_header(&cli.pgn_file, &game));
        let progress = display::create_progress_bar(game.moves.len() as u64);
        let result = analyzer.analyze(&mut engine, &game, |event| {
            display::update_progress(&progress, &event)
        });
        progress.finish_and_clear();
        result?
    } else {
        analyzer.analyze(&mut engine, &game, |_| {})?
    };
    engine.quit()?;

    match cli.format {
        OutputFormat::Table => {
            print!("{}", display::render_moves(&report));
            println!();
            print!("{}", display::render_summary(&report));
        }
        OutputFormat::Json => {
            let output = JsonOutput {
                game: &game.info,
                report: &report,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli)
}
