//! Integration tests for chess-analysis crate.
//!
//! These tests require Stockfish to be installed and available in PATH.
//! Run with: `cargo test -p chess-analysis --test integration -- --ignored`

use chess_analysis::{
    parse_game, AnalysisConfig, AnalysisEngine, Classification, EngineOptions, GameAnalyzer,
    MoveClassifier, PositionEvaluator,
};

/// Check if Stockfish is available in PATH.
fn stockfish_available() -> bool {
    std::process::Command::new("stockfish")
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok()
}

#[test]
#[ignore = "requires Stockfish"]
fn test_engine_basic_analysis() {
    if !stockfish_available() {
        eprintln!("Skipping test: Stockfish not available");
        return;
    }

    let mut engine =
        AnalysisEngine::new(&EngineOptions::default()).expect("Failed to create AnalysisEngine");

    let name = engine.name();
    assert!(
        name.to_lowercase().contains("stockfish"),
        "Engine name should contain 'Stockfish', got: {}",
        name
    );

    let game = parse_game("1. e4 *").unwrap();
    let evaluation = engine
        .evaluate(&game.start, 10)
        .expect("Failed to analyze starting position");

    assert!(evaluation.best_move.is_some(), "Best move should be present");
    assert!(evaluation.score.is_some(), "Score should be present");
    assert!(
        evaluation.depth.unwrap_or(0) >= 10,
        "Search depth should be at least 10, got: {:?}",
        evaluation.depth
    );

    engine.quit().expect("Failed to quit engine");
}

#[test]
#[ignore = "requires Stockfish"]
fn test_engine_options_are_applied() {
    if !stockfish_available() {
        eprintln!("Skipping test: Stockfish not available");
        return;
    }

    let options = EngineOptions {
        threads: Some(1),
        hash_mb: Some(16),
        ..EngineOptions::default()
    };
    let mut engine = AnalysisEngine::new(&options).expect("Failed to create AnalysisEngine");
    engine.new_game().expect("ucinewgame failed");
}

#[test]
#[ignore = "requires Stockfish"]
fn test_scholars_mate_game_analysis() {
    if !stockfish_available() {
        eprintln!("Skipping test: Stockfish not available");
        return;
    }

    // Scholar's mate: 1.e4 e5 2.Qh5 Nc6 3.Bc4 Nf6?? 4.Qxf7#
    let game = parse_game("1. e4 e5 2. Qh5 Nc6 3. Bc4 Nf6 4. Qxf7# 1-0").unwrap();

    let mut engine =
        AnalysisEngine::new(&EngineOptions::default()).expect("Failed to create AnalysisEngine");
    let analyzer = GameAnalyzer::new(MoveClassifier::default(), AnalysisConfig { depth: 12 });

    let report = analyzer
        .analyze(&mut engine, &game, |_| {})
        .expect("Failed to analyze game");

    let nf6 = &report.rows[5];
    assert_eq!(nf6.san, "Nf6", "Move 6 should be Nf6");
    assert_eq!(
        nf6.classification,
        Classification::Blunder,
        "Nf6 should be classified as a Blunder, swing: {:?}",
        nf6.swing
    );

    let mate = &report.rows[6];
    assert!(mate.classification <= Classification::Best);
    assert_eq!(report.black.count(Classification::Blunder), 1);
}
