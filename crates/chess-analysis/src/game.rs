//! PGN loading.
//!
//! Only the main line of the first game in a source is kept. Every SAN
//! token is replayed on a [`shakmaty::Chess`] board so the resulting
//! [`GameMove`]s carry legal UCI moves, FENs and Polyglot keys.

use std::fmt;
use std::fs;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use pgn_reader::{RawTag, Reader, SanPlus, Skip, Visitor};
use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::uci::UciMove;
use shakmaty::zobrist::Zobrist64;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Position as _};
use thiserror::Error;
use tracing::debug;

use crate::position::{GameMove, Position, Side};

/// Errors from reading a game record.
#[derive(Error, Debug)]
pub enum GameError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse PGN: {0}")]
    Pgn(#[source] std::io::Error),
    #[error("no game found in input")]
    NoGame,
    #[error("invalid FEN {fen:?}: {reason}")]
    InvalidFen { fen: String, reason: String },
    #[error("illegal move {san} at ply {ply}: {reason}")]
    IllegalMove {
        ply: usize,
        san: String,
        reason: String,
    },
}

/// Headers shown in the report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    pub event: Option<String>,
    pub date: Option<String>,
    pub white: Option<String>,
    pub black: Option<String>,
    pub white_elo: Option<String>,
    pub black_elo: Option<String>,
    pub result: Option<String>,
    pub termination: Option<String>,
    pub time_control: Option<String>,
}

/// Game speed derived from the base time of the `TimeControl` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeControlCategory {
    Bullet,
    Blitz,
    Rapid,
    Classical,
    Unknown,
}

impl fmt::Display for TimeControlCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimeControlCategory::Bullet => "Bullet",
            TimeControlCategory::Blitz => "Blitz",
            TimeControlCategory::Rapid => "Rapid",
            TimeControlCategory::Classical => "Classical",
            TimeControlCategory::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

impl GameInfo {
    /// Base time in seconds, e.g. 600 for `"600+5"`.
    fn base_seconds(&self) -> Option<u32> {
        let tc = self.time_control.as_deref()?;
        tc.split('+').next()?.trim().parse().ok()
    }

    pub fn time_control_category(&self) -> TimeControlCategory {
        match self.base_seconds() {
            Some(s) if s < 180 => TimeControlCategory::Bullet,
            Some(s) if s < 600 => TimeControlCategory::Blitz,
            Some(s) if s < 1800 => TimeControlCategory::Rapid,
            Some(_) => TimeControlCategory::Classical,
            None => TimeControlCategory::Unknown,
        }
    }

    /// Header value with the base time spelled out, e.g. `"600+5 (10 min)"`.
    pub fn time_control_label(&self) -> String {
        let Some(tc) = self.time_control.as_deref() else {
            return "Unknown".to_string();
        };
        match self.base_seconds() {
            Some(s) if s >= 60 => format!("{} ({} min)", tc, s / 60),
            Some(s) => format!("{} ({} sec)", tc, s),
            None => tc.to_string(),
        }
    }

    fn set(&mut self, key: &[u8], value: String) {
        let slot = match key {
            b"Event" => &mut self.event,
            b"Date" => &mut self.date,
            b"White" => &mut self.white,
            b"Black" => &mut self.black,
            b"WhiteElo" => &mut self.white_elo,
            b"BlackElo" => &mut self.black_elo,
            b"Result" => &mut self.result,
            b"Termination" => &mut self.termination,
            b"TimeControl" => &mut self.time_control,
            _ => return,
        };
        if slot.is_none() && !value.is_empty() && value != "?" {
            *slot = Some(value);
        }
    }
}

/// A parsed game, ready for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedGame {
    pub info: GameInfo,
    pub start: Position,
    pub moves: Vec<GameMove>,
}

impl LoadedGame {
    /// Full moves played, as shown in the header.
    pub fn full_moves(&self) -> usize {
        self.moves.len() / 2
    }
}

/// Tags and main-line tokens as they appear in the source.
#[derive(Debug, Default)]
struct RawGame {
    info: GameInfo,
    setup_fen: Option<String>,
    sans: Vec<SanPlus>,
}

struct MainLineVisitor;

impl Visitor for MainLineVisitor {
    type Tags = RawGame;
    type Movetext = RawGame;
    type Output = RawGame;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(RawGame::default())
    }

    fn tag(
        &mut self,
        tags: &mut Self::Tags,
        key: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        if key == b"FEN" {
            tags.setup_fen = Some(value);
        } else {
            tags.info.set(key, value);
        }
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        ControlFlow::Continue(tags)
    }

    fn begin_variation(&mut self, _: &mut Self::Movetext) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn san(&mut self, movetext: &mut Self::Movetext, san: SanPlus) -> ControlFlow<Self::Output> {
        movetext.sans.push(san);
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, movetext: Self::Movetext) -> Self::Output {
        movetext
    }
}

/// Loads the first game of a PGN file.
pub fn load_game(path: impl AsRef<Path>) -> Result<LoadedGame, GameError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| GameError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_game(&text)
}

/// Parses the first game of PGN text.
pub fn parse_game(text: &str) -> Result<LoadedGame, GameError> {
    if text.trim().is_empty() {
        return Err(GameError::NoGame);
    }
    let mut reader = Reader::new(text.as_bytes());
    // A record without moves, such as a bare `*`, is still a game.
    let raw = match reader.read_game(&mut MainLineVisitor) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Err(GameError::NoGame),
        Err(err) => return Err(GameError::Pgn(err)),
    };

    let mut pos = match &raw.setup_fen {
        Some(fen) => board_from_fen(fen)?,
        None => Chess::default(),
    };
    let start = snapshot(&pos, 0);

    let mut moves = Vec::with_capacity(raw.sans.len());
    for (ply, san_plus) in raw.sans.iter().enumerate() {
        let m = san_plus.san.to_move(&pos).map_err(|err| GameError::IllegalMove {
            ply,
            san: san_plus.to_string(),
            reason: err.to_string(),
        })?;

        let before = snapshot(&pos, ply);
        let legal_moves = pos.legal_moves().len();
        let move_number = pos.fullmoves().get();
        let side = side_of(pos.turn());
        let uci = m.to_uci(CastlingMode::Standard).to_string();
        let book_uci = m.to_uci(CastlingMode::Chess960).to_string();
        let san = SanPlus::from_move_and_play_unchecked(&mut pos, m).to_string();

        moves.push(GameMove {
            ply,
            move_number,
            side,
            san,
            uci,
            book_uci,
            legal_moves,
            before,
            after: snapshot(&pos, ply + 1),
        });
    }

    debug!(plies = moves.len(), "loaded game");
    Ok(LoadedGame {
        info: raw.info,
        start,
        moves,
    })
}

fn board_from_fen(fen: &str) -> Result<Chess, GameError> {
    let invalid = |reason: String| GameError::InvalidFen {
        fen: fen.to_string(),
        reason,
    };
    let parsed: Fen = fen.trim().parse().map_err(|err| invalid(format!("{}", err)))?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|err| invalid(err.to_string()))
}

fn side_of(color: Color) -> Side {
    match color {
        Color::White => Side::White,
        Color::Black => Side::Black,
    }
}

fn snapshot(pos: &Chess, ply: usize) -> Position {
    Position {
        ply,
        side_to_move: side_of(pos.turn()),
        fen: Fen::from_position(pos, EnPassantMode::Legal).to_string(),
        key: pos.zobrist_hash::<Zobrist64>(EnPassantMode::Legal).0,
    }
}

/// Converts an engine move into SAN for `position`, with check suffix.
/// Returns `None` when the move does not parse or is illegal there.
pub fn best_move_san(position: &Position, uci: &str) -> Option<String> {
    let mut pos = board_from_fen(&position.fen).ok()?;
    let uci_move: UciMove = uci.parse().ok()?;
    let m = uci_move.to_move(&pos).ok()?;
    Some(SanPlus::from_move_and_play_unchecked(&mut pos, m).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SCHOLARS_MATE: &str = r#"[Event "Casual"]
[White "Alice"]
[Black "Bob"]
[WhiteElo "1500"]
[BlackElo "?"]
[Result "1-0"]
[TimeControl "600+5"]
[Termination "Normal"]

1. e4 e5 2. Qh5 Nc6 3. Bc4 Nf6?? 4. Qxf7# 1-0
"#;

    const START_KEY: u64 = 0x463b96181691fc9c;

    #[test]
    fn test_parse_headers_and_moves() {
        let game = parse_game(SCHOLARS_MATE).unwrap();

        assert_eq!(game.info.white.as_deref(), Some("Alice"));
        assert_eq!(game.info.white_elo.as_deref(), Some("1500"));
        assert_eq!(game.info.black_elo, None);
        assert_eq!(game.info.result.as_deref(), Some("1-0"));
        assert_eq!(game.moves.len(), 7);
        assert_eq!(game.full_moves(), 3);

        let sans: Vec<&str> = game.moves.iter().map(|m| m.san.as_str()).collect();
        assert_eq!(sans, vec!["e4", "e5", "Qh5", "Nc6", "Bc4", "Nf6", "Qxf7#"]);
        assert_eq!(game.moves[0].uci, "e2e4");
        assert_eq!(game.moves[6].uci, "h5f7");
    }

    #[test]
    fn test_positions_chain_and_sides_alternate() {
        let game = parse_game(SCHOLARS_MATE).unwrap();

        assert_eq!(game.start.key, START_KEY);
        assert_eq!(game.start.side_to_move, Side::White);
        assert_eq!(game.moves[0].before, game.start);
        for pair in game.moves.windows(2) {
            assert_eq!(pair[0].after, pair[1].before);
            assert_eq!(pair[1].side, pair[0].side.opposite());
        }
        assert_eq!(game.moves[1].move_number, 1);
        assert_eq!(game.moves[2].move_number, 2);
        assert_eq!(game.moves[0].legal_moves, 20);
        assert_eq!(
            game.moves[0].after.fen,
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn test_polyglot_key_after_e4() {
        let game = parse_game("1. e4 *").unwrap();
        assert_eq!(game.moves[0].after.key, 0x823c9b50fd114196);
    }

    #[test]
    fn test_castling_notations() {
        let game = parse_game("1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 4. O-O *").unwrap();
        let castle = game.moves.last().unwrap();
        assert_eq!(castle.san, "O-O");
        assert_eq!(castle.uci, "e1g1");
        assert_eq!(castle.book_uci, "e1h1");
    }

    #[test]
    fn test_variations_and_comments_are_skipped() {
        let pgn = "1. e4 {best by test} e5 (1... c5 2. Nf3) 2. Nf3 $1 *";
        let game = parse_game(pgn).unwrap();
        let sans: Vec<&str> = game.moves.iter().map(|m| m.san.as_str()).collect();
        assert_eq!(sans, vec!["e4", "e5", "Nf3"]);
    }

    #[test]
    fn test_only_first_game_is_loaded() {
        let pgn = format!("{}\n\n[White \"Other\"]\n\n1. d4 d5 *\n", SCHOLARS_MATE);
        let game = parse_game(&pgn).unwrap();
        assert_eq!(game.info.white.as_deref(), Some("Alice"));
        assert_eq!(game.moves.len(), 7);
    }

    #[test]
    fn test_setup_fen_start() {
        let pgn = r#"[SetUp "1"]
[FEN "4k3/8/8/8/8/8/4P3/4K3 b - - 0 40"]

40... Kd7 41. e4 *
"#;
        let game = parse_game(pgn).unwrap();
        assert_eq!(game.start.side_to_move, Side::Black);
        assert_eq!(game.moves[0].side, Side::Black);
        assert_eq!(game.moves[0].move_number, 40);
        assert_eq!(game.moves[1].move_number, 41);
    }

    #[test]
    fn test_forced_move_detected() {
        // Black king on h8 in check from a rook on a8 with only Kh7 available.
        let pgn = r#"[SetUp "1"]
[FEN "7k/6p1/8/8/8/8/8/R5K1 w - - 0 1"]

1. Ra8+ Kh7 *
"#;
        let game = parse_game(pgn).unwrap();
        assert!(!game.moves[0].is_forced());
        assert!(game.moves[1].is_forced());
        assert_eq!(game.moves[0].san, "Ra8+");
    }

    #[test]
    fn test_illegal_move_reports_ply() {
        let err = parse_game("1. e4 e5 2. Ke3 *").unwrap_err();
        match err {
            GameError::IllegalMove { ply, san, .. } => {
                assert_eq!(ply, 2);
                assert_eq!(san, "Ke3");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_fen() {
        let pgn = "[SetUp \"1\"]\n[FEN \"not a fen\"]\n\n1. e4 *\n";
        assert!(matches!(
            parse_game(pgn),
            Err(GameError::InvalidFen { .. })
        ));
    }

    #[test]
    fn test_empty_input_has_no_game() {
        assert!(matches!(parse_game(""), Err(GameError::NoGame)));
        assert!(matches!(parse_game("\n\n  \n"), Err(GameError::NoGame)));
    }

    #[test]
    fn test_moveless_records_are_games() {
        for text in ["*", "1-0", "[Event \"?\"]\n[White \"?\"]\n[Black \"?\"]\n\n*\n"] {
            let game = parse_game(text).unwrap();
            assert!(game.moves.is_empty(), "{text:?}");
            assert_eq!(
                game.start.fen,
                "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
            );
        }
    }

    #[test]
    fn test_headers_without_moves() {
        let game = parse_game("[White \"A\"]\n[Black \"B\"]\n\n*\n").unwrap();
        assert!(game.moves.is_empty());
        assert_eq!(game.info.black.as_deref(), Some("B"));
    }

    #[test]
    fn test_load_game_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SCHOLARS_MATE.as_bytes()).unwrap();
        file.flush().unwrap();

        let game = load_game(file.path()).unwrap();
        assert_eq!(game.moves.len(), 7);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_game(dir.path().join("missing.pgn")).unwrap_err();
        assert!(matches!(err, GameError::Read { .. }));
        assert!(err.to_string().contains("missing.pgn"));
    }

    #[test]
    fn test_time_control_helpers() {
        let info = |tc: &str| GameInfo {
            time_control: Some(tc.to_string()),
            ..GameInfo::default()
        };

        assert_eq!(info("60+0").time_control_category(), TimeControlCategory::Bullet);
        assert_eq!(info("180+2").time_control_category(), TimeControlCategory::Blitz);
        assert_eq!(info("600+5").time_control_category(), TimeControlCategory::Rapid);
        assert_eq!(info("1800").time_control_category(), TimeControlCategory::Classical);
        assert_eq!(info("-").time_control_category(), TimeControlCategory::Unknown);
        assert_eq!(
            GameInfo::default().time_control_category(),
            TimeControlCategory::Unknown
        );

        assert_eq!(info("600+5").time_control_label(), "600+5 (10 min)");
        assert_eq!(info("30+0").time_control_label(), "30+0 (30 sec)");
        assert_eq!(info("-").time_control_label(), "-");
        assert_eq!(GameInfo::default().time_control_label(), "Unknown");
    }

    #[test]
    fn test_best_move_san() {
        let game = parse_game(SCHOLARS_MATE).unwrap();
        let before_mate = &game.moves[6].before;

        assert_eq!(best_move_san(before_mate, "h5f7").as_deref(), Some("Qxf7#"));
        assert_eq!(best_move_san(&game.start, "g1f3").as_deref(), Some("Nf3"));
        assert_eq!(best_move_san(&game.start, "e2e5"), None);
        assert_eq!(best_move_san(&game.start, "garbage"), None);
    }
}
