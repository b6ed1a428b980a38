//! Client side of the UCI (Universal Chess Interface) protocol.
//!
//! This crate formats the commands a GUI sends to a chess engine and parses
//! the engine's replies. [`UciSession`] drives a conversation over any
//! line-oriented reader/writer pair, typically the pipes of a spawned
//! engine process.
//!
//! # Commands
//!
//! - `uci` - Initialize engine, get id and options
//! - `isready` / `readyok` - Synchronization
//! - `ucinewgame` - Forget state from the previous game
//! - `setoption name <name> [value <value>]` - Configure the engine
//! - `position fen <fen>` - Set position
//! - `go depth <d>` - Start a fixed-depth search
//! - `quit` - Exit engine

mod command;
mod info;

pub use command::{GoOptions, GuiCommand};
pub use info::{Bound, EngineInfo, Score};

use std::io::{BufRead, Write};
use thiserror::Error;
use tracing::debug;

/// Maximum number of lines to read while waiting for a terminal response.
pub const MAX_UCI_LINES: usize = 10_000;

#[derive(Error, Debug)]
pub enum UciError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Engine closed its output")]
    Disconnected,
    #[error("No '{expected}' after {limit} lines of engine output")]
    TooManyLines { expected: &'static str, limit: usize },
}

/// Messages sent from engine to GUI.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineMessage {
    /// Engine identification.
    Id {
        name: Option<String>,
        author: Option<String>,
    },
    /// UCI initialization complete.
    UciOk,
    /// Engine is ready.
    ReadyOk,
    /// Search information.
    Info(EngineInfo),
    /// Search finished. `mv` is `None` when the position has no legal move.
    BestMove { mv: Option<String> },
    /// Anything else, including `option` declarations.
    Unknown(String),
}

impl EngineMessage {
    /// Parse one line of engine output.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (keyword, rest) = match line.split_once(char::is_whitespace) {
            Some((k, r)) => (k, r.trim()),
            None => (line, ""),
        };

        match keyword {
            "uciok" => EngineMessage::UciOk,
            "readyok" => EngineMessage::ReadyOk,
            "id" => {
                if let Some(name) = rest.strip_prefix("name ") {
                    EngineMessage::Id {
                        name: Some(name.trim().to_string()),
                        author: None,
                    }
                } else if let Some(author) = rest.strip_prefix("author ") {
                    EngineMessage::Id {
                        name: None,
                        author: Some(author.trim().to_string()),
                    }
                } else {
                    EngineMessage::Unknown(line.to_string())
                }
            }
            "info" => match EngineInfo::parse(line) {
                Some(info) => EngineMessage::Info(info),
                None => EngineMessage::Unknown(line.to_string()),
            },
            "bestmove" => {
                let mv = rest
                    .split_whitespace()
                    .next()
                    .filter(|m| *m != "(none)" && *m != "0000")
                    .map(str::to_string);
                EngineMessage::BestMove { mv }
            }
            _ => EngineMessage::Unknown(line.to_string()),
        }
    }
}

/// Identification collected during the `uci` handshake.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineId {
    pub name: Option<String>,
    pub author: Option<String>,
}

/// Result of a finished `go` command.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// The last exact principal-line info, or the last scored info when the
    /// engine only reported bounds.
    pub info: Option<EngineInfo>,
    /// Best move in UCI notation, `None` for terminal positions.
    pub best_move: Option<String>,
}

/// A UCI conversation with an engine over a reader/writer pair.
pub struct UciSession<R: BufRead, W: Write> {
    reader: R,
    writer: W,
    max_lines: usize,
}

impl<R: BufRead, W: Write> UciSession<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            max_lines: MAX_UCI_LINES,
        }
    }

    /// Override the line limit used while waiting for responses.
    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines;
        self
    }

    /// Send a command to the engine.
    pub fn send(&mut self, cmd: &GuiCommand) -> Result<(), UciError> {
        let line = cmd.to_uci();
        debug!(cmd = %line, "engine <");
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Read and parse the next line of engine output.
    pub fn read_message(&mut self) -> Result<EngineMessage, UciError> {
        let mut line = String::new();
        let bytes = self.reader.read_line(&mut line)?;
        if bytes == 0 {
            return Err(UciError::Disconnected);
        }
        let line = line.trim();
        debug!(line, "engine >");
        Ok(EngineMessage::parse(line))
    }

    /// Perform the `uci` / `uciok` handshake followed by `isready`.
    pub fn handshake(&mut self) -> Result<EngineId, UciError> {
        self.send(&GuiCommand::Uci)?;

        let mut id = EngineId::default();
        self.wait_for("uciok", |msg| match msg {
            EngineMessage::Id { name, author } => {
                if name.is_some() {
                    id.name = name;
                }
                if author.is_some() {
                    id.author = author;
                }
                None
            }
            EngineMessage::UciOk => Some(()),
            _ => None,
        })?;

        self.is_ready()?;
        Ok(id)
    }

    /// Send `isready` and wait for `readyok`.
    pub fn is_ready(&mut self) -> Result<(), UciError> {
        self.send(&GuiCommand::IsReady)?;
        self.wait_for("readyok", |msg| {
            matches!(msg, EngineMessage::ReadyOk).then_some(())
        })
    }

    /// Start a search and block until `bestmove`.
    pub fn search(&mut self, options: GoOptions) -> Result<SearchOutcome, UciError> {
        self.send(&GuiCommand::Go(options))?;

        let mut exact: Option<EngineInfo> = None;
        let mut any_scored: Option<EngineInfo> = None;
        let best_move = self.wait_for("bestmove", |msg| match msg {
            EngineMessage::Info(info) => {
                if info.is_primary_score() {
                    exact = Some(info);
                } else if info.score.is_some() && matches!(info.multipv, None | Some(1)) {
                    any_scored = Some(info);
                }
                None
            }
            EngineMessage::BestMove { mv } => Some(mv),
            _ => None,
        })?;

        Ok(SearchOutcome {
            info: exact.or(any_scored),
            best_move,
        })
    }

    fn wait_for<T>(
        &mut self,
        expected: &'static str,
        mut on_message: impl FnMut(EngineMessage) -> Option<T>,
    ) -> Result<T, UciError> {
        for _ in 0..self.max_lines {
            if let Some(done) = on_message(self.read_message()?) {
                return Ok(done);
            }
        }
        Err(UciError::TooManyLines {
            expected,
            limit: self.max_lines,
        })
    }
}
