//! Stockfish engine wrapper for position analysis.

use std::io::{BufReader, ErrorKind};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uci::{GoOptions, GuiCommand, UciError, UciSession};

use crate::evaluation::{EngineEvaluation, Evaluation};
use crate::position::Position;

/// How long `Drop` waits for the engine to exit after `quit`.
const QUIT_GRACE: Duration = Duration::from_millis(500);

/// Errors that can occur when working with chess engines.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Engine executable was not found at the specified path.
    #[error("engine not found: {0}")]
    NotFound(String),
    /// Failed to spawn the engine process.
    #[error("failed to spawn engine {path}: {source}")]
    SpawnError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// Engine failed the UCI handshake.
    #[error("engine initialization failed: {0}")]
    InitFailed(#[source] UciError),
    /// Engine stopped responding or closed its output mid-search.
    #[error("engine protocol error: {0}")]
    Protocol(#[from] UciError),
}

/// Something that can score a position. [`AnalysisEngine`] is the real
/// implementation; tests script their own.
pub trait PositionEvaluator {
    /// Evaluates `position` to `depth` plies.
    fn evaluate(&mut self, position: &Position, depth: u32)
        -> Result<EngineEvaluation, EngineError>;

    /// Called once before the first position of a game.
    fn new_game(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}

/// How to start the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Executable path, or a bare name looked up on `PATH`.
    pub path: String,
    /// UCI `Threads` option, left at the engine default when unset.
    pub threads: Option<u32>,
    /// UCI `Hash` option in MB, left at the engine default when unset.
    pub hash_mb: Option<u32>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            path: "stockfish".to_string(),
            threads: None,
            hash_mb: None,
        }
    }
}

/// Wrapper for UCI-compatible analysis engines like Stockfish.
///
/// The process lives as long as this value. Dropping it sends `quit` and
/// kills the process if it does not exit promptly.
pub struct AnalysisEngine {
    process: Child,
    session: UciSession<BufReader<ChildStdout>, ChildStdin>,
    name: String,
}

impl AnalysisEngine {
    /// Spawns the engine and performs the UCI handshake.
    ///
    /// # Errors
    ///
    /// - `EngineError::NotFound` if the executable does not exist
    /// - `EngineError::SpawnError` if the process fails to start
    /// - `EngineError::InitFailed` if the handshake fails
    pub fn new(options: &EngineOptions) -> Result<Self, EngineError> {
        let path = options.path.as_str();
        // Bare names go through PATH; anything with a separator must exist.
        if path.contains(std::path::MAIN_SEPARATOR) && !Path::new(path).exists() {
            return Err(EngineError::NotFound(path.to_string()));
        }

        let mut process = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound => EngineError::NotFound(path.to_string()),
                _ => EngineError::SpawnError {
                    path: path.to_string(),
                    source,
                },
            })?;

        let pipes = process.stdin.take().zip(process.stdout.take());
        let Some((stdin, stdout)) = pipes else {
            let _ = process.kill();
            return Err(EngineError::InitFailed(UciError::Disconnected));
        };

        let mut engine = Self {
            process,
            session: UciSession::new(BufReader::new(stdout), stdin),
            name: String::new(),
        };
        engine.init(options)?;
        Ok(engine)
    }

    fn init(&mut self, options: &EngineOptions) -> Result<(), EngineError> {
        let id = self.session.handshake().map_err(EngineError::InitFailed)?;
        debug!(author = ?id.author, "engine identified");
        self.name = id.name.unwrap_or_else(|| "Unknown Engine".to_string());

        let settings = [("Threads", options.threads), ("Hash", options.hash_mb)];
        let mut changed = false;
        for (name, value) in settings {
            if let Some(value) = value {
                self.session
                    .send(&GuiCommand::SetOption {
                        name: name.to_string(),
                        value: Some(value.to_string()),
                    })
                    .map_err(EngineError::InitFailed)?;
                changed = true;
            }
        }
        if changed {
            self.session.is_ready().map_err(EngineError::InitFailed)?;
        }

        info!(engine = %self.name, "engine ready");
        Ok(())
    }

    /// Returns the engine's name as reported via UCI protocol.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sends `quit` and waits for the process to exit.
    pub fn quit(mut self) -> Result<(), EngineError> {
        self.session.send(&GuiCommand::Quit)?;
        self.wait_or_kill();
        Ok(())
    }

    fn wait_or_kill(&mut self) {
        let deadline = Instant::now() + QUIT_GRACE;
        loop {
            match self.process.try_wait() {
                Ok(Some(_)) => return,
                Ok(None) if Instant::now() < deadline => thread::sleep(Duration::from_millis(10)),
                _ => break,
            }
        }
        warn!(engine = %self.name, "engine did not exit, killing it");
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

impl PositionEvaluator for AnalysisEngine {
    fn evaluate(
        &mut self,
        position: &Position,
        depth: u32,
    ) -> Result<EngineEvaluation, EngineError> {
        self.session.send(&GuiCommand::Position {
            fen: position.fen.clone(),
        })?;
        let outcome = self.session.search(GoOptions::depth(depth))?;

        let info = outcome.info.unwrap_or_default();
        let evaluation = EngineEvaluation {
            score: info.score.map(Evaluation::from),
            best_move: outcome.best_move,
            depth: info.depth,
        };
        debug!(ply = position.ply, ?evaluation, "evaluated position");
        Ok(evaluation)
    }

    fn new_game(&mut self) -> Result<(), EngineError> {
        self.session.send(&GuiCommand::UciNewGame)?;
        self.session.is_ready()?;
        Ok(())
    }
}

impl Drop for AnalysisEngine {
    fn drop(&mut self) {
        if matches!(self.process.try_wait(), Ok(Some(_))) {
            return;
        }
        // Try to send quit command to gracefully terminate the engine
        let _ = self.session.send(&GuiCommand::Quit);
        self.wait_or_kill();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_not_found() {
        let options = EngineOptions {
            path: "/nonexistent/path/to/stockfish".to_string(),
            ..EngineOptions::default()
        };
        match AnalysisEngine::new(&options) {
            Err(EngineError::NotFound(path)) => {
                assert_eq!(path, "/nonexistent/path/to/stockfish");
            }
            Err(other) => panic!("Expected NotFound error, got {other}"),
            Ok(_) => panic!("Expected NotFound error"),
        }
    }

    #[test]
    fn test_bare_name_not_on_path() {
        let options = EngineOptions {
            path: "definitely-not-an-installed-engine-4821".to_string(),
            ..EngineOptions::default()
        };
        assert!(matches!(
            AnalysisEngine::new(&options),
            Err(EngineError::NotFound(_))
        ));
    }

    #[test]
    fn test_non_uci_process_fails_handshake() {
        // `true` exits immediately without speaking UCI.
        if !Path::new("/bin/true").exists() {
            return;
        }
        let options = EngineOptions {
            path: "/bin/true".to_string(),
            ..EngineOptions::default()
        };
        assert!(matches!(
            AnalysisEngine::new(&options),
            Err(EngineError::InitFailed(_))
        ));
    }

    #[test]
    fn test_default_options() {
        let options = EngineOptions::default();
        assert_eq!(options.path, "stockfish");
        assert_eq!(options.threads, None);
        assert_eq!(options.hash_mb, None);
    }

    #[test]
    fn test_engine_error_display() {
        let spawn_err = EngineError::SpawnError {
            path: "sf".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(spawn_err.to_string().contains("failed to spawn engine sf"));

        let not_found = EngineError::NotFound("/path/to/engine".to_string());
        assert!(not_found.to_string().contains("/path/to/engine"));

        let init_failed = EngineError::InitFailed(UciError::Disconnected);
        assert!(init_failed
            .to_string()
            .starts_with("engine initialization failed"));

        let protocol = EngineError::from(UciError::Disconnected);
        assert!(matches!(protocol, EngineError::Protocol(_)));
    }
}
