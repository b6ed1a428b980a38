//! UCI command formatting.

/// Commands sent from GUI to engine.
#[derive(Debug, Clone, PartialEq)]
pub enum GuiCommand {
    /// Initialize UCI mode.
    Uci,
    /// Check if engine is ready.
    IsReady,
    /// The next positions belong to a new game.
    UciNewGame,
    /// Set an engine option.
    SetOption {
        name: String,
        value: Option<String>,
    },
    /// Set up the position to search from a FEN.
    Position { fen: String },
    /// Start calculating.
    Go(GoOptions),
    /// Quit the engine.
    Quit,
}

/// Options for the `go` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoOptions {
    /// Search to this depth.
    pub depth: u32,
}

impl GoOptions {
    /// Fixed-depth search.
    pub fn depth(depth: u32) -> Self {
        Self { depth }
    }
}

impl GuiCommand {
    /// Format the command as a single protocol line (without newline).
    pub fn to_uci(&self) -> String {
        match self {
            GuiCommand::Uci => "uci".to_string(),
            GuiCommand::IsReady => "isready".to_string(),
            GuiCommand::UciNewGame => "ucinewgame".to_string(),
            GuiCommand::SetOption { name, value } => match value {
                Some(v) => format!("setoption name {} value {}", name, v),
                None => format!("setoption name {}", name),
            },
            GuiCommand::Position { fen } => format!("position fen {}", fen),
            GuiCommand::Go(opts) => format!("go depth {}", opts.depth),
            GuiCommand::Quit => "quit".to_string(),
        }
    }
}
