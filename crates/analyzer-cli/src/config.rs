//! Configuration file loading for the analyzer.
//!
//! Settings come from `chess-analyze.toml` in the working directory, or
//! from the file given with `--config`. Every section is optional.

use std::path::{Path, PathBuf};

use chess_analysis::{
    AnalysisConfig, Classification, ClassificationRule, ClassifierConfig, EngineOptions,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    /// Classifier preset name is not one of the built-in presets.
    #[error("Unknown classifier preset: {0}")]
    UnknownPreset(String),
}

/// Opening book settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct BookConfig {
    /// Bundled book name or path to a Polyglot `.bin` file.
    pub name: String,
    /// Directory holding the bundled books. A relative path that does not
    /// exist under the working directory is looked up next to the executable.
    pub books_dir: PathBuf,
    /// Set to false to skip book detection entirely.
    pub enabled: bool,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            name: chess_analysis::book::DEFAULT_BOOK.to_string(),
            books_dir: PathBuf::from("books"),
            enabled: true,
        }
    }
}

impl BookConfig {
    /// Directory the bundled book names resolve against.
    pub fn resolved_books_dir(&self) -> PathBuf {
        let exe = std::env::current_exe().ok();
        self.books_dir_from(exe.as_deref().and_then(Path::parent))
    }

    fn books_dir_from(&self, exe_dir: Option<&Path>) -> PathBuf {
        if self.books_dir.is_absolute() || self.books_dir.exists() {
            return self.books_dir.clone();
        }
        match exe_dir {
            Some(dir) => dir.join(&self.books_dir),
            None => self.books_dir.clone(),
        }
    }
}

/// Classifier settings: a preset, optionally overridden piecewise.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ClassifierSection {
    pub preset: String,
    pub first_move: Option<Classification>,
    pub fallback: Option<Classification>,
    /// Replaces the preset's rule table when present.
    pub rules: Option<Vec<ClassificationRule>>,
}

impl Default for ClassifierSection {
    fn default() -> Self {
        Self {
            preset: "standard".to_string(),
            first_move: None,
            fallback: None,
            rules: None,
        }
    }
}

impl ClassifierSection {
    /// Resolves the preset and applies overrides.
    pub fn build(&self) -> Result<ClassifierConfig, ConfigError> {
        let mut config = ClassifierConfig::preset(&self.preset)
            .ok_or_else(|| ConfigError::UnknownPreset(self.preset.clone()))?;
        if let Some(rules) = &self.rules {
            config.rules = rules.clone();
        }
        if let Some(label) = self.first_move {
            config.first_move = label;
        }
        if let Some(label) = self.fallback {
            config.fallback = label;
        }
        Ok(config)
    }
}

/// Main analyzer configuration structure.
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub engine: EngineOptions,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub book: BookConfig,
    #[serde(default)]
    pub classifier: ClassifierSection,
}

impl AnalyzerConfig {
    /// Loads configuration.
    ///
    /// An explicit path must exist. Without one, [`Self::config_path()`] is
    /// used when present and defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file cannot be read,
    /// or [`ConfigError::ParseError`] if the file contains invalid TOML.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = Self::config_path();
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let content = std::fs::read_to_string(&config_path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Returns the path to the default configuration file.
    pub fn config_path() -> PathBuf {
        PathBuf::from("chess-analyze.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_analysis::Condition;
    use std::io::Write;

    #[test]
    fn test_parse_valid_toml_config() {
        let toml_content = r#"
[engine]
path = "/usr/games/stockfish"
threads = 4
hash_mb = 256

[analysis]
depth = 20

[book]
name = "gm2600"
books_dir = "/opt/books"

[classifier]
preset = "lenient"
first_move = "book"
"#;

        let config: AnalyzerConfig = toml::from_str(toml_content).unwrap();

        assert_eq!(config.engine.path, "/usr/games/stockfish");
        assert_eq!(config.engine.threads, Some(4));
        assert_eq!(config.engine.hash_mb, Some(256));
        assert_eq!(config.analysis.depth, 20);
        assert_eq!(config.book.name, "gm2600");
        assert_eq!(config.book.books_dir, PathBuf::from("/opt/books"));
        assert!(config.book.enabled);

        let classifier = config.classifier.build().unwrap();
        assert_eq!(classifier.rules, ClassifierConfig::lenient().rules);
        assert_eq!(classifier.first_move, Classification::Book);
    }

    #[test]
    fn test_empty_config_defaults() {
        let config: AnalyzerConfig = toml::from_str("").unwrap();

        assert_eq!(config, AnalyzerConfig::default());
        assert_eq!(config.engine.path, "stockfish");
        assert_eq!(config.analysis.depth, 15);
        assert_eq!(config.book.name, "Human");
        assert_eq!(config.classifier.build().unwrap(), ClassifierConfig::standard());
    }

    #[test]
    fn test_custom_rules_replace_preset() {
        let toml_content = r#"
[classifier]
fallback = "mistake"
rules = [
    { when = "in_book", label = "book" },
    { when = { swing_at_least = -20 }, label = "best" },
    { when = { swing_at_least = -100 }, label = "inaccuracy" },
]
"#;
        let config: AnalyzerConfig = toml::from_str(toml_content).unwrap();
        let classifier = config.classifier.build().unwrap();

        assert_eq!(classifier.rules.len(), 3);
        assert_eq!(classifier.rules[1].when, Condition::SwingAtLeast(-20));
        assert_eq!(classifier.rules[2].label, Classification::Inaccuracy);
        assert_eq!(classifier.fallback, Classification::Mistake);
        assert_eq!(classifier.first_move, Classification::Best);
    }

    #[test]
    fn test_unknown_preset_is_detected() {
        let config: AnalyzerConfig = toml::from_str("[classifier]\npreset = \"strict\"").unwrap();
        match config.classifier.build() {
            Err(ConfigError::UnknownPreset(name)) => assert_eq!(name, "strict"),
            other => panic!("Expected UnknownPreset error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[analysis]\ndepth = \"deep\"").unwrap();

        let result = AnalyzerConfig::load(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[engine]\npath = \"/opt/sf\"\n\n[book]\nenabled = false").unwrap();

        let config = AnalyzerConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.engine.path, "/opt/sf");
        assert!(!config.book.enabled);
        assert_eq!(config.analysis.depth, 15);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = AnalyzerConfig::load(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::ReadError(_))));
    }

    #[test]
    fn test_books_dir_falls_back_to_executable_dir() {
        let exe_dir = tempfile::tempdir().unwrap();
        let book = BookConfig {
            books_dir: PathBuf::from("no-such-books-dir"),
            ..BookConfig::default()
        };

        assert_eq!(
            book.books_dir_from(Some(exe_dir.path())),
            exe_dir.path().join("no-such-books-dir")
        );
        assert_eq!(book.books_dir_from(None), PathBuf::from("no-such-books-dir"));
    }

    #[test]
    fn test_existing_or_absolute_books_dir_is_kept() {
        let books = tempfile::tempdir().unwrap();
        let exe_dir = tempfile::tempdir().unwrap();
        let book = BookConfig {
            books_dir: books.path().to_path_buf(),
            ..BookConfig::default()
        };

        assert_eq!(book.books_dir_from(Some(exe_dir.path())), books.path());
    }

    #[test]
    fn test_config_path_returns_expected_path() {
        assert_eq!(
            AnalyzerConfig::config_path(),
            PathBuf::from("chess-analyze.toml")
        );
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut config = AnalyzerConfig::default();
        config.engine.threads = Some(2);
        config.classifier.fallback = Some(Classification::Miss);

        let serialized = toml::to_string(&config).unwrap();
        let deserialized: AnalyzerConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized, config);
    }
}
