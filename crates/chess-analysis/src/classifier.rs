//! Move quality classification.
//!
//! A [`MoveClassifier`] walks an ordered rule table and returns the label of
//! the first rule whose condition holds. The table always ends in a fallback
//! label, so every move gets exactly one [`Classification`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::evaluation::Evaluation;

/// Classification of move quality, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Gains far more than the engine expected
    Brilliant,
    /// Strong move, usually the only good one
    Great,
    /// The engine's choice or equally good
    Best,
    /// Minimal centipawn loss
    Excellent,
    /// Small centipawn loss
    Good,
    /// Found in the opening book
    Book,
    /// Noticeable centipawn loss
    Inaccuracy,
    /// Significant centipawn loss
    Mistake,
    /// Missed a winning continuation
    Miss,
    /// Major centipawn loss
    Blunder,
}

impl Classification {
    /// Every label, in display order.
    pub const ALL: [Classification; 10] = [
        Classification::Brilliant,
        Classification::Great,
        Classification::Best,
        Classification::Excellent,
        Classification::Good,
        Classification::Book,
        Classification::Inaccuracy,
        Classification::Mistake,
        Classification::Miss,
        Classification::Blunder,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Classification::Brilliant => "Brilliant",
            Classification::Great => "Great",
            Classification::Best => "Best",
            Classification::Excellent => "Excellent",
            Classification::Good => "Good",
            Classification::Book => "Book",
            Classification::Inaccuracy => "Inaccuracy",
            Classification::Mistake => "Mistake",
            Classification::Miss => "Miss",
            Classification::Blunder => "Blunder",
        }
    }

    /// Position in [`Classification::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a rule tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// The played move is an opening-book move.
    InBook,
    /// The mover had a single legal move.
    Forced,
    /// The played move is the engine's suggestion.
    MatchesBest,
    /// The swing is at least this many centipawns.
    SwingAtLeast(i32),
}

/// One row of the decision table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRule {
    pub when: Condition,
    pub label: Classification,
}

impl ClassificationRule {
    pub const fn new(when: Condition, label: Classification) -> Self {
        Self { when, label }
    }
}

/// Decision table plus the labels used outside of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Evaluated top to bottom, first match wins.
    pub rules: Vec<ClassificationRule>,
    /// Label when no rule matches.
    pub fallback: Classification,
    /// Label for the opening ply when no prior evaluation exists.
    pub first_move: Classification,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl ClassifierConfig {
    /// Names accepted by [`ClassifierConfig::preset`].
    pub const PRESETS: [&'static str; 2] = ["standard", "lenient"];

    /// Default thresholds: Best ≥ 0, Good ≥ -10, Inaccuracy ≥ -50,
    /// Mistake ≥ -150, otherwise Blunder.
    pub fn standard() -> Self {
        use Classification::*;
        use Condition::*;

        Self {
            rules: vec![
                ClassificationRule::new(InBook, Book),
                ClassificationRule::new(Forced, Best),
                ClassificationRule::new(SwingAtLeast(200), Brilliant),
                ClassificationRule::new(MatchesBest, Best),
                ClassificationRule::new(SwingAtLeast(0), Best),
                ClassificationRule::new(SwingAtLeast(-10), Good),
                ClassificationRule::new(SwingAtLeast(-50), Inaccuracy),
                ClassificationRule::new(SwingAtLeast(-150), Mistake),
            ],
            fallback: Blunder,
            first_move: Best,
        }
    }

    /// Forgiving cut-offs in whole pawns: under 0.35 lost is Excellent,
    /// under 2.0 Good, under 2.5 Inaccuracy, under 3.5 Mistake, under 6.0
    /// Miss, anything more a Blunder.
    pub fn lenient() -> Self {
        use Classification::*;
        use Condition::*;

        Self {
            rules: vec![
                ClassificationRule::new(InBook, Book),
                ClassificationRule::new(Forced, Best),
                ClassificationRule::new(MatchesBest, Best),
                ClassificationRule::new(SwingAtLeast(-34), Excellent),
                ClassificationRule::new(SwingAtLeast(-199), Good),
                ClassificationRule::new(SwingAtLeast(-249), Inaccuracy),
                ClassificationRule::new(SwingAtLeast(-349), Mistake),
                ClassificationRule::new(SwingAtLeast(-599), Miss),
            ],
            fallback: Blunder,
            first_move: Best,
        }
    }

    /// Looks up a named rule set.
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "standard" => Some(Self::standard()),
            "lenient" => Some(Self::lenient()),
            _ => None,
        }
    }
}

/// A rule table that can never select one of its rules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("rule {index} (swing >= {threshold}) can never match: rule {shadowed_by} (swing >= {earlier}) comes first")]
pub struct RuleError {
    pub index: usize,
    pub threshold: i32,
    pub shadowed_by: usize,
    pub earlier: i32,
}

/// Which evaluation of a move is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalSlot {
    Before,
    After,
}

impl fmt::Display for EvalSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalSlot::Before => f.write_str("pre-move"),
            EvalSlot::After => f.write_str("post-move"),
        }
    }
}

/// Input that cannot be classified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("missing {slot} evaluation at ply {ply}")]
    MissingEvaluation { ply: usize, slot: EvalSlot },
}

impl ClassifyError {
    pub fn ply(&self) -> usize {
        match self {
            ClassifyError::MissingEvaluation { ply, .. } => *ply,
        }
    }
}

/// Everything the classifier looks at for one move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveContext {
    pub ply: usize,
    /// Engine score before the move, mover to move.
    pub before: Option<Evaluation>,
    /// Engine score after the move, opponent to move.
    pub after: Option<Evaluation>,
    pub matches_best: bool,
    pub forced: bool,
    pub in_book: bool,
}

impl MoveContext {
    /// Swing in centipawns from the mover's perspective, when both
    /// evaluations are known.
    pub fn swing(&self) -> Option<i32> {
        Some(swing(self.before?, self.after?))
    }
}

/// `(-after) - before`, using normalized scores. Positive favours the mover.
pub fn swing(before: Evaluation, after: Evaluation) -> i32 {
    after.flip().normalized() - before.normalized()
}

/// Maps a move to exactly one [`Classification`].
#[derive(Debug, Clone)]
pub struct MoveClassifier {
    config: ClassifierConfig,
}

impl Default for MoveClassifier {
    fn default() -> Self {
        Self {
            config: ClassifierConfig::standard(),
        }
    }
}

impl MoveClassifier {
    /// Builds a classifier, rejecting swing rules that an earlier swing rule
    /// makes unreachable.
    pub fn new(config: ClassifierConfig) -> Result<Self, RuleError> {
        let mut lowest: Option<(usize, i32)> = None;
        for (index, rule) in config.rules.iter().enumerate() {
            if let Condition::SwingAtLeast(threshold) = rule.when {
                match lowest {
                    Some((shadowed_by, earlier)) if earlier <= threshold => {
                        return Err(RuleError {
                            index,
                            threshold,
                            shadowed_by,
                            earlier,
                        });
                    }
                    _ => lowest = Some((index, threshold)),
                }
            }
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classifies one move.
    ///
    /// # Errors
    ///
    /// [`ClassifyError::MissingEvaluation`] when the post-move score is
    /// absent, or when the pre-move score is absent for any ply but the
    /// first.
    pub fn classify(&self, ctx: &MoveContext) -> Result<Classification, ClassifyError> {
        let after = ctx.after.ok_or(ClassifyError::MissingEvaluation {
            ply: ctx.ply,
            slot: EvalSlot::After,
        })?;
        let before = match ctx.before {
            Some(before) => before,
            None if ctx.ply == 0 => return Ok(self.config.first_move),
            None => {
                return Err(ClassifyError::MissingEvaluation {
                    ply: ctx.ply,
                    slot: EvalSlot::Before,
                })
            }
        };

        let swing = swing(before, after);
        let label = self
            .config
            .rules
            .iter()
            .find(|rule| match rule.when {
                Condition::InBook => ctx.in_book,
                Condition::Forced => ctx.forced,
                Condition::MatchesBest => ctx.matches_best,
                Condition::SwingAtLeast(min) => swing >= min,
            })
            .map_or(self.config.fallback, |rule| rule.label);

        Ok(label)
    }
}
