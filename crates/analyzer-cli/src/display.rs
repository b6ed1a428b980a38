//! Terminal rendering of the analysis report.
//!
//! Everything here builds strings; `main` decides where they go.

use std::path::Path;

use chess_analysis::{
    Classification, Evaluation, LoadedGame, ProgressEvent, Report, ReportRow, Side, MATE_SCORE,
};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Cells in the evaluation bar.
const BAR_CELLS: usize = 20;
/// Centipawn score that fills the bar completely.
const BAR_CLAMP_CP: i32 = 300;
/// Swings this large come from mate scores.
const MATE_SWING: i32 = MATE_SCORE - 1_000;

/// Colors a label the way the summary and move table show it.
pub fn colorize_label(label: Classification, text: &str) -> ColoredString {
    match label {
        Classification::Brilliant => text.bright_magenta().bold(),
        Classification::Great => text.green().bold(),
        Classification::Best => text.green(),
        Classification::Excellent => text.cyan(),
        Classification::Good => text.blue(),
        Classification::Book => text.white(),
        Classification::Inaccuracy => text.yellow(),
        Classification::Mistake => text.magenta(),
        Classification::Miss => text.truecolor(255, 165, 0),
        Classification::Blunder => text.red().bold(),
    }
}

/// Header panel: players, time control, termination, length.
pub fn render_header(pgn_file: &Path, game: &LoadedGame) -> String {
    let info = &game.info;
    let name = |n: &Option<String>| n.clone().unwrap_or_else(|| "Unknown".to_string());
    let elo = |e: &Option<String>| e.clone().unwrap_or_else(|| "N/A".to_string());
    let file_name = pgn_file
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| pgn_file.display().to_string());

    let lines = [
        format!(
            "{} {} {}",
            "White:".bold(),
            name(&info.white),
            format!("(Elo: {})", elo(&info.white_elo)).cyan()
        ),
        format!(
            "{} {} {}",
            "Black:".bold(),
            name(&info.black),
            format!("(Elo: {})", elo(&info.black_elo)).cyan()
        ),
        format!(
            "{} {} {}",
            "Time Control:".yellow(),
            info.time_control_label(),
            format!("({})", info.time_control_category()).green()
        ),
        format!(
            "{} {}",
            "Termination:".magenta(),
            info.termination.as_deref().unwrap_or("Unknown")
        ),
        format!("{} {}", "Total Moves:".bold(), game.full_moves()),
    ];

    let title = format!(" Analyzing: {} ", file_name);
    let mut out = String::new();
    out.push_str(&format!("{}\n", format!("┌{:─<60}", title).blue()));
    for line in lines {
        out.push_str(&format!("{} {}\n", "│".blue(), line));
    }
    out.push_str(&format!("{}\n", format!("└{}", "─".repeat(60)).blue()));
    out
}

/// Score from White's side, for the bar and the eval column.
fn white_view(row: &ReportRow) -> Option<Evaluation> {
    row.eval_after.map(|e| match row.side {
        Side::White => e,
        Side::Black => e.flip(),
    })
}

/// Splits the bar into (white, black) cells for a White-relative score.
pub fn bar_cells(eval: Evaluation) -> (usize, usize) {
    let cp = eval.normalized().clamp(-BAR_CLAMP_CP, BAR_CLAMP_CP);
    let half = BAR_CELLS / 2;
    let filled = (half as i32 * cp / BAR_CLAMP_CP).unsigned_abs() as usize;
    if cp >= 0 {
        (half + filled, half - filled)
    } else {
        (half - filled, half + filled)
    }
}

/// Evaluation bar, white cells showing White's advantage.
pub fn eval_bar(eval: Option<Evaluation>) -> String {
    match eval {
        Some(eval) => {
            let (white, black) = bar_cells(eval);
            format!(
                "{}{}",
                "█".repeat(white).white(),
                "█".repeat(black).bright_black()
            )
        }
        None => format!(
            "{}{}",
            "█".repeat(BAR_CELLS / 2).yellow(),
            " ".repeat(BAR_CELLS - BAR_CELLS / 2)
        ),
    }
}

/// Swing in pawns, `±M` when a mate was gained or lost.
pub fn format_swing(swing: Option<i32>) -> String {
    match swing {
        None => "-".to_string(),
        Some(s) if s >= MATE_SWING => "+M".to_string(),
        Some(s) if s <= -MATE_SWING => "-M".to_string(),
        Some(s) => format!("{:+.2}", s as f64 / 100.0),
    }
}

fn move_label(row: &ReportRow) -> String {
    match row.side {
        Side::White => format!("{}.", row.move_number),
        Side::Black => format!("{}...", row.move_number),
    }
}

/// The per-move table.
pub fn render_moves(report: &Report) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n",
        format!(
            "{:<8} {:<8} {:<8} {:<8} {:<10} {:<6} {:<11} Bar",
            "Move #", "Move", "Eval", "ΔEval", "Best Move", "Depth", "Accuracy"
        )
        .cyan()
        .bold()
    ));

    for row in &report.rows {
        let number = format!("{:<8}", move_label(row));
        let number = match row.side {
            Side::White => number.white().bold(),
            Side::Black => number.bright_black().bold(),
        };
        let eval = white_view(row).map_or_else(|| "-".to_string(), |e| e.to_string());
        let label = format!("{:<11}", row.classification.name());

        out.push_str(&format!(
            "{} {:<8} {:<8} {:<8} {:<10} {:<6} {} {}\n",
            number,
            row.san,
            eval,
            format_swing(row.swing),
            row.best_move.as_deref().unwrap_or(""),
            row.depth.map_or_else(|| "-".to_string(), |d| d.to_string()),
            colorize_label(row.classification, &label),
            eval_bar(white_view(row)),
        ));
    }
    out
}

/// Label counts per player plus average loss.
pub fn render_summary(report: &Report) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "Summary".green().bold()));
    out.push_str(&format!(
        "{}\n",
        format!("{:<14} {:>6} {:>6}", "", "White", "Black").cyan().bold()
    ));

    for label in Classification::ALL {
        let name = format!("{:<14}", label.name());
        out.push_str(&format!(
            "{} {:>6} {:>6}\n",
            colorize_label(label, &name),
            report.white.count(label),
            report.black.count(label),
        ));
    }

    out.push_str(&format!(
        "{:<14} {:>6} {:>6}\n",
        "Moves", report.white.moves, report.black.moves
    ));
    out.push_str(&format!(
        "{:<14} {:>6.1} {:>6.1}\n",
        "Avg CP loss",
        report.white.average_cp_loss(),
        report.black.average_cp_loss()
    ));
    out
}

/// Progress bar over the plies of a game.
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let progress_bar = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ");
    progress_bar.set_style(style);
    progress_bar
}

/// Applies one pipeline event to the bar.
pub fn update_progress(bar: &ProgressBar, event: &ProgressEvent) {
    bar.set_position(event.ply as u64 + 1);
    bar.set_message(format!("Δ {}", format_swing(event.swing)));
}
