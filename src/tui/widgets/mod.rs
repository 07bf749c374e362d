pub mod dashboard;
pub mod schedule;
pub mod topic_detail;
pub mod topics;

use chrono::{DateTime, Utc};
use ratatui::style::Color;

const MASTERY_BAR_CELLS: usize = 10;

/// Ten-cell bar for a 0-100 mastery level.
pub fn create_mastery_bar(level: f64) -> String {
    let filled = ((level.clamp(0.0, 100.0) / 100.0) * MASTERY_BAR_CELLS as f64).round() as usize;
    format!(
        "{}{}",
        "█".repeat(filled),
        "░".repeat(MASTERY_BAR_CELLS - filled)
    )
}

pub fn mastery_color(level: f64) -> Color {
    if level >= 70.0 {
        Color::Green
    } else if level >= 40.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

pub fn format_next_review(next_review: Option<DateTime<Utc>>) -> String {
    match next_review {
        Some(dt) => dt.format("%b %d").to_string(),
        None => "Not set".to_string(),
    }
}

pub fn is_overdue(next_review: Option<DateTime<Utc>>) -> bool {
    matches!(next_review, Some(dt) if dt < Utc::now())
}
