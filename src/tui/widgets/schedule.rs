use chrono::NaiveDate;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

use crate::truncate;
use crate::tui::App;
use coach::scheduler::DATE_FORMAT;

const NAMES_PER_DAY: usize = 4;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .schedule
        .iter()
        .map(|(date, reviews)| {
            let day = NaiveDate::parse_from_str(date, DATE_FORMAT)
                .map(|d| d.format("%a %b %d").to_string())
                .unwrap_or_else(|_| date.clone());

            let mut names: Vec<String> = reviews
                .iter()
                .take(NAMES_PER_DAY)
                .map(|item| truncate(&item.topic_name, 18))
                .collect();
            if reviews.len() > NAMES_PER_DAY {
                names.push(format!("+{} more", reviews.len() - NAMES_PER_DAY));
            }

            let count_color = match reviews.len() {
                0 => Color::DarkGray,
                1..=5 => Color::Green,
                6..=15 => Color::Yellow,
                _ => Color::Red,
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<12}", day),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("{:>3}  ", reviews.len()), Style::default().fg(count_color)),
                Span::styled(names.join(", "), Style::default().fg(Color::Gray)),
            ]))
        })
        .collect();

    let total: usize = app.schedule.values().map(Vec::len).sum();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Next {} Days ({} reviews) ", app.schedule.len(), total))
        .title_style(Style::default().fg(Color::Cyan));

    f.render_widget(List::new(items).block(block), area);
}
