use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use super::format_next_review;
use crate::truncate;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(10), // Stats + due reviews row
            Constraint::Min(0),     // Weak topics
        ])
        .split(area);

    let top_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[0]);

    draw_stats(f, app, top_chunks[0]);
    draw_due_reviews(f, app, top_chunks[1]);
    draw_weak_topics(f, app, chunks[1]);
}

fn stat_line<'a>(label: &'a str, value: String, color: Color) -> Line<'a> {
    Line::from(vec![
        Span::styled(label, Style::default().fg(Color::Gray)),
        Span::styled(value, Style::default().fg(color)),
    ])
}

fn draw_stats(f: &mut Frame, app: &App, area: Rect) {
    let stats = &app.stats;
    let accuracy = if stats.total_answers > 0 {
        format!(
            "{:.0}% of {}",
            stats.correct_answers as f64 / stats.total_answers as f64 * 100.0,
            stats.total_answers
        )
    } else {
        "-".to_string()
    };

    let text = vec![
        Line::from(vec![
            Span::styled("Tracked: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", stats.tracked_topics),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        stat_line("Completed: ", format!("{}", stats.completed), Color::Green),
        stat_line(
            "Due: ",
            format!("{}", stats.due_now),
            if stats.due_now > 0 {
                Color::Yellow
            } else {
                Color::White
            },
        ),
        stat_line("Reviews: ", format!("{}", stats.total_reviews), Color::White),
        stat_line("Answers: ", accuracy, Color::White),
        stat_line("Avg Mastery: ", format!("{:.1}", stats.avg_mastery), Color::Cyan),
        stat_line("Retention: ", format!("{:.1}", app.retention), Color::Cyan),
        stat_line(
            "Time: ",
            format!("{}h {}m", stats.minutes_studied / 60, stats.minutes_studied % 60),
            Color::White,
        ),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Stats ")
        .title_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(text).block(block);
    f.render_widget(paragraph, area);
}

fn draw_due_reviews(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .due_reviews
        .iter()
        .enumerate()
        .map(|(i, item)| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{}. ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(
                    format!("{:<22}", truncate(&item.topic_name, 20)),
                    Style::default().fg(Color::Yellow),
                ),
                Span::styled(
                    format_next_review(item.next_review_date),
                    Style::default().fg(Color::Red),
                ),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Due Reviews ")
        .title_style(Style::default().fg(Color::Yellow));

    if items.is_empty() {
        let paragraph = Paragraph::new("Nothing due. Nice!")
            .style(Style::default().fg(Color::Green))
            .block(block);
        f.render_widget(paragraph, area);
    } else {
        f.render_widget(List::new(items).block(block), area);
    }
}

fn draw_weak_topics(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .weak_topics
        .iter()
        .map(|weak| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<22}", truncate(&weak.topic_id, 20)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{:>5.0}% ", weak.accuracy * 100.0),
                    Style::default().fg(Color::Red),
                ),
                Span::styled(
                    format!("{:>3} tries  ", weak.attempts),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(weak.reasons.join("; "), Style::default().fg(Color::Gray)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Weak Topics ")
        .title_style(Style::default().fg(Color::Magenta));

    if items.is_empty() {
        let paragraph = Paragraph::new("No weak topics detected yet.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(paragraph, area);
    } else {
        f.render_widget(List::new(items).block(block), area);
    }
}
