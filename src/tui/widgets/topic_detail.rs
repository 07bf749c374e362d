use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use super::{create_mastery_bar, format_next_review, mastery_color};
use crate::tui::{App, TopicDetail};
use coach::models::Topic;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let Some(detail) = &app.detail else {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Topic Detail ");
        let paragraph = Paragraph::new("No topic selected").block(block);
        f.render_widget(paragraph, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Header info
            Constraint::Length(5), // Progress
            Constraint::Min(0),    // Graph neighbourhood
        ])
        .split(area);

    draw_header(f, detail, chunks[0]);
    draw_progress(f, detail, chunks[1]);

    let graph_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(30),
            Constraint::Percentage(40),
        ])
        .split(chunks[2]);

    draw_topic_list(f, " Prerequisites ", &detail.prerequisites, Color::Cyan, graph_chunks[0]);
    draw_topic_list(f, " Unlocks ", &detail.dependents, Color::Green, graph_chunks[1]);
    draw_path(f, detail, graph_chunks[2]);
}

fn draw_header(f: &mut Frame, detail: &TopicDetail, area: Rect) {
    let topic = &detail.entry.topic;
    let description = topic.description.as_deref().unwrap_or("No description");
    let category = if topic.category.is_empty() {
        "None"
    } else {
        topic.category.as_str()
    };
    let depth = match detail.depth {
        Some(depth) => depth.to_string(),
        None => "cycle!".to_string(),
    };

    let text = vec![
        Line::from(vec![
            Span::styled("Description: ", Style::default().fg(Color::Gray)),
            Span::styled(description, Style::default().fg(Color::White)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Category: ", Style::default().fg(Color::Gray)),
            Span::styled(category, Style::default().fg(Color::Cyan)),
            Span::raw("  "),
            Span::styled("Difficulty: ", Style::default().fg(Color::Gray)),
            Span::styled(topic.difficulty_label(), Style::default().fg(Color::Yellow)),
            Span::raw("  "),
            Span::styled("Depth: ", Style::default().fg(Color::Gray)),
            Span::styled(depth, Style::default().fg(Color::White)),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", topic.name))
        .title_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn draw_progress(f: &mut Frame, detail: &TopicDetail, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Progress ")
        .title_style(Style::default().fg(Color::Cyan));

    let Some(progress) = &detail.entry.progress else {
        let paragraph = Paragraph::new("Not studied yet.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(paragraph, area);
        return;
    };
    let review = &progress.review;

    let text = vec![
        Line::from(vec![
            Span::styled("Mastery: ", Style::default().fg(Color::Gray)),
            Span::styled(
                create_mastery_bar(progress.mastery_level),
                Style::default().fg(mastery_color(progress.mastery_level)),
            ),
            Span::styled(
                format!(" {:.0} ({})", progress.mastery_level, progress.mastery_label()),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw("  "),
            Span::styled("Studied: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{} min", progress.time_spent_minutes),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Ease: ", Style::default().fg(Color::Gray)),
            Span::styled(format!("{:.2}", review.ease_factor), Style::default().fg(Color::White)),
            Span::raw("  "),
            Span::styled("Interval: ", Style::default().fg(Color::Gray)),
            Span::styled(format!("{}d", review.interval_days), Style::default().fg(Color::White)),
            Span::raw("  "),
            Span::styled("Streak: ", Style::default().fg(Color::Gray)),
            Span::styled(format!("{}", review.repetition_count), Style::default().fg(Color::White)),
            Span::raw("  "),
            Span::styled("Next: ", Style::default().fg(Color::Gray)),
            Span::styled(format_next_review(review.next_review_date), Style::default().fg(Color::White)),
        ]),
    ];

    let paragraph = Paragraph::new(text).block(block);
    f.render_widget(paragraph, area);
}

fn draw_topic_list(f: &mut Frame, title: &str, topics: &[Topic], color: Color, area: Rect) {
    let items: Vec<ListItem> = topics
        .iter()
        .map(|topic| {
            ListItem::new(Line::from(vec![
                Span::styled("• ", Style::default().fg(color)),
                Span::styled(topic.name.as_str(), Style::default().fg(Color::White)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("{}({}) ", title, topics.len()))
        .title_style(Style::default().fg(color));

    f.render_widget(List::new(items).block(block), area);
}

fn draw_path(f: &mut Frame, detail: &TopicDetail, area: Rect) {
    let items: Vec<ListItem> = detail
        .path
        .iter()
        .enumerate()
        .map(|(i, topic)| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:>2}. ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(topic.name.as_str(), Style::default().fg(Color::White)),
                Span::styled(
                    format!("  L{}", topic.difficulty_level),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Learning Path ({}) ", detail.path.len()))
        .title_style(Style::default().fg(Color::Magenta));

    if items.is_empty() {
        let paragraph = Paragraph::new("Everything on the way here is done!")
            .style(Style::default().fg(Color::Green))
            .block(block);
        f.render_widget(paragraph, area);
    } else {
        f.render_widget(List::new(items).block(block), area);
    }
}
