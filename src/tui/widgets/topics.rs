use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::{create_mastery_bar, format_next_review, is_overdue, mastery_color};
use crate::truncate;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let title = if let Some(category) = &app.filter_category {
        format!(" Topics (category: {}) ", category)
    } else {
        " Topics ".to_string()
    };

    let items: Vec<ListItem> = app
        .topics
        .items
        .iter()
        .map(|entry| {
            let mastery = entry.mastery_level();
            let label = entry
                .progress
                .as_ref()
                .map_or("Not started", |p| p.mastery_label());
            let next = entry.next_review();

            let (next_color, next_text) = if is_overdue(next) {
                (Color::Red, format!("{} !", format_next_review(next)))
            } else {
                (Color::White, format_next_review(next))
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<30}", truncate(&entry.topic.name, 28)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{:<4}", entry.topic.difficulty_level),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(create_mastery_bar(mastery), Style::default().fg(mastery_color(mastery))),
                Span::styled(format!(" {:>3.0} ", mastery), Style::default().fg(Color::Yellow)),
                Span::styled(format!("{:<12}", label), Style::default().fg(Color::Cyan)),
                Span::styled(next_text, Style::default().fg(next_color)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(Color::Cyan));

    let header_style = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::BOLD);
    let header = Line::from(vec![
        Span::styled(format!("{:<30}", "Name"), header_style),
        Span::styled("Lvl ", header_style),
        Span::styled("Mastery         ", header_style),
        Span::styled(format!("{:<12}", "Stage"), header_style),
        Span::styled("Next Review", header_style),
    ]);

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.topics.selected);

    // Header sits on the first row inside the border
    let header_area = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: 1,
    };
    f.render_widget(Paragraph::new(header), header_area);

    let list_area = Rect {
        x: area.x,
        y: area.y + 1,
        width: area.width,
        height: area.height.saturating_sub(1),
    };

    f.render_stateful_widget(list, list_area, &mut state);
}
