use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use super::widgets::{dashboard, schedule, topic_detail, topics};
use super::{App, View};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Help bar
        ])
        .split(f.area());

    draw_tabs(f, app, chunks[0]);
    draw_content(f, app, chunks[1]);
    draw_help_bar(f, app, chunks[2]);
}

fn draw_tabs(f: &mut Frame, app: &App, area: Rect) {
    let tab_titles = vec!["Dashboard", "Topics", "Schedule"];
    let selected = match app.view {
        View::Dashboard => 0,
        View::Topics | View::TopicDetail => 1,
        View::Schedule => 2,
    };

    let tabs = Tabs::new(tab_titles)
        .block(Block::default().borders(Borders::ALL).title(" Coach "))
        .select(selected)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(tabs, area);
}

fn draw_content(f: &mut Frame, app: &App, area: Rect) {
    match app.view {
        View::Dashboard => dashboard::draw(f, app, area),
        View::Topics => topics::draw(f, app, area),
        View::TopicDetail => topic_detail::draw(f, app, area),
        View::Schedule => schedule::draw(f, app, area),
    }
}

fn key_hint<'a>(key: &'a str, label: &'a str) -> [Span<'a>; 2] {
    [
        Span::styled(key, Style::default().fg(Color::Cyan)),
        Span::raw(label),
    ]
}

fn draw_help_bar(f: &mut Frame, app: &App, area: Rect) {
    let help_text: Vec<Span> = if app.filter_mode {
        vec![
            Span::styled("category/", Style::default().fg(Color::Yellow)),
            Span::raw(app.filter_input.as_str()),
            Span::styled("█", Style::default().fg(Color::Yellow)),
            Span::raw(" | "),
            Span::styled("<CR>", Style::default().fg(Color::Cyan)),
            Span::raw(" Apply  "),
            Span::styled("<Esc>", Style::default().fg(Color::Cyan)),
            Span::raw(" Cancel"),
        ]
    } else {
        let mut spans: Vec<Span> = key_hint("h/l", " Views  ").into();

        match app.view {
            View::Dashboard | View::Schedule => {
                spans.extend(key_hint("^r", " Refresh  "));
            }
            View::Topics => {
                spans.extend(key_hint("j/k", " Nav  "));
                spans.extend(key_hint("g/G", " Top/Bot  "));
                spans.extend(key_hint("l/<CR>", " Open  "));
                spans.extend(key_hint("/", " Category  "));
                if app.filter_category.is_some() {
                    spans.extend(key_hint("<Esc>", " Clear  "));
                }
            }
            View::TopicDetail => {
                spans.extend(key_hint("h/<Esc>", " Back  "));
                spans.extend(key_hint("^r", " Refresh  "));
            }
        }

        spans.extend(key_hint("q", " Quit"));
        spans
    };

    let help = Paragraph::new(Line::from(help_text)).style(Style::default().bg(Color::DarkGray));

    f.render_widget(help, area);
}
