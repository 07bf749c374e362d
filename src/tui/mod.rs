mod ui;
mod widgets;

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::time::Duration;

use chrono::Utc;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use coach::config::Config;
use coach::db::{Database, Stats};
use coach::graph::KnowledgeGraph;
use coach::models::{Progress, ReviewItem, Topic, TopicWithProgress};
use coach::scheduler::{SpacedRepetitionScheduler, DEFAULT_SCHEDULE_DAYS};
use coach::weakness::{WeakTopic, WeaknessAnalyzer, DEFAULT_MIN_ATTEMPTS, DEFAULT_WEAKNESS_THRESHOLD};

const DASHBOARD_LIST_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Topics,
    TopicDetail,
    Schedule,
}

impl View {
    fn next(&self) -> Self {
        match self {
            View::Dashboard => View::Topics,
            View::Topics => View::Schedule,
            View::TopicDetail => View::Topics,
            View::Schedule => View::Dashboard,
        }
    }

    fn prev(&self) -> Self {
        match self {
            View::Dashboard => View::Schedule,
            View::Topics => View::Dashboard,
            View::TopicDetail => View::Topics,
            View::Schedule => View::Topics,
        }
    }
}

pub struct StatefulList<T> {
    pub items: Vec<T>,
    pub selected: Option<usize>,
}

impl<T> StatefulList<T> {
    fn with_items(items: Vec<T>) -> Self {
        let selected = if items.is_empty() { None } else { Some(0) };
        Self { items, selected }
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) if i + 1 < self.items.len() => i + 1,
            _ => 0,
        };
        self.selected = Some(i);
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(0) | None => self.items.len() - 1,
            Some(i) => i - 1,
        };
        self.selected = Some(i);
    }

    fn first(&mut self) {
        if !self.items.is_empty() {
            self.selected = Some(0);
        }
    }

    fn last(&mut self) {
        if !self.items.is_empty() {
            self.selected = Some(self.items.len() - 1);
        }
    }

    fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|i| self.items.get(i))
    }
}

/// Everything the detail view shows about one topic.
pub struct TopicDetail {
    pub entry: TopicWithProgress,
    pub prerequisites: Vec<Topic>,
    pub dependents: Vec<Topic>,
    pub path: Vec<Topic>,
    /// `None` when the prerequisite chain loops.
    pub depth: Option<usize>,
}

pub struct App {
    db: Database,
    graph: KnowledgeGraph,
    config: Config,
    scheduler: SpacedRepetitionScheduler,
    pub view: View,
    pub topics: StatefulList<TopicWithProgress>,
    pub detail: Option<TopicDetail>,
    pub stats: Stats,
    pub retention: f64,
    pub due_reviews: Vec<ReviewItem>,
    pub weak_topics: Vec<WeakTopic>,
    pub schedule: BTreeMap<String, Vec<ReviewItem>>,
    pub filter_category: Option<String>,
    pub filter_input: String,
    pub filter_mode: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        db: Database,
        graph: KnowledgeGraph,
        config: Config,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let mut app = Self {
            stats: db.get_stats(config.user_id, config.completion_threshold, Utc::now())?,
            db,
            graph,
            config,
            scheduler: SpacedRepetitionScheduler::new(),
            view: View::Dashboard,
            topics: StatefulList::with_items(Vec::new()),
            detail: None,
            retention: 0.0,
            due_reviews: Vec::new(),
            weak_topics: Vec::new(),
            schedule: BTreeMap::new(),
            filter_category: None,
            filter_input: String::new(),
            filter_mode: false,
            should_quit: false,
        };
        app.refresh_data()?;
        Ok(app)
    }

    pub fn refresh_data(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let now = Utc::now();
        let user_id = self.config.user_id;

        self.stats = self
            .db
            .get_stats(user_id, self.config.completion_threshold, now)?;

        let items = self.db.review_items(user_id)?;
        self.retention = self.scheduler.retention_score_at(&items, now);
        self.due_reviews =
            self.scheduler
                .items_due_for_review_at(&items, false, DASHBOARD_LIST_LIMIT, now);
        self.schedule = self
            .scheduler
            .study_schedule_at(&items, DEFAULT_SCHEDULE_DAYS, now);

        let analyzer = WeaknessAnalyzer::from_records(user_id, self.db.list_performance(user_id)?);
        let mut weak = analyzer
            .analyze_weaknesses(user_id, DEFAULT_MIN_ATTEMPTS, DEFAULT_WEAKNESS_THRESHOLD)
            .weak_topics;
        weak.truncate(DASHBOARD_LIST_LIMIT);
        self.weak_topics = weak;

        self.reload_topics()?;

        if let Some(id) = self.detail.as_ref().map(|d| d.entry.topic.id.clone()) {
            self.open_detail(&id)?;
        }
        Ok(())
    }

    fn reload_topics(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let mut progress: HashMap<String, Progress> = self
            .db
            .list_progress(self.config.user_id)?
            .into_iter()
            .map(|p| (p.topic_id().to_string(), p))
            .collect();

        let topics: Vec<&Topic> = match &self.filter_category {
            Some(category) => self.graph.topics_by_category(category),
            None => self.graph.all_topics(),
        };

        let entries = topics
            .into_iter()
            .map(|topic| TopicWithProgress {
                topic: topic.clone(),
                progress: progress.remove(&topic.id),
            })
            .collect();
        self.topics = StatefulList::with_items(entries);
        Ok(())
    }

    fn apply_filter(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.filter_category = if self.filter_input.is_empty() {
            None
        } else {
            Some(self.filter_input.clone())
        };
        self.reload_topics()
    }

    fn open_detail(&mut self, topic_id: &str) -> Result<(), Box<dyn std::error::Error>> {
        let Some(topic) = self.graph.get_topic(topic_id).cloned() else {
            self.detail = None;
            return Ok(());
        };

        let completed = self
            .db
            .completed_topic_ids(self.config.user_id, self.config.completion_threshold)?;

        self.detail = Some(TopicDetail {
            prerequisites: self.graph.prerequisites(topic_id).into_iter().cloned().collect(),
            dependents: self.graph.dependents(topic_id).into_iter().cloned().collect(),
            path: self.graph.learning_path(topic_id, &completed),
            depth: self.graph.topic_depth(topic_id).ok(),
            entry: TopicWithProgress {
                topic,
                progress: self.db.get_progress(self.config.user_id, topic_id)?,
            },
        });
        Ok(())
    }

    fn select_topic(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(id) = self.topics.selected_item().map(|t| t.topic.id.clone()) {
            self.open_detail(&id)?;
            self.view = View::TopicDetail;
        }
        Ok(())
    }

    fn close_detail(&mut self) {
        self.view = View::Topics;
        self.detail = None;
    }

    fn handle_key(
        &mut self,
        key: KeyCode,
        modifiers: KeyModifiers,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if self.filter_mode {
            match key {
                KeyCode::Esc => {
                    self.filter_mode = false;
                    self.filter_input.clear();
                }
                KeyCode::Enter => {
                    self.filter_mode = false;
                    self.apply_filter()?;
                }
                KeyCode::Backspace => {
                    self.filter_input.pop();
                }
                KeyCode::Char(c) => {
                    self.filter_input.push(c);
                }
                _ => {}
            }
            return Ok(());
        }

        match key {
            KeyCode::Char('q') => self.should_quit = true,

            KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.refresh_data()?;
            }

            // Filter topics by category
            KeyCode::Char('/') if self.view == View::Topics => {
                self.filter_mode = true;
                self.filter_input.clear();
            }

            KeyCode::Esc => match self.view {
                View::TopicDetail => self.close_detail(),
                View::Topics if self.filter_category.is_some() => {
                    self.filter_input.clear();
                    self.apply_filter()?;
                }
                _ => {}
            },

            KeyCode::Char('h') | KeyCode::Left => match self.view {
                View::TopicDetail => self.close_detail(),
                _ => self.view = self.view.prev(),
            },
            KeyCode::Char('l') | KeyCode::Right => match self.view {
                View::Topics => self.select_topic()?,
                _ => self.view = self.view.next(),
            },

            KeyCode::Tab => {
                if modifiers.contains(KeyModifiers::SHIFT) {
                    self.view = self.view.prev();
                } else {
                    self.view = self.view.next();
                }
            }
            KeyCode::BackTab => {
                self.view = self.view.prev();
            }

            KeyCode::Char('j') | KeyCode::Down if self.view == View::Topics => self.topics.next(),
            KeyCode::Char('k') | KeyCode::Up if self.view == View::Topics => {
                self.topics.previous()
            }
            KeyCode::Char('g') if self.view == View::Topics => self.topics.first(),
            KeyCode::Char('G') if self.view == View::Topics => self.topics.last(),

            KeyCode::Enter if self.view == View::Topics => self.select_topic()?,

            _ => {}
        }
        Ok(())
    }
}

pub fn run(
    db: Database,
    graph: KnowledgeGraph,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    // Build state before touching the terminal so load errors print normally
    let mut app = App::new(db, graph, config)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key.code, key.modifiers)?;
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
