mod tui;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use coach::config::Config;
use coach::db::Database;
use coach::error::CoachError;
use coach::graph::{KnowledgeGraph, DEFAULT_MAX_RECOMMENDATIONS};
use coach::models::{Difficulty, JsonOutput, PerformanceRecord, ReviewItem};
use coach::plan::{StudyPlan, DEFAULT_HOURS_PER_DAY};
use coach::scheduler::{
    SpacedRepetitionScheduler, DEFAULT_DUE_LIMIT, DEFAULT_SCHEDULE_DAYS,
};
use coach::weakness::{WeaknessAnalyzer, DEFAULT_MIN_ATTEMPTS, DEFAULT_WEAKNESS_THRESHOLD};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "coach")]
#[command(about = "An adaptive learning coach: prerequisite paths, spaced repetition and weakness analysis")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Learner id
    #[arg(long, short, global = true, env = "COACH_USER")]
    user: Option<i64>,

    /// SQLite database path
    #[arg(long, global = true, env = "COACH_DB")]
    db: Option<PathBuf>,

    /// Knowledge base JSON file ({"topics": [...]})
    #[arg(long, global = true, env = "COACH_KNOWLEDGE_BASE")]
    knowledge_base: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error (RUST_LOG overrides)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Browse the knowledge base
    #[command(subcommand)]
    Topic(TopicCommands),

    /// Show the ordered learning path to a topic
    Path {
        /// Target topic id
        target: String,

        /// Plan as if nothing were completed yet
        #[arg(long)]
        from_scratch: bool,
    },

    /// List the topics still missing before a target
    Gaps {
        /// Target topic id
        target: String,
    },

    /// Suggest what to study next
    Recommend {
        /// Maximum number of suggestions
        #[arg(long, short, default_value_t = DEFAULT_MAX_RECOMMENDATIONS)]
        max: usize,
    },

    /// Record a study session and reschedule the topic
    Study {
        /// Topic id
        topic: String,

        /// Current mastery, 0-100
        #[arg(long, short)]
        mastery: f64,

        /// Minutes spent
        #[arg(long, default_value_t = 0)]
        minutes: i64,
    },

    /// Grade a recall of a topic with an SM-2 quality (0-5)
    Review {
        /// Topic id
        topic: String,

        /// 0 = blackout, 3 = hard but correct, 5 = perfect
        #[arg(long, short)]
        quality: u8,
    },

    /// Record a graded answer to a question
    Answer {
        /// Topic id
        topic: String,

        /// Concept the question tested
        concept: String,

        /// Result: correct/wrong
        result: String,

        /// Question difficulty: easy/medium/hard
        #[arg(long, short, default_value = "medium")]
        difficulty: String,

        /// Seconds taken to answer
        #[arg(long, short, default_value_t = 0)]
        seconds: u32,
    },

    /// List reviews that are due now
    Due {
        /// Maximum number of items
        #[arg(long, short, default_value_t = DEFAULT_DUE_LIMIT)]
        limit: usize,

        /// Leave out topics never reviewed
        #[arg(long)]
        no_new: bool,
    },

    /// Show upcoming reviews per day
    Schedule {
        /// Number of days to show
        #[arg(long, short, default_value_t = DEFAULT_SCHEDULE_DAYS)]
        days: u32,

        /// Cap reviews per day, carrying the overflow forward
        #[arg(long)]
        max_per_day: Option<usize>,
    },

    /// Analyze weak topics and concepts from recorded answers
    Weaknesses {
        /// Attempts needed before a topic can be flagged
        #[arg(long, default_value_t = DEFAULT_MIN_ATTEMPTS)]
        min_attempts: u32,

        /// Accuracy below which a topic or concept is weak
        #[arg(long, default_value_t = DEFAULT_WEAKNESS_THRESHOLD)]
        threshold: f64,
    },

    /// Build a dated study plan towards a topic
    Plan {
        /// Target topic id
        target: String,

        /// Hours available per day
        #[arg(long, default_value_t = DEFAULT_HOURS_PER_DAY)]
        hours_per_day: f64,
    },

    /// Get the next topic to review (stochastic selection)
    Next,

    /// Show learning statistics
    Stats,

    /// Launch interactive terminal UI
    Tui,
}

#[derive(Subcommand)]
enum TopicCommands {
    /// List topics in the knowledge base
    List {
        /// Filter by category
        #[arg(long, short)]
        category: Option<String>,
    },

    /// Show topic details
    Show {
        /// Topic id
        id: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        l @ ("trace" | "debug" | "info" | "warn" | "error") => l.to_string(),
        _ => "warn".to_string(),
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("coach={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // keep stdout clean for --json
        .init();
}

fn run(cli: Cli) -> CliResult<()> {
    let config = Config::resolve(cli.db.clone(), cli.knowledge_base.clone(), cli.user);
    config.ensure_db_dir()?;
    debug!(db = %config.db_path.display(), user_id = config.user_id, "configuration resolved");

    let db = Database::open(&config.db_path)?;
    let user_id = config.user_id;
    let now = Utc::now();
    let scheduler = SpacedRepetitionScheduler::new();

    match cli.command {
        Commands::Init => {
            db.init()?;
            if cli.json {
                print_json(())?;
            } else {
                println!("Database initialized at: {}", config.db_path.display());
                if !config.knowledge_base_path.exists() {
                    println!(
                        "No knowledge base yet. Put one at {} or pass --knowledge-base.",
                        config.knowledge_base_path.display()
                    );
                }
            }
        }

        Commands::Topic(topic_cmd) => {
            let graph = load_graph(&config)?;
            match topic_cmd {
                TopicCommands::List { category } => {
                    let topics = match &category {
                        Some(c) => graph.topics_by_category(c),
                        None => graph.all_topics(),
                    };
                    if cli.json {
                        print_json(&topics)?;
                    } else if topics.is_empty() {
                        println!("No topics found.");
                    } else {
                        println!("{:<20} {:<36} {:<4} CATEGORY", "ID", "NAME", "LVL");
                        println!("{}", "-".repeat(76));
                        for topic in topics {
                            println!(
                                "{:<20} {:<36} {:<4} {}",
                                truncate(&topic.id, 18),
                                truncate(&topic.name, 34),
                                topic.difficulty_level,
                                or_dash(&topic.category)
                            );
                        }
                    }
                }

                TopicCommands::Show { id } => {
                    let topic = graph
                        .get_topic(&id)
                        .ok_or_else(|| CoachError::topic_not_found(&id))?;
                    let progress = db.get_progress(user_id, &id)?;
                    let prerequisites = graph.prerequisites(&id);
                    let dependents = graph.dependents(&id);
                    let depth = graph.topic_depth(&id);

                    if cli.json {
                        print_json(serde_json::json!({
                            "topic": topic,
                            "progress": progress,
                            "prerequisites": prerequisites,
                            "dependents": dependents,
                            "depth": depth.as_ref().ok(),
                        }))?;
                    } else {
                        println!("Topic: {}", topic.name);
                        println!("ID: {}", topic.id);
                        println!("Category: {}", or_dash(&topic.category));
                        println!(
                            "Difficulty: {} ({})",
                            topic.difficulty_level,
                            topic.difficulty_label()
                        );
                        if let Some(desc) = &topic.description {
                            println!("Description: {}", desc);
                        }
                        match depth {
                            Ok(d) => println!("Depth: {}", d),
                            Err(e) => println!("Depth: unknown ({})", e),
                        }
                        println!("Prerequisites: {}", names(&prerequisites));
                        println!("Unlocks: {}", names(&dependents));
                        for resource in &topic.resources {
                            println!("Resource: [{}] {} {}", resource.kind, resource.title, resource.url);
                        }

                        if let Some(p) = progress {
                            println!();
                            println!("--- Progress ---");
                            println!("Mastery: {} ({:.0})", p.mastery_label(), p.mastery_level);
                            println!("Time studied: {} min", p.time_spent_minutes);
                            println!(
                                "Ease: {:.2}  Interval: {}d  Streak: {}",
                                p.review.ease_factor, p.review.interval_days, p.review.repetition_count
                            );
                            println!("Next review: {}", format_date(p.review.next_review_date));
                        }
                    }
                }
            }
        }

        Commands::Path {
            target,
            from_scratch,
        } => {
            let graph = load_graph(&config)?;
            require_topic(&graph, &target)?;
            let completed = if from_scratch {
                Vec::new()
            } else {
                db.completed_topic_ids(user_id, config.completion_threshold)?
            };
            let path = graph.learning_path(&target, &completed);

            if cli.json {
                print_json(serde_json::json!({ "learning_path": path, "total_topics": path.len() }))?;
            } else if path.is_empty() {
                println!("Nothing left to learn for '{}'.", target);
            } else {
                println!("=== Path to {} ({} topics) ===", target, path.len());
                for (i, topic) in path.iter().enumerate() {
                    println!("{:>3}. {:<36} L{}", i + 1, truncate(&topic.name, 34), topic.difficulty_level);
                }
            }
        }

        Commands::Gaps { target } => {
            let graph = load_graph(&config)?;
            require_topic(&graph, &target)?;
            let completed = db.completed_topic_ids(user_id, config.completion_threshold)?;
            let gaps = graph.find_gaps(&completed, &target);

            if cli.json {
                print_json(&gaps)?;
            } else if gaps.is_empty() {
                println!("No gaps before '{}'.", target);
            } else {
                println!("Missing before '{}':", target);
                for topic in gaps {
                    println!("  - {} ({})", topic.name, topic.id);
                }
            }
        }

        Commands::Recommend { max } => {
            let graph = load_graph(&config)?;
            let completed = db.completed_topic_ids(user_id, config.completion_threshold)?;
            let analysis = load_analyzer(&db, user_id)?.analyze_weaknesses(
                user_id,
                DEFAULT_MIN_ATTEMPTS,
                DEFAULT_WEAKNESS_THRESHOLD,
            );
            let weak: Vec<String> = analysis
                .weak_topics
                .iter()
                .filter(|w| w.weakness_score > config.weak_score_cutoff)
                .map(|w| w.topic_id.clone())
                .collect();
            let recommendations = graph.recommend_next_topics(&completed, &weak, max);

            if cli.json {
                print_json(&recommendations)?;
            } else if recommendations.is_empty() {
                println!("No recommendations. Load a knowledge base or study some topics first.");
            } else {
                println!("=== Recommended Next ===");
                for (i, rec) in recommendations.iter().enumerate() {
                    println!(
                        "{:>3}. {:<36} {}",
                        i + 1,
                        truncate(&rec.topic.name, 34),
                        rec.reason.as_str()
                    );
                }
            }
        }

        Commands::Study {
            topic,
            mastery,
            minutes,
        } => {
            let graph = load_graph(&config)?;
            let name = require_topic(&graph, &topic)?.name.clone();
            let progress = db.record_study(user_id, &topic, &name, mastery, minutes, now)?;

            if cli.json {
                print_json(&progress)?;
            } else {
                println!("Study recorded for '{}'.", name);
                println!("Mastery: {:.0} ({})", progress.mastery_level, progress.mastery_label());
                println!("Next review scheduled: {}", format_date(progress.review.next_review_date));
            }
        }

        Commands::Review { topic, quality } => {
            let graph = load_graph(&config)?;
            let name = require_topic(&graph, &topic)?.name.clone();
            let progress = db.record_review(user_id, &topic, &name, quality, now)?;

            if cli.json {
                print_json(&progress.review)?;
            } else {
                println!("Review recorded for '{}'.", name);
                println!(
                    "Interval: {} days (ease {:.2}, streak {})",
                    progress.review.interval_days,
                    progress.review.ease_factor,
                    progress.review.repetition_count
                );
                println!("Next review scheduled: {}", format_date(progress.review.next_review_date));
            }
        }

        Commands::Answer {
            topic,
            concept,
            result,
            difficulty,
            seconds,
        } => {
            let correct = parse_result(&result).ok_or_else(|| {
                format!("Invalid result '{}'. Use: correct or wrong", result)
            })?;
            let difficulty = Difficulty::from_str(&difficulty).ok_or_else(|| {
                format!("Invalid difficulty '{}'. Use: easy, medium, or hard", difficulty)
            })?;
            let record = PerformanceRecord {
                topic_id: topic,
                concept,
                correct,
                timestamp: now,
                difficulty,
                time_taken_seconds: seconds,
            };
            db.record_performance(user_id, &record)?;

            if cli.json {
                print_json(&record)?;
            } else {
                println!(
                    "Recorded {} answer on '{}' ({}).",
                    if correct { "correct" } else { "wrong" },
                    record.concept,
                    record.topic_id
                );
            }
        }

        Commands::Due { limit, no_new } => {
            let mut items = db.review_items(user_id)?;
            if !no_new {
                if let Some(graph) = load_optional_graph(&config.knowledge_base_path)? {
                    items.extend(untracked_items(&graph, &items));
                }
            }
            let due = scheduler.items_due_for_review_at(&items, !no_new, limit, now);

            if cli.json {
                print_json(&due)?;
            } else if due.is_empty() {
                println!("Nothing due. Come back later!");
            } else {
                println!("{:<20} {:<30} {:<12} INTERVAL", "ID", "NAME", "DUE");
                println!("{}", "-".repeat(72));
                for item in due {
                    println!(
                        "{:<20} {:<30} {:<12} {}d",
                        truncate(&item.topic_id, 18),
                        truncate(&item.topic_name, 28),
                        if item.is_new() {
                            "new".to_string()
                        } else {
                            format_date(item.next_review_date)
                        },
                        item.interval_days
                    );
                }
            }
        }

        Commands::Schedule { days, max_per_day } => {
            let items = db.review_items(user_id)?;

            match max_per_day {
                Some(cap) => {
                    let balanced = scheduler.balance_daily_load_at(&items, cap, days, now);
                    if cli.json {
                        print_json(&balanced)?;
                    } else {
                        for (date, reviews) in &balanced.days {
                            println!("{}  {:>3}  {}", date, reviews.len(), item_names(reviews));
                        }
                        if !balanced.unscheduled.is_empty() {
                            println!(
                                "Over capacity: {} reviews did not fit ({})",
                                balanced.unscheduled.len(),
                                item_names(&balanced.unscheduled)
                            );
                        }
                    }
                }
                None => {
                    let schedule = scheduler.study_schedule_at(&items, days, now);
                    if cli.json {
                        print_json(&schedule)?;
                    } else {
                        for (date, reviews) in &schedule {
                            println!("{}  {:>3}  {}", date, reviews.len(), item_names(reviews));
                        }
                    }
                }
            }
        }

        Commands::Weaknesses {
            min_attempts,
            threshold,
        } => {
            let analysis =
                load_analyzer(&db, user_id)?.analyze_weaknesses(user_id, min_attempts, threshold);

            if cli.json {
                print_json(&analysis)?;
            } else {
                println!("=== Weakness Analysis ===");
                println!("Overall score: {:.1}%", analysis.overall_score);

                if analysis.weak_topics.is_empty() {
                    println!("No weak topics.");
                } else {
                    println!();
                    println!("Weak topics:");
                    for weak in &analysis.weak_topics {
                        println!(
                            "  {:<24} score {:.2}  accuracy {:.0}% over {} attempts",
                            weak.topic_id,
                            weak.weakness_score,
                            weak.accuracy * 100.0,
                            weak.attempts
                        );
                        for reason in &weak.reasons {
                            println!("    - {}", reason);
                        }
                    }
                }

                if !analysis.weak_concepts.is_empty() {
                    println!();
                    println!("Weak concepts:");
                    for weak in &analysis.weak_concepts {
                        println!(
                            "  {:<24} score {:.2}  in {}",
                            weak.concept,
                            weak.weakness_score,
                            weak.topic_ids.join(", ")
                        );
                    }
                }

                let declining = analysis.declining_topics();
                if !declining.is_empty() {
                    println!();
                    println!("Declining: {}", declining.join(", "));
                }

                if !analysis.recommendations.is_empty() {
                    println!();
                    for rec in &analysis.recommendations {
                        println!("> {}", rec);
                    }
                }
            }
        }

        Commands::Plan {
            target,
            hours_per_day,
        } => {
            let graph = load_graph(&config)?;
            let completed = db.completed_topic_ids(user_id, config.completion_threshold)?;
            let plan = StudyPlan::for_target(
                &graph,
                &target,
                &completed,
                hours_per_day,
                config.hours_per_topic,
                now,
            )?;

            if cli.json {
                print_json(&plan)?;
            } else {
                println!("=== {} ===", plan.title);
                println!("{}", plan.description);
                println!(
                    "{:.0} hours at {:.1}h/day, done by {}",
                    plan.total_hours,
                    hours_per_day,
                    format_date(Some(plan.end_date))
                );
                println!();
                for planned in &plan.topics {
                    println!(
                        "{:>3}. {:<36} by {}",
                        planned.order,
                        truncate(&planned.topic_name, 34),
                        format_date(Some(planned.deadline))
                    );
                }
            }
        }

        Commands::Next => {
            let items = db.review_items(user_id)?;
            let picked = scheduler.pick_next_review_at(&items, &mut rand::thread_rng(), now);

            match picked {
                Some(item) if cli.json => print_json(item)?,
                Some(item) => {
                    println!("=== Next Topic to Review ===");
                    println!();
                    println!("Topic: {} (ID: {})", item.topic_name, item.topic_id);
                    println!("Due: {}", format_date(item.next_review_date));
                    println!(
                        "Ease: {:.2}  Interval: {}d  Streak: {}",
                        item.ease_factor, item.interval_days, item.repetition_count
                    );
                    println!();
                    println!("After review, record how it went with:");
                    println!("  coach review {} --quality <0-5>", item.topic_id);
                }
                None if cli.json => print_json(())?,
                None => println!("No reviews due. Try `coach recommend` for something new!"),
            }
        }

        Commands::Stats => {
            let stats = db.get_stats(user_id, config.completion_threshold, now)?;
            let retention = scheduler.retention_score_at(&db.review_items(user_id)?, now);

            if cli.json {
                print_json(serde_json::json!({ "stats": stats, "retention_score": retention }))?;
            } else {
                println!("=== Learning Statistics ===");
                println!("Tracked topics: {}", stats.tracked_topics);
                println!("Completed (mastery {}+): {}", config.completion_threshold, stats.completed);
                println!("Due for review: {}", stats.due_now);
                println!("Total reviews: {}", stats.total_reviews);
                println!("Answers: {} ({} correct)", stats.total_answers, stats.correct_answers);
                println!("Average mastery: {:.1}/100", stats.avg_mastery);
                println!("Retention score: {:.1}/100", retention);
                println!("Time studied: {} min", stats.minutes_studied);
            }
        }

        Commands::Tui => {
            let graph = load_graph(&config)?;
            tui::run(db, graph, config)?;
        }
    }

    Ok(())
}

fn load_graph(config: &Config) -> CliResult<KnowledgeGraph> {
    KnowledgeGraph::load_from_file(&config.knowledge_base_path)
        .map_err(|e| knowledge_base_error(&config.knowledge_base_path, e))
}

/// Like [`load_graph`], but a missing file is `None` rather than an error.
fn load_optional_graph(path: &Path) -> CliResult<Option<KnowledgeGraph>> {
    match KnowledgeGraph::load_from_file(path) {
        Ok(graph) => Ok(Some(graph)),
        Err(CoachError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no knowledge base, skipping new topics");
            Ok(None)
        }
        Err(e) => Err(knowledge_base_error(path, e)),
    }
}

fn knowledge_base_error(path: &Path, e: CoachError) -> Box<dyn std::error::Error> {
    format!("could not load knowledge base {}: {}", path.display(), e).into()
}

fn load_analyzer(db: &Database, user_id: i64) -> CliResult<WeaknessAnalyzer> {
    Ok(WeaknessAnalyzer::from_records(user_id, db.list_performance(user_id)?))
}

fn require_topic<'a>(
    graph: &'a KnowledgeGraph,
    id: &str,
) -> Result<&'a coach::models::Topic, CoachError> {
    graph
        .get_topic(id)
        .ok_or_else(|| CoachError::topic_not_found(id))
}

/// Knowledge-base topics with no review state yet, as fresh review items.
fn untracked_items(graph: &KnowledgeGraph, tracked: &[ReviewItem]) -> Vec<ReviewItem> {
    let known: HashSet<&str> = tracked.iter().map(|i| i.topic_id.as_str()).collect();
    graph
        .all_topics()
        .into_iter()
        .filter(|t| !known.contains(t.id.as_str()))
        .map(|t| ReviewItem::new(t.id.clone(), t.name.clone()))
        .collect()
}

fn print_json<T: Serialize>(data: T) -> CliResult<()> {
    println!("{}", serde_json::to_string(&JsonOutput::ok(data))?);
    Ok(())
}

fn parse_result(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "correct" | "right" | "yes" | "y" | "pass" => Some(true),
        "wrong" | "incorrect" | "no" | "n" | "fail" => Some(false),
        _ => None,
    }
}

fn names(topics: &[&coach::models::Topic]) -> String {
    if topics.is_empty() {
        "-".to_string()
    } else {
        topics
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn item_names(items: &[ReviewItem]) -> String {
    items
        .iter()
        .map(|i| i.topic_name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
