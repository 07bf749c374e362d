use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const INITIAL_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;

fn default_difficulty_level() -> u8 {
    1
}

/// A node of the knowledge graph, loaded once from the knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_difficulty_level")]
    pub difficulty_level: u8,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub related_topics: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl Topic {
    pub fn new(id: impl Into<String>, name: impl Into<String>, difficulty_level: u8) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: String::new(),
            difficulty_level,
            prerequisites: Vec::new(),
            related_topics: Vec::new(),
            description: None,
            content: None,
            resources: Vec::new(),
        }
    }

    pub fn with_prerequisites<I, S>(mut self, prerequisites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prerequisites = prerequisites.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn difficulty_label(&self) -> &'static str {
        match self.difficulty_level {
            0 | 1 => "Beginner",
            2 => "Elementary",
            3 => "Intermediate",
            4 => "Advanced",
            _ => "Expert",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

// Question difficulty as recorded with each graded answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" | "e" => Some(Difficulty::Easy),
            "medium" | "m" | "med" => Some(Difficulty::Medium),
            "hard" | "h" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// SM-2 review state for one user and one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    pub topic_id: String,
    pub topic_name: String,
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetition_count: u32,
    pub next_review_date: Option<DateTime<Utc>>,
    pub last_review_date: Option<DateTime<Utc>>,
}

impl ReviewItem {
    pub fn new(topic_id: impl Into<String>, topic_name: impl Into<String>) -> Self {
        Self {
            topic_id: topic_id.into(),
            topic_name: topic_name.into(),
            ease_factor: INITIAL_EASE_FACTOR,
            interval_days: 1,
            repetition_count: 0,
            next_review_date: None,
            last_review_date: None,
        }
    }

    pub fn is_new(&self) -> bool {
        self.next_review_date.is_none()
    }

    pub fn is_due_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.next_review_date, Some(next) if next <= now)
    }
}

/// One graded answer. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub topic_id: String,
    pub concept: String,
    pub correct: bool,
    pub timestamp: DateTime<Utc>,
    pub difficulty: Difficulty,
    pub time_taken_seconds: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationReason {
    WeaknessReview,
    PrerequisitesCompleted,
}

impl RecommendationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationReason::WeaknessReview => "review due to weakness",
            RecommendationReason::PrerequisitesCompleted => "prerequisites completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub topic: Topic,
    pub reason: RecommendationReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Declining => "declining",
            Trend::Stable => "stable",
        }
    }
}

/// Persisted learning progress for a (user, topic) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub user_id: i64,
    pub mastery_level: f64,
    pub time_spent_minutes: i64,
    pub last_studied: Option<DateTime<Utc>>,
    pub review: ReviewItem,
}

impl Progress {
    pub fn new(user_id: i64, topic_id: &str, topic_name: &str) -> Self {
        Self {
            user_id,
            mastery_level: 0.0,
            time_spent_minutes: 0,
            last_studied: None,
            review: ReviewItem::new(topic_id, topic_name),
        }
    }

    pub fn topic_id(&self) -> &str {
        &self.review.topic_id
    }

    pub fn mastery_label(&self) -> &'static str {
        match self.mastery_level {
            m if m.is_nan() || m < 0.0 => "Unknown",
            m if m < 1.0 => "New",
            m if m < 40.0 => "Learning",
            m if m < 60.0 => "Familiar",
            m if m < 70.0 => "Comfortable",
            m if m < 90.0 => "Proficient",
            m if m <= 100.0 => "Mastered",
            _ => "Unknown",
        }
    }

    pub fn is_completed(&self, threshold: f64) -> bool {
        self.mastery_level >= threshold
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicWithProgress {
    pub topic: Topic,
    pub progress: Option<Progress>,
}

impl TopicWithProgress {
    pub fn mastery_level(&self) -> f64 {
        self.progress.as_ref().map_or(0.0, |p| p.mastery_level)
    }

    pub fn next_review(&self) -> Option<DateTime<Utc>> {
        self.progress.as_ref().and_then(|p| p.review.next_review_date)
    }
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod topic_tests {
        use super::*;

        #[test]
        fn deserializes_minimal_topic_with_defaults() {
            let topic: Topic = serde_json::from_str(r#"{"id": "vars", "name": "Variables"}"#)
                .expect("minimal topic should parse");
            assert_eq!(topic.difficulty_level, 1);
            assert!(topic.prerequisites.is_empty());
            assert!(topic.resources.is_empty());
            assert_eq!(topic.category, "");
        }

        #[test]
        fn deserializes_full_topic_and_ignores_unknown_fields() {
            let json = r#"{
                "id": "loops",
                "name": "Loops",
                "category": "Programming",
                "difficulty_level": 2,
                "prerequisites": ["vars"],
                "related_topics": ["functions"],
                "content": "for and while",
                "resources": [{"type": "video", "title": "Loops 101", "url": "https://example.com"}],
                "questions": [{"id": "q1"}]
            }"#;
            let topic: Topic = serde_json::from_str(json).unwrap();
            assert_eq!(topic.prerequisites, vec!["vars".to_string()]);
            assert_eq!(topic.resources[0].kind, "video");
            assert_eq!(topic.content.as_deref(), Some("for and while"));
        }

        #[test]
        fn builder_sets_prerequisites() {
            let topic = Topic::new("c", "C", 3).with_prerequisites(["a", "b"]);
            assert_eq!(topic.prerequisites, vec!["a", "b"]);
            assert_eq!(topic.difficulty_label(), "Intermediate");
        }
    }

    mod difficulty_tests {
        use super::*;

        #[test]
        fn as_str_returns_correct_values() {
            assert_eq!(Difficulty::Easy.as_str(), "easy");
            assert_eq!(Difficulty::Medium.as_str(), "medium");
            assert_eq!(Difficulty::Hard.as_str(), "hard");
        }

        #[test]
        fn from_str_accepts_variants() {
            for v in ["easy", "E", "Easy "] {
                assert_eq!(Difficulty::from_str(v), Some(Difficulty::Easy), "'{}'", v);
            }
            for v in ["medium", "med", "M"] {
                assert_eq!(Difficulty::from_str(v), Some(Difficulty::Medium), "'{}'", v);
            }
            assert_eq!(Difficulty::from_str("HARD"), Some(Difficulty::Hard));
        }

        #[test]
        fn from_str_invalid_returns_none() {
            assert_eq!(Difficulty::from_str("extreme"), None);
            assert_eq!(Difficulty::from_str(""), None);
        }

        #[test]
        fn serializes_lowercase() {
            assert_eq!(serde_json::to_string(&Difficulty::Hard).unwrap(), "\"hard\"");
        }
    }

    mod review_item_tests {
        use super::*;
        use chrono::Duration;

        #[test]
        fn new_item_has_sm2_defaults() {
            let item = ReviewItem::new("t1", "Topic 1");
            assert_eq!(item.ease_factor, 2.5);
            assert_eq!(item.interval_days, 1);
            assert_eq!(item.repetition_count, 0);
            assert!(item.is_new());
        }

        #[test]
        fn is_due_at_compares_dates() {
            let now = Utc::now();
            let mut item = ReviewItem::new("t1", "Topic 1");
            assert!(!item.is_due_at(now));

            item.next_review_date = Some(now - Duration::hours(1));
            assert!(item.is_due_at(now));

            item.next_review_date = Some(now + Duration::hours(1));
            assert!(!item.is_due_at(now));
        }
    }

    mod progress_tests {
        use super::*;

        fn make_progress(mastery_level: f64) -> Progress {
            let mut p = Progress::new(1, "t1", "Topic 1");
            p.mastery_level = mastery_level;
            p
        }

        #[test]
        fn mastery_label_bands() {
            assert_eq!(make_progress(0.0).mastery_label(), "New");
            assert_eq!(make_progress(25.0).mastery_label(), "Learning");
            assert_eq!(make_progress(45.0).mastery_label(), "Familiar");
            assert_eq!(make_progress(65.0).mastery_label(), "Comfortable");
            assert_eq!(make_progress(75.0).mastery_label(), "Proficient");
            assert_eq!(make_progress(100.0).mastery_label(), "Mastered");
        }

        #[test]
        fn mastery_label_out_of_range() {
            assert_eq!(make_progress(-1.0).mastery_label(), "Unknown");
            assert_eq!(make_progress(101.0).mastery_label(), "Unknown");
        }

        #[test]
        fn is_completed_uses_threshold() {
            assert!(make_progress(70.0).is_completed(70.0));
            assert!(!make_progress(69.9).is_completed(70.0));
        }
    }

    mod recommendation_reason_tests {
        use super::*;

        #[test]
        fn as_str_returns_reason_text() {
            assert_eq!(
                RecommendationReason::WeaknessReview.as_str(),
                "review due to weakness"
            );
            assert_eq!(
                RecommendationReason::PrerequisitesCompleted.as_str(),
                "prerequisites completed"
            );
        }
    }

    mod json_output_tests {
        use super::*;

        #[test]
        fn ok_with_string() {
            let output = JsonOutput::ok("test data");
            assert!(output.success);
            assert_eq!(output.data, Some("test data"));
            assert!(output.error.is_none());
        }

        #[test]
        fn err_with_string() {
            let output = JsonOutput::<()>::err("something went wrong");
            assert!(!output.success);
            assert!(output.data.is_none());
            assert_eq!(output.error, Some("something went wrong".to_string()));
        }

        #[test]
        fn serializes_ok_correctly() {
            let output = JsonOutput::ok("test");
            let json = serde_json::to_string(&output).unwrap();
            assert!(json.contains("\"success\":true"));
            assert!(json.contains("\"data\":\"test\""));
            assert!(json.contains("\"error\":null"));
        }

        #[test]
        fn serializes_err_correctly() {
            let output = JsonOutput::<()>::err("error");
            let json = serde_json::to_string(&output).unwrap();
            assert!(json.contains("\"success\":false"));
            assert!(json.contains("\"data\":null"));
            assert!(json.contains("\"error\":\"error\""));
        }
    }
}
