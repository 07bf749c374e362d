//! Deterministic weakness detection over graded answers.
//!
//! The analyzer keeps every user's answer history plus incrementally
//! maintained per-topic aggregates, and derives weak topics, weak concepts
//! and short-term trends from them on demand.

use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{Difficulty, PerformanceRecord, Trend};

pub const DEFAULT_MIN_ATTEMPTS: u32 = 3;
pub const DEFAULT_WEAKNESS_THRESHOLD: f64 = 0.6;
pub const RECENT_WINDOW: usize = 10;

/// Minimum attempts on a concept before it can be flagged.
const MIN_CONCEPT_ATTEMPTS: u32 = 2;
const MIN_TREND_SAMPLES: usize = 4;
const TREND_DELTA: f64 = 0.15;
const STRUGGLE_ACCURACY: f64 = 0.5;
const MAX_DECLINING_RECOMMENDED: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptCounts {
    pub attempts: u32,
    pub correct: u32,
}

impl AttemptCounts {
    fn record(&mut self, correct: bool) {
        self.attempts += 1;
        if correct {
            self.correct += 1;
        }
    }

    fn merge(&mut self, other: &AttemptCounts) {
        self.attempts += other.attempts;
        self.correct += other.correct;
    }

    pub fn accuracy(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            f64::from(self.correct) / f64::from(self.attempts)
        }
    }
}

/// Running aggregates for one user on one topic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicStats {
    pub total_attempts: u32,
    pub correct_attempts: u32,
    pub total_time_seconds: u64,
    pub by_difficulty: BTreeMap<Difficulty, AttemptCounts>,
    pub by_concept: BTreeMap<String, AttemptCounts>,
    /// The last [`RECENT_WINDOW`] answers, oldest first.
    pub recent_performance: VecDeque<(DateTime<Utc>, bool)>,
}

impl TopicStats {
    fn record(&mut self, record: &PerformanceRecord) {
        self.total_attempts += 1;
        if record.correct {
            self.correct_attempts += 1;
        }
        self.total_time_seconds += u64::from(record.time_taken_seconds);

        self.by_difficulty
            .entry(record.difficulty)
            .or_default()
            .record(record.correct);
        self.by_concept
            .entry(record.concept.clone())
            .or_default()
            .record(record.correct);

        self.recent_performance
            .push_back((record.timestamp, record.correct));
        while self.recent_performance.len() > RECENT_WINDOW {
            self.recent_performance.pop_front();
        }
    }

    pub fn accuracy(&self) -> f64 {
        AttemptCounts {
            attempts: self.total_attempts,
            correct: self.correct_attempts,
        }
        .accuracy()
    }

    /// Compares accuracy of the older and newer half of the recent window.
    pub fn trend(&self) -> Trend {
        let n = self.recent_performance.len();
        if n < MIN_TREND_SAMPLES {
            return Trend::Stable;
        }

        let mid = n / 2;
        let first = window_accuracy(self.recent_performance.iter().take(mid));
        let second = window_accuracy(self.recent_performance.iter().skip(mid));

        if second - first > TREND_DELTA {
            Trend::Improving
        } else if first - second > TREND_DELTA {
            Trend::Declining
        } else {
            Trend::Stable
        }
    }

    fn struggle_reasons(&self) -> Vec<String> {
        self.by_difficulty
            .iter()
            .filter(|(_, counts)| counts.attempts > 0 && counts.accuracy() < STRUGGLE_ACCURACY)
            .map(|(difficulty, _)| format!("Struggling with {} questions", difficulty.as_str()))
            .collect()
    }
}

fn window_accuracy<'a>(answers: impl Iterator<Item = &'a (DateTime<Utc>, bool)>) -> f64 {
    let mut counts = AttemptCounts::default();
    for (_, correct) in answers {
        counts.record(*correct);
    }
    counts.accuracy()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeakTopic {
    pub topic_id: String,
    pub weakness_score: f64,
    pub accuracy: f64,
    pub attempts: u32,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeakConcept {
    pub concept: String,
    pub weakness_score: f64,
    pub accuracy: f64,
    pub attempts: u32,
    pub topic_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeaknessAnalysis {
    pub weak_topics: Vec<WeakTopic>,
    pub weak_concepts: Vec<WeakConcept>,
    pub improvement_trends: BTreeMap<String, Trend>,
    pub recommendations: Vec<String>,
    pub overall_score: f64,
}

impl WeaknessAnalysis {
    /// Weak topic ids, weakest first.
    pub fn weak_topic_ids(&self) -> Vec<String> {
        self.weak_topics.iter().map(|t| t.topic_id.clone()).collect()
    }

    pub fn weak_concept_names(&self) -> Vec<String> {
        self.weak_concepts.iter().map(|c| c.concept.clone()).collect()
    }

    pub fn declining_topics(&self) -> Vec<&str> {
        self.improvement_trends
            .iter()
            .filter(|(_, trend)| **trend == Trend::Declining)
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct WeaknessAnalyzer {
    history: HashMap<i64, Vec<PerformanceRecord>>,
    stats: HashMap<i64, BTreeMap<String, TopicStats>>,
}

impl WeaknessAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an analyzer by replaying `records` for a single user.
    pub fn from_records<I>(user_id: i64, records: I) -> Self
    where
        I: IntoIterator<Item = PerformanceRecord>,
    {
        let mut analyzer = Self::new();
        for record in records {
            analyzer.add_performance_record(user_id, record);
        }
        analyzer
    }

    pub fn add_performance_record(&mut self, user_id: i64, record: PerformanceRecord) {
        self.stats
            .entry(user_id)
            .or_default()
            .entry(record.topic_id.clone())
            .or_default()
            .record(&record);

        debug!(
            user_id,
            topic_id = %record.topic_id,
            concept = %record.concept,
            correct = record.correct,
            "performance recorded"
        );

        self.history.entry(user_id).or_default().push(record);
    }

    pub fn history(&self, user_id: i64) -> &[PerformanceRecord] {
        self.history.get(&user_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn topic_stats(&self, user_id: i64, topic_id: &str) -> Option<&TopicStats> {
        self.stats.get(&user_id)?.get(topic_id)
    }

    pub fn users(&self) -> Vec<i64> {
        let mut users: Vec<i64> = self.history.keys().copied().collect();
        users.sort_unstable();
        users
    }

    pub fn analyze_weaknesses(
        &self,
        user_id: i64,
        min_attempts: u32,
        weakness_threshold: f64,
    ) -> WeaknessAnalysis {
        let Some(topics) = self.stats.get(&user_id) else {
            return WeaknessAnalysis::default();
        };

        let mut weak_topics = Vec::new();
        let mut weak_concepts = Vec::new();
        let mut improvement_trends = BTreeMap::new();
        let mut overall = AttemptCounts::default();

        for (topic_id, stats) in topics {
            overall.merge(&AttemptCounts {
                attempts: stats.total_attempts,
                correct: stats.correct_attempts,
            });

            let accuracy = stats.accuracy();
            if stats.total_attempts >= min_attempts && accuracy < weakness_threshold {
                weak_topics.push(WeakTopic {
                    topic_id: topic_id.clone(),
                    weakness_score: 1.0 - accuracy,
                    accuracy,
                    attempts: stats.total_attempts,
                    reasons: stats.struggle_reasons(),
                });
            }

            // each (topic, concept) pair is judged on its own counts
            for (concept, counts) in &stats.by_concept {
                if counts.attempts >= MIN_CONCEPT_ATTEMPTS && counts.accuracy() < weakness_threshold {
                    weak_concepts.push(WeakConcept {
                        concept: concept.clone(),
                        weakness_score: 1.0 - counts.accuracy(),
                        accuracy: counts.accuracy(),
                        attempts: counts.attempts,
                        topic_ids: vec![topic_id.clone()],
                    });
                }
            }

            improvement_trends.insert(topic_id.clone(), stats.trend());
        }

        weak_topics.sort_by(|a, b| b.weakness_score.total_cmp(&a.weakness_score));

        weak_concepts.sort_by(|a, b| b.weakness_score.total_cmp(&a.weakness_score));

        let mut analysis = WeaknessAnalysis {
            weak_topics,
            weak_concepts,
            improvement_trends,
            recommendations: Vec::new(),
            overall_score: overall.accuracy() * 100.0,
        };
        analysis.recommendations = recommendations_for(&analysis);

        debug!(
            user_id,
            weak_topics = analysis.weak_topics.len(),
            weak_concepts = analysis.weak_concepts.len(),
            overall_score = analysis.overall_score,
            "weakness analysis complete"
        );

        analysis
    }
}

fn recommendations_for(analysis: &WeaknessAnalysis) -> Vec<String> {
    let mut recommendations = Vec::new();

    if let Some(top) = analysis.weak_topics.first() {
        recommendations.push(format!("Priority: {}", top.topic_id));
    }

    let declining = analysis.declining_topics();
    if !declining.is_empty() {
        let shown: Vec<&str> = declining
            .into_iter()
            .take(MAX_DECLINING_RECOMMENDED)
            .collect();
        recommendations.push(format!("Review needed: {}", shown.join(", ")));
    }

    recommendations
}
