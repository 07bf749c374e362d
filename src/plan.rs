use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CoachError, Result};
use crate::graph::KnowledgeGraph;
use crate::models::Topic;

pub const DEFAULT_HOURS_PER_TOPIC: f64 = 3.0;
pub const DEFAULT_HOURS_PER_DAY: f64 = 1.0;
/// Longest plan accepted, about a century.
pub const MAX_PLAN_DAYS: u32 = 36_500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedTopic {
    pub topic_id: String,
    pub topic_name: String,
    /// 1-based position in the plan.
    pub order: usize,
    pub estimated_hours: f64,
    pub deadline: DateTime<Utc>,
}

/// A dated walk through a learning path towards one target topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyPlan {
    pub title: String,
    pub description: String,
    pub target_topic_id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub days_needed: u32,
    pub total_hours: f64,
    pub topics: Vec<PlannedTopic>,
}

impl StudyPlan {
    /// Plans the path from `graph` to `target_id`, skipping `completed` topics.
    pub fn for_target(
        graph: &KnowledgeGraph,
        target_id: &str,
        completed: &[String],
        hours_per_day: f64,
        hours_per_topic: f64,
        start: DateTime<Utc>,
    ) -> Result<Self> {
        if !graph.contains(target_id) {
            return Err(CoachError::topic_not_found(target_id));
        }
        let path = graph.learning_path(target_id, completed);
        let plan = Self::from_path(target_id, &path, hours_per_day, hours_per_topic, start)?;

        info!(
            target = target_id,
            topics = plan.topics.len(),
            days = plan.days_needed,
            "built study plan"
        );
        Ok(plan)
    }

    /// Spreads `path` evenly over the days needed at `hours_per_day`.
    pub fn from_path(
        target_id: &str,
        path: &[Topic],
        hours_per_day: f64,
        hours_per_topic: f64,
        start: DateTime<Utc>,
    ) -> Result<Self> {
        if !(hours_per_day > 0.0) {
            return Err(CoachError::invalid(format!(
                "hours per day must be positive, got {}",
                hours_per_day
            )));
        }
        if !(hours_per_topic > 0.0) {
            return Err(CoachError::invalid(format!(
                "hours per topic must be positive, got {}",
                hours_per_topic
            )));
        }

        let n = path.len();
        let total_hours = n as f64 * hours_per_topic;
        let span = (total_hours / hours_per_day).floor();
        if !(span < f64::from(MAX_PLAN_DAYS)) {
            return Err(CoachError::invalid(format!(
                "plan would take {} days at {} hours per day, limit is {}",
                span, hours_per_day, MAX_PLAN_DAYS
            )));
        }
        let days_needed = span as u32 + 1;

        let topics = path
            .iter()
            .enumerate()
            .map(|(i, topic)| {
                let order = i + 1;
                let offset = (order as u64 * u64::from(days_needed)) / n as u64;
                Ok(PlannedTopic {
                    topic_id: topic.id.clone(),
                    topic_name: topic.name.clone(),
                    order,
                    estimated_hours: hours_per_topic,
                    deadline: days_after(start, offset)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            title: format!("Path to {}", target_id),
            description: format!("Learn {} in {} days", target_id, days_needed),
            target_topic_id: target_id.to_string(),
            start_date: start,
            end_date: days_after(start, u64::from(days_needed))?,
            days_needed,
            total_hours,
            topics,
        })
    }
}

fn days_after(start: DateTime<Utc>, days: u64) -> Result<DateTime<Utc>> {
    i64::try_from(days)
        .ok()
        .filter(|d| *d <= i64::from(MAX_PLAN_DAYS))
        .and_then(|d| start.checked_add_signed(Duration::days(d)))
        .ok_or_else(|| CoachError::invalid(format!("date {} days after {} is out of range", days, start)))
}
