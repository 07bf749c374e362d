//! SM-2 (SuperMemo 2) spaced repetition scheduling.
//!
//! The scheduler holds no state: every operation is a function of the
//! review items handed in. Time-dependent operations come in two forms, one
//! reading the wall clock and an `_at` variant taking `now` explicitly.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::error::{CoachError, Result};
use crate::models::{ReviewItem, MIN_EASE_FACTOR};

pub const MAX_QUALITY: u8 = 5;
/// Quality at or above which a recall counts as successful.
pub const PASSING_QUALITY: u8 = 3;
/// Upper bound on a single interval so review dates stay representable.
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

pub const DEFAULT_DUE_LIMIT: usize = 20;
pub const DEFAULT_SCHEDULE_DAYS: u32 = 7;
/// Widest schedule window, in days.
pub const MAX_SCHEDULE_DAYS: u32 = 366;
pub const DEFAULT_MAX_PER_DAY: usize = 20;
pub const DEFAULT_DAYS_AHEAD: u32 = 14;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Per-day review buckets produced by [`SpacedRepetitionScheduler::balance_daily_load`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct BalancedSchedule {
    pub days: BTreeMap<String, Vec<ReviewItem>>,
    /// Overflow still left after the last day of the window.
    pub unscheduled: Vec<ReviewItem>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SpacedRepetitionScheduler;

impl SpacedRepetitionScheduler {
    pub fn new() -> Self {
        Self
    }

    pub fn calculate_next_review(&self, item: &ReviewItem, quality: u8) -> Result<ReviewItem> {
        self.calculate_next_review_at(item, quality, Utc::now())
    }

    /// Applies one graded recall to `item` and returns the updated state.
    ///
    /// quality: 0 = blackout, 3 = correct with serious difficulty,
    /// 5 = perfect. Anything above 5 is rejected.
    pub fn calculate_next_review_at(
        &self,
        item: &ReviewItem,
        quality: u8,
        now: DateTime<Utc>,
    ) -> Result<ReviewItem> {
        if quality > MAX_QUALITY {
            return Err(CoachError::invalid(format!(
                "quality must be between 0 and {}, got {}",
                MAX_QUALITY, quality
            )));
        }

        let lapse = f64::from(MAX_QUALITY - quality);
        let ease_factor =
            (item.ease_factor + (0.1 - lapse * (0.08 + lapse * 0.02))).max(MIN_EASE_FACTOR);

        let (interval_days, repetition_count) = if quality < PASSING_QUALITY {
            (1, 0)
        } else {
            let repetitions = item.repetition_count + 1;
            let interval = match repetitions {
                1 => 1,
                2 => 6,
                _ => (f64::from(item.interval_days) * ease_factor).round() as u32,
            };
            (interval.clamp(1, MAX_INTERVAL_DAYS), repetitions)
        };

        debug!(
            topic_id = %item.topic_id,
            quality,
            ease_factor,
            interval_days,
            repetition_count,
            "scheduled next review"
        );

        Ok(ReviewItem {
            topic_id: item.topic_id.clone(),
            topic_name: item.topic_name.clone(),
            ease_factor,
            interval_days,
            repetition_count,
            next_review_date: Some(now + Duration::days(i64::from(interval_days))),
            last_review_date: Some(now),
        })
    }

    pub fn items_due_for_review(
        &self,
        items: &[ReviewItem],
        include_new: bool,
        limit: usize,
    ) -> Vec<ReviewItem> {
        self.items_due_for_review_at(items, include_new, limit, Utc::now())
    }

    /// Overdue items first (most overdue at the front), then never-reviewed
    /// items, capped at `limit`.
    pub fn items_due_for_review_at(
        &self,
        items: &[ReviewItem],
        include_new: bool,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Vec<ReviewItem> {
        let mut due: Vec<&ReviewItem> = Vec::new();
        let mut new: Vec<&ReviewItem> = Vec::new();

        for item in items {
            match item.next_review_date {
                None if include_new => new.push(item),
                Some(next) if next <= now => due.push(item),
                _ => {}
            }
        }

        due.sort_by_key(|item| item.next_review_date);

        due.into_iter()
            .chain(new)
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn retention_score(&self, items: &[ReviewItem]) -> f64 {
        self.retention_score_at(items, Utc::now())
    }

    /// Rough 0-100 estimate of how much of `items` is currently retained.
    pub fn retention_score_at(&self, items: &[ReviewItem], now: DateTime<Utc>) -> f64 {
        if items.is_empty() {
            return 0.0;
        }

        let total: f64 = items
            .iter()
            .map(|item| {
                let score = match item.next_review_date {
                    None => 0.0,
                    Some(next) if next > now => {
                        let days_until = (next - now).num_days() as f64;
                        let interval = f64::from(item.interval_days.max(1));
                        let retention = (50.0 + f64::from(item.interval_days) * 5.0).min(100.0);
                        retention * (1.0 - days_until / interval * 0.1)
                    }
                    Some(next) => {
                        let days_overdue = (now - next).num_days() as f64;
                        let decay = (days_overdue * 5.0).min(50.0);
                        (50.0 - decay).max(0.0)
                    }
                };
                score.clamp(0.0, 100.0)
            })
            .sum();

        total / items.len() as f64
    }

    pub fn study_schedule(&self, items: &[ReviewItem], days: u32) -> BTreeMap<String, Vec<ReviewItem>> {
        self.study_schedule_at(items, days, Utc::now())
    }

    /// Buckets items by review date for `days` days starting today (UTC).
    /// Items dated outside the window, or never scheduled, are left out.
    /// The window is capped at [`MAX_SCHEDULE_DAYS`] and at the last
    /// representable date.
    pub fn study_schedule_at(
        &self,
        items: &[ReviewItem],
        days: u32,
        now: DateTime<Utc>,
    ) -> BTreeMap<String, Vec<ReviewItem>> {
        let today = now.date_naive();
        let mut schedule: BTreeMap<String, Vec<ReviewItem>> = (0..days.min(MAX_SCHEDULE_DAYS))
            .map_while(|offset| today.checked_add_signed(Duration::days(i64::from(offset))))
            .map(|date| (date.format(DATE_FORMAT).to_string(), Vec::new()))
            .collect();

        for item in items {
            if let Some(next) = item.next_review_date {
                let key = next.date_naive().format(DATE_FORMAT).to_string();
                if let Some(bucket) = schedule.get_mut(&key) {
                    bucket.push(item.clone());
                }
            }
        }

        schedule
    }

    pub fn balance_daily_load(
        &self,
        items: &[ReviewItem],
        max_per_day: usize,
        days_ahead: u32,
    ) -> BalancedSchedule {
        self.balance_daily_load_at(items, max_per_day, days_ahead, Utc::now())
    }

    /// Greedy forward-carry rebalancing. Each day keeps at most
    /// `max_per_day` items, preferring the shortest intervals; the rest roll
    /// over to the next day. This is a heuristic, not a global optimum.
    pub fn balance_daily_load_at(
        &self,
        items: &[ReviewItem],
        max_per_day: usize,
        days_ahead: u32,
        now: DateTime<Utc>,
    ) -> BalancedSchedule {
        let schedule = self.study_schedule_at(items, days_ahead, now);
        let mut days = BTreeMap::new();
        let mut overflow: Vec<ReviewItem> = Vec::new();

        for (date, mut daily) in schedule {
            daily.append(&mut overflow);
            if daily.len() > max_per_day {
                daily.sort_by_key(|item| item.interval_days);
                overflow = daily.split_off(max_per_day);
                debug!(date = %date, carried = overflow.len(), "review load over daily cap");
            }
            days.insert(date, daily);
        }

        BalancedSchedule {
            days,
            unscheduled: overflow,
        }
    }

    pub fn optimize_daily_load(
        &self,
        items: &[ReviewItem],
        max_per_day: usize,
        days_ahead: u32,
    ) -> Vec<ReviewItem> {
        self.optimize_daily_load_at(items, max_per_day, days_ahead, Utc::now())
    }

    /// Flattened form of [`Self::balance_daily_load_at`]: day by day, then
    /// whatever could not be placed.
    pub fn optimize_daily_load_at(
        &self,
        items: &[ReviewItem],
        max_per_day: usize,
        days_ahead: u32,
        now: DateTime<Utc>,
    ) -> Vec<ReviewItem> {
        let balanced = self.balance_daily_load_at(items, max_per_day, days_ahead, now);
        balanced
            .days
            .into_values()
            .flatten()
            .chain(balanced.unscheduled)
            .collect()
    }

    /// Stochastic pick among due and new items, weighted towards overdue
    /// items and items with a low ease factor.
    pub fn pick_next_review_at<'a, R: Rng + ?Sized>(
        &self,
        items: &'a [ReviewItem],
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Option<&'a ReviewItem> {
        let candidates: Vec<&ReviewItem> = items
            .iter()
            .filter(|item| item.is_new() || item.is_due_at(now))
            .collect();

        let weights: Vec<f64> = candidates
            .iter()
            .map(|item| {
                let overdue_days = item
                    .next_review_date
                    .map_or(0, |next| (now - next).num_days().max(0)) as f64;
                (overdue_days + 1.0) * (3.0 / item.ease_factor.max(MIN_EASE_FACTOR))
            })
            .collect();

        let total_weight: f64 = weights.iter().sum();
        let mut point = rng.gen::<f64>() * total_weight;

        for (item, weight) in candidates.iter().zip(&weights) {
            point -= weight;
            if point <= 0.0 {
                return Some(item);
            }
        }

        candidates.last().copied()
    }
}

/// Maps a 0-100 quiz or mastery score onto an SM-2 quality rating.
pub fn convert_score_to_quality(score: f64) -> u8 {
    match score {
        s if s >= 95.0 => 5,
        s if s >= 80.0 => 4,
        s if s >= 60.0 => 3,
        s if s >= 40.0 => 2,
        s if s >= 20.0 => 1,
        _ => 0,
    }
}
