//! Thread-safe handles for the stateful coach components.
//!
//! Each handle wraps one lock around its component, so clones share the
//! same graph or analyzer. A poisoned lock is reported as
//! [`CoachError::LockPoisoned`].

use std::sync::{Arc, Mutex, RwLock};

use crate::error::{CoachError, Result};
use crate::graph::KnowledgeGraph;
use crate::models::{PerformanceRecord, Recommendation, Topic};
use crate::weakness::{TopicStats, WeaknessAnalysis, WeaknessAnalyzer};

/// Concurrent reads, exclusive inserts.
#[derive(Clone, Default)]
pub struct SharedKnowledgeGraph {
    inner: Arc<RwLock<KnowledgeGraph>>,
}

impl SharedKnowledgeGraph {
    pub fn new(graph: KnowledgeGraph) -> Self {
        Self {
            inner: Arc::new(RwLock::new(graph)),
        }
    }

    pub fn add_topic(&self, topic: Topic) -> Result<()> {
        let mut graph = self
            .inner
            .write()
            .map_err(|_| CoachError::LockPoisoned("knowledge graph"))?;
        graph.add_topic(topic);
        Ok(())
    }

    pub fn get_topic(&self, topic_id: &str) -> Result<Option<Topic>> {
        self.read(|graph| graph.get_topic(topic_id).cloned())
    }

    pub fn learning_path(&self, target_id: &str, completed: &[String]) -> Result<Vec<Topic>> {
        self.read(|graph| graph.learning_path(target_id, completed))
    }

    pub fn recommend_next_topics(
        &self,
        completed: &[String],
        weak: &[String],
        max_recommendations: usize,
    ) -> Result<Vec<Recommendation>> {
        self.read(|graph| graph.recommend_next_topics(completed, weak, max_recommendations))
    }

    pub fn topic_depth(&self, topic_id: &str) -> Result<usize> {
        self.read(|graph| graph.topic_depth(topic_id))?
    }

    pub fn find_gaps(&self, completed: &[String], target_id: &str) -> Result<Vec<Topic>> {
        self.read(|graph| graph.find_gaps(completed, target_id))
    }

    /// Runs `f` under the read lock.
    pub fn read<T>(&self, f: impl FnOnce(&KnowledgeGraph) -> T) -> Result<T> {
        let graph = self
            .inner
            .read()
            .map_err(|_| CoachError::LockPoisoned("knowledge graph"))?;
        Ok(f(&graph))
    }
}

/// All access serialized behind one mutex.
#[derive(Clone, Default)]
pub struct SharedWeaknessAnalyzer {
    inner: Arc<Mutex<WeaknessAnalyzer>>,
}

impl SharedWeaknessAnalyzer {
    pub fn new(analyzer: WeaknessAnalyzer) -> Self {
        Self {
            inner: Arc::new(Mutex::new(analyzer)),
        }
    }

    pub fn add_performance_record(&self, user_id: i64, record: PerformanceRecord) -> Result<()> {
        self.with(|analyzer| analyzer.add_performance_record(user_id, record))
    }

    pub fn analyze_weaknesses(
        &self,
        user_id: i64,
        min_attempts: u32,
        weakness_threshold: f64,
    ) -> Result<WeaknessAnalysis> {
        self.with(|analyzer| analyzer.analyze_weaknesses(user_id, min_attempts, weakness_threshold))
    }

    pub fn topic_stats(&self, user_id: i64, topic_id: &str) -> Result<Option<TopicStats>> {
        self.with(|analyzer| analyzer.topic_stats(user_id, topic_id).cloned())
    }

    fn with<T>(&self, f: impl FnOnce(&mut WeaknessAnalyzer) -> T) -> Result<T> {
        let mut analyzer = self
            .inner
            .lock()
            .map_err(|_| CoachError::LockPoisoned("weakness analyzer"))?;
        Ok(f(&mut analyzer))
    }
}
