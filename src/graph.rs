//! Prerequisite knowledge graph and learning-path planner.
//!
//! The graph owns the topic table plus two derived indexes: forward
//! (topic -> prerequisites) and reverse (topic -> dependents). Both are
//! re-indexed on every insert so that replacing a topic never leaves stale
//! edges behind.
//!
//! Unknown ids are tolerated everywhere: a prerequisite that is not in the
//! topic table is treated as trivially satisfied and skipped in the output.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CoachError, Result};
use crate::models::{Recommendation, RecommendationReason, Topic};

pub const DEFAULT_MAX_RECOMMENDATIONS: usize = 5;

/// On-disk knowledge base format: `{ "topics": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeBase {
    #[serde(default)]
    pub topics: Vec<Topic>,
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    topics: HashMap<String, Topic>,
    // insertion order of topic ids
    order: Vec<String>,
    prerequisites: HashMap<String, Vec<String>>,
    dependents: HashMap<String, Vec<String>>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_topics<I: IntoIterator<Item = Topic>>(topics: I) -> Self {
        let mut graph = Self::new();
        for topic in topics {
            graph.add_topic(topic);
        }
        graph
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let kb: KnowledgeBase = serde_json::from_str(json)?;
        Ok(Self::from_topics(kb.topics))
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let graph = Self::from_json_str(&contents)?;
        info!(path = %path.display(), topics = graph.len(), "knowledge base loaded");
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Inserts or replaces a topic and re-indexes its edges.
    pub fn add_topic(&mut self, topic: Topic) {
        let id = topic.id.clone();

        let mut prereqs: Vec<String> = Vec::with_capacity(topic.prerequisites.len());
        for p in &topic.prerequisites {
            if !prereqs.contains(p) {
                prereqs.push(p.clone());
            }
        }

        // Drop reverse edges for prerequisites the new version no longer has
        if let Some(old) = self.prerequisites.get(&id) {
            for stale in old.iter().filter(|p| !prereqs.contains(p)) {
                if let Some(deps) = self.dependents.get_mut(stale) {
                    deps.retain(|d| d != &id);
                }
            }
        }

        for p in &prereqs {
            let deps = self.dependents.entry(p.clone()).or_default();
            if !deps.contains(&id) {
                deps.push(id.clone());
            }
        }

        self.prerequisites.insert(id.clone(), prereqs);
        if !self.topics.contains_key(&id) {
            self.order.push(id.clone());
        }
        self.topics.insert(id, topic);
    }

    pub fn get_topic(&self, topic_id: &str) -> Option<&Topic> {
        self.topics.get(topic_id)
    }

    pub fn contains(&self, topic_id: &str) -> bool {
        self.topics.contains_key(topic_id)
    }

    pub fn all_topics(&self) -> Vec<&Topic> {
        self.order
            .iter()
            .filter_map(|id| self.topics.get(id))
            .collect()
    }

    pub fn topics_by_category(&self, category: &str) -> Vec<&Topic> {
        self.all_topics()
            .into_iter()
            .filter(|t| t.category == category)
            .collect()
    }

    pub fn categories(&self) -> Vec<&str> {
        let mut cats: Vec<&str> = self
            .topics
            .values()
            .map(|t| t.category.as_str())
            .filter(|c| !c.is_empty())
            .collect();
        cats.sort_unstable();
        cats.dedup();
        cats
    }

    /// Direct prerequisites that exist in the topic table.
    pub fn prerequisites(&self, topic_id: &str) -> Vec<&Topic> {
        self.prerequisite_ids(topic_id)
            .iter()
            .filter_map(|id| self.topics.get(id))
            .collect()
    }

    /// Topics that list `topic_id` as a direct prerequisite.
    pub fn dependents(&self, topic_id: &str) -> Vec<&Topic> {
        self.dependent_ids(topic_id)
            .iter()
            .filter_map(|id| self.topics.get(id))
            .collect()
    }

    pub fn prerequisite_ids(&self, topic_id: &str) -> &[String] {
        self.prerequisites
            .get(topic_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn dependent_ids(&self, topic_id: &str) -> &[String] {
        self.dependents
            .get(topic_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn difficulty_of(&self, topic_id: &str) -> u8 {
        self.topics.get(topic_id).map_or(1, |t| t.difficulty_level)
    }

    // BFS over prerequisite edges; returns ids in discovery order.
    fn required_topics<'a>(&'a self, target_id: &'a str, completed: &HashSet<&str>) -> Vec<&'a str> {
        let mut required = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([target_id]);

        while let Some(current) = queue.pop_front() {
            if completed.contains(current) || !visited.insert(current) {
                continue;
            }
            required.push(current);
            queue.extend(self.prerequisite_ids(current).iter().map(String::as_str));
        }

        required
    }

    /// Orders everything still needed to reach `target_id`, prerequisites
    /// first and easier topics first among those that are ready.
    ///
    /// Topics on an unbroken prerequisite cycle never become ready and are
    /// left out of the result.
    pub fn learning_path(&self, target_id: &str, completed: &[String]) -> Vec<Topic> {
        let completed: HashSet<&str> = completed.iter().map(String::as_str).collect();
        let required = self.required_topics(target_id, &completed);
        let required_set: HashSet<&str> = required.iter().copied().collect();

        let mut in_degree: HashMap<&str, usize> = required
            .iter()
            .map(|&id| {
                let n = self
                    .prerequisite_ids(id)
                    .iter()
                    .filter(|p| required_set.contains(p.as_str()))
                    .count();
                (id, n)
            })
            .collect();

        let mut ready: Vec<&str> = required
            .iter()
            .copied()
            .filter(|id| in_degree.get(id) == Some(&0))
            .collect();
        let mut path = Vec::with_capacity(required.len());

        while !ready.is_empty() {
            ready.sort_by_key(|id| self.difficulty_of(id));
            let current = ready.remove(0);

            match self.topics.get(current) {
                Some(topic) => path.push(topic.clone()),
                None => debug!(topic_id = current, "skipping unknown topic in learning path"),
            }

            for dependent in self.dependent_ids(current) {
                if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                    if *degree > 0 {
                        *degree -= 1;
                        if *degree == 0 {
                            ready.push(dependent.as_str());
                        }
                    }
                }
            }
        }

        let placed = path.len();
        let known = required.iter().filter(|id| self.contains(id)).count();
        if placed < known {
            debug!(
                target_id,
                omitted = known - placed,
                "prerequisite cycle left topics out of the learning path"
            );
        }

        path
    }

    pub fn recommend_next_topics(
        &self,
        completed: &[String],
        weak: &[String],
        max_recommendations: usize,
    ) -> Vec<Recommendation> {
        let completed_set: HashSet<&str> = completed.iter().map(String::as_str).collect();
        let mut recommendations = Vec::new();
        let mut seen_weak: HashSet<&str> = HashSet::new();

        for topic_id in weak {
            if !seen_weak.insert(topic_id.as_str()) {
                continue;
            }
            match self.topics.get(topic_id) {
                Some(topic) => recommendations.push(Recommendation {
                    topic: topic.clone(),
                    reason: RecommendationReason::WeaknessReview,
                }),
                None => debug!(topic_id = %topic_id, "weak topic not in knowledge graph"),
            }
        }

        for topic in self.all_topics() {
            if completed_set.contains(topic.id.as_str()) {
                continue;
            }
            let unlocked = self
                .prerequisite_ids(&topic.id)
                .iter()
                .all(|p| completed_set.contains(p.as_str()));
            if unlocked {
                recommendations.push(Recommendation {
                    topic: topic.clone(),
                    reason: RecommendationReason::PrerequisitesCompleted,
                });
            }
        }

        recommendations.sort_by_key(|r| r.topic.difficulty_level);
        recommendations.truncate(max_recommendations);
        recommendations
    }

    /// Length of the longest prerequisite chain below `topic_id`.
    ///
    /// Unknown topics have depth 0; an unknown prerequisite counts as one
    /// level. Fails with [`CoachError::CycleDetected`] instead of looping.
    pub fn topic_depth(&self, topic_id: &str) -> Result<usize> {
        if !self.topics.contains_key(topic_id) {
            return Ok(0);
        }

        let mut depths: HashMap<&str, usize> = HashMap::new();
        let mut on_path: HashSet<&str> = HashSet::from([topic_id]);
        // (topic, index of next prerequisite to visit)
        let mut stack: Vec<(&str, usize)> = vec![(topic_id, 0)];

        while let Some(frame) = stack.last_mut() {
            let (id, next) = *frame;
            let prereqs = self.prerequisite_ids(id);

            if next < prereqs.len() {
                frame.1 += 1;
                let prereq = prereqs[next].as_str();
                if depths.contains_key(prereq) {
                    continue;
                }
                if on_path.contains(prereq) {
                    return Err(CoachError::CycleDetected {
                        topic_id: prereq.to_string(),
                    });
                }
                if !self.topics.contains_key(prereq) {
                    depths.insert(prereq, 0);
                    continue;
                }
                on_path.insert(prereq);
                stack.push((prereq, 0));
            } else {
                let depth = prereqs
                    .iter()
                    .map(|p| depths.get(p.as_str()).copied().unwrap_or(0) + 1)
                    .max()
                    .unwrap_or(0);
                depths.insert(id, depth);
                on_path.remove(id);
                stack.pop();
            }
        }

        Ok(depths.get(topic_id).copied().unwrap_or(0))
    }

    pub fn find_gaps(&self, completed: &[String], target_id: &str) -> Vec<Topic> {
        self.learning_path(target_id, completed)
            .into_iter()
            .filter(|t| !completed.contains(&t.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(topics: &[Topic]) -> Vec<&str> {
        topics.iter().map(|t| t.id.as_str()).collect()
    }

    fn abc_graph() -> KnowledgeGraph {
        KnowledgeGraph::from_topics([
            Topic::new("A", "A", 1),
            Topic::new("B", "B", 2).with_prerequisites(["A"]),
            Topic::new("C", "C", 1).with_prerequisites(["B"]),
        ])
    }

    // intro -> {vars, types} -> loops -> {functions, recursion}
    fn course_graph() -> KnowledgeGraph {
        KnowledgeGraph::from_topics([
            Topic::new("intro", "Intro", 1),
            Topic::new("vars", "Variables", 2).with_prerequisites(["intro"]),
            Topic::new("types", "Types", 1).with_prerequisites(["intro"]),
            Topic::new("loops", "Loops", 2).with_prerequisites(["vars", "types"]),
            Topic::new("functions", "Functions", 3).with_prerequisites(["loops"]),
            Topic::new("recursion", "Recursion", 4).with_prerequisites(["functions", "loops"]),
        ])
    }

    mod add_topic_tests {
        use super::*;

        #[test]
        fn builds_forward_and_reverse_indexes() {
            let graph = abc_graph();
            assert_eq!(graph.prerequisite_ids("B"), ["A".to_string()]);
            assert_eq!(graph.dependent_ids("A"), ["B".to_string()]);
            assert!(graph.dependent_ids("C").is_empty());
        }

        #[test]
        fn adding_identical_topic_twice_is_idempotent() {
            let mut graph = abc_graph();
            let before_fwd = graph.prerequisite_ids("B").to_vec();
            let before_rev = graph.dependent_ids("A").to_vec();

            graph.add_topic(Topic::new("B", "B", 2).with_prerequisites(["A"]));

            assert_eq!(graph.prerequisite_ids("B"), before_fwd.as_slice());
            assert_eq!(graph.dependent_ids("A"), before_rev.as_slice());
            assert_eq!(graph.len(), 3);
        }

        #[test]
        fn duplicate_prerequisites_collapse() {
            let graph = KnowledgeGraph::from_topics([
                Topic::new("A", "A", 1),
                Topic::new("B", "B", 1).with_prerequisites(["A", "A"]),
            ]);
            assert_eq!(graph.prerequisite_ids("B").len(), 1);
            assert_eq!(graph.dependent_ids("A").len(), 1);
        }

        #[test]
        fn replacing_topic_removes_stale_reverse_edges() {
            let mut graph = abc_graph();
            graph.add_topic(Topic::new("X", "X", 1));
            graph.add_topic(Topic::new("C", "C", 1).with_prerequisites(["X"]));

            assert!(graph.dependent_ids("B").is_empty());
            assert_eq!(graph.dependent_ids("X"), ["C".to_string()]);
            assert_eq!(ids(&graph.learning_path("C", &[])), vec!["X", "C"]);
        }

        #[test]
        fn replacing_topic_keeps_insertion_order() {
            let mut graph = abc_graph();
            graph.add_topic(Topic::new("A", "A renamed", 1));
            let order: Vec<&str> = graph.all_topics().iter().map(|t| t.id.as_str()).collect();
            assert_eq!(order, vec!["A", "B", "C"]);
            assert_eq!(graph.get_topic("A").unwrap().name, "A renamed");
        }

        #[test]
        fn accepts_unknown_prerequisites() {
            let graph = KnowledgeGraph::from_topics([
                Topic::new("B", "B", 1).with_prerequisites(["ghost"])
            ]);
            assert_eq!(graph.dependent_ids("ghost"), ["B".to_string()]);
            assert!(graph.prerequisites("B").is_empty());
        }
    }

    mod lookup_tests {
        use super::*;

        #[test]
        fn get_topic_absent_is_none() {
            assert!(abc_graph().get_topic("nope").is_none());
        }

        #[test]
        fn prerequisites_and_dependents_resolve_topics() {
            let graph = course_graph();
            let prereqs: Vec<&str> = graph.prerequisites("loops").iter().map(|t| t.id.as_str()).collect();
            assert_eq!(prereqs, vec!["vars", "types"]);
            let deps: Vec<&str> = graph.dependents("loops").iter().map(|t| t.id.as_str()).collect();
            assert_eq!(deps, vec!["functions", "recursion"]);
        }

        #[test]
        fn topics_by_category_filters() {
            let graph = KnowledgeGraph::from_topics([
                Topic::new("a", "A", 1).with_category("Python"),
                Topic::new("b", "B", 1).with_category("Web"),
                Topic::new("c", "C", 1).with_category("Python"),
            ]);
            let python: Vec<&str> = graph
                .topics_by_category("Python")
                .iter()
                .map(|t| t.id.as_str())
                .collect();
            assert_eq!(python, vec!["a", "c"]);
            assert_eq!(graph.categories(), vec!["Python", "Web"]);
        }

        #[test]
        fn from_json_str_loads_knowledge_base() {
            let json = r#"{"topics": [
                {"id": "a", "name": "A"},
                {"id": "b", "name": "B", "prerequisites": ["a"], "difficulty_level": 3}
            ]}"#;
            let graph = KnowledgeGraph::from_json_str(json).unwrap();
            assert_eq!(graph.len(), 2);
            assert_eq!(graph.dependent_ids("a"), ["b".to_string()]);
        }

        #[test]
        fn from_json_str_rejects_malformed_input() {
            let err = KnowledgeGraph::from_json_str("{\"topics\": [").unwrap_err();
            assert!(matches!(err, CoachError::Json(_)));
        }

        #[test]
        fn load_from_file_reads_json() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("kb.json");
            std::fs::write(&path, r#"{"topics": [{"id": "a", "name": "A"}]}"#).unwrap();

            let graph = KnowledgeGraph::load_from_file(&path).unwrap();
            assert!(graph.contains("a"));
        }

        #[test]
        fn load_from_missing_file_is_io_error() {
            let dir = tempfile::tempdir().unwrap();
            let err = KnowledgeGraph::load_from_file(dir.path().join("missing.json")).unwrap_err();
            assert!(matches!(err, CoachError::Io(_)));
        }
    }

    mod learning_path_tests {
        use super::*;

        #[test]
        fn chain_is_ordered_prerequisites_first() {
            assert_eq!(ids(&abc_graph().learning_path("C", &[])), vec!["A", "B", "C"]);
        }

        #[test]
        fn completed_topics_are_excluded() {
            let path = abc_graph().learning_path("C", &["A".to_string()]);
            assert_eq!(ids(&path), vec!["B", "C"]);
        }

        #[test]
        fn everything_completed_gives_empty_path() {
            let graph = course_graph();
            let all: Vec<String> = graph.all_topics().iter().map(|t| t.id.clone()).collect();
            assert!(graph.learning_path("recursion", &all).is_empty());
        }

        #[test]
        fn respects_every_prerequisite_edge() {
            let graph = course_graph();
            for target in ["intro", "vars", "loops", "functions", "recursion"] {
                let path = graph.learning_path(target, &[]);
                let position: HashMap<&str, usize> =
                    path.iter().enumerate().map(|(i, t)| (t.id.as_str(), i)).collect();
                for topic in &path {
                    for prereq in &topic.prerequisites {
                        assert!(
                            position[prereq.as_str()] < position[topic.id.as_str()],
                            "{} must come before {} (target {})",
                            prereq,
                            topic.id,
                            target
                        );
                    }
                }
                assert_eq!(path.last().unwrap().id, target);
            }
        }

        #[test]
        fn ready_topics_ordered_by_difficulty() {
            // types (1) and vars (2) both unlock after intro
            let path = course_graph().learning_path("loops", &[]);
            assert_eq!(ids(&path), vec!["intro", "types", "vars", "loops"]);
        }

        #[test]
        fn unknown_target_gives_empty_path() {
            assert!(abc_graph().learning_path("ghost", &[]).is_empty());
        }

        #[test]
        fn unknown_prerequisite_is_skipped_not_blocking() {
            let graph = KnowledgeGraph::from_topics([
                Topic::new("A", "A", 1),
                Topic::new("B", "B", 1).with_prerequisites(["A", "ghost"]),
            ]);
            assert_eq!(ids(&graph.learning_path("B", &[])), vec!["A", "B"]);
        }

        #[test]
        fn cycle_members_are_omitted_without_hanging() {
            let graph = KnowledgeGraph::from_topics([
                Topic::new("base", "Base", 1),
                Topic::new("x", "X", 1).with_prerequisites(["y", "base"]),
                Topic::new("y", "Y", 1).with_prerequisites(["x"]),
                Topic::new("goal", "Goal", 1).with_prerequisites(["x"]),
            ]);
            assert_eq!(ids(&graph.learning_path("goal", &[])), vec!["base"]);
        }

        #[test]
        fn completed_topic_breaks_cycle() {
            let graph = KnowledgeGraph::from_topics([
                Topic::new("x", "X", 1).with_prerequisites(["y"]),
                Topic::new("y", "Y", 1).with_prerequisites(["x"]),
            ]);
            assert_eq!(ids(&graph.learning_path("x", &["y".to_string()])), vec!["x"]);
        }

        #[test]
        fn self_prerequisite_is_omitted() {
            let graph = KnowledgeGraph::from_topics([Topic::new("s", "S", 1).with_prerequisites(["s"])]);
            assert!(graph.learning_path("s", &[]).is_empty());
        }
    }

    mod recommendation_tests {
        use super::*;

        #[test]
        fn nothing_completed_recommends_roots() {
            let recs = course_graph().recommend_next_topics(&[], &[], DEFAULT_MAX_RECOMMENDATIONS);
            assert_eq!(recs.len(), 1);
            assert_eq!(recs[0].topic.id, "intro");
            assert_eq!(recs[0].reason, RecommendationReason::PrerequisitesCompleted);
        }

        #[test]
        fn unlocked_topics_sorted_by_difficulty() {
            let recs = course_graph().recommend_next_topics(&["intro".to_string()], &[], 5);
            let got: Vec<&str> = recs.iter().map(|r| r.topic.id.as_str()).collect();
            assert_eq!(got, vec!["types", "vars"]);
        }

        #[test]
        fn weak_topics_come_first_within_same_difficulty() {
            let graph = course_graph();
            let completed = vec!["intro".to_string(), "types".to_string()];
            let weak = vec!["types".to_string()];
            let recs = graph.recommend_next_topics(&completed, &weak, 5);

            assert_eq!(recs[0].topic.id, "types");
            assert_eq!(recs[0].reason, RecommendationReason::WeaknessReview);
            assert_eq!(recs[1].topic.id, "vars");
            assert_eq!(recs[1].reason, RecommendationReason::PrerequisitesCompleted);
        }

        #[test]
        fn unknown_and_repeated_weak_ids_are_skipped() {
            let graph = abc_graph();
            let weak = vec!["ghost".to_string(), "B".to_string(), "B".to_string()];
            let recs = graph.recommend_next_topics(&["A".to_string(), "B".to_string()], &weak, 5);
            let weak_recs = recs
                .iter()
                .filter(|r| r.reason == RecommendationReason::WeaknessReview)
                .count();
            assert_eq!(weak_recs, 1);
        }

        #[test]
        fn truncates_to_max() {
            let graph = KnowledgeGraph::from_topics((0..10).map(|i| Topic::new(format!("t{}", i), "T", 1)));
            assert_eq!(graph.recommend_next_topics(&[], &[], 3).len(), 3);
            assert!(graph.recommend_next_topics(&[], &[], 0).is_empty());
        }

        #[test]
        fn unknown_prerequisite_keeps_topic_locked() {
            let graph = KnowledgeGraph::from_topics([
                Topic::new("B", "B", 1).with_prerequisites(["ghost"])
            ]);
            assert!(graph.recommend_next_topics(&[], &[], 5).is_empty());
        }
    }

    mod depth_tests {
        use super::*;

        #[test]
        fn root_and_unknown_have_depth_zero() {
            let graph = abc_graph();
            assert_eq!(graph.topic_depth("A").unwrap(), 0);
            assert_eq!(graph.topic_depth("ghost").unwrap(), 0);
        }

        #[test]
        fn depth_is_longest_chain() {
            let graph = course_graph();
            assert_eq!(graph.topic_depth("loops").unwrap(), 2);
            assert_eq!(graph.topic_depth("recursion").unwrap(), 4);
        }

        #[test]
        fn unknown_prerequisite_counts_one_level() {
            let graph = KnowledgeGraph::from_topics([
                Topic::new("B", "B", 1).with_prerequisites(["ghost"])
            ]);
            assert_eq!(graph.topic_depth("B").unwrap(), 1);
        }

        #[test]
        fn diamond_shares_memoised_depths() {
            let graph = KnowledgeGraph::from_topics([
                Topic::new("r", "R", 1),
                Topic::new("l", "L", 1).with_prerequisites(["r"]),
                Topic::new("m", "M", 1).with_prerequisites(["r"]),
                Topic::new("d", "D", 1).with_prerequisites(["l", "m"]),
            ]);
            assert_eq!(graph.topic_depth("d").unwrap(), 2);
        }

        #[test]
        fn cycle_is_reported() {
            let graph = KnowledgeGraph::from_topics([
                Topic::new("x", "X", 1).with_prerequisites(["y"]),
                Topic::new("y", "Y", 1).with_prerequisites(["z"]),
                Topic::new("z", "Z", 1).with_prerequisites(["x"]),
            ]);
            let err = graph.topic_depth("x").unwrap_err();
            assert!(matches!(err, CoachError::CycleDetected { .. }));
        }

        #[test]
        fn long_chain_does_not_overflow_stack() {
            let mut graph = KnowledgeGraph::new();
            graph.add_topic(Topic::new("t0", "T0", 1));
            for i in 1..5000 {
                graph.add_topic(Topic::new(format!("t{}", i), "T", 1).with_prerequisites([format!("t{}", i - 1)]));
            }
            assert_eq!(graph.topic_depth("t4999").unwrap(), 4999);
        }
    }

    mod gap_tests {
        use super::*;

        #[test]
        fn gaps_exclude_completed() {
            let graph = course_graph();
            let completed = vec!["intro".to_string(), "vars".to_string()];
            let gaps = graph.find_gaps(&completed, "loops");
            assert_eq!(ids(&gaps), vec!["types", "loops"]);
        }

        #[test]
        fn completed_target_has_no_gaps() {
            let graph = abc_graph();
            assert!(graph.find_gaps(&["C".to_string()], "C").is_empty());
        }
    }

    mod knowledge_base_tests {
        use super::*;

        const DEMO: &str = include_str!("../demos/knowledge_base.json");

        #[test]
        fn demo_knowledge_base_parses() {
            let graph = KnowledgeGraph::from_json_str(DEMO).unwrap();
            assert_eq!(graph.len(), 10);
            assert_eq!(graph.categories(), vec!["Basics", "Concurrency", "Memory", "Types"]);
            assert_eq!(graph.get_topic("ownership").unwrap().resources.len(), 1);
            assert_eq!(graph.topic_depth("async").unwrap(), 6);
        }

        #[test]
        fn demo_path_respects_prerequisites() {
            let graph = KnowledgeGraph::from_json_str(DEMO).unwrap();
            let path = graph.learning_path("async", &[]);
            assert_eq!(path.len(), graph.len());

            let position = |id: &str| path.iter().position(|t| t.id == id).unwrap();
            for topic in &path {
                for prereq in &topic.prerequisites {
                    assert!(position(prereq.as_str()) < position(topic.id.as_str()), "{} before {}", prereq, topic.id);
                }
            }
        }

        #[test]
        fn malformed_json_is_an_error() {
            assert!(KnowledgeGraph::from_json_str("{\"topics\": [{\"name\": \"x\"}]}").is_err());
        }
    }
}
