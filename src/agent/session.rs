//! Per-query session state and the stage machine it moves through.

use std::fmt::{self, Write as _};
use std::time::Duration;

use serde::Serialize;

use crate::search::Candidate;

/// Reason recorded when the iteration budget ends the search loop.
pub const REASON_BUDGET: &str = "maximum search iterations reached";
/// Reason recorded when there is nothing to evaluate yet.
pub const REASON_NO_DATA: &str = "no usable information yet";

/// A stage of the question-answering flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Derive the cache key and look it up.
    CheckCache,
    /// Decide whether the candidate is enough.
    Planning,
    /// Produce the next search query.
    QueryGeneration,
    /// Run one search.
    SearchExecution,
    /// Synthesize and maybe persist the answer.
    FinalAnswer,
    /// Done.
    Terminal,
}

/// Every edge of the stage machine with the condition that selects it.
const TRANSITIONS: &[(Stage, Stage, &str)] = &[
    (Stage::CheckCache, Stage::FinalAnswer, "cache hit"),
    (Stage::CheckCache, Stage::Planning, "cache miss or empty key"),
    (Stage::Planning, Stage::FinalAnswer, "enough, or budget exhausted"),
    (Stage::Planning, Stage::QueryGeneration, "not enough"),
    (Stage::QueryGeneration, Stage::SearchExecution, "always"),
    (Stage::SearchExecution, Stage::Planning, "always"),
    (Stage::FinalAnswer, Stage::Terminal, "always"),
];

impl Stage {
    /// Every stage in flow order.
    pub const ALL: [Self; 6] = [
        Self::CheckCache,
        Self::Planning,
        Self::QueryGeneration,
        Self::SearchExecution,
        Self::FinalAnswer,
        Self::Terminal,
    ];

    /// Snake-case name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CheckCache => "check_cache",
            Self::Planning => "planning",
            Self::QueryGeneration => "query_generation",
            Self::SearchExecution => "search_execution",
            Self::FinalAnswer => "final_answer",
            Self::Terminal => "terminal",
        }
    }

    /// Stages reachable in one step.
    pub fn successors(self) -> impl Iterator<Item = Self> {
        TRANSITIONS
            .iter()
            .filter(move |(from, _, _)| *from == self)
            .map(|(_, to, _)| *to)
    }

    /// Renders the stage machine as a plain-text edge list.
    #[must_use]
    pub fn diagram() -> String {
        let width = TRANSITIONS
            .iter()
            .map(|(from, to, _)| from.as_str().len() + to.as_str().len() + 4)
            .max()
            .unwrap_or_default();

        let mut out = String::from("start -> check_cache\n");
        for (from, to, label) in TRANSITIONS {
            let edge = format!("{from} -> {to}");
            let _ = writeln!(out, "{edge:<width$}  [{label}]");
        }
        out
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The evaluator's latest decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Sufficiency {
    /// Whether the loop may stop.
    pub enough: bool,
    /// Why.
    pub reason: String,
}

/// State of one query, owned by the orchestrator for its whole run.
#[derive(Debug, Clone)]
pub struct Session {
    /// The user's question, unchanged.
    pub query: String,
    /// Derived once; empty means the cache is bypassed.
    pub cache_key: String,
    /// Whether the candidate came from the cache.
    pub cache_hit: bool,
    /// Candidate text under evaluation.
    pub candidate_answer: String,
    /// Candidate source title.
    pub source_title: String,
    /// Candidate source URL.
    pub source_url: String,
    /// Latest sufficiency decision.
    pub sufficiency: Sufficiency,
    /// Strategies tried so far, in order, without duplicates.
    pub used_strategies: Vec<String>,
    /// Previous reformulated query.
    pub last_query: String,
    /// Query for the next search.
    pub search_query: String,
    /// The reformulator's restatement of what is missing.
    pub missing_reason: String,
    /// Recency filter forwarded to search.
    pub time_range: Option<String>,
    /// Searches executed.
    pub iteration: usize,
    /// Search budget.
    pub max_iterations: usize,
    /// Set when the budget ended the loop.
    pub max_reached: bool,
    /// Whether the evaluator approved persisting the candidate.
    pub store_approved: bool,
    /// Why the candidate is or is not worth storing.
    pub value_reason: String,
    /// Current stage.
    pub stage: Stage,
    /// Final answer once terminal.
    pub answer: String,
    /// Whether the candidate was written to the cache.
    pub stored: bool,
    /// Capability calls that failed and fell back to a default.
    pub degraded_calls: usize,
}

impl Session {
    /// Starts a session at [`Stage::CheckCache`].
    #[must_use]
    pub fn new(query: impl Into<String>, max_iterations: usize, time_range: Option<String>) -> Self {
        Self {
            query: query.into(),
            cache_key: String::new(),
            cache_hit: false,
            candidate_answer: String::new(),
            source_title: String::new(),
            source_url: String::new(),
            sufficiency: Sufficiency::default(),
            used_strategies: Vec::new(),
            last_query: String::new(),
            search_query: String::new(),
            missing_reason: String::new(),
            time_range,
            iteration: 0,
            max_iterations,
            max_reached: false,
            store_approved: false,
            value_reason: String::new(),
            stage: Stage::CheckCache,
            answer: String::new(),
            stored: false,
            degraded_calls: 0,
        }
    }

    /// Records a strategy. Returns `false` if it was blank or already used.
    pub fn add_strategy(&mut self, strategy: &str) -> bool {
        let strategy = strategy.trim();
        if strategy.is_empty() || self.used_strategies.iter().any(|s| s == strategy) {
            return false;
        }
        self.used_strategies.push(strategy.to_string());
        true
    }

    /// Replaces the candidate fields.
    pub fn set_candidate(&mut self, candidate: Candidate) {
        self.candidate_answer = candidate.text;
        self.source_title = candidate.title;
        self.source_url = candidate.url;
    }

    /// Whether there is anything for the evaluator to look at.
    #[must_use]
    pub fn has_candidate(&self) -> bool {
        !self.candidate_answer.is_empty() || !self.source_url.is_empty()
    }

    /// Whether the budget allows no further searches.
    #[must_use]
    pub const fn budget_spent(&self) -> bool {
        self.iteration >= self.max_iterations
    }

    /// Summarizes the session.
    #[must_use]
    pub fn report(&self, elapsed: Duration) -> SessionReport {
        SessionReport {
            query: self.query.clone(),
            answer: self.answer.clone(),
            cache_key: self.cache_key.clone(),
            cache_hit: self.cache_hit,
            iterations: self.iteration,
            max_reached: self.max_reached,
            used_strategies: self.used_strategies.clone(),
            source_title: self.source_title.clone(),
            source_url: self.source_url.clone(),
            stored: self.stored,
            degraded_calls: self.degraded_calls,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Outcome of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    /// The question.
    pub query: String,
    /// The synthesized answer. Empty if synthesis failed.
    pub answer: String,
    /// Derived cache key.
    pub cache_key: String,
    /// Whether the answer was grounded on a cached entry.
    pub cache_hit: bool,
    /// Searches executed.
    pub iterations: usize,
    /// Whether the budget ended the loop.
    pub max_reached: bool,
    /// Strategies tried.
    pub used_strategies: Vec<String>,
    /// Source title of the final candidate.
    pub source_title: String,
    /// Source URL of the final candidate.
    pub source_url: String,
    /// Whether the candidate was written to the cache.
    pub stored: bool,
    /// Capability calls that fell back to a default.
    pub degraded_calls: usize,
    /// Wall-clock time.
    pub elapsed_ms: u64,
}
