//! Orchestrator for the cache-first search loop.
//!
//! Drives a [`Session`] through its stages: check cache → (planning →
//! query generation → search execution)* → final answer. Every capability
//! failure is mapped to a conservative default at the call site, so a
//! session always terminates with an answer.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::config::AgentConfig;
use super::keyer::KeyerAgent;
use super::planner::{PlannerAgent, Verdict};
use super::prompt::PromptSet;
use super::provider::LlmProvider;
use super::reformulator::{Reformulation, ReformulatorAgent};
use super::session::{REASON_BUDGET, REASON_NO_DATA, Session, SessionReport, Stage, Sufficiency};
use super::synthesizer::{Grounding, SynthesizerAgent};
use crate::cache::{CacheEntry, CacheStore};
use crate::error::AgentError;
use crate::search::{Candidate, SearchExecutor};

/// Longest accepted query, in bytes.
const MAX_QUERY_LEN: usize = 10_000;

/// Orchestrates one question-answering session at a time.
///
/// Holds no per-session state, so one instance can serve many concurrent
/// sessions over a shared cache.
pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    store: Arc<dyn CacheStore>,
    searcher: SearchExecutor,
    config: AgentConfig,
    keyer: KeyerAgent,
    planner: PlannerAgent,
    reformulator: ReformulatorAgent,
    synthesizer: SynthesizerAgent,
}

impl Orchestrator {
    /// Creates a new orchestrator.
    ///
    /// Loads prompt templates from the directory specified in
    /// [`AgentConfig::prompt_dir`], falling back to compiled-in defaults.
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        store: Arc<dyn CacheStore>,
        searcher: SearchExecutor,
        config: AgentConfig,
    ) -> Self {
        let prompts = PromptSet::load(config.prompt_dir.as_deref());
        Self::with_prompts(provider, store, searcher, config, prompts)
    }

    /// Creates a new orchestrator with an explicit prompt set.
    pub fn with_prompts(
        provider: Arc<dyn LlmProvider>,
        store: Arc<dyn CacheStore>,
        searcher: SearchExecutor,
        config: AgentConfig,
        prompts: PromptSet,
    ) -> Self {
        Self {
            keyer: KeyerAgent::new(&config, prompts.keyer),
            planner: PlannerAgent::new(&config, prompts.planner),
            reformulator: ReformulatorAgent::new(&config, prompts.reformulator),
            synthesizer: SynthesizerAgent::new(&config, prompts.synthesizer),
            provider,
            store,
            searcher,
            config,
        }
    }

    /// Answers `query`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Orchestration`] if the query is blank or longer
    /// than 10 000 bytes. Nothing else fails.
    pub async fn run_query(&self, query: &str) -> Result<SessionReport, AgentError> {
        if query.trim().is_empty() {
            return Err(AgentError::Orchestration {
                message: "Query cannot be empty".to_string(),
            });
        }

        if query.len() > MAX_QUERY_LEN {
            return Err(AgentError::Orchestration {
                message: format!(
                    "Query exceeds maximum length ({} bytes, max {MAX_QUERY_LEN})",
                    query.len()
                ),
            });
        }

        let start = Instant::now();
        let mut session = Session::new(
            query,
            self.config.max_iterations,
            self.config.time_range.clone(),
        );
        self.run(&mut session).await;

        let report = session.report(start.elapsed());
        info!(
            cache_hit = report.cache_hit,
            iterations = report.iterations,
            stored = report.stored,
            degraded_calls = report.degraded_calls,
            elapsed_ms = report.elapsed_ms,
            "session complete"
        );
        Ok(report)
    }

    /// Advances `session` until it reaches [`Stage::Terminal`].
    pub async fn run(&self, session: &mut Session) {
        while session.stage != Stage::Terminal {
            debug!(
                stage = %session.stage,
                iteration = session.iteration,
                max_iterations = session.max_iterations,
                "stage"
            );
            session.stage = match session.stage {
                Stage::CheckCache => self.check_cache(session).await,
                Stage::Planning => self.planning(session).await,
                Stage::QueryGeneration => self.query_generation(session).await,
                Stage::SearchExecution => self.search_execution(session).await,
                Stage::FinalAnswer => self.final_answer(session).await,
                Stage::Terminal => Stage::Terminal,
            };
        }
    }

    async fn check_cache(&self, session: &mut Session) -> Stage {
        if session.cache_key.is_empty() {
            session.cache_key = match self.keyer.derive_key(&*self.provider, &session.query).await
            {
                Ok(key) => key,
                Err(e) => {
                    session.degraded_calls += 1;
                    warn!(agent = "keyer", error = %e, "cache key derivation failed, bypassing cache");
                    String::new()
                }
            };
        }

        if session.cache_key.is_empty() {
            debug!("empty cache key, treating as miss");
            return Stage::Planning;
        }

        let lookup =
            tokio::time::timeout(self.config.cache_timeout, self.store.get(&session.cache_key))
                .await
                .unwrap_or_else(|_| {
                    session.degraded_calls += 1;
                    warn!(
                        key = %session.cache_key,
                        timeout_secs = self.config.cache_timeout.as_secs(),
                        "cache read timed out, treating as miss"
                    );
                    None
                });

        match lookup {
            Some(entry) => {
                debug!(key = %session.cache_key, "cache hit");
                session.cache_hit = true;
                session.set_candidate(Candidate {
                    text: entry.answer,
                    title: entry.title,
                    url: entry.url,
                });
                Stage::FinalAnswer
            }
            None => {
                debug!(key = %session.cache_key, "cache miss");
                Stage::Planning
            }
        }
    }

    async fn planning(&self, session: &mut Session) -> Stage {
        if session.budget_spent() {
            info!(iterations = session.iteration, "search budget exhausted");
            session.max_reached = true;
            session.store_approved = false;
            session.sufficiency = Sufficiency {
                enough: true,
                reason: REASON_BUDGET.to_string(),
            };
            return Stage::FinalAnswer;
        }

        if !session.has_candidate() {
            session.sufficiency = Sufficiency {
                enough: false,
                reason: REASON_NO_DATA.to_string(),
            };
            session.store_approved = false;
            return Stage::QueryGeneration;
        }

        let verdict = match self
            .planner
            .evaluate(
                &*self.provider,
                &session.query,
                &session.candidate_answer,
                &session.source_title,
                &session.source_url,
            )
            .await
        {
            Ok(verdict) => {
                debug!(
                    enough = verdict.enough,
                    store_ok = verdict.store_ok,
                    reason = %verdict.reason,
                    "sufficiency judged"
                );
                verdict
            }
            Err(e) => {
                session.degraded_calls += 1;
                warn!(agent = "planner", error = %e, "evaluation failed, treating as insufficient");
                Verdict::default()
            }
        };

        session.sufficiency = Sufficiency {
            enough: verdict.enough,
            reason: verdict.reason,
        };
        session.store_approved = verdict.store_ok;
        session.value_reason = verdict.value_reason;

        if session.sufficiency.enough {
            Stage::FinalAnswer
        } else {
            Stage::QueryGeneration
        }
    }

    async fn query_generation(&self, session: &mut Session) -> Stage {
        let reformulation = match self
            .reformulator
            .reformulate(
                &*self.provider,
                &session.query,
                &session.sufficiency.reason,
                &session.used_strategies,
                &session.last_query,
            )
            .await
        {
            Ok(r) => r,
            Err(e) => {
                session.degraded_calls += 1;
                warn!(agent = "reformulator", error = %e, "reformulation failed");
                Reformulation::default()
            }
        };

        if !reformulation.strategy.is_empty() && !session.add_strategy(&reformulation.strategy) {
            debug!(strategy = %reformulation.strategy, "strategy repeated");
        }

        debug!(
            query = %reformulation.query,
            strategy = %reformulation.strategy,
            "query reformulated"
        );
        session.search_query.clone_from(&reformulation.query);
        session.last_query = reformulation.query;
        session.missing_reason = reformulation.missing_reason;
        Stage::SearchExecution
    }

    async fn search_execution(&self, session: &mut Session) -> Stage {
        session.iteration += 1;

        if session.search_query.trim().is_empty() {
            debug!("empty search query, skipping search");
            session.set_candidate(Candidate::default());
            return Stage::Planning;
        }

        let candidate = match self
            .searcher
            .fetch_best(&session.search_query, session.time_range.as_deref())
            .await
        {
            Ok(candidate) => {
                if candidate.is_empty() {
                    debug!(query = %session.search_query, "search found nothing usable");
                }
                candidate
            }
            Err(e) => {
                session.degraded_calls += 1;
                warn!(
                    backend = self.searcher.backend_name(),
                    error = %e,
                    "search iteration failed"
                );
                Candidate::default()
            }
        };
        debug!(
            iteration = session.iteration,
            url = %candidate.url,
            chars = candidate.text.len(),
            "search executed"
        );
        session.set_candidate(candidate);
        Stage::Planning
    }

    async fn final_answer(&self, session: &mut Session) -> Stage {
        let grounding = Grounding {
            info: &session.candidate_answer,
            title: &session.source_title,
            url: &session.source_url,
            from_cache: session.cache_hit,
            max_reached: session.max_reached,
        };

        let answer = match self
            .synthesizer
            .answer(&*self.provider, &session.query, grounding)
            .await
        {
            Ok(answer) => answer,
            Err(e) => {
                session.degraded_calls += 1;
                warn!(agent = "synthesizer", error = %e, "answer synthesis failed");
                String::new()
            }
        };
        session.answer = answer;
        self.persist(session).await;
        Stage::Terminal
    }

    /// Writes the raw candidate when the evaluator approved it.
    async fn persist(&self, session: &mut Session) {
        session.stored = false;
        if session.cache_hit
            || !session.store_approved
            || session.cache_key.is_empty()
            || session.candidate_answer.is_empty()
        {
            return;
        }

        let entry = CacheEntry {
            answer: session.candidate_answer.clone(),
            title: session.source_title.clone(),
            url: session.source_url.clone(),
        };
        let write = tokio::time::timeout(
            self.config.cache_timeout,
            self.store.put(&session.cache_key, entry),
        )
        .await;
        match write {
            Ok(Ok(())) => {
                info!(key = %session.cache_key, value_reason = %session.value_reason, "answer cached");
                session.stored = true;
            }
            Ok(Err(e)) => {
                session.degraded_calls += 1;
                warn!(key = %session.cache_key, error = %e, "cache write failed");
            }
            Err(_) => {
                session.degraded_calls += 1;
                warn!(
                    key = %session.cache_key,
                    timeout_secs = self.config.cache_timeout.as_secs(),
                    "cache write timed out"
                );
            }
        }
    }
}
