//! Mutation merge engine: validates creation and logging batches against a
//! [`Context`] and folds accepted mutations into an [`OutputDelta`].
//!
//! The engine holds no session state. Callers pass the current context and
//! delta in and get fresh values back; inputs are never modified.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use thiserror::Error;

use crate::config::EngineConfig;
use crate::context::Context;
use crate::delta::{LoggedEntry, OutputDelta};
use crate::error::{AgentError, EngineError};
use crate::input_kind::{handlers, resolve};
use crate::model::{HabitDefinition, MetricDefinition, MetricKey};
use crate::requests::{HabitCreationRequest, LogEntryRequest};
use crate::timestamp::{BuiltinTimeParser, Clock, SystemClock, TimeReferenceParser, resolve_timestamp};
use crate::validation::MetricValue;

/// Lifecycle of one mutation batch, reported through `tracing` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStage {
    Start,
    Validating,
    Accepted,
    Rejected,
    Merging,
    Done,
}

impl MergeStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            MergeStage::Start => "start",
            MergeStage::Validating => "validating",
            MergeStage::Accepted => "accepted",
            MergeStage::Rejected => "rejected",
            MergeStage::Merging => "merging",
            MergeStage::Done => "done",
        }
    }
}

/// Result of an accepted creation batch.
#[derive(Debug, Clone, PartialEq)]
pub struct CreationOutcome {
    pub context: Context,
    pub delta: OutputDelta,
    /// Habits created or extended, in request order
    pub habits: Vec<String>,
}

/// A creation batch that was rejected as a whole. `location` points at the
/// offending request item, e.g. `creation[1].metrics[0]`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{location}: {error}")]
pub struct CreationRejected {
    pub location: String,
    pub error: EngineError,
}

impl CreationRejected {
    pub fn to_agent_error(&self) -> AgentError {
        self.error.to_agent_error(Some(&self.location))
    }
}

/// Per-entry result of a logging batch.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryOutcome {
    Logged {
        index: usize,
        habit: String,
        timestamp: String,
    },
    Rejected {
        index: usize,
        habit: String,
        location: String,
        error: EngineError,
    },
}

impl EntryOutcome {
    pub fn index(&self) -> usize {
        match self {
            EntryOutcome::Logged { index, .. } | EntryOutcome::Rejected { index, .. } => *index,
        }
    }

    pub fn habit(&self) -> &str {
        match self {
            EntryOutcome::Logged { habit, .. } | EntryOutcome::Rejected { habit, .. } => habit,
        }
    }

    pub fn is_logged(&self) -> bool {
        matches!(self, EntryOutcome::Logged { .. })
    }

    pub fn agent_error(&self) -> Option<AgentError> {
        match self {
            EntryOutcome::Logged { .. } => None,
            EntryOutcome::Rejected {
                location, error, ..
            } => Some(error.to_agent_error(Some(location))),
        }
    }
}

/// Result of a logging batch. Logging never changes the context.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingOutcome {
    pub delta: OutputDelta,
    pub results: Vec<EntryOutcome>,
}

impl LoggingOutcome {
    pub fn logged_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_logged()).count()
    }

    pub fn rejected_count(&self) -> usize {
        self.results.len() - self.logged_count()
    }
}

pub struct Engine {
    config: EngineConfig,
    clock: Box<dyn Clock>,
    time_parser: Box<dyn TimeReferenceParser>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine").field("config", &self.config).finish_non_exhaustive()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            clock: Box::new(SystemClock),
            time_parser: Box::new(BuiltinTimeParser),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_time_parser(mut self, parser: impl TimeReferenceParser + 'static) -> Self {
        self.time_parser = Box::new(parser);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate and apply a creation batch atomically: either every metric of
    /// every habit is accepted, or nothing is and the first failure is returned.
    pub fn create_habits(
        &self,
        context: &Context,
        delta: &OutputDelta,
        batch: &[HabitCreationRequest],
    ) -> Result<CreationOutcome, CreationRejected> {
        tracing::debug!(stage = MergeStage::Start.as_str(), habits = batch.len(), "creation batch");
        tracing::debug!(stage = MergeStage::Validating.as_str(), "creation batch");

        let staged = match stage_creation(context, batch) {
            Ok(staged) => staged,
            Err(rejected) => {
                tracing::debug!(
                    stage = MergeStage::Rejected.as_str(),
                    location = %rejected.location,
                    code = rejected.error.code(),
                    "creation batch"
                );
                return Err(rejected);
            }
        };
        tracing::debug!(stage = MergeStage::Accepted.as_str(), habits = staged.len(), "creation batch");

        tracing::debug!(stage = MergeStage::Merging.as_str(), "creation batch");
        let mut next_context = context.clone();
        let mut next_delta = delta.clone();
        let mut habits = Vec::with_capacity(staged.len());
        for StagedHabit {
            index,
            name,
            definition,
        } in staged
        {
            next_context
                .extend_habit(&name, &definition)
                .map_err(|error| CreationRejected {
                    location: format!("creation[{index}]"),
                    error,
                })?;
            next_delta.record_creation(&name, &definition);
            habits.push(name);
        }

        tracing::debug!(stage = MergeStage::Done.as_str(), "creation batch");
        Ok(CreationOutcome {
            context: next_context,
            delta: next_delta,
            habits,
        })
    }

    /// Validate and apply a logging batch. Entries succeed or fail
    /// independently; every entry gets one result in request order.
    pub fn log_entries(
        &self,
        context: &Context,
        delta: &OutputDelta,
        batch: &[LogEntryRequest],
    ) -> LoggingOutcome {
        tracing::debug!(stage = MergeStage::Start.as_str(), entries = batch.len(), "logging batch");
        tracing::debug!(stage = MergeStage::Validating.as_str(), "logging batch");

        let now = self.clock.now();
        let mut next_delta = delta.clone();
        let mut results = Vec::with_capacity(batch.len());

        for (index, entry) in batch.iter().enumerate() {
            match validate_entry(context, index, entry) {
                Ok(metrics) => {
                    let timestamp = resolve_timestamp(
                        entry.timestamp.as_deref(),
                        self.time_parser.as_ref(),
                        self.config.timezone,
                        now,
                    );
                    next_delta.record_log(
                        &entry.name,
                        LoggedEntry {
                            timestamp: timestamp.clone(),
                            notes: non_blank(entry.notes.as_deref()),
                            metrics,
                        },
                    );
                    results.push(EntryOutcome::Logged {
                        index,
                        habit: entry.name.clone(),
                        timestamp,
                    });
                }
                Err((location, error)) => {
                    tracing::debug!(
                        stage = MergeStage::Rejected.as_str(),
                        %location,
                        code = error.code(),
                        "log entry"
                    );
                    results.push(EntryOutcome::Rejected {
                        index,
                        habit: entry.name.clone(),
                        location,
                        error,
                    });
                }
            }
        }

        let outcome = LoggingOutcome {
            delta: next_delta,
            results,
        };
        tracing::debug!(
            stage = MergeStage::Done.as_str(),
            logged = outcome.logged_count(),
            rejected = outcome.rejected_count(),
            "logging batch"
        );
        outcome
    }
}

struct StagedHabit {
    index: usize,
    name: String,
    definition: HabitDefinition,
}

fn stage_creation(
    context: &Context,
    batch: &[HabitCreationRequest],
) -> Result<Vec<StagedHabit>, CreationRejected> {
    let mut staged: Vec<StagedHabit> = Vec::new();

    for (index, request) in batch.iter().enumerate() {
        let position = match staged.iter().position(|s| s.name == request.name) {
            Some(position) => position,
            None => {
                staged.push(StagedHabit {
                    index,
                    name: request.name.clone(),
                    definition: HabitDefinition::default(),
                });
                staged.len() - 1
            }
        };
        let existing = context.habits().get(&request.name);
        let record = &mut staged[position].definition;

        // Stored text wins over text sent with an extension request.
        let stored_description = existing.and_then(|h| h.description.as_ref());
        if record.description.is_none() && stored_description.is_none() {
            record.description = non_blank(request.description.as_deref());
        }
        let stored_goal = existing.and_then(|h| h.goal.as_ref());
        if record.goal.is_none() && stored_goal.is_none() {
            record.goal = non_blank(request.goal.as_deref());
        }

        for (metric_index, metric) in request.metrics.iter().enumerate() {
            let location = format!("creation[{index}].metrics[{metric_index}]");
            let reject = |error| CreationRejected {
                location: location.clone(),
                error,
            };

            if context.contains_metric(&MetricKey::new(request.name.as_str(), metric.name.as_str()))
                || record.metrics.contains_key(&metric.name)
            {
                return Err(reject(EngineError::DuplicateMetric {
                    habit: request.name.clone(),
                    metric: metric.name.clone(),
                }));
            }

            let kind = resolve(&metric.input).map_err(reject)?;
            let config = (kind.validate_config)(metric.config.as_ref()).map_err(reject)?;
            record.metrics.insert(
                metric.name.clone(),
                MetricDefinition {
                    description: non_blank(metric.description.as_deref()),
                    input: kind.kind,
                    config,
                },
            );
        }
    }

    Ok(staged)
}

/// Checks one entry's habit and metrics; the timestamp is resolved by the caller.
fn validate_entry(
    context: &Context,
    index: usize,
    entry: &LogEntryRequest,
) -> Result<BTreeMap<String, MetricValue>, (String, EngineError)> {
    if !context.contains_habit(&entry.name) {
        return Err((format!("logging[{index}]"), context.unknown_habit(&entry.name)));
    }

    let mut seen = HashSet::new();
    let mut metrics = BTreeMap::new();
    for (metric_index, metric) in entry.metrics.iter().enumerate() {
        let location = format!("logging[{index}].metrics[{metric_index}]");
        if !seen.insert(metric.name.as_str()) {
            return Err((
                location,
                EngineError::DuplicateMetricInEntry {
                    habit: entry.name.clone(),
                    metric: metric.name.clone(),
                },
            ));
        }
        let Some(spec) = context.lookup(&entry.name, &metric.name) else {
            return Err((location, context.unknown_metric(&entry.name, &metric.name)));
        };
        let value = (handlers(spec.input_kind).validate_value)(&metric.value, &spec.config)
            .map_err(|error| (location.clone(), error))?;
        metrics.insert(metric.name.clone(), value);
    }
    Ok(metrics)
}

fn non_blank(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
