//! Event dispatcher: harvests events from tracked entities and runs their
//! handlers generation by generation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::log::{LogEntry, LogSink, TracingLogSink};
use crate::{
    DispatchError, DomainEvent, EntityTracker, EventHandler, HandlerRegistry, Phase, RunnerConfig,
};

/// Summary of one dispatch phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    /// The phase that was dispatched.
    pub phase: Phase,

    /// Number of non-empty harvests, including the first one.
    pub generations: usize,

    /// Number of handlers invoked.
    pub handlers_run: usize,
}

impl DispatchReport {
    /// Creates an empty report for a phase.
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            generations: 0,
            handlers_run: 0,
        }
    }

    /// Returns true if no event was found.
    pub fn is_idle(&self) -> bool {
        self.generations == 0
    }
}

/// Routes harvested events to their registered handlers.
///
/// Dispatch is breadth-first: every event of a generation is handled before
/// the tracked entities are harvested again for the events those handlers
/// raised.
pub struct EventDispatcher<E, C> {
    registry: HandlerRegistry<E, C>,
    log: Arc<dyn LogSink>,
    config: RunnerConfig,
}

impl<E, C> EventDispatcher<E, C>
where
    E: DomainEvent,
    C: EntityTracker<E>,
{
    /// Creates a dispatcher that logs through `tracing` with default limits.
    pub fn new(registry: HandlerRegistry<E, C>) -> Self {
        Self {
            registry,
            log: Arc::new(TracingLogSink),
            config: RunnerConfig::default(),
        }
    }

    /// Replaces the log sink.
    pub fn with_log_sink(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = log;
        self
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the handler registry.
    pub fn registry(&self) -> &HandlerRegistry<E, C> {
        &self.registry
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Runs every pending BeforeSave event, including the ones handlers raise.
    pub fn run_before_commit(&self, ctx: &mut C) -> Result<DispatchReport, DispatchError> {
        self.run(Phase::Before, ctx)
    }

    /// Runs every pending AfterSave event, including the ones handlers raise.
    ///
    /// Only call this once the store has persisted the changes.
    pub fn run_after_commit(&self, ctx: &mut C) -> Result<DispatchReport, DispatchError> {
        self.run(Phase::After, ctx)
    }

    #[tracing::instrument(skip_all, fields(phase = %phase))]
    fn run(&self, phase: Phase, ctx: &mut C) -> Result<DispatchReport, DispatchError> {
        let result = self.run_generations(phase, ctx);

        match &result {
            Ok(report) => {
                metrics::histogram!("event_dispatch_generations", "phase" => phase.as_str())
                    .record(report.generations as f64);
            }
            Err(e) => {
                metrics::counter!(
                    "event_dispatch_failures_total",
                    "phase" => phase.as_str(),
                    "kind" => e.kind()
                )
                .increment(1);
                tracing::warn!(error = %e, "event dispatch failed");
            }
        }

        result
    }

    fn run_generations(&self, phase: Phase, ctx: &mut C) -> Result<DispatchReport, DispatchError> {
        let limit = self.config.max_generations(phase);
        let mut report = DispatchReport::new(phase);

        loop {
            let events = harvest(phase, ctx)?;
            if events.is_empty() {
                break;
            }

            if report.generations == limit {
                return Err(DispatchError::CascadeLimitExceeded { phase, limit });
            }
            report.generations += 1;
            tracing::debug!(
                generation = report.generations,
                events = events.len(),
                "dispatching generation"
            );

            for event in &events {
                self.dispatch_one(phase, event, ctx)?;
                report.handlers_run += 1;
            }
        }

        Ok(report)
    }

    fn dispatch_one(&self, phase: Phase, event: &E, ctx: &mut C) -> Result<(), DispatchError> {
        let event_type = event.event_type();
        let handler: &dyn EventHandler<E, C> = self
            .registry
            .resolve(phase, event_type)
            .ok_or(DispatchError::HandlerNotFound { phase, event_type })?;

        self.log.record(LogEntry::about_to_run(phase, handler.name()));
        metrics::counter!("event_handlers_invoked_total", "phase" => phase.as_str()).increment(1);

        handler
            .handle(event, ctx)
            .map_err(|source| DispatchError::Handler {
                phase,
                handler: handler.name(),
                source,
            })
    }
}

/// Takes the pending events of `phase` from every tracked entity, in
/// enumeration order.
///
/// During the AfterSave phase, any BeforeSave event found is drained and
/// reported as unexpected.
fn harvest<E, C>(phase: Phase, ctx: &mut C) -> Result<Vec<E>, DispatchError>
where
    E: DomainEvent,
    C: EntityTracker<E>,
{
    let mut events = Vec::new();
    let mut stray: Option<&'static str> = None;

    ctx.visit_tracked(&mut |entity| {
        events.extend(entity.harvest_and_clear(phase));
        if phase == Phase::After {
            let late = entity.harvest_and_clear(Phase::Before);
            if stray.is_none() {
                stray = late.first().map(|event| event.event_type());
            }
        }
    });

    match stray {
        Some(event_type) => Err(DispatchError::UnexpectedPhaseEvent { event_type }),
        None => Ok(events),
    }
}
