//! Unit-of-work integration: run BeforeSave handlers, persist, then run
//! AfterSave handlers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::log::LogSink;
use crate::{
    CommitError, DispatchReport, DomainEvent, EventDispatcher, EventRaiser, HandlerRegistry,
    RunnerConfig,
};

/// Exposes the entities taking part in the current commit.
pub trait EntityTracker<E> {
    /// Calls `visit` once for every tracked entity.
    ///
    /// The order must be stable between calls; it decides the order in
    /// which harvested events are handled.
    fn visit_tracked(&mut self, visit: &mut dyn FnMut(&mut dyn EventRaiser<E>));
}

/// A store whose tracked changes can be persisted in one step.
pub trait UnitOfWork<E>: EntityTracker<E> {
    /// The error returned when persisting fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persists every tracked change.
    fn persist(&mut self) -> Result<(), Self::Error>;
}

/// Summary of a successful commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReport {
    /// BeforeSave dispatch, run before persisting.
    pub before: DispatchReport,

    /// AfterSave dispatch, run once persisted.
    pub after: DispatchReport,
}

impl CommitReport {
    /// Total handlers invoked across both phases.
    pub fn handlers_run(&self) -> usize {
        self.before.handlers_run + self.after.handlers_run
    }
}

/// Wraps a unit of work's commit with event dispatch.
///
/// One runner can be shared between units of work; each commit borrows its
/// unit of work exclusively for its whole duration.
pub struct EventRunner<E, C> {
    dispatcher: EventDispatcher<E, C>,
}

impl<E, C> EventRunner<E, C>
where
    E: DomainEvent,
    C: UnitOfWork<E>,
{
    /// Creates a runner that logs through `tracing` with default limits.
    pub fn new(registry: HandlerRegistry<E, C>) -> Self {
        Self {
            dispatcher: EventDispatcher::new(registry),
        }
    }

    /// Creates a runner around an existing dispatcher.
    pub fn from_dispatcher(dispatcher: EventDispatcher<E, C>) -> Self {
        Self { dispatcher }
    }

    /// Replaces the log sink.
    pub fn with_log_sink(self, log: Arc<dyn LogSink>) -> Self {
        Self {
            dispatcher: self.dispatcher.with_log_sink(log),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(self, config: RunnerConfig) -> Self {
        Self {
            dispatcher: self.dispatcher.with_config(config),
        }
    }

    /// Returns the dispatcher.
    pub fn dispatcher(&self) -> &EventDispatcher<E, C> {
        &self.dispatcher
    }

    /// Commits the unit of work.
    ///
    /// 1. Runs BeforeSave handlers; on failure nothing is persisted.
    /// 2. Persists; on failure no AfterSave handler runs.
    /// 3. Runs AfterSave handlers; on failure the changes stay persisted and
    ///    the error says so ([`CommitError::is_persisted`]).
    #[tracing::instrument(skip_all)]
    pub fn commit(&self, uow: &mut C) -> Result<CommitReport, CommitError<C::Error>> {
        let result = self.commit_inner(uow);

        match &result {
            Ok(report) => {
                metrics::counter!("unit_of_work_commits_total").increment(1);
                tracing::info!(
                    before_handlers = report.before.handlers_run,
                    after_handlers = report.after.handlers_run,
                    "commit complete"
                );
            }
            Err(e) => {
                metrics::counter!("unit_of_work_commit_failures_total", "stage" => e.stage())
                    .increment(1);
                tracing::warn!(stage = e.stage(), error = %e, "commit failed");
            }
        }

        result
    }

    fn commit_inner(&self, uow: &mut C) -> Result<CommitReport, CommitError<C::Error>> {
        let before = self
            .dispatcher
            .run_before_commit(uow)
            .map_err(CommitError::BeforeCommit)?;

        uow.persist().map_err(CommitError::Persist)?;

        let after = self
            .dispatcher
            .run_after_commit(uow)
            .map_err(CommitError::AfterCommit)?;

        Ok(CommitReport { before, after })
    }
}
