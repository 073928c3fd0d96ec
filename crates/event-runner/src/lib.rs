//! Runs domain event handlers around a unit-of-work commit.
//!
//! Entities raise events while they change. When the unit of work commits:
//! - BeforeSave events are harvested and handled first, generation by
//!   generation, so handlers can change entities and raise more events
//! - the store persists the changes
//! - AfterSave events are harvested and handled
//!
//! Each event type has exactly one handler per phase, held in a
//! [`HandlerRegistry`]. Every invocation is announced to a [`LogSink`].

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod log;
pub mod registry;
pub mod runner;

pub use config::RunnerConfig;
pub use dispatcher::{DispatchReport, EventDispatcher};
pub use error::{CommitError, DispatchError, HandlerError, RegistryError};
pub use event::{DomainEvent, EventBuffer, EventRaiser, Phase};
pub use log::{LogEntry, LogSink, MemoryLogSink, TracingLogSink};
pub use registry::{EventHandler, FnHandler, HandlerRegistry, HandlerRegistryBuilder, handler_fn};
pub use runner::{CommitReport, EntityTracker, EventRunner, UnitOfWork};
