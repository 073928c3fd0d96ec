//! Domain events, phases, and the entity-side event buffer.

use serde::{Deserialize, Serialize};

/// Trait for domain events that can be routed to a handler.
///
/// Domain events represent facts that have happened to an entity.
/// They are immutable and should be named in past tense.
pub trait DomainEvent: std::fmt::Debug + Send + Sync + 'static {
    /// Returns the event type name.
    ///
    /// This is the routing key: each variant of an event enum returns its
    /// own name, and the registry holds at most one handler per name and
    /// phase.
    fn event_type(&self) -> &'static str;
}

/// When an event is handled relative to the unit-of-work commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Handled before the store persists; handlers may still change entities.
    Before,

    /// Handled once the store has persisted successfully.
    After,
}

impl Phase {
    /// Returns the phase name used in log lines and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Before => "BeforeSave",
            Phase::After => "AfterSave",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The events an entity has raised since they were last harvested.
///
/// Events are kept per phase in the order they were raised.
#[derive(Debug, Clone)]
pub struct EventBuffer<E> {
    before: Vec<E>,
    after: Vec<E>,
}

impl<E> EventBuffer<E> {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self {
            before: Vec::new(),
            after: Vec::new(),
        }
    }

    /// Appends an event to the given phase.
    pub fn raise(&mut self, event: E, phase: Phase) {
        self.queue_mut(phase).push(event);
    }

    /// Removes and returns all events of the given phase, oldest first.
    pub fn take(&mut self, phase: Phase) -> Vec<E> {
        std::mem::take(self.queue_mut(phase))
    }

    /// Returns the pending events of the given phase without clearing them.
    pub fn pending(&self, phase: Phase) -> &[E] {
        match phase {
            Phase::Before => &self.before,
            Phase::After => &self.after,
        }
    }

    /// Returns true if no events are pending in either phase.
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }

    fn queue_mut(&mut self, phase: Phase) -> &mut Vec<E> {
        match phase {
            Phase::Before => &mut self.before,
            Phase::After => &mut self.after,
        }
    }
}

impl<E> Default for EventBuffer<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Contract for entities that raise domain events.
///
/// Implementors only expose their buffer; raising and harvesting are
/// provided.
pub trait EventRaiser<E> {
    /// Returns the entity's event buffer.
    fn event_buffer(&self) -> &EventBuffer<E>;

    /// Returns the entity's event buffer for mutation.
    fn event_buffer_mut(&mut self) -> &mut EventBuffer<E>;

    /// Records an event to be handled in the given phase.
    fn raise_event(&mut self, event: E, phase: Phase) {
        self.event_buffer_mut().raise(event, phase);
    }

    /// Takes every pending event of the given phase, in raise order.
    fn harvest_and_clear(&mut self, phase: Phase) -> Vec<E> {
        self.event_buffer_mut().take(phase)
    }
}
