//! Handler trait and the registry that routes events to handlers.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::marker::PhantomData;

use crate::{HandlerError, Phase, RegistryError};

/// Handles one kind of domain event in one phase.
///
/// `C` is the unit of work the commit runs against. Handlers receive it
/// mutably, so they can change tracked entities and raise further events.
pub trait EventHandler<E, C>: Send + Sync {
    /// Returns the handler name written to the dispatch log.
    ///
    /// Defaults to the full type path of the handler.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Processes a single event.
    fn handle(&self, event: &E, ctx: &mut C) -> Result<(), HandlerError>;
}

/// A handler backed by a closure. Created with [`handler_fn`].
pub struct FnHandler<E, C, F> {
    name: &'static str,
    f: F,
    _phantom: PhantomData<fn(&E, &mut C)>,
}

/// Wraps a closure as a named [`EventHandler`].
pub fn handler_fn<E, C, F>(name: &'static str, f: F) -> FnHandler<E, C, F>
where
    F: Fn(&E, &mut C) -> Result<(), HandlerError> + Send + Sync,
{
    FnHandler {
        name,
        f,
        _phantom: PhantomData,
    }
}

impl<E, C, F> EventHandler<E, C> for FnHandler<E, C, F>
where
    F: Fn(&E, &mut C) -> Result<(), HandlerError> + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn handle(&self, event: &E, ctx: &mut C) -> Result<(), HandlerError> {
        (self.f)(event, ctx)
    }
}

type HandlerKey = (Phase, &'static str);

/// Maps each (phase, event type) to exactly one handler.
///
/// Built once at startup and read-only afterwards.
pub struct HandlerRegistry<E, C> {
    handlers: HashMap<HandlerKey, Box<dyn EventHandler<E, C>>>,
}

impl<E, C> HandlerRegistry<E, C> {
    /// Starts building a registry.
    pub fn builder() -> HandlerRegistryBuilder<E, C> {
        HandlerRegistryBuilder::default()
    }

    /// Finds the handler for an event type in a phase.
    ///
    /// Matching is exact on the type name; there is no fallback.
    pub fn resolve(
        &self,
        phase: Phase,
        event_type: &'static str,
    ) -> Option<&dyn EventHandler<E, C>> {
        self.handlers
            .get(&(phase, event_type))
            .map(|handler| handler.as_ref())
    }

    /// Returns true if a handler is registered for the event type in the phase.
    pub fn contains(&self, phase: Phase, event_type: &'static str) -> bool {
        self.resolve(phase, event_type).is_some()
    }

    /// Returns the number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<E, C> std::fmt::Debug for HandlerRegistry<E, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(
                self.handlers
                    .iter()
                    .map(|((phase, event_type), h)| (format!("{phase}:{event_type}"), h.name())),
            )
            .finish()
    }
}

/// Builder for [`HandlerRegistry`].
///
/// The first duplicate registration is remembered and reported by
/// [`build`](Self::build).
pub struct HandlerRegistryBuilder<E, C> {
    handlers: HashMap<HandlerKey, Box<dyn EventHandler<E, C>>>,
    duplicate: Option<RegistryError>,
}

impl<E, C> Default for HandlerRegistryBuilder<E, C> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
            duplicate: None,
        }
    }
}

impl<E, C> HandlerRegistryBuilder<E, C> {
    /// Registers a BeforeSave handler for an event type.
    pub fn before_save<H>(self, event_type: &'static str, handler: H) -> Self
    where
        H: EventHandler<E, C> + 'static,
    {
        self.register(Phase::Before, event_type, handler)
    }

    /// Registers an AfterSave handler for an event type.
    pub fn after_save<H>(self, event_type: &'static str, handler: H) -> Self
    where
        H: EventHandler<E, C> + 'static,
    {
        self.register(Phase::After, event_type, handler)
    }

    /// Registers a handler for an event type in the given phase.
    pub fn register<H>(mut self, phase: Phase, event_type: &'static str, handler: H) -> Self
    where
        H: EventHandler<E, C> + 'static,
    {
        match self.handlers.entry((phase, event_type)) {
            Entry::Occupied(existing) => {
                if self.duplicate.is_none() {
                    self.duplicate = Some(RegistryError::DuplicateHandler {
                        phase,
                        event_type,
                        existing: existing.get().name(),
                        rejected: handler.name(),
                    });
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(Box::new(handler));
            }
        }
        self
    }

    /// Finishes the registry, failing if any registration was a duplicate.
    pub fn build(self) -> Result<HandlerRegistry<E, C>, RegistryError> {
        match self.duplicate {
            Some(err) => Err(err),
            None => Ok(HandlerRegistry {
                handlers: self.handlers,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    impl EventHandler<u32, ()> for Noop {
        fn handle(&self, _event: &u32, _ctx: &mut ()) -> Result<(), HandlerError> {
            Ok(())
        }
    }

    #[test]
    fn resolves_by_phase_and_type() {
        let registry = HandlerRegistry::<u32, ()>::builder()
            .before_save("Counted", Noop)
            .after_save(
                "Counted",
                handler_fn("after-counted", |_e: &u32, _c: &mut ()| Ok(())),
            )
            .build()
            .unwrap();

        assert_eq!(registry.len(), 2);
        let before = registry.resolve(Phase::Before, "Counted").unwrap();
        assert!(before.name().ends_with("Noop"));
        let after = registry.resolve(Phase::After, "Counted").unwrap();
        assert_eq!(after.name(), "after-counted");
        assert!(registry.resolve(Phase::Before, "Other").is_none());
        assert!(!registry.contains(Phase::After, "counted"));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let result = HandlerRegistry::<u32, ()>::builder()
            .before_save("Counted", Noop)
            .before_save(
                "Counted",
                handler_fn("second", |_e: &u32, _c: &mut ()| Ok(())),
            )
            .build();

        match result {
            Err(RegistryError::DuplicateHandler {
                phase,
                event_type,
                rejected,
                ..
            }) => {
                assert_eq!(phase, Phase::Before);
                assert_eq!(event_type, "Counted");
                assert_eq!(rejected, "second");
            }
            other => panic!("expected duplicate error, got {other:?}"),
        }
    }

    #[test]
    fn closure_handler_runs() {
        let handler = handler_fn("add", |e: &u32, total: &mut u32| {
            *total += *e;
            Ok(())
        });
        let mut total = 1;
        handler.handle(&41, &mut total).unwrap();
        assert_eq!(total, 42);
    }
}
