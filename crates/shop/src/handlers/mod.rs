//! Event handlers for the shop and the registry wiring them up.

pub mod after_save;
pub mod before_save;

use std::sync::Arc;

use event_runner::{EventRunner, HandlerRegistry, LogSink, RegistryError, RunnerConfig};

use crate::events::event_types;
use crate::{ShopDb, ShopEvent};

pub use after_save::OrderDispatchedAfterHandler;
pub use before_save::{
    AllocateProductHandler, OrderCreatedHandler, OrderDispatchedBeforeHandler,
    TaxRateChangedHandler,
};

/// Runner that commits a [`ShopDb`].
pub type ShopRunner = EventRunner<ShopEvent, ShopDb>;

/// Registers every shop handler.
///
/// `OrderDispatched` has a handler in each phase; every other event is
/// handled only before save.
pub fn handler_registry() -> Result<HandlerRegistry<ShopEvent, ShopDb>, RegistryError> {
    HandlerRegistry::builder()
        .before_save(event_types::ORDER_CREATED, OrderCreatedHandler)
        .before_save(event_types::ALLOCATE_PRODUCT, AllocateProductHandler)
        .before_save(event_types::TAX_RATE_CHANGED, TaxRateChangedHandler)
        .before_save(event_types::ORDER_DISPATCHED, OrderDispatchedBeforeHandler)
        .after_save(event_types::ORDER_DISPATCHED, OrderDispatchedAfterHandler)
        .build()
}

/// Creates a runner with the shop handlers.
pub fn shop_runner(
    log: Arc<dyn LogSink>,
    config: RunnerConfig,
) -> Result<ShopRunner, RegistryError> {
    Ok(EventRunner::new(handler_registry()?)
        .with_log_sink(log)
        .with_config(config))
}
