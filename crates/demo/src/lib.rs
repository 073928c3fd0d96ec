//! Order scenarios committed through the event runner.
//!
//! Each scenario uses a freshly seeded shop and records the dispatch log in
//! memory so it can be printed afterwards.

pub mod config;

use std::sync::Arc;

use chrono::{Duration, Utc};
use event_runner::{CommitError, CommitReport, LogEntry, MemoryLogSink, RunnerConfig};
use shop::{
    BasketItem, ContextError, Money, Order, OrderError, OrderId, ShopContext, StoreError,
    create_seeded_context,
};

pub use config::{Config, LogFormat};

/// Errors that stop a scenario.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error("failed to set up the shop: {0}")]
    Setup(#[from] ContextError),

    #[error("invalid order: {0}")]
    Order(#[from] OrderError),

    #[error("save failed at {stage}: {0}", stage = .0.stage())]
    Commit(#[from] CommitError<StoreError>),

    #[error("order {0} disappeared from the shop")]
    MissingOrder(OrderId),
}

/// What a scenario did.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub name: &'static str,
    pub report: CommitReport,
    pub log: Vec<LogEntry>,
    pub tax_rate_percent: u32,
    pub grand_total: Money,
}

impl ScenarioOutcome {
    /// Renders the outcome as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "scenario": self.name,
            "report": self.report,
            "log": self.log,
            "tax_rate_percent": self.tax_rate_percent,
            "grand_total": self.grand_total.to_string(),
        })
    }
}

fn basket() -> Vec<BasketItem> {
    vec![BasketItem::new("Product1", 2, Money::from_dollars(123))]
}

fn place_order(context: &mut ShopContext) -> Result<OrderId, DemoError> {
    let order = Order::new("test", Utc::now(), basket())?;
    Ok(context.db_mut().add_order(order))
}

fn outcome(
    name: &'static str,
    context: &ShopContext,
    id: OrderId,
    report: CommitReport,
    log: &MemoryLogSink,
) -> Result<ScenarioOutcome, DemoError> {
    let order = context.db().order(id).ok_or(DemoError::MissingOrder(id))?;
    Ok(ScenarioOutcome {
        name,
        report,
        log: log.entries(),
        tax_rate_percent: order.tax_rate_percent(),
        grand_total: order.grand_total_price(),
    })
}

/// Places an order and saves it: tax is applied and stock allocated.
#[tracing::instrument(skip_all)]
pub fn order_created(runner: RunnerConfig) -> Result<ScenarioOutcome, DemoError> {
    let log = MemoryLogSink::new();
    let mut context = create_seeded_context(Arc::new(log.clone()), runner)?;

    let id = place_order(&mut context)?;
    let report = context.save_changes()?;

    outcome("order created", &context, id, report, &log)
}

/// Places and saves an order, then dispatches it after the tax rate
/// changed: tax is re-applied and the stock ships.
#[tracing::instrument(skip_all)]
pub fn order_dispatched(runner: RunnerConfig) -> Result<ScenarioOutcome, DemoError> {
    let log = MemoryLogSink::new();
    let mut context = create_seeded_context(Arc::new(log.clone()), runner)?;

    let id = place_order(&mut context)?;
    context.save_changes()?;
    log.clear();

    context
        .db_mut()
        .order_mut(id)
        .ok_or(DemoError::MissingOrder(id))?
        .order_has_been_dispatched(Utc::now() + Duration::days(10))?;
    let report = context.save_changes()?;

    outcome("order dispatched", &context, id, report, &log)
}

/// Runs every scenario in order.
pub fn run_all(runner: RunnerConfig) -> Result<Vec<ScenarioOutcome>, DemoError> {
    Ok(vec![order_created(runner)?, order_dispatched(runner)?])
}
