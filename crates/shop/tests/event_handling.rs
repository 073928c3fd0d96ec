//! Commits the shop through the event runner and checks handler effects
//! and the dispatch log.

use std::sync::Arc;

use chrono::{Duration, Utc};
use event_runner::{
    CommitError, DispatchError, DomainEvent, EventRaiser, EventRunner, HandlerRegistry,
    MemoryLogSink, Phase, RunnerConfig,
};
use shop::events::event_types;
use shop::handlers::{
    AllocateProductHandler, OrderCreatedHandler, OrderDispatchedAfterHandler,
    OrderDispatchedBeforeHandler, TaxRateChangedHandler,
};
use shop::{
    BasketItem, Money, Order, OrderId, ProductCode, ShopContext, ShopDb, ShopEvent, StoreError,
    create_seeded_context,
};

fn setup() -> (ShopContext, MemoryLogSink) {
    let log = MemoryLogSink::new();
    let context = create_seeded_context(Arc::new(log.clone()), RunnerConfig::default()).unwrap();
    (context, log)
}

fn before_message<H>() -> String {
    format!(
        "About to run a BeforeSave event handler {}.",
        std::any::type_name::<H>()
    )
}

fn after_message<H>() -> String {
    format!(
        "About to run a AfterSave event handler {}.",
        std::any::type_name::<H>()
    )
}

fn product1() -> ProductCode {
    ProductCode::new("Product1")
}

fn add_order(context: &mut ShopContext, num_ordered: u32) -> OrderId {
    let order = Order::new(
        "test",
        Utc::now(),
        vec![BasketItem::new("Product1", num_ordered, Money::from_dollars(123))],
    )
    .unwrap();
    context.db_mut().add_order(order)
}

fn add_saved_order(context: &mut ShopContext) -> OrderId {
    let id = add_order(context, 2);
    context.save_changes().unwrap();
    id
}

fn dispatch(context: &mut ShopContext, id: OrderId) {
    context
        .db_mut()
        .order_mut(id)
        .unwrap()
        .order_has_been_dispatched(Utc::now() + Duration::days(10))
        .unwrap();
}

#[test]
fn new_order_raises_created_and_allocation_events() {
    let mut order = Order::new(
        "test",
        Utc::now(),
        vec![BasketItem::new("Product1", 2, Money::from_dollars(123))],
    )
    .unwrap();

    let events = order.harvest_and_clear(Phase::Before);
    let types: Vec<&str> = events.iter().map(|e| e.event_type()).collect();
    assert_eq!(types, vec!["OrderCreated", "AllocateProduct"]);
    assert_eq!(
        events[1],
        ShopEvent::AllocateProduct {
            product_code: product1(),
            num_to_allocate: 2
        }
    );
}

#[test]
fn created_order_gets_tax_and_allocates_stock() {
    let (mut context, _log) = setup();
    let id = add_order(&mut context, 2);

    let report = context.save_changes().unwrap();

    let order = context.db().order(id).unwrap();
    assert_eq!(order.tax_rate_percent(), 4);
    assert_eq!(order.grand_total_price().cents(), 25584);
    assert_eq!(context.db().stock(&product1()).unwrap().num_allocated(), 2);
    assert_eq!(report.before.handlers_run, 3);
    assert_eq!(report.before.generations, 2);
    assert!(report.after.is_idle());

    let saved = context.db().load_saved_order(id).unwrap().unwrap();
    assert_eq!(saved.tax_rate_percent(), 4);
    assert_eq!(saved.grand_total_price().cents(), 25584);
    let saved_stock = context.db().load_saved_stock(&product1()).unwrap().unwrap();
    assert_eq!(saved_stock.num_allocated(), 2);
}

#[test]
fn created_order_logs_each_handler_in_dispatch_order() {
    let (mut context, log) = setup();
    add_order(&mut context, 2);

    context.save_changes().unwrap();

    assert_eq!(
        log.messages(),
        vec![
            before_message::<OrderCreatedHandler>(),
            before_message::<AllocateProductHandler>(),
            before_message::<TaxRateChangedHandler>(),
        ]
    );
}

#[test]
fn dispatched_order_uses_new_tax_and_ships_stock() {
    let (mut context, _log) = setup();
    let id = add_saved_order(&mut context);
    dispatch(&mut context, id);

    let report = context.save_changes().unwrap();

    let order = context.db().order(id).unwrap();
    assert_eq!(order.tax_rate_percent(), 9);
    assert_eq!(order.grand_total_price().cents(), 26814);
    let stock = context.db().stock(&product1()).unwrap();
    assert_eq!(stock.num_allocated(), 0);
    assert_eq!(stock.num_in_stock(), 3);
    assert_eq!(report.after.handlers_run, 1);

    // The AfterSave handler saved the shipped stock itself.
    let saved_stock = context.db().load_saved_stock(&product1()).unwrap().unwrap();
    assert_eq!(saved_stock.num_in_stock(), 3);
    assert_eq!(saved_stock.num_allocated(), 0);
}

#[test]
fn dispatched_order_logs_both_phases() {
    let (mut context, log) = setup();
    let id = add_saved_order(&mut context);
    log.clear();
    dispatch(&mut context, id);

    context.save_changes().unwrap();

    assert_eq!(
        log.messages(),
        vec![
            before_message::<OrderDispatchedBeforeHandler>(),
            before_message::<TaxRateChangedHandler>(),
            after_message::<OrderDispatchedAfterHandler>(),
        ]
    );
}

#[test]
fn second_save_runs_no_handlers() {
    let (mut context, log) = setup();
    add_saved_order(&mut context);
    log.clear();

    let report = context.save_changes().unwrap();

    assert_eq!(report.handlers_run(), 0);
    assert!(log.is_empty());
}

#[test]
fn missing_before_save_handler_fails_without_persisting() {
    let log = MemoryLogSink::new();
    let registry = HandlerRegistry::builder()
        .before_save(event_types::ORDER_CREATED, OrderCreatedHandler)
        .before_save(event_types::ALLOCATE_PRODUCT, AllocateProductHandler)
        .build()
        .unwrap();
    let runner = EventRunner::new(registry).with_log_sink(Arc::new(log.clone()));
    let mut context = ShopContext::new(ShopDb::seeded(Utc::now()).unwrap(), Arc::new(runner));
    let persisted = context.db().persist_count();
    let id = add_order(&mut context, 2);

    let err = context.save_changes().unwrap_err();

    assert!(matches!(
        err,
        CommitError::BeforeCommit(DispatchError::HandlerNotFound { .. })
    ));
    assert_eq!(
        err.to_string(),
        "Could not find a BeforeSave event handler for the event TaxRateChanged."
    );
    assert_eq!(log.len(), 2);
    assert_eq!(context.db().persist_count(), persisted);
    assert!(context.db().load_saved_order(id).unwrap().is_none());
}

#[test]
fn missing_after_save_handler_fails_after_persisting() {
    let (mut context, _log) = setup();
    let id = add_saved_order(&mut context);
    let order_created = context
        .db()
        .order(id)
        .map(|order| ShopEvent::OrderCreated {
            order_id: id,
            expected_dispatch_date: order.expected_dispatch_date(),
        })
        .unwrap();
    context
        .db_mut()
        .order_mut(id)
        .unwrap()
        .raise_event(order_created, Phase::After);

    let err = context.save_changes().unwrap_err();

    assert!(err.is_persisted());
    assert_eq!(
        err.to_string(),
        "Could not find a AfterSave event handler for the event OrderCreated."
    );
}

#[test]
fn persist_failure_skips_after_save_handlers() {
    let (mut context, log) = setup();
    let id = add_saved_order(&mut context);
    log.clear();
    dispatch(&mut context, id);
    context.db_mut().fail_next_persist("database offline");

    let err = context.save_changes().unwrap_err();

    assert!(matches!(err, CommitError::Persist(StoreError::Unavailable(_))));
    assert!(!err.is_persisted());
    assert_eq!(log.len(), 2);
    assert!(log.entries().iter().all(|e| e.phase == Phase::Before));
    assert_eq!(context.db().stock(&product1()).unwrap().num_allocated(), 2);
    let saved = context.db().load_saved_order(id).unwrap().unwrap();
    assert!(!saved.is_dispatched());
}

#[test]
fn after_save_handler_failure_reports_persisted_changes() {
    let (mut context, _log) = setup();
    let id = add_saved_order(&mut context);
    context
        .db_mut()
        .stock_mut(&product1())
        .unwrap()
        .release(2)
        .unwrap();
    dispatch(&mut context, id);

    let err = context.save_changes().unwrap_err();

    assert!(err.is_persisted());
    assert!(matches!(
        err.dispatch_error(),
        Some(DispatchError::Handler {
            phase: Phase::After,
            ..
        })
    ));
    let saved = context.db().load_saved_order(id).unwrap().unwrap();
    assert!(saved.is_dispatched());
    assert_eq!(saved.tax_rate_percent(), 9);
}

#[test]
fn insufficient_stock_fails_before_saving() {
    let (mut context, _log) = setup();
    let id = add_order(&mut context, 6);

    let err = context.save_changes().unwrap_err();

    match &err {
        CommitError::BeforeCommit(DispatchError::Handler { handler, .. }) => {
            assert_eq!(*handler, std::any::type_name::<AllocateProductHandler>());
        }
        other => panic!("expected a BeforeSave handler error, got {other:?}"),
    }
    assert!(err.to_string().contains("only 5 available"));
    assert!(context.db().load_saved_order(id).unwrap().is_none());
    assert_eq!(context.db().persist_count(), 1);
}
