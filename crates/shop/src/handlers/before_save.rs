//! Handlers that run before the shop's changes are persisted.

use event_runner::{DomainEvent, EventHandler, HandlerError};

use crate::{LookupError, Order, OrderId, ShopDb, ShopEvent};

fn order_mut(db: &mut ShopDb, id: OrderId) -> Result<&mut Order, LookupError> {
    db.order_mut(id).ok_or(LookupError::OrderNotFound(id))
}

fn wrong_event(handler: &'static str, event: &ShopEvent) -> HandlerError {
    LookupError::WrongEvent {
        handler,
        event_type: event.event_type(),
    }
    .into()
}

/// Applies the tax rate in effect on the expected dispatch date to a new
/// order.
pub struct OrderCreatedHandler;

impl EventHandler<ShopEvent, ShopDb> for OrderCreatedHandler {
    fn handle(&self, event: &ShopEvent, db: &mut ShopDb) -> Result<(), HandlerError> {
        let ShopEvent::OrderCreated {
            order_id,
            expected_dispatch_date,
        } = event
        else {
            return Err(wrong_event(self.name(), event));
        };

        let rate = db.tax_rate_in_effect(*expected_dispatch_date)?;
        order_mut(db, *order_id)?.set_tax_rate_percent(rate);
        Ok(())
    }
}

/// Allocates stock for an order line.
pub struct AllocateProductHandler;

impl EventHandler<ShopEvent, ShopDb> for AllocateProductHandler {
    fn handle(&self, event: &ShopEvent, db: &mut ShopDb) -> Result<(), HandlerError> {
        let ShopEvent::AllocateProduct {
            product_code,
            num_to_allocate,
        } = event
        else {
            return Err(wrong_event(self.name(), event));
        };

        let stock = db
            .stock_mut(product_code)
            .ok_or_else(|| LookupError::ProductNotFound(product_code.clone()))?;
        stock.allocate(*num_to_allocate)?;
        Ok(())
    }
}

/// Recomputes an order's grand total after its tax rate changed.
pub struct TaxRateChangedHandler;

impl EventHandler<ShopEvent, ShopDb> for TaxRateChangedHandler {
    fn handle(&self, event: &ShopEvent, db: &mut ShopDb) -> Result<(), HandlerError> {
        let ShopEvent::TaxRateChanged { order_id, .. } = event else {
            return Err(wrong_event(self.name(), event));
        };

        order_mut(db, *order_id)?.refresh_grand_total();
        Ok(())
    }
}

/// Re-applies tax using the actual dispatch date.
pub struct OrderDispatchedBeforeHandler;

impl EventHandler<ShopEvent, ShopDb> for OrderDispatchedBeforeHandler {
    fn handle(&self, event: &ShopEvent, db: &mut ShopDb) -> Result<(), HandlerError> {
        let ShopEvent::OrderDispatched {
            order_id,
            actual_dispatch_date,
        } = event
        else {
            return Err(wrong_event(self.name(), event));
        };

        let rate = db.tax_rate_in_effect(*actual_dispatch_date)?;
        order_mut(db, *order_id)?.set_tax_rate_percent(rate);
        Ok(())
    }
}
